use std::collections::HashMap;

use crate::error::ViewerError;
use crate::model::{AlignedOutput, JoinedSample, ModelOutput, ScoredResult, TaskInput};

use super::window::compute_truncation_window;

/// Joins the three partitions of one selection by task id, in result order.
///
/// Partition sizes are compared before any key lookup. Every result must have a
/// matching input and output; a repeated result id joins the same pair again.
/// Every output's templated prompt must contain a fill-in-middle suffix marker.
pub fn join(
    inputs: Vec<TaskInput>,
    outputs: Vec<ModelOutput>,
    results: Vec<ScoredResult>,
) -> Result<Vec<JoinedSample>, ViewerError> {
    if inputs.len() != outputs.len() || inputs.len() != results.len() {
        return Err(ViewerError::LengthMismatch {
            inputs: inputs.len(),
            outputs: outputs.len(),
            results: results.len(),
        });
    }

    let input_map: HashMap<String, TaskInput> = inputs
        .into_iter()
        .map(|input| (input.task_id().to_string(), input))
        .collect();
    let output_map: HashMap<String, ModelOutput> = outputs
        .into_iter()
        .map(|output| (output.task_id.clone(), output))
        .collect();

    let mut samples = Vec::with_capacity(results.len());
    for result in results {
        let (Some(input), Some(output)) = (
            input_map.get(&result.task_id).cloned(),
            output_map.get(&result.task_id).cloned(),
        ) else {
            return Err(ViewerError::MissingJoinKey {
                task_id: result.task_id,
            });
        };

        let window =
            compute_truncation_window(&input.prompt, &output.templated, &input.right_context)
                .map_err(|_| ViewerError::Format {
                    task_id: Some(result.task_id.clone()),
                })?;

        samples.push(JoinedSample {
            input,
            output: AlignedOutput { output, window },
            result,
        });
    }

    Ok(samples)
}

/// Ascending lexicographic order by task id.
pub fn order(mut samples: Vec<JoinedSample>) -> Vec<JoinedSample> {
    samples.sort_by(|left, right| left.task_id().cmp(right.task_id()));
    samples
}
