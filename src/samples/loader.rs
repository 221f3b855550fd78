use tracing::info;

use crate::error::ViewerError;
use crate::model::{JoinedSample, ModelOutput, ScoredResult, TaskInput};
use crate::source::{StaticSource, inputs_path, outputs_path, parse_jsonl, results_path};

use super::join::{join, order};
use super::selection::SelectionTicket;

/// Fetches the input, output and result partitions of a selection concurrently,
/// then joins and orders them. Nothing is parsed or joined unless all three
/// fetches succeed.
pub async fn load_samples(
    source: &StaticSource,
    ticket: &SelectionTicket,
) -> Result<Vec<JoinedSample>, ViewerError> {
    let selection = &ticket.selection;
    let inputs_location = inputs_path(&selection.language);
    let outputs_location = outputs_path(selection);
    let results_location = results_path(selection);

    let (inputs_text, outputs_text, results_text) = tokio::try_join!(
        source.fetch_text(&inputs_location),
        source.fetch_text(&outputs_location),
        source.fetch_text(&results_location),
    )?;

    let inputs: Vec<TaskInput> = parse_jsonl(&source.location(&inputs_location), &inputs_text)?;
    let outputs: Vec<ModelOutput> =
        parse_jsonl(&source.location(&outputs_location), &outputs_text)?;
    let results: Vec<ScoredResult> =
        parse_jsonl(&source.location(&results_location), &results_text)?;

    info!(
        generation = ticket.generation,
        selection = %selection,
        inputs = inputs.len(),
        outputs = outputs.len(),
        results = results.len(),
        "fetched sample partitions"
    );

    let samples = order(join(inputs, outputs, results)?);
    info!(samples = samples.len(), "joined samples");
    Ok(samples)
}
