use thiserror::Error;

/// Failures surfaced by the metrics and sample pipelines.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("failed to fetch {location}: status {status}")]
    Fetch { location: String, status: u16 },

    #[error("HTTP request for {location} failed: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {location}{}: {source}", line_suffix(.line))]
    Parse {
        location: String,
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "partition sizes differ: inputs={inputs} outputs={outputs} results={results}"
    )]
    LengthMismatch {
        inputs: usize,
        outputs: usize,
        results: usize,
    },

    #[error("can't find input and output for {task_id}")]
    MissingJoinKey { task_id: String },

    #[error(
        "templated prompt{} has no fill-in-middle suffix marker",
        task_suffix(.task_id)
    )]
    Format { task_id: Option<String> },
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|line| format!(" (line {line})")).unwrap_or_default()
}

fn task_suffix(task_id: &Option<String>) -> String {
    task_id
        .as_deref()
        .map(|task_id| format!(" for {task_id}"))
        .unwrap_or_default()
}
