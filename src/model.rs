use std::fmt;

use serde::{Deserialize, Serialize};

pub const AVERAGE_LANGUAGE: &str = "Average";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricsKey {
    pub model: String,
    pub language: String,
    pub template: String,
    pub postprocess: String,
}

impl MetricsKey {
    pub fn new(
        model: impl Into<String>,
        language: impl Into<String>,
        template: impl Into<String>,
        postprocess: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            language: language.into(),
            template: template.into(),
            postprocess: postprocess.into(),
        }
    }

    pub fn is_average(&self) -> bool {
        self.language == AVERAGE_LANGUAGE
    }
}

impl fmt::Display for MetricsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.model, self.language, self.template, self.postprocess
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    #[serde(flatten)]
    pub key: MetricsKey,
    pub exact_match: f64,
    pub edit_similarity: f64,
    pub stop: f64,
}

impl MetricRecord {
    pub fn value(&self, metric: MetricName) -> f64 {
        match metric {
            MetricName::ExactMatch => self.exact_match,
            MetricName::EditSimilarity => self.edit_similarity,
            MetricName::Stop => self.stop,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    ExactMatch,
    EditSimilarity,
    Stop,
}

impl MetricName {
    pub const ALL: [MetricName; 3] = [Self::ExactMatch, Self::EditSimilarity, Self::Stop];

    pub fn description(self) -> &'static str {
        match self {
            Self::ExactMatch => "Exact Match %",
            Self::EditSimilarity => "Edit Similarity",
            Self::Stop => "Stop %",
        }
    }
}

/// Selection axes shared by metric keys and the samples manifest.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyField {
    Model,
    Language,
    Template,
    Postprocess,
}

impl KeyField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Language => "language",
            Self::Template => "template",
            Self::Postprocess => "postprocessor",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExampleMetadata {
    pub task_id: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub context_start_lineno: u64,
    #[serde(default)]
    pub groundtruth_start_lineno: u64,
    #[serde(default)]
    pub right_context_start_lineno: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossFileItem {
    pub filename: String,
    pub retrieved_chunk: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossFileContext {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub list: Vec<CrossFileItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub prompt: String,
    pub groundtruth: String,
    pub right_context: String,
    pub metadata: ExampleMetadata,
    #[serde(default)]
    pub crossfile_context: CrossFileContext,
}

impl TaskInput {
    pub fn task_id(&self) -> &str {
        &self.metadata.task_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutput {
    pub task_id: String,
    pub templated: String,
    pub output: String,
    pub stop_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    #[serde(rename = "task_id")]
    pub task_id: String,
    pub postprocessed: String,
    pub exact_match: bool,
    pub edit_similarity: f64,
    pub stop: bool,
}

/// The original code surrounding the generated span inside a templated prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TruncationWindow {
    pub truncated_prefix: String,
    pub truncated_suffix: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignedOutput {
    #[serde(flatten)]
    pub output: ModelOutput,
    #[serde(flatten)]
    pub window: TruncationWindow,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinedSample {
    pub input: TaskInput,
    pub output: AlignedOutput,
    pub result: ScoredResult,
}

impl JoinedSample {
    pub fn task_id(&self) -> &str {
        &self.result.task_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub models: Vec<String>,
    pub languages: Vec<String>,
    pub templates: Vec<String>,
    pub postprocessors: Vec<String>,
}

impl Manifest {
    pub fn options(&self, field: KeyField) -> &[String] {
        match field {
            KeyField::Model => &self.models,
            KeyField::Language => &self.languages,
            KeyField::Template => &self.templates,
            KeyField::Postprocess => &self.postprocessors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    pub model: String,
    pub language: String,
    pub template: String,
    pub postprocessor: String,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model={} language={} template={} postprocessor={}",
            self.model, self.language, self.template, self.postprocessor
        )
    }
}
