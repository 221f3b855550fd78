use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "completebench",
    version,
    about = "Browse precomputed code-completion benchmark metrics and samples"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Metrics(MetricsArgs),
    Manifest(ManifestArgs),
    Samples(SamplesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory or http(s) URL holding metrics.json and samples/
    #[arg(long, env = "COMPLETEBENCH_BASE", default_value = "web/public")]
    pub base: String,

    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, default_value = "none")]
    pub postprocessor: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SamplesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub template: Option<String>,

    #[arg(long)]
    pub postprocessor: Option<String>,

    /// Zero-based sample position, clamped to the available range
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    #[arg(long, default_value_t = false)]
    pub all: bool,

    #[arg(long, default_value_t = false)]
    pub show_prompt: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
