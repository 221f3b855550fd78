pub mod manifest;
pub mod metrics;
pub mod samples;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::SourceArgs;
use crate::source::StaticSource;

fn open_source(args: &SourceArgs) -> Result<StaticSource> {
    let source = StaticSource::from_base(&args.base, Duration::from_millis(args.timeout_ms))
        .with_context(|| format!("failed to open static source {}", args.base))?;
    info!(base = %source.describe(), "opened static source");
    Ok(source)
}
