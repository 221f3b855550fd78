use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ManifestArgs;
use crate::model::{KeyField, Manifest};
use crate::source::MANIFEST_PATH;
use crate::util::{now_utc_string, write_json_stdout};

use super::open_source;

const FIELDS: [KeyField; 4] = [
    KeyField::Model,
    KeyField::Language,
    KeyField::Template,
    KeyField::Postprocess,
];

#[derive(Debug, Serialize)]
struct ManifestReport<'a> {
    generated_at: String,
    source: String,
    manifest: &'a Manifest,
}

pub async fn run(args: ManifestArgs) -> Result<()> {
    let source = open_source(&args.source)?;
    let manifest: Manifest = source
        .fetch_json(MANIFEST_PATH)
        .await
        .context("failed to load samples manifest")?;

    info!(
        models = manifest.models.len(),
        languages = manifest.languages.len(),
        templates = manifest.templates.len(),
        postprocessors = manifest.postprocessors.len(),
        "loaded samples manifest"
    );
    for field in FIELDS {
        if manifest.options(field).is_empty() {
            warn!(field = field.as_str(), "manifest lists no options");
        }
    }

    if args.json {
        return write_json_stdout(&ManifestReport {
            generated_at: now_utc_string(),
            source: source.describe(),
            manifest: &manifest,
        });
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_manifest_text(&mut output, &manifest)?;
    output.flush()?;
    Ok(())
}

fn write_manifest_text<W: Write>(output: &mut W, manifest: &Manifest) -> Result<()> {
    for field in FIELDS {
        writeln!(
            output,
            "{}: {}",
            field.as_str(),
            manifest.options(field).join(", ")
        )?;
    }
    Ok(())
}
