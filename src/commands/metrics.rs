use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::MetricsArgs;
use crate::metrics::{MetricsStore, MetricsTable};
use crate::model::{KeyField, MetricRecord};
use crate::source::METRICS_PATH;
use crate::util::{now_utc_string, write_json_stdout};

use super::open_source;

#[derive(Debug, Serialize)]
struct MetricsReport {
    generated_at: String,
    source: String,
    table: MetricsTable,
}

pub async fn run(args: MetricsArgs) -> Result<()> {
    let source = open_source(&args.source)?;
    let raw: Vec<MetricRecord> = source
        .fetch_json(METRICS_PATH)
        .await
        .context("failed to load metrics")?;

    let store = MetricsStore::load(&raw);
    info!(
        rows = raw.len(),
        aggregated_rows = store.records().len(),
        models = store.distinct_values(KeyField::Model).len(),
        languages = store.distinct_values(KeyField::Language).len(),
        "loaded metrics"
    );

    if !store
        .distinct_values(KeyField::Postprocess)
        .iter()
        .any(|value| value == &args.postprocessor)
    {
        warn!(
            postprocessor = %args.postprocessor,
            available = ?store.distinct_values(KeyField::Postprocess),
            "no metrics recorded for postprocessor"
        );
    }

    let table = store.table(&args.postprocessor);

    if args.json {
        return write_json_stdout(&MetricsReport {
            generated_at: now_utc_string(),
            source: source.describe(),
            table,
        });
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_metrics_text(&mut output, &table)?;
    output.flush()?;
    Ok(())
}

/// Tab-separated rendering with one header row of metric groups and one of languages.
fn write_metrics_text<W: Write>(output: &mut W, table: &MetricsTable) -> Result<()> {
    writeln!(output, "Postprocessor: {}", table.postprocess)?;

    let mut group_header = vec![String::new(), String::new()];
    let mut language_header = vec!["Model".to_string(), "Template".to_string()];
    for group in &table.metrics {
        for (position, language) in group.languages.iter().enumerate() {
            group_header.push(if position == 0 {
                group.description.to_string()
            } else {
                String::new()
            });
            language_header.push(language.clone());
        }
    }
    writeln!(output, "{}", group_header.join("\t"))?;
    writeln!(output, "{}", language_header.join("\t"))?;

    let mut previous_model: Option<&str> = None;
    for row in &table.rows {
        let model = if previous_model == Some(row.model.as_str()) {
            ""
        } else {
            row.model.as_str()
        };
        previous_model = Some(row.model.as_str());
        writeln!(
            output,
            "{}\t{}\t{}",
            model,
            row.template,
            row.cells.join("\t")
        )?;
    }

    Ok(())
}
