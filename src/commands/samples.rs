use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::SamplesArgs;
use crate::model::{JoinedSample, Manifest, Selection};
use crate::samples::{SampleSession, load_samples};
use crate::source::MANIFEST_PATH;
use crate::util::{now_utc_string, write_json_stdout};

use super::open_source;

#[derive(Debug, Serialize)]
struct SamplesReport<'a> {
    generated_at: String,
    selection: &'a Selection,
    count: usize,
    position: String,
    samples: Vec<&'a JoinedSample>,
}

pub async fn run(args: SamplesArgs) -> Result<()> {
    let source = open_source(&args.source)?;
    let manifest: Manifest = source
        .fetch_json(MANIFEST_PATH)
        .await
        .context("failed to load samples manifest")?;

    let selection = Selection::resolve(
        &manifest,
        args.model.as_deref(),
        args.language.as_deref(),
        args.template.as_deref(),
        args.postprocessor.as_deref(),
    )?;
    info!(selection = %selection, "resolved sample selection");

    let mut session = SampleSession::default();
    let ticket = session.begin(selection);
    let generation = ticket.generation;
    let samples = load_samples(&source, &ticket)
        .await
        .with_context(|| format!("failed to load samples for {}", ticket.selection))?;
    if !session.apply(ticket, samples) {
        warn!(generation, "discarded samples for superseded selection");
        return Ok(());
    }

    session.cursor_mut().seek(args.index);
    if session.cursor().current() != Some(args.index) && !session.samples().is_empty() {
        warn!(
            requested = args.index,
            count = session.cursor().count(),
            "sample index out of range, clamped"
        );
    }

    let shown: Vec<&JoinedSample> = if args.all {
        session.samples().iter().collect()
    } else {
        session.current().into_iter().collect()
    };

    let selection = session
        .selection()
        .context("sample session has no applied selection")?;

    if args.json {
        return write_json_stdout(&SamplesReport {
            generated_at: now_utc_string(),
            selection,
            count: session.samples().len(),
            position: session.cursor().position(),
            samples: shown,
        });
    }

    let highlight = io::stdout().is_terminal();
    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Selection: {selection}")?;
    if shown.is_empty() {
        writeln!(output, "No samples.")?;
    } else if !args.all {
        writeln!(output, "Sample {}", session.cursor().position())?;
    }
    for sample in shown {
        write_sample_text(&mut output, sample, args.show_prompt, highlight)?;
    }
    output.flush()?;
    Ok(())
}

fn write_sample_text<W: Write>(
    output: &mut W,
    sample: &JoinedSample,
    show_prompt: bool,
    highlight: bool,
) -> Result<()> {
    let result = &sample.result;
    let window = &sample.output.window;

    writeln!(output, "== {}", sample.task_id())?;
    if show_prompt {
        writeln!(output, "-- templated prompt")?;
        writeln!(output, "{}", sample.output.output.templated)?;
    }
    writeln!(
        output,
        "Exact Match: {}  Edit Similarity: {}  Stop: {}",
        result.exact_match, result.edit_similarity, result.stop
    )?;
    writeln!(output, "-- completion")?;

    let generated = if highlight {
        result.postprocessed.red().to_string()
    } else {
        result.postprocessed.clone()
    };
    writeln!(
        output,
        "{}{}{}",
        window.truncated_prefix, generated, window.truncated_suffix
    )?;
    Ok(())
}
