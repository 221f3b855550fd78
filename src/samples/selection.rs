use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, bail};

use crate::model::{JoinedSample, KeyField, Manifest, Selection};

/// Picks `requested` when the manifest offers it, else the first offered value.
pub fn resolve_option(requested: Option<&str>, options: &[String]) -> Option<String> {
    let first = options.first()?;
    let chosen = requested
        .and_then(|value| options.iter().find(|option| option.as_str() == value))
        .unwrap_or(first);
    Some(chosen.clone())
}

impl Selection {
    pub fn resolve(
        manifest: &Manifest,
        model: Option<&str>,
        language: Option<&str>,
        template: Option<&str>,
        postprocessor: Option<&str>,
    ) -> Result<Self> {
        let pick = |field: KeyField, requested: Option<&str>| -> Result<String> {
            match resolve_option(requested, manifest.options(field)) {
                Some(value) => Ok(value),
                None => bail!("manifest lists no {} options", field.as_str()),
            }
        };

        Ok(Self {
            model: pick(KeyField::Model, model)?,
            language: pick(KeyField::Language, language)?,
            template: pick(KeyField::Template, template)?,
            postprocessor: pick(KeyField::Postprocess, postprocessor)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    pub generation: u64,
    pub selection: Selection,
}

/// Hands out one ticket per selection change; only the newest ticket is current.
#[derive(Debug, Default)]
pub struct SelectionGuard {
    generation: AtomicU64,
}

impl SelectionGuard {
    pub fn begin(&self, selection: Selection) -> SelectionTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        SelectionTicket {
            generation,
            selection,
        }
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleCursor {
    index: usize,
    count: usize,
}

impl SampleCursor {
    pub fn new(count: usize) -> Self {
        Self { index: 0, count }
    }

    pub fn current(&self) -> Option<usize> {
        (self.count > 0).then_some(self.index)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.count.saturating_sub(1));
    }

    pub fn position(&self) -> String {
        match self.current() {
            Some(index) => format!("{} / {}", index + 1, self.count),
            None => "0 / 0".to_string(),
        }
    }
}

/// Samples of the most recently applied selection plus the browsing position.
#[derive(Debug, Default)]
pub struct SampleSession {
    guard: SelectionGuard,
    selection: Option<Selection>,
    samples: Vec<JoinedSample>,
    cursor: SampleCursor,
}

impl SampleSession {
    pub fn begin(&self, selection: Selection) -> SelectionTicket {
        self.guard.begin(selection)
    }

    /// Installs `samples` unless a newer selection has begun since `ticket` was issued.
    pub fn apply(&mut self, ticket: SelectionTicket, samples: Vec<JoinedSample>) -> bool {
        if !self.guard.is_current(&ticket) {
            return false;
        }
        self.cursor = SampleCursor::new(samples.len());
        self.samples = samples;
        self.selection = Some(ticket.selection);
        true
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn samples(&self) -> &[JoinedSample] {
        &self.samples
    }

    pub fn cursor(&self) -> &SampleCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut SampleCursor {
        &mut self.cursor
    }

    pub fn current(&self) -> Option<&JoinedSample> {
        self.cursor
            .current()
            .and_then(|index| self.samples.get(index))
    }
}
