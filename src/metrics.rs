use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::model::{AVERAGE_LANGUAGE, KeyField, MetricName, MetricRecord, MetricsKey};

/// Collapses rows sharing a key. A later row replaces the earlier one but keeps
/// the earlier row's position.
pub fn dedupe_last_write_wins(records: &[MetricRecord]) -> Vec<MetricRecord> {
    let mut positions: HashMap<&MetricsKey, usize> = HashMap::with_capacity(records.len());
    let mut deduped: Vec<MetricRecord> = Vec::with_capacity(records.len());

    for record in records {
        match positions.get(&record.key) {
            Some(&position) => {
                debug!(key = %record.key, "replacing duplicate metric row");
                deduped[position] = record.clone();
            }
            None => {
                positions.insert(&record.key, deduped.len());
                deduped.push(record.clone());
            }
        }
    }

    deduped
}

/// One "Average" row per (model, template, postprocess) group, averaging every
/// real-language row of the group. Existing "Average" rows are never inputs.
pub fn derive_averages(records: &[MetricRecord]) -> Vec<MetricRecord> {
    let mut group_order: Vec<MetricsKey> = Vec::new();
    let mut sums: HashMap<MetricsKey, ([f64; 3], usize)> = HashMap::new();

    for record in records.iter().filter(|record| !record.key.is_average()) {
        let group = MetricsKey {
            language: AVERAGE_LANGUAGE.to_string(),
            ..record.key.clone()
        };
        let entry = sums.entry(group.clone()).or_insert_with(|| {
            group_order.push(group);
            ([0.0; 3], 0)
        });
        for (slot, metric) in entry.0.iter_mut().zip(MetricName::ALL) {
            *slot += record.value(metric);
        }
        entry.1 += 1;
    }

    group_order
        .into_iter()
        .filter_map(|key| {
            let (totals, count) = sums.remove(&key)?;
            if count == 0 {
                return None;
            }
            let count = count as f64;
            Some(MetricRecord {
                key,
                exact_match: totals[0] / count,
                edit_similarity: totals[1] / count,
                stop: totals[2] / count,
            })
        })
        .collect()
}

/// Real rows (deduplicated, incoming "Average" rows dropped) followed by freshly
/// derived averages. Applying it to its own output returns the same rows.
pub fn aggregate(records: &[MetricRecord]) -> Vec<MetricRecord> {
    let mut rows: Vec<MetricRecord> = dedupe_last_write_wins(records)
        .into_iter()
        .filter(|record| !record.key.is_average())
        .collect();
    let averages = derive_averages(&rows);
    rows.extend(averages);
    rows
}

#[derive(Debug, Default)]
pub struct MetricsStore {
    records: Vec<MetricRecord>,
    index: HashMap<MetricsKey, usize>,
    models: Vec<String>,
    languages: Vec<String>,
    templates: Vec<String>,
    postprocessors: Vec<String>,
}

impl MetricsStore {
    pub fn load(raw: &[MetricRecord]) -> Self {
        let records = aggregate(raw);

        let mut store = Self::default();
        let mut has_average = false;
        for (position, record) in records.iter().enumerate() {
            store.index.insert(record.key.clone(), position);
            if record.key.is_average() {
                has_average = true;
                continue;
            }
            push_distinct(&mut store.models, &record.key.model);
            push_distinct(&mut store.languages, &record.key.language);
            push_distinct(&mut store.templates, &record.key.template);
            push_distinct(&mut store.postprocessors, &record.key.postprocess);
        }
        if has_average {
            store.languages.push(AVERAGE_LANGUAGE.to_string());
        }
        store.records = records;
        store
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn record(&self, key: &MetricsKey) -> Option<&MetricRecord> {
        self.index.get(key).map(|&position| &self.records[position])
    }

    /// Two-decimal rendering of one metric, `None` for keys never loaded.
    pub fn lookup(&self, key: &MetricsKey, metric: MetricName) -> Option<String> {
        self.record(key)
            .map(|record| format_two_decimals(record.value(metric)))
    }

    pub fn distinct_values(&self, field: KeyField) -> &[String] {
        match field {
            KeyField::Model => &self.models,
            KeyField::Language => &self.languages,
            KeyField::Template => &self.templates,
            KeyField::Postprocess => &self.postprocessors,
        }
    }

    pub fn table(&self, postprocess: &str) -> MetricsTable {
        let metrics = MetricName::ALL
            .iter()
            .map(|metric| MetricColumnGroup {
                metric: *metric,
                description: metric.description(),
                languages: self.languages.clone(),
            })
            .collect();

        let mut rows = Vec::with_capacity(self.models.len() * self.templates.len());
        for model in &self.models {
            for template in &self.templates {
                let mut cells = Vec::with_capacity(MetricName::ALL.len() * self.languages.len());
                for metric in MetricName::ALL {
                    for language in &self.languages {
                        let key = MetricsKey::new(model, language, template, postprocess);
                        cells.push(self.lookup(&key, metric).unwrap_or_default());
                    }
                }
                rows.push(MetricsTableRow {
                    model: model.clone(),
                    template: template.clone(),
                    cells,
                });
            }
        }

        MetricsTable {
            postprocess: postprocess.to_string(),
            metrics,
            rows,
        }
    }
}

/// Fixed two-decimal rendering where an exact tie rounds away from zero
/// (`0.125` -> `0.13`) instead of to even.
fn format_two_decimals(value: f64) -> String {
    // Only odd multiples of 1/8 sit exactly halfway between two cents.
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths.rem_euclid(2.0) == 1.0 {
        let cents = (value.abs() * 100.0).ceil().copysign(value);
        return format!("{:.2}", cents / 100.0);
    }
    format!("{value:.2}")
}

fn push_distinct(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|existing| existing == value) {
        values.push(value.to_string());
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricColumnGroup {
    pub metric: MetricName,
    pub description: &'static str,
    pub languages: Vec<String>,
}

/// Cells are metric-major: every language of the first metric, then the next.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsTableRow {
    pub model: String,
    pub template: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsTable {
    pub postprocess: String,
    pub metrics: Vec<MetricColumnGroup>,
    pub rows: Vec<MetricsTableRow>,
}

#[cfg(test)]
mod tests {
    use super::{
        MetricsStore, aggregate, dedupe_last_write_wins, derive_averages, format_two_decimals,
    };
    use crate::model::{AVERAGE_LANGUAGE, KeyField, MetricName, MetricRecord, MetricsKey};

    fn row(
        model: &str,
        language: &str,
        template: &str,
        postprocess: &str,
        values: (f64, f64, f64),
    ) -> MetricRecord {
        MetricRecord {
            key: MetricsKey::new(model, language, template, postprocess),
            exact_match: values.0,
            edit_similarity: values.1,
            stop: values.2,
        }
    }

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    fn two_language_rows() -> Vec<MetricRecord> {
        vec![
            row("A", "py", "t1", "none", (80.0, 0.9, 50.0)),
            row("A", "js", "t1", "none", (60.0, 0.7, 40.0)),
        ]
    }

    #[test]
    fn derive_averages_means_each_metric_across_languages() {
        let averages = derive_averages(&two_language_rows());
        assert_eq!(averages.len(), 1);

        let average = &averages[0];
        assert_eq!(average.key, MetricsKey::new("A", AVERAGE_LANGUAGE, "t1", "none"));
        assert!(approx(average.exact_match, 70.0));
        assert!(approx(average.edit_similarity, 0.8));
        assert!(approx(average.stop, 45.0));
    }

    #[test]
    fn derive_averages_groups_by_model_template_and_postprocess() {
        let rows = vec![
            row("A", "py", "t1", "none", (10.0, 1.0, 1.0)),
            row("A", "py", "t2", "none", (20.0, 2.0, 2.0)),
            row("A", "py", "t1", "suffix", (30.0, 3.0, 3.0)),
            row("B", "py", "t1", "none", (40.0, 4.0, 4.0)),
            row("A", "js", "t1", "none", (50.0, 5.0, 5.0)),
        ];

        let averages = derive_averages(&rows);
        let keys: Vec<String> = averages.iter().map(|row| row.key.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "A/Average/t1/none",
                "A/Average/t2/none",
                "A/Average/t1/suffix",
                "B/Average/t1/none",
            ]
        );
        assert!(approx(averages[0].exact_match, 30.0));
        assert!(approx(averages[1].exact_match, 20.0));
    }

    #[test]
    fn derive_averages_ignores_existing_average_rows() {
        let mut rows = two_language_rows();
        rows.push(row("A", AVERAGE_LANGUAGE, "t1", "none", (1000.0, 1000.0, 1000.0)));
        rows.push(row("C", AVERAGE_LANGUAGE, "t1", "none", (5.0, 5.0, 5.0)));

        let averages = derive_averages(&rows);
        assert_eq!(averages.len(), 1);
        assert!(approx(averages[0].exact_match, 70.0));
    }

    #[test]
    fn aggregate_is_idempotent() {
        let once = aggregate(&two_language_rows());
        let twice = aggregate(&once);
        assert_eq!(once, twice);
        assert_eq!(
            once.iter().filter(|row| row.key.is_average()).count(),
            1
        );
    }

    #[test]
    fn aggregate_of_empty_input_is_empty() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn duplicate_keys_resolve_last_write_wins() {
        let rows = vec![
            row("A", "py", "t1", "none", (10.0, 0.1, 1.0)),
            row("A", "js", "t1", "none", (20.0, 0.2, 2.0)),
            row("A", "py", "t1", "none", (30.0, 0.3, 3.0)),
        ];

        let deduped = dedupe_last_write_wins(&rows);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].key.language, "py");
        assert!(approx(deduped[0].exact_match, 30.0));

        let store = MetricsStore::load(&rows);
        let key = MetricsKey::new("A", "py", "t1", "none");
        assert_eq!(store.lookup(&key, MetricName::ExactMatch).as_deref(), Some("30.00"));
        let average = MetricsKey::new("A", AVERAGE_LANGUAGE, "t1", "none");
        assert_eq!(store.lookup(&average, MetricName::ExactMatch).as_deref(), Some("25.00"));
    }

    #[test]
    fn lookup_formats_two_decimals_and_blanks_unknown_keys() {
        let store = MetricsStore::load(&two_language_rows());

        let key = MetricsKey::new("A", "py", "t1", "none");
        assert_eq!(store.lookup(&key, MetricName::EditSimilarity).as_deref(), Some("0.90"));
        let average = MetricsKey::new("A", AVERAGE_LANGUAGE, "t1", "none");
        assert_eq!(store.lookup(&average, MetricName::EditSimilarity).as_deref(), Some("0.80"));
        assert_eq!(store.lookup(&average, MetricName::Stop).as_deref(), Some("45.00"));

        let unknown = MetricsKey::new("Z", "py", "t1", "none");
        assert_eq!(store.lookup(&unknown, MetricName::ExactMatch), None);
    }

    #[test]
    fn lookup_rounds_exact_ties_away_from_zero() {
        let rows = vec![
            row("A", "py", "t1", "none", (80.25, 0.125, 0.5)),
            row("A", "js", "t1", "none", (80.0, 0.125, 0.25)),
        ];
        let store = MetricsStore::load(&rows);

        let average = MetricsKey::new("A", AVERAGE_LANGUAGE, "t1", "none");
        assert_eq!(store.lookup(&average, MetricName::ExactMatch).as_deref(), Some("80.13"));
        assert_eq!(store.lookup(&average, MetricName::EditSimilarity).as_deref(), Some("0.13"));
        assert_eq!(store.lookup(&average, MetricName::Stop).as_deref(), Some("0.38"));

        let py = MetricsKey::new("A", "py", "t1", "none");
        assert_eq!(store.lookup(&py, MetricName::EditSimilarity).as_deref(), Some("0.13"));
    }

    #[test]
    fn two_decimal_formatting_only_adjusts_exact_ties() {
        assert_eq!(format_two_decimals(80.125), "80.13");
        assert_eq!(format_two_decimals(2.875), "2.88");
        assert_eq!(format_two_decimals(-0.125), "-0.13");
        assert_eq!(format_two_decimals(1.005), "1.00");
        assert_eq!(format_two_decimals(45.0), "45.00");
        assert_eq!(format_two_decimals(0.8), "0.80");
        assert_eq!(format_two_decimals(33.333), "33.33");
    }

    #[test]
    fn distinct_values_keep_first_seen_order_with_average_last() {
        let rows = vec![
            row("B", "rust", "inside", "none", (1.0, 1.0, 1.0)),
            row("A", "py", "outside", "suffix", (1.0, 1.0, 1.0)),
            row("B", "py", "outside", "none", (1.0, 1.0, 1.0)),
            row("A", AVERAGE_LANGUAGE, "outside", "none", (1.0, 1.0, 1.0)),
        ];
        let store = MetricsStore::load(&rows);

        assert_eq!(store.distinct_values(KeyField::Model), ["B", "A"]);
        assert_eq!(
            store.distinct_values(KeyField::Language),
            ["rust", "py", AVERAGE_LANGUAGE]
        );
        assert_eq!(store.distinct_values(KeyField::Template), ["inside", "outside"]);
        assert_eq!(store.distinct_values(KeyField::Postprocess), ["none", "suffix"]);
    }

    #[test]
    fn empty_store_has_no_average_language() {
        let store = MetricsStore::default();
        assert!(store.distinct_values(KeyField::Language).is_empty());

        let store = MetricsStore::load(&[]);
        assert!(store.distinct_values(KeyField::Language).is_empty());
    }

    #[test]
    fn table_lays_out_metric_major_cells_with_blanks() {
        let rows = vec![
            row("A", "py", "t1", "none", (80.0, 0.9, 50.0)),
            row("A", "js", "t1", "none", (60.0, 0.7, 40.0)),
            row("A", "py", "t2", "none", (10.0, 0.1, 5.0)),
        ];
        let store = MetricsStore::load(&rows);
        let table = store.table("none");

        assert_eq!(table.metrics.len(), 3);
        assert_eq!(table.metrics[0].description, "Exact Match %");
        assert_eq!(table.metrics[0].languages, ["py", "js", AVERAGE_LANGUAGE]);
        assert_eq!(table.rows.len(), 2);

        let first = &table.rows[0];
        assert_eq!((first.model.as_str(), first.template.as_str()), ("A", "t1"));
        assert_eq!(
            first.cells,
            ["80.00", "60.00", "70.00", "0.90", "0.70", "0.80", "50.00", "40.00", "45.00"]
        );

        let second = &table.rows[1];
        assert_eq!(&second.cells[..3], ["10.00", "", "10.00"]);
    }
}
