use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ViewerError;
use crate::model::Selection;

pub const METRICS_PATH: &str = "metrics.json";
pub const MANIFEST_PATH: &str = "samples/manifest.json";

pub fn inputs_path(language: &str) -> String {
    format!("samples/_/{language}/inputs.jsonl")
}

pub fn outputs_path(selection: &Selection) -> String {
    format!(
        "samples/{}/{}/{}/outputs.jsonl",
        selection.model, selection.language, selection.template
    )
}

pub fn results_path(selection: &Selection) -> String {
    format!(
        "samples/{}/{}/{}/{}/results.jsonl",
        selection.model, selection.language, selection.template, selection.postprocessor
    )
}

/// Read-only root of the published static files.
#[derive(Debug, Clone)]
pub enum StaticSource {
    Directory(PathBuf),
    Http {
        client: reqwest::Client,
        base_url: String,
    },
}

impl StaticSource {
    pub fn from_base(base: &str, timeout: Duration) -> Result<Self, ViewerError> {
        if base.starts_with("http://") || base.starts_with("https://") {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|source| ViewerError::Http {
                    location: base.to_string(),
                    source,
                })?;
            Ok(Self::Http {
                client,
                base_url: base.trim_end_matches('/').to_string(),
            })
        } else {
            Ok(Self::Directory(PathBuf::from(base)))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Directory(root) => root.display().to_string(),
            Self::Http { base_url, .. } => base_url.clone(),
        }
    }

    pub fn location(&self, relative_path: &str) -> String {
        match self {
            Self::Directory(root) => root.join(relative_path).display().to_string(),
            Self::Http { base_url, .. } => format!("{base_url}/{relative_path}"),
        }
    }

    pub async fn fetch_text(&self, relative_path: &str) -> Result<String, ViewerError> {
        let location = self.location(relative_path);
        debug!(location = %location, "fetching static file");

        match self {
            Self::Directory(root) => {
                let path = root.join(relative_path);
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => Ok(text),
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        Err(ViewerError::Fetch {
                            location,
                            status: 404,
                        })
                    }
                    Err(source) => Err(ViewerError::Io { location, source }),
                }
            }
            Self::Http { client, .. } => {
                let response = client
                    .get(&location)
                    .send()
                    .await
                    .map_err(|source| ViewerError::Http {
                        location: location.clone(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ViewerError::Fetch {
                        location,
                        status: status.as_u16(),
                    });
                }

                response
                    .text()
                    .await
                    .map_err(|source| ViewerError::Http { location, source })
            }
        }
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        relative_path: &str,
    ) -> Result<T, ViewerError> {
        let text = self.fetch_text(relative_path).await?;
        parse_json(&self.location(relative_path), &text)
    }
}

pub fn parse_json<T: DeserializeOwned>(location: &str, text: &str) -> Result<T, ViewerError> {
    serde_json::from_str(text).map_err(|source| ViewerError::Parse {
        location: location.to_string(),
        line: None,
        source,
    })
}

/// Parses newline-delimited JSON. Only the empty line left by a final newline is
/// skipped; any other line that is not a JSON object fails the whole document.
pub fn parse_jsonl<T: DeserializeOwned>(location: &str, text: &str) -> Result<Vec<T>, ViewerError> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let line_text = line.strip_suffix('\r').unwrap_or(line);
            serde_json::from_str(line_text).map_err(|source| ViewerError::Parse {
                location: location.to_string(),
                line: Some(index + 1),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::Deserialize;

    use super::{StaticSource, inputs_path, outputs_path, parse_jsonl, results_path};
    use crate::error::ViewerError;
    use crate::model::Selection;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    fn selection() -> Selection {
        Selection {
            model: "granite-3.3-8b-base".to_string(),
            language: "python".to_string(),
            template: "outside".to_string(),
            postprocessor: "suffix".to_string(),
        }
    }

    #[test]
    fn partition_paths_follow_published_layout() {
        let selection = selection();
        assert_eq!(inputs_path("python"), "samples/_/python/inputs.jsonl");
        assert_eq!(
            outputs_path(&selection),
            "samples/granite-3.3-8b-base/python/outside/outputs.jsonl"
        );
        assert_eq!(
            results_path(&selection),
            "samples/granite-3.3-8b-base/python/outside/suffix/results.jsonl"
        );
    }

    #[test]
    fn parse_jsonl_drops_only_the_trailing_empty_line() {
        let rows: Vec<Row> =
            parse_jsonl("rows.jsonl", "{\"id\": 1}\n{\"id\": 2}\n").expect("rows should parse");
        assert_eq!(rows, vec![Row { id: 1 }, Row { id: 2 }]);

        let rows: Vec<Row> =
            parse_jsonl("rows.jsonl", "{\"id\": 1}\r\n{\"id\": 2}").expect("rows should parse");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn parse_jsonl_rejects_blank_interior_line() {
        let err = parse_jsonl::<Row>("rows.jsonl", "{\"id\": 1}\n\n{\"id\": 2}\n").unwrap_err();
        assert!(matches!(err, ViewerError::Parse { line: Some(2), .. }));
    }

    #[test]
    fn parse_jsonl_reports_first_malformed_line() {
        let err = parse_jsonl::<Row>("rows.jsonl", "{\"id\": 1}\n{\"id\": \n{oops}\n").unwrap_err();
        match err {
            ViewerError::Parse { location, line, .. } => {
                assert_eq!(location, "rows.jsonl");
                assert_eq!(line, Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_jsonl_of_empty_document_is_empty() {
        let rows: Vec<Row> = parse_jsonl("rows.jsonl", "").expect("empty document should parse");
        assert!(rows.is_empty());
    }

    #[test]
    fn from_base_picks_source_kind_by_scheme() {
        let http = StaticSource::from_base("https://example.org/bench/", Duration::from_secs(1))
            .expect("http source should build");
        assert_eq!(
            http.location("metrics.json"),
            "https://example.org/bench/metrics.json"
        );

        let dir = StaticSource::from_base("web/public", Duration::from_secs(1))
            .expect("directory source should build");
        assert!(matches!(dir, StaticSource::Directory(_)));
    }

    #[tokio::test]
    async fn missing_local_file_reports_not_found_status() {
        let root = tempfile::tempdir().expect("tempdir");
        let source = StaticSource::Directory(root.path().to_path_buf());

        let err = source.fetch_text("metrics.json").await.unwrap_err();
        assert!(matches!(err, ViewerError::Fetch { status: 404, .. }));
    }
}
