use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Sole success sentinel accepted from the `/status` probe.
pub const SERVER_UP: &str = "Server is up and running";

const SEARCH_TIMEOUT_SECS: u64 = 120;
const STATUS_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    Local,
    Global,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub context_data: ContextData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContextData {
    #[serde(default)]
    pub entities: Vec<RemoteItem>,
    #[serde(default)]
    pub relationships: Vec<RemoteItem>,
    #[serde(default)]
    pub reports: Vec<RemoteItem>,
    #[serde(default)]
    pub sources: Vec<RemoteItem>,
    #[serde(default, alias = "claims")]
    pub covariates: Vec<RemoteItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteItem {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

fn search_blocking(api_url: &str, query: &str, mode: SearchMode) -> Result<SearchResponse> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
        .build()
        .context("failed to build search client")?;

    let url = format!("{}/search/{}", api_url.trim_end_matches('/'), mode.as_str());
    client
        .post(&url)
        .json(&serde_json::json!({ "query": query }))
        .send()
        .with_context(|| format!("search request to {url} failed"))?
        .error_for_status()
        .context("search request rejected")?
        .json::<SearchResponse>()
        .context("invalid search response payload")
}

fn status_blocking(api_url: &str) -> Result<bool> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(STATUS_TIMEOUT_SECS))
        .build()
        .context("failed to build status client")?;

    let url = format!("{}/status", api_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("status probe to {url} failed"))?
        .json::<StatusResponse>()
        .context("invalid status payload")?;

    Ok(response.status == SERVER_UP)
}

/// Runs the search off-thread; hover/click handling never waits on it.
pub fn spawn_search(
    api_url: String,
    query: String,
    mode: SearchMode,
) -> Receiver<Result<SearchResponse, String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = search_blocking(&api_url, &query, mode).map_err(|error| error.to_string());
        let _ = tx.send(result);
    });
    rx
}

/// Probe failure is just "server down", never an error surfaced to the view.
pub fn spawn_status_probe(api_url: String) -> Receiver<bool> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let up = match status_blocking(&api_url) {
            Ok(up) => up,
            Err(error) => {
                log::debug!("status probe failed: {error:#}");
                false
            }
        };
        let _ = tx.send(up);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_data_tolerates_missing_keys_and_claims_alias() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"context_data": {"entities": [{"id": 5}], "claims": [{"id": "c-1"}]}}"#,
        )
        .unwrap();
        assert_eq!(parsed.context_data.entities.len(), 1);
        assert_eq!(parsed.context_data.covariates.len(), 1);
        assert!(parsed.context_data.relationships.is_empty());
        assert!(parsed.context_data.reports.is_empty());
        assert!(parsed.context_data.sources.is_empty());
    }

    #[test]
    fn remote_items_keep_numeric_ids() {
        let parsed: ContextData =
            serde_json::from_str(r#"{"sources": [{"text": "passage"}], "entities": [{"id": 12}]}"#)
                .unwrap();
        assert_eq!(parsed.sources[0].text.as_deref(), Some("passage"));
        assert_eq!(parsed.entities[0].id, Some(Value::from(12)));
    }
}
