//! Concurrent fetch stage.
//!
//! Issues one HTTP GET per target over a shared, pooled client and
//! collects an index-aligned record per target. Individual failures
//! never abort sibling requests; the stage completes only once every
//! dispatched request has completed.

use crate::models::{FetchError, FetchRecord};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Settings for the fetch stage.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout in seconds. A hung request fails after this
    /// long instead of stalling the whole stage.
    pub timeout_seconds: u64,
    /// Maximum number of requests in flight at once.
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            concurrency: 8,
        }
    }
}

/// The fetch stage: a pooled HTTP client plus dispatch settings.
///
/// The client is shared across all concurrent requests (connection
/// reuse) and dropped when the fetcher goes out of scope at the end of
/// the stage.
pub struct Fetcher {
    client: reqwest::Client,
    concurrency: usize,
}

impl Fetcher {
    /// Creates a fetcher with a client carrying the configured
    /// per-request timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Fetches all targets concurrently.
    ///
    /// Returns exactly one record per target, index-aligned with the
    /// input (record *i* corresponds to target *i*) regardless of
    /// wall-clock completion order: completed results land in indexed
    /// slots rather than being appended as they finish.
    pub async fn fetch_all(&self, targets: &[String]) -> Vec<FetchRecord> {
        let completed: Vec<(usize, FetchRecord)> = stream::iter(targets.iter().enumerate())
            .map(|(index, target)| {
                let client = self.client.clone();
                let url = target.clone();
                async move {
                    let record = fetch_one(&client, &url).await;
                    (index, record)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut slots: Vec<Option<FetchRecord>> = (0..targets.len()).map(|_| None).collect();
        for (index, record) in completed {
            slots[index] = Some(record);
        }

        // Every slot is filled: buffer_unordered drains the whole input.
        slots.into_iter().flatten().collect()
    }
}

/// Fetches a single target, converting every error into a failure
/// record. Nothing raised here crosses the stage boundary.
async fn fetch_one(client: &reqwest::Client, url: &str) -> FetchRecord {
    match try_fetch(client, url).await {
        Ok(payload) => {
            debug!("Fetched {} ({} fields)", url, payload.len());
            FetchRecord::success(url, payload)
        }
        Err(error) => {
            warn!("Fetch failed for {}: {}", url, error);
            FetchRecord::failure(url, error)
        }
    }
}

/// Performs the GET and decodes the body as a JSON object.
async fn try_fetch(client: &reqwest::Client, url: &str) -> Result<Map<String, Value>, FetchError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body: Value = response.json().await?;
    match body {
        Value::Object(map) => Ok(map),
        other => Err(FetchError::Decode {
            url: url.to_string(),
            found: json_type_name(&other).to_string(),
        }),
    }
}

/// Human-readable name of a JSON value's shape, for decode messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchOutcome;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(record: &FetchRecord) -> &str {
        match &record.outcome {
            FetchOutcome::Failure(message) => message,
            FetchOutcome::Payload(_) => panic!("expected a failure record"),
        }
    }

    #[tokio::test]
    async fn test_200_object_yields_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let url = format!("{}/item", server.uri());
        let records = fetcher.fetch_all(&[url.clone()]).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, url);
        match &records[0].outcome {
            FetchOutcome::Payload(map) => assert_eq!(map.get("id"), Some(&json!(1))),
            other => panic!("expected payload, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_404_yields_failure_with_target_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let url = format!("{}/missing", server.uri());
        let records = fetcher.fetch_all(&[url.clone()]).await;

        assert_eq!(records.len(), 1);
        assert!(records[0].is_failure());
        assert!(message(&records[0]).contains(&url));
        assert!(message(&records[0]).contains("404"));
    }

    #[tokio::test]
    async fn test_connection_refused_yields_failure_not_panic() {
        // Port 1 is never bound; the connection is refused immediately.
        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let records = fetcher
            .fetch_all(&["http://127.0.0.1:1/unreachable".to_string()])
            .await;

        assert_eq!(records.len(), 1);
        assert!(records[0].is_failure());
        assert!(!message(&records[0]).is_empty());
    }

    #[tokio::test]
    async fn test_slow_response_times_out_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 1}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = FetchConfig {
            timeout_seconds: 1,
            concurrency: 4,
        };
        let fetcher = Fetcher::new(&config).unwrap();
        let records = fetcher.fetch_all(&[format!("{}/slow", server.uri())]).await;

        assert_eq!(records.len(), 1);
        assert!(records[0].is_failure());
    }

    #[tokio::test]
    async fn test_non_object_body_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let records = fetcher.fetch_all(&[format!("{}/list", server.uri())]).await;

        assert_eq!(records.len(), 1);
        assert!(records[0].is_failure());
        assert!(message(&records[0]).contains("JSON object"));
    }

    #[tokio::test]
    async fn test_results_are_index_aligned_with_mixed_outcomes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
            .mount(&server)
            .await;

        let targets = vec![
            format!("{}/a", server.uri()),
            format!("{}/b", server.uri()),
            format!("{}/c", server.uri()),
        ];

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let records = fetcher.fetch_all(&targets).await;

        assert_eq!(records.len(), targets.len());
        for (record, target) in records.iter().zip(&targets) {
            assert_eq!(&record.target, target);
        }
        assert!(!records[0].is_failure());
        assert!(records[1].is_failure());
        assert!(!records[2].is_failure());
    }
}
