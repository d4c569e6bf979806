//! Data models for the fetch pipeline.
//!
//! This module contains the core data structures shared across the
//! fetch and aggregation stages: per-target outcomes, the fetch error
//! taxonomy, and the record type that ties a target to its result.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Column name under which failure messages are recorded.
///
/// Failure records contribute exactly one field with this name; the
/// aggregation stage later drops any row carrying a non-empty value in
/// this column.
pub const ERROR_COLUMN: &str = "error";

/// Everything that can go wrong while fetching a single target.
///
/// All three kinds are neutralized at the fetch stage boundary: they
/// become failure records (ordinary rows), never errors raised past
/// the stage.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-200 status.
    #[error("Failed to fetch from {url}, Status code: {status}")]
    Status { url: String, status: u16 },

    /// The request itself failed: connection refused, timeout, DNS
    /// failure, or a body that could not be decoded as JSON.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The body decoded as JSON but is not a key/value object.
    #[error("Invalid payload from {url}: expected a JSON object, got {found}")]
    Decode { url: String, found: String },
}

/// Per-target outcome: exactly one of the two shapes, produced once
/// per fetch attempt and never mutated afterward.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A 200 response whose body decoded to a JSON object.
    Payload(Map<String, Value>),
    /// Any failure, collapsed to its descriptive message.
    Failure(String),
}

impl FetchOutcome {
    /// Whether this outcome is a failure record.
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failure(_))
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Payload(map) => write!(f, "payload with {} fields", map.len()),
            FetchOutcome::Failure(message) => write!(f, "failure: {}", message),
        }
    }
}

/// The result of fetching one target, index-aligned with the input
/// target list (record *i* corresponds to target *i*).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRecord {
    /// The URL this record was fetched from.
    pub target: String,
    /// The outcome of the fetch attempt.
    pub outcome: FetchOutcome,
}

impl FetchRecord {
    /// Creates a success record from a decoded JSON object.
    pub fn success(target: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            target: target.into(),
            outcome: FetchOutcome::Payload(payload),
        }
    }

    /// Creates a failure record from a fetch error, collapsing it to
    /// its textual description.
    pub fn failure(target: impl Into<String>, error: FetchError) -> Self {
        Self {
            target: target.into(),
            outcome: FetchOutcome::Failure(error.to_string()),
        }
    }

    /// Whether this record is a failure.
    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure()
    }

    /// The field names this record contributes to the column union, in
    /// the record's own key order.
    ///
    /// Success payloads contribute their own keys; failure records
    /// contribute the single error-message column.
    pub fn field_names(&self) -> Vec<&str> {
        match &self.outcome {
            FetchOutcome::Payload(map) => map.keys().map(String::as_str).collect(),
            FetchOutcome::Failure(_) => vec![ERROR_COLUMN],
        }
    }

    /// The value this record holds for a given column, if any.
    pub fn field(&self, column: &str) -> Option<Value> {
        match &self.outcome {
            FetchOutcome::Payload(map) => map.get(column).cloned(),
            FetchOutcome::Failure(message) if column == ERROR_COLUMN => {
                Some(Value::String(message.clone()))
            }
            FetchOutcome::Failure(_) => None,
        }
    }
}
