//! # Remote Service
//!
//! The remote story API is an external collaborator. This module pins down
//! the contract the core relies on; [`http::HttpRemote`] is the production
//! implementation.
//!
//! ## Submission
//!
//! [`RemoteService::submit`] sends a record's domain fields. The outcome has
//! three shapes, and the outbox treats the last two the same way (the entry
//! stays queued):
//!
//! - `Ok(SubmitResponse { error: false, .. })`: accepted.
//! - `Ok(SubmitResponse { error: true, message })`: the remote was reached and
//!   declined the record.
//! - `Err(_)`: the remote was not reached, or the call failed mid-flight.
//!
//! Submissions may be repeated for the same record (at-least-once delivery).
//! [`Submission::client_id`] carries the locally generated id so the remote can
//! treat repeats as one logical submission.
//!
//! ## Listing
//!
//! The listing endpoint answers either with a bare JSON array of records or
//! with an envelope object holding the array under `listStory`.
//! [`parse_listing`] accepts both; an envelope flagged `"error": true` becomes
//! [`CityCareError::Rejected`] and anything else is a
//! [`CityCareError::ShapeMismatch`]. Items that do not decode as records are
//! skipped with a warning; a non-empty listing with no usable item at all is
//! a shape mismatch.

use crate::error::{CityCareError, Result};
use crate::model::Record;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

pub mod http;

/// Envelope field holding the records of a listing response.
pub const LISTING_FIELD: &str = "listStory";

/// The domain fields sent for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Sent as the idempotency key, not in the body.
    #[serde(skip)]
    pub client_id: String,
    pub description: String,
    #[serde(rename = "photo", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl From<&Record> for Submission {
    fn from(record: &Record) -> Self {
        Self {
            client_id: record.id.clone(),
            description: record.description.clone(),
            photo_url: record.photo_url.clone(),
            lat: record.lat,
            lon: record.lon,
        }
    }
}

/// Application-level answer of the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: String,
}

impl SubmitResponse {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        !self.error
    }
}

#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Submit one record.
    async fn submit(&self, submission: &Submission) -> Result<SubmitResponse>;

    /// Fetch the live listing.
    async fn list(&self) -> Result<Vec<Record>>;
}

#[async_trait]
impl<T: RemoteService + ?Sized> RemoteService for Arc<T> {
    async fn submit(&self, submission: &Submission) -> Result<SubmitResponse> {
        (**self).submit(submission).await
    }

    async fn list(&self) -> Result<Vec<Record>> {
        (**self).list().await
    }
}

/// Decode a listing response in either accepted shape.
pub fn parse_listing(value: Value) -> Result<Vec<Record>> {
    match value {
        Value::Array(items) => decode_records(items),
        Value::Object(mut envelope) => match envelope.remove(LISTING_FIELD) {
            Some(Value::Array(items)) => decode_records(items),
            Some(other) => Err(CityCareError::ShapeMismatch(format!(
                "`{}` is {}, expected an array",
                LISTING_FIELD,
                kind(&other)
            ))),
            None if envelope.get("error").and_then(Value::as_bool) == Some(true) => {
                let message = envelope
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("listing failed");
                Err(CityCareError::Rejected(message.to_string()))
            }
            None => Err(CityCareError::ShapeMismatch(format!(
                "object without `{}`",
                LISTING_FIELD
            ))),
        },
        other => Err(CityCareError::ShapeMismatch(format!(
            "listing is {}, expected an array or an envelope",
            kind(&other)
        ))),
    }
}

fn decode_records(items: Vec<Value>) -> Result<Vec<Record>> {
    let total = items.len();
    let mut records = Vec::with_capacity(total);
    let mut last_error = None;
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Record>(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(index, error = %e, "skipping listing item that is not a record");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if records.is_empty() => Err(CityCareError::ShapeMismatch(format!(
            "none of {} listing items is a record: {}",
            total, e
        ))),
        _ => Ok(records),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn test_submission_body_omits_client_id() {
        let record = Record::new("pothole")
            .with_id("r1")
            .with_location(-6.2, 106.8);
        let submission = Submission::from(&record);

        assert_eq!(submission.client_id, "r1");
        let body = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            body,
            json!({"description": "pothole", "lat": -6.2, "lon": 106.8})
        );
    }

    #[test]
    fn test_submission_body_sends_photo_field() {
        let record = Record::new("pothole")
            .with_id("r1")
            .with_photo("data:image/jpeg;base64,AAA");

        let body = serde_json::to_value(Submission::from(&record)).unwrap();

        assert_eq!(
            body,
            json!({"description": "pothole", "photo": "data:image/jpeg;base64,AAA"})
        );
    }

    #[test]
    fn test_submit_response_defaults() {
        let ok: SubmitResponse = serde_json::from_value(json!({"message": "Story created"})).unwrap();
        assert!(ok.is_accepted());

        let no: SubmitResponse =
            serde_json::from_value(json!({"error": true, "message": "photo is required"}))
                .unwrap();
        assert!(!no.is_accepted());
        assert_eq!(no.message, "photo is required");
    }

    #[test]
    fn test_parse_bare_array() {
        let records = parse_listing(json!([
            {"id": "a", "description": "one"},
            {"id": "b", "description": "two"}
        ]))
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "b");
    }

    #[test]
    fn test_parse_envelope() {
        let records = parse_listing(json!({
            "error": false,
            "message": "Stories fetched successfully",
            "listStory": [{"id": "story-1", "name": "Dimas", "description": "flood"}]
        }))
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Dimas"));
    }

    #[test]
    fn test_parse_error_envelope_is_rejection() {
        let err = parse_listing(json!({"error": true, "message": "Missing authentication"}))
            .unwrap_err();
        assert!(matches!(err, CityCareError::Rejected(ref m) if m == "Missing authentication"));
    }

    #[test]
    #[traced_test]
    fn test_parse_skips_items_that_are_not_records() {
        let records = parse_listing(json!({
            "listStory": [
                {"id": "story-1", "description": "flood"},
                {"description": "no id"},
                "not even an object",
                {"id": "story-2", "description": "pothole"}
            ]
        }))
        .unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["story-1", "story-2"]);
        assert!(logs_contain("skipping listing item that is not a record"));
    }

    #[test]
    fn test_parse_empty_listing_is_not_an_error() {
        assert!(parse_listing(json!([])).unwrap().is_empty());
        assert!(parse_listing(json!({"listStory": []})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_unrecognized_shapes() {
        for value in [
            json!(42),
            json!("stories"),
            json!({"stories": []}),
            json!({"listStory": {"id": "a"}}),
            json!([{"description": "no id"}]),
        ] {
            let err = parse_listing(value).unwrap_err();
            assert!(matches!(err, CityCareError::ShapeMismatch(_)), "{:?}", err);
        }
    }
}
