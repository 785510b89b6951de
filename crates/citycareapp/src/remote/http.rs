//! HTTP client for the story API

use super::{parse_listing, RemoteService, Submission, SubmitResponse};
use crate::error::{CityCareError, Result};
use crate::model::Record;
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Header carrying [`Submission::client_id`].
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    /// API root, e.g. `https://story-api.dicoding.dev/v1`
    pub base_url: String,
    /// Session token sent as a bearer credential
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HttpRemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://story-api.dicoding.dev/v1".into(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the story API
///
/// # Example
///
/// ```rust,no_run
/// use citycareapp::remote::http::{HttpRemote, HttpRemoteConfig};
/// use citycareapp::remote::RemoteService;
///
/// # async fn example() -> citycareapp::error::Result<()> {
/// let remote = HttpRemote::new(HttpRemoteConfig {
///     token: Some("session-token".into()),
///     ..Default::default()
/// })?;
///
/// let stories = remote.list().await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpRemote {
    config: HttpRemoteConfig,
    client: Client,
}

impl HttpRemote {
    pub fn new(config: HttpRemoteConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = config.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| CityCareError::Api("Invalid session token".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn stories_url(&self) -> String {
        format!("{}/stories", self.config.base_url.trim_end_matches('/'))
    }

    async fn read_body(response: Response) -> Result<(StatusCode, String)> {
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn submit(&self, submission: &Submission) -> Result<SubmitResponse> {
        let response = self
            .client
            .post(self.stories_url())
            .header(IDEMPOTENCY_HEADER, &submission.client_id)
            .json(submission)
            .send()
            .await?;
        let (status, body) = Self::read_body(response).await?;
        debug!(id = %submission.client_id, status = status.as_u16(), "submission answered");

        interpret_submit(status, &body)
    }

    async fn list(&self) -> Result<Vec<Record>> {
        let response = self.client.get(self.stories_url()).send().await?;
        let (status, body) = Self::read_body(response).await?;

        if !status.is_success() {
            // Error envelopes still carry the server's reason
            if let Ok(value) = serde_json::from_str(&body) {
                if let Err(e @ CityCareError::Rejected(_)) = parse_listing(value) {
                    return Err(e);
                }
            }
            return Err(CityCareError::Transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let value = serde_json::from_str(&body)
            .map_err(|e| CityCareError::ShapeMismatch(format!("listing is not JSON: {}", e)))?;
        parse_listing(value)
    }
}

/// Map an HTTP answer of the submission endpoint onto the outcome model.
///
/// - 2xx: the JSON body decides; a body that is not JSON counts as accepted.
/// - 4xx with a JSON body: rejection (the server saw and declined the record).
/// - Everything else: transport failure.
pub(crate) fn interpret_submit(status: StatusCode, body: &str) -> Result<SubmitResponse> {
    let parsed = serde_json::from_str::<SubmitResponse>(body).ok();

    if status.is_success() {
        return Ok(parsed.unwrap_or_else(|| SubmitResponse::accepted(status.to_string())));
    }

    match parsed {
        Some(reply) if status.is_client_error() => {
            let message = if reply.message.is_empty() {
                status.to_string()
            } else {
                reply.message
            };
            Ok(SubmitResponse::rejected(message))
        }
        _ => Err(CityCareError::Transport(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stories_url_trims_trailing_slash() {
        let remote = HttpRemote::new(HttpRemoteConfig {
            base_url: "https://example.test/v1/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(remote.stories_url(), "https://example.test/v1/stories");
    }

    #[test]
    fn test_invalid_token_is_rejected_up_front() {
        let result = HttpRemote::new(HttpRemoteConfig {
            token: Some("bad\ntoken".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(CityCareError::Api(_))));
    }

    #[test]
    fn test_interpret_created() {
        let reply = interpret_submit(
            StatusCode::CREATED,
            r#"{"error": false, "message": "Story created successfully"}"#,
        )
        .unwrap();
        assert!(reply.is_accepted());
    }

    #[test]
    fn test_interpret_success_without_json() {
        let reply = interpret_submit(StatusCode::OK, "ok").unwrap();
        assert!(reply.is_accepted());
    }

    #[test]
    fn test_interpret_client_error_is_rejection() {
        let reply = interpret_submit(
            StatusCode::BAD_REQUEST,
            r#"{"error": true, "message": "\"photo\" is required"}"#,
        )
        .unwrap();
        assert!(!reply.is_accepted());
        assert_eq!(reply.message, "\"photo\" is required");
    }

    #[test]
    fn test_interpret_server_error_is_transport_failure() {
        let err = interpret_submit(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, CityCareError::Transport(_)));

        let err =
            interpret_submit(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": true}"#).unwrap_err();
        assert!(matches!(err, CityCareError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_transport_failure() {
        let remote = HttpRemote::new(HttpRemoteConfig {
            base_url: "http://127.0.0.1:9".into(),
            token: None,
            timeout_secs: 2,
        })
        .unwrap();

        let err = remote
            .submit(&Submission::from(&Record::new("offline")))
            .await
            .unwrap_err();
        assert!(matches!(err, CityCareError::Transport(_)));

        let err = remote.list().await.unwrap_err();
        assert!(matches!(err, CityCareError::Transport(_)));
    }
}
