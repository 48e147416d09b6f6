// Flush transport: how a batcher's accumulated increment reaches the server.
//
// The trait keeps the batcher independent of HTTP so tests can record
// flushes instead of opening sockets. HttpTransport is the real thing: a
// JSON POST whose reply must carry `success: bool` (and `error` when false).

use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// The server's reply to a flush, reduced to what the batcher acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReply {
    pub status: u16,
    pub success: bool,
    pub error: Option<String>,
}

impl MutationReply {
    pub fn ok() -> Self {
        Self {
            status: 200,
            success: true,
            error: None,
        }
    }

    pub fn rejected(status: u16, error: &str) -> Self {
        Self {
            status,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Wire shape of every mutation endpoint's response body.
#[derive(Debug, Deserialize)]
struct ReplyBody {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Why a flush failed. Both variants mean "flush failed"; nothing is retried.
#[derive(Debug)]
pub enum FlushError {
    /// The request never produced a usable reply (connection error,
    /// unreadable body).
    Transport(anyhow::Error),
    /// The server answered with `success: false`.
    Rejected { status: u16, message: String },
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushError::Transport(e) => write!(f, "flush request failed: {e:#}"),
            FlushError::Rejected { status, message } => {
                write!(f, "flush rejected (HTTP {status}): {message}")
            }
        }
    }
}

impl std::error::Error for FlushError {}

/// Sends one flush payload to an endpoint.
#[async_trait]
pub trait MutationTransport: Send + Sync {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<MutationReply>;
}

/// reqwest-backed transport posting `application/json`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("grudge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MutationTransport for HttpTransport {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<MutationReply> {
        debug!(endpoint, "Flushing mutation");

        // .json() sets Content-Type: application/json
        let response = self
            .client
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("POST {endpoint} failed"))?;

        let status = response.status().as_u16();
        let body: ReplyBody = response
            .json()
            .await
            .with_context(|| format!("POST {endpoint} returned an unreadable body (HTTP {status})"))?;

        Ok(MutationReply {
            status,
            success: body.success,
            error: body.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_body_without_error_field() {
        let body: ReplyBody = serde_json::from_str(r#"{"success": true, "totalDislikes": 3}"#).unwrap();
        assert!(body.success);
        assert!(body.error.is_none());
    }

    #[test]
    fn test_reply_body_with_error() {
        let body: ReplyBody =
            serde_json::from_str(r#"{"success": false, "error": "Rate limit exceeded"}"#).unwrap();
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("Rate limit exceeded"));
    }

    #[test]
    fn test_reply_body_requires_success() {
        assert!(serde_json::from_str::<ReplyBody>(r#"{"error": "nope"}"#).is_err());
    }

    #[test]
    fn test_flush_error_display() {
        let rejected = FlushError::Rejected {
            status: 429,
            message: "Rate limit exceeded".to_string(),
        };
        assert_eq!(
            rejected.to_string(),
            "flush rejected (HTTP 429): Rate limit exceeded"
        );

        let transport = FlushError::Transport(anyhow::anyhow!("connection refused"));
        assert!(transport.to_string().contains("connection refused"));
    }
}
