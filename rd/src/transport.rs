//! Transport error boundary
//!
//! Every failure coming back from a remote API is folded into a
//! [`TransportError`] before it reaches the scheduler, so retry decisions only
//! ever look at [`TransportErrorKind`].

use std::fmt;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// HTTP status the remote services use to signal rate limiting
pub const RATE_LIMIT_STATUS: u16 = 429;

type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Remote rejected the call for exceeding its request rate
    RateLimited,
    /// Anything else: other HTTP statuses, network, decode failures
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited"),
            Self::Other => write!(f, "request failed"),
        }
    }
}

/// Failure of a single remote call
#[derive(Debug, Error)]
#[error("{}", describe(.kind, .status_code, .message))]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
    #[source]
    pub cause: Option<Cause>,
}

fn describe(kind: &TransportErrorKind, status_code: &Option<u16>, message: &str) -> String {
    match status_code {
        Some(status) => format!("{} (HTTP {}): {}", kind, status, message),
        None => format!("{}: {}", kind, message),
    }
}

impl TransportError {
    /// Build an error from an HTTP status and response text
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = if status == RATE_LIMIT_STATUS {
            TransportErrorKind::RateLimited
        } else {
            TransportErrorKind::Other
        };
        Self {
            kind,
            status_code: Some(status),
            message: message.into(),
            cause: None,
        }
    }

    /// A 429 rate limit error
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::from_status(RATE_LIMIT_STATUS, message)
    }

    /// A non-retryable error with no status code
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Other,
            status_code: None,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying error
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        self.kind == TransportErrorKind::RateLimited
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // URLs carry API keys in path or query
        let err = err.without_url();
        let message = err.to_string();
        let base = match err.status() {
            Some(status) => Self::from_status(status.as_u16(), message),
            None => Self::other(message),
        };
        base.with_cause(err)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::other(format!("invalid JSON: {}", err)).with_cause(err)
    }
}

/// Turn a response into a decoded body, mapping non-2xx statuses to errors
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
    let status = response.status();
    debug!(%status, "read_json: called");

    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("");
        let text = response.text().await.unwrap_or_default();
        let message = if text.is_empty() {
            format!("HTTP {}: {}", status.as_u16(), reason)
        } else {
            text
        };
        debug!(status = status.as_u16(), "read_json: error status");
        return Err(TransportError::from_status(status.as_u16(), message));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classifies_429() {
        let err = TransportError::from_status(429, "Too Many Requests");
        assert_eq!(err.kind, TransportErrorKind::RateLimited);
        assert!(err.is_rate_limit());
        assert_eq!(err.status_code, Some(429));

        let err = TransportError::from_status(503, "Service Unavailable");
        assert_eq!(err.kind, TransportErrorKind::Other);
        assert!(!err.is_rate_limit());
        assert_eq!(err.status_code, Some(503));
    }

    #[test]
    fn test_display_includes_status() {
        let err = TransportError::rate_limited("slow down");
        assert_eq!(err.to_string(), "rate limited (HTTP 429): slow down");

        let err = TransportError::other("connection reset");
        assert_eq!(err.to_string(), "request failed: connection reset");
    }

    #[test]
    fn test_json_error_keeps_cause() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = TransportError::from(json_err);
        assert_eq!(err.kind, TransportErrorKind::Other);
        assert!(err.cause.is_some());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_source_absent_without_cause() {
        let err = TransportError::from_status(500, "boom");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[tokio::test]
    async fn test_reqwest_error_omits_url() {
        let reqwest_err = reqwest::get("http://127.0.0.1:1/v1/transactions/abc/SUPERSECRET")
            .await
            .unwrap_err();
        let err = TransportError::from(reqwest_err);

        assert_eq!(err.kind, TransportErrorKind::Other);
        assert!(!err.to_string().contains("SUPERSECRET"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(!source.to_string().contains("SUPERSECRET"));
    }
}
