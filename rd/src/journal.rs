//! Journal of successful API responses
//!
//! Clients record each response they receive under a response key so the
//! raw payloads can be exported next to the shaped data.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

/// A recorded request/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub url: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    pub response: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl RecordedResponse {
    pub fn new(
        url: impl Into<String>,
        method: impl Into<String>,
        body: Option<serde_json::Value>,
        response: serde_json::Value,
    ) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            body,
            response,
            timestamp: Utc::now(),
        }
    }
}

/// Shared, ordered map of response key to the latest recorded response
#[derive(Debug, Clone, Default)]
pub struct ResponseJournal {
    entries: Arc<Mutex<BTreeMap<String, RecordedResponse>>>,
}

impl ResponseJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a response, replacing any earlier one under the same key
    pub async fn record(&self, key: impl Into<String>, response: RecordedResponse) {
        let key = key.into();
        debug!(%key, url = %response.url, "ResponseJournal::record: called");
        self.entries.lock().await.insert(key, response);
    }

    pub async fn get(&self, key: &str) -> Option<RecordedResponse> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Copy of every entry, ordered by key
    pub async fn snapshot(&self) -> BTreeMap<String, RecordedResponse> {
        self.entries.lock().await.clone()
    }
}

/// Replace the value of an API key wherever it appears in a URL
pub fn redact(url: &str, secret: &str) -> String {
    if secret.is_empty() {
        return url.to_string();
    }
    url.replace(secret, "***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_replace() {
        let journal = ResponseJournal::new();
        assert!(journal.is_empty().await);

        journal
            .record(
                "address",
                RecordedResponse::new("https://x/v1/address", "POST", None, serde_json::json!({"n": 1})),
            )
            .await;
        journal
            .record(
                "address",
                RecordedResponse::new("https://x/v1/address", "POST", None, serde_json::json!({"n": 2})),
            )
            .await;

        assert_eq!(journal.len().await, 1);
        let entry = journal.get("address").await.unwrap();
        assert_eq!(entry.response["n"], 2);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let journal = ResponseJournal::new();
        let other = journal.clone();
        other
            .record("blocks", RecordedResponse::new("u", "POST", None, serde_json::Value::Null))
            .await;
        assert!(journal.get("blocks").await.is_some());
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://api.changenow.io/v1/transactions/abc/KEY123", "KEY123"),
            "https://api.changenow.io/v1/transactions/abc/***"
        );
        assert_eq!(redact("https://x/y", ""), "https://x/y");
    }

    #[test]
    fn test_body_omitted_when_absent() {
        let entry = RecordedResponse::new("u", "GET", None, serde_json::json!({}));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("\"body\""));
    }
}
