//! JSON export of fetched data together with the raw API responses

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::journal::ResponseJournal;

pub const PORTFOLIO_PREFIX: &str = "rootscan-portfolio";
pub const EXPLORER_PREFIX: &str = "rootscan-explorer";
pub const SWAP_PREFIX: &str = "swap-data";

/// File name for an export made at `at`
pub fn export_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.json", prefix, at.format("%Y-%m-%d"))
}

/// Write `payload` plus the journal snapshot to `{dir}/{prefix}-{date}.json`
///
/// Object payloads are flattened into the top level; anything else lands
/// under `data`. Returns the path written.
pub async fn write_export<P: Serialize>(
    dir: &Path,
    prefix: &str,
    payload: &P,
    journal: &ResponseJournal,
) -> Result<PathBuf> {
    let now = Utc::now();
    let mut document = match serde_json::to_value(payload).context("Failed to serialize export payload")? {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };

    let responses = serde_json::to_value(journal.snapshot().await).context("Failed to serialize API responses")?;
    document.insert("apiResponses".to_string(), responses);
    document.insert("exportDate".to_string(), Value::String(now.to_rfc3339()));

    fs::create_dir_all(dir).context(format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(export_file_name(prefix, now));
    let content = serde_json::to_string_pretty(&Value::Object(document))?;
    fs::write(&path, content).context(format!("Failed to write export {}", path.display()))?;

    info!("Exported data to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::RecordedResponse;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_export_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 0).unwrap();
        assert_eq!(export_file_name(PORTFOLIO_PREFIX, at), "rootscan-portfolio-2024-03-07.json");
    }

    #[tokio::test]
    async fn test_write_export_flattens_payload() {
        let dir = tempfile::tempdir().unwrap();
        let journal = ResponseJournal::new();
        journal
            .record(
                "address",
                RecordedResponse::new("https://x/v1/address", "POST", Some(json!({"address": "0x1"})), json!({"data": {}})),
            )
            .await;

        let payload = json!({"address": "0x1", "tokenBalances": [1, 2]});
        let path = write_export(dir.path(), PORTFOLIO_PREFIX, &payload, &journal)
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("rootscan-portfolio-"));
        assert!(name.ends_with(".json"));

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["address"], "0x1");
        assert_eq!(written["tokenBalances"], json!([1, 2]));
        assert_eq!(written["apiResponses"]["address"]["method"], "POST");
        assert!(DateTime::parse_from_rfc3339(written["exportDate"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_write_export_wraps_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out");
        let path = write_export(&nested, SWAP_PREFIX, &vec!["a", "b"], &ResponseJournal::new())
            .await
            .unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["data"], json!(["a", "b"]));
        assert_eq!(written["apiResponses"], json!({}));
    }
}
