//! rootdash configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scheduler::SchedulerConfig;

/// Main rootdash configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rootscan block-explorer API
    pub explorer: ExplorerConfig,

    /// ChangeNOW swap API
    pub swap: SwapConfig,

    /// Request pacing and retry, applied to every client's scheduler
    pub scheduler: SchedulerConfig,

    /// Where exported snapshots land
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .rootdash.yml
        let local_config = PathBuf::from(".rootdash.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/rootdash/rootdash.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("rootdash").join("rootdash.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Read an API key from the named environment variable
fn api_key_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        Ok(_) => Err(eyre::eyre!("API key environment variable {} is empty", var)),
        Err(_) => Err(eyre::eyre!("API key not found. Set the {} environment variable.", var)),
    }
}

/// Rootscan block-explorer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// API base URL, endpoints are appended as path segments
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.rootscan.io/v1".to_string(),
            api_key_env: "ROOTSCAN_API_KEY".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl ExplorerConfig {
    pub fn get_api_key(&self) -> Result<String> {
        api_key_from_env(&self.api_key_env)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// ChangeNOW swap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.changenow.io/v1".to_string(),
            api_key_env: "CHANGENOW_API_KEY".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl SwapConfig {
    pub fn get_api_key(&self) -> Result<String> {
        api_key_from_env(&self.api_key_env)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for exported JSON snapshots
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}
