//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minimum delay between two dispatches, in milliseconds
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Retries allowed for a rate-limited request before giving up
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            max_retries: 3,
        }
    }
}

impl SchedulerConfig {
    /// Get the minimum inter-dispatch delay as a Duration
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// Backoff before re-queueing a request that has already been retried
    /// `retry_count` times: `min_delay * 2^retry_count`, no jitter.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let factor = 2u64.checked_pow(retry_count).unwrap_or(u64::MAX);
        Duration::from_millis(self.min_delay_ms.saturating_mul(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.min_delay_ms, 1000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.min_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_doubles() {
        let config = SchedulerConfig::default();
        assert_eq!(config.backoff(0), Duration::from_millis(1000));
        assert_eq!(config.backoff(1), Duration::from_millis(2000));
        assert_eq!(config.backoff(2), Duration::from_millis(4000));
        assert_eq!(config.backoff(3), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_saturates() {
        let config = SchedulerConfig {
            min_delay_ms: 10,
            ..Default::default()
        };
        assert_eq!(config.backoff(200), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SchedulerConfig = serde_yaml::from_str("min-delay-ms: 250").unwrap();
        assert_eq!(config.min_delay_ms, 250);
        assert_eq!(config.max_retries, 3);
    }
}
