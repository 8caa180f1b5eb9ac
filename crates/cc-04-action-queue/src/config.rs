//! Configuration for the action queue

use crate::error::{QueueError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default actions per batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Default submission attempts per batch before terminal failure
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default pause between attempts (milliseconds)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3_000;

/// Queue tuning, fixed once the queue is constructed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Buffered actions that seal into one batch
    pub max_batch_size: usize,

    /// Submission attempts per batch; the last failed attempt is terminal
    pub max_retries: u32,

    /// Pause between attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Retry batches the ledger rejected outright.
    ///
    /// When `false`, a rejection is terminal on the first attempt.
    pub retry_on_rejection: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            retry_on_rejection: true,
        }
    }
}

impl QueueConfig {
    /// Pause between attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Reject settings the queue cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(QueueError::InvalidConfig(
                "max_batch_size must be at least 1".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(QueueError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(3));
        assert!(config.retry_on_rejection);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let zero_batch = QueueConfig {
            max_batch_size: 0,
            ..QueueConfig::default()
        };
        assert!(zero_batch.validate().is_err());

        let zero_retries = QueueConfig {
            max_retries: 0,
            ..QueueConfig::default()
        };
        assert!(zero_retries.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: QueueConfig = serde_json::from_str(r#"{"max_batch_size": 10}"#).unwrap();
        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }
}
