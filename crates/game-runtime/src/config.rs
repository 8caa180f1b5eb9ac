//! # Game Configuration
//!
//! Unified configuration for every subsystem of a session.
//!
//! ## Loading Order
//!
//! 1. Defaults (`GameConfig::default()`)
//! 2. Optional JSON file named by `CC_CONFIG`
//! 3. Environment overrides (`CC_*`)
//! 4. Validation

use cc_02_economy::EconomyConfig;
use cc_04_action_queue::QueueConfig;
use serde::{Deserialize, Serialize};
use shared_types::ContractAddress;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_VAR: &str = "CC_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config file {path:?}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`GameConfig`].
    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An override variable holds an unusable value.
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// A section failed validation.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Action queue tuning.
    pub queue: QueueConfig,
    /// Economy catalog.
    pub economy: EconomyConfig,
    /// Automation settings.
    pub automation: AutomationConfig,
    /// Contract every ledger action is addressed to.
    pub game_contract: ContractAddress,
    /// Logging settings.
    pub telemetry: TelemetryConfig,
}

/// Automation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Global switch; when off, owned automations never tick.
    pub enabled: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `info` or `cc_04_action_queue=debug`.
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl GameConfig {
    /// Load from `CC_CONFIG` (if set), apply `CC_*` overrides, validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing sections keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// # Variables
    ///
    /// - `CC_MAX_BATCH_SIZE`, `CC_MAX_RETRIES`, `CC_RETRY_DELAY_MS`
    /// - `CC_RETRY_ON_REJECTION`: `true`/`false`
    /// - `CC_GAME_CONTRACT`: target contract address
    /// - `CC_AUTOMATION`: `true`/`false`
    /// - `CC_LOG_LEVEL` or `RUST_LOG`: filter directive
    /// - `CC_JSON_LOGS`: `true`/`false`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = parse_var(&lookup, "CC_MAX_BATCH_SIZE")? {
            self.queue.max_batch_size = size;
        }
        if let Some(retries) = parse_var(&lookup, "CC_MAX_RETRIES")? {
            self.queue.max_retries = retries;
        }
        if let Some(delay) = parse_var(&lookup, "CC_RETRY_DELAY_MS")? {
            self.queue.retry_delay_ms = delay;
        }
        if let Some(retry) = flag_var(&lookup, "CC_RETRY_ON_REJECTION")? {
            self.queue.retry_on_rejection = retry;
        }
        if let Some(contract) = lookup("CC_GAME_CONTRACT") {
            self.game_contract = ContractAddress::new(contract);
        }
        if let Some(enabled) = flag_var(&lookup, "CC_AUTOMATION")? {
            self.automation.enabled = enabled;
        }
        if let Some(level) = lookup("CC_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.telemetry.log_level = level;
        }
        if let Some(json) = flag_var(&lookup, "CC_JSON_LOGS")? {
            self.telemetry.json_logs = json;
        }
        Ok(())
    }

    /// Reject settings a session cannot run with.
    ///
    /// A missing contract is allowed; every action is then dropped with a
    /// warning at enqueue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.queue
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.economy
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.game_contract.is_empty() {
            warn!("No game contract configured; ledger actions will be dropped");
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}

fn flag_var<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnv { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.queue.max_batch_size, 50);
        assert_eq!(config.queue.max_retries, 3);
        assert_eq!(config.queue.retry_delay_ms, 3_000);
        assert!(config.automation.enabled);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.game_contract.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GameConfig::default();
        config
            .apply_overrides(lookup(&[
                ("CC_MAX_BATCH_SIZE", "10"),
                ("CC_MAX_RETRIES", "5"),
                ("CC_RETRY_DELAY_MS", "250"),
                ("CC_RETRY_ON_REJECTION", "false"),
                ("CC_GAME_CONTRACT", " 0xgame "),
                ("CC_AUTOMATION", "off"),
                ("RUST_LOG", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.queue.max_batch_size, 10);
        assert_eq!(config.queue.max_retries, 5);
        assert_eq!(config.queue.retry_delay_ms, 250);
        assert!(!config.queue.retry_on_rejection);
        assert_eq!(config.game_contract.as_str(), "0xgame");
        assert!(!config.automation.enabled);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_cc_log_level_wins_over_rust_log() {
        let mut config = GameConfig::default();
        config
            .apply_overrides(lookup(&[("CC_LOG_LEVEL", "warn"), ("RUST_LOG", "trace")]))
            .unwrap();
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let mut config = GameConfig::default();
        let err = config
            .apply_overrides(lookup(&[("CC_MAX_RETRIES", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "CC_MAX_RETRIES", .. }));

        let err = config
            .apply_overrides(lookup(&[("CC_AUTOMATION", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "CC_AUTOMATION", .. }));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = GameConfig::default();
        config.queue.max_batch_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: GameConfig = serde_json::from_str(
            r#"{ "queue": { "max_batch_size": 8 }, "game_contract": "0xabc" }"#,
        )
        .unwrap();
        assert_eq!(config.queue.max_batch_size, 8);
        assert_eq!(config.queue.max_retries, 3);
        assert_eq!(config.game_contract.as_str(), "0xabc");
        assert_eq!(config.economy, EconomyConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = GameConfig::from_file("/nonexistent/cc-config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
