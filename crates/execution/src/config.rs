//! Vault configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid JSON for the config schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// Values are out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a position manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Width in ticks of ranges opened around the current price.
    pub range_width_ticks: i32,
    /// Whether fees are settled to shareholders before a redeploy. When
    /// false they are compounded into the new range.
    pub collect_before_redeploy: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            range_width_ticks: 1000,
            collect_before_redeploy: true,
        }
    }
}

/// Configuration for yield quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Nominal seconds between fee collection rounds.
    pub round_interval_secs: u64,
    /// Number of most recent rounds averaged, all when `None`.
    pub lookback_rounds: Option<usize>,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            round_interval_secs: 86_400, // daily rounds
            lookback_rounds: None,
        }
    }
}

impl QuoteConfig {
    /// Number of rounds a commitment of `duration_secs` spans, rounded up.
    #[must_use]
    pub fn periods_for(&self, duration_secs: u64) -> u64 {
        if self.round_interval_secs == 0 {
            return duration_secs;
        }
        duration_secs.div_ceil(self.round_interval_secs)
    }
}

/// Top-level vault configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub manager: ManagerConfig,
    pub quote: QuoteConfig,
}

impl VaultConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manager.range_width_ticks <= 0 {
            return Err(ConfigError::Invalid(format!(
                "range_width_ticks must be positive, got {}",
                self.manager.range_width_ticks
            )));
        }
        if self.quote.round_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "round_interval_secs must be positive".to_string(),
            ));
        }
        if self.quote.lookback_rounds == Some(0) {
            return Err(ConfigError::Invalid(
                "lookback_rounds must be positive when set".to_string(),
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
        let config = VaultConfig::default();
        assert_eq!(config.manager.range_width_ticks, 1000);
        assert!(config.manager.collect_before_redeploy);
        assert_eq!(config.quote.round_interval_secs, 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            VaultConfig::from_json_str(r#"{ "quote": { "lookback_rounds": 7 } }"#).unwrap();
        assert_eq!(config.quote.lookback_rounds, Some(7));
        assert_eq!(config.quote.round_interval_secs, 86_400);
        assert_eq!(config.manager, ManagerConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = VaultConfig::from_json_str(r#"{ "manager": { "range_width_ticks": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(matches!(
            VaultConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_periods_round_up() {
        let quote = QuoteConfig::default();
        assert_eq!(quote.periods_for(0), 0);
        assert_eq!(quote.periods_for(1), 1);
        assert_eq!(quote.periods_for(86_400), 1);
        assert_eq!(quote.periods_for(86_401), 2);
        assert_eq!(quote.periods_for(30 * 86_400), 30);
    }
}
