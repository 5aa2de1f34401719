//! Session configuration
//!
//! Holds the constants that drive one measurement run: cue frequency, sample
//! threshold, clock length, scheduling delays and the histogram size. Stored as
//! JSON so smaller, faster sessions can be configured for testing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

fn default_pulse_frequency_hz() -> f64 {
    crate::DEFAULT_PULSE_FREQUENCY_HZ
}

fn default_minimum_samples() -> usize {
    crate::DEFAULT_MINIMUM_SAMPLES
}

fn default_length_ms() -> f64 {
    crate::DEFAULT_SESSION_LENGTH_MS
}

fn default_early_check_delay_ms() -> f64 {
    500.0
}

fn default_grace_period_ms() -> f64 {
    1000.0
}

fn default_cooldown_ms() -> f64 {
    500.0
}

fn default_side_bins() -> usize {
    crate::DEFAULT_SIDE_BINS
}

/// Errors reported by [`SessionConfig::validate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Pulse frequency must be positive and finite, got {0}")]
    InvalidFrequency(f64),

    #[error("Minimum sample count must be at least 1")]
    ZeroMinimumSamples,

    #[error("Session length must be positive and finite, got {0} ms")]
    InvalidLength(f64),

    #[error("Histogram needs at least one side bin")]
    ZeroSideBins,

    #[error("Delay `{name}` must be non-negative and finite, got {value} ms")]
    InvalidDelay { name: &'static str, value: f64 },
}

/// Configuration of a measurement session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Assumed cue frequency in Hz
    #[serde(default = "default_pulse_frequency_hz")]
    pub pulse_frequency_hz: f64,
    /// Captured inputs required at the final check
    #[serde(default = "default_minimum_samples")]
    pub minimum_samples: usize,
    /// Clock length in milliseconds
    #[serde(default = "default_length_ms")]
    pub length_ms: f64,
    /// Delay of the no-input check after start
    #[serde(default = "default_early_check_delay_ms")]
    pub early_check_delay_ms: f64,
    /// Extra time after the clock length before the final check
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: f64,
    /// Time spent in an error state before returning to idle
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: f64,
    /// Histogram bins beside the center bin
    #[serde(default = "default_side_bins")]
    pub side_bins: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pulse_frequency_hz: default_pulse_frequency_hz(),
            minimum_samples: default_minimum_samples(),
            length_ms: default_length_ms(),
            early_check_delay_ms: default_early_check_delay_ms(),
            grace_period_ms: default_grace_period_ms(),
            cooldown_ms: default_cooldown_ms(),
            side_bins: default_side_bins(),
        }
    }
}

impl SessionConfig {
    /// Check that every value can drive a session
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pulse_frequency_hz.is_finite() && self.pulse_frequency_hz > 0.0) {
            return Err(ConfigError::InvalidFrequency(self.pulse_frequency_hz));
        }
        if self.minimum_samples == 0 {
            return Err(ConfigError::ZeroMinimumSamples);
        }
        if !(self.length_ms.is_finite() && self.length_ms > 0.0) {
            return Err(ConfigError::InvalidLength(self.length_ms));
        }
        if self.side_bins == 0 {
            return Err(ConfigError::ZeroSideBins);
        }

        let delays = [
            ("early_check_delay_ms", self.early_check_delay_ms),
            ("grace_period_ms", self.grace_period_ms),
            ("cooldown_ms", self.cooldown_ms),
        ];
        for (name, value) in delays {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidDelay { name, value });
            }
        }

        Ok(())
    }

    /// Load config from disk, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded session config");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse session config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No session config found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Session config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.pulse_frequency_hz, 4.0);
        assert_eq!(config.minimum_samples, 400);
        assert_eq!(config.length_ms, 10_000.0);
        assert_eq!(config.side_bins, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = r#"{"minimum_samples": 10, "length_ms": 2000}"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.minimum_samples, 10);
        assert_eq!(config.length_ms, 2000.0);
        assert_eq!(config.pulse_frequency_hz, 4.0);
        assert_eq!(config.cooldown_ms, 500.0);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SessionConfig {
            pulse_frequency_hz: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrequency(0.0)));

        let config = SessionConfig {
            minimum_samples: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMinimumSamples));

        let config = SessionConfig {
            side_bins: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSideBins));

        let config = SessionConfig {
            cooldown_ms: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDelay {
                name: "cooldown_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let config = SessionConfig {
            minimum_samples: 20,
            length_ms: 3000.0,
            side_bins: 10,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = SessionConfig::load(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(SessionConfig::load(&path), SessionConfig::default());
        assert_eq!(
            SessionConfig::load(&dir.path().join("missing.json")),
            SessionConfig::default()
        );
    }
}
