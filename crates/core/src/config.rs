//! Tutorial configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Behavior knobs for the tutorial session and the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialConfig {
    /// Advance automatically after a passed step
    pub auto_advance: bool,

    /// Delay before auto-advancing, in milliseconds
    pub auto_advance_delay_ms: u64,

    /// Whether the overlay shows a progress indicator
    pub show_progress: bool,

    /// Whether steps may be skipped
    pub allow_skip: bool,

    /// Whether the user may go back a step
    pub allow_back_navigation: bool,

    /// Step timeout used when a step has no override, in milliseconds
    pub default_timeout_ms: u64,

    /// Whether step targets are highlighted
    pub highlight_enabled: bool,

    /// Minimum time between statistics autosaves, in seconds
    pub stats_autosave_interval_secs: u64,

    /// Per-step estimate when neither history nor content has one, in milliseconds
    pub fallback_step_duration_ms: u64,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            auto_advance: true,
            auto_advance_delay_ms: 1000,
            show_progress: true,
            allow_skip: true,
            allow_back_navigation: true,
            default_timeout_ms: 30_000,
            highlight_enabled: true,
            stats_autosave_interval_secs: 300,
            fallback_step_duration_ms: 60_000,
        }
    }
}

impl TutorialConfig {
    /// Parse configuration from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Delay before auto-advancing.
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    /// Minimum time between statistics autosaves.
    pub fn stats_autosave_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stats_autosave_interval_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = TutorialConfig::from_json_str(r#"{"auto_advance": false}"#).unwrap();
        assert!(!config.auto_advance);
        assert_eq!(config.default_timeout_ms, 30_000);
        assert_eq!(config.fallback_step_duration_ms, 60_000);
        assert_eq!(config.stats_autosave_interval(), chrono::Duration::minutes(5));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(TutorialConfig::from_json_str("{not json").is_err());
    }
}
