//! Session configuration - defaults for one calibration run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Prefix of the CSV result file name.
    /// Default: HeidGauge
    #[serde(default = "SessionConfig::default_file_prefix")]
    pub file_prefix: String,

    /// Free-text comment written into the session log banner.
    #[serde(default)]
    pub comment: String,

    /// Evaluate errors for a run traversed in the opposite direction
    /// (negated gauge readings).
    /// Default: false
    #[serde(default)]
    pub opposite_direction: bool,

    /// Interval between live-preview polls while waiting for a key.
    /// Default: 100
    #[serde(default = "SessionConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl SessionConfig {
    fn default_file_prefix() -> String {
        "HeidGauge".to_string()
    }

    fn default_poll_interval_ms() -> u64 {
        100
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file_prefix: Self::default_file_prefix(),
            comment: String::new(),
            opposite_direction: false,
            poll_interval_ms: Self::default_poll_interval_ms(),
        }
    }
}
