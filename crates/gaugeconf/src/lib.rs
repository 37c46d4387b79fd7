//! Minimal configuration loading for heidgauge.
//!
//! # Configuration Philosophy
//!
//! Configuration is split into two categories:
//!
//! - **Infrastructure** (`InfraConfig`): the physical setup of the bench -
//!   where the log and result files go, how the instruments behave, how
//!   verbose the process logs are.
//!
//! - **Session** (`SessionConfig`): defaults for a single calibration run.
//!   Command-line flags override these.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gaugeconf::GaugeConfig;
//!
//! let config = GaugeConfig::load().expect("Failed to load config");
//!
//! println!("Log file: {}", config.infra.paths.log_file.display());
//! println!("Prefix: {}", config.session.file_prefix);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/heidgauge/config.toml` (system)
//! 2. `~/.config/heidgauge/config.toml` (user)
//! 3. `./heidgauge.toml` (local override, or the `--config` path)
//! 4. Environment variables (`HEIDGAUGE_*`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! log_file = "~/calibration/HeidGauge.log"
//! output_dir = "~/calibration/results"
//!
//! [instruments]
//! refresh_period_ms = 1500
//! warmup_reads = 5
//! warmup_interval_ms = 2000
//!
//! [telemetry]
//! log_level = "info"
//!
//! [session]
//! file_prefix = "HeidGauge"
//! comment = "ND280 bench 2"
//! opposite_direction = false
//! poll_interval_ms = 100
//! ```

pub mod infra;
pub mod loader;
pub mod session;

pub use infra::{InfraConfig, InstrumentsConfig, PathsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};
pub use session::SessionConfig;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete heidgauge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GaugeConfig {
    /// Bench setup - paths, instruments, telemetry.
    #[serde(flatten)]
    pub infra: InfraConfig,

    /// Per-run defaults.
    #[serde(default)]
    pub session: SessionConfig,
}

impl GaugeConfig {
    /// Load from compiled defaults, the discovered config files and the
    /// environment, later sources winning:
    ///
    /// 1. `/etc/heidgauge/config.toml`
    /// 2. `~/.config/heidgauge/config.toml`
    /// 3. `./heidgauge.toml`
    /// 4. `HEIDGAUGE_*` variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`GaugeConfig::load`], with `config_path` replacing the local
    /// `./heidgauge.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_sources_from(config_path).map(|(config, _)| config)
    }

    /// Load and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = Self::default();

        for path in loader::discover_config_files_with_override(config_path) {
            config = loader::merge_configs(config, loader::load_from_file(&path)?);
            sources.files.push(path);
        }
        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Render the effective configuration as a config file.
    pub fn to_toml(&self) -> String {
        let paths = &self.infra.paths;
        let instruments = &self.infra.instruments;
        let session = &self.session;

        let mut out = String::from("# heidgauge configuration\n");
        // Writing into a String cannot fail
        let _ = writeln!(out, "\n[paths]");
        let _ = writeln!(out, "log_file = {}", quoted(&paths.log_file.display().to_string()));
        let _ = writeln!(out, "output_dir = {}", quoted(&paths.output_dir.display().to_string()));

        let _ = writeln!(out, "\n[instruments]");
        let _ = writeln!(out, "simulated_position = {:?}", instruments.simulated_position);
        let _ = writeln!(out, "simulated_temperature = {:?}", instruments.simulated_temperature);
        let _ = writeln!(out, "simulated_humidity = {:?}", instruments.simulated_humidity);
        let _ = writeln!(out, "refresh_period_ms = {}", instruments.refresh_period_ms);
        let _ = writeln!(out, "warmup_reads = {}", instruments.warmup_reads);
        let _ = writeln!(out, "warmup_interval_ms = {}", instruments.warmup_interval_ms);

        let _ = writeln!(out, "\n[telemetry]");
        let _ = writeln!(out, "log_level = {}", quoted(&self.infra.telemetry.log_level));

        let _ = writeln!(out, "\n[session]");
        let _ = writeln!(out, "file_prefix = {}", quoted(&session.file_prefix));
        let _ = writeln!(out, "comment = {}", quoted(&session.comment));
        let _ = writeln!(out, "opposite_direction = {}", session.opposite_direction);
        let _ = writeln!(out, "poll_interval_ms = {}", session.poll_interval_ms);

        out
    }
}

/// A quoted and escaped TOML string.
fn quoted(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaugeConfig::default();
        assert_eq!(config.session.file_prefix, "HeidGauge");
        assert_eq!(config.session.poll_interval_ms, 100);
        assert!(!config.session.opposite_direction);
    }

    #[test]
    fn test_to_toml() {
        let config = GaugeConfig::default();
        let toml = config.to_toml();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[instruments]"));
        assert!(toml.contains("[session]"));
        assert!(toml.contains("file_prefix = \"HeidGauge\""));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = GaugeConfig::default();
        config.session.comment = "bench \"2\"".to_string();
        config.session.opposite_direction = true;
        config.infra.instruments.simulated_temperature = 20.5;

        let parsed = loader::parse_toml(&config.to_toml(), Path::new("rt.toml")).unwrap();
        assert_eq!(parsed, config);
    }
}
