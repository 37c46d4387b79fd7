//! Infrastructure configuration - the physical setup of the bench.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem locations for the session log and result records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Append-mode session log.
    /// Default: HeidGauge.log
    #[serde(default = "PathsConfig::default_log_file")]
    pub log_file: PathBuf,

    /// Directory the CSV result record is written into.
    /// Default: current directory
    #[serde(default = "PathsConfig::default_output_dir")]
    pub output_dir: PathBuf,
}

impl PathsConfig {
    fn default_log_file() -> PathBuf {
        PathBuf::from("HeidGauge.log")
    }

    fn default_output_dir() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_file: Self::default_log_file(),
            output_dir: Self::default_output_dir(),
        }
    }
}

/// Instrument behaviour.
///
/// The simulated values are what the stand-in gauge and thermo-hygrometer
/// report when no hardware driver is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentsConfig {
    /// Position reported by the simulated length gauge, in mm.
    /// Default: 0.0
    #[serde(default)]
    pub simulated_position: f64,

    /// Air temperature reported by the simulated thermo-hygrometer, in °C.
    /// Default: 20.0
    #[serde(default = "InstrumentsConfig::default_simulated_temperature")]
    pub simulated_temperature: f64,

    /// Relative humidity reported by the simulated thermo-hygrometer, in %.
    /// Default: 50.0
    #[serde(default = "InstrumentsConfig::default_simulated_humidity")]
    pub simulated_humidity: f64,

    /// Minimum time between two queries of the thermo-hygrometer.
    /// Default: 1500
    #[serde(default = "InstrumentsConfig::default_refresh_period_ms")]
    pub refresh_period_ms: u64,

    /// Humidity reads discarded at start-up so the sensor can settle.
    /// Default: 0
    #[serde(default)]
    pub warmup_reads: u32,

    /// Pause between two warm-up reads.
    /// Default: 2000
    #[serde(default = "InstrumentsConfig::default_warmup_interval_ms")]
    pub warmup_interval_ms: u64,
}

impl InstrumentsConfig {
    fn default_simulated_temperature() -> f64 {
        20.0
    }

    fn default_simulated_humidity() -> f64 {
        50.0
    }

    fn default_refresh_period_ms() -> u64 {
        1500
    }

    fn default_warmup_interval_ms() -> u64 {
        2000
    }
}

impl Default for InstrumentsConfig {
    fn default() -> Self {
        Self {
            simulated_position: 0.0,
            simulated_temperature: Self::default_simulated_temperature(),
            simulated_humidity: Self::default_simulated_humidity(),
            refresh_period_ms: Self::default_refresh_period_ms(),
            warmup_reads: 0,
            warmup_interval_ms: Self::default_warmup_interval_ms(),
        }
    }
}

/// Process logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Infrastructure configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfraConfig {
    /// Filesystem paths.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Instrument behaviour.
    #[serde(default)]
    pub instruments: InstrumentsConfig,

    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_defaults() {
        let paths = PathsConfig::default();
        assert_eq!(paths.log_file, PathBuf::from("HeidGauge.log"));
        assert_eq!(paths.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_instruments_defaults() {
        let instruments = InstrumentsConfig::default();
        assert_eq!(instruments.refresh_period_ms, 1500);
        assert_eq!(instruments.warmup_reads, 0);
        assert_eq!(instruments.simulated_temperature, 20.0);
        assert_eq!(instruments.simulated_humidity, 50.0);
    }

    #[test]
    fn test_telemetry_defaults() {
        let telemetry = TelemetryConfig::default();
        assert_eq!(telemetry.log_level, "info");
    }
}
