//! Config file discovery, loading, and environment variable overlay.

use crate::infra::{InstrumentsConfig, PathsConfig, TelemetryConfig};
use crate::{ConfigError, GaugeConfig, InfraConfig, SessionConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Where the effective configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Files merged, in load order.
    pub files: Vec<PathBuf>,
    /// Variables that replaced a file or default value.
    pub env_overrides: Vec<String>,
}

const SYSTEM_CONFIG: &str = "/etc/heidgauge/config.toml";
const LOCAL_CONFIG: &str = "heidgauge.toml";

/// Existing config files in load order: system, user, local.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// As [`discover_config_files`], with an existing `cli_path` standing in
/// for the local file.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let user = directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("heidgauge").join("config.toml"));
    let last = match cli_path {
        Some(path) if path.exists() => path.to_path_buf(),
        _ => PathBuf::from(LOCAL_CONFIG),
    };

    [Some(PathBuf::from(SYSTEM_CONFIG)), user, Some(last)]
        .into_iter()
        .flatten()
        .filter(|path| path.exists())
        .collect()
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<GaugeConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// TOML accepts `20` where we want `20.0`.
fn as_number(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

/// Parse config from TOML string.
pub(crate) fn parse_toml(contents: &str, path: &Path) -> Result<GaugeConfig, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut infra = InfraConfig::default();

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("log_file").and_then(|v| v.as_str()) {
            infra.paths.log_file = expand_path(v);
        }
        if let Some(v) = paths.get("output_dir").and_then(|v| v.as_str()) {
            infra.paths.output_dir = expand_path(v);
        }
    }

    if let Some(instruments) = table.get("instruments").and_then(|v| v.as_table()) {
        if let Some(v) = instruments.get("simulated_position").and_then(as_number) {
            infra.instruments.simulated_position = v;
        }
        if let Some(v) = instruments.get("simulated_temperature").and_then(as_number) {
            infra.instruments.simulated_temperature = v;
        }
        if let Some(v) = instruments.get("simulated_humidity").and_then(as_number) {
            infra.instruments.simulated_humidity = v;
        }
        if let Some(v) = instruments.get("refresh_period_ms").and_then(|v| v.as_integer()) {
            infra.instruments.refresh_period_ms = v.max(0) as u64;
        }
        if let Some(v) = instruments.get("warmup_reads").and_then(|v| v.as_integer()) {
            infra.instruments.warmup_reads = v.max(0) as u32;
        }
        if let Some(v) = instruments.get("warmup_interval_ms").and_then(|v| v.as_integer()) {
            infra.instruments.warmup_interval_ms = v.max(0) as u64;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            infra.telemetry.log_level = v.to_string();
        }
    }

    let mut session = SessionConfig::default();

    if let Some(section) = table.get("session").and_then(|v| v.as_table()) {
        if let Some(v) = section.get("file_prefix").and_then(|v| v.as_str()) {
            session.file_prefix = v.to_string();
        }
        if let Some(v) = section.get("comment").and_then(|v| v.as_str()) {
            session.comment = v.to_string();
        }
        if let Some(v) = section.get("opposite_direction").and_then(|v| v.as_bool()) {
            session.opposite_direction = v;
        }
        if let Some(v) = section.get("poll_interval_ms").and_then(|v| v.as_integer()) {
            session.poll_interval_ms = v.max(1) as u64;
        }
    }

    Ok(GaugeConfig { infra, session })
}

/// Pick the overlay value unless it is still the compiled default.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configs, with `overlay` taking precedence field by field.
pub fn merge_configs(base: GaugeConfig, overlay: GaugeConfig) -> GaugeConfig {
    let paths = PathsConfig::default();
    let instruments = InstrumentsConfig::default();
    let telemetry = TelemetryConfig::default();
    let session = SessionConfig::default();

    GaugeConfig {
        infra: InfraConfig {
            paths: PathsConfig {
                log_file: pick(base.infra.paths.log_file, overlay.infra.paths.log_file, paths.log_file),
                output_dir: pick(
                    base.infra.paths.output_dir,
                    overlay.infra.paths.output_dir,
                    paths.output_dir,
                ),
            },
            instruments: InstrumentsConfig {
                simulated_position: pick(
                    base.infra.instruments.simulated_position,
                    overlay.infra.instruments.simulated_position,
                    instruments.simulated_position,
                ),
                simulated_temperature: pick(
                    base.infra.instruments.simulated_temperature,
                    overlay.infra.instruments.simulated_temperature,
                    instruments.simulated_temperature,
                ),
                simulated_humidity: pick(
                    base.infra.instruments.simulated_humidity,
                    overlay.infra.instruments.simulated_humidity,
                    instruments.simulated_humidity,
                ),
                refresh_period_ms: pick(
                    base.infra.instruments.refresh_period_ms,
                    overlay.infra.instruments.refresh_period_ms,
                    instruments.refresh_period_ms,
                ),
                warmup_reads: pick(
                    base.infra.instruments.warmup_reads,
                    overlay.infra.instruments.warmup_reads,
                    instruments.warmup_reads,
                ),
                warmup_interval_ms: pick(
                    base.infra.instruments.warmup_interval_ms,
                    overlay.infra.instruments.warmup_interval_ms,
                    instruments.warmup_interval_ms,
                ),
            },
            telemetry: TelemetryConfig {
                log_level: pick(
                    base.infra.telemetry.log_level,
                    overlay.infra.telemetry.log_level,
                    telemetry.log_level,
                ),
            },
        },
        session: SessionConfig {
            file_prefix: pick(base.session.file_prefix, overlay.session.file_prefix, session.file_prefix),
            comment: pick(base.session.comment, overlay.session.comment, session.comment),
            opposite_direction: pick(
                base.session.opposite_direction,
                overlay.session.opposite_direction,
                session.opposite_direction,
            ),
            poll_interval_ms: pick(
                base.session.poll_interval_ms,
                overlay.session.poll_interval_ms,
                session.poll_interval_ms,
            ),
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut GaugeConfig, sources: &mut ConfigSources) {
    apply_overrides(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
pub fn apply_overrides<F>(config: &mut GaugeConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("HEIDGAUGE_LOG_FILE") {
        config.infra.paths.log_file = expand_path(&v);
        sources.env_overrides.push("HEIDGAUGE_LOG_FILE".to_string());
    }
    if let Some(v) = lookup("HEIDGAUGE_OUTPUT_DIR") {
        config.infra.paths.output_dir = expand_path(&v);
        sources.env_overrides.push("HEIDGAUGE_OUTPUT_DIR".to_string());
    }

    if let Some(v) = lookup("HEIDGAUGE_REFRESH_PERIOD_MS") {
        if let Ok(ms) = v.parse() {
            config.infra.instruments.refresh_period_ms = ms;
            sources.env_overrides.push("HEIDGAUGE_REFRESH_PERIOD_MS".to_string());
        }
    }
    if let Some(v) = lookup("HEIDGAUGE_WARMUP_READS") {
        if let Ok(reads) = v.parse() {
            config.infra.instruments.warmup_reads = reads;
            sources.env_overrides.push("HEIDGAUGE_WARMUP_READS".to_string());
        }
    }

    if let Some(v) = lookup("HEIDGAUGE_LOG_LEVEL") {
        config.infra.telemetry.log_level = v;
        sources.env_overrides.push("HEIDGAUGE_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.infra.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Some(v) = lookup("HEIDGAUGE_PREFIX") {
        config.session.file_prefix = v;
        sources.env_overrides.push("HEIDGAUGE_PREFIX".to_string());
    }
    if let Some(v) = lookup("HEIDGAUGE_COMMENT") {
        config.session.comment = v;
        sources.env_overrides.push("HEIDGAUGE_COMMENT".to_string());
    }
    if let Some(v) = lookup("HEIDGAUGE_POLL_INTERVAL_MS") {
        if let Ok(ms) = v.parse::<u64>() {
            config.session.poll_interval_ms = ms.max(1);
            sources.env_overrides.push("HEIDGAUGE_POLL_INTERVAL_MS".to_string());
        }
    }
}

/// Expand a leading `~/` or `$VAR` in a path. Unknown variables are left as
/// written.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        return match directories::BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(rest),
            None => PathBuf::from(path),
        };
    }
    if let Some(stripped) = path.strip_prefix('$') {
        let (name, rest) = stripped.split_once('/').unwrap_or((stripped, ""));
        if let Ok(value) = env::var(name) {
            let base = PathBuf::from(value);
            return if rest.is_empty() { base } else { base.join(rest) };
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_expand_path() {
        if let Some(dirs) = directories::BaseDirs::new() {
            assert_eq!(expand_path("~/cal/HeidGauge.log"), dirs.home_dir().join("cal/HeidGauge.log"));
        }
        assert_eq!(expand_path("/var/log/cal.log"), PathBuf::from("/var/log/cal.log"));
        assert_eq!(
            expand_path("$HEIDGAUGE_SURELY_UNSET_VAR/x"),
            PathBuf::from("$HEIDGAUGE_SURELY_UNSET_VAR/x")
        );
    }

    #[test]
    fn test_discover_only_existing_files() {
        let missing = Path::new("/nonexistent/heidgauge.toml");
        for path in discover_config_files_with_override(Some(missing)) {
            assert!(path.exists());
            assert_ne!(path, missing);
        }
    }

    #[test]
    fn test_cli_path_replaces_local() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let files = discover_config_files_with_override(Some(file.path()));
        assert_eq!(files.last().map(PathBuf::as_path), Some(file.path()));
        assert!(!files.contains(&PathBuf::from(LOCAL_CONFIG)));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[session]
comment = "bench 2"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.session.comment, "bench 2");
        // Other values should be defaults
        assert_eq!(config.session.file_prefix, "HeidGauge");
        assert_eq!(config.infra.instruments.refresh_period_ms, 1500);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[paths]
log_file = "/data/cal/HeidGauge.log"
output_dir = "/data/cal/results"

[instruments]
simulated_position = 1.25
simulated_temperature = 21
simulated_humidity = 40.5
refresh_period_ms = 2000
warmup_reads = 5
warmup_interval_ms = 1000

[telemetry]
log_level = "debug"

[session]
file_prefix = "ND280"
comment = "spindle"
opposite_direction = true
poll_interval_ms = 50
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();

        assert_eq!(config.infra.paths.log_file, PathBuf::from("/data/cal/HeidGauge.log"));
        assert_eq!(config.infra.paths.output_dir, PathBuf::from("/data/cal/results"));
        assert_eq!(config.infra.instruments.simulated_position, 1.25);
        assert_eq!(config.infra.instruments.simulated_temperature, 21.0);
        assert_eq!(config.infra.instruments.simulated_humidity, 40.5);
        assert_eq!(config.infra.instruments.refresh_period_ms, 2000);
        assert_eq!(config.infra.instruments.warmup_reads, 5);
        assert_eq!(config.infra.instruments.warmup_interval_ms, 1000);
        assert_eq!(config.infra.telemetry.log_level, "debug");
        assert_eq!(config.session.file_prefix, "ND280");
        assert_eq!(config.session.comment, "spindle");
        assert!(config.session.opposite_direction);
        assert_eq!(config.session.poll_interval_ms, 50);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = parse_toml("[session\n", Path::new("broken.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nfile_prefix = \"lab\"").unwrap();

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.session.file_prefix, "lab");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_from_file(Path::new("/nonexistent/heidgauge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_merge_overlay_wins_only_when_set() {
        let mut base = GaugeConfig::default();
        base.session.comment = "from system".to_string();
        base.infra.instruments.warmup_reads = 5;

        let mut overlay = GaugeConfig::default();
        overlay.session.file_prefix = "local".to_string();

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.session.comment, "from system");
        assert_eq!(merged.session.file_prefix, "local");
        assert_eq!(merged.infra.instruments.warmup_reads, 5);
    }

    #[test]
    fn test_apply_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HEIDGAUGE_PREFIX", "env"),
            ("HEIDGAUGE_POLL_INTERVAL_MS", "250"),
            ("HEIDGAUGE_REFRESH_PERIOD_MS", "not-a-number"),
            ("RUST_LOG", "heidgauge=trace"),
        ]
        .into_iter()
        .collect();

        let mut config = GaugeConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides(&mut config, &mut sources, |key| {
            vars.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.session.file_prefix, "env");
        assert_eq!(config.session.poll_interval_ms, 250);
        assert_eq!(config.infra.instruments.refresh_period_ms, 1500);
        assert_eq!(config.infra.telemetry.log_level, "heidgauge=trace");
        assert_eq!(
            sources.env_overrides,
            vec!["RUST_LOG", "HEIDGAUGE_PREFIX", "HEIDGAUGE_POLL_INTERVAL_MS"]
        );
    }
}
