//! Rendering of samples and session statistics.
//!
//! The CSV record is the durable calibration result and its layout is fixed:
//! the header text, the field order and the number formatting must not
//! change. Empty readings render as an empty field.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use crate::evaluate::EnvironmentSummary;
use crate::sample::Sample;
use crate::sink::Sink;
use crate::store::SessionStore;
use crate::stats::StatisticsAccumulator;
use crate::Result;

pub const CSV_HEADER: &str =
    "Target (mm), Error (mm), Transducer (mm), Air temperature (°C), Humidity (%), Time stamp";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn separator(c: char) -> String {
    c.to_string().repeat(80)
}

/// Shortest round-trip decimal; empty for a missing or NaN value.
pub fn mask(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => v.to_string(),
        _ => String::new(),
    }
}

pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Right-aligned fixed-point, `NaN` when there is no value.
fn fixed(value: Option<f64>, width: usize, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:>width$.precision$}"),
        None => format!("{:>width$}", "NaN"),
    }
}

/// Fields of one CSV row, in record order.
pub fn csv_fields(sample: &Sample) -> [String; 6] {
    [
        mask(Some(sample.target())),
        mask(sample.error()),
        mask(sample.measured()),
        mask(sample.temperature()),
        mask(sample.humidity()),
        format_timestamp(sample.timestamp()),
    ]
}

/// Write the header and one row per sample, placeholders included.
pub fn write_csv<W: Write>(writer: W, samples: &[Sample]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(CSV_HEADER.split(','))?;
    for sample in samples {
        csv.write_record(csv_fields(sample))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, samples: &[Sample]) -> Result<()> {
    let file = File::create(path)?;
    write_csv(file, samples)?;
    info!(path = %path.display(), rows = samples.len(), "wrote calibration record");
    Ok(())
}

/// `{prefix}_{target file stem}_{yyyyMMddHHmm}.csv`
pub fn result_file_name(prefix: &str, target_file: &Path, started: DateTime<Utc>) -> String {
    let stem = target_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{prefix}_{stem}_{}.csv", started.format("%Y%m%d%H%M"))
}

/// One-line echo of a fresh capture.
pub fn terse_line(sample: &Sample) -> String {
    format!(
        "{} mm {} mm {} °C {} %   {}",
        fixed(Some(sample.target()), 6, 3),
        fixed(sample.measured(), 9, 5),
        fixed(sample.temperature(), 6, 1),
        fixed(sample.humidity(), 6, 1),
        format_timestamp(sample.timestamp()),
    )
}

/// One-line listing of an evaluated sample.
pub fn summary_line(sample: &Sample) -> String {
    let seconds = sample
        .elapsed()
        .map(|d| d.num_milliseconds() as f64 / 1000.0);
    format!(
        "{} mm {} mm {} mm {} °C {} %   {} s",
        fixed(Some(sample.target()), 8, 4),
        fixed(sample.error(), 10, 5),
        fixed(sample.measured(), 10, 5),
        fixed(sample.temperature(), 6, 1),
        fixed(sample.humidity(), 6, 1),
        fixed(seconds, 0, 0),
    )
}

/// Session start to the last captured sample, never negative.
pub fn session_duration(store: &SessionStore, started: DateTime<Utc>) -> TimeDelta {
    store
        .last_valid()
        .and_then(Sample::timestamp)
        .map(|t| (t - started).max(TimeDelta::zero()))
        .unwrap_or_else(TimeDelta::zero)
}

fn stats_line(acc: &StatisticsAccumulator, unit: &str, mean_precision: usize, extreme_precision: usize) -> String {
    match (acc.mean(), acc.min(), acc.max()) {
        (Some(mean), Some(min), Some(max)) => format!(
            "{mean:.mean_precision$} {unit}  [{min:.extreme_precision$} - {max:.extreme_precision$}]"
        ),
        _ => "n/a".to_string(),
    }
}

/// Duration and environmental statistics, temperature mean to 0.01 °C and
/// everything else to one decimal.
pub fn session_summary(duration: TimeDelta, env: &EnvironmentSummary) -> Vec<String> {
    let minutes = duration.num_minutes();
    vec![
        format!("Duration:            {} h {} min", minutes / 60, minutes % 60),
        format!("Average temperature: {}", stats_line(&env.temperature, "°C", 2, 1)),
        format!("Average humidity:    {}", stats_line(&env.humidity, "%", 1, 1)),
    ]
}

/// What the session log records about a run before the first capture.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub application: String,
    pub started: DateTime<Utc>,
    pub gauge_id: String,
    pub thermo_id: String,
    pub target_file: String,
    pub targets: usize,
    pub result_file: String,
    pub comment: String,
}

/// Emits the report sections of a session into a sink.
pub struct Reporter<'a> {
    sink: &'a mut dyn Sink,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a mut dyn Sink) -> Self {
        Self { sink }
    }

    pub fn banner(&mut self, info: &SessionInfo) {
        self.sink.display("");
        self.sink.log(&separator('='));
        for line in [
            format!("Application:       {}", info.application),
            format!("StartTimeUTC:      {}", info.started.format("%d-%m-%Y %H:%M")),
            format!("GaugeID:           {}", info.gauge_id),
            format!("ThermoHygroID:     {}", info.thermo_id),
            format!("Target file:       {}", info.target_file),
            format!("Number of targets: {}", info.targets),
            format!("Result file:       {}", info.result_file),
            format!("Comment:           {}", info.comment),
        ] {
            self.sink.log_and_display(&line);
        }
        self.sink.log(&separator('-'));
        self.sink.display("");
    }

    /// Listing of the captured samples followed by the session summary.
    pub fn results(&mut self, store: &SessionStore, env: &EnvironmentSummary, started: DateTime<Utc>) {
        self.sink.display("");
        self.sink.log(&separator('-'));
        for sample in store.valid_samples() {
            self.sink.log_and_display(&format!("   {}", summary_line(sample)));
        }
        self.sink.log(&separator('-'));
        for line in session_summary(session_duration(store, started), env) {
            self.sink.log(&line);
        }
        self.sink.log(&separator('='));
        self.sink.display("");
    }
}
