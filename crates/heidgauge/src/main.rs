//! heidgauge - step through a list of target positions and record a
//! calibration run against a length gauge and a thermo-hygrometer.
//!
//! Keys: space/enter records a measurement, `d` deletes the previous one,
//! `q` ends the session early.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use gaugeconf::GaugeConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use heidgauge::instrument::warm_up;
use heidgauge::report::{result_file_name, write_csv_file};
use heidgauge::{
    ConsoleSink, Direction, EnvironmentInstrument, EnvironmentSummary, PositionInstrument,
    RefreshGated, Reporter, SessionController, SessionInfo, SessionStore, SimulatedGauge,
    SimulatedThermoHygrometer, Sink, TerminalInput,
};

#[derive(Parser, Debug)]
#[command(name = "heidgauge")]
#[command(version, about = "Manual dimensional calibration against a length gauge")]
struct Cli {
    /// Text file with one nominal target position (mm) per line
    #[arg(required_unless_present = "print_config")]
    target_file: Option<PathBuf>,

    /// Session log file (appended to)
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Free-text comment for the session log
    #[arg(long)]
    comment: Option<String>,

    /// Result file name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Directory for the CSV result file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// The gauge counts opposite to the target direction
    #[arg(long)]
    reverse: bool,

    /// Config file, used instead of ./heidgauge.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut GaugeConfig) {
        if let Some(path) = &self.logfile {
            config.infra.paths.log_file = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.infra.paths.output_dir = dir.clone();
        }
        if let Some(comment) = &self.comment {
            config.session.comment = comment.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.session.file_prefix = prefix.clone();
        }
        if self.reverse {
            config.session.opposite_direction = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        GaugeConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    if cli.print_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    let filter = EnvFilter::try_new(&config.infra.telemetry.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let Some(target_file) = cli.target_file.as_deref() else {
        bail!("no target file given");
    };

    let started = Utc::now();
    let store = SessionStore::from_path(target_file)
        .with_context(|| format!("Failed to read target file {}", target_file.display()))?;
    if store.is_empty() {
        warn!(path = %target_file.display(), "{}", heidgauge::Error::MalformedTargetList);
    }

    let instruments = &config.infra.instruments;
    let gauge = SimulatedGauge::new(instruments.simulated_position);
    let mut thermo = RefreshGated::new(
        SimulatedThermoHygrometer::new(
            instruments.simulated_temperature,
            instruments.simulated_humidity,
        ),
        Duration::from_millis(instruments.refresh_period_ms),
    );
    warm_up(
        &mut thermo,
        instruments.warmup_reads,
        Duration::from_millis(instruments.warmup_interval_ms),
    )
    .context("Thermo-hygrometer warm-up failed")?;

    let result_path = config
        .infra
        .paths
        .output_dir
        .join(result_file_name(&config.session.file_prefix, target_file, started));

    let log_path = &config.infra.paths.log_file;
    let mut sink = ConsoleSink::open(log_path)
        .with_context(|| format!("Failed to open session log {}", log_path.display()))?;

    Reporter::new(&mut sink).banner(&SessionInfo {
        application: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        started,
        gauge_id: gauge.identify(),
        thermo_id: thermo.identify(),
        target_file: target_file.display().to_string(),
        targets: store.len(),
        result_file: result_path.display().to_string(),
        comment: config.session.comment.clone(),
    });

    let mut store = {
        // Raw mode ends when `input` drops, before the results are printed
        let mut input = TerminalInput::new().context("Failed to set up terminal input")?;
        let mut controller = SessionController::new(store, gauge, thermo, &mut sink)
            .with_poll_interval(Duration::from_millis(config.session.poll_interval_ms));
        if let Err(e) = controller.run(&mut input) {
            error!("session interrupted: {e}");
        }
        controller.into_store()
    };

    store.evaluate_errors(Direction::from_opposite(config.session.opposite_direction));
    let env = EnvironmentSummary::evaluate(store.samples());
    Reporter::new(&mut sink).results(&store, &env, started);

    if !store.is_empty() {
        write_csv_file(&result_path, store.samples())
            .with_context(|| format!("Failed to write {}", result_path.display()))?;
    }
    info!(
        captured = store.valid_samples().count(),
        targets = store.len(),
        "calibration run complete"
    );
    sink.display("done");

    Ok(())
}
