//! Manual dimensional-calibration sessions.
//!
//! An operator steps through a list of nominal target positions. At each
//! step the session captures the length gauge reading together with air
//! temperature and humidity. Once the run is over, every point's error is
//! derived relative to the first captured point, the environmental
//! readings are summarised, and the whole run is written out as a CSV
//! calibration record.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use heidgauge::{Direction, EnvironmentSummary, SessionStore};
//!
//! let mut store = SessionStore::load(vec![0.0, 5.0, 10.0]);
//! store.capture(0.0, 20.1, 45.0, Utc::now()).unwrap();
//! store.capture(5.1, 20.2, 45.5, Utc::now()).unwrap();
//!
//! store.evaluate_errors(Direction::Forward);
//! assert!((store.samples()[1].error().unwrap() + 0.1).abs() < 1e-9);
//!
//! let env = EnvironmentSummary::evaluate(store.samples());
//! assert_eq!(env.temperature.count(), 2);
//! ```

pub mod controller;
pub mod evaluate;
pub mod input;
pub mod instrument;
pub mod report;
pub mod sample;
pub mod sink;
pub mod stats;
pub mod store;

pub use controller::{ControllerState, SessionController};
pub use evaluate::{evaluate_errors, Direction, EnvironmentSummary};
pub use input::{InputEvent, InputSource, ScriptedInput, TerminalInput};
pub use instrument::{
    EnvironmentInstrument, PositionInstrument, RefreshGated, SimulatedGauge,
    SimulatedThermoHygrometer,
};
pub use report::{Reporter, SessionInfo};
pub use sample::Sample;
pub use sink::{ConsoleSink, MemorySink, Sink};
pub use stats::StatisticsAccumulator;
pub use store::SessionStore;

/// Errors from calibration session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("session exhausted: all {0} targets have been captured")]
    SessionExhausted(usize),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("target list contains no parseable values")]
    MalformedTargetList,

    #[error("{instrument} read failed: {message}")]
    Instrument { instrument: String, message: String },

    #[error("input error: {0}")]
    Input(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
