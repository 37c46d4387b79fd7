//! The interactive capture loop.
//!
//! The controller waits for operator events with a bounded poll interval,
//! refreshing a live gauge preview between polls. Captures and undos are
//! applied to the owned [`SessionStore`]; the session ends when every target
//! has been captured or the operator quits.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::input::{InputEvent, InputSource};
use crate::instrument::{EnvironmentInstrument, PositionInstrument};
use crate::report::terse_line;
use crate::sink::Sink;
use crate::store::SessionStore;
use crate::{Error, Result};

pub const PROMPT: &str =
    "press 'space' or 'enter' to record a measurement, 'd' to delete previous, 'q' to quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    AwaitingInput,
    Capturing,
    Done,
}

pub struct SessionController<'a, P, E> {
    store: SessionStore,
    gauge: P,
    thermo: E,
    sink: &'a mut dyn Sink,
    state: ControllerState,
    poll_interval: Duration,
}

impl<'a, P: PositionInstrument, E: EnvironmentInstrument> SessionController<'a, P, E> {
    pub fn new(store: SessionStore, gauge: P, thermo: E, sink: &'a mut dyn Sink) -> Self {
        let state = if store.is_empty() {
            ControllerState::Done
        } else {
            ControllerState::AwaitingInput
        };
        Self {
            store,
            gauge,
            thermo,
            sink,
            state,
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn into_store(self) -> SessionStore {
        self.store
    }

    /// Drive the session until it is done.
    ///
    /// Only input failures end the loop early with an error; the store keeps
    /// whatever was captured up to that point.
    pub fn run(&mut self, input: &mut dyn InputSource) -> Result<()> {
        while self.state != ControllerState::Done {
            self.sink.display(PROMPT);
            let event = loop {
                if !input.is_pending()? {
                    self.preview();
                }
                if let Some(event) = input.poll_event(self.poll_interval)? {
                    break event;
                }
            };
            self.sink.display("");
            self.handle(event)?;
        }
        info!(
            captured = self.store.next_index(),
            targets = self.store.len(),
            "session finished"
        );
        Ok(())
    }

    /// Apply one operator event.
    pub fn handle(&mut self, event: InputEvent) -> Result<ControllerState> {
        if self.state == ControllerState::Done {
            debug!(?event, "ignoring event after session end");
            return Ok(self.state);
        }

        match event {
            InputEvent::Quit => {
                info!(remaining = self.store.len() - self.store.next_index(), "session aborted");
                self.sink.log("Aborted!");
                self.state = ControllerState::Done;
            }
            InputEvent::Capture => self.capture()?,
            InputEvent::Undo => match self.store.undo() {
                Ok(sample) => {
                    info!(nominal = sample.target(), "entry deleted");
                    self.sink.log("Entry deleted!");
                    self.sink.display("");
                }
                Err(Error::NothingToUndo) => {
                    debug!("undo with nothing captured");
                    self.sink.display("   nothing to delete");
                }
                Err(e) => return Err(e),
            },
        }
        Ok(self.state)
    }

    fn capture(&mut self) -> Result<()> {
        self.state = ControllerState::Capturing;

        let readings = self.gauge.read_value().and_then(|value| {
            let temperature = self.thermo.read_temperature()?;
            let humidity = self.thermo.read_humidity()?;
            Ok((value, temperature, humidity))
        });

        let (value, temperature, humidity) = match readings {
            Ok(r) => r,
            Err(e) => {
                warn!("capture failed: {e}");
                self.sink.log_and_display(&format!("   capture failed: {e}"));
                self.state = ControllerState::AwaitingInput;
                return Ok(());
            }
        };

        let sample = self.store.capture(value, temperature, humidity, Utc::now())?;
        let line = format!("   {}", terse_line(sample));
        self.sink.log_and_display(&line);
        self.sink.display("");

        self.state = if self.store.is_exhausted() {
            ControllerState::Done
        } else {
            ControllerState::AwaitingInput
        };
        Ok(())
    }

    /// Show the live gauge reading next to the pending target.
    fn preview(&mut self) {
        let Some(target) = self.store.next_target() else {
            return;
        };
        // Keeps a refresh-gated sensor warm between captures
        if let Err(e) = self.thermo.read_humidity() {
            debug!("preview environment read failed: {e}");
        }
        let reading = match self.gauge.read_value() {
            Ok(v) => format!("{v:9.4}"),
            Err(_) => format!("{:>9}", "--"),
        };
        let line = format!(
            "   Target {} of {} ({:8.3} mm):    {} mm ",
            self.store.next_index() + 1,
            self.store.len(),
            target,
            reading
        );
        self.sink.preview(&line);
    }
}
