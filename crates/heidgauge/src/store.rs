//! The ordered set of target slots for one calibration run.
//!
//! Slots are filled strictly in load order. A cursor marks the next slot to
//! capture: everything before it is captured, everything from it onwards is
//! a placeholder. `capture` and `undo` are the only mutations and they only
//! ever touch the slot next to the cursor.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::evaluate::{self, Direction};
use crate::sample::Sample;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStore {
    samples: Vec<Sample>,
    next: usize,
}

impl SessionStore {
    /// One placeholder slot per target, in the given order.
    ///
    /// An empty list is legal; the resulting store is already exhausted.
    pub fn load(targets: impl IntoIterator<Item = f64>) -> Self {
        let samples: Vec<Sample> = targets.into_iter().map(Sample::new).collect();
        Self { samples, next: 0 }
    }

    /// Load a target list from a text stream.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Ok(Self::load(parse_targets(reader)?))
    }

    /// Load a target list file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Fill the slot under the cursor and advance.
    pub fn capture(
        &mut self,
        value: f64,
        temperature: f64,
        humidity: f64,
        now: DateTime<Utc>,
    ) -> Result<&Sample> {
        let index = self.next;
        let slot = self
            .samples
            .get_mut(index)
            .ok_or(Error::SessionExhausted(index))?;
        slot.record(value, temperature, humidity, now);
        self.next += 1;
        debug!(index, target = slot.target(), value, "captured");
        Ok(&self.samples[index])
    }

    /// Step the cursor back and discard the slot it lands on.
    pub fn undo(&mut self) -> Result<&Sample> {
        if self.next == 0 {
            return Err(Error::NothingToUndo);
        }
        self.next -= 1;
        let slot = &mut self.samples[self.next];
        slot.invalidate();
        debug!(index = self.next, target = slot.target(), "undone");
        Ok(&self.samples[self.next])
    }

    pub fn is_exhausted(&self) -> bool {
        self.next == self.samples.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the next slot to capture.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Nominal position of the next slot to capture, if any remain.
    pub fn next_target(&self) -> Option<f64> {
        self.samples.get(self.next).map(Sample::target)
    }

    pub fn valid_samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| s.is_valid())
    }

    /// The most recently captured sample.
    pub fn last_valid(&self) -> Option<&Sample> {
        self.next.checked_sub(1).map(|i| &self.samples[i])
    }

    /// Derive every slot's error and elapsed time from slot 0.
    pub fn evaluate_errors(&mut self, direction: Direction) {
        evaluate::evaluate_errors(&mut self.samples, direction);
    }
}

/// Read one target per line, silently skipping lines that are not a number.
///
/// Bytes that are not UTF-8 are decoded lossily, so such a line is skipped
/// like any other garbage. `NaN` and infinities parse as floats but are not
/// usable targets and are skipped too. Only read failures are errors.
pub fn parse_targets<R: BufRead>(reader: R) -> Result<Vec<f64>> {
    let mut targets = Vec::new();
    for raw in reader.split(b'\n') {
        let raw = raw?;
        let line = String::from_utf8_lossy(&raw);
        match line.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => targets.push(v),
            _ => debug!(line = %line, "skipping non-numeric target line"),
        }
    }
    Ok(targets)
}
