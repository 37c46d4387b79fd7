use chrono::{DateTime, TimeDelta, Utc};

/// One target slot of a calibration run.
///
/// A sample is either uncaptured (every reading empty) or captured (every
/// reading present and a time stamp set). The derived `error` and `elapsed`
/// are only filled in by [`crate::evaluate_errors`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    target: f64,
    measured: Option<f64>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    timestamp: Option<DateTime<Utc>>,
    pub(crate) error: Option<f64>,
    pub(crate) elapsed: Option<TimeDelta>,
}

impl Sample {
    /// An uncaptured slot for `target` (mm).
    pub fn new(target: f64) -> Self {
        Self {
            target,
            measured: None,
            temperature: None,
            humidity: None,
            timestamp: None,
            error: None,
            elapsed: None,
        }
    }

    pub(crate) fn record(
        &mut self,
        measured: f64,
        temperature: f64,
        humidity: f64,
        now: DateTime<Utc>,
    ) {
        self.measured = Some(measured);
        self.temperature = Some(temperature);
        self.humidity = Some(humidity);
        self.timestamp = Some(now);
    }

    /// Drop the captured readings; the slot becomes a fresh placeholder.
    pub(crate) fn invalidate(&mut self) {
        *self = Self::new(self.target);
    }

    pub fn is_valid(&self) -> bool {
        self.timestamp.is_some()
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn measured(&self) -> Option<f64> {
        self.measured
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn humidity(&self) -> Option<f64> {
        self.humidity
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Deviation of the gauge from the nominal target, relative to the origin.
    pub fn error(&self) -> Option<f64> {
        self.error
    }

    /// Time since the first captured sample of the run.
    pub fn elapsed(&self) -> Option<TimeDelta> {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sample_is_placeholder() {
        let sample = Sample::new(12.5);
        assert_eq!(sample.target(), 12.5);
        assert!(!sample.is_valid());
        assert_eq!(sample.measured(), None);
        assert_eq!(sample.temperature(), None);
        assert_eq!(sample.humidity(), None);
        assert_eq!(sample.timestamp(), None);
    }

    #[test]
    fn test_record_then_invalidate() {
        let mut sample = Sample::new(3.0);
        sample.record(3.001, 20.3, 41.0, Utc::now());
        assert!(sample.is_valid());
        assert_eq!(sample.measured(), Some(3.001));

        sample.invalidate();
        assert_eq!(sample, Sample::new(3.0));
    }
}
