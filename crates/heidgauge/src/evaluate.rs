//! Post-session evaluation passes.
//!
//! Both passes run once, after the capture loop has finished.

use crate::sample::Sample;
use crate::stats::StatisticsAccumulator;

/// Direction in which the run traversed the targets.
///
/// A reverse run mirrors the gauge readings before they are compared with
/// the targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn from_opposite(opposite: bool) -> Self {
        if opposite {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// Derive error and elapsed time for every sample, relative to sample 0.
///
/// `error = target - (sign * measured - origin)` with
/// `origin = sign * measured_0`. Samples without a reading get an empty
/// error and elapsed time. Nothing happens if sample 0 was never captured.
pub fn evaluate_errors(samples: &mut [Sample], direction: Direction) {
    let Some(first) = samples.first() else {
        return;
    };
    let (Some(first_value), Some(start)) = (first.measured(), first.timestamp()) else {
        return;
    };

    let sign = direction.sign();
    let origin = sign * first_value;

    for sample in samples.iter_mut() {
        sample.error = sample
            .measured()
            .map(|m| sample.target() - (sign * m - origin));
        sample.elapsed = sample.timestamp().map(|t| t - start);
    }
}

/// Air temperature and humidity statistics over the captured samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentSummary {
    pub temperature: StatisticsAccumulator,
    pub humidity: StatisticsAccumulator,
}

impl EnvironmentSummary {
    /// Feed every valid sample once; placeholders are skipped entirely.
    pub fn evaluate<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Self {
        let mut summary = Self::default();
        for sample in samples.into_iter().filter(|s| s.is_valid()) {
            if let (Some(t), Some(h)) = (sample.temperature(), sample.humidity()) {
                summary.temperature.update(t);
                summary.humidity.update(h);
            }
        }
        summary
    }
}
