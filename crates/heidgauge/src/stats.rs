/// Running count/sum/min/max over a stream of readings.
///
/// An accumulator that has seen no values is empty: `mean`, `min` and `max`
/// all return `None`, which is distinct from having been fed a zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsAccumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }
}

impl Extend<f64> for StatisticsAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.update(value);
        }
    }
}
