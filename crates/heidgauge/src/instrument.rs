//! Instrument read contracts and the stand-in instruments.
//!
//! The session core only ever talks to these traits. Serial drivers for real
//! gauges and sensors live outside this crate; the simulated instruments are
//! what the binary uses when no driver is attached.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::Result;

/// A length-measuring instrument (e.g. a digital readout on a linear scale).
pub trait PositionInstrument {
    /// Human-readable instrument identification.
    fn identify(&self) -> String;

    /// Current position in mm. May return a cached value.
    fn read_value(&mut self) -> Result<f64>;
}

/// An air temperature / relative humidity sensor.
pub trait EnvironmentInstrument {
    fn identify(&self) -> String;

    /// Air temperature in °C.
    fn read_temperature(&mut self) -> Result<f64>;

    /// Relative humidity in %.
    fn read_humidity(&mut self) -> Result<f64>;
}

impl<T: PositionInstrument + ?Sized> PositionInstrument for Box<T> {
    fn identify(&self) -> String {
        (**self).identify()
    }

    fn read_value(&mut self) -> Result<f64> {
        (**self).read_value()
    }
}

impl<T: EnvironmentInstrument + ?Sized> EnvironmentInstrument for Box<T> {
    fn identify(&self) -> String {
        (**self).identify()
    }

    fn read_temperature(&mut self) -> Result<f64> {
        (**self).read_temperature()
    }

    fn read_humidity(&mut self) -> Result<f64> {
        (**self).read_humidity()
    }
}

/// Gauge stand-in that reports a fixed position.
#[derive(Debug, Clone)]
pub struct SimulatedGauge {
    value: f64,
}

impl SimulatedGauge {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn set(&mut self, value: f64) {
        self.value = value;
    }
}

impl PositionInstrument for SimulatedGauge {
    fn identify(&self) -> String {
        "Simulated length gauge".to_string()
    }

    fn read_value(&mut self) -> Result<f64> {
        Ok(self.value)
    }
}

/// Thermo-hygrometer stand-in that reports fixed conditions.
#[derive(Debug, Clone)]
pub struct SimulatedThermoHygrometer {
    temperature: f64,
    humidity: f64,
}

impl SimulatedThermoHygrometer {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
        }
    }
}

impl EnvironmentInstrument for SimulatedThermoHygrometer {
    fn identify(&self) -> String {
        "Simulated thermo-hygrometer".to_string()
    }

    fn read_temperature(&mut self) -> Result<f64> {
        Ok(self.temperature)
    }

    fn read_humidity(&mut self) -> Result<f64> {
        Ok(self.humidity)
    }
}

/// Caches an environment sensor so it is queried at most once per period.
///
/// Slow serial sensors answer both values in one transaction; reading
/// temperature and then humidity within the period costs one query.
pub struct RefreshGated<E> {
    inner: E,
    period: Duration,
    cached: Option<Cached>,
}

#[derive(Debug, Clone, Copy)]
struct Cached {
    at: Instant,
    temperature: f64,
    humidity: f64,
}

impl<E: EnvironmentInstrument> RefreshGated<E> {
    pub fn new(inner: E, period: Duration) -> Self {
        Self {
            inner,
            period,
            cached: None,
        }
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    fn refresh(&mut self) -> Result<Cached> {
        match self.cached {
            Some(c) if c.at.elapsed() <= self.period => Ok(c),
            _ => {
                let fresh = Cached {
                    temperature: self.inner.read_temperature()?,
                    humidity: self.inner.read_humidity()?,
                    at: Instant::now(),
                };
                debug!(
                    temperature = fresh.temperature,
                    humidity = fresh.humidity,
                    "environment refreshed"
                );
                self.cached = Some(fresh);
                Ok(fresh)
            }
        }
    }
}

impl<E: EnvironmentInstrument> EnvironmentInstrument for RefreshGated<E> {
    fn identify(&self) -> String {
        self.inner.identify()
    }

    fn read_temperature(&mut self) -> Result<f64> {
        Ok(self.refresh()?.temperature)
    }

    fn read_humidity(&mut self) -> Result<f64> {
        Ok(self.refresh()?.humidity)
    }
}

/// Discard a number of humidity reads so a freshly powered sensor settles.
pub fn warm_up(
    instrument: &mut dyn EnvironmentInstrument,
    reads: u32,
    interval: Duration,
) -> Result<()> {
    if reads == 0 {
        return Ok(());
    }
    info!(reads, ?interval, "warming up {}", instrument.identify());
    for _ in 0..reads {
        instrument.read_humidity()?;
        thread::sleep(interval);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    /// Counts every query that reaches the "hardware".
    struct CountingSensor {
        queries: u32,
    }

    impl EnvironmentInstrument for CountingSensor {
        fn identify(&self) -> String {
            "counting".to_string()
        }

        fn read_temperature(&mut self) -> Result<f64> {
            self.queries += 1;
            Ok(20.0 + self.queries as f64)
        }

        fn read_humidity(&mut self) -> Result<f64> {
            Ok(50.0)
        }
    }

    struct FailingSensor;

    impl EnvironmentInstrument for FailingSensor {
        fn identify(&self) -> String {
            "failing".to_string()
        }

        fn read_temperature(&mut self) -> Result<f64> {
            Err(Error::Instrument {
                instrument: self.identify(),
                message: "timeout".to_string(),
            })
        }

        fn read_humidity(&mut self) -> Result<f64> {
            self.read_temperature()
        }
    }

    #[test]
    fn test_simulated_instruments() {
        let mut gauge = SimulatedGauge::new(1.5);
        assert_eq!(gauge.read_value().unwrap(), 1.5);
        gauge.set(2.5);
        assert_eq!(gauge.read_value().unwrap(), 2.5);

        let mut thermo = SimulatedThermoHygrometer::new(20.1, 45.0);
        assert_eq!(thermo.read_temperature().unwrap(), 20.1);
        assert_eq!(thermo.read_humidity().unwrap(), 45.0);
    }

    #[test]
    fn test_refresh_gated_caches_within_period() {
        let mut gated = RefreshGated::new(CountingSensor { queries: 0 }, Duration::from_secs(3600));
        assert_eq!(gated.read_temperature().unwrap(), 21.0);
        assert_eq!(gated.read_humidity().unwrap(), 50.0);
        assert_eq!(gated.read_temperature().unwrap(), 21.0);
        assert_eq!(gated.into_inner().queries, 1);
    }

    #[test]
    fn test_refresh_gated_requeries_after_period() {
        let mut gated = RefreshGated::new(CountingSensor { queries: 0 }, Duration::ZERO);
        gated.read_temperature().unwrap();
        thread::sleep(Duration::from_millis(2));
        assert_eq!(gated.read_temperature().unwrap(), 22.0);
    }

    #[test]
    fn test_refresh_gated_propagates_failure() {
        let mut gated = RefreshGated::new(FailingSensor, Duration::from_secs(1));
        assert!(matches!(
            gated.read_humidity(),
            Err(Error::Instrument { .. })
        ));
    }

    #[test]
    fn test_warm_up_reads() {
        let mut sensor = CountingSensor { queries: 0 };
        warm_up(&mut sensor, 3, Duration::ZERO).unwrap();

        let mut gated = RefreshGated::new(sensor, Duration::from_secs(3600));
        warm_up(&mut gated, 3, Duration::ZERO).unwrap();
        assert_eq!(gated.into_inner().queries, 1);
    }

    #[test]
    fn test_boxed_instruments() {
        let mut gauge: Box<dyn PositionInstrument> = Box::new(SimulatedGauge::new(4.0));
        assert_eq!(gauge.read_value().unwrap(), 4.0);
        assert_eq!(gauge.identify(), "Simulated length gauge");
    }
}
