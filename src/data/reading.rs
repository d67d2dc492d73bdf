//! A single sensor measurement.

use crate::data::MeasurementUnit;
use crate::utils::celsius_to_fahrenheit;

/// One refresh of the temperature and humidity values.
///
/// Celsius and relative humidity come back at integer resolution; the
/// Fahrenheit value is the real-valued conversion. A reading is stale
/// between explicit sensor reads.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    /// Temperature in degrees Celsius.
    pub celsius: i32,
    /// Temperature in degrees Fahrenheit.
    pub fahrenheit: f64,
    /// Relative humidity in percent.
    pub humidity: i32,
}

impl SensorReading {
    /// Build a reading from the sensor's native Celsius and humidity values.
    pub fn from_celsius(celsius: i32, humidity: i32) -> Self {
        Self {
            celsius,
            fahrenheit: celsius_to_fahrenheit(celsius),
            humidity,
        }
    }

    /// The temperature in the given unit, as a real value.
    pub fn temperature_in(&self, unit: MeasurementUnit) -> f64 {
        match unit {
            MeasurementUnit::Celsius => self.celsius as f64,
            MeasurementUnit::Fahrenheit => self.fahrenheit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_celsius_fills_fahrenheit() {
        let reading = SensorReading::from_celsius(25, 60);
        assert_eq!(reading.celsius, 25);
        assert!((reading.fahrenheit - 77.0).abs() < 0.001);
        assert_eq!(reading.humidity, 60);
    }

    #[test]
    fn test_temperature_in_unit() {
        let reading = SensorReading::from_celsius(40, 50);
        assert!((reading.temperature_in(MeasurementUnit::Celsius) - 40.0).abs() < 0.001);
        assert!((reading.temperature_in(MeasurementUnit::Fahrenheit) - 104.0).abs() < 0.001);
    }
}
