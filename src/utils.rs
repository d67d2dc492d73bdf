//! Utility functions for the climate-sentinel crate.

/// Convert Celsius to Fahrenheit.
///
/// Temperatures below freezing and above boiling convert like any other
/// value; the sensor's own supported range is enforced elsewhere.
///
/// # Example
///
/// ```
/// use climate_sentinel::celsius_to_fahrenheit;
///
/// let fahrenheit = celsius_to_fahrenheit(100);
/// assert!((fahrenheit - 212.0).abs() < 0.001);
/// ```
#[inline]
pub fn celsius_to_fahrenheit(celsius: i32) -> f64 {
    celsius as f64 * 1.8 + 32.0
}

/// Convert Fahrenheit to Celsius.
///
/// The result is truncated toward zero, matching the integer resolution
/// the sensor reports Celsius at.
///
/// # Example
///
/// ```
/// use climate_sentinel::fahrenheit_to_celsius;
///
/// let celsius = fahrenheit_to_celsius(212.0);
/// assert_eq!(celsius, 100);
/// ```
#[inline]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> i32 {
    ((fahrenheit - 32.0) / 1.8) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celsius_to_fahrenheit() {
        assert!((celsius_to_fahrenheit(0) - 32.0).abs() < 0.001);
        assert!((celsius_to_fahrenheit(50) - 122.0).abs() < 0.001);
        assert!((celsius_to_fahrenheit(100) - 212.0).abs() < 0.001);
        assert!((celsius_to_fahrenheit(-40) - (-40.0)).abs() < 0.001);
    }

    #[test]
    fn test_fahrenheit_to_celsius() {
        assert_eq!(fahrenheit_to_celsius(32.0), 0);
        assert_eq!(fahrenheit_to_celsius(122.0), 50);
        assert_eq!(fahrenheit_to_celsius(212.0), 100);
        assert_eq!(fahrenheit_to_celsius(-40.0), -40);
    }

    #[test]
    fn test_fahrenheit_to_celsius_truncates() {
        // 104.5°F is 40.27°C; integer Celsius truncates toward zero.
        assert_eq!(fahrenheit_to_celsius(104.5), 40);
        assert_eq!(fahrenheit_to_celsius(33.0), 0);
    }

    #[test]
    fn test_temperature_roundtrip() {
        for celsius in [0, 10, 25, 40, 50] {
            let converted = fahrenheit_to_celsius(celsius_to_fahrenheit(celsius));
            assert_eq!(converted, celsius);
        }
    }
}
