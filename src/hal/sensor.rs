//! Climate sensor contract.

use async_trait::async_trait;

use crate::data::SensorReading;
use crate::error::Result;

/// A combined temperature and humidity sensor.
///
/// One call to [`read`](ClimateSensor::read) refreshes all three cached
/// values — Celsius, Fahrenheit, and relative humidity — atomically from the
/// driver's perspective; there is no partial refresh. The read is async
/// because real sensors of this class block for tens of milliseconds while
/// clocking the measurement out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClimateSensor: Send + Sync {
    /// Trigger a fresh measurement and return it.
    async fn read(&self) -> Result<SensorReading>;
}
