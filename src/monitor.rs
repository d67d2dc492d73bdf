//! Monitor task.
//!
//! While the monitor mode is active this task samples the sensor and checks
//! each reading against the configured envelope, in fixed priority order:
//! low temperature, high temperature, low humidity, high humidity. The first
//! failing check is the one reported. A breach renders its reason, emits an
//! [`AlertEvent`], forces alert mode, and runs the beep/flash loop until a
//! command key moves the mode on — a cleared breach does not silence the
//! alert by itself.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::data::{MeasurementUnit, Mode, SensorReading, ThresholdConfig};
use crate::display::SharedDisplay;
use crate::error::Result;
use crate::hal::{CharacterDisplay, ClimateSensor, DigitalOutput};
use crate::state::SharedState;

/// Pacing between sensor reads while monitoring.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Mode recheck interval while the task is idle.
pub const IDLE_POLL: Duration = Duration::from_secs(1);

/// Beep/flash on and off time during an alert.
pub const ALERT_INTERVAL: Duration = Duration::from_secs(1);

/// Which envelope bound a reading breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlertReason {
    /// Temperature below the configured minimum.
    TemperatureTooLow,
    /// Temperature above the configured maximum.
    TemperatureTooHigh,
    /// Relative humidity below the configured minimum.
    HumidityTooLow,
    /// Relative humidity above the configured maximum.
    HumidityTooHigh,
}

impl AlertReason {
    /// Write the reason onto the two-line display.
    fn render(&self, display: &dyn CharacterDisplay) -> Result<()> {
        display.clear()?;
        match self {
            Self::TemperatureTooLow => {
                display.print("Temperature Too")?;
                display.set_cursor(6, 1)?;
                display.print("Low")
            }
            Self::TemperatureTooHigh => {
                display.print("Temperature Too")?;
                display.set_cursor(6, 1)?;
                display.print("High")
            }
            Self::HumidityTooLow => display.print("Humidity Too Low"),
            Self::HumidityTooHigh => {
                display.print("Humidity Too")?;
                display.set_cursor(6, 1)?;
                display.print("High")
            }
        }
    }
}

impl std::fmt::Display for AlertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TemperatureTooLow => write!(f, "Temperature Too Low"),
            Self::TemperatureTooHigh => write!(f, "Temperature Too High"),
            Self::HumidityTooLow => write!(f, "Humidity Too Low"),
            Self::HumidityTooHigh => write!(f, "Humidity Too High"),
        }
    }
}

/// A threshold breach, emitted on the controller's alert channel.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertEvent {
    /// Which bound was breached.
    pub reason: AlertReason,
    /// When the breach was detected.
    pub at: DateTime<Utc>,
}

/// Check a reading against the envelope in fixed priority order.
///
/// Temperature is compared in the currently selected unit's bounds; only the
/// first failing check is reported.
pub(crate) fn detect_breach(
    reading: &SensorReading,
    limits: &ThresholdConfig,
    unit: MeasurementUnit,
) -> Option<AlertReason> {
    let temperature = reading.temperature_in(unit);
    let (temp_min, temp_max) = match unit {
        MeasurementUnit::Celsius => (limits.temp_min_c as f64, limits.temp_max_c as f64),
        MeasurementUnit::Fahrenheit => (limits.temp_min_f, limits.temp_max_f),
    };

    if temperature < temp_min {
        Some(AlertReason::TemperatureTooLow)
    } else if temperature > temp_max {
        Some(AlertReason::TemperatureTooHigh)
    } else if reading.humidity < limits.humidity_min {
        Some(AlertReason::HumidityTooLow)
    } else if reading.humidity > limits.humidity_max {
        Some(AlertReason::HumidityTooHigh)
    } else {
        None
    }
}

/// Samples the sensor while monitoring and escalates breaches into alerts.
pub(crate) struct MonitorTask {
    sensor: Arc<dyn ClimateSensor>,
    display: Arc<SharedDisplay>,
    buzzer: Arc<dyn DigitalOutput>,
    led: Arc<dyn DigitalOutput>,
    state: Arc<SharedState>,
    alert_tx: broadcast::Sender<AlertEvent>,
}

impl MonitorTask {
    pub(crate) fn new(
        sensor: Arc<dyn ClimateSensor>,
        display: Arc<SharedDisplay>,
        buzzer: Arc<dyn DigitalOutput>,
        led: Arc<dyn DigitalOutput>,
        state: Arc<SharedState>,
        alert_tx: broadcast::Sender<AlertEvent>,
    ) -> Self {
        Self {
            sensor,
            display,
            buzzer,
            led,
            state,
            alert_tx,
        }
    }

    pub(crate) async fn run(self) {
        loop {
            if !self.state.mode().is_monitoring() {
                sleep(IDLE_POLL).await;
                continue;
            }

            match self.sensor.read().await {
                Ok(reading) => {
                    self.state.store_reading(reading);

                    let limits = self.state.thresholds();
                    let unit = self.state.unit();
                    if let Some(reason) = detect_breach(&reading, &limits, unit) {
                        self.raise_alert(reason).await;
                        continue;
                    }
                }
                Err(e) => warn!("sensor read failed, keeping last reading: {e}"),
            }

            sleep(SAMPLE_INTERVAL).await;
        }
    }

    /// Escalate into alert mode and beep/flash until a command key exits it.
    async fn raise_alert(&self, reason: AlertReason) {
        info!("threshold breach: {reason}");

        // Mode flips before the reason is painted, so a reading render that
        // was already past its mode check cannot overwrite the alert text.
        self.state.set_mode(Mode::Alert);
        if let Err(e) = self.display.render(|device| reason.render(device)) {
            warn!("display write failed: {e}");
        }
        let _ = self.alert_tx.send(AlertEvent {
            reason,
            at: Utc::now(),
        });

        while self.state.mode().is_alert() {
            self.buzzer.set_high();
            self.led.set_high();
            sleep(ALERT_INTERVAL).await;
            self.buzzer.set_low();
            self.led.set_low();
            sleep(ALERT_INTERVAL).await;
        }

        // The mode may have moved on mid-pulse.
        self.buzzer.set_low();
        self.led.set_low();
    }
}
