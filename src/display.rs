//! Display task.
//!
//! Renders live readings while idle or monitoring, and runs the four-prompt
//! threshold entry session while collecting input. During an alert the alert
//! path owns the display surface; this task only waits for the mode to move
//! on.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::data::{MeasurementUnit, Mode, SensorReading};
use crate::error::Result;
use crate::hal::{CharacterDisplay, ClimateSensor};
use crate::state::SharedState;

/// Pause between reading refreshes while idle or monitoring.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Bounded poll fallback for the entry render loop.
pub const INPUT_POLL: Duration = Duration::from_millis(100);

/// How long the invalid-input notice stays up before reverting to idle.
pub const INVALID_NOTICE: Duration = Duration::from_secs(3);

/// The four entry prompts, in collection order.
pub const PROMPTS: [&str; 4] = [
    "Min Temperature?",
    "Max Temperature?",
    "Min Humidity?",
    "Max Humidity?",
];

/// Serializes access to the display surface.
///
/// The display task and the monitor task's alert path both write to the
/// device; every write goes through [`render`](SharedDisplay::render) so the
/// two can never interleave mid-frame.
pub(crate) struct SharedDisplay {
    device: Arc<dyn CharacterDisplay>,
    guard: Mutex<()>,
}

impl SharedDisplay {
    pub(crate) fn new(device: Arc<dyn CharacterDisplay>) -> Self {
        Self {
            device,
            guard: Mutex::new(()),
        }
    }

    /// Run a frame of display writes while holding the surface.
    pub(crate) fn render<F>(&self, frame: F) -> Result<()>
    where
        F: FnOnce(&dyn CharacterDisplay) -> Result<()>,
    {
        let _lock = self.guard.lock();
        frame(self.device.as_ref())
    }
}

/// Write a prompt on the top line and park the cursor on the bottom line.
fn render_prompt(display: &dyn CharacterDisplay, prompt: &str) -> Result<()> {
    display.clear()?;
    display.print(prompt)?;
    display.set_cursor(0, 1)
}

/// Write the current reading: temperature in the selected unit on top,
/// humidity below.
fn render_reading(
    display: &dyn CharacterDisplay,
    reading: &SensorReading,
    unit: MeasurementUnit,
) -> Result<()> {
    display.clear()?;
    match unit {
        MeasurementUnit::Celsius => {
            display.print("Temp (C): ")?;
            display.print(&reading.celsius.to_string())?;
        }
        MeasurementUnit::Fahrenheit => {
            display.print("Temp (F): ")?;
            display.print(&format!("{:.1}", reading.fahrenheit))?;
        }
    }
    display.set_cursor(0, 1)?;
    display.print("Humidity: ")?;
    display.print(&reading.humidity.to_string())
}

fn render_invalid_notice(display: &dyn CharacterDisplay) -> Result<()> {
    display.clear()?;
    display.print("Invalid Input")?;
    display.set_cursor(0, 1)?;
    display.print("Please Try Again")
}

/// Renders readings and entry prompts according to the current mode.
pub(crate) struct DisplayTask {
    sensor: Arc<dyn ClimateSensor>,
    display: Arc<SharedDisplay>,
    state: Arc<SharedState>,
}

impl DisplayTask {
    pub(crate) fn new(
        sensor: Arc<dyn ClimateSensor>,
        display: Arc<SharedDisplay>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            sensor,
            display,
            state,
        }
    }

    pub(crate) async fn run(self) {
        loop {
            match self.state.mode() {
                Mode::Idle | Mode::Monitor => {
                    self.refresh_and_render().await;
                    sleep(REFRESH_INTERVAL).await;
                }
                Mode::Input => self.run_input_session().await,
                Mode::Alert => {
                    // The alert path owns the surface; wake when the mode
                    // changes, with a bounded wait as fallback.
                    let mut mode_rx = self.state.subscribe_mode();
                    let _ = tokio::time::timeout(REFRESH_INTERVAL, mode_rx.changed()).await;
                }
            }
        }
    }

    /// Refresh the shared reading from the sensor and render it.
    ///
    /// A failed read keeps the last known reading on screen.
    async fn refresh_and_render(&self) {
        match self.sensor.read().await {
            Ok(reading) => self.state.store_reading(reading),
            Err(e) => warn!("sensor read failed, keeping last reading: {e}"),
        }

        let Some(reading) = self.state.latest_reading() else {
            return;
        };
        let unit = self.state.unit();
        let state = &self.state;
        let outcome = self.display.render(|device| {
            // Re-checked under the surface lock: an alert raised after the
            // mode match above must not be painted over.
            if !state.mode().display_owns_surface() {
                return Ok(());
            }
            render_reading(device, &reading, unit)
        });
        if let Err(e) = outcome {
            warn!("display write failed: {e}");
        }
    }

    /// Collect the four threshold entries, then validate and commit.
    async fn run_input_session(&self) {
        let mut staged = self.state.thresholds();

        for stage in 0..PROMPTS.len() as i8 {
            self.collect_stage(stage).await;
            let value = self.state.entry_value();
            let unit = self.state.unit();
            match stage {
                0 => staged.set_temp_min(value, unit),
                1 => staged.set_temp_max(value, unit),
                2 => staged.set_humidity_min(value),
                _ => staged.set_humidity_max(value),
            }
        }

        self.state.end_session();

        if staged.is_valid() {
            info!(
                "thresholds accepted: {}..{} C, {}..{} %RH",
                staged.temp_min_c, staged.temp_max_c, staged.humidity_min, staged.humidity_max
            );
            self.state.commit_thresholds(staged);
            self.state.set_mode(Mode::Monitor);
        } else {
            // The prior configuration is untouched; only the staged copy
            // carried the rejected values.
            warn!(
                "thresholds rejected: {}",
                staged.validation_error().unwrap_or("invalid")
            );
            if let Err(e) = self.display.render(render_invalid_notice) {
                warn!("display write failed: {e}");
            }
            sleep(INVALID_NOTICE).await;
            self.state.set_mode(Mode::Idle);
        }
    }

    /// Render one prompt and echo the buffer until the stage advances.
    async fn collect_stage(&self, stage: i8) {
        let prompt = PROMPTS[stage as usize];

        self.state.reset_entry();
        if let Err(e) = self.display.render(|device| render_prompt(device, prompt)) {
            warn!("display write failed: {e}");
        }

        while self.state.input_stage() <= stage {
            if self.state.take_input_dirty() {
                let buffer = self.state.input_buffer();
                let outcome = self.display.render(|device| {
                    render_prompt(device, prompt)?;
                    device.print(&buffer)
                });
                if let Err(e) = outcome {
                    warn!("display write failed: {e}");
                }
            }

            tokio::select! {
                _ = self.state.input_changed() => {}
                _ = sleep(INPUT_POLL) => {}
            }
        }
    }
}
