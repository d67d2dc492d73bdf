//! Climate controller: owns the peripherals, the shared state, and the
//! background tasks.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::data::{MeasurementUnit, Mode, SensorReading, ThresholdConfig};
use crate::display::{DisplayTask, SharedDisplay};
use crate::error::{Error, Result};
use crate::hal::{CharacterDisplay, ClimateSensor, DigitalOutput, KeypadPort, Watchdog};
use crate::keypad::KeypadScanner;
use crate::monitor::{AlertEvent, MonitorTask};
use crate::state::SharedState;

/// Watchdog timeout. The scan loop must kick at least once per interval or
/// the board resets.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Callback handle for unregistering callbacks.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    /// Create a new callback handle.
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

/// The peripheral set a board hands to the controller.
#[derive(Clone)]
pub struct Peripherals {
    /// Combined temperature/humidity sensor.
    pub sensor: Arc<dyn ClimateSensor>,
    /// Two-line character display.
    pub display: Arc<dyn CharacterDisplay>,
    /// Keypad matrix GPIO.
    pub keypad: Arc<dyn KeypadPort>,
    /// Watchdog timer.
    pub watchdog: Arc<dyn Watchdog>,
    /// Alert buzzer output.
    pub buzzer: Arc<dyn DigitalOutput>,
    /// Acknowledgment/alert LED output.
    pub led: Arc<dyn DigitalOutput>,
}

/// Central controller wiring the keypad, display, monitor, and watchdog
/// responsibilities together.
pub struct ClimateController {
    peripherals: Peripherals,
    state: Arc<SharedState>,
    shared_display: Arc<SharedDisplay>,
    alert_tx: broadcast::Sender<AlertEvent>,
    is_running: AtomicBool,
    tasks: RwLock<Vec<tokio::task::JoinHandle<()>>>,
    callback_counter: AtomicU64,
}

impl ClimateController {
    /// Create a controller around a peripheral set. Nothing runs until
    /// [`start`](ClimateController::start).
    pub fn new(peripherals: Peripherals) -> Self {
        let (alert_tx, _) = broadcast::channel(32);
        let shared_display = Arc::new(SharedDisplay::new(peripherals.display.clone()));

        Self {
            peripherals,
            state: Arc::new(SharedState::new()),
            shared_display,
            alert_tx,
            is_running: AtomicBool::new(false),
            tasks: RwLock::new(Vec::new()),
            callback_counter: AtomicU64::new(0),
        }
    }

    /// Start the watchdog and spawn the scan, acquisition, display, and
    /// monitor tasks. Idempotent while running.
    pub async fn start(&self) -> Result<()> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            debug!("controller already running");
            return Ok(());
        }

        info!("starting climate controller");

        // From here on the scan loop is the only thing keeping the board
        // from resetting.
        self.peripherals.watchdog.start(WATCHDOG_TIMEOUT);

        let scanner = KeypadScanner::new(
            self.peripherals.keypad.clone(),
            self.peripherals.watchdog.clone(),
            self.peripherals.led.clone(),
            self.state.clone(),
        );

        let display_task = DisplayTask::new(
            self.peripherals.sensor.clone(),
            self.shared_display.clone(),
            self.state.clone(),
        );

        let monitor_task = MonitorTask::new(
            self.peripherals.sensor.clone(),
            self.shared_display.clone(),
            self.peripherals.buzzer.clone(),
            self.peripherals.led.clone(),
            self.state.clone(),
            self.alert_tx.clone(),
        );

        let mut tasks = self.tasks.write();
        tasks.extend(scanner.spawn());
        tasks.push(tokio::spawn(display_task.run()));
        tasks.push(tokio::spawn(monitor_task.run()));

        Ok(())
    }

    /// Stop all tasks and quiesce the outputs.
    ///
    /// The watchdog is deliberately left alone: most hardware watchdogs
    /// cannot be stopped once started, so after shutdown the board resets
    /// unless the caller keeps kicking it.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.is_running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        info!("shutting down climate controller");

        let handles: Vec<_> = self.tasks.write().drain(..).collect();
        for handle in &handles {
            handle.abort();
        }
        let _ = futures::future::join_all(handles).await;

        self.peripherals.buzzer.set_low();
        self.peripherals.led.set_low();
        if let Err(e) = self.shared_display.render(|display| display.clear()) {
            warn!("display clear failed during shutdown: {e}");
        }

        Ok(())
    }

    /// Check whether the controller tasks are running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    // === State accessors ===

    /// The current operating mode.
    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// The unit temperatures are displayed and compared in.
    pub fn measurement_unit(&self) -> MeasurementUnit {
        self.state.unit()
    }

    /// The configured climate envelope.
    pub fn thresholds(&self) -> ThresholdConfig {
        self.state.thresholds()
    }

    /// The most recent sensor reading, if any.
    pub fn latest_reading(&self) -> Option<SensorReading> {
        self.state.latest_reading()
    }

    /// Replace the climate envelope programmatically.
    ///
    /// Applies the same validation as a completed keypad entry session; an
    /// invalid configuration is rejected and the prior one retained.
    pub fn set_thresholds(&self, config: ThresholdConfig) -> Result<()> {
        if let Some(reason) = config.validation_error() {
            return Err(Error::InvalidThresholds {
                reason: reason.to_string(),
            });
        }
        self.state.commit_thresholds(config);
        Ok(())
    }

    // === Events ===

    /// Subscribe to mode changes.
    pub fn subscribe_mode(&self) -> watch::Receiver<Mode> {
        self.state.subscribe_mode()
    }

    /// Subscribe to threshold breach events.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.alert_tx.subscribe()
    }

    /// Register a callback for threshold breaches.
    pub fn on_alert<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&AlertEvent) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.alert_tx.subscribe();

        let handle = tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                callback(&event);
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    /// Register a callback for mode changes.
    pub fn on_mode_changed<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(Mode) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.state.subscribe_mode();

        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let mode = *rx.borrow();
                callback(mode);
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }
}

impl Drop for ClimateController {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
        for handle in self.tasks.write().drain(..) {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for ClimateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClimateController")
            .field("mode", &self.mode())
            .field("is_running", &self.is_running())
            .finish()
    }
}
