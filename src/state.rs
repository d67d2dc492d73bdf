//! Shared state store and mode state machine.
//!
//! Every value in here is touched by more than one concurrent actor — the
//! keypad acquisition task, the display task, and the monitor task — so each
//! field is held behind an explicit, auditable primitive with a documented
//! single-writer role:
//!
//! - `mode` lives in a [`watch`] channel: any task can read the current value
//!   or await a change. Written by acquisition (command keys), the display
//!   task (session completion), and the monitor task (breach).
//! - `unit` and `thresholds` sit behind [`RwLock`]s. `unit` is written only
//!   by the toggle command; `thresholds` only by a completed validated entry
//!   session or the programmatic setter.
//! - The input session uses a single-writer-then-flag protocol made explicit:
//!   acquisition is the only buffer writer and publishes with a
//!   release-ordered store of the dirty flag; the display task is the only
//!   buffer reader and consumes with an acquire-ordered swap. A [`Notify`]
//!   wakes the render loop so nobody busy-spins on the flag.
//! - `reading` is written by whichever task performed the last sensor read
//!   and read by everyone.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, Notify};
use tracing::debug;

use crate::data::{InputSession, MeasurementUnit, Mode, SensorReading, ThresholdConfig};

/// Process-wide mutable state shared by the acquisition, display, and
/// monitor tasks.
pub struct SharedState {
    mode_tx: watch::Sender<Mode>,
    unit: RwLock<MeasurementUnit>,
    thresholds: RwLock<ThresholdConfig>,
    reading: RwLock<Option<SensorReading>>,
    input: RwLock<InputSession>,
    input_dirty: AtomicBool,
    input_notify: Notify,
}

impl SharedState {
    /// Create the store with mode [`Mode::Idle`], Celsius display, and the
    /// sensor's full range as thresholds.
    pub fn new() -> Self {
        let (mode_tx, _) = watch::channel(Mode::Idle);
        Self {
            mode_tx,
            unit: RwLock::new(MeasurementUnit::default()),
            thresholds: RwLock::new(ThresholdConfig::default()),
            reading: RwLock::new(None),
            input: RwLock::new(InputSession::new()),
            input_dirty: AtomicBool::new(false),
            input_notify: Notify::new(),
        }
    }

    // === Mode ===

    /// The current operating mode.
    pub fn mode(&self) -> Mode {
        *self.mode_tx.borrow()
    }

    /// Replace the operating mode, waking every mode watcher.
    pub fn set_mode(&self, mode: Mode) {
        let previous = self.mode_tx.send_replace(mode);
        if previous != mode {
            debug!("mode changed: {previous} -> {mode}");
        }
    }

    /// Subscribe to mode changes.
    pub fn subscribe_mode(&self) -> watch::Receiver<Mode> {
        self.mode_tx.subscribe()
    }

    // === Measurement unit ===

    /// The unit temperatures are displayed and compared in.
    pub fn unit(&self) -> MeasurementUnit {
        *self.unit.read()
    }

    /// Flip between Celsius and Fahrenheit.
    pub fn toggle_unit(&self) {
        let mut unit = self.unit.write();
        *unit = unit.toggled();
        debug!("measurement unit now {}", *unit);
    }

    // === Command keys ===
    //
    // These five operations are the whole of the key-driven mode machine:
    // A = confirm, B = force idle, C = clear-or-toggle, D = enter input,
    // digits = append.

    /// Key `A`: advance the entry stage. No effect without an active session.
    pub fn confirm_entry(&self) {
        let advanced = {
            let mut input = self.input.write();
            let was_active = input.is_active();
            input.advance_stage();
            was_active
        };
        if advanced {
            self.input_notify.notify_one();
        }
    }

    /// Key `B`: force [`Mode::Idle`], except while an input session is
    /// active, where the key is ignored.
    pub fn force_idle(&self) {
        if !self.mode().is_input() {
            self.set_mode(Mode::Idle);
        }
    }

    /// Key `C`: clear the current entry while collecting input, otherwise
    /// toggle the measurement unit. Never changes the mode.
    pub fn clear_or_toggle(&self) {
        if self.mode().is_input() {
            self.input.write().clear_buffer();
            self.input_dirty.store(true, Ordering::Release);
            self.input_notify.notify_one();
        } else {
            self.toggle_unit();
        }
    }

    /// Key `D`: enter [`Mode::Input`] with a fresh session. Exits an alert.
    /// No effect while a session is already being collected.
    pub fn enter_input(&self) {
        if self.mode().is_input() {
            return;
        }
        self.input.write().begin();
        self.input_dirty.store(true, Ordering::Release);
        self.input_notify.notify_one();
        self.set_mode(Mode::Input);
    }

    /// Digit key: append to the entry buffer.
    ///
    /// Accepted only while collecting input and below the nine-digit cap;
    /// rejections are silent. Returns whether the digit was taken.
    pub fn push_digit(&self, digit: char) -> bool {
        if !self.mode().is_input() {
            return false;
        }
        let accepted = self.input.write().push_digit(digit);
        if accepted {
            self.input_dirty.store(true, Ordering::Release);
            self.input_notify.notify_one();
        }
        accepted
    }

    // === Input session (render side) ===

    /// Consume the dirty flag, acquiring any buffer writes made before the
    /// flag was released.
    pub fn take_input_dirty(&self) -> bool {
        self.input_dirty.swap(false, Ordering::Acquire)
    }

    /// Wait until the input session changes (buffer mutation or stage
    /// advance). Callers pair this with a bounded poll as fallback.
    pub async fn input_changed(&self) {
        self.input_notify.notified().await;
    }

    /// The current entry stage, `-1` when no session is active.
    pub fn input_stage(&self) -> i8 {
        self.input.read().stage
    }

    /// Snapshot of the digits entered so far.
    ///
    /// Taken under the lock, so the buffer is never observed mid-mutation.
    pub fn input_buffer(&self) -> String {
        self.input.read().buffer().to_string()
    }

    /// Parse the current buffer as a non-negative integer (empty is 0).
    pub fn entry_value(&self) -> i32 {
        self.input.read().value()
    }

    /// Discard the buffer at the start of a prompt, without signalling.
    pub fn reset_entry(&self) {
        self.input.write().clear_buffer();
        self.input_dirty.store(false, Ordering::Release);
    }

    /// Mark the session inactive after all stages are collected.
    pub fn end_session(&self) {
        self.input.write().end();
    }

    // === Thresholds ===

    /// The configured climate envelope.
    pub fn thresholds(&self) -> ThresholdConfig {
        *self.thresholds.read()
    }

    /// Replace the envelope. Callers validate first.
    pub fn commit_thresholds(&self, config: ThresholdConfig) {
        *self.thresholds.write() = config;
        debug!(
            "thresholds now {}..{} C / {}..{} %RH",
            config.temp_min_c, config.temp_max_c, config.humidity_min, config.humidity_max
        );
    }

    // === Sensor reading ===

    /// The most recent sensor reading, if any read has completed.
    pub fn latest_reading(&self) -> Option<SensorReading> {
        *self.reading.read()
    }

    /// Store a fresh sensor reading.
    pub fn store_reading(&self, reading: SensorReading) {
        *self.reading.write() = Some(reading);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
