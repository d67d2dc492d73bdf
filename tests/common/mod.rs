//! Simulated peripherals for end-to-end tests.
//!
//! The keypad sim is electrically faithful: an edge is only delivered while
//! the pressed key's row is energized, exactly like the real matrix.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use climate_sentinel::hal::{
    CharacterDisplay, ClimateSensor, ColumnEdge, DigitalOutput, KeypadPort, Watchdog,
};
use climate_sentinel::{Error, Key, Mode, Peripherals, Result, SensorReading};

/// Settable sensor with a failure switch.
pub struct SimSensor {
    reading: Mutex<SensorReading>,
    failing: AtomicBool,
}

impl SimSensor {
    pub fn new(celsius: i32, humidity: i32) -> Self {
        Self {
            reading: Mutex::new(SensorReading::from_celsius(celsius, humidity)),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set(&self, celsius: i32, humidity: i32) {
        *self.reading.lock() = SensorReading::from_celsius(celsius, humidity);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClimateSensor for SimSensor {
    async fn read(&self) -> Result<SensorReading> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::SensorRead {
                context: "simulated failure".to_string(),
            });
        }
        Ok(*self.reading.lock())
    }
}

struct Surface {
    lines: [String; 2],
    col: usize,
    row: usize,
}

/// In-memory two-line display surface.
pub struct SimDisplay {
    surface: Mutex<Surface>,
}

impl SimDisplay {
    pub fn new() -> Self {
        Self {
            surface: Mutex::new(Surface {
                lines: [String::new(), String::new()],
                col: 0,
                row: 0,
            }),
        }
    }

    pub fn line(&self, index: usize) -> String {
        self.surface.lock().lines[index].clone()
    }

    pub fn contains(&self, text: &str) -> bool {
        let surface = self.surface.lock();
        surface.lines.iter().any(|line| line.contains(text))
    }
}

impl CharacterDisplay for SimDisplay {
    fn clear(&self) -> Result<()> {
        let mut surface = self.surface.lock();
        surface.lines = [String::new(), String::new()];
        surface.col = 0;
        surface.row = 0;
        Ok(())
    }

    fn set_cursor(&self, col: u8, row: u8) -> Result<()> {
        let mut surface = self.surface.lock();
        surface.col = col as usize;
        surface.row = (row as usize).min(1);
        Ok(())
    }

    fn print(&self, text: &str) -> Result<()> {
        let mut surface = self.surface.lock();
        let row = surface.row;
        let col = surface.col;

        let mut chars: Vec<char> = surface.lines[row].chars().collect();
        while chars.len() < col {
            chars.push(' ');
        }
        for (i, ch) in text.chars().enumerate() {
            let index = col + i;
            if index < chars.len() {
                chars[index] = ch;
            } else {
                chars.push(ch);
            }
        }
        surface.lines[row] = chars.into_iter().collect();
        surface.col = col + text.chars().count();
        Ok(())
    }
}

/// Keypad matrix GPIO with physically faithful edge delivery.
pub struct SimKeypad {
    driven_row: AtomicU8,
    edge_tx: broadcast::Sender<ColumnEdge>,
}

impl SimKeypad {
    pub fn new() -> Self {
        let (edge_tx, _) = broadcast::channel(64);
        Self {
            driven_row: AtomicU8::new(u8::MAX),
            edge_tx,
        }
    }

    /// Tap a key: wait for its row to be energized, then fire one edge.
    pub async fn press(&self, key: Key) {
        let (row, column) = key.position().expect("key is on the matrix");
        loop {
            if self.driven_row.load(Ordering::Acquire) == row {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let _ = self.edge_tx.send(ColumnEdge { column });
    }

    /// Hold a key down: a rising edge fires every time the key's row is
    /// re-energized, which is how a long hold retriggers past the
    /// acknowledgment pulse.
    pub async fn press_and_hold(&self, key: Key, hold: Duration) {
        let (row, column) = key.position().expect("key is on the matrix");
        let deadline = tokio::time::Instant::now() + hold;
        let mut previous_row = u8::MAX;
        while tokio::time::Instant::now() < deadline {
            let driven = self.driven_row.load(Ordering::Acquire);
            if driven == row && previous_row != row {
                let _ = self.edge_tx.send(ColumnEdge { column });
            }
            previous_row = driven;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl KeypadPort for SimKeypad {
    fn drive_row(&self, row: u8) {
        self.driven_row.store(row, Ordering::Release);
    }

    fn subscribe_edges(&self) -> broadcast::Receiver<ColumnEdge> {
        self.edge_tx.subscribe()
    }
}

/// Watchdog that records its kicks.
pub struct SimWatchdog {
    timeout: Mutex<Option<Duration>>,
    kicks: Mutex<Vec<tokio::time::Instant>>,
}

impl SimWatchdog {
    pub fn new() -> Self {
        Self {
            timeout: Mutex::new(None),
            kicks: Mutex::new(Vec::new()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        *self.timeout.lock()
    }

    pub fn kick_count(&self) -> usize {
        self.kicks.lock().len()
    }

    /// Longest gap between consecutive kicks.
    pub fn max_gap(&self) -> Option<Duration> {
        let kicks = self.kicks.lock();
        kicks
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .max()
    }
}

impl Watchdog for SimWatchdog {
    fn start(&self, timeout: Duration) {
        *self.timeout.lock() = Some(timeout);
    }

    fn kick(&self) {
        self.kicks.lock().push(tokio::time::Instant::now());
    }
}

/// Digital output that remembers its level and rising transitions.
pub struct SimOutput {
    level: AtomicBool,
    rises: AtomicU32,
}

impl SimOutput {
    pub fn new() -> Self {
        Self {
            level: AtomicBool::new(false),
            rises: AtomicU32::new(0),
        }
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    pub fn rise_count(&self) -> u32 {
        self.rises.load(Ordering::SeqCst)
    }
}

impl DigitalOutput for SimOutput {
    fn set_high(&self) {
        if !self.level.swap(true, Ordering::SeqCst) {
            self.rises.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn set_low(&self) {
        self.level.store(false, Ordering::SeqCst);
    }
}

/// The full simulated board.
pub struct Rig {
    pub sensor: Arc<SimSensor>,
    pub display: Arc<SimDisplay>,
    pub keypad: Arc<SimKeypad>,
    pub watchdog: Arc<SimWatchdog>,
    pub buzzer: Arc<SimOutput>,
    pub led: Arc<SimOutput>,
}

impl Rig {
    /// Build a rig with an in-range ambient reading.
    pub fn new() -> (Self, Peripherals) {
        let rig = Self {
            sensor: Arc::new(SimSensor::new(25, 50)),
            display: Arc::new(SimDisplay::new()),
            keypad: Arc::new(SimKeypad::new()),
            watchdog: Arc::new(SimWatchdog::new()),
            buzzer: Arc::new(SimOutput::new()),
            led: Arc::new(SimOutput::new()),
        };
        let peripherals = Peripherals {
            sensor: rig.sensor.clone(),
            display: rig.display.clone(),
            keypad: rig.keypad.clone(),
            watchdog: rig.watchdog.clone(),
            buzzer: rig.buzzer.clone(),
            led: rig.led.clone(),
        };
        (rig, peripherals)
    }

    /// Wait for a prompt, type its digits, and confirm with `A`.
    pub async fn enter_value(&self, prompt: &str, digits: &str) {
        let display = self.display.clone();
        let prompt = prompt.to_string();
        wait_until("entry prompt", move || display.contains(&prompt)).await;

        for digit in digits.chars() {
            self.keypad.press(Key::Digit(digit)).await;
        }
        self.keypad.press(Key::A).await;
    }

    /// Run a complete entry session with the given four values.
    pub async fn run_session(&self, temp_min: &str, temp_max: &str, hum_min: &str, hum_max: &str) {
        self.keypad.press(Key::D).await;
        self.enter_value("Min Temperature?", temp_min).await;
        self.enter_value("Max Temperature?", temp_max).await;
        self.enter_value("Min Humidity?", hum_min).await;
        self.enter_value("Max Humidity?", hum_max).await;
    }
}

/// Poll a condition with a bounded (virtual) timeout.
pub async fn wait_until(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..20_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Poll until the controller reports the given mode.
pub async fn wait_for_mode(controller: &climate_sentinel::ClimateController, mode: Mode) {
    for _ in 0..20_000 {
        if controller.mode() == mode {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for mode {mode}");
}
