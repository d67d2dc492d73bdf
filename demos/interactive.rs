//! Interactive terminal front-end for the simulated monitor.
//!
//! The terminal keyboard stands in for the matrix keypad and a pair of keys
//! nudges the simulated climate, so the whole mode machine can be driven by
//! hand:
//!
//! - `0`-`9`, `a`, `b`, `c`, `d` press the corresponding keypad keys
//! - `t`/`g` raise/lower the temperature, `h`/`n` the humidity
//! - `q` or Esc quits
//!
//! Run with: cargo run --example interactive

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEventKind};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use climate_sentinel::hal::{
    CharacterDisplay, ClimateSensor, ColumnEdge, DigitalOutput, KeypadPort, Watchdog,
};
use climate_sentinel::{ClimateController, Key, Peripherals, Result, SensorReading};

struct AdjustableSensor {
    celsius: AtomicI32,
    humidity: AtomicI32,
}

impl AdjustableSensor {
    fn new(celsius: i32, humidity: i32) -> Self {
        Self {
            celsius: AtomicI32::new(celsius),
            humidity: AtomicI32::new(humidity),
        }
    }

    fn nudge_celsius(&self, delta: i32) {
        self.celsius.fetch_add(delta, Ordering::SeqCst);
    }

    fn nudge_humidity(&self, delta: i32) {
        self.humidity.fetch_add(delta, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClimateSensor for AdjustableSensor {
    async fn read(&self) -> Result<SensorReading> {
        Ok(SensorReading::from_celsius(
            self.celsius.load(Ordering::SeqCst),
            self.humidity.load(Ordering::SeqCst),
        ))
    }
}

struct SurfaceDisplay {
    lines: Mutex<[String; 2]>,
    cursor: Mutex<(usize, usize)>,
}

impl SurfaceDisplay {
    fn new() -> Self {
        Self {
            lines: Mutex::new([String::new(), String::new()]),
            cursor: Mutex::new((0, 0)),
        }
    }

    fn snapshot(&self) -> [String; 2] {
        self.lines.lock().clone()
    }
}

impl CharacterDisplay for SurfaceDisplay {
    fn clear(&self) -> Result<()> {
        *self.lines.lock() = [String::new(), String::new()];
        *self.cursor.lock() = (0, 0);
        Ok(())
    }

    fn set_cursor(&self, col: u8, row: u8) -> Result<()> {
        *self.cursor.lock() = (col as usize, (row as usize).min(1));
        Ok(())
    }

    fn print(&self, text: &str) -> Result<()> {
        let (col, row) = *self.cursor.lock();
        let mut lines = self.lines.lock();
        let mut chars: Vec<char> = lines[row].chars().collect();
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
        lines[row] = chars.into_iter().collect();
        drop(lines);
        self.cursor.lock().0 = col + text.chars().count();
        Ok(())
    }
}

struct TerminalKeypad {
    driven_row: AtomicU8,
    edge_tx: broadcast::Sender<ColumnEdge>,
}

impl TerminalKeypad {
    fn new() -> Self {
        let (edge_tx, _) = broadcast::channel(64);
        Self {
            driven_row: AtomicU8::new(u8::MAX),
            edge_tx,
        }
    }

    async fn press(&self, key: Key) {
        let Some((row, column)) = key.position() else {
            return;
        };
        while self.driven_row.load(Ordering::Acquire) != row {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let _ = self.edge_tx.send(ColumnEdge { column });
    }
}

impl KeypadPort for TerminalKeypad {
    fn drive_row(&self, row: u8) {
        self.driven_row.store(row, Ordering::Release);
    }

    fn subscribe_edges(&self) -> broadcast::Receiver<ColumnEdge> {
        self.edge_tx.subscribe()
    }
}

struct NullWatchdog;

impl Watchdog for NullWatchdog {
    fn start(&self, _timeout: Duration) {}
    fn kick(&self) {}
}

struct Level(AtomicBool);

impl Level {
    fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    fn is_high(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl DigitalOutput for Level {
    fn set_high(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn set_low(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn keypad_key_for(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char(c @ '0'..='9') => Some(Key::Digit(c)),
        KeyCode::Char('a') => Some(Key::A),
        KeyCode::Char('b') => Some(Key::B),
        KeyCode::Char('c') => Some(Key::C),
        KeyCode::Char('d') => Some(Key::D),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let sensor = Arc::new(AdjustableSensor::new(25, 50));
    let display = Arc::new(SurfaceDisplay::new());
    let keypad = Arc::new(TerminalKeypad::new());
    let buzzer = Arc::new(Level::new());
    let led = Arc::new(Level::new());

    let controller = ClimateController::new(Peripherals {
        sensor: sensor.clone(),
        display: display.clone(),
        keypad: keypad.clone(),
        watchdog: Arc::new(NullWatchdog),
        buzzer: buzzer.clone(),
        led: led.clone(),
    });
    controller.start().await?;

    crossterm::terminal::enable_raw_mode().map_err(|e| {
        climate_sentinel::Error::Internal(format!("failed to enter raw mode: {e}"))
    })?;

    print!("keypad: 0-9 a b c d | climate: t/g temp, h/n humidity | q quits\r\n\r\n");

    loop {
        // Redraw the surface and status line.
        let [top, bottom] = display.snapshot();
        print!(
            "\r\x1B[K [{:<16}]  mode={} buzzer={} led={}\r\n\x1B[K [{:<16}]  temp={}C hum={}%\r\n\x1B[2A",
            top,
            controller.mode(),
            if buzzer.is_high() { "ON " } else { "off" },
            if led.is_high() { "ON " } else { "off" },
            bottom,
            sensor.celsius.load(Ordering::SeqCst),
            sensor.humidity.load(Ordering::SeqCst),
        );
        let _ = std::io::stdout().flush();

        if crossterm::event::poll(Duration::from_millis(0)).unwrap_or(false) {
            if let Ok(Event::Key(event)) = crossterm::event::read() {
                if event.kind == KeyEventKind::Press {
                    match event.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('t') => sensor.nudge_celsius(1),
                        KeyCode::Char('g') => sensor.nudge_celsius(-1),
                        KeyCode::Char('h') => sensor.nudge_humidity(1),
                        KeyCode::Char('n') => sensor.nudge_humidity(-1),
                        code => {
                            if let Some(key) = keypad_key_for(code) {
                                let keypad = keypad.clone();
                                tokio::spawn(async move { keypad.press(key).await });
                            }
                        }
                    }
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let _ = crossterm::terminal::disable_raw_mode();
    print!("\r\n\r\n\r\n");
    controller.shutdown().await?;
    Ok(())
}
