//! Scripted run against fully simulated peripherals.
//!
//! Walks the monitor through a threshold entry session, trips a temperature
//! breach, and acknowledges the alert. Keypresses are paced by the real
//! acknowledgment pulse, so the whole script takes around half a minute.
//!
//! Run with: cargo run --example simulated_monitor

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use climate_sentinel::hal::{
    CharacterDisplay, ClimateSensor, ColumnEdge, DigitalOutput, KeypadPort, Watchdog,
};
use climate_sentinel::{ClimateController, Key, Peripherals, Result, SensorReading};

/// Sensor whose reading the script can change.
struct ScriptedSensor {
    reading: Mutex<SensorReading>,
}

impl ScriptedSensor {
    fn new(celsius: i32, humidity: i32) -> Self {
        Self {
            reading: Mutex::new(SensorReading::from_celsius(celsius, humidity)),
        }
    }

    fn set(&self, celsius: i32, humidity: i32) {
        *self.reading.lock() = SensorReading::from_celsius(celsius, humidity);
    }
}

#[async_trait]
impl ClimateSensor for ScriptedSensor {
    async fn read(&self) -> Result<SensorReading> {
        Ok(*self.reading.lock())
    }
}

/// Display surface echoed to stdout whenever a frame changes it.
struct ConsoleDisplay {
    lines: Mutex<[String; 2]>,
    cursor: Mutex<(usize, usize)>,
}

impl ConsoleDisplay {
    fn new() -> Self {
        Self {
            lines: Mutex::new([String::new(), String::new()]),
            cursor: Mutex::new((0, 0)),
        }
    }

    fn show(&self) {
        let lines = self.lines.lock();
        println!("  [{:<16}]", lines[0]);
        println!("  [{:<16}]", lines[1]);
    }
}

impl CharacterDisplay for ConsoleDisplay {
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

/// Keypad GPIO that delivers an edge only while the key's row is energized.
struct ScriptedKeypad {
    driven_row: AtomicU8,
    edge_tx: broadcast::Sender<ColumnEdge>,
}

impl ScriptedKeypad {
    fn new() -> Self {
        let (edge_tx, _) = broadcast::channel(64);
        Self {
            driven_row: AtomicU8::new(u8::MAX),
            edge_tx,
        }
    }

    async fn press(&self, key: Key) {
        let (row, column) = key.position().expect("key is on the matrix");
        while self.driven_row.load(Ordering::Acquire) != row {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let _ = self.edge_tx.send(ColumnEdge { column });
    }
}

impl KeypadPort for ScriptedKeypad {
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

struct NamedOutput(&'static str);

impl DigitalOutput for NamedOutput {
    fn set_high(&self) {
        println!("  ({} on)", self.0);
    }
    fn set_low(&self) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    println!("Climate Sentinel - simulated run");
    println!("================================\n");

    let sensor = Arc::new(ScriptedSensor::new(25, 50));
    let display = Arc::new(ConsoleDisplay::new());
    let keypad = Arc::new(ScriptedKeypad::new());

    let controller = ClimateController::new(Peripherals {
        sensor: sensor.clone(),
        display: display.clone(),
        keypad: keypad.clone(),
        watchdog: Arc::new(NullWatchdog),
        buzzer: Arc::new(NamedOutput("buzzer")),
        led: Arc::new(NamedOutput("led")),
    });
    controller.start().await?;

    let _alert_log = controller.on_alert(|event| {
        println!("\n*** ALERT: {} at {} ***", event.reason, event.at);
    });

    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("Idle, showing ambient readings:");
    display.show();

    println!("\nEntering thresholds 10..40 C / 30..80 %RH...");
    keypad.press(Key::D).await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    for entry in [
        ['1', '0'].as_slice(),
        ['4', '0'].as_slice(),
        ['3', '0'].as_slice(),
        ['8', '0'].as_slice(),
    ] {
        tokio::time::sleep(Duration::from_millis(200)).await;
        for digit in entry {
            keypad.press(Key::Digit(*digit)).await;
        }
        keypad.press(Key::A).await;
    }

    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("Session accepted, mode is now {}:", controller.mode());
    display.show();

    println!("\nHeating the room to 45 C...");
    sensor.set(45, 50);

    let mut alerts = controller.subscribe_alerts();
    let event = alerts.recv().await.expect("alert event");
    tokio::time::sleep(Duration::from_secs(3)).await;
    println!("Display during the '{}' alert:", event.reason);
    display.show();

    println!("\nAcknowledging with B...");
    keypad.press(Key::B).await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("Back to {} mode:", controller.mode());
    display.show();

    controller.shutdown().await?;
    Ok(())
}
