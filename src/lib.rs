//! # climate-sentinel
//!
//! A keypad-configured ambient climate monitor: samples temperature and
//! humidity, lets an operator set an acceptable envelope on a 4×4 matrix
//! keypad, and escalates into an audible/visual alert when a reading leaves
//! it. A hardware watchdog, kicked by the keypad scan loop, guarantees the
//! control loop cannot silently hang.
//!
//! The crate is the control core only. The peripherals — sensor, character
//! display, keypad GPIO, watchdog, buzzer and LED — are trait seams in the
//! [`hal`] module, so the concurrent logic runs and tests on any host while
//! a board support crate supplies the real drivers.
//!
//! ## Operation
//!
//! - `D` starts threshold entry: four prompts (min/max temperature, min/max
//!   humidity) confirmed with `A`, cleared with `C`. A validated session
//!   starts monitoring.
//! - While monitoring, a reading outside the envelope raises an alert that
//!   beeps and flashes until acknowledged with `B` (back to idle) or `D`
//!   (re-enter thresholds).
//! - `C` outside entry toggles between Celsius and Fahrenheit.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use climate_sentinel::{ClimateController, Peripherals, Result};
//!
//! async fn run(peripherals: Peripherals) -> Result<()> {
//!     let controller = ClimateController::new(peripherals);
//!     controller.start().await?;
//!
//!     let mut alerts = controller.subscribe_alerts();
//!     while let Ok(event) = alerts.recv().await {
//!         println!("breach: {} at {}", event.reason, event.at);
//!     }
//!
//!     controller.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for the public data types

// Public modules
pub mod controller;
pub mod data;
pub mod display;
pub mod error;
pub mod hal;
pub mod keypad;
pub mod monitor;
pub mod state;
pub mod utils;

// Re-exports for convenience
pub use controller::{CallbackHandle, ClimateController, Peripherals, WATCHDOG_TIMEOUT};
pub use error::{Error, Result};
pub use state::SharedState;
pub use utils::{celsius_to_fahrenheit, fahrenheit_to_celsius};

// Re-export commonly used types from submodules
pub use data::{
    InputSession, MeasurementUnit, Mode, SensorReading, ThresholdConfig, MAX_INPUT_DIGITS,
};
pub use keypad::{decode_key, Key, COLUMN_COUNT, KEY_ACK_PULSE, ROW_COUNT, SCAN_INTERVAL};
pub use monitor::{AlertEvent, AlertReason};
