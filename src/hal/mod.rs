//! Hardware abstraction layer.
//!
//! This module defines the narrow contracts the controller expects from its
//! peripheral collaborators: the climate sensor, the character display, the
//! keypad matrix GPIO, the watchdog timer, and the buzzer/LED outputs. Board
//! support crates implement these traits; tests and demos supply simulated
//! implementations.

pub mod display;
pub mod keypad;
pub mod outputs;
pub mod sensor;
pub mod watchdog;

pub use display::{CharacterDisplay, DISPLAY_COLUMNS, DISPLAY_ROWS};
pub use keypad::{ColumnEdge, KeypadPort};
pub use outputs::DigitalOutput;
pub use sensor::ClimateSensor;
pub use watchdog::Watchdog;
