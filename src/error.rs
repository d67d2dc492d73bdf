//! Error types for the climate-sentinel crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The climate sensor failed to produce a reading.
    #[error("Sensor read failed: {context}")]
    SensorRead {
        /// Description of what went wrong during the read.
        context: String,
    },

    /// A write to the character display failed.
    #[error("Display write failed: {context}")]
    DisplayWrite {
        /// Description of what went wrong during the write.
        context: String,
    },

    /// A threshold configuration failed validation.
    #[error("Invalid thresholds: {reason}")]
    InvalidThresholds {
        /// Which validation check failed.
        reason: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
