//! Digital output contract for the buzzer and LED.

/// A single active-high digital output.
#[cfg_attr(test, mockall::automock)]
pub trait DigitalOutput: Send + Sync {
    /// Drive the output high.
    fn set_high(&self);

    /// Drive the output low.
    fn set_low(&self);
}
