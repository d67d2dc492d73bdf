//! Watchdog timer contract.

use std::time::Duration;

/// A hardware watchdog timer.
///
/// Once started, the countdown must be kicked at least once per timeout
/// interval or the board hard-resets. Most hardware watchdogs cannot be
/// stopped after starting; implementations should document whether theirs
/// can.
#[cfg_attr(test, mockall::automock)]
pub trait Watchdog: Send + Sync {
    /// Start the countdown with the given timeout.
    fn start(&self, timeout: Duration);

    /// Reset the countdown.
    fn kick(&self);
}
