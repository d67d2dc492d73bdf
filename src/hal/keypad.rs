//! Keypad matrix GPIO contract.

use tokio::sync::broadcast;

/// A rising edge detected on one keypad column line.
///
/// The port reports only the column; pairing the edge with the row that was
/// energized at that instant is the acquisition layer's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnEdge {
    /// Column index in `[0, 3]`.
    pub column: u8,
}

/// Raw row/column GPIO access for a 4×4 keypad matrix.
///
/// The scan loop energizes one row at a time through
/// [`drive_row`](KeypadPort::drive_row); a key closing the circuit on the
/// energized row produces a [`ColumnEdge`] on the port's edge channel.
/// Edge delivery must never block the caller — the port just posts the event
/// and returns, keeping the interrupt-context side minimal.
#[cfg_attr(test, mockall::automock)]
pub trait KeypadPort: Send + Sync {
    /// Energize row `row` and de-energize the others.
    fn drive_row(&self, row: u8);

    /// Subscribe to column edge events.
    fn subscribe_edges(&self) -> broadcast::Receiver<ColumnEdge>;
}
