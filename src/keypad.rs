//! Keypad acquisition.
//!
//! Two cooperating tasks turn raw matrix GPIO into logical key handling:
//!
//! - The **scan loop** energizes one row at a time in round-robin order,
//!   publishing the energized row through an atomic cursor, and kicks the
//!   watchdog once per iteration — it is the liveness supervisor; if it ever
//!   stalls, the watchdog expires and the board resets.
//! - The **acquisition loop** consumes column edge events from the port,
//!   pairs each edge with the row cursor to resolve the logical key, and
//!   routes digits into the shared input buffer and command keys through the
//!   mode machine. Edge capture itself stays minimal; all decoding happens
//!   here, outside interrupt context.
//!
//! Every edge also schedules a deferred LED acknowledgment pulse. The scan
//! loop runs the pulse inline, freezing row advancement for its duration —
//! that freeze is the debounce spacing between resolvable keypresses. A
//! second edge landing inside the window still resolves (to the same row),
//! so a bouncy key can double-append a digit; that residual is accepted and
//! covered by a test rather than papered over.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::hal::{DigitalOutput, KeypadPort, Watchdog};
use crate::state::SharedState;

/// Number of keypad rows.
pub const ROW_COUNT: u8 = 4;

/// Number of keypad columns.
pub const COLUMN_COUNT: u8 = 4;

/// Pause between row advances while no acknowledgment pulse is pending.
pub const SCAN_INTERVAL: Duration = Duration::from_millis(5);

/// Duration of the keypress acknowledgment pulse, and therefore the minimum
/// spacing between two resolvable presses of different keys.
pub const KEY_ACK_PULSE: Duration = Duration::from_millis(1000);

/// A logical key on the 4×4 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A decimal digit key, `'0'..='9'`.
    Digit(char),
    /// `A` — confirm the current entry and advance to the next stage.
    A,
    /// `B` — force idle (ignored while collecting input).
    B,
    /// `C` — toggle the unit, or clear the entry while collecting input.
    C,
    /// `D` — enter input mode (also exits an alert).
    D,
    /// `*` — unassigned.
    Star,
    /// `#` — unassigned.
    Hash,
}

/// Physical layout: `KEYMAP[row][column]`.
const KEYMAP: [[Key; COLUMN_COUNT as usize]; ROW_COUNT as usize] = [
    [Key::Digit('1'), Key::Digit('2'), Key::Digit('3'), Key::A],
    [Key::Digit('4'), Key::Digit('5'), Key::Digit('6'), Key::B],
    [Key::Digit('7'), Key::Digit('8'), Key::Digit('9'), Key::C],
    [Key::Star, Key::Digit('0'), Key::Hash, Key::D],
];

/// Resolve an energized row and a column edge into a logical key.
pub fn decode_key(row: u8, column: u8) -> Option<Key> {
    KEYMAP
        .get(row as usize)
        .and_then(|r| r.get(column as usize))
        .copied()
}

impl Key {
    /// The `(row, column)` position of this key on the matrix, if it is one
    /// of the sixteen physical keys.
    pub fn position(self) -> Option<(u8, u8)> {
        for (row, keys) in KEYMAP.iter().enumerate() {
            for (column, key) in keys.iter().enumerate() {
                if *key == self {
                    return Some((row as u8, column as u8));
                }
            }
        }
        None
    }
}

/// Drives the keypad matrix and feeds decoded keys into the shared state.
pub(crate) struct KeypadScanner {
    port: Arc<dyn KeypadPort>,
    watchdog: Arc<dyn Watchdog>,
    led: Arc<dyn DigitalOutput>,
    state: Arc<SharedState>,
    row_cursor: Arc<AtomicU8>,
}

impl KeypadScanner {
    pub(crate) fn new(
        port: Arc<dyn KeypadPort>,
        watchdog: Arc<dyn Watchdog>,
        led: Arc<dyn DigitalOutput>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            port,
            watchdog,
            led,
            state,
            row_cursor: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Spawn the scan and acquisition tasks.
    pub(crate) fn spawn(&self) -> Vec<JoinHandle<()>> {
        let (pulse_tx, pulse_rx) = mpsc::unbounded_channel();

        let scan = tokio::spawn(Self::scan_loop(
            self.port.clone(),
            self.watchdog.clone(),
            self.led.clone(),
            self.row_cursor.clone(),
            pulse_rx,
        ));
        let acquisition = tokio::spawn(Self::acquisition_loop(
            self.port.clone(),
            self.state.clone(),
            self.row_cursor.clone(),
            pulse_tx,
        ));

        vec![scan, acquisition]
    }

    async fn scan_loop(
        port: Arc<dyn KeypadPort>,
        watchdog: Arc<dyn Watchdog>,
        led: Arc<dyn DigitalOutput>,
        row_cursor: Arc<AtomicU8>,
        mut pulse_rx: mpsc::UnboundedReceiver<()>,
    ) {
        let mut row: u8 = 0;
        loop {
            row_cursor.store(row, Ordering::Release);
            port.drive_row(row);

            // The watchdog only stays fed while this loop makes forward
            // progress; there is no soft-recovery path for a stall.
            watchdog.kick();

            match pulse_rx.try_recv() {
                Ok(()) => {
                    led.set_high();
                    sleep(KEY_ACK_PULSE).await;
                    led.set_low();
                }
                Err(_) => sleep(SCAN_INTERVAL).await,
            }

            row = (row + 1) % ROW_COUNT;
        }
    }

    async fn acquisition_loop(
        port: Arc<dyn KeypadPort>,
        state: Arc<SharedState>,
        row_cursor: Arc<AtomicU8>,
        pulse_tx: mpsc::UnboundedSender<()>,
    ) {
        let mut edges = port.subscribe_edges();
        loop {
            let edge = match edges.recv().await {
                Ok(edge) => edge,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("keypad edge channel lagged, {missed} edges dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let row = row_cursor.load(Ordering::Acquire);
            match decode_key(row, edge.column) {
                Some(Key::Digit(digit)) => {
                    debug!("digit '{digit}' (row {row}, column {})", edge.column);
                    state.push_digit(digit);
                }
                Some(Key::A) => {
                    debug!("command A (confirm)");
                    state.confirm_entry();
                }
                Some(Key::B) => {
                    debug!("command B (idle)");
                    state.force_idle();
                }
                Some(Key::C) => {
                    debug!("command C (clear/toggle)");
                    state.clear_or_toggle();
                }
                Some(Key::D) => {
                    debug!("command D (input)");
                    state.enter_input();
                }
                Some(Key::Star) | Some(Key::Hash) => {}
                None => debug!("edge on column {} has no key", edge.column),
            }

            // Every edge gets the acknowledgment pulse, assigned or not.
            let _ = pulse_tx.send(());
        }
        debug!("keypad acquisition stopped: edge channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Mode;
    use crate::hal::keypad::{ColumnEdge, MockKeypadPort};

    #[test]
    fn test_keymap_layout() {
        assert_eq!(decode_key(0, 0), Some(Key::Digit('1')));
        assert_eq!(decode_key(0, 3), Some(Key::A));
        assert_eq!(decode_key(1, 1), Some(Key::Digit('5')));
        assert_eq!(decode_key(1, 3), Some(Key::B));
        assert_eq!(decode_key(2, 3), Some(Key::C));
        assert_eq!(decode_key(3, 0), Some(Key::Star));
        assert_eq!(decode_key(3, 1), Some(Key::Digit('0')));
        assert_eq!(decode_key(3, 2), Some(Key::Hash));
        assert_eq!(decode_key(3, 3), Some(Key::D));
    }

    #[test]
    fn test_decode_out_of_range() {
        assert_eq!(decode_key(4, 0), None);
        assert_eq!(decode_key(0, 4), None);
    }

    #[test]
    fn test_position_is_decode_inverse() {
        for row in 0..ROW_COUNT {
            for column in 0..COLUMN_COUNT {
                let key = decode_key(row, column).unwrap();
                assert_eq!(key.position(), Some((row, column)));
            }
        }
        assert_eq!(Key::Digit('x').position(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquisition_routes_digits_and_commands() {
        // The receiver is created with the channel so edges sent before the
        // acquisition task's first poll are not lost.
        let (edge_tx, edge_rx) = broadcast::channel(16);

        let mut mock = MockKeypadPort::new();
        mock.expect_subscribe_edges().return_once(move || edge_rx);

        let port: Arc<dyn KeypadPort> = Arc::new(mock);
        let state = Arc::new(SharedState::new());
        let row_cursor = Arc::new(AtomicU8::new(0));
        let (pulse_tx, mut pulse_rx) = mpsc::unbounded_channel();

        tokio::spawn(KeypadScanner::acquisition_loop(
            port,
            state.clone(),
            row_cursor.clone(),
            pulse_tx,
        ));

        // D (row 3, column 3) enters input mode.
        row_cursor.store(3, Ordering::Release);
        edge_tx.send(ColumnEdge { column: 3 }).unwrap();
        pulse_rx.recv().await.unwrap();
        assert_eq!(state.mode(), Mode::Input);

        // '1' (row 0, column 0) lands in the buffer.
        row_cursor.store(0, Ordering::Release);
        edge_tx.send(ColumnEdge { column: 0 }).unwrap();
        pulse_rx.recv().await.unwrap();
        assert_eq!(state.input_buffer(), "1");

        // '*' resolves but does nothing; the pulse still fires.
        row_cursor.store(3, Ordering::Release);
        edge_tx.send(ColumnEdge { column: 0 }).unwrap();
        pulse_rx.recv().await.unwrap();
        assert_eq!(state.input_buffer(), "1");
        assert_eq!(state.mode(), Mode::Input);
    }
}
