//! Character display contract.

/// Number of character columns on the display surface.
pub const DISPLAY_COLUMNS: u8 = 16;

/// Number of character rows on the display surface.
pub const DISPLAY_ROWS: u8 = 2;

/// A two-line, sixteen-column character display.
///
/// The driver owns the cursor: [`print`](CharacterDisplay::print) writes at
/// the current cursor position and advances it. All operations are fallible
/// since the usual transports (I2C, parallel bus) can fail mid-write.
#[cfg_attr(test, mockall::automock)]
pub trait CharacterDisplay: Send + Sync {
    /// Blank the display and home the cursor.
    fn clear(&self) -> crate::error::Result<()>;

    /// Move the cursor to `(col, row)`, zero-based.
    fn set_cursor(&self, col: u8, row: u8) -> crate::error::Result<()>;

    /// Write text at the cursor position.
    fn print(&self, text: &str) -> crate::error::Result<()>;
}
