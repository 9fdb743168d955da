//! Cursor — a viewport-bounded position.
//!
//! The cursor lives in screen space: `(col, row)`, both 0-indexed, clamped
//! to `[0, cols-1] × [0, rows-1]`. Movement at an edge is a no-op — the
//! cursor never wraps to the next row and never leaves the viewport.
//!
//! The cursor is deliberately **not** clamped against line length, only
//! against the viewport. A full editor would keep the cursor on text;
//! this viewer lets it roam the whole screen.
//!
//! Lightweight value type — it does not own or reference the document or
//! the terminal; the viewport [`Size`] is passed to movement methods that
//! need a far edge.

use glimpse_term::terminal::Size;

/// A cursor position in the viewport, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    col: u16,
    row: u16,
}

impl Cursor {
    /// Create a cursor at the top-left corner.
    #[must_use]
    pub const fn new() -> Self {
        Self { col: 0, row: 0 }
    }

    // -- Accessors ----------------------------------------------------------

    /// Current column.
    #[inline]
    #[must_use]
    pub const fn col(self) -> u16 {
        self.col
    }

    /// Current row.
    #[inline]
    #[must_use]
    pub const fn row(self) -> u16 {
        self.row
    }

    // -- Movement -----------------------------------------------------------

    /// Move one column left; no-op at the left edge.
    pub const fn move_left(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    /// Move one column right; no-op at the right edge.
    pub const fn move_right(&mut self, size: Size) {
        if self.col < size.cols.saturating_sub(1) {
            self.col += 1;
        }
    }

    /// Move one row up; no-op at the top edge.
    pub const fn move_up(&mut self) {
        self.row = self.row.saturating_sub(1);
    }

    /// Move one row down; no-op at the bottom edge.
    pub const fn move_down(&mut self, size: Size) {
        if self.row < size.rows.saturating_sub(1) {
            self.row += 1;
        }
    }

    /// Jump to the first column.
    pub const fn line_start(&mut self) {
        self.col = 0;
    }

    /// Jump to the last column of the viewport.
    pub const fn line_end(&mut self, size: Size) {
        self.col = size.cols.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
