//! Screen — composes one full frame into an output buffer.
//!
//! Every frame is a complete redraw: hide the cursor, home it, draw all
//! viewport rows top to bottom, park the cursor where the viewer says,
//! show it again. The whole sequence lands in a single [`OutputBuffer`]
//! that the caller flushes in one write, so the terminal never sees a
//! half-drawn frame and the cursor never visibly jumps through content.
//!
//! Row content:
//!
//! - Row 0 of a loaded document shows the line, truncated to the viewport
//!   width (never wrapped).
//! - A third of the way down an *empty* document, the centered welcome
//!   banner.
//! - Everything else gets a `~` filler, the classic mark for rows past
//!   the end of the text.
//!
//! Each row ends with an erase-to-end-of-line instead of a whole-screen
//! clear up front — the erase rides along in the same buffered write, and
//! only the cells right of the content are touched.

use std::io::{self, Write};

use glimpse_term::ansi;
use glimpse_term::output::OutputBuffer;
use glimpse_term::terminal::Size;

use crate::cursor::Cursor;
use crate::document::Document;

/// Banner shown a third of the way down an empty document.
const WELCOME: &str = concat!("glimpse viewer -- version ", env!("CARGO_PKG_VERSION"));

/// Compose one frame: cursor bookkeeping, all rows, cursor placement.
///
/// Appends to `frame` only — the caller owns the single flush that makes
/// the frame atomic.
///
/// # Errors
///
/// Propagates write errors, though writes into an [`OutputBuffer`] cannot
/// fail in practice.
pub fn render(
    document: &Document,
    cursor: Cursor,
    size: Size,
    frame: &mut OutputBuffer,
) -> io::Result<()> {
    ansi::cursor_hide(frame)?;
    ansi::cursor_home(frame)?;

    draw_rows(document, size, frame)?;

    ansi::cursor_to(frame, cursor.col(), cursor.row())?;
    ansi::cursor_show(frame)?;
    Ok(())
}

/// Draw every viewport row, with a `\r\n` separator between rows but not
/// after the last — the final row must not scroll the screen.
fn draw_rows(document: &Document, size: Size, frame: &mut OutputBuffer) -> io::Result<()> {
    for y in 0..size.rows {
        if let Some(line) = document.row_contents(y) {
            let visible = line.len().min(size.cols as usize);
            frame.write_all(&line[..visible])?;
        } else if !document.has_line() && y == size.rows / 3 {
            draw_banner(size, frame)?;
        } else {
            frame.write_all(b"~")?;
        }

        ansi::clear_line(frame)?;
        if y + 1 < size.rows {
            frame.write_all(b"\r\n")?;
        }
    }
    Ok(())
}

/// Center the welcome banner: a `~` filler at column 0, then padding, then
/// the message clamped to the viewport width.
fn draw_banner(size: Size, frame: &mut OutputBuffer) -> io::Result<()> {
    let mut banner = WELCOME;
    if banner.len() > size.cols as usize {
        banner = &banner[..size.cols as usize];
    }

    let mut padding = (size.cols as usize - banner.len()) / 2;
    if padding > 0 {
        frame.write_all(b"~")?;
        padding -= 1;
    }
    for _ in 0..padding {
        frame.write_all(b" ")?;
    }

    frame.write_all(banner.as_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
