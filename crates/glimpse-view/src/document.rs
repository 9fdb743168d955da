//! Document — the zero-or-one-line text model.
//!
//! The viewer displays at most one line of text: either the first line of
//! the file named on the command line, or nothing (an empty document shows
//! the welcome banner instead). The line is raw bytes, not `String` — the
//! viewer passes file content through to the terminal untouched, so it
//! never cares whether the content is valid UTF-8.
//!
//! The document is immutable after load. There are no editing operations.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// A document holding at most one line of raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    line: Option<Vec<u8>>,
}

impl Document {
    /// An empty document — no line, banner territory.
    #[must_use]
    pub const fn new() -> Self {
        Self { line: None }
    }

    /// Load a document from the first line of a file.
    ///
    /// Reads raw bytes up to and including the first `\n`; the line
    /// terminator is stripped by [`load_line`](Self::load_line). An empty
    /// file yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut bytes = Vec::new();
        let n = reader.read_until(b'\n', &mut bytes)?;

        let mut document = Self::new();
        if n > 0 {
            document.load_line(bytes);
        }
        Ok(document)
    }

    /// Store a line, stripping any trailing newline / carriage return.
    pub fn load_line(&mut self, mut bytes: Vec<u8>) {
        while matches!(bytes.last(), Some(b'\n' | b'\r')) {
            bytes.pop();
        }
        self.line = Some(bytes);
    }

    /// Whether a line has been loaded.
    #[inline]
    #[must_use]
    pub const fn has_line(&self) -> bool {
        self.line.is_some()
    }

    /// The content for a screen row: `Some` only for row 0 of a loaded
    /// document. Every other row is filler territory.
    #[must_use]
    pub fn row_contents(&self, row: u16) -> Option<&[u8]> {
        if row == 0 { self.line.as_deref() } else { None }
    }

    /// Length in bytes of the loaded line (0 when absent).
    #[must_use]
    pub fn line_len(&self) -> usize {
        self.line.as_ref().map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
