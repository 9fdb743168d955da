// SPDX-License-Identifier: MIT
//
// Output buffering — one write() per frame.
//
// OutputBuffer accumulates all ANSI bytes and row content in memory so the
// entire frame can be written in a single write() syscall. Writing control
// sequences and content byte-by-byte causes visible tearing on real
// terminals; batching into one write makes the frame atomic from the
// terminal's perspective.
//
// The buffer is append-only until flushed: previously appended content is
// never mutated, and a flush hands the whole accumulation to the
// destination in one `write_all` before clearing for reuse.

use std::io::{self, Write};

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates terminal output for a single `write()`.
///
/// Everything a frame emits — cursor control, row content, erase sequences —
/// goes into this buffer first. One flush at frame end writes it all at once.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

/// Enough for a full 80×24 frame with per-row escape overhead.
const DEFAULT_CAPACITY: usize = 4096;

impl OutputBuffer {
    /// Create an empty buffer with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty buffer pre-sized for a known frame size.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to stdout and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&self.buf)?;
            stdout.flush()?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Write accumulated output to an arbitrary writer and clear the buffer.
    ///
    /// The whole accumulation goes out as one `write_all` — no partial
    /// writes reach the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_stdout() / flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Writer that records each `write` call separately, so tests can
    /// assert on syscall granularity, not just total content.
    struct ChunkWriter {
        chunks: Vec<Vec<u8>>,
    }

    impl ChunkWriter {
        fn new() -> Self {
            Self { chunks: Vec::new() }
        }
    }

    impl Write for ChunkWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.chunks.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // ── Accumulation ──────────────────────────────────────────────────

    #[test]
    fn starts_empty() {
        let buf = OutputBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn append_grows_without_mutating_prefix() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"abc").unwrap();
        buf.write_all(b"def").unwrap();
        assert_eq!(buf.as_bytes(), b"abcdef");
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn write_macro_appends() {
        let mut buf = OutputBuffer::new();
        write!(buf, "\x1b[{};{}H", 5, 12).unwrap();
        assert_eq!(buf.as_bytes(), b"\x1b[5;12H");
    }

    #[test]
    fn internal_flush_is_noop() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"pending").unwrap();
        buf.flush().unwrap();
        assert_eq!(buf.as_bytes(), b"pending");
    }

    #[test]
    fn clear_keeps_nothing() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"frame").unwrap();
        buf.clear();
        assert!(buf.is_empty());
    }

    // ── Flushing ──────────────────────────────────────────────────────

    #[test]
    fn flush_to_writes_everything_in_one_call() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"\x1b[?25l\x1b[H").unwrap();
        buf.write_all(b"hello\x1b[K").unwrap();

        let mut out = ChunkWriter::new();
        buf.flush_to(&mut out).unwrap();

        assert_eq!(out.chunks.len(), 1);
        assert_eq!(out.chunks[0], b"\x1b[?25l\x1b[Hhello\x1b[K");
    }

    #[test]
    fn flush_to_clears_the_buffer() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"frame").unwrap();
        buf.flush_to(&mut ChunkWriter::new()).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_empty_buffer_writes_nothing() {
        let mut buf = OutputBuffer::new();
        let mut out = ChunkWriter::new();
        buf.flush_to(&mut out).unwrap();
        assert!(out.chunks.is_empty());
    }

    #[test]
    fn buffer_is_reusable_after_flush() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"first").unwrap();

        let mut out = ChunkWriter::new();
        buf.flush_to(&mut out).unwrap();

        buf.write_all(b"second").unwrap();
        buf.flush_to(&mut out).unwrap();

        assert_eq!(out.chunks.len(), 2);
        assert_eq!(out.chunks[1], b"second");
    }

    #[test]
    fn with_capacity_starts_empty() {
        let buf = OutputBuffer::with_capacity(128);
        assert!(buf.is_empty());
    }
}
