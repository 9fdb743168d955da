// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Terminal key decoding — raw bytes to logical key events.
//
// The terminal delivers one byte per bounded-wait read (raw mode sets
// VMIN=0, VTIME=1, so a read returns as soon as a byte arrives or after
// ~100ms with nothing). Most keys are a single byte; arrow and navigation
// keys arrive as multi-byte escape sequences that are variable-length and
// prefix-ambiguous:
//
//   ESC               — the Escape key itself
//   ESC [ A           — arrow up
//   ESC [ 5 ~         — page up
//   ESC O H           — home (SS3 convention on some terminals)
//
// The decoder reads the lead byte, then looks ahead up to three more
// bytes, one bounded read at a time. A timeout anywhere in the lookahead
// resolves the sequence as a literal Escape — the shortest valid
// interpretation — so a slow or non-terminal byte source never wedges the
// decoder waiting for bytes that will never arrive.
//
// Reads go through the `ByteSource` trait rather than stdin directly, so
// tests can script exact byte-and-timeout schedules against the decoder.

use std::io;

/// The escape byte that opens every multi-byte sequence.
const ESC: u8 = 0x1b;

// ─── Key Events ─────────────────────────────────────────────────────────────

/// Map a letter to its control-key combination (`ctrl(b'q')` for Ctrl-Q).
///
/// Control combinations clear the top three bits of the letter, mirroring
/// what the terminal sends in raw mode.
#[inline]
#[must_use]
pub const fn ctrl(byte: u8) -> u8 {
    byte & 0x1f
}

/// A decoded key press.
///
/// Plain printable characters and control combinations keep their raw byte
/// in [`Byte`](Key::Byte); navigation keys decoded from escape sequences get
/// dedicated variants. Keeping the symbolic keys out of the byte space means
/// no key can collide with a real input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character or control combination, unchanged.
    Byte(u8),
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Delete,
    /// A literal Escape press, or an escape sequence we don't recognize.
    Escape,
}

// ─── Byte Source ────────────────────────────────────────────────────────────

/// A source of single bytes with bounded-wait semantics.
///
/// `read_byte` blocks until a byte arrives or the wait elapses. `Ok(None)`
/// is not an error — it means "no data yet"; callers retry or fall back.
/// The terminal implementation gets this behavior from raw mode's
/// VMIN=0/VTIME=1 read policy.
pub trait ByteSource {
    /// Read one byte, or `None` when the bounded wait elapsed with no data.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Byte source backed by the process's stdin file descriptor.
///
/// Must only be used while the terminal is in raw mode: the bounded-wait
/// behavior comes from the VMIN/VTIME read policy the raw-mode session
/// installs, not from anything this type does.
pub struct TtyInput;

#[cfg(unix)]
impl ByteSource for TtyInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte: u8 = 0;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };

        match n {
            1 => Ok(Some(byte)),
            // VTIME elapsed with nothing to read.
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::WouldBlock {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for TtyInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Block until one logical key press has been decoded.
///
/// Transient timeouts before the first byte are retried silently. Once a
/// byte arrives, a non-escape byte is returned unchanged; an escape byte
/// triggers up to three further bounded reads to resolve the sequence.
/// A timeout anywhere in the lookahead, or an unrecognized sequence,
/// yields [`Key::Escape`].
///
/// # Errors
///
/// Returns an error if the underlying byte source fails.
pub fn read_key(src: &mut impl ByteSource) -> io::Result<Key> {
    let first = loop {
        if let Some(byte) = src.read_byte()? {
            break byte;
        }
    };

    if first != ESC {
        return Ok(Key::Byte(first));
    }

    // Lookahead: if either read times out, the ESC stands alone.
    let Some(second) = src.read_byte()? else {
        return Ok(Key::Escape);
    };
    let Some(third) = src.read_byte()? else {
        return Ok(Key::Escape);
    };

    let key = match (second, third) {
        // ESC [ digit ~ — VT220-style editing and paging keys.
        (b'[', b'0'..=b'9') => {
            let Some(terminator) = src.read_byte()? else {
                return Ok(Key::Escape);
            };
            if terminator != b'~' {
                return Ok(Key::Escape);
            }
            match third {
                b'1' | b'7' => Key::Home,
                b'3' => Key::Delete,
                b'4' | b'8' => Key::End,
                b'5' => Key::PageUp,
                b'6' => Key::PageDown,
                // Unassigned digits decode to a harmless no-op key.
                _ => Key::Escape,
            }
        }
        // ESC [ letter — ANSI cursor keys.
        (b'[', b'A') => Key::Up,
        (b'[', b'B') => Key::Down,
        (b'[', b'C') => Key::Right,
        (b'[', b'D') => Key::Left,
        (b'[', b'H') => Key::Home,
        (b'[', b'F') => Key::End,
        // ESC O letter — SS3 convention for Home/End on some terminals.
        (b'O', b'H') => Key::Home,
        (b'O', b'F') => Key::End,
        _ => Key::Escape,
    };

    Ok(key)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
