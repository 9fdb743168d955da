// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, window sizing, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. It captures the original
// termios configuration once, applies a byte-at-a-time raw configuration
// with a ~100ms bounded read policy, and guarantees the original
// configuration comes back on every exit path — normal quit, fatal error,
// or panic mid-frame.
//
// The panic hook deserves special mention: it bypasses Rust's stdout lock
// entirely, writing a pre-built restore sequence directly to fd 1. This
// prevents deadlock if the panic happened while holding the stdout lock
// (common during frame flushing). One raw write, termios restored, then
// the original panic handler prints its message to a working terminal.
//
// Window sizing has two strategies: ask the kernel via TIOCGWINSZ, and —
// when that fails or reports zero columns, as happens over some
// pseudo-terminal and redirection setups — push the cursor into the
// bottom-right corner with clamped relative moves and parse the
// cursor-position report the terminal sends back.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::input::ByteSource;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// kernel reports zero columns — the caller should fall back to
/// [`probe_size`] in that case.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Window-Size Probe ──────────────────────────────────────────────────────

/// Upper bound on the cursor-position report length. The longest sane
/// reply is `ESC [ 65535 ; 65535` — far under this.
const MAX_REPORT_LEN: usize = 32;

/// Discover the terminal size by interrogating the terminal itself.
///
/// Pushes the cursor toward the bottom-right corner with oversized
/// relative moves (defined to clamp at the screen edge, never wrap),
/// requests a cursor-position report, and parses the `ESC [ rows ; cols R`
/// reply from `input` one bounded read at a time.
///
/// # Errors
///
/// Returns an error if writing the probe fails, if the reply never
/// arrives (a bounded read times out before the `R` terminator), or if
/// the reply doesn't parse as a position report.
pub fn probe_size(out: &mut impl Write, input: &mut impl ByteSource) -> io::Result<Size> {
    ansi::cursor_to_corner(out)?;
    ansi::request_cursor_report(out)?;
    out.flush()?;

    let mut reply = Vec::with_capacity(16);
    let terminated = loop {
        if reply.len() >= MAX_REPORT_LEN {
            break false;
        }
        match input.read_byte()? {
            Some(b'R') => break true,
            Some(byte) => reply.push(byte),
            // Timeout mid-reply: nothing is answering the probe.
            None => break false,
        }
    };

    if !terminated {
        return Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "no reply to cursor position request",
        ));
    }

    parse_cursor_report(&reply).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "malformed cursor position report",
        )
    })
}

/// Determine the viewport size: kernel query first, probe fallback second.
///
/// # Errors
///
/// Returns an error only when both strategies fail; the caller cannot
/// start up without a size and should treat this as fatal.
pub fn viewport_size(out: &mut impl Write, input: &mut impl ByteSource) -> io::Result<Size> {
    match get_size() {
        Some(size) => Ok(size),
        None => probe_size(out, input),
    }
}

/// Parse the body of a cursor-position report: `ESC [ <rows> ; <cols>`
/// (the `R` terminator has already been consumed by the reader).
fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let rest = reply.strip_prefix(b"\x1b[")?;
    let (rows, rest) = parse_u16(rest);
    let rest = rest.strip_prefix(b";")?;
    let (cols, rest) = parse_u16(rest);

    if rest.is_empty() && rows > 0 && cols > 0 {
        Some(Size { cols, rows })
    } else {
        None
    }
}

/// Parse a decimal number directly from bytes — no intermediate `String`.
/// Returns the value and the unconsumed remainder.
fn parse_u16(bytes: &[u8]) -> (u16, &[u8]) {
    let mut value: u16 = 0;
    let mut rest = bytes;
    while let Some((&byte, tail)) = rest.split_first() {
        if !byte.is_ascii_digit() {
            break;
        }
        value = value
            .saturating_mul(10)
            .saturating_add(u16::from(byte - b'0'));
        rest = tail;
    }
    (value, rest)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This global backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore the original mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Screen-restore sequence for emergency use: erase the screen, home the
/// cursor, show the cursor. Erase comes first so no half-drawn frame or
/// raw-mode garbage survives; show-cursor is last so the shell prompt
/// that follows is usable.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. Our hook
/// writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock), restores termios, then delegates to the
/// original panic handler so the error prints to a working terminal.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the screen-restore sequence directly to stdout's file descriptor.
///
/// Bypasses Rust's `io::stdout()` lock to avoid deadlocking if the panic
/// occurred while the lock was held (e.g., mid-frame flush).
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal handle with RAII cleanup.
///
/// Call [`enter`](Self::enter) to switch the terminal into raw mode. The
/// original configuration is restored when [`leave`](Self::leave) runs or
/// the handle is dropped — even on panic. Exactly one mode transition in
/// and one out per process lifetime.
///
/// # Example
///
/// ```no_run
/// use glimpse_term::terminal::Terminal;
///
/// let mut term = Terminal::new()?;
/// term.enter()?;
/// // ... render frames, decode keys ...
/// // Terminal is restored automatically on drop.
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Whether raw mode is currently applied.
    active: bool,
}

impl Terminal {
    /// Create a terminal handle.
    ///
    /// Does **not** touch the terminal — call [`enter`](Self::enter) for
    /// that.
    ///
    /// # Errors
    ///
    /// Currently infallible, but returns `Result` for forward compatibility
    /// (e.g., Windows console API initialization).
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            original_termios: None,
            active: false,
        })
    }

    /// Whether raw mode is currently applied.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode.
    ///
    /// Captures the current attributes, installs the panic hook (once per
    /// process), then applies a configuration that turns off everything
    /// between the keyboard and the program: input translation (ICRNL),
    /// flow control (IXON), break-to-SIGINT (BRKINT), parity checking
    /// (INPCK), 8th-bit stripping (ISTRIP), output post-processing
    /// (OPOST), echo, canonical line buffering, signal keys, and extended
    /// input processing — with 8-bit characters (CS8) and a bounded read
    /// policy (VMIN=0, VTIME=1: return as soon as a byte is available, or
    /// after ~100ms with zero bytes).
    ///
    /// Idempotent: calling `enter()` while already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal attributes cannot be read or
    /// applied. The caller must treat this as fatal — the session cannot
    /// continue without a known-good terminal state.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }

        // Install the panic hook (once per process).
        install_panic_hook();

        // Enable raw mode (no-op if not a TTY).
        self.enable_raw_mode()?;

        self.active = true;
        Ok(())
    }

    /// Leave raw mode and restore the original terminal attributes.
    ///
    /// Idempotent: calling `leave()` while inactive is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the termios restore fails — also fatal, since
    /// the terminal is left in an unknown state.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        self.disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // Also save to global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // Byte-at-a-time input, verbatim bytes in both directions.
            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN);

            // VMIN=0, VTIME=1: read() returns as soon as a byte arrives,
            // or after one tenth of a second with zero bytes.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            // Clear the global backup — we've restored successfully.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    /// Scripted byte source for probe tests: `Some(b)` delivers a byte,
    /// `None` simulates a bounded-wait timeout (and an exhausted script
    /// times out forever).
    struct Script(VecDeque<Option<u8>>);

    impl Script {
        fn bytes(bytes: &[u8]) -> Self {
            Self(bytes.iter().map(|&b| Some(b)).collect())
        }
    }

    impl ByteSource for Script {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Ok(self.0.pop_front().unwrap_or(None))
        }
    }

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn size_area() {
        assert_eq!(Size { cols: 80, rows: 24 }.area(), 1920);
    }

    #[test]
    fn size_area_zero() {
        assert_eq!(Size { cols: 0, rows: 24 }.area(), 0);
        assert_eq!(Size { cols: 80, rows: 0 }.area(), 0);
    }

    #[test]
    fn size_equality() {
        assert_eq!(Size { cols: 80, rows: 24 }, Size { cols: 80, rows: 24 });
        assert_ne!(Size { cols: 80, rows: 24 }, Size { cols: 120, rows: 40 });
    }

    #[test]
    fn size_is_copy() {
        let a = Size { cols: 80, rows: 24 };
        let b = a;
        assert_eq!(a, b);
    }

    // ── Terminal queries ─────────────────────────────────────────────

    #[test]
    fn get_size_does_not_panic() {
        let _ = get_size();
    }

    #[test]
    fn is_tty_does_not_panic() {
        let _ = is_tty();
    }

    // ── Cursor-position report parsing ───────────────────────────────

    #[test]
    fn parse_report_well_formed() {
        assert_eq!(
            parse_cursor_report(b"\x1b[24;80"),
            Some(Size { cols: 80, rows: 24 })
        );
    }

    #[test]
    fn parse_report_large_dimensions() {
        assert_eq!(
            parse_cursor_report(b"\x1b[312;1024"),
            Some(Size {
                cols: 1024,
                rows: 312
            })
        );
    }

    #[test]
    fn parse_report_rejects_missing_prefix() {
        assert_eq!(parse_cursor_report(b"24;80"), None);
        assert_eq!(parse_cursor_report(b"[24;80"), None);
    }

    #[test]
    fn parse_report_rejects_missing_separator() {
        assert_eq!(parse_cursor_report(b"\x1b[2480"), None);
    }

    #[test]
    fn parse_report_rejects_zero_dimensions() {
        assert_eq!(parse_cursor_report(b"\x1b[0;80"), None);
        assert_eq!(parse_cursor_report(b"\x1b[24;0"), None);
    }

    #[test]
    fn parse_report_rejects_trailing_garbage() {
        assert_eq!(parse_cursor_report(b"\x1b[24;80x"), None);
    }

    #[test]
    fn parse_report_rejects_empty() {
        assert_eq!(parse_cursor_report(b""), None);
    }

    #[test]
    fn parse_u16_stops_at_non_digit() {
        let (value, rest) = parse_u16(b"128;7");
        assert_eq!(value, 128);
        assert_eq!(rest, b";7");
    }

    #[test]
    fn parse_u16_saturates() {
        let (value, _) = parse_u16(b"99999");
        assert_eq!(value, u16::MAX);
    }

    // ── Probe ─────────────────────────────────────────────────────────

    #[test]
    fn probe_writes_corner_push_then_report_request() {
        let mut out = Vec::new();
        let mut input = Script::bytes(b"\x1b[24;80R");
        probe_size(&mut out, &mut input).unwrap();
        assert_eq!(out, b"\x1b[999C\x1b[999B\x1b[6n");
    }

    #[test]
    fn probe_parses_reply() {
        let mut out = Vec::new();
        let mut input = Script::bytes(b"\x1b[50;132R");
        let size = probe_size(&mut out, &mut input).unwrap();
        assert_eq!(
            size,
            Size {
                cols: 132,
                rows: 50
            }
        );
    }

    #[test]
    fn probe_times_out_when_nothing_answers() {
        let mut out = Vec::new();
        let mut input = Script::bytes(b"");
        let err = probe_size(&mut out, &mut input).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn probe_times_out_on_truncated_reply() {
        let mut out = Vec::new();
        let mut input = Script::bytes(b"\x1b[24;8");
        let err = probe_size(&mut out, &mut input).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn probe_rejects_garbage_reply() {
        let mut out = Vec::new();
        let mut input = Script::bytes(b"nonsenseR");
        let err = probe_size(&mut out, &mut input).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn probe_gives_up_on_unterminated_flood() {
        let mut out = Vec::new();
        let flood = vec![b'1'; MAX_REPORT_LEN + 8];
        let mut input = Script::bytes(&flood);
        assert!(probe_size(&mut out, &mut input).is_err());
    }

    // ── Emergency restore sequence ──────────────────────────────────

    #[test]
    fn emergency_restore_is_valid_utf8() {
        std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
    }

    #[test]
    fn emergency_restore_erases_before_showing_cursor() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.starts_with("\x1b[2J"), "must erase the screen first");
        assert!(s.contains("\x1b[H"), "must home the cursor");
        assert!(s.ends_with("\x1b[?25h"), "must show the cursor last");
    }

    // ── Terminal struct ─────────────────────────────────────────────

    #[test]
    fn terminal_new_is_inactive() {
        let term = Terminal::new().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn terminal_enter_leave_cycle() {
        let mut term = Terminal::new().unwrap();
        assert!(!term.is_active());

        term.enter().unwrap();
        assert!(term.is_active());

        term.leave().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn terminal_double_enter_is_idempotent() {
        let mut term = Terminal::new().unwrap();
        term.enter().unwrap();
        term.enter().unwrap();
        assert!(term.is_active());
        term.leave().unwrap();
    }

    #[test]
    fn terminal_double_leave_is_idempotent() {
        let mut term = Terminal::new().unwrap();
        term.enter().unwrap();
        term.leave().unwrap();
        term.leave().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn terminal_leave_without_enter() {
        let mut term = Terminal::new().unwrap();
        term.leave().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn terminal_drop_after_enter() {
        let mut term = Terminal::new().unwrap();
        term.enter().unwrap();
        drop(term);
    }

    #[test]
    fn terminal_drop_without_enter() {
        let term = Terminal::new().unwrap();
        drop(term);
    }

    #[test]
    fn terminal_multiple_cycles() {
        let mut term = Terminal::new().unwrap();
        for _ in 0..3 {
            term.enter().unwrap();
            assert!(term.is_active());
            term.leave().unwrap();
            assert!(!term.is_active());
        }
    }
}
