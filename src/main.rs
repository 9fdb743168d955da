// SPDX-License-Identifier: MIT
//
// glimpse — a minimal text viewer that talks to the raw terminal.
//
// This is the main binary that wires together the crates:
//
//   glimpse-term → raw mode, window sizing, ANSI output, key decoding
//   glimpse-view → document model, cursor, frame composition
//
// The Viewer struct owns the visible state. Each iteration of the loop
// flows:
//
//   render → one buffered write → blocking key decode → dispatch →
//   cursor mutation (or quit)
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ line 0 of the file (if any)  │
//   │ ~                            │
//   │ ~        welcome banner      │  ← rows/3 when no file is loaded
//   │ ~                            │
//   └──────────────────────────────┘
//
// Raw mode is entered exactly once and restored on every exit path: the
// quit key, a fatal error, and panics all erase the screen, home the
// cursor, and hand back the terminal the way we found it.

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use glimpse_term::ansi;
use glimpse_term::input::{self, ByteSource, Key, TtyInput, ctrl};
use glimpse_term::output::OutputBuffer;
use glimpse_term::terminal::{self, Size, Terminal};
use glimpse_view::cursor::Cursor;
use glimpse_view::document::Document;
use glimpse_view::screen;

/// The quit chord: Ctrl-Q.
const QUIT: u8 = ctrl(b'q');

// ─── Viewer ─────────────────────────────────────────────────────────────────

/// What the viewer tells the loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Keep running.
    Continue,
    /// Exit the loop cleanly.
    Quit,
}

/// The viewer state: one document, one cursor, one fixed viewport.
struct Viewer {
    document: Document,
    cursor: Cursor,
    size: Size,
}

impl Viewer {
    const fn new(document: Document, size: Size) -> Self {
        Self {
            document,
            cursor: Cursor::new(),
            size,
        }
    }

    /// Apply one decoded key press.
    fn process_key(&mut self, key: Key) -> Action {
        match key {
            Key::Byte(QUIT) => return Action::Quit,
            Key::Up => self.cursor.move_up(),
            Key::Down => self.cursor.move_down(self.size),
            Key::Left => self.cursor.move_left(),
            Key::Right => self.cursor.move_right(self.size),
            // Page moves are a full screen of single steps.
            Key::PageUp => {
                for _ in 0..self.size.rows {
                    self.cursor.move_up();
                }
            }
            Key::PageDown => {
                for _ in 0..self.size.rows {
                    self.cursor.move_down(self.size);
                }
            }
            Key::Home => self.cursor.line_start(),
            Key::End => self.cursor.line_end(self.size),
            // No editing in this viewer: everything else is a no-op.
            Key::Byte(_) | Key::Delete | Key::Escape => {}
        }
        Action::Continue
    }

    /// Compose the current state into `frame`.
    fn render(&self, frame: &mut OutputBuffer) -> io::Result<()> {
        screen::render(&self.document, self.cursor, self.size, frame)
    }
}

// ─── Loop ───────────────────────────────────────────────────────────────────

/// Frame buffer capacity for a known viewport: row content plus per-row
/// escape overhead plus cursor bookkeeping.
const fn frame_capacity(size: Size) -> usize {
    size.area() as usize + size.rows as usize * 5 + 32
}

/// Enter raw mode, run the viewer, and restore the terminal regardless of
/// how the loop ends.
fn run(terminal: &mut Terminal, input: &mut impl ByteSource, document: Document) -> io::Result<()> {
    terminal.enter()?;
    let result = view_loop(input, document);

    // Every exit path — quit and error alike — erases the screen and
    // homes the cursor before the terminal mode flips back.
    let cleanup = clear_and_home();
    terminal.leave()?;
    result.and(cleanup)
}

/// The render → decode → dispatch loop.
fn view_loop(input: &mut impl ByteSource, document: Document) -> io::Result<()> {
    // Size discovery happens inside raw mode: the probe fallback reads
    // the cursor report off stdin, which must not be echoed or line
    // buffered.
    let size = {
        let mut stdout = io::stdout().lock();
        terminal::viewport_size(&mut stdout, input)?
    };

    let mut viewer = Viewer::new(document, size);
    let mut frame = OutputBuffer::with_capacity(frame_capacity(size));

    loop {
        viewer.render(&mut frame)?;
        frame.flush_stdout()?;

        match viewer.process_key(input::read_key(input)?) {
            Action::Quit => return Ok(()),
            Action::Continue => {}
        }
    }
}

/// Erase the screen and home the cursor, flushed immediately.
fn clear_and_home() -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    ansi::clear_screen(&mut stdout)?;
    ansi::cursor_home(&mut stdout)?;
    stdout.flush()
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let document = match args.get(1) {
        Some(path) => Document::open(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("glimpse: {path}: {e}");
            process::exit(1);
        }),
        None => Document::new(),
    };

    let mut terminal = Terminal::new().unwrap_or_else(|e| {
        eprintln!("glimpse: failed to initialize terminal: {e}");
        process::exit(1);
    });

    if let Err(e) = run(&mut terminal, &mut TtyInput, document) {
        eprintln!("glimpse: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
