// SPDX-License-Identifier: MIT
//
// glimpse-term — Terminal backend for glimpse.
//
// Direct terminal control for a byte-at-a-time viewer: raw mode via
// termios, window-size discovery with a cursor-report fallback, ANSI
// escape generation, single-write frame buffering, and an escape
// sequence key decoder built on bounded single-byte reads.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. Every byte sent to the terminal is
// accounted for, and every frame leaves in one write.

pub mod ansi;
pub mod input;
pub mod output;
pub mod terminal;
