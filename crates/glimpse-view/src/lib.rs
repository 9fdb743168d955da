//! # glimpse-view — Viewer core for glimpse
//!
//! This crate contains the building blocks of the viewer:
//!
//! - **[`document`]** — the zero-or-one-line `Document` and its file loader
//! - **[`cursor`]** — a `Cursor` clamped to the viewport
//! - **[`screen`]** — frame composition into glimpse-term's `OutputBuffer`
//!
//! Everything here is plain state and pure composition; the terminal side
//! (raw mode, key decoding, the single-write flush) lives in glimpse-term.

pub mod cursor;
pub mod document;
pub mod screen;
