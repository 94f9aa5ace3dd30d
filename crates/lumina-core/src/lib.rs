#![warn(missing_docs)]
//! `lumina-core` - Line-oriented document model for the lumina highlight engine.
//!
//! This crate holds the text foundation shared by every analyzer:
//!
//! - [`TextPosition`] / [`TextRange`] - line/column coordinates with an optional
//!   absolute character index
//! - [`Document`] - a patchable sequence of [`DocumentLine`]s that preserves the
//!   original line terminator of every line
//! - [`utf8`] - char/byte conversion helpers (columns are *characters*, regex
//!   matches are *byte* spans)
//!
//! It does not know anything about grammars or styles; see `lumina-highlight`
//! for the engine built on top of it.

pub mod document;
pub mod position;
pub mod utf8;

pub use document::{Document, DocumentLine, LineEnding, split_lines};
pub use position::{TextPosition, TextRange};
