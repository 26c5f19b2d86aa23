//! Terminal front end, REPL, and save games for Lantern.
//!
//! This crate provides:
//! - [`TerminalHost`] - Renders game text to an ANSI terminal
//! - [`Repl`] - Interactive play loop over a [`LineEditor`]
//! - [`Session`] - A running game plus `save`/`restore`
//! - Save game encoding with `MessagePack`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
pub mod repl;
pub mod serialize;
pub mod session;
pub mod terminal;

pub use editor::{LineEditor, ReadResult, ReaderEditor, RustylineEditor};
pub use repl::{Repl, run_batch};
pub use serialize::{from_bytes, load_from_file, save_to_file, to_bytes};
pub use session::Session;
pub use terminal::{TerminalHost, plain_text};
