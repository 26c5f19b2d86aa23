//! Game engine for Lantern.
//!
//! This crate provides:
//! - [`Engine`] - Runs a loaded game against a [`Host`]
//! - [`match_command`] - Player input against `#name#` patterns
//! - String substitution, conditions, and arithmetic
//! - The script interpreter and built-in functions
//! - Rooms, exits, object resolution, and the built-in verbs
//!
//! The engine never touches a terminal. Everything it shows or asks goes
//! through the [`Host`] trait; [`BufferHost`] collects it in memory.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod commands;
pub mod engine;
pub mod eval;
pub mod functions;
pub mod host;
pub mod interp;
pub mod matcher;
pub mod messages;
pub mod world;

pub use engine::{Engine, parse_int};
pub use functions::BUILTIN_FUNCTIONS;
pub use host::{BufferHost, Host, HostResult};
pub use interp::CallFrame;
pub use matcher::{Binding, match_command};
pub use messages::{DEFAULT_MESSAGES, DefaultMessage, HELP_TEXT, default_message};
pub use world::{DIRECTIONS, Exit, ListingEntry, Place};
