//! Runtime game state for Lantern.
//!
//! This crate provides:
//! - [`RuntimeState`] - Object locations, property and exit logs, timers,
//!   and variables, cheap to snapshot
//! - [`initialize_state`] - Derives the starting state from a model
//! - [`UndoRing`] - Bounded snapshot history for `undo`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod init;
pub mod records;
pub mod state;
pub mod undo;
pub mod variables;

pub use init::initialize_state;
pub use records::{ExitRecord, ObjectRecord, PropertyRecord, TimerRecord};
pub use state::RuntimeState;
pub use undo::UndoRing;
pub use variables::{
    INT_SENTINEL, IntVar, STRING_SENTINEL, StringVar, VarChange, VarKind, Variable,
};
