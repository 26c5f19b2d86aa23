//! Core error types, name keys, and configuration for Lantern.
//!
//! This crate provides:
//! - [`Error`] - Load-time errors with context
//! - [`NameKey`] - Case-insensitive keys that keep the original spelling
//! - [`EngineConfig`] - Tunable limits shared by the upper layers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod name;

pub use config::EngineConfig;
pub use error::{Error, ErrorContext, ErrorKind};
pub use name::{NameKey, ci_eq};

/// Result type alias using Lantern's error type.
pub type Result<T> = std::result::Result<T, Error>;
