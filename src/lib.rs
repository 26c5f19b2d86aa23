//! Lantern - Text adventure interpreter
//!
//! This crate re-exports all layers of the Lantern system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: lantern_runtime    - REPL, terminal host, CLI, save games
//! Layer 3: lantern_engine     - Script interpreter, command matching, turns
//! Layer 2: lantern_storage    - Mutable game state, variables, undo
//! Layer 1: lantern_language   - Game file loading, blocks, tokens
//! Layer 0: lantern_foundation - Errors and configuration
//! ```

pub use lantern_engine as engine;
pub use lantern_foundation as foundation;
pub use lantern_language as language;
pub use lantern_runtime as runtime;
pub use lantern_storage as storage;
