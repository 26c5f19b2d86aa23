//! Cross-layer integration tests for Lantern
//!
//! Tests that load games from disk and play them through the runtime.

mod batch;
mod save_restore;
