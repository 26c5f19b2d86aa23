//! Integration tests for Layer 3: Engine
//!
//! Tests that play whole games through the command matcher and interpreter.

mod scripting;
mod walkthrough;
