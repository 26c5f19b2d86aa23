//! Integration tests for Layer 1: Language
//!
//! Tests for loading game files from text and from disk.

mod generated;
mod includes;
mod loading;
