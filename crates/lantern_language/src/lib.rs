//! Game file loading for Lantern.
//!
//! This crate turns game definition text into a [`FileModel`]:
//! - [`lexer`] - Line tokenizer and parameter helpers
//! - [`preprocess`] - Includes, `!addto` merging, comment stripping,
//!   comparison rewriting, and brace deinlining
//! - [`builder`] - Per-category block extraction and line normalization
//! - [`model`] - Blocks, lookup indices, and static property resolution

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod lexer;
pub mod model;
pub mod preprocess;
pub mod reserved;
pub mod static_eval;

use std::path::Path;

use lantern_foundation::{ErrorContext, Result};

pub use builder::{ModelBuilder, build_model};
pub use lexer::{
    Token, Tokens, first_token, is_param, make_param, next_token, param_contents, split_f_args,
    split_param, trim_braces,
};
pub use model::{Block, BodyLine, FileModel};
pub use preprocess::{FsLoader, MemoryLoader, SourceLoader, preprocess_file, preprocess_str};
pub use reserved::ReservedWords;
pub use static_eval::StaticVars;

/// Loads a game file from disk.
///
/// # Errors
///
/// Returns an error if the file or an include cannot be read, or if the
/// file is structurally invalid.
pub fn load(path: &Path) -> Result<FileModel> {
    load_with(path, &FsLoader, &ReservedWords::standard())
}

/// Loads a game from in-memory text.
///
/// `!include` directives resolve against the current directory.
///
/// # Errors
///
/// Returns an error if the text is structurally invalid.
pub fn load_str(text: &str) -> Result<FileModel> {
    let lines = preprocess_str(text, Path::new("game.asl"), &FsLoader)?;
    build_model(&lines, &ReservedWords::standard())
}

/// Loads a game through a custom loader and keyword tables.
///
/// # Errors
///
/// Returns an error if a source cannot be read or is structurally invalid.
pub fn load_with(
    path: &Path,
    loader: &dyn SourceLoader,
    words: &ReservedWords,
) -> Result<FileModel> {
    let source = path.display().to_string();
    let lines = preprocess::Preprocessor::new(loader)
        .run_file(path)
        .map_err(|e| attach_source(e, &source))?;
    build_model(&lines, words).map_err(|e| attach_source(e, &source))
}

fn attach_source(mut err: lantern_foundation::Error, source: &str) -> lantern_foundation::Error {
    let context = err.context.take().unwrap_or_else(ErrorContext::new);
    if context.source.is_some() {
        return err.with_context(context);
    }
    err.with_context(context.with_source(source))
}
