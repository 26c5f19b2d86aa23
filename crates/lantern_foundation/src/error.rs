//! Error types for the Lantern system.
//!
//! Only loading a game can fail; script execution reports problems through
//! the diagnostic channel instead.

use std::fmt;

use thiserror::Error;

/// The main error type for Lantern operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a duplicate definition error.
    #[must_use]
    pub fn duplicate_name(
        name: impl Into<String>,
        existing: impl Into<String>,
        attempted: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::DuplicateName {
            name: name.into(),
            existing: existing.into(),
            attempted: attempted.into(),
        })
    }

    /// Creates an unterminated brace error for the line that opened the block.
    #[must_use]
    pub fn unterminated_brace(line: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnterminatedBrace { line: line.into() })
    }

    /// Creates an unmatched substitution delimiter error.
    #[must_use]
    pub fn unmatched_delimiter(delimiter: char, text: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnmatchedDelimiter {
            delimiter,
            text: text.into(),
        })
    }

    /// Creates an include resolution error.
    #[must_use]
    pub fn include(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Include {
            path: path.into(),
            message: message.into(),
        })
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A room, object, or game block reuses a name already taken.
    #[error("duplicate name '{name}': already defined as {existing}, redefined as {attempted}")]
    DuplicateName {
        /// The colliding name.
        name: String,
        /// Category of the first definition.
        existing: String,
        /// Category of the rejected definition.
        attempted: String,
    },

    /// A `{` was opened and never closed before the end of input.
    #[error("unterminated brace block starting at: {line}")]
    UnterminatedBrace {
        /// The line that opened the block.
        line: String,
    },

    /// A `#` or `%` marker has no partner during static evaluation.
    #[error("unmatched '{delimiter}' in: {text}")]
    UnmatchedDelimiter {
        /// The delimiter character.
        delimiter: char,
        /// The text being evaluated.
        text: String,
    },

    /// A `define` header has no matching `end define`.
    #[error("block never closed: {header}")]
    UnterminatedBlock {
        /// The header line of the block.
        header: String,
    },

    /// An `!include` directive could not be resolved.
    #[error("cannot include '{path}': {message}")]
    Include {
        /// The requested path.
        path: String,
        /// Why the include failed.
        message: String,
    },

    /// The game file defines no `game` block.
    #[error("no game block defined")]
    MissingGameBlock,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file.
    pub source: Option<String>,
    /// Line number in source (1-indexed).
    pub line: Option<usize>,
    /// Enclosing blocks or include chain, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line number.
    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_message() {
        let err = Error::duplicate_name("lamp", "object", "room");
        assert!(matches!(err.kind, ErrorKind::DuplicateName { .. }));
        let msg = format!("{err}");
        assert!(msg.contains("lamp"));
        assert!(msg.contains("object"));
        assert!(msg.contains("room"));
    }

    #[test]
    fn error_with_context() {
        let err = Error::unterminated_brace("if x then {")
            .with_context(ErrorContext::new().with_source("game.asl").with_line(12));

        let ctx = err.context.expect("context was attached");
        assert_eq!(ctx.source.as_deref(), Some("game.asl"));
        assert_eq!(ctx.line, Some(12));
        assert_eq!(format!("{ctx}"), "at game.asl:12");
    }

    #[test]
    fn unmatched_delimiter_names_character() {
        let err = Error::unmatched_delimiter('%', "weight=%w");
        assert_eq!(format!("{err}"), "unmatched '%' in: weight=%w");
    }

    #[test]
    fn context_stack_is_listed() {
        let ctx = ErrorContext::new()
            .with_source("main.asl")
            .with_frame("!include <rooms.lib>");
        let text = format!("{ctx}");
        assert!(text.contains("in !include <rooms.lib>"));
    }
}
