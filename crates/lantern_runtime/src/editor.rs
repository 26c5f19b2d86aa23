//! Line editing for the interactive player.
//!
//! The REPL reads through the [`LineEditor`] trait so it can run on
//! rustyline in a terminal or on plain piped input.

use std::borrow::Cow;
use std::io::BufRead;

use lantern_foundation::{Error, ErrorKind, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::{Completer, Config, Context, Editor, Helper, Hinter, Validator};

/// Result of reading a line from the editor.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadResult {
    /// A line was read.
    Line(String),
    /// The player pressed Ctrl+C.
    Interrupted,
    /// The player pressed Ctrl+D, or input ended.
    Eof,
}

/// Abstraction over line editing.
pub trait LineEditor {
    /// Reads a line with the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the terminal fails.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Adds a line to history.
    fn add_history(&mut self, line: &str);

    /// Replaces the words offered for completion.
    fn set_keywords(&mut self, keywords: Vec<String>);
}

/// Verbs the engine always understands.
pub const COMMAND_WORDS: [&str; 26] = [
    "look", "look at", "examine", "take", "get", "drop", "give", "use", "speak to", "talk to",
    "go", "go to", "north", "south", "east", "west", "up", "down", "out", "inventory", "help",
    "about", "undo", "quit", "save", "restore",
];

#[derive(Helper, Completer, Hinter, Validator)]
struct LanternHelper {
    #[rustyline(Completer)]
    completer: WordCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

impl Highlighter for LanternHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        false
    }
}

/// Completes command words and the names of things in view.
struct WordCompleter {
    keywords: Vec<String>,
}

impl WordCompleter {
    fn new() -> Self {
        Self {
            keywords: COMMAND_WORDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Completions for the text before `pos`, and where they start.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let head = &line[..pos];
        let lower = head.to_lowercase();
        let mut matches: Vec<String> = Vec::new();
        let mut start = pos;
        // Try the longest tail first so multi-word names complete as one.
        for (i, _) in head.char_indices().filter(|&(i, c)| i == 0 || c == ' ') {
            let from = if i == 0 { 0 } else { i + 1 };
            let word = &lower[from..];
            if word.is_empty() {
                continue;
            }
            matches = self
                .keywords
                .iter()
                .filter(|k| k.to_lowercase().starts_with(word) && k.len() > word.len())
                .cloned()
                .collect();
            if !matches.is_empty() {
                start = from;
                break;
            }
        }
        matches.sort();
        matches.dedup();
        (start, matches)
    }
}

impl Completer for WordCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.candidates(line, pos);
        let pairs = words
            .into_iter()
            .map(|w| Pair {
                display: w.clone(),
                replacement: w,
            })
            .collect();
        Ok((start, pairs))
    }
}

/// Line editor backed by rustyline.
pub struct RustylineEditor {
    editor: Editor<LanternHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Creates a rustyline editor with completion and history hints.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(500)
            .map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?
            .build();

        let helper = LanternHelper {
            completer: WordCompleter::new(),
            hinter: HistoryHinter::new(),
        };
        let mut editor =
            Editor::with_config(config).map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?;
        editor.set_helper(Some(helper));
        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::new(ErrorKind::Io(e.to_string()))),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            log::debug!(target: "lantern::runtime", "history not updated: {e}");
        }
    }

    fn set_keywords(&mut self, keywords: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completer.keywords = keywords;
        }
    }
}

/// An editor that reads lines from any reader, without prompting.
///
/// Used for batch play and for tests.
#[derive(Debug)]
pub struct ReaderEditor<R: BufRead> {
    reader: R,
    history: Vec<String>,
    keywords: Vec<String>,
}

impl<R: BufRead> ReaderEditor<R> {
    /// Creates an editor over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            history: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Lines added to history so far.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// The latest completion words.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl<R: BufRead> LineEditor for ReaderEditor<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Ok(ReadResult::Eof),
            Ok(_) => Ok(ReadResult::Line(line.trim_end_matches(['\r', '\n']).to_string())),
            Err(e) => Err(Error::new(ErrorKind::Io(e.to_string()))),
        }
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    fn set_keywords(&mut self, keywords: Vec<String>) {
        self.keywords = keywords;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn completer(extra: &[&str]) -> WordCompleter {
        let mut c = WordCompleter::new();
        c.keywords.extend(extra.iter().map(ToString::to_string));
        c
    }

    #[test]
    fn completes_first_word() {
        let c = completer(&[]);
        let (start, words) = c.candidates("inv", 3);
        assert_eq!(start, 0);
        assert_eq!(words, ["inventory"]);
    }

    #[test]
    fn completes_object_after_verb() {
        let c = completer(&["brass lamp", "bread"]);
        let (start, words) = c.candidates("take br", 7);
        assert_eq!(start, 5);
        assert_eq!(words, ["brass lamp", "bread"]);
    }

    #[test]
    fn multi_word_names_complete_whole() {
        let c = completer(&["old man"]);
        let (start, words) = c.candidates("talk to old m", 13);
        assert_eq!(start, 8);
        assert_eq!(words, ["old man"]);
    }

    #[test]
    fn nothing_to_complete() {
        let c = completer(&[]);
        assert!(c.candidates("xyzzy", 5).1.is_empty());
        assert!(c.candidates("", 0).1.is_empty());
    }

    #[test]
    fn reader_editor_reads_then_ends() {
        let mut e = ReaderEditor::new(Cursor::new("look\r\nquit"));
        assert_eq!(e.read_line("> ").unwrap(), ReadResult::Line("look".to_string()));
        e.add_history("look");
        assert_eq!(e.read_line("> ").unwrap(), ReadResult::Line("quit".to_string()));
        assert_eq!(e.read_line("> ").unwrap(), ReadResult::Eof);
        assert_eq!(e.history(), ["look"]);
    }
}
