//! Source preprocessing.
//!
//! Turns raw game file lines into the normalized line stream the model
//! builder consumes. The passes run in this order:
//!
//! ```text
//! raw lines
//!    │  !include expansion (relative to the including file)
//!    ▼
//!    │  !QDK stripping, !addto buffering and splicing
//!    ▼
//!    │  comment stripping, comparison rewrite
//!    ▼
//!    │  brace deinlining into synthetic procedures
//!    ▼
//!    │  blank line removal, else merging
//!    ▼
//! normalized lines
//! ```
//!
//! Text blocks (`define text`) pass through every stage verbatim.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use lantern_foundation::{Error, ErrorContext, Result, ci_eq};

use crate::lexer::{Tokens, first_token, is_param, param_contents};

// =============================================================================
// Source Loading
// =============================================================================

/// Supplies file contents to the preprocessor.
pub trait SourceLoader {
    /// Reads the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Loads sources from the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Loads sources from an in-memory table of virtual paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(collapse_path(&path.into()), text.into());
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&collapse_path(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such virtual file"))
    }
}

/// Collapses `.` and `..` segments without touching the filesystem.
#[must_use]
pub fn collapse_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolves an included file name against the file that includes it.
#[must_use]
pub fn resolve_include(parent: &Path, name: &str) -> PathBuf {
    let dir = parent.parent().unwrap_or_else(|| Path::new(""));
    collapse_path(&dir.join(name))
}

// =============================================================================
// Block Mode Tracking
// =============================================================================

/// How a line must be treated by the normalizing passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineMode {
    /// Script or declaration line: every pass applies.
    Code,
    /// Synonym table line: no comment stripping or deinlining.
    Literal,
    /// Text block line: kept byte for byte.
    Verbatim,
}

/// Follows `define`/`end define` nesting to classify lines.
#[derive(Debug, Default)]
struct BlockTracker {
    depth: usize,
    verbatim: bool,
    literal: bool,
}

impl BlockTracker {
    fn classify(&mut self, line: &str) -> LineMode {
        let mut tokens = Tokens::new(line);
        let first = tokens.next_text();
        let is_end = first == "end" && tokens.peek().text == "define";

        if self.verbatim {
            if is_end {
                self.verbatim = false;
                self.depth = self.depth.saturating_sub(1);
                return LineMode::Code;
            }
            return LineMode::Verbatim;
        }

        if first == "define" {
            self.depth += 1;
            match tokens.next_text() {
                "text" => self.verbatim = true,
                "synonyms" => self.literal = true,
                _ => {}
            }
            return LineMode::Code;
        }
        if is_end {
            self.depth = self.depth.saturating_sub(1);
            if self.depth == 0 {
                self.literal = false;
            }
            return LineMode::Code;
        }

        if self.literal {
            LineMode::Literal
        } else {
            LineMode::Code
        }
    }
}

// =============================================================================
// Preprocessor
// =============================================================================

/// Runs the preprocessing passes over a game source.
pub struct Preprocessor<'a> {
    loader: &'a dyn SourceLoader,
    next_intproc: usize,
}

impl<'a> Preprocessor<'a> {
    /// Creates a preprocessor reading files through `loader`.
    #[must_use]
    pub fn new(loader: &'a dyn SourceLoader) -> Self {
        Self {
            loader,
            next_intproc: 0,
        }
    }

    /// Preprocesses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or one of its includes cannot be read,
    /// or if a brace block is never closed.
    pub fn run_file(&mut self, path: &Path) -> Result<Vec<String>> {
        let text = self.loader.load(path).map_err(|e| {
            Error::io(format!("failed to read '{}': {e}", path.display()))
        })?;
        self.run_str(&text, path)
    }

    /// Preprocesses `text` as though it had been read from `origin`.
    ///
    /// `origin` is only used to resolve `!include` directives.
    ///
    /// # Errors
    ///
    /// Returns an error if an include cannot be read or if a brace block is
    /// never closed.
    pub fn run_str(&mut self, text: &str, origin: &Path) -> Result<Vec<String>> {
        let raw = self.expand_includes(text, origin)?;
        let merged = merge_addto(strip_directives(raw));
        let normalized = normalize_lines(merged);
        let deinlined = self.deinline(normalized)?;
        Ok(trim_and_merge_else(deinlined))
    }

    /// Replaces every `!include <file>` line with the file's lines.
    fn expand_includes(&self, text: &str, origin: &Path) -> Result<Vec<String>> {
        struct Frame {
            path: PathBuf,
            lines: VecDeque<String>,
        }

        let mut out = Vec::new();
        let mut stack = vec![Frame {
            path: collapse_path(origin),
            lines: split_lines(text),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(line) = frame.lines.pop_front() else {
                stack.pop();
                continue;
            };

            let mut tokens = Tokens::new(&line);
            if tokens.next_text() != "!include" {
                out.push(line);
                continue;
            }
            let param = tokens.next_text();
            if !is_param(param) {
                log::warn!(target: "lantern::load", "expected file parameter in '{line}'");
                continue;
            }

            let path = resolve_include(&frame.path, param_contents(param).trim());
            if stack.iter().any(|f| f.path == path) {
                log::warn!(
                    target: "lantern::load",
                    "skipping recursive include of '{}'",
                    path.display()
                );
                continue;
            }

            let context = stack.iter().fold(
                ErrorContext::new().with_source(path.display().to_string()),
                |ctx, f| ctx.with_frame(f.path.display().to_string()),
            );
            let included = self.loader.load(&path).map_err(|e| {
                Error::include(path.display().to_string(), e.to_string()).with_context(context)
            })?;
            log::debug!(target: "lantern::load", "including '{}'", path.display());
            stack.push(Frame {
                path,
                lines: split_lines(&included),
            });
        }

        Ok(out)
    }

    fn fresh_intproc(&mut self) -> String {
        self.next_intproc += 1;
        format!("!intproc{}", self.next_intproc)
    }

    /// Moves multi-line brace bodies into synthetic procedures.
    fn deinline(&mut self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut pending = VecDeque::new();
        let mut out = self.deinline_stream(lines, &mut pending, true)?;

        while let Some((name, body)) = pending.pop_front() {
            let body = self.deinline_stream(body, &mut pending, false)?;
            out.push(format!("define procedure <{name}>"));
            out.extend(body);
            out.push("end define".to_string());
        }
        Ok(out)
    }

    fn deinline_stream(
        &mut self,
        lines: Vec<String>,
        pending: &mut VecDeque<(String, Vec<String>)>,
        track_blocks: bool,
    ) -> Result<Vec<String>> {
        let mut tracker = BlockTracker::default();
        let mut queue: VecDeque<String> = lines.into();
        let mut out = Vec::new();
        // Lines requeued after a split must not be classified twice.
        let mut requeued = false;

        while let Some(line) = queue.pop_front() {
            let mode = if track_blocks && !requeued {
                tracker.classify(&line)
            } else {
                LineMode::Code
            };
            requeued = false;
            if mode != LineMode::Code {
                out.push(line);
                continue;
            }

            let Some(open) = unclosed_brace(&line) else {
                out.push(line);
                continue;
            };

            let name = self.fresh_intproc();
            let mut body = Vec::new();
            let mut depth = 1usize;
            let mut segment = line[open + 1..].to_string();
            let remainder = loop {
                if let Some(close) = scan_depth(&segment, &mut depth) {
                    push_nonblank(&mut body, &segment[..close]);
                    break segment[close + 1..].trim().to_string();
                }
                push_nonblank(&mut body, &segment);
                segment = queue
                    .pop_front()
                    .ok_or_else(|| Error::unterminated_brace(line.trim()))?;
            };

            let prefix = line[..open].trim_end();
            let mut rewritten = if prefix.is_empty() {
                format!("do <{name}>")
            } else {
                format!("{prefix} do <{name}>")
            };
            if !remainder.is_empty() {
                rewritten.push(' ');
                rewritten.push_str(&remainder);
            }
            pending.push_back((name, body));
            queue.push_front(rewritten);
            requeued = true;
        }
        Ok(out)
    }
}

fn split_lines(text: &str) -> VecDeque<String> {
    text.lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}

fn push_nonblank(body: &mut Vec<String>, text: &str) {
    if !text.trim().is_empty() {
        body.push(text.to_string());
    }
}

/// Returns the byte offset of the first `{` not closed on the same line.
///
/// Braces inside `<...>` parameters do not count.
fn unclosed_brace(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut open = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                while i < bytes.len() && bytes[i] != b'>' {
                    i += 1;
                }
            }
            b'{' => open.push(i),
            b'}' => {
                open.pop();
            }
            _ => {}
        }
        i += 1;
    }
    open.first().copied()
}

/// Updates `depth` across `segment`, returning where it reaches zero.
fn scan_depth(segment: &str, depth: &mut usize) -> Option<usize> {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                while i < bytes.len() && bytes[i] != b'>' {
                    i += 1;
                }
            }
            b'{' => *depth += 1,
            b'}' => {
                *depth -= 1;
                if *depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

// =============================================================================
// Directive Passes
// =============================================================================

/// Output of the directive pass: kept lines plus `!addto` buffers.
struct Directives {
    lines: Vec<String>,
    addto: Vec<(String, Vec<String>)>,
}

/// Normalized target key of a `define` or `!addto` line.
///
/// `game` and `synonyms` are keyed by category alone, `type` blocks by
/// category and name.
fn target_key(category: &str, param: &str) -> Option<String> {
    match category.to_ascii_lowercase().as_str() {
        "game" => Some("game".to_string()),
        "synonyms" => Some("synonyms".to_string()),
        "type" if is_param(param) => Some(format!(
            "type {}",
            param_contents(param).trim().to_ascii_lowercase()
        )),
        _ => None,
    }
}

fn strip_directives(lines: Vec<String>) -> Directives {
    enum State {
        Normal,
        Qdk,
        AddTo(usize),
    }

    let mut out = Vec::new();
    let mut addto: Vec<(String, Vec<String>)> = Vec::new();
    let mut state = State::Normal;

    for line in lines {
        let mut tokens = Tokens::new(&line);
        let first = tokens.next_text();
        match state {
            State::Qdk => {
                if first == "!end" {
                    state = State::Normal;
                }
            }
            State::AddTo(slot) => {
                if first == "!end" {
                    state = State::Normal;
                } else {
                    addto[slot].1.push(line.clone());
                }
            }
            State::Normal => {
                if first == "!QDK" {
                    state = State::Qdk;
                } else if first == "!addto" {
                    let category = tokens.next_text();
                    let param = tokens.next_text();
                    match target_key(category, param) {
                        Some(key) => {
                            let slot = match addto.iter().position(|(k, _)| *k == key) {
                                Some(slot) => slot,
                                None => {
                                    addto.push((key, Vec::new()));
                                    addto.len() - 1
                                }
                            };
                            state = State::AddTo(slot);
                        }
                        None => {
                            log::warn!(target: "lantern::load", "bad !addto target in '{line}'");
                            state = State::Qdk;
                        }
                    }
                } else {
                    out.push(line);
                }
            }
        }
    }

    Directives { lines: out, addto }
}

fn merge_addto(directives: Directives) -> Vec<String> {
    let Directives { lines, mut addto } = directives;
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let mut tokens = Tokens::new(&line);
        let key = if tokens.next_text() == "define" {
            let category = tokens.next_text();
            target_key(category, tokens.next_text())
        } else {
            None
        };
        out.push(line);
        if let Some(key) = key {
            if let Some(slot) = addto.iter().position(|(k, _)| *k == key) {
                let (_, extra) = addto.remove(slot);
                out.extend(extra);
            }
        }
    }

    for (key, extra) in addto {
        let header = match key.split_once(' ') {
            Some((category, name)) => format!("define {category} <{name}>"),
            None if key == "game" => "define game <game>".to_string(),
            None => format!("define {key}"),
        };
        out.push(header);
        out.extend(extra);
        out.push("end define".to_string());
    }
    out
}

// =============================================================================
// Line Normalization
// =============================================================================

fn normalize_lines(lines: Vec<String>) -> Vec<String> {
    let mut tracker = BlockTracker::default();
    lines
        .into_iter()
        .map(|line| match tracker.classify(&line) {
            LineMode::Code => rewrite_comparisons(strip_comment(&line)),
            LineMode::Literal | LineMode::Verbatim => line,
        })
        .collect()
}

/// Truncates a line at the first token beginning with `'`.
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    for token in Tokens::new(line) {
        if token.text.starts_with('\'') {
            return line[..token.start].trim_end();
        }
    }
    line
}

/// Operator spellings in trial order, with their canonical marker.
const COMPARISON_OPERATORS: [(&str, &str); 7] = [
    ("<>", "!="),
    ("!=", "!="),
    ("<=", "lt="),
    (">=", "gt="),
    ("<", "lt"),
    (">", "gt"),
    ("=", ""),
];

/// Words after which a parenthesized comparison is part of a condition.
const CONDITION_WORDS: [&str; 7] = ["if", "and", "or", "not", "while", "until", "repeat"];

/// Rewrites `(A op B)` inside conditions to `is <A;op;B>`.
///
/// Equality becomes `is <A;B>`. Lines with nothing to rewrite are returned
/// unchanged, so applying the rewrite twice is the same as applying it once.
#[must_use]
pub fn rewrite_comparisons(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut copied = 0;
    let mut in_condition = false;

    for token in Tokens::with_parens(line) {
        let text = token.text;
        if CONDITION_WORDS.contains(&text) {
            in_condition = true;
            continue;
        }
        if text == "then" || text == "do" {
            in_condition = false;
            continue;
        }
        if !in_condition || !(text.starts_with('(') && text.ends_with(')') && text.len() >= 2) {
            continue;
        }
        if let Some(replacement) = comparison_to_is(&text[1..text.len() - 1]) {
            out.push_str(&line[copied..token.start]);
            out.push_str(&replacement);
            copied = token.end;
        }
    }

    out.push_str(&line[copied..]);
    out
}

fn comparison_to_is(inner: &str) -> Option<String> {
    COMPARISON_OPERATORS.iter().find_map(|(op, marker)| {
        let index = inner.find(op)?;
        let lhs = inner[..index].trim();
        let rhs = inner[index + op.len()..].trim();
        Some(if marker.is_empty() {
            format!("is <{lhs};{rhs}>")
        } else {
            format!("is <{lhs};{marker};{rhs}>")
        })
    })
}

/// Drops blank lines and folds `else` continuations into the line above.
fn trim_and_merge_else(lines: Vec<String>) -> Vec<String> {
    let mut tracker = BlockTracker::default();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut last_was_code = false;

    for line in lines {
        if tracker.classify(&line) == LineMode::Verbatim {
            out.push(line);
            last_was_code = false;
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if last_was_code && ci_eq(first_token(trimmed), "else") {
            if let Some(previous) = out.last_mut() {
                previous.push(' ');
                previous.push_str(trimmed);
                continue;
            }
        }
        out.push(trimmed.to_string());
        last_was_code = true;
    }
    out
}

// =============================================================================
// Entry Points
// =============================================================================

/// Preprocesses a game file from disk.
///
/// # Errors
///
/// Returns an error if a file cannot be read or a brace block is unterminated.
pub fn preprocess_file(path: &Path) -> Result<Vec<String>> {
    Preprocessor::new(&FsLoader).run_file(path)
}

/// Preprocesses in-memory text; includes resolve relative to `origin`.
///
/// # Errors
///
/// Returns an error if an include cannot be read or a brace block is
/// unterminated.
pub fn preprocess_str(text: &str, origin: &Path, loader: &dyn SourceLoader) -> Result<Vec<String>> {
    Preprocessor::new(loader).run_str(text, origin)
}
