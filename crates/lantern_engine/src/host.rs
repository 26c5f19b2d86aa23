//! The surface between the engine and whatever presents the game.
//!
//! The engine never writes to a terminal or reads a keyboard itself. It
//! calls into a [`Host`], which blocks until it has an answer.

use std::collections::VecDeque;

/// Outcome of a cosmetic host request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostResult {
    /// The host honored the request.
    Supported,
    /// The host cannot do this; the engine carries on regardless.
    Unsupported,
}

/// Callbacks the engine uses to talk to the player.
///
/// Text passed to [`Host::print_text`] may carry `|`-prefixed style codes
/// (`|b`, `|xb`, `|cr`, `|n`, ...). Hosts that do not render styles should
/// strip them.
pub trait Host {
    /// Shows text without a trailing newline.
    fn print_text(&mut self, text: &str);

    /// Ends the current line.
    fn print_newline(&mut self);

    /// Reads one line of input.
    fn get_line(&mut self) -> String;

    /// Offers a list of options and returns the index picked.
    ///
    /// Indices out of range are clamped by the engine.
    fn offer_choice(&mut self, prompt: &str, options: &[String]) -> usize;

    /// Asks a yes/no question.
    fn ask_yes_no(&mut self, prompt: &str) -> bool;

    /// Receives a diagnostic about the running game.
    fn debug_log(&mut self, _message: &str) {}

    /// Changes the text color.
    fn set_foreground(&mut self, _color: &str) -> HostResult {
        HostResult::Unsupported
    }

    /// Changes the background color.
    fn set_background(&mut self, _color: &str) -> HostResult {
        HostResult::Unsupported
    }

    /// Changes the default font.
    fn set_font(&mut self, _name: &str) -> HostResult {
        HostResult::Unsupported
    }

    /// Changes the default font size.
    fn set_font_size(&mut self, _size: &str) -> HostResult {
        HostResult::Unsupported
    }

    /// Clears the output window.
    fn clear_screen(&mut self) -> HostResult {
        HostResult::Unsupported
    }

    /// Waits for the given number of milliseconds.
    fn pause(&mut self, _millis: u64) -> HostResult {
        HostResult::Unsupported
    }

    /// Reads text aloud.
    fn speak(&mut self, _text: &str) -> HostResult {
        HostResult::Unsupported
    }

    /// Waits for a key press, showing `prompt` if it is not empty.
    fn wait_keypress(&mut self, _prompt: &str) -> HostResult {
        HostResult::Unsupported
    }
}

// =============================================================================
// Buffer Host
// =============================================================================

/// A host that records output and replays scripted answers.
///
/// Used by tests and by batch mode. Questions asked after the scripted
/// answers run out get an empty line, the first option, or "no".
#[derive(Clone, Debug, Default)]
pub struct BufferHost {
    output: String,
    diagnostics: Vec<String>,
    lines: VecDeque<String>,
    choices: VecDeque<usize>,
    answers: VecDeque<bool>,
    prompts: Vec<String>,
}

impl BufferHost {
    /// Creates a host with no scripted answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue an answer for [`Host::get_line`].
    #[must_use]
    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push_back(line.into());
        self
    }

    /// Builder method to queue an answer for [`Host::offer_choice`].
    #[must_use]
    pub fn with_choice(mut self, index: usize) -> Self {
        self.choices.push_back(index);
        self
    }

    /// Builder method to queue an answer for [`Host::ask_yes_no`].
    #[must_use]
    pub fn with_answer(mut self, yes: bool) -> Self {
        self.answers.push_back(yes);
        self
    }

    /// Everything printed so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns and clears the output printed so far.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Diagnostics received so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Prompts of every choice and question asked so far.
    #[must_use]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Host for BufferHost {
    fn print_text(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn print_newline(&mut self) {
        self.output.push('\n');
    }

    fn get_line(&mut self) -> String {
        self.lines.pop_front().unwrap_or_default()
    }

    fn offer_choice(&mut self, prompt: &str, _options: &[String]) -> usize {
        self.prompts.push(prompt.to_string());
        self.choices.pop_front().unwrap_or(0)
    }

    fn ask_yes_no(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().unwrap_or(false)
    }

    fn debug_log(&mut self, message: &str) {
        self.diagnostics.push(message.to_string());
    }

    fn pause(&mut self, _millis: u64) -> HostResult {
        HostResult::Supported
    }

    fn wait_keypress(&mut self, _prompt: &str) -> HostResult {
        HostResult::Supported
    }
}
