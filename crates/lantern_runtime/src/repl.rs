//! The interactive play loop and batch play.

use std::io::{BufRead, Write};

use lantern_engine::{BufferHost, Host};
use lantern_foundation::{Error, ErrorKind, Result};

use crate::editor::{LineEditor, ReadResult, ReaderEditor, RustylineEditor};
use crate::session::Session;
use crate::terminal::plain_text;

/// Reads commands from a line editor and plays them until the player quits
/// or input ends.
pub struct Repl<H: Host, E: LineEditor = RustylineEditor> {
    editor: E,
    session: Session<H>,
    prompt: String,
    show_banner: bool,
    last_status: Vec<String>,
}

impl<H: Host> Repl<H, RustylineEditor> {
    /// Creates a REPL reading from the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the line editor fails to initialize.
    pub fn new(session: Session<H>) -> Result<Self> {
        Ok(Self::with_editor(session, RustylineEditor::new()?))
    }
}

impl<H: Host, E: LineEditor> Repl<H, E> {
    /// Creates a REPL with the given editor.
    pub fn with_editor(session: Session<H>, editor: E) -> Self {
        Self {
            editor,
            session,
            prompt: "> ".to_string(),
            show_banner: true,
            last_status: Vec::new(),
        }
    }

    /// Disables the title banner.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &Session<H> {
        &self.session
    }

    /// Returns the editor.
    #[must_use]
    pub const fn editor(&self) -> &E {
        &self.editor
    }

    /// Starts the game and plays until the player quits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }
        self.session.start();
        self.show_status();

        while self.session.is_active() {
            self.editor.set_keywords(self.session.completion_words());
            match self.editor.read_line(&self.prompt)? {
                ReadResult::Line(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.editor.add_history(&line);
                    self.session.handle_line(&line);
                    self.show_status();
                }
                ReadResult::Interrupted => {}
                ReadResult::Eof => break,
            }
        }
        log::debug!(target: "lantern::runtime", "play loop finished");
        Ok(())
    }

    fn print_banner(&mut self) {
        let banner = self.session.engine_mut().banner();
        if banner.is_empty() {
            return;
        }
        let host = self.session.engine_mut().host_mut();
        host.print_text(&format!("|b{banner}|xb"));
        host.print_newline();
        host.print_newline();
    }

    /// Prints the status variables when they have changed.
    fn show_status(&mut self) {
        let status = self.session.engine_mut().status_lines();
        if status == self.last_status {
            return;
        }
        let host = self.session.engine_mut().host_mut();
        for line in &status {
            host.print_text(&format!("|cl[{line}]|cb"));
            host.print_newline();
        }
        self.last_status = status;
    }
}

/// Plays commands read from `input` with no prompts, writing plain text to
/// `output` as it is produced.
///
/// Questions the game asks take their first option, or "no".
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub fn run_batch<R: BufRead, W: Write>(
    session: Session<BufferHost>,
    input: R,
    output: &mut W,
) -> Result<()> {
    let mut repl = Repl::with_editor(session, ReaderEditor::new(input)).without_banner();
    repl.session.start();
    flush_output(&mut repl.session, output)?;

    while repl.session.is_active() {
        match repl.editor.read_line("")? {
            ReadResult::Line(line) => {
                repl.session.handle_line(&line);
                flush_output(&mut repl.session, output)?;
            }
            ReadResult::Interrupted => {}
            ReadResult::Eof => break,
        }
    }
    Ok(())
}

fn flush_output<W: Write>(session: &mut Session<BufferHost>, output: &mut W) -> Result<()> {
    let text = session.engine_mut().host_mut().take_output();
    output
        .write_all(plain_text(&text).as_bytes())
        .and_then(|()| output.flush())
        .map_err(|e| Error::new(ErrorKind::Io(e.to_string())))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use lantern_foundation::EngineConfig;
    use lantern_language::load_str;

    use super::*;

    const GAME: &str = r"
define game <Little Walk>
  game version <2>
  game author <Sam>
  start <porch>
end define

define room <porch>
  description <A creaky porch.>
  east <garden>
end define

define room <garden>
  description <A sunny garden.>
  west <porch>
end define

define variable <steps>
  type numeric
  value <0>
  display <Steps: !>
end define
";

    fn session() -> Session<BufferHost> {
        let model = load_str(GAME).unwrap();
        let config = EngineConfig::default().with_echo_commands(false);
        Session::with_model(model, config, BufferHost::new())
    }

    #[test]
    fn repl_plays_until_input_ends() {
        let editor = ReaderEditor::new(Cursor::new("east\n\nwest\n"));
        let mut repl = Repl::with_editor(session(), editor);
        repl.run().unwrap();

        assert_eq!(repl.editor().history(), ["east", "west"]);
        assert_eq!(repl.session().engine().state().location(), "porch");
        let out = repl.session.engine_mut().host_mut().take_output();
        assert!(out.starts_with("|bLittle Walk, v2 | Sam|xb\n\nA creaky porch.\n"));
        assert!(out.contains("A sunny garden.\n"));
    }

    #[test]
    fn status_shown_once_until_it_changes() {
        let editor = ReaderEditor::new(Cursor::new("look\nlook\n"));
        let mut repl = Repl::with_editor(session(), editor).without_banner();
        repl.run().unwrap();
        let out = repl.session.engine_mut().host_mut().take_output();
        assert_eq!(out.matches("[Steps: 0]").count(), 1);
    }

    #[test]
    fn quit_ends_the_loop() {
        let editor = ReaderEditor::new(Cursor::new("quit\neast\n"));
        let mut repl = Repl::with_editor(session(), editor).without_banner();
        repl.run().unwrap();
        assert_eq!(repl.editor().history(), ["quit"]);
        assert_eq!(repl.session().engine().state().location(), "porch");
    }

    #[test]
    fn batch_writes_plain_text() {
        let mut out = Vec::new();
        run_batch(session(), Cursor::new("east\nlook\n"), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "A creaky porch.\nA sunny garden.\nA sunny garden.\n");
    }
}
