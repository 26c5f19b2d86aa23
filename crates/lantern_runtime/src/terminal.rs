//! A [`Host`] for ANSI terminals.
//!
//! Game text carries `|` style codes. They are rendered here:
//!
//! | code | effect |
//! |---|---|
//! | `|b` `|i` `|u` | bold, italic, underline on |
//! | `|xb` `|xi` `|xu` | the same off |
//! | `|cy` `|cg` `|cl` `|cr` | yellow, green, blue, red text |
//! | `|cb` | default text color |
//! | `|n` | line break |
//! | `|w` | wait for a key |
//! | `|xn` at the end | no line break after this text |
//!
//! `|s` sizes and `|j` justification are parsed and dropped. Any other
//! `|` pair is printed as it stands.

use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

use lantern_engine::{Host, HostResult};

const RESET: &str = "\x1b[0m";

/// Text style in effect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
    color: Option<&'static str>,
}

impl Style {
    fn ansi(&self) -> String {
        let mut codes = vec!["0"];
        if self.bold {
            codes.push("1");
        }
        if self.italic {
            codes.push("3");
        }
        if self.underline {
            codes.push("4");
        }
        if let Some(color) = self.color {
            codes.push(color);
        }
        format!("\x1b[{}m", codes.join(";"))
    }
}

/// One piece of rendered output.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece {
    Text(String),
    Newline,
    WaitKey,
}

/// Result of rendering a line of styled text.
#[derive(Debug)]
struct Rendered {
    pieces: Vec<Piece>,
    suppress_newline: bool,
}

fn color_code(c: char) -> Option<Option<&'static str>> {
    match c {
        'y' => Some(Some("33")),
        'g' => Some(Some("32")),
        'l' => Some(Some("34")),
        'r' => Some(Some("31")),
        'b' => Some(None),
        _ => None,
    }
}

/// Converts `|` codes to ANSI escapes, carrying style across calls.
fn render(text: &str, style: &mut Style, ansi: bool) -> Rendered {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut suppress_newline = false;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    let restyle = |current: &mut String, style: &Style| {
        if ansi {
            current.push_str(&style.ansi());
        }
    };

    while i < chars.len() {
        let c = chars[i];
        if c != '|' {
            current.push(c);
            i += 1;
            continue;
        }
        let Some(&code) = chars.get(i + 1) else {
            break;
        };
        i += 2;
        match code {
            'b' => {
                style.bold = true;
                restyle(&mut current, &*style);
            }
            'i' => {
                style.italic = true;
                restyle(&mut current, &*style);
            }
            'u' => {
                style.underline = true;
                restyle(&mut current, &*style);
            }
            'x' => {
                match chars.get(i) {
                    Some('b') => style.bold = false,
                    Some('i') => style.italic = false,
                    Some('u') => style.underline = false,
                    Some('n') if i + 1 == chars.len() => suppress_newline = true,
                    _ => {}
                }
                i += 1;
                restyle(&mut current, &*style);
            }
            'c' => match chars.get(i).copied().and_then(color_code) {
                Some(color) => {
                    style.color = color;
                    i += 1;
                    restyle(&mut current, &*style);
                }
                None => log::debug!(target: "lantern::runtime", "ignoring screen clear in text"),
            },
            's' => {
                let digits = chars[i..].iter().take(2).take_while(|c| c.is_ascii_digit()).count();
                i += digits;
            }
            'j' => {
                if matches!(chars.get(i), Some('l' | 'c' | 'r')) {
                    i += 1;
                }
            }
            'n' => {
                pieces.push(Piece::Text(std::mem::take(&mut current)));
                pieces.push(Piece::Newline);
            }
            'w' => {
                pieces.push(Piece::Text(std::mem::take(&mut current)));
                pieces.push(Piece::WaitKey);
            }
            other => {
                current.push('|');
                current.push(other);
            }
        }
    }
    pieces.push(Piece::Text(current));
    pieces.retain(|p| !matches!(p, Piece::Text(t) if t.is_empty()));
    Rendered {
        pieces,
        suppress_newline,
    }
}

/// Strips `|` codes, keeping line breaks.
#[must_use]
pub fn plain_text(text: &str) -> String {
    let mut style = Style::default();
    render(text, &mut style, false)
        .pieces
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Text(t) => Some(t),
            Piece::Newline => Some("\n".to_string()),
            Piece::WaitKey => None,
        })
        .collect()
}

/// A host that writes to a terminal and reads answers from a line reader.
pub struct TerminalHost<R: BufRead, W: Write> {
    input: R,
    output: W,
    style: Style,
    ansi: bool,
    show_diagnostics: bool,
    swallow_newline: bool,
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
    /// Creates a host with ANSI styling on.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            style: Style::default(),
            ansi: true,
            show_diagnostics: false,
            swallow_newline: false,
        }
    }

    /// Turns ANSI styling on or off.
    #[must_use]
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Echoes script diagnostics to the output.
    #[must_use]
    pub fn with_diagnostics(mut self, show: bool) -> Self {
        self.show_diagnostics = show;
        self
    }

    /// Returns the output sink.
    pub fn output(&self) -> &W {
        &self.output
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.output.write_all(text.as_bytes()) {
            log::error!(target: "lantern::runtime", "write failed: {e}");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.output.flush() {
            log::error!(target: "lantern::runtime", "flush failed: {e}");
        }
    }

    fn read_answer(&mut self) -> Option<String> {
        self.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                log::error!(target: "lantern::runtime", "read failed: {e}");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> Host for TerminalHost<R, W> {
    fn print_text(&mut self, text: &str) {
        let rendered = render(text, &mut self.style, self.ansi);
        for piece in rendered.pieces {
            match piece {
                Piece::Text(t) => self.write(&t),
                Piece::Newline => self.write("\n"),
                Piece::WaitKey => {
                    self.wait_keypress("");
                }
            }
        }
        self.swallow_newline = rendered.suppress_newline;
    }

    fn print_newline(&mut self) {
        if std::mem::take(&mut self.swallow_newline) {
            return;
        }
        if self.ansi && self.style != Style::default() {
            self.write(RESET);
            self.write("\n");
            let style = self.style.ansi();
            self.write(&style);
        } else {
            self.write("\n");
        }
    }

    fn get_line(&mut self) -> String {
        self.read_answer().unwrap_or_default()
    }

    fn offer_choice(&mut self, prompt: &str, options: &[String]) -> usize {
        let prompt = plain_text(prompt);
        self.write(&format!("{prompt}\n"));
        for (i, option) in options.iter().enumerate() {
            let option = plain_text(option);
            self.write(&format!("  {}: {option}\n", i + 1));
        }
        loop {
            self.write("? ");
            let Some(answer) = self.read_answer() else {
                return 0;
            };
            match answer.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return n - 1,
                _ => self.write(&format!("Please enter a number from 1 to {}.\n", options.len())),
            }
        }
    }

    fn ask_yes_no(&mut self, prompt: &str) -> bool {
        let prompt = plain_text(prompt);
        loop {
            self.write(&format!("{prompt} (y/n) "));
            let Some(answer) = self.read_answer() else {
                return false;
            };
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => {}
            }
        }
    }

    fn debug_log(&mut self, message: &str) {
        if self.show_diagnostics {
            let line = if self.ansi {
                format!("\x1b[2m[{message}]{RESET}\n")
            } else {
                format!("[{message}]\n")
            };
            self.write(&line);
        }
    }

    fn set_foreground(&mut self, color: &str) -> HostResult {
        let code = match color.trim().to_ascii_lowercase().as_str() {
            "red" => "31",
            "green" => "32",
            "yellow" => "33",
            "blue" => "34",
            "magenta" => "35",
            "cyan" => "36",
            "white" => "37",
            "black" => "30",
            _ => return HostResult::Unsupported,
        };
        if self.ansi {
            self.write(&format!("\x1b[{code}m"));
        }
        HostResult::Supported
    }

    fn clear_screen(&mut self) -> HostResult {
        if !self.ansi {
            return HostResult::Unsupported;
        }
        self.write("\x1b[2J\x1b[H");
        HostResult::Supported
    }

    fn pause(&mut self, millis: u64) -> HostResult {
        self.flush();
        thread::sleep(Duration::from_millis(millis));
        HostResult::Supported
    }

    fn wait_keypress(&mut self, prompt: &str) -> HostResult {
        let prompt = if prompt.is_empty() { "[press Enter]" } else { prompt };
        self.write(prompt);
        self.read_answer();
        HostResult::Supported
    }
}
