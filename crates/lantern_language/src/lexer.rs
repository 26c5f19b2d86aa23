//! Line tokenizer for game definition text.
//!
//! Every statement in a game file is a single line. The lexer splits a line
//! into whitespace-delimited tokens with a few atomic forms:
//!
//! - `{` and `}` are tokens on their own
//! - `<...>` parameters are taken verbatim up to the closing `>`
//! - `(...)` runs are depth-balanced when parenthesis awareness is requested
//!
//! The lexer never fails. Malformed input (an unterminated `<`, say) comes
//! back as-is and the caller decides what it means.

/// A token and its byte range within the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'src> {
    /// The token text.
    pub text: &'src str,
    /// Byte offset where the token starts.
    pub start: usize,
    /// Byte offset just past the token.
    pub end: usize,
}

impl<'src> Token<'src> {
    /// Returns true if this is the end-of-line token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns true if this token is a `<...>` parameter.
    #[must_use]
    pub fn is_param(&self) -> bool {
        is_param(self.text)
    }
}

/// Returns the next token at or after `cursor`.
///
/// When the line is exhausted the returned token is empty and both offsets
/// sit at the end of the line.
#[must_use]
pub fn next_token(line: &str, cursor: usize) -> Token<'_> {
    next_token_with(line, cursor, false)
}

/// Returns the next token, optionally treating `(...)` runs as one token.
#[must_use]
pub fn next_token_with(line: &str, cursor: usize, parens: bool) -> Token<'_> {
    let bytes = line.as_bytes();
    let mut start = cursor.min(bytes.len());
    while start < bytes.len() && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    if start >= bytes.len() {
        return Token {
            text: "",
            start: bytes.len(),
            end: bytes.len(),
        };
    }

    let mut end = start + 1;
    match bytes[start] {
        b'{' | b'}' => {}
        b'<' => {
            while end < bytes.len() && bytes[end] != b'>' {
                end += 1;
            }
            if end < bytes.len() {
                end += 1;
            }
        }
        b'(' if parens => {
            let mut depth = 1usize;
            while end < bytes.len() && depth > 0 {
                match bytes[end] {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    _ => {}
                }
                end += 1;
            }
        }
        _ => {
            while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
                end += 1;
            }
        }
    }

    Token {
        text: &line[start..end],
        start,
        end,
    }
}

/// Returns the first token of a line.
#[must_use]
pub fn first_token(line: &str) -> &str {
    next_token(line, 0).text
}

/// Iterator over the tokens of a line.
///
/// Besides yielding tokens it remembers how far it has read, so callers can
/// take the untokenized remainder of a statement with [`Tokens::rest`].
#[derive(Clone, Debug)]
pub struct Tokens<'src> {
    line: &'src str,
    cursor: usize,
    parens: bool,
}

impl<'src> Tokens<'src> {
    /// Creates a tokenizer over `line`.
    #[must_use]
    pub fn new(line: &'src str) -> Self {
        Self {
            line,
            cursor: 0,
            parens: false,
        }
    }

    /// Creates a tokenizer that keeps `(...)` runs together.
    #[must_use]
    pub fn with_parens(line: &'src str) -> Self {
        Self {
            line,
            cursor: 0,
            parens: true,
        }
    }

    /// Returns the next token, or an empty token at end of line.
    pub fn next_token(&mut self) -> Token<'src> {
        let token = next_token_with(self.line, self.cursor, self.parens);
        self.cursor = token.end;
        token
    }

    /// Returns the next token's text, or `""` at end of line.
    pub fn next_text(&mut self) -> &'src str {
        self.next_token().text
    }

    /// Returns the next token without consuming it.
    #[must_use]
    pub fn peek(&self) -> Token<'src> {
        next_token_with(self.line, self.cursor, self.parens)
    }

    /// Returns the byte offset just past the last token read.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the unread remainder of the line, trimmed.
    #[must_use]
    pub fn rest(&self) -> &'src str {
        self.line[self.cursor..].trim()
    }

    /// Returns the line being tokenized.
    #[must_use]
    pub const fn line(&self) -> &'src str {
        self.line
    }
}

impl<'src> Iterator for Tokens<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.is_empty() { None } else { Some(token) }
    }
}

/// Returns true if `tok` is a complete `<...>` parameter.
#[must_use]
pub fn is_param(tok: &str) -> bool {
    tok.len() >= 2 && tok.starts_with('<') && tok.ends_with('>')
}

/// Strips the angle brackets from a parameter token.
///
/// Text that is not a parameter is returned unchanged.
#[must_use]
pub fn param_contents(tok: &str) -> &str {
    if is_param(tok) {
        &tok[1..tok.len() - 1]
    } else {
        tok
    }
}

/// Splits a parameter body on `;`, trimming every field.
#[must_use]
pub fn split_param(contents: &str) -> Vec<String> {
    contents.split(';').map(|s| s.trim().to_string()).collect()
}

/// Splits a function argument list on `,`, trimming every argument.
///
/// An empty list yields no arguments.
#[must_use]
pub fn split_f_args(args: &str) -> Vec<String> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    args.split(',').map(|s| s.trim().to_string()).collect()
}

/// Removes one enclosing pair of square brackets.
#[must_use]
pub fn trim_braces(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('[') && s.ends_with(']') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Wraps text in angle brackets.
#[must_use]
pub fn make_param(contents: &str) -> String {
    format!("<{contents}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<&str> {
        Tokens::new(line).map(|t| t.text).collect()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(texts("  msg   hello\tworld "), vec!["msg", "hello", "world"]);
    }

    #[test]
    fn params_are_atomic() {
        assert_eq!(
            texts("move <brass key; inventory> now"),
            vec!["move", "<brass key; inventory>", "now"]
        );
    }

    #[test]
    fn unterminated_param_runs_to_end() {
        assert_eq!(texts("msg <oops no close"), vec!["msg", "<oops no close"]);
    }

    #[test]
    fn braces_stand_alone() {
        assert_eq!(texts("if x then { msg <a> }"), vec![
            "if", "x", "then", "{", "msg", "<a>", "}"
        ]);
    }

    #[test]
    fn parens_balance_when_requested() {
        let tokens: Vec<_> = Tokens::with_parens("if (a = (b)) then x")
            .map(|t| t.text)
            .collect();
        assert_eq!(tokens, vec!["if", "(a = (b))", "then", "x"]);

        let plain = texts("if (a = b) then");
        assert_eq!(plain, vec!["if", "(a", "=", "b)", "then"]);
    }

    #[test]
    fn exhausted_line_returns_empty_at_end() {
        let tok = next_token("abc  ", 3);
        assert!(tok.is_empty());
        assert_eq!(tok.start, 5);
        assert_eq!(tok.end, 5);
    }

    #[test]
    fn rest_returns_unread_text() {
        let mut tokens = Tokens::new("beforeturn override msg <hi>");
        assert_eq!(tokens.next_text(), "beforeturn");
        assert_eq!(tokens.rest(), "override msg <hi>");
        assert_eq!(tokens.next_text(), "override");
        assert_eq!(tokens.rest(), "msg <hi>");
    }

    #[test]
    fn param_helpers() {
        assert!(is_param("<a>"));
        assert!(is_param("<>"));
        assert!(!is_param("<"));
        assert!(!is_param("a>"));
        assert_eq!(param_contents("<lamp; table>"), "lamp; table");
        assert_eq!(split_param("lamp; table ;x"), vec!["lamp", "table", "x"]);
        assert_eq!(split_f_args("a, b ,c"), vec!["a", "b", "c"]);
        assert!(split_f_args("  ").is_empty());
        assert_eq!(trim_braces("[text]"), "text");
        assert_eq!(trim_braces("text]"), "text]");
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::{Tokens, next_token};

        proptest! {
            #[test]
            fn tokenizing_never_panics(line in "\\PC{0,60}") {
                let _ = Tokens::new(&line).count();
                let _ = Tokens::with_parens(&line).count();
            }

            #[test]
            fn cursor_only_moves_forward(line in "[a-z <>(){};]{0,40}", cursor in 0usize..40) {
                let cursor = cursor.min(line.len());
                let tok = next_token(&line, cursor);
                prop_assert!(tok.start >= cursor);
                prop_assert!(tok.end >= tok.start);
                prop_assert!(tok.end <= line.len());
            }
        }
    }
}
