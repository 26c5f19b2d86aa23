//! Text substitution, integer expressions, and conditions.
//!
//! Substitution markers:
//! - `#name#` - a string variable; `#@name#` shows the object it names
//! - `#obj:prop#` and `#(var):prop#` - an object property
//! - `%name%` - a numeric variable
//! - `$name$` and `$name(a, b)$` - a function call
//!
//! `##` and `%%` produce a literal `#` and `%`.

use lantern_foundation::ci_eq;
use lantern_language::{Tokens, is_param, param_contents, split_f_args, split_param, trim_braces};

use crate::engine::{Engine, parse_int};
use crate::host::Host;

impl<H: Host> Engine<H> {
    // -------------------------------------------------------------------------
    // Substitution
    // -------------------------------------------------------------------------

    /// Expands every substitution marker in `text`.
    ///
    /// Malformed markers are reported; the text up to the marker is kept.
    pub fn eval_string(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find(['#', '%', '$']) {
            out.push_str(&rest[..pos]);
            let delim = rest.as_bytes()[pos];
            let after = &rest[pos + 1..];
            let Some(close) = after.find(char::from(delim)) else {
                if delim == b'$' {
                    self.diagnostic(format!("unmatched '$' in '{text}'"));
                    out.push_str(&rest[pos..]);
                } else {
                    self.diagnostic(format!("unmatched '{}' in '{text}'", char::from(delim)));
                }
                return out;
            };
            let inner = &after[..close];
            match delim {
                b'#' => {
                    if !self.substitute_string(inner, text, &mut out) {
                        return out;
                    }
                }
                b'%' => {
                    if inner.is_empty() {
                        out.push('%');
                    } else {
                        let value = self.get_ivar(inner);
                        out.push_str(&value.to_string());
                    }
                }
                _ => {
                    let call = self.eval_string(inner);
                    let value = self.eval_function_call(&call);
                    out.push_str(&value);
                }
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Expands one `#...#` marker. Returns false if the text is malformed.
    fn substitute_string(&mut self, inner: &str, text: &str, out: &mut String) -> bool {
        if inner.is_empty() {
            out.push('#');
        } else if let Some(var) = inner.strip_prefix('@') {
            let obj = self.get_svar(var);
            let name = self.displayed_name(&obj);
            out.push_str(&name);
        } else if let Some((obj, prop)) = inner.split_once(':') {
            let obj = if let Some(var) = obj.strip_prefix('(') {
                let Some(var) = var.strip_suffix(')') else {
                    self.diagnostic(format!("missing ')' in '{text}'"));
                    return false;
                };
                self.get_svar(var)
            } else {
                obj.to_string()
            };
            match self.obj_property(&obj, prop) {
                Some(value) => out.push_str(&value),
                None => self.diagnostic(format!("object '{obj}' has no property '{prop}'")),
            }
        } else {
            let value = self.get_svar(inner);
            out.push_str(&value);
        }
        true
    }

    /// Calls `name` or `name(args)` as written inside `$...$`.
    fn eval_function_call(&mut self, call: &str) -> String {
        let Some(open) = call.find('(') else {
            return self.call_function(call.trim(), None);
        };
        let Some(close) = call[open..].find(')') else {
            self.diagnostic(format!("missing ')' in function call '{call}'"));
            return String::new();
        };
        let args = split_f_args(&call[open + 1..open + close]);
        self.call_function(call[..open].trim(), Some(args))
    }

    /// Expands the contents of a `<...>` parameter.
    pub(crate) fn eval_param(&mut self, tok: &str) -> String {
        self.eval_string(param_contents(tok))
    }

    // -------------------------------------------------------------------------
    // Integer Expressions
    // -------------------------------------------------------------------------

    /// Evaluates an integer expression over `+ - * /` and parentheses.
    ///
    /// Operands that are not numbers read as 0. Division by zero yields 0.
    pub fn eval_int(&mut self, text: &str) -> i32 {
        let tokens = lex_arith(text);
        let mut parser = ArithParser {
            tokens: &tokens,
            pos: 0,
            problems: Vec::new(),
        };
        let value = parser.expression(0);
        if parser.pos < tokens.len() {
            parser.problems.push(format!("trailing text in expression '{text}'"));
        }
        for problem in parser.problems {
            self.diagnostic(problem);
        }
        value
    }

    // -------------------------------------------------------------------------
    // Conditions
    // -------------------------------------------------------------------------

    /// Evaluates a compound condition such as `got <lamp> and not here <troll>`.
    ///
    /// The first clause is evaluated, then the rest of the text after the
    /// first `and` (or, failing that, the first `or`) is evaluated as a
    /// condition of its own. Evaluation runs left to right and stops as soon
    /// as the result is known, so `a or b and c` reads as `a and c`. An empty
    /// condition holds.
    pub fn eval_conds(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return true;
        }
        let first = self.eval_cond(text);

        let rest_after = |word: &str| {
            Tokens::new(text)
                .find(|t| t.text == word)
                .map(|t| &text[t.end..])
        };
        if let Some(rest) = rest_after("and") {
            first && self.eval_conds(rest)
        } else if let Some(rest) = rest_after("or") {
            first || self.eval_conds(rest)
        } else {
            first
        }
    }

    /// Evaluates the leading clause of `text`. Any number of `not`s may
    /// precede it.
    pub(crate) fn eval_cond(&mut self, text: &str) -> bool {
        let mut tokens = Tokens::new(text);
        let mut keyword = tokens.next_text();
        let mut negated = false;
        while keyword == "not" {
            negated = !negated;
            keyword = tokens.next_text();
        }
        let param = tokens.next_text();
        self.eval_clause(keyword, param, text) != negated
    }

    fn eval_clause(&mut self, keyword: &str, param: &str, text: &str) -> bool {
        match keyword {
            "action" | "property" | "type" => {
                let Some((obj, name)) = self.two_fields(param, keyword, text) else {
                    return false;
                };
                match keyword {
                    "action" => self.obj_action(&obj, &name).is_some(),
                    "property" => self.has_property(&obj, &name),
                    _ => self.model.obj_of_type(&obj, &name),
                }
            }
            "ask" => {
                let Some(question) = self.cond_param(param, keyword, text) else {
                    return false;
                };
                self.host.ask_yes_no(&question)
            }
            "exists" | "real" => {
                let Some(contents) = self.cond_param(param, keyword, text) else {
                    return false;
                };
                let (name, report) = self.object_query(&contents, keyword);
                let placed = self.state.object(&name).map(|record| !record.parent.is_empty());
                match placed {
                    Some(placed) => keyword == "real" || placed,
                    None => {
                        if report {
                            self.diagnostic(format!("{keyword} '{name}' failed: no such object"));
                        }
                        false
                    }
                }
            }
            "flag" => {
                let Some(flag) = self.cond_param(param, keyword, text) else {
                    return false;
                };
                self.has_property("game", flag.trim())
            }
            "got" => {
                let Some(obj) = self.cond_param(param, keyword, text) else {
                    return false;
                };
                self.state
                    .parent_of(&obj)
                    .is_some_and(|parent| ci_eq(parent, "inventory"))
            }
            "here" => {
                let Some(obj) = self.cond_param(param, keyword, text) else {
                    return false;
                };
                let location = self.state.location().to_string();
                self.state
                    .parent_of(&obj)
                    .is_some_and(|parent| ci_eq(parent, &location))
            }
            "is" => {
                let Some(comparison) = self.cond_param(param, keyword, text) else {
                    return false;
                };
                self.eval_comparison(&comparison)
            }
            _ => {
                self.diagnostic(format!("bad condition '{text}'"));
                false
            }
        }
    }

    /// Splits `<name; report>` into the object name and whether a missing
    /// object should be reported.
    fn object_query(&mut self, contents: &str, keyword: &str) -> (String, bool) {
        let mut fields = split_param(contents).into_iter();
        let name = fields.next().unwrap_or_default();
        let mut report = false;
        for modifier in fields {
            if modifier == "report" {
                report = true;
            } else {
                self.diagnostic(format!("unknown modifier '{modifier}' after {keyword}"));
            }
        }
        (name, report)
    }

    fn cond_param(&mut self, param: &str, keyword: &str, text: &str) -> Option<String> {
        if is_param(param) {
            Some(self.eval_param(param))
        } else {
            self.diagnostic(format!("expected parameter after '{keyword}' in '{text}'"));
            None
        }
    }

    fn two_fields(&mut self, param: &str, keyword: &str, text: &str) -> Option<(String, String)> {
        let contents = self.cond_param(param, keyword, text)?;
        match contents.split_once(';') {
            Some((obj, name)) => Some((obj.trim().to_string(), name.trim().to_string())),
            None => {
                self.diagnostic(format!("expected '<object;name>' after '{keyword}' in '{text}'"));
                None
            }
        }
    }

    /// Evaluates the inside of an `is <...>` condition.
    fn eval_comparison(&mut self, text: &str) -> bool {
        const ORDERED: [&str; 5] = [";!=;", ";lt=;", ";gt=;", ";lt;", ";gt;"];
        for op in ORDERED {
            let Some((lhs, rhs)) = text.split_once(op) else {
                continue;
            };
            let lhs = trim_braces(lhs.trim());
            let rhs = trim_braces(rhs.trim());
            if op == ";!=;" {
                return !ci_eq(lhs, rhs);
            }
            let (a, b) = (self.eval_int(lhs), self.eval_int(rhs));
            return match op {
                ";lt=;" => a <= b,
                ";gt=;" => a >= b,
                ";lt;" => a < b,
                _ => a > b,
            };
        }
        let fields = split_param(text);
        match fields.as_slice() {
            [lhs, rhs] => ci_eq(trim_braces(lhs), trim_braces(rhs)),
            _ => {
                self.diagnostic(format!("bad comparison '{text}'"));
                false
            }
        }
    }

    /// Parses a number, falling back to expression evaluation.
    pub(crate) fn int_value(&mut self, text: &str) -> i32 {
        let trimmed = text.trim();
        if trimmed.parse::<i32>().is_ok() {
            parse_int(trimmed)
        } else {
            self.eval_int(trimmed)
        }
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArithToken {
    Num(i32),
    Op(char),
    Open,
    Close,
    Junk,
}

fn lex_arith(text: &str) -> Vec<ArithToken> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() {
            let mut n: i32 = 0;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                n = n.saturating_mul(10).saturating_add(d.try_into().unwrap_or(0));
                chars.next();
            }
            tokens.push(ArithToken::Num(n));
        } else {
            chars.next();
            tokens.push(match c {
                '+' | '-' | '*' | '/' => ArithToken::Op(c),
                '(' => ArithToken::Open,
                ')' => ArithToken::Close,
                _ => ArithToken::Junk,
            });
        }
    }
    tokens
}

struct ArithParser<'a> {
    tokens: &'a [ArithToken],
    pos: usize,
    problems: Vec<String>,
}

impl ArithParser<'_> {
    fn precedence(op: char) -> u8 {
        if matches!(op, '*' | '/') { 2 } else { 1 }
    }

    /// Precedence climbing; `min` is the lowest operator precedence taken.
    fn expression(&mut self, min: u8) -> i32 {
        let mut lhs = self.operand();
        while let Some(&ArithToken::Op(op)) = self.tokens.get(self.pos) {
            let prec = Self::precedence(op);
            if prec < min {
                break;
            }
            self.pos += 1;
            let rhs = self.expression(prec + 1);
            lhs = match op {
                '+' => lhs.wrapping_add(rhs),
                '-' => lhs.wrapping_sub(rhs),
                '*' => lhs.wrapping_mul(rhs),
                _ => {
                    if rhs == 0 {
                        self.problems.push("division by zero".to_string());
                        0
                    } else {
                        lhs.wrapping_div(rhs)
                    }
                }
            };
        }
        lhs
    }

    fn operand(&mut self) -> i32 {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        match token {
            Some(ArithToken::Num(n)) => n,
            Some(ArithToken::Op('-')) => self.operand().wrapping_neg(),
            Some(ArithToken::Op('+')) => self.operand(),
            Some(ArithToken::Open) => {
                let value = self.expression(0);
                if self.tokens.get(self.pos) == Some(&ArithToken::Close) {
                    self.pos += 1;
                } else {
                    self.problems.push("missing ')' in expression".to_string());
                }
                value
            }
            Some(ArithToken::Junk) => {
                self.problems.push("non-numeric operand in expression".to_string());
                0
            }
            _ => {
                self.pos -= 1;
                self.problems.push("missing operand in expression".to_string());
                0
            }
        }
    }
}
