//! Load-time substitution of `#var#` and `%var%` markers.
//!
//! Property lists are expanded before any runtime state exists, so only the
//! initial `value` of each `define variable` block is visible here. Unlike
//! the runtime evaluator, an unmatched marker is a load error.

use std::collections::HashMap;

use lantern_foundation::{Error, NameKey, Result};

use crate::lexer::{Tokens, is_param, param_contents};

/// Nesting limit for values that themselves contain markers.
const MAX_NESTING: usize = 8;

/// Initial variable values known at load time.
#[derive(Clone, Debug, Default)]
pub struct StaticVars {
    values: HashMap<NameKey, String>,
}

impl StaticVars {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the `value <...>` line of every `define variable` block.
    #[must_use]
    pub fn collect(lines: &[String]) -> Self {
        let mut vars = Self::new();
        let mut current: Option<String> = None;

        for line in lines {
            let mut tokens = Tokens::new(line);
            match tokens.next_text() {
                "define" => {
                    current = if tokens.next_text() == "variable" {
                        Some(param_contents(tokens.next_text()).trim().to_string())
                    } else {
                        None
                    };
                }
                "end" => current = None,
                "value" => {
                    if let Some(name) = &current {
                        let value = tokens.next_text();
                        if is_param(value) {
                            vars.insert(name.clone(), param_contents(value));
                        }
                    }
                }
                _ => {}
            }
        }
        vars
    }

    /// Sets a variable's value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(NameKey::new(name), value.into());
    }

    /// Looks up a variable by name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(NameKey::normalize(name).as_str())
            .map(String::as_str)
    }

    /// Substitutes every marker in `text`.
    ///
    /// Unknown variables substitute as empty text.
    ///
    /// # Errors
    ///
    /// Returns an error if a `#` or `%` has no closing partner.
    pub fn eval(&self, text: &str) -> Result<String> {
        self.eval_nested(text, 0)
    }

    fn eval_nested(&self, text: &str, depth: usize) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(pos) = rest.find(['#', '%']) {
            out.push_str(&rest[..pos]);
            let delimiter = char::from(rest.as_bytes()[pos]);
            let after = &rest[pos + 1..];
            let close = after
                .find(delimiter)
                .ok_or_else(|| Error::unmatched_delimiter(delimiter, text))?;
            let name = &after[..close];

            if name.is_empty() {
                out.push(delimiter);
            } else {
                let value = self.get(name).unwrap_or_else(|| {
                    log::warn!(target: "lantern::load", "unknown variable '{name}' in '{text}'");
                    ""
                });
                if depth < MAX_NESTING && value.contains(['#', '%']) {
                    out.push_str(&self.eval_nested(value, depth + 1)?);
                } else {
                    out.push_str(value);
                }
            }
            rest = &after[close + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use lantern_foundation::ErrorKind;

    use super::*;

    fn vars() -> StaticVars {
        let lines: Vec<String> = [
            "define variable <weight>",
            "type numeric",
            "value <3>",
            "end define",
            "define variable <Colour>",
            "value <red>",
            "end define",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        StaticVars::collect(&lines)
    }

    #[test]
    fn collects_values() {
        let vars = vars();
        assert_eq!(vars.get("weight"), Some("3"));
        assert_eq!(vars.get("colour"), Some("red"));
        assert_eq!(vars.get("missing"), None);
    }

    #[test]
    fn substitutes_both_markers() {
        let text = vars().eval("heavy=%weight%; tint=#colour#").expect("balanced markers");
        assert_eq!(text, "heavy=3; tint=red");
    }

    #[test]
    fn doubled_marker_is_literal() {
        assert_eq!(vars().eval("100%% sure").expect("balanced"), "100% sure");
    }

    #[test]
    fn nested_values_are_expanded() {
        let mut vars = vars();
        vars.insert("label", "#colour# box");
        assert_eq!(vars.eval("#label#").expect("balanced"), "red box");
    }

    #[test]
    fn unmatched_marker_is_fatal() {
        let err = vars().eval("weight=%weight").expect_err("no closing %");
        assert!(matches!(err.kind, ErrorKind::UnmatchedDelimiter { delimiter: '%', .. }));
    }
}
