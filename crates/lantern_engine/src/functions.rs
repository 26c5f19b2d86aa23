//! Built-in and user-defined functions called with `$name(args)$`.
//!
//! Built-in names are matched case-insensitively and shadow user
//! functions. Arguments arrive already substituted.

use std::sync::Arc;

use lantern_foundation::ci_eq;
use rand::Rng;

use crate::engine::{Engine, parse_int};
use crate::host::Host;
use crate::interp::{CallFrame, Task};

/// Names of the built-in functions.
pub const BUILTIN_FUNCTIONS: [&str; 21] = [
    "capfirst",
    "displayname",
    "getobjectname",
    "instr",
    "lcase",
    "left",
    "lengthof",
    "loadmethod",
    "locationof",
    "mid",
    "numberparameters",
    "objectproperty",
    "parameter",
    "rand",
    "right",
    "speechenabled",
    "symbol",
    "thisobject",
    "timerstate",
    "ubound",
    "ucase",
];

impl<H: Host> Engine<H> {
    /// Calls a function by name.
    ///
    /// With `None` the callee sees the caller's arguments. Unknown
    /// functions and bad argument counts are reported and yield `""`.
    pub fn call_function(&mut self, name: &str, args: Option<Vec<String>>) -> String {
        let lname = name.to_lowercase();
        if lname == "parameter" {
            return self.parameter(args.as_deref().unwrap_or_default());
        }
        if let Some(args) = &args {
            for (i, arg) in args.iter().enumerate() {
                self.set_svar(&format!("quest.function.parameter.{}", i + 1), arg.clone());
            }
        }
        let args = args.unwrap_or_else(|| self.current_args().to_vec());
        if let Some(value) = self.builtin(&lname, &args) {
            return value;
        }
        self.user_function(name, args)
    }

    /// Arguments of the innermost call.
    pub(crate) fn current_args(&self) -> &[String] {
        self.frames.last().map_or(&[][..], |frame| frame.args.as_slice())
    }

    fn parameter(&mut self, args: &[String]) -> String {
        let [index] = args else {
            self.diagnostic("parameter takes one argument");
            return String::new();
        };
        let index = parse_int(index);
        let value = usize::try_from(index)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| self.current_args().get(n).cloned());
        value.unwrap_or_else(|| {
            self.diagnostic(format!("no parameter {index} in this call"));
            String::new()
        })
    }

    fn user_function(&mut self, name: &str, args: Vec<String>) -> String {
        let model = Arc::clone(&self.model);
        let Some(block) = model.find_by_name("function", name) else {
            self.diagnostic(format!("no function '{name}'"));
            return String::new();
        };
        if self.frames.len() >= self.config.max_call_depth {
            self.diagnostic(format!("function '{name}' nested too deeply; call skipped"));
            return String::new();
        }
        self.frames.push(CallFrame::new(args));
        let body = block.lines.iter().rev().map(|line| Task::Run(line.clone())).collect();
        self.execute(body);
        self.frames.pop().map(|frame| frame.return_value).unwrap_or_default()
    }

    /// Runs a built-in, or returns `None` if `name` is not one.
    fn builtin(&mut self, name: &str, args: &[String]) -> Option<String> {
        let value = match (name, args) {
            ("getobjectname", [obj]) => {
                let location = self.state.location().to_string();
                self.find_object(obj, &[location, "inventory".to_string()], false)
            }
            ("getobjectname", [obj, place]) => self.find_object(obj, &[place.clone()], false),
            ("getobjectname", [obj, place, _]) => self.find_object(obj, &[place.clone()], true),
            ("loadmethod", []) => "normal".to_string(),
            ("locationof", [obj]) => self.parent_of(obj),
            ("objectproperty", [obj, prop]) => self.obj_property(obj, prop).unwrap_or_default(),
            ("timerstate", [timer]) => match self.state.timer(timer) {
                Some(t) if t.running => "1".to_string(),
                Some(_) => "0".to_string(),
                None => {
                    self.diagnostic(format!("no timer '{timer}'"));
                    "!".to_string()
                }
            },
            ("displayname", [obj]) => self.displayed_name(obj),
            ("thisobject", []) => self.this_object.clone(),
            ("ubound", [var]) => self
                .state
                .upper_bound(var)
                .map(|n| n.to_string())
                .unwrap_or_default(),
            ("capfirst", [text]) => crate::messages::capitalize(text),
            ("instr", [haystack, needle]) => instr(haystack, needle, 0),
            ("instr", [start, haystack, needle]) => {
                let start = usize::try_from(parse_int(start)).unwrap_or(0);
                instr(haystack, needle, start)
            }
            ("lcase", [text]) => text.to_lowercase(),
            ("ucase", [text]) => text.to_uppercase(),
            ("left", [text, n]) => {
                let n = usize::try_from(parse_int(n)).unwrap_or(0);
                text.chars().take(n).collect()
            }
            ("right", [text, n]) => {
                let n = usize::try_from(parse_int(n)).unwrap_or(0);
                let len = text.chars().count();
                text.chars().skip(len.saturating_sub(n)).collect()
            }
            ("mid", [text, start, n]) => {
                let start = usize::try_from(parse_int(start)).unwrap_or(0);
                let n = usize::try_from(parse_int(n)).unwrap_or(0);
                text.chars().skip(start).take(n).collect()
            }
            ("lengthof", [text]) => text.chars().count().to_string(),
            ("rand", [lo, hi]) => {
                let (lo, hi) = (parse_int(lo), parse_int(hi));
                if lo > hi {
                    lo.to_string()
                } else {
                    self.rng.gen_range(lo..=hi).to_string()
                }
            }
            ("speechenabled", []) => "0".to_string(),
            ("symbol", [which]) => match which.as_str() {
                "gt" => ">".to_string(),
                "lt" => "<".to_string(),
                _ => {
                    self.diagnostic(format!("unknown symbol '{which}'"));
                    String::new()
                }
            },
            ("numberparameters", []) => self.current_args().len().to_string(),
            _ => {
                if BUILTIN_FUNCTIONS.iter().any(|b| ci_eq(b, name)) {
                    self.diagnostic(format!(
                        "wrong number of arguments ({}) to '{name}'",
                        args.len()
                    ));
                    String::new()
                } else {
                    return None;
                }
            }
        };
        Some(value)
    }
}

/// Character index of `needle` in `haystack` at or after `start`, or -1.
fn instr(haystack: &str, needle: &str, start: usize) -> String {
    if start > haystack.chars().count() {
        return "-1".to_string();
    }
    let offset = haystack
        .char_indices()
        .nth(start)
        .map_or(haystack.len(), |(i, _)| i);
    match haystack[offset..].find(needle) {
        Some(found) => (start + haystack[offset..offset + found].chars().count()).to_string(),
        None => "-1".to_string(),
    }
}
