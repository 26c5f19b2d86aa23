//! The script interpreter.
//!
//! Statements run from an explicit work-list instead of through nested
//! calls, so procedure bodies and loops do not grow the native stack. A
//! statement that branches or loops pushes follow-up [`Task`]s; the list is
//! drained last-in first-out, which keeps source order when bodies are
//! pushed in reverse.
//!
//! Engine-level hooks such as room scripts and verb actions re-enter
//! [`Engine::run_script`]; that nesting is bounded by the configured call
//! depth.

use std::sync::Arc;

use lantern_foundation::ci_eq;
use lantern_language::{Tokens, is_param, param_contents, split_f_args, split_param, trim_braces};

use crate::engine::{Engine, parse_int};
use crate::host::Host;

/// Arguments and return slot of one procedure or function call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallFrame {
    /// Arguments passed in, already substituted.
    pub args: Vec<String>,
    /// Value set by `return`.
    pub return_value: String,
}

impl CallFrame {
    /// Creates a frame holding `args`.
    #[must_use]
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            return_value: String::new(),
        }
    }
}

/// A pending unit of interpreter work.
#[derive(Clone, Debug)]
pub(crate) enum Task {
    /// Run one statement.
    Run(String),
    /// Run a statement with `$thisobject$` set to `object`.
    RunAs { object: String, script: String },
    /// Put back the object that was current before a `RunAs`.
    RestoreObject(String),
    /// Leave a procedure call.
    PopFrame,
    /// Test a `repeat` condition and maybe run its body again.
    Repeat {
        cond: String,
        body: String,
        is_while: bool,
        count: usize,
    },
    /// Step and test a counted `for` loop.
    For {
        var: String,
        end: i32,
        step: i32,
        body: String,
        count: usize,
        first: bool,
    },
    /// Run the next iteration of a `for each object` loop.
    ForEach {
        names: Vec<String>,
        next: usize,
        body: String,
    },
}

/// Statements accepted and ignored: multimedia and multiplayer features.
const IGNORED_STATEMENTS: [&str; 17] = [
    "animate",
    "clone",
    "disconnect",
    "font",
    "helpclear",
    "helpclose",
    "helpdisplaytext",
    "helpmsg",
    "mailto",
    "modvolume",
    "msgto",
    "panes",
    "picture",
    "playmidi",
    "playmod",
    "playwav",
    "with",
];

impl<H: Host> Engine<H> {
    /// Runs a script line.
    pub fn run_script(&mut self, script: &str) {
        self.execute(vec![Task::Run(script.to_string())]);
    }

    /// Runs a script line on behalf of `object`.
    pub fn run_script_as(&mut self, object: &str, script: &str) {
        self.execute(vec![Task::RunAs {
            object: object.to_string(),
            script: script.to_string(),
        }]);
    }

    /// Drains a work-list. `tasks` is popped from the end.
    pub(crate) fn execute(&mut self, mut tasks: Vec<Task>) {
        if self.depth >= self.config.max_call_depth {
            self.diagnostic(format!(
                "scripts nested more than {} deep; script skipped",
                self.config.max_call_depth
            ));
            return;
        }
        self.depth += 1;
        while let Some(task) = tasks.pop() {
            self.step(task, &mut tasks);
        }
        self.depth -= 1;
    }

    fn step(&mut self, task: Task, tasks: &mut Vec<Task>) {
        match task {
            Task::Run(line) => self.statement(&line, tasks),
            Task::RunAs { object, script } => {
                let previous = std::mem::replace(&mut self.this_object, object);
                tasks.push(Task::RestoreObject(previous));
                tasks.push(Task::Run(script));
            }
            Task::RestoreObject(object) => self.this_object = object,
            Task::PopFrame => {
                if self.frames.len() > 1 {
                    self.frames.pop();
                }
            }
            Task::Repeat {
                cond,
                body,
                is_while,
                count,
            } => {
                if self.eval_conds(&cond) != is_while {
                    return;
                }
                if count >= self.config.max_loop_iterations {
                    self.diagnostic(format!("repeat stopped after {count} iterations"));
                    return;
                }
                tasks.push(Task::Repeat {
                    cond,
                    body: body.clone(),
                    is_while,
                    count: count + 1,
                });
                tasks.push(Task::Run(body));
            }
            Task::For {
                var,
                end,
                step,
                body,
                count,
                first,
            } => {
                if !first {
                    let value = self.get_ivar(&var).wrapping_add(step);
                    self.set_ivar(&var, value);
                }
                if self.get_ivar(&var) >= end {
                    return;
                }
                if count >= self.config.max_loop_iterations {
                    self.diagnostic(format!("for loop on '{var}' stopped after {count} iterations"));
                    return;
                }
                tasks.push(Task::For {
                    var,
                    end,
                    step,
                    body: body.clone(),
                    count: count + 1,
                    first: false,
                });
                tasks.push(Task::Run(body));
            }
            Task::ForEach { names, next, body } => {
                let Some(name) = names.get(next).cloned() else {
                    return;
                };
                self.set_svar("quest.thing", name);
                tasks.push(Task::ForEach {
                    names,
                    next: next + 1,
                    body: body.clone(),
                });
                tasks.push(Task::Run(body));
            }
        }
    }

    /// Evaluates the parameter following a statement keyword.
    fn expect_param(&mut self, tokens: &mut Tokens<'_>, keyword: &str) -> Option<String> {
        let tok = tokens.next_text();
        if is_param(tok) {
            Some(self.eval_param(tok))
        } else {
            self.diagnostic(format!(
                "expected parameter after {keyword} in '{}'",
                tokens.line()
            ));
            None
        }
    }

    /// Evaluates a `<a; b>` parameter and splits it at the first `;`.
    fn expect_pair(&mut self, tokens: &mut Tokens<'_>, keyword: &str) -> Option<(String, String)> {
        let value = self.expect_param(tokens, keyword)?;
        match value.split_once(';') {
            Some((a, b)) => Some((a.trim().to_string(), b.trim().to_string())),
            None => {
                self.diagnostic(format!("no ';' in parameter of '{}'", tokens.line()));
                None
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn statement(&mut self, line: &str, tasks: &mut Vec<Task>) {
        let line = line.trim();
        let mut tokens = Tokens::new(line);
        let keyword = tokens.next_token();
        if keyword.is_empty() {
            return;
        }
        log::trace!(target: "lantern::script", "{line}");

        if keyword.text.starts_with('{') {
            let inner = &line[keyword.start + 1..];
            match inner.rfind('}') {
                Some(close) => tasks.push(Task::Run(inner[..close].to_string())),
                None => self.diagnostic(format!("unterminated brace block in '{line}'")),
            }
            return;
        }

        match keyword.text {
            "action" => {
                if let Some((obj, name)) = self.expect_pair(&mut tokens, "action") {
                    self.state.set_obj_action(&obj, &name, tokens.rest());
                }
            }
            "background" => {
                if let Some(color) = self.expect_param(&mut tokens, "background") {
                    self.host.set_background(&color);
                }
            }
            "foreground" => {
                if let Some(color) = self.expect_param(&mut tokens, "foreground") {
                    self.host.set_foreground(&color);
                }
            }
            "choose" => {
                if let Some(name) = self.expect_param(&mut tokens, "choose") {
                    self.choose(&name, tasks);
                }
            }
            "clear" => {
                self.host.clear_screen();
            }
            "create" => self.create(&mut tokens),
            "debug" => {
                if let Some(text) = self.expect_param(&mut tokens, "debug") {
                    log::debug!(target: "lantern::script", "{text}");
                    self.host.debug_log(&text);
                }
            }
            "destroy" => {
                if tokens.next_text() != "exit" {
                    self.diagnostic(format!("expected 'exit' after 'destroy' in '{line}'"));
                    return;
                }
                let Some(value) = self.expect_param(&mut tokens, "destroy exit") else {
                    return;
                };
                match split_param(&value).as_slice() {
                    [source, dest] => {
                        self.state.push_exit(source.clone(), format!("destroy exit {dest}"));
                        self.regen_var_dirs();
                    }
                    _ => self.diagnostic(format!("expected '<source;destination>' in '{line}'")),
                }
            }
            "displaytext" => {
                let tok = tokens.next_text();
                if is_param(tok) {
                    self.display_text(param_contents(tok));
                } else {
                    self.diagnostic(format!("expected parameter after displaytext in '{line}'"));
                }
            }
            "do" => {
                let Some(call) = self.expect_param(&mut tokens, "do") else {
                    return;
                };
                match call.split_once('(') {
                    Some((name, rest)) => {
                        let args = rest.find(')').map_or(rest, |close| &rest[..close]);
                        self.call_procedure(name.trim(), Some(split_f_args(args)), tasks);
                    }
                    None => self.call_procedure(call.trim(), None, tasks),
                }
            }
            "doaction" => {
                let Some((obj, act)) = self.expect_pair(&mut tokens, "doaction") else {
                    return;
                };
                match self.obj_action(&obj, &act) {
                    Some(script) => tasks.push(Task::RunAs { object: obj, script }),
                    None => self.diagnostic(format!("no action '{act}' defined for '{obj}'")),
                }
            }
            "dontprocess" => self.dont_process = true,
            "enter" => {
                if let Some(var) = self.expect_param(&mut tokens, "enter") {
                    let input = self.host.get_line();
                    self.set_svar(var.trim(), input);
                }
            }
            "exec" => {
                let Some(value) = self.expect_param(&mut tokens, "exec") else {
                    return;
                };
                let (command, normal) = match value.split_once(';') {
                    Some((command, mode)) => {
                        let normal = ci_eq(mode.trim(), "normal");
                        if !normal {
                            self.diagnostic(format!("bad mode '{}' in exec", mode.trim()));
                        }
                        (command.trim().to_string(), normal)
                    }
                    None => (value.trim().to_string(), false),
                };
                self.try_match(&command, true, normal);
            }
            "flag" => {
                let on = match tokens.next_text() {
                    "on" => true,
                    "off" => false,
                    _ => {
                        self.diagnostic(format!("expected 'on' or 'off' after flag in '{line}'"));
                        return;
                    }
                };
                if let Some(flag) = self.expect_param(&mut tokens, "flag") {
                    let prop = if on { flag } else { format!("not {flag}") };
                    self.assert_property("game", &prop);
                }
            }
            "for" => self.for_loop(&mut tokens, tasks),
            "give" => {
                if let Some(obj) = self.expect_param(&mut tokens, "give") {
                    self.move_object(&obj, "inventory");
                    self.verb_hook(&obj, "gain");
                }
            }
            "lose" => {
                if let Some(obj) = self.expect_param(&mut tokens, "lose") {
                    let carried = self
                        .state
                        .parent_of(&obj)
                        .is_some_and(|parent| ci_eq(parent, "inventory"));
                    if carried {
                        let location = self.state.location().to_string();
                        self.move_object(&obj, &location);
                        self.verb_hook(&obj, "lose");
                    }
                }
            }
            "goto" => {
                if let Some(room) = self.expect_param(&mut tokens, "goto") {
                    self.goto_room(room.trim());
                }
            }
            "hide" | "show" | "conceal" | "reveal" => {
                if let Some(obj) = self.expect_param(&mut tokens, keyword.text) {
                    let prop = match keyword.text {
                        "hide" => "hidden",
                        "show" => "not hidden",
                        "conceal" => "invisible",
                        _ => "not invisible",
                    };
                    self.assert_property(obj.trim(), prop);
                    self.regen_var_objects();
                }
            }
            "if" => self.if_statement(&mut tokens, tasks),
            "inc" | "dec" => {
                let Some(value) = self.expect_param(&mut tokens, keyword.text) else {
                    return;
                };
                let (var, diff) = match value.split_once(';') {
                    Some((var, diff)) => (var.trim().to_string(), self.eval_int(diff)),
                    None => (value.trim().to_string(), 1),
                };
                let current = self.get_ivar(&var);
                let next = if keyword.text == "dec" {
                    current.wrapping_sub(diff)
                } else {
                    current.wrapping_add(diff)
                };
                self.set_ivar(&var, next);
            }
            "move" => {
                if let Some((obj, dest)) = self.expect_pair(&mut tokens, "move") {
                    self.move_object(&obj, &dest);
                }
            }
            "msg" => {
                let tok = tokens.next_text();
                if is_param(tok) {
                    self.print_eval(param_contents(tok));
                } else {
                    self.diagnostic(format!("expected parameter after msg in '{line}'"));
                }
            }
            "outputoff" => self.outputting = false,
            "outputon" => self.outputting = true,
            "pause" => {
                if let Some(value) = self.expect_param(&mut tokens, "pause") {
                    let millis = self.eval_int(&value);
                    self.host.pause(u64::try_from(millis).unwrap_or(0));
                }
            }
            "playerlose" | "playerwin" => {
                let text = if keyword.text == "playerwin" { "win" } else { "lose" };
                self.display_text(text);
                self.state.set_running(false);
            }
            "property" => {
                if let Some(value) = self.expect_param(&mut tokens, "property") {
                    let fields = split_param(&value);
                    if let Some((obj, props)) = fields.split_first() {
                        for prop in props {
                            self.assert_property(obj, trim_braces(prop));
                        }
                    }
                }
            }
            "repeat" => self.repeat(&mut tokens, tasks),
            "return" => {
                if let Some(value) = self.expect_param(&mut tokens, "return") {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.return_value = value;
                    }
                }
            }
            "say" => {
                if let Some(text) = self.expect_param(&mut tokens, "say") {
                    self.print_formatted(&format!("\"{text}\""));
                }
            }
            "set" => self.set_statement(&mut tokens),
            "setstring" => {
                if let Some((var, value)) = self.expect_pair(&mut tokens, "setstring") {
                    self.set_svar(&var, trim_braces(&value));
                }
            }
            "setvar" => {
                if let Some((var, value)) = self.expect_pair(&mut tokens, "setvar") {
                    let value = self.eval_int(&value);
                    self.set_ivar(&var, value);
                }
            }
            "speak" => {
                if let Some(text) = self.expect_param(&mut tokens, "speak") {
                    self.host.speak(&text);
                }
            }
            "stop" => self.state.set_running(false),
            "timeron" | "timeroff" => {
                let running = keyword.text == "timeron";
                let Some(name) = self.expect_param(&mut tokens, keyword.text) else {
                    return;
                };
                match self.state.timer_mut(name.trim()) {
                    Some(timer) => {
                        if running {
                            timer.time_left = timer.interval;
                        }
                        timer.running = running;
                    }
                    None => self.diagnostic(format!("no timer '{name}'")),
                }
            }
            "wait" => {
                let prompt = if tokens.peek().is_empty() {
                    String::new()
                } else {
                    match self.expect_param(&mut tokens, "wait") {
                        Some(prompt) => prompt,
                        None => return,
                    }
                };
                self.host.wait_keypress(&prompt);
            }
            "shell" | "shellexe" | "type" => {
                log::debug!(target: "lantern::script", "ignoring '{line}'");
            }
            other if IGNORED_STATEMENTS.contains(&other) => {
                log::debug!(target: "lantern::script", "ignoring '{line}'");
            }
            _ => self.diagnostic(format!("unrecognized script '{line}'")),
        }
    }

    /// Runs an object's `gain` or `lose` action, or prints the property.
    fn verb_hook(&mut self, obj: &str, verb: &str) {
        if let Some(script) = self.obj_action(obj, verb) {
            self.run_script_as(obj, &script);
        } else if let Some(text) = self.obj_property(obj, verb) {
            self.print_formatted(&text);
        }
    }

    fn call_procedure(&mut self, name: &str, args: Option<Vec<String>>, tasks: &mut Vec<Task>) {
        let model = Arc::clone(&self.model);
        let Some(block) = model.find_by_name("procedure", name) else {
            self.diagnostic(format!("no procedure '{name}'"));
            return;
        };
        if self.frames.len() >= self.config.max_call_depth {
            self.diagnostic(format!("procedure '{name}' nested too deeply; call skipped"));
            return;
        }
        let args = args.unwrap_or_else(|| self.current_args().to_vec());
        self.frames.push(CallFrame::new(args));
        tasks.push(Task::PopFrame);
        tasks.extend(block.lines.iter().rev().map(|line| Task::Run(line.clone())));
    }

    fn choose(&mut self, name: &str, tasks: &mut Vec<Task>) {
        let model = Arc::clone(&self.model);
        let Some(block) = model.find_by_name("selection", name) else {
            self.diagnostic(format!("no selection '{name}'"));
            return;
        };
        let mut question = String::new();
        let mut choices = Vec::new();
        let mut actions = Vec::new();
        for line in &block.lines {
            let mut tokens = Tokens::new(line);
            match tokens.next_text() {
                "info" => {
                    if let Some(text) = self.expect_param(&mut tokens, "info") {
                        question = text;
                    }
                }
                "choice" => {
                    if let Some(text) = self.expect_param(&mut tokens, "choice") {
                        choices.push(text);
                        actions.push(tokens.rest().to_string());
                    }
                }
                _ => self.diagnostic(format!("bad line '{line}' in selection '{name}'")),
            }
        }
        if choices.is_empty() {
            self.diagnostic(format!("no choices in selection '{name}'"));
            return;
        }
        let picked = self.host.offer_choice(&question, &choices).min(actions.len() - 1);
        tasks.push(Task::Run(actions.swap_remove(picked)));
    }

    fn create(&mut self, tokens: &mut Tokens<'_>) {
        match tokens.next_text() {
            "exit" => {
                let mut dir = "";
                if !tokens.peek().is_param() {
                    dir = tokens.next_text();
                }
                let Some(value) = self.expect_param(tokens, "create exit") else {
                    return;
                };
                let fields = split_param(&value);
                let [source, _dest] = fields.as_slice() else {
                    self.diagnostic(format!(
                        "expected '<source;destination>' in '{}'",
                        tokens.line()
                    ));
                    return;
                };
                let record = if dir.is_empty() {
                    format!("exit <{value}>")
                } else {
                    format!("exit {dir} <{value}>")
                };
                self.state.push_exit(source.clone(), record);
                self.regen_var_dirs();
            }
            kind @ ("object" | "room") => {
                self.diagnostic(format!("creating a {kind} at run time is not supported"));
            }
            _ => self.diagnostic(format!("bad create line '{}'", tokens.line())),
        }
    }

    fn if_statement(&mut self, tokens: &mut Tokens<'_>, tasks: &mut Vec<Task>) {
        let line = tokens.line();
        let cond_start = tokens.cursor();
        let then = loop {
            let tok = tokens.next_token();
            if tok.is_empty() {
                self.diagnostic(format!("expected 'then' in '{line}'"));
                return;
            }
            if tok.text == "then" {
                break tok;
            }
        };
        let cond = &line[cond_start..then.start];

        let mut braces = 0_i32;
        let (then_end, else_branch) = loop {
            let tok = tokens.next_token();
            if tok.is_empty() {
                break (line.len(), None);
            }
            for c in tok.text.chars() {
                match c {
                    '{' => braces += 1,
                    '}' => braces -= 1,
                    _ => {}
                }
            }
            if braces == 0 && tok.text == "else" {
                break (tok.start, Some(tokens.rest()));
            }
        };

        if self.eval_conds(cond) {
            tasks.push(Task::Run(line[then.end..then_end].to_string()));
        } else if let Some(branch) = else_branch {
            tasks.push(Task::Run(branch.to_string()));
        }
    }

    fn repeat(&mut self, tokens: &mut Tokens<'_>, tasks: &mut Vec<Task>) {
        let line = tokens.line();
        let is_while = match tokens.next_text() {
            "while" => true,
            "until" => false,
            _ => {
                self.diagnostic(format!("expected 'while' or 'until' after repeat in '{line}'"));
                return;
            }
        };
        let cond_start = tokens.cursor();
        let do_token = loop {
            let tok = tokens.next_token();
            if tok.is_empty() {
                self.diagnostic(format!("no script after condition in '{line}'"));
                return;
            }
            if tok.text == "do" {
                break tok;
            }
        };
        let cond = line[cond_start..do_token.start].trim().to_string();
        let body = line[do_token.end..].trim();
        let body = if is_param(body) {
            format!("do {body}")
        } else {
            body.to_string()
        };
        tasks.push(Task::Repeat {
            cond,
            body,
            is_while,
            count: 0,
        });
    }

    fn for_loop(&mut self, tokens: &mut Tokens<'_>, tasks: &mut Vec<Task>) {
        let line = tokens.line();
        let tok = tokens.next_text();
        if tok == "each" {
            if tokens.next_text() != "object" || tokens.next_text() != "in" {
                self.diagnostic(format!("expected 'each object in' in '{line}'"));
                return;
            }
            let scope = tokens.next_text();
            let names: Vec<String> = if scope == "game" {
                self.state
                    .objects()
                    .filter(|o| self.model.declared_type_of(&o.name) == Some("object"))
                    .map(|o| o.name.clone())
                    .collect()
            } else if is_param(scope) {
                let room = self.eval_param(scope);
                let room = room.trim();
                self.state
                    .objects()
                    .filter(|o| ci_eq(&o.parent, room))
                    .map(|o| o.name.clone())
                    .collect()
            } else {
                self.diagnostic(format!("expected 'game' or a room in '{line}'"));
                return;
            };
            tasks.push(Task::ForEach {
                names,
                next: 0,
                body: tokens.rest().to_string(),
            });
            return;
        }
        if !is_param(tok) {
            self.diagnostic(format!("bad for loop '{line}'"));
            return;
        }
        let args = split_param(&self.eval_param(tok));
        let (var, start, end, step) = match args.as_slice() {
            [var, start, end] => (var, start, end, None),
            [var, start, end, step, ..] => (var, start, end, Some(step)),
            _ => {
                self.diagnostic(format!("expected '<var;start;end>' in '{line}'"));
                return;
            }
        };
        let start = self.int_value(start);
        let end = self.int_value(end);
        let step = step.map_or(1, |s| parse_int(s));
        self.set_ivar(var, start);
        tasks.push(Task::For {
            var: var.clone(),
            end,
            step,
            body: tokens.rest().to_string(),
            count: 0,
            first: true,
        });
    }

    fn set_statement(&mut self, tokens: &mut Tokens<'_>) {
        let line = tokens.line();
        let mut tok = tokens.next_text();
        if tok == "interval" {
            let Some((name, interval)) = self.expect_pair(tokens, "set interval") else {
                return;
            };
            let interval = u32::try_from(parse_int(&interval)).unwrap_or(0);
            match self.state.timer_mut(&name) {
                Some(timer) => timer.interval = interval,
                None => self.diagnostic(format!("no timer '{name}'")),
            }
            return;
        }

        let mut numeric = None;
        if ci_eq(tok, "string") || ci_eq(tok, "numeric") {
            numeric = Some(ci_eq(tok, "numeric"));
            tok = tokens.next_text();
        }
        if !is_param(tok) || !tok.contains(';') {
            self.diagnostic(format!("expected '<variable; value>' in '{line}'"));
            return;
        }
        let value = self.eval_param(tok);
        let Some((var, value)) = value.split_once(';') else {
            self.diagnostic(format!("no ';' in parameter of '{line}'"));
            return;
        };
        let var = var.trim();
        let Some(numeric) = numeric.or_else(|| {
            let base = self.state.resolve_var_ref(var).map_or(var, |(base, _)| base);
            self.state
                .var_kind(base)
                .map(|kind| kind == lantern_storage::VarKind::Numeric)
        }) else {
            self.diagnostic(format!("undefined variable '{var}' in '{line}'"));
            return;
        };
        if numeric {
            let value = self.eval_int(value);
            self.set_ivar(var, value);
        } else {
            self.set_svar(var, trim_braces(value.trim()));
        }
    }
}

#[cfg(test)]
mod tests {
    use lantern_foundation::EngineConfig;
    use lantern_language::load_str;

    use crate::host::BufferHost;

    use super::*;

    const GAME: &str = r#"
define game <Test>
  start <hall>
end define

define room <hall>
end define

define object <lamp>
  look <A lamp.>
  gain <You feel brighter.>
end define

define procedure <greet>
  msg <Hello, $parameter(1)$!>
end define

define procedure <countdown>
  for <i; 0; 3> msg <%i%>
end define

define procedure <bump>
  inc <i>
  msg <tick>
end define

define procedure <forever>
  do <forever>
end define

define selection <menu>
  info <Pick one>
  choice <Red> msg <You chose red.>
  choice <Blue> msg <You chose blue.>
end define

define timer <bell>
  interval <3>
  disabled
  action msg <Ding.>
end define
"#;

    fn engine() -> Engine<BufferHost> {
        engine_with(BufferHost::new())
    }

    fn engine_with(host: BufferHost) -> Engine<BufferHost> {
        let model = load_str(GAME).expect("game loads");
        Engine::new(model, EngineConfig::default(), host)
    }

    fn run(e: &mut Engine<BufferHost>, script: &str) -> String {
        e.run_script(script);
        e.host_mut().take_output()
    }

    #[test]
    fn msg_and_say() {
        let mut e = engine();
        assert_eq!(run(&mut e, "msg <Hi there.>"), "Hi there.\n");
        assert_eq!(run(&mut e, "say <Boo>"), "\"Boo\"\n");
    }

    #[test]
    fn output_can_be_switched_off() {
        let mut e = engine();
        e.run_script("outputoff");
        assert_eq!(run(&mut e, "msg <hidden>"), "");
        e.run_script("outputon");
        assert_eq!(run(&mut e, "msg <shown>"), "shown\n");
    }

    #[test]
    fn if_then_else() {
        let mut e = engine();
        assert_eq!(run(&mut e, "if is <a;a> then msg <yes> else msg <no>"), "yes\n");
        assert_eq!(run(&mut e, "if is <a;b> then msg <yes> else msg <no>"), "no\n");
        assert_eq!(run(&mut e, "if is <a;b> then msg <yes>"), "");
    }

    #[test]
    fn set_infers_and_keeps_kind() {
        let mut e = engine();
        e.run_script("set numeric <score; 2 + 3>");
        assert_eq!(e.state().ivar("score"), Some(5));
        e.run_script("set <score; 7>");
        assert_eq!(e.state().ivar("score"), Some(7));
        e.run_script("set string <score; high>");
        assert_eq!(e.state().ivar("score"), Some(7));
        assert!(e.state().svar("score").is_none());
        assert!(!e.host().diagnostics().is_empty());
    }

    #[test]
    fn set_undefined_without_kind_reports() {
        let mut e = engine();
        e.run_script("set <mystery; 1>");
        assert!(e.state().ivar("mystery").is_none());
        assert_eq!(e.host().diagnostics().len(), 1);
    }

    #[test]
    fn inc_and_dec() {
        let mut e = engine();
        e.run_script("setvar <n; 10>");
        e.run_script("inc <n>");
        e.run_script("dec <n; 4>");
        assert_eq!(e.state().ivar("n"), Some(7));
    }

    #[test]
    fn procedures_take_arguments() {
        let mut e = engine();
        assert_eq!(run(&mut e, "do <greet(world)>"), "Hello, world!\n");
        assert_eq!(e.frames.len(), 1);
    }

    #[test]
    fn counted_loop() {
        let mut e = engine();
        assert_eq!(run(&mut e, "do <countdown>"), "0\n1\n2\n");
    }

    #[test]
    fn repeat_runs_procedure_param() {
        let mut e = engine();
        e.run_script("setvar <i; 0>");
        e.run_script("repeat while is <%i%;lt;2> do <bump>");
        assert_eq!(e.host_mut().take_output(), "tick\ntick\n");
    }

    #[test]
    fn repeat_until() {
        let mut e = engine();
        e.run_script("setvar <n; 0>");
        e.run_script("repeat until is <%n%;3> do inc <n>");
        assert_eq!(e.state().ivar("n"), Some(3));
    }

    #[test]
    fn runaway_loop_is_cut_off() {
        let model = load_str(GAME).expect("game loads");
        let config = EngineConfig::default().with_max_loop_iterations(50);
        let mut e = Engine::new(model, config, BufferHost::new());
        e.run_script("setvar <n; 0>");
        e.run_script("repeat while is <1;1> do inc <n>");
        assert_eq!(e.state().ivar("n"), Some(50));
    }

    #[test]
    fn array_writes_past_the_ceiling_are_refused() {
        let model = load_str(GAME).expect("game loads");
        let config = EngineConfig::default().with_max_array_index(8);
        let mut e = Engine::new(model, config, BufferHost::new());
        e.run_script("set numeric <slots[8]; 1>");
        assert_eq!(e.state().ivar("slots[8]"), Some(1));

        e.run_script("set numeric <slots[999999999999]; 2>");
        e.run_script("set string <labels[9]; far>");
        assert_eq!(e.state().upper_bound("slots"), Some(8));
        assert!(e.state().svar("labels").is_none());
        assert_eq!(e.host().diagnostics().len(), 2);
    }

    #[test]
    fn runaway_recursion_is_cut_off() {
        let mut e = engine();
        e.run_script("do <forever>");
        assert_eq!(e.frames.len(), 1);
        assert!(!e.host().diagnostics().is_empty());
    }

    #[test]
    fn for_each_object_in_room() {
        let mut e = engine();
        e.run_script("move <lamp; hall>");
        assert_eq!(
            run(&mut e, "for each object in <hall> msg <#quest.thing#>"),
            "lamp\n"
        );
    }

    #[test]
    fn give_moves_to_inventory_and_runs_gain() {
        let mut e = engine();
        assert_eq!(run(&mut e, "give <lamp>"), "You feel brighter.\n");
        assert_eq!(e.state().parent_of("lamp"), Some("inventory"));
    }

    #[test]
    fn selection_runs_chosen_action() {
        let mut e = engine_with(BufferHost::new().with_choice(1));
        assert_eq!(run(&mut e, "choose <menu>"), "You chose blue.\n");
        assert_eq!(e.host().prompts(), ["Pick one"]);
    }

    #[test]
    fn timers_fire_after_interval() {
        let mut e = engine();
        e.run_script("timeron <bell>");
        for _ in 0..3 {
            e.tick_timers();
        }
        assert_eq!(e.host_mut().take_output(), "");
        e.tick_timers();
        assert_eq!(e.host_mut().take_output(), "Ding.\n");
        assert!(e.state().timer("bell").is_some_and(|t| !t.running));
    }

    #[test]
    fn runtime_actions_override_static_ones() {
        let mut e = engine();
        e.run_script("action <lamp; look> msg <A glowing lamp.>");
        assert_eq!(e.obj_action("lamp", "look").as_deref(), Some("msg <A glowing lamp.>"));
    }

    #[test]
    fn unknown_statements_are_reported() {
        let mut e = engine();
        e.run_script("frobnicate <x>");
        e.run_script("playwav <boom.wav>");
        assert_eq!(e.host().diagnostics().len(), 1);
    }
}
