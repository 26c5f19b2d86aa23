//! Player turns.
//!
//! A turn runs the `beforeturn` scripts, matches the command against the
//! game's own `command` lines and then the built-in verbs, runs the
//! `afterturn` scripts, and finally records an undo snapshot.

use std::sync::Arc;

use lantern_foundation::ci_eq;
use lantern_language::{Block, Tokens, is_param, param_contents, split_param};

use crate::engine::Engine;
use crate::host::Host;
use crate::matcher::{Binding, match_command};
use crate::messages::HELP_TEXT;
use crate::world::{DIRECTIONS, Exit};

impl<H: Host> Engine<H> {
    /// Runs one line of player input.
    pub fn run_command(&mut self, input: &str) {
        if !self.active {
            return;
        }
        if self.config.echo_commands {
            self.host.print_newline();
            self.host.print_text(&format!("> {input}"));
            self.host.print_newline();
        }

        match input.trim() {
            "dump status" => {
                let dump = format!("{:#?}", self.state);
                self.print_formatted(&dump);
                return;
            }
            "undo" => {
                self.undo_turn();
                return;
            }
            _ => {}
        }
        if !self.state.running() {
            return;
        }
        log::debug!(target: "lantern::engine", "command '{input}'");

        self.set_svar("quest.originalcommand", input);
        let command = self.substitute_synonyms(&input.to_lowercase());
        self.set_svar("quest.command", command.clone());

        self.dont_process = false;
        let overridden = self.run_turn_scripts("beforeturn");
        if !self.dont_process && !overridden && !self.try_match(&command, false, false) {
            self.display_error("badcommand", None);
        }
        self.run_turn_scripts("afterturn");

        if self.state.running() {
            self.undo.push(self.state.clone());
        }
    }

    fn undo_turn(&mut self) {
        match self.undo.undo() {
            Some(state) => {
                self.state = state;
                let location = self.state.location().to_string();
                self.places = self.places_from(&location);
                self.print_formatted("Undone.");
            }
            None => self.print_formatted("(No more undo information available!)"),
        }
    }

    /// Runs the room's, then the game's, `beforeturn` or `afterturn` lines.
    ///
    /// Returns true if any line carried `override`; the game's lines are
    /// skipped when a room line overrides.
    fn run_turn_scripts(&mut self, hook: &str) -> bool {
        let model = Arc::clone(&self.model);
        let location = self.state.location().to_string();
        let mut overridden = match model.find_by_name("room", &location) {
            Some(room) => self.run_hook_lines(room, hook, &location),
            None => {
                self.diagnostic(format!("no room '{location}'"));
                false
            }
        };
        if !overridden {
            if let Some(game) = model.game_block() {
                overridden = self.run_hook_lines(game, hook, "game");
            }
        }
        overridden
    }

    fn run_hook_lines(&mut self, block: &Block, hook: &str, owner: &str) -> bool {
        let mut overridden = false;
        for line in &block.lines {
            let mut tokens = Tokens::new(line);
            if tokens.next_text() != hook {
                continue;
            }
            if tokens.peek().text == "override" {
                tokens.next_token();
                overridden = true;
            }
            let script = tokens.rest();
            self.run_script_as(owner, script);
        }
        overridden
    }

    /// Applies the game's `define synonyms` substitutions, whole words only.
    fn substitute_synonyms(&self, command: &str) -> String {
        let mut command = command.to_string();
        for block in self.model.blocks_of("synonyms") {
            for line in &block.lines {
                let Some((words, replacement)) = line.split_once('=') else {
                    continue;
                };
                let replacement = replacement.trim();
                if replacement.is_empty() {
                    continue;
                }
                for word in split_param(words) {
                    if !word.is_empty() {
                        command = replace_word(&command, &word.to_lowercase(), replacement);
                    }
                }
            }
        }
        command
    }

    // -------------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------------

    /// Tries the game's commands and then every built-in verb.
    ///
    /// `is_internal` lets object names match exactly even without an alias;
    /// `is_normal` skips the game's own commands. Returns false if nothing
    /// matched.
    pub(crate) fn try_match(&mut self, command: &str, is_internal: bool, is_normal: bool) -> bool {
        if !is_normal {
            let model = Arc::clone(&self.model);
            let location = self.state.location().to_string();
            if let Some(room) = model.find_by_name("room", &location) {
                if self.run_commands(command, room, is_internal) {
                    return true;
                }
            }
            if let Some(game) = model.game_block() {
                if self.run_commands(command, game, is_internal) {
                    return true;
                }
            }
        }

        if let Some(bindings) = first_match(command, &["look at #@object#", "look #@object#"]) {
            if let Some(object) = self.resolve_one(bindings, is_internal) {
                self.describe(&object, &["look"], "defaultlook");
            }
            return true;
        }
        if let Some(bindings) = first_match(command, &["examine #@object#", "x #@object#"]) {
            if let Some(object) = self.resolve_one(bindings, is_internal) {
                self.describe(&object, &["examine", "look"], "defaultexamine");
            }
            return true;
        }
        if match_command(command, "look").is_some() {
            self.look();
            return true;
        }
        if let Some(bindings) = first_match(command, &["give #@first# to #@second#"]) {
            if let Some((first, second)) = self.resolve_two(bindings, is_internal) {
                self.give_to(&first, &second);
            }
            return true;
        }
        if let Some(bindings) =
            first_match(command, &["use #@first# on #@second#", "use #@first# with #@second#"])
        {
            if let Some((first, second)) = self.resolve_two(bindings, is_internal) {
                self.use_on(&first, &second);
            }
            return true;
        }
        if let Some(bindings) = first_match(command, &["use #@first#"]) {
            if let Some(object) = self.resolve_one(bindings, is_internal) {
                self.use_item(&object);
            }
            return true;
        }
        if let Some(bindings) = first_match(command, &["take #@object#", "get #@object#"]) {
            if let Some(object) = self.resolve_one(bindings, is_internal) {
                self.take(&object);
            }
            return true;
        }
        if let Some(bindings) = first_match(command, &["drop #@object#"]) {
            if let Some(object) = self.resolve_one(bindings, is_internal) {
                self.drop_item(&object);
            }
            return true;
        }
        if let Some(bindings) = first_match(
            command,
            &["speak to #@object#", "speak #@object#", "talk to #@object#", "talk #@object#"],
        ) {
            if let Some(object) = self.resolve_one(bindings, is_internal) {
                match self.obj_action(&object, "speak") {
                    Some(script) => self.run_script_as(&object, &script),
                    None => self.display_error("defaultspeak", Some(&object)),
                }
            }
            return true;
        }
        if ["exit", "out", "go out"].iter().any(|c| ci_eq(c, command)) {
            self.go_out();
            return true;
        }
        for (dir, short) in DIRECTIONS {
            let matches = [dir, short].iter().any(|word| {
                ci_eq(command, word)
                    || command
                        .strip_prefix("go ")
                        .is_some_and(|rest| ci_eq(rest, word))
            });
            if matches {
                self.go_direction(dir);
                return true;
            }
        }
        if let Some(bindings) = first_match(command, &["go to #@room#", "go #@room#"]) {
            let destination = bindings.into_iter().next().map(|b| b.text).unwrap_or_default();
            self.go_to_place(&destination);
            return true;
        }
        if ci_eq(command, "inventory") || ci_eq(command, "i") {
            self.show_inventory();
            return true;
        }
        if ci_eq(command, "help") {
            self.print_formatted(HELP_TEXT);
            return true;
        }
        if ci_eq(command, "about") {
            self.about();
            return true;
        }
        if ci_eq(command, "quit") {
            log::debug!(target: "lantern::engine", "player quit");
            self.active = false;
            return true;
        }
        false
    }

    /// Runs the first `command <patterns>` line of `block` that matches.
    fn run_commands(&mut self, command: &str, block: &Block, is_internal: bool) -> bool {
        for line in &block.lines {
            let mut tokens = Tokens::new(line);
            if tokens.next_text() != "command" {
                continue;
            }
            let param = tokens.next_text();
            if !is_param(param) {
                self.diagnostic(format!("bad command line '{line}'"));
                continue;
            }
            let Some(bindings) = split_param(param_contents(param))
                .iter()
                .find_map(|pattern| match_command(command, pattern))
            else {
                continue;
            };
            if let Some(bindings) = self.dereference(bindings, is_internal) {
                for binding in bindings {
                    self.set_svar(&binding.name, binding.text);
                }
                let location = self.state.location().to_string();
                self.run_script_as(&location, tokens.rest());
            }
            return true;
        }
        false
    }

    /// Resolves `#@...#` captures to object names.
    ///
    /// Prints a message for each capture that names nothing visible and
    /// returns `None` if there was any.
    fn dereference(&mut self, mut bindings: Vec<Binding>, is_internal: bool) -> Option<Vec<Binding>> {
        let places = ["inventory".to_string(), self.state.location().to_string()];
        let mut resolved = true;
        for binding in bindings.iter_mut().filter(|b| b.object_ref) {
            let name = self.find_object(&binding.text, &places, is_internal);
            if name == "!" {
                self.print_formatted(&format!("You don't see any {}.", binding.text));
                resolved = false;
            } else {
                binding.text = name;
                binding.object_ref = false;
            }
        }
        resolved.then_some(bindings)
    }

    fn resolve_one(&mut self, bindings: Vec<Binding>, is_internal: bool) -> Option<String> {
        self.dereference(bindings, is_internal)?
            .into_iter()
            .next()
            .map(|b| b.text)
    }

    fn resolve_two(&mut self, bindings: Vec<Binding>, is_internal: bool) -> Option<(String, String)> {
        let mut bindings = self.dereference(bindings, is_internal)?.into_iter();
        Some((bindings.next()?.text, bindings.next()?.text))
    }

    // -------------------------------------------------------------------------
    // Built-in Verbs
    // -------------------------------------------------------------------------

    /// Runs the first action of `verbs`, or prints the first such property.
    fn describe(&mut self, object: &str, verbs: &[&str], fallback: &str) {
        for verb in verbs {
            if let Some(script) = self.obj_action(object, verb) {
                self.run_script_as(object, &script);
                return;
            }
            if let Some(text) = self.obj_property(object, verb) {
                self.print_formatted(&text);
                return;
            }
        }
        self.display_error(fallback, Some(object));
    }

    fn carried(&self, object: &str) -> bool {
        self.state
            .parent_of(object)
            .is_some_and(|parent| ci_eq(parent, "inventory"))
    }

    fn give_to(&mut self, first: &str, second: &str) {
        if !self.carried(first) {
            self.display_error("noitem", Some(first));
        } else if let Some(script) = self.obj_action(second, &format!("give {first}")) {
            self.run_script_as(second, &script);
        } else if let Some(script) = self.obj_action(first, &format!("give to {second}")) {
            self.run_script_as(first, &script);
        } else if let Some(script) = self.obj_action(second, "give anything") {
            self.set_svar("quest.give.object.name", first);
            self.run_script_as(second, &script);
        } else if let Some(script) = self.obj_action(first, "give to anything") {
            self.set_svar("quest.give.object.name", second);
            self.run_script_as(first, &script);
        } else {
            let gender = self.obj_property(second, "gender").unwrap_or_else(|| "it".to_string());
            let article = self.obj_property(first, "article").unwrap_or_else(|| "it".to_string());
            self.set_svar("quest.error.gender", gender);
            self.set_svar("quest.error.article", article);
            self.display_error("itemunwanted", None);
        }
    }

    fn use_on(&mut self, first: &str, second: &str) {
        if !self.carried(first) {
            self.display_error("noitem", Some(first));
        } else if let Some(script) = self.obj_action(second, &format!("use {first}")) {
            self.run_script_as(second, &script);
        } else if let Some(script) = self.obj_action(first, &format!("use on {second}")) {
            self.run_script_as(first, &script);
        } else if let Some(script) = self.obj_action(second, "use anything") {
            self.set_svar("quest.use.object", first);
            self.run_script_as(second, &script);
        } else if let Some(script) = self.obj_action(first, "use on anything") {
            self.set_svar("quest.use.object", second);
            self.run_script_as(first, &script);
        } else {
            self.display_error("defaultuse", None);
        }
    }

    fn use_item(&mut self, object: &str) {
        if !self.carried(object) {
            self.display_error("noitem", Some(object));
            return;
        }
        self.describe(object, &["use"], "defaultuse");
    }

    fn take(&mut self, object: &str) {
        if let Some(script) = self.obj_action(object, "take") {
            self.run_script_as(object, &script);
            return;
        }
        let Some(message) = self.obj_property(object, "take") else {
            self.display_error("badtake", Some(object));
            return;
        };
        if message.is_empty() {
            self.display_error("defaulttake", Some(object));
        } else {
            self.print_formatted(&message);
        }
        self.move_object(object, "inventory");
        if let Some(script) = self.obj_action(object, "gain") {
            self.run_script_as(object, &script);
        } else if let Some(text) = self.obj_property(object, "gain") {
            self.print_formatted(&text);
        }
    }

    fn drop_item(&mut self, object: &str) {
        if let Some(script) = self.obj_action(object, "drop") {
            self.run_script_as(object, &script);
            return;
        }
        let model = Arc::clone(&self.model);
        let location = self.state.location().to_string();
        if let Some(block) = model.find_by_name("object", object) {
            for line in &block.lines {
                let mut tokens = Tokens::new(line);
                if tokens.next_text() != "drop" {
                    continue;
                }
                let script = tokens.rest();
                let mode = tokens.next_text();
                if mode != "everywhere" && mode != "nowhere" {
                    self.run_script_as(object, script);
                    return;
                }
                if mode == "everywhere" {
                    self.move_object(object, &location);
                }
                let message = tokens.next_text();
                if is_param(message) {
                    self.print_eval(param_contents(message));
                } else {
                    self.diagnostic(format!("expected parameter after drop {mode} in '{line}'"));
                }
                return;
            }
        }
        self.move_object(object, &location);
        self.display_error("defaultdrop", Some(object));
    }

    fn go_out(&mut self) {
        let model = Arc::clone(&self.model);
        let location = self.state.location().to_string();
        let Some(room) = model.find_by_name("room", &location) else {
            self.diagnostic(format!("no room '{location}'"));
            return;
        };
        let Some(line) = room.lines_with("out").last() else {
            self.display_error("defaultout", None);
            return;
        };
        let mut tokens = Tokens::new(line);
        let param = tokens.next_text();
        if !is_param(param) {
            self.diagnostic(format!("bad out line 'out {line}'"));
            return;
        }
        let script = tokens.rest();
        if script.is_empty() {
            let contents = param_contents(param);
            let dest = contents.rsplit(';').next().unwrap_or(contents).trim();
            self.goto_room(dest);
        } else {
            self.run_script_as(&location, script);
        }
    }

    fn go_direction(&mut self, dir: &str) {
        let location = self.state.location().to_string();
        match self.exit_dest(&location, dir) {
            Some(Exit::Room(room)) => self.goto_room(&room),
            Some(Exit::Script(script)) => self.run_script_as(&location, &script),
            None => self.print_formatted("You can't go that way."),
        }
    }

    fn go_to_place(&mut self, destination: &str) {
        let place = self
            .places
            .iter()
            .find(|p| ci_eq(destination, &p.with_prefix) || ci_eq(destination, &p.name))
            .cloned();
        match place {
            Some(place) => match place.script {
                Some(script) => {
                    let location = self.state.location().to_string();
                    self.run_script_as(&location, &script);
                }
                None => self.goto_room(&place.destination),
            },
            None => self.display_error("badplace", Some(destination)),
        }
    }

    fn show_inventory(&mut self) {
        let items = self.inventory();
        if items.is_empty() {
            self.print_formatted("You are carrying nothing.");
            return;
        }
        self.print_formatted("You are carrying:");
        for item in items {
            self.print_formatted(&item.name);
        }
    }

    fn about(&mut self) {
        let model = Arc::clone(&self.model);
        if let Some(title) = model.game_title() {
            let title = self.eval_string(title);
            self.print_formatted(&format!("Game name: {title}"));
        }
        for (field, label) in [("version", "Version "), ("author", "Author: "), ("copyright", "Copyright: ")] {
            for value in self.game_info(field) {
                self.print_formatted(&format!("{label}{value}"));
            }
        }
        for value in self.game_info("info") {
            self.print_formatted(&value);
        }
    }
}

fn first_match(command: &str, patterns: &[&str]) -> Option<Vec<Binding>> {
    patterns.iter().find_map(|pattern| match_command(command, pattern))
}

/// Replaces `word` where it stands alone between spaces or string ends.
fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    let mut text = text.to_string();
    let mut from = 0;
    while let Some(found) = text.get(from..).and_then(|rest| rest.find(word)) {
        let start = from + found;
        let end = start + word.len();
        let bytes = text.as_bytes();
        let starts_word = start == 0 || bytes[start - 1] == b' ';
        let ends_word = end == text.len() || bytes[end] == b' ';
        if starts_word && ends_word {
            text.replace_range(start..end, replacement);
            from = start + replacement.len();
        } else {
            from = start + word.chars().next().map_or(1, char::len_utf8);
        }
    }
    text
}
