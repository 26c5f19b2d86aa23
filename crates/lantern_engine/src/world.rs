//! Rooms, exits, listings, object resolution, and player messages.
//!
//! The `quest.*` string variables that describe the current room are kept
//! up to date here whenever the player moves or the room changes.

use std::sync::Arc;

use lantern_foundation::ci_eq;
use lantern_language::{Tokens, is_param, param_contents, split_param};

use crate::engine::Engine;
use crate::host::Host;
use crate::messages::default_message;

/// Direction words and their short forms, `out` last.
pub const DIRECTIONS: [(&str, &str); 11] = [
    ("north", "n"),
    ("south", "s"),
    ("east", "e"),
    ("west", "w"),
    ("northeast", "ne"),
    ("northwest", "nw"),
    ("southeast", "se"),
    ("southwest", "sw"),
    ("up", "u"),
    ("down", "d"),
    ("out", "out"),
];

/// Where an exit leads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    /// Move to this room.
    Room(String),
    /// Run this script instead of moving.
    Script(String),
}

/// A destination reachable with `go to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Place {
    /// Name as listed, with style codes.
    pub printed: String,
    /// Name the player may type, with its prefix.
    pub with_prefix: String,
    /// Name the player may type.
    pub name: String,
    /// Room to move to.
    pub destination: String,
    /// Script to run instead of moving, if any.
    pub script: Option<String>,
}

/// One entry of a room or inventory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingEntry {
    /// Displayed name.
    pub name: String,
    /// Kind shown next to the name; `object` unless overridden.
    pub display_type: String,
}

impl<H: Host> Engine<H> {
    // -------------------------------------------------------------------------
    // Movement and Description
    // -------------------------------------------------------------------------

    /// Moves the player to `room`, runs its script, and describes it.
    pub fn goto_room(&mut self, room: &str) {
        if self.model.find_by_name("room", room).is_none() {
            self.diagnostic(format!("no room '{room}'"));
            return;
        }
        log::debug!(target: "lantern::engine", "entering '{room}'");
        self.state.set_location(room);
        self.regen_all();
        if let Some(script) = self.obj_action(room, "script") {
            self.run_script_as(room, &script);
        }
        self.look();
    }

    /// Describes the current room.
    pub fn look(&mut self) {
        let location = self.state.location().to_string();
        if let Some(script) = self.obj_action(&location, "description") {
            self.run_script_as(&location, &script);
        } else if let Some(text) = self.obj_property(&location, "description") {
            self.print_formatted(&text);
        } else if let Some(script) = self.obj_action("game", "description") {
            self.run_script_as("game", &script);
        } else if let Some(text) = self.obj_property("game", "description") {
            self.print_formatted(&text);
        } else {
            self.default_look(&location);
        }
    }

    fn default_look(&mut self, location: &str) {
        let intro = self
            .obj_property(location, "indescription")
            .unwrap_or_else(|| "You are in".to_string());
        let room = self.get_svar("quest.formatroom");
        self.print_formatted(&format!("{intro} {room}"));

        if !self.get_svar("quest.formatobjects").is_empty() {
            self.print_eval("There is #quest.formatobjects# here.");
        }
        let out = self.get_svar("quest.doorways.out");
        if !out.is_empty() {
            self.print_formatted(&format!("You can go out to {out}."));
        }
        if !self.get_svar("quest.doorways.dirs").is_empty() {
            self.print_eval("You can go #quest.doorways.dirs#.");
        }
        let places = self.get_svar("quest.doorways.places");
        if !places.is_empty() {
            self.print_formatted(&format!("You can go to {places}."));
        }
        let look = self.get_svar("quest.lookdesc");
        if !look.is_empty() {
            self.print_formatted(&look);
        }
    }

    // -------------------------------------------------------------------------
    // Room Variables
    // -------------------------------------------------------------------------

    /// Refreshes every room-describing variable.
    pub(crate) fn regen_all(&mut self) {
        self.regen_var_room();
        self.regen_var_dirs();
        self.regen_var_look();
        self.regen_var_objects();
    }

    /// Sets `quest.currentroom` and `quest.formatroom`.
    pub(crate) fn regen_var_room(&mut self) {
        let location = self.state.location().to_string();
        self.set_svar("quest.currentroom", location.clone());

        let name = self
            .obj_property(&location, "alias")
            .unwrap_or_else(|| location.clone());
        let mut formatted = format!("|cr{name}|cb");
        if let Some(prefix) = self.obj_property(&location, "prefix") {
            formatted = format!("{prefix} {formatted}");
        }
        if let Some(suffix) = self.obj_property(&location, "suffix") {
            formatted = format!("{formatted} {suffix}");
        }
        self.set_svar("quest.formatroom", formatted);
    }

    /// Sets `quest.lookdesc` from the room's `look` property.
    pub(crate) fn regen_var_look(&mut self) {
        let location = self.state.location().to_string();
        let look = self.obj_property(&location, "look").unwrap_or_default();
        self.set_svar("quest.lookdesc", look);
    }

    /// Sets `quest.objects` and `quest.formatobjects`.
    pub(crate) fn regen_var_objects(&mut self) {
        let location = self.state.location().to_string();
        let names: Vec<String> = self
            .state
            .objects()
            .filter(|o| ci_eq(&o.parent, &location))
            .map(|o| o.name.clone())
            .collect();

        let mut plain = Vec::new();
        let mut styled = Vec::new();
        for name in names {
            if self.has_property(&name, "hidden") || self.has_property(&name, "invisible") {
                continue;
            }
            let main = self.obj_property(&name, "alias").unwrap_or_else(|| name.clone());
            let mut print1 = main.clone();
            let mut print2 = format!("|b{main}|xb");
            if let Some(prefix) = self.obj_property(&name, "prefix") {
                print1 = format!("{prefix} {print1}");
                print2 = format!("{prefix} {print2}");
            }
            if let Some(suffix) = self.obj_property(&name, "suffix") {
                print1 = format!("{print1} {suffix}");
                print2 = format!("{print2} {suffix}");
            }
            plain.push(print1);
            styled.push(print2);
        }
        self.set_svar("quest.objects", join_list(&plain, ", ", " and "));
        self.set_svar("quest.formatobjects", join_list(&styled, ", ", " and "));
    }

    /// Sets the `quest.doorways.*` variables and the place list.
    pub(crate) fn regen_var_dirs(&mut self) {
        let location = self.state.location().to_string();
        let mut dirs = Vec::new();
        for (dir, _) in DIRECTIONS.iter().filter(|(dir, _)| *dir != "out") {
            if self.exit_dest(&location, dir).is_some() {
                dirs.push(format!("|b{dir}|xb"));
            }
        }
        self.set_svar("quest.doorways.dirs", join_list(&dirs, ", ", " or "));

        match self.exit_dest(&location, "out") {
            Some(Exit::Room(room)) => {
                let display = format!("|b{}|xb", self.displayed_name(&room));
                self.set_svar("quest.doorways.out", room);
                self.set_svar("quest.doorways.out.display", display);
            }
            Some(Exit::Script(_)) | None => {
                self.set_svar("quest.doorways.out", "");
                self.set_svar("quest.doorways.out.display", "");
            }
        }

        self.places = self.places_from(&location);
        let printed: Vec<String> = self.places.iter().map(|p| p.printed.clone()).collect();
        let last = if printed.len() == 2 { " or " } else { ", or " };
        self.set_svar("quest.doorways.places", join_list(&printed, ", ", last));
    }

    // -------------------------------------------------------------------------
    // Exits and Places
    // -------------------------------------------------------------------------

    /// Where going `dir` from `room` leads, if anywhere.
    ///
    /// Exits created at run time take precedence over the room's own
    /// lines, newest first. A `destroy exit` entry removes every older exit
    /// to that destination.
    pub(crate) fn exit_dest(&mut self, room: &str, dir: &str) -> Option<Exit> {
        let mut destroyed: Vec<String> = Vec::new();
        for record in self.state.exits().rev() {
            if !ci_eq(&record.source, room) {
                continue;
            }
            let mut tokens = Tokens::new(&record.line);
            match tokens.next_text() {
                "destroy" => {
                    tokens.next_text();
                    destroyed.push(tokens.rest().to_string());
                }
                "exit" => {
                    if tokens.next_text() != dir {
                        continue;
                    }
                    let fields = split_param(param_contents(tokens.next_text()));
                    if let [_, dest] = fields.as_slice() {
                        if !destroyed.iter().any(|d| ci_eq(d, dest)) {
                            return Some(Exit::Room(dest.clone()));
                        }
                    }
                }
                _ => {}
            }
        }

        let model = Arc::clone(&self.model);
        let Some(block) = model.find_by_name("room", room) else {
            self.diagnostic(format!("looking for exit '{dir}' of nonexistent room '{room}'"));
            return None;
        };
        for line in &block.lines {
            let mut tokens = Tokens::new(line);
            if tokens.next_text() != dir {
                continue;
            }
            let tok = tokens.peek();
            if tok.is_param() {
                let contents = param_contents(tok.text);
                let dest = contents.rsplit(';').next().unwrap_or(contents).trim();
                if dest.is_empty() || destroyed.iter().any(|d| ci_eq(d, dest)) {
                    return None;
                }
                return Some(Exit::Room(dest.to_string()));
            }
            let script = tokens.rest();
            return (!script.is_empty()).then(|| Exit::Script(script.to_string()));
        }
        None
    }

    /// The `go to` destinations of `room`.
    pub(crate) fn places_from(&mut self, room: &str) -> Vec<Place> {
        let model = Arc::clone(&self.model);
        let Some(block) = model.find_by_name("room", room) else {
            return Vec::new();
        };
        let mut places = Vec::new();
        for line in &block.lines {
            let mut tokens = Tokens::new(line);
            if tokens.next_text() != "place" {
                continue;
            }
            let param = tokens.next_text();
            if !is_param(param) {
                self.diagnostic(format!("expected parameter after 'place' in '{line}'"));
                continue;
            }
            let value = self.eval_param(param);
            if value.trim().is_empty() {
                self.diagnostic(format!("empty parameter in '{line}'"));
                continue;
            }
            let (prefix, dest) = match value.split_once(';') {
                Some((prefix, dest)) => (prefix.trim().to_string(), dest.trim().to_string()),
                None => (String::new(), value.trim().to_string()),
            };
            let displayed = self.displayed_name(&dest);
            let printed = if prefix.is_empty() {
                format!("|b{displayed}|xb")
            } else {
                format!("{prefix} |b{displayed}|xb")
            };
            let script = tokens.rest();
            places.push(Place {
                printed,
                with_prefix: format!("{prefix} {displayed}").trim().to_string(),
                name: displayed,
                destination: dest,
                script: (!script.is_empty()).then(|| script.to_string()),
            });
        }

        let records: Vec<String> = self
            .state
            .exits()
            .filter(|r| ci_eq(&r.source, room))
            .map(|r| r.line.clone())
            .collect();
        for line in records {
            let mut tokens = Tokens::new(&line);
            match tokens.next_text() {
                "exit" => {
                    let param = tokens.next_text();
                    if !is_param(param) {
                        continue;
                    }
                    let fields = split_param(param_contents(param));
                    let [_, dest] = fields.as_slice() else {
                        self.diagnostic(format!("expected two fields in '{line}'"));
                        continue;
                    };
                    let displayed = self.displayed_name(dest);
                    places.push(Place {
                        printed: format!("|b{displayed}|xb"),
                        with_prefix: displayed.clone(),
                        name: displayed,
                        destination: dest.clone(),
                        script: None,
                    });
                }
                "destroy" => {
                    tokens.next_text();
                    let dest = tokens.rest();
                    if let Some(i) = places.iter().position(|p| ci_eq(&p.destination, dest)) {
                        places.remove(i);
                    }
                }
                _ => {}
            }
        }
        places
    }

    /// Directions that lead somewhere from the current room.
    #[must_use]
    pub fn available_directions(&mut self) -> Vec<&'static str> {
        let location = self.state.location().to_string();
        DIRECTIONS
            .iter()
            .map(|(dir, _)| *dir)
            .filter(|dir| self.exit_dest(&location, dir).is_some())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Listings
    // -------------------------------------------------------------------------

    /// Visible objects in the current room.
    #[must_use]
    pub fn room_contents(&self) -> Vec<ListingEntry> {
        self.contents_of(self.state.location())
    }

    /// Objects the player carries.
    #[must_use]
    pub fn inventory(&self) -> Vec<ListingEntry> {
        self.contents_of("inventory")
    }

    fn contents_of(&self, place: &str) -> Vec<ListingEntry> {
        self.state
            .objects()
            .filter(|o| ci_eq(&o.parent, place))
            .filter(|o| !self.has_property(&o.name, "hidden") && !self.has_property(&o.name, "invisible"))
            .map(|o| ListingEntry {
                name: self.obj_property(&o.name, "alias").unwrap_or_else(|| o.name.clone()),
                display_type: self
                    .obj_property(&o.name, "displaytype")
                    .unwrap_or_else(|| "object".to_string()),
            })
            .collect()
    }

    /// An object's alias, or its name as spelled in the game file.
    pub(crate) fn displayed_name(&self, obj: &str) -> String {
        if let Some(alias) = self.obj_property(obj, "alias") {
            return alias;
        }
        self.model
            .blocks()
            .iter()
            .find(|block| ci_eq(&block.name, obj))
            .map_or_else(|| obj.to_string(), |block| block.name.clone())
    }

    // -------------------------------------------------------------------------
    // Object Resolution
    // -------------------------------------------------------------------------

    /// Resolves text the player typed to an object among `places`.
    ///
    /// `game` in `places` matches anywhere. Hidden objects never match.
    /// When several objects match, the player picks one. Returns `!` when
    /// nothing matches.
    pub(crate) fn find_object(&mut self, text: &str, places: &[String], is_internal: bool) -> String {
        let candidates: Vec<String> = self
            .state
            .objects()
            .filter(|o| places.iter().any(|p| ci_eq(p, "game") || ci_eq(&o.parent, p)))
            .map(|o| o.name.clone())
            .collect();

        let mut found = Vec::new();
        let mut printed = Vec::new();
        for name in candidates {
            if self.has_property(&name, "hidden") || !self.match_object(text, &name, is_internal) {
                continue;
            }
            let shown = self
                .obj_property(&name, "detail")
                .or_else(|| self.obj_property(&name, "alias"))
                .unwrap_or_else(|| name.clone());
            found.push(name);
            printed.push(shown);
        }

        match found.len() {
            0 => "!".to_string(),
            1 => found.swap_remove(0),
            n => {
                let pick = self
                    .host
                    .offer_choice(&format!("Which {text} do you mean?"), &printed)
                    .min(n - 1);
                found.swap_remove(pick)
            }
        }
    }

    /// True if `text` names the object `name`.
    fn match_object(&mut self, text: &str, name: &str, is_internal: bool) -> bool {
        if is_internal && ci_eq(text, name) {
            return true;
        }
        if let Some(prefix) = self.obj_property(name, "prefix") {
            if let Some(rest) = strip_prefix_ci(text, &format!("{prefix} ")) {
                if self.match_object(rest, name, false) {
                    return true;
                }
            }
        }
        if let Some(suffix) = self.obj_property(name, "suffix") {
            if let Some(rest) = strip_suffix_ci(text, &format!(" {suffix}")) {
                if self.match_object(rest, name, false) {
                    return true;
                }
            }
        }
        let alias = self.obj_property(name, "alias").unwrap_or_else(|| name.to_string());
        if ci_eq(text, &alias) {
            return true;
        }

        let model = Arc::clone(&self.model);
        let Some(block) = model.find_by_name("object", name) else {
            return false;
        };
        for line in &block.lines {
            let mut tokens = Tokens::new(line);
            if tokens.next_text() != "alt" {
                continue;
            }
            let param = tokens.next_text();
            if !is_param(param) {
                self.diagnostic(format!("expected parameter after alt in '{line}'"));
                continue;
            }
            let alts = split_param(param_contents(param));
            return match_alternatives(text, &alts);
        }
        false
    }

    // -------------------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------------------

    /// Prints a named player message, preferring the game's own wording.
    ///
    /// With an object, `quest.error.gender` and `quest.error.article` are
    /// set from its properties first.
    pub(crate) fn display_error(&mut self, name: &str, obj: Option<&str>) {
        if let Some(obj) = obj {
            let gender = self.obj_property(obj, "gender").unwrap_or_else(|| "it".to_string());
            let article = self.obj_property(obj, "article").unwrap_or_else(|| "it".to_string());
            self.set_svar("quest.error.gender", gender);
            self.set_svar("quest.error.article", article);
        }

        let model = Arc::clone(&self.model);
        if let Some(game) = model.game_block() {
            for line in &game.lines {
                let mut tokens = Tokens::new(line);
                if tokens.next_text() != "error" {
                    continue;
                }
                let param = tokens.next_text();
                if !is_param(param) {
                    self.diagnostic(format!("bad error line '{line}'"));
                    continue;
                }
                let contents = param_contents(param);
                let (kind, text) = contents.split_once(';').unwrap_or((contents, ""));
                if kind.trim() == name {
                    self.print_eval_capitalized(text.trim());
                    return;
                }
            }
        }

        match default_message(name) {
            Some(message) if message.capitalize => self.print_eval_capitalized(message.text),
            Some(message) => self.print_eval(message.text),
            None => self.diagnostic(format!("no message named '{name}'")),
        }
    }
}

/// Joins items as `a, b and c`.
fn join_list(items: &[String], separator: &str, last: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., final_item] => format!("{}{last}{final_item}", init.join(separator)),
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    ci_eq(head, prefix).then(|| &text[prefix.len()..])
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let start = text.len().checked_sub(suffix.len())?;
    let tail = text.get(start..)?;
    ci_eq(tail, suffix).then(|| &text[..start])
}

/// True if `text` is one of `alts`, possibly followed by more of `alts`.
fn match_alternatives(text: &str, alts: &[String]) -> bool {
    let mut pending = vec![text];
    while let Some(text) = pending.pop() {
        for alt in alts.iter().filter(|a| !a.is_empty()) {
            if ci_eq(text, alt) {
                return true;
            }
            if let Some(rest) = strip_prefix_ci(text, alt) {
                if let Some(rest) = rest.strip_prefix(' ') {
                    pending.push(rest);
                }
            }
        }
    }
    false
}
