//! The engine: a loaded game, its live state, and the host it talks through.
//!
//! [`Engine`] owns everything a game in progress needs. Its behavior is
//! spread over several modules, each adding an `impl` block:
//! - [`crate::eval`] - string substitution and conditions
//! - [`crate::functions`] - `$function(...)$` calls
//! - [`crate::interp`] - the script interpreter
//! - [`crate::world`] - rooms, exits, listings, and messages
//! - [`crate::commands`] - player turns and built-in verbs

use std::sync::Arc;

use lantern_foundation::{EngineConfig, ci_eq};
use lantern_language::{FileModel, Tokens, is_param, param_contents};
use lantern_storage::{INT_SENTINEL, RuntimeState, UndoRing, VarChange, initialize_state};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::host::Host;
use crate::interp::CallFrame;
use crate::world::Place;

/// Oldest and newest language versions the engine understands.
const SUPPORTED_VERSIONS: std::ops::RangeInclusive<i32> = 311..=353;

/// A running game.
pub struct Engine<H: Host> {
    pub(crate) model: Arc<FileModel>,
    pub(crate) state: RuntimeState,
    pub(crate) undo: UndoRing,
    pub(crate) config: EngineConfig,
    pub(crate) host: H,
    pub(crate) rng: ChaCha8Rng,
    /// Call frames; the bottom frame belongs to the top-level turn.
    pub(crate) frames: Vec<CallFrame>,
    /// Object whose script is running, for `$thisobject$`.
    pub(crate) this_object: String,
    /// Places reachable with `go to` from the current room.
    pub(crate) places: Vec<Place>,
    pub(crate) outputting: bool,
    pub(crate) dont_process: bool,
    /// False once the player quits.
    pub(crate) active: bool,
    /// Nesting depth of interpreter runs.
    pub(crate) depth: usize,
}

impl<H: Host> std::fmt::Debug for Engine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("location", &self.state.location())
            .field("running", &self.state.running())
            .field("active", &self.active)
            .field("undo", &self.undo.len())
            .finish_non_exhaustive()
    }
}

impl<H: Host> Engine<H> {
    /// Creates an engine for `model`, deriving the initial state.
    ///
    /// Nothing is shown until [`Engine::start`] is called.
    #[must_use]
    pub fn new(model: FileModel, config: EngineConfig, host: H) -> Self {
        let model = model.with_max_type_depth(config.max_type_depth);
        let state = initialize_state(&model);
        Self {
            model: Arc::new(model),
            state,
            undo: UndoRing::new(config.undo_capacity),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            frames: vec![CallFrame::default()],
            this_object: String::new(),
            places: Vec::new(),
            outputting: true,
            dont_process: false,
            active: true,
            depth: 0,
            config,
            host,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The loaded game.
    #[must_use]
    pub fn model(&self) -> &FileModel {
        &self.model
    }

    /// The live state.
    #[must_use]
    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the engine, returning its host.
    #[must_use]
    pub fn into_host(self) -> H {
        self.host
    }

    /// Number of undo snapshots held.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// False once the player has quit.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// True while the game has not been won, lost, or stopped.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.state.running()
    }

    /// Replaces the live state, as when restoring a saved game.
    ///
    /// The undo history restarts from the restored state and the room is
    /// described again.
    pub fn restore_state(&mut self, state: RuntimeState) {
        self.state = state;
        self.undo.clear();
        self.regen_all();
        self.undo.push(self.state.clone());
        self.look();
    }

    // -------------------------------------------------------------------------
    // Game start
    // -------------------------------------------------------------------------

    /// Applies game settings, shows the intro, runs the start script, and
    /// describes the first room.
    pub fn start(&mut self) {
        let model = Arc::clone(&self.model);
        let Some(game) = model.game_block() else {
            self.diagnostic("game has no game block");
            return;
        };
        for line in &game.lines {
            self.apply_game_setting(line);
        }

        if model.find_by_name("text", "intro").is_some() {
            self.display_text("intro");
        }
        if let Some(script) = game.find_line("startscript") {
            self.run_script_as("game", script);
        }

        self.regen_all();
        self.look();
        self.undo.push(self.state.clone());
        log::debug!(
            target: "lantern::engine",
            "started '{}' in '{}'",
            model.game_title().unwrap_or_default(),
            self.state.location()
        );
    }

    fn apply_game_setting(&mut self, line: &str) {
        let mut tokens = Tokens::new(line);
        match tokens.next_text() {
            "asl-version" => {
                let param = tokens.next_text();
                let version = parse_int(param_contents(param));
                if !is_param(param) {
                    self.diagnostic(format!("bad version line '{line}'"));
                } else if !SUPPORTED_VERSIONS.contains(&version) {
                    self.diagnostic(format!(
                        "language version {version} is outside the supported range {}..{}",
                        SUPPORTED_VERSIONS.start(),
                        SUPPORTED_VERSIONS.end()
                    ));
                }
            }
            "background" => {
                if let Some(color) = self.setting_param(&mut tokens, "background color", line) {
                    self.host.set_background(&color);
                }
            }
            "foreground" => {
                if let Some(color) = self.setting_param(&mut tokens, "foreground color", line) {
                    self.host.set_foreground(&color);
                }
            }
            "default" => match tokens.next_text() {
                "fontname" => {
                    if let Some(font) = self.setting_param(&mut tokens, "font name", line) {
                        self.host.set_font(&font);
                    }
                }
                "fontsize" => {
                    if let Some(size) = self.setting_param(&mut tokens, "font size", line) {
                        self.host.set_font_size(&size);
                    }
                }
                _ => {}
            },
            "gametype" => match tokens.next_text() {
                "singleplayer" => {}
                "multiplayer" => self.diagnostic("multiplayer games are not supported"),
                _ => self.diagnostic(format!("unexpected game type in '{line}'")),
            },
            _ => {}
        }
    }

    fn setting_param(&mut self, tokens: &mut Tokens<'_>, what: &str, line: &str) -> Option<String> {
        let param = tokens.next_text();
        if is_param(param) {
            Some(param_contents(param).to_string())
        } else {
            self.diagnostic(format!("expected {what} parameter in '{line}'"));
            None
        }
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// Advances every running timer by one tick.
    ///
    /// A timer with no time left stops, is rearmed to its interval, and
    /// runs its `action` script.
    pub fn tick_timers(&mut self) {
        if !self.state.running() {
            return;
        }
        for index in 0..self.state.timer_count() {
            let Some(timer) = self.state.timer_at_mut(index) else {
                continue;
            };
            if !timer.running {
                continue;
            }
            if timer.time_left > 0 {
                timer.time_left -= 1;
                continue;
            }
            timer.running = false;
            timer.time_left = timer.interval;
            let name = timer.name.clone();

            let model = Arc::clone(&self.model);
            let script = model
                .find_by_name("timer", &name)
                .and_then(|block| block.find_line("action"));
            log::debug!(target: "lantern::engine", "timer '{name}' fired");
            if let Some(script) = script {
                self.run_script(script);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Banner and status
    // -------------------------------------------------------------------------

    /// Title line: name, version, and author.
    #[must_use]
    pub fn banner(&mut self) -> String {
        let model = Arc::clone(&self.model);
        let Some(title) = model.game_title() else {
            return String::new();
        };
        let mut banner = self.eval_string(title);
        if let Some(version) = self.game_info("version").into_iter().last() {
            banner.push_str(", v");
            banner.push_str(&version);
        }
        if let Some(author) = self.game_info("author").into_iter().last() {
            banner.push_str(" | ");
            banner.push_str(&author);
        }
        banner
    }

    /// Evaluated values of every `game <field> <value>` line.
    pub(crate) fn game_info(&mut self, field: &str) -> Vec<String> {
        let model = Arc::clone(&self.model);
        let Some(game) = model.game_block() else {
            return Vec::new();
        };
        let mut values = Vec::new();
        for line in &game.lines {
            let mut tokens = Tokens::new(line);
            if tokens.next_text() != "game" || tokens.next_text() != field {
                continue;
            }
            let param = tokens.next_text();
            if is_param(param) {
                values.push(self.eval_param(param));
            }
        }
        values
    }

    /// Status lines from variables declared with `display`.
    ///
    /// In the display text `!` stands for the value and `*word*` is shown
    /// unless a numeric value is exactly 1. `display nozero` hides a
    /// numeric variable while it is 0.
    pub fn status_lines(&mut self) -> Vec<String> {
        let model = Arc::clone(&self.model);
        let mut lines = Vec::new();
        for block in model.blocks_of("variable") {
            let mut display = None;
            let mut nozero = false;
            let mut numeric = true;
            for line in &block.lines {
                let mut tokens = Tokens::new(line);
                match tokens.next_text() {
                    "display" => {
                        let mut param = tokens.next_text();
                        if param == "nozero" {
                            nozero = true;
                            param = tokens.next_text();
                        }
                        if is_param(param) {
                            display = Some(param_contents(param));
                        } else {
                            self.diagnostic(format!("expected parameter after display in '{line}'"));
                        }
                    }
                    "type" => numeric = !ci_eq(tokens.next_text(), "string"),
                    _ => {}
                }
            }
            let Some(display) = display else {
                continue;
            };

            let value = if numeric {
                let n = self.get_ivar(&block.name);
                if nozero && n == 0 {
                    continue;
                }
                Some(n)
            } else {
                None
            };
            let shown = match value {
                Some(n) => n.to_string(),
                None => self.get_svar(&block.name),
            };

            let mut text = String::new();
            let mut rest = display;
            while let Some(pos) = rest.find(['!', '*']) {
                text.push_str(&rest[..pos]);
                let after = &rest[pos + 1..];
                if rest.as_bytes()[pos] == b'!' {
                    text.push_str(&shown);
                    rest = after;
                } else {
                    let close = after.find('*').unwrap_or(after.len());
                    if value != Some(1) {
                        text.push_str(&after[..close]);
                    }
                    rest = after.get(close + 1..).unwrap_or("");
                }
            }
            text.push_str(rest);
            lines.push(self.eval_string(&text));
        }
        lines
    }

    // -------------------------------------------------------------------------
    // Output and diagnostics
    // -------------------------------------------------------------------------

    /// Reports a recoverable problem in the running game.
    pub(crate) fn diagnostic(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::warn!(target: "lantern::script", "{message}");
        self.host.debug_log(message);
    }

    /// Prints a line, unless output is switched off.
    pub(crate) fn print_formatted(&mut self, text: &str) {
        if self.outputting {
            self.host.print_text(text);
            self.host.print_newline();
        }
    }

    /// Substitutes and prints a line.
    pub(crate) fn print_eval(&mut self, text: &str) {
        let text = self.eval_string(text);
        self.print_formatted(&text);
    }

    /// Substitutes, capitalizes, and prints a line.
    pub(crate) fn print_eval_capitalized(&mut self, text: &str) {
        let text = crate::messages::capitalize(&self.eval_string(text));
        self.print_formatted(&text);
    }

    /// Prints every line of a `define text` block.
    pub(crate) fn display_text(&mut self, name: &str) {
        let model = Arc::clone(&self.model);
        let Some(block) = model.find_by_name("text", name) else {
            self.diagnostic(format!("no text block '{name}'"));
            return;
        };
        for line in &block.lines {
            self.print_formatted(line);
        }
    }

    // -------------------------------------------------------------------------
    // Variables
    // -------------------------------------------------------------------------

    /// Reads a string variable; undefined names read as empty.
    pub(crate) fn get_svar(&mut self, name: &str) -> String {
        if let Some(value) = self.state.svar(name) {
            return value;
        }
        self.diagnostic(format!("no string variable '{name}'"));
        String::new()
    }

    /// Reads a numeric variable; undefined names read as the sentinel.
    pub(crate) fn get_ivar(&mut self, name: &str) -> i32 {
        if let Some(value) = self.state.ivar(name) {
            return value;
        }
        self.diagnostic(format!("no numeric variable '{name}'"));
        INT_SENTINEL
    }

    /// Sets a string variable and runs its `onchange` script.
    pub(crate) fn set_svar(&mut self, name: &str, value: impl Into<String>) {
        if !self.index_in_range(name) {
            return;
        }
        let change = self.state.set_svar(&self.model, name, value);
        self.after_var_change(name, change);
    }

    /// Sets a numeric variable and runs its `onchange` script.
    pub(crate) fn set_ivar(&mut self, name: &str, value: i32) {
        if !self.index_in_range(name) {
            return;
        }
        let change = self.state.set_ivar(&self.model, name, value);
        self.after_var_change(name, change);
    }

    /// Rejects writes past `max_array_index`; malformed names pass through.
    fn index_in_range(&mut self, name: &str) -> bool {
        let limit = self.config.max_array_index;
        match self.state.resolve_var_ref(name) {
            Some((_, index)) if index > limit => {
                self.diagnostic(format!(
                    "index {index} of '{name}' is past the limit of {limit}; assignment ignored"
                ));
                false
            }
            _ => true,
        }
    }

    fn after_var_change(&mut self, name: &str, change: VarChange) {
        match change {
            VarChange::Changed { onchange: Some(script) } => self.run_script(&script),
            VarChange::Changed { onchange: None } => {}
            VarChange::KindConflict { existing } => self.diagnostic(format!(
                "'{name}' is already a {existing} variable; assignment ignored"
            )),
            VarChange::BadName => self.diagnostic(format!("badly formed variable name '{name}'")),
        }
    }

    // -------------------------------------------------------------------------
    // Objects
    // -------------------------------------------------------------------------

    /// Resolves a property against live state and the model.
    pub(crate) fn obj_property(&self, obj: &str, prop: &str) -> Option<String> {
        self.state.get_obj_property(&self.model, obj, prop)
    }

    /// True if a property currently holds.
    pub(crate) fn has_property(&self, obj: &str, prop: &str) -> bool {
        self.state.has_obj_property(&self.model, obj, prop)
    }

    /// Resolves an action script against live state and the model.
    pub(crate) fn obj_action(&self, obj: &str, act: &str) -> Option<String> {
        self.state.get_obj_action(&self.model, obj, act)
    }

    /// Asserts a property, keeping the record's visibility flags in step.
    pub(crate) fn assert_property(&mut self, obj: &str, prop: &str) {
        let prop = prop.trim();
        self.state.set_obj_property(obj, prop);
        let (negated, name) = match prop.strip_prefix("not ") {
            Some(name) => (true, name.trim()),
            None => (false, prop),
        };
        if ci_eq(name, "hidden") {
            self.state.set_hidden(obj, !negated);
        } else if ci_eq(name, "invisible") {
            self.state.set_invisible(obj, !negated);
        }
    }

    /// Where an object is; missing objects read as nowhere.
    pub(crate) fn parent_of(&mut self, obj: &str) -> String {
        if let Some(parent) = self.state.parent_of(obj) {
            return parent.to_string();
        }
        self.diagnostic(format!("no object '{obj}'"));
        String::new()
    }

    /// Moves an object and refreshes the room listing.
    pub(crate) fn move_object(&mut self, obj: &str, dest: &str) {
        if !self.state.move_object(obj, dest) {
            self.diagnostic(format!("cannot move nonexistent object '{obj}'"));
        }
        self.regen_var_objects();
    }
}

/// Parses a leading integer, ignoring anything after it.
///
/// Text with no leading digits reads as 0.
#[must_use]
pub fn parse_int(text: &str) -> i32 {
    let text = text.trim();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    digits[..end].parse::<i32>().map_or(0, |n| sign * n)
}
