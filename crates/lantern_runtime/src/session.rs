//! A play session: one engine plus the commands the player's front end
//! handles itself.
//!
//! `save <file>` and `restore <file>` are answered here and never reach the
//! game. Every other line is a game turn, followed by one timer tick.

use std::path::{Path, PathBuf};

use lantern_engine::{Engine, Host};
use lantern_foundation::{EngineConfig, Result};
use lantern_language::{FileModel, load};

use crate::serialize::{load_from_file, save_to_file};

/// A running game.
pub struct Session<H: Host> {
    engine: Engine<H>,
    save_dir: PathBuf,
}

impl<H: Host> Session<H> {
    /// Loads a game file.
    ///
    /// # Errors
    ///
    /// Returns an error if the game file cannot be loaded.
    pub fn open(path: &Path, config: EngineConfig, host: H) -> Result<Self> {
        let model = load(path)?;
        let save_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self::with_model(model, config, host).with_save_dir(save_dir))
    }

    /// Creates a session for an already loaded model.
    #[must_use]
    pub fn with_model(model: FileModel, config: EngineConfig, host: H) -> Self {
        Self {
            engine: Engine::new(model, config, host),
            save_dir: PathBuf::from("."),
        }
    }

    /// Resolves relative save file names against `dir`.
    #[must_use]
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    /// Returns the engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine<H> {
        &self.engine
    }

    /// Returns the engine mutably.
    pub fn engine_mut(&mut self) -> &mut Engine<H> {
        &mut self.engine
    }

    /// Runs the game's opening: intro, start script, first room.
    pub fn start(&mut self) {
        self.engine.start();
    }

    /// True until the player quits.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    /// Handles one line of player input.
    pub fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        match word.to_ascii_lowercase().as_str() {
            "save" => self.save(rest.trim()),
            "restore" => self.restore(rest.trim()),
            _ => {
                self.engine.run_command(line);
                self.engine.tick_timers();
            }
        }
    }

    /// Command words plus the names of visible and carried things.
    #[must_use]
    pub fn completion_words(&self) -> Vec<String> {
        let mut words: Vec<String> = crate::editor::COMMAND_WORDS
            .iter()
            .map(ToString::to_string)
            .collect();
        words.extend(self.engine.room_contents().into_iter().map(|e| e.name));
        words.extend(self.engine.inventory().into_iter().map(|e| e.name));
        words
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.save_dir.join(path)
        }
    }

    fn say(&mut self, text: &str) {
        let host = self.engine.host_mut();
        host.print_text(text);
        host.print_newline();
    }

    fn save(&mut self, file: &str) {
        if file.is_empty() {
            self.say("Save to which file?");
            return;
        }
        let path = self.resolve(file);
        match save_to_file(self.engine.state(), &path) {
            Ok(()) => {
                log::info!(target: "lantern::runtime", "saved game to {}", path.display());
                self.say("Saved.");
            }
            Err(e) => self.say(&format!("Could not save: {e}")),
        }
    }

    fn restore(&mut self, file: &str) {
        if file.is_empty() {
            self.say("Restore from which file?");
            return;
        }
        let path = self.resolve(file);
        match load_from_file(&path) {
            Ok(state) => {
                log::info!(target: "lantern::runtime", "restored game from {}", path.display());
                self.say("Restored.");
                self.engine.restore_state(state);
            }
            Err(e) => self.say(&format!("Could not restore: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use lantern_engine::BufferHost;
    use lantern_language::load_str;

    use super::*;

    const GAME: &str = r"
define game <Session Test>
  start <hall>
end define

define room <hall>
  description <A bare hall.>
  north <yard>

  define object <lamp>
    take
  end define
end define

define room <yard>
  description <An empty yard.>
  south <hall>
end define

define timer <bell>
  interval <2>
  enabled
  action msg <Ding.>
end define
";

    fn session(dir: &Path) -> Session<BufferHost> {
        let model = load_str(GAME).unwrap();
        let config = EngineConfig::default().with_echo_commands(false);
        let mut s = Session::with_model(model, config, BufferHost::new()).with_save_dir(dir);
        s.start();
        s.engine_mut().host_mut().take_output();
        s
    }

    fn turn(s: &mut Session<BufferHost>, line: &str) -> String {
        s.handle_line(line);
        s.engine_mut().host_mut().take_output()
    }

    #[test]
    fn timers_tick_once_per_turn() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        assert_eq!(turn(&mut s, "look"), "A bare hall.\n");
        assert_eq!(turn(&mut s, "look"), "A bare hall.\n");
        assert_eq!(turn(&mut s, "look"), "A bare hall.\nDing.\n");
        assert_eq!(turn(&mut s, "look"), "A bare hall.\n");
    }

    #[test]
    fn blank_lines_are_not_turns() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        assert_eq!(turn(&mut s, "   "), "");
        assert_eq!(turn(&mut s, "look"), "A bare hall.\n");
    }

    #[test]
    fn save_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        turn(&mut s, "take lamp");
        turn(&mut s, "north");
        assert_eq!(turn(&mut s, "save slot1"), "Saved.\n");
        assert!(dir.path().join("slot1").exists());

        turn(&mut s, "south");
        assert_eq!(s.engine().state().location(), "hall");

        assert_eq!(turn(&mut s, "restore slot1"), "Restored.\nAn empty yard.\n");
        assert_eq!(s.engine().state().location(), "yard");
        assert_eq!(s.engine().state().parent_of("lamp"), Some("inventory"));
    }

    #[test]
    fn restore_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        assert!(turn(&mut s, "restore nothing-here").starts_with("Could not restore:"));
        assert_eq!(turn(&mut s, "save"), "Save to which file?\n");
        assert_eq!(s.engine().state().location(), "hall");
    }

    #[test]
    fn completion_words_include_visible_objects() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        let words = s.completion_words();
        assert!(words.iter().any(|w| w == "lamp"));
        assert!(words.iter().any(|w| w == "inventory"));
    }
}
