//! Saving and restoring games through the session

use std::fs;
use std::path::{Path, PathBuf};

use lantern_engine::BufferHost;
use lantern_foundation::EngineConfig;
use lantern_runtime::{Session, load_from_file};

const GAME: &str = "define game <Vault>
  start <lobby>
end define

define room <lobby>
  description <A marble lobby.>
  down <vault>

  define object <key>
    take
    article <it>
  end define
end define

define room <vault>
  description <Rows of boxes.>
  up <lobby>
  script inc <visits>
end define

define variable <visits>
  type numeric
  value <0>
end define
";

fn write_game(dir: &Path) -> PathBuf {
    let path = dir.join("vault.asl");
    fs::write(&path, GAME).unwrap();
    path
}

fn open(game: &Path) -> Session<BufferHost> {
    let config = EngineConfig::default().with_echo_commands(false);
    let mut session = Session::open(game, config, BufferHost::new()).unwrap();
    session.start();
    session.engine_mut().host_mut().take_output();
    session
}

fn turn(s: &mut Session<BufferHost>, line: &str) -> String {
    s.handle_line(line);
    s.engine_mut().host_mut().take_output()
}

#[test]
fn saves_land_next_to_the_game_file() {
    let dir = tempfile::tempdir().unwrap();
    let game = write_game(dir.path());
    let mut s = open(&game);

    turn(&mut s, "take key");
    turn(&mut s, "down");
    assert_eq!(turn(&mut s, "save vault.sav"), "Saved.\n");

    let saved = load_from_file(dir.path().join("vault.sav")).unwrap();
    assert_eq!(&saved, s.engine().state());
}

#[test]
fn restore_in_a_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let game = write_game(dir.path());

    let mut first = open(&game);
    turn(&mut first, "take key");
    turn(&mut first, "down");
    turn(&mut first, "save slot");

    let mut second = open(&game);
    assert_eq!(turn(&mut second, "restore slot"), "Restored.\nRows of boxes.\n");
    assert_eq!(second.engine().state().location(), "vault");
    assert_eq!(second.engine().state().parent_of("key"), Some("inventory"));
    assert_eq!(second.engine().state().ivar("visits"), Some(1));
}

#[test]
fn undo_history_starts_over_after_restore() {
    let dir = tempfile::tempdir().unwrap();
    let game = write_game(dir.path());

    let mut s = open(&game);
    turn(&mut s, "down");
    turn(&mut s, "save slot");
    turn(&mut s, "up");

    turn(&mut s, "restore slot");
    assert_eq!(
        turn(&mut s, "undo"),
        "(No more undo information available!)\n"
    );
    assert_eq!(turn(&mut s, "up"), "A marble lobby.\n");
    assert_eq!(turn(&mut s, "undo"), "Undone.\n");
    assert_eq!(s.engine().state().location(), "vault");
}

#[test]
fn corrupt_save_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let game = write_game(dir.path());
    fs::write(dir.path().join("broken.sav"), b"not a save").unwrap();

    let mut s = open(&game);
    assert!(turn(&mut s, "restore broken.sav").starts_with("Could not restore:"));
    assert_eq!(s.engine().state().location(), "lobby");
}
