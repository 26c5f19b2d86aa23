//! Batch play of games loaded from disk

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use lantern_engine::BufferHost;
use lantern_foundation::EngineConfig;
use lantern_runtime::{Session, run_batch};

const MAIN: &str = "!include <world.lib>

define game <Ferry>
  start <dock>
  afterturn inc <turns>
end define

define text <intro>
All aboard!
end define

define variable <turns>
  type numeric
  value <0>
end define
";

const WORLD: &str = "define room <dock>
  description <|bThe dock.|xb>
  east <deck>
end define

define room <deck>
  description <The ferry deck.>
  west <dock>

  define object <ticket>
    take
    article <it>
  end define
end define
";

fn write_game(dir: &Path) -> PathBuf {
    fs::write(dir.join("world.lib"), WORLD).unwrap();
    let main = dir.join("ferry.asl");
    fs::write(&main, MAIN).unwrap();
    main
}

fn play(config: EngineConfig, input: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    let game = write_game(dir.path());
    let session = Session::open(&game, config, BufferHost::new()).unwrap();
    let mut out = Vec::new();
    run_batch(session, Cursor::new(input.to_string()), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn batch_play_prints_plain_text() {
    let config = EngineConfig::default().with_echo_commands(false);
    let out = play(config, "east\ntake ticket\ni\n");
    assert_eq!(
        out,
        "All aboard!\nThe dock.\nThe ferry deck.\nYou pick it up.\nYou are carrying:\nticket\n"
    );
}

#[test]
fn batch_play_echoes_commands() {
    let out = play(EngineConfig::default(), "east\n");
    assert!(out.contains("> east\n"));
    assert!(out.ends_with("The ferry deck.\n"));
}

#[test]
fn batch_play_stops_at_quit() {
    let config = EngineConfig::default().with_echo_commands(false);
    let out = play(config, "quit\neast\n");
    assert!(!out.contains("The ferry deck."));
}

#[test]
fn missing_game_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let result = Session::open(
        &dir.path().join("nowhere.asl"),
        EngineConfig::default(),
        BufferHost::new(),
    );
    assert!(result.is_err());
}
