//! Loading games split across several files

use std::fs;
use std::path::Path;

use lantern_foundation::ErrorKind;
use lantern_language::load;

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

#[test]
fn includes_are_spliced_in() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.asl",
        "!include <lib/rooms.lib>\ndefine game <Split>\n  start <hall>\nend define\n",
    );
    write(
        dir.path(),
        "lib/rooms.lib",
        "define room <hall>\n  north <attic>\nend define\n!include <attic.lib>\n",
    );
    write(dir.path(), "lib/attic.lib", "define room <attic>\nend define\n");

    let model = load(&dir.path().join("main.asl")).unwrap();
    assert!(model.find_by_name("room", "hall").is_some());
    assert!(model.find_by_name("room", "attic").is_some());
    assert_eq!(model.game_title(), Some("Split"));
}

#[test]
fn addto_reaches_blocks_in_other_files() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.asl",
        "!include <base.lib>\n\
         !addto game\n  command <xyzzy> msg <Nothing happens.>\n!end\n",
    );
    write(dir.path(), "base.lib", "define game <Base>\n  start <void>\nend define\ndefine room <void>\nend define\n");

    let model = load(&dir.path().join("main.asl")).unwrap();
    let game = model.game_block().unwrap();
    assert_eq!(game.find_line("command"), Some("<xyzzy> msg <Nothing happens.>"));
}

#[test]
fn recursive_includes_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.asl",
        "!include <loop.lib>\ndefine game <Loop>\nend define\n",
    );
    write(dir.path(), "loop.lib", "!include <loop.lib>\ndefine room <ring>\nend define\n");

    let model = load(&dir.path().join("main.asl")).unwrap();
    assert_eq!(model.count_of("room"), 1);
}

#[test]
fn missing_include_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.asl", "!include <gone.lib>\ndefine game <g>\nend define\n");

    let err = load(&dir.path().join("main.asl")).unwrap_err();
    match err.kind {
        ErrorKind::Include { path, .. } => assert!(path.ends_with("gone.lib")),
        other => panic!("expected include error, got {other:?}"),
    }
}

#[test]
fn missing_game_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(&dir.path().join("absent.asl")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
}
