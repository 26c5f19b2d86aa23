//! Loading games from text

use lantern_foundation::ErrorKind;
use lantern_language::{FileModel, load_str};

const GAME: &str = r"
' A small test game
define game <Harbour>
  game version <0.3>
  start <quay>
  command <ring bell> {
    msg <Clang!>
    inc <rings>
  }
end define

define type <heavy>
  properties <weight=5; not portable>
end define

define room <quay>
  description <Ropes and crates.>   ' trailing comment
  north <warehouse>

  define object <anvil>
    type <heavy>
    alias <iron anvil>
  end define
end define

define room <warehouse>
  description <Dark and dusty.>
end define

define variable <rings>
  type numeric
  value <0>
end define
";

fn model() -> FileModel {
    load_str(GAME).unwrap()
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn blocks_are_indexed_by_category() {
    let model = model();
    assert_eq!(model.count_of("room"), 2);
    assert_eq!(model.count_of("object"), 1);
    assert_eq!(model.count_of("type"), 1);
    assert!(model.find_by_name("ROOM", "Quay").is_some());
    assert_eq!(model.declared_type_of("anvil"), Some("object"));
}

#[test]
fn game_title_comes_from_header() {
    let model = model();
    assert_eq!(model.game_title(), Some("Harbour"));
    assert_eq!(model.game_block().map(|b| b.name.as_str()), Some("game"));
}

#[test]
fn comments_are_gone() {
    let model = model();
    let quay = model.find_by_name("room", "quay").unwrap();
    assert!(quay.lines.iter().all(|l| !l.contains('\'')));
    assert_eq!(
        model.get_obj_property("quay", "description").as_deref(),
        Some("Ropes and crates.")
    );
}

#[test]
fn brace_bodies_become_procedures() {
    let model = model();
    let body = model.find_by_name("procedure", "!intproc1").unwrap();
    assert_eq!(body.lines, vec!["msg <Clang!>", "inc <rings>"]);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn properties_inherit_through_types() {
    let model = model();
    assert_eq!(model.get_obj_property("anvil", "weight").as_deref(), Some("5"));
    assert!(!model.has_obj_property("anvil", "portable"));
    assert!(model.obj_of_type("anvil", "heavy"));
    assert_eq!(
        model.get_obj_property("anvil", "alias").as_deref(),
        Some("iron anvil")
    );
}

#[test]
fn unknown_objects_have_no_properties() {
    let model = model();
    assert!(model.get_obj_property("ghost", "alias").is_none());
    assert!(!model.has_obj_action("ghost", "look"));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn game_block_is_required() {
    let err = load_str("define room <x>\nend define\n").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingGameBlock));
}

#[test]
fn names_are_unique_across_rooms_and_objects() {
    let err = load_str(
        "define game <g>\nend define\n\
         define room <cellar>\nend define\n\
         define object <Cellar>\nend define\n",
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateName { .. }));
}

#[test]
fn unclosed_braces_are_fatal() {
    let err = load_str("define game <g>\n  startscript {\n    msg <hi>\nend define\n").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnterminatedBrace { .. }));
}
