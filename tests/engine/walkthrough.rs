//! Playing a small game turn by turn

use lantern_engine::{BufferHost, Engine};
use lantern_foundation::EngineConfig;
use lantern_language::load_str;

const GAME: &str = r"
define game <Lighthouse>
  game version <1.0>
  game author <K. Keeper>
  start <beach>
  command <wave> msg <You wave at the sea.>
end define

define room <beach>
  description <Sand and surf.>
  north <lighthouse>

  define object <shell>
    take <You pocket the shell.>
    article <it>
    examine <A spiral shell.>
  end define
end define

define room <lighthouse>
  description <A tall white tower.>
  south <beach>
  script inc <visits>
  command <climb> msg <The stairs go on forever.>

  define object <keeper>
    gender <she>
    speak msg <Mind the stairs.>
  end define
end define

define variable <visits>
  type numeric
  value <0>
  display <Visits: !>
end define
";

fn engine() -> Engine<BufferHost> {
    let model = load_str(GAME).unwrap();
    let config = EngineConfig::default().with_echo_commands(false);
    let mut engine = Engine::new(model, config, BufferHost::new());
    engine.start();
    engine
}

fn turn(e: &mut Engine<BufferHost>, input: &str) -> String {
    e.run_command(input);
    e.host_mut().take_output()
}

// =============================================================================
// Opening
// =============================================================================

#[test]
fn start_describes_first_room() {
    let mut e = engine();
    assert_eq!(e.host_mut().take_output(), "Sand and surf.\n");
    assert_eq!(e.state().location(), "beach");
    assert!(e.is_playing());
    assert_eq!(e.banner(), "Lighthouse, v1.0 | K. Keeper");
}

// =============================================================================
// Movement
// =============================================================================

#[test]
fn walking_runs_room_scripts() {
    let mut e = engine();
    e.host_mut().take_output();
    assert_eq!(turn(&mut e, "n"), "A tall white tower.\n");
    assert_eq!(turn(&mut e, "go south"), "Sand and surf.\n");
    assert_eq!(turn(&mut e, "north"), "A tall white tower.\n");
    assert_eq!(e.state().ivar("visits"), Some(2));
    assert_eq!(e.status_lines(), vec!["Visits: 2".to_string()]);
}

#[test]
fn room_commands_only_apply_in_their_room() {
    let mut e = engine();
    e.host_mut().take_output();
    assert_eq!(turn(&mut e, "wave"), "You wave at the sea.\n");
    assert!(turn(&mut e, "climb").starts_with("I don't understand"));
    turn(&mut e, "north");
    assert_eq!(turn(&mut e, "climb"), "The stairs go on forever.\n");
}

// =============================================================================
// Objects
// =============================================================================

#[test]
fn examine_take_and_drop() {
    let mut e = engine();
    e.host_mut().take_output();
    assert_eq!(turn(&mut e, "x shell"), "A spiral shell.\n");
    assert_eq!(turn(&mut e, "look at shell"), "Nothing out of the ordinary.\n");
    assert_eq!(turn(&mut e, "take shell"), "You pocket the shell.\n");
    assert_eq!(e.state().parent_of("shell"), Some("inventory"));

    turn(&mut e, "north");
    assert_eq!(turn(&mut e, "drop shell"), "You drop it.\n");
    assert_eq!(e.state().parent_of("shell"), Some("lighthouse"));
}

#[test]
fn objects_elsewhere_are_out_of_reach() {
    let mut e = engine();
    e.host_mut().take_output();
    assert_eq!(turn(&mut e, "talk to keeper"), "You don't see any keeper.\n");
    turn(&mut e, "north");
    assert_eq!(turn(&mut e, "talk to keeper"), "Mind the stairs.\n");
}

// =============================================================================
// Undo and quitting
// =============================================================================

#[test]
fn undo_walks_back_through_turns() {
    let mut e = engine();
    e.host_mut().take_output();
    turn(&mut e, "take shell");
    turn(&mut e, "north");

    assert_eq!(turn(&mut e, "undo"), "Undone.\n");
    assert_eq!(e.state().location(), "beach");
    assert_eq!(e.state().parent_of("shell"), Some("inventory"));

    assert_eq!(turn(&mut e, "undo"), "Undone.\n");
    assert_eq!(e.state().parent_of("shell"), Some("beach"));
}

#[test]
fn quit_ends_play() {
    let mut e = engine();
    e.host_mut().take_output();
    turn(&mut e, "quit");
    assert!(!e.is_active());
    assert_eq!(turn(&mut e, "north"), "");
    assert_eq!(e.state().location(), "beach");
}
