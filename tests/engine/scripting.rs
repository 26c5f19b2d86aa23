//! Game scripts reached through player commands

use lantern_engine::{BufferHost, Engine};
use lantern_foundation::EngineConfig;
use lantern_language::load_str;

const GAME: &str = r"
define game <Belfry>
  start <tower>
  command <ring bell> {
    msg <Clang!>
    inc <rings>
  }
  command <check> if (%rings% > 1) then msg <Loud.> else msg <Quiet.>
  command <double #n#> msg <$double(#n#)$>
  command <shout #word#> msg <$ucase(#word#)$!>
  command <count> do <countdown>
  command <pick> choose <colours>
end define

define room <tower>
  description <A draughty tower.>
end define

define variable <rings>
  type numeric
  value <0>
end define

define function <double>
  set numeric <result; $parameter(1)$ * 2>
  return <%result%>
end define

define procedure <countdown>
  for <i; 0; 3> msg <%i%>
end define

define selection <colours>
  info <Which colour?>
  choice <Red> msg <Red it is.>
  choice <Green> msg <Green it is.>
end define

define timer <chime>
  interval <1>
  enabled
  action msg <Chime.>
end define
";

fn engine_with(host: BufferHost) -> Engine<BufferHost> {
    let model = load_str(GAME).unwrap();
    let config = EngineConfig::default().with_echo_commands(false);
    let mut engine = Engine::new(model, config, host);
    engine.start();
    engine.host_mut().take_output();
    engine
}

fn engine() -> Engine<BufferHost> {
    engine_with(BufferHost::new())
}

fn turn(e: &mut Engine<BufferHost>, input: &str) -> String {
    e.run_command(input);
    e.host_mut().take_output()
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn brace_commands_run_every_line() {
    let mut e = engine();
    assert_eq!(turn(&mut e, "ring bell"), "Clang!\n");
    assert_eq!(e.state().ivar("rings"), Some(1));
}

#[test]
fn conditions_read_variables() {
    let mut e = engine();
    assert_eq!(turn(&mut e, "check"), "Quiet.\n");
    turn(&mut e, "ring bell");
    turn(&mut e, "ring bell");
    assert_eq!(turn(&mut e, "check"), "Loud.\n");
}

#[test]
fn captured_words_reach_functions() {
    let mut e = engine();
    assert_eq!(turn(&mut e, "double 21"), "42\n");
    assert_eq!(turn(&mut e, "shout hello"), "HELLO!\n");
}

#[test]
fn procedures_loop() {
    let mut e = engine();
    assert_eq!(turn(&mut e, "count"), "0\n1\n2\n");
}

#[test]
fn selections_ask_the_host() {
    let mut e = engine_with(BufferHost::new().with_choice(1));
    assert_eq!(turn(&mut e, "pick"), "Green it is.\n");
    assert_eq!(e.host().prompts(), ["Which colour?"]);
}

// =============================================================================
// Timers
// =============================================================================

#[test]
fn enabled_timers_fire_once_their_interval_passes() {
    let mut e = engine();
    e.tick_timers();
    assert_eq!(e.host_mut().take_output(), "");
    e.tick_timers();
    assert_eq!(e.host_mut().take_output(), "Chime.\n");
}

#[test]
fn timers_can_be_switched_by_script() {
    let mut e = engine();
    e.run_script("timeroff <chime>");
    for _ in 0..3 {
        e.tick_timers();
    }
    assert_eq!(e.host_mut().take_output(), "");
    assert!(e.state().timer("chime").is_some_and(|t| !t.running));
}
