//! Deriving the initial runtime state from a model.

use lantern_foundation::ci_eq;
use lantern_language::{Block, FileModel, Tokens, is_param, param_contents};

use crate::records::{ObjectRecord, TimerRecord};
use crate::state::RuntimeState;
use crate::variables::{IntVar, StringVar};

/// Builds the starting state of a game.
///
/// Problems in timer and variable declarations are logged and the faulty
/// line is ignored.
#[must_use]
pub fn initialize_state(model: &FileModel) -> RuntimeState {
    let mut state = RuntimeState::new();
    state.set_running(true);

    for game in model.blocks_of("game") {
        state.add_object(ObjectRecord::new(game.name.clone(), "").concealed());
        if let Some(start) = game.find_line("start") {
            if is_param(start) {
                state.set_location(param_contents(start).trim());
            }
        }
    }
    for room in model.blocks_of("room") {
        state.add_object(ObjectRecord::new(room.name.clone(), "").concealed());
    }
    for object in model.blocks_of("object") {
        let mut record =
            ObjectRecord::new(object.name.clone(), object.parent.clone().unwrap_or_default());
        record.hidden = model.has_obj_property(&object.name, "hidden");
        record.invisible = model.has_obj_property(&object.name, "invisible");
        state.add_object(record);
    }

    for timer in model.blocks_of("timer") {
        state.add_timer(read_timer(timer));
    }

    for variable in model.blocks_of("variable") {
        add_variable(&mut state, variable);
    }

    log::debug!(
        target: "lantern::state",
        "initial state: location '{}', {} objects",
        state.location(),
        state.objects().count()
    );
    state
}

fn read_timer(block: &Block) -> TimerRecord {
    let mut timer = TimerRecord::new(block.name.clone());
    let mut seen_interval = false;
    let mut seen_status = false;

    for line in &block.lines {
        let mut tokens = Tokens::new(line);
        match tokens.next_text() {
            "interval" => {
                if seen_interval {
                    log::warn!(target: "lantern::state", "timer '{}' has two intervals", block.name);
                }
                seen_interval = true;
                let param = tokens.next_text();
                match param_contents(param).trim().parse::<u32>() {
                    Ok(interval) if is_param(param) => timer.interval = interval,
                    _ => log::warn!(
                        target: "lantern::state",
                        "bad interval in timer '{}': {line}",
                        block.name
                    ),
                }
            }
            word @ ("enabled" | "disabled") => {
                if seen_status {
                    log::warn!(
                        target: "lantern::state",
                        "timer '{}' is both enabled and disabled",
                        block.name
                    );
                }
                seen_status = true;
                timer.running = word == "enabled";
            }
            _ => {}
        }
    }

    timer.time_left = timer.interval;
    timer
}

fn add_variable(state: &mut RuntimeState, block: &Block) {
    let mut is_string = false;
    let mut value: Option<&str> = None;

    for line in &block.lines {
        let mut tokens = Tokens::new(line);
        match tokens.next_text() {
            "type" => match tokens.next_text() {
                kind if ci_eq(kind, "string") => is_string = true,
                kind if ci_eq(kind, "numeric") => is_string = false,
                kind => log::warn!(
                    target: "lantern::state",
                    "variable '{}' has unknown type '{kind}'",
                    block.name
                ),
            },
            "value" => {
                let param = tokens.next_text();
                if is_param(param) {
                    value = Some(param_contents(param));
                } else {
                    log::warn!(target: "lantern::state", "bad value line: {line}");
                }
            }
            _ => {}
        }
    }

    if is_string {
        let mut var = StringVar::new(block.name.clone());
        var.set(0, value.unwrap_or_default().to_string());
        state.add_string_var(var);
    } else {
        let mut var = IntVar::new(block.name.clone());
        let number = value.map_or(0, |v| {
            v.trim().parse().unwrap_or_else(|_| {
                log::warn!(
                    target: "lantern::state",
                    "variable '{}' has non-numeric value '{v}'",
                    block.name
                );
                0
            })
        });
        var.set(0, number);
        state.add_int_var(var);
    }
}
