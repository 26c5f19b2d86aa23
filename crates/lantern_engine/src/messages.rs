//! Built-in player messages.
//!
//! A game overrides any of these with an `error <name;text>` line in its
//! game block. The text goes through substitution before it is printed.

/// A default message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultMessage {
    /// Message name as used in `error` lines.
    pub name: &'static str,
    /// Text, possibly with `#...#` substitutions.
    pub text: &'static str,
    /// Capitalize the first letter after substitution.
    pub capitalize: bool,
}

const fn msg(name: &'static str, text: &'static str) -> DefaultMessage {
    DefaultMessage {
        name,
        text,
        capitalize: false,
    }
}

const fn msg_cap(name: &'static str, text: &'static str) -> DefaultMessage {
    DefaultMessage {
        name,
        text,
        capitalize: true,
    }
}

/// Every built-in message.
pub const DEFAULT_MESSAGES: [DefaultMessage; 23] = [
    msg(
        "badcommand",
        "I don't understand your command. Type HELP for a list of valid commands.",
    ),
    msg(
        "badgo",
        "I don't understand your use of 'GO' - you must either GO in some direction, or GO TO a place.",
    ),
    msg("badgive", "You didn't say who you wanted to give that to."),
    msg("badcharacter", "I can't see anybody of that name here."),
    msg("noitem", "You don't have that."),
    msg_cap(
        "itemunwanted",
        "#quest.error.gender# doesn't want #quest.error.article#.",
    ),
    msg("badlook", "You didn't say what you wanted to look at."),
    msg("badthing", "I can't see that here."),
    msg("defaultlook", "Nothing out of the ordinary."),
    msg_cap("defaultspeak", "#quest.error.gender# says nothing."),
    msg("baditem", "I can't see that anywhere."),
    msg("defaulttake", "You pick #quest.error.article# up."),
    msg("baduse", "You didn't say what you wanted to use that on."),
    msg("defaultuse", "You can't use that here."),
    msg("defaultout", "There's nowhere you can go out to around here."),
    msg("badplace", "You can't go there."),
    msg("defaultexamine", "Nothing out of the ordinary."),
    msg("badtake", "You can't take #quest.error.article#."),
    msg("cantdrop", "You can't drop that here."),
    msg("defaultdrop", "You drop #quest.error.article#."),
    msg("baddrop", "You are not carrying such a thing."),
    msg(
        "badpronoun",
        "I don't know what '#quest.error.pronoun#' you are referring to.",
    ),
    msg("badexamine", "You didn't say what you wanted to examine."),
];

/// Looks up a built-in message by name.
#[must_use]
pub fn default_message(name: &str) -> Option<&'static DefaultMessage> {
    DEFAULT_MESSAGES.iter().find(|m| m.name == name)
}

/// Upper-cases the first character.
#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The text shown by the `help` command.
pub const HELP_TEXT: &str = "|b|clQuick Help|xb|cb|n|n\
|cl|bMoving|xb|cb Type |bGO NORTH|xb, |bSOUTH|xb, |bE|xb, etc. \
To go into a place, type |bGO TO ...|xb . To leave a place, type |bOUT|xb or |bEXIT|xb.|n\
|cl|bObjects and Characters|xb|cb Use |bTAKE ...|xb, |bGIVE ... TO ...|xb, \
|bTALK|xb/|bSPEAK TO ...|xb, |bUSE ... ON|xb/|bWITH ...|xb, |bLOOK AT ...|xb, etc.|n\
|cl|bExit|xb|cb Type |bQUIT|xb to leave the game.|n\
|cl|bMisc|xb|cb Type |bABOUT|xb to get information on the current game, \
|bUNDO|xb to take back your last command.";
