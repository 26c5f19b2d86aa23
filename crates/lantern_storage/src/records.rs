//! Plain records making up the runtime state.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Live location and visibility of a game, room, or object.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectRecord {
    /// Object name, as declared.
    pub name: String,
    /// Containing room, `inventory`, or empty for nowhere.
    pub parent: String,
    /// Hidden objects are not listed or matched.
    pub hidden: bool,
    /// Invisible objects are not listed.
    pub invisible: bool,
}

impl ObjectRecord {
    /// Creates a visible record.
    #[must_use]
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            hidden: false,
            invisible: false,
        }
    }

    /// Builder method to mark the record hidden and invisible.
    #[must_use]
    pub fn concealed(mut self) -> Self {
        self.hidden = true;
        self.invisible = true;
        self
    }
}

/// One entry of the append-only property and action log.
///
/// `line` uses the normalized body forms: `properties <p>`,
/// `properties <not p>`, `properties <p=v>`, or `action <a> script`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyRecord {
    /// Object the entry applies to.
    pub owner: String,
    /// The asserted line.
    pub line: String,
}

/// One entry of the append-only dynamic exit log.
///
/// `line` is `exit <src;dest>`, `exit <dir> <src;dest>`, or
/// `destroy exit <dest>`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExitRecord {
    /// Room the entry applies to.
    pub source: String,
    /// The logged line.
    pub line: String,
}

/// A countdown timer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimerRecord {
    /// Timer name.
    pub name: String,
    /// Whether the timer counts down on each tick.
    pub running: bool,
    /// Ticks between firings.
    pub interval: u32,
    /// Ticks remaining before the next firing.
    pub time_left: u32,
}

impl TimerRecord {
    /// Creates a stopped timer with a zero interval.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            running: false,
            interval: 0,
            time_left: 0,
        }
    }
}
