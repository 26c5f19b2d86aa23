//! The live game world.
//!
//! `RuntimeState` stores its record sequences in `im::Vector`, so cloning a
//! state for the undo ring shares structure with the original.
//!
//! Property, action and exit changes are appended to logs and never edited
//! in place. Lookups scan the logs most-recent-first and fall back to the
//! static model when nothing matches.

use im::Vector;
use lantern_foundation::ci_eq;
use lantern_language::FileModel;
use lantern_language::model::{action_assertion, property_assertion};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::records::{ExitRecord, ObjectRecord, PropertyRecord, TimerRecord};
use crate::variables::{IndexRef, IntVar, StringVar, VarChange, VarKind, parse_var_ref};

/// Mutable state of a game in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuntimeState {
    running: bool,
    location: String,
    properties: Vector<PropertyRecord>,
    objects: Vector<ObjectRecord>,
    exits: Vector<ExitRecord>,
    timers: Vector<TimerRecord>,
    string_vars: Vector<StringVar>,
    int_vars: Vector<IntVar>,
}

impl RuntimeState {
    /// Creates an empty, stopped state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Game status
    // -------------------------------------------------------------------------

    /// Whether the game is still being played.
    #[must_use]
    pub const fn running(&self) -> bool {
        self.running
    }

    /// Starts or ends the game.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Name of the room the player is in.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Moves the player without running any room scripts.
    pub fn set_location(&mut self, room: impl Into<String>) {
        self.location = room.into();
    }

    // -------------------------------------------------------------------------
    // Objects
    // -------------------------------------------------------------------------

    /// Iterates over every object record.
    pub fn objects(&self) -> impl DoubleEndedIterator<Item = &ObjectRecord> + '_ {
        self.objects.iter()
    }

    /// Adds an object record.
    pub fn add_object(&mut self, record: ObjectRecord) {
        self.objects.push_back(record);
    }

    fn object_index(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|o| ci_eq(&o.name, name))
    }

    /// Finds an object record by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectRecord> {
        self.object_index(name).and_then(|i| self.objects.get(i))
    }

    fn object_mut(&mut self, name: &str) -> Option<&mut ObjectRecord> {
        let index = self.object_index(name)?;
        self.objects.get_mut(index)
    }

    /// Returns where an object is, or `None` if it does not exist.
    #[must_use]
    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.object(name).map(|o| o.parent.as_str())
    }

    /// Moves an object. Returns false if it does not exist.
    pub fn move_object(&mut self, name: &str, dest: &str) -> bool {
        match self.object_mut(name) {
            Some(record) => {
                record.parent = dest.to_string();
                true
            }
            None => false,
        }
    }

    /// Sets an object's hidden flag. Returns false if it does not exist.
    pub fn set_hidden(&mut self, name: &str, hidden: bool) -> bool {
        let Some(record) = self.object_mut(name) else {
            return false;
        };
        record.hidden = hidden;
        true
    }

    /// Sets an object's invisible flag. Returns false if it does not exist.
    pub fn set_invisible(&mut self, name: &str, invisible: bool) -> bool {
        let Some(record) = self.object_mut(name) else {
            return false;
        };
        record.invisible = invisible;
        true
    }

    // -------------------------------------------------------------------------
    // Properties and actions
    // -------------------------------------------------------------------------

    /// Iterates over the property log, oldest first.
    pub fn properties(&self) -> impl DoubleEndedIterator<Item = &PropertyRecord> + '_ {
        self.properties.iter()
    }

    /// Appends a raw line to the property log.
    pub fn push_property(&mut self, owner: impl Into<String>, line: impl Into<String>) {
        self.properties.push_back(PropertyRecord {
            owner: owner.into(),
            line: line.into(),
        });
    }

    /// Asserts `prop` on `obj`. `prop` may be `name`, `not name` or
    /// `name=value`.
    pub fn set_obj_property(&mut self, obj: &str, prop: &str) {
        self.push_property(obj, format!("properties <{prop}>"));
    }

    /// Binds an action script on `obj`.
    pub fn set_obj_action(&mut self, obj: &str, name: &str, script: &str) {
        self.push_property(obj, format!("action <{name}> {script}"));
    }

    /// Resolves a property: live log first, then static definitions.
    ///
    /// Returns `Some(value)` when the property holds and `None` when it is
    /// absent or negated.
    #[must_use]
    pub fn get_obj_property(&self, model: &FileModel, obj: &str, prop: &str) -> Option<String> {
        for record in self.properties.iter().rev() {
            if ci_eq(&record.owner, obj) {
                if let Some(assertion) = property_assertion(&record.line, prop) {
                    return assertion;
                }
            }
        }
        model.get_obj_property(obj, prop)
    }

    /// True if the property currently holds.
    #[must_use]
    pub fn has_obj_property(&self, model: &FileModel, obj: &str, prop: &str) -> bool {
        self.get_obj_property(model, obj, prop).is_some()
    }

    /// Resolves an action script: live log first, then static definitions.
    #[must_use]
    pub fn get_obj_action(&self, model: &FileModel, obj: &str, act: &str) -> Option<String> {
        for record in self.properties.iter().rev() {
            if ci_eq(&record.owner, obj) {
                if let Some(script) = action_assertion(&record.line, act) {
                    return Some(script.to_string());
                }
            }
        }
        model.get_obj_action(obj, act)
    }

    /// True if the action is currently defined.
    #[must_use]
    pub fn has_obj_action(&self, model: &FileModel, obj: &str, act: &str) -> bool {
        self.get_obj_action(model, obj, act).is_some()
    }

    // -------------------------------------------------------------------------
    // Exits
    // -------------------------------------------------------------------------

    /// Iterates over the exit log, oldest first.
    pub fn exits(&self) -> impl DoubleEndedIterator<Item = &ExitRecord> + '_ {
        self.exits.iter()
    }

    /// Appends a raw line to the exit log.
    pub fn push_exit(&mut self, source: impl Into<String>, line: impl Into<String>) {
        self.exits.push_back(ExitRecord {
            source: source.into(),
            line: line.into(),
        });
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// Iterates over every timer.
    pub fn timers(&self) -> impl Iterator<Item = &TimerRecord> + '_ {
        self.timers.iter()
    }

    /// Adds a timer.
    pub fn add_timer(&mut self, timer: TimerRecord) {
        self.timers.push_back(timer);
    }

    /// Finds a timer by name.
    #[must_use]
    pub fn timer(&self, name: &str) -> Option<&TimerRecord> {
        self.timers.iter().find(|t| ci_eq(&t.name, name))
    }

    /// Finds a timer by name for modification.
    pub fn timer_mut(&mut self, name: &str) -> Option<&mut TimerRecord> {
        let index = self.timers.iter().position(|t| ci_eq(&t.name, name))?;
        self.timers.get_mut(index)
    }

    /// Number of timers.
    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Returns the timer at `index` for modification.
    pub fn timer_at_mut(&mut self, index: usize) -> Option<&mut TimerRecord> {
        self.timers.get_mut(index)
    }

    // -------------------------------------------------------------------------
    // Variables
    // -------------------------------------------------------------------------

    /// Iterates over the string variables.
    pub fn string_vars(&self) -> impl Iterator<Item = &StringVar> + '_ {
        self.string_vars.iter()
    }

    /// Iterates over the numeric variables.
    pub fn int_vars(&self) -> impl Iterator<Item = &IntVar> + '_ {
        self.int_vars.iter()
    }

    /// Adds a string variable without any kind check.
    pub fn add_string_var(&mut self, var: StringVar) {
        self.string_vars.push_back(var);
    }

    /// Adds a numeric variable without any kind check.
    pub fn add_int_var(&mut self, var: IntVar) {
        self.int_vars.push_back(var);
    }

    /// Returns the kind of an existing variable.
    #[must_use]
    pub fn var_kind(&self, base: &str) -> Option<VarKind> {
        if self.string_vars.iter().any(|v| ci_eq(&v.name, base)) {
            Some(VarKind::String)
        } else if self.int_vars.iter().any(|v| ci_eq(&v.name, base)) {
            Some(VarKind::Numeric)
        } else {
            None
        }
    }

    /// Splits `name[index]` and resolves the index.
    ///
    /// A variable index reads the named numeric variable; negative or
    /// undefined values become 0.
    #[must_use]
    pub fn resolve_var_ref<'a>(&self, name: &'a str) -> Option<(&'a str, usize)> {
        let (base, index) = parse_var_ref(name.trim())?;
        let index = match index {
            None => 0,
            Some(IndexRef::Literal(i)) => i,
            Some(IndexRef::Variable(var)) => self
                .ivar(var)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(0),
        };
        Some((base.trim(), index))
    }

    /// Reads a string variable, honoring `[index]` syntax.
    ///
    /// Returns `None` if the variable is undefined or the name malformed.
    #[must_use]
    pub fn svar(&self, name: &str) -> Option<String> {
        let (base, index) = self.resolve_var_ref(name)?;
        self.svar_at(base, index)
    }

    /// Reads one slot of a string variable.
    #[must_use]
    pub fn svar_at(&self, base: &str, index: usize) -> Option<String> {
        self.string_vars
            .iter()
            .find(|v| ci_eq(&v.name, base))
            .map(|v| v.get(index))
    }

    /// Reads a numeric variable, honoring `[index]` syntax.
    ///
    /// Returns `None` if the variable is undefined or the name malformed.
    #[must_use]
    pub fn ivar(&self, name: &str) -> Option<i32> {
        let (base, index) = self.resolve_var_ref(name)?;
        self.ivar_at(base, index)
    }

    /// Reads one slot of a numeric variable.
    #[must_use]
    pub fn ivar_at(&self, base: &str, index: usize) -> Option<i32> {
        self.int_vars
            .iter()
            .find(|v| ci_eq(&v.name, base))
            .map(|v| v.get(index))
    }

    /// Highest index written for a variable of either kind.
    #[must_use]
    pub fn upper_bound(&self, base: &str) -> Option<usize> {
        self.string_vars
            .iter()
            .find(|v| ci_eq(&v.name, base))
            .map(StringVar::upper_bound)
            .or_else(|| {
                self.int_vars
                    .iter()
                    .find(|v| ci_eq(&v.name, base))
                    .map(IntVar::upper_bound)
            })
    }

    /// Sets a string variable, creating it if needed.
    ///
    /// Fails with [`VarChange::KindConflict`] if the name is numeric.
    pub fn set_svar(&mut self, model: &FileModel, name: &str, value: impl Into<String>) -> VarChange {
        let Some((base, index)) = self.resolve_var_ref(name) else {
            return VarChange::BadName;
        };
        let position = match self.string_vars.iter().position(|v| ci_eq(&v.name, base)) {
            Some(position) => position,
            None => {
                if self.int_vars.iter().any(|v| ci_eq(&v.name, base)) {
                    return VarChange::KindConflict {
                        existing: VarKind::Numeric,
                    };
                }
                self.string_vars.push_back(StringVar::new(base));
                self.string_vars.len() - 1
            }
        };
        if let Some(var) = self.string_vars.get_mut(position) {
            var.set(index, value.into());
        }
        changed(model, base, index)
    }

    /// Sets a numeric variable, creating it if needed.
    ///
    /// Fails with [`VarChange::KindConflict`] if the name holds strings.
    pub fn set_ivar(&mut self, model: &FileModel, name: &str, value: i32) -> VarChange {
        let Some((base, index)) = self.resolve_var_ref(name) else {
            return VarChange::BadName;
        };
        let position = match self.int_vars.iter().position(|v| ci_eq(&v.name, base)) {
            Some(position) => position,
            None => {
                if self.string_vars.iter().any(|v| ci_eq(&v.name, base)) {
                    return VarChange::KindConflict {
                        existing: VarKind::String,
                    };
                }
                self.int_vars.push_back(IntVar::new(base));
                self.int_vars.len() - 1
            }
        };
        if let Some(var) = self.int_vars.get_mut(position) {
            var.set(index, value);
        }
        changed(model, base, index)
    }
}

/// Builds the change report, attaching the block's last `onchange` script.
fn changed(model: &FileModel, base: &str, index: usize) -> VarChange {
    let onchange = if index == 0 {
        model
            .find_by_name("variable", base)
            .and_then(|block| block.lines_with("onchange").last())
            .filter(|script| !script.is_empty())
            .map(ToString::to_string)
    } else {
        None
    };
    VarChange::Changed { onchange }
}
