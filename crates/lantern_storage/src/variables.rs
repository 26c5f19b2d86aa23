//! String and numeric variables.
//!
//! A variable holds a sparse array of values. Index 0 is the plain value;
//! `name[3]` or `name[counter]` address other slots. Reading a slot that was
//! never written yields the kind's sentinel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value read from an unset numeric slot.
pub const INT_SENTINEL: i32 = -32767;

/// Value read from an unset string slot.
pub const STRING_SENTINEL: &str = "!";

/// Value types that can live in a variable.
pub trait VarValue: Clone {
    /// Placeholder used when the array grows past unset slots.
    fn filler() -> Self;
    /// Value returned for reads past the end.
    fn sentinel() -> Self;
}

impl VarValue for String {
    fn filler() -> Self {
        String::new()
    }

    fn sentinel() -> Self {
        STRING_SENTINEL.to_string()
    }
}

impl VarValue for i32 {
    fn filler() -> Self {
        0
    }

    fn sentinel() -> Self {
        INT_SENTINEL
    }
}

/// A named variable and its per-index values.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variable<T> {
    /// Variable name, as first set.
    pub name: String,
    /// Values by index.
    pub values: Vec<T>,
}

/// A string variable.
pub type StringVar = Variable<String>;

/// A numeric variable.
pub type IntVar = Variable<i32>;

impl<T: VarValue> Variable<T> {
    /// Creates a variable with no values.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Reads a slot, returning the sentinel past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> T {
        self.values.get(index).cloned().unwrap_or_else(T::sentinel)
    }

    /// Writes a slot, growing the array as needed.
    pub fn set(&mut self, index: usize, value: T) {
        if index >= self.values.len() {
            self.values.resize(index + 1, T::filler());
        }
        self.values[index] = value;
    }

    /// Highest index written so far.
    #[must_use]
    pub fn upper_bound(&self) -> usize {
        self.values.len().saturating_sub(1)
    }
}

/// The two variable kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    /// Holds text.
    String,
    /// Holds integers.
    Numeric,
}

impl std::fmt::Display for VarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Numeric => f.write_str("numeric"),
        }
    }
}

/// Result of setting a variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarChange {
    /// The value was stored. `onchange` carries the variable block's
    /// `onchange` script when slot 0 was written.
    Changed {
        /// Script to run after the change.
        onchange: Option<String>,
    },
    /// The name already belongs to the other kind; nothing was stored.
    KindConflict {
        /// Kind the name already has.
        existing: VarKind,
    },
    /// The name could not be parsed (for example `x[3` with no `]`).
    BadName,
}

/// Index part of a variable reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexRef<'a> {
    /// A decimal literal.
    Literal(usize),
    /// The name of a numeric variable holding the index.
    Variable(&'a str),
}

/// Splits `name[index]` into its base name and index.
///
/// Returns `None` for a malformed reference.
#[must_use]
pub fn parse_var_ref(name: &str) -> Option<(&str, Option<IndexRef<'_>>)> {
    let Some(open) = name.find('[') else {
        return Some((name, None));
    };
    let inner = name[open + 1..].strip_suffix(']')?;
    let base = &name[..open];
    let index = if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
        IndexRef::Literal(inner.parse().unwrap_or(0))
    } else {
        IndexRef::Variable(inner)
    };
    Some((base, Some(index)))
}
