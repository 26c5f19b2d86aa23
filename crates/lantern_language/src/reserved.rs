//! Reserved keyword tables used while extracting blocks.
//!
//! The tables are plain immutable data. Build one with
//! [`ReservedWords::standard`] and hand it to the model builder.

use std::collections::HashSet;

/// Keywords recognized in the body of `room`, `object` and `type` blocks.
#[derive(Clone, Debug)]
pub struct ReservedWords {
    flags: HashSet<&'static str>,
    property_or_action: HashSet<&'static str>,
}

/// Bare keywords that always mean `properties <kw>`.
const STANDARD_FLAGS: [&str; 2] = ["hidden", "invisible"];

/// Keywords that take a value parameter or a script.
const STANDARD_PROPERTY_OR_ACTION: [&str; 17] = [
    "look",
    "examine",
    "speak",
    "take",
    "use",
    "gain",
    "lose",
    "description",
    "alias",
    "prefix",
    "suffix",
    "detail",
    "gender",
    "article",
    "displaytype",
    "indescription",
    "script",
];

impl ReservedWords {
    /// Returns the keyword tables of the standard game language.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            flags: STANDARD_FLAGS.into_iter().collect(),
            property_or_action: STANDARD_PROPERTY_OR_ACTION.into_iter().collect(),
        }
    }

    /// Returns an empty table, which leaves every body line untouched.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            flags: HashSet::new(),
            property_or_action: HashSet::new(),
        }
    }

    /// Builder method to add a flag keyword.
    #[must_use]
    pub fn with_flag(mut self, keyword: &'static str) -> Self {
        self.flags.insert(keyword);
        self
    }

    /// Builder method to add a property-or-action keyword.
    #[must_use]
    pub fn with_property_or_action(mut self, keyword: &'static str) -> Self {
        self.property_or_action.insert(keyword);
        self
    }

    /// True if `word` is a bare flag keyword.
    #[must_use]
    pub fn is_flag(&self, word: &str) -> bool {
        self.flags.contains(word)
    }

    /// True if `word` takes a value or a script.
    #[must_use]
    pub fn is_property_or_action(&self, word: &str) -> bool {
        self.property_or_action.contains(word)
    }
}

impl Default for ReservedWords {
    fn default() -> Self {
        Self::standard()
    }
}
