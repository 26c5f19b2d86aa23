//! Case-insensitive names.
//!
//! Game files refer to rooms, objects, types and variables without regard to
//! case. Lookup tables are keyed by a [`NameKey`], which hashes and compares
//! on the lower-cased form while remembering the spelling it was created from.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Compares two names ignoring ASCII case.
#[must_use]
pub fn ci_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// A name usable as a case-insensitive map key.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NameKey {
    /// Lower-cased form used for hashing and equality.
    key: String,
    /// Spelling as first written.
    original: String,
}

impl NameKey {
    /// Creates a key from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let original = name.into();
        Self {
            key: original.to_ascii_lowercase(),
            original,
        }
    }

    /// Returns the normalized (lower-cased) form.
    #[must_use]
    pub fn as_key(&self) -> &str {
        &self.key
    }

    /// Returns the original spelling.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Normalizes a borrowed name for lookups without allocating a key.
    #[must_use]
    pub fn normalize(name: &str) -> String {
        name.to_ascii_lowercase()
    }
}

impl PartialEq for NameKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NameKey {}

impl Hash for NameKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Borrow<str> for NameKey {
    fn borrow(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameKey({:?})", self.original)
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl From<&str> for NameKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NameKey {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn keys_compare_case_insensitively() {
        assert_eq!(NameKey::new("Brass Key"), NameKey::new("brass key"));
        assert_ne!(NameKey::new("brass key"), NameKey::new("iron key"));
    }

    #[test]
    fn original_spelling_is_kept() {
        let key = NameKey::new("Great Hall");
        assert_eq!(key.original(), "Great Hall");
        assert_eq!(key.as_key(), "great hall");
        assert_eq!(key.to_string(), "Great Hall");
    }

    #[test]
    fn map_lookup_by_normalized_str() {
        let mut map = HashMap::new();
        map.insert(NameKey::new("Lamp"), 3);
        assert_eq!(map.get(NameKey::normalize("LAMP").as_str()), Some(&3));
    }

    #[test]
    fn ci_eq_ignores_case() {
        assert!(ci_eq("Inventory", "inventory"));
        assert!(!ci_eq("inventory", "inventor"));
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::NameKey;

        proptest! {
            #[test]
            fn upper_and_lower_spellings_are_one_key(name in "[a-zA-Z ]{0,16}") {
                prop_assert_eq!(
                    NameKey::new(name.to_ascii_uppercase()),
                    NameKey::new(name.to_ascii_lowercase())
                );
            }
        }
    }
}
