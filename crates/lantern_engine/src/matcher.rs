//! Command pattern matching.
//!
//! A pattern is literal text with `#name#` placeholders. Literals compare
//! case-insensitively, character by character. A placeholder captures the
//! shortest run of input that lets the rest of the pattern match, growing
//! one character at a time. `#@name#` marks a capture that names an object
//! and has to be resolved against the world before use.

/// One captured placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Placeholder name, without `#` or `@`.
    pub name: String,
    /// Captured input.
    pub text: String,
    /// True for `#@name#` placeholders.
    pub object_ref: bool,
}

impl Binding {
    /// Creates a binding.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>, object_ref: bool) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            object_ref,
        }
    }
}

/// Matches player input against a command pattern.
///
/// Returns the captures in pattern order, or `None` if the input does not
/// match. An unpaired `#` in the pattern never matches.
///
/// ```
/// use lantern_engine::matcher::match_command;
///
/// let bindings = match_command("take brass key", "take #@object#").unwrap();
/// assert_eq!(bindings[0].name, "object");
/// assert_eq!(bindings[0].text, "brass key");
/// assert!(match_command("take", "take #@object#").is_none());
/// ```
#[must_use]
pub fn match_command(input: &str, pattern: &str) -> Option<Vec<Binding>> {
    let input: Vec<char> = input.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let mut bindings = Vec::new();
    if match_from(&input, 0, &pattern, 0, &mut bindings) {
        log::trace!(target: "lantern::matcher", "matched with {bindings:?}");
        Some(bindings)
    } else {
        None
    }
}

fn match_from(
    input: &[char],
    mut i: usize,
    pattern: &[char],
    mut p: usize,
    bindings: &mut Vec<Binding>,
) -> bool {
    loop {
        if p == pattern.len() {
            return i == input.len();
        }
        if pattern[p] == '#' {
            let Some(len) = pattern[p + 1..].iter().position(|&c| c == '#') else {
                log::warn!(
                    target: "lantern::matcher",
                    "unpaired '#' in command pattern '{}'",
                    pattern.iter().collect::<String>()
                );
                return false;
            };
            let raw: String = pattern[p + 1..p + 1 + len].iter().collect();
            let (name, object_ref) = match raw.strip_prefix('@') {
                Some(name) => (name.to_string(), true),
                None => (raw, false),
            };
            let resume = p + len + 2;

            let mark = bindings.len();
            for end in i..=input.len() {
                bindings.truncate(mark);
                bindings.push(Binding::new(
                    name.clone(),
                    input[i..end].iter().collect::<String>(),
                    object_ref,
                ));
                if match_from(input, end, pattern, resume, bindings) {
                    return true;
                }
            }
            bindings.truncate(mark);
            return false;
        }
        if i == input.len() || !chars_eq(input[i], pattern[p]) {
            return false;
        }
        i += 1;
        p += 1;
    }
}

fn chars_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str, pattern: &str) -> Option<Vec<(String, String)>> {
        match_command(input, pattern)
            .map(|bs| bs.into_iter().map(|b| (b.name, b.text)).collect())
    }

    #[test]
    fn captures_object() {
        let bindings = match_command("take brass key", "take #@object#").expect("matches");
        assert_eq!(bindings, vec![Binding::new("object", "brass key", true)]);
    }

    #[test]
    fn placeholder_needs_its_boundary() {
        assert!(match_command("take", "take #@object#").is_none());
    }

    #[test]
    fn captures_direction() {
        assert_eq!(
            texts("go north", "go #@dir#"),
            Some(vec![("dir".to_string(), "north".to_string())])
        );
    }

    #[test]
    fn literals_are_case_insensitive() {
        assert!(match_command("LOOK", "look").is_some());
        assert!(match_command("looks", "look").is_none());
        assert!(match_command("loo", "look").is_none());
    }

    #[test]
    fn shortest_capture_first() {
        assert_eq!(
            texts("give apple to the old man", "give #@a# to #@b#"),
            Some(vec![
                ("a".to_string(), "apple".to_string()),
                ("b".to_string(), "the old man".to_string()),
            ])
        );
        assert_eq!(
            texts("use a to b to c", "use #x# to #y#"),
            Some(vec![
                ("x".to_string(), "a".to_string()),
                ("y".to_string(), "b to c".to_string()),
            ])
        );
    }

    #[test]
    fn plain_placeholders_are_not_object_refs() {
        let bindings = match_command("say hello", "say #word#").expect("matches");
        assert!(!bindings[0].object_ref);
    }

    #[test]
    fn unpaired_hash_never_matches() {
        assert!(match_command("take lamp", "take #object").is_none());
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::match_command;

        proptest! {
            #[test]
            fn captures_any_single_word(word in "[a-z]{1,12}") {
                let input = format!("take {word}");
                let bindings = match_command(&input, "take #@object#");
                prop_assert!(bindings.is_some());
                let bindings = bindings.unwrap_or_default();
                prop_assert_eq!(&bindings[0].text, &word);
            }

            #[test]
            fn never_panics(input in ".{0,24}", pattern in "[a-z #@]{0,16}") {
                let _ = match_command(&input, &pattern);
            }
        }
    }
}
