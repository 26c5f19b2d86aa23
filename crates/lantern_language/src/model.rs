//! The static game model.
//!
//! A [`FileModel`] is the set of blocks read from a game file plus the
//! lookup indices the runtime needs. It is built once by
//! [`crate::build_model`] and never changes afterwards.
//!
//! Static property and action resolution lives here too: an object's own
//! lines are read in order, and every `type <parent>` line splices the
//! parent type's lines in at that point. Later lines override earlier ones.

use std::collections::HashMap;

use lantern_foundation::{Error, NameKey, Result, ci_eq};

use crate::lexer::{Tokens, is_param, param_contents};

/// Default ceiling for type chain traversal.
pub const DEFAULT_MAX_TYPE_DEPTH: usize = 32;

// =============================================================================
// Blocks
// =============================================================================

/// One `define ... end define` unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// The block category (`room`, `object`, `type`, ...).
    pub declared_type: String,
    /// The block name, as written.
    pub name: String,
    /// Enclosing room of a nested object, or `game` for nested variables.
    pub parent: Option<String>,
    /// Normalized body lines.
    pub lines: Vec<String>,
}

impl Block {
    /// Returns the text after the first line starting with `keyword`.
    #[must_use]
    pub fn find_line(&self, keyword: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| {
            let mut tokens = Tokens::new(line);
            (tokens.next_text() == keyword).then(|| tokens.rest())
        })
    }

    /// Iterates over lines whose first token is `keyword`, yielding the rest.
    pub fn lines_with<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lines.iter().filter_map(move |line| {
            let mut tokens = Tokens::new(line);
            (tokens.next_text() == keyword).then(|| tokens.rest())
        })
    }
}

// =============================================================================
// Body Lines
// =============================================================================

/// A body line as seen by property and action resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyLine<'a> {
    /// `properties <name>` or `properties <name=value>`.
    Property {
        /// Property name.
        name: &'a str,
        /// Value, empty for a plain flag.
        value: &'a str,
    },
    /// `properties <not name>`.
    NotProperty(&'a str),
    /// `action <name> script`.
    Action {
        /// Action name.
        name: &'a str,
        /// Script text.
        script: &'a str,
    },
    /// `type <parent>`.
    Type(&'a str),
    /// Anything else.
    Other,
}

impl<'a> BodyLine<'a> {
    /// Classifies a normalized body line.
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        let mut tokens = Tokens::new(line);
        let first = tokens.next_text();
        let param = tokens.next_text();
        if !is_param(param) {
            return Self::Other;
        }
        let contents = param_contents(param).trim();

        match first {
            "properties" => {
                if let Some(name) = contents.strip_prefix("not ") {
                    return Self::NotProperty(name.trim());
                }
                match contents.split_once('=') {
                    Some((name, value)) => Self::Property {
                        name: name.trim(),
                        value: value.trim(),
                    },
                    None => Self::Property {
                        name: contents,
                        value: "",
                    },
                }
            }
            "action" => Self::Action {
                name: contents,
                script: tokens.rest(),
            },
            "type" => Self::Type(contents),
            _ => Self::Other,
        }
    }
}

/// Outcome of matching one line against a property name.
///
/// `Some(Some(v))` asserts the property with value `v`, `Some(None)` negates
/// it, `None` says nothing about it.
#[must_use]
pub fn property_assertion(line: &str, prop: &str) -> Option<Option<String>> {
    match BodyLine::parse(line) {
        BodyLine::Property { name, value } if ci_eq(name, prop) => Some(Some(value.to_string())),
        BodyLine::NotProperty(name) if ci_eq(name, prop) => Some(None),
        _ => None,
    }
}

/// Returns the script if `line` defines action `act`.
#[must_use]
pub fn action_assertion<'a>(line: &'a str, act: &str) -> Option<&'a str> {
    match BodyLine::parse(line) {
        BodyLine::Action { name, script } if ci_eq(name, act) => Some(script),
        _ => None,
    }
}

// =============================================================================
// File Model
// =============================================================================

/// Categories whose names share one namespace.
const NAMED_CATEGORIES: [&str; 3] = ["game", "room", "object"];

/// All blocks of a loaded game plus lookup indices.
#[derive(Clone, Debug)]
pub struct FileModel {
    blocks: Vec<Block>,
    blocks_by_type: HashMap<String, Vec<usize>>,
    declared_type_by_name: HashMap<NameKey, String>,
    by_category_and_name: HashMap<(String, String), usize>,
    max_type_depth: usize,
}

impl Default for FileModel {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            blocks_by_type: HashMap::new(),
            declared_type_by_name: HashMap::new(),
            by_category_and_name: HashMap::new(),
            max_type_depth: DEFAULT_MAX_TYPE_DEPTH,
        }
    }
}

impl FileModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the type chain depth ceiling.
    #[must_use]
    pub fn with_max_type_depth(mut self, depth: usize) -> Self {
        self.max_type_depth = depth;
        self
    }

    /// Adds a block, returning its index.
    ///
    /// # Errors
    ///
    /// Returns an error if a game, room or object block reuses a name
    /// already taken by one of those categories.
    pub fn push_block(&mut self, block: Block) -> Result<usize> {
        let category = block.declared_type.to_ascii_lowercase();
        if NAMED_CATEGORIES.contains(&category.as_str()) {
            let key = NameKey::new(block.name.clone());
            if let Some(existing) = self.declared_type_by_name.get(&key) {
                return Err(Error::duplicate_name(
                    block.name.clone(),
                    existing.clone(),
                    category,
                ));
            }
            self.declared_type_by_name.insert(key, category.clone());
        }

        let index = self.blocks.len();
        self.by_category_and_name
            .entry((category.clone(), NameKey::normalize(&block.name)))
            .or_insert(index);
        self.blocks_by_type.entry(category).or_default().push(index);
        self.blocks.push(block);
        Ok(index)
    }

    /// Returns every block in build order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the block at `index`.
    #[must_use]
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Iterates over the blocks of one category in build order.
    pub fn blocks_of<'a>(&'a self, category: &str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks_by_type
            .get(&category.to_ascii_lowercase())
            .into_iter()
            .flatten()
            .map(|&i| &self.blocks[i])
    }

    /// Number of blocks in a category.
    #[must_use]
    pub fn count_of(&self, category: &str) -> usize {
        self.blocks_by_type
            .get(&category.to_ascii_lowercase())
            .map_or(0, Vec::len)
    }

    /// Finds a block by category and name, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, category: &str, name: &str) -> Option<&Block> {
        self.by_category_and_name
            .get(&(category.to_ascii_lowercase(), NameKey::normalize(name)))
            .map(|&i| &self.blocks[i])
    }

    /// Returns `game`, `room` or `object` for a declared name.
    #[must_use]
    pub fn declared_type_of(&self, name: &str) -> Option<&str> {
        self.declared_type_by_name
            .get(NameKey::normalize(name).as_str())
            .map(String::as_str)
    }

    /// Returns the game block.
    #[must_use]
    pub fn game_block(&self) -> Option<&Block> {
        self.find_by_name("game", "game")
    }

    /// Returns the game's title from the synthetic `game name` line.
    #[must_use]
    pub fn game_title(&self) -> Option<&str> {
        let game = self.game_block()?;
        game.lines.iter().find_map(|line| {
            let mut tokens = Tokens::new(line);
            (tokens.next_text() == "game" && tokens.next_text() == "name")
                .then(|| param_contents(tokens.next_text()))
        })
    }

    /// Finds the block that defines an object-like name.
    ///
    /// Objects, rooms, the game, and types are searched in that order.
    #[must_use]
    pub fn object_block(&self, name: &str) -> Option<&Block> {
        if let Some(category) = self.declared_type_of(name) {
            return self.find_by_name(category, name);
        }
        self.find_by_name("type", name)
    }

    /// Resolves a property from static definitions.
    ///
    /// Returns `Some(value)` when the property holds (`value` is empty for a
    /// plain flag) and `None` when it is absent or negated.
    #[must_use]
    pub fn get_obj_property(&self, obj: &str, prop: &str) -> Option<String> {
        let mut result = None;
        self.walk_lines(obj, |line| {
            if let Some(assertion) = property_assertion(line, prop) {
                result = assertion;
            }
        });
        result
    }

    /// True if the property holds statically.
    #[must_use]
    pub fn has_obj_property(&self, obj: &str, prop: &str) -> bool {
        self.get_obj_property(obj, prop).is_some()
    }

    /// Resolves an action script from static definitions.
    #[must_use]
    pub fn get_obj_action(&self, obj: &str, act: &str) -> Option<String> {
        let mut result = None;
        self.walk_lines(obj, |line| {
            if let Some(script) = action_assertion(line, act) {
                result = Some(script.to_string());
            }
        });
        result
    }

    /// True if the action is defined statically.
    #[must_use]
    pub fn has_obj_action(&self, obj: &str, act: &str) -> bool {
        self.get_obj_action(obj, act).is_some()
    }

    /// True if `obj` is `type_name` or inherits from it.
    #[must_use]
    pub fn obj_of_type(&self, obj: &str, type_name: &str) -> bool {
        if ci_eq(obj, type_name) {
            return true;
        }
        let mut found = false;
        self.walk_lines(obj, |line| {
            if let BodyLine::Type(parent) = BodyLine::parse(line) {
                found |= ci_eq(parent, type_name);
            }
        });
        found
    }

    /// Visits an object's lines in resolution order, expanding type chains.
    ///
    /// Traversal uses an explicit stack. Chains deeper than the configured
    /// ceiling are cut off with a warning.
    fn walk_lines<'a>(&'a self, obj: &str, mut visit: impl FnMut(&'a str)) {
        let Some(root) = self.object_block(obj) else {
            return;
        };

        let mut stack: Vec<(&Block, usize)> = vec![(root, 0)];
        while let Some((block, pos)) = stack.pop() {
            let Some(line) = block.lines.get(pos) else {
                continue;
            };
            stack.push((block, pos + 1));

            if let BodyLine::Type(parent) = BodyLine::parse(line) {
                visit(line);
                if stack.len() > self.max_type_depth {
                    log::warn!(
                        target: "lantern::model",
                        "type chain of '{obj}' exceeds depth {}",
                        self.max_type_depth
                    );
                    continue;
                }
                match self.find_by_name("type", parent) {
                    Some(parent_block) => stack.push((parent_block, 0)),
                    None => log::warn!(target: "lantern::model", "unknown type '{parent}'"),
                }
            } else {
                visit(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(category: &str, name: &str, lines: &[&str]) -> Block {
        Block {
            declared_type: category.to_string(),
            name: name.to_string(),
            parent: None,
            lines: lines.iter().map(ToString::to_string).collect(),
        }
    }

    fn model() -> FileModel {
        let mut model = FileModel::new();
        model
            .push_block(block("type", "default", &["properties <hidden>", "properties <weight=1>"]))
            .expect("unique");
        model
            .push_block(block("type", "heavy", &["type <default>", "properties <weight=9>"]))
            .expect("unique");
        model
            .push_block(block("object", "anvil", &[
                "type <heavy>",
                "action <take> msg <Too heavy.>"
            ]))
            .expect("unique");
        model
            .push_block(block("object", "feather", &[
                "type <default>",
                "properties <not hidden>"
            ]))
            .expect("unique");
        model
    }

    #[test]
    fn body_line_forms() {
        assert_eq!(BodyLine::parse("properties <lit>"), BodyLine::Property {
            name: "lit",
            value: ""
        });
        assert_eq!(BodyLine::parse("properties <size=big>"), BodyLine::Property {
            name: "size",
            value: "big"
        });
        assert_eq!(BodyLine::parse("properties <not lit>"), BodyLine::NotProperty("lit"));
        assert_eq!(BodyLine::parse("action <use> msg <Hi>"), BodyLine::Action {
            name: "use",
            script: "msg <Hi>"
        });
        assert_eq!(BodyLine::parse("type <heavy>"), BodyLine::Type("heavy"));
        assert_eq!(BodyLine::parse("north <hall>"), BodyLine::Other);
    }

    #[test]
    fn properties_inherit_through_type_chain() {
        let model = model();
        assert!(model.has_obj_property("anvil", "hidden"));
        assert_eq!(model.get_obj_property("anvil", "weight").as_deref(), Some("9"));
    }

    #[test]
    fn own_lines_override_inherited() {
        let model = model();
        assert!(!model.has_obj_property("feather", "hidden"));
        assert_eq!(model.get_obj_property("feather", "weight").as_deref(), Some("1"));
    }

    #[test]
    fn actions_resolve() {
        let model = model();
        assert_eq!(
            model.get_obj_action("ANVIL", "take").as_deref(),
            Some("msg <Too heavy.>")
        );
        assert!(!model.has_obj_action("feather", "take"));
    }

    #[test]
    fn type_membership_follows_chain() {
        let model = model();
        assert!(model.obj_of_type("anvil", "default"));
        assert!(model.obj_of_type("anvil", "Heavy"));
        assert!(model.obj_of_type("anvil", "anvil"));
        assert!(!model.obj_of_type("feather", "heavy"));
    }

    #[test]
    fn duplicate_names_across_categories_fail() {
        let mut model = model();
        let err = model
            .push_block(block("room", "Anvil", &[]))
            .expect_err("name taken by an object");
        assert!(err.to_string().contains("Anvil"));
    }

    #[test]
    fn cyclic_types_stop_at_ceiling() {
        let mut model = FileModel::new().with_max_type_depth(4);
        model.push_block(block("type", "a", &["type <b>"])).expect("unique");
        model.push_block(block("type", "b", &["type <a>"])).expect("unique");
        model.push_block(block("object", "thing", &["type <a>"])).expect("unique");
        assert!(!model.has_obj_property("thing", "hidden"));
        assert!(model.obj_of_type("thing", "b"));
    }
}
