//! Model building.
//!
//! Blocks are extracted one category at a time in a fixed order, so that
//! for example every `type` block exists before rooms and objects decide
//! whether to inherit from `defaultroom` or `default`.
//!
//! Rooms may nest object definitions and the game block may nest variable
//! definitions. Any other nested `define` is skipped as a whole.

use lantern_foundation::{Error, ErrorContext, ErrorKind, Result};

use crate::lexer::{Tokens, first_token, is_param, param_contents};
use crate::model::{Block, BodyLine, FileModel};
use crate::reserved::ReservedWords;
use crate::static_eval::StaticVars;

/// Block categories in extraction order.
pub const CATEGORY_ORDER: [&str; 11] = [
    "game",
    "type",
    "room",
    "variable",
    "object",
    "procedure",
    "function",
    "selection",
    "synonyms",
    "text",
    "timer",
];

/// Categories whose bodies go through reserved-word normalization.
const NORMALIZED_CATEGORIES: [&str; 4] = ["game", "type", "room", "object"];

// =============================================================================
// Block Spans
// =============================================================================

/// Line range of one `define` block within the preprocessed stream.
#[derive(Debug)]
struct Span {
    header: usize,
    end: usize,
    category: String,
    name: String,
    children: Vec<Span>,
}

/// Pairs every `define` header with its `end define`.
fn scan_spans(lines: &[String]) -> Result<Vec<Span>> {
    let mut top = Vec::new();
    let mut open: Vec<Span> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let mut tokens = Tokens::new(line);
        match tokens.next_text() {
            "define" => {
                let category = tokens.next_text().to_ascii_lowercase();
                let name = param_contents(tokens.next_text()).trim().to_string();
                open.push(Span {
                    header: i,
                    end: i,
                    category,
                    name,
                    children: Vec::new(),
                });
            }
            "end" if tokens.next_text() == "define" => match open.pop() {
                Some(mut span) => {
                    span.end = i;
                    match open.last_mut() {
                        Some(parent) => parent.children.push(span),
                        None => top.push(span),
                    }
                }
                None => log::warn!(target: "lantern::load", "'end define' without a block"),
            },
            _ => {}
        }
    }

    match open.into_iter().next() {
        Some(unclosed) => Err(Error::new(ErrorKind::UnterminatedBlock {
            header: lines[unclosed.header].clone(),
        })
        .with_context(ErrorContext::new().with_line(unclosed.header + 1))),
        None => Ok(top),
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds a [`FileModel`] from preprocessed lines.
pub struct ModelBuilder<'a> {
    words: &'a ReservedWords,
    vars: StaticVars,
    model: FileModel,
}

impl<'a> ModelBuilder<'a> {
    /// Creates a builder using the given keyword tables.
    #[must_use]
    pub fn new(words: &'a ReservedWords) -> Self {
        Self {
            words,
            vars: StaticVars::new(),
            model: FileModel::new(),
        }
    }

    /// Runs every extraction pass.
    ///
    /// # Errors
    ///
    /// Returns an error for an unclosed block, a duplicate game, room or
    /// object name, an unmatched substitution marker in a property list, or
    /// a file without a game block.
    pub fn build(mut self, lines: &[String]) -> Result<FileModel> {
        let spans = scan_spans(lines)?;
        self.vars = StaticVars::collect(lines);

        for category in CATEGORY_ORDER {
            for span in &spans {
                if span.category == category {
                    self.extract(lines, span, None)?;
                }
                let nested = matches!(
                    (category, span.category.as_str()),
                    ("object", "room") | ("variable", "game")
                );
                if nested {
                    let parent = if span.category == "game" {
                        "game".to_string()
                    } else {
                        span.name.clone()
                    };
                    for child in span.children.iter().filter(|c| c.category == category) {
                        self.extract(lines, child, Some(parent.clone()))?;
                    }
                }
            }
        }

        if self.model.count_of("game") == 0 {
            return Err(Error::new(ErrorKind::MissingGameBlock));
        }
        log::debug!(
            target: "lantern::load",
            "built model with {} blocks",
            self.model.blocks().len()
        );
        Ok(self.model)
    }

    fn extract(&mut self, lines: &[String], span: &Span, parent: Option<String>) -> Result<()> {
        let normalize = NORMALIZED_CATEGORIES.contains(&span.category.as_str());
        let mut body = Vec::new();

        let (name, title) = if span.category == "game" {
            ("game".to_string(), Some(span.name.clone()))
        } else {
            (span.name.clone(), None)
        };
        if let Some(title) = title {
            body.push(format!("game name <{title}>"));
        }

        let mut children = span.children.iter().peekable();
        let mut i = span.header + 1;
        while i < span.end {
            if let Some(child) = children.next_if(|c| c.header == i) {
                i = child.end + 1;
                continue;
            }
            let line = &lines[i];
            if normalize {
                let normalized = self
                    .normalize_line(line)
                    .map_err(|e| e.with_context(ErrorContext::new().with_line(i + 1)))?;
                body.extend(normalized);
            } else {
                body.push(line.clone());
            }
            i += 1;
        }

        let default_type = match span.category.as_str() {
            "room" => Some("defaultroom"),
            "object" => Some("default"),
            _ => None,
        };
        if let Some(default_type) = default_type {
            let declares_type = body
                .iter()
                .any(|l| matches!(BodyLine::parse(l), BodyLine::Type(_)));
            if !declares_type && self.model.find_by_name("type", default_type).is_some() {
                body.insert(0, format!("type <{default_type}>"));
            }
        }

        self.model
            .push_block(Block {
                declared_type: span.category.clone(),
                name,
                parent,
                lines: body,
            })
            .map_err(|e| {
                e.with_context(
                    ErrorContext::new()
                        .with_line(span.header + 1)
                        .with_frame(lines[span.header].clone()),
                )
            })?;
        Ok(())
    }

    /// Rewrites one body line into its normalized form(s).
    fn normalize_line(&self, line: &str) -> Result<Vec<String>> {
        let mut tokens = Tokens::new(line);
        let keyword = tokens.next_text();
        let rest = tokens.rest();

        if keyword == "properties" && is_param(rest) {
            let expanded = self.vars.eval(param_contents(rest))?;
            return Ok(expanded
                .split(';')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| format!("properties <{item}>"))
                .collect());
        }

        if keyword == "use" || keyword == "give" {
            return Ok(vec![canonical_verb_line(keyword, rest)]);
        }

        if self.words.is_flag(keyword) && rest.is_empty() {
            return Ok(vec![format!("properties <{keyword}>")]);
        }

        if self.words.is_property_or_action(keyword) {
            let normalized = if rest.is_empty() {
                format!("properties <{keyword}>")
            } else if is_param(first_token(rest)) {
                format!("properties <{keyword}={}>", param_contents(first_token(rest)))
            } else {
                format!("action <{keyword}> {rest}")
            };
            return Ok(vec![normalized]);
        }

        Ok(vec![line.to_string()])
    }
}

/// Canonicalizes `use` and `give` lines into action or property form.
///
/// | written                        | normalized                         |
/// |--------------------------------|------------------------------------|
/// | `use on anything S`            | `action <use on anything> S`       |
/// | `use on <X> S`                 | `action <use on X> S`              |
/// | `use anything S`               | `action <use anything> S`          |
/// | `use <X> S`                    | `action <use X> S`                 |
/// | `use <text>`                   | `properties <use=text>`            |
/// | `use S`                        | `action <use> S`                   |
///
/// `give` follows the same table with `to` in place of `on`.
#[must_use]
pub fn canonical_verb_line(verb: &str, rest: &str) -> String {
    let connective = if verb == "use" { "on" } else { "to" };
    let mut tokens = Tokens::new(rest);
    let first = tokens.next_text();

    if first == connective {
        let target = tokens.next_text();
        if target == "anything" {
            return format!("action <{verb} {connective} anything> {}", tokens.rest());
        }
        if is_param(target) {
            return format!(
                "action <{verb} {connective} {}> {}",
                param_contents(target).trim(),
                tokens.rest()
            );
        }
    } else if first == "anything" {
        return format!("action <{verb} anything> {}", tokens.rest());
    } else if is_param(first) {
        let contents = param_contents(first).trim();
        if tokens.rest().is_empty() {
            return format!("properties <{verb}={contents}>");
        }
        return format!("action <{verb} {contents}> {}", tokens.rest());
    }

    if rest.is_empty() {
        format!("properties <{verb}>")
    } else {
        format!("action <{verb}> {rest}")
    }
}

/// Builds a model from preprocessed lines.
///
/// # Errors
///
/// See [`ModelBuilder::build`].
pub fn build_model(lines: &[String], words: &ReservedWords) -> Result<FileModel> {
    ModelBuilder::new(words).build(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(text: &str) -> FileModel {
        let lines: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();
        build_model(&lines, &ReservedWords::standard()).expect("model builds")
    }

    const GAME: &str = "\
define game <Test Game>
start <hall>
define variable <score>
value <0>
end define
end define
define type <default>
properties <portable>
end define
define room <hall>
look <A big hall.>
north <yard>
define object <lamp>
alias <brass lamp>
take
use on <door> msg <It glows.>
end define
end define
define room <yard>
end define
define procedure <greet>
msg <hello>
end define";

    #[test]
    fn one_block_per_header() {
        let model = build(GAME);
        assert_eq!(model.count_of("game"), 1);
        assert_eq!(model.count_of("room"), 2);
        assert_eq!(model.count_of("object"), 1);
        assert_eq!(model.count_of("variable"), 1);
        assert_eq!(model.count_of("procedure"), 1);
    }

    #[test]
    fn nested_blocks_record_parent() {
        let model = build(GAME);
        let lamp = model.find_by_name("object", "lamp").expect("lamp exists");
        assert_eq!(lamp.parent.as_deref(), Some("hall"));
        let score = model.find_by_name("variable", "score").expect("score exists");
        assert_eq!(score.parent.as_deref(), Some("game"));
    }

    #[test]
    fn nested_blocks_are_not_in_parent_body() {
        let model = build(GAME);
        let hall = model.find_by_name("room", "hall").expect("hall exists");
        assert!(hall.lines.iter().all(|l| !l.starts_with("alias")));
        assert!(hall.lines.contains(&"north <yard>".to_string()));
    }

    #[test]
    fn game_block_is_named_game() {
        let model = build(GAME);
        let game = model.game_block().expect("game exists");
        assert_eq!(game.name, "game");
        assert_eq!(model.game_title(), Some("Test Game"));
    }

    #[test]
    fn keywords_are_normalized() {
        let model = build(GAME);
        assert_eq!(
            model.get_obj_property("lamp", "alias").as_deref(),
            Some("brass lamp")
        );
        assert!(model.has_obj_property("lamp", "take"));
        assert_eq!(
            model.get_obj_property("hall", "look").as_deref(),
            Some("A big hall.")
        );
        assert_eq!(
            model.get_obj_action("lamp", "use on door").as_deref(),
            Some("msg <It glows.>")
        );
    }

    #[test]
    fn default_type_is_injected() {
        let model = build(GAME);
        assert!(model.has_obj_property("lamp", "portable"));
        assert!(model.obj_of_type("lamp", "default"));
    }

    #[test]
    fn property_lists_are_exploded() {
        let model = build(
            "define game <g>\nend define\n\
             define variable <w>\nvalue <4>\nend define\n\
             define object <box>\nproperties <heavy; weight=%w%; not open>\nend define",
        );
        let the_box = model.find_by_name("object", "box").expect("box exists");
        assert_eq!(the_box.lines, vec![
            "properties <heavy>",
            "properties <weight=4>",
            "properties <not open>"
        ]);
    }

    #[test]
    fn duplicate_room_and_object_fail() {
        let lines: Vec<String> = "define game <g>\nend define\ndefine room <x>\nend define\ndefine object <X>\nend define"
            .lines()
            .map(ToString::to_string)
            .collect();
        let err = build_model(&lines, &ReservedWords::standard()).expect_err("duplicate");
        assert!(matches!(err.kind, ErrorKind::DuplicateName { .. }));
    }

    #[test]
    fn missing_game_block_fails() {
        let lines = vec!["define room <x>".to_string(), "end define".to_string()];
        let err = build_model(&lines, &ReservedWords::standard()).expect_err("no game");
        assert!(matches!(err.kind, ErrorKind::MissingGameBlock));
    }

    #[test]
    fn unclosed_block_fails() {
        let lines = vec!["define game <g>".to_string(), "start <x>".to_string()];
        let err = build_model(&lines, &ReservedWords::standard()).expect_err("unclosed");
        assert!(matches!(err.kind, ErrorKind::UnterminatedBlock { .. }));
    }

    #[test]
    fn use_and_give_canonical_forms() {
        assert_eq!(canonical_verb_line("use", "on anything msg <x>"), "action <use on anything> msg <x>");
        assert_eq!(canonical_verb_line("use", "anything msg <x>"), "action <use anything> msg <x>");
        assert_eq!(canonical_verb_line("use", "<key> msg <x>"), "action <use key> msg <x>");
        assert_eq!(canonical_verb_line("use", "<It clicks.>"), "properties <use=It clicks.>");
        assert_eq!(canonical_verb_line("use", "msg <x>"), "action <use> msg <x>");
        assert_eq!(canonical_verb_line("give", "to <troll> msg <x>"), "action <give to troll> msg <x>");
        assert_eq!(canonical_verb_line("give", "anything msg <x>"), "action <give anything> msg <x>");
        assert_eq!(canonical_verb_line("give", ""), "properties <give>");
    }
}
