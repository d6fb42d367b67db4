//! Semantic converters: generic parse trees to world entities.
//!
//! Each converter takes one top-level [`ParseObject`]. Entries a converter
//! does not understand are skipped with a warning; only errors that leave
//! the entity meaningless are returned as [`ConvertError`].

use dm_core::{Questline, QuestNode, Rule, Value, WorldCharacter, WorldNode, WorldWarning};
use dm_core::node::DEFAULT_DESCRIPTION;

use crate::ast::{ParseNode, ParseObject, Span};
use crate::condition::{ConditionError, compile_condition};
use crate::diagnostics::Diagnostic;

/// Name of the container holding a node's exits.
pub const EXITS_CONTAINER: &str = "TRANS";

/// Item that signals a rerun inside a rule body.
pub const RERUN_ITEM: &str = "RERUN";

/// A parse tree that cannot be turned into a world entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    /// A rule container's name is not a valid condition.
    #[error("{error}")]
    Condition {
        /// The compile error.
        error: ConditionError,
        /// Location of the container name.
        span: Span,
    },

    /// A quest node key is not an integer.
    #[error("quest \"{quest}\": node key \"{value}\" is not an integer")]
    InvalidQuestValue {
        /// Quest line name.
        quest: String,
        /// The offending key.
        value: String,
        /// Location of the key.
        span: Span,
    },

    /// A transition item does not start with an integer target.
    #[error("quest \"{quest}\" node {node}: transition \"{text}\" does not start with an integer target")]
    InvalidTransitionTarget {
        /// Quest line name.
        quest: String,
        /// The quest node declaring the transition.
        node: i64,
        /// The item text.
        text: String,
        /// Location of the item.
        span: Span,
    },
}

impl ConvertError {
    /// Location of the error in its source unit.
    pub fn span(&self) -> Span {
        match self {
            Self::Condition { span, .. }
            | Self::InvalidQuestValue { span, .. }
            | Self::InvalidTransitionTarget { span, .. } => span.clone(),
        }
    }
}

fn warn_at(warnings: &mut Vec<Diagnostic>, span: Span, message: String) {
    log::warn!("{message}");
    warnings.push(Diagnostic::warning(span, message));
}

fn note(warnings: &mut Vec<Diagnostic>, span: Span, warning: Option<WorldWarning>) {
    if let Some(w) = warning {
        warnings.push(Diagnostic::warning(span, w.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// `name { "description", TRANS { direction = target, ... }, }`
///
/// The last item wins as description. Nodes without one keep
/// [`DEFAULT_DESCRIPTION`].
pub fn convert_node(obj: &ParseObject, warnings: &mut Vec<Diagnostic>) -> WorldNode {
    let mut node = WorldNode::new(obj.name.clone());
    for child in &obj.children {
        match child {
            ParseNode::Item { text, .. } => node.set_description(text.clone()),
            ParseNode::Container(inner) if inner.name.eq_ignore_ascii_case(EXITS_CONTAINER) => {
                for entry in &inner.children {
                    match entry {
                        ParseNode::Assignment { key, value, span } => {
                            note(warnings, span.clone(), node.add_exit(key.clone(), value.clone()));
                        }
                        other => warn_at(
                            warnings,
                            other.span(),
                            format!(
                                "node \"{}\": unexpected {} in {EXITS_CONTAINER}",
                                obj.name,
                                other.kind()
                            ),
                        ),
                    }
                }
            }
            ParseNode::Container(inner) => warn_at(
                warnings,
                inner.name_span.clone(),
                format!("node \"{}\": unknown attribute \"{}\"", obj.name, inner.name),
            ),
            ParseNode::Assignment { key, span, .. } => warn_at(
                warnings,
                span.clone(),
                format!("node \"{}\": unexpected assignment to \"{key}\"", obj.name),
            ),
        }
    }
    if node.description() == DEFAULT_DESCRIPTION {
        log::debug!("node \"{}\" has no description", obj.name);
    }
    node
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// `name { KEY = value, "condition" { ... }, }`
///
/// Assignments are static characteristics; containers are rules.
pub fn convert_character(
    obj: &ParseObject,
    warnings: &mut Vec<Diagnostic>,
) -> Result<WorldCharacter, ConvertError> {
    let mut character = WorldCharacter::new(obj.name.clone());
    for child in &obj.children {
        match child {
            ParseNode::Container(inner) => character.add_rule(convert_rule(inner, warnings)?),
            ParseNode::Assignment { key, value, span } => {
                note(
                    warnings,
                    span.clone(),
                    character.add_characteristic(key, Value::from_raw(value)),
                );
            }
            ParseNode::Item { text, span } => warn_at(
                warnings,
                span.clone(),
                format!("character \"{}\": unrecognized entry \"{text}\"", obj.name),
            ),
        }
    }
    Ok(character)
}

/// `"condition" { KEY = value, "nested condition" { ... }, RERUN, }`
pub fn convert_rule(obj: &ParseObject, warnings: &mut Vec<Diagnostic>) -> Result<Rule, ConvertError> {
    let condition = compile_condition(&obj.name).map_err(|error| ConvertError::Condition {
        error,
        span: obj.name_span.clone(),
    })?;
    let mut rule = Rule::new(condition);
    for child in &obj.children {
        match child {
            ParseNode::Container(inner) => rule.run_nested(convert_rule(inner, warnings)?),
            ParseNode::Assignment { key, value, .. } => rule.set_attribute(key, Value::from_raw(value)),
            ParseNode::Item { text, .. } if text.eq_ignore_ascii_case(RERUN_ITEM) => rule.rerun(),
            ParseNode::Item { text, span } => warn_at(
                warnings,
                span.clone(),
                format!("rule \"{}\": unrecognized item \"{text}\"", obj.name),
            ),
        }
    }
    Ok(rule)
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

/// Split a transition item into target and description.
///
/// `"3"` is a bare target; `"3:ask the miller"` splits at the first colon.
/// An empty description is allowed.
pub fn parse_transition(text: &str) -> Option<(i64, String)> {
    let (target, description) = match text.split_once(':') {
        Some((target, description)) => (target, description),
        None => (text, ""),
    };
    let target = target.trim().parse::<i64>().ok()?;
    Some((target, description.to_string()))
}

/// `quest { value { "details", target, target:"label", ... }, ... }`
///
/// The first item of a quest node is its details; every later item is a
/// transition.
pub fn convert_questline(
    obj: &ParseObject,
    warnings: &mut Vec<Diagnostic>,
) -> Result<Questline, ConvertError> {
    let mut questline = Questline::new(obj.name.clone());
    for child in &obj.children {
        let ParseNode::Container(inner) = child else {
            warn_at(
                warnings,
                child.span(),
                format!("quest \"{}\": ignoring {} outside a quest node", obj.name, child.kind()),
            );
            continue;
        };
        let value = inner
            .name
            .trim()
            .parse::<i64>()
            .map_err(|_| ConvertError::InvalidQuestValue {
                quest: obj.name.clone(),
                value: inner.name.clone(),
                span: inner.name_span.clone(),
            })?;
        let node = convert_quest_node(&obj.name, value, inner, warnings)?;
        note(warnings, inner.name_span.clone(), questline.add_node(node));
    }
    Ok(questline)
}

fn convert_quest_node(
    quest: &str,
    value: i64,
    obj: &ParseObject,
    warnings: &mut Vec<Diagnostic>,
) -> Result<QuestNode, ConvertError> {
    let mut items = obj.children.iter().filter_map(|child| match child {
        ParseNode::Item { text, span } => Some((text, span)),
        other => {
            warn_at(
                warnings,
                other.span(),
                format!("quest \"{quest}\" node {value}: ignoring {}", other.kind()),
            );
            None
        }
    });

    let details = items.next().map(|(text, _)| text.clone()).unwrap_or_default();
    let mut node = QuestNode::new(value, details);
    let transitions: Vec<_> = items.collect();
    for (text, span) in transitions {
        let (target, description) =
            parse_transition(text).ok_or_else(|| ConvertError::InvalidTransitionTarget {
                quest: quest.to_string(),
                node: value,
                text: text.clone(),
                span: span.clone(),
            })?;
        note(warnings, span.clone(), node.add_transition(target, description));
    }
    Ok(node)
}
