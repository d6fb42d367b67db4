use std::fmt;

use crate::expr::Operator;

/// Alias for `Result<T, EvalError>`.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while evaluating a condition or a rule tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A variable is neither in the local scope nor a world attribute.
    #[error("could not find \"{0}\" in world or local attributes")]
    UnknownName(String),

    /// An operand has a type the operator cannot accept.
    #[error("operator `{operator}` cannot be applied to {found} value `{value}`")]
    TypeMismatch {
        /// The operator being applied.
        operator: Operator,
        /// The kind of value that was found (`"text"`, `"integer"`, ...).
        found: &'static str,
        /// The offending value, rendered.
        value: String,
    },

    /// Integer division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed.
    #[error("integer overflow in `{0}`")]
    Overflow(Operator),
}

/// Errors raised by quest line state changes.
///
/// None of these change quest state; callers decide whether to surface them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestError {
    /// The value is not a declared transition target of the current node.
    #[error("quest \"{quest}\": {to} is not a valid transition from {from}")]
    InvalidTransition {
        /// Quest line name.
        quest: String,
        /// Current node value.
        from: i64,
        /// Requested value.
        to: i64,
    },

    /// No quest node with that value exists.
    #[error("quest \"{quest}\": no node with value {value}")]
    UnknownValue {
        /// Quest line name.
        quest: String,
        /// Requested value.
        value: i64,
    },

    /// The quest line has no nodes yet.
    #[error("quest \"{0}\" has no nodes")]
    Empty(String),

    /// No quest line with that name is registered in the world.
    #[error("no quest \"{0}\"")]
    UnknownQuest(String),
}

/// Non-fatal conditions found while building or linking a world.
///
/// The world stays usable; the loader turns these into warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldWarning {
    /// A node with the same name was already registered and has been replaced.
    DuplicateNode(String),
    /// A character with the same name was already registered and has been replaced.
    DuplicateCharacter(String),
    /// A quest line with the same name was already registered and has been replaced.
    DuplicateQuest(String),
    /// A quest node value was declared twice in one quest line.
    DuplicateQuestNode {
        /// Quest line name.
        quest: String,
        /// The repeated node value.
        value: i64,
    },
    /// A transition target was declared twice on one quest node.
    DuplicateTransition {
        /// Node value the transition leaves from.
        from: i64,
        /// The repeated target value.
        to: i64,
    },
    /// A node declared the same direction twice.
    DuplicateExit {
        /// Node name.
        node: String,
        /// The repeated direction.
        direction: String,
    },
    /// A character declared the same characteristic twice.
    DuplicateCharacteristic {
        /// Character name.
        character: String,
        /// The repeated key.
        key: String,
    },
    /// An exit names a node that does not exist.
    UnresolvedExit {
        /// Node declaring the exit.
        node: String,
        /// Direction of the exit.
        direction: String,
        /// The missing target node.
        target: String,
    },
    /// A character may appear in a node that does not exist.
    UnresolvedCharacterNode {
        /// Character name.
        character: String,
        /// The missing node.
        node: String,
    },
}

impl WorldWarning {
    /// Whether this warning comes from reference resolution rather than
    /// from overwritten or repeated state.
    pub fn is_link_warning(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedExit { .. } | Self::UnresolvedCharacterNode { .. }
        )
    }
}

impl fmt::Display for WorldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode(name) => write!(f, "overwriting node \"{name}\""),
            Self::DuplicateCharacter(name) => write!(f, "overwriting character \"{name}\""),
            Self::DuplicateQuest(name) => write!(f, "overwriting quest \"{name}\""),
            Self::DuplicateQuestNode { quest, value } => {
                write!(f, "quest \"{quest}\": overwriting node {value}")
            }
            Self::DuplicateTransition { from, to } => {
                write!(f, "quest node {from}: overwriting transition to {to}")
            }
            Self::DuplicateExit { node, direction } => {
                write!(f, "node \"{node}\": overwriting direction \"{direction}\"")
            }
            Self::DuplicateCharacteristic { character, key } => {
                write!(f, "character \"{character}\": overwriting characteristic {key}")
            }
            Self::UnresolvedExit {
                node,
                direction,
                target,
            } => write!(
                f,
                "node \"{node}\": exit \"{direction}\" leads to unknown node \"{target}\""
            ),
            Self::UnresolvedCharacterNode { character, node } => {
                write!(f, "character \"{character}\": could not find node \"{node}\"")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_messages() {
        let e = EvalError::UnknownName("questA".into());
        assert_eq!(
            e.to_string(),
            "could not find \"questA\" in world or local attributes"
        );
        assert_eq!(
            EvalError::Overflow(Operator::Mul).to_string(),
            "integer overflow in `*`"
        );
    }

    #[test]
    fn link_warnings_are_classified() {
        let unresolved = WorldWarning::UnresolvedExit {
            node: "cave".into(),
            direction: "north".into(),
            target: "nowhere".into(),
        };
        assert!(unresolved.is_link_warning());
        assert!(!WorldWarning::DuplicateNode("cave".into()).is_link_warning());
        assert_eq!(
            unresolved.to_string(),
            "node \"cave\": exit \"north\" leads to unknown node \"nowhere\""
        );
    }
}
