use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{QuestError, WorldWarning};

/// Handle of a quest line in its [`crate::World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestId(pub usize);

/// One state of a quest line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestNode {
    value: i64,
    details: String,
    transitions: Vec<(i64, String)>,
}

impl QuestNode {
    /// A node with no outgoing transitions.
    pub fn new(value: i64, details: impl Into<String>) -> Self {
        Self {
            value,
            details: details.into(),
            transitions: Vec::new(),
        }
    }

    /// Declare `target` as reachable from this node. A repeated target keeps
    /// its position and takes the new description.
    pub fn add_transition(
        &mut self,
        target: i64,
        description: impl Into<String>,
    ) -> Option<WorldWarning> {
        let description = description.into();
        if let Some(existing) = self.transitions.iter_mut().find(|(t, _)| *t == target) {
            existing.1 = description;
            let warning = WorldWarning::DuplicateTransition {
                from: self.value,
                to: target,
            };
            log::warn!("{warning}");
            return Some(warning);
        }
        self.transitions.push((target, description));
        None
    }

    /// Builder form of [`QuestNode::add_transition`].
    pub fn with_transition(mut self, target: i64, description: impl Into<String>) -> Self {
        self.add_transition(target, description);
        self
    }

    /// This node's key in its quest line.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Descriptive text.
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Declared transitions as `(target, description)` pairs.
    pub fn transitions(&self) -> &[(i64, String)] {
        &self.transitions
    }

    /// Whether `target` is a declared transition.
    pub fn allows(&self, target: i64) -> bool {
        self.transitions.iter().any(|(t, _)| *t == target)
    }

    /// Transitions rendered as `"target: description"`.
    pub fn transition_labels(&self) -> Vec<String> {
        self.transitions
            .iter()
            .map(|(t, d)| format!("{t}: {d}"))
            .collect()
    }
}

/// A named quest state machine.
///
/// The first node added becomes the current node; from then on there is
/// always a current node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questline {
    name: String,
    nodes: BTreeMap<i64, QuestNode>,
    current: Option<i64>,
}

impl Questline {
    /// An empty quest line.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: BTreeMap::new(),
            current: None,
        }
    }

    /// Quest line name; also its attribute name in conditions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a node, replacing any node with the same value.
    pub fn add_node(&mut self, node: QuestNode) -> Option<WorldWarning> {
        let value = node.value();
        if self.current.is_none() {
            self.current = Some(value);
        }
        if self.nodes.insert(value, node).is_some() {
            let warning = WorldWarning::DuplicateQuestNode {
                quest: self.name.clone(),
                value,
            };
            log::warn!("{warning}");
            Some(warning)
        } else {
            None
        }
    }

    /// Builder form of [`Questline::add_node`].
    pub fn with_node(mut self, node: QuestNode) -> Self {
        self.add_node(node);
        self
    }

    /// A node by value.
    pub fn node(&self, value: i64) -> Option<&QuestNode> {
        self.nodes.get(&value)
    }

    /// The current node, once the quest line has any.
    pub fn current(&self) -> Option<&QuestNode> {
        self.current.and_then(|v| self.nodes.get(&v))
    }

    /// Value of the current node.
    pub fn current_value(&self) -> Option<i64> {
        self.current
    }

    /// Details of the current node.
    pub fn current_details(&self) -> Option<&str> {
        self.current().map(QuestNode::details)
    }

    /// Transition labels of the current node.
    pub fn current_transitions(&self) -> Vec<String> {
        self.current()
            .map(QuestNode::transition_labels)
            .unwrap_or_default()
    }

    /// Details of any node.
    pub fn details(&self, value: i64) -> Option<&str> {
        self.nodes.get(&value).map(QuestNode::details)
    }

    /// Move to `value` if the current node declares it as a transition and a
    /// node with that value exists. Otherwise nothing changes and the
    /// rejection is logged.
    pub fn progress(&mut self, value: i64) -> Result<(), QuestError> {
        let Some(current) = self.current() else {
            let e = QuestError::Empty(self.name.clone());
            log::warn!("{e}");
            return Err(e);
        };
        if !current.allows(value) {
            let e = QuestError::InvalidTransition {
                quest: self.name.clone(),
                from: current.value(),
                to: value,
            };
            log::warn!("{e}");
            return Err(e);
        }
        self.force(value)
    }

    /// Move to `value` regardless of declared transitions, if it exists.
    /// An unknown value is logged and leaves the state unchanged.
    pub fn force(&mut self, value: i64) -> Result<(), QuestError> {
        if !self.nodes.contains_key(&value) {
            let e = QuestError::UnknownValue {
                quest: self.name.clone(),
                value,
            };
            log::warn!("{e}");
            return Err(e);
        }
        self.current = Some(value);
        Ok(())
    }
}
