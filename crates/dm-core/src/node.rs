use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::character::CharacterId;
use crate::error::WorldWarning;

/// Description given to nodes that never declare one.
pub const DEFAULT_DESCRIPTION: &str = "NO DESC";

/// Handle of a node in its [`crate::World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A location in the world.
///
/// Exits are declared by target name and only become handles once the world
/// is linked; see [`crate::World::link`].
#[derive(Debug, Clone)]
pub struct WorldNode {
    name: String,
    description: String,
    exits: Vec<(String, String)>,
    pub(crate) adjacents: BTreeMap<String, NodeId>,
    pub(crate) possible_characters: Vec<CharacterId>,
}

impl WorldNode {
    /// A node with the default description and no exits.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            exits: Vec::new(),
            adjacents: BTreeMap::new(),
            possible_characters: Vec::new(),
        }
    }

    /// Unique name of the node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptive text.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Declare an exit in `direction` to the node named `target`.
    pub fn add_exit(
        &mut self,
        direction: impl Into<String>,
        target: impl Into<String>,
    ) -> Option<WorldWarning> {
        let direction = direction.into();
        let target = target.into();
        if let Some(existing) = self.exits.iter_mut().find(|(d, _)| *d == direction) {
            existing.1 = target;
            let warning = WorldWarning::DuplicateExit {
                node: self.name.clone(),
                direction,
            };
            log::warn!("{warning}");
            return Some(warning);
        }
        self.exits.push((direction, target));
        None
    }

    /// Builder form of [`WorldNode::add_exit`].
    pub fn with_exit(mut self, direction: impl Into<String>, target: impl Into<String>) -> Self {
        self.add_exit(direction, target);
        self
    }

    /// Builder form of [`WorldNode::set_description`].
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.set_description(description);
        self
    }

    /// Declared exits as `(direction, target name)` pairs.
    pub fn exits(&self) -> &[(String, String)] {
        &self.exits
    }

    /// Linked neighbours by direction. Empty until the world is linked.
    pub fn adjacents(&self) -> &BTreeMap<String, NodeId> {
        &self.adjacents
    }

    /// The neighbour in `direction`, if linked.
    pub fn adjacent(&self, direction: &str) -> Option<NodeId> {
        self.adjacents.get(direction).copied()
    }

    /// Characters whose rules may place them here. Empty until linked.
    pub fn possible_characters(&self) -> &[CharacterId] {
        &self.possible_characters
    }
}
