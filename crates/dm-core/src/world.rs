use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::character::{CharacterId, DESC_KEY, NAME_KEY, WorldCharacter};
use crate::clock::WorldClock;
use crate::config::EngineConfig;
use crate::error::{QuestError, WorldWarning};
use crate::node::{NodeId, WorldNode};
use crate::quest::{QuestId, Questline};
use crate::scope::AttributeSource;
use crate::value::Value;

/// A character currently visible in a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleCharacter {
    /// Handle of the character.
    pub id: CharacterId,
    /// Resolved display name (`NAME`, else the declared name).
    pub name: String,
    /// Resolved description (`DESC`, else empty).
    pub description: String,
}

/// Snapshot of one quest line's state, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStatus {
    /// Quest line name.
    pub name: String,
    /// Current node value, if the quest line has nodes.
    pub value: Option<i64>,
    /// Details of the current node.
    pub details: String,
    /// Transition labels of the current node.
    pub transitions: Vec<String>,
}

/// The world aggregate. Owns every node, character and quest line, and the
/// clock.
///
/// Entities live in arenas and refer to one another by handle. Building a
/// world is two-phase: register everything with the `add_*` methods, then
/// call [`World::link`] to turn name references into handles.
#[derive(Debug, Clone, Default)]
pub struct World {
    config: EngineConfig,
    clock: WorldClock,

    nodes: Vec<WorldNode>,
    characters: Vec<WorldCharacter>,
    questlines: Vec<Questline>,

    // Indexes
    node_index: HashMap<String, NodeId>,
    character_index: HashMap<String, CharacterId>,
    quest_index: HashMap<String, QuestId>,
}

impl World {
    /// An empty world with the clock at `config.start_hour`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            clock: WorldClock::new(config.start_hour),
            config,
            ..Default::default()
        }
    }

    /// The configuration this world evaluates with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a node. A node with the same name is replaced in place and
    /// keeps its handle.
    pub fn add_node(&mut self, node: WorldNode) -> (NodeId, Option<WorldWarning>) {
        if let Some(&id) = self.node_index.get(node.name()) {
            let warning = WorldWarning::DuplicateNode(node.name().to_string());
            log::warn!("{warning}");
            self.nodes[id.0] = node;
            return (id, Some(warning));
        }
        let id = NodeId(self.nodes.len());
        self.node_index.insert(node.name().to_string(), id);
        self.nodes.push(node);
        (id, None)
    }

    /// Register a character. Same replacement rule as [`World::add_node`].
    pub fn add_character(
        &mut self,
        character: WorldCharacter,
    ) -> (CharacterId, Option<WorldWarning>) {
        if let Some(&id) = self.character_index.get(character.name()) {
            let warning = WorldWarning::DuplicateCharacter(character.name().to_string());
            log::warn!("{warning}");
            self.characters[id.0] = character;
            return (id, Some(warning));
        }
        let id = CharacterId(self.characters.len());
        self.character_index
            .insert(character.name().to_string(), id);
        self.characters.push(character);
        (id, None)
    }

    /// Register a quest line. Same replacement rule as [`World::add_node`].
    pub fn add_questline(&mut self, questline: Questline) -> (QuestId, Option<WorldWarning>) {
        if let Some(&id) = self.quest_index.get(questline.name()) {
            let warning = WorldWarning::DuplicateQuest(questline.name().to_string());
            log::warn!("{warning}");
            self.questlines[id.0] = questline;
            return (id, Some(warning));
        }
        let id = QuestId(self.questlines.len());
        self.quest_index.insert(questline.name().to_string(), id);
        self.questlines.push(questline);
        (id, None)
    }

    // -----------------------------------------------------------------------
    // Linking
    // -----------------------------------------------------------------------

    /// Resolve every node's declared exits and every character's candidate
    /// nodes into handles.
    ///
    /// Unresolved names are skipped and reported. Linking is idempotent:
    /// previous links are discarded first, so it can be re-run after more
    /// entities are registered.
    pub fn link(&mut self) -> Vec<WorldWarning> {
        let mut warnings = Vec::new();

        for i in 0..self.nodes.len() {
            let mut adjacents = std::collections::BTreeMap::new();
            for (direction, target) in self.nodes[i].exits() {
                match self.node_index.get(target) {
                    Some(&id) => {
                        adjacents.insert(direction.clone(), id);
                    }
                    None => warnings.push(WorldWarning::UnresolvedExit {
                        node: self.nodes[i].name().to_string(),
                        direction: direction.clone(),
                        target: target.clone(),
                    }),
                }
            }
            let node = &mut self.nodes[i];
            node.adjacents = adjacents;
            node.possible_characters.clear();
        }

        for (i, character) in self.characters.iter().enumerate() {
            for node_name in character.candidate_nodes() {
                match self.node_index.get(node_name) {
                    Some(&node_id) => {
                        let possible = &mut self.nodes[node_id.0].possible_characters;
                        if !possible.contains(&CharacterId(i)) {
                            possible.push(CharacterId(i));
                        }
                    }
                    None => warnings.push(WorldWarning::UnresolvedCharacterNode {
                        character: character.name().to_string(),
                        node: node_name.clone(),
                    }),
                }
            }
        }

        for warning in &warnings {
            log::warn!("{warning}");
        }
        log::debug!(
            "linked {} nodes, {} characters, {} quest lines",
            self.nodes.len(),
            self.characters.len(),
            self.questlines.len()
        );
        warnings
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// A node by handle.
    pub fn node(&self, id: NodeId) -> Option<&WorldNode> {
        self.nodes.get(id.0)
    }

    /// A node by name.
    pub fn get_node(&self, name: &str) -> Option<&WorldNode> {
        self.node_id(name).and_then(|id| self.node(id))
    }

    /// Handle of the node with this name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.node_index.get(name).copied()
    }

    /// A character by handle.
    pub fn character(&self, id: CharacterId) -> Option<&WorldCharacter> {
        self.characters.get(id.0)
    }

    /// A character by handle, mutably.
    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut WorldCharacter> {
        self.characters.get_mut(id.0)
    }

    /// Handle of the character with this name.
    pub fn character_id(&self, name: &str) -> Option<CharacterId> {
        self.character_index.get(name).copied()
    }

    /// A quest line by name.
    pub fn questline(&self, name: &str) -> Option<&Questline> {
        self.quest_index.get(name).map(|id| &self.questlines[id.0])
    }

    /// A quest line by name, mutably.
    pub fn questline_mut(&mut self, name: &str) -> Option<&mut Questline> {
        self.quest_index
            .get(name)
            .map(|id| &mut self.questlines[id.0])
    }

    /// Status of every quest line, sorted by name.
    pub fn quest_statuses(&self) -> Vec<QuestStatus> {
        let mut statuses: Vec<QuestStatus> = self
            .questlines
            .iter()
            .map(|q| QuestStatus {
                name: q.name().to_string(),
                value: q.current_value(),
                details: q.current_details().unwrap_or_default().to_string(),
                transitions: q.current_transitions(),
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    // -----------------------------------------------------------------------
    // Clock and attributes
    // -----------------------------------------------------------------------

    /// The world clock.
    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// Absolute hour counter.
    pub fn hour(&self) -> i64 {
        self.clock.hour()
    }

    /// Advance the clock by `delta` hours.
    pub fn add_hour(&mut self, delta: i64) -> i64 {
        self.clock.advance(delta)
    }

    /// Resolve a world attribute: `hour` (of day), `day`, `weekday`, or the
    /// current value of a quest line with that name.
    pub fn get_world_attr(&self, name: &str) -> Option<Value> {
        match name {
            "hour" => Some(Value::Int(self.clock.hour_of_day())),
            "day" => Some(Value::Int(self.clock.day())),
            "weekday" => Some(Value::Int(self.clock.weekday())),
            _ => self
                .questline(name)
                .and_then(Questline::current_value)
                .map(Value::Int),
        }
    }

    /// Advance a quest line by `value`. Failures leave state unchanged and
    /// are logged as well as returned.
    pub fn add_quest_state(&mut self, quest: &str, value: i64) -> Result<(), QuestError> {
        match self.questline_mut(quest) {
            Some(q) => q.progress(value),
            None => {
                let e = QuestError::UnknownQuest(quest.to_string());
                log::warn!("{e}");
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Characters
    // -----------------------------------------------------------------------

    /// Mark a character dead; it disappears from every node.
    pub fn kill(&mut self, id: CharacterId) -> bool {
        match self.character_mut(id) {
            Some(c) => {
                c.kill();
                true
            }
            None => false,
        }
    }

    /// Characters currently in a node: every living candidate whose rules
    /// resolve `NODE` to this node's name right now.
    ///
    /// A candidate whose rules fail to evaluate is skipped and logged.
    pub fn get_active_characters(&self, id: NodeId) -> Vec<VisibleCharacter> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };

        let mut visible = Vec::new();
        for &cid in node.possible_characters() {
            let Some(character) = self.character(cid) else {
                continue;
            };
            if !character.is_alive() {
                continue;
            }
            let eval = match character.evaluate(self, &self.config) {
                Ok(eval) => eval,
                Err(e) => {
                    log::warn!("character \"{}\": {e}", character.name());
                    continue;
                }
            };
            if eval.node().as_deref() != Some(node.name()) {
                continue;
            }
            visible.push(VisibleCharacter {
                id: cid,
                name: eval
                    .get(NAME_KEY)
                    .map(Value::to_string)
                    .unwrap_or_else(|| character.name().to_string()),
                description: eval.get(DESC_KEY).map(Value::to_string).unwrap_or_default(),
            });
        }
        visible
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of registered characters.
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// Number of registered quest lines.
    pub fn quest_count(&self) -> usize {
        self.questlines.len()
    }
}

impl AttributeSource for World {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get_world_attr(name)
    }
}
