use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EvalResult, WorldWarning};
use crate::rule::{Flow, Rule};
use crate::scope::{AttributeSource, EvaluationScope};
use crate::value::Value;

/// Characteristic naming the node a character currently occupies.
pub const NODE_KEY: &str = "NODE";
/// Characteristic holding the display name.
pub const NAME_KEY: &str = "NAME";
/// Characteristic holding the description.
pub const DESC_KEY: &str = "DESC";

/// Upper-case the well-known keys; leave everything else as written.
pub fn canonical_key(key: &str) -> String {
    for known in [NODE_KEY, NAME_KEY, DESC_KEY] {
        if key.eq_ignore_ascii_case(known) {
            return known.to_string();
        }
    }
    key.to_string()
}

/// Handle of a character in its [`crate::World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub usize);

/// A character with static characteristics and a rule set that decides
/// where it is and how it presents itself.
#[derive(Debug, Clone)]
pub struct WorldCharacter {
    name: String,
    characteristics: HashMap<String, Value>,
    rules: Vec<Rule>,
    nodes: Vec<String>,
    explicit_name: bool,
    alive: bool,
}

/// The result of running a character's rule set to a fixpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The scope after the last pass: static characteristics plus every
    /// attribute the rules assigned.
    pub values: HashMap<String, Value>,
    /// Number of passes taken.
    pub iterations: usize,
    /// Whether the pass limit was hit while a rerun was still pending.
    pub capped: bool,
}

impl Evaluation {
    /// Look up a resolved attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The resolved `NODE`, rendered.
    pub fn node(&self) -> Option<String> {
        self.values.get(NODE_KEY).map(Value::to_string)
    }
}

impl WorldCharacter {
    /// A living character with only its `NAME` characteristic set.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let characteristics = HashMap::from([(NAME_KEY.to_string(), Value::Text(name.clone()))]);
        Self {
            name,
            characteristics,
            rules: Vec::new(),
            nodes: Vec::new(),
            explicit_name: false,
            alive: true,
        }
    }

    /// Declared name; the registration key in the world.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a static characteristic. A static `NODE` joins the candidate node
    /// list.
    pub fn add_characteristic(&mut self, key: &str, value: Value) -> Option<WorldWarning> {
        let key = canonical_key(key);
        if key == NODE_KEY {
            self.note_node(value.to_string());
        }
        // NAME is always pre-seeded, so only a second explicit NAME is a repeat.
        let repeated = self.characteristics.insert(key.clone(), value).is_some()
            && (key != NAME_KEY || self.explicit_name);
        if key == NAME_KEY {
            self.explicit_name = true;
        }
        if repeated {
            let warning = WorldWarning::DuplicateCharacteristic {
                character: self.name.clone(),
                key,
            };
            log::warn!("{warning}");
            Some(warning)
        } else {
            None
        }
    }

    /// Append a rule; every node it may assign joins the candidate list.
    pub fn add_rule(&mut self, rule: Rule) {
        for node in rule.node_names() {
            self.note_node(node);
        }
        self.rules.push(rule);
    }

    /// Static characteristics.
    pub fn characteristics(&self) -> &HashMap<String, Value> {
        &self.characteristics
    }

    /// A single static characteristic.
    pub fn characteristic(&self, key: &str) -> Option<&Value> {
        self.characteristics.get(&canonical_key(key))
    }

    /// Top-level rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Every node this character might ever occupy, in declaration order.
    pub fn candidate_nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Whether the character still appears anywhere.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Remove the character from every node permanently.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Run the rule set to a fixpoint against `world`.
    ///
    /// Each pass applies the top-level rules in order. A rule that signals
    /// `Rerun` ends the pass and starts a new one with the scope as mutated so
    /// far. Evaluation stops after a pass with no rerun, or after
    /// `config.max_iterations` passes, in which case the scope is returned as
    /// it stands and the result is marked `capped`.
    pub fn evaluate(
        &self,
        world: &dyn AttributeSource,
        config: &EngineConfig,
    ) -> EvalResult<Evaluation> {
        let mut scope = EvaluationScope::new(self.characteristics.clone(), world);

        let mut iterations = 0;
        let mut changed = true;
        while changed && iterations < config.max_iterations {
            changed = false;
            iterations += 1;
            for rule in &self.rules {
                if rule.apply(&mut scope)? == Flow::Rerun {
                    changed = true;
                    break;
                }
            }
        }

        if changed {
            log::warn!(
                "character \"{}\": iteration limit of {} reached",
                self.name,
                config.max_iterations
            );
        }

        Ok(Evaluation {
            values: scope.into_locals(),
            iterations,
            capped: changed,
        })
    }

    /// Whether the character is alive and its rules currently place it in
    /// `node`. Evaluation errors count as "not there".
    pub fn is_in_node(
        &self,
        node: &str,
        world: &dyn AttributeSource,
        config: &EngineConfig,
    ) -> bool {
        if !self.alive {
            return false;
        }
        match self.evaluate(world, config) {
            Ok(eval) => eval.node().as_deref() == Some(node),
            Err(e) => {
                log::warn!("character \"{}\": {e}", self.name);
                false
            }
        }
    }

    fn note_node(&mut self, node: String) {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Condition, Expr, Operator};

    struct NoWorld;

    impl AttributeSource for NoWorld {
        fn attribute(&self, _name: &str) -> Option<Value> {
            None
        }
    }

    fn when(var: &str, op: Operator, n: i64) -> Condition {
        Condition::new(
            format!("{var} {op} {n}"),
            Expr::binary(op, Expr::var(var), Expr::int(n)),
        )
    }

    #[test]
    fn name_is_seeded() {
        let c = WorldCharacter::new("Innkeeper");
        assert_eq!(c.characteristic("name"), Some(&Value::from("Innkeeper")));
    }

    #[test]
    fn explicit_name_is_not_a_duplicate_once() {
        let mut c = WorldCharacter::new("innkeeper");
        assert!(c.add_characteristic("NAME", Value::from("Old Tom")).is_none());
        assert!(c.add_characteristic("NAME", Value::from("Tom")).is_some());
        assert_eq!(c.characteristics().len(), 1);
    }

    #[test]
    fn candidate_nodes_combine_static_and_rules() {
        let mut c = WorldCharacter::new("guard");
        c.add_characteristic("node", Value::from("gate"));
        c.add_rule(Rule::new(Condition::always()).with_attribute("NODE", "barracks"));
        c.add_rule(Rule::new(Condition::always()).with_attribute("NODE", "gate"));
        assert_eq!(c.candidate_nodes(), ["gate", "barracks"]);
    }

    #[test]
    fn rerun_reaches_fixpoint() {
        let mut c = WorldCharacter::new("x");
        c.add_characteristic("X", Value::Int(0));
        c.add_rule(
            Rule::new(when("X", Operator::Lt, 1))
                .with_attribute("X", 1)
                .with_rerun(),
        );
        c.add_rule(Rule::new(when("X", Operator::Eq, 1)).with_attribute("Y", 2));

        let eval = c.evaluate(&NoWorld, &EngineConfig::default()).unwrap();
        assert_eq!(eval.get("X"), Some(&Value::Int(1)));
        assert_eq!(eval.get("Y"), Some(&Value::Int(2)));
        assert_eq!(eval.iterations, 2);
        assert!(!eval.capped);
    }

    #[test]
    fn rerun_restarts_the_whole_pass() {
        // The second rule only sees COUNT after the first has rerun.
        let mut c = WorldCharacter::new("x");
        c.add_characteristic("COUNT", Value::Int(0));
        c.add_rule(Rule::new(when("COUNT", Operator::Eq, 1)).with_attribute("SEEN", 1));
        c.add_rule(
            Rule::new(when("COUNT", Operator::Lt, 1))
                .with_attribute("COUNT", 1)
                .with_rerun(),
        );

        let eval = c.evaluate(&NoWorld, &EngineConfig::default()).unwrap();
        assert_eq!(eval.get("SEEN"), Some(&Value::Int(1)));
        assert_eq!(eval.iterations, 2);
    }

    #[test]
    fn endless_rerun_stops_at_the_cap() {
        let mut c = WorldCharacter::new("loop");
        c.add_rule(
            Rule::new(Condition::always())
                .with_attribute("NODE", "void")
                .with_rerun(),
        );

        let config = EngineConfig::default().with_max_iterations(7);
        let eval = c.evaluate(&NoWorld, &config).unwrap();
        assert_eq!(eval.iterations, 7);
        assert!(eval.capped);
        assert_eq!(eval.node().as_deref(), Some("void"));
    }

    #[test]
    fn unknown_name_is_reported() {
        let mut c = WorldCharacter::new("x");
        c.add_rule(Rule::new(when("weather", Operator::Gt, 1)));
        assert!(c.evaluate(&NoWorld, &EngineConfig::default()).is_err());
        assert!(!c.is_in_node("anywhere", &NoWorld, &EngineConfig::default()));
    }

    #[test]
    fn dead_characters_are_nowhere() {
        let mut c = WorldCharacter::new("x");
        c.add_characteristic("NODE", Value::from("cave"));
        let config = EngineConfig::default();
        assert!(c.is_in_node("cave", &NoWorld, &config));
        c.kill();
        assert!(!c.is_alive());
        assert!(!c.is_in_node("cave", &NoWorld, &config));
    }
}
