use crate::character::canonical_key;
use crate::error::EvalResult;
use crate::expr::Condition;
use crate::scope::EvaluationScope;
use crate::value::Value;

/// What a rule asks the engine to do after it has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going with the next rule.
    Continue,
    /// Abandon the current pass and start over with the scope as it is now.
    Rerun,
}

/// One effect of a rule whose condition holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Bind `key` to `value` in the scope, overwriting.
    SetAttribute {
        /// Attribute name.
        key: String,
        /// Value to bind.
        value: Value,
    },
    /// Evaluate a nested rule against the same scope.
    RunNested(Rule),
    /// Restart the outer pass.
    Rerun,
}

/// A conditional rule: when `condition` holds, its effects run in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    condition: Condition,
    effects: Vec<Effect>,
}

impl Rule {
    /// An empty rule gated on `condition`.
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            effects: Vec::new(),
        }
    }

    /// Append an attribute assignment. `NODE`/`NAME`/`DESC` are matched
    /// case-insensitively.
    pub fn set_attribute(&mut self, key: &str, value: Value) {
        self.effects.push(Effect::SetAttribute {
            key: canonical_key(key),
            value,
        });
    }

    /// Append a nested rule.
    pub fn run_nested(&mut self, rule: Rule) {
        self.effects.push(Effect::RunNested(rule));
    }

    /// Append a rerun signal.
    pub fn rerun(&mut self) {
        self.effects.push(Effect::Rerun);
    }

    /// Builder form of [`Rule::set_attribute`].
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_attribute(key, value.into());
        self
    }

    /// Builder form of [`Rule::run_nested`].
    pub fn with_nested(mut self, rule: Rule) -> Self {
        self.run_nested(rule);
        self
    }

    /// Builder form of [`Rule::rerun`].
    pub fn with_rerun(mut self) -> Self {
        self.rerun();
        self
    }

    /// The rule's gate.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// The rule's effects in declaration order.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Apply the rule to `scope`.
    ///
    /// A false condition skips the rule and everything nested in it. A
    /// `Rerun`, whether here or in a nested rule, stops the remaining effects
    /// and is handed back to the caller.
    pub fn apply(&self, scope: &mut EvaluationScope<'_>) -> EvalResult<Flow> {
        if !self.condition.evaluate(scope)? {
            return Ok(Flow::Continue);
        }
        for effect in &self.effects {
            match effect {
                Effect::SetAttribute { key, value } => scope.set(key.clone(), value.clone()),
                Effect::RunNested(rule) => {
                    if rule.apply(scope)? == Flow::Rerun {
                        return Ok(Flow::Rerun);
                    }
                }
                Effect::Rerun => return Ok(Flow::Rerun),
            }
        }
        Ok(Flow::Continue)
    }

    /// Names of every node this rule, or any rule nested in it, may assign
    /// to `NODE`, in declaration order.
    pub fn node_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_node_names(&mut names);
        names
    }

    fn collect_node_names(&self, names: &mut Vec<String>) {
        for effect in &self.effects {
            match effect {
                Effect::SetAttribute { key, value } if key == crate::character::NODE_KEY => {
                    let name = value.to_string();
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                Effect::RunNested(rule) => rule.collect_node_names(names),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::expr::{Expr, Operator};

    fn gate(name: &str, n: i64) -> Condition {
        Condition::new(
            format!("{name} == {n}"),
            Expr::binary(Operator::Eq, Expr::var(name), Expr::int(n)),
        )
    }

    #[test]
    fn false_condition_skips_nested_rules() {
        let rule = Rule::new(gate("X", 5))
            .with_attribute("A", 1)
            .with_nested(Rule::new(Condition::always()).with_attribute("B", 2));
        let mut scope = EvaluationScope::detached(HashMap::from([("X".into(), Value::Int(0))]));
        assert_eq!(rule.apply(&mut scope), Ok(Flow::Continue));
        assert_eq!(scope.locals().len(), 1);
    }

    #[test]
    fn effects_run_in_order() {
        let rule = Rule::new(Condition::always())
            .with_attribute("A", 1)
            .with_nested(Rule::new(gate("A", 1)).with_attribute("B", 2))
            .with_attribute("A", 3);
        let mut scope = EvaluationScope::detached(HashMap::new());
        assert_eq!(rule.apply(&mut scope), Ok(Flow::Continue));
        assert_eq!(scope.get("A"), Ok(Value::Int(3)));
        assert_eq!(scope.get("B"), Ok(Value::Int(2)));
    }

    #[test]
    fn rerun_stops_remaining_effects() {
        let rule = Rule::new(Condition::always())
            .with_attribute("A", 1)
            .with_rerun()
            .with_attribute("B", 2);
        let mut scope = EvaluationScope::detached(HashMap::new());
        assert_eq!(rule.apply(&mut scope), Ok(Flow::Rerun));
        assert_eq!(scope.get("A"), Ok(Value::Int(1)));
        assert!(scope.get("B").is_err());
    }

    #[test]
    fn nested_rerun_reaches_the_caller() {
        let rule = Rule::new(Condition::always())
            .with_nested(Rule::new(Condition::always()).with_rerun())
            .with_attribute("B", 2);
        let mut scope = EvaluationScope::detached(HashMap::new());
        assert_eq!(rule.apply(&mut scope), Ok(Flow::Rerun));
        assert!(scope.get("B").is_err());
    }

    #[test]
    fn node_names_are_collected_through_nesting() {
        let rule = Rule::new(Condition::always())
            .with_attribute("node", "tavern")
            .with_nested(
                Rule::new(Condition::always())
                    .with_attribute("NODE", "cave")
                    .with_attribute("Node", "tavern"),
            );
        assert_eq!(rule.node_names(), vec!["tavern", "cave"]);
    }
}
