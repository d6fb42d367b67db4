use std::collections::HashMap;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// Something that can answer world-level attribute queries by name.
///
/// Implemented by [`crate::World`]; conditions fall back to it for any name
/// not bound in the local scope.
pub trait AttributeSource {
    /// Resolve an attribute, or `None` if the name is unknown.
    fn attribute(&self, name: &str) -> Option<Value>;
}

/// The transient name-to-value mapping a condition or rule set is evaluated
/// against. Local bindings shadow the world fallback.
pub struct EvaluationScope<'w> {
    locals: HashMap<String, Value>,
    fallback: Option<&'w dyn AttributeSource>,
}

impl<'w> EvaluationScope<'w> {
    /// Seed a scope with local bindings, falling back to `world`.
    pub fn new(locals: HashMap<String, Value>, world: &'w dyn AttributeSource) -> Self {
        Self {
            locals,
            fallback: Some(world),
        }
    }

    /// A scope with no world fallback.
    pub fn detached(locals: HashMap<String, Value>) -> Self {
        Self {
            locals,
            fallback: None,
        }
    }

    /// Resolve a name: locals first, then the world.
    pub fn get(&self, name: &str) -> EvalResult<Value> {
        if let Some(v) = self.locals.get(name) {
            return Ok(v.clone());
        }
        self.fallback
            .and_then(|world| world.attribute(name))
            .ok_or_else(|| EvalError::UnknownName(name.to_string()))
    }

    /// Bind a local name, overwriting any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    /// The local bindings only.
    pub fn locals(&self) -> &HashMap<String, Value> {
        &self.locals
    }

    /// Consume the scope, keeping the local bindings.
    pub fn into_locals(self) -> HashMap<String, Value> {
        self.locals
    }
}
