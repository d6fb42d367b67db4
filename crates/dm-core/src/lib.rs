//! Runtime model for AutoDM worlds: locations, characters, quest lines, and
//! the rule engine that decides where characters are.
//!
//! This crate is independent of the source language. `dm-dsl` compiles
//! source files into the types defined here, but a [`World`] can just as well
//! be assembled programmatically.

/// Characters and the Rerun-driven rule engine.
pub mod character;
/// The world clock.
pub mod clock;
/// Engine configuration.
pub mod config;
/// Error and warning types.
pub mod error;
/// Compiled condition expressions.
pub mod expr;
/// World nodes (locations).
pub mod node;
/// Quest lines and quest nodes.
pub mod quest;
/// Conditional rules and their effects.
pub mod rule;
/// Evaluation scopes and the attribute-lookup seam.
pub mod scope;
/// Runtime values.
pub mod value;
/// The world aggregate: registration, linking, and queries.
pub mod world;

/// Re-export character types.
pub use character::{CharacterId, Evaluation, WorldCharacter};
/// Re-export the clock.
pub use clock::WorldClock;
/// Re-export configuration.
pub use config::EngineConfig;
/// Re-export error types.
pub use error::{EvalError, EvalResult, QuestError, WorldWarning};
/// Re-export expression types.
pub use expr::{Condition, Expr, Operator};
/// Re-export node types.
pub use node::{NodeId, WorldNode};
/// Re-export quest types.
pub use quest::{QuestId, QuestNode, Questline};
/// Re-export rule types.
pub use rule::{Effect, Flow, Rule};
/// Re-export scope types.
pub use scope::{AttributeSource, EvaluationScope};
/// Re-export the value type.
pub use value::Value;
/// Re-export world types.
pub use world::{QuestStatus, VisibleCharacter, World};
