//! Front end for AutoDM world sources: lexer, generic tree parser,
//! condition compiler, semantic converters and the world loader.
//!
//! ```text
//! text ──lex──▶ tokens ──parse──▶ ParseObject tree ──convert──▶ dm_core::World
//! ```

/// Generic parse tree.
pub mod ast;
/// Compilation of condition strings into expression trees.
pub mod condition;
/// Parse trees to world entities.
pub mod convert;
/// Diagnostics and ariadne rendering.
pub mod diagnostics;
/// Tokenizer.
pub mod lexer;
/// World directory discovery and loading.
pub mod loader;
/// Tree parser.
pub mod parser;

/// Re-export the parse tree.
pub use ast::{ParseNode, ParseObject, SourceFile};
/// Re-export the condition compiler.
pub use condition::{ConditionError, compile_condition};
/// Re-export conversion errors.
pub use convert::ConvertError;
/// Re-export diagnostics.
pub use diagnostics::{Diagnostic, Severity};
/// Re-export the lexer.
pub use lexer::{FileLexer, LexError, Lexer, Token, lex, lex_file};
/// Re-export the loader.
pub use loader::{LoadConfig, LoadError, LoadReport, SourceKind, WorldLoader, load_world, read_source};
/// Re-export the parser.
pub use parser::{ParseError, SyntaxError, parse, parse_source};
