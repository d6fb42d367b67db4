use std::fs;
use std::path::{Path, PathBuf};

use dm_core::{EngineConfig, Questline, World, WorldCharacter, WorldNode, WorldWarning};

use crate::ast::{SourceFile, Span};
use crate::convert::{ConvertError, convert_character, convert_node, convert_questline};
use crate::diagnostics::{Diagnostic, Severity, SourceMap, render_diagnostics};
use crate::lexer::{LexError, Token, lex, lex_file};
use crate::parser::{SyntaxError, parse};

/// Default cap on directory nesting below a source directory.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// The three kinds of source unit a world is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Quest lines.
    Quests,
    /// Characters and their rules.
    Characters,
    /// World nodes.
    Nodes,
}

impl SourceKind {
    /// Single-file layout name.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Quests => "quests.txt",
            Self::Characters => "characters.txt",
            Self::Nodes => "world.txt",
        }
    }

    /// Directory layout name.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Quests => "quests",
            Self::Characters => "characters",
            Self::Nodes => "world",
        }
    }

    /// Human-readable plural.
    pub fn label(self) -> &'static str {
        match self {
            Self::Quests => "quests",
            Self::Characters => "characters",
            Self::Nodes => "world nodes",
        }
    }
}

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// How many directory levels below each source directory are searched.
    pub max_depth: usize,
    /// Configuration of the world being built.
    pub engine: EngineConfig,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            engine: EngineConfig::default(),
        }
    }
}

impl LoadConfig {
    /// Set the directory depth cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the engine configuration.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

/// Errors raised while loading. Only [`LoadError::NotADirectory`] stops a
/// whole load; the rest reject a single source unit and end up as
/// diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The world root is not a directory.
    #[error("{} is not a world directory", .0.display())]
    NotADirectory(PathBuf),

    /// A file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A source unit is not well-formed.
    #[error("{file}: {error}")]
    Syntax {
        /// Display name of the unit.
        file: String,
        /// What went wrong.
        error: SyntaxError,
    },

    /// A well-formed source unit describes an invalid entity.
    #[error("{file}: {error}")]
    Convert {
        /// Display name of the unit.
        file: String,
        /// What went wrong.
        error: ConvertError,
    },
}

impl LoadError {
    /// This error as a diagnostic, located when possible.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Syntax {
                file,
                error: SyntaxError::Lex(e @ LexError::UnterminatedQuote { .. }),
            } => Diagnostic::error(e.span(), e.to_string())
                .with_label("this quote is never closed")
                .in_file(file.clone()),
            Self::Syntax {
                file,
                error: SyntaxError::Lex(e @ LexError::UnexpectedInput { .. }),
            } => Diagnostic::error(e.span(), e.to_string()).in_file(file.clone()),
            Self::Syntax {
                file,
                error: SyntaxError::Lex(e @ LexError::Read { .. }),
            } => Diagnostic::unlocated(Severity::Error, format!("{file}: {e}")),
            Self::Syntax {
                file,
                error: SyntaxError::Parse(errors),
            } => match errors.first() {
                Some(e) => {
                    let label = match &e.found {
                        Some(found) => format!("unexpected `{found}`"),
                        None => "unexpected end of input".to_string(),
                    };
                    Diagnostic::error(e.span.clone(), e.message.clone())
                        .with_label(label)
                        .in_file(file.clone())
                }
                None => Diagnostic::unlocated(Severity::Error, self.to_string()),
            },
            Self::Convert { file, error } => {
                Diagnostic::error(error.span(), error.to_string()).in_file(file.clone())
            }
            Self::NotADirectory(_) | Self::Io { .. } => {
                Diagnostic::unlocated(Severity::Error, self.to_string())
            }
        }
    }
}

/// The outcome of loading a world: the linked world plus every diagnostic
/// raised on the way, and the source texts they point into.
#[derive(Debug)]
pub struct LoadReport {
    /// The linked world. Units that failed to load contribute nothing.
    pub world: World,
    /// Errors and warnings in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
    /// Every source unit read, by display name.
    pub sources: SourceMap,
}

impl LoadReport {
    /// Whether any source unit was rejected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// Render every diagnostic with ariadne.
    pub fn render(&self) -> String {
        render_diagnostics(&self.sources, &self.diagnostics)
    }
}

enum Entities {
    Nodes(Vec<(Span, WorldNode)>),
    Characters(Vec<(Span, WorldCharacter)>),
    Quests(Vec<(Span, Questline)>),
}

fn convert_unit(
    kind: SourceKind,
    file: &SourceFile,
    warnings: &mut Vec<Diagnostic>,
) -> Result<Entities, ConvertError> {
    let objects = file.objects.iter();
    Ok(match kind {
        SourceKind::Nodes => Entities::Nodes(
            objects
                .map(|obj| (obj.name_span.clone(), convert_node(obj, warnings)))
                .collect(),
        ),
        SourceKind::Characters => Entities::Characters(
            objects
                .map(|obj| Ok((obj.name_span.clone(), convert_character(obj, warnings)?)))
                .collect::<Result<_, ConvertError>>()?,
        ),
        SourceKind::Quests => Entities::Quests(
            objects
                .map(|obj| Ok((obj.name_span.clone(), convert_questline(obj, warnings)?)))
                .collect::<Result<_, ConvertError>>()?,
        ),
    })
}

/// Incremental world builder.
///
/// Each call to [`WorldLoader::add_source`] parses, converts and registers
/// one source unit; [`WorldLoader::finish`] links the world. A unit that
/// fails anywhere registers nothing.
pub struct WorldLoader {
    world: World,
    diagnostics: Vec<Diagnostic>,
    sources: SourceMap,
}

impl WorldLoader {
    /// An empty loader building a world with `config`.
    pub fn new(config: &LoadConfig) -> Self {
        Self {
            world: World::new(config.engine.clone()),
            diagnostics: Vec::new(),
            sources: SourceMap::new(),
        }
    }

    /// Load one source unit held in memory. Returns whether it was accepted.
    pub fn add_source(&mut self, kind: SourceKind, file: impl Into<String>, text: String) -> bool {
        let tokens = lex(&text);
        self.accept(kind, file.into(), text, tokens)
    }

    /// Load one source unit from disk, lexing it line by line as it is
    /// read. Returns whether it was accepted.
    pub fn add_file(&mut self, kind: SourceKind, file: impl Into<String>, path: &Path) -> bool {
        let file = file.into();
        match read_tokens(path) {
            Ok((text, tokens)) => self.accept(kind, file, text, tokens),
            Err(e) => {
                log::warn!("{e}");
                self.diagnostics.push(e.to_diagnostic());
                false
            }
        }
    }

    fn accept(&mut self, kind: SourceKind, file: String, text: String, tokens: LexResult) -> bool {
        log::debug!("loading {} from {file}", kind.label());
        let result = self.load_unit(kind, &file, tokens);
        self.sources.insert(file.clone(), text);
        match result {
            Ok(entities) => {
                self.register(&file, entities);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                self.diagnostics.push(e.to_diagnostic());
                false
            }
        }
    }

    fn load_unit(&mut self, kind: SourceKind, file: &str, tokens: LexResult) -> Result<Entities, LoadError> {
        let tree = parse_tokens(tokens).map_err(|error| LoadError::Syntax {
            file: file.to_string(),
            error,
        })?;
        let mut warnings = Vec::new();
        let entities = convert_unit(kind, &tree, &mut warnings).map_err(|error| LoadError::Convert {
            file: file.to_string(),
            error,
        })?;
        self.diagnostics
            .extend(warnings.into_iter().map(|d| d.in_file(file)));
        Ok(entities)
    }

    fn register(&mut self, file: &str, entities: Entities) {
        let mut located = Vec::new();
        match entities {
            Entities::Nodes(nodes) => {
                for (span, node) in nodes {
                    located.push((span, self.world.add_node(node).1));
                }
            }
            Entities::Characters(characters) => {
                for (span, character) in characters {
                    located.push((span, self.world.add_character(character).1));
                }
            }
            Entities::Quests(quests) => {
                for (span, quest) in quests {
                    located.push((span, self.world.add_questline(quest).1));
                }
            }
        }
        for (span, warning) in located {
            if let Some(w) = warning {
                self.diagnostics
                    .push(Diagnostic::warning(span, w.to_string()).in_file(file));
            }
        }
    }

    /// Record a diagnostic that belongs to no single unit.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Link the world and hand back everything gathered.
    pub fn finish(mut self) -> LoadReport {
        let links: Vec<WorldWarning> = self.world.link();
        self.diagnostics.extend(
            links
                .iter()
                .map(|w| Diagnostic::world_warning(w.to_string())),
        );
        log::info!(
            "loaded {} nodes, {} characters, {} quests",
            self.world.node_count(),
            self.world.character_count(),
            self.world.quest_count()
        );
        LoadReport {
            world: self.world,
            diagnostics: self.diagnostics,
            sources: self.sources,
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Where a kind of source lives under `root`: the single file if present,
/// else the directory.
pub fn locate(root: &Path, kind: SourceKind) -> Option<PathBuf> {
    let file = root.join(kind.file_name());
    if file.is_file() {
        return Some(file);
    }
    let dir = root.join(kind.dir_name());
    dir.is_dir().then_some(dir)
}

/// Files making up a source, sorted. A file is its own only member. For a
/// directory, subdirectories nested deeper than `max_depth` are skipped and
/// returned separately.
pub fn collect_files(path: &Path, max_depth: usize) -> Result<(Vec<PathBuf>, Vec<PathBuf>), LoadError> {
    let mut files = Vec::new();
    let mut skipped = Vec::new();
    if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        walk(path, 0, max_depth, &mut files, &mut skipped)?;
    }
    Ok((files, skipped))
}

fn walk(
    dir: &Path,
    depth: usize,
    max_depth: usize,
    files: &mut Vec<PathBuf>,
    skipped: &mut Vec<PathBuf>,
) -> Result<(), LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            if depth >= max_depth {
                skipped.push(entry);
            } else {
                walk(&entry, depth + 1, max_depth, files, skipped)?;
            }
        } else if entry.is_file() {
            files.push(entry);
        }
    }
    Ok(())
}

fn display_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Load a world directory.
///
/// Each of quests, characters and world nodes is read from its single file
/// or directory (see [`SourceKind`]); a missing source is a warning. Units
/// that fail to read, parse or convert are reported and skipped. The
/// world is linked once everything is registered.
pub fn load_world(root: &Path, config: &LoadConfig) -> Result<LoadReport, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::NotADirectory(root.to_path_buf()));
    }
    log::info!("loading world from {}", root.display());

    let mut loader = WorldLoader::new(config);
    for kind in [SourceKind::Nodes, SourceKind::Characters, SourceKind::Quests] {
        let Some(path) = locate(root, kind) else {
            let message = format!(
                "no {} found: expected {} or {}/",
                kind.label(),
                kind.file_name(),
                kind.dir_name()
            );
            log::warn!("{message}");
            loader.report(Diagnostic::world_warning(message));
            continue;
        };

        let (files, skipped) = match collect_files(&path, config.max_depth) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("{e}");
                loader.report(e.to_diagnostic());
                continue;
            }
        };
        for dir in skipped {
            let message = format!(
                "max depth {} reached, skipping {}",
                config.max_depth,
                display_name(root, &dir)
            );
            log::warn!("{message}");
            loader.report(Diagnostic::world_warning(message));
        }

        for file in files {
            loader.add_file(kind, display_name(root, &file), &file);
        }
    }
    Ok(loader.finish())
}

type LexResult = Result<Vec<(Token, Span)>, LexError>;

/// Stream a file through [`lex_file`], keeping the text it read.
fn read_tokens(path: &Path) -> Result<(String, LexResult), LoadError> {
    let mut lexer = lex_file(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tokens = lexer.by_ref().collect();
    Ok((lexer.into_source(), tokens))
}

fn parse_tokens(tokens: LexResult) -> Result<SourceFile, SyntaxError> {
    parse(&tokens?).map_err(SyntaxError::Parse)
}

/// Read and parse a single source file without converting it.
///
/// Only failing to open the file is an error here; the text read is
/// returned alongside a syntax error so it can be rendered.
pub fn read_source(path: &Path) -> Result<(String, Result<SourceFile, SyntaxError>), LoadError> {
    let (text, tokens) = read_tokens(path)?;
    Ok((text, parse_tokens(tokens)))
}
