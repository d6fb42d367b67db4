use std::collections::BTreeMap;
use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::ast::Span;

/// Source texts by display name, kept for rendering diagnostics.
pub type SourceMap = BTreeMap<String, String>;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The source unit was rejected.
    Error,
    /// Loading continued.
    Warning,
}

/// A diagnostic message, optionally tied to a location in a source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// Display name of the source unit, when known.
    pub file: Option<String>,
    /// Byte range within the unit, when known.
    pub span: Option<Span>,
    /// Headline message.
    pub message: String,
    /// Text for the source label; defaults to the message.
    pub label: Option<String>,
}

impl Diagnostic {
    /// An error at `span`.
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            file: None,
            span: Some(span),
            message: message.into(),
            label: None,
        }
    }

    /// A warning at `span`.
    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            file: None,
            span: Some(span),
            message: message.into(),
            label: None,
        }
    }

    /// A diagnostic with no source location.
    pub fn unlocated(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            file: None,
            span: None,
            message: message.into(),
            label: None,
        }
    }

    /// A warning about the world as a whole.
    pub fn world_warning(message: impl Into<String>) -> Self {
        Self::unlocated(Severity::Warning, message)
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attach the source unit this diagnostic belongs to.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Whether this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.file {
            Some(file) => write!(f, "{prefix}: {file}: {}", self.message),
            None => write!(f, "{prefix}: {}", self.message),
        }
    }
}

/// Render diagnostics using ariadne for pretty terminal output.
///
/// Diagnostics without a location, or whose unit is not in `sources`, are
/// rendered as a single line.
pub fn render_diagnostics(sources: &SourceMap, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let located = match (&diag.file, &diag.span) {
            (Some(file), Some(span)) => sources
                .get(file)
                .map(|source| (file.as_str(), span.clone(), source.as_str())),
            _ => None,
        };
        let Some((filename, span, source)) = located else {
            output.extend_from_slice(format!("{diag}\n").as_bytes());
            continue;
        };

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let color = match diag.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let mut report = Report::build(kind, (filename, span.clone())).with_message(&diag.message);

        let label_text = diag.label.as_deref().unwrap_or(&diag.message);
        report = report.with_label(
            Label::new((filename, span))
                .with_message(label_text)
                .with_color(color),
        );

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}
