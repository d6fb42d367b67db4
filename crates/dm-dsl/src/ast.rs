use std::fmt;

use serde::{Deserialize, Serialize};

/// Source span as a byte range.
pub type Span = std::ops::Range<usize>;

/// A parsed source unit: a sequence of top-level objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Top-level objects in source order.
    pub objects: Vec<ParseObject>,
}

/// A named container, `name { member, ... }`.
///
/// Spans are carried for diagnostics only and are left out of the
/// serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseObject {
    /// The container's name.
    pub name: String,
    /// Members in source order.
    pub children: Vec<ParseNode>,
    /// Byte range of the whole container.
    #[serde(skip)]
    pub span: Span,
    /// Byte range of the name.
    #[serde(skip)]
    pub name_span: Span,
}

/// A member of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseNode {
    /// A nested container.
    Container(ParseObject),
    /// `key = value`, value text kept verbatim.
    Assignment {
        /// Assigned key.
        key: String,
        /// Unparsed value text.
        value: String,
        /// Byte range of the member.
        #[serde(skip)]
        span: Span,
    },
    /// Any other member: its concatenated text.
    Item {
        /// Item text.
        text: String,
        /// Byte range of the member.
        #[serde(skip)]
        span: Span,
    },
}

impl ParseNode {
    /// Byte range of this member.
    pub fn span(&self) -> Span {
        match self {
            ParseNode::Container(obj) => obj.span.clone(),
            ParseNode::Assignment { span, .. } | ParseNode::Item { span, .. } => span.clone(),
        }
    }

    /// Short kind name used in messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseNode::Container(_) => "container",
            ParseNode::Assignment { .. } => "assignment",
            ParseNode::Item { .. } => "item",
        }
    }
}

impl ParseObject {
    /// A container with no members and an empty span.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: append a member.
    pub fn with(mut self, child: ParseNode) -> Self {
        self.children.push(child);
        self
    }
}

// ---------------------------------------------------------------------------
// Re-serialization
// ---------------------------------------------------------------------------

/// Write `text` so that it lexes back to the same text: bare when it is a
/// single word, quoted otherwise.
fn write_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let bare = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare {
        write!(f, "{text}")
    } else {
        write!(f, "\"{text}\"")
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}

fn write_object(f: &mut fmt::Formatter<'_>, obj: &ParseObject, depth: usize) -> fmt::Result {
    write_text(f, &obj.name)?;
    f.write_str(" {\n")?;
    for child in &obj.children {
        write_indent(f, depth + 1)?;
        match child {
            ParseNode::Container(inner) => write_object(f, inner, depth + 1)?,
            ParseNode::Assignment { key, value, .. } => {
                write_text(f, key)?;
                f.write_str(" = ")?;
                write_text(f, value)?;
            }
            ParseNode::Item { text, .. } => write_text(f, text)?,
        }
        f.write_str(",\n")?;
    }
    write_indent(f, depth)?;
    f.write_str("}")
}

impl fmt::Display for ParseObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_object(f, self, 0)
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for obj in &self.objects {
            writeln!(f, "{obj}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str) -> ParseNode {
        ParseNode::Item {
            text: text.into(),
            span: 0..0,
        }
    }

    #[test]
    fn display_quotes_only_when_needed() {
        let obj = ParseObject::new("cave")
            .with(item("A damp cave."))
            .with(ParseNode::Assignment {
                key: "HP".into(),
                value: "10".into(),
                span: 0..0,
            })
            .with(ParseNode::Container(ParseObject::new("x > 3").with(item("RERUN"))));
        assert_eq!(
            obj.to_string(),
            "cave {\n  \"A damp cave.\",\n  HP = 10,\n  \"x > 3\" {\n    RERUN,\n  },\n}"
        );
    }

    #[test]
    fn empty_text_is_quoted() {
        let obj = ParseObject::new("n").with(item(""));
        assert_eq!(obj.to_string(), "n {\n  \"\",\n}");
    }

    #[test]
    fn serialized_form_is_tagged_and_span_free() {
        let obj = ParseObject {
            name: "q".into(),
            children: vec![item("hello")],
            span: 3..9,
            name_span: 3..4,
        };
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "q",
                "children": [{ "kind": "item", "text": "hello" }]
            })
        );
    }
}
