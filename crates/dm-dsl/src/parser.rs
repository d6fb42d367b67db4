use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::ast::{ParseNode, ParseObject, SourceFile};
use crate::lexer::{self, LexError, Token};

type Span = SimpleSpan;

/// Parse error with source span.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    /// Byte range of the offending token.
    pub span: std::ops::Range<usize>,
    /// What was expected and what was found.
    pub message: String,
    /// The offending token, or `None` at end of input.
    pub found: Option<String>,
}

/// Failure to turn source text into a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// The text could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// The tokens do not form a well-formed tree.
    #[error("{}", .0.first().map(|e| e.message.as_str()).unwrap_or("parse error"))]
    Parse(Vec<ParseError>),
}

/// Build the tree parser.
///
/// `object := id '{' member* '}'`, where a member is a nested object, an
/// assignment or an item, each followed by `,`.
fn source_file_parser<'a, I>() -> impl Parser<'a, I, SourceFile, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let object = recursive(|object| {
        let open = just(Token::Punct('{')).labelled("'{'");
        let close = just(Token::Punct('}')).labelled("'}'");
        let comma = just(Token::Punct(',')).labelled("','");
        let equals = just(Token::Punct('='));

        // Anything that does not delimit structure.
        let fragment = select! {
            Token::Word(w) => w,
            Token::Quoted(q) => q,
            Token::Punct(c) if !matches!(c, '{' | '}' | ',') => c.to_string(),
        }
        .labelled("text");

        let text = fragment
            .clone()
            .repeated()
            .collect::<Vec<String>>()
            .map(|parts| parts.concat());

        let nested = object
            .then_ignore(comma.clone())
            .map(ParseNode::Container);

        let assignment = fragment
            .clone()
            .then_ignore(equals)
            .then(text.clone())
            .then_ignore(comma.clone())
            .map_with(|(key, value), e: &mut chumsky::input::MapExtra<'a, '_, I, extra::Err<Rich<'a, Token>>>| ParseNode::Assignment {
                key,
                value,
                span: e.span().into_range(),
            });

        let item = fragment
            .clone()
            .then(text)
            .then_ignore(comma)
            .map_with(|(head, rest), e| ParseNode::Item {
                text: head + &rest,
                span: e.span().into_range(),
            });

        let member = choice((nested, assignment, item));

        fragment
            .map_with(|name, e| (name, e.span().into_range()))
            .then_ignore(open)
            .then(member.repeated().collect::<Vec<_>>())
            .then_ignore(close)
            .map_with(|((name, name_span), children), e| ParseObject {
                name,
                children,
                span: e.span().into_range(),
                name_span,
            })
    });

    object
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|objects| SourceFile { objects })
}

/// Parse a token stream into a [`SourceFile`].
///
/// There is no recovery: the first malformed object fails the whole unit.
pub fn parse(tokens: &[(Token, std::ops::Range<usize>)]) -> Result<SourceFile, Vec<ParseError>> {
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let len = tokens.last().map_or(0, |(_, s)| s.end);
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = source_file_parser().parse(stream).into_output_errors();

    if let Some(file) = output
        && errors.is_empty()
    {
        return Ok(file);
    }

    Err(errors
        .into_iter()
        .map(|e| {
            let span = *e.span();
            ParseError {
                span: span.into_range(),
                message: e.to_string(),
                found: e.found().map(|t| t.to_string()),
            }
        })
        .collect())
}

/// Lex and parse a source string.
pub fn parse_source(source: &str) -> Result<SourceFile, SyntaxError> {
    let tokens = lexer::lex(source)?;
    parse(&tokens).map_err(SyntaxError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> SourceFile {
        match parse_source(source) {
            Ok(file) => file,
            Err(e) => panic!("parse failed: {e:?}"),
        }
    }

    fn parse_errors(source: &str) -> Vec<ParseError> {
        match parse_source(source) {
            Err(SyntaxError::Parse(errors)) => errors,
            other => panic!("expected parse errors, got {other:?}"),
        }
    }

    #[test]
    fn parse_node_source() {
        let file = parse_ok(
            r#"
            # the start
            crossroads {
                "Four roads meet here.",
                TRANS { north="forest", east = "river bank", },
            }
            forest { "Tall pines.", }
            "#,
        );
        assert_eq!(file.objects.len(), 2);
        let cross = &file.objects[0];
        assert_eq!(cross.name, "crossroads");
        assert_eq!(cross.children.len(), 2);
        assert!(matches!(&cross.children[0], ParseNode::Item { text, .. } if text == "Four roads meet here."));
        let ParseNode::Container(trans) = &cross.children[1] else {
            panic!("expected TRANS container");
        };
        assert_eq!(trans.name, "TRANS");
        assert!(matches!(
            &trans.children[1],
            ParseNode::Assignment { key, value, .. } if key == "east" && value == "river bank"
        ));
    }

    #[test]
    fn values_and_items_concatenate_tokens() {
        let file = parse_ok("q { 0 { \"start\", 2:\"found her\", 3, }, HP = 1 0, }");
        let q = &file.objects[0];
        let ParseNode::Container(zero) = &q.children[0] else {
            panic!("expected quest node");
        };
        assert!(matches!(&zero.children[1], ParseNode::Item { text, .. } if text == "2:found her"));
        assert!(matches!(&zero.children[2], ParseNode::Item { text, .. } if text == "3"));
        assert!(matches!(&q.children[1], ParseNode::Assignment { value, .. } if value == "10"));
    }

    #[test]
    fn quoted_container_names() {
        let file = parse_ok("guard { \"hour > 20\" { NODE = gate, RERUN, }, }");
        let ParseNode::Container(rule) = &file.objects[0].children[0] else {
            panic!("expected rule container");
        };
        assert_eq!(rule.name, "hour > 20");
        assert_eq!(rule.children.len(), 2);
    }

    #[test]
    fn empty_values_are_allowed() {
        let file = parse_ok("a { KEY=, }");
        assert!(matches!(&file.objects[0].children[0], ParseNode::Assignment { value, .. } if value.is_empty()));
    }

    #[test]
    fn empty_source_has_no_objects() {
        assert!(parse_ok("  # nothing here\n").objects.is_empty());
    }

    #[test]
    fn spans_cover_objects() {
        let source = "cave { \"dark\", }";
        let file = parse_ok(source);
        assert_eq!(file.objects[0].span, 0..source.len());
        assert_eq!(file.objects[0].name_span, 0..4);
    }

    #[test]
    fn missing_open_brace() {
        let errors = parse_errors("cave \"dark\", }");
        assert!(!errors.is_empty());
        assert!(errors[0].message.contains("'{'"), "{}", errors[0].message);
    }

    #[test]
    fn missing_comma_between_members() {
        let errors = parse_errors("cave { \"dark\" }");
        assert!(errors[0].message.contains("','"), "{}", errors[0].message);
    }

    #[test]
    fn missing_comma_after_nested_container() {
        let errors = parse_errors("cave { TRANS { n=x, } }");
        assert!(errors[0].message.contains("','"), "{}", errors[0].message);
    }

    #[test]
    fn missing_close_brace() {
        let errors = parse_errors("cave { \"dark\",");
        assert_eq!(errors[0].found, None);
    }

    #[test]
    fn lex_errors_surface() {
        assert!(matches!(
            parse_source("cave { \"dark, }"),
            Err(SyntaxError::Lex(LexError::UnterminatedQuote { .. }))
        ));
    }

    #[test]
    fn display_round_trips() {
        let source = "a { \"x y\", k = \"v w\", inner { 1, 2:go, }, }\nb { }";
        let first = parse_ok(source);
        let second = parse_ok(&first.to_string());
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::*;

        fn text() -> impl Strategy<Value = String> {
            "[a-zA-Z0-9_ .:#!-]{0,8}"
        }

        fn member() -> impl Strategy<Value = ParseNode> {
            let leaf = prop_oneof![
                text().prop_map(|text| ParseNode::Item { text, span: 0..0 }),
                (text(), text()).prop_map(|(key, value)| ParseNode::Assignment {
                    key,
                    value,
                    span: 0..0,
                }),
            ];
            leaf.prop_recursive(3, 24, 4, |inner| {
                (text(), prop::collection::vec(inner, 0..4)).prop_map(|(name, children)| {
                    ParseNode::Container(ParseObject {
                        name,
                        children,
                        ..ParseObject::default()
                    })
                })
            })
        }

        fn source_file() -> impl Strategy<Value = SourceFile> {
            prop::collection::vec(
                (text(), prop::collection::vec(member(), 0..5)).prop_map(|(name, children)| {
                    ParseObject {
                        name,
                        children,
                        ..ParseObject::default()
                    }
                }),
                0..4,
            )
            .prop_map(|objects| SourceFile { objects })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Rendering a tree and parsing it back preserves names, kinds and
            /// child order.
            #[test]
            fn rendered_trees_parse_back(file in source_file()) {
                let reparsed = parse_source(&file.to_string());
                prop_assert!(reparsed.is_ok(), "{:?}", reparsed);
                let reparsed = reparsed.unwrap();
                prop_assert_eq!(
                    serde_json::to_value(&reparsed).unwrap(),
                    serde_json::to_value(&file).unwrap()
                );
            }

            /// The parser never panics on arbitrary input.
            #[test]
            fn parser_never_panics(input in "[a-z{},=\" ]{0,40}") {
                let _ = parse_source(&input);
            }
        }
    }
}
