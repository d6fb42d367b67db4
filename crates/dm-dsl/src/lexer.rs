use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use logos::Logos;

use crate::ast::Span;

/// Token type for AutoDM source files and condition strings.
///
/// The lexer knows nothing about keywords or grammar: every run of word
/// characters is a `Word`, every other visible character is `Punct`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// A run of ASCII letters, digits and underscores (identifiers and numbers).
    Word(String),
    /// The contents of a `"..."` literal, quotes removed. May span lines.
    Quoted(String),
    /// Any other single non-whitespace character.
    Punct(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{w}"),
            Token::Quoted(q) => write!(f, "\"{q}\""),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

/// Internal logos token. Converted to owned [`Token`] as it is produced.
#[derive(Logos, Debug)]
#[logos(skip r"\s+")]
#[logos(skip r"#[^\n]*")]
enum RawToken {
    #[regex(r"[A-Za-z0-9_]+")]
    Word,

    #[regex(r#""[^"]*""#)]
    Quoted,

    // A quote with no closing quote after it, up to the end of the input.
    #[regex(r#""[^"]*"#)]
    Unterminated,

    #[regex(r##"[^A-Za-z0-9_"#\s]"##)]
    Punct,
}

/// A lexer error with source location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// A `"` with no closing quote before the end of input.
    #[error("unterminated quoted literal")]
    UnterminatedQuote {
        /// Byte range of the opening quote.
        span: Span,
    },
    /// Input the lexer has no rule for.
    #[error("unexpected character {text:?}")]
    UnexpectedInput {
        /// Byte range of the input.
        span: Span,
        /// The offending text.
        text: String,
    },
    /// The source file could not be read past `offset`.
    #[error("could not read source: {message}")]
    Read {
        /// Byte offset the read failed at.
        offset: usize,
        /// The I/O error, rendered.
        message: String,
    },
}

impl LexError {
    /// Byte range of the error in the source.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedQuote { span } | LexError::UnexpectedInput { span, .. } => {
                span.clone()
            }
            LexError::Read { offset, .. } => *offset..*offset,
        }
    }
}

fn unterminated(start: usize) -> LexError {
    LexError::UnterminatedQuote {
        span: start..start + 1,
    }
}

/// Turn one logos match into a [`Token`].
fn token_from_raw(raw: Result<RawToken, ()>, slice: &str, span: Span) -> Result<Token, LexError> {
    match raw {
        Ok(RawToken::Word) => Ok(Token::Word(slice.to_string())),
        Ok(RawToken::Quoted) => Ok(Token::Quoted(slice[1..slice.len() - 1].to_string())),
        Ok(RawToken::Punct) => slice.chars().next().map(Token::Punct).ok_or(LexError::UnexpectedInput {
            span,
            text: String::new(),
        }),
        Ok(RawToken::Unterminated) => Err(unterminated(span.start)),
        Err(()) if slice.starts_with('"') => Err(unterminated(span.start)),
        Err(()) => Err(LexError::UnexpectedInput {
            span,
            text: slice.to_string(),
        }),
    }
}

/// A lazy token stream over a source string.
///
/// Tokens are produced on demand, one per call to `next`. After the first
/// error the stream is exhausted.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, RawToken>,
    failed: bool,
}

impl<'src> Lexer<'src> {
    /// Start lexing `source` from the beginning.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: RawToken::lexer(source),
            failed: false,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<(Token, Span), LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let raw = self.inner.next()?;
        let span = self.inner.span();
        let item = token_from_raw(raw, self.inner.slice(), span.clone()).map(|t| (t, span));
        self.failed = item.is_err();
        Some(item)
    }
}

/// Lex a whole string into `(Token, Span)` pairs, stopping at the first error.
pub fn lex(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    Lexer::new(source).collect()
}

/// A lazy token stream over a reader, consumed one line at a time.
///
/// A quote left open at the end of a line stays open on the next one.
/// Spans are byte offsets into everything read so far, which
/// [`FileLexer::source`] returns, so they agree with [`lex`] over the
/// same text.
pub struct FileLexer<R> {
    reader: R,
    source: String,
    pending: VecDeque<(Token, Span)>,
    open_quote: Option<usize>,
    error: Option<LexError>,
    done: bool,
}

impl<R: BufRead> FileLexer<R> {
    /// Start lexing `reader`. Nothing is read until the first call to `next`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            source: String::new(),
            pending: VecDeque::new(),
            open_quote: None,
            error: None,
            done: false,
        }
    }

    /// The text read so far.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Give up the stream and keep the text read so far.
    pub fn into_source(self) -> String {
        self.source
    }

    /// Queue the tokens of the line starting at byte `start`.
    fn lex_line(&mut self, start: usize) -> Result<(), LexError> {
        let mut from = start;
        if let Some(open) = self.open_quote {
            let Some(close) = self.source[start..].find('"').map(|i| start + i) else {
                return Ok(());
            };
            self.pending.push_back((
                Token::Quoted(self.source[open + 1..close].to_string()),
                open..close + 1,
            ));
            self.open_quote = None;
            from = close + 1;
        }

        let mut raw = RawToken::lexer(&self.source[from..]);
        while let Some(result) = raw.next() {
            let local = raw.span();
            let span = from + local.start..from + local.end;
            if let Ok(RawToken::Unterminated) = result {
                self.open_quote = Some(span.start);
                break;
            }
            let token = token_from_raw(result, raw.slice(), span.clone())?;
            self.pending.push_back((token, span));
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for FileLexer<R> {
    type Item = Result<(Token, Span), LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            if let Some(e) = self.error.take() {
                return Some(Err(e));
            }
            if self.done {
                return None;
            }

            let start = self.source.len();
            match self.reader.read_line(&mut self.source) {
                Ok(0) => {
                    self.done = true;
                    self.error = self.open_quote.take().map(unterminated);
                }
                Ok(_) => {
                    if let Err(e) = self.lex_line(start) {
                        self.done = true;
                        self.error = Some(e);
                    }
                }
                Err(e) => {
                    self.done = true;
                    self.error = Some(LexError::Read {
                        offset: start,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Open `path` for lazy, line-by-line lexing. Produces exactly the tokens
/// [`lex`] produces for the file's contents.
pub fn lex_file(path: &Path) -> std::io::Result<FileLexer<BufReader<File>>> {
    Ok(FileLexer::new(BufReader::new(File::open(path)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        lex(source)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t.to_string())
            .collect()
    }

    #[test]
    fn lex_object_header() {
        assert_eq!(texts("cave { \"A damp cave.\","), vec!["cave", "{", "\"A damp cave.\"", ","]);
    }

    #[test]
    fn words_include_digits_and_underscores() {
        let tokens = lex("quest_A 12 x9").unwrap();
        assert_eq!(tokens[0].0, Token::Word("quest_A".into()));
        assert_eq!(tokens[1].0, Token::Word("12".into()));
        assert_eq!(tokens[2].0, Token::Word("x9".into()));
    }

    #[test]
    fn every_other_character_is_punctuation() {
        assert_eq!(texts("a>=b"), vec!["a", ">", "=", "b"]);
        assert_eq!(texts("(x)-:"), vec!["(", "x", ")", "-", ":"]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(texts("a # comment { , }\nb"), vec!["a", "b"]);
    }

    #[test]
    fn hash_inside_quotes_is_text() {
        let tokens = lex("\"room #4\"").unwrap();
        assert_eq!(tokens[0].0, Token::Quoted("room #4".into()));
    }

    #[test]
    fn quotes_span_lines() {
        let tokens = lex("\"first line\nsecond line\" x").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].0, Token::Quoted("first line\nsecond line".into()));
    }

    #[test]
    fn no_escapes_in_quotes() {
        let tokens = lex(r#""a\" b"#).unwrap();
        assert_eq!(tokens[0].0, Token::Quoted("a\\".into()));
        assert_eq!(tokens[1].0, Token::Word("b".into()));
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = lex("name { \"never closed,\n }").unwrap_err();
        assert_eq!(err, LexError::UnterminatedQuote { span: 7..8 });
    }

    #[test]
    fn stream_is_lazy_and_stops_after_error() {
        let mut lexer = Lexer::new("a \"b");
        assert!(matches!(lexer.next(), Some(Ok((Token::Word(_), _)))));
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn lex_preserves_spans() {
        let tokens = lex("hello {world}").unwrap();
        assert_eq!(tokens[0].1, 0..5);
        assert_eq!(tokens[1].1, 6..7);
        assert_eq!(tokens[2].1, 7..12);
    }

    #[test]
    fn non_ascii_is_punctuation() {
        assert_eq!(texts("café"), vec!["caf", "é"]);
    }

    fn lex_reader(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
        FileLexer::new(source.as_bytes()).collect()
    }

    #[test]
    fn lex_file_matches_lex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.txt");
        let source = "start { \"A crossroads\n at dusk.\", # note\n TRANS { north=\"cave\", }, }";
        std::fs::write(&path, source).unwrap();

        let mut lexer = lex_file(&path).unwrap();
        let from_file = lexer.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(from_file, lex(source).unwrap());
        assert_eq!(lexer.source(), source);
    }

    #[test]
    fn file_lexer_reads_one_line_at_a_time() {
        let mut lexer = FileLexer::new("a b\nc\n".as_bytes());
        assert_eq!(lexer.next(), Some(Ok((Token::Word("a".into()), 0..1))));
        assert_eq!(lexer.source(), "a b\n");
        assert_eq!(lexer.next(), Some(Ok((Token::Word("b".into()), 2..3))));
        assert_eq!(lexer.next(), Some(Ok((Token::Word("c".into()), 4..5))));
        assert_eq!(lexer.source(), "a b\nc\n");
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn file_lexer_carries_quotes_across_lines() {
        let tokens = lex_reader("x \"one\n# not a comment\nthree\" y # comment\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                (Token::Word("x".into()), 0..1),
                (Token::Quoted("one\n# not a comment\nthree".into()), 2..29),
                (Token::Word("y".into()), 30..31),
            ]
        );
    }

    #[test]
    fn file_lexer_reports_unterminated_quote_at_the_opening_quote() {
        let source = "name { \"never closed,\n }";
        assert_eq!(lex_reader(source), lex(source));
        assert_eq!(
            lex_reader(source).unwrap_err(),
            LexError::UnterminatedQuote { span: 7..8 }
        );
    }

    #[test]
    fn unicode_whitespace_separates_words() {
        assert_eq!(texts("a\u{a0}b\u{2003}c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_quotes_are_a_token() {
        let tokens = lex("a \"\" b").unwrap();
        assert_eq!(tokens[1], (Token::Quoted(String::new()), 2..4));
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::*;

        fn source_like() -> impl Strategy<Value = String> {
            prop::collection::vec(
                prop_oneof![
                    "[a-z_][a-z0-9_]{0,6}",
                    "[0-9]{1,4}",
                    Just("{".to_string()),
                    Just("}".to_string()),
                    Just(",".to_string()),
                    Just("=".to_string()),
                    Just(":".to_string()),
                    "\"[a-z #]{0,8}\"",
                    "\"[a-z #\n]{0,8}",
                    "#[a-z ]{0,8}\n",
                    "[ \n\t]{1,3}",
                ],
                0..40,
            )
            .prop_map(|parts| parts.concat())
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Lexing a file yields the same tokens as lexing its text.
            #[test]
            fn file_and_string_agree(source in source_like()) {
                let dir = tempfile::tempdir().unwrap();
                let path = dir.path().join("unit.txt");
                std::fs::write(&path, &source).unwrap();
                let from_file = lex_file(&path).unwrap().collect::<Result<Vec<_>, _>>();
                prop_assert_eq!(from_file, lex(&source));
            }

            /// The lexer never panics on arbitrary input.
            #[test]
            fn lexer_never_panics(input in "\\PC*") {
                let _ = lex(&input);
            }

            /// Every token covers at least one byte.
            #[test]
            fn spans_are_never_empty(source in source_like()) {
                if let Ok(tokens) = lex(&source) {
                    prop_assert!(tokens.iter().all(|(_, span)| span.start < span.end));
                }
            }
        }
    }
}
