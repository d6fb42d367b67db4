use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use dm_core::{Condition, Expr, Operator};

use crate::lexer::{self, Token};

type Span = SimpleSpan;

/// A condition string that does not compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid condition {condition:?}: {message}")]
pub struct ConditionError {
    /// The condition text as written.
    pub condition: String,
    /// Byte range within the condition text.
    pub span: std::ops::Range<usize>,
    /// What went wrong.
    pub message: String,
}

fn is_word_operator(word: &str) -> bool {
    ["and", "or", "xor", "xnor"]
        .iter()
        .any(|op| word.eq_ignore_ascii_case(op))
}

/// Interpret a bare word in operand position.
fn word_operand(word: &str) -> Result<Expr, String> {
    if word.bytes().all(|b| b.is_ascii_digit()) {
        return word
            .parse::<i64>()
            .map(Expr::int)
            .map_err(|_| format!("integer literal {word} is out of range"));
    }
    if word.eq_ignore_ascii_case("true") {
        Ok(Expr::bool(true))
    } else if word.eq_ignore_ascii_case("false") {
        Ok(Expr::bool(false))
    } else {
        Ok(Expr::var(word))
    }
}

/// Build the condition parser.
///
/// `expr := atom (operator expr)?`. There is no precedence: everything
/// right of an operator is its right operand, so `a - b - c` is
/// `a - (b - c)`. Only parentheses group.
fn condition_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let punct = |c: char| just(Token::Punct(c));

    let word_operator = select! {
        Token::Word(w) if w.eq_ignore_ascii_case("and") => Operator::And,
        Token::Word(w) if w.eq_ignore_ascii_case("or") => Operator::Or,
        Token::Word(w) if w.eq_ignore_ascii_case("xor") => Operator::Xor,
        Token::Word(w) if w.eq_ignore_ascii_case("xnor") => Operator::Xnor,
    };

    let operator = choice((
        punct('<')
            .ignore_then(punct('=').or_not())
            .map(|eq| if eq.is_some() { Operator::Le } else { Operator::Lt }),
        punct('>')
            .ignore_then(punct('=').or_not())
            .map(|eq| if eq.is_some() { Operator::Ge } else { Operator::Gt }),
        punct('=').then(punct('=')).to(Operator::Eq),
        punct('!').then(punct('=')).to(Operator::Ne),
        punct('+').to(Operator::Add),
        punct('-').to(Operator::Sub),
        punct('*').to(Operator::Mul),
        punct('/').to(Operator::Div),
        word_operator,
    ))
    .labelled("operator");

    let operand = select! {
        Token::Word(w) if !is_word_operator(&w) => w,
    }
    .try_map(|w, span| word_operand(&w).map_err(|msg| Rich::custom(span, msg)));

    let negative = punct('-')
        .ignore_then(select! { Token::Word(w) => w })
        .try_map(|w, span| {
            format!("-{w}")
                .parse::<i64>()
                .map(Expr::int)
                .map_err(|_| Rich::custom(span, format!("-{w} is not an integer literal")))
        });

    recursive(|expr| {
        let atom = choice((
            negative,
            operand,
            expr.clone().delimited_by(punct('('), punct(')')),
        ))
        .labelled("operand");

        atom.then(operator.then(expr).or_not())
            .map(|(left, rest)| match rest {
                Some((op, right)) => Expr::binary(op, left, right),
                None => left,
            })
    })
    .then_ignore(end())
}

/// Compile a condition string into a reusable [`Condition`].
///
/// The text is lexed with the same rules as source files. Names are not
/// checked here; an unknown name fails when the condition is evaluated.
pub fn compile_condition(source: &str) -> Result<Condition, ConditionError> {
    let tokens = lexer::lex(source).map_err(|e| ConditionError {
        condition: source.to_string(),
        span: e.span(),
        message: e.to_string(),
    })?;

    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));
    let len = source.len();
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = condition_parser().parse(stream).into_output_errors();
    match (output, errors.into_iter().next()) {
        (Some(expr), None) => Ok(Condition::new(source, expr)),
        (_, Some(e)) => Err(ConditionError {
            condition: source.to_string(),
            span: e.span().into_range(),
            message: e.to_string(),
        }),
        (None, None) => Err(ConditionError {
            condition: source.to_string(),
            span: 0..len,
            message: "empty condition".to_string(),
        }),
    }
}
