use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::scope::EvaluationScope;
use crate::value::Value;

/// A binary operator in a condition expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/` (truncating)
    Div,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `and`
    And,
    /// `or`
    Or,
    /// `xor`: the operands differ.
    Xor,
    /// `xnor`: the operands agree.
    Xnor,
}

impl Operator {
    /// Look up an operator by its source spelling. Word operators are
    /// case-insensitive.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol.to_ascii_lowercase().as_str() {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "xnor" => Self::Xnor,
            _ => return None,
        };
        Some(op)
    }

    /// The source spelling of this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Xnor => "xnor",
        }
    }

    /// Apply the operator to two evaluated operands.
    pub fn apply(self, left: &Value, right: &Value) -> EvalResult<Value> {
        let value = match self {
            Self::Add => Value::Int(
                left.as_int(self)?
                    .checked_add(right.as_int(self)?)
                    .ok_or(EvalError::Overflow(self))?,
            ),
            Self::Sub => Value::Int(
                left.as_int(self)?
                    .checked_sub(right.as_int(self)?)
                    .ok_or(EvalError::Overflow(self))?,
            ),
            Self::Mul => Value::Int(
                left.as_int(self)?
                    .checked_mul(right.as_int(self)?)
                    .ok_or(EvalError::Overflow(self))?,
            ),
            Self::Div => {
                let divisor = right.as_int(self)?;
                if divisor == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Value::Int(
                    left.as_int(self)?
                        .checked_div(divisor)
                        .ok_or(EvalError::Overflow(self))?,
                )
            }
            Self::Lt => Value::Bool(left.as_int(self)? < right.as_int(self)?),
            Self::Gt => Value::Bool(left.as_int(self)? > right.as_int(self)?),
            Self::Le => Value::Bool(left.as_int(self)? <= right.as_int(self)?),
            Self::Ge => Value::Bool(left.as_int(self)? >= right.as_int(self)?),
            Self::Eq => Value::Bool(loosely_equal(left, right)),
            Self::Ne => Value::Bool(!loosely_equal(left, right)),
            Self::And => Value::Bool(left.as_bool(self)? && right.as_bool(self)?),
            Self::Or => Value::Bool(left.as_bool(self)? || right.as_bool(self)?),
            Self::Xor => Value::Bool(left.as_bool(self)? != right.as_bool(self)?),
            Self::Xnor => Value::Bool(left.as_bool(self)? == right.as_bool(self)?),
        };
        Ok(value)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Integers and booleans compare numerically; anything involving text
/// compares by rendered form.
fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Text(_), _) | (_, Value::Text(_)) => left.to_string() == right.to_string(),
        _ => left.as_int(Operator::Eq).ok() == right.as_int(Operator::Eq).ok(),
    }
}

/// A compiled expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal integer or boolean.
    Literal(Value),
    /// A name resolved against the scope at evaluation time.
    Variable(String),
    /// A binary operation over two sub-expressions.
    Binary {
        /// The operator.
        op: Operator,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
}

impl Expr {
    /// Integer literal.
    pub fn int(n: i64) -> Self {
        Self::Literal(Value::Int(n))
    }

    /// Boolean literal.
    pub fn bool(b: bool) -> Self {
        Self::Literal(Value::Bool(b))
    }

    /// Variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Binary operation.
    pub fn binary(op: Operator, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate the tree against a scope. Both operands of every operator are
    /// always evaluated, so an unknown name fails even behind `and`/`or`.
    pub fn evaluate(&self, scope: &EvaluationScope<'_>) -> EvalResult<Value> {
        match self {
            Self::Literal(v) => Ok(v.clone()),
            Self::Variable(name) => scope.get(name),
            Self::Binary { op, left, right } => {
                let l = left.evaluate(scope)?;
                let r = right.evaluate(scope)?;
                op.apply(&l, &r)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::Variable(name) => write!(f, "{name}"),
            Self::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
        }
    }
}

/// A compiled, reusable boolean predicate over an [`EvaluationScope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    /// Wrap a compiled expression together with the text it came from.
    pub fn new(source: impl Into<String>, expr: Expr) -> Self {
        Self {
            source: source.into(),
            expr,
        }
    }

    /// A condition that always holds.
    pub fn always() -> Self {
        Self::new("true", Expr::bool(true))
    }

    /// The source text of the condition.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate to a boolean. Integer results count as true when non-zero.
    pub fn evaluate(&self, scope: &EvaluationScope<'_>) -> EvalResult<bool> {
        match self.expr.evaluate(scope)? {
            Value::Bool(b) => Ok(b),
            Value::Int(n) => Ok(n != 0),
            text @ Value::Text(_) => Err(EvalError::TypeMismatch {
                operator: Operator::And,
                found: text.kind(),
                value: text.to_string(),
            }),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
