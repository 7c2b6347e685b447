//! Errors that can occur while evaluating an expression. They carry no spans; see
//! [`Error::or_span`](matcalc_error::Error::or_span).

use ariadne::Fmt;
use matcalc_attrs::ErrorKind;
use matcalc_error::EXPR;

/// The variable has no value in the context.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` is not defined", self.name),
    labels = ["in this expression"],
    help = if self.suggestions.is_empty() {
        format!("bind a value to {} before evaluating", (&self.name).fg(EXPR))
    } else {
        format!(
            "did you mean {}?",
            self.suggestions
                .iter()
                .map(|s| format!("`{}`", s.fg(EXPR)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    },
)]
pub struct UndefinedVariable {
    /// The name of the variable.
    pub name: String,

    /// The names of similarly named variables in the context.
    pub suggestions: Vec<String>,
}

/// The operands of a binary operation have incompatible shapes.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot apply `{}` to operands of shape {} and {}", op, left, right),
    labels = ["in this expression"],
    help = if *op == "*" {
        "the left operand must have as many columns as the right operand has rows"
    } else {
        "both operands must have the same shape, or one of them must be a scalar"
    },
)]
pub struct ShapeMismatch {
    /// The operator.
    pub op: &'static str,

    /// The shape of the left operand.
    pub left: String,

    /// The shape of the right operand.
    pub right: String,
}

/// The trace of a matrix that is not square.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot take the trace of a {}x{} matrix", rows, cols),
    labels = ["in this expression"],
    help = "only square matrices have a trace",
)]
pub struct NotSquare {
    /// The number of rows.
    pub rows: usize,

    /// The number of columns.
    pub cols: usize,
}

/// A scalar was expected, but a matrix was produced.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("expected a scalar, but found a {} matrix", shape),
    labels = ["this expression"],
    help = "wrap the expression in `Tr(..)` to reduce it to a scalar",
)]
pub struct ExpectedScalar {
    /// The shape of the matrix that was found.
    pub shape: String,
}
