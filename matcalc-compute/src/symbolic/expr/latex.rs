//! LaTeX rendering of expressions and derivatives.

use matcalc_parser::parser::fmt::{fmt_paren, Latex};
use std::fmt::{Formatter, Result};
use crate::symbolic::derivative::Order;
use super::Expr;

/// Writes `child` as LaTeX, bracketing it by the same rule as plain-text printing.
fn fmt_child(f: &mut Formatter, parent: u8, child: &Expr, strict: bool) -> Result {
    let prec = child.precedence();
    if prec > parent || (strict && prec == parent) {
        fmt_paren(f, |f| child.fmt_latex(f))
    } else {
        child.fmt_latex(f)
    }
}

/// Writes the name of a matrix variable. Frozen differentials, whose names are their own textual
/// form `d(X)`, are written as differentials.
fn fmt_matrix_name(f: &mut Formatter, name: &str) -> Result {
    match name.strip_prefix("d(").and_then(|rest| rest.strip_suffix(')')) {
        Some(inner) => write!(f, "\\partial \\mathbf{{{}}}", inner),
        None => write!(f, "\\mathbf{{{}}}", name),
    }
}

impl Latex for Expr {
    fn fmt_latex(&self, f: &mut Formatter) -> Result {
        let prec = self.precedence();
        match self {
            Expr::Variable(name) => fmt_matrix_name(f, name),
            Expr::ScalarVariable(name) => write!(f, "{}", name),
            Expr::Scalar(value) => write!(f, "{}", value),
            Expr::Null => write!(f, "0"),
            Expr::Differential(inner) => {
                write!(f, "\\partial ")?;
                inner.fmt_latex(f)
            },
            Expr::Trace(inner) => {
                write!(f, "\\mathrm{{Tr}}")?;
                fmt_paren(f, |f| inner.fmt_latex(f))
            },
            Expr::Star(_, inner) => {
                fmt_child(f, prec, inner, false)?;
                write!(f, "^{{\\mathsf{{T}}}}")
            },
            Expr::Add(lhs, rhs) => {
                fmt_child(f, prec, lhs, false)?;
                write!(f, " + ")?;
                fmt_child(f, prec, rhs, false)
            },
            Expr::Sub(lhs, rhs) => {
                fmt_child(f, prec, lhs, false)?;
                write!(f, " - ")?;
                fmt_child(f, prec, rhs, true)
            },
            Expr::ScalarMul(lhs, rhs) | Expr::MatMul(lhs, rhs) => {
                fmt_child(f, prec, lhs, false)?;
                write!(f, " ")?;
                fmt_child(f, prec, rhs, false)
            },
        }
    }
}

/// Renders the equation stating that `result` is the derivative of `f` with respect to `wrt`.
///
/// ```
/// use matcalc_compute::symbolic::{derivative::Order, expr::{latex::derivative_latex, Expr}};
///
/// let x = Expr::variable("X").unwrap();
/// let f = x.clone().trace();
/// let result = Expr::differential("X").trace();
///
/// assert_eq!(
///     derivative_latex(&f, "X", &result, Order::First),
///     "\\frac{\\partial \\mathrm{Tr}\\left(\\mathbf{X}\\right)}{\\partial \\mathbf{X}} = \\mathrm{Tr}\\left(\\partial \\mathbf{X}\\right)",
/// );
/// ```
pub fn derivative_latex(f: &Expr, wrt: &str, result: &Expr, order: Order) -> String {
    match order {
        Order::First => format!(
            "\\frac{{\\partial {}}}{{\\partial \\mathbf{{{}}}}} = {}",
            f.as_display(),
            wrt,
            result.as_display(),
        ),
        Order::Second => format!(
            "\\frac{{\\partial^{{2}} {}}}{{\\partial \\mathbf{{{}}}^{{2}}}} = {}",
            f.as_display(),
            wrt,
            result.as_display(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    #[test]
    fn canonical_term() {
        let expr = Expr::Scalar(-2.0) * (var("B") * var("A") * Expr::differential("X")).trace();
        assert_eq!(
            expr.as_display().to_string(),
            "-2 \\mathrm{Tr}\\left(\\mathbf{B} \\mathbf{A} \\partial \\mathbf{X}\\right)",
        );
    }

    #[test]
    fn brackets_follow_precedence() {
        let expr = (var("Y") - var("D") * var("X")).transpose() * var("A");
        assert_eq!(
            expr.as_display().to_string(),
            "\\left(\\mathbf{Y} - \\mathbf{D} \\mathbf{X}\\right)^{\\mathsf{T}} \\mathbf{A}",
        );
    }

    #[test]
    fn frozen_differential() {
        let expr = var("d(X)").transpose();
        assert_eq!(expr.as_display().to_string(), "\\partial \\mathbf{X}^{\\mathsf{T}}");
    }

    #[test]
    fn second_order() {
        let f = var("X").trace();
        let latex = derivative_latex(&f, "X", &Expr::Null, Order::Second);
        assert_eq!(
            latex,
            "\\frac{\\partial^{2} \\mathrm{Tr}\\left(\\mathbf{X}\\right)}{\\partial \\mathbf{X}^{2}} = 0",
        );
    }
}
