//! Symbolic differentiation of matrix expressions.
//!
//! Differentiation follows the rules of the calculus of differentials, applied by matching on the
//! node being differentiated:
//!
//! | Node                   | Differential                       |
//! | ---------------------- | ---------------------------------- |
//! | `X` (the variable)     | `d(X)`                             |
//! | other matrix variables | `0`                                |
//! | literals, `0`          | `0`                                |
//! | `d(X)`                 | `0`                                |
//! | `s*E`                  | `s*d(E)`                           |
//! | `A+B`, `A-B`           | `d(A)+d(B)`, `d(A)-d(B)`           |
//! | `A*B`                  | `d(A)*B + A*d(B)`                  |
//! | `Tr(E)`                | `Tr(d(E))`                         |
//! | `E'`                   | `d(E)'`                            |
//!
//! A scalar variable has no rule: it becomes an opaque `d(s)` and an [`UnsupportedOperator`]
//! diagnostic is raised.
//!
//! The result is built through the smart constructors, so vanishing branches disappear as they
//! are produced. It is correct but rarely readable; pass it to
//! [`canonicalize`](super::canonicalize) to read off the gradient.

use matcalc_attrs::ErrorKind;
use std::sync::Arc;
use super::{expr::Expr, step_collector::StepCollector};

/// The order of the differential to compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// The first differential.
    #[default]
    First,

    /// The second differential, from which the Hessian can be read.
    Second,
}

/// Differentiation reached a node it has no rule for. The node was wrapped in an opaque
/// differential and differentiation carried on.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot differentiate `{}` with respect to `{}`", expr, wrt),
    labels = ["this expression"],
    help = "only matrix variables and literals can be differentiated; the result contains an opaque differential",
    kind = ariadne::ReportKind::Warning,
)]
pub struct UnsupportedOperator {
    /// The expression that could not be differentiated.
    pub expr: String,

    /// The name of the variable differentiated with respect to.
    pub wrt: String,
}

/// Returns the first differential of `expr` with respect to the matrix variable `wrt`.
pub fn differentiate(expr: &Expr, wrt: &str) -> Expr {
    differentiate_with(expr, wrt, Order::First, &mut ())
}

/// Returns the second differential of `expr` with respect to the matrix variable `wrt`.
///
/// The first differential's `d(X)` is held fixed while the remaining occurrences of `X` are
/// differentiated again; see [`freeze`].
pub fn hessian(expr: &Expr, wrt: &str) -> Expr {
    differentiate_with(expr, wrt, Order::Second, &mut ())
}

/// Differentiates `expr` with respect to `wrt`, pushing a diagnostic to `diagnostics` for every
/// node that could not be differentiated.
pub fn differentiate_with(
    expr: &Expr,
    wrt: &str,
    order: Order,
    diagnostics: &mut dyn StepCollector<UnsupportedOperator>,
) -> Expr {
    let first = diff(expr, wrt, diagnostics);
    match order {
        Order::First => first,
        Order::Second => diff(&freeze(&first, wrt), wrt, diagnostics),
    }
}

/// Replaces every `d(wrt)` in the expression with an opaque matrix variable named after it,
/// `d(X)`. The frozen differential is a constant for the purpose of further differentiation, and
/// the evaluator binds a direction to it by the same name.
pub fn freeze(expr: &Expr, wrt: &str) -> Expr {
    match expr {
        Expr::Differential(inner) if inner.as_name() == Some(wrt) => {
            Expr::Variable(expr.to_string())
        },
        other => other.map_children(|child| freeze(child, wrt)),
    }
}

/// The recursive differentiation rules.
fn diff(expr: &Expr, wrt: &str, diagnostics: &mut dyn StepCollector<UnsupportedOperator>) -> Expr {
    if let Expr::ScalarVariable(_) = expr {
        log::warn!("cannot differentiate `{}` with respect to `{}`", expr, wrt);
        diagnostics.push(UnsupportedOperator {
            expr: expr.to_string(),
            wrt: wrt.to_string(),
        });
        return Expr::Differential(Arc::new(expr.clone()));
    }

    let mut d = |expr: &Expr| diff(expr, wrt, diagnostics);
    match expr {
        Expr::Variable(name) if name == wrt => Expr::Differential(Arc::new(expr.clone())),
        // scalar variables are handled above
        Expr::Variable(_)
            | Expr::ScalarVariable(_)
            | Expr::Scalar(_)
            | Expr::Null
            | Expr::Differential(_) => Expr::Null,
        Expr::ScalarMul(scale, inner) => (**scale).clone() * d(inner),
        Expr::Add(lhs, rhs) => {
            let lhs = d(lhs);
            lhs + d(rhs)
        },
        Expr::Sub(lhs, rhs) => {
            let lhs = d(lhs);
            lhs - d(rhs)
        },
        Expr::MatMul(lhs, rhs) => {
            let left = d(lhs) * (**rhs).clone();
            left + (**lhs).clone() * d(rhs)
        },
        Expr::Trace(inner) => d(inner).trace(),
        Expr::Star(op, inner) => op.apply(d(inner)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::symbolic::lower::{parse, Symbols};
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    fn d(source: &str, wrt: &str) -> Expr {
        differentiate(&parse(source, &Symbols::new()).unwrap(), wrt)
    }

    #[test]
    fn constants_vanish() {
        assert_eq!(differentiate(&Expr::Scalar(5.0), "X"), Expr::Null);
        assert_eq!(differentiate(&var("Y"), "X"), Expr::Null);
        assert_eq!(differentiate(&Expr::Null, "X"), Expr::Null);
        assert_eq!(differentiate(&Expr::differential("X"), "X"), Expr::Null);
    }

    #[test]
    fn variable() {
        assert_eq!(differentiate(&var("X"), "X"), Expr::differential("X"));
    }

    #[test]
    fn leibniz() {
        let l = var("A") * var("X");
        let r = var("X").transpose() * var("B");
        let product = l.clone() * r.clone();
        assert_eq!(
            differentiate(&product, "X"),
            differentiate(&l, "X") * r.clone() + l.clone() * differentiate(&r, "X"),
        );
    }

    #[test]
    fn product_rule_prints() {
        assert_eq!(d("A*X*B", "X").to_string(), "A*d(X)*B");
        assert_eq!(d("X'*X", "X").to_string(), "d(X)'*X+X'*d(X)");
        assert_eq!(d("Tr(A*X)", "X").to_string(), "Tr(A*d(X))");
    }

    #[test]
    fn scaling_and_transpose() {
        let symbols = Symbols::new().with_scalar("s");
        let expr = parse("s*X'", &symbols).unwrap();
        assert_eq!(differentiate(&expr, "X").to_string(), "s*d(X)'");
        assert_eq!(d("Y - D*X", "X").to_string(), "-1*D*d(X)");
        assert_eq!(d("(A*Y)'", "X"), Expr::Null);
    }

    #[test]
    fn unsupported_scalar_variable() {
        let symbols = Symbols::new().with_scalar("s");
        let expr = parse("s*A", &symbols).unwrap();
        let mut diagnostics = Vec::new();
        let result = differentiate_with(&expr, "s", Order::First, &mut diagnostics);

        // `s*A` differentiates only its matrix part, so no diagnostic is raised
        assert_eq!(result, Expr::Null);
        assert!(diagnostics.is_empty());

        let expr = parse("s", &symbols).unwrap();
        let result = differentiate_with(&expr, "s", Order::First, &mut diagnostics);
        assert_eq!(result, Expr::Differential(Arc::new(Expr::ScalarVariable("s".to_string()))));
        assert_eq!(diagnostics, vec![UnsupportedOperator {
            expr: "s".to_string(),
            wrt: "s".to_string(),
        }]);
    }

    #[test]
    fn scalar_variables_are_opaque() {
        let symbols = Symbols::new().with_scalar("s");
        let mut diagnostics = Vec::new();
        let s = Expr::ScalarVariable("s".to_string());
        let result = differentiate_with(&s, "X", Order::First, &mut diagnostics);
        assert_eq!(result, Expr::Differential(Arc::new(s)));
        assert_eq!(diagnostics, vec![UnsupportedOperator {
            expr: "s".to_string(),
            wrt: "X".to_string(),
        }]);

        // a scalar added to a matrix expression is kept as an opaque differential
        let expr = parse("Tr(A*X) + s", &symbols).unwrap();
        let mut diagnostics = Vec::new();
        let result = differentiate_with(&expr, "X", Order::First, &mut diagnostics);
        assert_eq!(result.to_string(), "Tr(A*d(X))+d(s)");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn freeze_replaces_the_differential() {
        let first = d("Tr(X'*X)", "X");
        let frozen = freeze(&first, "X");
        assert_eq!(frozen.to_string(), "Tr(d(X)'*X+X'*d(X))");
        assert!(!frozen.contains(crate::symbolic::expr::ExprKind::Differential));
        assert_eq!(freeze(&Expr::differential("X"), "X"), var("d(X)"));
    }

    #[test]
    fn second_differential() {
        let second = hessian(&parse("Tr(X'*X)", &Symbols::new()).unwrap(), "X");
        assert_eq!(second.to_string(), "Tr(d(X)'*d(X)+d(X)'*d(X))");

        assert_eq!(hessian(&parse("Tr(A*X)", &Symbols::new()).unwrap(), "X"), Expr::Null);
    }
}
