//! The smart constructors: arithmetic operator implementations for [`Expr`], plus
//! [`Expr::transpose`] and [`Expr::trace`].

use std::{ops::{Add, Mul, Neg, Sub}, sync::Arc};
use super::{Expr, StarOp};

/// Unwraps a shared child, cloning it only if it is still referenced elsewhere.
fn take(expr: Arc<Expr>) -> Expr {
    Arc::try_unwrap(expr).unwrap_or_else(|expr| (*expr).clone())
}

impl Expr {
    /// Returns the transpose of the expression.
    ///
    /// - `Null'` is `Null`.
    /// - `X''` collapses to `X`.
    /// - Scalar-kind expressions and traces are their own transpose.
    pub fn transpose(self) -> Expr {
        match self {
            Expr::Null => Expr::Null,
            Expr::Star(StarOp::Transpose, inner) => take(inner),
            expr if expr.is_scalar() || matches!(expr, Expr::Trace(_)) => expr,
            expr => Expr::Star(StarOp::Transpose, Arc::new(expr)),
        }
    }

    /// Returns the trace of the expression. `Tr(Null)` is `Null`, and the trace of a scalar-kind
    /// expression is the expression itself.
    pub fn trace(self) -> Expr {
        match self {
            Expr::Null => Expr::Null,
            expr if expr.is_scalar() => expr,
            expr => Expr::Trace(Arc::new(expr)),
        }
    }
}

/// Adds two expressions. `Null` vanishes, scalar literals fold, and a sum of two structurally
/// equal expressions becomes `2*e`.
impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Null, rhs) => rhs,
            (lhs, Expr::Null) => lhs,
            (Expr::Scalar(a), Expr::Scalar(b)) => Expr::Scalar(a + b),
            (lhs, rhs) if lhs == rhs => Expr::Scalar(2.0) * lhs,
            (lhs, rhs) => Expr::Add(Arc::new(lhs), Arc::new(rhs)),
        }
    }
}

/// Subtracts two expressions. `e - Null = e`, `Null - e = (-1)*e`, and `e - e = Null`.
impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (lhs, Expr::Null) => lhs,
            (Expr::Null, rhs) => -rhs,
            (lhs, rhs) if lhs == rhs => Expr::Null,
            (Expr::Scalar(a), Expr::Scalar(b)) => Expr::Scalar(a - b),
            (lhs, rhs) => Expr::Sub(Arc::new(lhs), Arc::new(rhs)),
        }
    }
}

/// Multiplies two expressions, keeping scalar factors on the left and out of matrix products.
///
/// In order:
///
/// - `Null` on either side absorbs the product.
/// - Two scalar literals fold, and a literal `1` disappears.
/// - A literal on the right moves to the left.
/// - A scalar-kind factor merges into the scalar of a [`Expr::ScalarMul`] on its right, or
///   otherwise scales the other side.
/// - A [`Expr::ScalarMul`] on either side of a matrix product hoists its scalar:
///   `(s*A)*B = s*(A*B)` and `A*(s*B) = s*(A*B)`.
/// - Anything else is a [`Expr::MatMul`].
impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Null, _) | (_, Expr::Null) => Expr::Null,
            (Expr::Scalar(a), Expr::Scalar(b)) => Expr::Scalar(a * b),
            (Expr::Scalar(a), rhs) if a == 1.0 => rhs,
            (lhs, Expr::Scalar(b)) if b == 1.0 => lhs,
            (lhs, rhs @ Expr::Scalar(_)) => rhs * lhs,
            (lhs, Expr::ScalarMul(scale, rhs)) if lhs.is_scalar() => (lhs * take(scale)) * take(rhs),
            (lhs, rhs) if lhs.is_scalar() => Expr::ScalarMul(Arc::new(lhs), Arc::new(rhs)),
            (Expr::ScalarMul(scale, lhs), rhs) if rhs.is_scalar() => (take(scale) * rhs) * take(lhs),
            (lhs, rhs) if rhs.is_scalar() => Expr::ScalarMul(Arc::new(rhs), Arc::new(lhs)),
            (Expr::ScalarMul(s, lhs), Expr::ScalarMul(u, rhs)) => {
                (take(s) * take(u)) * (take(lhs) * take(rhs))
            },
            (Expr::ScalarMul(scale, lhs), rhs) => take(scale) * (take(lhs) * rhs),
            (lhs, Expr::ScalarMul(scale, rhs)) => take(scale) * (lhs * take(rhs)),
            (lhs, rhs) => Expr::MatMul(Arc::new(lhs), Arc::new(rhs)),
        }
    }
}

/// Negates an expression, `-e = (-1)*e`.
impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Scalar(-1.0) * self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    fn scalar_var(name: &str) -> Expr {
        Expr::ScalarVariable(name.to_string())
    }

    #[test]
    fn null_is_absorbing() {
        assert_eq!(var("A") + Expr::Null, var("A"));
        assert_eq!(Expr::Null + var("A"), var("A"));
        assert_eq!(var("A") - Expr::Null, var("A"));
        assert_eq!(var("A") * Expr::Null, Expr::Null);
        assert_eq!(Expr::Null * var("A"), Expr::Null);
        assert_eq!(Expr::Null.transpose(), Expr::Null);
        assert_eq!(Expr::Null.trace(), Expr::Null);
    }

    #[test]
    fn null_minus_is_negation() {
        let expr = Expr::Null - var("A");
        assert_eq!(expr, Expr::ScalarMul(Arc::new(Expr::Scalar(-1.0)), Arc::new(var("A"))));
        assert_eq!(expr.to_string(), "-1*A");
    }

    #[test]
    fn equal_terms_fold() {
        assert_eq!((var("A") + var("A")).to_string(), "2*A");
        assert_eq!(var("A") * var("X") - var("A") * var("X"), Expr::Null);
        assert_eq!(Expr::Scalar(2.0) - Expr::Scalar(2.0), Expr::Null);
        assert_eq!(Expr::Scalar(3.0) - Expr::Scalar(2.0), Expr::Scalar(1.0));
    }

    #[test]
    fn scalar_literals_fold() {
        assert_eq!(Expr::Scalar(2.0) * Expr::Scalar(3.0), Expr::Scalar(6.0));
        assert_eq!(Expr::Scalar(1.0) * var("A"), var("A"));
        assert_eq!(var("A") * Expr::Scalar(1.0), var("A"));
        assert_eq!((Expr::Scalar(0.5) * (Expr::Scalar(2.0) * var("A"))), var("A"));
    }

    #[test]
    fn scalars_move_left() {
        assert_eq!((var("A") * Expr::Scalar(3.0)).to_string(), "3*A");
        assert_eq!((var("A") * scalar_var("s")).to_string(), "s*A");
        assert_eq!((scalar_var("s") * Expr::Scalar(2.0)).to_string(), "2*s");
    }

    #[test]
    fn scalars_hoist_out_of_products() {
        let sa = scalar_var("s") * var("A");
        let ub = scalar_var("u") * var("B");
        let expr = sa.clone() * ub;
        assert_eq!(expr, Expr::ScalarMul(
            Arc::new(Expr::ScalarMul(Arc::new(scalar_var("s")), Arc::new(scalar_var("u")))),
            Arc::new(Expr::MatMul(Arc::new(var("A")), Arc::new(var("B")))),
        ));

        assert_eq!((sa.clone() * var("B")).to_string(), "s*A*B");
        assert_eq!((var("B") * sa).to_string(), "s*B*A");
    }

    #[test]
    fn transpose_collapses() {
        let x = var("X");
        assert_eq!(x.clone().transpose().transpose(), x);
        assert_eq!(scalar_var("s").transpose(), scalar_var("s"));
        let trace = var("A").trace();
        assert_eq!(trace.clone().transpose(), trace);
        assert_eq!((var("A") * var("B")).transpose().to_string(), "(A*B)'");
    }

    #[test]
    fn trace_of_scalar() {
        assert_eq!(scalar_var("s").trace(), scalar_var("s"));
        assert_eq!(var("A").trace().to_string(), "Tr(A)");
    }
}
