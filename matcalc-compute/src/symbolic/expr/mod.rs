//! A representation of matrix expressions that is easier to manipulate than an AST.
//!
//! The [`Expr`](matcalc_parser::parser::ast::Expr) type from `matcalc_parser` remembers where
//! every node came from in the source code, which is convenient for reporting errors but not so
//! much for differentiation and rewriting. This module defines a separate [`Expr`], a tagged tree
//! with no span information whose children are shared through [`Arc`].
//!
//! All submodules in this crate that deal with symbolic manipulation use [`Expr`], and any
//! occurrences of the word `expression` refer to this type.
//!
//! # Smart constructors
//!
//! The `+`, `-` and `*` operators, along with [`Expr::transpose`] and [`Expr::trace`], are
//! _smart constructors_: they perform cheap local simplifications while building the node, so an
//! expression never contains a redundant wrapper around [`Expr::Null`], two adjacent scalar
//! literals, or a scalar factor buried inside a matrix product. The enum variants themselves are
//! raw constructors and do none of this; rule patterns are built from them directly.
//!
//! ```
//! use matcalc_compute::symbolic::expr::Expr;
//!
//! let a = Expr::variable("A").unwrap();
//! let x = Expr::variable("X").unwrap();
//!
//! assert_eq!(a.clone() * Expr::Null, Expr::Null);
//! assert_eq!(x.clone() - x.clone(), Expr::Null);
//! assert_eq!((Expr::Scalar(2.0) * a.clone() * x.clone()).to_string(), "2*A*X");
//! assert_eq!(x.clone().transpose().transpose(), x);
//! ```
//!
//! # Structural equality
//!
//! The [`PartialEq`], [`Eq`] and [`Hash`] implementations compare expressions by variant and
//! children, never by node identity: two independently built `Variable("X")` nodes are equal.
//! Scalars compare by value, so `-0.0` and `0.0` are equal and hash the same. This module **must
//! never** produce `NaN` scalars, as they would break reflexivity.

mod iter;
pub mod latex;
mod ops;

use iter::ExprIter;
use matcalc_attrs::ErrorKind;
use std::{fmt, hash::{Hash, Hasher}, sync::Arc};

/// Names that cannot be used for variables, as they are taken by the syntax.
pub const RESERVED_NAMES: [&str; 3] = ["T", "Tr", "d"];

/// A variable or scalar variable was given a reserved name.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` is a reserved name", name),
    labels = ["this name"],
    help = format!("the names {} cannot be used for variables", RESERVED_NAMES.join(", ")),
)]
pub struct ReservedName {
    /// The name that was rejected.
    pub name: String,
}

/// A structure-preserving unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StarOp {
    /// The matrix transpose, written `X'`.
    Transpose,
}

impl StarOp {
    /// Returns the symbol the operator is printed with.
    pub fn symbol(self) -> &'static str {
        match self {
            StarOp::Transpose => "'",
        }
    }

    /// Applies the operator to the given expression through the matching smart constructor.
    pub fn apply(self, expr: Expr) -> Expr {
        match self {
            StarOp::Transpose => expr.transpose(),
        }
    }
}

/// The variant of an [`Expr`], without its payload. Used to ask whether a variant appears
/// somewhere in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Variable,
    ScalarVariable,
    Scalar,
    Null,
    Differential,
    Add,
    Sub,
    ScalarMul,
    MatMul,
    Trace,
    Star,
}

/// A matrix or scalar expression.
///
/// For more information about this type, see the [module-level documentation](self).
#[derive(Debug, Clone)]
pub enum Expr {
    /// A matrix variable, such as `X`.
    Variable(String),

    /// A scalar variable, such as `lambda`.
    ScalarVariable(String),

    /// A numeric literal.
    Scalar(f64),

    /// The zero element. Absorbs products and vanishes from sums.
    Null,

    /// The differential of a variable, printed `d(X)`. The child is the variable the differential
    /// is taken of.
    Differential(Arc<Expr>),

    /// The sum of two expressions.
    Add(Arc<Expr>, Arc<Expr>),

    /// The difference of two expressions.
    Sub(Arc<Expr>, Arc<Expr>),

    /// A scalar-kind expression (the left child) scaling another expression.
    ScalarMul(Arc<Expr>, Arc<Expr>),

    /// A matrix product.
    MatMul(Arc<Expr>, Arc<Expr>),

    /// The trace of an expression, printed `Tr(..)`.
    Trace(Arc<Expr>),

    /// A structure-preserving unary operator applied to an expression.
    Star(StarOp, Arc<Expr>),
}

impl Expr {
    /// Creates a matrix variable, failing if the name is reserved.
    pub fn variable(name: impl Into<String>) -> Result<Self, ReservedName> {
        let name = check_name(name.into())?;
        Ok(Expr::Variable(name))
    }

    /// Creates a scalar variable, failing if the name is reserved.
    pub fn scalar_variable(name: impl Into<String>) -> Result<Self, ReservedName> {
        let name = check_name(name.into())?;
        Ok(Expr::ScalarVariable(name))
    }

    /// Creates the differential of the given matrix variable, `d(X)`.
    pub fn differential(wrt: impl Into<String>) -> Self {
        Expr::Differential(Arc::new(Expr::Variable(wrt.into())))
    }

    /// Returns the variant of this expression.
    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Variable(_) => ExprKind::Variable,
            Expr::ScalarVariable(_) => ExprKind::ScalarVariable,
            Expr::Scalar(_) => ExprKind::Scalar,
            Expr::Null => ExprKind::Null,
            Expr::Differential(_) => ExprKind::Differential,
            Expr::Add(..) => ExprKind::Add,
            Expr::Sub(..) => ExprKind::Sub,
            Expr::ScalarMul(..) => ExprKind::ScalarMul,
            Expr::MatMul(..) => ExprKind::MatMul,
            Expr::Trace(_) => ExprKind::Trace,
            Expr::Star(..) => ExprKind::Star,
        }
    }

    /// Returns the precedence of the expression's top-level node. Lower numbers bind tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            Expr::Differential(_) | Expr::Trace(_) => 0,
            Expr::Variable(_)
                | Expr::ScalarVariable(_)
                | Expr::Scalar(_)
                | Expr::Null
                | Expr::Star(..) => 1,
            Expr::ScalarMul(..) | Expr::MatMul(..) => 3,
            Expr::Add(..) | Expr::Sub(..) => 4,
        }
    }

    /// Returns true if the expression is scalar-kind: a [`Expr::Scalar`], a
    /// [`Expr::ScalarVariable`], or a [`Expr::ScalarMul`] of two scalar-kind expressions.
    pub fn is_scalar(&self) -> bool {
        match self {
            Expr::Scalar(_) | Expr::ScalarVariable(_) => true,
            Expr::ScalarMul(lhs, rhs) => lhs.is_scalar() && rhs.is_scalar(),
            _ => false,
        }
    }

    /// If this expression is a variable (of either kind), returns its name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Variable(name) | Expr::ScalarVariable(name) => Some(name),
            _ => None,
        }
    }

    /// If this expression is a differential, returns the name of the variable it is taken of.
    pub fn differential_of(&self) -> Option<&str> {
        match self {
            Expr::Differential(inner) => inner.as_name(),
            _ => None,
        }
    }

    /// Returns the direct children of this expression, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Variable(_) | Expr::ScalarVariable(_) | Expr::Scalar(_) | Expr::Null => Vec::new(),
            Expr::Differential(inner) | Expr::Trace(inner) | Expr::Star(_, inner) => vec![&**inner],
            Expr::Add(lhs, rhs)
                | Expr::Sub(lhs, rhs)
                | Expr::ScalarMul(lhs, rhs)
                | Expr::MatMul(lhs, rhs) => vec![&**lhs, &**rhs],
        }
    }

    /// Rebuilds this node with each child replaced by `f(child)`, keeping the node's variant
    /// exactly as it is. No smart constructor is involved; see [`Expr::reassociate`] for that.
    ///
    /// `f` is called on the children left to right.
    pub fn map_children(&self, mut f: impl FnMut(&Expr) -> Expr) -> Expr {
        let mut apply = |child: &Arc<Expr>| Arc::new(f(&**child));
        match self {
            Expr::Variable(_) | Expr::ScalarVariable(_) | Expr::Scalar(_) | Expr::Null => self.clone(),
            Expr::Differential(inner) => Expr::Differential(apply(inner)),
            Expr::Trace(inner) => Expr::Trace(apply(inner)),
            Expr::Star(op, inner) => Expr::Star(*op, apply(inner)),
            Expr::Add(lhs, rhs) => {
                let lhs = apply(lhs);
                Expr::Add(lhs, apply(rhs))
            },
            Expr::Sub(lhs, rhs) => {
                let lhs = apply(lhs);
                Expr::Sub(lhs, apply(rhs))
            },
            Expr::ScalarMul(lhs, rhs) => {
                let lhs = apply(lhs);
                Expr::ScalarMul(lhs, apply(rhs))
            },
            Expr::MatMul(lhs, rhs) => {
                let lhs = apply(lhs);
                Expr::MatMul(lhs, apply(rhs))
            },
        }
    }

    /// Rebuilds the top-level node from its existing children through the smart constructors.
    ///
    /// This hoists scalar factors out of matrix products, so `(s*A)*(u*B)` becomes
    /// `(s*u)*(A*B)`, folds sums of equal terms, and collapses double transposes. Children are
    /// reused as they are.
    pub fn reassociate(&self) -> Expr {
        let take = |child: &Arc<Expr>| (**child).clone();
        match self {
            Expr::Variable(_)
                | Expr::ScalarVariable(_)
                | Expr::Scalar(_)
                | Expr::Null
                | Expr::Differential(_) => self.clone(),
            Expr::Add(lhs, rhs) => take(lhs) + take(rhs),
            Expr::Sub(lhs, rhs) => take(lhs) - take(rhs),
            Expr::ScalarMul(lhs, rhs) | Expr::MatMul(lhs, rhs) => take(lhs) * take(rhs),
            Expr::Trace(inner) => take(inner).trace(),
            Expr::Star(op, inner) => op.apply(take(inner)),
        }
    }

    /// Returns an iterator that traverses the tree of expressions in left-to-right post-order
    /// (i.e. depth-first).
    pub fn post_order_iter(&self) -> ExprIter {
        ExprIter::new(self)
    }

    /// Returns true if a node of the given kind appears anywhere in this expression, including
    /// the expression itself.
    pub fn contains(&self, kind: ExprKind) -> bool {
        self.post_order_iter().any(|expr| expr.kind() == kind)
    }

    /// Returns the number of nodes in the expression.
    pub fn size(&self) -> usize {
        self.post_order_iter().count()
    }

    /// Returns an indented dump of the expression tree, one node per line.
    pub fn structure(&self) -> String {
        let mut out = String::new();
        self.write_structure(&mut out, 0);
        out
    }

    fn write_structure(&self, out: &mut String, depth: usize) {
        let label = match self {
            Expr::Variable(name) => format!("Variable {}", name),
            Expr::ScalarVariable(name) => format!("ScalarVariable {}", name),
            Expr::Scalar(value) => format!("Scalar {}", value),
            Expr::Star(op, _) => format!("Star {}", op.symbol()),
            other => format!("{:?}", other.kind()),
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&label);
        out.push('\n');
        for child in self.children() {
            child.write_structure(out, depth + 1);
        }
    }
}

/// Rejects reserved names.
fn check_name(name: String) -> Result<String, ReservedName> {
    if RESERVED_NAMES.contains(&name.as_str()) {
        Err(ReservedName { name })
    } else {
        Ok(name)
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Variable(a), Expr::Variable(b))
                | (Expr::ScalarVariable(a), Expr::ScalarVariable(b)) => a == b,
            (Expr::Scalar(a), Expr::Scalar(b)) => a == b,
            (Expr::Null, Expr::Null) => true,
            (Expr::Differential(a), Expr::Differential(b))
                | (Expr::Trace(a), Expr::Trace(b)) => a == b,
            (Expr::Star(op_a, a), Expr::Star(op_b, b)) => op_a == op_b && a == b,
            (Expr::Add(al, ar), Expr::Add(bl, br))
                | (Expr::Sub(al, ar), Expr::Sub(bl, br))
                | (Expr::ScalarMul(al, ar), Expr::ScalarMul(bl, br))
                | (Expr::MatMul(al, ar), Expr::MatMul(bl, br)) => al == bl && ar == br,
            _ => false,
        }
    }
}

impl Eq for Expr {}

/// [`Hash`] is implemented manually to allow hashing [`Expr::Scalar`]s. `-0.0` is hashed as
/// `0.0` to stay consistent with [`PartialEq`].
impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Expr::Variable(name) | Expr::ScalarVariable(name) => name.hash(state),
            Expr::Scalar(value) => {
                let value = if *value == 0.0 { 0.0 } else { *value };
                value.to_bits().hash(state);
            },
            Expr::Null => {},
            Expr::Differential(inner) | Expr::Trace(inner) => inner.hash(state),
            Expr::Star(op, inner) => {
                op.hash(state);
                inner.hash(state);
            },
            Expr::Add(lhs, rhs)
                | Expr::Sub(lhs, rhs)
                | Expr::ScalarMul(lhs, rhs)
                | Expr::MatMul(lhs, rhs) => {
                lhs.hash(state);
                rhs.hash(state);
            },
        }
    }
}

/// Writes `child`, bracketing it if it binds looser than its parent, or as loose as its parent
/// when `strict` is set.
fn fmt_child(f: &mut fmt::Formatter<'_>, parent: u8, child: &Expr, strict: bool) -> fmt::Result {
    let prec = child.precedence();
    if prec > parent || (strict && prec == parent) {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = self.precedence();
        match self {
            Expr::Variable(name) | Expr::ScalarVariable(name) => write!(f, "{}", name),
            Expr::Scalar(value) => write!(f, "{}", value),
            Expr::Null => write!(f, "0"),
            Expr::Differential(inner) => write!(f, "d({})", inner),
            Expr::Trace(inner) => write!(f, "Tr({})", inner),
            Expr::Star(op, inner) => {
                fmt_child(f, prec, inner, false)?;
                write!(f, "{}", op.symbol())
            },
            Expr::Add(lhs, rhs) => {
                fmt_child(f, prec, lhs, false)?;
                write!(f, "+")?;
                fmt_child(f, prec, rhs, false)
            },
            Expr::Sub(lhs, rhs) => {
                fmt_child(f, prec, lhs, false)?;
                write!(f, "-")?;
                fmt_child(f, prec, rhs, true)
            },
            Expr::ScalarMul(lhs, rhs) | Expr::MatMul(lhs, rhs) => {
                fmt_child(f, prec, lhs, false)?;
                write!(f, "*")?;
                fmt_child(f, prec, rhs, false)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    #[test]
    fn reserved_names_are_rejected() {
        assert_eq!(Expr::variable("Tr"), Err(ReservedName { name: "Tr".to_string() }));
        assert_eq!(Expr::scalar_variable("d"), Err(ReservedName { name: "d".to_string() }));
        assert_eq!(Expr::variable("X"), Ok(var("X")));
    }

    #[test]
    fn equality_is_structural() {
        let a = var("A") * var("X");
        let b = var("A") * var("X");
        assert_eq!(a, b);
        assert_ne!(a, var("X") * var("A"));
        assert_ne!(var("A"), Expr::ScalarVariable("A".to_string()));
        assert_ne!(
            Expr::Add(Arc::new(var("A")), Arc::new(var("B"))),
            Expr::Sub(Arc::new(var("A")), Arc::new(var("B"))),
        );
    }

    #[test]
    fn negative_zero_hashes_like_zero() {
        let mut set = HashSet::new();
        set.insert(Expr::Scalar(0.0));
        assert!(set.contains(&Expr::Scalar(-0.0)));
        assert_eq!(Expr::Scalar(0.0), Expr::Scalar(-0.0));
    }

    #[test]
    fn scalar_kind() {
        let s = Expr::ScalarVariable("s".to_string());
        assert!(s.is_scalar());
        assert!(Expr::Scalar(2.0).is_scalar());
        assert!(Expr::ScalarMul(Arc::new(Expr::Scalar(2.0)), Arc::new(s.clone())).is_scalar());
        assert!(!Expr::ScalarMul(Arc::new(s), Arc::new(var("A"))).is_scalar());
        assert!(!Expr::Trace(Arc::new(var("A"))).is_scalar());
    }

    #[test]
    fn contains_and_size() {
        let expr = (var("A") * Expr::differential("X")).trace();
        assert!(expr.contains(ExprKind::Differential));
        assert!(expr.contains(ExprKind::Trace));
        assert!(!expr.contains(ExprKind::Add));
        assert_eq!(expr.size(), 5);
    }

    #[test]
    fn display_brackets_by_precedence() {
        let y = var("Y");
        let dx = var("D") * var("X");
        assert_eq!((y.clone() - dx.clone()).transpose().to_string(), "(Y-D*X)'");
        assert_eq!((var("A") - (var("B") + var("C"))).to_string(), "A-(B+C)");
        assert_eq!((var("A") - (var("B") - var("C"))).to_string(), "A-(B-C)");
        assert_eq!(((var("A") + var("B")) * var("C")).to_string(), "(A+B)*C");
        assert_eq!((Expr::Scalar(2.0) * var("A")).to_string(), "2*A");
        assert_eq!(Expr::Null.to_string(), "0");

        let canonical = (var("B") * var("A") * Expr::differential("X")).trace();
        assert_eq!(canonical.to_string(), "Tr(B*A*d(X))");
    }

    #[test]
    fn map_children_keeps_the_variant() {
        let expr = Expr::MatMul(
            Arc::new(Expr::ScalarMul(Arc::new(Expr::Scalar(2.0)), Arc::new(var("A")))),
            Arc::new(var("B")),
        );
        let same = expr.map_children(|child| child.clone());
        assert_eq!(same, expr);

        // the smart rebuild hoists the scalar
        assert_eq!(expr.reassociate().to_string(), "2*A*B");
        assert_eq!(expr.reassociate(), Expr::ScalarMul(
            Arc::new(Expr::Scalar(2.0)),
            Arc::new(Expr::MatMul(Arc::new(var("A")), Arc::new(var("B")))),
        ));
    }

    #[test]
    fn structure_dump() {
        let expr = (var("A") * Expr::differential("X").transpose()).trace();
        assert_eq!(expr.structure(), [
            "Trace",
            "  MatMul",
            "    Variable A",
            "    Star '",
            "      Differential",
            "        Variable X",
            "",
        ].join("\n"));
    }
}
