//! Symbolic matrix calculus.
//!
//! # Expression representation
//!
//! Expressions in this module are represented as a tree of [`Expr`] nodes, built bottom-up
//! through smart constructors that fold away trivial structure (see [`expr`]). They can be built
//! by hand, or parsed from text and lowered with [`lower::parse`]:
//!
//! ```
//! use matcalc_compute::symbolic::lower::{parse, Symbols};
//!
//! let expr = parse("Tr(A*X*B)", &Symbols::new()).unwrap();
//! assert_eq!(expr.to_string(), "Tr(A*X*B)");
//! ```
//!
//! # Differentiation
//!
//! [`differentiate`] applies the rules of the calculus of differentials (`d(XY) = d(X)Y +
//! Xd(Y)`, `d(Tr X) = Tr(dX)`, and so on) and returns the raw differential, which is correct but
//! rarely readable. [`hessian`] computes the second differential.
//!
//! # Canonicalization
//!
//! [`canonicalize`] rewrites a differential into a sum of terms `Tr(G*d(X))`, from which the
//! gradient `G'` can be read off. Rewriting is driven by a [`pattern`] matcher over three staged
//! rule sets; see [`canonical`] for the details.
//!
//! ```
//! use matcalc_compute::symbolic::{canonicalize, differentiate, lower::{parse, Symbols}};
//!
//! let expr = parse("Tr(A*X*B)", &Symbols::new()).unwrap();
//! let canonical = canonicalize(&differentiate(&expr, "X"));
//! assert_eq!(canonical.to_string(), "Tr(B*A*d(X))");
//! ```

pub mod canonical;
pub mod derivative;
pub mod expr;
pub mod lower;
pub mod pattern;
pub mod step_collector;

pub use canonical::{canonicalize, canonicalize_with, canonicalize_with_steps, is_canonical};
pub use derivative::{differentiate, differentiate_with, hessian};
pub use expr::Expr;
pub use step_collector::StepCollector;
