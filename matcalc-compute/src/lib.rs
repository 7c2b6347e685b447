//! Symbolic differentiation and canonicalization of matrix expressions, and numeric evaluation
//! of the results.
//!
//! The [`symbolic`] module holds the expression tree, the differentiation engine, the pattern
//! matcher and the rewrite engine that brings differentials into the canonical form
//! `Tr(G*d(X))`. The [`numerical`] module evaluates expressions against concrete matrices.
//!
//! # Features
//!
//! - `numerical` (enabled by default): the [`numerical`] module, backed by [`ndarray`].
//! - `optim`: the `optim` binary, which fits a least-squares model by gradient descent using a
//!   gradient derived by this crate.

#[cfg(feature = "numerical")]
pub mod numerical;
pub mod symbolic;
