//! Numeric evaluation of expressions against concrete matrices.
//!
//! An [`Expr`] is evaluated with the [`Eval`] trait against a [`Ctxt`] holding the values of its
//! variables. A differential `d(X)` is an ordinary variable named `d(X)` in the default
//! [`EvalMode::Value`], so binding a direction to it evaluates the directional derivative. In
//! [`EvalMode::Gradient`], the canonical form `Tr(G*d(X))` evaluates to `G` instead, from which
//! [`gradient`] reads off the gradient `G'`.
//!
//! ```
//! use matcalc_compute::{
//!     numerical::{ctxt::Ctxt, gradient},
//!     symbolic::{canonicalize, differentiate, lower::{parse, Symbols}},
//! };
//! use ndarray::array;
//!
//! let f = parse("Tr(A*X)", &Symbols::new()).unwrap();
//! let canonical = canonicalize(&differentiate(&f, "X"));
//!
//! let mut ctxt = Ctxt::new();
//! ctxt.add_var("A", array![[1.0, 2.0], [3.0, 4.0]]);
//! ctxt.add_var("X", array![[0.0, 0.0], [0.0, 0.0]]);
//! assert_eq!(gradient(&canonical, "X", &ctxt).unwrap(), array![[1.0, 3.0], [2.0, 4.0]]);
//! ```

pub mod ctxt;
pub mod error;
pub mod eval;
pub mod value;

use matcalc_error::Error;
use ndarray::Array2;
use crate::symbolic::expr::Expr;
use ctxt::{Ctxt, EvalMode};
use error::UndefinedVariable;
use eval::Eval;
use value::Value;

/// Evaluates the gradient of a function with respect to `wrt`, given the canonical form of its
/// differential. The result has the shape of `wrt`.
pub fn gradient(canonical: &Expr, wrt: &str, ctxt: &Ctxt) -> Result<Array2<f64>, Error> {
    let shape = ctxt.get_var(wrt)
        .map(Value::shape)
        .ok_or_else(|| Error::spanless(UndefinedVariable {
            name: wrt.to_string(),
            suggestions: Vec::new(),
        }))?;

    let ctxt = ctxt.clone().with_mode(EvalMode::Gradient { wrt: wrt.to_string() });
    match canonical.eval(&ctxt)? {
        // only a canonical form of `0` has no differential in it
        Value::Scalar(value) => Ok(Array2::from_elem(shape, value)),
        Value::Matrix(matrix) => Ok(matrix.reversed_axes()),
    }
}

/// Wraps a scalar-valued expression as a function of the value of `wrt`. The other variables
/// keep the values they have in `ctxt`.
pub fn objective<'a>(
    expr: &'a Expr,
    wrt: &'a str,
    ctxt: &'a Ctxt,
) -> impl Fn(&Array2<f64>) -> Result<f64, Error> + 'a {
    move |value| {
        let mut ctxt = ctxt.clone();
        ctxt.add_var(wrt, value.clone());
        expr.eval(&ctxt)?.into_scalar()
    }
}
