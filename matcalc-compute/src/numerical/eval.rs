use matcalc_error::Error;
use ndarray::Array2;
use crate::symbolic::expr::{Expr, StarOp};
use super::{
    ctxt::{Ctxt, EvalMode},
    error::{NotSquare, ShapeMismatch, UndefinedVariable},
    value::Value,
};

/// Any type that can be evaluated to produce a value.
pub trait Eval {
    /// Evaluate the expression to produce a value, using the given context.
    fn eval(&self, ctxt: &Ctxt) -> Result<Value, Error>;

    /// Evaluate the expression to produce a value, using an empty context.
    fn eval_default(&self) -> Result<Value, Error> {
        self.eval(&Ctxt::default())
    }
}

/// Looks up a variable, suggesting similar names if it is missing.
fn lookup(name: &str, ctxt: &Ctxt) -> Result<Value, Error> {
    ctxt.get_var(name).cloned().ok_or_else(|| {
        Error::spanless(UndefinedVariable {
            name: name.to_string(),
            suggestions: ctxt.get_similar_vars(name)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    })
}

fn mismatch(op: &'static str, left: &Value, right: &Value) -> Error {
    Error::spanless(ShapeMismatch {
        op,
        left: left.shape_string(),
        right: right.shape_string(),
    })
}

/// Applies an elementwise operation, broadcasting scalars over matrices.
fn elementwise(
    op: &'static str,
    left: Value,
    right: Value,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, Error> {
    match (left, right) {
        (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(f(a, b))),
        (Value::Scalar(a), Value::Matrix(b)) => Ok(Value::Matrix(b.mapv(|b| f(a, b)))),
        (Value::Matrix(a), Value::Scalar(b)) => Ok(Value::Matrix(a.mapv(|a| f(a, b)))),
        (Value::Matrix(a), Value::Matrix(b)) => {
            if a.dim() != b.dim() {
                return Err(mismatch(op, &Value::Matrix(a), &Value::Matrix(b)));
            }
            let mut out = a;
            out.zip_mut_with(&b, |a, &b| *a = f(*a, b));
            Ok(Value::Matrix(out))
        },
    }
}

/// Multiplies two values. A scalar on either side scales the other side.
fn multiply(left: Value, right: Value) -> Result<Value, Error> {
    match (left, right) {
        (Value::Matrix(a), Value::Matrix(b)) => {
            if a.ncols() != b.nrows() {
                return Err(mismatch("*", &Value::Matrix(a), &Value::Matrix(b)));
            }
            Ok(Value::Matrix(a.dot(&b)))
        },
        (left, right) => elementwise("*", left, right, |a, b| a * b),
    }
}

/// Computes the trace of a value. A scalar is its own trace.
fn trace(value: Value) -> Result<Value, Error> {
    match value {
        Value::Scalar(value) => Ok(Value::Scalar(value)),
        Value::Matrix(matrix) => {
            let (rows, cols) = matrix.dim();
            if rows != cols {
                return Err(Error::spanless(NotSquare { rows, cols }));
            }
            Ok(Value::Scalar(matrix.diag().sum()))
        },
    }
}

impl Eval for Expr {
    fn eval(&self, ctxt: &Ctxt) -> Result<Value, Error> {
        match self {
            Expr::Variable(name) | Expr::ScalarVariable(name) => lookup(name, ctxt),
            Expr::Scalar(value) => Ok(Value::Scalar(*value)),
            Expr::Null => Ok(Value::Scalar(0.0)),
            Expr::Differential(inner) => match &ctxt.mode {
                EvalMode::Gradient { wrt } if inner.as_name() == Some(wrt.as_str()) => {
                    let (rows, _) = lookup(wrt, ctxt)?.shape();
                    Ok(Value::Matrix(Array2::eye(rows)))
                },
                _ => lookup(&self.to_string(), ctxt),
            },
            Expr::Add(lhs, rhs) => elementwise("+", lhs.eval(ctxt)?, rhs.eval(ctxt)?, |a, b| a + b),
            Expr::Sub(lhs, rhs) => elementwise("-", lhs.eval(ctxt)?, rhs.eval(ctxt)?, |a, b| a - b),
            Expr::ScalarMul(lhs, rhs) | Expr::MatMul(lhs, rhs) => {
                multiply(lhs.eval(ctxt)?, rhs.eval(ctxt)?)
            },
            Expr::Trace(inner) => match ctxt.mode {
                EvalMode::Gradient { .. } => inner.eval(ctxt),
                EvalMode::Value => trace(inner.eval(ctxt)?),
            },
            Expr::Star(StarOp::Transpose, inner) => Ok(match inner.eval(ctxt)? {
                Value::Matrix(matrix) => Value::Matrix(matrix.t().to_owned()),
                scalar => scalar,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use pretty_assertions::assert_eq;
    use crate::symbolic::lower::{parse, Symbols};
    use super::*;

    fn eval(source: &str, ctxt: &Ctxt) -> Result<Value, Error> {
        let symbols = Symbols::new().with_scalar("s");
        parse(source, &symbols).unwrap().eval(ctxt)
    }

    fn ctxt() -> Ctxt {
        let mut ctxt = Ctxt::new();
        ctxt.add_var("A", array![[1.0, 2.0], [3.0, 4.0]]);
        ctxt.add_var("B", array![[0.0, 1.0], [1.0, 0.0]]);
        ctxt.add_var("R", array![[1.0, 2.0, 3.0]]);
        ctxt.add_var("s", 3.0);
        ctxt
    }

    #[test]
    fn arithmetic() {
        let ctxt = ctxt();
        assert_eq!(eval("A*B", &ctxt).unwrap(), Value::from(array![[2.0, 1.0], [4.0, 3.0]]));
        assert_eq!(eval("A - B", &ctxt).unwrap(), Value::from(array![[1.0, 1.0], [2.0, 4.0]]));
        assert_eq!(eval("s*A'", &ctxt).unwrap(), Value::from(array![[3.0, 9.0], [6.0, 12.0]]));
        assert_eq!(eval("Tr(A) + s", &ctxt).unwrap(), Value::Scalar(8.0));
        assert_eq!(eval("Tr(A*B')", &ctxt).unwrap(), Value::Scalar(5.0));
        assert_eq!(Expr::Null.eval_default().unwrap(), Value::Scalar(0.0));
    }

    #[test]
    fn shape_errors() {
        let ctxt = ctxt();
        let err = eval("A*R", &ctxt).unwrap_err();
        assert!(format!("{:?}", err.kind).contains("ShapeMismatch"));

        let err = eval("A + R", &ctxt).unwrap_err();
        assert!(format!("{:?}", err.kind).contains("\"2x2\""));

        let err = eval("Tr(R)", &ctxt).unwrap_err();
        assert!(format!("{:?}", err.kind).contains("NotSquare { rows: 1, cols: 3 }"));
    }

    #[test]
    fn undefined_variable() {
        let err = eval("A*C", &ctxt()).unwrap_err();
        let debug = format!("{:?}", err.kind);
        assert!(debug.contains("UndefinedVariable"));
        assert!(debug.contains("\"A\""));
        assert!(debug.contains("\"B\""));
    }

    #[test]
    fn differentials() {
        let mut ctxt = ctxt();
        ctxt.add_var("d(A)", array![[1.0, 0.0], [0.0, 0.0]]);
        assert_eq!(eval("Tr(B*d(A))", &ctxt).unwrap(), Value::Scalar(0.0));
        assert_eq!(eval("Tr(A*d(A))", &ctxt).unwrap(), Value::Scalar(1.0));

        let ctxt = ctxt.with_mode(EvalMode::Gradient { wrt: "A".to_string() });
        assert_eq!(eval("Tr(B*d(A))", &ctxt).unwrap(), Value::from(array![[0.0, 1.0], [1.0, 0.0]]));
    }
}
