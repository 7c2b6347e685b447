use matcalc_error::Error;
use ndarray::Array2;
use std::fmt::{Display, Formatter};
use super::error::ExpectedScalar;

/// A concrete value an expression can evaluate to.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A scalar.
    Scalar(f64),

    /// A dense matrix.
    Matrix(Array2<f64>),
}

impl Value {
    /// Returns the typename of this value.
    pub fn typename(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Matrix(_) => "matrix",
        }
    }

    /// Returns the shape of this value as `(rows, columns)`. A scalar has shape `(1, 1)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Value::Scalar(_) => (1, 1),
            Value::Matrix(matrix) => matrix.dim(),
        }
    }

    /// Returns the shape of this value formatted for error messages, such as `3x2`.
    pub(crate) fn shape_string(&self) -> String {
        match self {
            Value::Scalar(_) => "scalar".to_string(),
            Value::Matrix(matrix) => format!("{}x{}", matrix.nrows(), matrix.ncols()),
        }
    }

    /// Returns the scalar this value holds. A `1x1` matrix is accepted as a scalar.
    pub fn into_scalar(self) -> Result<f64, Error> {
        match self {
            Value::Scalar(value) => Ok(value),
            Value::Matrix(matrix) if matrix.dim() == (1, 1) => Ok(matrix[[0, 0]]),
            Value::Matrix(matrix) => Err(Error::spanless(ExpectedScalar {
                shape: format!("{}x{}", matrix.nrows(), matrix.ncols()),
            })),
        }
    }

    /// Returns the matrix this value holds. A scalar `c` becomes the `1x1` matrix `[c]`.
    pub fn into_matrix(self) -> Array2<f64> {
        match self {
            Value::Scalar(value) => Array2::from_elem((1, 1), value),
            Value::Matrix(matrix) => matrix,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<Array2<f64>> for Value {
    fn from(matrix: Array2<f64>) -> Self {
        Value::Matrix(matrix)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(value) => write!(f, "{}", value),
            Value::Matrix(matrix) => write!(f, "{:.4}", matrix),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn shapes() {
        assert_eq!(Value::from(2.0).shape(), (1, 1));
        let value = Value::from(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(value.shape(), (2, 3));
        assert_eq!(value.shape_string(), "2x3");
        assert_eq!(value.typename(), "matrix");
    }

    #[test]
    fn scalars() {
        assert_eq!(Value::from(2.5).into_scalar().unwrap(), 2.5);
        assert_eq!(Value::from(array![[4.0]]).into_scalar().unwrap(), 4.0);
        assert!(Value::from(array![[1.0, 2.0]]).into_scalar().is_err());
        assert_eq!(Value::from(3.0).into_matrix(), array![[3.0]]);
    }
}
