//! Lowering of parsed syntax trees into [`Expr`]s.
//!
//! Every name in the source becomes a matrix [`Expr::Variable`] unless it was declared as a
//! scalar in the [`Symbols`] table. Calls to `Tr` (or `tr`) become traces, and `d(X)` becomes
//! the differential of `X`. All nodes are built through the smart constructors, so the lowered
//! expression is already free of trivial structure.

use ariadne::Fmt;
use levenshtein::levenshtein;
use matcalc_attrs::ErrorKind;
use matcalc_error::{Error, EXPR};
use matcalc_parser::parser::{
    ast::{BinOpKind, Call, Expr as AstExpr, LitSym},
    Parser,
};
use std::{collections::HashSet, sync::Arc};
use super::expr::Expr;

/// The functions that can be called in an expression.
const FUNCTIONS: [&str; 3] = ["Tr", "tr", "d"];

/// The function is not one of the known functions.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the `{}` function does not exist", self.name),
    labels = ["this function"],
    help = if self.suggestions.is_empty() {
        format!("the available functions are {} and {}", "Tr".fg(EXPR), "d".fg(EXPR))
    } else if self.suggestions.len() == 1 {
        format!("did you mean the `{}` function?", (&*self.suggestions[0]).fg(EXPR))
    } else {
        format!(
            "did you mean one of these functions? {}",
            self.suggestions
                .iter()
                .map(|s| format!("`{}`", s.fg(EXPR)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
)]
pub struct UnknownFunction {
    /// The name of the function that was called.
    pub name: String,

    /// A list of similarly named functions, if any.
    pub suggestions: Vec<String>,
}

/// The argument of `d(..)` is not a single variable.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "differentials can only be taken of a single variable",
    labels = ["this argument"],
    help = format!("write {} to refer to the differential of {}", "d(X)".fg(EXPR), "X".fg(EXPR)),
)]
pub struct InvalidDifferential;

/// The set of names that should be lowered to scalar variables instead of matrix variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symbols {
    scalars: HashSet<String>,
}

impl Symbols {
    /// Creates an empty symbol table, in which every name is a matrix variable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the given name as a scalar variable, builder-style.
    pub fn with_scalar(mut self, name: impl Into<String>) -> Self {
        self.declare_scalar(name);
        self
    }

    /// Declares the given name as a scalar variable.
    pub fn declare_scalar(&mut self, name: impl Into<String>) {
        self.scalars.insert(name.into());
    }

    /// Returns true if the given name was declared as a scalar variable.
    pub fn is_scalar(&self, name: &str) -> bool {
        self.scalars.contains(name)
    }

    /// Returns the declared scalar names, sorted.
    pub fn scalars(&self) -> Vec<&str> {
        let mut names = self.scalars.iter().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

/// Lowers a name into a variable of the kind declared in `symbols`.
fn lower_symbol(sym: &LitSym, symbols: &Symbols) -> Result<Expr, Error> {
    let expr = if symbols.is_scalar(&sym.name) {
        Expr::scalar_variable(sym.name.as_str())
    } else {
        Expr::variable(sym.name.as_str())
    };
    expr.map_err(|err| Error::new(vec![sym.span.clone()], err))
}

/// Lowers a call to one of the known functions.
fn lower_call(call: &Call, symbols: &Symbols) -> Result<Expr, Error> {
    match call.name.name.as_str() {
        "Tr" | "tr" => Ok(lower(&call.arg, symbols)?.trace()),
        "d" => match call.arg.innermost() {
            AstExpr::Symbol(sym) => {
                let variable = lower_symbol(sym, symbols)?;
                Ok(Expr::Differential(Arc::new(variable)))
            },
            other => Err(Error::new(vec![other.span()], InvalidDifferential)),
        },
        name => {
            let suggestions = FUNCTIONS.iter()
                .filter(|candidate| levenshtein(candidate, name) < 2)
                .map(|candidate| candidate.to_string())
                .collect();
            Err(Error::new(vec![call.name.span.clone()], UnknownFunction {
                name: name.to_string(),
                suggestions,
            }))
        },
    }
}

/// Lowers a parsed expression into an [`Expr`].
pub fn lower(ast: &AstExpr, symbols: &Symbols) -> Result<Expr, Error> {
    Ok(match ast {
        AstExpr::Number(num) => Expr::Scalar(num.value),
        AstExpr::Symbol(sym) => lower_symbol(sym, symbols)?,
        AstExpr::Paren(paren) => lower(&paren.expr, symbols)?,
        AstExpr::Neg(neg) => -lower(&neg.operand, symbols)?,
        AstExpr::Transpose(transpose) => lower(&transpose.operand, symbols)?.transpose(),
        AstExpr::Binary(binary) => {
            let lhs = lower(&binary.lhs, symbols)?;
            let rhs = lower(&binary.rhs, symbols)?;
            match binary.op.kind {
                BinOpKind::Add => lhs + rhs,
                BinOpKind::Sub => lhs - rhs,
                BinOpKind::Mul => lhs * rhs,
            }
        },
        AstExpr::Call(call) => lower_call(call, symbols)?,
    })
}

/// Parses the given source and lowers it into an [`Expr`].
pub fn parse(source: &str, symbols: &Symbols) -> Result<Expr, Error> {
    let ast = Parser::new(source).try_parse_full::<AstExpr>()?;
    lower(&ast, symbols)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    #[test]
    fn names_become_matrix_variables() {
        let expr = parse("A*X", &Symbols::new()).unwrap();
        assert_eq!(expr, var("A") * var("X"));
    }

    #[test]
    fn declared_scalars() {
        let symbols = Symbols::new().with_scalar("lambda");
        let expr = parse("X*lambda", &symbols).unwrap();
        assert_eq!(expr, Expr::ScalarMul(
            Arc::new(Expr::ScalarVariable("lambda".to_string())),
            Arc::new(var("X")),
        ));
        assert_eq!(symbols.scalars(), vec!["lambda"]);
    }

    #[test]
    fn transpose_and_trace() {
        let expr = parse("Tr((Y - D*X).T * (Y - D*X))", &Symbols::new()).unwrap();
        assert_eq!(expr.to_string(), "Tr((Y-D*X)'*(Y-D*X))");

        let expr = parse("tr(X'')", &Symbols::new()).unwrap();
        assert_eq!(expr, var("X").trace());
    }

    #[test]
    fn negation_and_numbers() {
        let expr = parse("-2*A + 0.5*A", &Symbols::new()).unwrap();
        assert_eq!(expr.to_string(), "-2*A+0.5*A");

        let expr = parse("A - A", &Symbols::new()).unwrap();
        assert_eq!(expr, Expr::Null);
    }

    #[test]
    fn differential_of_a_name() {
        let expr = parse("Tr(A*d(X))", &Symbols::new()).unwrap();
        assert_eq!(expr, (var("A") * Expr::differential("X")).trace());
    }

    #[test]
    fn reserved_name() {
        let err = parse("A*T", &Symbols::new()).unwrap_err();
        assert_eq!(err.spans, vec![2..3]);
        assert!(format!("{:?}", err.kind).contains("ReservedName"));
    }

    #[test]
    fn invalid_differential() {
        let err = parse("d(A*X)", &Symbols::new()).unwrap_err();
        assert_eq!(err.spans, vec![2..5]);
        assert!(format!("{:?}", err.kind).contains("InvalidDifferential"));
    }

    #[test]
    fn unknown_function_suggestions() {
        let err = parse("Tx(A)", &Symbols::new()).unwrap_err();
        assert_eq!(err.spans, vec![0..2]);
        let debug = format!("{:?}", err.kind);
        assert!(debug.contains("UnknownFunction"));
        assert!(debug.contains("suggestions: [\"Tr\"]"));
    }
}
