use std::fmt::{Display, Formatter, Result};
use super::ast::Expr;

/// A trait for types that can be formatted as LaTeX.
pub trait Latex {
    /// Format the value as LaTeX.
    fn fmt_latex(&self, f: &mut Formatter) -> Result;

    /// Wraps the value in a [`LatexFormatter`], which implements [`Display`].
    fn as_display(&self) -> LatexFormatter<'_, Self> {
        LatexFormatter(self)
    }
}

/// A wrapper type that implements [`Display`] for any type that implements [`Latex`].
pub struct LatexFormatter<'a, T: ?Sized>(&'a T);

impl<T: ?Sized> Display for LatexFormatter<'_, T>
where
    T: Latex,
{
    fn fmt(&self, f: &mut Formatter) -> Result {
        self.0.fmt_latex(f)
    }
}

/// Helper to wrap some LaTeX output in scaling brackets.
pub fn fmt_paren(f: &mut Formatter, inner: impl FnOnce(&mut Formatter) -> Result) -> Result {
    write!(f, "\\left(")?;
    inner(f)?;
    write!(f, "\\right)")
}

impl Latex for Expr {
    fn fmt_latex(&self, f: &mut Formatter) -> Result {
        match self {
            Expr::Number(num) => write!(f, "{}", num.value),
            Expr::Symbol(sym) => write!(f, "\\mathbf{{{}}}", sym.name),
            Expr::Paren(paren) => fmt_paren(f, |f| paren.expr.fmt_latex(f)),
            Expr::Neg(neg) => {
                write!(f, "-")?;
                neg.operand.fmt_latex(f)
            },
            Expr::Transpose(transpose) => {
                transpose.operand.fmt_latex(f)?;
                write!(f, "^{{\\mathsf{{T}}}}")
            },
            Expr::Binary(binary) => {
                binary.lhs.fmt_latex(f)?;
                write!(f, " {} ", binary.op.kind.symbol())?;
                binary.rhs.fmt_latex(f)
            },
            Expr::Call(call) => {
                write!(f, "\\mathrm{{ {} }}", call.name.name)?;
                fmt_paren(f, |f| call.arg.fmt_latex(f))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    use crate::parser::Parser;

    #[test]
    fn fmt_display() {
        let mut parser = Parser::new("2 * Tr(A' * X)");
        let expr = parser.try_parse_full::<Expr>().unwrap();
        let fmt = format!("{}", expr);

        assert_eq!(fmt, "2*Tr(A'*X)");
    }

    #[test]
    fn fmt_latex() {
        let mut parser = Parser::new("Tr((Y - X).T * B)");
        let expr = parser.try_parse_full::<Expr>().unwrap();
        let fmt = format!("{}", expr.as_display());

        assert_eq!(
            fmt,
            "\\mathrm{ Tr }\\left(\\left(\\mathbf{Y} - \\mathbf{X}\\right)^{\\mathsf{T}} * \\mathbf{B}\\right)",
        );
    }
}
