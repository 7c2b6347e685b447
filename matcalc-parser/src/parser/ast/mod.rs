//! The abstract syntax tree produced by the [`Parser`](super::Parser).
//!
//! Every node remembers the region of the source code it was parsed from, so later stages (such
//! as lowering into symbolic expressions) can point their errors at the offending input.

use std::{fmt, ops::Range};
use super::Precedence;

/// A number literal, such as `2` or `0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct LitNum {
    /// The value of the literal.
    pub value: f64,

    /// The region of the source code that this literal was parsed from.
    pub span: Range<usize>,
}

/// A symbol / identifier literal, such as `X` or `lambda`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LitSym {
    /// The name of the symbol.
    pub name: String,

    /// The region of the source code that this symbol was parsed from.
    pub span: Range<usize>,
}

/// A parenthesized expression, such as `(A + B)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Paren {
    /// The inner expression.
    pub expr: Box<Expr>,

    /// The region of the source code that this expression was parsed from, including the
    /// parentheses.
    pub span: Range<usize>,
}

/// A negated expression, such as `-A`.
#[derive(Debug, Clone, PartialEq)]
pub struct Neg {
    /// The negated operand.
    pub operand: Box<Expr>,

    /// The region of the source code that this expression was parsed from.
    pub span: Range<usize>,
}

/// A transposed expression, such as `X'` or `X.T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transpose {
    /// The transposed operand.
    pub operand: Box<Expr>,

    /// The region of the source code that this expression was parsed from.
    pub span: Range<usize>,
}

/// The kind of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
}

impl BinOpKind {
    /// Returns the precedence of the operator.
    pub fn precedence(self) -> Precedence {
        match self {
            BinOpKind::Add | BinOpKind::Sub => Precedence::Term,
            BinOpKind::Mul => Precedence::Factor,
        }
    }

    /// Returns the symbol used to write the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
        }
    }
}

/// A binary operator, along with where it was found in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinOp {
    /// The kind of operator.
    pub kind: BinOpKind,

    /// The region of the source code that this operator was parsed from.
    pub span: Range<usize>,
}

/// A binary expression, such as `A * X`. All binary operators are left-associative.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    /// The left-hand side of the expression.
    pub lhs: Box<Expr>,

    /// The operator.
    pub op: BinOp,

    /// The right-hand side of the expression.
    pub rhs: Box<Expr>,

    /// The region of the source code that this expression was parsed from.
    pub span: Range<usize>,
}

/// A function call with a single argument, such as `Tr(A*X)` or `d(X)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// The name of the called function.
    pub name: LitSym,

    /// The argument.
    pub arg: Box<Expr>,

    /// The region of the source code that this call was parsed from, including the parentheses.
    pub span: Range<usize>,
}

/// Any expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(LitNum),
    Symbol(LitSym),
    Paren(Paren),
    Neg(Neg),
    Transpose(Transpose),
    Binary(Binary),
    Call(Call),
}

impl Expr {
    /// Returns the span of the expression.
    pub fn span(&self) -> Range<usize> {
        match self {
            Expr::Number(num) => num.span.clone(),
            Expr::Symbol(sym) => sym.span.clone(),
            Expr::Paren(paren) => paren.span.clone(),
            Expr::Neg(neg) => neg.span.clone(),
            Expr::Transpose(transpose) => transpose.span.clone(),
            Expr::Binary(binary) => binary.span.clone(),
            Expr::Call(call) => call.span.clone(),
        }
    }

    /// If this expression is a parenthesized expression, returns the innermost expression inside
    /// all the parentheses. Otherwise, returns the expression itself.
    pub fn innermost(&self) -> &Expr {
        let mut inner = self;
        while let Expr::Paren(paren) = inner {
            inner = &paren.expr;
        }
        inner
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number(num) => write!(f, "{}", num.value),
            Expr::Symbol(sym) => write!(f, "{}", sym.name),
            Expr::Paren(paren) => write!(f, "({})", paren.expr),
            Expr::Neg(neg) => write!(f, "-{}", neg.operand),
            Expr::Transpose(transpose) => write!(f, "{}'", transpose.operand),
            Expr::Binary(binary) => write!(f, "{}{}{}", binary.lhs, binary.op.kind.symbol(), binary.rhs),
            Expr::Call(call) => write!(f, "{}({})", call.name.name, call.arg),
        }
    }
}
