use super::{
    ast::{BinOp, BinOpKind, Binary, Expr},
    error::{kind::NonFatal, Error},
    expr::parse_unary,
    Parser,
    Precedence,
};
use crate::tokenizer::TokenKind;

/// Parses a binary operator that binds at least as tightly as `min`. The cursor is left
/// unchanged if the next token is not such an operator.
fn parse_op(input: &mut Parser, min: Precedence) -> Result<BinOp, Error> {
    input.try_parse_with_fn(|input| {
        let token = input.next_token()?;
        let kind = match token.kind {
            TokenKind::Add => BinOpKind::Add,
            TokenKind::Sub => BinOpKind::Sub,
            TokenKind::Mul => BinOpKind::Mul,
            _ => return Err(Error::new(vec![token.span], NonFatal)),
        };

        if kind.precedence() >= min {
            Ok(BinOp { kind, span: token.span })
        } else {
            Err(Error::new(vec![token.span], NonFatal))
        }
    })
}

/// Parses an expression whose binary operators all bind at least as tightly as `min`, using
/// precedence climbing.
///
/// The right-hand side of each operator is parsed at the next tighter precedence level, which
/// makes every binary operator left-associative: `A-B-C` is `(A-B)-C`.
pub fn parse_expr(input: &mut Parser, min: Precedence) -> Result<Expr, Error> {
    let mut lhs = parse_unary(input)?;

    while let Ok(op) = parse_op(input, min) {
        let rhs = parse_expr(input, op.kind.precedence().tighter())?;
        let span = lhs.span().start..rhs.span().end;
        lhs = Expr::Binary(Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
            span,
        });
    }

    Ok(lhs)
}
