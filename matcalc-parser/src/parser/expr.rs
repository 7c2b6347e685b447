use super::{
    ast::{Call, Expr, LitNum, LitSym, Neg, Paren, Transpose},
    binary::parse_expr,
    error::{
        kind::{EmptyParenthesis, InvalidPostfix, NonFatal, UnclosedParenthesis, UnexpectedToken},
        Error,
    },
    Parse,
    Parser,
    Precedence,
};
use crate::tokenizer::TokenKind;

/// The tokens that can start an expression.
const PRIMARY: &[TokenKind] = &[
    TokenKind::Name,
    TokenKind::Number,
    TokenKind::OpenParen,
    TokenKind::Sub,
];

impl Parse for Expr {
    fn parse(input: &mut Parser) -> Result<Self, Error> {
        parse_expr(input, Precedence::Any)
    }
}

/// Parses a possibly negated operand. Negation binds looser than transposition, so `-X'` is
/// `-(X')`.
pub(crate) fn parse_unary(input: &mut Parser) -> Result<Expr, Error> {
    let minus = input.try_parse_with_fn(|input| {
        let token = input.next_token()?;
        if token.kind == TokenKind::Sub {
            Ok(token)
        } else {
            Err(Error::new(vec![token.span], NonFatal))
        }
    });

    match minus {
        Ok(minus) => {
            let operand = parse_unary(input)?;
            let span = minus.span.start..operand.span().end;
            Ok(Expr::Neg(Neg { operand: Box::new(operand), span }))
        },
        Err(_) => parse_postfix(input),
    }
}

/// Parses a primary expression followed by any number of transpose operators.
fn parse_postfix(input: &mut Parser) -> Result<Expr, Error> {
    let mut operand = parse_primary(input)?;

    loop {
        let start = input.cursor;
        let end = match input.next_token() {
            Ok(token) if token.kind == TokenKind::Quote => token.span.end,
            Ok(dot) if dot.kind == TokenKind::Dot => match input.next_token() {
                Ok(t) if t.kind == TokenKind::Name && t.lexeme == "T" => t.span.end,
                _ => return Err(Error::new(vec![dot.span], InvalidPostfix)),
            },
            _ => {
                input.cursor = start;
                break;
            },
        };

        let span = operand.span().start..end;
        operand = Expr::Transpose(Transpose { operand: Box::new(operand), span });
    }

    Ok(operand)
}

/// Parses a parenthesized expression. The cursor must be at the opening parenthesis.
fn parse_paren(input: &mut Parser) -> Result<Paren, Error> {
    let open = input.next_token()?;

    if let Some(close) = input.peek().filter(|token| token.kind == TokenKind::CloseParen) {
        let span = open.span.start..close.span.end;
        return Err(Error::new(vec![span], EmptyParenthesis));
    }

    let expr = parse_expr(input, Precedence::Any)?;
    match input.next_token() {
        Ok(close) if close.kind == TokenKind::CloseParen => Ok(Paren {
            expr: Box::new(expr),
            span: open.span.start..close.span.end,
        }),
        _ => Err(Error::new(vec![open.span], UnclosedParenthesis { opening: true })),
    }
}

/// Parses a number, a symbol, a call such as `Tr(A)`, or a parenthesized expression.
fn parse_primary(input: &mut Parser) -> Result<Expr, Error> {
    let next_kind = input.peek().map(|token| token.kind);
    if next_kind == Some(TokenKind::OpenParen) {
        return parse_paren(input).map(Expr::Paren);
    }

    let token = input.next_token()?;
    match token.kind {
        TokenKind::Number => {
            let value = token.lexeme.parse::<f64>()
                .map_err(|_| Error::new(vec![token.span.clone()], UnexpectedToken {
                    expected: PRIMARY,
                    found: token.kind,
                }))?;
            Ok(Expr::Number(LitNum { value, span: token.span }))
        },
        TokenKind::Name => {
            let name = LitSym { name: token.lexeme.to_owned(), span: token.span };
            if input.peek().is_some_and(|token| token.kind == TokenKind::OpenParen) {
                let paren = parse_paren(input)?;
                Ok(Expr::Call(Call {
                    span: name.span.start..paren.span.end,
                    name,
                    arg: paren.expr,
                }))
            } else {
                Ok(Expr::Symbol(name))
            }
        },
        TokenKind::CloseParen => Err(Error::new(
            vec![token.span],
            UnclosedParenthesis { opening: false },
        )),
        found => Err(Error::new(vec![token.span], UnexpectedToken { expected: PRIMARY, found })),
    }
}
