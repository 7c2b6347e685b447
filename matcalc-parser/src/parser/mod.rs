pub mod ast;
pub mod binary;
pub mod error;
pub mod expr;
pub mod fmt;

use error::{kind::{self, UnclosedParenthesis}, Error};
use matcalc_error::ErrorKind;
use super::tokenizer::{tokenize_complete, Token, TokenKind};
use std::ops::Range;

/// A high-level parser for matrix calculus expressions. This is the type to use to parse an
/// arbitrary piece of input into an abstract syntax tree.
#[derive(Debug, Clone)]
pub struct Parser<'source> {
    /// The tokens that this parser is currently parsing.
    tokens: Box<[Token<'source>]>,

    /// The index of the **next** token to be parsed.
    cursor: usize,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            tokens: tokenize_complete(source),
            cursor: 0,
        }
    }

    /// Creates an error that points at the current token, or the end of the source code if the
    /// cursor is at the end of the stream.
    pub fn error(&self, kind: impl ErrorKind + 'static) -> Error {
        Error::new(vec![self.span()], kind)
    }

    /// Returns a span pointing at the end of the source code.
    pub fn eof_span(&self) -> Range<usize> {
        self.tokens.last().map_or(0..0, |token| token.span.end..token.span.end)
    }

    /// Returns the span of the current token, or the end of the source code if the cursor is at
    /// the end of the stream.
    pub fn span(&self) -> Range<usize> {
        self.tokens
            .get(self.cursor)
            .map_or(self.eof_span(), |token| token.span.clone())
    }

    /// Returns the current token. The cursor is not moved. Returns [`None`] if the cursor is at
    /// the end of the stream.
    pub fn current_token(&self) -> Option<&Token<'source>> {
        self.tokens.get(self.cursor)
    }

    /// Returns the next non-whitespace token without moving the cursor.
    pub fn peek(&self) -> Option<&Token<'source>> {
        self.tokens[self.cursor.min(self.tokens.len())..]
            .iter()
            .find(|token| !token.is_whitespace())
    }

    /// Advances the cursor past any whitespace tokens.
    pub fn skip_whitespace(&mut self) {
        while self.current_token().is_some_and(Token::is_whitespace) {
            self.cursor += 1;
        }
    }

    /// Returns the next token to be parsed, then advances the cursor. Whitespace tokens are
    /// skipped.
    ///
    /// Returns an EOF error if there are no more tokens.
    pub fn next_token(&mut self) -> Result<Token<'source>, Error> {
        self.skip_whitespace();
        match self.tokens.get(self.cursor) {
            Some(token) => {
                self.cursor += 1;
                // cloning is cheap: only Range<_> is cloned
                Ok(token.clone())
            },
            None => Err(self.error(kind::UnexpectedEof)),
        }
    }

    /// Speculatively parses a value from the given stream of tokens. This function can be used
    /// in the [`Parse::parse`] implementation of a type with the given [`Parser`], as it will
    /// automatically backtrack the cursor position if parsing fails.
    ///
    /// If parsing is successful, the stream is advanced past the consumed tokens and the parsed
    /// value is returned. Otherwise, the stream is left unchanged and an error is returned.
    pub fn try_parse<T: Parse>(&mut self) -> Result<T, Error> {
        self.try_parse_with_fn(T::parse)
    }

    /// Speculatively parses a value from the given stream of tokens, using a custom parsing
    /// function to parse the value. The cursor is restored if the function fails.
    pub fn try_parse_with_fn<T, F>(&mut self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Parser<'source>) -> Result<T, Error>,
    {
        let start = self.cursor;
        match f(self) {
            Ok(value) => Ok(value),
            err => {
                self.cursor = start;
                err
            },
        }
    }

    /// Attempts to parse a value from the given stream of tokens. All the tokens must be consumed
    /// by the parser; if not, an error is returned.
    pub fn try_parse_full<T: Parse>(&mut self) -> Result<T, Error> {
        let value = T::parse(self)?;
        self.skip_whitespace();
        match self.current_token() {
            None => Ok(value),
            Some(token) if token.kind == TokenKind::CloseParen => Err(Error::new(
                vec![token.span.clone()],
                UnclosedParenthesis { opening: false },
            )),
            Some(token) => Err(Error::new(
                vec![token.span.start..self.eof_span().end],
                kind::ExpectedEof,
            )),
        }
    }
}

/// Any type that can be parsed from a source of tokens.
pub trait Parse: Sized {
    /// Parses a value from the given stream of tokens, advancing the stream past the consumed
    /// tokens if parsing is successful.
    fn parse(input: &mut Parser) -> Result<Self, Error>;
}

/// The precedence of an operation, in order from lowest precedence (evaluated last) to highest
/// precedence (evaluated first).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precedence {
    /// Any precedence.
    Any,

    /// Precedence of addition (`+`) and subtraction (`-`), which separate terms.
    Term,

    /// Precedence of multiplication (`*`), which separates factors.
    Factor,

    /// Precedence of unary subtraction (`-`).
    Neg,

    /// Precedence of the postfix transpose operators (`'` and `.T`).
    Postfix,
}

impl Precedence {
    /// Returns the next tighter precedence level. Used to parse the right-hand side of a
    /// left-associative operator.
    pub fn tighter(self) -> Self {
        match self {
            Precedence::Any => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Neg,
            Precedence::Neg | Precedence::Postfix => Precedence::Postfix,
        }
    }
}

impl PartialOrd for Precedence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let left = *self as u8;
        let right = *other as u8;
        left.partial_cmp(&right)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    use ast::{BinOp, BinOpKind, Binary, Call, Expr, LitNum, LitSym, Neg, Paren, Transpose};

    fn sym(name: &str, span: Range<usize>) -> Expr {
        Expr::Symbol(LitSym { name: name.to_string(), span })
    }

    fn parse(input: &str) -> Result<Expr, Error> {
        Parser::new(input).try_parse_full::<Expr>()
    }

    /// Returns the debug representation of the error's kind, which names the kind's type.
    fn kind_of(err: &Error) -> String {
        format!("{:?}", err.kind)
    }

    #[test]
    fn literal_number() {
        let expr = parse("0.5").unwrap();
        assert_eq!(expr, Expr::Number(LitNum { value: 0.5, span: 0..3 }));
    }

    #[test]
    fn product_is_left_associative() {
        let expr = parse("A*X*B").unwrap();
        assert_eq!(expr, Expr::Binary(Binary {
            lhs: Box::new(Expr::Binary(Binary {
                lhs: Box::new(sym("A", 0..1)),
                op: BinOp { kind: BinOpKind::Mul, span: 1..2 },
                rhs: Box::new(sym("X", 2..3)),
                span: 0..3,
            })),
            op: BinOp { kind: BinOpKind::Mul, span: 3..4 },
            rhs: Box::new(sym("B", 4..5)),
            span: 0..5,
        }));
    }

    #[test]
    fn product_binds_tighter_than_difference() {
        let expr = parse("Y - D*X").unwrap();
        assert_eq!(expr, Expr::Binary(Binary {
            lhs: Box::new(sym("Y", 0..1)),
            op: BinOp { kind: BinOpKind::Sub, span: 2..3 },
            rhs: Box::new(Expr::Binary(Binary {
                lhs: Box::new(sym("D", 4..5)),
                op: BinOp { kind: BinOpKind::Mul, span: 5..6 },
                rhs: Box::new(sym("X", 6..7)),
                span: 4..7,
            })),
            span: 0..7,
        }));
    }

    #[test]
    fn transpose_spellings() {
        let quote = parse("X'").unwrap();
        let dot = parse("X.T").unwrap();
        assert_eq!(quote, Expr::Transpose(Transpose {
            operand: Box::new(sym("X", 0..1)),
            span: 0..2,
        }));
        assert_eq!(dot, Expr::Transpose(Transpose {
            operand: Box::new(sym("X", 0..1)),
            span: 0..3,
        }));
    }

    #[test]
    fn transpose_binds_tighter_than_negation() {
        let expr = parse("-X'").unwrap();
        assert_eq!(expr, Expr::Neg(Neg {
            operand: Box::new(Expr::Transpose(Transpose {
                operand: Box::new(sym("X", 1..2)),
                span: 1..3,
            })),
            span: 0..3,
        }));
    }

    #[test]
    fn trace_call_of_parenthesized_transpose() {
        let expr = parse("Tr((A)')").unwrap();
        assert_eq!(expr, Expr::Call(Call {
            name: LitSym { name: "Tr".to_string(), span: 0..2 },
            arg: Box::new(Expr::Transpose(Transpose {
                operand: Box::new(Expr::Paren(Paren {
                    expr: Box::new(sym("A", 4..5)),
                    span: 3..6,
                })),
                span: 3..7,
            })),
            span: 0..8,
        }));
    }

    #[test]
    fn display_round_trip() {
        let expr = parse("Tr((Y - D*X)' * (Y - D*X))").unwrap();
        assert_eq!(expr.to_string(), "Tr((Y-D*X)'*(Y-D*X))");
    }

    #[test]
    fn unclosed_parenthesis() {
        let err = parse("Tr(A*X").unwrap_err();
        assert!(kind_of(&err).contains("UnclosedParenthesis"));
        assert_eq!(err.spans, vec![2..3]);
    }

    #[test]
    fn stray_closing_parenthesis() {
        let err = parse("A*X)").unwrap_err();
        assert!(kind_of(&err).contains("UnclosedParenthesis"));
        assert_eq!(err.spans, vec![3..4]);
    }

    #[test]
    fn empty_parenthesis() {
        let err = parse("Tr()").unwrap_err();
        assert!(kind_of(&err).contains("EmptyParenthesis"));
        assert_eq!(err.spans, vec![2..4]);
    }

    #[test]
    fn unexpected_end_of_input() {
        let err = parse("A +").unwrap_err();
        assert!(kind_of(&err).contains("UnexpectedEof"));
        assert_eq!(err.spans, vec![3..3]);
    }

    #[test]
    fn trailing_input() {
        let err = parse("A B").unwrap_err();
        assert!(kind_of(&err).contains("ExpectedEof"));
        assert_eq!(err.spans, vec![2..3]);
    }

    #[test]
    fn dot_without_t() {
        let err = parse("X.Y").unwrap_err();
        assert!(kind_of(&err).contains("InvalidPostfix"));
    }

    #[test]
    fn unexpected_symbol() {
        let err = parse("A * $").unwrap_err();
        assert!(kind_of(&err).contains("UnexpectedToken"));
        assert_eq!(err.spans, vec![4..5]);
    }
}
