//! Tokenizer and parser for matrix calculus expressions such as `Tr((Y - D*X)' * (Y - D*X))`.
//!
//! The parser produces a spanned abstract syntax tree ([`parser::ast::Expr`]); lowering it into
//! the symbolic representation used for differentiation happens in `matcalc-compute`.

pub mod parser;
pub mod tokenizer;
