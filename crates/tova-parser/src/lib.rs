//! Tova parser: recursive descent over the lexer's token stream,
//! producing an owned AST.
//!
//! Two modes:
//! - **strict** (the CLI default): the first syntax error aborts parsing.
//! - **tolerant** (IDE tooling): errors accumulate while the parser
//!   resyncs at statement boundaries and leaves `Error` placeholder
//!   nodes; the partial AST is safe to analyze.
//!
//! Lexical errors are always fatal. Docstrings (`///`) are not attached
//! to nodes; they are collected into an ordered side list on the
//! [`Parse`] result for doc tooling and hover.

pub mod ast;
pub mod error;
mod parser;

pub use error::ParseError;

use tova_common::diag::Diagnostic;
use tova_common::span::Span;
use tova_common::token::{Token, TokenKind};

/// Result of parsing a Tova source file.
pub struct Parse {
    pub program: ast::Program,
    /// `///` docstrings in source order.
    pub docstrings: Vec<(String, Span)>,
    /// Accumulated errors; non-empty only in tolerant mode.
    pub errors: Vec<ParseError>,
}

impl Parse {
    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parser operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Strict,
    Tolerant,
}

/// Parse in strict mode: the first error is returned as a diagnostic.
pub fn parse(source: &str) -> Result<Parse, Diagnostic> {
    parse_with_mode(source, Mode::Strict)
}

/// Parse in tolerant mode: syntax errors accumulate on the result.
/// Lexical errors are still fatal.
pub fn parse_tolerant(source: &str) -> Result<Parse, Diagnostic> {
    parse_with_mode(source, Mode::Tolerant)
}

pub fn parse_with_mode(source: &str, mode: Mode) -> Result<Parse, Diagnostic> {
    let raw = tova_lexer::Lexer::tokenize(source).map_err(|e| e.into_diagnostic())?;

    // Docstrings are trivia to the grammar; pull them into the side list.
    let mut docstrings = Vec::new();
    let tokens: Vec<Token> = raw
        .into_iter()
        .filter(|t| match &t.kind {
            TokenKind::Docstring(text) => {
                docstrings.push((text.clone(), t.span));
                false
            }
            _ => true,
        })
        .collect();

    let mut p = parser::Parser::new(tokens, source.len() as u32, mode == Mode::Tolerant);
    match parser::parse_program(&mut p) {
        Ok(program) => Ok(Parse {
            program,
            docstrings,
            errors: p.errors,
        }),
        Err(err) => Err(err.into_diagnostic()),
    }
}
