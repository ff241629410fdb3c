use std::fmt;

use tova_common::diag::{Diagnostic, Stage};
use tova_common::span::Span;

/// A lexer error with location information.
///
/// Lexical errors are fatal for the current document: the lexer stops at
/// the first one and the caller reports it with `file:line:col` attached.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Convert into the shared diagnostic form.
    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::error(Stage::Lex, self.kind.to_string(), self.span)
    }
}

/// The specific kind of lexer error.
#[derive(Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    /// An unexpected character was encountered.
    UnexpectedCharacter(char),
    /// A solitary `&` outside JSX.
    SolitaryAmp,
    /// A string literal was not closed before end of input.
    UnterminatedString,
    /// A `/* ... */` comment was not closed before end of input.
    UnterminatedBlockComment,
    /// A `{expr}` region was not closed before end of input.
    UnclosedBrace,
    /// A JSX element was not closed before end of input.
    UnterminatedJsx,
    /// A `style { ... }` block was not closed before end of input.
    UnterminatedStyleBlock,
    /// `0x`/`0b`/`0o` with no digits following the prefix.
    ExpectedDigits { base: NumBase },
    /// A number literal that does not fit the numeric domain.
    InvalidNumberLiteral(String),
}

/// Radix of a prefixed integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumBase {
    Hex,
    Binary,
    Octal,
}

impl NumBase {
    pub fn radix(self) -> u32 {
        match self {
            NumBase::Hex => 16,
            NumBase::Binary => 2,
            NumBase::Octal => 8,
        }
    }

    fn word(self) -> &'static str {
        match self {
            NumBase::Hex => "hex",
            NumBase::Binary => "binary",
            NumBase::Octal => "octal",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            NumBase::Hex => "0x",
            NumBase::Binary => "0b",
            NumBase::Octal => "0o",
        }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character: {c:?}"),
            Self::SolitaryAmp => write!(f, "solitary '&' is not an operator; use '&&'"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedBlockComment => write!(f, "unterminated block comment"),
            Self::UnclosedBrace => write!(f, "unclosed '{{' expression"),
            Self::UnterminatedJsx => write!(f, "unterminated JSX element"),
            Self::UnterminatedStyleBlock => write!(f, "unterminated style block"),
            Self::ExpectedDigits { base } => {
                write!(f, "Expected {} digits after {}", base.word(), base.prefix())
            }
            Self::InvalidNumberLiteral(s) => write!(f, "invalid number literal: {s}"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_digit_errors_name_the_base() {
        assert_eq!(
            LexErrorKind::ExpectedDigits { base: NumBase::Hex }.to_string(),
            "Expected hex digits after 0x"
        );
        assert_eq!(
            LexErrorKind::ExpectedDigits { base: NumBase::Binary }.to_string(),
            "Expected binary digits after 0b"
        );
        assert_eq!(
            LexErrorKind::ExpectedDigits { base: NumBase::Octal }.to_string(),
            "Expected octal digits after 0o"
        );
    }

    #[test]
    fn error_converts_to_diagnostic() {
        let err = LexError::new(LexErrorKind::UnterminatedString, Span::new(4, 9));
        let diag = err.into_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.message, "unterminated string literal");
        assert_eq!(diag.span, Span::new(4, 9));
    }
}
