use std::fmt;

use serde::Serialize;

use tova_common::diag::{Diagnostic, Stage};
use tova_common::span::Span;

/// A parse error with location information.
///
/// In strict mode the first error aborts parsing; in tolerant mode errors
/// accumulate while the parser resyncs at statement boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Convert into the shared diagnostic form.
    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::error(Stage::Parse, self.message, self.span)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}
