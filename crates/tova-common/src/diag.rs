use std::fmt;

use serde::Serialize;

use crate::span::{LineIndex, Span};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Lex,
    Parse,
    Analyze,
}

/// A located diagnostic. Rendered as `<file>:<line>:<col>: <message>`,
/// with line and column 1-based and pointing at the first character of
/// the offending token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub severity: Severity,
    pub stage: Stage,
}

impl Diagnostic {
    pub fn error(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Error,
            stage,
        }
    }

    pub fn warning(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Warning,
            stage,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render in the `<file>:<line>:<col>: <message>` summary form.
    pub fn render(&self, file: &str, index: &LineIndex) -> String {
        let (line, col) = index.line_col(self.span.start);
        format!("{file}:{line}:{col}: {}", self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_points_at_token_start() {
        let src = "x = 1\ny = @";
        let index = LineIndex::new(src);
        let diag = Diagnostic::error(Stage::Lex, "unexpected character: '@'", Span::new(10, 11));
        assert_eq!(
            diag.render("app.tova", &index),
            "app.tova:2:5: unexpected character: '@'"
        );
    }

    #[test]
    fn severity_predicates() {
        let w = Diagnostic::warning(Stage::Analyze, "m", Span::point(0));
        let e = Diagnostic::error(Stage::Parse, "m", Span::point(0));
        assert!(!w.is_error());
        assert!(e.is_error());
    }
}
