//! Ariadne-based diagnostic rendering.
//!
//! The CLI prints each diagnostic twice: a one-line
//! `<file>:<line>:<col>: <message>` summary (stable for tests and
//! editors) and an ariadne report with a labeled source span. Output is
//! colorless so snapshots stay byte-stable.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use tova_common::diag::{Diagnostic, Severity};
use tova_common::span::LineIndex;

/// Render one diagnostic into an ariadne report string.
pub fn render_diagnostic(diag: &Diagnostic, source: &str, _filename: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();

    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        // Ariadne needs at least a one-character span.
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
    };
    let range = clamp(diag.span.start as usize..diag.span.end as usize);

    let mut out = Vec::new();
    let report = Report::<Range<usize>>::build(kind, range.clone())
        .with_config(config)
        .with_message(&diag.message)
        .with_label(Label::new(range).with_message(&diag.message))
        .finish();
    let _ = report.write(Source::from(source), &mut out);
    String::from_utf8_lossy(&out).into_owned()
}

/// One-line summaries in source order: `<file>:<line>:<col>: <message>`.
pub fn summary_lines(diags: &[Diagnostic], file: &str, source: &str) -> Vec<String> {
    let index = LineIndex::new(source);
    let mut sorted: Vec<&Diagnostic> = diags.iter().collect();
    sorted.sort_by_key(|d| d.span.start);
    sorted.iter().map(|d| d.render(file, &index)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tova_common::diag::Stage;
    use tova_common::span::Span;

    #[test]
    fn summary_is_file_line_col() {
        let source = "x = 1\ny = z";
        let diags = vec![Diagnostic::warning(
            Stage::Analyze,
            "Unresolved identifier 'z'",
            Span::new(10, 11),
        )];
        let lines = summary_lines(&diags, "app.tova", source);
        assert_eq!(lines, vec!["app.tova:2:5: Unresolved identifier 'z'"]);
    }

    #[test]
    fn report_contains_message() {
        let source = "x = y";
        let diag = Diagnostic::warning(
            Stage::Analyze,
            "Unresolved identifier 'y'",
            Span::new(4, 5),
        );
        let rendered = render_diagnostic(&diag, source, "app.tova");
        assert!(rendered.contains("Unresolved identifier 'y'"));
    }
}
