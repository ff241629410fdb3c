//! Tova semantic analysis: scope construction, symbol resolution,
//! gradual type inference, exhaustiveness over sum types, return-path
//! analysis and context checking for client/server forms.
//!
//! The analyzer never aborts: it accumulates diagnostics and returns the
//! scope tree plus the type registry alongside them. Codegen runs only
//! when `Analysis::has_errors()` is false; IDE tooling reads the scopes
//! and registry either way.

pub mod builtins;
pub mod diagnostics;
pub mod exhaustiveness;
mod infer;
pub mod registry;
pub mod returns;
pub mod scope;
pub mod ty;

use tova_common::diag::Diagnostic;
use tova_common::span::Span;
use tova_parser::ast::Program;

use infer::Analyzer;
use registry::TypeRegistry;
use scope::ScopeTree;

/// Analysis options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Upgrade type warnings to errors and enable narrowing warnings.
    pub strict: bool,
}

/// Everything the analyzer learned about one program.
pub struct Analysis {
    pub scopes: ScopeTree,
    pub registry: TypeRegistry,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

/// Analyze a parsed program.
pub fn analyze(program: &Program, options: Options) -> Analysis {
    let module_span = program
        .stmts
        .first()
        .map(|first| {
            let last = program.stmts.last().expect("non-empty");
            first.span.merge(last.span)
        })
        .unwrap_or(Span::point(0));

    let mut analyzer = Analyzer::new(options.strict, module_span);
    analyzer.run(program);
    let Analyzer {
        scopes,
        registry,
        diags,
        ..
    } = analyzer;
    Analysis {
        scopes,
        registry,
        diagnostics: diags,
    }
}
