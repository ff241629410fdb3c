//! Exhaustiveness and reachability checks for `match` expressions.
//!
//! For a subject whose type names a known sum type (user-declared, or the
//! built-in `Option`/`Result`), the covered variant names are gathered
//! from the arms. A strict subset with no catch-all produces one warning
//! per missing variant. Catch-alls are the wildcard pattern and unguarded
//! bindings; a guarded arm never counts.

use tova_common::diag::{Diagnostic, Stage};
use tova_common::span::Span;
use tova_parser::ast::{MatchArm, Pattern, PatternKind};

use crate::registry::TypeRegistry;
use crate::ty::Type;

/// Diagnostics for one `match`: non-exhaustiveness warnings and
/// unreachable-arm warnings.
pub fn check_match(
    subject_ty: Option<&Type>,
    arms: &[MatchArm],
    registry: &TypeRegistry,
    span: Span,
) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    let has_catch_all = arms
        .iter()
        .any(|arm| arm.guard.is_none() && arm.pattern.is_catch_all());

    if let Some(variants) = subject_variants(subject_ty, registry) {
        if !has_catch_all {
            let mut covered = Vec::new();
            for arm in arms {
                collect_covered(&arm.pattern, &mut covered);
            }
            for variant in &variants {
                if !covered.iter().any(|c| c == variant) {
                    diags.push(Diagnostic::warning(
                        Stage::Analyze,
                        format!("Non-exhaustive match: missing '{variant}'"),
                        span,
                    ));
                }
            }
        }
    }

    // Arms after an unguarded catch-all can never run.
    let mut saturated = false;
    for arm in arms {
        if saturated {
            diags.push(Diagnostic::warning(
                Stage::Analyze,
                "Unreachable match arm",
                arm.span,
            ));
            continue;
        }
        if arm.guard.is_none() && arm.pattern.is_catch_all() {
            saturated = true;
        }
    }

    diags
}

/// Variant names of the subject's sum type, if it has one.
fn subject_variants(subject_ty: Option<&Type>, registry: &TypeRegistry) -> Option<Vec<String>> {
    let name = subject_ty?.name()?;
    registry.variants_of(name)
}

fn collect_covered(pattern: &Pattern, out: &mut Vec<String>) {
    match &pattern.kind {
        PatternKind::Variant { name, .. } => out.push(name.clone()),
        PatternKind::Or(alts) => {
            for alt in alts {
                collect_covered(alt, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tova_parser::ast::{ExprKind, StmtKind};

    fn arms_of(source: &str) -> (Vec<MatchArm>, Span) {
        let parse = tova_parser::parse(source).expect("parse failure");
        for stmt in parse.program.stmts {
            if let StmtKind::Expr(e) = stmt.kind {
                if let ExprKind::Match { arms, .. } = e.kind {
                    return (arms, e.span);
                }
            }
        }
        panic!("no match expression in source");
    }

    #[test]
    fn missing_variant_is_reported_exactly() {
        let (arms, span) = arms_of("match o { Some(v) => v }");
        let registry = TypeRegistry::new();
        let diags = check_match(Some(&Type::option(Type::int())), &arms, &registry, span);
        let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["Non-exhaustive match: missing 'None'"]);
    }

    #[test]
    fn full_cover_is_clean() {
        let (arms, span) = arms_of("match o { Some(v) => v\n None => 0 }");
        let registry = TypeRegistry::new();
        let diags = check_match(Some(&Type::option(Type::int())), &arms, &registry, span);
        assert!(diags.is_empty());
    }

    #[test]
    fn catch_all_suppresses_warnings() {
        let (arms, span) = arms_of("match o { Some(v) => v\n _ => 0 }");
        let registry = TypeRegistry::new();
        let diags = check_match(Some(&Type::option(Type::int())), &arms, &registry, span);
        assert!(diags.is_empty());
    }

    #[test]
    fn guarded_binding_is_not_a_catch_all() {
        let (arms, span) = arms_of("match o { Some(v) => v\n other if cond(other) => 0 }");
        let registry = TypeRegistry::new();
        let diags = check_match(Some(&Type::option(Type::int())), &arms, &registry, span);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("missing 'None'"));
    }

    #[test]
    fn unguarded_binding_is_a_catch_all() {
        let (arms, span) = arms_of("match o { Some(v) => v\n other => 0 }");
        let registry = TypeRegistry::new();
        let diags = check_match(Some(&Type::option(Type::int())), &arms, &registry, span);
        assert!(diags.is_empty());
    }

    #[test]
    fn arm_after_catch_all_is_unreachable() {
        let (arms, span) = arms_of("match x { _ => 0\n 1 => 1 }");
        let registry = TypeRegistry::new();
        let diags = check_match(None, &arms, &registry, span);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Unreachable match arm");
    }

    #[test]
    fn unknown_subject_type_is_silent() {
        let (arms, span) = arms_of("match x { 1 => 1 }");
        let registry = TypeRegistry::new();
        let diags = check_match(None, &arms, &registry, span);
        assert!(diags.is_empty());
    }
}
