//! Return-path analysis.
//!
//! A function with a declared return type must produce a value on every
//! exit path. The final expression of a block is an implicit return
//! (matching the emitter's implicit-return rewrite), so a body ending in
//! `a + b` passes; an `if` without `else` as the last statement does not.

use tova_parser::ast::{ArmBody, Block, Expr, ExprKind, Stmt, StmtKind};

/// Whether every path through `block` ends by producing a value
/// (explicit `return` or an implicit final expression).
pub fn block_produces_value(block: &Block) -> bool {
    // An unconditional return anywhere in the block settles it.
    if block.stmts.iter().any(stmt_is_unconditional_return) {
        return true;
    }
    match block.stmts.last() {
        None => false,
        Some(stmt) => stmt_produces_value(stmt),
    }
}

fn stmt_is_unconditional_return(stmt: &Stmt) -> bool {
    matches!(stmt.kind, StmtKind::Return(_))
}

fn stmt_produces_value(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::Expr(expr) => expr_produces_value(expr),
        StmtKind::If {
            then_branch,
            elifs,
            else_branch,
            ..
        } => {
            // Without an else, the false path falls through empty-handed.
            let Some(else_branch) = else_branch else {
                return false;
            };
            block_produces_value(then_branch)
                && elifs.iter().all(|(_, b)| block_produces_value(b))
                && block_produces_value(else_branch)
        }
        _ => false,
    }
}

fn expr_produces_value(expr: &Expr) -> bool {
    match &expr.kind {
        // An if-expression without an else has a valueless path.
        ExprKind::If {
            then_branch,
            elifs,
            else_branch,
            ..
        } => match else_branch {
            None => false,
            Some(else_branch) => {
                block_produces_value(then_branch)
                    && elifs.iter().all(|(_, b)| block_produces_value(b))
                    && block_produces_value(else_branch)
            }
        },
        ExprKind::Match { arms, .. } => arms.iter().all(|arm| match &arm.body {
            ArmBody::Expr(_) => true,
            ArmBody::Block(b) => block_produces_value(b),
        }),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(source: &str) -> Block {
        let parse = tova_parser::parse(source).expect("parse failure");
        match parse.program.stmts.into_iter().next().unwrap().kind {
            StmtKind::FnDecl(decl) => decl.body,
            other => panic!("expected fn, got {other:?}"),
        }
    }

    #[test]
    fn implicit_final_expression_counts() {
        assert!(block_produces_value(&body_of("fn f() -> Int { 1 + 2 }")));
    }

    #[test]
    fn explicit_return_counts() {
        assert!(block_produces_value(&body_of("fn f() -> Int { return 1 }")));
    }

    #[test]
    fn if_without_else_does_not_count() {
        assert!(!block_produces_value(&body_of(
            "fn f(x) -> Int { if x { return 1 } }"
        )));
    }

    #[test]
    fn if_with_both_branches_counts() {
        assert!(block_produces_value(&body_of(
            "fn f(x) -> Int { if x { return 1 } else { return 2 } }"
        )));
    }

    #[test]
    fn trailing_statement_after_if_counts() {
        assert!(block_produces_value(&body_of(
            "fn f(x) -> Int { if x { return 1 }\n0 }"
        )));
    }

    #[test]
    fn loop_does_not_count() {
        assert!(!block_produces_value(&body_of(
            "fn f(xs) -> Int { for x in xs { return x } }"
        )));
    }
}
