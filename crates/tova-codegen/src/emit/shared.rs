//! Shared-module emission: top-level functions, type declarations and
//! constants that every bundle inlines, plus `data` blocks as plain
//! constant objects.

use tova_parser::ast::*;

use super::{js_string, Emitter};

/// Emit shared statements into the current emitter.
pub fn emit_shared(e: &mut Emitter, stmts: &[&Stmt]) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Data { name, entries } => {
                let obj = data_object_js(e, entries);
                e.declare(name);
                e.line(&format!("const {name} = {obj};"));
            }
            _ => e.stmt(stmt),
        }
    }
}

/// Exportable names declared by the shared statements (functions, record
/// classes, variant constructors, data blocks).
pub fn exported_names(stmts: &[&Stmt]) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::FnDecl(decl) => names.push(decl.name.clone()),
            StmtKind::TypeDecl(decl) => match &decl.body {
                TypeBody::Record(_) => names.push(decl.name.clone()),
                TypeBody::Sum(variants) => {
                    names.extend(variants.iter().map(|v| v.name.clone()));
                }
            },
            StmtKind::Data { name, .. } => names.push(name.clone()),
            StmtKind::Assign {
                target: Expr { kind: ExprKind::Ident(name), .. },
                ..
            } => names.push(name.clone()),
            _ => {}
        }
    }
    names
}

/// A `data` block is a nested constant object; values may be arbitrary
/// expressions.
fn data_object_js(e: &mut Emitter, entries: &[ConfigEntry]) -> String {
    let parts: Vec<String> = entries
        .iter()
        .map(|entry| {
            let key = if entry.key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                entry.key.clone()
            } else {
                js_string(&entry.key)
            };
            match &entry.value {
                ConfigValue::Expr(expr) => format!("{key}: {}", e.expr(expr)),
                ConfigValue::Block(nested) => {
                    format!("{key}: {}", data_object_js(e, nested))
                }
            }
        })
        .collect();
    format!("{{ {} }}", parts.join(", "))
}
