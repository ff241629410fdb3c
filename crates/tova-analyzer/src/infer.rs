//! The analysis walker: scope construction, symbol resolution, gradual
//! type inference and the per-construct checks.
//!
//! One pass per block with a hoisting prelude: function, type, component
//! and store names (plus variant constructors) are declared before the
//! statements are walked, so forward references resolve. Types are
//! inferred per expression; assignability mismatches warn by default and
//! error in strict mode. Hard errors (duplicates, immutable reassignment,
//! wrong-context forms) are errors in both modes.

use tova_common::diag::{Diagnostic, Stage};
use tova_common::span::Span;
use tova_parser::ast::*;

use crate::builtins::{builtin_signature, is_whitelisted_global};
use crate::exhaustiveness;
use crate::registry::{MethodSig, TypeRegistry};
use crate::returns::block_produces_value;
use crate::scope::{ScopeContext, ScopeId, ScopeTree, Symbol, SymbolKind};
use crate::ty::{is_assignable, Assignability, Type};

pub(crate) struct Analyzer {
    pub scopes: ScopeTree,
    pub registry: TypeRegistry,
    pub diags: Vec<Diagnostic>,
    pub(crate) strict: bool,
    /// Declared return types of enclosing functions; `None` = undeclared.
    pub(crate) fn_returns: Vec<Option<Type>>,
}

impl Analyzer {
    pub fn new(strict: bool, module_span: Span) -> Self {
        Self {
            scopes: ScopeTree::new(module_span),
            registry: TypeRegistry::new(),
            diags: Vec::new(),
            strict,
            fn_returns: Vec::new(),
        }
    }

    pub fn run(&mut self, program: &Program) {
        let root = self.scopes.root();
        self.walk_stmts(&program.stmts, root);
    }

    // ── Diagnostics ────────────────────────────────────────────────────

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.diags
            .push(Diagnostic::error(Stage::Analyze, message, span));
    }

    fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.diags
            .push(Diagnostic::warning(Stage::Analyze, message, span));
    }

    /// Type-level complaint: warning by default, error in strict mode.
    fn type_issue(&mut self, message: impl Into<String>, span: Span) {
        if self.strict {
            self.error(message, span);
        } else {
            self.warning(message, span);
        }
    }

    // ── Statement walking ──────────────────────────────────────────────

    fn walk_stmts(&mut self, stmts: &[Stmt], scope: ScopeId) {
        self.hoist(stmts, scope);
        for stmt in stmts {
            self.walk_stmt(stmt, scope);
        }
    }

    /// Declare forward-referencable names before walking statements.
    fn hoist(&mut self, stmts: &[Stmt], scope: ScopeId) {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::FnDecl(decl) => {
                    let ty = self.fn_type(decl);
                    self.define(
                        scope,
                        &decl.name,
                        SymbolKind::Function,
                        Some(ty),
                        false,
                        decl.span,
                    );
                }
                StmtKind::TypeDecl(decl) => self.hoist_type_decl(decl, scope),
                StmtKind::Component { name, .. } => {
                    self.define(scope, name, SymbolKind::Component, None, false, stmt.span);
                }
                StmtKind::Store { name, .. } => {
                    self.define(scope, name, SymbolKind::Store, None, false, stmt.span);
                }
                StmtKind::Background { name, .. } => {
                    self.define(scope, name, SymbolKind::Function, None, false, stmt.span);
                }
                StmtKind::TraitDecl { name, methods } => {
                    let sigs = methods
                        .iter()
                        .map(|m| MethodSig {
                            name: m.name.clone(),
                            params: m.params.iter().map(|p| p.name.clone()).collect(),
                            return_type: m.return_type.as_ref().map(|t| self.resolve_type(t)),
                        })
                        .collect();
                    self.registry.traits.insert(name.clone(), sigs);
                }
                StmtKind::Impl {
                    type_name, methods, ..
                } => {
                    let sigs: Vec<MethodSig> = methods
                        .iter()
                        .map(|m| MethodSig {
                            name: m.name.clone(),
                            params: m.params.iter().map(|p| p.name.clone()).collect(),
                            return_type: m.return_type.as_ref().map(|t| self.resolve_type(t)),
                        })
                        .collect();
                    self.registry
                        .impls
                        .entry(type_name.clone())
                        .or_default()
                        .extend(sigs);
                }
                _ => {}
            }
        }
    }

    fn hoist_type_decl(&mut self, decl: &TypeDecl, scope: ScopeId) {
        let ty = match &decl.body {
            TypeBody::Record(fields) => Type::Record {
                name: decl.name.clone(),
                fields: fields
                    .iter()
                    .map(|f| (f.name.clone(), self.resolve_type(&f.ty)))
                    .collect(),
            },
            TypeBody::Sum(variants) => Type::Adt {
                name: decl.name.clone(),
                type_params: decl.type_params.clone(),
                variants: variants
                    .iter()
                    .map(|v| {
                        let fields = v
                            .fields
                            .iter()
                            .enumerate()
                            .map(|(i, f)| {
                                let fname =
                                    f.name.clone().unwrap_or_else(|| format!("f{i}"));
                                (fname, self.resolve_type(&f.ty))
                            })
                            .collect();
                        (v.name.clone(), fields)
                    })
                    .collect(),
            },
        };
        self.registry.types.insert(decl.name.clone(), ty.clone());
        self.define(scope, &decl.name, SymbolKind::Type, Some(ty.clone()), false, decl.span);

        // Variant constructors hoist into the enclosing scope as
        // function-kind symbols.
        if let TypeBody::Sum(variants) = &decl.body {
            let result_ty = Type::Primitive(decl.name.clone());
            for v in variants {
                let ctor_ty = if v.fields.is_empty() {
                    result_ty.clone()
                } else {
                    Type::function(
                        v.fields.iter().map(|f| self.resolve_type(&f.ty)).collect(),
                        result_ty.clone(),
                    )
                };
                self.define(
                    scope,
                    &v.name,
                    SymbolKind::Variant,
                    Some(ctor_ty),
                    false,
                    v.span,
                );
            }
        }
    }

    fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        ty: Option<Type>,
        mutable: bool,
        span: Span,
    ) {
        let result = self.scopes.define(
            scope,
            Symbol {
                name: name.to_string(),
                kind,
                ty,
                mutable,
                decl_span: span,
            },
        );
        if result.is_err() {
            self.error(format!("Duplicate declaration of '{name}'"), span);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt, scope: ScopeId) {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                value,
                mutable,
            } => self.walk_assign(target, value, *mutable, scope, stmt.span),
            StmtKind::TupleAssign { names, values } => {
                if names.len() != values.len() {
                    self.type_issue(
                        format!(
                            "assignment count mismatch: {} names but {} values",
                            names.len(),
                            values.len()
                        ),
                        stmt.span,
                    );
                }
                let tys: Vec<Type> = values.iter().map(|v| self.infer_expr(v, scope)).collect();
                for (i, name) in names.iter().enumerate() {
                    let ty = tys.get(i).cloned().unwrap_or(Type::Unknown);
                    self.define(scope, name, SymbolKind::Variable, Some(ty), false, stmt.span);
                }
            }
            StmtKind::CompoundAssign { target, op, value } => {
                self.walk_compound_assign(target, *op, value, scope, stmt.span)
            }
            StmtKind::LetDestructure { pattern, value } => {
                let _ = self.infer_expr(value, scope);
                match pattern {
                    Destructure::Object(fields) => {
                        for field in fields {
                            if let Some(default) = &field.default {
                                let _ = self.infer_expr(default, scope);
                            }
                            let binding = field.alias.as_deref().unwrap_or(&field.key);
                            self.define(
                                scope,
                                binding,
                                SymbolKind::Variable,
                                Some(Type::Unknown),
                                false,
                                stmt.span,
                            );
                        }
                    }
                    Destructure::Array(elems) => {
                        for elem in elems {
                            if let ArrayDestructureElem::Binding(name) = elem {
                                self.define(
                                    scope,
                                    name,
                                    SymbolKind::Variable,
                                    Some(Type::Unknown),
                                    false,
                                    stmt.span,
                                );
                            }
                        }
                    }
                }
            }
            StmtKind::FnDecl(decl) => self.walk_fn(decl, scope),
            StmtKind::TypeDecl(_) | StmtKind::TraitDecl { .. } => {
                // Fully handled during hoisting.
            }
            StmtKind::Impl {
                type_name, methods, ..
            } => {
                if !self.registry.types.contains_key(type_name)
                    && self.scopes.lookup(scope, type_name).is_none()
                {
                    self.warning(
                        format!("impl for unknown type '{type_name}'"),
                        stmt.span,
                    );
                }
                for method in methods {
                    self.walk_method(method, type_name, scope);
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                elifs,
                else_branch,
            } => {
                let _ = self.infer_expr(cond, scope);
                self.walk_child_block(then_branch, scope, ScopeContext::Block);
                for (c, b) in elifs {
                    let _ = self.infer_expr(c, scope);
                    self.walk_child_block(b, scope, ScopeContext::Block);
                }
                if let Some(b) = else_branch {
                    self.walk_child_block(b, scope, ScopeContext::Block);
                }
            }
            StmtKind::For {
                vars,
                iter,
                body,
                else_branch,
            } => {
                let iter_ty = self.infer_expr(iter, scope);
                let loop_scope = self.scopes.push_scope(scope, ScopeContext::Loop, body.span);
                let elem_ty = match iter_ty {
                    Type::Array(elem) => *elem,
                    _ => Type::Unknown,
                };
                for (i, var) in vars.iter().enumerate() {
                    let ty = if i == 0 { elem_ty.clone() } else { Type::int() };
                    self.define(loop_scope, var, SymbolKind::Variable, Some(ty), false, body.span);
                }
                self.walk_stmts(&body.stmts, loop_scope);
                if let Some(b) = else_branch {
                    self.walk_child_block(b, scope, ScopeContext::Block);
                }
            }
            StmtKind::While { cond, body } => {
                let _ = self.infer_expr(cond, scope);
                self.walk_child_block(body, scope, ScopeContext::Loop);
            }
            StmtKind::Return(value) => {
                let value_ty = value.as_ref().map(|v| self.infer_expr(v, scope));
                if let Some(Some(declared)) = self.fn_returns.last().cloned() {
                    if let Some(value_ty) = value_ty {
                        self.check_assignable(&value_ty, &declared, "return value", stmt.span);
                    }
                }
            }
            StmtKind::Expr(expr) => {
                let _ = self.infer_expr(expr, scope);
            }

            StmtKind::Server { body, .. } => {
                let s = self.scopes.push_scope(scope, ScopeContext::Server, body.span);
                self.walk_stmts(&body.stmts, s);
            }
            StmtKind::Client { body, .. } => {
                let s = self.scopes.push_scope(scope, ScopeContext::Client, body.span);
                self.walk_stmts(&body.stmts, s);
            }
            StmtKind::Shared { body, .. } => {
                let s = self.scopes.push_scope(scope, ScopeContext::Shared, body.span);
                self.walk_stmts(&body.stmts, s);
            }
            StmtKind::Data { entries, .. } => {
                let s = self.scopes.push_scope(scope, ScopeContext::Data, stmt.span);
                self.walk_config_entries(entries, s);
            }
            StmtKind::DeployProfile { name, entries } => {
                self.check_deploy_profile(name, entries, stmt.span);
            }
            StmtKind::TestBlock { body, .. } => {
                self.walk_child_block(body, scope, ScopeContext::Function);
            }

            // ── Client forms ───────────────────────────────────────────
            StmtKind::State { name, value } => {
                self.require_client(scope, "state", stmt.span);
                let ty = self.infer_expr(value, scope);
                self.define(scope, name, SymbolKind::State, Some(ty), true, stmt.span);
            }
            StmtKind::Computed { name, value } => {
                self.require_client(scope, "computed", stmt.span);
                let ty = self.infer_expr(value, scope);
                self.define(scope, name, SymbolKind::Computed, Some(ty), false, stmt.span);
            }
            StmtKind::Effect { body } => {
                self.require_client(scope, "effect", stmt.span);
                self.walk_child_block(body, scope, ScopeContext::Block);
            }
            StmtKind::Component { params, body, .. } => {
                self.require_client(scope, "component", stmt.span);
                let s = self
                    .scopes
                    .push_scope(scope, ScopeContext::Component, body.span);
                for param in params {
                    let ty = param.ty.as_ref().map(|t| self.resolve_type(t));
                    self.define(s, &param.name, SymbolKind::Parameter, ty, false, param.span);
                }
                self.walk_stmts(&body.stmts, s);
            }
            StmtKind::Store { body, .. } => {
                self.require_client(scope, "store", stmt.span);
                let s = self.scopes.push_scope(scope, ScopeContext::Store, body.span);
                self.walk_stmts(&body.stmts, s);
            }
            StmtKind::Style { .. } => {
                self.require_client(scope, "style", stmt.span);
            }

            // ── Server forms ───────────────────────────────────────────
            StmtKind::Route { body, .. } => {
                self.require_server(scope, "route", stmt.span);
                self.walk_handler(body, scope, &["req"]);
            }
            StmtKind::Middleware { body, .. } => {
                self.require_server(scope, "middleware", stmt.span);
                self.walk_handler(body, scope, &["req", "next"]);
            }
            StmtKind::Model { name, entries } => {
                self.require_server(scope, "model", stmt.span);
                if self.registry.fields_of(name).is_none()
                    && self.scopes.lookup(scope, name).is_none()
                {
                    self.warning(
                        format!("model '{name}' has no matching type declaration"),
                        stmt.span,
                    );
                }
                let s = self.scopes.push_scope(scope, ScopeContext::Data, stmt.span);
                self.walk_config_entries(entries, s);
            }
            StmtKind::Db { entries } => {
                self.require_server(scope, "db", stmt.span);
                let s = self.scopes.push_scope(scope, ScopeContext::Data, stmt.span);
                self.walk_config_entries(entries, s);
            }
            StmtKind::Sse { body, .. } => {
                self.require_server(scope, "sse", stmt.span);
                self.walk_handler(body, scope, &["req", "send"]);
            }
            StmtKind::Ws { handlers, .. } => {
                self.require_server(scope, "ws", stmt.span);
                for handler in handlers {
                    let names: Vec<&str> = handler.params.iter().map(|s| s.as_str()).collect();
                    self.walk_handler(&handler.body, scope, &names);
                }
            }
            StmtKind::Auth { entries, .. } | StmtKind::Session { entries } => {
                self.require_server(scope, "auth", stmt.span);
                let s = self.scopes.push_scope(scope, ScopeContext::Data, stmt.span);
                self.walk_config_entries(entries, s);
            }
            StmtKind::Schedule { body, .. } => {
                self.require_server(scope, "schedule", stmt.span);
                self.walk_handler(body, scope, &[]);
            }
            StmtKind::RateLimit { entries }
            | StmtKind::Compression { entries }
            | StmtKind::Upload { entries }
            | StmtKind::Cors { entries } => {
                self.require_server(scope, "server config", stmt.span);
                let s = self.scopes.push_scope(scope, ScopeContext::Data, stmt.span);
                self.walk_config_entries(entries, s);
            }
            StmtKind::EnvDecl { name, ty, default } => {
                self.require_server(scope, "env", stmt.span);
                let declared = ty.as_ref().map(|t| self.resolve_type(t));
                if let Some(default) = default {
                    let default_ty = self.infer_expr(default, scope);
                    if let Some(declared) = &declared {
                        self.check_assignable(&default_ty, declared, "env default", stmt.span);
                    }
                }
                self.define(
                    scope,
                    name,
                    SymbolKind::Variable,
                    declared.or(Some(Type::string())),
                    false,
                    stmt.span,
                );
            }
            StmtKind::OnStart(body) | StmtKind::OnStop(body) => {
                self.require_server(scope, "lifecycle hook", stmt.span);
                self.walk_handler(body, scope, &[]);
            }
            StmtKind::OnError { param, body } => {
                self.require_server(scope, "on_error", stmt.span);
                self.walk_handler(body, scope, &[param.as_str()]);
            }
            StmtKind::Health { .. } | StmtKind::StaticDir { .. } => {
                self.require_server(scope, "server route", stmt.span);
            }
            StmtKind::Background { params, body, .. } => {
                self.require_server(scope, "background", stmt.span);
                let s = self
                    .scopes
                    .push_scope(scope, ScopeContext::Function, body.span);
                for param in params {
                    let ty = param.ty.as_ref().map(|t| self.resolve_type(t));
                    self.define(s, &param.name, SymbolKind::Parameter, ty, false, param.span);
                }
                self.fn_returns.push(None);
                self.walk_stmts(&body.stmts, s);
                self.fn_returns.pop();
            }
            StmtKind::Form(form) => {
                self.define(scope, &form.name, SymbolKind::Store, None, false, form.span);
                let s = self.scopes.push_scope(scope, ScopeContext::Form, form.span);
                self.walk_form_members(&form.members, s);
            }
            StmtKind::Error => {}
        }
    }

    fn walk_assign(
        &mut self,
        target: &Expr,
        value: &Expr,
        mutable: bool,
        scope: ScopeId,
        span: Span,
    ) {
        let value_ty = self.infer_expr(value, scope);
        match &target.kind {
            ExprKind::Ident(name) => {
                if mutable {
                    // `var` always declares; a duplicate in the same scope
                    // is a hard error.
                    let exists_here = self
                        .scopes
                        .lookup_with_scope(scope, name)
                        .is_some_and(|(s, _)| s == scope);
                    if exists_here {
                        self.error(format!("Duplicate declaration of '{name}'"), span);
                    } else {
                        self.define(scope, name, SymbolKind::Variable, Some(value_ty), true, span);
                    }
                    return;
                }
                match self.scopes.lookup_with_scope(scope, name) {
                    Some((_, existing)) => {
                        if !existing.mutable {
                            self.error(
                                format!("Cannot reassign immutable variable '{name}'"),
                                span,
                            );
                            return;
                        }
                        if let Some(declared) = existing.ty.clone() {
                            self.check_assignable(&value_ty, &declared, name, span);
                        }
                    }
                    None => {
                        self.define(scope, name, SymbolKind::Variable, Some(value_ty), false, span);
                    }
                }
            }
            ExprKind::Member { object, .. } | ExprKind::Index { object, .. } => {
                let _ = self.infer_expr(object, scope);
            }
            _ => self.error("invalid assignment target", target.span),
        }
    }

    fn walk_compound_assign(
        &mut self,
        target: &Expr,
        op: BinOp,
        value: &Expr,
        scope: ScopeId,
        span: Span,
    ) {
        let value_ty = self.infer_expr(value, scope);
        if let ExprKind::Ident(name) = &target.kind {
            match self.scopes.lookup(scope, name) {
                Some(existing) => {
                    if !existing.mutable {
                        self.error(
                            format!("Cannot reassign immutable variable '{name}'"),
                            span,
                        );
                        return;
                    }
                    let declared = existing.ty.clone();
                    if let Some(declared) = declared {
                        if matches!(op, BinOp::Add) {
                            // `+=` accepts both numeric and string targets.
                            if !declared.is_top()
                                && !declared.is_numeric()
                                && declared != Type::string()
                            {
                                self.type_issue(
                                    format!("'{}' expects numeric operands", op.source()),
                                    span,
                                );
                            }
                        } else if !declared.is_top() && !declared.is_numeric() {
                            self.type_issue(
                                format!("'{}' expects numeric operands", op.source()),
                                span,
                            );
                        } else if !value_ty.is_top() && !value_ty.is_numeric() {
                            self.type_issue(
                                format!("'{}' expects numeric operands", op.source()),
                                span,
                            );
                        }
                    }
                }
                None => {
                    self.warning(format!("Unresolved identifier '{name}'"), target.span);
                }
            }
        } else {
            let _ = self.infer_expr(target, scope);
        }
    }

    fn walk_fn(&mut self, decl: &FnDecl, scope: ScopeId) {
        let s = self
            .scopes
            .push_scope(scope, ScopeContext::Function, decl.body.span);
        for tp in &decl.type_params {
            self.define(
                s,
                tp,
                SymbolKind::Type,
                Some(Type::TypeVar(tp.clone())),
                false,
                decl.span,
            );
        }
        for param in &decl.params {
            if let Some(default) = &param.default {
                let _ = self.infer_expr(default, scope);
            }
            let ty = param.ty.as_ref().map(|t| self.resolve_type(t));
            self.define(s, &param.name, SymbolKind::Parameter, ty, false, param.span);
        }
        let declared_ret = decl.return_type.as_ref().map(|t| self.resolve_type(t));
        self.fn_returns.push(declared_ret.clone());
        self.walk_stmts(&decl.body.stmts, s);
        self.fn_returns.pop();

        if declared_ret.is_some() && !block_produces_value(&decl.body) {
            self.warning("not all code paths return a value", decl.span);
        }
    }

    fn walk_method(&mut self, decl: &FnDecl, type_name: &str, scope: ScopeId) {
        let s = self
            .scopes
            .push_scope(scope, ScopeContext::Function, decl.body.span);
        let self_ty = self
            .registry
            .types
            .get(type_name)
            .cloned()
            .unwrap_or(Type::Primitive(type_name.to_string()));
        self.define(s, "self", SymbolKind::Parameter, Some(self_ty), false, decl.span);
        for param in &decl.params {
            if param.name == "self" {
                continue;
            }
            let ty = param.ty.as_ref().map(|t| self.resolve_type(t));
            self.define(s, &param.name, SymbolKind::Parameter, ty, false, param.span);
        }
        self.fn_returns
            .push(decl.return_type.as_ref().map(|t| self.resolve_type(t)));
        self.walk_stmts(&decl.body.stmts, s);
        self.fn_returns.pop();
    }

    fn walk_child_block(&mut self, block: &Block, parent: ScopeId, context: ScopeContext) {
        let s = self.scopes.push_scope(parent, context, block.span);
        self.walk_stmts(&block.stmts, s);
    }

    /// A server handler body with implicit parameters.
    fn walk_handler(&mut self, body: &Block, parent: ScopeId, params: &[&str]) {
        let s = self
            .scopes
            .push_scope(parent, ScopeContext::Function, body.span);
        for param in params {
            self.define(s, param, SymbolKind::Parameter, None, false, body.span);
        }
        self.fn_returns.push(None);
        self.walk_stmts(&body.stmts, s);
        self.fn_returns.pop();
    }

    fn walk_config_entries(&mut self, entries: &[ConfigEntry], scope: ScopeId) {
        for entry in entries {
            match &entry.value {
                ConfigValue::Expr(expr) => {
                    let _ = self.infer_expr(expr, scope);
                }
                ConfigValue::Block(nested) => self.walk_config_entries(nested, scope),
            }
        }
    }

    fn walk_form_members(&mut self, members: &[FormMember], scope: ScopeId) {
        for member in members {
            match member {
                FormMember::Field { rules, .. } => {
                    for rule in rules {
                        if let ConfigValue::Expr(expr) = &rule.value {
                            let _ = self.infer_expr(expr, scope);
                        }
                    }
                }
                FormMember::Group { members, .. } | FormMember::Array { members, .. } => {
                    self.walk_form_members(members, scope);
                }
                FormMember::Steps(_) => {}
                FormMember::OnSubmit(body) => {
                    self.walk_handler(body, scope, &["values"]);
                }
            }
        }
    }

    fn check_deploy_profile(&mut self, name: &str, entries: &[ConfigEntry], span: Span) {
        for required in ["server", "domain"] {
            if !entries.iter().any(|e| e.key == required) {
                self.error(
                    format!("deploy profile '{name}' is missing required key '{required}'"),
                    span,
                );
            }
        }
    }

    // ── Context requirements ───────────────────────────────────────────

    fn require_client(&mut self, scope: ScopeId, what: &str, span: Span) {
        if !self.scopes.in_context(scope, ScopeContext::Client) {
            self.error(format!("'{what}' is only valid inside a client block"), span);
        }
    }

    fn require_server(&mut self, scope: ScopeId, what: &str, span: Span) {
        if !self.scopes.in_context(scope, ScopeContext::Server) {
            self.error(format!("'{what}' is only valid inside a server block"), span);
        }
    }

    // ── Types ──────────────────────────────────────────────────────────

    /// Resolve a surface type annotation to a `Type`.
    fn resolve_type(&self, te: &TypeExpr) -> Type {
        match &te.kind {
            TypeExprKind::Name(name) => match name.as_str() {
                "Nil" => Type::Nil,
                "Any" => Type::Any,
                "Unknown" => Type::Unknown,
                _ => Type::Primitive(name.clone()),
            },
            TypeExprKind::Generic { base, args } => Type::Generic {
                base: base.clone(),
                args: args.iter().map(|a| self.resolve_type(a)).collect(),
            },
            TypeExprKind::Array(elem) => Type::Array(Box::new(self.resolve_type(elem))),
            TypeExprKind::Function { params, ret } => Type::Function {
                params: params.iter().map(|p| self.resolve_type(p)).collect(),
                ret: Box::new(self.resolve_type(ret)),
            },
            TypeExprKind::Tuple(elems) => {
                Type::Tuple(elems.iter().map(|e| self.resolve_type(e)).collect())
            }
        }
    }

    fn fn_type(&self, decl: &FnDecl) -> Type {
        let params = decl
            .params
            .iter()
            .map(|p| {
                p.ty.as_ref()
                    .map(|t| self.resolve_type(t))
                    .unwrap_or(Type::Unknown)
            })
            .collect();
        let ret = decl
            .return_type
            .as_ref()
            .map(|t| self.resolve_type(t))
            .unwrap_or(Type::Unknown);
        Type::function(params, ret)
    }

    fn check_assignable(&mut self, src: &Type, dst: &Type, what: &str, span: Span) {
        match is_assignable(src, dst) {
            Assignability::Assignable => {}
            Assignability::Narrowing => {
                if self.strict {
                    self.warning(
                        format!("Potential data loss: {src} narrows to {dst} in {what}"),
                        span,
                    );
                }
            }
            Assignability::NotAssignable => {
                self.type_issue(format!("Type mismatch: {src} is not assignable to {dst}"), span);
            }
        }
    }

    // ── Expression inference ───────────────────────────────────────────

    pub(crate) fn infer_expr(&mut self, expr: &Expr, scope: ScopeId) -> Type {
        match &expr.kind {
            ExprKind::Int(_) => Type::int(),
            ExprKind::Float(_) => Type::float(),
            ExprKind::Str(_) => Type::string(),
            ExprKind::Bool(_) => Type::bool(),
            ExprKind::Nil => Type::Nil,
            ExprKind::Template(chunks) => {
                for chunk in chunks {
                    if let TemplateChunk::Expr(e) = chunk {
                        let _ = self.infer_expr(e, scope);
                    }
                }
                Type::string()
            }
            ExprKind::Ident(name) => self.infer_ident(name, scope, expr.span),
            ExprKind::PipeTarget => Type::Unknown,
            ExprKind::Binary { op, lhs, rhs } => self.infer_binary(*op, lhs, rhs, scope, expr.span),
            ExprKind::Logical { lhs, rhs, .. } => {
                let _ = self.infer_expr(lhs, scope);
                let _ = self.infer_expr(rhs, scope);
                Type::bool()
            }
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.infer_expr(operand, scope);
                match op {
                    UnOp::Neg => {
                        if !operand_ty.is_top() && !operand_ty.is_numeric() {
                            self.type_issue("'-' expects numeric operands", expr.span);
                        }
                        if operand_ty == Type::float() {
                            Type::float()
                        } else {
                            Type::int()
                        }
                    }
                    UnOp::Not => Type::bool(),
                }
            }
            ExprKind::Cmp { lhs, rhs, .. } => {
                let _ = self.infer_expr(lhs, scope);
                let _ = self.infer_expr(rhs, scope);
                Type::bool()
            }
            ExprKind::ChainedCmp { operands, .. } => {
                for operand in operands {
                    let _ = self.infer_expr(operand, scope);
                }
                Type::bool()
            }
            ExprKind::Membership { item, collection, .. } => {
                let _ = self.infer_expr(item, scope);
                let _ = self.infer_expr(collection, scope);
                Type::bool()
            }
            ExprKind::Range { start, end, .. } => {
                let _ = self.infer_expr(start, scope);
                let _ = self.infer_expr(end, scope);
                Type::Array(Box::new(Type::int()))
            }
            ExprKind::Call { callee, args } => self.infer_call(callee, args, scope, expr.span),
            ExprKind::Member { object, name, .. } => {
                let object_ty = self.infer_expr(object, scope);
                match object_ty {
                    Type::Record { fields, .. } => fields
                        .iter()
                        .find(|(f, _)| f == name)
                        .map(|(_, t)| t.clone())
                        .unwrap_or(Type::Unknown),
                    _ => Type::Unknown,
                }
            }
            ExprKind::Index { object, index } => {
                let object_ty = self.infer_expr(object, scope);
                let _ = self.infer_expr(index, scope);
                match object_ty {
                    Type::Array(elem) => *elem,
                    Type::Primitive(name) if name == "String" => Type::string(),
                    _ => Type::Unknown,
                }
            }
            ExprKind::Slice {
                object,
                start,
                end,
                step,
            } => {
                let object_ty = self.infer_expr(object, scope);
                for part in [start, end, step].into_iter().flatten() {
                    let _ = self.infer_expr(part, scope);
                }
                match object_ty {
                    t @ Type::Array(_) => t,
                    Type::Primitive(name) if name == "String" => Type::string(),
                    _ => Type::Unknown,
                }
            }
            ExprKind::Object(entries) => {
                for entry in entries {
                    match entry {
                        ObjectEntry::Pair { value, .. } | ObjectEntry::Spread(value) => {
                            let _ = self.infer_expr(value, scope);
                        }
                        ObjectEntry::Shorthand(name) => {
                            let _ = self.infer_ident(name, scope, expr.span);
                        }
                    }
                }
                Type::Unknown
            }
            ExprKind::Array(elems) => {
                let mut elem_ty = Type::Any;
                for (i, elem) in elems.iter().enumerate() {
                    let t = self.infer_expr(elem, scope);
                    if i == 0 {
                        elem_ty = t;
                    }
                }
                Type::Array(Box::new(elem_ty))
            }
            ExprKind::Tuple(elems) => {
                Type::Tuple(elems.iter().map(|e| self.infer_expr(e, scope)).collect())
            }
            ExprKind::Spread(inner) => self.infer_expr(inner, scope),
            ExprKind::ListComp {
                element,
                vars,
                iter,
                filter,
            } => {
                let iter_ty = self.infer_expr(iter, scope);
                let s = self.scopes.push_scope(scope, ScopeContext::Loop, expr.span);
                let elem_ty = match iter_ty {
                    Type::Array(elem) => *elem,
                    _ => Type::Unknown,
                };
                for (i, var) in vars.iter().enumerate() {
                    let ty = if i == 0 { elem_ty.clone() } else { Type::int() };
                    self.define(s, var, SymbolKind::Variable, Some(ty), false, expr.span);
                }
                if let Some(filter) = filter {
                    let _ = self.infer_expr(filter, s);
                }
                let element_ty = self.infer_expr(element, s);
                Type::Array(Box::new(element_ty))
            }
            ExprKind::DictComp {
                key,
                value,
                vars,
                iter,
                filter,
            } => {
                let _ = self.infer_expr(iter, scope);
                let s = self.scopes.push_scope(scope, ScopeContext::Loop, expr.span);
                for var in vars {
                    self.define(s, var, SymbolKind::Variable, Some(Type::Unknown), false, expr.span);
                }
                if let Some(filter) = filter {
                    let _ = self.infer_expr(filter, s);
                }
                let _ = self.infer_expr(key, s);
                let _ = self.infer_expr(value, s);
                Type::Unknown
            }
            ExprKind::Lambda { params, body } => {
                let s = self
                    .scopes
                    .push_scope(scope, ScopeContext::Function, expr.span);
                for param in params {
                    let ty = param.ty.as_ref().map(|t| self.resolve_type(t));
                    self.define(s, &param.name, SymbolKind::Parameter, ty, false, param.span);
                }
                self.fn_returns.push(None);
                let ret = match body {
                    LambdaBody::Expr(e) => self.infer_expr(e, s),
                    LambdaBody::Block(b) => {
                        self.walk_stmts(&b.stmts, s);
                        Type::Unknown
                    }
                };
                self.fn_returns.pop();
                let param_tys = params
                    .iter()
                    .map(|p| {
                        p.ty.as_ref()
                            .map(|t| self.resolve_type(t))
                            .unwrap_or(Type::Unknown)
                    })
                    .collect();
                Type::function(param_tys, ret)
            }
            ExprKind::Match { subject, arms } => {
                let subject_ty = self.infer_expr(subject, scope);
                let diags = exhaustiveness::check_match(
                    Some(&subject_ty),
                    arms,
                    &self.registry,
                    expr.span,
                );
                self.diags.extend(diags);

                let mut result = Type::Unknown;
                for (i, arm) in arms.iter().enumerate() {
                    let s = self.scopes.push_scope(scope, ScopeContext::Match, arm.span);
                    self.bind_pattern(&arm.pattern, s);
                    if let Some(guard) = &arm.guard {
                        let _ = self.infer_expr(guard, s);
                    }
                    let arm_ty = match &arm.body {
                        ArmBody::Expr(e) => self.infer_expr(e, s),
                        ArmBody::Block(b) => {
                            self.walk_stmts(&b.stmts, s);
                            Type::Unknown
                        }
                    };
                    if i == 0 {
                        result = arm_ty;
                    }
                }
                result
            }
            ExprKind::If {
                cond,
                then_branch,
                elifs,
                else_branch,
            } => {
                let _ = self.infer_expr(cond, scope);
                self.walk_child_block(then_branch, scope, ScopeContext::Block);
                for (c, b) in elifs {
                    let _ = self.infer_expr(c, scope);
                    self.walk_child_block(b, scope, ScopeContext::Block);
                }
                if let Some(b) = else_branch {
                    self.walk_child_block(b, scope, ScopeContext::Block);
                }
                Type::Unknown
            }
            ExprKind::Pipe { lhs, rhs } => {
                let _ = self.infer_expr(lhs, scope);
                let rhs_ty = self.infer_expr(rhs, scope);
                match rhs_ty {
                    Type::Function { ret, .. } => *ret,
                    _ => Type::Unknown,
                }
            }
            ExprKind::Propagate(inner) => {
                let inner_ty = self.infer_expr(inner, scope);
                match inner_ty {
                    Type::Generic { base, mut args }
                        if (base == "Result" || base == "Option") && !args.is_empty() =>
                    {
                        args.swap_remove(0)
                    }
                    _ => Type::Unknown,
                }
            }
            ExprKind::Jsx(node) => {
                self.walk_jsx(node, scope);
                Type::Primitive("Element".into())
            }
            ExprKind::Error => Type::Unknown,
        }
    }

    fn infer_ident(&mut self, name: &str, scope: ScopeId, span: Span) -> Type {
        if let Some(symbol) = self.scopes.lookup(scope, name) {
            return symbol.ty.clone().unwrap_or(Type::Unknown);
        }
        match name {
            "None" => return Type::option(Type::Unknown),
            "Some" | "Ok" | "Err" => return Type::Unknown,
            _ => {}
        }
        if builtin_signature(name).is_some() || is_whitelisted_global(name) {
            return Type::Unknown;
        }
        self.warning(format!("Unresolved identifier '{name}'"), span);
        Type::Unknown
    }

    fn infer_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        scope: ScopeId,
        span: Span,
    ) -> Type {
        let lt = self.infer_expr(lhs, scope);
        let rt = self.infer_expr(rhs, scope);
        match op {
            BinOp::Eq | BinOp::NotEq => Type::bool(),
            BinOp::NullCoalesce => {
                if lt.is_top() {
                    rt
                } else {
                    lt
                }
            }
            BinOp::Concat => {
                let stringish =
                    |t: &Type| t.is_top() || *t == Type::string();
                if !stringish(&lt) || !stringish(&rt) {
                    self.type_issue(format!("Type mismatch: {lt} ++ {rt}"), span);
                }
                Type::string()
            }
            BinOp::Add => {
                if lt == Type::string() && rt == Type::string() {
                    return Type::string();
                }
                self.numeric_binary(op, &lt, &rt, span)
            }
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem | BinOp::Pow => {
                // String repetition `"ab" * 3` is a supported rewrite.
                if op == BinOp::Mul && lt == Type::string() && (rt.is_top() || rt == Type::int()) {
                    return Type::string();
                }
                self.numeric_binary(op, &lt, &rt, span)
            }
        }
    }

    fn numeric_binary(&mut self, op: BinOp, lt: &Type, rt: &Type, span: Span) -> Type {
        let numericish = |t: &Type| t.is_top() || t.is_numeric() || matches!(t, Type::TypeVar(_));
        if !numericish(lt) || !numericish(rt) {
            if lt.name() == rt.name() {
                self.type_issue(format!("'{}' expects numeric operands", op.source()), span);
            } else {
                self.type_issue(
                    format!("Type mismatch: {lt} {} {rt}", op.source()),
                    span,
                );
            }
            return Type::Unknown;
        }
        if *lt == Type::float() || *rt == Type::float() {
            Type::float()
        } else if lt.is_top() || rt.is_top() {
            Type::Unknown
        } else {
            Type::int()
        }
    }

    fn infer_call(
        &mut self,
        callee: &Expr,
        args: &[Arg],
        scope: ScopeId,
        span: Span,
    ) -> Type {
        let arg_tys: Vec<Type> = args
            .iter()
            .map(|a| self.infer_expr(&a.value, scope))
            .collect();

        if let ExprKind::Ident(name) = &callee.kind {
            // Result/Option constructors are typed structurally.
            match name.as_str() {
                "Ok" => {
                    let inner = arg_tys.first().cloned().unwrap_or(Type::Unknown);
                    return Type::result(inner, Type::Unknown);
                }
                "Err" => {
                    let inner = arg_tys.first().cloned().unwrap_or(Type::Unknown);
                    return Type::result(Type::Unknown, inner);
                }
                "Some" => {
                    let inner = arg_tys.first().cloned().unwrap_or(Type::Unknown);
                    return Type::option(inner);
                }
                _ => {}
            }

            let defined = self.scopes.lookup(scope, name).is_some();
            if defined {
                let symbol_ty = self.scopes.lookup(scope, name).and_then(|s| s.ty.clone());
                if let Some(Type::Function { params, ret }) = symbol_ty {
                    self.check_arg_count(name, args.len(), params.len(), params.len(), span);
                    let positional = args.iter().all(|a| a.name.is_none());
                    if positional {
                        for (arg_ty, param_ty) in arg_tys.iter().zip(&params) {
                            self.check_assignable(arg_ty, param_ty, name, span);
                        }
                    }
                    return *ret;
                }
                return Type::Unknown;
            }

            if let Some((min, max, ret)) = builtin_signature(name) {
                self.check_arg_count(name, args.len(), min, max, span);
                return ret;
            }

            if !is_whitelisted_global(name) {
                self.warning(format!("Unresolved identifier '{name}'"), callee.span);
            }
            return Type::Unknown;
        }

        // `Type.new(...)` constructs a record instance.
        if let ExprKind::Member { object, name, .. } = &callee.kind {
            if name == "new" {
                if let ExprKind::Ident(type_name) = &object.kind {
                    if let Some(ty) = self.registry.types.get(type_name).cloned() {
                        return ty;
                    }
                }
            }
        }

        let _ = self.infer_expr(callee, scope);
        Type::Unknown
    }

    fn check_arg_count(&mut self, name: &str, given: usize, min: usize, max: usize, span: Span) {
        if given < min {
            self.type_issue(format!("too few arguments to '{name}'"), span);
        } else if max != usize::MAX && given > max {
            self.type_issue(format!("too many arguments to '{name}'"), span);
        }
    }

    /// Declare pattern bindings in a match-arm scope.
    fn bind_pattern(&mut self, pattern: &Pattern, scope: ScopeId) {
        match &pattern.kind {
            PatternKind::Binding(name) => {
                self.define(
                    scope,
                    name,
                    SymbolKind::Variable,
                    Some(Type::Unknown),
                    false,
                    pattern.span,
                );
            }
            PatternKind::Variant { fields, .. } => {
                for field in fields {
                    self.bind_pattern(field, scope);
                }
            }
            PatternKind::Array(elems) => {
                for elem in elems {
                    self.bind_pattern(elem, scope);
                }
            }
            PatternKind::Or(alts) => {
                // Alternatives bind the same names; declare from the first.
                if let Some(first) = alts.first() {
                    self.bind_pattern(first, scope);
                }
            }
            _ => {}
        }
    }

    // ── JSX ────────────────────────────────────────────────────────────

    fn walk_jsx(&mut self, node: &JsxNode, scope: ScopeId) {
        let children = match &node.kind {
            JsxNodeKind::Element { attrs, children, .. } => {
                for attr in attrs {
                    match &attr.value {
                        JsxAttrValue::Expr(e) => {
                            let _ = self.infer_expr(e, scope);
                        }
                        JsxAttrValue::Template(chunks) => {
                            for chunk in chunks {
                                if let TemplateChunk::Expr(e) = chunk {
                                    let _ = self.infer_expr(e, scope);
                                }
                            }
                        }
                        _ => {}
                    }
                }
                children
            }
            JsxNodeKind::Fragment { children } => children,
        };
        for child in children {
            self.walk_jsx_child(child, scope);
        }
    }

    fn walk_jsx_child(&mut self, child: &JsxChild, scope: ScopeId) {
        match child {
            JsxChild::Element(node) => self.walk_jsx(node, scope),
            JsxChild::Text(_) => {}
            JsxChild::Expr(expr) => {
                let _ = self.infer_expr(expr, scope);
            }
            JsxChild::If {
                cond,
                then_children,
                elifs,
                else_children,
            } => {
                let _ = self.infer_expr(cond, scope);
                for c in then_children {
                    self.walk_jsx_child(c, scope);
                }
                for (e, children) in elifs {
                    let _ = self.infer_expr(e, scope);
                    for c in children {
                        self.walk_jsx_child(c, scope);
                    }
                }
                if let Some(children) = else_children {
                    for c in children {
                        self.walk_jsx_child(c, scope);
                    }
                }
            }
            JsxChild::For {
                vars,
                iter,
                key,
                children,
            } => {
                let iter_ty = self.infer_expr(iter, scope);
                let s = self.scopes.push_scope(scope, ScopeContext::Loop, iter.span);
                let elem_ty = match iter_ty {
                    Type::Array(elem) => *elem,
                    _ => Type::Unknown,
                };
                for (i, var) in vars.iter().enumerate() {
                    let ty = if i == 0 { elem_ty.clone() } else { Type::int() };
                    self.define(s, var, SymbolKind::Variable, Some(ty), false, iter.span);
                }
                if let Some(key) = key {
                    let _ = self.infer_expr(key, s);
                }
                for c in children {
                    self.walk_jsx_child(c, s);
                }
            }
        }
    }
}
