//! The base JavaScript emitter: expressions and statements shared by
//! every target.
//!
//! One method per AST node kind. Every binary expression is parenthesized
//! in the output, so operator precedence never leaks. A helper registry
//! records which runtime helpers the emitted code references; output
//! assembly includes exactly those. Fresh-name counters (`__cmp_N`,
//! `__entered_N`, `__r_N`) are per-emitter, never process-wide, so
//! parallel compilations cannot collide.

pub mod client;
pub mod deploy;
pub mod form;
pub mod helpers;
pub mod server;
pub mod shared;
pub mod testgen;

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use tova_analyzer::registry::TypeRegistry;
use tova_parser::ast::*;

/// Reactive names in scope while emitting a client component or store.
#[derive(Default, Clone)]
pub struct ReactiveEnv {
    /// `state` names: read as `name()`, written as `setName(v)`.
    pub signals: FxHashSet<String>,
    /// `computed` names: read as `name()`.
    pub computeds: FxHashSet<String>,
    /// Component props: read as `name()` accessor calls.
    pub props: FxHashSet<String>,
}

impl ReactiveEnv {
    pub fn reads_as_call(&self, name: &str) -> bool {
        self.signals.contains(name) || self.computeds.contains(name) || self.props.contains(name)
    }
}

pub struct Emitter<'a> {
    out: String,
    indent: usize,
    /// Names declared with const/let in each open JS scope.
    declared: Vec<FxHashSet<String>>,
    /// Referenced runtime helpers.
    pub used_helpers: FxHashSet<&'static str>,
    /// Hoisted temporaries (`__cmp_1`, ...) declared at bundle top.
    pub temps: BTreeSet<String>,
    cmp_counter: u32,
    entered_counter: u32,
    result_counter: u32,
    pub registry: &'a TypeRegistry,
    pub reactive: Option<ReactiveEnv>,
    /// Scoped-CSS class for the component being emitted, if any.
    pub scope: Option<String>,
}

impl<'a> Emitter<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            out: String::new(),
            indent: 0,
            declared: vec![FxHashSet::default()],
            used_helpers: FxHashSet::default(),
            temps: BTreeSet::new(),
            cmp_counter: 0,
            entered_counter: 0,
            result_counter: 0,
            registry,
            reactive: None,
            scope: None,
        }
    }

    // ── Output primitives ──────────────────────────────────────────────

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    pub fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    /// Take the accumulated output, leaving the emitter reusable.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    pub fn mark(&mut self, helper: &'static str) {
        self.used_helpers.insert(helper);
    }

    // ── JS scope tracking ──────────────────────────────────────────────

    pub fn enter_js_scope(&mut self) {
        self.declared.push(FxHashSet::default());
    }

    pub fn exit_js_scope(&mut self) {
        self.declared.pop();
    }

    fn is_declared(&self, name: &str) -> bool {
        self.declared.iter().any(|s| s.contains(name))
    }

    pub fn declare(&mut self, name: &str) {
        self.declared
            .last_mut()
            .expect("at least one JS scope")
            .insert(name.to_string());
    }

    fn fresh_cmp(&mut self) -> String {
        self.cmp_counter += 1;
        let name = format!("__cmp_{}", self.cmp_counter);
        self.temps.insert(name.clone());
        name
    }

    fn fresh_entered(&mut self) -> String {
        self.entered_counter += 1;
        format!("__entered_{}", self.entered_counter)
    }

    fn fresh_result(&mut self) -> String {
        self.result_counter += 1;
        format!("__r_{}", self.result_counter)
    }

    // ── Statements ─────────────────────────────────────────────────────

    pub fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                value,
                mutable,
            } => self.emit_assign(target, value, *mutable),
            StmtKind::TupleAssign { names, values } => {
                let rhs = values
                    .iter()
                    .map(|v| self.expr(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                let lhs = names.join(", ");
                for name in names {
                    self.declare(name);
                }
                self.line(&format!("const [{lhs}] = [{rhs}];"));
            }
            StmtKind::CompoundAssign { target, op, value } => {
                self.emit_compound_assign(target, *op, value)
            }
            StmtKind::LetDestructure { pattern, value } => {
                let rhs = self.expr(value);
                match pattern {
                    Destructure::Object(fields) => {
                        let parts: Vec<String> = fields
                            .iter()
                            .map(|f| {
                                let mut part = f.key.clone();
                                if let Some(alias) = &f.alias {
                                    part = format!("{}: {alias}", f.key);
                                }
                                if let Some(default) = &f.default {
                                    let d = self.expr(default);
                                    part = format!("{part} = {d}");
                                }
                                self.declare(f.alias.as_deref().unwrap_or(&f.key));
                                part
                            })
                            .collect();
                        self.line(&format!("const {{ {} }} = {rhs};", parts.join(", ")));
                    }
                    Destructure::Array(elems) => {
                        let parts: Vec<&str> = elems
                            .iter()
                            .map(|e| match e {
                                ArrayDestructureElem::Binding(name) => {
                                    name.as_str()
                                }
                                ArrayDestructureElem::Wildcard => "",
                            })
                            .collect();
                        for e in elems {
                            if let ArrayDestructureElem::Binding(name) = e {
                                self.declare(name);
                            }
                        }
                        self.line(&format!("const [{}] = {rhs};", parts.join(", ")));
                    }
                }
            }
            StmtKind::FnDecl(decl) => self.emit_fn_decl(decl),
            StmtKind::TypeDecl(decl) => self.emit_type_decl(decl),
            StmtKind::Impl {
                type_name, methods, ..
            } => {
                for method in methods {
                    self.emit_method(type_name, method);
                }
            }
            StmtKind::TraitDecl { .. } => {
                // Traits are a checking construct; nothing to emit.
            }
            StmtKind::If {
                cond,
                then_branch,
                elifs,
                else_branch,
            } => self.emit_if_stmt(cond, then_branch, elifs, else_branch.as_ref(), false),
            StmtKind::For {
                vars,
                iter,
                body,
                else_branch,
            } => self.emit_for(vars, iter, body, else_branch.as_ref()),
            StmtKind::While { cond, body } => {
                let c = self.expr(cond);
                self.line(&format!("while ({c}) {{"));
                self.emit_plain_block(body);
                self.line("}");
            }
            StmtKind::Return(value) => match value {
                Some(v) => {
                    let e = self.expr(v);
                    self.line(&format!("return {e};"));
                }
                None => self.line("return;"),
            },
            StmtKind::Expr(expr) => {
                let e = self.expr(expr);
                self.line(&format!("{e};"));
            }
            // Blocks and scoped forms are emitted by their target
            // emitters; reaching one here is a no-op.
            _ => {}
        }
    }

    fn emit_assign(&mut self, target: &Expr, value: &Expr, mutable: bool) {
        match &target.kind {
            ExprKind::Ident(name) => {
                // Writes to signals become setter calls inside components.
                let is_signal = self
                    .reactive
                    .as_ref()
                    .is_some_and(|env| env.signals.contains(name));
                if is_signal {
                    let v = self.expr(value);
                    self.line(&format!("{}({v});", setter_name(name)));
                    return;
                }
                if self.is_declared(name) {
                    if let ExprKind::If {
                        cond,
                        then_branch,
                        elifs,
                        else_branch,
                    } = &value.kind
                    {
                        if !if_expr_is_simple(then_branch, elifs, else_branch.as_ref()) {
                            let tmp = self.emit_if_into_temp(
                                cond,
                                then_branch,
                                elifs,
                                else_branch.as_ref(),
                            );
                            self.line(&format!("{name} = {tmp};"));
                            return;
                        }
                    }
                    let v = self.expr(value);
                    self.line(&format!("{name} = {v};"));
                } else {
                    self.declare(name);
                    let kw = if mutable { "let" } else { "const" };
                    if let ExprKind::If {
                        cond,
                        then_branch,
                        elifs,
                        else_branch,
                    } = &value.kind
                    {
                        if !if_expr_is_simple(then_branch, elifs, else_branch.as_ref()) {
                            let tmp = self.emit_if_into_temp(
                                cond,
                                then_branch,
                                elifs,
                                else_branch.as_ref(),
                            );
                            self.line(&format!("{kw} {name} = {tmp};"));
                            return;
                        }
                    }
                    let v = self.expr(value);
                    self.line(&format!("{kw} {name} = {v};"));
                }
            }
            _ => {
                let t = self.expr(target);
                let v = self.expr(value);
                self.line(&format!("{t} = {v};"));
            }
        }
    }

    fn emit_compound_assign(&mut self, target: &Expr, op: BinOp, value: &Expr) {
        if let ExprKind::Ident(name) = &target.kind {
            let is_signal = self
                .reactive
                .as_ref()
                .is_some_and(|env| env.signals.contains(name));
            if is_signal {
                let v = self.expr(value);
                self.line(&format!(
                    "{}(({}() {} {v}));",
                    setter_name(name),
                    name,
                    op.js()
                ));
                return;
            }
        }
        let t = self.expr(target);
        let v = self.expr(value);
        let js_op = match op {
            BinOp::Add => "+=",
            BinOp::Sub => "-=",
            BinOp::Mul => "*=",
            BinOp::Div => "/=",
            _ => "%=",
        };
        self.line(&format!("{t} {js_op} {v};"));
    }

    pub fn emit_fn_decl(&mut self, decl: &FnDecl) {
        self.declare(&decl.name);
        let params = self.params_list(&decl.params);
        self.line(&format!("function {}({params}) {{", decl.name));
        self.emit_fn_body(&decl.body);
        self.line("}");
    }

    fn emit_method(&mut self, type_name: &str, decl: &FnDecl) {
        let params: Vec<&Param> = decl.params.iter().filter(|p| p.name != "self").collect();
        let params_js = params
            .iter()
            .map(|p| self.param_js(p))
            .collect::<Vec<_>>()
            .join(", ");
        self.line(&format!(
            "{type_name}.prototype.{} = function ({params_js}) {{",
            decl.name
        ));
        self.indented(|e| e.line("const self = this;"));
        self.emit_fn_body(&decl.body);
        self.line("};");
    }

    pub fn params_list(&mut self, params: &[Param]) -> String {
        params
            .iter()
            .map(|p| self.param_js(p))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn param_js(&mut self, p: &Param) -> String {
        match &p.default {
            Some(default) => {
                let d = self.expr(default);
                format!("{} = {d}", p.name)
            }
            None => p.name.clone(),
        }
    }

    /// Emit a function body: fresh JS scope, parameters declared,
    /// implicit return of the final expression, and the propagate
    /// wrapper when a `?` occurs in the direct body.
    pub fn emit_fn_body(&mut self, body: &Block) {
        self.enter_js_scope();
        let wraps = block_contains_propagate(body);
        self.indented(|e| {
            if wraps {
                e.line("try {");
                e.indented(|e| e.emit_stmts_with_implicit_return(body));
                e.line("} catch (__e) {");
                e.indented(|e| {
                    e.line("if (__e.__tova_propagate) return __e.value;");
                    e.line("throw __e;");
                });
                e.line("}");
            } else {
                e.emit_stmts_with_implicit_return(body);
            }
        });
        self.exit_js_scope();
    }

    /// Statements of a value-producing block; the final expression (or
    /// the tails of a final if) gets `return` prepended.
    fn emit_stmts_with_implicit_return(&mut self, body: &Block) {
        let n = body.stmts.len();
        for (i, stmt) in body.stmts.iter().enumerate() {
            if i + 1 == n {
                match &stmt.kind {
                    StmtKind::Expr(expr) => {
                        let e = self.expr(expr);
                        self.line(&format!("return {e};"));
                        continue;
                    }
                    StmtKind::If {
                        cond,
                        then_branch,
                        elifs,
                        else_branch,
                    } => {
                        self.emit_if_stmt(cond, then_branch, elifs, else_branch.as_ref(), true);
                        continue;
                    }
                    _ => {}
                }
            }
            self.stmt(stmt);
        }
    }

    fn emit_plain_block(&mut self, body: &Block) {
        self.enter_js_scope();
        self.indented(|e| {
            for stmt in &body.stmts {
                e.stmt(stmt);
            }
        });
        self.exit_js_scope();
    }

    /// Like `emit_plain_block` but the block's tail expression returns.
    fn emit_returning_block(&mut self, body: &Block) {
        self.enter_js_scope();
        self.indented(|e| e.emit_stmts_with_implicit_return(body));
        self.exit_js_scope();
    }

    fn emit_if_stmt(
        &mut self,
        cond: &Expr,
        then_branch: &Block,
        elifs: &[(Expr, Block)],
        else_branch: Option<&Block>,
        implicit_return: bool,
    ) {
        let c = self.expr(cond);
        self.line(&format!("if ({c}) {{"));
        if implicit_return {
            self.emit_returning_block(then_branch);
        } else {
            self.emit_plain_block(then_branch);
        }
        for (cond, block) in elifs {
            let c = self.expr(cond);
            self.line(&format!("}} else if ({c}) {{"));
            if implicit_return {
                self.emit_returning_block(block);
            } else {
                self.emit_plain_block(block);
            }
        }
        if let Some(block) = else_branch {
            self.line("} else {");
            if implicit_return {
                self.emit_returning_block(block);
            } else {
                self.emit_plain_block(block);
            }
        }
        self.line("}");
    }

    fn emit_for(
        &mut self,
        vars: &[String],
        iter: &Expr,
        body: &Block,
        else_branch: Option<&Block>,
    ) {
        let it = self.expr(iter);
        let entered = else_branch.map(|_| self.fresh_entered());
        if let Some(flag) = &entered {
            self.line(&format!("let {flag} = false;"));
        }
        if vars.len() == 2 {
            // `for item, i in xs` -- entries() yields [index, value].
            self.line(&format!(
                "for (const [{}, {}] of ({it}).entries()) {{",
                vars[1], vars[0]
            ));
        } else {
            self.line(&format!("for (const {} of {it}) {{", vars[0]));
        }
        self.enter_js_scope();
        for var in vars {
            self.declare(var);
        }
        self.indented(|e| {
            if let Some(flag) = &entered {
                e.line(&format!("{flag} = true;"));
            }
            for stmt in &body.stmts {
                e.stmt(stmt);
            }
        });
        self.exit_js_scope();
        self.line("}");
        if let (Some(flag), Some(block)) = (entered, else_branch) {
            self.line(&format!("if (!{flag}) {{"));
            self.emit_plain_block(block);
            self.line("}");
        }
    }

    /// Multi-statement if in value position: bind the result to a fresh
    /// `__r_N` and return its name.
    fn emit_if_into_temp(
        &mut self,
        cond: &Expr,
        then_branch: &Block,
        elifs: &[(Expr, Block)],
        else_branch: Option<&Block>,
    ) -> String {
        let tmp = self.fresh_result();
        self.line(&format!("let {tmp};"));
        let c = self.expr(cond);
        self.line(&format!("if ({c}) {{"));
        self.emit_block_into(then_branch, &tmp);
        for (cond, block) in elifs {
            let c = self.expr(cond);
            self.line(&format!("}} else if ({c}) {{"));
            self.emit_block_into(block, &tmp);
        }
        if let Some(block) = else_branch {
            self.line("} else {");
            self.emit_block_into(block, &tmp);
        }
        self.line("}");
        tmp
    }

    /// Emit block statements, assigning the final expression into `target`.
    fn emit_block_into(&mut self, body: &Block, target: &str) {
        self.enter_js_scope();
        self.indented(|e| {
            let n = body.stmts.len();
            for (i, stmt) in body.stmts.iter().enumerate() {
                if i + 1 == n {
                    if let StmtKind::Expr(expr) = &stmt.kind {
                        let v = e.expr(expr);
                        e.line(&format!("{target} = {v};"));
                        continue;
                    }
                }
                e.stmt(stmt);
            }
        });
        self.exit_js_scope();
    }

    fn emit_type_decl(&mut self, decl: &TypeDecl) {
        match &decl.body {
            TypeBody::Record(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                let params = names.join(", ");
                self.line(&format!("class {} {{", decl.name));
                self.indented(|e| {
                    e.line(&format!("constructor({params}) {{"));
                    e.indented(|e| {
                        for name in &names {
                            e.line(&format!("this.{name} = {name};"));
                        }
                    });
                    e.line("}");
                });
                self.line("}");
                self.declare(&decl.name);
            }
            TypeBody::Sum(variants) => {
                for v in variants {
                    if v.fields.is_empty() {
                        self.line(&format!(
                            "const {} = {{ __tag: {} }};",
                            v.name,
                            js_string(&v.name)
                        ));
                    } else {
                        let fields: Vec<String> = v
                            .fields
                            .iter()
                            .enumerate()
                            .map(|(i, f)| f.name.clone().unwrap_or_else(|| format!("f{i}")))
                            .collect();
                        let params = fields.join(", ");
                        self.line(&format!(
                            "const {} = ({params}) => ({{ __tag: {}, {params} }});",
                            v.name,
                            js_string(&v.name)
                        ));
                    }
                    self.declare(&v.name);
                }
            }
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    pub fn expr(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Int(v) => v.to_string(),
            ExprKind::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e21 {
                    format!("{v:.1}")
                } else {
                    v.to_string()
                }
            }
            ExprKind::Str(s) => js_string(s),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Nil => "null".into(),
            ExprKind::Template(chunks) => self.template_js(chunks),
            ExprKind::Ident(name) => self.ident_js(name),
            ExprKind::PipeTarget => "_".into(),
            ExprKind::Binary { op, lhs, rhs } => self.binary_js(*op, lhs, rhs),
            ExprKind::Logical { op, lhs, rhs } => {
                let l = self.expr(lhs);
                let r = self.expr(rhs);
                let op = match op {
                    LogicalOp::And => "&&",
                    LogicalOp::Or => "||",
                };
                format!("({l} {op} {r})")
            }
            ExprKind::Unary { op, operand } => {
                let o = self.expr(operand);
                match op {
                    UnOp::Neg => format!("(-{o})"),
                    UnOp::Not => format!("(!{o})"),
                }
            }
            ExprKind::Cmp { op, lhs, rhs } => {
                let l = self.expr(lhs);
                let r = self.expr(rhs);
                format!("({l} {} {r})", op.js())
            }
            ExprKind::ChainedCmp { operands, ops } => self.chained_cmp_js(operands, ops),
            ExprKind::Membership {
                negated,
                item,
                collection,
            } => {
                self.mark("contains");
                let i = self.expr(item);
                let c = self.expr(collection);
                if *negated {
                    format!("(!__contains({c}, {i}))")
                } else {
                    format!("__contains({c}, {i})")
                }
            }
            ExprKind::Range {
                start,
                end,
                inclusive,
            } => {
                let a = self.expr(start);
                let b = self.expr(end);
                let extra = if *inclusive { " + 1" } else { "" };
                format!(
                    "Array.from({{ length: ({b}) - ({a}){extra} }}, (_, __i) => ({a}) + __i)"
                )
            }
            ExprKind::Call { callee, args } => self.call_js(callee, args),
            ExprKind::Member {
                object,
                name,
                optional,
            } => {
                let o = self.expr(object);
                if *optional {
                    format!("{o}?.{name}")
                } else {
                    format!("{o}.{name}")
                }
            }
            ExprKind::Index { object, index } => {
                let o = self.expr(object);
                let i = self.expr(index);
                format!("{o}[{i}]")
            }
            ExprKind::Slice {
                object,
                start,
                end,
                step,
            } => {
                let o = self.expr(object);
                match step {
                    None => {
                        let a = start.as_ref().map(|e| self.expr(e));
                        let b = end.as_ref().map(|e| self.expr(e));
                        match (a, b) {
                            (None, None) => format!("{o}.slice()"),
                            (Some(a), None) => format!("{o}.slice({a})"),
                            (None, Some(b)) => format!("{o}.slice(0, {b})"),
                            (Some(a), Some(b)) => format!("{o}.slice({a}, {b})"),
                        }
                    }
                    Some(step) => {
                        self.mark("slice");
                        let a = start
                            .as_ref()
                            .map(|e| self.expr(e))
                            .unwrap_or_else(|| "null".into());
                        let b = end
                            .as_ref()
                            .map(|e| self.expr(e))
                            .unwrap_or_else(|| "null".into());
                        let s = self.expr(step);
                        format!("__slice({o}, {a}, {b}, {s})")
                    }
                }
            }
            ExprKind::Object(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|entry| match entry {
                        ObjectEntry::Shorthand(name) => {
                            if self
                                .reactive
                                .as_ref()
                                .is_some_and(|env| env.reads_as_call(name))
                            {
                                format!("{name}: {name}()")
                            } else {
                                name.clone()
                            }
                        }
                        ObjectEntry::Pair { key, value } => {
                            let v = self.expr(value);
                            if is_js_ident(key) {
                                format!("{key}: {v}")
                            } else {
                                format!("{}: {v}", js_string(key))
                            }
                        }
                        ObjectEntry::Spread(value) => {
                            let v = self.expr(value);
                            format!("...{v}")
                        }
                    })
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            ExprKind::Array(elems) => {
                let parts: Vec<String> = elems
                    .iter()
                    .map(|e| match &e.kind {
                        ExprKind::Spread(inner) => {
                            let v = self.expr(inner);
                            format!("...{v}")
                        }
                        _ => self.expr(e),
                    })
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            ExprKind::Tuple(elems) => {
                let parts: Vec<String> = elems.iter().map(|e| self.expr(e)).collect();
                format!("[{}]", parts.join(", "))
            }
            ExprKind::Spread(inner) => {
                let v = self.expr(inner);
                format!("...{v}")
            }
            ExprKind::ListComp {
                element,
                vars,
                iter,
                filter,
            } => self.list_comp_js(element, vars, iter, filter.as_deref()),
            ExprKind::DictComp {
                key,
                value,
                vars,
                iter,
                filter,
            } => {
                let it = self.receiver_js(iter);
                let params = vars.join(", ");
                let k = self.expr(key);
                let v = self.expr(value);
                match filter {
                    Some(filter) => {
                        let f = self.expr(filter);
                        format!(
                            "Object.fromEntries({it}.filter(({params}) => {f}).map(({params}) => [{k}, {v}]))"
                        )
                    }
                    None => format!(
                        "Object.fromEntries({it}.map(({params}) => [{k}, {v}]))"
                    ),
                }
            }
            ExprKind::Lambda { params, body } => {
                let params_js = self.params_list(params);
                match body {
                    // An expression body with `?` needs the propagate
                    // wrapper, so it becomes a block body.
                    LambdaBody::Expr(e) if expr_contains_propagate(e) => {
                        let block = Block {
                            stmts: vec![Stmt::new(StmtKind::Expr((**e).clone()), e.span)],
                            span: e.span,
                        };
                        let body_js = self.capture_fn_body(&block);
                        format!("({params_js}) => {{\n{body_js}}}")
                    }
                    LambdaBody::Expr(e) => {
                        let b = self.expr(e);
                        format!("({params_js}) => ({b})")
                    }
                    LambdaBody::Block(block) => {
                        let body_js = self.capture_fn_body(block);
                        format!("({params_js}) => {{\n{body_js}}}")
                    }
                }
            }
            ExprKind::Match { subject, arms } => self.match_js(subject, arms),
            ExprKind::If {
                cond,
                then_branch,
                elifs,
                else_branch,
            } => self.if_expr_js(cond, then_branch, elifs, else_branch.as_ref()),
            ExprKind::Pipe { lhs, rhs } => self.pipe_js(lhs, rhs),
            ExprKind::Propagate(inner) => {
                self.mark("propagate");
                let v = self.expr(inner);
                format!("__propagate({v})")
            }
            ExprKind::Jsx(node) => client::jsx_js(self, node),
            ExprKind::Error => "undefined".into(),
        }
    }

    fn ident_js(&mut self, name: &str) -> String {
        if name == "None" {
            self.mark("variants");
            return "None".into();
        }
        if matches!(name, "Ok" | "Err" | "Some") {
            self.mark("variants");
            return name.to_string();
        }
        if let Some(env) = &self.reactive {
            if env.reads_as_call(name) {
                return format!("{name}()");
            }
        }
        name.to_string()
    }

    fn template_js(&mut self, chunks: &[TemplateChunk]) -> String {
        let mut out = String::from("`");
        for chunk in chunks {
            match chunk {
                TemplateChunk::Text(text) => out.push_str(&escape_template_text(text)),
                TemplateChunk::Expr(expr) => {
                    let e = self.expr(expr);
                    out.push_str("${");
                    out.push_str(&e);
                    out.push('}');
                }
            }
        }
        out.push('`');
        out
    }

    fn binary_js(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> String {
        // String repetition: `"ab" * 3` -> `"ab".repeat(3)`.
        if op == BinOp::Mul
            && matches!(lhs.kind, ExprKind::Str(_) | ExprKind::Template(_))
        {
            let l = self.expr(lhs);
            let r = self.expr(rhs);
            return format!("{l}.repeat({r})");
        }
        if op == BinOp::NullCoalesce {
            return self.coalesce_js(lhs, rhs);
        }
        let l = self.expr(lhs);
        let r = self.expr(rhs);
        format!("({l} {} {r})", op.js())
    }

    /// NaN-safe `??`: NaN counts as missing, unlike JS's own `??`.
    fn coalesce_js(&mut self, lhs: &Expr, rhs: &Expr) -> String {
        let r = self.expr(rhs);
        if is_trivial(lhs) {
            let l = self.expr(lhs);
            return format!("(({l} != null && {l} === {l}) ? {l} : {r})");
        }
        self.mark("coalesce");
        let l = self.expr(lhs);
        format!("(((__v = {l}), __v != null && __v === __v) ? __v : {r})")
    }

    fn chained_cmp_js(&mut self, operands: &[Expr], ops: &[CmpOp]) -> String {
        // Bind non-trivial middle operands once.
        let mut rendered: Vec<String> = Vec::with_capacity(operands.len());
        let mut bound: Vec<Option<String>> = vec![None; operands.len()];
        for (i, operand) in operands.iter().enumerate() {
            let middle = i > 0 && i + 1 < operands.len();
            if middle && !is_trivial(operand) {
                let tmp = self.fresh_cmp();
                let e = self.expr(operand);
                rendered.push(format!("({tmp} = {e})"));
                bound[i] = Some(tmp);
            } else {
                rendered.push(self.expr(operand));
            }
        }
        let mut parts = Vec::with_capacity(ops.len());
        for (i, op) in ops.iter().enumerate() {
            let lhs = match &bound[i] {
                // A bound operand's later uses read the temp, not the assignment.
                Some(tmp) if i > 0 => tmp.clone(),
                _ => rendered[i].clone(),
            };
            let rhs = rendered[i + 1].clone();
            parts.push(format!("({lhs} {} {rhs})", op.js()));
        }
        format!("({})", parts.join(" && "))
    }

    /// Parenthesize unless repetition-safe, so `items.map(...)` stays
    /// readable while `(a + b).map(...)` stays correct.
    fn receiver_js(&mut self, expr: &Expr) -> String {
        let rendered = self.expr(expr);
        if is_trivial(expr) || matches!(expr.kind, ExprKind::Member { .. } | ExprKind::Call { .. })
        {
            rendered
        } else if rendered.starts_with('(') {
            rendered
        } else {
            format!("({rendered})")
        }
    }

    fn list_comp_js(
        &mut self,
        element: &Expr,
        vars: &[String],
        iter: &Expr,
        filter: Option<&Expr>,
    ) -> String {
        let it = self.receiver_js(iter);
        let params = vars.join(", ");
        match filter {
            None => {
                let e = self.expr(element);
                format!("{it}.map(({params}) => ({e}))")
            }
            Some(filter) => {
                let f = self.expr(filter);
                // Filter-only: the element IS the loop variable.
                if let ExprKind::Ident(name) = &element.kind {
                    if vars.first().is_some_and(|v| v == name) {
                        return format!("{it}.filter(({params}) => ({f}))");
                    }
                }
                let e = self.expr(element);
                format!(
                    "{it}.reduce((__acc, {params}) => ({f}) ? (__acc.push({e}), __acc) : __acc, [])"
                )
            }
        }
    }

    fn call_js(&mut self, callee: &Expr, args: &[Arg]) -> String {
        // `Type.new(...)` -> `new Type(...)`.
        if let ExprKind::Member {
            object,
            name,
            optional: false,
        } = &callee.kind
        {
            if name == "new" {
                if let ExprKind::Ident(type_name) = &object.kind {
                    let rendered = self.args_js(args);
                    return format!("new {type_name}({rendered})");
                }
            }
        }

        if let ExprKind::Ident(name) = &callee.kind {
            if let Some(js) = self.builtin_call_js(name, args) {
                return js;
            }
        }

        let c = self.expr(callee);
        let rendered = self.args_js(args);
        format!("{c}({rendered})")
    }

    fn args_js(&mut self, args: &[Arg]) -> String {
        args.iter()
            .map(|a| self.expr(&a.value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn nth_arg(&mut self, args: &[Arg], i: usize) -> String {
        args.get(i)
            .map(|a| self.expr(&a.value))
            .unwrap_or_else(|| "undefined".into())
    }

    /// Rewrites for built-in calls. Returns `None` for plain user calls.
    fn builtin_call_js(&mut self, name: &str, args: &[Arg]) -> Option<String> {
        // Shadowed names always refer to the user binding.
        if self.is_declared(name) {
            return None;
        }
        let js = match name {
            "print" | "log" => format!("console.log({})", self.args_js(args)),
            "len" => format!("({}).length", self.nth_arg(args, 0)),
            "type_of" => format!("(typeof ({}))", self.nth_arg(args, 0)),
            "random" => "Math.random()".into(),
            "str" => format!("String({})", self.nth_arg(args, 0)),
            "int" => format!("Math.trunc(Number({}))", self.nth_arg(args, 0)),
            "float" => format!("Number({})", self.nth_arg(args, 0)),
            "abs" | "min" | "max" | "round" | "floor" | "ceil" | "sqrt" => {
                format!("Math.{name}({})", self.args_js(args))
            }
            "push" => {
                let target = self.nth_arg(args, 0);
                let rest = args
                    .iter()
                    .skip(1)
                    .map(|a| self.expr(&a.value))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({target}).push({rest})")
            }
            "pop" => format!("({}).pop()", self.nth_arg(args, 0)),
            "keys" => format!("Object.keys({})", self.nth_arg(args, 0)),
            "values" => format!("Object.values({})", self.nth_arg(args, 0)),
            "range" => {
                self.mark("range");
                match args.len() {
                    1 => format!("__range(0, {}, 1)", self.nth_arg(args, 0)),
                    2 => format!(
                        "__range({}, {}, 1)",
                        self.nth_arg(args, 0),
                        self.nth_arg(args, 1)
                    ),
                    _ => format!(
                        "__range({}, {}, {})",
                        self.nth_arg(args, 0),
                        self.nth_arg(args, 1),
                        self.nth_arg(args, 2)
                    ),
                }
            }
            "join" => {
                if args.len() == 1 {
                    format!("({}).join(\"\")", self.nth_arg(args, 0))
                } else {
                    format!(
                        "({}).join({})",
                        self.nth_arg(args, 0),
                        self.nth_arg(args, 1)
                    )
                }
            }
            "split" => format!(
                "({}).split({})",
                self.nth_arg(args, 0),
                self.nth_arg(args, 1)
            ),
            "trim" => format!("({}).trim()", self.nth_arg(args, 0)),
            "upper" => format!("({}).toUpperCase()", self.nth_arg(args, 0)),
            "lower" => format!("({}).toLowerCase()", self.nth_arg(args, 0)),
            "contains" => {
                self.mark("contains");
                format!(
                    "__contains({}, {})",
                    self.nth_arg(args, 0),
                    self.nth_arg(args, 1)
                )
            }
            "sort" => format!("[...{}].sort()", self.nth_arg(args, 0)),
            "reverse" => format!("[...{}].reverse()", self.nth_arg(args, 0)),
            "sleep" => {
                self.mark("sleep");
                format!("__sleep({})", self.nth_arg(args, 0))
            }
            "now" => "Date.now()".into(),
            "json_stringify" => format!("JSON.stringify({})", self.nth_arg(args, 0)),
            "json_parse" => format!("JSON.parse({})", self.nth_arg(args, 0)),
            "Ok" | "Err" | "Some" => {
                self.mark("variants");
                format!("{name}({})", self.args_js(args))
            }
            _ => return None,
        };
        Some(js)
    }

    fn if_expr_js(
        &mut self,
        cond: &Expr,
        then_branch: &Block,
        elifs: &[(Expr, Block)],
        else_branch: Option<&Block>,
    ) -> String {
        if if_expr_is_simple(then_branch, elifs, else_branch) {
            let c = self.expr(cond);
            let t = self.single_expr_of(then_branch);
            let mut tail = match else_branch {
                Some(b) => self.single_expr_of(b),
                None => "undefined".into(),
            };
            for (cond, block) in elifs.iter().rev() {
                let c = self.expr(cond);
                let v = self.single_expr_of(block);
                tail = format!("(({c}) ? {v} : {tail})");
            }
            return format!("(({c}) ? {t} : {tail})");
        }
        // Multi-statement branches in value position: IIFE that returns.
        let mut body = Emitter::new(self.registry);
        body.reactive = self.reactive.clone();
        body.scope = self.scope.clone();
        body.emit_if_stmt(cond, then_branch, elifs, else_branch, true);
        self.absorb(&mut body);
        let inner = body.take();
        format!("(() => {{\n{inner}}})()")
    }

    fn single_expr_of(&mut self, block: &Block) -> String {
        match block.stmts.first().map(|s| &s.kind) {
            Some(StmtKind::Expr(e)) => self.expr(e),
            _ => "undefined".into(),
        }
    }

    /// Render a function body block into a string (for lambdas/IIFEs),
    /// carrying helper flags and counters back.
    pub fn capture_fn_body(&mut self, block: &Block) -> String {
        let mut body = Emitter::new(self.registry);
        body.reactive = self.reactive.clone();
        body.scope = self.scope.clone();
        body.indent = self.indent;
        body.cmp_counter = self.cmp_counter;
        body.entered_counter = self.entered_counter;
        body.result_counter = self.result_counter;
        body.declared = self.declared.clone();
        body.emit_fn_body(block);
        self.absorb(&mut body);
        body.take()
    }

    /// Merge helper flags, temps and counters from a sub-emitter.
    fn absorb(&mut self, other: &mut Emitter<'_>) {
        for h in other.used_helpers.iter().copied() {
            self.used_helpers.insert(h);
        }
        self.temps.append(&mut other.temps);
        self.cmp_counter = self.cmp_counter.max(other.cmp_counter);
        self.entered_counter = self.entered_counter.max(other.entered_counter);
        self.result_counter = self.result_counter.max(other.result_counter);
    }

    fn pipe_js(&mut self, lhs: &Expr, rhs: &Expr) -> String {
        let l = self.expr(lhs);
        match &rhs.kind {
            ExprKind::Call { callee, args } => {
                let has_hole = args
                    .iter()
                    .any(|a| matches!(a.value.kind, ExprKind::PipeTarget));
                let c = self.expr(callee);
                if has_hole {
                    let rendered: Vec<String> = args
                        .iter()
                        .map(|a| {
                            if matches!(a.value.kind, ExprKind::PipeTarget) {
                                l.clone()
                            } else {
                                self.expr(&a.value)
                            }
                        })
                        .collect();
                    format!("{c}({})", rendered.join(", "))
                } else {
                    let mut rendered = vec![l];
                    rendered.extend(args.iter().map(|a| self.expr(&a.value)));
                    format!("{c}({})", rendered.join(", "))
                }
            }
            ExprKind::Lambda { .. } => {
                let f = self.expr(rhs);
                format!("({f})({l})")
            }
            _ => {
                let f = self.expr(rhs);
                format!("{f}({l})")
            }
        }
    }

    // ── Match compilation ──────────────────────────────────────────────

    fn match_js(&mut self, subject: &Expr, arms: &[MatchArm]) -> String {
        // Ternary chain when every arm is a guardless literal/wildcard
        // with a single-expression body and the subject is pure.
        if is_trivial(subject) && arms.iter().all(arm_is_ternary_friendly) {
            let s = self.expr(subject);
            let mut tail = "undefined".to_string();
            for arm in arms.iter().rev() {
                let body = match &arm.body {
                    ArmBody::Expr(e) => self.expr(e),
                    ArmBody::Block(_) => unreachable!("ternary-friendly arms are expressions"),
                };
                match &arm.pattern.kind {
                    PatternKind::Wildcard => tail = body,
                    _ => {
                        let cond = self.pattern_cond(&s, &arm.pattern);
                        tail = format!("(({cond}) ? {body} : {tail})");
                    }
                }
            }
            return tail;
        }

        let s = self.expr(subject);
        let mut inner = Emitter::new(self.registry);
        inner.reactive = self.reactive.clone();
        inner.scope = self.scope.clone();
        inner.indent = 1;
        inner.line(&format!("const __match = {s};"));
        for arm in arms {
            inner.emit_match_arm(arm);
        }
        inner.line("return undefined;");
        self.absorb(&mut inner);
        let body = inner.take();
        format!("(() => {{\n{body}}})()")
    }

    fn emit_match_arm(&mut self, arm: &MatchArm) {
        let cond = self.pattern_cond("__match", &arm.pattern);
        self.line(&format!("if ({cond}) {{"));
        self.enter_js_scope();
        self.indented(|e| {
            e.emit_pattern_binds("__match", &arm.pattern);
            let emit_body = |e: &mut Emitter| match &arm.body {
                ArmBody::Expr(expr) => {
                    let v = e.expr(expr);
                    e.line(&format!("return {v};"));
                }
                ArmBody::Block(block) => {
                    e.emit_stmts_with_implicit_return(block);
                }
            };
            match &arm.guard {
                Some(guard) => {
                    let g = e.expr(guard);
                    e.line(&format!("if ({g}) {{"));
                    e.indented(emit_body);
                    e.line("}");
                }
                None => emit_body(e),
            }
        });
        self.exit_js_scope();
        self.line("}");
    }

    /// Condition testing `subject` against `pattern`.
    fn pattern_cond(&mut self, subject: &str, pattern: &Pattern) -> String {
        match &pattern.kind {
            PatternKind::Wildcard | PatternKind::Binding(_) => "true".into(),
            PatternKind::Int(v) => format!("{subject} === {v}"),
            PatternKind::Float(v) => format!("{subject} === {v}"),
            PatternKind::Str(s) => format!("{subject} === {}", js_string(s)),
            PatternKind::Bool(b) => format!("{subject} === {b}"),
            PatternKind::Nil => format!("{subject} === null"),
            PatternKind::Variant { name, fields } => {
                let mut cond = format!("{subject} && {subject}.__tag === {}", js_string(name));
                let field_names = self.variant_field_names(name, fields.len());
                for (field, fname) in fields.iter().zip(&field_names) {
                    if !matches!(
                        field.kind,
                        PatternKind::Wildcard | PatternKind::Binding(_)
                    ) {
                        let sub = format!("{subject}.{fname}");
                        let nested = self.pattern_cond(&sub, field);
                        cond = format!("{cond} && {nested}");
                    }
                }
                cond
            }
            PatternKind::Array(elems) => {
                let mut cond = format!(
                    "Array.isArray({subject}) && {subject}.length === {}",
                    elems.len()
                );
                for (i, elem) in elems.iter().enumerate() {
                    if !matches!(elem.kind, PatternKind::Wildcard | PatternKind::Binding(_)) {
                        let sub = format!("{subject}[{i}]");
                        let nested = self.pattern_cond(&sub, elem);
                        cond = format!("{cond} && {nested}");
                    }
                }
                cond
            }
            PatternKind::Range {
                start,
                end,
                inclusive,
            } => {
                let a = self.expr(start);
                let b = self.expr(end);
                let upper = if *inclusive { "<=" } else { "<" };
                format!("{subject} >= {a} && {subject} {upper} {b}")
            }
            PatternKind::Or(alts) => {
                let parts: Vec<String> = alts
                    .iter()
                    .map(|alt| format!("({})", self.pattern_cond(subject, alt)))
                    .collect();
                format!("({})", parts.join(" || "))
            }
        }
    }

    /// Bindings a matched pattern introduces into the arm body.
    fn emit_pattern_binds(&mut self, subject: &str, pattern: &Pattern) {
        match &pattern.kind {
            PatternKind::Binding(name) => {
                self.declare(name);
                self.line(&format!("const {name} = {subject};"));
            }
            PatternKind::Variant { name, fields } => {
                let field_names = self.variant_field_names(name, fields.len());
                for (field, fname) in fields.iter().zip(&field_names) {
                    let sub = format!("{subject}.{fname}");
                    self.emit_pattern_binds(&sub, field);
                }
            }
            PatternKind::Array(elems) => {
                for (i, elem) in elems.iter().enumerate() {
                    let sub = format!("{subject}[{i}]");
                    self.emit_pattern_binds(&sub, elem);
                }
            }
            PatternKind::Or(alts) => {
                if let Some(first) = alts.first() {
                    self.emit_pattern_binds(subject, first);
                }
            }
            _ => {}
        }
    }

    /// Field names carried by a variant instance, in declaration order.
    fn variant_field_names(&self, variant: &str, arity: usize) -> Vec<String> {
        if matches!(variant, "Ok" | "Err" | "Some") {
            return vec!["value".to_string()];
        }
        if let Some(adt_name) = self.registry.adt_of_variant(variant) {
            if let Some(tova_analyzer::ty::Type::Adt { variants, .. }) =
                self.registry.types.get(adt_name)
            {
                if let Some((_, fields)) = variants.iter().find(|(v, _)| v == variant) {
                    return fields.iter().map(|(n, _)| n.clone()).collect();
                }
            }
        }
        (0..arity).map(|i| format!("f{i}")).collect()
    }
}

// ── Free predicates ────────────────────────────────────────────────────

/// Pure-enough expressions that can be repeated without re-evaluation
/// concerns: identifiers and literals.
fn is_trivial(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Ident(_)
            | ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Nil
    )
}

fn arm_is_ternary_friendly(arm: &MatchArm) -> bool {
    if arm.guard.is_some() {
        return false;
    }
    if !matches!(arm.body, ArmBody::Expr(_)) {
        return false;
    }
    matches!(
        arm.pattern.kind,
        PatternKind::Wildcard
            | PatternKind::Int(_)
            | PatternKind::Float(_)
            | PatternKind::Str(_)
            | PatternKind::Bool(_)
            | PatternKind::Nil
    )
}

fn if_expr_is_simple(
    then_branch: &Block,
    elifs: &[(Expr, Block)],
    else_branch: Option<&Block>,
) -> bool {
    fn simple(block: &Block) -> bool {
        block.stmts.len() == 1 && matches!(block.stmts[0].kind, StmtKind::Expr(_))
    }
    simple(then_branch)
        && elifs.iter().all(|(_, b)| simple(b))
        && else_branch.map_or(true, |b| simple(b))
}

// ── Propagate detection ────────────────────────────────────────────────

/// Whether `?` occurs in the direct body, stopping at nested function and
/// lambda boundaries (their own bodies get their own wrappers).
pub fn block_contains_propagate(block: &Block) -> bool {
    block.stmts.iter().any(stmt_contains_propagate)
}

fn stmt_contains_propagate(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Assign { value, target, .. } => {
            expr_contains_propagate(value) || expr_contains_propagate(target)
        }
        StmtKind::TupleAssign { values, .. } => values.iter().any(expr_contains_propagate),
        StmtKind::CompoundAssign { target, value, .. } => {
            expr_contains_propagate(target) || expr_contains_propagate(value)
        }
        StmtKind::LetDestructure { value, .. } => expr_contains_propagate(value),
        StmtKind::If {
            cond,
            then_branch,
            elifs,
            else_branch,
        } => {
            expr_contains_propagate(cond)
                || block_contains_propagate(then_branch)
                || elifs
                    .iter()
                    .any(|(c, b)| expr_contains_propagate(c) || block_contains_propagate(b))
                || else_branch.as_ref().is_some_and(block_contains_propagate)
        }
        StmtKind::For {
            iter,
            body,
            else_branch,
            ..
        } => {
            expr_contains_propagate(iter)
                || block_contains_propagate(body)
                || else_branch.as_ref().is_some_and(block_contains_propagate)
        }
        StmtKind::While { cond, body } => {
            expr_contains_propagate(cond) || block_contains_propagate(body)
        }
        StmtKind::Return(Some(value)) => expr_contains_propagate(value),
        StmtKind::Expr(expr) => expr_contains_propagate(expr),
        _ => false,
    }
}

fn expr_contains_propagate(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Propagate(_) => true,
        // Nested functions own their propagates.
        ExprKind::Lambda { .. } => false,
        ExprKind::Binary { lhs, rhs, .. }
        | ExprKind::Logical { lhs, rhs, .. }
        | ExprKind::Pipe { lhs, rhs } => {
            expr_contains_propagate(lhs) || expr_contains_propagate(rhs)
        }
        ExprKind::Cmp { lhs, rhs, .. } => {
            expr_contains_propagate(lhs) || expr_contains_propagate(rhs)
        }
        ExprKind::Unary { operand, .. } => expr_contains_propagate(operand),
        ExprKind::ChainedCmp { operands, .. } => operands.iter().any(expr_contains_propagate),
        ExprKind::Membership {
            item, collection, ..
        } => expr_contains_propagate(item) || expr_contains_propagate(collection),
        ExprKind::Range { start, end, .. } => {
            expr_contains_propagate(start) || expr_contains_propagate(end)
        }
        ExprKind::Call { callee, args } => {
            expr_contains_propagate(callee)
                || args.iter().any(|a| expr_contains_propagate(&a.value))
        }
        ExprKind::Member { object, .. } => expr_contains_propagate(object),
        ExprKind::Index { object, index } => {
            expr_contains_propagate(object) || expr_contains_propagate(index)
        }
        ExprKind::Slice {
            object,
            start,
            end,
            step,
        } => {
            expr_contains_propagate(object)
                || [start, end, step]
                    .into_iter()
                    .flatten()
                    .any(|e| expr_contains_propagate(e))
        }
        ExprKind::Object(entries) => entries.iter().any(|e| match e {
            ObjectEntry::Pair { value, .. } | ObjectEntry::Spread(value) => {
                expr_contains_propagate(value)
            }
            ObjectEntry::Shorthand(_) => false,
        }),
        ExprKind::Array(elems) | ExprKind::Tuple(elems) => {
            elems.iter().any(expr_contains_propagate)
        }
        ExprKind::Spread(inner) => expr_contains_propagate(inner),
        ExprKind::Template(chunks) => chunks.iter().any(|c| match c {
            TemplateChunk::Expr(e) => expr_contains_propagate(e),
            TemplateChunk::Text(_) => false,
        }),
        ExprKind::Match { subject, arms } => {
            expr_contains_propagate(subject)
                || arms.iter().any(|arm| {
                    arm.guard.as_ref().is_some_and(expr_contains_propagate)
                        || match &arm.body {
                            ArmBody::Expr(e) => expr_contains_propagate(e),
                            ArmBody::Block(b) => block_contains_propagate(b),
                        }
                })
        }
        ExprKind::If {
            cond,
            then_branch,
            elifs,
            else_branch,
        } => {
            expr_contains_propagate(cond)
                || block_contains_propagate(then_branch)
                || elifs
                    .iter()
                    .any(|(c, b)| expr_contains_propagate(c) || block_contains_propagate(b))
                || else_branch.as_ref().is_some_and(block_contains_propagate)
        }
        ExprKind::ListComp {
            element,
            iter,
            filter,
            ..
        } => {
            expr_contains_propagate(element)
                || expr_contains_propagate(iter)
                || filter.as_deref().is_some_and(expr_contains_propagate)
        }
        ExprKind::DictComp {
            key,
            value,
            iter,
            filter,
            ..
        } => {
            expr_contains_propagate(key)
                || expr_contains_propagate(value)
                || expr_contains_propagate(iter)
                || filter.as_deref().is_some_and(expr_contains_propagate)
        }
        _ => false,
    }
}

// ── String rendering ───────────────────────────────────────────────────

/// Render a Rust string as a double-quoted JS string literal.
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn escape_template_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out
}

fn is_js_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Setter name for a signal: `count` -> `setCount`.
pub fn setter_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".into(),
    }
}
