//! Client bundle emission: reactive primitives, components, stores,
//! scoped CSS and JSX.
//!
//! `state` compiles to `createSignal`, `computed` to `createComputed`,
//! `effect` to `createEffect`. Components become plain functions taking
//! `__props`, with one accessor const per prop. JSX compiles to
//! `tova_el(tag, attrs, children)`; an expression child is wrapped in a
//! thunk iff it reads a signal, so static children stay static.

use tova_parser::ast::*;

use super::{js_string, setter_name, Emitter, ReactiveEnv};

/// The import surface of the client runtime library.
pub const RUNTIME_IMPORT: &str = "import {\n  createSignal, createComputed, createEffect, batch, onMount, onCleanup,\n  createRef, createContext, provide, inject, createRoot, untrack,\n  tova_el, tova_fragment, tova_inject_css, tova_keyed, render, mount,\n  Head, createResource, Portal, lazy, Suspense, TransitionGroup,\n  createForm, configureCSP,\n} from \"@tova/runtime\";";

/// Emit the statements of a client block.
pub fn emit_client(e: &mut Emitter, stmts: &[Stmt]) {
    let mut env = ReactiveEnv::default();
    collect_reactive_names(stmts, &mut env);
    e.reactive = Some(env);

    let mut has_app = false;
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::State { name, value } => emit_state(e, name, value),
            StmtKind::Computed { name, value } => emit_computed(e, name, value),
            StmtKind::Effect { body } => emit_effect(e, body),
            StmtKind::Component { name, params, body } => {
                if name == "App" {
                    has_app = true;
                }
                emit_component(e, name, params, body);
            }
            StmtKind::Store { name, body } => emit_store(e, name, body),
            StmtKind::Form(form) => super::form::emit_form(e, form),
            StmtKind::Style { css } => {
                // Unscoped module-level styles.
                let css_js = js_string(css);
                e.line(&format!("tova_inject_css({css_js}, null);"));
            }
            _ => e.stmt(stmt),
        }
    }

    if has_app {
        e.blank();
        e.line("if (typeof document !== \"undefined\" && document.getElementById(\"app\")) {");
        e.indented(|e| e.line("mount(App, document.getElementById(\"app\"));"));
        e.line("}");
    }
    e.reactive = None;
}

fn collect_reactive_names(stmts: &[Stmt], env: &mut ReactiveEnv) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::State { name, .. } => {
                env.signals.insert(name.clone());
            }
            StmtKind::Computed { name, .. } => {
                env.computeds.insert(name.clone());
            }
            _ => {}
        }
    }
}

fn emit_state(e: &mut Emitter, name: &str, value: &Expr) {
    let init = e.expr(value);
    e.declare(name);
    e.line(&format!(
        "const [{name}, {}] = createSignal({init});",
        setter_name(name)
    ));
}

fn emit_computed(e: &mut Emitter, name: &str, value: &Expr) {
    let body = e.expr(value);
    e.declare(name);
    e.line(&format!("const {name} = createComputed(() => ({body}));"));
}

fn emit_effect(e: &mut Emitter, body: &Block) {
    e.line("createEffect(() => {");
    e.enter_js_scope();
    e.indented(|e| {
        for stmt in &body.stmts {
            e.stmt(stmt);
        }
    });
    e.exit_js_scope();
    e.line("});");
}

/// FNV-1a over the component name and CSS text, truncated to 8 hex chars.
/// Deterministic across compilations so scoped class names are stable.
pub fn scope_hash(component: &str, css: &str) -> String {
    let mut hash: u32 = 0x811c9dc5;
    for byte in component.bytes().chain([0u8]).chain(css.bytes()) {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    format!("{hash:08x}")
}

fn emit_component(e: &mut Emitter, name: &str, params: &[Param], body: &Block) {
    let outer_env = e.reactive.clone();
    let outer_scope = e.scope.take();

    let mut env = outer_env.clone().unwrap_or_default();
    for param in params {
        env.props.insert(param.name.clone());
    }
    collect_reactive_names(&body.stmts, &mut env);

    // Scoped CSS: one style block per component.
    let style_css = body.stmts.iter().find_map(|s| match &s.kind {
        StmtKind::Style { css } => Some(css.clone()),
        _ => None,
    });
    let scope_class = style_css
        .as_ref()
        .map(|css| format!("tova-{}", scope_hash(name, css)));

    e.line(&format!("function {name}(__props) {{"));
    e.enter_js_scope();
    e.reactive = Some(env);
    e.scope = scope_class.clone();
    e.indented(|em| {
        for param in params {
            em.declare(&param.name);
            match &param.default {
                Some(default) => {
                    let d = em.expr(default);
                    em.line(&format!(
                        "const {0} = () => __props.{0} === undefined ? {d} : __props.{0};",
                        param.name
                    ));
                }
                None => em.line(&format!("const {0} = () => __props.{0};", param.name)),
            }
        }
        if let (Some(css), Some(class)) = (&style_css, &scope_class) {
            let css_js = js_string(css);
            let class_js = js_string(class);
            em.line(&format!("tova_inject_css({css_js}, {class_js});"));
        }

        let n = body.stmts.len();
        for (i, stmt) in body.stmts.iter().enumerate() {
            let last = i + 1 == n;
            match &stmt.kind {
                StmtKind::State { name, value } => emit_state(em, name, value),
                StmtKind::Computed { name, value } => emit_computed(em, name, value),
                StmtKind::Effect { body } => emit_effect(em, body),
                StmtKind::Form(form) => super::form::emit_form(em, form),
                StmtKind::Style { .. } => {}
                StmtKind::Expr(expr) if last => {
                    let v = em.expr(expr);
                    em.line(&format!("return {v};"));
                }
                _ => em.stmt(stmt),
            }
        }
    });
    e.exit_js_scope();
    e.scope = outer_scope;
    e.reactive = outer_env;
    e.line("}");
    e.declare(name);
}

/// Stores compile to an IIFE exposing getters/setters over internal
/// signals plus the store's functions.
fn emit_store(e: &mut Emitter, name: &str, body: &Block) {
    let outer_env = e.reactive.clone();
    let mut env = outer_env.clone().unwrap_or_default();

    let mut signal_names = Vec::new();
    let mut fn_names = Vec::new();
    for stmt in &body.stmts {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                mutable: true,
                ..
            } => {
                if let ExprKind::Ident(n) = &target.kind {
                    signal_names.push(n.clone());
                    env.signals.insert(n.clone());
                }
            }
            StmtKind::State { name: n, .. } => {
                signal_names.push(n.clone());
                env.signals.insert(n.clone());
            }
            StmtKind::Computed { name: n, .. } => {
                env.computeds.insert(n.clone());
                fn_names.push(n.clone());
            }
            StmtKind::FnDecl(decl) => fn_names.push(decl.name.clone()),
            _ => {}
        }
    }

    e.line(&format!("const {name} = (() => {{"));
    e.enter_js_scope();
    e.reactive = Some(env);
    e.indented(|em| {
        for stmt in &body.stmts {
            match &stmt.kind {
                StmtKind::Assign {
                    target,
                    value,
                    mutable: true,
                } => {
                    if let ExprKind::Ident(n) = &target.kind {
                        let init = em.expr(value);
                        em.declare(n);
                        em.line(&format!(
                            "const [{n}, {}] = createSignal({init});",
                            setter_name(n)
                        ));
                    }
                }
                StmtKind::State { name: n, value } => emit_state(em, n, value),
                StmtKind::Computed { name: n, value } => emit_computed(em, n, value),
                StmtKind::Effect { body } => emit_effect(em, body),
                _ => em.stmt(stmt),
            }
        }
        let mut exposed = Vec::new();
        for n in &signal_names {
            exposed.push(format!("get {n}() {{ return {n}(); }}"));
            exposed.push(format!("set {n}(__v) {{ {}(__v); }}", setter_name(n)));
        }
        for n in &fn_names {
            exposed.push(n.clone());
        }
        em.line(&format!("return {{ {} }};", exposed.join(", ")));
    });
    e.exit_js_scope();
    e.reactive = outer_env;
    e.line("})();");
    e.declare(name);
}

// ── Signal-read detection ──────────────────────────────────────────────

/// Whether an expression reads a signal, computed or prop. Stops at
/// lambda boundaries: a handler that reads a signal when *called* does
/// not make the position reactive.
pub fn expr_reads_signal(expr: &Expr, env: &ReactiveEnv) -> bool {
    match &expr.kind {
        ExprKind::Ident(name) => env.reads_as_call(name),
        ExprKind::Lambda { .. } => false,
        ExprKind::Binary { lhs, rhs, .. }
        | ExprKind::Logical { lhs, rhs, .. }
        | ExprKind::Pipe { lhs, rhs } => {
            expr_reads_signal(lhs, env) || expr_reads_signal(rhs, env)
        }
        ExprKind::Cmp { lhs, rhs, .. } => {
            expr_reads_signal(lhs, env) || expr_reads_signal(rhs, env)
        }
        ExprKind::ChainedCmp { operands, .. } => {
            operands.iter().any(|o| expr_reads_signal(o, env))
        }
        ExprKind::Unary { operand, .. } => expr_reads_signal(operand, env),
        ExprKind::Membership {
            item, collection, ..
        } => expr_reads_signal(item, env) || expr_reads_signal(collection, env),
        ExprKind::Range { start, end, .. } => {
            expr_reads_signal(start, env) || expr_reads_signal(end, env)
        }
        ExprKind::Call { callee, args } => {
            expr_reads_signal(callee, env)
                || args.iter().any(|a| expr_reads_signal(&a.value, env))
        }
        ExprKind::Member { object, .. } => expr_reads_signal(object, env),
        ExprKind::Index { object, index } => {
            expr_reads_signal(object, env) || expr_reads_signal(index, env)
        }
        ExprKind::Slice {
            object,
            start,
            end,
            step,
        } => {
            expr_reads_signal(object, env)
                || [start, end, step]
                    .into_iter()
                    .flatten()
                    .any(|e| expr_reads_signal(e, env))
        }
        ExprKind::Object(entries) => entries.iter().any(|entry| match entry {
            ObjectEntry::Shorthand(name) => env.reads_as_call(name),
            ObjectEntry::Pair { value, .. } | ObjectEntry::Spread(value) => {
                expr_reads_signal(value, env)
            }
        }),
        ExprKind::Array(elems) | ExprKind::Tuple(elems) => {
            elems.iter().any(|e| expr_reads_signal(e, env))
        }
        ExprKind::Spread(inner) | ExprKind::Propagate(inner) => expr_reads_signal(inner, env),
        ExprKind::Template(chunks) => chunks.iter().any(|c| match c {
            TemplateChunk::Expr(e) => expr_reads_signal(e, env),
            TemplateChunk::Text(_) => false,
        }),
        ExprKind::ListComp {
            element,
            iter,
            filter,
            ..
        } => {
            expr_reads_signal(element, env)
                || expr_reads_signal(iter, env)
                || filter.as_deref().is_some_and(|f| expr_reads_signal(f, env))
        }
        ExprKind::DictComp {
            key,
            value,
            iter,
            filter,
            ..
        } => {
            expr_reads_signal(key, env)
                || expr_reads_signal(value, env)
                || expr_reads_signal(iter, env)
                || filter.as_deref().is_some_and(|f| expr_reads_signal(f, env))
        }
        ExprKind::Match { subject, arms } => {
            expr_reads_signal(subject, env)
                || arms.iter().any(|arm| match &arm.body {
                    ArmBody::Expr(e) => expr_reads_signal(e, env),
                    ArmBody::Block(_) => false,
                })
        }
        ExprKind::If { cond, .. } => expr_reads_signal(cond, env),
        _ => false,
    }
}

fn reads_signal(e: &Emitter, expr: &Expr) -> bool {
    e.reactive
        .as_ref()
        .is_some_and(|env| expr_reads_signal(expr, env))
}

fn template_reads_signal(e: &Emitter, chunks: &[TemplateChunk]) -> bool {
    e.reactive.as_ref().is_some_and(|env| {
        chunks.iter().any(|c| match c {
            TemplateChunk::Expr(expr) => expr_reads_signal(expr, env),
            TemplateChunk::Text(_) => false,
        })
    })
}

// ── JSX emission ───────────────────────────────────────────────────────

/// Emit a JSX node as a `tova_el`/`tova_fragment` expression.
pub fn jsx_js(e: &mut Emitter, node: &JsxNode) -> String {
    match &node.kind {
        JsxNodeKind::Fragment { children } => {
            let rendered = children_js(e, children);
            format!("tova_fragment([{rendered}])")
        }
        JsxNodeKind::Element {
            tag,
            attrs,
            children,
        } => element_js(e, tag, attrs, children),
    }
}

fn is_component_tag(tag: &str) -> bool {
    tag.chars().next().is_some_and(|c| c.is_uppercase())
}

fn event_prop(event: &str) -> String {
    let mut chars = event.chars();
    match chars.next() {
        Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
        None => "on".into(),
    }
}

fn element_js(e: &mut Emitter, tag: &str, attrs: &[JsxAttr], children: &[JsxChild]) -> String {
    let mut props: Vec<String> = Vec::new();
    let mut base_class: Option<String> = None;
    let mut class_directives: Vec<(String, String)> = Vec::new();

    let input_type = attrs.iter().find_map(|a| {
        if a.name == "type" {
            match &a.value {
                JsxAttrValue::Str(s) => Some(s.clone()),
                _ => None,
            }
        } else {
            None
        }
    });

    for attr in attrs {
        if let Some(event) = attr.name.strip_prefix("on:") {
            let handler = match &attr.value {
                JsxAttrValue::Expr(expr) => e.expr(expr),
                _ => "() => {}".into(),
            };
            props.push(format!("{}: {handler}", event_prop(event)));
            continue;
        }
        if attr.name == "bind:value" {
            if let JsxAttrValue::Expr(Expr {
                kind: ExprKind::Ident(signal),
                ..
            }) = &attr.value
            {
                let setter = setter_name(signal);
                let event = if tag == "select" { "onChange" } else { "onInput" };
                props.push(format!("value: () => {signal}()"));
                props.push(format!(
                    "{event}: (__e) => {setter}(__e.target.value)"
                ));
            }
            continue;
        }
        if attr.name == "bind:group" {
            if let JsxAttrValue::Expr(Expr {
                kind: ExprKind::Ident(signal),
                ..
            }) = &attr.value
            {
                let setter = setter_name(signal);
                // The input's own `value` attribute identifies it in the group.
                let own_value = attrs
                    .iter()
                    .find(|a| a.name == "value")
                    .map(|a| match &a.value {
                        JsxAttrValue::Str(s) => js_string(s),
                        JsxAttrValue::Expr(expr) => e.expr(expr),
                        _ => "undefined".into(),
                    })
                    .unwrap_or_else(|| "__e.target.value".into());
                match input_type.as_deref() {
                    Some("checkbox") => {
                        // Checkbox groups collect checked values in an array.
                        props.push(format!("checked: () => {signal}().includes({own_value})"));
                        props.push(format!(
                            "onChange: () => {setter}({signal}().includes({own_value}) ? {signal}().filter((__x) => __x !== {own_value}) : [...{signal}(), {own_value}])"
                        ));
                    }
                    _ => {
                        // Radios compare and set by identity.
                        props.push(format!("checked: () => {signal}() === {own_value}"));
                        props.push(format!("onChange: () => {setter}({own_value})"));
                    }
                }
            }
            continue;
        }
        if let Some(class_name) = attr.name.strip_prefix("class:") {
            let cond = match &attr.value {
                JsxAttrValue::Expr(expr) => e.expr(expr),
                JsxAttrValue::Bare => "true".into(),
                _ => "false".into(),
            };
            class_directives.push((class_name.to_string(), cond));
            continue;
        }
        if attr.name == "class" {
            base_class = Some(attr_value_js(e, &attr.value));
            continue;
        }
        let key = if attr.name.contains('-') || attr.name.contains(':') {
            js_string(&attr.name)
        } else {
            attr.name.clone()
        };
        props.push(format!("{key}: {}", attr_value_js(e, &attr.value)));
    }

    // Merge the base class, class: directives and the scope class.
    let scope_class = e.scope.clone();
    if !class_directives.is_empty() {
        let mut parts = Vec::new();
        if let Some(base) = &base_class {
            parts.push(base.clone());
        }
        if let Some(scope) = &scope_class {
            parts.push(js_string(scope));
        }
        for (name, cond) in &class_directives {
            parts.push(format!("(({cond}) ? {} : \"\")", js_string(name)));
        }
        props.push(format!(
            "class: () => [{}].filter(Boolean).join(\" \")",
            parts.join(", ")
        ));
    } else if let Some(base) = &base_class {
        match &scope_class {
            Some(scope) => props.push(format!(
                "class: () => [{base}, {}].filter(Boolean).join(\" \")",
                js_string(scope)
            )),
            None => props.push(format!("class: {base}")),
        }
    } else if let Some(scope) = &scope_class {
        props.push(format!("class: {}", js_string(scope)));
    }

    if is_component_tag(tag) {
        // Named slot children become a slots prop on the component.
        let mut slot_props: Vec<String> = Vec::new();
        let mut plain_children: Vec<&JsxChild> = Vec::new();
        for child in children {
            if let JsxChild::Element(node) = child {
                if let JsxNodeKind::Element { attrs, .. } = &node.kind {
                    if let Some(slot) = attrs.iter().find(|a| a.name == "slot") {
                        if let JsxAttrValue::Str(slot_name) = &slot.value {
                            let rendered = jsx_js(e, node);
                            slot_props.push(format!("{slot_name}: {rendered}"));
                            continue;
                        }
                    }
                }
            }
            plain_children.push(child);
        }
        if !slot_props.is_empty() {
            props.push(format!("slots: {{ {} }}", slot_props.join(", ")));
        }
        let rendered: Vec<String> = plain_children
            .iter()
            .map(|c| child_js(e, c))
            .collect();
        return format!(
            "tova_el({tag}, {{ {} }}, [{}])",
            props.join(", "),
            rendered.join(", ")
        );
    }

    let rendered = children_js(e, children);
    format!(
        "tova_el({}, {{ {} }}, [{rendered}])",
        js_string(tag),
        props.join(", ")
    )
}

/// An attribute value. Signal-reading expressions become thunks; a
/// non-trivial reactive expression is memoized with `createComputed`.
fn attr_value_js(e: &mut Emitter, value: &JsxAttrValue) -> String {
    match value {
        JsxAttrValue::Bare => "true".into(),
        JsxAttrValue::Str(s) => js_string(s),
        JsxAttrValue::Template(chunks) => {
            let reactive = template_reads_signal(e, chunks);
            let rendered = e.expr(&Expr::new(
                ExprKind::Template(chunks.to_vec()),
                tova_common::span::Span::point(0),
            ));
            if reactive {
                format!("() => {rendered}")
            } else {
                rendered
            }
        }
        JsxAttrValue::Expr(expr) => {
            if reads_signal(e, expr) {
                let rendered = e.expr(expr);
                if matches!(
                    expr.kind,
                    ExprKind::Ident(_) | ExprKind::Member { .. }
                ) {
                    format!("() => {rendered}")
                } else {
                    format!("createComputed(() => ({rendered}))")
                }
            } else {
                e.expr(expr)
            }
        }
    }
}

fn children_js(e: &mut Emitter, children: &[JsxChild]) -> String {
    children
        .iter()
        .map(|c| child_js(e, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn child_js(e: &mut Emitter, child: &JsxChild) -> String {
    match child {
        JsxChild::Text(text) => js_string(text),
        JsxChild::Element(node) => jsx_js(e, node),
        JsxChild::Expr(expr) => {
            let reactive = reads_signal(e, expr);
            let rendered = e.expr(expr);
            if reactive {
                format!("() => {rendered}")
            } else {
                rendered
            }
        }
        JsxChild::If {
            cond,
            then_children,
            elifs,
            else_children,
        } => {
            let c = e.expr(cond);
            let then_js = children_js(e, then_children);
            let mut tail = match else_children {
                Some(children) => format!("[{}]", children_js(e, children)),
                None => "null".into(),
            };
            for (cond, children) in elifs.iter().rev() {
                let ec = e.expr(cond);
                let body = children_js(e, children);
                tail = format!("(({ec}) ? [{body}] : {tail})");
            }
            format!("() => (({c}) ? [{then_js}] : {tail})")
        }
        JsxChild::For {
            vars,
            iter,
            key,
            children,
        } => {
            let it = e.expr(iter);
            let params = vars.join(", ");
            let body = children_js(e, children);
            let key_js = match key {
                Some(key) => {
                    let k = e.expr(key);
                    format!("({params}) => ({k})")
                }
                None => "null".into(),
            };
            format!("tova_keyed(() => ({it}), ({params}) => [{body}], {key_js})")
        }
    }
}
