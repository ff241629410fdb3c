//! Statement-level parsing: declarations, control flow, top-level blocks
//! and the component-/server-scoped forms.
//!
//! The form keywords (`state`, `route`, `env`, ...) are contextual: they
//! arrive from the lexer as plain identifiers and are recognized here by
//! text plus the shape of the following tokens, so user code can still
//! use the same names as ordinary variables. A form used outside its
//! block parses fine and is rejected by the analyzer's context check.

use tova_common::token::TokenKind as T;

use crate::ast::*;
use crate::error::ParseError;
use crate::parser::{describe, expressions, Parser};

pub(crate) fn parse_stmt(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.current_span();
    match p.current().clone() {
        T::Var => parse_var_assign(p),
        T::Let => parse_let_destructure(p),
        T::Fn if p.nth_is_ident(1) => {
            let decl = parse_fn_decl(p)?;
            let span = decl.span;
            Ok(Stmt::new(StmtKind::FnDecl(decl), span))
        }
        T::Type if p.nth_is_ident(1) => parse_type_decl(p),
        T::Impl => parse_impl(p),
        T::Trait => parse_trait(p),
        T::If => {
            let (cond, then_branch, elifs, else_branch) = expressions::parse_if_parts(p)?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(
                StmtKind::If {
                    cond,
                    then_branch,
                    elifs,
                    else_branch,
                },
                span,
            ))
        }
        T::For => parse_for(p),
        T::While => parse_while(p),
        T::Return => parse_return(p),
        T::Server => parse_named_block(p, BlockKeyword::Server),
        T::Client => parse_named_block(p, BlockKeyword::Client),
        T::Shared => parse_named_block(p, BlockKeyword::Shared),
        T::Data => parse_data_or_deploy(p, true),
        T::Deploy => parse_data_or_deploy(p, false),
        T::Test => parse_test_block(p),
        T::StyleBlock(css) => {
            let tok = p.bump();
            Ok(Stmt::new(StmtKind::Style { css }, tok.span))
        }
        T::Ident(name) => parse_contextual_or_expr(p, &name),
        _ => parse_expr_stmt(p),
    }
}

// ── Assignments ────────────────────────────────────────────────────────

fn parse_var_assign(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'var'
    let (name, nspan) = p.expect_ident("variable name")?;
    p.expect(&T::Eq, "'='")?;
    let value = expressions::parse_expr(p)?;
    let span = start.merge(value.span);
    Ok(Stmt::new(
        StmtKind::Assign {
            target: Expr::new(ExprKind::Ident(name), nspan),
            value,
            mutable: true,
        },
        span,
    ))
}

fn parse_let_destructure(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'let'
    let pattern = match p.current() {
        T::LBrace => parse_object_destructure(p)?,
        T::LBracket => parse_array_destructure(p)?,
        other => {
            return Err(p.err(format!(
                "expected destructuring pattern after 'let', found {}",
                describe(other)
            )))
        }
    };
    p.expect(&T::Eq, "'='")?;
    let value = expressions::parse_expr(p)?;
    let span = start.merge(value.span);
    Ok(Stmt::new(StmtKind::LetDestructure { pattern, value }, span))
}

/// `{ x, y: alias = default }`. Duplicate targets are an analyzer error.
fn parse_object_destructure(p: &mut Parser) -> Result<Destructure, ParseError> {
    p.bump(); // '{'
    let mut fields = Vec::new();
    loop {
        p.skip_newlines();
        if p.at(&T::RBrace) {
            break;
        }
        let (key, _) = p.expect_ident("destructuring key")?;
        let alias = if p.eat(&T::Colon) {
            Some(p.expect_ident("binding name")?.0)
        } else {
            None
        };
        let default = if p.eat(&T::Eq) {
            Some(expressions::parse_expr(p)?)
        } else {
            None
        };
        fields.push(ObjectDestructureField { key, alias, default });
        p.skip_newlines();
        if !p.eat(&T::Comma) {
            break;
        }
    }
    p.skip_newlines();
    p.expect(&T::RBrace, "'}'")?;
    Ok(Destructure::Object(fields))
}

/// `[a, _, c]` -- `_` skips a slot.
fn parse_array_destructure(p: &mut Parser) -> Result<Destructure, ParseError> {
    p.bump(); // '['
    let mut elems = Vec::new();
    while !p.at(&T::RBracket) && !p.at_eof() {
        let (name, _) = p.expect_ident("binding name")?;
        if name == "_" {
            elems.push(ArrayDestructureElem::Wildcard);
        } else {
            elems.push(ArrayDestructureElem::Binding(name));
        }
        if !p.eat(&T::Comma) {
            break;
        }
    }
    p.expect(&T::RBracket, "']'")?;
    Ok(Destructure::Array(elems))
}

/// Expression statement, or an assignment when `=`, a compound-assignment
/// operator, or a parallel-assign comma follows.
fn parse_expr_stmt(p: &mut Parser) -> Result<Stmt, ParseError> {
    let expr = expressions::parse_expr(p)?;
    let start = expr.span;
    match p.current() {
        T::Eq => {
            p.bump();
            check_assign_target(p, &expr)?;
            let value = expressions::parse_expr(p)?;
            let span = start.merge(value.span);
            Ok(Stmt::new(
                StmtKind::Assign {
                    target: expr,
                    value,
                    mutable: false,
                },
                span,
            ))
        }
        T::PlusEq | T::MinusEq | T::StarEq | T::SlashEq | T::PercentEq => {
            let op = match p.current() {
                T::PlusEq => BinOp::Add,
                T::MinusEq => BinOp::Sub,
                T::StarEq => BinOp::Mul,
                T::SlashEq => BinOp::Div,
                _ => BinOp::Rem,
            };
            p.bump();
            check_assign_target(p, &expr)?;
            let value = expressions::parse_expr(p)?;
            let span = start.merge(value.span);
            Ok(Stmt::new(
                StmtKind::CompoundAssign {
                    target: expr,
                    op,
                    value,
                },
                span,
            ))
        }
        T::Comma if matches!(expr.kind, ExprKind::Ident(_)) => {
            let ExprKind::Ident(first) = expr.kind else {
                unreachable!("guarded by the match arm");
            };
            let mut names = vec![first];
            while p.eat(&T::Comma) {
                names.push(p.expect_ident("assignment target")?.0);
            }
            p.expect(&T::Eq, "'='")?;
            let mut values = vec![expressions::parse_expr(p)?];
            while p.eat(&T::Comma) {
                values.push(expressions::parse_expr(p)?);
            }
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::TupleAssign { names, values }, span))
        }
        _ => Ok(Stmt::new(StmtKind::Expr(expr), start)),
    }
}

fn check_assign_target(p: &Parser, target: &Expr) -> Result<(), ParseError> {
    match &target.kind {
        ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. } => Ok(()),
        _ => Err(ParseError::new("invalid assignment target", target.span)),
    }
}

// ── Declarations ───────────────────────────────────────────────────────

pub(crate) fn parse_fn_decl(p: &mut Parser) -> Result<FnDecl, ParseError> {
    let start = p.expect(&T::Fn, "'fn'")?.span;
    let (name, _) = p.expect_ident("function name")?;
    let type_params = parse_type_params(p)?;
    p.expect(&T::LParen, "'('")?;
    let params = parse_params(p)?;
    p.expect(&T::RParen, "')'")?;
    let return_type = if p.eat(&T::Arrow) {
        Some(parse_type_expr(p)?)
    } else {
        None
    };
    let body = p.parse_block()?;
    let span = start.merge(body.span);
    Ok(FnDecl {
        name,
        type_params,
        params,
        return_type,
        body,
        span,
    })
}

/// `<T, U>` after a declaration name.
fn parse_type_params(p: &mut Parser) -> Result<Vec<String>, ParseError> {
    let mut params = Vec::new();
    if p.eat(&T::Lt) {
        loop {
            params.push(p.expect_ident("type parameter")?.0);
            if !p.eat(&T::Comma) {
                break;
            }
        }
        p.expect(&T::Gt, "'>'")?;
    }
    Ok(params)
}

/// Parameter list between parens: `name [: Type] [= default]`.
pub(crate) fn parse_params(p: &mut Parser) -> Result<Vec<Param>, ParseError> {
    let mut params = Vec::new();
    while !p.at(&T::RParen) && !p.at_eof() {
        let (name, nspan) = p.expect_ident("parameter name")?;
        let ty = if p.eat(&T::Colon) {
            Some(parse_type_expr(p)?)
        } else {
            None
        };
        let default = if p.eat(&T::Eq) {
            Some(expressions::parse_expr(p)?)
        } else {
            None
        };
        params.push(Param {
            name,
            ty,
            default,
            span: nspan,
        });
        if !p.eat(&T::Comma) {
            break;
        }
    }
    Ok(params)
}

/// A surface type: `Int`, `Result<Int, String>`, `[Int]`, `(A, B)`,
/// `fn(A) -> B`.
pub(crate) fn parse_type_expr(p: &mut Parser) -> Result<TypeExpr, ParseError> {
    let span = p.current_span();
    match p.current().clone() {
        T::Ident(base) => {
            p.bump();
            if p.at(&T::Lt) {
                p.bump();
                let mut args = Vec::new();
                loop {
                    args.push(parse_type_expr(p)?);
                    if !p.eat(&T::Comma) {
                        break;
                    }
                }
                let close = p.expect(&T::Gt, "'>'")?;
                return Ok(TypeExpr {
                    kind: TypeExprKind::Generic { base, args },
                    span: span.merge(close.span),
                });
            }
            Ok(TypeExpr {
                kind: TypeExprKind::Name(base),
                span,
            })
        }
        T::LBracket => {
            p.bump();
            let elem = parse_type_expr(p)?;
            let close = p.expect(&T::RBracket, "']'")?;
            Ok(TypeExpr {
                kind: TypeExprKind::Array(Box::new(elem)),
                span: span.merge(close.span),
            })
        }
        T::LParen => {
            p.bump();
            let mut elems = Vec::new();
            while !p.at(&T::RParen) && !p.at_eof() {
                elems.push(parse_type_expr(p)?);
                if !p.eat(&T::Comma) {
                    break;
                }
            }
            let close = p.expect(&T::RParen, "')'")?;
            Ok(TypeExpr {
                kind: TypeExprKind::Tuple(elems),
                span: span.merge(close.span),
            })
        }
        T::Fn => {
            p.bump();
            p.expect(&T::LParen, "'('")?;
            let mut params = Vec::new();
            while !p.at(&T::RParen) && !p.at_eof() {
                params.push(parse_type_expr(p)?);
                if !p.eat(&T::Comma) {
                    break;
                }
            }
            p.expect(&T::RParen, "')'")?;
            p.expect(&T::Arrow, "'->'")?;
            let ret = parse_type_expr(p)?;
            let full = span.merge(ret.span);
            Ok(TypeExpr {
                kind: TypeExprKind::Function {
                    params,
                    ret: Box::new(ret),
                },
                span: full,
            })
        }
        other => Err(p.err(format!("expected type, found {}", describe(&other)))),
    }
}

/// `type Name<T> { ... }` -- record or sum, classified by entry shape.
fn parse_type_decl(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'type'
    let (name, _) = p.expect_ident("type name")?;
    let type_params = parse_type_params(p)?;
    p.expect(&T::LBrace, "'{'")?;

    let mut fields: Vec<FieldDef> = Vec::new();
    let mut variants: Vec<VariantDef> = Vec::new();
    loop {
        p.skip_separators();
        if p.at(&T::RBrace) || p.at_eof() {
            break;
        }
        let (entry_name, espan) = p.expect_ident("field or variant name")?;
        if p.eat(&T::Colon) {
            let ty = parse_type_expr(p)?;
            let span = espan.merge(ty.span);
            fields.push(FieldDef {
                name: entry_name,
                ty,
                span,
            });
        } else if p.at(&T::LParen) {
            p.bump();
            let mut vfields = Vec::new();
            while !p.at(&T::RParen) && !p.at_eof() {
                vfields.push(VariantField {
                    name: None,
                    ty: parse_type_expr(p)?,
                });
                if !p.eat(&T::Comma) {
                    break;
                }
            }
            let close = p.expect(&T::RParen, "')'")?;
            variants.push(VariantDef {
                name: entry_name,
                fields: vfields,
                span: espan.merge(close.span),
            });
        } else if p.at(&T::LBrace) {
            p.bump();
            let mut vfields = Vec::new();
            loop {
                p.skip_separators();
                if p.at(&T::RBrace) || p.at_eof() {
                    break;
                }
                let (fname, _) = p.expect_ident("field name")?;
                p.expect(&T::Colon, "':'")?;
                let ty = parse_type_expr(p)?;
                vfields.push(VariantField {
                    name: Some(fname),
                    ty,
                });
                if !p.eat(&T::Comma) {
                    p.skip_separators();
                    if p.at(&T::RBrace) {
                        break;
                    }
                }
            }
            let close = p.expect(&T::RBrace, "'}'")?;
            variants.push(VariantDef {
                name: entry_name,
                fields: vfields,
                span: espan.merge(close.span),
            });
        } else {
            variants.push(VariantDef {
                name: entry_name,
                fields: Vec::new(),
                span: espan,
            });
        }
        if !p.eat(&T::Comma) {
            p.skip_separators();
        }
    }
    let close = p.expect(&T::RBrace, "'}'")?;

    if !variants.is_empty() && !fields.is_empty() {
        return Err(ParseError::new(
            format!("type '{name}' mixes record fields and variants"),
            start.merge(close.span),
        ));
    }
    let body = if variants.is_empty() {
        TypeBody::Record(fields)
    } else {
        TypeBody::Sum(variants)
    };
    let span = start.merge(close.span);
    Ok(Stmt::new(
        StmtKind::TypeDecl(TypeDecl {
            name,
            type_params,
            body,
            span,
        }),
        span,
    ))
}

/// `impl Name { ... }` / `impl Trait for Name { ... }`.
fn parse_impl(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'impl'
    let (first, _) = p.expect_ident("type name")?;
    let (type_name, trait_name) = if p.at_ident("for") {
        p.bump();
        let (ty, _) = p.expect_ident("type name")?;
        (ty, Some(first))
    } else {
        (first, None)
    };
    p.expect(&T::LBrace, "'{'")?;
    let mut methods = Vec::new();
    loop {
        p.skip_separators();
        if p.at(&T::RBrace) || p.at_eof() {
            break;
        }
        methods.push(parse_fn_decl(p)?);
    }
    let close = p.expect(&T::RBrace, "'}'")?;
    let span = start.merge(close.span);
    Ok(Stmt::new(
        StmtKind::Impl {
            type_name,
            trait_name,
            methods,
        },
        span,
    ))
}

/// `trait Name { fn sig(...) -> T ... }`.
fn parse_trait(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'trait'
    let (name, _) = p.expect_ident("trait name")?;
    p.expect(&T::LBrace, "'{'")?;
    let mut methods = Vec::new();
    loop {
        p.skip_separators();
        if p.at(&T::RBrace) || p.at_eof() {
            break;
        }
        let sig_start = p.expect(&T::Fn, "'fn'")?.span;
        let (mname, _) = p.expect_ident("method name")?;
        p.expect(&T::LParen, "'('")?;
        let params = parse_params(p)?;
        p.expect(&T::RParen, "')'")?;
        let return_type = if p.eat(&T::Arrow) {
            Some(parse_type_expr(p)?)
        } else {
            None
        };
        methods.push(FnSig {
            name: mname,
            params,
            return_type,
            span: sig_start.merge(p.last_span()),
        });
    }
    let close = p.expect(&T::RBrace, "'}'")?;
    let span = start.merge(close.span);
    Ok(Stmt::new(StmtKind::TraitDecl { name, methods }, span))
}

// ── Control flow ───────────────────────────────────────────────────────

fn parse_for(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'for'
    let vars = expressions::parse_loop_vars(p)?;
    p.expect(&T::In, "'in'")?;
    let iter = expressions::parse_expr(p)?;
    let body = p.parse_block()?;
    let else_branch = if p.at(&T::Else) || p.eat_newlines_before(&[T::Else]) {
        p.bump();
        Some(p.parse_block()?)
    } else {
        None
    };
    let span = start.merge(p.last_span());
    Ok(Stmt::new(
        StmtKind::For {
            vars,
            iter,
            body,
            else_branch,
        },
        span,
    ))
}

fn parse_while(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'while'
    let cond = expressions::parse_expr(p)?;
    let body = p.parse_block()?;
    let span = start.merge(body.span);
    Ok(Stmt::new(StmtKind::While { cond, body }, span))
}

fn parse_return(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'return'
    let value = match p.current() {
        T::Newline | T::Semicolon | T::RBrace | T::Eof => None,
        _ => Some(expressions::parse_expr(p)?),
    };
    let span = value
        .as_ref()
        .map(|v| start.merge(v.span))
        .unwrap_or(start);
    Ok(Stmt::new(StmtKind::Return(value), span))
}

// ── Top-level blocks ───────────────────────────────────────────────────

enum BlockKeyword {
    Server,
    Client,
    Shared,
}

/// `server "api" { ... }` -- the string names the output bundle.
fn parse_named_block(p: &mut Parser, kw: BlockKeyword) -> Result<Stmt, ParseError> {
    let start = p.bump().span;
    let name = match p.current().clone() {
        T::Str(s) => {
            p.bump();
            Some(s)
        }
        _ => None,
    };
    let body = p.parse_block()?;
    let span = start.merge(body.span);
    let kind = match kw {
        BlockKeyword::Server => StmtKind::Server { name, body },
        BlockKeyword::Client => StmtKind::Client { name, body },
        BlockKeyword::Shared => StmtKind::Shared { name, body },
    };
    Ok(Stmt::new(kind, span))
}

fn parse_data_or_deploy(p: &mut Parser, is_data: bool) -> Result<Stmt, ParseError> {
    let start = p.bump().span;
    let (name, _) = p.expect_str("block name")?;
    let entries = parse_config_block(p)?;
    let span = start.merge(p.last_span());
    let kind = if is_data {
        StmtKind::Data { name, entries }
    } else {
        StmtKind::DeployProfile { name, entries }
    };
    Ok(Stmt::new(kind, span))
}

fn parse_test_block(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'test'
    let (name, _) = p.expect_str("test suite name")?;
    let body = p.parse_block()?;
    let span = start.merge(body.span);
    Ok(Stmt::new(StmtKind::TestBlock { name, body }, span))
}

// ── Config blocks ──────────────────────────────────────────────────────

/// Keyword tokens double as config keys (`server:` inside `deploy`).
fn config_key(p: &mut Parser) -> Result<(String, tova_common::span::Span), ParseError> {
    let span = p.current_span();
    match p.current().clone() {
        T::Ident(name) => {
            p.bump();
            Ok((name, span))
        }
        ref kind => match keyword_text(kind) {
            Some(text) => {
                p.bump();
                Ok((text.to_string(), span))
            }
            None => Err(p.err(format!(
                "expected config key, found {}",
                describe(p.current())
            ))),
        },
    }
}

fn keyword_text(kind: &T) -> Option<&'static str> {
    match kind {
        T::Server => Some("server"),
        T::Client => Some("client"),
        T::Shared => Some("shared"),
        T::Data => Some("data"),
        T::Deploy => Some("deploy"),
        T::Test => Some("test"),
        T::Type => Some("type"),
        T::For => Some("for"),
        T::If => Some("if"),
        T::Match => Some("match"),
        _ => None,
    }
}

/// `{ key: expr | key { ... } ... }`.
pub(crate) fn parse_config_block(p: &mut Parser) -> Result<Vec<ConfigEntry>, ParseError> {
    p.expect(&T::LBrace, "'{'")?;
    let mut entries = Vec::new();
    loop {
        p.skip_separators();
        if p.at(&T::RBrace) || p.at_eof() {
            break;
        }
        let (key, kspan) = config_key(p)?;
        let value = if p.eat(&T::Colon) {
            ConfigValue::Expr(expressions::parse_expr(p)?)
        } else if p.at(&T::LBrace) {
            ConfigValue::Block(parse_config_block(p)?)
        } else {
            return Err(p.err(format!("expected ':' or '{{' after config key '{key}'")));
        };
        entries.push(ConfigEntry {
            key,
            value,
            span: kspan.merge(p.last_span()),
        });
        if !p.eat(&T::Comma) {
            p.skip_separators();
        }
    }
    p.expect(&T::RBrace, "'}'")?;
    Ok(entries)
}

// ── Contextual forms ───────────────────────────────────────────────────

fn is_sep(kind: &T) -> bool {
    matches!(kind, T::Newline | T::Semicolon | T::RBrace | T::Eof)
}

fn parse_contextual_or_expr(p: &mut Parser, name: &str) -> Result<Stmt, ParseError> {
    match name {
        "state" if p.nth_is_ident(1) && p.nth(2) == &T::Eq => parse_state(p, false),
        "computed" if p.nth_is_ident(1) && p.nth(2) == &T::Eq => parse_state(p, true),
        "effect" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(StmtKind::Effect { body }, span))
        }
        "component"
            if p.nth_is_ident(1) && matches!(p.nth(2), T::LBrace | T::LParen) =>
        {
            parse_component(p)
        }
        "store" if p.nth_is_ident(1) && p.nth(2) == &T::LBrace => {
            let start = p.bump().span;
            let (sname, _) = p.expect_ident("store name")?;
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(StmtKind::Store { name: sname, body }, span))
        }
        "route" if p.nth_is_ident(1) && matches!(p.nth(2), T::Str(_)) => parse_route(p),
        "middleware"
            if p.nth(1) == &T::LBrace || (p.nth_is_ident(1) && p.nth(2) == &T::LBrace) =>
        {
            let start = p.bump().span;
            let mname = if p.at(&T::LBrace) {
                None
            } else {
                Some(p.expect_ident("middleware name")?.0)
            };
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(StmtKind::Middleware { name: mname, body }, span))
        }
        "model" if p.nth_is_ident(1) && (p.nth(2) == &T::LBrace || is_sep(p.nth(2))) => {
            let start = p.bump().span;
            let (mname, _) = p.expect_ident("model type name")?;
            let entries = if p.at(&T::LBrace) {
                parse_config_block(p)?
            } else {
                Vec::new()
            };
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::Model { name: mname, entries }, span))
        }
        "db" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let entries = parse_config_block(p)?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::Db { entries }, span))
        }
        "sse" if matches!(p.nth(1), T::Str(_)) => {
            let start = p.bump().span;
            let (path, _) = p.expect_str("SSE path")?;
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(StmtKind::Sse { path, body }, span))
        }
        "ws" if matches!(p.nth(1), T::Str(_)) => parse_ws(p),
        "auth" if p.nth_is_ident(1) && p.nth(2) == &T::LBrace => {
            let start = p.bump().span;
            let (scheme, sspan) = p.expect_ident("auth scheme")?;
            if scheme != "jwt" && scheme != "api_key" {
                return Err(ParseError::new(
                    format!("unknown auth scheme '{scheme}' (expected 'jwt' or 'api_key')"),
                    sspan,
                ));
            }
            let entries = parse_config_block(p)?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::Auth { scheme, entries }, span))
        }
        "session" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let entries = parse_config_block(p)?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::Session { entries }, span))
        }
        "schedule" if p.nth_is_ident(1) && matches!(p.nth(2), T::Str(_)) => {
            let start = p.bump().span;
            let (sname, _) = p.expect_ident("schedule name")?;
            let (spec, _) = p.expect_str("schedule spec")?;
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(
                StmtKind::Schedule {
                    name: sname,
                    spec,
                    body,
                },
                span,
            ))
        }
        "rate_limit" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let entries = parse_config_block(p)?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::RateLimit { entries }, span))
        }
        "compression" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let entries = parse_config_block(p)?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::Compression { entries }, span))
        }
        "upload" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let entries = parse_config_block(p)?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::Upload { entries }, span))
        }
        "cors" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let entries = parse_config_block(p)?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::Cors { entries }, span))
        }
        "env" if p.nth_is_ident(1) && (matches!(p.nth(2), T::Colon | T::Eq) || is_sep(p.nth(2))) => {
            let start = p.bump().span;
            let (ename, _) = p.expect_ident("env var name")?;
            let ty = if p.eat(&T::Colon) {
                Some(parse_type_expr(p)?)
            } else {
                None
            };
            let default = if p.eat(&T::Eq) {
                Some(expressions::parse_expr(p)?)
            } else {
                None
            };
            let span = start.merge(p.last_span());
            Ok(Stmt::new(
                StmtKind::EnvDecl {
                    name: ename,
                    ty,
                    default,
                },
                span,
            ))
        }
        "on_start" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(StmtKind::OnStart(body), span))
        }
        "on_stop" if p.nth(1) == &T::LBrace => {
            let start = p.bump().span;
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(StmtKind::OnStop(body), span))
        }
        "on_error" if p.nth(1) == &T::LParen => {
            let start = p.bump().span;
            p.expect(&T::LParen, "'('")?;
            let (param, _) = p.expect_ident("error parameter")?;
            p.expect(&T::RParen, "')'")?;
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(StmtKind::OnError { param, body }, span))
        }
        "health" if matches!(p.nth(1), T::Str(_)) || is_sep(p.nth(1)) => {
            let start = p.bump().span;
            let path = match p.current().clone() {
                T::Str(s) => {
                    p.bump();
                    Some(s)
                }
                _ => None,
            };
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::Health { path }, span))
        }
        "static" if matches!(p.nth(1), T::Str(_)) && matches!(p.nth(2), T::Str(_)) => {
            let start = p.bump().span;
            let (route, _) = p.expect_str("static route")?;
            let (dir, _) = p.expect_str("static directory")?;
            let span = start.merge(p.last_span());
            Ok(Stmt::new(StmtKind::StaticDir { route, dir }, span))
        }
        "background" if p.nth_is_ident(1) && p.nth(2) == &T::LParen => {
            let start = p.bump().span;
            let (bname, _) = p.expect_ident("job name")?;
            p.expect(&T::LParen, "'('")?;
            let params = parse_params(p)?;
            p.expect(&T::RParen, "')'")?;
            let body = p.parse_block()?;
            let span = start.merge(body.span);
            Ok(Stmt::new(
                StmtKind::Background {
                    name: bname,
                    params,
                    body,
                },
                span,
            ))
        }
        "form" if p.nth_is_ident(1) && matches!(p.nth(2), T::LBrace | T::Colon) => parse_form(p),
        _ => parse_expr_stmt(p),
    }
}

fn parse_state(p: &mut Parser, computed: bool) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'state' / 'computed'
    let (name, _) = p.expect_ident("name")?;
    p.expect(&T::Eq, "'='")?;
    let value = expressions::parse_expr(p)?;
    let span = start.merge(value.span);
    let kind = if computed {
        StmtKind::Computed { name, value }
    } else {
        StmtKind::State { name, value }
    };
    Ok(Stmt::new(kind, span))
}

fn parse_component(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'component'
    let (name, _) = p.expect_ident("component name")?;
    let params = if p.eat(&T::LParen) {
        let params = parse_params(p)?;
        p.expect(&T::RParen, "')'")?;
        params
    } else {
        Vec::new()
    };
    let body = p.parse_block()?;
    let span = start.merge(body.span);
    Ok(Stmt::new(StmtKind::Component { name, params, body }, span))
}

fn parse_route(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'route'
    let (method, mspan) = p.expect_ident("HTTP method")?;
    const METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];
    if !METHODS.contains(&method.as_str()) {
        return Err(ParseError::new(
            format!("unknown route method '{method}'"),
            mspan,
        ));
    }
    let (path, _) = p.expect_str("route path")?;
    let body = p.parse_block()?;
    let span = start.merge(body.span);
    Ok(Stmt::new(StmtKind::Route { method, path, body }, span))
}

fn parse_ws(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'ws'
    let (path, _) = p.expect_str("WebSocket path")?;
    p.expect(&T::LBrace, "'{'")?;
    let mut handlers = Vec::new();
    loop {
        p.skip_separators();
        if p.at(&T::RBrace) || p.at_eof() {
            break;
        }
        let (hname, hspan) = p.expect_ident("handler name")?;
        let kind = match hname.as_str() {
            "on_open" => WsHandlerKind::Open,
            "on_message" => WsHandlerKind::Message,
            "on_close" => WsHandlerKind::Close,
            other => {
                return Err(ParseError::new(
                    format!("unknown WebSocket handler '{other}'"),
                    hspan,
                ))
            }
        };
        p.expect(&T::LParen, "'('")?;
        let mut params = Vec::new();
        while !p.at(&T::RParen) && !p.at_eof() {
            params.push(p.expect_ident("parameter name")?.0);
            if !p.eat(&T::Comma) {
                break;
            }
        }
        p.expect(&T::RParen, "')'")?;
        let body = p.parse_block()?;
        handlers.push(WsHandler {
            kind,
            params,
            body,
            span: hspan.merge(p.last_span()),
        });
    }
    let close = p.expect(&T::RBrace, "'}'")?;
    let span = start.merge(close.span);
    Ok(Stmt::new(StmtKind::Ws { path, handlers }, span))
}

// ── Forms ──────────────────────────────────────────────────────────────

fn parse_form(p: &mut Parser) -> Result<Stmt, ParseError> {
    let start = p.bump().span; // 'form'
    let (name, _) = p.expect_ident("form name")?;
    let ty = if p.eat(&T::Colon) {
        Some(p.expect_ident("form type")?.0)
    } else {
        None
    };
    let members = parse_form_members(p)?;
    let span = start.merge(p.last_span());
    Ok(Stmt::new(
        StmtKind::Form(FormDecl {
            name,
            ty,
            members,
            span,
        }),
        span,
    ))
}

/// `{ field ... group ... array ... steps ... on submit { ... } }`.
fn parse_form_members(p: &mut Parser) -> Result<Vec<FormMember>, ParseError> {
    p.expect(&T::LBrace, "'{'")?;
    let mut members = Vec::new();
    loop {
        p.skip_separators();
        if p.at(&T::RBrace) || p.at_eof() {
            break;
        }
        let (kw, kwspan) = p.expect_ident("form member")?;
        match kw.as_str() {
            "field" => {
                let (fname, _) = p.expect_ident("field name")?;
                let ty = if p.eat(&T::Colon) {
                    Some(p.expect_ident("field type")?.0)
                } else {
                    None
                };
                let rules = if p.at(&T::LBrace) {
                    parse_config_block(p)?
                } else {
                    Vec::new()
                };
                members.push(FormMember::Field {
                    name: fname,
                    ty,
                    rules,
                });
            }
            "group" => {
                let (gname, _) = p.expect_ident("group name")?;
                let inner = parse_form_members(p)?;
                members.push(FormMember::Group {
                    name: gname,
                    members: inner,
                });
            }
            "array" => {
                let (aname, _) = p.expect_ident("array name")?;
                let inner = parse_form_members(p)?;
                members.push(FormMember::Array {
                    name: aname,
                    members: inner,
                });
            }
            "steps" => {
                p.expect(&T::LBrace, "'{'")?;
                let mut steps = Vec::new();
                loop {
                    p.skip_separators();
                    if p.at(&T::RBrace) || p.at_eof() {
                        break;
                    }
                    let (sname, _) = p.expect_ident("step name")?;
                    p.expect(&T::LBrace, "'{'")?;
                    let mut step_fields = Vec::new();
                    loop {
                        p.skip_separators();
                        if p.at(&T::RBrace) || p.at_eof() {
                            break;
                        }
                        step_fields.push(p.expect_ident("field name")?.0);
                        if !p.eat(&T::Comma) {
                            p.skip_separators();
                        }
                    }
                    p.expect(&T::RBrace, "'}'")?;
                    steps.push(FormStep {
                        name: sname,
                        fields: step_fields,
                    });
                }
                p.expect(&T::RBrace, "'}'")?;
                members.push(FormMember::Steps(steps));
            }
            "on" => {
                let (what, wspan) = p.expect_ident("'submit'")?;
                if what != "submit" {
                    return Err(ParseError::new(
                        format!("expected 'submit' after 'on', found '{what}'"),
                        wspan,
                    ));
                }
                let body = p.parse_block()?;
                members.push(FormMember::OnSubmit(body));
            }
            other => {
                return Err(ParseError::new(
                    format!("unknown form member '{other}'"),
                    kwspan,
                ))
            }
        }
    }
    p.expect(&T::RBrace, "'}'")?;
    Ok(members)
}
