//! Expression parsing: the precedence ladder, primaries, lambdas with
//! bounded backtracking, comprehensions, match expressions and patterns.
//!
//! Precedence, highest to lowest (all left-associative unless noted):
//! postfix, unary prefix, `**` (right), `* / %`, `+ - ++`, `.. ..=`
//! (non-assoc), comparisons (with chain detection), `== != in not-in`,
//! `and`, `or`, `??`, `|>`.

use tova_common::token::TokenKind as T;

use crate::ast::*;
use crate::error::ParseError;
use crate::parser::{describe, items, jsx, Parser};

pub(crate) fn parse_expr(p: &mut Parser) -> Result<Expr, ParseError> {
    parse_pipe(p)
}

/// `|>` -- lowest precedence.
fn parse_pipe(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut lhs = parse_coalesce(p)?;
    while p.at(&T::PipeOp) {
        p.bump();
        let rhs = parse_coalesce(p)?;
        let span = lhs.span.merge(rhs.span);
        lhs = Expr::new(
            ExprKind::Pipe {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    Ok(lhs)
}

/// `??` -- binds looser than `or`.
fn parse_coalesce(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut lhs = parse_or(p)?;
    while p.at(&T::QuestionQuestion) {
        p.bump();
        let rhs = parse_or(p)?;
        let span = lhs.span.merge(rhs.span);
        lhs = Expr::new(
            ExprKind::Binary {
                op: BinOp::NullCoalesce,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    Ok(lhs)
}

fn parse_or(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut lhs = parse_and(p)?;
    while p.at(&T::Or) || p.at(&T::PipePipe) {
        p.bump();
        let rhs = parse_and(p)?;
        let span = lhs.span.merge(rhs.span);
        lhs = Expr::new(
            ExprKind::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    Ok(lhs)
}

fn parse_and(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut lhs = parse_equality(p)?;
    while p.at(&T::And) || p.at(&T::AmpAmp) {
        p.bump();
        let rhs = parse_equality(p)?;
        let span = lhs.span.merge(rhs.span);
        lhs = Expr::new(
            ExprKind::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    Ok(lhs)
}

/// `== !=` and membership `in` / `not in`.
fn parse_equality(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut lhs = parse_comparison(p)?;
    loop {
        let op = match p.current() {
            T::EqEq => Some(BinOp::Eq),
            T::NotEq => Some(BinOp::NotEq),
            T::In => None,
            T::Not if p.nth(1) == &T::In => None,
            _ => break,
        };
        match op {
            Some(op) => {
                p.bump();
                let rhs = parse_comparison(p)?;
                let span = lhs.span.merge(rhs.span);
                lhs = Expr::new(
                    ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                );
            }
            None => {
                let negated = p.at(&T::Not);
                if negated {
                    p.bump(); // not
                }
                p.bump(); // in
                let collection = parse_comparison(p)?;
                let span = lhs.span.merge(collection.span);
                lhs = Expr::new(
                    ExprKind::Membership {
                        negated,
                        item: Box::new(lhs),
                        collection: Box::new(collection),
                    },
                    span,
                );
            }
        }
    }
    Ok(lhs)
}

/// `< <= > >=` with chained-comparison recognition: three or more
/// operands become a single `ChainedCmp` node.
fn parse_comparison(p: &mut Parser) -> Result<Expr, ParseError> {
    let first = parse_range(p)?;
    let mut ops = Vec::new();
    let mut operands = vec![first];
    loop {
        let op = match p.current() {
            T::Lt => CmpOp::Lt,
            T::LtEq => CmpOp::LtEq,
            T::Gt => CmpOp::Gt,
            T::GtEq => CmpOp::GtEq,
            _ => break,
        };
        p.bump();
        ops.push(op);
        operands.push(parse_range(p)?);
    }
    match ops.len() {
        0 => Ok(operands.pop().expect("one operand parsed")),
        1 => {
            let rhs = operands.pop().expect("two operands parsed");
            let lhs = operands.pop().expect("two operands parsed");
            let span = lhs.span.merge(rhs.span);
            Ok(Expr::new(
                ExprKind::Cmp {
                    op: ops[0],
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ))
        }
        _ => {
            let span = operands
                .first()
                .expect("chain has operands")
                .span
                .merge(operands.last().expect("chain has operands").span);
            Ok(Expr::new(ExprKind::ChainedCmp { operands, ops }, span))
        }
    }
}

/// `..` / `..=` -- non-associative.
fn parse_range(p: &mut Parser) -> Result<Expr, ParseError> {
    let lhs = parse_additive(p)?;
    let inclusive = match p.current() {
        T::DotDot => false,
        T::DotDotEq => true,
        _ => return Ok(lhs),
    };
    p.bump();
    let rhs = parse_additive(p)?;
    let span = lhs.span.merge(rhs.span);
    Ok(Expr::new(
        ExprKind::Range {
            start: Box::new(lhs),
            end: Box::new(rhs),
            inclusive,
        },
        span,
    ))
}

fn parse_additive(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut lhs = parse_multiplicative(p)?;
    loop {
        let op = match p.current() {
            T::Plus => BinOp::Add,
            T::Minus => BinOp::Sub,
            T::PlusPlus => BinOp::Concat,
            _ => break,
        };
        p.bump();
        let rhs = parse_multiplicative(p)?;
        let span = lhs.span.merge(rhs.span);
        lhs = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    Ok(lhs)
}

fn parse_multiplicative(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut lhs = parse_power(p)?;
    loop {
        let op = match p.current() {
            T::Star => BinOp::Mul,
            T::Slash => BinOp::Div,
            T::Percent => BinOp::Rem,
            _ => break,
        };
        p.bump();
        let rhs = parse_power(p)?;
        let span = lhs.span.merge(rhs.span);
        lhs = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    Ok(lhs)
}

/// `**` -- right-associative.
fn parse_power(p: &mut Parser) -> Result<Expr, ParseError> {
    let lhs = parse_unary(p)?;
    if p.at(&T::StarStar) {
        p.bump();
        let rhs = parse_power(p)?;
        let span = lhs.span.merge(rhs.span);
        return Ok(Expr::new(
            ExprKind::Binary {
                op: BinOp::Pow,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        ));
    }
    Ok(lhs)
}

fn parse_unary(p: &mut Parser) -> Result<Expr, ParseError> {
    let op = match p.current() {
        T::Minus => Some(UnOp::Neg),
        T::Not | T::Bang => Some(UnOp::Not),
        _ => None,
    };
    if let Some(op) = op {
        let start = p.current_span();
        p.bump();
        let operand = parse_unary(p)?;
        let span = start.merge(operand.span);
        return Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ));
    }
    parse_postfix(p)
}

/// Postfix chain: member, optional chain, index/slice, call, propagate.
fn parse_postfix(p: &mut Parser) -> Result<Expr, ParseError> {
    let mut expr = parse_primary(p)?;
    loop {
        match p.current() {
            T::Dot => {
                p.bump();
                let (name, nspan) = p.expect_ident("member name")?;
                let span = expr.span.merge(nspan);
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        name,
                        optional: false,
                    },
                    span,
                );
            }
            T::QuestionDot => {
                p.bump();
                let (name, nspan) = p.expect_ident("member name")?;
                let span = expr.span.merge(nspan);
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        name,
                        optional: true,
                    },
                    span,
                );
            }
            T::LBracket => {
                expr = parse_index_or_slice(p, expr)?;
            }
            T::LParen => {
                let args = parse_call_args(p)?;
                let span = expr.span.merge(p.last_span());
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            }
            T::Question => {
                let q = p.bump();
                let span = expr.span.merge(q.span);
                expr = Expr::new(ExprKind::Propagate(Box::new(expr)), span);
            }
            _ => break,
        }
    }
    Ok(expr)
}

/// `xs[i]`, `xs[a:b]`, `xs[a:b:c]`, `xs[::-1]` -- any slice part optional.
fn parse_index_or_slice(p: &mut Parser, object: Expr) -> Result<Expr, ParseError> {
    p.bump(); // '['

    let start = if p.at(&T::Colon) {
        None
    } else {
        Some(Box::new(parse_expr(p)?))
    };

    if !p.at(&T::Colon) {
        // Plain index.
        let index = start.ok_or_else(|| p.err("expected index expression"))?;
        let close = p.expect(&T::RBracket, "']'")?;
        let span = object.span.merge(close.span);
        return Ok(Expr::new(
            ExprKind::Index {
                object: Box::new(object),
                index,
            },
            span,
        ));
    }

    p.bump(); // first ':'
    let end = if p.at(&T::Colon) || p.at(&T::RBracket) {
        None
    } else {
        Some(Box::new(parse_expr(p)?))
    };
    let step = if p.eat(&T::Colon) {
        if p.at(&T::RBracket) {
            None
        } else {
            Some(Box::new(parse_expr(p)?))
        }
    } else {
        None
    };
    let close = p.expect(&T::RBracket, "']'")?;
    let span = object.span.merge(close.span);
    Ok(Expr::new(
        ExprKind::Slice {
            object: Box::new(object),
            start,
            end,
            step,
        },
        span,
    ))
}

/// Call arguments: positional, `name: value` named, or `...spread`.
fn parse_call_args(p: &mut Parser) -> Result<Vec<Arg>, ParseError> {
    p.bump(); // '('
    let mut args = Vec::new();
    while !p.at(&T::RParen) && !p.at_eof() {
        if p.at(&T::Ellipsis) {
            let start = p.bump().span;
            let value = parse_expr(p)?;
            let span = start.merge(value.span);
            args.push(Arg {
                name: None,
                value: Expr::new(ExprKind::Spread(Box::new(value)), span),
            });
        } else if matches!(p.current(), T::Ident(_)) && p.nth(1) == &T::Colon {
            let (name, _) = p.expect_ident("argument name")?;
            p.bump(); // ':'
            let value = parse_expr(p)?;
            args.push(Arg {
                name: Some(name),
                value,
            });
        } else {
            args.push(Arg {
                name: None,
                value: parse_expr(p)?,
            });
        }
        if !p.eat(&T::Comma) {
            break;
        }
    }
    p.expect(&T::RParen, "')'")?;
    Ok(args)
}

// ── Primaries ──────────────────────────────────────────────────────────

fn parse_primary(p: &mut Parser) -> Result<Expr, ParseError> {
    let span = p.current_span();
    match p.current().clone() {
        T::Int(v) => {
            p.bump();
            Ok(Expr::new(ExprKind::Int(v), span))
        }
        T::Float(v) => {
            p.bump();
            Ok(Expr::new(ExprKind::Float(v), span))
        }
        T::Str(s) => {
            p.bump();
            Ok(Expr::new(ExprKind::Str(s), span))
        }
        T::TemplateStr(parts) => {
            p.bump();
            let chunks = p.template_chunks(parts, span)?;
            Ok(Expr::new(ExprKind::Template(chunks), span))
        }
        T::True => {
            p.bump();
            Ok(Expr::new(ExprKind::Bool(true), span))
        }
        T::False => {
            p.bump();
            Ok(Expr::new(ExprKind::Bool(false), span))
        }
        T::Nil => {
            p.bump();
            Ok(Expr::new(ExprKind::Nil, span))
        }
        T::Ident(name) => {
            p.bump();
            if name == "_" {
                Ok(Expr::new(ExprKind::PipeTarget, span))
            } else {
                Ok(Expr::new(ExprKind::Ident(name), span))
            }
        }
        T::LParen => parse_paren(p),
        T::LBracket => parse_array_or_comp(p),
        T::LBrace => parse_object_or_dict_comp(p),
        T::Fn => parse_fn_lambda(p),
        T::If => parse_if_expr(p),
        T::Match => parse_match(p),
        T::Lt => {
            let node = jsx::parse_jsx(p)?;
            let span = node.span;
            Ok(Expr::new(ExprKind::Jsx(Box::new(node)), span))
        }
        T::Ellipsis => {
            p.bump();
            let value = parse_expr(p)?;
            let full = span.merge(value.span);
            Ok(Expr::new(ExprKind::Spread(Box::new(value)), full))
        }
        other => Err(p.err(format!("expected expression, found {}", describe(&other)))),
    }
}

/// Open paren: bounded backtracking distinguishes `(a, b) => ...` lambdas
/// from grouped expressions and tuples. A single identifier `(x)` not
/// followed by `=>` unwraps to the identifier.
fn parse_paren(p: &mut Parser) -> Result<Expr, ParseError> {
    if let Some(lambda) = try_paren_lambda(p) {
        return Ok(lambda);
    }

    let open = p.bump(); // '('
    let first = parse_expr(p)?;
    if p.at(&T::Comma) {
        let mut elems = vec![first];
        while p.eat(&T::Comma) {
            if p.at(&T::RParen) {
                break;
            }
            elems.push(parse_expr(p)?);
        }
        let close = p.expect(&T::RParen, "')'")?;
        return Ok(Expr::new(
            ExprKind::Tuple(elems),
            open.span.merge(close.span),
        ));
    }
    p.expect(&T::RParen, "')'")?;
    Ok(first)
}

fn try_paren_lambda(p: &mut Parser) -> Option<Expr> {
    let snap = p.snapshot();
    match paren_lambda_inner(p) {
        Ok(Some(expr)) => Some(expr),
        _ => {
            p.restore(snap);
            None
        }
    }
}

fn paren_lambda_inner(p: &mut Parser) -> Result<Option<Expr>, ParseError> {
    let start = p.current_span();
    p.bump(); // '('
    let mut params = Vec::new();
    if !p.at(&T::RParen) {
        loop {
            let (name, nspan) = match p.current().clone() {
                T::Ident(name) => {
                    let tok = p.bump();
                    (name, tok.span)
                }
                _ => return Ok(None),
            };
            let ty = if p.eat(&T::Colon) {
                Some(items::parse_type_expr(p)?)
            } else {
                None
            };
            let default = if p.eat(&T::Eq) {
                Some(parse_expr(p)?)
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
    }
    if !p.eat(&T::RParen) {
        return Ok(None);
    }
    if !p.at(&T::FatArrow) {
        return Ok(None);
    }
    p.bump(); // '=>'
    let body = parse_lambda_body(p)?;
    let span = start.merge(p.last_span());
    Ok(Some(Expr::new(ExprKind::Lambda { params, body }, span)))
}

/// `fn(params) body` lambda form.
fn parse_fn_lambda(p: &mut Parser) -> Result<Expr, ParseError> {
    let start = p.bump().span; // 'fn'
    p.expect(&T::LParen, "'('")?;
    let params = items::parse_params(p)?;
    p.expect(&T::RParen, "')'")?;
    let body = parse_lambda_body(p)?;
    let span = start.merge(p.last_span());
    Ok(Expr::new(ExprKind::Lambda { params, body }, span))
}

fn parse_lambda_body(p: &mut Parser) -> Result<LambdaBody, ParseError> {
    if p.at(&T::LBrace) {
        Ok(LambdaBody::Block(p.parse_block()?))
    } else {
        Ok(LambdaBody::Expr(Box::new(parse_expr(p)?)))
    }
}

/// `[a, b]` array literal or `[e for x in xs if cond]` comprehension.
fn parse_array_or_comp(p: &mut Parser) -> Result<Expr, ParseError> {
    let open = p.bump(); // '['
    if p.at(&T::RBracket) {
        let close = p.bump();
        return Ok(Expr::new(ExprKind::Array(Vec::new()), open.span.merge(close.span)));
    }

    let first = if p.at(&T::Ellipsis) {
        let start = p.bump().span;
        let value = parse_expr(p)?;
        let span = start.merge(value.span);
        Expr::new(ExprKind::Spread(Box::new(value)), span)
    } else {
        parse_expr(p)?
    };

    if p.at(&T::For) {
        p.bump();
        let vars = parse_loop_vars(p)?;
        p.expect(&T::In, "'in'")?;
        let iter = parse_expr(p)?;
        let filter = if p.eat(&T::If) {
            Some(Box::new(parse_expr(p)?))
        } else {
            None
        };
        let close = p.expect(&T::RBracket, "']'")?;
        return Ok(Expr::new(
            ExprKind::ListComp {
                element: Box::new(first),
                vars,
                iter: Box::new(iter),
                filter,
            },
            open.span.merge(close.span),
        ));
    }

    let mut elems = vec![first];
    while p.eat(&T::Comma) {
        if p.at(&T::RBracket) {
            break;
        }
        if p.at(&T::Ellipsis) {
            let start = p.bump().span;
            let value = parse_expr(p)?;
            let span = start.merge(value.span);
            elems.push(Expr::new(ExprKind::Spread(Box::new(value)), span));
        } else {
            elems.push(parse_expr(p)?);
        }
    }
    let close = p.expect(&T::RBracket, "']'")?;
    Ok(Expr::new(ExprKind::Array(elems), open.span.merge(close.span)))
}

/// Loop variables: one or two comma-separated names.
pub(crate) fn parse_loop_vars(p: &mut Parser) -> Result<Vec<String>, ParseError> {
    let mut vars = vec![p.expect_ident("loop variable")?.0];
    if p.eat(&T::Comma) {
        vars.push(p.expect_ident("loop variable")?.0);
    }
    Ok(vars)
}

/// `{a, b}`, `{k: v, ...rest}` object literal, or
/// `{k: v for k, v in pairs}` dict comprehension.
fn parse_object_or_dict_comp(p: &mut Parser) -> Result<Expr, ParseError> {
    let open = p.bump(); // '{'
    p.skip_newlines();

    if p.at(&T::RBrace) {
        let close = p.bump();
        return Ok(Expr::new(ExprKind::Object(Vec::new()), open.span.merge(close.span)));
    }

    let mut entries = Vec::new();

    // First entry parsed by hand: a `k: v` pair followed by `for` commits
    // to a dict comprehension.
    if matches!(p.current(), T::Ident(_)) && p.nth(1) == &T::Colon {
        let (key, kspan) = p.expect_ident("object key")?;
        p.bump(); // ':'
        let value = parse_expr(p)?;
        if p.at(&T::For) {
            p.bump();
            let vars = parse_loop_vars(p)?;
            p.expect(&T::In, "'in'")?;
            let iter = parse_expr(p)?;
            let filter = if p.eat(&T::If) {
                Some(Box::new(parse_expr(p)?))
            } else {
                None
            };
            p.skip_newlines();
            let close = p.expect(&T::RBrace, "'}'")?;
            return Ok(Expr::new(
                ExprKind::DictComp {
                    key: Box::new(Expr::new(ExprKind::Ident(key), kspan)),
                    value: Box::new(value),
                    vars,
                    iter: Box::new(iter),
                    filter,
                },
                open.span.merge(close.span),
            ));
        }
        entries.push(ObjectEntry::Pair { key, value });
    } else {
        entries.push(parse_object_entry(p)?);
    }

    loop {
        p.skip_newlines();
        if !p.eat(&T::Comma) && !matches!(p.current(), T::Ident(_) | T::Str(_) | T::Ellipsis) {
            break;
        }
        p.skip_newlines();
        if p.at(&T::RBrace) {
            break;
        }
        entries.push(parse_object_entry(p)?);
    }
    p.skip_newlines();
    let close = p.expect(&T::RBrace, "'}'")?;
    Ok(Expr::new(ExprKind::Object(entries), open.span.merge(close.span)))
}

fn parse_object_entry(p: &mut Parser) -> Result<ObjectEntry, ParseError> {
    if p.at(&T::Ellipsis) {
        p.bump();
        let value = parse_expr(p)?;
        return Ok(ObjectEntry::Spread(value));
    }
    let key = match p.current().clone() {
        T::Ident(name) => {
            p.bump();
            name
        }
        T::Str(s) => {
            p.bump();
            s
        }
        other => return Err(p.err(format!("expected object key, found {}", describe(&other)))),
    };
    if p.eat(&T::Colon) {
        let value = parse_expr(p)?;
        Ok(ObjectEntry::Pair { key, value })
    } else {
        Ok(ObjectEntry::Shorthand(key))
    }
}

// ── If expressions ─────────────────────────────────────────────────────

/// Shared by statement-level `if` and if-expressions.
pub(crate) fn parse_if_parts(
    p: &mut Parser,
) -> Result<(Expr, Block, Vec<(Expr, Block)>, Option<Block>), ParseError> {
    p.bump(); // 'if'
    let cond = parse_expr(p)?;
    let then_branch = p.parse_block()?;
    let mut elifs = Vec::new();
    let mut else_branch = None;
    loop {
        let chained = p.at(&T::Elif)
            || p.at(&T::Else)
            || p.eat_newlines_before(&[T::Elif, T::Else]);
        if !chained {
            break;
        }
        if p.at(&T::Elif) {
            p.bump();
            let c = parse_expr(p)?;
            let b = p.parse_block()?;
            elifs.push((c, b));
        } else {
            p.bump(); // 'else'
            else_branch = Some(p.parse_block()?);
            break;
        }
    }
    Ok((cond, then_branch, elifs, else_branch))
}

fn parse_if_expr(p: &mut Parser) -> Result<Expr, ParseError> {
    let start = p.current_span();
    let (cond, then_branch, elifs, else_branch) = parse_if_parts(p)?;
    let span = start.merge(p.last_span());
    Ok(Expr::new(
        ExprKind::If {
            cond: Box::new(cond),
            then_branch,
            elifs,
            else_branch,
        },
        span,
    ))
}

// ── Match expressions and patterns ─────────────────────────────────────

fn parse_match(p: &mut Parser) -> Result<Expr, ParseError> {
    let start = p.bump().span; // 'match'
    let subject = parse_expr(p)?;
    p.expect(&T::LBrace, "'{'")?;

    let mut arms = Vec::new();
    loop {
        p.skip_separators();
        if p.at(&T::RBrace) || p.at_eof() {
            break;
        }
        let arm_start = p.current_span();
        let pattern = parse_pattern_alternatives(p)?;
        let guard = if p.eat(&T::If) {
            Some(parse_expr(p)?)
        } else {
            None
        };
        p.expect(&T::FatArrow, "'=>'")?;
        let body = if p.at(&T::LBrace) {
            ArmBody::Block(p.parse_block()?)
        } else {
            ArmBody::Expr(Box::new(parse_expr(p)?))
        };
        arms.push(MatchArm {
            pattern,
            guard,
            body,
            span: arm_start.merge(p.last_span()),
        });
        if !p.eat(&T::Comma) {
            p.skip_separators();
            if p.at(&T::RBrace) {
                break;
            }
        }
    }
    let close = p.expect(&T::RBrace, "'}'")?;
    Ok(Expr::new(
        ExprKind::Match {
            subject: Box::new(subject),
            arms,
        },
        start.merge(close.span),
    ))
}

/// `pat | pat | ...`
fn parse_pattern_alternatives(p: &mut Parser) -> Result<Pattern, ParseError> {
    let first = parse_pattern(p)?;
    if !p.at(&T::Bar) {
        return Ok(first);
    }
    let start = first.span;
    let mut alts = vec![first];
    while p.eat(&T::Bar) {
        alts.push(parse_pattern(p)?);
    }
    let span = start.merge(alts.last().expect("at least one alternative").span);
    Ok(Pattern {
        kind: PatternKind::Or(alts),
        span,
    })
}

pub(crate) fn parse_pattern(p: &mut Parser) -> Result<Pattern, ParseError> {
    let span = p.current_span();
    match p.current().clone() {
        T::Ident(name) => {
            p.bump();
            if name == "_" {
                return Ok(Pattern { kind: PatternKind::Wildcard, span });
            }
            if name.chars().next().is_some_and(|c| c.is_uppercase()) {
                // Variant pattern, with optional positional fields.
                let mut fields = Vec::new();
                let mut end = span;
                if p.at(&T::LParen) {
                    p.bump();
                    while !p.at(&T::RParen) && !p.at_eof() {
                        fields.push(parse_pattern(p)?);
                        if !p.eat(&T::Comma) {
                            break;
                        }
                    }
                    end = p.expect(&T::RParen, "')'")?.span;
                }
                return Ok(Pattern {
                    kind: PatternKind::Variant { name, fields },
                    span: span.merge(end),
                });
            }
            Ok(Pattern { kind: PatternKind::Binding(name), span })
        }
        T::Int(v) => {
            p.bump();
            self::finish_numeric_pattern(p, Expr::new(ExprKind::Int(v), span), span)
        }
        T::Float(v) => {
            p.bump();
            self::finish_numeric_pattern(p, Expr::new(ExprKind::Float(v), span), span)
        }
        T::Minus => {
            p.bump();
            let lit_span = p.current_span();
            match p.current().clone() {
                T::Int(v) => {
                    p.bump();
                    let full = span.merge(lit_span);
                    self::finish_numeric_pattern(p, Expr::new(ExprKind::Int(-v), full), full)
                }
                T::Float(v) => {
                    p.bump();
                    let full = span.merge(lit_span);
                    self::finish_numeric_pattern(p, Expr::new(ExprKind::Float(-v), full), full)
                }
                other => Err(p.err(format!("expected number after '-', found {}", describe(&other)))),
            }
        }
        T::Str(s) => {
            p.bump();
            Ok(Pattern { kind: PatternKind::Str(s), span })
        }
        T::True => {
            p.bump();
            Ok(Pattern { kind: PatternKind::Bool(true), span })
        }
        T::False => {
            p.bump();
            Ok(Pattern { kind: PatternKind::Bool(false), span })
        }
        T::Nil => {
            p.bump();
            Ok(Pattern { kind: PatternKind::Nil, span })
        }
        T::LBracket => {
            p.bump();
            let mut elems = Vec::new();
            while !p.at(&T::RBracket) && !p.at_eof() {
                elems.push(parse_pattern(p)?);
                if !p.eat(&T::Comma) {
                    break;
                }
            }
            let close = p.expect(&T::RBracket, "']'")?;
            Ok(Pattern {
                kind: PatternKind::Array(elems),
                span: span.merge(close.span),
            })
        }
        other => Err(p.err(format!("expected pattern, found {}", describe(&other)))),
    }
}

/// After a leading numeric literal, `..`/`..=` turns the pattern into a
/// range; otherwise it stays a literal pattern.
fn finish_numeric_pattern(
    p: &mut Parser,
    start_expr: Expr,
    span: tova_common::span::Span,
) -> Result<Pattern, ParseError> {
    let inclusive = match p.current() {
        T::DotDot => false,
        T::DotDotEq => true,
        _ => {
            let kind = match start_expr.kind {
                ExprKind::Int(v) => PatternKind::Int(v),
                ExprKind::Float(v) => PatternKind::Float(v),
                _ => unreachable!("numeric literal pattern"),
            };
            return Ok(Pattern { kind, span });
        }
    };
    p.bump();
    let end_span = p.current_span();
    let negative = p.eat(&T::Minus);
    let end_expr = match p.current().clone() {
        T::Int(v) => {
            p.bump();
            Expr::new(ExprKind::Int(if negative { -v } else { v }), end_span)
        }
        T::Float(v) => {
            p.bump();
            Expr::new(ExprKind::Float(if negative { -v } else { v }), end_span)
        }
        other => return Err(p.err(format!("expected range end, found {}", describe(&other)))),
    };
    let full = span.merge(end_expr.span);
    Ok(Pattern {
        kind: PatternKind::Range {
            start: Box::new(start_expr),
            end: Box::new(end_expr),
            inclusive,
        },
        span: full,
    })
}
