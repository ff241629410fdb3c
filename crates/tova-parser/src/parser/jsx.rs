//! JSX parsing. The lexer has already carved the element structure into
//! tokens (tag interiors, collapsed text runs, `{expr}` holes, control
//! keywords); this module assembles them into [`JsxNode`] trees.

use tova_common::token::TokenKind as T;

use crate::ast::*;
use crate::error::ParseError;
use crate::parser::{describe, expressions, Parser};

/// What ends a children region: the element's closing tag, or the `}` of
/// an `if`/`for` control block.
#[derive(PartialEq, Clone, Copy)]
enum Terminator {
    Tag,
    Brace,
}

pub(crate) fn parse_jsx(p: &mut Parser) -> Result<JsxNode, ParseError> {
    let start = p.expect(&T::Lt, "'<'")?.span;

    // `<>` opens a fragment.
    if p.at(&T::Gt) {
        p.bump();
        let (children, _) = parse_children(p, Terminator::Tag)?;
        let span = start.merge(p.last_span());
        return Ok(JsxNode {
            kind: JsxNodeKind::Fragment { children },
            span,
        });
    }

    let (tag, _) = p.expect_ident("tag name")?;
    let mut attrs = Vec::new();
    loop {
        match p.current().clone() {
            T::Slash => {
                p.bump();
                let close = p.expect(&T::Gt, "'>'")?;
                return Ok(JsxNode {
                    kind: JsxNodeKind::Element {
                        tag,
                        attrs,
                        children: Vec::new(),
                    },
                    span: start.merge(close.span),
                });
            }
            T::Gt => {
                p.bump();
                break;
            }
            T::Ident(name) => {
                let aspan = p.bump().span;
                let value = if p.eat(&T::Eq) {
                    parse_attr_value(p)?
                } else {
                    JsxAttrValue::Bare
                };
                attrs.push(JsxAttr {
                    name,
                    value,
                    span: aspan.merge(p.last_span()),
                });
            }
            other => {
                return Err(p.err(format!(
                    "expected attribute or '>', found {}",
                    describe(&other)
                )))
            }
        }
    }

    let (children, closing) = parse_children(p, Terminator::Tag)?;
    if let Some(closing) = closing {
        if closing != tag {
            return Err(ParseError::new(
                format!("mismatched closing tag: expected '</{tag}>', found '</{closing}>'"),
                p.last_span(),
            ));
        }
    }
    let span = start.merge(p.last_span());
    Ok(JsxNode {
        kind: JsxNodeKind::Element {
            tag,
            attrs,
            children,
        },
        span,
    })
}

fn parse_attr_value(p: &mut Parser) -> Result<JsxAttrValue, ParseError> {
    match p.current().clone() {
        T::Str(s) => {
            p.bump();
            Ok(JsxAttrValue::Str(s))
        }
        T::TemplateStr(parts) => {
            let tok = p.bump();
            Ok(JsxAttrValue::Template(p.template_chunks(parts, tok.span)?))
        }
        T::LBrace => {
            p.bump();
            let expr = expressions::parse_expr(p)?;
            p.expect(&T::RBrace, "'}'")?;
            Ok(JsxAttrValue::Expr(expr))
        }
        other => Err(p.err(format!(
            "expected attribute value, found {}",
            describe(&other)
        ))),
    }
}

/// Parse children until the terminator. For `Terminator::Tag`, consumes
/// the closing tag and returns its name; for `Terminator::Brace`,
/// consumes the `}`.
fn parse_children(
    p: &mut Parser,
    term: Terminator,
) -> Result<(Vec<JsxChild>, Option<String>), ParseError> {
    let mut children = Vec::new();
    loop {
        match p.current().clone() {
            T::JsxText(text) => {
                p.bump();
                children.push(JsxChild::Text(text));
            }
            T::Str(text) => {
                // Quoted literal text child.
                p.bump();
                children.push(JsxChild::Text(text));
            }
            T::TemplateStr(parts) => {
                // Quoted interpolated text child stays reactive.
                let tok = p.bump();
                let chunks = p.template_chunks(parts, tok.span)?;
                children.push(JsxChild::Expr(Expr::new(ExprKind::Template(chunks), tok.span)));
            }
            T::LBrace => {
                p.bump();
                let expr = expressions::parse_expr(p)?;
                p.expect(&T::RBrace, "'}'")?;
                children.push(JsxChild::Expr(expr));
            }
            T::RBrace if term == Terminator::Brace => {
                p.bump();
                return Ok((children, None));
            }
            T::If => {
                children.push(parse_jsx_if(p)?);
            }
            T::For => {
                children.push(parse_jsx_for(p)?);
            }
            T::Lt if p.nth(1) == &T::Slash => {
                if term != Terminator::Tag {
                    return Err(p.err("unexpected closing tag inside control block"));
                }
                p.bump(); // '<'
                p.bump(); // '/'
                let name = match p.current().clone() {
                    T::Ident(name) => {
                        p.bump();
                        Some(name)
                    }
                    _ => None,
                };
                p.expect(&T::Gt, "'>'")?;
                return Ok((children, name));
            }
            T::Lt => {
                children.push(JsxChild::Element(parse_jsx(p)?));
            }
            T::Eof => return Err(p.err("unterminated JSX element")),
            other => {
                return Err(p.err(format!(
                    "unexpected {} in JSX children",
                    describe(&other)
                )))
            }
        }
    }
}

/// `if cond { ... } elif c { ... } else { ... }` inside children.
fn parse_jsx_if(p: &mut Parser) -> Result<JsxChild, ParseError> {
    p.bump(); // 'if'
    let cond = expressions::parse_expr(p)?;
    p.expect(&T::LBrace, "'{'")?;
    let (then_children, _) = parse_children(p, Terminator::Brace)?;

    let mut elifs = Vec::new();
    let mut else_children = None;
    loop {
        if p.at(&T::Elif) {
            p.bump();
            let c = expressions::parse_expr(p)?;
            p.expect(&T::LBrace, "'{'")?;
            let (body, _) = parse_children(p, Terminator::Brace)?;
            elifs.push((c, body));
        } else if p.at(&T::Else) {
            p.bump();
            p.expect(&T::LBrace, "'{'")?;
            let (body, _) = parse_children(p, Terminator::Brace)?;
            else_children = Some(body);
            break;
        } else {
            break;
        }
    }
    Ok(JsxChild::If {
        cond,
        then_children,
        elifs,
        else_children,
    })
}

/// `for item[, i] in expr key={e} { ... }` inside children.
fn parse_jsx_for(p: &mut Parser) -> Result<JsxChild, ParseError> {
    p.bump(); // 'for'
    let vars = expressions::parse_loop_vars(p)?;
    p.expect(&T::In, "'in'")?;
    let iter = expressions::parse_expr(p)?;
    let key = if p.at_ident("key") && p.nth(1) == &T::Eq {
        p.bump(); // 'key'
        p.bump(); // '='
        p.expect(&T::LBrace, "'{'")?;
        let key = expressions::parse_expr(p)?;
        p.expect(&T::RBrace, "'}'")?;
        Some(key)
    } else {
        None
    };
    p.expect(&T::LBrace, "'{'")?;
    let (children, _) = parse_children(p, Terminator::Brace)?;
    Ok(JsxChild::For {
        vars,
        iter,
        key,
        children,
    })
}
