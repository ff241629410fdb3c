//! Integration tests for the Tova lexer.
//!
//! Covers the canonical numeric literal table, the JSX boundary rule,
//! template strings, style blocks, and the fatal-error cases.

use tova_common::token::{TemplatePart, Token, TokenKind};
use tova_lexer::{LexErrorKind, Lexer};

/// Render a token stream as one line of kind names for inline snapshots.
fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| match &t.kind {
            TokenKind::Int(v) => format!("Int({v})"),
            TokenKind::Float(v) => format!("Float({v})"),
            TokenKind::Str(s) => format!("Str({s})"),
            TokenKind::TemplateStr(parts) => format!("Template({})", parts.len()),
            TokenKind::Ident(s) => format!("Ident({s})"),
            TokenKind::JsxText(s) => format!("JsxText({s})"),
            other => format!("{other:?}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn lex(source: &str) -> Vec<Token> {
    Lexer::tokenize(source).expect("lex failure")
}

// ── Numeric round-trip (spec property table) ────────────────────────────

#[test]
fn canonical_int_literals_round_trip() {
    let cases: &[(&str, i64)] = &[("0", 0), ("42", 42), ("0xFF", 255), ("0b1010", 10), ("0o7", 7)];
    for (src, expected) in cases {
        let tokens = lex(src);
        assert_eq!(tokens.len(), 2, "{src} must lex to one number + Eof");
        assert_eq!(tokens[0].kind, TokenKind::Int(*expected), "literal {src}");
    }
}

#[test]
fn canonical_float_literals_round_trip() {
    let cases: &[(&str, f64)] = &[
        ("3.14", 3.14),
        ("1.5e3", 1500.0),
        ("2.5E-1", 0.25),
        ("1e20", 1e20),
    ];
    for (src, expected) in cases {
        let tokens = lex(src);
        assert_eq!(tokens.len(), 2, "{src} must lex to one number + Eof");
        assert_eq!(tokens[0].kind, TokenKind::Float(*expected), "literal {src}");
    }
}

#[test]
fn trailing_dot_is_not_a_fraction() {
    // `42.` followed by whitespace is `42` `.`
    insta::assert_snapshot!(render(&lex("42. ")), @"Int(42) Dot Eof");
}

// ── JSX boundary recognition ────────────────────────────────────────────

/// After a value token, `<` is the comparison operator.
#[test]
fn lt_after_values_is_comparison() {
    for src in ["1 <a", "x <a", "(y) <a", "xs[0] <a", "true <a", "nil <a", "\"s\" <a"] {
        let tokens = lex(src);
        assert!(
            tokens.iter().any(|t| t.kind == TokenKind::Lt),
            "{src:?} should contain a Lt comparison"
        );
        assert!(
            !tokens.iter().any(|t| t.kind == TokenKind::Gt),
            "{src:?} must not be lexed as a JSX tag"
        );
    }
}

/// After `return`, `=`, `(`, `,`, `{`, `=>` or a binary operator, `<foo`
/// opens a JSX element.
#[test]
fn lt_after_non_values_is_jsx() {
    for src in [
        "return <a/>",
        "x = <a/>",
        "f(<a/>)",
        "f(1, <a/>)",
        "1 + <a/>",
    ] {
        let tokens = lex(src);
        let has_tag = tokens.windows(2).any(|w| {
            w[0].kind == TokenKind::Lt && w[1].kind == TokenKind::Ident("a".into())
        });
        assert!(has_tag, "{src:?} should open a JSX tag");
    }
}

#[test]
fn jsx_at_start_of_file() {
    insta::assert_snapshot!(render(&lex("<a/>")), @"Lt Ident(a) Slash Gt Eof");
}

#[test]
fn jsx_fragment() {
    insta::assert_snapshot!(render(&lex("= <>hi</>")), @"Eq Lt Gt JsxText(hi) Lt Slash Gt Eof");
}

#[test]
fn nested_jsx_elements() {
    let tokens = lex("= <div><p>a</p><p>b</p></div>");
    let texts: Vec<_> = tokens
        .iter()
        .filter_map(|t| match &t.kind {
            TokenKind::JsxText(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn jsx_attributes_with_expressions() {
    let tokens = lex(r#"= <input type="text" value={name}/>"#);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Ident("type".into())));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Str("text".into())));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Ident("value".into())));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::LBrace));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::RBrace));
}

#[test]
fn jsx_directive_attribute_names() {
    let tokens = lex(r#"= <button on:click={inc} class:active={on}>go</button>"#);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Ident("on:click".into())));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Ident("class:active".into())));
}

#[test]
fn whitespace_only_children_emit_no_text() {
    let tokens = lex("= <div>   \n\t  </div>");
    assert!(
        !tokens.iter().any(|t| matches!(t.kind, TokenKind::JsxText(_))),
        "whitespace-only region must not produce a text token"
    );
}

#[test]
fn quoted_template_inside_children() {
    // <div>"c: {count}"</div> -- quoted text in children interpolates.
    let tokens = lex(r#"= <div>"c: {count}"</div>"#);
    let template = tokens.iter().find_map(|t| match &t.kind {
        TokenKind::TemplateStr(parts) => Some(parts.clone()),
        _ => None,
    });
    let parts = template.expect("expected a template token in children");
    assert_eq!(parts[0], TemplatePart::Text("c: ".into()));
    assert!(matches!(&parts[1], TemplatePart::Expr(inner) if inner[0].kind == TokenKind::Ident("count".into())));
}

// ── Template strings ────────────────────────────────────────────────────

#[test]
fn template_with_nested_braces() {
    // Braces inside the hole are matched; the hole tokenizes `{a: 1}.a`.
    let tokens = lex(r#""v: { {a: 1}.a }""#);
    match &tokens[0].kind {
        TokenKind::TemplateStr(parts) => {
            let TemplatePart::Expr(inner) = &parts[1] else {
                panic!("expected expr part");
            };
            assert_eq!(inner.first().map(|t| t.kind.clone()), Some(TokenKind::LBrace));
            assert_eq!(inner.last().map(|t| t.kind.clone()), Some(TokenKind::Ident("a".into())));
            assert!(inner.iter().any(|t| t.kind == TokenKind::RBrace));
            assert!(inner.iter().any(|t| t.kind == TokenKind::Dot));
        }
        other => panic!("expected template, got {other:?}"),
    }
}

#[test]
fn multi_line_string() {
    let tokens = lex("\"a\nb\"");
    assert_eq!(tokens[0].kind, TokenKind::Str("a\nb".into()));
}

// ── Style blocks ────────────────────────────────────────────────────────

#[test]
fn style_block_with_nested_rules() {
    let tokens = lex("style {\n  .btn { color: blue }\n  .btn:hover { color: red }\n}");
    match &tokens[0].kind {
        TokenKind::StyleBlock(css) => {
            assert!(css.contains(".btn { color: blue }"));
            assert!(css.contains(".btn:hover { color: red }"));
        }
        other => panic!("expected style block, got {other:?}"),
    }
}

#[test]
fn style_followed_by_newline_then_brace() {
    let tokens = lex("style\n{ .a { } }");
    assert!(matches!(tokens[0].kind, TokenKind::StyleBlock(_)));
}

// ── Errors ──────────────────────────────────────────────────────────────

#[test]
fn unterminated_block_comment() {
    let err = Lexer::tokenize("/* never closed").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedBlockComment);
}

#[test]
fn unterminated_style_block() {
    let err = Lexer::tokenize("style { .a {").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedStyleBlock);
}

#[test]
fn binary_prefix_requires_digits() {
    let err = Lexer::tokenize("0b").unwrap_err();
    assert_eq!(err.to_string(), "Expected binary digits after 0b");
}

#[test]
fn error_spans_locate_the_offender() {
    let err = Lexer::tokenize("x = @").unwrap_err();
    assert_eq!(err.span.start, 4);
    assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
}
