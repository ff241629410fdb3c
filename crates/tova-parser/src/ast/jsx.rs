use serde::Serialize;

use tova_common::span::Span;

use crate::ast::expr::{Expr, TemplateChunk};

/// A JSX element or fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsxNode {
    pub kind: JsxNodeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JsxNodeKind {
    Element {
        tag: String,
        attrs: Vec<JsxAttr>,
        children: Vec<JsxChild>,
    },
    /// `<>...</>`
    Fragment { children: Vec<JsxChild> },
}

impl JsxNode {
    /// Tag name, or `None` for fragments.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            JsxNodeKind::Element { tag, .. } => Some(tag),
            JsxNodeKind::Fragment { .. } => None,
        }
    }
}

/// A JSX attribute. Directive attributes keep their full name
/// (`on:click`, `bind:value`, `class:active`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsxAttr {
    pub name: String,
    pub value: JsxAttrValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JsxAttrValue {
    /// Attribute with no value: `<input disabled/>`.
    Bare,
    Str(String),
    Template(Vec<TemplateChunk>),
    Expr(Expr),
}

/// A child of a JSX element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JsxChild {
    Element(JsxNode),
    Text(String),
    Expr(Expr),
    /// `if cond { ... } elif ... { ... } else { ... }` inside children.
    If {
        cond: Expr,
        then_children: Vec<JsxChild>,
        elifs: Vec<(Expr, Vec<JsxChild>)>,
        else_children: Option<Vec<JsxChild>>,
    },
    /// `for item[, i] in expr key={e} { ... }` inside children.
    For {
        vars: Vec<String>,
        iter: Expr,
        key: Option<Expr>,
        children: Vec<JsxChild>,
    },
}
