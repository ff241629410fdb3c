use serde::Serialize;

use tova_common::span::Span;

use crate::ast::expr::{BinOp, Expr};

/// A statement with its source span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// A brace-delimited statement list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A function or lambda parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub default: Option<Expr>,
    pub span: Span,
}

/// A surface type annotation, before the analyzer resolves it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeExprKind {
    /// `Int`, `User`, `T`
    Name(String),
    /// `Result<Int, String>`
    Generic { base: String, args: Vec<TypeExpr> },
    /// `[Int]`
    Array(Box<TypeExpr>),
    /// `fn(Int, Int) -> Int`
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
    },
    /// `(Int, String)`
    Tuple(Vec<TypeExpr>),
}

/// A named function declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FnDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Block,
    pub span: Span,
}

/// A method signature inside a trait declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FnSig {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub span: Span,
}

/// A `type` declaration: product (record) or sum (ADT).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub body: TypeBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeBody {
    /// `type User { name: String, age: Int }`
    Record(Vec<FieldDef>),
    /// `type Shape { Circle(Float) Square { side: Float } Point }`
    Sum(Vec<VariantDef>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantDef {
    pub name: String,
    pub fields: Vec<VariantField>,
    pub span: Span,
}

/// A variant field; positional fields have no name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantField {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

/// Destructuring pattern of a `let` statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Destructure {
    /// `let { x, y: alias = 10 } = o`
    Object(Vec<ObjectDestructureField>),
    /// `let [a, _, c] = arr`
    Array(Vec<ArrayDestructureElem>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDestructureField {
    pub key: String,
    pub alias: Option<String>,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArrayDestructureElem {
    Binding(String),
    /// `_` -- the slot is skipped.
    Wildcard,
}

/// A `key: value` entry or nested block inside a config-shaped block
/// (`deploy`, `data`, `auth`, `session`, `cors`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: ConfigValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConfigValue {
    Expr(Expr),
    Block(Vec<ConfigEntry>),
}

/// A `ws "/path" { ... }` handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WsHandler {
    pub kind: WsHandlerKind,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WsHandlerKind {
    Open,
    Message,
    Close,
}

/// A `form` block declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDecl {
    pub name: String,
    pub ty: Option<String>,
    pub members: Vec<FormMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FormMember {
    Field {
        name: String,
        ty: Option<String>,
        rules: Vec<ConfigEntry>,
    },
    Group {
        name: String,
        members: Vec<FormMember>,
    },
    Array {
        name: String,
        members: Vec<FormMember>,
    },
    Steps(Vec<FormStep>),
    OnSubmit(Block),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormStep {
    pub name: String,
    pub fields: Vec<String>,
}

/// Every kind of statement, including top-level blocks and the
/// component- and server-scoped forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    /// `x = 1` / `var x = 1` / `obj.f = 1` / `xs[0] = 1`.
    /// Immutable unless declared with `var`.
    Assign {
        target: Expr,
        value: Expr,
        mutable: bool,
    },
    /// `a, b = 1, 2`
    TupleAssign { names: Vec<String>, values: Vec<Expr> },
    /// `x += 1`
    CompoundAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    /// `let { ... } = o` / `let [ ... ] = xs`
    LetDestructure { pattern: Destructure, value: Expr },
    FnDecl(FnDecl),
    TypeDecl(TypeDecl),
    Impl {
        type_name: String,
        trait_name: Option<String>,
        methods: Vec<FnDecl>,
    },
    TraitDecl { name: String, methods: Vec<FnSig> },
    If {
        cond: Expr,
        then_branch: Block,
        elifs: Vec<(Expr, Block)>,
        else_branch: Option<Block>,
    },
    /// `for x[, i] in xs { ... } else { ... }` -- the else runs when the
    /// loop body never entered.
    For {
        vars: Vec<String>,
        iter: Expr,
        body: Block,
        else_branch: Option<Block>,
    },
    While { cond: Expr, body: Block },
    Return(Option<Expr>),
    Expr(Expr),

    // ── Top-level blocks ───────────────────────────────────────────────
    Server { name: Option<String>, body: Block },
    Client { name: Option<String>, body: Block },
    Shared { name: Option<String>, body: Block },
    Data { name: String, entries: Vec<ConfigEntry> },
    DeployProfile { name: String, entries: Vec<ConfigEntry> },
    TestBlock { name: String, body: Block },

    // ── Client forms ───────────────────────────────────────────────────
    State { name: String, value: Expr },
    Computed { name: String, value: Expr },
    Effect { body: Block },
    Component {
        name: String,
        params: Vec<Param>,
        body: Block,
    },
    Store { name: String, body: Block },
    /// `style { ... }` inside a component.
    Style { css: String },

    // ── Server forms ───────────────────────────────────────────────────
    Route {
        method: String,
        path: String,
        body: Block,
    },
    Middleware { name: Option<String>, body: Block },
    Model {
        name: String,
        entries: Vec<ConfigEntry>,
    },
    Db { entries: Vec<ConfigEntry> },
    Sse { path: String, body: Block },
    Ws { path: String, handlers: Vec<WsHandler> },
    Auth {
        scheme: String,
        entries: Vec<ConfigEntry>,
    },
    Session { entries: Vec<ConfigEntry> },
    Schedule {
        name: String,
        spec: String,
        body: Block,
    },
    RateLimit { entries: Vec<ConfigEntry> },
    Compression { entries: Vec<ConfigEntry> },
    Upload { entries: Vec<ConfigEntry> },
    Cors { entries: Vec<ConfigEntry> },
    EnvDecl {
        name: String,
        ty: Option<TypeExpr>,
        default: Option<Expr>,
    },
    OnStart(Block),
    OnStop(Block),
    OnError { param: String, body: Block },
    Health { path: Option<String> },
    StaticDir { route: String, dir: String },
    Background {
        name: String,
        params: Vec<Param>,
        body: Block,
    },
    Form(FormDecl),

    /// Placeholder inserted by tolerant-mode recovery. The analyzer treats
    /// its missing children as `Unknown`.
    Error,
}
