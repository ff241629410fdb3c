use serde::Serialize;

use tova_common::span::Span;

use crate::ast::jsx::JsxNode;
use crate::ast::stmt::{Block, Param};

/// An expression with its source span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Binary operators. `Concat` is `++`; `NullCoalesce` is `??`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Concat,
    Eq,
    NotEq,
    NullCoalesce,
}

impl BinOp {
    /// The operator's JavaScript spelling, where it maps one-to-one.
    pub fn js(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "**",
            BinOp::Concat => "+",
            BinOp::Eq => "===",
            BinOp::NotEq => "!==",
            BinOp::NullCoalesce => "??",
        }
    }

    /// Source-level spelling, used in diagnostics.
    pub fn source(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "**",
            BinOp::Concat => "++",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::NullCoalesce => "??",
        }
    }
}

/// Comparison operators that participate in chaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmpOp {
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CmpOp {
    pub fn js(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::LtEq => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtEq => ">=",
        }
    }
}

/// Short-circuiting logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnOp {
    Neg,
    Not,
}

/// One alternating chunk of a template literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TemplateChunk {
    Text(String),
    Expr(Expr),
}

/// A call argument, positional or named (`f(1, limit: 10)`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

/// An entry of an object literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ObjectEntry {
    /// `{a, b}` -- name doubles as value.
    Shorthand(String),
    /// `{key: value}`.
    Pair { key: String, value: Expr },
    /// `{...base}`.
    Spread(Expr),
}

/// The body of a lambda: a bare expression or a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

/// A `match` arm. A guard disqualifies the arm from acting as a catch-all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: ArmBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArmBody {
    Expr(Box<Expr>),
    Block(Block),
}

/// A pattern in a `match` arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PatternKind {
    /// `_`
    Wildcard,
    /// A lowercase identifier binds the subject.
    Binding(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    /// `Some(x)`, `Circle(r)`, bare `None`. Capitalized names are variants.
    Variant { name: String, fields: Vec<Pattern> },
    /// `[a, _, c]`
    Array(Vec<Pattern>),
    /// `1..10`, `1..=10`
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        inclusive: bool,
    },
    /// `a | b`
    Or(Vec<Pattern>),
}

impl Pattern {
    /// Whether this pattern matches every value: a wildcard or a bare
    /// binding. Guards are checked separately by the caller.
    pub fn is_catch_all(&self) -> bool {
        match &self.kind {
            PatternKind::Wildcard | PatternKind::Binding(_) => true,
            PatternKind::Or(alts) => alts.iter().any(Pattern::is_catch_all),
            _ => false,
        }
    }
}

/// Every kind of expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    /// Double-quoted string with `{expr}` holes.
    Template(Vec<TemplateChunk>),
    Ident(String),
    /// The implicit argument hole in a pipe stage.
    PipeTarget,
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    /// `a < b < c` -- three or more comparison operands.
    ChainedCmp {
        operands: Vec<Expr>,
        ops: Vec<CmpOp>,
    },
    /// Single comparison `a < b`.
    Cmp {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `x in xs` / `x not in xs`
    Membership {
        negated: bool,
        item: Box<Expr>,
        collection: Box<Expr>,
    },
    /// `a..b` (exclusive) / `a..=b` (inclusive)
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        inclusive: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Arg>,
    },
    /// `obj.name` / `obj?.name`
    Member {
        object: Box<Expr>,
        name: String,
        optional: bool,
    },
    /// `obj[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `xs[a:b:c]` -- any of the three parts may be omitted.
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Object(Vec<ObjectEntry>),
    Array(Vec<Expr>),
    /// `(1, "a")` -- a parenthesized, comma-separated tuple.
    Tuple(Vec<Expr>),
    /// `...xs` in array/call position.
    Spread(Box<Expr>),
    /// `[e for x in xs if cond]`
    ListComp {
        element: Box<Expr>,
        vars: Vec<String>,
        iter: Box<Expr>,
        filter: Option<Box<Expr>>,
    },
    /// `{k: v for k, v in pairs if cond}`
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        vars: Vec<String>,
        iter: Box<Expr>,
        filter: Option<Box<Expr>>,
    },
    /// `fn(x) x + 1` or `(x) => x + 1`
    Lambda {
        params: Vec<Param>,
        body: LambdaBody,
    },
    Match {
        subject: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    /// `if c { a } else { b }` in expression position.
    If {
        cond: Box<Expr>,
        then_branch: Block,
        elifs: Vec<(Expr, Block)>,
        else_branch: Option<Block>,
    },
    /// `x |> f` / `x |> f(a, _)`
    Pipe {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `x?` -- propagate Err/None out of the enclosing function.
    Propagate(Box<Expr>),
    Jsx(Box<JsxNode>),
    /// Placeholder inserted by tolerant-mode recovery.
    Error,
}
