//! The Tova abstract syntax tree.
//!
//! One node kind per syntactic form; every node carries its source [`Span`].
//! Nodes uniquely own their children -- back-references (method to parent
//! impl, component to scope) live in analyzer side tables keyed by name,
//! never in the tree.

pub mod expr;
pub mod jsx;
pub mod stmt;

pub use expr::*;
pub use jsx::*;
pub use stmt::*;

use serde::Serialize;

/// A parsed source file: the ordered top-level statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}
