//! Shared data types for the Tova compiler.
//!
//! Every stage of the pipeline (lexer, parser, analyzer, codegen) speaks
//! in terms of the types defined here: byte-offset [`span::Span`]s, the
//! token vocabulary in [`token`], and location-carrying [`diag::Diagnostic`]s.

pub mod diag;
pub mod span;
pub mod token;
