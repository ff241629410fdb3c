//! Recursive-descent parser for Tova.
//!
//! The parser consumes the lexer's token stream with one-token lookahead
//! almost everywhere; the single exception is bounded backtracking on an
//! open paren to distinguish `(a, b) => ...` lambdas from grouped
//! expressions.
//!
//! Newlines are statement separators. Inside parentheses and brackets they
//! are insignificant and the lookahead skips them transparently; entering a
//! `{ ... }` statement block restores significance (the block parser saves
//! and clears the delimiter depth).
//!
//! In tolerant mode (used by IDE tooling) the parser records an error,
//! resyncs to the next statement boundary and continues, leaving an
//! `Error` placeholder node; the partial AST is still safe to analyze.
//!
//! Precedence note: `??` binds looser than `or`, so mixed `a or b ?? c`
//! parses as `(a or b) ?? c` without parentheses.

pub(crate) mod expressions;
pub(crate) mod items;
pub(crate) mod jsx;

use tova_common::span::Span;
use tova_common::token::{TemplatePart, Token, TokenKind};

use crate::ast::{Program, Stmt, StmtKind, TemplateChunk};
use crate::error::ParseError;

pub(crate) struct Parser {
    /// All tokens from the lexer (docstrings pre-filtered, Eof last).
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Accumulated errors (tolerant mode only holds more than one).
    pub(crate) errors: Vec<ParseError>,
    /// Whether to recover at statement boundaries instead of failing.
    pub(crate) tolerant: bool,
    /// Paren/bracket nesting depth; newlines are skipped when > 0.
    expr_depth: u32,
    /// Byte length of the source, for end-of-file spans.
    source_len: u32,
    /// Span of the most recently consumed token.
    last_span: Span,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>, source_len: u32, tolerant: bool) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            tolerant,
            expr_depth: 0,
            source_len,
            last_span: Span::point(0),
        }
    }

    /// Span of the most recently consumed token.
    pub(crate) fn last_span(&self) -> Span {
        self.last_span
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// Index of the nth significant token at or after `pos`.
    fn significant_index(&self, mut n: usize) -> usize {
        let mut i = self.pos;
        while i < self.tokens.len() {
            if self.should_skip(&self.tokens[i].kind) {
                i += 1;
                continue;
            }
            if n == 0 {
                return i;
            }
            n -= 1;
            i += 1;
        }
        self.tokens.len().saturating_sub(1)
    }

    fn should_skip(&self, kind: &TokenKind) -> bool {
        *kind == TokenKind::Newline && self.expr_depth > 0
    }

    /// The current significant token kind.
    pub(crate) fn current(&self) -> &TokenKind {
        &self.tokens[self.significant_index(0)].kind
    }

    /// The nth significant token kind ahead (`nth(0)` == `current()`).
    pub(crate) fn nth(&self, n: usize) -> &TokenKind {
        &self.tokens[self.significant_index(n)].kind
    }

    /// Span of the current significant token.
    pub(crate) fn current_span(&self) -> Span {
        let i = self.significant_index(0);
        if i < self.tokens.len() {
            self.tokens[i].span
        } else {
            Span::point(self.source_len)
        }
    }

    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.current(), TokenKind::Eof)
    }

    /// Whether the current token is the contextual identifier `text`.
    pub(crate) fn at_ident(&self, text: &str) -> bool {
        matches!(self.current(), TokenKind::Ident(s) if s == text)
    }

    pub(crate) fn nth_is_ident(&self, n: usize) -> bool {
        matches!(self.nth(n), TokenKind::Ident(_))
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume and return the current significant token.
    pub(crate) fn bump(&mut self) -> Token {
        let i = self.significant_index(0);
        let tok = self.tokens[i].clone();
        self.pos = i + 1;
        self.last_span = tok.span;
        match tok.kind {
            TokenKind::LParen | TokenKind::LBracket => self.expr_depth += 1,
            TokenKind::RParen | TokenKind::RBracket => {
                self.expr_depth = self.expr_depth.saturating_sub(1)
            }
            _ => {}
        }
        tok
    }

    /// Consume the current token if it matches, without error otherwise.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it matches; error otherwise.
    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.err(format!("expected {what}, found {}", describe(self.current()))))
        }
    }

    /// Consume an identifier token and return its text.
    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        match self.current().clone() {
            TokenKind::Ident(name) => {
                let tok = self.bump();
                Ok((name, tok.span))
            }
            other => Err(self.err(format!("expected {what}, found {}", describe(&other)))),
        }
    }

    /// Consume a plain string token and return its text.
    pub(crate) fn expect_str(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        match self.current().clone() {
            TokenKind::Str(s) => {
                let tok = self.bump();
                Ok((s, tok.span))
            }
            other => Err(self.err(format!("expected {what}, found {}", describe(&other)))),
        }
    }

    /// Skip newline tokens at statement level.
    pub(crate) fn skip_newlines(&mut self) {
        while matches!(self.current(), TokenKind::Newline) {
            self.bump();
        }
    }

    /// If the next significant token after any newlines is one of `kinds`,
    /// consume the newlines and return true; otherwise consume nothing.
    /// Lets `else`/`elif` sit on the line after a closing brace without
    /// eating the statement separator when no chain follows.
    pub(crate) fn eat_newlines_before(&mut self, kinds: &[TokenKind]) -> bool {
        let mut j = self.significant_index(0);
        while matches!(self.tokens[j].kind, TokenKind::Newline) {
            j += 1;
        }
        if kinds.contains(&self.tokens[j].kind) {
            while matches!(self.current(), TokenKind::Newline) {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    /// Skip newlines and semicolons (statement separators).
    pub(crate) fn skip_separators(&mut self) {
        while matches!(self.current(), TokenKind::Newline | TokenKind::Semicolon) {
            self.bump();
        }
    }

    // ── Backtracking (bounded; lambda heads only) ──────────────────────

    pub(crate) fn snapshot(&self) -> (usize, usize, u32, Span) {
        (self.pos, self.errors.len(), self.expr_depth, self.last_span)
    }

    pub(crate) fn restore(&mut self, snap: (usize, usize, u32, Span)) {
        self.pos = snap.0;
        self.errors.truncate(snap.1);
        self.expr_depth = snap.2;
        self.last_span = snap.3;
    }

    // ── Blocks ─────────────────────────────────────────────────────────

    /// Parse `{ stmt* }` with newline significance restored inside.
    pub(crate) fn parse_block(&mut self) -> Result<crate::ast::Block, ParseError> {
        let open = self.expect(&TokenKind::LBrace, "'{'")?;
        let saved_depth = std::mem::replace(&mut self.expr_depth, 0);

        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.at(&TokenKind::RBrace) || self.at_eof() {
                break;
            }
            match items::parse_stmt(self) {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    if !self.tolerant {
                        self.expr_depth = saved_depth;
                        return Err(err);
                    }
                    self.errors.push(err);
                    let span = self.resync();
                    stmts.push(Stmt::new(StmtKind::Error, span));
                }
            }
            self.expect_stmt_end()?;
        }

        self.expr_depth = saved_depth;
        let close = self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(crate::ast::Block {
            stmts,
            span: open.span.merge(close.span),
        })
    }

    /// After a statement: require a separator (or a closer) next.
    fn expect_stmt_end(&mut self) -> Result<(), ParseError> {
        match self.current() {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            other => {
                let err = self.err(format!(
                    "expected end of statement, found {}",
                    describe(other)
                ));
                if self.tolerant {
                    self.errors.push(err);
                    self.resync();
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Advance to the next statement boundary. Returns the span skipped.
    pub(crate) fn resync(&mut self) -> Span {
        let start = self.current_span();
        let mut last = start;
        loop {
            match self.current() {
                TokenKind::Eof | TokenKind::RBrace => break,
                TokenKind::Newline | TokenKind::Semicolon => {
                    self.bump();
                    break;
                }
                _ => {
                    last = self.bump().span;
                }
            }
        }
        start.merge(last)
    }

    // ── Errors ─────────────────────────────────────────────────────────

    pub(crate) fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current_span())
    }

    // ── Templates ──────────────────────────────────────────────────────

    /// Sub-parse the `{expr}` holes of a template token into chunks.
    pub(crate) fn template_chunks(
        &mut self,
        parts: Vec<TemplatePart>,
        span: Span,
    ) -> Result<Vec<TemplateChunk>, ParseError> {
        let mut chunks = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(text) => chunks.push(TemplateChunk::Text(text)),
                TemplatePart::Expr(mut tokens) => {
                    let end = tokens.last().map(|t| t.span.end).unwrap_or(span.end);
                    tokens.push(Token::new(TokenKind::Eof, end, end));
                    let mut sub = Parser::new(tokens, end, self.tolerant);
                    let expr = expressions::parse_expr(&mut sub)?;
                    if !sub.at_eof() {
                        return Err(sub.err("unexpected token after interpolated expression"));
                    }
                    chunks.push(TemplateChunk::Expr(expr));
                }
            }
        }
        Ok(chunks)
    }
}

/// Human-readable description of a token kind for error messages.
pub(crate) fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Int(v) => format!("number '{v}'"),
        TokenKind::Float(v) => format!("number '{v}'"),
        TokenKind::Str(_) | TokenKind::TemplateStr(_) => "string".into(),
        TokenKind::Ident(name) => format!("'{name}'"),
        TokenKind::JsxText(_) => "JSX text".into(),
        TokenKind::StyleBlock(_) => "style block".into(),
        TokenKind::Docstring(_) => "docstring".into(),
        TokenKind::Newline => "end of line".into(),
        TokenKind::Eof => "end of file".into(),
        other => format!("'{}'", token_text(other)),
    }
}

fn token_text(kind: &TokenKind) -> &'static str {
    use TokenKind::*;
    match kind {
        And => "and",
        Client => "client",
        Data => "data",
        Deploy => "deploy",
        Elif => "elif",
        Else => "else",
        False => "false",
        Fn => "fn",
        For => "for",
        If => "if",
        Impl => "impl",
        In => "in",
        Let => "let",
        Match => "match",
        Nil => "nil",
        Not => "not",
        Or => "or",
        Return => "return",
        Server => "server",
        Shared => "shared",
        Test => "test",
        Trait => "trait",
        True => "true",
        Type => "type",
        Var => "var",
        While => "while",
        Plus => "+",
        Minus => "-",
        Star => "*",
        StarStar => "**",
        Slash => "/",
        Percent => "%",
        PlusPlus => "++",
        Eq => "=",
        PlusEq => "+=",
        MinusEq => "-=",
        StarEq => "*=",
        SlashEq => "/=",
        PercentEq => "%=",
        EqEq => "==",
        NotEq => "!=",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        AmpAmp => "&&",
        PipePipe => "||",
        Bang => "!",
        Question => "?",
        QuestionQuestion => "??",
        QuestionDot => "?.",
        PipeOp => "|>",
        Bar => "|",
        DotDot => "..",
        DotDotEq => "..=",
        Ellipsis => "...",
        Dot => ".",
        Arrow => "->",
        FatArrow => "=>",
        LParen => "(",
        RParen => ")",
        LBracket => "[",
        RBracket => "]",
        LBrace => "{",
        RBrace => "}",
        Comma => ",",
        Colon => ":",
        Semicolon => ";",
        _ => "?",
    }
}

/// Parse a full program from a pre-lexed token stream.
pub(crate) fn parse_program(p: &mut Parser) -> Result<Program, ParseError> {
    let mut stmts = Vec::new();
    loop {
        p.skip_separators();
        if p.at_eof() {
            break;
        }
        match items::parse_stmt(p) {
            Ok(stmt) => stmts.push(stmt),
            Err(err) => {
                if !p.tolerant {
                    return Err(err);
                }
                p.errors.push(err);
                let before = p.pos;
                let span = p.resync();
                if p.pos == before && !p.at_eof() {
                    // Zero progress (e.g. a stray `}` at top level): step over it.
                    p.bump();
                }
                stmts.push(Stmt::new(StmtKind::Error, span));
                continue;
            }
        }
        match p.current() {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof => {}
            other => {
                let err = p.err(format!("expected end of statement, found {}", describe(other)));
                if !p.tolerant {
                    return Err(err);
                }
                p.errors.push(err);
                p.resync();
            }
        }
    }
    Ok(Program { stmts })
}
