//! Tova lexer -- tokenizer for the Tova programming language.
//!
//! The lexer is a mode-stack state machine. Normal mode covers ordinary
//! statement/expression code; additional modes handle the context-sensitive
//! regions of the language:
//!
//! - double-quoted strings with `{expr}` interpolation holes (each hole is
//!   tokenized into its own inner stream, carried in the token payload),
//! - JSX tag interiors, JSX children, and JSX control headers
//!   (`if`/`elif`/`else`/`for` blocks inside children),
//! - `{expr}` regions embedded in JSX (attribute values, child expressions,
//!   `key={...}`), with brace depth tracked so a nested `}` does not close
//!   the region early,
//! - `style { ... }` CSS blocks, captured verbatim.
//!
//! A `<` opens a JSX element iff the previously emitted token is a
//! non-value token (keyword, `=`, `(`, `,`, `{`, `=>`, a binary operator,
//! or start of file) and the next character is alphabetic (or `>` for a
//! fragment). After a value token, `<` is the comparison operator.
//!
//! Lexical errors are fatal for the document and carry a byte span.

mod cursor;
mod error;

use cursor::Cursor;
pub use error::{LexError, LexErrorKind, NumBase};
use tova_common::token::{keyword_from_str, TemplatePart, Token, TokenKind};

/// Tracks what the lexer is currently doing.
#[derive(Debug, Clone, PartialEq)]
enum Mode {
    /// Normal top-level tokenization. Newlines are significant.
    Normal,
    /// Inside a `{expr}` region embedded in JSX. Newlines are whitespace.
    BraceExpr { depth: u32 },
    /// Inside a JSX tag: `<name attr="v" attr={e} ... >` or `</name>`.
    JsxTag { closing: bool, saw_slash: bool },
    /// Between a tag's `>` and its `</close>`. `control` marks the children
    /// of an `if`/`for` block, whose `}` closes the block.
    JsxChildren { control: bool },
    /// Between a JSX control keyword and its opening `{`.
    JsxCtrlHeader,
}

/// The Tova lexer. Converts source text into a stream of tokens.
///
/// Implements `Iterator<Item = Result<Token, LexError>>`; iteration ends
/// after the `Eof` token or the first (fatal) error.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Mode stack; the bottom entry is always `Normal`.
    modes: Vec<Mode>,
    /// Tokens queued for emission before resuming scanning.
    pending: Vec<Token>,
    /// Whether any token has been emitted yet.
    has_prev: bool,
    /// Whether the last emitted token ends a value (JSX boundary rule).
    prev_is_value: bool,
    /// Whether the last emitted token was `=` (JSX `key={...}` rule).
    prev_was_eq: bool,
    /// Whether we have already emitted the `Eof` token or failed.
    done: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            modes: vec![Mode::Normal],
            pending: Vec::new(),
            has_prev: false,
            prev_is_value: false,
            prev_was_eq: false,
            done: false,
        }
    }

    /// Tokenize an entire source string, including the final `Eof` token.
    ///
    /// Stops at the first lexical error.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let at_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if at_eof {
                return Ok(tokens);
            }
        }
    }

    /// Produce the next token, dispatching on the current mode.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let tok = if self.pending.is_empty() {
            loop {
                if let Some(t) = self.produce()? {
                    break t;
                }
            }
        } else {
            self.pending.remove(0)
        };
        self.has_prev = true;
        self.prev_is_value = tok.kind.is_value_end();
        self.prev_was_eq = tok.kind == TokenKind::Eq;
        Ok(tok)
    }

    fn mode(&self) -> Mode {
        self.modes.last().cloned().unwrap_or(Mode::Normal)
    }

    /// One scanning step. Returns `Ok(None)` after skipping trivia.
    fn produce(&mut self) -> Result<Option<Token>, LexError> {
        match self.mode() {
            Mode::Normal => self.lex_normal(),
            Mode::BraceExpr { .. } => self.lex_brace_expr(),
            Mode::JsxTag { .. } => self.lex_jsx_tag(),
            Mode::JsxChildren { .. } => self.lex_jsx_children(),
            Mode::JsxCtrlHeader => self.lex_jsx_ctrl_header(),
        }
    }

    // ── Normal mode ────────────────────────────────────────────────────

    fn lex_normal(&mut self) -> Result<Option<Token>, LexError> {
        self.cursor.eat_while(|c| c == ' ' || c == '\t' || c == '\r');

        let start = self.cursor.pos();
        match self.cursor.peek() {
            None => Ok(Some(self.eof_token(start))),
            Some('\n') => {
                self.cursor.advance();
                Ok(Some(Token::new(TokenKind::Newline, start, self.cursor.pos())))
            }
            Some(_) => self.lex_plain_token(true),
        }
    }

    // ── Embedded `{expr}` regions ──────────────────────────────────────

    fn lex_brace_expr(&mut self) -> Result<Option<Token>, LexError> {
        self.cursor.eat_while(|c| c.is_whitespace());

        let start = self.cursor.pos();
        match self.cursor.peek() {
            None => Err(LexError::new(LexErrorKind::UnclosedBrace, span_at(start))),
            Some('{') => {
                if let Some(Mode::BraceExpr { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                self.cursor.advance();
                Ok(Some(Token::new(TokenKind::LBrace, start, self.cursor.pos())))
            }
            Some('}') => {
                let depth = match self.modes.last() {
                    Some(Mode::BraceExpr { depth }) => *depth,
                    _ => 0,
                };
                self.cursor.advance();
                if depth == 0 {
                    self.modes.pop();
                } else if let Some(Mode::BraceExpr { depth }) = self.modes.last_mut() {
                    *depth -= 1;
                }
                Ok(Some(Token::new(TokenKind::RBrace, start, self.cursor.pos())))
            }
            Some(_) => self.lex_plain_token(true),
        }
    }

    // ── JSX tag interior ───────────────────────────────────────────────

    fn lex_jsx_tag(&mut self) -> Result<Option<Token>, LexError> {
        self.cursor.eat_while(|c| c.is_whitespace());

        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Err(LexError::new(LexErrorKind::UnterminatedJsx, span_at(start)));
        };

        match c {
            '>' => {
                self.cursor.advance();
                let end = self.cursor.pos();
                let (closing, saw_slash) = match self.modes.pop() {
                    Some(Mode::JsxTag { closing, saw_slash }) => (closing, saw_slash),
                    _ => (false, false),
                };
                if !closing && !saw_slash {
                    self.modes.push(Mode::JsxChildren { control: false });
                }
                Ok(Some(Token::new(TokenKind::Gt, start, end)))
            }
            '/' => {
                self.cursor.advance();
                if let Some(Mode::JsxTag { saw_slash, .. }) = self.modes.last_mut() {
                    *saw_slash = true;
                }
                Ok(Some(Token::new(TokenKind::Slash, start, self.cursor.pos())))
            }
            '=' => {
                self.cursor.advance();
                self.reset_tag_slash();
                Ok(Some(Token::new(TokenKind::Eq, start, self.cursor.pos())))
            }
            '{' => {
                self.cursor.advance();
                self.reset_tag_slash();
                self.modes.push(Mode::BraceExpr { depth: 0 });
                Ok(Some(Token::new(TokenKind::LBrace, start, self.cursor.pos())))
            }
            '"' => self.lex_double_quoted().map(Some),
            '\'' => self.lex_single_quoted().map(Some),
            c if is_ident_start(c) => {
                self.cursor.advance();
                self.cursor.eat_while(is_jsx_name_continue);
                self.reset_tag_slash();
                let text = self.cursor.slice(start, self.cursor.pos()).to_string();
                Ok(Some(Token::new(TokenKind::Ident(text), start, self.cursor.pos())))
            }
            c => Err(LexError::new(
                LexErrorKind::UnexpectedCharacter(c),
                span_char(start, c),
            )),
        }
    }

    fn reset_tag_slash(&mut self) {
        if let Some(Mode::JsxTag { saw_slash, .. }) = self.modes.last_mut() {
            *saw_slash = false;
        }
    }

    // ── JSX children ───────────────────────────────────────────────────

    fn lex_jsx_children(&mut self) -> Result<Option<Token>, LexError> {
        // Whitespace-only regions emit no text token.
        self.cursor.eat_while(|c| c.is_whitespace());

        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Err(LexError::new(LexErrorKind::UnterminatedJsx, span_at(start)));
        };

        match c {
            '<' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('/') {
                    // Closing tag: this children region is done.
                    self.cursor.advance();
                    self.modes.pop();
                    self.modes.push(Mode::JsxTag { closing: true, saw_slash: false });
                    self.pending
                        .push(Token::new(TokenKind::Slash, start + 1, self.cursor.pos()));
                    Ok(Some(Token::new(TokenKind::Lt, start, start + 1)))
                } else {
                    self.modes.push(Mode::JsxTag { closing: false, saw_slash: false });
                    Ok(Some(Token::new(TokenKind::Lt, start, self.cursor.pos())))
                }
            }
            '{' => {
                self.cursor.advance();
                self.modes.push(Mode::BraceExpr { depth: 0 });
                Ok(Some(Token::new(TokenKind::LBrace, start, self.cursor.pos())))
            }
            '}' => {
                self.cursor.advance();
                if matches!(self.modes.last(), Some(Mode::JsxChildren { control: true })) {
                    self.modes.pop();
                }
                Ok(Some(Token::new(TokenKind::RBrace, start, self.cursor.pos())))
            }
            '"' => self.lex_double_quoted().map(Some),
            '\'' => self.lex_single_quoted().map(Some),
            c if is_ident_start(c) && self.jsx_control_keyword_ahead() => {
                let kw = self.consume_jsx_keyword();
                self.modes.push(Mode::JsxCtrlHeader);
                Ok(Some(Token::new(kw, start, self.cursor.pos())))
            }
            _ => Ok(self.lex_jsx_text()),
        }
    }

    /// Whether the upcoming word is a JSX control keyword at a word boundary.
    fn jsx_control_keyword_ahead(&self) -> bool {
        let rest = self.cursor.rest();
        for kw in ["elif", "else", "for", "if"] {
            if rest.starts_with(kw) {
                match rest[kw.len()..].chars().next() {
                    None => return true,
                    Some(c) if !is_ident_continue(c) => return true,
                    _ => {}
                }
            }
        }
        false
    }

    fn consume_jsx_keyword(&mut self) -> TokenKind {
        let start = self.cursor.pos();
        self.cursor.eat_while(is_ident_continue);
        match self.cursor.slice(start, self.cursor.pos()) {
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            _ => TokenKind::For,
        }
    }

    /// Scan a JSX text run up to the next structural character or control
    /// keyword. Internal whitespace collapses to single spaces; ends are
    /// trimmed. Returns `None` if the run collapses to nothing.
    fn lex_jsx_text(&mut self) -> Option<Token> {
        let start = self.cursor.pos();
        let mut text = String::new();
        let mut pending_space = false;
        let mut at_word_boundary = true;

        while let Some(c) = self.cursor.peek() {
            match c {
                '<' | '{' | '}' | '"' | '\'' => break,
                c if c.is_whitespace() => {
                    self.cursor.advance();
                    pending_space = !text.is_empty();
                    at_word_boundary = true;
                }
                c => {
                    if at_word_boundary && is_ident_start(c) && self.jsx_control_keyword_ahead() {
                        break;
                    }
                    self.cursor.advance();
                    if pending_space {
                        text.push(' ');
                        pending_space = false;
                    }
                    text.push(c);
                    at_word_boundary = !is_ident_continue(c);
                }
            }
        }

        if text.is_empty() {
            None
        } else {
            Some(Token::new(TokenKind::JsxText(text), start, self.cursor.pos()))
        }
    }

    // ── JSX control headers ────────────────────────────────────────────

    /// Between `if`/`elif`/`else`/`for` and the `{` that opens the block's
    /// children. A `{` directly after `=` (as in `key={expr}`) opens an
    /// embedded expression region instead.
    fn lex_jsx_ctrl_header(&mut self) -> Result<Option<Token>, LexError> {
        self.cursor.eat_while(|c| c.is_whitespace());

        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Err(LexError::new(LexErrorKind::UnterminatedJsx, span_at(start)));
        };

        match c {
            '{' => {
                self.cursor.advance();
                if self.prev_was_eq {
                    self.modes.push(Mode::BraceExpr { depth: 0 });
                } else {
                    self.modes.pop();
                    self.modes.push(Mode::JsxChildren { control: true });
                }
                Ok(Some(Token::new(TokenKind::LBrace, start, self.cursor.pos())))
            }
            _ => self.lex_plain_token(false),
        }
    }

    // ── Plain tokens (shared by normal mode and embedded regions) ──────

    /// Lex one ordinary token at the cursor. The caller has already skipped
    /// whitespace and handled mode-specific characters.
    fn lex_plain_token(&mut self, allow_jsx: bool) -> Result<Option<Token>, LexError> {
        let start = self.cursor.pos();
        let c = self.cursor.peek().expect("caller checked for EOF");

        let tok = match c {
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            '{' => self.single(TokenKind::LBrace, start),
            '}' => self.single(TokenKind::RBrace, start),
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::Semicolon, start),
            ':' => self.single(TokenKind::Colon, start),
            '+' => self.lex_plus(start),
            '-' => self.lex_minus(start),
            '*' => self.lex_star(start),
            '%' => self.two_char(start, TokenKind::Percent, '=', TokenKind::PercentEq),
            '=' => self.lex_eq(start),
            '!' => self.two_char(start, TokenKind::Bang, '=', TokenKind::NotEq),
            '<' => return self.lex_lt(start, allow_jsx).map(Some),
            '>' => self.two_char(start, TokenKind::Gt, '=', TokenKind::GtEq),
            '&' => return self.lex_amp(start).map(Some),
            '|' => self.lex_bar(start),
            '?' => self.lex_question(start),
            '.' => self.lex_dot(start),
            '/' => return self.lex_slash_or_comment(start),
            '0'..='9' => return self.lex_number(start).map(Some),
            '"' => return self.lex_double_quoted().map(Some),
            '\'' => return self.lex_single_quoted().map(Some),
            c if is_ident_start(c) => return self.lex_ident(start).map(Some),
            c => {
                return Err(LexError::new(
                    LexErrorKind::UnexpectedCharacter(c),
                    span_char(start, c),
                ))
            }
        };
        Ok(Some(tok))
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    /// Consume one character, then `follow` for the longer form if present.
    fn two_char(&mut self, start: u32, short: TokenKind, follow: char, long: TokenKind) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some(follow) {
            self.cursor.advance();
            Token::new(long, start, self.cursor.pos())
        } else {
            Token::new(short, start, self.cursor.pos())
        }
    }

    /// `+` -> Plus, `++` -> PlusPlus, `+=` -> PlusEq
    fn lex_plus(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('+') => self.single(TokenKind::PlusPlus, start),
            Some('=') => self.single(TokenKind::PlusEq, start),
            _ => Token::new(TokenKind::Plus, start, self.cursor.pos()),
        }
    }

    /// `-` -> Minus, `->` -> Arrow, `-=` -> MinusEq
    fn lex_minus(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('>') => self.single(TokenKind::Arrow, start),
            Some('=') => self.single(TokenKind::MinusEq, start),
            _ => Token::new(TokenKind::Minus, start, self.cursor.pos()),
        }
    }

    /// `*` -> Star, `**` -> StarStar, `*=` -> StarEq
    fn lex_star(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('*') => self.single(TokenKind::StarStar, start),
            Some('=') => self.single(TokenKind::StarEq, start),
            _ => Token::new(TokenKind::Star, start, self.cursor.pos()),
        }
    }

    /// `=` -> Eq, `==` -> EqEq, `=>` -> FatArrow
    fn lex_eq(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('=') => self.single(TokenKind::EqEq, start),
            Some('>') => self.single(TokenKind::FatArrow, start),
            _ => Token::new(TokenKind::Eq, start, self.cursor.pos()),
        }
    }

    /// `<` is JSX iff the previous emitted token does not end a value and
    /// the next character is alphabetic (or `>` for a fragment).
    fn lex_lt(&mut self, start: u32, allow_jsx: bool) -> Result<Token, LexError> {
        self.cursor.advance();
        let next = self.cursor.peek();
        let jsx_position = allow_jsx && (!self.has_prev || !self.prev_is_value);
        let jsx_next = matches!(next, Some(c) if c.is_alphabetic() || c == '>' || c == '_');
        if jsx_position && jsx_next {
            self.modes.push(Mode::JsxTag { closing: false, saw_slash: false });
            return Ok(Token::new(TokenKind::Lt, start, self.cursor.pos()));
        }
        if next == Some('=') {
            self.cursor.advance();
            Ok(Token::new(TokenKind::LtEq, start, self.cursor.pos()))
        } else {
            Ok(Token::new(TokenKind::Lt, start, self.cursor.pos()))
        }
    }

    /// `&&` -> AmpAmp; a solitary `&` outside JSX is an error.
    fn lex_amp(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance();
        if self.cursor.peek() == Some('&') {
            self.cursor.advance();
            Ok(Token::new(TokenKind::AmpAmp, start, self.cursor.pos()))
        } else {
            Err(LexError::new(LexErrorKind::SolitaryAmp, span_char(start, '&')))
        }
    }

    /// `||` -> PipePipe, `|>` -> PipeOp, `|` -> Bar
    fn lex_bar(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('|') => self.single(TokenKind::PipePipe, start),
            Some('>') => self.single(TokenKind::PipeOp, start),
            _ => Token::new(TokenKind::Bar, start, self.cursor.pos()),
        }
    }

    /// `?` -> Question, `??` -> QuestionQuestion, `?.` -> QuestionDot
    fn lex_question(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('?') => self.single(TokenKind::QuestionQuestion, start),
            Some('.') => self.single(TokenKind::QuestionDot, start),
            _ => Token::new(TokenKind::Question, start, self.cursor.pos()),
        }
    }

    /// `.` -> Dot, `..` -> DotDot, `..=` -> DotDotEq, `...` -> Ellipsis
    fn lex_dot(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() != Some('.') {
            return Token::new(TokenKind::Dot, start, self.cursor.pos());
        }
        self.cursor.advance();
        match self.cursor.peek() {
            Some('=') => self.single(TokenKind::DotDotEq, start),
            Some('.') => self.single(TokenKind::Ellipsis, start),
            _ => Token::new(TokenKind::DotDot, start, self.cursor.pos()),
        }
    }

    // ── Comments ───────────────────────────────────────────────────────

    /// `//` line comment, `///` docstring, `/*` block comment, `/=`, `/`.
    fn lex_slash_or_comment(&mut self, start: u32) -> Result<Option<Token>, LexError> {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('/') => {
                self.cursor.advance();
                if self.cursor.peek() == Some('/') {
                    // Docstring: captured for the parser's side list.
                    self.cursor.advance();
                    if self.cursor.peek() == Some(' ') {
                        self.cursor.advance();
                    }
                    let text_start = self.cursor.pos();
                    self.cursor.eat_while(|c| c != '\n');
                    let text = self.cursor.slice(text_start, self.cursor.pos()).to_string();
                    let text = text.trim_end_matches('\r').to_string();
                    Ok(Some(Token::new(TokenKind::Docstring(text), start, self.cursor.pos())))
                } else {
                    // Line comment: trivia.
                    self.cursor.eat_while(|c| c != '\n');
                    Ok(None)
                }
            }
            Some('*') => {
                self.cursor.advance();
                loop {
                    match self.cursor.advance() {
                        None => {
                            return Err(LexError::new(
                                LexErrorKind::UnterminatedBlockComment,
                                span_at(start),
                            ))
                        }
                        Some('*') if self.cursor.peek() == Some('/') => {
                            self.cursor.advance();
                            return Ok(None);
                        }
                        Some(_) => {}
                    }
                }
            }
            Some('=') => {
                self.cursor.advance();
                Ok(Some(Token::new(TokenKind::SlashEq, start, self.cursor.pos())))
            }
            _ => Ok(Some(Token::new(TokenKind::Slash, start, self.cursor.pos()))),
        }
    }

    // ── Number literals ────────────────────────────────────────────────

    /// Lex a number literal starting with a digit.
    ///
    /// Handles decimal, hex (`0x`), binary (`0b`), octal (`0o`), floats with
    /// underscore separators in the fractional part, and scientific notation.
    /// An exponent marker with no digits is silently dropped (`1e == 1`).
    fn lex_number(&mut self, start: u32) -> Result<Token, LexError> {
        let first = self.cursor.advance().expect("caller checked for a digit");

        if first == '0' {
            match self.cursor.peek() {
                Some('x' | 'X') => return self.lex_radix(start, NumBase::Hex),
                Some('b' | 'B') => return self.lex_radix(start, NumBase::Binary),
                Some('o' | 'O') => return self.lex_radix(start, NumBase::Octal),
                _ => {}
            }
        }

        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        let int_end = self.cursor.pos();

        // A `.` starts a fractional part only when a digit (or an underscore
        // separator, as in `1._5`) follows; otherwise it is a separate token.
        let mut has_fraction = false;
        if self.cursor.peek() == Some('.')
            && self
                .cursor
                .peek_next()
                .is_some_and(|c| c.is_ascii_digit() || c == '_')
        {
            has_fraction = true;
            self.cursor.advance(); // consume '.'
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        let frac_end = self.cursor.pos();

        // Exponent: `e`/`E`, optional sign, digits. Missing digits after the
        // marker still produce a numeric token whose value ignores it.
        let mut exp_digits: Option<String> = None;
        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            self.cursor.advance();
            let mut sign = String::new();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                sign.push(self.cursor.advance().expect("peeked sign"));
            }
            let digits_start = self.cursor.pos();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            let digits: String = self
                .cursor
                .slice(digits_start, self.cursor.pos())
                .chars()
                .filter(|c| *c != '_')
                .collect();
            if !digits.is_empty() {
                exp_digits = Some(format!("{sign}{digits}"));
            }
        }
        let end = self.cursor.pos();

        let int_part: String = self
            .cursor
            .slice(start, int_end)
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if has_fraction || end > frac_end {
            // Float: fractional part and/or exponent marker present.
            let mut repr = int_part;
            if has_fraction {
                let frac: String = self
                    .cursor
                    .slice(int_end + 1, frac_end)
                    .chars()
                    .filter(|c| *c != '_')
                    .collect();
                repr.push('.');
                repr.push_str(if frac.is_empty() { "0" } else { &frac });
            }
            if let Some(exp) = exp_digits {
                repr.push('e');
                repr.push_str(&exp);
            }
            let value: f64 = repr.parse().map_err(|_| {
                LexError::new(
                    LexErrorKind::InvalidNumberLiteral(repr.clone()),
                    tova_common::span::Span::new(start, end),
                )
            })?;
            Ok(Token::new(TokenKind::Float(value), start, end))
        } else {
            let value: i64 = int_part.parse().map_err(|_| {
                LexError::new(
                    LexErrorKind::InvalidNumberLiteral(int_part.clone()),
                    tova_common::span::Span::new(start, end),
                )
            })?;
            Ok(Token::new(TokenKind::Int(value), start, end))
        }
    }

    /// Lex digits after a `0x`/`0b`/`0o` prefix. At least one digit is
    /// required or the literal is an error.
    fn lex_radix(&mut self, start: u32, base: NumBase) -> Result<Token, LexError> {
        self.cursor.advance(); // consume the base letter
        let digits_start = self.cursor.pos();
        let valid = |c: char| match base {
            NumBase::Hex => c.is_ascii_hexdigit(),
            NumBase::Binary => c == '0' || c == '1',
            NumBase::Octal => ('0'..='7').contains(&c),
        };
        self.cursor.eat_while(|c| valid(c) || c == '_');

        let digits: String = self
            .cursor
            .slice(digits_start, self.cursor.pos())
            .chars()
            .filter(|c| *c != '_')
            .collect();
        let end = self.cursor.pos();
        if digits.is_empty() {
            return Err(LexError::new(
                LexErrorKind::ExpectedDigits { base },
                tova_common::span::Span::new(start, end),
            ));
        }
        let value = i64::from_str_radix(&digits, base.radix()).map_err(|_| {
            LexError::new(
                LexErrorKind::InvalidNumberLiteral(self.cursor.slice(start, end).to_string()),
                tova_common::span::Span::new(start, end),
            )
        })?;
        Ok(Token::new(TokenKind::Int(value), start, end))
    }

    // ── String literals ────────────────────────────────────────────────

    /// Double-quoted string: plain `Str` if it contains no `{expr}` holes,
    /// `TemplateStr` otherwise. Strings may span newlines.
    fn lex_double_quoted(&mut self) -> Result<Token, LexError> {
        let start = self.cursor.pos();
        self.cursor.advance(); // consume opening '"'

        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut text = String::new();

        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        tova_common::span::Span::new(start, self.cursor.pos()),
                    ))
                }
                Some('"') => {
                    self.cursor.advance();
                    let end = self.cursor.pos();
                    if parts.is_empty() {
                        return Ok(Token::new(TokenKind::Str(text), start, end));
                    }
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(text));
                    }
                    return Ok(Token::new(TokenKind::TemplateStr(parts), start, end));
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.push_escape(&mut text, start)?;
                }
                Some('{') => {
                    self.cursor.advance();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    let inner = self.lex_template_expr(start)?;
                    parts.push(TemplatePart::Expr(inner));
                }
                Some(c) => {
                    self.cursor.advance();
                    text.push(c);
                }
            }
        }
    }

    /// Single-quoted string: literal, no interpolation.
    fn lex_single_quoted(&mut self) -> Result<Token, LexError> {
        let start = self.cursor.pos();
        self.cursor.advance(); // consume opening '\''

        let mut text = String::new();
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        tova_common::span::Span::new(start, self.cursor.pos()),
                    ))
                }
                Some('\'') => {
                    self.cursor.advance();
                    return Ok(Token::new(TokenKind::Str(text), start, self.cursor.pos()));
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.push_escape(&mut text, start)?;
                }
                Some(c) => {
                    self.cursor.advance();
                    text.push(c);
                }
            }
        }
    }

    /// Resolve one escape after a consumed `\`. Recognized escapes map to
    /// their character; unknown escapes pass through literally.
    fn push_escape(&mut self, text: &mut String, str_start: u32) -> Result<(), LexError> {
        match self.cursor.advance() {
            None => Err(LexError::new(
                LexErrorKind::UnterminatedString,
                tova_common::span::Span::new(str_start, self.cursor.pos()),
            )),
            Some('n') => {
                text.push('\n');
                Ok(())
            }
            Some('t') => {
                text.push('\t');
                Ok(())
            }
            Some('r') => {
                text.push('\r');
                Ok(())
            }
            Some('\\') => {
                text.push('\\');
                Ok(())
            }
            Some('"') => {
                text.push('"');
                Ok(())
            }
            Some('\'') => {
                text.push('\'');
                Ok(())
            }
            Some('{') => {
                text.push('{');
                Ok(())
            }
            Some(other) => {
                text.push('\\');
                text.push(other);
                Ok(())
            }
        }
    }

    /// Tokenize a `{expr}` hole inside a double-quoted string into its own
    /// inner stream, tracking matched braces. Consumes the closing `}`.
    fn lex_template_expr(&mut self, str_start: u32) -> Result<Vec<Token>, LexError> {
        let mut depth: u32 = 0;
        let mut tokens = Vec::new();
        loop {
            self.cursor.eat_while(|c| c.is_whitespace());
            let start = self.cursor.pos();
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        tova_common::span::Span::new(str_start, self.cursor.pos()),
                    ))
                }
                Some('}') if depth == 0 => {
                    self.cursor.advance();
                    return Ok(tokens);
                }
                Some('}') => {
                    depth -= 1;
                    self.cursor.advance();
                    tokens.push(Token::new(TokenKind::RBrace, start, self.cursor.pos()));
                }
                Some('{') => {
                    depth += 1;
                    self.cursor.advance();
                    tokens.push(Token::new(TokenKind::LBrace, start, self.cursor.pos()));
                }
                Some(_) => {
                    if let Some(tok) = self.lex_plain_token(false)? {
                        tokens.push(tok);
                    }
                }
            }
        }
    }

    // ── Identifiers, keywords, style blocks ────────────────────────────

    fn lex_ident(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());

        if let Some(kind) = keyword_from_str(text) {
            return Ok(Token::new(kind, start, self.cursor.pos()));
        }
        if text == "style" {
            if let Some(tok) = self.try_style_block(start)? {
                return Ok(tok);
            }
        }
        Ok(Token::new(
            TokenKind::Ident(text.to_string()),
            start,
            self.cursor.pos(),
        ))
    }

    /// `style` followed by whitespace and `{` opens a verbatim CSS scan.
    /// Otherwise `style` is a plain identifier; the lookahead never moves
    /// the cursor, so no rewind is needed.
    fn try_style_block(&mut self, start: u32) -> Result<Option<Token>, LexError> {
        let rest = self.cursor.rest();
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        if !trimmed.starts_with('{') {
            return Ok(None);
        }

        // Commit: consume the whitespace and the opening brace.
        self.cursor.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
        self.cursor.advance(); // '{'

        let css_start = self.cursor.pos();
        let mut depth: u32 = 1;
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedStyleBlock,
                        tova_common::span::Span::new(start, self.cursor.pos()),
                    ))
                }
                Some('{') => {
                    depth += 1;
                    self.cursor.advance();
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        let css = self.cursor.slice(css_start, self.cursor.pos()).to_string();
                        self.cursor.advance(); // closing '}'
                        return Ok(Some(Token::new(
                            TokenKind::StyleBlock(css),
                            start,
                            self.cursor.pos(),
                        )));
                    }
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn eof_token(&self, at: u32) -> Token {
        Token::new(TokenKind::Eof, at, at)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(tok) => {
                if tok.kind == TokenKind::Eof {
                    self.done = true;
                }
                Some(Ok(tok))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn span_at(pos: u32) -> tova_common::span::Span {
    tova_common::span::Span::point(pos)
}

fn span_char(start: u32, c: char) -> tova_common::span::Span {
    tova_common::span::Span::new(start, start + c.len_utf8() as u32)
}

/// Whether a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Whether a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// JSX tag and attribute names additionally allow `-`, `:` and `.`
/// (`data-id`, `on:click`, `Module.Component`).
fn is_jsx_name_continue(c: char) -> bool {
    is_ident_continue(c) || c == '-' || c == ':' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use tova_common::token::TokenKind as T;

    fn kinds(source: &str) -> Vec<T> {
        Lexer::tokenize(source)
            .expect("lex failure")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_simple_assignment() {
        assert_eq!(
            kinds("x = 42"),
            vec![T::Ident("x".into()), T::Eq, T::Int(42), T::Eof]
        );
    }

    #[test]
    fn lex_var_and_newlines() {
        assert_eq!(
            kinds("var x = 1\nx = 2"),
            vec![
                T::Var,
                T::Ident("x".into()),
                T::Eq,
                T::Int(1),
                T::Newline,
                T::Ident("x".into()),
                T::Eq,
                T::Int(2),
                T::Eof,
            ]
        );
    }

    #[test]
    fn lex_operators() {
        assert_eq!(
            kinds("a |> b ?? c ?. d"),
            vec![
                T::Ident("a".into()),
                T::PipeOp,
                T::Ident("b".into()),
                T::QuestionQuestion,
                T::Ident("c".into()),
                T::QuestionDot,
                T::Ident("d".into()),
                T::Eof,
            ]
        );
    }

    #[test]
    fn dot_family() {
        assert_eq!(kinds("a..b"), vec![T::Ident("a".into()), T::DotDot, T::Ident("b".into()), T::Eof]);
        assert_eq!(kinds("a..=b"), vec![T::Ident("a".into()), T::DotDotEq, T::Ident("b".into()), T::Eof]);
        assert_eq!(kinds("...rest"), vec![T::Ellipsis, T::Ident("rest".into()), T::Eof]);
    }

    #[test]
    fn float_dot_disambiguation() {
        // 3.14.x -> float, dot, ident
        assert_eq!(
            kinds("3.14.x"),
            vec![T::Float(3.14), T::Dot, T::Ident("x".into()), T::Eof]
        );
        // 42.abc -> int, dot, ident
        assert_eq!(
            kinds("42.abc"),
            vec![T::Int(42), T::Dot, T::Ident("abc".into()), T::Eof]
        );
    }

    #[test]
    fn underscore_fraction() {
        assert_eq!(kinds("1._5"), vec![T::Float(1.5), T::Eof]);
    }

    #[test]
    fn dangling_exponent_is_ignored() {
        assert_eq!(kinds("1e"), vec![T::Float(1.0), T::Eof]);
        assert_eq!(kinds("1e+"), vec![T::Float(1.0), T::Eof]);
    }

    #[test]
    fn radix_literals() {
        assert_eq!(kinds("0xFF 0b1010 0o7"), vec![T::Int(255), T::Int(10), T::Int(7), T::Eof]);
    }

    #[test]
    fn radix_prefix_requires_digits() {
        let err = Lexer::tokenize("0x").unwrap_err();
        assert_eq!(err.to_string(), "Expected hex digits after 0x");
    }

    #[test]
    fn plain_and_template_strings() {
        assert_eq!(kinds(r#"'no {x} interp'"#), vec![T::Str("no {x} interp".into()), T::Eof]);
        assert_eq!(kinds(r#""plain""#), vec![T::Str("plain".into()), T::Eof]);

        let toks = Lexer::tokenize(r#""a {b} c""#).unwrap();
        match &toks[0].kind {
            T::TemplateStr(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], TemplatePart::Text("a ".into()));
                match &parts[1] {
                    TemplatePart::Expr(inner) => {
                        assert_eq!(inner.len(), 1);
                        assert_eq!(inner[0].kind, T::Ident("b".into()));
                    }
                    other => panic!("expected expr part, got {other:?}"),
                }
                assert_eq!(parts[2], TemplatePart::Text(" c".into()));
            }
            other => panic!("expected template, got {other:?}"),
        }
    }

    #[test]
    fn escaped_brace_stays_text() {
        assert_eq!(kinds(r#""a \{b}""#), vec![T::Str("a {b}".into()), T::Eof]);
    }

    #[test]
    fn unknown_escape_passes_through() {
        assert_eq!(kinds(r#""\a""#), vec![T::Str("\\a".into()), T::Eof]);
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = Lexer::tokenize("\"abc").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn docstring_token() {
        assert_eq!(
            kinds("/// adds things\nfn"),
            vec![T::Docstring("adds things".into()), T::Newline, T::Fn, T::Eof]
        );
    }

    #[test]
    fn line_comment_is_trivia() {
        assert_eq!(kinds("1 // c\n2"), vec![T::Int(1), T::Newline, T::Int(2), T::Eof]);
    }

    #[test]
    fn less_than_after_value() {
        assert_eq!(
            kinds("a < b"),
            vec![T::Ident("a".into()), T::Lt, T::Ident("b".into()), T::Eof]
        );
    }

    #[test]
    fn jsx_after_return() {
        let got = kinds("return <div>hi</div>");
        assert_eq!(
            got,
            vec![
                T::Return,
                T::Lt,
                T::Ident("div".into()),
                T::Gt,
                T::JsxText("hi".into()),
                T::Lt,
                T::Slash,
                T::Ident("div".into()),
                T::Gt,
                T::Eof,
            ]
        );
    }

    #[test]
    fn jsx_text_collapses_whitespace() {
        let got = kinds("= <p>  hello   world\n </p>");
        assert!(got.contains(&T::JsxText("hello world".into())), "{got:?}");
    }

    #[test]
    fn jsx_expression_child() {
        let got = kinds("= <p>{count}</p>");
        assert_eq!(
            got,
            vec![
                T::Eq,
                T::Lt,
                T::Ident("p".into()),
                T::Gt,
                T::LBrace,
                T::Ident("count".into()),
                T::RBrace,
                T::Lt,
                T::Slash,
                T::Ident("p".into()),
                T::Gt,
                T::Eof,
            ]
        );
    }

    #[test]
    fn jsx_self_closing() {
        let got = kinds("= <br/>");
        assert_eq!(
            got,
            vec![T::Eq, T::Lt, T::Ident("br".into()), T::Slash, T::Gt, T::Eof]
        );
    }

    #[test]
    fn jsx_control_if_block() {
        let got = kinds("= <div>if ok { <p>yes</p> }</div>");
        assert_eq!(
            got,
            vec![
                T::Eq,
                T::Lt,
                T::Ident("div".into()),
                T::Gt,
                T::If,
                T::Ident("ok".into()),
                T::LBrace,
                T::Lt,
                T::Ident("p".into()),
                T::Gt,
                T::JsxText("yes".into()),
                T::Lt,
                T::Slash,
                T::Ident("p".into()),
                T::Gt,
                T::RBrace,
                T::Lt,
                T::Slash,
                T::Ident("div".into()),
                T::Gt,
                T::Eof,
            ]
        );
    }

    #[test]
    fn jsx_for_with_key_attr() {
        // The `{` after `key=` is an expression hole, not the block body.
        let got = kinds("= <ul>for item in items key={item} { <li>{item}</li> }</ul>");
        let lbrace_count = got.iter().filter(|k| **k == T::LBrace).count();
        let rbrace_count = got.iter().filter(|k| **k == T::RBrace).count();
        assert_eq!(lbrace_count, rbrace_count);
        assert!(got.contains(&T::For));
        assert!(got.contains(&T::In));
    }

    #[test]
    fn text_stops_at_keyword_but_not_inside_words() {
        let got = kinds("= <p>an iffy gift</p>");
        assert!(got.contains(&T::JsxText("an iffy gift".into())), "{got:?}");
    }

    #[test]
    fn style_block_captures_css() {
        let toks = Lexer::tokenize("style { .a { color: red } }").unwrap();
        match &toks[0].kind {
            T::StyleBlock(css) => assert_eq!(css.trim(), ".a { color: red }"),
            other => panic!("expected style block, got {other:?}"),
        }
    }

    #[test]
    fn style_without_brace_is_ident() {
        assert_eq!(
            kinds("style = 1"),
            vec![T::Ident("style".into()), T::Eq, T::Int(1), T::Eof]
        );
    }

    #[test]
    fn solitary_amp_is_error() {
        let err = Lexer::tokenize("a & b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::SolitaryAmp);
    }

    #[test]
    fn spans_are_byte_accurate() {
        let toks = Lexer::tokenize("fn add").unwrap();
        assert_eq!((toks[0].span.start, toks[0].span.end), (0, 2));
        assert_eq!((toks[1].span.start, toks[1].span.end), (3, 6));
    }
}
