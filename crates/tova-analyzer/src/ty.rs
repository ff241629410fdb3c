//! Type representation for the Tova type system.
//!
//! Tova types are gradual: `Any` and `Unknown` are top types, and the
//! central relation is one-sided *assignability* rather than unification.
//! Every type round-trips through its `Display` form and [`type_from_str`]
//! (record and ADT types render as their bare name, which reparses as a
//! nominal `Primitive` -- the assignability rules treat those as
//! equivalent by name).

use std::fmt;

/// A Tova type.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// A named nominal type: `Int`, `Float`, `String`, `Bool`, `User`.
    Primitive(String),
    /// The type of `nil`.
    Nil,
    /// Dynamic: everything is assignable both ways.
    Any,
    /// Not-yet-known: same assignability as `Any`, different diagnostics.
    Unknown,
    /// `[T]`
    Array(Box<Type>),
    /// `(A, B)`
    Tuple(Vec<Type>),
    /// `fn(A, B) -> R`
    Function { params: Vec<Type>, ret: Box<Type> },
    /// A declared product type with named fields.
    Record {
        name: String,
        fields: Vec<(String, Type)>,
    },
    /// A declared sum type: variant name -> field (name, type) pairs.
    Adt {
        name: String,
        type_params: Vec<String>,
        variants: Vec<(String, Vec<(String, Type)>)>,
    },
    /// A surface generic application before resolution: `Result<Int, String>`.
    Generic { base: String, args: Vec<Type> },
    /// A generic placeholder introduced by `<T>`.
    TypeVar(String),
    /// `A | B`
    Union(Vec<Type>),
}

impl Type {
    pub fn int() -> Type {
        Type::Primitive("Int".into())
    }

    pub fn float() -> Type {
        Type::Primitive("Float".into())
    }

    pub fn string() -> Type {
        Type::Primitive("String".into())
    }

    pub fn bool() -> Type {
        Type::Primitive("Bool".into())
    }

    pub fn option(inner: Type) -> Type {
        Type::Generic {
            base: "Option".into(),
            args: vec![inner],
        }
    }

    pub fn result(ok: Type, err: Type) -> Type {
        Type::Generic {
            base: "Result".into(),
            args: vec![ok, err],
        }
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// The nominal name of this type, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Primitive(name) => Some(name),
            Type::Record { name, .. } => Some(name),
            Type::Adt { name, .. } => Some(name),
            Type::Generic { base, .. } => Some(base),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Primitive(name) if name == "Int" || name == "Float")
    }

    /// Top types accept everything and infect nothing.
    pub fn is_top(&self) -> bool {
        matches!(self, Type::Any | Type::Unknown)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(name) => write!(f, "{name}"),
            Type::Nil => write!(f, "Nil"),
            Type::Any => write!(f, "Any"),
            Type::Unknown => write!(f, "Unknown"),
            Type::Array(elem) => write!(f, "[{elem}]"),
            Type::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Type::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            Type::Record { name, .. } => write!(f, "{name}"),
            Type::Adt { name, .. } => write!(f, "{name}"),
            Type::Generic { base, args } => {
                write!(f, "{base}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Type::TypeVar(name) => write!(f, "{name}"),
            Type::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
        }
    }
}

// ── Reparsing ──────────────────────────────────────────────────────────

/// Parse a canonical type rendering back into a [`Type`].
///
/// Accepts the grammar produced by `Display`: bare names, `Base<A, B>`,
/// `[T]`, `(A, B)`, `fn(A) -> R` and `A | B`. Returns `None` on
/// malformed input. Whitespace after commas is canonical but optional.
pub fn type_from_str(input: &str) -> Option<Type> {
    let mut p = TypeParser {
        chars: input.trim().as_bytes(),
        pos: 0,
    };
    let ty = p.parse_union()?;
    p.skip_ws();
    if p.pos == p.chars.len() {
        Some(ty)
    } else {
        None
    }
}

struct TypeParser<'a> {
    chars: &'a [u8],
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_union(&mut self) -> Option<Type> {
        let first = self.parse_atom()?;
        self.skip_ws();
        if self.peek() != Some(b'|') {
            return Some(first);
        }
        let mut members = vec![first];
        while {
            self.skip_ws();
            self.eat(b'|')
        } {
            self.skip_ws();
            members.push(self.parse_atom()?);
            self.skip_ws();
        }
        Some(Type::Union(members))
    }

    fn parse_atom(&mut self) -> Option<Type> {
        self.skip_ws();
        match self.peek()? {
            b'[' => {
                self.pos += 1;
                let elem = self.parse_union()?;
                self.skip_ws();
                if !self.eat(b']') {
                    return None;
                }
                Some(Type::Array(Box::new(elem)))
            }
            b'(' => {
                self.pos += 1;
                let mut elems = Vec::new();
                self.skip_ws();
                if !self.eat(b')') {
                    loop {
                        elems.push(self.parse_union()?);
                        self.skip_ws();
                        if self.eat(b',') {
                            continue;
                        }
                        if self.eat(b')') {
                            break;
                        }
                        return None;
                    }
                }
                Some(Type::Tuple(elems))
            }
            _ => self.parse_named(),
        }
    }

    fn parse_named(&mut self) -> Option<Type> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        let name = std::str::from_utf8(&self.chars[start..self.pos]).ok()?;

        if name == "fn" {
            self.skip_ws();
            if !self.eat(b'(') {
                return None;
            }
            let mut params = Vec::new();
            self.skip_ws();
            if !self.eat(b')') {
                loop {
                    params.push(self.parse_union()?);
                    self.skip_ws();
                    if self.eat(b',') {
                        continue;
                    }
                    if self.eat(b')') {
                        break;
                    }
                    return None;
                }
            }
            self.skip_ws();
            if !(self.eat(b'-') && self.eat(b'>')) {
                return None;
            }
            let ret = self.parse_union()?;
            return Some(Type::Function {
                params,
                ret: Box::new(ret),
            });
        }

        match name {
            "Nil" => return Some(Type::Nil),
            "Any" => return Some(Type::Any),
            "Unknown" => return Some(Type::Unknown),
            _ => {}
        }

        self.skip_ws();
        if self.eat(b'<') {
            let mut args = Vec::new();
            loop {
                args.push(self.parse_union()?);
                self.skip_ws();
                if self.eat(b',') {
                    continue;
                }
                if self.eat(b'>') {
                    break;
                }
                return None;
            }
            return Some(Type::Generic {
                base: name.to_string(),
                args,
            });
        }
        Some(Type::Primitive(name.to_string()))
    }
}

// ── Assignability ──────────────────────────────────────────────────────

/// Result of an assignability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignability {
    Assignable,
    /// `Float -> Int`: allowed, flagged only in strict mode.
    Narrowing,
    NotAssignable,
}

impl Assignability {
    pub fn ok(self) -> bool {
        self != Assignability::NotAssignable
    }

    fn worst(self, other: Assignability) -> Assignability {
        use Assignability::*;
        match (self, other) {
            (NotAssignable, _) | (_, NotAssignable) => NotAssignable,
            (Narrowing, _) | (_, Narrowing) => Narrowing,
            _ => Assignable,
        }
    }
}

/// Whether a value of type `src` can flow into a slot of type `dst`.
///
/// The relation is one-sided and gradual: top types accept both ways,
/// missing type information never errors (callers pass `Option<&Type>`
/// and skip the check on `None`), and named types are nominal --
/// `Record(N)`, `Primitive(N)`, `Adt(N)` and `Generic(N, _)` are
/// mutually assignable when the names agree.
pub fn is_assignable(src: &Type, dst: &Type) -> Assignability {
    use Assignability::*;

    if src.is_top() || dst.is_top() {
        return Assignable;
    }
    if matches!(src, Type::TypeVar(_)) || matches!(dst, Type::TypeVar(_)) {
        return Assignable;
    }

    // Numeric widening is one-way strict.
    if let (Type::Primitive(s), Type::Primitive(d)) = (src, dst) {
        if s == "Int" && d == "Float" {
            return Assignable;
        }
        if s == "Float" && d == "Int" {
            return Narrowing;
        }
        return if s == d { Assignable } else { NotAssignable };
    }

    // Nil is a member of every Option.
    if matches!(src, Type::Nil) {
        return match dst {
            Type::Nil => Assignable,
            Type::Generic { base, .. } if base == "Option" => Assignable,
            _ => NotAssignable,
        };
    }

    // A union source must be assignable member-by-member.
    if let Type::Union(members) = src {
        return members
            .iter()
            .map(|m| is_assignable(m, dst))
            .fold(Assignable, Assignability::worst);
    }
    // A union target accepts any member match.
    if let Type::Union(members) = dst {
        let mut best = NotAssignable;
        for m in members {
            match is_assignable(src, m) {
                Assignable => return Assignable,
                Narrowing => best = Narrowing,
                NotAssignable => {}
            }
        }
        return best;
    }

    match (src, dst) {
        (Type::Array(s), Type::Array(d)) => is_assignable(s, d),
        (Type::Tuple(ss), Type::Tuple(ds)) => {
            if ss.len() != ds.len() {
                return NotAssignable;
            }
            ss.iter()
                .zip(ds)
                .map(|(s, d)| is_assignable(s, d))
                .fold(Assignable, Assignability::worst)
        }
        (
            Type::Function { params: sp, ret: sr },
            Type::Function { params: dp, ret: dr },
        ) => {
            if sp.len() != dp.len() {
                return NotAssignable;
            }
            sp.iter()
                .zip(dp)
                .map(|(s, d)| is_assignable(d, s))
                .fold(is_assignable(sr, dr), Assignability::worst)
        }
        (Type::Generic { base: sb, args: sa }, Type::Generic { base: db, args: da }) => {
            if sb != db {
                return NotAssignable;
            }
            // A bare base acts as a wildcard for its parameters, both ways.
            if sa.is_empty() || da.is_empty() {
                return Assignable;
            }
            if sa.len() != da.len() {
                return NotAssignable;
            }
            sa.iter()
                .zip(da)
                .map(|(s, d)| is_assignable(s, d))
                .fold(Assignable, Assignability::worst)
        }
        _ => {
            // Nominal equivalence across representations of the same name.
            match (src.name(), dst.name()) {
                (Some(s), Some(d)) if s == d => Assignable,
                _ => NotAssignable,
            }
        }
    }
}
