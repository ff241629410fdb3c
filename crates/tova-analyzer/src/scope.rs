//! Scope tree and symbol table.
//!
//! Scopes form an arena-indexed tree: each scope holds a context tag, a
//! parent index, ordered child indices, and a name -> symbol map. Side
//! tables index by name or [`ScopeId`] rather than pointers, so the tree
//! is cycle-free. `find_scope_at` supports position -> scope lookup for
//! IDE tooling.

use rustc_hash::FxHashMap;

use tova_common::span::Span;

use crate::ty::Type;

/// Index of a scope in the [`ScopeTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// What kind of construct a scope belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeContext {
    Module,
    Server,
    Client,
    Shared,
    Function,
    Block,
    Component,
    Store,
    Loop,
    Match,
    Data,
    Form,
}

/// What kind of thing a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Type,
    Variant,
    Import,
    State,
    Computed,
    Component,
    Store,
    Parameter,
}

/// A named entity in some scope.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Option<Type>,
    pub mutable: bool,
    pub decl_span: Span,
}

/// One lexical scope.
#[derive(Debug)]
pub struct Scope {
    pub context: ScopeContext,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: FxHashMap<String, Symbol>,
    pub span: Span,
}

/// The scope arena. Index 0 is always the module scope.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new(module_span: Span) -> Self {
        ScopeTree {
            scopes: vec![Scope {
                context: ScopeContext::Module,
                parent: None,
                children: Vec::new(),
                symbols: FxHashMap::default(),
                span: module_span,
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Create a child scope and link it under `parent`.
    pub fn push_scope(&mut self, parent: ScopeId, context: ScopeContext, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            context,
            parent: Some(parent),
            children: Vec::new(),
            symbols: FxHashMap::default(),
            span,
        });
        self.scopes[parent.0 as usize].children.push(id);
        id
    }

    /// Define a symbol in `scope`. Returns the existing symbol when the
    /// name is already taken in the same scope (a hard error for callers).
    pub fn define(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), Symbol> {
        let map = &mut self.scopes[scope.0 as usize].symbols;
        if let Some(existing) = map.get(&symbol.name) {
            return Err(existing.clone());
        }
        map.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Overwrite or insert without the duplicate check (used for inferred
    /// type refinement on reassignment).
    pub fn redefine(&mut self, scope: ScopeId, symbol: Symbol) {
        self.scopes[scope.0 as usize]
            .symbols
            .insert(symbol.name.clone(), symbol);
    }

    /// Look up a name from `scope`, walking ancestors.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if let Some(sym) = s.symbols.get(name) {
                return Some(sym);
            }
            current = s.parent;
        }
        None
    }

    /// Look up a name and report which scope defines it.
    pub fn lookup_with_scope(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &Symbol)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if let Some(sym) = s.symbols.get(name) {
                return Some((id, sym));
            }
            current = s.parent;
        }
        None
    }

    /// Whether `scope` or any ancestor has the given context.
    pub fn in_context(&self, scope: ScopeId, context: ScopeContext) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if s.context == context {
                return true;
            }
            current = s.parent;
        }
        false
    }

    /// The deepest scope whose span contains `offset`.
    pub fn find_scope_at(&self, offset: u32) -> ScopeId {
        let mut best = self.root();
        let mut best_len = u32::MAX;
        for (i, scope) in self.scopes.iter().enumerate() {
            if scope.span.contains(offset) {
                let len = scope.span.len();
                if len < best_len || (len == best_len && i > best.0 as usize) {
                    best = ScopeId(i as u32);
                    best_len = len;
                }
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Variable,
            ty: None,
            mutable: false,
            decl_span: Span::new(0, 1),
        }
    }

    #[test]
    fn lookup_walks_ancestors() {
        let mut tree = ScopeTree::new(Span::new(0, 100));
        tree.define(tree.root(), sym("x")).unwrap();
        let inner = tree.push_scope(tree.root(), ScopeContext::Function, Span::new(10, 50));
        assert!(tree.lookup(inner, "x").is_some());
        assert!(tree.lookup(inner, "y").is_none());
    }

    #[test]
    fn duplicate_definition_in_same_scope_is_rejected() {
        let mut tree = ScopeTree::new(Span::new(0, 10));
        tree.define(tree.root(), sym("x")).unwrap();
        assert!(tree.define(tree.root(), sym("x")).is_err());
    }

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        let mut tree = ScopeTree::new(Span::new(0, 100));
        tree.define(tree.root(), sym("x")).unwrap();
        let inner = tree.push_scope(tree.root(), ScopeContext::Block, Span::new(10, 50));
        assert!(tree.define(inner, sym("x")).is_ok());
    }

    #[test]
    fn find_scope_at_returns_deepest() {
        let mut tree = ScopeTree::new(Span::new(0, 100));
        let outer = tree.push_scope(tree.root(), ScopeContext::Function, Span::new(10, 80));
        let inner = tree.push_scope(outer, ScopeContext::Block, Span::new(20, 40));
        assert_eq!(tree.find_scope_at(25), inner);
        assert_eq!(tree.find_scope_at(50), outer);
        assert_eq!(tree.find_scope_at(5), tree.root());
    }

    #[test]
    fn context_walks_up() {
        let mut tree = ScopeTree::new(Span::new(0, 100));
        let client = tree.push_scope(tree.root(), ScopeContext::Client, Span::new(0, 90));
        let comp = tree.push_scope(client, ScopeContext::Component, Span::new(5, 60));
        assert!(tree.in_context(comp, ScopeContext::Client));
        assert!(!tree.in_context(comp, ScopeContext::Server));
    }
}
