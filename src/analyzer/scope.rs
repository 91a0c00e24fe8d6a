use std::collections::HashMap;

use crate::parser::DeclId;
use crate::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Parameter,
    Block,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    names: HashMap<Symbol, DeclId>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            names: HashMap::new(),
        }
    }

    pub fn get(&self, name: Symbol) -> Option<DeclId> {
        self.names.get(&name).copied()
    }
}

/// Stack of scope frames. The parent of a frame is the one below it.
#[derive(Clone, Debug, Default)]
pub struct ScopeChain {
    scopes: Vec<Scope>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self { scopes: vec![] }
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope::new(kind));
    }

    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    pub fn current_kind(&self) -> Option<ScopeKind> {
        self.current().map(|s| s.kind)
    }

    pub fn parent_kind(&self) -> Option<ScopeKind> {
        let len = self.scopes.len();
        if len < 2 {
            return None;
        }
        Some(self.scopes[len - 2].kind)
    }

    /// Binds `name` in the innermost frame. On a same-frame collision the
    /// existing declaration is returned and nothing changes.
    pub fn declare(&mut self, name: Symbol, decl: DeclId) -> Result<(), DeclId> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(decl);
        };
        if let Some(&existing) = scope.names.get(&name) {
            return Err(existing);
        }
        scope.names.insert(name, decl);
        Ok(())
    }

    pub fn lookup(&self, name: Symbol) -> Option<DeclId> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }
}
