//! Identifier interning.

use lasso::ThreadedRodeo;

pub use lasso::Spur as Symbol;

/// Maps each distinct spelling to one `Symbol` for the lifetime of a compilation.
///
/// Interning only needs a shared reference, so the lexer, the analyzer and the
/// lowering pass can all hold the same `&Interner`.
#[derive(Debug, Default)]
pub struct Interner {
    rodeo: ThreadedRodeo,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    pub fn intern(&self, s: &str) -> Symbol {
        self.rodeo.get_or_intern(s)
    }

    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.rodeo.get(s)
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.rodeo.resolve(&sym)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}
