//! Identifier interning.
//!
//! `Symbol` wraps a reference-counted string so AST nodes and interpreter
//! scopes can carry identifiers around cheaply (clone is a refcount bump,
//! equality is a string compare) without needing to carry an external
//! interner table to every call site that wants the text back. `Interner`
//! still dedups the underlying allocations for the common case of the same
//! name appearing many times in one source file.

use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Symbol {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol(Rc::from(s))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deduplicates identifier allocations within one parse.
#[derive(Default)]
pub struct Interner {
    lookup: FxHashMap<Rc<str>, Symbol>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(existing) = self.lookup.get(s) {
            return existing.clone();
        }
        let rc: Rc<str> = Rc::from(s);
        let sym = Symbol(rc.clone());
        self.lookup.insert(rc, sym.clone());
        sym
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_string_interns_to_same_symbol() {
        let mut i = Interner::new();
        let a = i.intern("main");
        let b = i.intern("main");
        let c = i.intern("other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "main");
    }
}
