//! # String Interning Module
//!
//! Symbol names are interned once and then handled as small [`Spur`] keys.
//!
//! A grammar under construction owns a mutable [`Interner`]. When the grammar
//! is finished the interner is frozen into a [`FrozenInterner`], which is
//! read-only and can be shared between threads together with the automaton.
//!
//! ```rust
//! use lalrkit::intern::Interner;
//!
//! let mut interner = Interner::new();
//! let a = interner.intern("expr");
//! let b = interner.intern("expr");
//! assert_eq!(a, b);
//!
//! let frozen = interner.freeze();
//! assert_eq!(frozen.resolve(a), "expr");
//! assert_eq!(frozen.get("expr"), Some(a));
//! ```

use std::fmt;

use lasso::{Rodeo, RodeoReader, Spur};

/// A mutable string interner used while a grammar is being defined.
pub struct Interner {
    rodeo: Rodeo,
}

impl Interner {
    /// Create a new empty interner
    #[must_use]
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Intern a string, returning its key
    ///
    /// If the string has already been interned, returns the existing key.
    pub fn intern(&mut self, s: &str) -> Spur {
        self.rodeo.get_or_intern(s)
    }

    /// Look up a string without interning it
    #[must_use]
    pub fn get(&self, s: &str) -> Option<Spur> {
        self.rodeo.get(s)
    }

    /// Resolve a key back to its string
    #[must_use]
    pub fn resolve(&self, key: Spur) -> &str {
        self.rodeo.resolve(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// Freeze the interner; no more strings can be added afterwards
    #[must_use]
    pub fn freeze(self) -> FrozenInterner {
        FrozenInterner {
            reader: self.rodeo.into_reader(),
        }
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("len", &self.rodeo.len())
            .finish()
    }
}

/// A read-only interner, safe to share across threads.
pub struct FrozenInterner {
    reader: RodeoReader,
}

impl FrozenInterner {
    #[must_use]
    pub fn get(&self, s: &str) -> Option<Spur> {
        self.reader.get(s)
    }

    #[must_use]
    pub fn resolve(&self, key: Spur) -> &str {
        self.reader.resolve(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reader.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    /// Iterate over every interned string in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Spur, &str)> + '_ {
        self.reader.iter()
    }
}

impl fmt::Debug for FrozenInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrozenInterner")
            .field("len", &self.reader.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let mut interner = Interner::new();
        let a = interner.intern("NUM");
        let b = interner.intern("NUM");
        let c = interner.intern("PLUS");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_freeze_keeps_keys() {
        let mut interner = Interner::new();
        let key = interner.intern("stmt");
        let frozen = interner.freeze();
        assert_eq!(frozen.get("stmt"), Some(key));
        assert_eq!(frozen.resolve(key), "stmt");
        assert_eq!(frozen.get("missing"), None);
    }
}
