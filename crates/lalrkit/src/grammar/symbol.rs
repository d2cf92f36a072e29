//! Grammar symbols and the symbol table.
//!
//! A symbol's kind is fixed by its spelling: names matching `[A-Z][A-Z0-9_]*`
//! are terminals and names matching `[a-z][a-z0-9_]*` are nonterminals. Three
//! names are reserved: [`EOS`] and [`ERROR`] (terminals) and [`START`], the
//! synthesized start nonterminal.

use std::fmt;
use std::hash::Hash;

use lasso::Spur;

use crate::error::GrammarError;
use crate::intern::{FrozenInterner, Interner};

/// End-of-stream terminal, implicitly appended to every token stream.
pub const EOS: &str = "EOS";
/// Error terminal used to declare error productions.
pub const ERROR: &str = "ERROR";
/// Synthesized start nonterminal.
pub const START: &str = "$start";

/// Whether a symbol is a terminal or a nonterminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

impl SymbolKind {
    /// Classify a symbol name by its spelling.
    ///
    /// Returns `None` for names that are neither all-uppercase nor all-lowercase.
    #[must_use]
    pub fn classify(name: &str) -> Option<Self> {
        if name == START {
            return Some(Self::Nonterminal);
        }
        let mut chars = name.chars();
        let first = chars.next()?;
        let rest_ok = |upper: bool| {
            name.chars().skip(1).all(|c| {
                c.is_ascii_digit()
                    || c == '_'
                    || if upper {
                        c.is_ascii_uppercase()
                    } else {
                        c.is_ascii_lowercase()
                    }
            })
        };
        if first.is_ascii_uppercase() && rest_ok(true) {
            Some(Self::Terminal)
        } else if first.is_ascii_lowercase() && rest_ok(false) {
            Some(Self::Nonterminal)
        } else {
            None
        }
    }
}

/// Anything that can appear in a context-free grammar.
///
/// The FIRST/FOLLOW machinery in [`Cfg`](super::Cfg) is generic over this
/// trait so that it serves both the user grammar and the state-tagged grammar
/// used for lookahead computation.
pub trait GrammarSymbol: Copy + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> SymbolKind;

    fn is_terminal(&self) -> bool {
        self.kind() == SymbolKind::Terminal
    }

    fn is_nonterminal(&self) -> bool {
        self.kind() == SymbolKind::Nonterminal
    }
}

/// An interned grammar symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    key: Spur,
    kind: SymbolKind,
}

impl Symbol {
    #[must_use]
    pub const fn new(key: Spur, kind: SymbolKind) -> Self {
        Self { key, kind }
    }

    #[must_use]
    pub const fn key(&self) -> Spur {
        self.key
    }
}

impl GrammarSymbol for Symbol {
    fn kind(&self) -> SymbolKind {
        self.kind
    }
}

/// Interned symbols of a grammar under construction.
#[derive(Debug)]
pub struct SymbolTable {
    interner: Interner,
    eos: Symbol,
    error: Symbol,
    start: Symbol,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let eos = Symbol::new(interner.intern(EOS), SymbolKind::Terminal);
        let error = Symbol::new(interner.intern(ERROR), SymbolKind::Terminal);
        let start = Symbol::new(interner.intern(START), SymbolKind::Nonterminal);
        Self {
            interner,
            eos,
            error,
            start,
        }
    }

    /// Intern a user-facing symbol name.
    ///
    /// `EOS` and `ERROR` are accepted (they are ordinary terminals from the
    /// grammar's point of view); the synthesized start symbol is not.
    pub fn intern(&mut self, name: &str) -> Result<Symbol, GrammarError> {
        if name == START {
            return Err(GrammarError::ReservedSymbol { name: name.into() });
        }
        let kind = SymbolKind::classify(name).ok_or_else(|| GrammarError::invalid_symbol(name))?;
        Ok(Symbol::new(self.interner.intern(name), kind))
    }

    pub fn intern_terminal(&mut self, name: &str) -> Result<Symbol, GrammarError> {
        let symbol = self.intern(name)?;
        if symbol.is_terminal() {
            Ok(symbol)
        } else {
            Err(GrammarError::ExpectedTerminal { name: name.into() })
        }
    }

    pub fn intern_nonterminal(&mut self, name: &str) -> Result<Symbol, GrammarError> {
        let symbol = self.intern(name)?;
        if symbol.is_nonterminal() {
            Ok(symbol)
        } else {
            Err(GrammarError::ExpectedNonterminal { name: name.into() })
        }
    }

    /// Look up an already interned symbol
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        let key = self.interner.get(name)?;
        SymbolKind::classify(name).map(|kind| Symbol::new(key, kind))
    }

    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol.key)
    }

    #[must_use]
    pub const fn eos(&self) -> Symbol {
        self.eos
    }

    #[must_use]
    pub const fn error(&self) -> Symbol {
        self.error
    }

    #[must_use]
    pub const fn start(&self) -> Symbol {
        self.start
    }

    #[must_use]
    pub fn freeze(self) -> SymbolNames {
        SymbolNames {
            interner: self.interner.freeze(),
            eos: self.eos,
            error: self.error,
            start: self.start,
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The frozen symbol table of a finished grammar.
#[derive(Debug)]
pub struct SymbolNames {
    interner: FrozenInterner,
    eos: Symbol,
    error: Symbol,
    start: Symbol,
}

impl SymbolNames {
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        let key = self.interner.get(name)?;
        SymbolKind::classify(name).map(|kind| Symbol::new(key, kind))
    }

    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol.key)
    }

    #[must_use]
    pub const fn eos(&self) -> Symbol {
        self.eos
    }

    #[must_use]
    pub const fn error(&self) -> Symbol {
        self.error
    }

    #[must_use]
    pub const fn start(&self) -> Symbol {
        self.start
    }

    /// Every interned symbol, reserved ones included
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.interner
            .iter()
            .filter_map(|(key, name)| SymbolKind::classify(name).map(|kind| Symbol::new(key, kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(SymbolKind::classify("NUM"), Some(SymbolKind::Terminal));
        assert_eq!(SymbolKind::classify("PLUS_2"), Some(SymbolKind::Terminal));
        assert_eq!(SymbolKind::classify("expr"), Some(SymbolKind::Nonterminal));
        assert_eq!(SymbolKind::classify("arg_list2"), Some(SymbolKind::Nonterminal));
        assert_eq!(SymbolKind::classify("Expr"), None);
        assert_eq!(SymbolKind::classify("_x"), None);
        assert_eq!(SymbolKind::classify("2X"), None);
        assert_eq!(SymbolKind::classify(""), None);
        assert_eq!(SymbolKind::classify(START), Some(SymbolKind::Nonterminal));
    }

    #[test]
    fn test_reserved_symbols() {
        let mut table = SymbolTable::new();
        assert_eq!(table.intern(EOS).unwrap(), table.eos());
        assert_eq!(table.intern(ERROR).unwrap(), table.error());
        assert!(matches!(
            table.intern(START),
            Err(GrammarError::ReservedSymbol { .. })
        ));
        assert!(table.start().is_nonterminal());
    }

    #[test]
    fn test_kind_checks() {
        let mut table = SymbolTable::new();
        assert!(table.intern_terminal("NUM").is_ok());
        assert!(matches!(
            table.intern_terminal("num"),
            Err(GrammarError::ExpectedTerminal { .. })
        ));
        assert!(matches!(
            table.intern_nonterminal("NUM"),
            Err(GrammarError::ExpectedNonterminal { .. })
        ));
        assert!(matches!(
            table.intern("MixedCase"),
            Err(GrammarError::InvalidSymbol { .. })
        ));
    }

    #[test]
    fn test_frozen_lookup() {
        let mut table = SymbolTable::new();
        let expr = table.intern("expr").unwrap();
        let names = table.freeze();
        assert_eq!(names.lookup("expr"), Some(expr));
        assert_eq!(names.name(expr), "expr");
        assert_eq!(names.lookup(START), Some(names.start()));
    }
}
