//! Operator precedence and associativity.
//!
//! Precedence levels are assigned in declaration order: every declaration
//! gets a level one higher than the previous one, so later declarations bind
//! tighter.

use ahash::RandomState;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::production::{Production, ProductionId};
use super::symbol::{GrammarSymbol, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Associativity {
    Left,
    Right,
    NonAssoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Precedence {
    pub level: usize,
    pub assoc: Associativity,
}

/// Terminal precedences plus per-production overrides.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceTable {
    last_level: usize,
    terminals: HashMap<Symbol, Precedence, RandomState>,
    overrides: HashMap<ProductionId, Symbol, RandomState>,
    productions: HashMap<ProductionId, Precedence, RandomState>,
}

impl PrecedenceTable {
    /// Record one declaration line. Returns `Err(symbol)` for the first
    /// terminal that already has a precedence.
    pub(crate) fn declare(&mut self, assoc: Associativity, symbols: &[Symbol]) -> Result<usize, Symbol> {
        if let Some(taken) = symbols.iter().find(|s| self.terminals.contains_key(*s)) {
            return Err(*taken);
        }
        self.last_level += 1;
        let precedence = Precedence {
            level: self.last_level,
            assoc,
        };
        for symbol in symbols {
            self.terminals.insert(*symbol, precedence);
        }
        Ok(self.last_level)
    }

    pub(crate) fn set_override(&mut self, production: ProductionId, terminal: Symbol) {
        self.overrides.insert(production, terminal);
    }

    /// Assign every production its precedence: the override terminal's when
    /// one was given, otherwise the right-most terminal's.
    pub(crate) fn resolve_productions(&mut self, productions: &[Production<Symbol>]) {
        self.productions.clear();
        for production in productions {
            let terminal = self
                .overrides
                .get(&production.id)
                .copied()
                .or_else(|| production.last_terminal());
            if let Some(precedence) = terminal.and_then(|t| self.terminals.get(&t).copied()) {
                self.productions.insert(production.id, precedence);
            }
        }
    }

    #[must_use]
    pub fn terminal(&self, symbol: Symbol) -> Option<Precedence> {
        if symbol.is_terminal() {
            self.terminals.get(&symbol).copied()
        } else {
            None
        }
    }

    #[must_use]
    pub fn production(&self, id: ProductionId) -> Option<Precedence> {
        self.productions.get(&id).copied()
    }

    /// Declared terminals, ordered by level
    #[must_use]
    pub fn declared(&self) -> Vec<(Symbol, Precedence)> {
        let mut declared: Vec<_> = self.terminals.iter().map(|(s, p)| (*s, *p)).collect();
        declared.sort_by_key(|(s, p)| (p.level, *s));
        declared
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }
}
