use serde::{Deserialize, Serialize};

use crate::grammar::{GrammarSymbol, Production, ProductionId};

/// An LR(0) item: a production with a dot marking how much of it has been matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Item {
    pub production: ProductionId,
    pub dot: usize,
}

impl Item {
    #[must_use]
    pub const fn new(production: ProductionId, dot: usize) -> Self {
        Self { production, dot }
    }

    /// The same item with the dot moved one symbol to the right
    #[must_use]
    pub const fn advance(self) -> Self {
        Self {
            production: self.production,
            dot: self.dot + 1,
        }
    }

    /// The symbol right after the dot
    #[must_use]
    pub fn next_symbol<S: GrammarSymbol>(&self, productions: &[Production<S>]) -> Option<S> {
        productions
            .get(self.production)
            .and_then(|p| p.rhs.get(self.dot).copied())
    }

    #[must_use]
    pub fn at_end<S: GrammarSymbol>(&self, productions: &[Production<S>]) -> bool {
        productions
            .get(self.production)
            .is_some_and(|p| self.dot >= p.rhs.len())
    }
}
