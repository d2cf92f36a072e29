//! Productions and their provenance.

use smallvec::SmallVec;

use super::symbol::GrammarSymbol;

/// Dense production index, assigned from 0 in creation order.
pub type ProductionId = usize;

/// One grammar rule `lhs → rhs`. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production<S> {
    pub id: ProductionId,
    pub lhs: S,
    pub rhs: SmallVec<[S; 4]>,
}

impl<S: GrammarSymbol> Production<S> {
    #[must_use]
    pub fn new(id: ProductionId, lhs: S, rhs: impl IntoIterator<Item = S>) -> Self {
        Self {
            id,
            lhs,
            rhs: rhs.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    /// Whether this is an ε-production
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    /// The right-most terminal of the right-hand side
    #[must_use]
    pub fn last_terminal(&self) -> Option<S> {
        self.rhs.iter().rev().copied().find(GrammarSymbol::is_terminal)
    }
}

/// Where a production came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductionOrigin {
    /// Written by the grammar author
    Declared,
    /// The synthesized `$start → S` production
    Start,
    /// Generated by EBNF expansion or a named list/optional definition
    Helper(HelperRole),
}

/// The part a generated production plays in its helper nonterminal.
///
/// Helper reductions have fixed semantics, so each role maps to exactly one
/// built-in action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperRole {
    /// `h → ε`: absent optional, yields the default value
    OptionalEmpty,
    /// `h → X`: present optional, yields X's value
    OptionalPresent,
    /// `h → ε`: empty list
    ListEmpty,
    /// `h → n`: non-empty list, yields n's value
    ListNonempty,
    /// `n → X`: one-element list
    NonemptySingle,
    /// `n → X n` or `n → X SEP n`: prepend X to the rest
    NonemptyCons { separated: bool },
}
