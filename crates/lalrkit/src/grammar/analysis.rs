//! # Grammar Analysis
//!
//! A plain context-free grammar over any [`GrammarSymbol`] type, with
//! nullability, FIRST and FOLLOW sets.
//!
//! The sets are computed together by whole-grammar fixpoint iteration the
//! first time any of them is requested, and cached until the next production
//! is added. Fixpoint iteration handles left recursion and mutual recursion
//! without any cycle bookkeeping.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use super::production::{Production, ProductionId};
use super::symbol::GrammarSymbol;

/// The FIRST set of a symbol or symbol sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSet<S> {
    /// Terminals that can begin a derivation
    pub terminals: BTreeSet<S>,
    /// Whether the sequence can derive the empty string
    pub epsilon: bool,
}

impl<S: GrammarSymbol> FirstSet<S> {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            terminals: BTreeSet::new(),
            epsilon: false,
        }
    }

    #[must_use]
    pub fn contains(&self, symbol: &S) -> bool {
        self.terminals.contains(symbol)
    }
}

#[derive(Debug, Clone)]
struct Analysis<S: GrammarSymbol> {
    nullable: HashSet<S, RandomState>,
    first: HashMap<S, BTreeSet<S>, RandomState>,
    follow: HashMap<S, BTreeSet<S>, RandomState>,
}

impl<S: GrammarSymbol> Analysis<S> {
    fn compute(cfg: &Cfg<S>) -> Self {
        let mut analysis = Self {
            nullable: HashSet::default(),
            first: HashMap::default(),
            follow: HashMap::default(),
        };
        analysis.compute_first(cfg);
        analysis.compute_follow(cfg);
        analysis
    }

    fn compute_first(&mut self, cfg: &Cfg<S>) {
        loop {
            let mut changed = false;
            for production in &cfg.productions {
                let rest = self.first_of_sequence(&production.rhs);
                if rest.epsilon && self.nullable.insert(production.lhs) {
                    changed = true;
                }
                let entry = self.first.entry(production.lhs).or_default();
                let before = entry.len();
                entry.extend(rest.terminals);
                changed |= entry.len() != before;
            }
            if !changed {
                break;
            }
        }
    }

    fn compute_follow(&mut self, cfg: &Cfg<S>) {
        if let Some(start) = cfg.start {
            self.follow.entry(start).or_default().insert(cfg.end_marker);
        }
        loop {
            let mut changed = false;
            for production in &cfg.productions {
                // Walk right to left carrying what may follow the current position.
                let mut trailer = self.follow.get(&production.lhs).cloned().unwrap_or_default();
                for symbol in production.rhs.iter().rev() {
                    let entry = self.follow.entry(*symbol).or_default();
                    let before = entry.len();
                    entry.extend(trailer.iter().copied());
                    changed |= entry.len() != before;

                    if symbol.is_terminal() {
                        trailer = BTreeSet::from([*symbol]);
                    } else {
                        let first = self.first.get(symbol).cloned().unwrap_or_default();
                        if self.nullable.contains(symbol) {
                            trailer.extend(first);
                        } else {
                            trailer = first;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn first_of_sequence(&self, sequence: &[S]) -> FirstSet<S> {
        let mut set = FirstSet::empty();
        for symbol in sequence {
            if symbol.is_terminal() {
                set.terminals.insert(*symbol);
                return set;
            }
            if let Some(first) = self.first.get(symbol) {
                set.terminals.extend(first.iter().copied());
            }
            if !self.nullable.contains(symbol) {
                return set;
            }
        }
        set.epsilon = true;
        set
    }
}

/// A context-free grammar with cached FIRST/FOLLOW analysis.
#[derive(Debug, Clone)]
pub struct Cfg<S: GrammarSymbol> {
    productions: Vec<Production<S>>,
    by_lhs: HashMap<S, SmallVec<[ProductionId; 4]>, RandomState>,
    start: Option<S>,
    end_marker: S,
    analysis: OnceLock<Analysis<S>>,
}

impl<S: GrammarSymbol> Cfg<S> {
    /// Create an empty grammar whose start symbol is followed by `end_marker`
    #[must_use]
    pub fn new(end_marker: S) -> Self {
        Self {
            productions: Vec::new(),
            by_lhs: HashMap::default(),
            start: None,
            end_marker,
            analysis: OnceLock::new(),
        }
    }

    /// Append a production and return its id. Invalidates cached analysis.
    pub fn add_production(&mut self, lhs: S, rhs: impl IntoIterator<Item = S>) -> ProductionId {
        let id = self.productions.len();
        self.productions.push(Production::new(id, lhs, rhs));
        self.by_lhs.entry(lhs).or_default().push(id);
        self.analysis = OnceLock::new();
        id
    }

    pub fn set_start(&mut self, start: S) {
        if self.start != Some(start) {
            self.start = Some(start);
            self.analysis = OnceLock::new();
        }
    }

    #[must_use]
    pub const fn start(&self) -> Option<S> {
        self.start
    }

    #[must_use]
    pub const fn end_marker(&self) -> S {
        self.end_marker
    }

    #[must_use]
    pub fn productions(&self) -> &[Production<S>] {
        &self.productions
    }

    #[must_use]
    pub fn production(&self, id: ProductionId) -> Option<&Production<S>> {
        self.productions.get(id)
    }

    /// Productions with `lhs` on the left, in creation order
    pub fn productions_for(&self, lhs: S) -> impl Iterator<Item = &Production<S>> + '_ {
        self.by_lhs
            .get(&lhs)
            .into_iter()
            .flatten()
            .map(|&id| &self.productions[id])
    }

    #[must_use]
    pub fn defines(&self, lhs: S) -> bool {
        self.by_lhs.contains_key(&lhs)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.productions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Nonterminals with at least one production, in first-definition order
    #[must_use]
    pub fn nonterminals(&self) -> Vec<S> {
        let mut seen = HashSet::<S, RandomState>::default();
        self.productions
            .iter()
            .map(|p| p.lhs)
            .filter(|lhs| seen.insert(*lhs))
            .collect()
    }

    /// Terminals appearing on any right-hand side, sorted
    #[must_use]
    pub fn terminals(&self) -> BTreeSet<S> {
        self.productions
            .iter()
            .flat_map(|p| p.rhs.iter().copied())
            .filter(GrammarSymbol::is_terminal)
            .collect()
    }

    fn analysis(&self) -> &Analysis<S> {
        self.analysis.get_or_init(|| Analysis::compute(self))
    }

    /// Force the cached analysis to be computed now
    pub fn analyze(&self) {
        self.analysis();
    }

    #[must_use]
    pub fn nullable(&self, symbol: S) -> bool {
        symbol.is_nonterminal() && self.analysis().nullable.contains(&symbol)
    }

    /// FIRST of a single symbol. A terminal's FIRST set is itself.
    #[must_use]
    pub fn first_of(&self, symbol: S) -> FirstSet<S> {
        self.first_set(&[symbol])
    }

    /// FIRST of a symbol sequence. The empty sequence yields `{ε}`.
    #[must_use]
    pub fn first_set(&self, sequence: &[S]) -> FirstSet<S> {
        self.analysis().first_of_sequence(sequence)
    }

    /// FOLLOW of a symbol. The start symbol's FOLLOW contains the end marker.
    #[must_use]
    pub fn follow_set(&self, symbol: S) -> BTreeSet<S> {
        self.analysis()
            .follow
            .get(&symbol)
            .cloned()
            .unwrap_or_default()
    }

    /// Borrowing variant of [`follow_set`](Self::follow_set)
    pub fn follow_iter(&self, symbol: S) -> impl Iterator<Item = S> + '_ {
        self.analysis().follow.get(&symbol).into_iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolKind;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum T {
        End,
        Plus,
        Num,
        LParen,
        RParen,
        E,
        F,
        Opt,
    }

    impl GrammarSymbol for T {
        fn kind(&self) -> SymbolKind {
            match self {
                T::E | T::F | T::Opt => SymbolKind::Nonterminal,
                _ => SymbolKind::Terminal,
            }
        }
    }

    fn expr_grammar() -> Cfg<T> {
        let mut cfg = Cfg::new(T::End);
        cfg.add_production(T::E, [T::E, T::Plus, T::F]);
        cfg.add_production(T::E, [T::F]);
        cfg.add_production(T::F, [T::Num]);
        cfg.add_production(T::F, [T::LParen, T::E, T::RParen]);
        cfg.set_start(T::E);
        cfg
    }

    #[test]
    fn test_first_left_recursive() {
        let cfg = expr_grammar();
        let first = cfg.first_of(T::E);
        assert_eq!(first.terminals, BTreeSet::from([T::Num, T::LParen]));
        assert!(!first.epsilon);
    }

    #[test]
    fn test_first_of_terminal_is_itself() {
        let cfg = expr_grammar();
        assert_eq!(cfg.first_of(T::Plus).terminals, BTreeSet::from([T::Plus]));
    }

    #[test]
    fn test_empty_sequence_is_epsilon() {
        let cfg = expr_grammar();
        let first = cfg.first_set(&[]);
        assert!(first.epsilon);
        assert!(first.terminals.is_empty());
    }

    #[test]
    fn test_follow() {
        let cfg = expr_grammar();
        assert_eq!(
            cfg.follow_set(T::E),
            BTreeSet::from([T::End, T::Plus, T::RParen])
        );
        assert_eq!(
            cfg.follow_set(T::F),
            BTreeSet::from([T::End, T::Plus, T::RParen])
        );
    }

    #[test]
    fn test_nullable_propagates() {
        let mut cfg = Cfg::new(T::End);
        cfg.add_production(T::Opt, []);
        cfg.add_production(T::Opt, [T::Plus]);
        cfg.add_production(T::E, [T::Opt, T::Num]);
        cfg.set_start(T::E);
        assert!(cfg.nullable(T::Opt));
        assert!(!cfg.nullable(T::E));
        assert_eq!(
            cfg.first_of(T::E).terminals,
            BTreeSet::from([T::Plus, T::Num])
        );
        assert_eq!(cfg.follow_set(T::Opt), BTreeSet::from([T::Num]));
    }

    #[test]
    fn test_adding_production_invalidates_cache() {
        let mut cfg = expr_grammar();
        assert!(!cfg.first_of(T::E).epsilon);
        cfg.add_production(T::F, []);
        assert!(cfg.first_of(T::E).epsilon);
    }
}
