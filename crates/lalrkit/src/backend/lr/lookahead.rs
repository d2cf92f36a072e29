//! LALR(1) lookahead via the state-tagged grammar G′.
//!
//! Every nonterminal occurrence after a dot in state `s` becomes a distinct
//! nonterminal `(s, N)` of G′, and each production `N → X1 … Xk` becomes
//! `(s, N) → (s, X1) (s1, X2) … (sk-1, Xk)` where `si` follows the automaton's
//! transitions. FOLLOW sets of G′, with the state tags stripped, are exactly
//! the LALR(1) lookaheads of the reductions they reach.

use std::collections::BTreeSet;

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::state::{State, StateId};
use crate::error::InternalError;
use crate::grammar::{Cfg, Grammar, GrammarSymbol, ProductionId, Symbol, SymbolKind};

/// A grammar symbol tagged with the automaton state it is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaggedSymbol {
    pub state: StateId,
    pub symbol: Symbol,
}

impl GrammarSymbol for TaggedSymbol {
    fn kind(&self) -> SymbolKind {
        self.symbol.kind()
    }
}

/// Lookahead terminals per (state, production) reduction.
pub type ReductionLookaheads = HashMap<(StateId, ProductionId), BTreeSet<Symbol>, RandomState>;

/// The state-tagged grammar G′.
#[derive(Debug, Clone)]
pub struct TaggedGrammar {
    cfg: Cfg<TaggedSymbol>,
    nonterminals: Vec<TaggedSymbol>,
}

impl TaggedGrammar {
    pub fn derive(grammar: &Grammar, states: &[State]) -> Result<Self, InternalError> {
        let symbols = grammar.symbols();
        let tag = |state: StateId, symbol: Symbol| TaggedSymbol { state, symbol };

        let mut cfg = Cfg::new(tag(0, symbols.eos()));
        let start = tag(0, symbols.start());
        cfg.add_production(start, [tag(0, grammar.start())]);
        cfg.set_start(start);

        let mut nonterminals = vec![start];
        let mut seen = HashSet::<TaggedSymbol, RandomState>::default();
        seen.insert(start);
        for state in states {
            for item in state.items() {
                let Some(next) = item.next_symbol(grammar.productions()) else {
                    continue;
                };
                let lhs = tag(state.id(), next);
                if !next.is_nonterminal() || !seen.insert(lhs) {
                    continue;
                }
                nonterminals.push(lhs);
                for production in grammar.productions_for(next) {
                    let mut cursor = state.id();
                    let mut rhs = Vec::with_capacity(production.len());
                    for symbol in &production.rhs {
                        rhs.push(tag(cursor, *symbol));
                        cursor = step(grammar, states, cursor, *symbol)?;
                    }
                    cfg.add_production(lhs, rhs);
                }
            }
        }
        Ok(Self { cfg, nonterminals })
    }

    #[must_use]
    pub const fn cfg(&self) -> &Cfg<TaggedSymbol> {
        &self.cfg
    }

    /// FOLLOW of a tagged nonterminal with the tags stripped
    #[must_use]
    pub fn untagged_follow(&self, symbol: TaggedSymbol) -> BTreeSet<Symbol> {
        self.cfg.follow_iter(symbol).map(|tagged| tagged.symbol).collect()
    }
}

fn step(grammar: &Grammar, states: &[State], from: StateId, symbol: Symbol) -> Result<StateId, InternalError> {
    states
        .get(from)
        .and_then(|state| state.transition(symbol))
        .ok_or_else(|| InternalError::MissingTransition {
            state: from,
            symbol: grammar.name(symbol).into(),
        })
}

fn walk(grammar: &Grammar, states: &[State], from: StateId, rhs: &[Symbol]) -> Result<StateId, InternalError> {
    rhs.iter()
        .try_fold(from, |cursor, symbol| step(grammar, states, cursor, *symbol))
}

type Contribution = Vec<((StateId, ProductionId), BTreeSet<Symbol>)>;

fn contribution(
    grammar: &Grammar,
    states: &[State],
    tagged: &TaggedGrammar,
    lhs: TaggedSymbol,
) -> Result<Contribution, InternalError> {
    let follow = tagged.untagged_follow(lhs);
    grammar
        .productions_for(lhs.symbol)
        .map(|production| {
            let reduce_in = walk(grammar, states, lhs.state, &production.rhs)?;
            Ok(((reduce_in, production.id), follow.clone()))
        })
        .collect()
}

/// Compute the lookahead set of every reduction in the automaton.
///
/// For a G′ nonterminal `(s1, N)` and a production `p` of `N`, the reduction
/// by `p` happens in the state reached by walking `p`'s right-hand side from
/// `s1`; that reduction's lookahead includes FOLLOW((s1, N)).
pub fn reduction_lookaheads(grammar: &Grammar, states: &[State]) -> Result<ReductionLookaheads, InternalError> {
    let tagged = TaggedGrammar::derive(grammar, states)?;
    tagged.cfg.analyze();

    #[cfg(feature = "parallel")]
    let contributions: Vec<Contribution> = tagged
        .nonterminals
        .par_iter()
        .map(|lhs| contribution(grammar, states, &tagged, *lhs))
        .collect::<Result<_, _>>()?;

    #[cfg(not(feature = "parallel"))]
    let contributions: Vec<Contribution> = tagged
        .nonterminals
        .iter()
        .map(|lhs| contribution(grammar, states, &tagged, *lhs))
        .collect::<Result<_, _>>()?;

    let mut lookaheads = ReductionLookaheads::default();
    for ((state, production), follow) in contributions.into_iter().flatten() {
        lookaheads.entry((state, production)).or_default().extend(follow);
    }
    Ok(lookaheads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::lr::{Automaton, LalrConfig};
    use crate::grammar::GrammarBuilder;

    #[test]
    fn test_tagged_grammar_distinguishes_contexts() {
        // s -> a X a Y ; a -> Z
        let mut builder = GrammarBuilder::new();
        builder.add_production("s", &["a", "X", "a", "Y"]).unwrap();
        builder.add_production("a", &["Z"]).unwrap();
        let grammar = builder.build().unwrap();
        let automaton = Automaton::build(&grammar, &LalrConfig::lr0()).unwrap();
        let tagged = TaggedGrammar::derive(&grammar, automaton.states()).unwrap();

        let a = grammar.symbols().lookup("a").unwrap();
        let x = grammar.symbols().lookup("X").unwrap();
        let y = grammar.symbols().lookup("Y").unwrap();
        let first_a = TaggedSymbol { state: 0, symbol: a };
        assert_eq!(tagged.untagged_follow(first_a), BTreeSet::from([x]));

        let after_x = automaton
            .goto(0, a)
            .and_then(|s| automaton.states()[s].transition(x))
            .unwrap();
        let second_a = TaggedSymbol { state: after_x, symbol: a };
        assert_eq!(tagged.untagged_follow(second_a), BTreeSet::from([y]));
    }

    #[test]
    fn test_reduction_lookaheads_merge_contexts() {
        let mut builder = GrammarBuilder::new();
        builder.add_production("s", &["a", "X", "a", "Y"]).unwrap();
        builder.add_production("a", &["Z"]).unwrap();
        let grammar = builder.build().unwrap();
        let automaton = Automaton::build(&grammar, &LalrConfig::lr0()).unwrap();
        let lookaheads = reduction_lookaheads(&grammar, automaton.states()).unwrap();

        let z = grammar.symbols().lookup("Z").unwrap();
        let x = grammar.symbols().lookup("X").unwrap();
        let y = grammar.symbols().lookup("Y").unwrap();
        let after_z = automaton.states()[0].transition(z).unwrap();
        // both occurrences of `a` reduce in the same LR(0) state
        assert_eq!(lookaheads[&(after_z, 1)], BTreeSet::from([x, y]));
    }
}
