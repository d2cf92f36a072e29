use std::collections::BTreeSet;
use std::sync::Arc;

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};

use super::config::LalrConfig;
use super::item::Item;
use super::state::{Action, State, StateId};
use super::{conflict, lookahead, sanity};
use crate::error::ConstructionError;
use crate::grammar::{Grammar, GrammarSymbol, PrecedenceTable, Production, ProductionId, Symbol, SymbolNames};

/// LALR(1) parse automaton: states with (possibly conflicting) action lists.
///
/// Built once from a [`Grammar`] and immutable afterwards, so it can be shared
/// freely between threads.
#[derive(Debug, Clone)]
pub struct Automaton {
    symbols: Arc<SymbolNames>,
    productions: Vec<Production<Symbol>>,
    states: Vec<State>,
    terminals: Vec<Symbol>,
    start: Symbol,
    start_production: ProductionId,
    precedence: PrecedenceTable,
    uses_error: bool,
    config: LalrConfig,
}

impl Automaton {
    /// Build the automaton: LR(0) item sets, then lookahead pruning and
    /// precedence resolution as configured, then the sanity check.
    pub fn build(grammar: &Grammar, config: &LalrConfig) -> Result<Self, ConstructionError> {
        let mut states = Construction::new(grammar).run();
        if config.lookahead {
            let lookaheads = lookahead::reduction_lookaheads(grammar, &states)?;
            conflict::prune_by_lookahead(&mut states, &lookaheads, &grammar.terminals(), grammar.uses_error());
        }
        if config.precedence {
            conflict::resolve_by_precedence(&mut states, grammar.precedence(), grammar.symbols())?;
        }
        let automaton = Self::from_parts(grammar, states, config.clone());
        sanity::check(&automaton)?;
        Ok(automaton)
    }

    pub(crate) fn from_parts(grammar: &Grammar, states: Vec<State>, config: LalrConfig) -> Self {
        Self {
            symbols: grammar.shared_symbols(),
            productions: grammar.productions().to_vec(),
            states,
            terminals: grammar.terminals(),
            start: grammar.start(),
            start_production: grammar.start_production(),
            precedence: grammar.precedence().clone(),
            uses_error: grammar.uses_error(),
            config,
        }
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolNames {
        &self.symbols
    }

    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        self.symbols.name(symbol)
    }

    #[must_use]
    pub fn productions(&self) -> &[Production<Symbol>] {
        &self.productions
    }

    #[must_use]
    pub fn production(&self, id: ProductionId) -> Option<&Production<Symbol>> {
        self.productions.get(id)
    }

    #[must_use]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Actions of `state` under `symbol`; empty when there are none
    #[must_use]
    pub fn actions(&self, state: StateId, symbol: Symbol) -> &[Action] {
        self.states.get(state).map_or(&[], |s| s.actions_on(symbol))
    }

    /// The GoTo target of `state` under a nonterminal
    #[must_use]
    pub fn goto(&self, state: StateId, nonterminal: Symbol) -> Option<StateId> {
        self.actions(state, nonterminal).iter().find_map(|action| match action {
            Action::GoTo(target) => Some(*target),
            _ => None,
        })
    }

    /// Terminals the automaton dispatches on, `EOS` included
    #[must_use]
    pub fn terminals(&self) -> &[Symbol] {
        &self.terminals
    }

    /// Resolve a token type name to one of the automaton's terminals
    #[must_use]
    pub fn terminal(&self, name: &str) -> Option<Symbol> {
        self.symbols
            .lookup(name)
            .filter(|symbol| self.terminals.binary_search(symbol).is_ok())
    }

    #[must_use]
    pub fn eos(&self) -> Symbol {
        self.symbols.eos()
    }

    #[must_use]
    pub fn error(&self) -> Symbol {
        self.symbols.error()
    }

    /// The user start symbol
    #[must_use]
    pub const fn start(&self) -> Symbol {
        self.start
    }

    #[must_use]
    pub const fn start_production(&self) -> ProductionId {
        self.start_production
    }

    /// Whether the grammar declares error productions
    #[must_use]
    pub const fn uses_error(&self) -> bool {
        self.uses_error
    }

    #[must_use]
    pub const fn precedence(&self) -> &PrecedenceTable {
        &self.precedence
    }

    #[must_use]
    pub const fn config(&self) -> &LalrConfig {
        &self.config
    }

    /// Every remaining conflict as (state, symbol, actions)
    #[must_use]
    pub fn conflicts(&self) -> Vec<(StateId, Symbol, Vec<Action>)> {
        self.states
            .iter()
            .flat_map(|state| {
                state
                    .conflicts()
                    .into_iter()
                    .map(move |(symbol, actions)| (state.id(), symbol, actions.to_vec()))
            })
            .collect()
    }

    /// A production rendered as `lhs -> a b c`
    #[must_use]
    pub fn display_production(&self, id: ProductionId) -> String {
        let Some(production) = self.production(id) else {
            return format!("<production {id}>");
        };
        let mut out = format!("{} ->", self.name(production.lhs));
        if production.is_empty() {
            out.push_str(" <empty>");
        }
        for symbol in &production.rhs {
            out.push(' ');
            out.push_str(self.name(*symbol));
        }
        out
    }
}

/// LR(0) item-set construction.
///
/// States are discovered breadth-first and numbered in creation order; item
/// sets that close to the same set of items are the same state.
struct Construction<'g> {
    grammar: &'g Grammar,
    states: Vec<State>,
    index: HashMap<Vec<Item>, StateId, RandomState>,
}

impl<'g> Construction<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            states: Vec::new(),
            index: HashMap::default(),
        }
    }

    fn closure(&self, kernel: impl IntoIterator<Item = Item>) -> Vec<Item> {
        let productions = self.grammar.productions();
        let mut items: BTreeSet<Item> = kernel.into_iter().collect();
        let mut work: Vec<Item> = items.iter().copied().collect();
        let mut expanded = HashSet::<Symbol, RandomState>::default();
        while let Some(item) = work.pop() {
            if let Some(next) = item.next_symbol(productions)
                && next.is_nonterminal()
                && expanded.insert(next)
            {
                for production in self.grammar.productions_for(next) {
                    let fresh = Item::new(production.id, 0);
                    if items.insert(fresh) {
                        work.push(fresh);
                    }
                }
            }
        }
        items.into_iter().collect()
    }

    fn intern_state(&mut self, items: Vec<Item>) -> StateId {
        if let Some(&id) = self.index.get(&items) {
            return id;
        }
        let id = self.states.len();
        self.index.insert(items.clone(), id);
        self.states.push(State::new(id, items));
        id
    }

    /// The state reached from `from` by moving the dot over `symbol`
    fn goto(&mut self, from: StateId, symbol: Symbol) -> Option<StateId> {
        let productions = self.grammar.productions();
        let kernel: Vec<Item> = self.states[from]
            .items()
            .iter()
            .filter(|item| item.next_symbol(productions) == Some(symbol))
            .map(|item| item.advance())
            .collect();
        if kernel.is_empty() {
            return None;
        }
        let items = self.closure(kernel);
        Some(self.intern_state(items))
    }

    fn run(mut self) -> Vec<State> {
        let grammar = self.grammar;
        let productions = grammar.productions();
        let start_production = grammar.start_production();

        let initial = self.closure([Item::new(start_production, 0)]);
        self.intern_state(initial);

        let mut cursor = 0;
        while cursor < self.states.len() {
            let mut next_symbols: Vec<Symbol> = Vec::new();
            for item in self.states[cursor].items() {
                if let Some(symbol) = item.next_symbol(productions)
                    && !next_symbols.contains(&symbol)
                {
                    next_symbols.push(symbol);
                }
            }
            for symbol in next_symbols {
                if let Some(target) = self.goto(cursor, symbol) {
                    let action = if symbol.is_terminal() {
                        Action::Shift(target)
                    } else {
                        Action::GoTo(target)
                    };
                    let state = &mut self.states[cursor];
                    state.add_transition(symbol, target);
                    state.add_action(symbol, action);
                }
            }
            cursor += 1;
        }

        let eos = grammar.symbols().eos();
        let error = grammar.symbols().error();
        let reduce_on: Vec<Symbol> = grammar.terminals().into_iter().filter(|t| *t != error).collect();
        for state in &mut self.states {
            let completed: Vec<ProductionId> = state
                .items()
                .iter()
                .filter(|item| item.at_end(productions))
                .map(|item| item.production)
                .collect();
            for production in completed {
                if production == start_production {
                    state.add_action(eos, Action::Accept);
                } else {
                    for terminal in &reduce_on {
                        state.add_action(*terminal, Action::Reduce(production));
                    }
                }
            }
        }
        self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    fn sum_grammar() -> Grammar {
        let mut builder = GrammarBuilder::new();
        builder.add_production("e", &["e", "PLUS", "t"]).unwrap();
        builder.add_production("e", &["t"]).unwrap();
        builder.add_production("t", &["NUM"]).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_lr0_states() {
        let grammar = sum_grammar();
        let automaton = Automaton::build(&grammar, &LalrConfig::lr0()).unwrap();
        // $start->.e | $start->e. e->e.PLUS t | e->t. | t->NUM. | e->e PLUS.t | e->e PLUS t.
        assert_eq!(automaton.len(), 6);
        let eos = automaton.eos();
        let e = grammar.start();
        let after_e = automaton.goto(0, e).unwrap();
        assert_eq!(automaton.actions(after_e, eos), &[Action::Accept]);
    }

    #[test]
    fn test_lr0_reduces_on_every_terminal() {
        let grammar = sum_grammar();
        let automaton = Automaton::build(&grammar, &LalrConfig::lr0()).unwrap();
        let num = automaton.terminal("NUM").unwrap();
        let after_num = match automaton.actions(0, num) {
            [Action::Shift(target)] => *target,
            other => panic!("unexpected actions {other:?}"),
        };
        for terminal in automaton.terminals() {
            assert!(automaton.actions(after_num, *terminal).iter().any(Action::is_reduce));
        }
    }

    #[test]
    fn test_lookahead_prunes_reductions() {
        let grammar = sum_grammar();
        let automaton = Automaton::build(&grammar, &LalrConfig::default()).unwrap();
        let num = automaton.terminal("NUM").unwrap();
        let plus = automaton.terminal("PLUS").unwrap();
        let after_num = match automaton.actions(0, num) {
            [Action::Shift(target)] => *target,
            other => panic!("unexpected actions {other:?}"),
        };
        assert!(automaton.actions(after_num, num).is_empty());
        assert_eq!(automaton.actions(after_num, plus).len(), 1);
        assert!(automaton.conflicts().is_empty());
    }

    #[test]
    fn test_terminal_lookup() {
        let grammar = sum_grammar();
        let automaton = Automaton::build(&grammar, &LalrConfig::default()).unwrap();
        assert!(automaton.terminal("PLUS").is_some());
        assert!(automaton.terminal("EOS").is_some());
        assert!(automaton.terminal("e").is_none());
        assert!(automaton.terminal("MINUS").is_none());
    }
}
