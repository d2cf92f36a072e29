use ahash::RandomState;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::item::Item;
use crate::grammar::{ProductionId, Symbol};

/// Dense automaton state index. State 0 is the initial state.
pub type StateId = usize;

/// LR parsing action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Push the token and move to a state
    Shift(StateId),
    /// Reduce by a production
    Reduce(ProductionId),
    /// Move to a state after reducing to a nonterminal
    GoTo(StateId),
    /// Input accepted
    Accept,
}

impl Action {
    #[must_use]
    pub const fn is_reduce(&self) -> bool {
        matches!(self, Self::Reduce(_))
    }

    #[must_use]
    pub const fn is_shift(&self) -> bool {
        matches!(self, Self::Shift(_))
    }
}

/// Ordered actions for one (state, symbol) pair. More than one means a conflict.
pub type ActionList = SmallVec<[Action; 2]>;

/// An automaton state: a closed item set and its action table row.
#[derive(Debug, Clone)]
pub struct State {
    id: StateId,
    items: Vec<Item>,
    actions: HashMap<Symbol, ActionList, RandomState>,
    transitions: HashMap<Symbol, StateId, RandomState>,
}

impl State {
    pub(crate) fn new(id: StateId, items: Vec<Item>) -> Self {
        Self {
            id,
            items,
            actions: HashMap::default(),
            transitions: HashMap::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> StateId {
        self.id
    }

    /// Items in sorted order
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Actions under `symbol`, in insertion order
    #[must_use]
    pub fn actions_on(&self, symbol: Symbol) -> &[Action] {
        self.actions.get(&symbol).map_or(&[], |list| list.as_slice())
    }

    /// Every (symbol, actions) row, sorted by symbol
    #[must_use]
    pub fn actions(&self) -> Vec<(Symbol, &[Action])> {
        let mut rows: Vec<_> = self
            .actions
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(symbol, list)| (*symbol, list.as_slice()))
            .collect();
        rows.sort_by_key(|(symbol, _)| *symbol);
        rows
    }

    /// Rows holding more than one action, sorted by symbol
    #[must_use]
    pub fn conflicts(&self) -> Vec<(Symbol, &[Action])> {
        let mut rows = self.actions();
        rows.retain(|(_, list)| list.len() > 1);
        rows
    }

    #[must_use]
    pub fn conflict_on(&self, symbol: Symbol) -> bool {
        self.actions_on(symbol).len() > 1
    }

    /// The transition target under `symbol`, recorded at construction and
    /// unaffected by later pruning
    #[must_use]
    pub fn transition(&self, symbol: Symbol) -> Option<StateId> {
        self.transitions.get(&symbol).copied()
    }

    /// Every recorded transition, in no particular order
    pub fn transitions(&self) -> impl Iterator<Item = (Symbol, StateId)> + '_ {
        self.transitions.iter().map(|(symbol, target)| (*symbol, *target))
    }

    /// Append an action unless an equal one is already present
    pub(crate) fn add_action(&mut self, symbol: Symbol, action: Action) {
        let list = self.actions.entry(symbol).or_default();
        if !list.contains(&action) {
            list.push(action);
        }
    }

    pub(crate) fn add_transition(&mut self, symbol: Symbol, target: StateId) {
        self.transitions.insert(symbol, target);
    }

    pub(crate) fn remove_action(&mut self, symbol: Symbol, action: Action) {
        if let Some(list) = self.actions.get_mut(&symbol) {
            list.retain(|a| *a != action);
        }
    }

    pub(crate) fn set_actions(&mut self, symbol: Symbol, actions: ActionList) {
        self.actions.insert(symbol, actions);
    }

    /// Distinct productions this state can reduce by
    #[must_use]
    pub fn reductions(&self) -> Vec<ProductionId> {
        let mut productions: Vec<_> = self
            .actions
            .values()
            .flatten()
            .filter_map(|action| match action {
                Action::Reduce(p) => Some(*p),
                _ => None,
            })
            .collect();
        productions.sort_unstable();
        productions.dedup();
        productions
    }
}
