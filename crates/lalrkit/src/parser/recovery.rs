//! Error-production recovery.
//!
//! When the last surviving stack has no action for a token, states are
//! popped until one can shift `ERROR`. The stack then enters error mode:
//! tokens it cannot act on are discarded instead of killing it, until the
//! next successful shift. Discarded tokens become the payload of the error
//! production that eventually reduces.

use super::stack::ParseStack;
use super::token::{StreamPosition, Token};
use super::value::SemanticValue;
use crate::backend::lr::{Action, Automaton};
use crate::grammar::ProductionId;

/// One error absorbed by an error production.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredError<V> {
    /// The error production that was reduced
    pub production: ProductionId,
    /// Tokens discarded while recovering
    pub tokens: Vec<Token<V>>,
}

/// Per-stack recovery bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct RecoveryState<V> {
    error_mode: bool,
    pending: Option<Vec<Token<V>>>,
    recovered: Vec<RecoveredError<V>>,
    last_recovery: Option<usize>,
}

impl<V> Default for RecoveryState<V> {
    fn default() -> Self {
        Self {
            error_mode: false,
            pending: None,
            recovered: Vec::new(),
            last_recovery: None,
        }
    }
}

impl<V: SemanticValue> RecoveryState<V> {
    pub(crate) const fn in_error_mode(&self) -> bool {
        self.error_mode
    }

    /// Recovery may fire at most once per token index.
    pub(crate) fn can_recover_at(&self, index: usize) -> bool {
        self.last_recovery != Some(index)
    }

    fn enter(&mut self, index: usize) {
        self.error_mode = true;
        self.pending = Some(Vec::new());
        self.last_recovery = Some(index);
    }

    pub(crate) fn leave_error_mode(&mut self) {
        self.error_mode = false;
    }

    /// Buffer a token skipped in error mode. Once the error production has
    /// reduced, later skipped tokens extend its record instead.
    pub(crate) fn discard(&mut self, token: Token<V>) {
        if let Some(pending) = self.pending.as_mut() {
            pending.push(token);
        } else if let Some(last) = self.recovered.last_mut() {
            last.tokens.push(token);
        }
    }

    /// Close the pending buffer for a reduction of `production`, returning
    /// the value for its `ERROR` position.
    pub(crate) fn settle(&mut self, production: ProductionId) -> V {
        let tokens = self.pending.take().unwrap_or_default();
        let value = V::from_items(
            tokens
                .iter()
                .map(|token| token.value.clone().unwrap_or_default())
                .collect(),
        );
        self.recovered.push(RecoveredError { production, tokens });
        value
    }

    pub(crate) fn into_recovered(self) -> Vec<RecoveredError<V>> {
        self.recovered
    }
}

/// Pop states until one can shift `ERROR`, then shift it and enter error mode.
///
/// Returns `false` when the stack runs out of states first.
pub(crate) fn recover<V: SemanticValue>(
    stack: &mut ParseStack<V>,
    automaton: &Automaton,
    index: usize,
    position: StreamPosition,
) -> bool {
    let error = automaton.error();
    loop {
        let target = automaton
            .actions(stack.state(), error)
            .iter()
            .find_map(|action| match action {
                Action::Shift(target) => Some(*target),
                _ => None,
            });
        if let Some(target) = target {
            stack.push(target, V::default(), StreamPosition { length: 0, ..position });
            stack.recovery.enter(index);
            return true;
        }
        if !stack.pop_frame() {
            return false;
        }
    }
}
