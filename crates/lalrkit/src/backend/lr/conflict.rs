//! Conflict reduction passes.
//!
//! Pass 1 removes reductions whose lookahead set does not contain the
//! terminal. Pass 2 resolves what is left with operator precedence. Anything
//! neither pass settles stays in the table and is explored by stack forking
//! at parse time.

use std::cmp::Ordering;

use smallvec::smallvec;

use super::lookahead::ReductionLookaheads;
use super::state::{Action, State};
use crate::error::ConstructionError;
use crate::grammar::{Associativity, GrammarSymbol, Precedence, PrecedenceTable, Symbol, SymbolNames};

/// Remove reductions that the lookahead sets rule out.
///
/// Retention keys on `ERROR` being declared, not on it being absent. Without
/// `ERROR` every out-of-lookahead reduction goes, even one that leaves a
/// formerly conflicting row empty: no valid input reaches that row under
/// that terminal. With `only_conflicts` set (grammars declaring `ERROR`) a
/// reduction is only removed where it shares its row with another action.
/// Keeping the others lets an erroneous input reduce far enough to reach a
/// state that can shift `ERROR`.
pub fn prune_by_lookahead(
    states: &mut [State],
    lookaheads: &ReductionLookaheads,
    terminals: &[Symbol],
    only_conflicts: bool,
) {
    for state in states.iter_mut() {
        for production in state.reductions() {
            let lookahead = lookaheads.get(&(state.id(), production));
            for terminal in terminals {
                if lookahead.is_some_and(|set| set.contains(terminal)) {
                    continue;
                }
                if only_conflicts && !state.conflict_on(*terminal) {
                    continue;
                }
                state.remove_action(*terminal, Action::Reduce(production));
            }
        }
    }
}

fn action_precedence(action: &Action, terminal: Symbol, table: &PrecedenceTable) -> Option<Precedence> {
    match action {
        Action::Shift(_) => table.terminal(terminal),
        Action::Reduce(production) => table.production(*production),
        Action::GoTo(_) | Action::Accept => None,
    }
}

/// Resolve conflicts where every action has a precedence.
///
/// The higher level wins. On equal levels a left-associative terminal
/// prefers the reduction, a right-associative one the shift, and a
/// non-associative one is a construction error. Two reductions at the same
/// level keep the earlier one.
pub fn resolve_by_precedence(
    states: &mut [State],
    table: &PrecedenceTable,
    symbols: &SymbolNames,
) -> Result<(), ConstructionError> {
    if table.is_empty() {
        return Ok(());
    }
    for state in states.iter_mut() {
        for (terminal, actions) in conflicting_rows(state) {
            let Some(precedences) = actions
                .iter()
                .map(|action| action_precedence(action, terminal, table))
                .collect::<Option<Vec<_>>>()
            else {
                continue;
            };

            let mut selected = 0;
            for candidate in 1..actions.len() {
                let (current, challenger) = (precedences[selected], precedences[candidate]);
                match challenger.level.cmp(&current.level) {
                    Ordering::Greater => selected = candidate,
                    Ordering::Less => {}
                    Ordering::Equal => match challenger.assoc {
                        Associativity::Left => {
                            if actions[candidate].is_reduce() && !actions[selected].is_reduce() {
                                selected = candidate;
                            }
                        }
                        Associativity::Right => {
                            if actions[candidate].is_shift() && !actions[selected].is_shift() {
                                selected = candidate;
                            }
                        }
                        Associativity::NonAssoc => {
                            return Err(ConstructionError::NonAssociative {
                                state: state.id(),
                                symbol: symbols.name(terminal).into(),
                            });
                        }
                    },
                }
            }
            state.set_actions(terminal, smallvec![actions[selected]]);
        }
    }
    Ok(())
}

fn conflicting_rows(state: &State) -> Vec<(Symbol, Vec<Action>)> {
    state
        .conflicts()
        .into_iter()
        .filter(|(symbol, _)| symbol.is_terminal())
        .map(|(symbol, actions)| (symbol, actions.to_vec()))
        .collect()
}
