use super::state::Action;
use super::table::Automaton;
use crate::error::ConstructionError;
use crate::grammar::{GrammarSymbol, Symbol};

/// Verify the structural invariants of a finished automaton.
///
/// - every nonterminal on a right-hand side has at least one production
/// - terminal rows hold only Shift, Reduce and Accept, and Accept only under `EOS`
/// - nonterminal rows hold exactly one GoTo
pub fn check(automaton: &Automaton) -> Result<(), ConstructionError> {
    let defined = |symbol: Symbol| automaton.productions().iter().any(|p| p.lhs == symbol);
    for production in automaton.productions() {
        if let Some(undefined) = production
            .rhs
            .iter()
            .find(|symbol| symbol.is_nonterminal() && !defined(**symbol))
        {
            return Err(ConstructionError::UndefinedNonterminal {
                name: automaton.name(*undefined).into(),
            });
        }
    }

    let eos = automaton.eos();
    for state in automaton.states() {
        for (symbol, actions) in state.actions() {
            let fail = |reason: &str| ConstructionError::Sanity {
                state: state.id(),
                symbol: automaton.name(symbol).into(),
                reason: reason.into(),
            };
            if symbol.is_terminal() {
                for action in actions {
                    match action {
                        Action::GoTo(_) => return Err(fail("GoTo under a terminal")),
                        Action::Accept if symbol != eos => return Err(fail("Accept under a terminal other than EOS")),
                        _ => {}
                    }
                }
            } else {
                match actions {
                    [Action::GoTo(_)] => {}
                    [_] => return Err(fail("nonterminal row without a GoTo")),
                    _ => return Err(fail("more than one action under a nonterminal")),
                }
            }
        }
    }
    Ok(())
}
