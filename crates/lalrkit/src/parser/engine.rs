//! The stack-forking driver.
//!
//! Every live stack consults the action table under the current token.
//! Stacks with several actions fork; stacks with none die, enter error
//! recovery, or (already recovering) discard the token. Reductions re-examine
//! the same token, shifts move the stack on to the next one.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::io::Write;

use super::builder::Reducer;
use super::config::{AcceptMode, ArgStyle, ParseOptions};
use super::recovery::{RecoveredError, recover};
use super::stack::ParseStack;
use super::token::{StreamPosition, Token};
use super::value::SemanticValue;
use crate::backend::lr::{Action, Automaton};
use crate::error::{InternalError, ParseError};
use crate::grammar::{ProductionId, Symbol};

/// A stack that reached Accept.
#[derive(Debug)]
pub(crate) struct Accepted<V> {
    pub value: V,
    pub errors: Vec<RecoveredError<V>>,
}

/// Stacks of the token being processed.
struct Round<V> {
    processing: VecDeque<ParseStack<V>>,
    moving_on: Vec<ParseStack<V>>,
}

pub(crate) struct Engine<'a, V: SemanticValue> {
    automaton: &'a Automaton,
    reducers: &'a [Reducer<V>],
    arg_style: ArgStyle,
    options: &'a ParseOptions,
    mode: AcceptMode,
    trace: Option<&'a mut dyn Write>,
    next_id: usize,
}

impl<'a, V: SemanticValue> Engine<'a, V> {
    pub(crate) fn new(
        automaton: &'a Automaton,
        reducers: &'a [Reducer<V>],
        arg_style: ArgStyle,
        options: &'a ParseOptions,
        mode: AcceptMode,
    ) -> Self {
        Self {
            automaton,
            reducers,
            arg_style,
            options,
            mode,
            trace: None,
            next_id: 0,
        }
    }

    pub(crate) fn with_trace(mut self, out: &'a mut dyn Write) -> Self {
        self.trace = Some(out);
        self
    }

    fn fresh_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reductions a stack may apply under one token.
    ///
    /// Each reduction pops at most one frame net of its push, or walks a unit
    /// or empty rule through at most every state. Beyond that the stack is
    /// spinning in a cycle such as `a → a`.
    fn reduction_limit(&self, stack: &ParseStack<V>) -> usize {
        (stack.entry_depth() + 1).saturating_mul(self.automaton.len().max(1))
    }

    pub(crate) fn run(mut self, mut tokens: Vec<Token<V>>) -> Result<Vec<Accepted<V>>, ParseError<V, Infallible>> {
        if !tokens.last().is_some_and(Token::is_eos) {
            tokens.push(Token::eos());
        }
        let first = ParseStack::new(self.fresh_id());
        let mut stacks = vec![first];
        let mut accepted = Vec::new();
        let mut previous = StreamPosition::default();

        for index in 0..tokens.len() {
            let token = &tokens[index];
            let Some(terminal) = self.automaton.terminal(&token.kind) else {
                return Err(ParseError::BadToken { token: token.clone() });
            };
            let position = token.position.unwrap_or_else(|| previous.following());
            previous = position;
            self.trace_line(format_args!("token {index}: {} ({} stacks)", token.kind, stacks.len()));

            let mut round = Round {
                processing: stacks
                    .into_iter()
                    .map(|mut stack| {
                        stack.begin_token();
                        stack
                    })
                    .collect(),
                moving_on: Vec::new(),
            };
            while let Some(stack) = round.processing.pop_front() {
                self.process(stack, token, terminal, index, position, &mut round, &mut accepted)?;
                if self.mode == AcceptMode::First && !accepted.is_empty() {
                    return Ok(accepted);
                }
            }

            stacks = round.moving_on;
            if stacks.is_empty() {
                if !accepted.is_empty() {
                    return Ok(accepted);
                }
                return Err(not_in_language(tokens, index));
            }
            if stacks.len() > self.options.max_stacks {
                self.trace_line(format_args!("  dropping {} stacks", stacks.len() - self.options.max_stacks));
                stacks.truncate(self.options.max_stacks.max(1));
            }
        }

        if accepted.is_empty() {
            let last = tokens.len() - 1;
            return Err(not_in_language(tokens, last));
        }
        Ok(accepted)
    }

    #[allow(clippy::too_many_arguments)]
    fn process(
        &mut self,
        mut stack: ParseStack<V>,
        token: &Token<V>,
        terminal: Symbol,
        index: usize,
        position: StreamPosition,
        round: &mut Round<V>,
        accepted: &mut Vec<Accepted<V>>,
    ) -> Result<(), InternalError> {
        let automaton = self.automaton;
        let actions = automaton.actions(stack.state(), terminal);

        let Some((last, rest)) = actions.split_last() else {
            if stack.recovery.in_error_mode() && terminal != automaton.eos() {
                self.trace_line(format_args!("  stack {} discards {}", stack.id(), token.kind));
                stack.recovery.discard(token.clone());
                round.moving_on.push(stack);
            } else if self.options.error_recovery
                && automaton.uses_error()
                && round.processing.is_empty()
                && round.moving_on.is_empty()
                && accepted.is_empty()
                && stack.recovery.can_recover_at(index)
                && recover(&mut stack, automaton, index, position)
            {
                self.trace_line(format_args!("  stack {} recovers into state {}", stack.id(), stack.state()));
                round.processing.push_back(stack);
            } else {
                self.trace_line(format_args!("  stack {} dies in state {}", stack.id(), stack.state()));
            }
            return Ok(());
        };

        for action in rest {
            if round.processing.len() + round.moving_on.len() >= self.options.max_stacks.max(1) {
                let live = self.options.max_stacks;
                self.trace_line(format_args!("  stack {} cannot fork: {live} stacks live", stack.id()));
                continue;
            }
            let fork = stack.fork(self.fresh_id());
            self.trace_line(format_args!("  stack {} forks into {}", stack.id(), fork.id()));
            self.apply(fork, *action, token, position, round, accepted)?;
        }
        self.apply(stack, *last, token, position, round, accepted)
    }

    fn apply(
        &mut self,
        mut stack: ParseStack<V>,
        action: Action,
        token: &Token<V>,
        position: StreamPosition,
        round: &mut Round<V>,
        accepted: &mut Vec<Accepted<V>>,
    ) -> Result<(), InternalError> {
        let automaton = self.automaton;
        if self.trace.is_some() {
            let rendered = automaton.display_action(&action);
            self.trace_line(format_args!("  stack {} state {}: {rendered}", stack.id(), stack.state()));
        }
        match action {
            Action::Shift(target) => {
                stack.push(target, token.value.clone().unwrap_or_default(), position);
                stack.recovery.leave_error_mode();
                round.moving_on.push(stack);
            }
            Action::Reduce(production) => {
                if stack.count_reduction() > self.reduction_limit(&stack) {
                    self.trace_line(format_args!("  stack {} dropped: reduction cycle", stack.id()));
                    return Ok(());
                }
                self.reduce(&mut stack, production)?;
                round.processing.push_back(stack);
            }
            Action::Accept => {
                let errors = std::mem::take(&mut stack.recovery).into_recovered();
                accepted.push(Accepted {
                    value: stack.into_value(),
                    errors,
                });
            }
            Action::GoTo(_) => {
                return Err(InternalError::GotoUnderTerminal {
                    state: stack.state(),
                    symbol: token.kind.to_string(),
                });
            }
        }
        Ok(())
    }

    fn reduce(&self, stack: &mut ParseStack<V>, production: ProductionId) -> Result<(), InternalError> {
        let automaton = self.automaton;
        let unknown = || InternalError::UnknownProduction { production };
        let rule = automaton.production(production).ok_or_else(unknown)?;
        let reducer = self.reducers.get(production).ok_or_else(unknown)?;

        let popped = stack
            .pop(rule.len())
            .ok_or(InternalError::StackUnderflow { production })?;
        let position = match (popped.first(), popped.last()) {
            (Some((_, first)), Some((_, last))) => StreamPosition::span(first, last),
            _ => stack.top_position().following(),
        };
        let error = automaton.error();
        let values = popped
            .into_iter()
            .zip(&rule.rhs)
            .map(|((value, _), symbol)| {
                if *symbol == error {
                    stack.recovery.settle(production)
                } else {
                    value
                }
            })
            .collect();
        let value = reducer.apply(values, self.arg_style);

        let state = stack.state();
        let target = automaton
            .goto(state, rule.lhs)
            .ok_or_else(|| InternalError::MissingGoto {
                state,
                symbol: automaton.name(rule.lhs).into(),
            })?;
        stack.push(target, value, position);
        Ok(())
    }

    fn trace_line(&mut self, line: std::fmt::Arguments<'_>) {
        if let Some(out) = self.trace.as_mut() {
            // Tracing never fails a parse.
            let _ = writeln!(out, "{line}");
        }
    }
}

fn not_in_language<V: SemanticValue>(mut tokens: Vec<Token<V>>, index: usize) -> ParseError<V, Infallible> {
    let mut remaining = tokens.split_off(index);
    let current = remaining.remove(0);
    if remaining.last().is_some_and(Token::is_eos) {
        remaining.pop();
    }
    ParseError::NotInLanguage {
        seen: tokens,
        current,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParserBuilder, Value};

    fn sum_parser() -> crate::parser::Parser<Value> {
        let mut builder = ParserBuilder::<Value>::new();
        builder.left(&["PLUS"]).unwrap();
        builder
            .rule("e", ".e PLUS .e", |v| {
                Value::Int(v[0].as_int().unwrap_or(0) + v[1].as_int().unwrap_or(0))
            })
            .unwrap();
        builder.rule("e", "NUM", |mut v| v.remove(0)).unwrap();
        builder.finalize().unwrap()
    }

    fn num(n: i64) -> Token<Value> {
        Token::new("NUM").with_value(Value::Int(n))
    }

    #[test]
    fn test_explicit_eos_is_not_duplicated() {
        let parser = sum_parser();
        let tokens = vec![num(1), Token::new("PLUS"), num(2), Token::eos()];
        assert_eq!(parser.parse(tokens).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_not_in_language_excludes_end_marker() {
        let parser = sum_parser();
        let err = parser
            .parse(vec![num(1), Token::new("PLUS"), Token::new("PLUS"), num(2)])
            .unwrap_err();
        match err {
            ParseError::NotInLanguage {
                seen,
                current,
                remaining,
            } => {
                assert_eq!(seen.len(), 2);
                assert_eq!(current.kind, "PLUS");
                assert_eq!(remaining.len(), 1);
                assert_eq!(remaining[0].kind, "NUM");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_premature_end() {
        let parser = sum_parser();
        let err = parser.parse(vec![num(1), Token::new("PLUS")]).unwrap_err();
        match err {
            ParseError::NotInLanguage { current, remaining, .. } => {
                assert!(current.is_eos());
                assert!(remaining.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_trace_mentions_tokens_and_actions() {
        let parser = sum_parser();
        let mut out = Vec::new();
        parser
            .parse_traced(vec![num(1), Token::new("PLUS"), num(2)], &mut out)
            .unwrap();
        let trace = String::from_utf8(out).unwrap();
        assert!(trace.contains("token 0: NUM"));
        assert!(trace.contains("shift"));
        assert!(trace.contains("accept"));
    }
}
