//! # Parser
//!
//! [`ParserBuilder`] collects productions, actions and precedence
//! declarations; [`ParserBuilder::finalize`] builds the LALR automaton and
//! returns an immutable [`Parser`]. A parser is cheap to clone and can be
//! shared between threads.
//!
//! Parsing drives a set of [`ParseStack`]s over the token stream. Where the
//! automaton still has conflicts the stacks fork, so ambiguous grammars are
//! accepted: [`Parser::parse`] returns the first value that reaches Accept,
//! [`Parser::parse_all`] every one of them.
//!
//! Grammars that mention the `ERROR` terminal get error recovery: when no
//! stack can continue, the last one is unwound to a state that can shift
//! `ERROR`, and tokens are skipped until parsing resumes. A successful parse
//! that needed recovery is reported as [`ParseError::Handled`], which still
//! carries the result.

mod builder;
mod config;
mod engine;
mod recovery;
mod stack;
mod token;
mod value;

use std::io::Write;
use std::sync::Arc;

pub use builder::{ActionFn, Clauses, ParserBuilder};
pub(crate) use builder::Reducer;
pub use config::{AcceptMode, ArgStyle, FinalizeOptions, ParseOptions};
pub use recovery::RecoveredError;
pub use stack::ParseStack;
pub use token::{StreamPosition, Token};
pub use value::{SemanticValue, Value};

use crate::backend::lr::Automaton;
use crate::error::{InternalError, ParseError};
use engine::{Accepted, Engine};

/// An immutable parser: automaton tables plus reduction actions.
#[derive(Clone)]
pub struct Parser<V: SemanticValue> {
    automaton: Arc<Automaton>,
    reducers: Arc<[Reducer<V>]>,
    arg_style: ArgStyle,
    options: ParseOptions,
}

impl<V: SemanticValue> std::fmt::Debug for Parser<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("states", &self.automaton.len())
            .field("productions", &self.reducers.len())
            .field("arg_style", &self.arg_style)
            .field("options", &self.options)
            .finish()
    }
}

impl<V: SemanticValue> Parser<V> {
    pub(crate) fn new(
        automaton: Arc<Automaton>,
        reducers: Vec<Reducer<V>>,
        arg_style: ArgStyle,
        options: ParseOptions,
    ) -> Self {
        Self {
            automaton,
            reducers: reducers.into(),
            arg_style,
            options,
        }
    }

    #[must_use]
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    #[must_use]
    pub const fn options(&self) -> &ParseOptions {
        &self.options
    }

    #[must_use]
    pub const fn arg_style(&self) -> ArgStyle {
        self.arg_style
    }

    /// The same tables with different runtime options
    #[must_use]
    pub fn with_options(&self, options: ParseOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    fn engine(&self, mode: AcceptMode) -> Engine<'_, V> {
        Engine::new(&self.automaton, &self.reducers, self.arg_style, &self.options, mode)
    }

    /// Parse a token stream, returning the first accepted value.
    ///
    /// A trailing `EOS` token is appended when missing.
    pub fn parse(&self, tokens: impl IntoIterator<Item = Token<V>>) -> Result<V, ParseError<V>> {
        let accepted = self
            .engine(AcceptMode::First)
            .run(tokens.into_iter().collect())
            .map_err(ParseError::widen)?;
        first_match(accepted)
    }

    /// Parse a token stream, returning every accepted value.
    pub fn parse_all(&self, tokens: impl IntoIterator<Item = Token<V>>) -> Result<Vec<V>, ParseError<V, Vec<V>>> {
        let accepted = self
            .engine(AcceptMode::All)
            .run(tokens.into_iter().collect())
            .map_err(ParseError::widen)?;
        let mut errors = Vec::new();
        let mut values = Vec::with_capacity(accepted.len());
        for Accepted { value, errors: recovered } in accepted {
            errors.extend(recovered);
            values.push(value);
        }
        if errors.is_empty() {
            Ok(values)
        } else {
            Err(ParseError::Handled { errors, result: values })
        }
    }

    /// [`parse`](Self::parse), logging every stack operation to `trace`
    pub fn parse_traced(
        &self,
        tokens: impl IntoIterator<Item = Token<V>>,
        trace: &mut dyn Write,
    ) -> Result<V, ParseError<V>> {
        let accepted = self
            .engine(AcceptMode::First)
            .with_trace(trace)
            .run(tokens.into_iter().collect())
            .map_err(ParseError::widen)?;
        first_match(accepted)
    }

    /// Write the automaton report (see [`Automaton::explain`])
    pub fn explain<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        self.automaton.explain(out)
    }
}

fn first_match<V: SemanticValue>(accepted: Vec<Accepted<V>>) -> Result<V, ParseError<V>> {
    let Accepted { value, errors } = accepted.into_iter().next().ok_or(InternalError::EmptyAccept)?;
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(ParseError::Handled { errors, result: value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_parser_is_send_sync() {
        assert_send_sync::<Parser<Value>>();
    }

    #[test]
    fn test_with_options_shares_tables() {
        let mut builder = ParserBuilder::<Value>::new();
        builder.rule("s", "A", |mut v| v.remove(0)).unwrap();
        let parser = builder.finalize().unwrap();
        let tuned = parser.with_options(ParseOptions {
            error_recovery: false,
            ..ParseOptions::default()
        });
        assert!(std::ptr::eq(parser.automaton(), tuned.automaton()));
        assert!(!tuned.options().error_recovery);
    }
}
