//! # Error Types
//!
//! Every failure the toolkit can report, grouped by the phase that raises it:
//!
//! - [`GrammarError`]: a grammar definition is malformed (bad symbol names,
//!   reserved names, unparsable right-hand sides, invalid start symbol).
//! - [`ConstructionError`]: the automaton could not be built from an otherwise
//!   well-formed grammar (empty grammar, undefined nonterminals, sanity check
//!   failures, non-associative conflicts, table persistence).
//! - [`InternalError`]: an automaton invariant was found broken at runtime.
//! - [`ParseError`]: the input token stream was rejected, or was accepted only
//!   after error productions absorbed part of it.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! and carry stable diagnostic codes.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

use crate::backend::lr::StateId;
use crate::grammar::ProductionId;
use crate::parser::{RecoveredError, SemanticValue, Token};

/// Errors raised while a grammar is being defined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("symbol `{name}` is neither all-uppercase (terminal) nor all-lowercase (nonterminal)")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::invalid_symbol)))]
    InvalidSymbol { name: String },

    #[error("`{name}` is used where a nonterminal is required")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::expected_nonterminal)))]
    ExpectedNonterminal { name: String },

    #[error("`{name}` is used where a terminal is required")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::expected_terminal)))]
    ExpectedTerminal { name: String },

    #[error("`{name}` is reserved and cannot be used here")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::reserved_symbol)))]
    ReservedSymbol { name: String },

    #[error("malformed right-hand side `{expr}`: {reason}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::malformed_expression)))]
    MalformedExpression { expr: String, reason: String },

    #[error("`{name}` cannot be the start symbol")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::invalid_start)))]
    InvalidStart { name: String },

    #[error("terminal `{name}` already has a declared precedence")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::precedence_redeclared)))]
    PrecedenceRedeclared { name: String },

    #[error("nonterminal `{name}` already has productions")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::already_defined)))]
    AlreadyDefined { name: String },

    #[error("production {id} does not exist")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unknown_production)))]
    UnknownProduction { id: ProductionId },
}

impl GrammarError {
    /// Create an invalid symbol error
    #[must_use]
    pub fn invalid_symbol(name: impl Into<String>) -> Self {
        Self::InvalidSymbol { name: name.into() }
    }

    /// Create a malformed expression error
    #[must_use]
    pub fn malformed(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedExpression {
            expr: expr.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while turning a grammar into a parse automaton.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ConstructionError {
    #[error("grammar has no productions")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(construction::empty_grammar)))]
    EmptyGrammar,

    #[error("nonterminal `{name}` is used but has no productions")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(construction::undefined_nonterminal)))]
    UndefinedNonterminal { name: String },

    #[error("non-associative terminal `{symbol}` is in conflict in state {state}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(construction::non_associative)))]
    NonAssociative { state: StateId, symbol: String },

    #[error("sanity check failed in state {state} under `{symbol}`: {reason}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(construction::sanity)))]
    Sanity {
        state: StateId,
        symbol: String,
        reason: String,
    },

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Errors raised while saving or loading a table artifact.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum PersistError {
    #[error("cannot access table artifact `{}`", .path.display())]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(persist::io)))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("table artifact is not well-formed")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(persist::format)))]
    Format(#[from] serde_json::Error),

    #[error("table artifact has schema version {found}, expected {expected}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(persist::version)))]
    Version { found: u32, expected: u32 },

    #[error("table artifact does not match the grammar: {reason}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(persist::mismatch)))]
    Mismatch { reason: String },
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn mismatch(reason: impl Into<String>) -> Self {
        Self::Mismatch {
            reason: reason.into(),
        }
    }
}

/// A broken automaton invariant. Seeing one of these is a bug in the table
/// construction, never a problem with the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum InternalError {
    #[error("state {state} has no GoTo under `{symbol}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(internal::missing_goto)))]
    MissingGoto { state: StateId, symbol: String },

    #[error("state {state} has a GoTo under terminal `{symbol}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(internal::goto_under_terminal)))]
    GotoUnderTerminal { state: StateId, symbol: String },

    #[error("no transition from state {state} under `{symbol}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(internal::missing_transition)))]
    MissingTransition { state: StateId, symbol: String },

    #[error("parse stack underflow while reducing production {production}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(internal::stack_underflow)))]
    StackUnderflow { production: ProductionId },

    #[error("production {production} is not part of the automaton")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(internal::unknown_production)))]
    UnknownProduction { production: ProductionId },

    #[error("parse finished without an accepted stack")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(internal::empty_accept)))]
    EmptyAccept,
}

/// Errors returned by the parse engine.
///
/// `R` is the result carried by [`ParseError::Handled`]: a single value for
/// first-match parses, every accepted value for all-matches parses.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError<V: SemanticValue, R: fmt::Debug = V> {
    #[error("token type `{}` is not part of the grammar", .token.kind)]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parse::bad_token)))]
    BadToken { token: Token<V> },

    #[error("unexpected `{}` after {} token(s)", .current.kind, .seen.len())]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parse::not_in_language)))]
    NotInLanguage {
        seen: Vec<Token<V>>,
        current: Token<V>,
        remaining: Vec<Token<V>>,
    },

    #[error("input accepted after recovering from {} error(s)", .errors.len())]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parse::handled)))]
    Handled {
        errors: Vec<RecoveredError<V>>,
        result: R,
    },

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl<V: SemanticValue, R: fmt::Debug> ParseError<V, R> {
    /// The recovered result, if the input was accepted through error productions
    #[must_use]
    pub fn recovered(self) -> Option<(R, Vec<RecoveredError<V>>)> {
        match self {
            Self::Handled { errors, result } => Some((result, errors)),
            _ => None,
        }
    }

    /// Whether the input was accepted despite the error
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

impl<V: SemanticValue> ParseError<V, std::convert::Infallible> {
    /// Re-type an error that can never carry a recovered result.
    pub(crate) fn widen<R: fmt::Debug>(self) -> ParseError<V, R> {
        match self {
            Self::BadToken { token } => ParseError::BadToken { token },
            Self::NotInLanguage {
                seen,
                current,
                remaining,
            } => ParseError::NotInLanguage {
                seen,
                current,
                remaining,
            },
            Self::Handled { result, .. } => match result {},
            Self::Internal(err) => ParseError::Internal(err),
        }
    }
}
