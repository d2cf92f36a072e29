//! # lalrkit
//!
//! An LALR(1) parser generator with a stack-forking runtime.
//!
//! ## Overview
//!
//! - **Grammar model**: productions over interned symbols, EBNF shorthand
//!   (`X?`, `X*`, `X+`) expanded into memoized helper nonterminals, and
//!   FIRST/FOLLOW analysis
//! - **Automaton construction**: LR(0) item sets, LALR(1) lookaheads computed
//!   through a state-tagged grammar, then conflict pruning by lookahead and by
//!   declared precedence/associativity
//! - **Parse engine**: conflicts left in the tables are explored by forking
//!   parse stacks; error productions (`ERROR`) recover from bad input
//! - **Persistence**: tables can be saved as versioned JSON and reloaded
//!   instead of rebuilt
//!
//! Terminals are spelled in upper case (`NUM`, `PLUS`), nonterminals in lower
//! case (`expr`). `EOS` ends every input and `ERROR` marks error productions.
//!
//! ## Quick Start
//!
//! ```rust
//! use lalrkit::parser::{ParserBuilder, Token, Value};
//!
//! let mut builder = ParserBuilder::<Value>::new();
//! builder.left(&["PLUS", "MINUS"])?;
//! builder.production("expr", |c| {
//!     c.clause(".expr PLUS .expr", |v| Value::Int(v[0].as_int().unwrap_or(0) + v[1].as_int().unwrap_or(0)))?;
//!     c.clause(".expr MINUS .expr", |v| Value::Int(v[0].as_int().unwrap_or(0) - v[1].as_int().unwrap_or(0)))?;
//!     c.clause("NUM", |mut v| v.remove(0))?;
//!     Ok(())
//! })?;
//! let parser = builder.finalize()?;
//!
//! let num = |n: i64| Token::new("NUM").with_value(Value::Int(n));
//! let tokens = vec![num(10), Token::new("MINUS"), num(3), Token::new("MINUS"), num(2)];
//! assert_eq!(parser.parse(tokens).unwrap(), Value::Int(5));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Features
//!
//! - `parallel`: compute reduction lookaheads with rayon
//! - `diagnostics`: derive `miette::Diagnostic` for every error type

pub mod backend;
pub mod error;
pub mod grammar;
pub mod intern;
pub mod parser;

// Re-export commonly used types
pub use backend::lr::{Automaton, LalrConfig, TableCache};
pub use error::{ConstructionError, GrammarError, InternalError, ParseError, PersistError};
pub use grammar::{Grammar, GrammarBuilder, Symbol};
pub use parser::{ParseOptions, Parser, ParserBuilder, SemanticValue, Token, Value};
