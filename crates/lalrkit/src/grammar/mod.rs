//! # Grammar Module
//!
//! Context-free grammars over named symbols.
//!
//! ## Overview
//!
//! - **Symbols**: interned names whose spelling fixes their kind
//!   (`NUM` is a terminal, `expr` a nonterminal)
//! - **Productions**: densely numbered rules, each tagged with its origin
//! - **Analysis**: nullability, FIRST and FOLLOW by fixpoint iteration,
//!   generic over the symbol type
//! - **EBNF**: `X?`, `X*` and `X+` on right-hand sides, expanded into
//!   memoized helper nonterminals
//! - **Precedence**: per-terminal levels and associativity used to resolve
//!   conflicts during table construction
//!
//! A [`GrammarBuilder`] collects productions; [`GrammarBuilder::build`]
//! validates them and yields an immutable [`Grammar`].

mod analysis;
mod builder;
mod ebnf;
mod precedence;
mod production;
mod symbol;

pub use analysis::{Cfg, FirstSet};
pub use builder::{Grammar, GrammarBuilder};
pub use ebnf::{EbnfOp, ExpandedRhs, RhsTerm, parse_rhs};
pub use precedence::{Associativity, Precedence, PrecedenceTable};
pub use production::{HelperRole, Production, ProductionId, ProductionOrigin};
pub use symbol::{EOS, ERROR, GrammarSymbol, START, Symbol, SymbolKind, SymbolNames, SymbolTable};
