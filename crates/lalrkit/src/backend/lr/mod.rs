//! # LALR(1) Automaton
//!
//! Construction of the parse automaton used by the stack-forking engine.
//!
//! ## Pipeline
//!
//! 1. **Item sets**: LR(0) closure and goto, states numbered breadth-first;
//!    completed items reduce under every terminal, `$start → S·` accepts
//!    under `EOS`.
//! 2. **Lookahead** ([`LalrConfig::lookahead`]): the state-tagged grammar
//!    G′ yields an LALR(1) lookahead set per reduction, and reductions outside
//!    it are dropped.
//! 3. **Precedence** ([`LalrConfig::precedence`]): conflicts where every
//!    action has a precedence keep only the winning action.
//! 4. **Sanity check**: structural invariants of the final table.
//!
//! Conflicts that survive are kept on purpose; the parse engine forks a
//! stack for each remaining action.
//!
//! ```rust
//! use lalrkit::backend::lr::{Automaton, LalrConfig};
//! use lalrkit::grammar::GrammarBuilder;
//!
//! let mut builder = GrammarBuilder::new();
//! builder.add_production("list", &["list", "ITEM"])?;
//! builder.add_production("list", &[])?;
//! let grammar = builder.build()?;
//!
//! let automaton = Automaton::build(&grammar, &LalrConfig::default())?;
//! assert!(automaton.conflicts().is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod conflict;
mod explain;
mod item;
mod lookahead;
mod persist;
mod sanity;
mod state;
mod table;

pub use config::{LalrConfig, TableCache};
pub use item::Item;
pub use lookahead::{ReductionLookaheads, TaggedGrammar, TaggedSymbol, reduction_lookaheads};
pub use persist::SCHEMA_VERSION;
pub use state::{Action, ActionList, State, StateId};
pub use table::Automaton;
