//! # Parser Backends
//!
//! Table construction for the parse engine. The LALR(1) automaton in
//! [`lr`] is the only backend; its tables may keep conflicts, which the
//! engine in [`crate::parser`] resolves at parse time by forking stacks.

pub mod lr;
