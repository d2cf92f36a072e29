use crate::backend::lr::{LalrConfig, TableCache};

/// How reduction actions receive their children's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgStyle {
    /// One element per (selected) right-hand side symbol
    #[default]
    Splat,
    /// A single element: the list of all (selected) values
    Array,
}

/// Which accepted stacks a parse returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptMode {
    /// Stop at the first stack that accepts
    #[default]
    First,
    /// Run every stack to completion and return all accepted values
    All,
}

/// Configuration for the parse engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Use error productions to recover from unexpected tokens
    pub error_recovery: bool,

    /// Upper bound on simultaneously live stacks; extra branches are dropped
    pub max_stacks: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_recovery: true,
            max_stacks: 1024,
        }
    }
}

/// Options for turning a builder into a parser
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeOptions {
    pub lalr: LalrConfig,
    /// Cache tables on disk between runs
    pub cache: Option<TableCache>,
}

impl FinalizeOptions {
    #[must_use]
    pub fn cached(cache: TableCache) -> Self {
        Self {
            lalr: LalrConfig::default(),
            cache: Some(cache),
        }
    }
}
