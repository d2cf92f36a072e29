use std::path::PathBuf;

/// Configuration for LALR(1) table construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LalrConfig {
    /// Remove reductions whose lookahead excludes the terminal (LALR(1) instead of LR(0))
    pub lookahead: bool,

    /// Resolve remaining conflicts with operator precedence
    pub precedence: bool,
}

impl Default for LalrConfig {
    fn default() -> Self {
        Self {
            lookahead: true,
            precedence: true,
        }
    }
}

impl LalrConfig {
    /// Plain LR(0) tables with every conflict left in place
    #[must_use]
    pub const fn lr0() -> Self {
        Self {
            lookahead: false,
            precedence: false,
        }
    }
}

/// Where to cache built tables between runs.
///
/// The artifact at `path` is reused when it is at least as new as `source`
/// (or always, when no source is given) and it was built from the same
/// grammar; otherwise tables are rebuilt and the artifact is overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCache {
    pub path: PathBuf,
    pub source: Option<PathBuf>,
}

impl TableCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: None,
        }
    }

    /// Treat the artifact as stale whenever `source` is newer
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}
