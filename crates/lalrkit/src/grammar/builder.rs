use std::collections::BTreeSet;
use std::sync::Arc;

use ahash::RandomState;
use hashbrown::HashMap;

use super::analysis::{Cfg, FirstSet};
use super::ebnf::HelperKey;
use super::precedence::{Associativity, PrecedenceTable};
use super::production::{Production, ProductionId, ProductionOrigin};
use super::symbol::{GrammarSymbol, Symbol, SymbolNames, SymbolTable};
use crate::error::{ConstructionError, GrammarError};

/// A grammar under construction.
///
/// Productions are numbered densely from 0 in the order they are added. The
/// start symbol defaults to the left-hand side of the first declared
/// production. FIRST and FOLLOW can be queried at any time and reflect every
/// production added so far.
///
/// # Example
///
/// ```rust
/// use lalrkit::grammar::GrammarBuilder;
///
/// let mut builder = GrammarBuilder::new();
/// builder.add_production("e", &["e", "PLUS", "t"])?;
/// builder.add_production("e", &["t"])?;
/// builder.add_production("t", &["NUM"])?;
///
/// let num = builder.symbols().lookup("NUM").unwrap();
/// let e = builder.symbols().lookup("e").unwrap();
/// assert!(builder.first_of(e).contains(&num));
///
/// let grammar = builder.build()?;
/// assert_eq!(grammar.len(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct GrammarBuilder {
    pub(super) cfg: Cfg<Symbol>,
    pub(super) symbols: SymbolTable,
    pub(super) origins: Vec<ProductionOrigin>,
    pub(super) helpers: HashMap<HelperKey, Symbol, RandomState>,
    precedence: PrecedenceTable,
    declared_start: Option<Symbol>,
    first_declared: Option<Symbol>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        let symbols = SymbolTable::new();
        Self {
            cfg: Cfg::new(symbols.eos()),
            symbols,
            origins: Vec::new(),
            helpers: HashMap::default(),
            precedence: PrecedenceTable::default(),
            declared_start: None,
            first_declared: None,
        }
    }

    #[must_use]
    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Intern a symbol name, classifying it by spelling
    pub fn intern(&mut self, name: &str) -> Result<Symbol, GrammarError> {
        self.symbols.intern(name)
    }

    pub fn intern_nonterminal(&mut self, name: &str) -> Result<Symbol, GrammarError> {
        self.symbols.intern_nonterminal(name)
    }

    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        self.symbols.name(symbol)
    }

    /// Add a production `lhs → rhs` where every rhs element is a plain symbol name
    pub fn add_production(&mut self, lhs: &str, rhs: &[&str]) -> Result<ProductionId, GrammarError> {
        let lhs = self.symbols.intern_nonterminal(lhs)?;
        let rhs = rhs
            .iter()
            .map(|name| self.symbols.intern(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.push_production(lhs, rhs, ProductionOrigin::Declared))
    }

    /// Add a production from already interned symbols
    pub fn add_production_symbols(
        &mut self,
        lhs: Symbol,
        rhs: impl IntoIterator<Item = Symbol>,
    ) -> Result<ProductionId, GrammarError> {
        if !lhs.is_nonterminal() || lhs == self.symbols.start() {
            return Err(GrammarError::ExpectedNonterminal {
                name: self.symbols.name(lhs).into(),
            });
        }
        Ok(self.push_production(lhs, rhs, ProductionOrigin::Declared))
    }

    pub(crate) fn push_production(
        &mut self,
        lhs: Symbol,
        rhs: impl IntoIterator<Item = Symbol>,
        origin: ProductionOrigin,
    ) -> ProductionId {
        let id = self.cfg.add_production(lhs, rhs);
        self.origins.push(origin);
        if origin == ProductionOrigin::Declared && self.first_declared.is_none() {
            self.first_declared = Some(lhs);
            self.sync_start();
        }
        id
    }

    fn sync_start(&mut self) {
        if let Some(start) = self.start() {
            self.cfg.set_start(start);
        }
    }

    /// Declare the start symbol explicitly
    pub fn set_start(&mut self, name: &str) -> Result<Symbol, GrammarError> {
        let symbol = match self.symbols.intern(name) {
            Ok(symbol) if symbol.is_nonterminal() => symbol,
            _ => return Err(GrammarError::InvalidStart { name: name.into() }),
        };
        self.declared_start = Some(symbol);
        self.sync_start();
        Ok(symbol)
    }

    /// The declared start symbol, or the lhs of the first declared production
    #[must_use]
    pub fn start(&self) -> Option<Symbol> {
        self.declared_start.or(self.first_declared)
    }

    /// Declare one precedence level for a group of terminals
    pub fn declare_precedence(&mut self, assoc: Associativity, terminals: &[&str]) -> Result<usize, GrammarError> {
        let symbols = terminals
            .iter()
            .map(|name| self.symbols.intern_terminal(name))
            .collect::<Result<Vec<_>, _>>()?;
        self.precedence
            .declare(assoc, &symbols)
            .map_err(|taken| GrammarError::PrecedenceRedeclared {
                name: self.symbols.name(taken).into(),
            })
    }

    /// Give a production the precedence of `terminal` instead of its right-most terminal
    pub fn set_production_precedence(&mut self, id: ProductionId, terminal: &str) -> Result<(), GrammarError> {
        if id >= self.cfg.len() {
            return Err(GrammarError::UnknownProduction { id });
        }
        let terminal = self.symbols.intern_terminal(terminal)?;
        self.precedence.set_override(id, terminal);
        Ok(())
    }

    #[must_use]
    pub const fn cfg(&self) -> &Cfg<Symbol> {
        &self.cfg
    }

    #[must_use]
    pub fn productions(&self) -> &[Production<Symbol>] {
        self.cfg.productions()
    }

    #[must_use]
    pub fn origin(&self, id: ProductionId) -> Option<ProductionOrigin> {
        self.origins.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cfg.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cfg.is_empty()
    }

    #[must_use]
    pub fn first_set(&self, sequence: &[Symbol]) -> FirstSet<Symbol> {
        self.cfg.first_set(sequence)
    }

    #[must_use]
    pub fn first_of(&self, symbol: Symbol) -> FirstSet<Symbol> {
        self.cfg.first_of(symbol)
    }

    #[must_use]
    pub fn follow_set(&self, symbol: Symbol) -> BTreeSet<Symbol> {
        self.cfg.follow_set(symbol)
    }

    #[must_use]
    pub fn nullable(&self, symbol: Symbol) -> bool {
        self.cfg.nullable(symbol)
    }

    /// Finish the grammar: validate it and append the `$start → S` production.
    pub fn build(mut self) -> Result<Grammar, ConstructionError> {
        if self.cfg.is_empty() {
            return Err(ConstructionError::EmptyGrammar);
        }
        let Some(start) = self.start() else {
            return Err(ConstructionError::EmptyGrammar);
        };
        if !self.cfg.defines(start) {
            return Err(GrammarError::InvalidStart {
                name: self.symbols.name(start).into(),
            }
            .into());
        }
        for production in self.cfg.productions() {
            if let Some(undefined) = production
                .rhs
                .iter()
                .find(|s| s.is_nonterminal() && !self.cfg.defines(**s))
            {
                return Err(ConstructionError::UndefinedNonterminal {
                    name: self.symbols.name(*undefined).into(),
                });
            }
        }

        let uses_error = self
            .cfg
            .productions()
            .iter()
            .any(|p| p.rhs.contains(&self.symbols.error()));
        let start_symbol = self.symbols.start();
        let start_production = self.push_production(start_symbol, [start], ProductionOrigin::Start);
        self.cfg.set_start(start_symbol);
        self.precedence.resolve_productions(self.cfg.productions());

        Ok(Grammar {
            cfg: self.cfg,
            symbols: Arc::new(self.symbols.freeze()),
            origins: self.origins,
            precedence: self.precedence,
            start,
            start_production,
            uses_error,
        })
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished grammar, ready for automaton construction.
#[derive(Debug, Clone)]
pub struct Grammar {
    cfg: Cfg<Symbol>,
    symbols: Arc<SymbolNames>,
    origins: Vec<ProductionOrigin>,
    precedence: PrecedenceTable,
    start: Symbol,
    start_production: ProductionId,
    uses_error: bool,
}

impl Grammar {
    #[must_use]
    pub const fn cfg(&self) -> &Cfg<Symbol> {
        &self.cfg
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolNames {
        &self.symbols
    }

    pub(crate) fn shared_symbols(&self) -> Arc<SymbolNames> {
        Arc::clone(&self.symbols)
    }

    #[must_use]
    pub fn name(&self, symbol: Symbol) -> &str {
        self.symbols.name(symbol)
    }

    #[must_use]
    pub fn productions(&self) -> &[Production<Symbol>] {
        self.cfg.productions()
    }

    #[must_use]
    pub fn production(&self, id: ProductionId) -> Option<&Production<Symbol>> {
        self.cfg.production(id)
    }

    pub fn productions_for(&self, lhs: Symbol) -> impl Iterator<Item = &Production<Symbol>> + '_ {
        self.cfg.productions_for(lhs)
    }

    #[must_use]
    pub fn origin(&self, id: ProductionId) -> Option<ProductionOrigin> {
        self.origins.get(id).copied()
    }

    /// The user start symbol `S`
    #[must_use]
    pub const fn start(&self) -> Symbol {
        self.start
    }

    /// The synthesized `$start → S` production
    #[must_use]
    pub const fn start_production(&self) -> ProductionId {
        self.start_production
    }

    /// Whether any production mentions the `ERROR` terminal
    #[must_use]
    pub const fn uses_error(&self) -> bool {
        self.uses_error
    }

    #[must_use]
    pub const fn precedence(&self) -> &PrecedenceTable {
        &self.precedence
    }

    /// Terminals the automaton dispatches on: every terminal used in a
    /// production plus `EOS`, sorted
    #[must_use]
    pub fn terminals(&self) -> Vec<Symbol> {
        let mut terminals = self.cfg.terminals();
        terminals.insert(self.symbols.eos());
        terminals.into_iter().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cfg.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cfg.is_empty()
    }

    #[must_use]
    pub fn first_set(&self, sequence: &[Symbol]) -> FirstSet<Symbol> {
        self.cfg.first_set(sequence)
    }

    #[must_use]
    pub fn follow_set(&self, symbol: Symbol) -> BTreeSet<Symbol> {
        self.cfg.follow_set(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_defaults_to_first_declared() {
        let mut builder = GrammarBuilder::new();
        builder.add_production("stmt", &["expr", "SEMI"]).unwrap();
        builder.add_production("expr", &["NUM"]).unwrap();
        let grammar = builder.build().unwrap();
        assert_eq!(grammar.name(grammar.start()), "stmt");
        let start = grammar.production(grammar.start_production()).unwrap();
        assert_eq!(start.lhs, grammar.symbols().start());
        assert_eq!(start.rhs.as_slice(), &[grammar.start()]);
    }

    #[test]
    fn test_dense_ids() {
        let mut builder = GrammarBuilder::new();
        assert_eq!(builder.add_production("a", &["X"]).unwrap(), 0);
        assert_eq!(builder.add_production("a", &[]).unwrap(), 1);
        assert_eq!(builder.add_production("b", &["a"]).unwrap(), 2);
    }

    #[test]
    fn test_empty_grammar() {
        assert!(matches!(
            GrammarBuilder::new().build(),
            Err(ConstructionError::EmptyGrammar)
        ));
    }

    #[test]
    fn test_undefined_nonterminal() {
        let mut builder = GrammarBuilder::new();
        builder.add_production("a", &["b", "X"]).unwrap();
        match builder.build() {
            Err(ConstructionError::UndefinedNonterminal { name }) => assert_eq!(name, "b"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_start() {
        let mut builder = GrammarBuilder::new();
        assert!(matches!(
            builder.set_start("NUM"),
            Err(GrammarError::InvalidStart { .. })
        ));
        builder.set_start("missing").unwrap();
        builder.add_production("a", &["X"]).unwrap();
        assert!(matches!(
            builder.build(),
            Err(ConstructionError::Grammar(GrammarError::InvalidStart { .. }))
        ));
    }

    #[test]
    fn test_lhs_must_be_nonterminal() {
        let mut builder = GrammarBuilder::new();
        assert!(matches!(
            builder.add_production("NUM", &["X"]),
            Err(GrammarError::ExpectedNonterminal { .. })
        ));
    }

    #[test]
    fn test_precedence_redeclared() {
        let mut builder = GrammarBuilder::new();
        assert_eq!(builder.declare_precedence(Associativity::Left, &["PLUS"]).unwrap(), 1);
        assert_eq!(builder.declare_precedence(Associativity::Left, &["TIMES"]).unwrap(), 2);
        assert!(matches!(
            builder.declare_precedence(Associativity::Right, &["PLUS"]),
            Err(GrammarError::PrecedenceRedeclared { .. })
        ));
    }

    #[test]
    fn test_production_precedence_defaults_to_last_terminal() {
        let mut builder = GrammarBuilder::new();
        builder.declare_precedence(Associativity::Left, &["PLUS"]).unwrap();
        builder.declare_precedence(Associativity::Right, &["NEG"]).unwrap();
        let add = builder.add_production("e", &["e", "PLUS", "e"]).unwrap();
        let neg = builder.add_production("e", &["MINUS", "e"]).unwrap();
        builder.set_production_precedence(neg, "NEG").unwrap();
        let num = builder.add_production("e", &["NUM"]).unwrap();
        let grammar = builder.build().unwrap();
        assert_eq!(grammar.precedence().production(add).map(|p| p.level), Some(1));
        assert_eq!(
            grammar.precedence().production(neg).map(|p| p.assoc),
            Some(Associativity::Right)
        );
        assert_eq!(grammar.precedence().production(num), None);
    }
}
