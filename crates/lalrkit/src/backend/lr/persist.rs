//! Table persistence.
//!
//! Automata are saved as versioned JSON. Symbols are stored by name so an
//! artifact stays valid across runs even though interner keys do not.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::SystemTime;

use ahash::RandomState;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::config::{LalrConfig, TableCache};
use super::item::Item;
use super::sanity;
use super::state::{Action, State, StateId};
use super::table::Automaton;
use crate::error::{ConstructionError, PersistError};
use crate::grammar::{Grammar, Precedence, PrecedenceTable, Production, ProductionId, Symbol};

/// Bumped whenever the artifact layout changes.
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct TableArtifact {
    version: u32,
    lookahead: bool,
    precedence: bool,
    symbols: Vec<String>,
    productions: Vec<ProductionRecord>,
    /// Declared terminal precedences, ordered by level
    terminal_precedence: Vec<(usize, Precedence)>,
    /// Resolved precedence of every production that has one
    production_precedence: Vec<(ProductionId, Precedence)>,
    states: Vec<StateRecord>,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ProductionRecord {
    lhs: usize,
    rhs: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    items: Vec<Item>,
    transitions: Vec<(usize, StateId)>,
    actions: Vec<(usize, Vec<Action>)>,
}

/// Symbol ↔ artifact index mapping used while saving.
#[derive(Default)]
struct SymbolIndex {
    names: Vec<String>,
    index: HashMap<Symbol, usize, RandomState>,
}

impl SymbolIndex {
    fn of(&mut self, automaton: &Automaton, symbol: Symbol) -> usize {
        if let Some(&index) = self.index.get(&symbol) {
            return index;
        }
        let index = self.names.len();
        self.names.push(automaton.name(symbol).to_owned());
        self.index.insert(symbol, index);
        index
    }
}

fn production_precedence(table: &PrecedenceTable, productions: &[Production<Symbol>]) -> Vec<(ProductionId, Precedence)> {
    productions
        .iter()
        .filter_map(|p| table.production(p.id).map(|precedence| (p.id, precedence)))
        .collect()
}

impl Automaton {
    fn to_artifact(&self) -> TableArtifact {
        let mut symbols = SymbolIndex::default();
        let productions = self
            .productions()
            .iter()
            .map(|p| ProductionRecord {
                lhs: symbols.of(self, p.lhs),
                rhs: p.rhs.iter().map(|s| symbols.of(self, *s)).collect(),
            })
            .collect();
        let terminal_precedence = self
            .precedence()
            .declared()
            .into_iter()
            .map(|(terminal, precedence)| (symbols.of(self, terminal), precedence))
            .collect();
        let states = self
            .states()
            .iter()
            .map(|state| {
                let rows = state.actions();
                let mut transitions: Vec<_> = state.transitions().collect();
                transitions.sort_unstable();
                StateRecord {
                    items: state.items().to_vec(),
                    transitions: transitions
                        .into_iter()
                        .map(|(symbol, target)| (symbols.of(self, symbol), target))
                        .collect(),
                    actions: rows
                        .into_iter()
                        .map(|(symbol, actions)| (symbols.of(self, symbol), actions.to_vec()))
                        .collect(),
                }
            })
            .collect();
        TableArtifact {
            version: SCHEMA_VERSION,
            lookahead: self.config().lookahead,
            precedence: self.config().precedence,
            symbols: symbols.names,
            productions,
            terminal_precedence,
            production_precedence: production_precedence(self.precedence(), self.productions()),
            states,
        }
    }

    fn from_artifact(artifact: TableArtifact, grammar: &Grammar) -> Result<Self, PersistError> {
        if artifact.version != SCHEMA_VERSION {
            return Err(PersistError::Version {
                found: artifact.version,
                expected: SCHEMA_VERSION,
            });
        }
        let symbols = artifact
            .symbols
            .iter()
            .map(|name| {
                grammar
                    .symbols()
                    .lookup(name)
                    .ok_or_else(|| PersistError::mismatch(format!("unknown symbol `{name}`")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let symbol = |index: usize| {
            symbols
                .get(index)
                .copied()
                .ok_or_else(|| PersistError::mismatch(format!("symbol index {index} out of range")))
        };

        if artifact.productions.len() != grammar.len() {
            return Err(PersistError::mismatch(format!(
                "{} productions saved, grammar has {}",
                artifact.productions.len(),
                grammar.len()
            )));
        }
        for (record, production) in artifact.productions.iter().zip(grammar.productions()) {
            let rhs = record.rhs.iter().map(|i| symbol(*i)).collect::<Result<Vec<_>, _>>()?;
            if symbol(record.lhs)? != production.lhs || rhs.as_slice() != production.rhs.as_slice() {
                return Err(PersistError::mismatch(format!("production {} differs", production.id)));
            }
        }

        // Conflict resolution baked into the tables depends on these
        let mut declared = artifact
            .terminal_precedence
            .iter()
            .map(|(index, precedence)| Ok((symbol(*index)?, *precedence)))
            .collect::<Result<Vec<_>, PersistError>>()?;
        declared.sort_by_key(|(s, p)| (p.level, *s));
        if declared != grammar.precedence().declared()
            || artifact.production_precedence != production_precedence(grammar.precedence(), grammar.productions())
        {
            return Err(PersistError::mismatch("precedence declarations differ"));
        }

        let mut states = Vec::with_capacity(artifact.states.len());
        for (id, record) in artifact.states.into_iter().enumerate() {
            let mut state = State::new(id, record.items);
            for (index, target) in record.transitions {
                state.add_transition(symbol(index)?, target);
            }
            for (index, actions) in record.actions {
                state.set_actions(symbol(index)?, actions.into_iter().collect());
            }
            states.push(state);
        }
        let config = LalrConfig {
            lookahead: artifact.lookahead,
            precedence: artifact.precedence,
        };
        Ok(Self::from_parts(grammar, states, config))
    }

    /// Serialize the tables as JSON
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        serde_json::to_writer(writer, &self.to_artifact())?;
        Ok(())
    }

    /// Deserialize tables written by [`write_to`](Self::write_to) for the same grammar
    pub fn read_from<R: Read>(reader: R, grammar: &Grammar) -> Result<Self, PersistError> {
        let artifact: TableArtifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact, grammar)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| PersistError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(|e| PersistError::io(path, e))
    }

    pub fn load(path: impl AsRef<Path>, grammar: &Grammar) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PersistError::io(path, e))?;
        Self::read_from(BufReader::new(file), grammar)
    }

    /// Reuse cached tables when they are fresh and match the grammar,
    /// otherwise build them and overwrite the cache.
    pub fn load_or_build(grammar: &Grammar, config: &LalrConfig, cache: &TableCache) -> Result<Self, ConstructionError> {
        if is_fresh(cache)
            && let Ok(automaton) = Self::load(&cache.path, grammar)
            && automaton.config() == config
            && sanity::check(&automaton).is_ok()
        {
            return Ok(automaton);
        }
        let automaton = Self::build(grammar, config)?;
        automaton.save(&cache.path)?;
        Ok(automaton)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn is_fresh(cache: &TableCache) -> bool {
    let Some(artifact) = modified(&cache.path) else {
        return false;
    };
    match &cache.source {
        None => true,
        Some(source) => modified(source).is_some_and(|source| source <= artifact),
    }
}
