use std::fmt;
use std::sync::Arc;

use super::Parser;
use super::config::{ArgStyle, FinalizeOptions, ParseOptions};
use super::value::SemanticValue;
use crate::backend::lr::Automaton;
use crate::error::{ConstructionError, GrammarError};
use crate::grammar::{Associativity, GrammarBuilder, HelperRole, ProductionId, ProductionOrigin, Symbol};

/// A reduction action: receives the (selected) child values, returns the new value.
pub type ActionFn<V> = Arc<dyn Fn(Vec<V>) -> V + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ReduceAction<V> {
    User(ActionFn<V>),
    Helper(HelperRole),
    /// `$start → S` and productions added without an action
    Forward,
}

/// What happens to the values popped by one production's reduction.
#[derive(Clone)]
pub(crate) struct Reducer<V> {
    action: ReduceAction<V>,
    selection: Option<Vec<bool>>,
}

impl<V> fmt::Debug for Reducer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.action {
            ReduceAction::User(_) => "user",
            ReduceAction::Helper(_) => "helper",
            ReduceAction::Forward => "forward",
        };
        f.debug_struct("Reducer")
            .field("action", &kind)
            .field("selection", &self.selection)
            .finish()
    }
}

impl<V: SemanticValue> Reducer<V> {
    pub(crate) fn apply(&self, values: Vec<V>, style: ArgStyle) -> V {
        match &self.action {
            ReduceAction::User(action) => {
                let values = match &self.selection {
                    Some(mask) => values
                        .into_iter()
                        .zip(mask)
                        .filter_map(|(value, keep)| keep.then_some(value))
                        .collect(),
                    None => values,
                };
                match style {
                    ArgStyle::Splat => action(values),
                    ArgStyle::Array => action(vec![V::from_items(values)]),
                }
            }
            ReduceAction::Helper(role) => apply_helper(*role, values),
            ReduceAction::Forward => values.into_iter().next().unwrap_or_default(),
        }
    }
}

fn apply_helper<V: SemanticValue>(role: HelperRole, values: Vec<V>) -> V {
    let mut values = values.into_iter();
    match role {
        HelperRole::OptionalEmpty => V::default(),
        HelperRole::ListEmpty => V::from_items(Vec::new()),
        HelperRole::OptionalPresent | HelperRole::ListNonempty => values.next().unwrap_or_default(),
        HelperRole::NonemptySingle => V::from_items(values.take(1).collect()),
        HelperRole::NonemptyCons { .. } => {
            let head = values.next().unwrap_or_default();
            let rest = values.last().unwrap_or_default();
            let mut items = vec![head];
            items.extend(rest.into_items());
            V::from_items(items)
        }
    }
}

/// Grammar authoring surface.
///
/// Right-hand sides use the EBNF syntax of [`crate::grammar`]: `X?`, `X*`,
/// `X+`, and `.X` to select which values the action receives. Each call to
/// [`left`](Self::left), [`right`](Self::right) or
/// [`nonassoc`](Self::nonassoc) declares a new, tighter precedence level.
///
/// ```rust
/// use lalrkit::parser::{ParserBuilder, Token, Value};
///
/// let mut builder = ParserBuilder::<Value>::new();
/// builder.left(&["PLUS"])?.left(&["TIMES"])?;
/// builder.production("e", |c| {
///     c.clause(".e PLUS .e", |v| Value::Int(v[0].as_int().unwrap_or(0) + v[1].as_int().unwrap_or(0)))?;
///     c.clause(".e TIMES .e", |v| Value::Int(v[0].as_int().unwrap_or(0) * v[1].as_int().unwrap_or(0)))?;
///     c.clause("NUM", |mut v| v.remove(0))?;
///     Ok(())
/// })?;
/// let parser = builder.finalize()?;
///
/// let num = |n: i64| Token::new("NUM").with_value(Value::Int(n));
/// let tokens = vec![num(1), Token::new("PLUS"), num(2), Token::new("TIMES"), num(3)];
/// assert_eq!(parser.parse(tokens).unwrap(), Value::Int(7));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ParserBuilder<V: SemanticValue> {
    grammar: GrammarBuilder,
    actions: Vec<Option<(ActionFn<V>, Option<Vec<bool>>)>>,
    arg_style: ArgStyle,
    options: ParseOptions,
}

impl<V: SemanticValue> ParserBuilder<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            grammar: GrammarBuilder::new(),
            actions: Vec::new(),
            arg_style: ArgStyle::default(),
            options: ParseOptions::default(),
        }
    }

    /// The grammar collected so far, for FIRST/FOLLOW inspection
    #[must_use]
    pub const fn grammar(&self) -> &GrammarBuilder {
        &self.grammar
    }

    pub fn left(&mut self, terminals: &[&str]) -> Result<&mut Self, GrammarError> {
        self.grammar.declare_precedence(Associativity::Left, terminals)?;
        Ok(self)
    }

    pub fn right(&mut self, terminals: &[&str]) -> Result<&mut Self, GrammarError> {
        self.grammar.declare_precedence(Associativity::Right, terminals)?;
        Ok(self)
    }

    pub fn nonassoc(&mut self, terminals: &[&str]) -> Result<&mut Self, GrammarError> {
        self.grammar.declare_precedence(Associativity::NonAssoc, terminals)?;
        Ok(self)
    }

    pub fn start(&mut self, nonterminal: &str) -> Result<&mut Self, GrammarError> {
        self.grammar.set_start(nonterminal)?;
        Ok(self)
    }

    pub fn arg_style(&mut self, style: ArgStyle) -> &mut Self {
        self.arg_style = style;
        self
    }

    pub fn parse_options(&mut self, options: ParseOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Add a single clause `lhs → rhs` with its action
    pub fn rule<F>(&mut self, lhs: &str, rhs: &str, action: F) -> Result<&mut Self, GrammarError>
    where
        F: Fn(Vec<V>) -> V + Send + Sync + 'static,
    {
        let lhs = self.grammar.intern_nonterminal(lhs)?;
        self.add_clause(lhs, rhs, None, Arc::new(action))?;
        Ok(self)
    }

    /// Add a single clause whose precedence is that of `terminal`
    pub fn rule_with_precedence<F>(
        &mut self,
        lhs: &str,
        rhs: &str,
        terminal: &str,
        action: F,
    ) -> Result<&mut Self, GrammarError>
    where
        F: Fn(Vec<V>) -> V + Send + Sync + 'static,
    {
        let lhs = self.grammar.intern_nonterminal(lhs)?;
        self.add_clause(lhs, rhs, Some(terminal), Arc::new(action))?;
        Ok(self)
    }

    /// Add several clauses for one nonterminal
    pub fn production<F>(&mut self, lhs: &str, clauses: F) -> Result<&mut Self, GrammarError>
    where
        F: FnOnce(&mut Clauses<'_, V>) -> Result<(), GrammarError>,
    {
        let lhs = self.grammar.intern_nonterminal(lhs)?;
        clauses(&mut Clauses { builder: self, lhs })?;
        Ok(self)
    }

    /// Define `name → ε | base`
    pub fn optional(&mut self, name: &str, base: &str) -> Result<&mut Self, GrammarError> {
        self.grammar.define_optional(name, base)?;
        Ok(self)
    }

    /// Define `name` as zero or more `base`, optionally separated
    pub fn list(&mut self, name: &str, base: &str, separator: Option<&str>) -> Result<&mut Self, GrammarError> {
        self.grammar.define_list(name, base, separator)?;
        Ok(self)
    }

    /// Define `name` as one or more `base`, optionally separated
    pub fn nonempty_list(&mut self, name: &str, base: &str, separator: Option<&str>) -> Result<&mut Self, GrammarError> {
        self.grammar.define_nonempty_list(name, base, separator)?;
        Ok(self)
    }

    fn add_clause(
        &mut self,
        lhs: Symbol,
        rhs: &str,
        precedence: Option<&str>,
        action: ActionFn<V>,
    ) -> Result<ProductionId, GrammarError> {
        let expanded = self.grammar.expand_ebnf(rhs)?;
        let id = self.grammar.add_production_symbols(lhs, expanded.symbols)?;
        if let Some(terminal) = precedence {
            self.grammar.set_production_precedence(id, terminal)?;
        }
        self.actions.resize_with(id + 1, || None);
        self.actions[id] = Some((action, expanded.selection));
        Ok(id)
    }

    pub fn finalize(self) -> Result<Parser<V>, ConstructionError> {
        self.finalize_with(&FinalizeOptions::default())
    }

    /// Build the grammar and its automaton, optionally through a table cache
    pub fn finalize_with(self, options: &FinalizeOptions) -> Result<Parser<V>, ConstructionError> {
        let Self {
            grammar,
            mut actions,
            arg_style,
            options: parse_options,
        } = self;
        let grammar = grammar.build()?;
        let automaton = match &options.cache {
            Some(cache) => Automaton::load_or_build(&grammar, &options.lalr, cache)?,
            None => Automaton::build(&grammar, &options.lalr)?,
        };

        actions.resize_with(grammar.len(), || None);
        let reducers = actions
            .into_iter()
            .enumerate()
            .map(|(id, action)| match (grammar.origin(id), action) {
                (Some(ProductionOrigin::Helper(role)), _) => Reducer {
                    action: ReduceAction::Helper(role),
                    selection: None,
                },
                (_, Some((action, selection))) => Reducer {
                    action: ReduceAction::User(action),
                    selection,
                },
                (_, None) => Reducer {
                    action: ReduceAction::Forward,
                    selection: None,
                },
            })
            .collect();

        Ok(Parser::new(Arc::new(automaton), reducers, arg_style, parse_options))
    }
}

impl<V: SemanticValue> Default for ParserBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clause collector handed to [`ParserBuilder::production`].
pub struct Clauses<'b, V: SemanticValue> {
    builder: &'b mut ParserBuilder<V>,
    lhs: Symbol,
}

impl<V: SemanticValue> Clauses<'_, V> {
    pub fn clause<F>(&mut self, rhs: &str, action: F) -> Result<&mut Self, GrammarError>
    where
        F: Fn(Vec<V>) -> V + Send + Sync + 'static,
    {
        self.builder.add_clause(self.lhs, rhs, None, Arc::new(action))?;
        Ok(self)
    }

    /// A clause that takes its precedence from `terminal`
    pub fn clause_with_precedence<F>(&mut self, rhs: &str, terminal: &str, action: F) -> Result<&mut Self, GrammarError>
    where
        F: Fn(Vec<V>) -> V + Send + Sync + 'static,
    {
        self.builder.add_clause(self.lhs, rhs, Some(terminal), Arc::new(action))?;
        Ok(self)
    }
}
