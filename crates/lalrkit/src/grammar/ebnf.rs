//! EBNF right-hand sides.
//!
//! A right-hand side is written as whitespace-separated symbol names. Each
//! name may carry one postfix operator:
//!
//! | form | meaning | helper |
//! |---|---|---|
//! | `X?` | optional | `h → ε \| X` |
//! | `X*` | zero or more | `h → ε \| n`, `n → X \| X n` |
//! | `X+` | one or more | `n → X \| X n` |
//!
//! A leading `.` selects the symbol: when any symbol in a clause is
//! selected, only the selected values are handed to the clause's action.
//!
//! Helper nonterminals are memoized per (operator, base, separator), so
//! `WORD+` written in two clauses expands to the same nonterminal.

use smallvec::SmallVec;

use super::builder::GrammarBuilder;
use super::production::{HelperRole, ProductionOrigin};
use super::symbol::Symbol;
use crate::error::GrammarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EbnfOp {
    Optional,
    List,
    NonemptyList,
}

impl EbnfOp {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Self::Optional),
            '*' => Some(Self::List),
            '+' => Some(Self::NonemptyList),
            _ => None,
        }
    }
}

/// One element of a right-hand side expression, before expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RhsTerm<'a> {
    pub name: &'a str,
    pub op: Option<EbnfOp>,
    pub selected: bool,
}

/// A right-hand side after helper expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedRhs {
    pub symbols: SmallVec<[Symbol; 4]>,
    /// Which positions are forwarded to the action; `None` forwards all
    pub selection: Option<Vec<bool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HelperKey {
    op: EbnfOp,
    base: Symbol,
    separator: Option<Symbol>,
}

/// Split a right-hand side expression into terms without interning anything.
pub fn parse_rhs(expr: &str) -> Result<Vec<RhsTerm<'_>>, GrammarError> {
    expr.split_whitespace()
        .map(|word| {
            let (selected, rest) = match word.strip_prefix('.') {
                Some(rest) => (true, rest),
                None => (false, word),
            };
            let (name, op) = match rest.chars().last().and_then(EbnfOp::from_char) {
                Some(op) => (&rest[..rest.len() - 1], Some(op)),
                None => (rest, None),
            };
            if name.is_empty() {
                return Err(GrammarError::malformed(expr, format!("`{word}` has no symbol name")));
            }
            if name.contains(['.', '?', '*', '+']) {
                return Err(GrammarError::malformed(
                    expr,
                    format!("`{word}` has a misplaced operator"),
                ));
            }
            Ok(RhsTerm { name, op, selected })
        })
        .collect()
}

impl GrammarBuilder {
    /// Expand an EBNF right-hand side, creating helper nonterminals as needed.
    pub fn expand_ebnf(&mut self, expr: &str) -> Result<ExpandedRhs, GrammarError> {
        let terms = parse_rhs(expr)?;
        let mut symbols = SmallVec::with_capacity(terms.len());
        let mut selection = Vec::with_capacity(terms.len());
        for term in &terms {
            let base = self.symbols.intern(term.name)?;
            let symbol = match term.op {
                None => base,
                Some(EbnfOp::Optional) => self.optional(base)?,
                Some(EbnfOp::List) => self.list(base, None)?,
                Some(EbnfOp::NonemptyList) => self.nonempty_list(base, None)?,
            };
            symbols.push(symbol);
            selection.push(term.selected);
        }
        let selection = selection.iter().any(|s| *s).then_some(selection);
        Ok(ExpandedRhs { symbols, selection })
    }

    /// The memoized `base?` helper
    pub fn optional(&mut self, base: Symbol) -> Result<Symbol, GrammarError> {
        self.helper(EbnfOp::Optional, base, None, |builder, name| {
            builder.push_helper(name, [], HelperRole::OptionalEmpty);
            builder.push_helper(name, [base], HelperRole::OptionalPresent);
            Ok(())
        })
    }

    /// The memoized `base*` helper, optionally separated
    pub fn list(&mut self, base: Symbol, separator: Option<Symbol>) -> Result<Symbol, GrammarError> {
        self.helper(EbnfOp::List, base, separator, |builder, name| {
            let nonempty = builder.nonempty_list(base, separator)?;
            builder.push_helper(name, [], HelperRole::ListEmpty);
            builder.push_helper(name, [nonempty], HelperRole::ListNonempty);
            Ok(())
        })
    }

    /// The memoized `base+` helper, optionally separated
    pub fn nonempty_list(&mut self, base: Symbol, separator: Option<Symbol>) -> Result<Symbol, GrammarError> {
        self.helper(EbnfOp::NonemptyList, base, separator, |builder, name| {
            builder.push_nonempty(name, base, separator);
            Ok(())
        })
    }

    /// Define `name` as an optional `base`
    pub fn define_optional(&mut self, name: &str, base: &str) -> Result<Symbol, GrammarError> {
        let lhs = self.fresh_definition(name)?;
        let base = self.symbols.intern(base)?;
        self.push_helper(lhs, [], HelperRole::OptionalEmpty);
        self.push_helper(lhs, [base], HelperRole::OptionalPresent);
        Ok(lhs)
    }

    /// Define `name` as zero or more `base`, optionally separated
    pub fn define_list(&mut self, name: &str, base: &str, separator: Option<&str>) -> Result<Symbol, GrammarError> {
        let lhs = self.fresh_definition(name)?;
        let (base, separator) = self.list_operands(base, separator)?;
        let nonempty = self.nonempty_list(base, separator)?;
        self.push_helper(lhs, [], HelperRole::ListEmpty);
        self.push_helper(lhs, [nonempty], HelperRole::ListNonempty);
        Ok(lhs)
    }

    /// Define `name` as one or more `base`, optionally separated
    pub fn define_nonempty_list(
        &mut self,
        name: &str,
        base: &str,
        separator: Option<&str>,
    ) -> Result<Symbol, GrammarError> {
        let lhs = self.fresh_definition(name)?;
        let (base, separator) = self.list_operands(base, separator)?;
        self.push_nonempty(lhs, base, separator);
        Ok(lhs)
    }

    fn list_operands(&mut self, base: &str, separator: Option<&str>) -> Result<(Symbol, Option<Symbol>), GrammarError> {
        let base = self.symbols.intern(base)?;
        let separator = separator.map(|s| self.symbols.intern(s)).transpose()?;
        Ok((base, separator))
    }

    fn fresh_definition(&mut self, name: &str) -> Result<Symbol, GrammarError> {
        let lhs = self.symbols.intern_nonterminal(name)?;
        if self.cfg.defines(lhs) {
            return Err(GrammarError::AlreadyDefined { name: name.into() });
        }
        Ok(lhs)
    }

    fn push_nonempty(&mut self, lhs: Symbol, base: Symbol, separator: Option<Symbol>) {
        self.push_helper(lhs, [base], HelperRole::NonemptySingle);
        match separator {
            Some(sep) => self.push_helper(lhs, [base, sep, lhs], HelperRole::NonemptyCons { separated: true }),
            None => self.push_helper(lhs, [base, lhs], HelperRole::NonemptyCons { separated: false }),
        }
    }

    fn push_helper<const N: usize>(&mut self, lhs: Symbol, rhs: [Symbol; N], role: HelperRole) {
        self.push_production(lhs, rhs, ProductionOrigin::Helper(role));
    }

    fn helper(
        &mut self,
        op: EbnfOp,
        base: Symbol,
        separator: Option<Symbol>,
        define: impl FnOnce(&mut Self, Symbol) -> Result<(), GrammarError>,
    ) -> Result<Symbol, GrammarError> {
        let key = HelperKey { op, base, separator };
        if let Some(existing) = self.helpers.get(&key) {
            return Ok(*existing);
        }
        let name = self.helper_name(key)?;
        self.helpers.insert(key, name);
        define(self, name)?;
        Ok(name)
    }

    fn helper_name(&mut self, key: HelperKey) -> Result<Symbol, GrammarError> {
        let mut stem = self.symbols.name(key.base).to_ascii_lowercase();
        if let Some(sep) = key.separator {
            stem.push('_');
            stem.push_str(&self.symbols.name(sep).to_ascii_lowercase());
        }
        stem.push_str(match key.op {
            EbnfOp::Optional => "_optional",
            EbnfOp::List => "_list",
            EbnfOp::NonemptyList => "_nonempty_list",
        });
        let mut candidate = stem.clone();
        let mut suffix = 2;
        while self.symbols.lookup(&candidate).is_some() {
            candidate = format!("{stem}_{suffix}");
            suffix += 1;
        }
        self.symbols.intern_nonterminal(&candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rhs() {
        let terms = parse_rhs(".e PLUS? args* WORD+").unwrap();
        assert_eq!(terms.len(), 4);
        assert!(terms[0].selected);
        assert_eq!(terms[0].name, "e");
        assert_eq!(terms[1].op, Some(EbnfOp::Optional));
        assert_eq!(terms[2].op, Some(EbnfOp::List));
        assert_eq!(terms[3].op, Some(EbnfOp::NonemptyList));
        assert!(parse_rhs("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rhs() {
        for expr in ["e *", ".", "e+*", "a.b"] {
            assert!(
                matches!(parse_rhs(expr), Err(GrammarError::MalformedExpression { .. })),
                "{expr} should be rejected"
            );
        }
    }

    #[test]
    fn test_helpers_are_memoized() {
        let mut builder = GrammarBuilder::new();
        let first = builder.expand_ebnf("WORD+ SEMI").unwrap();
        let second = builder.expand_ebnf("WORD+ ERROR").unwrap();
        assert_eq!(first.symbols[0], second.symbols[0]);
        assert_eq!(builder.name(first.symbols[0]), "word_nonempty_list");
        // n → WORD | WORD n
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_list_reuses_nonempty_helper() {
        let mut builder = GrammarBuilder::new();
        let plus = builder.expand_ebnf("ARG+").unwrap().symbols[0];
        let star = builder.expand_ebnf("ARG*").unwrap().symbols[0];
        assert_ne!(plus, star);
        let list: Vec<_> = builder.cfg().productions_for(star).collect();
        assert_eq!(list.len(), 2);
        assert!(list[0].rhs.is_empty());
        assert_eq!(list[1].rhs.as_slice(), &[plus]);
        assert!(builder.nullable(star));
        assert!(!builder.nullable(plus));
    }

    #[test]
    fn test_selection_mask() {
        let mut builder = GrammarBuilder::new();
        let all = builder.expand_ebnf("e PLUS e").unwrap();
        assert_eq!(all.selection, None);
        let some = builder.expand_ebnf(".e PLUS .e").unwrap();
        assert_eq!(some.selection, Some(vec![true, false, true]));
    }

    #[test]
    fn test_helper_name_collision() {
        let mut builder = GrammarBuilder::new();
        builder.intern("word_optional").unwrap();
        let word = builder.intern("WORD").unwrap();
        let helper = builder.optional(word).unwrap();
        assert_eq!(builder.name(helper), "word_optional_2");
    }

    #[test]
    fn test_named_definitions() {
        let mut builder = GrammarBuilder::new();
        let list = builder.define_list("idents", "IDENT", Some("COMMA")).unwrap();
        assert_eq!(builder.cfg().productions_for(list).count(), 2);
        assert!(matches!(
            builder.define_optional("idents", "IDENT"),
            Err(GrammarError::AlreadyDefined { .. })
        ));
    }
}
