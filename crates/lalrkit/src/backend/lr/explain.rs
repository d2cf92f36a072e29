//! Human-readable dump of an automaton.

use std::io::{self, Write};

use super::state::Action;
use super::table::Automaton;
use crate::grammar::Associativity;

const fn assoc_name(assoc: Associativity) -> &'static str {
    match assoc {
        Associativity::Left => "left",
        Associativity::Right => "right",
        Associativity::NonAssoc => "nonassoc",
    }
}

impl Automaton {
    pub(crate) fn display_action(&self, action: &Action) -> String {
        match action {
            Action::Shift(state) => format!("shift {state}"),
            Action::GoTo(state) => format!("goto {state}"),
            Action::Reduce(production) => format!("reduce {production} ({})", self.display_production(*production)),
            Action::Accept => "accept".to_owned(),
        }
    }

    /// Write every production, the precedence declarations and every state
    /// with its items, actions and remaining conflicts.
    pub fn explain<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# Productions")?;
        for production in self.productions() {
            write!(out, "  {:>3}: {}", production.id, self.display_production(production.id))?;
            if let Some(precedence) = self.precedence().production(production.id) {
                write!(out, "  [{} {}]", precedence.level, assoc_name(precedence.assoc))?;
            }
            writeln!(out)?;
        }

        if !self.precedence().is_empty() {
            writeln!(out)?;
            writeln!(out, "# Precedence")?;
            for (terminal, precedence) in self.precedence().declared() {
                writeln!(
                    out,
                    "  {:>3} {:<8} {}",
                    precedence.level,
                    assoc_name(precedence.assoc),
                    self.name(terminal)
                )?;
            }
        }

        for state in self.states() {
            writeln!(out)?;
            writeln!(out, "# State {}", state.id())?;
            for item in state.items() {
                let Some(production) = self.production(item.production) else {
                    continue;
                };
                write!(out, "    {} ->", self.name(production.lhs))?;
                for (position, symbol) in production.rhs.iter().enumerate() {
                    if position == item.dot {
                        write!(out, " .")?;
                    }
                    write!(out, " {}", self.name(*symbol))?;
                }
                if item.dot >= production.len() {
                    write!(out, " .")?;
                }
                writeln!(out)?;
            }

            let rows = state.actions();
            if !rows.is_empty() {
                writeln!(out, "  actions:")?;
                for (symbol, actions) in &rows {
                    let rendered: Vec<_> = actions.iter().map(|a| self.display_action(a)).collect();
                    writeln!(out, "    {:<12} {}", self.name(*symbol), rendered.join(" | "))?;
                }
            }

            let conflicts = state.conflicts();
            if !conflicts.is_empty() {
                writeln!(out, "  conflicts:")?;
                for (symbol, actions) in &conflicts {
                    writeln!(out, "    {} ({} actions)", self.name(*symbol), actions.len())?;
                }
            }
        }
        Ok(())
    }

    /// [`explain`](Self::explain) into a string
    #[must_use]
    pub fn explain_to_string(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.explain(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::lr::{Automaton, LalrConfig};
    use crate::grammar::{Associativity, GrammarBuilder};

    #[test]
    fn test_explain_lists_states_and_conflicts() {
        let mut builder = GrammarBuilder::new();
        builder.add_production("e", &["e", "PLUS", "e"]).unwrap();
        builder.add_production("e", &["NUM"]).unwrap();
        let grammar = builder.build().unwrap();
        let automaton = Automaton::build(&grammar, &LalrConfig::default()).unwrap();
        let report = automaton.explain_to_string();
        assert!(report.contains("# Productions"));
        assert!(report.contains("e -> e PLUS e"));
        assert!(report.contains("# State 0"));
        assert!(report.contains("$start -> . e"));
        assert!(report.contains("conflicts:"));
    }

    #[test]
    fn test_explain_shows_precedence() {
        let mut builder = GrammarBuilder::new();
        builder.declare_precedence(Associativity::Left, &["PLUS"]).unwrap();
        builder.add_production("e", &["e", "PLUS", "e"]).unwrap();
        builder.add_production("e", &["NUM"]).unwrap();
        let grammar = builder.build().unwrap();
        let automaton = Automaton::build(&grammar, &LalrConfig::default()).unwrap();
        let report = automaton.explain_to_string();
        assert!(report.contains("# Precedence"));
        assert!(report.contains("[1 left]"));
        assert!(!report.contains("conflicts:"));
    }
}
