use std::fmt;

use colored::Colorize;
use itertools::Itertools;

use super::{AutomatonSymbol, Dfa, DfaState};

const STATE_COLUMN: &str = "State";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub state: DfaState,
    pub is_start: bool,
    pub is_accepting: bool,
    /// One cell per alphabet symbol, empty for a dead transition.
    pub cells: Vec<String>,
}

/// Plain-data view of a DFA: one row per DFA state, one column per symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    pub symbols: Vec<AutomatonSymbol>,
    pub rows: Vec<TableRow>,
}

impl Dfa {
    /// Canonical display name of a DFA state, e.g. `A, C`.
    pub fn state_label(state: &DfaState) -> String {
        // BTreeSet iterates in sorted order already
        state.iter().join(", ")
    }

    pub fn table(&self) -> TransitionTable {
        TransitionTable::new(self)
    }
}

impl TransitionTable {
    pub fn new(dfa: &Dfa) -> Self {
        let rows = dfa
            .states()
            .map(|state| TableRow {
                state: state.clone(),
                is_start: state == dfa.start_state(),
                is_accepting: dfa.is_accepting(state),
                cells: dfa
                    .alphabet()
                    .iter()
                    .map(|symbol| {
                        dfa.transition(state, symbol)
                            .map(Dfa::state_label)
                            .unwrap_or_default()
                    })
                    .collect(),
            })
            .collect();

        Self {
            symbols: dfa.alphabet().to_vec(),
            rows,
        }
    }

    pub fn header(&self) -> Vec<&str> {
        std::iter::once(STATE_COLUMN)
            .chain(self.symbols.iter().map(String::as_str))
            .collect()
    }

    /// Same layout as [`fmt::Display`], with the start row marked by `→`, accept
    /// rows by `*` and colors on top.
    pub fn render_colored(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("  {}\n", self.header_line().bold()));
        out.push_str(&format!("  {}\n", self.rule()));

        for row in self.rows.iter() {
            let marker = match (row.is_start, row.is_accepting) {
                (true, true) => "→*",
                (true, false) => "→ ",
                (false, true) => " *",
                (false, false) => "  ",
            };
            let label = Dfa::state_label(&row.state);
            let label = match row.is_accepting {
                true => label.green().bold(),
                false => label.normal(),
            };

            out.push_str(&format!("{}{}\t|\t", marker, label));
            for cell in row.cells.iter() {
                out.push_str(&format!("{}\t|\t", cell));
            }
            out.push('\n');
        }

        out
    }

    fn header_line(&self) -> String {
        self.header()
            .iter()
            .map(|column| format!("{}\t|\t", column))
            .collect()
    }

    fn rule(&self) -> String {
        "--".repeat(6 + 8 * self.symbols.len())
    }
}

impl fmt::Display for TransitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header_line())?;
        writeln!(f, "{}", self.rule())?;

        for row in self.rows.iter() {
            write!(f, "{}\t|\t", Dfa::state_label(&row.state))?;
            for cell in row.cells.iter() {
                write!(f, "{}\t|\t", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
