mod dot;
mod input;
mod subset_construction;
mod table;

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexSet;

pub use input::{
    is_end_of_transitions, parse_nfa, parse_state, parse_state_list, parse_symbol_list,
    parse_transition, warn_undeclared, ParsedTransition,
};
pub use table::{TableRow, TransitionTable};

pub type AutomatonState = String;
pub type AutomatonSymbol = String;

/// A DFA state is identified by the set of NFA states it stands for.
pub type DfaState = BTreeSet<AutomatonState>;

pub type AutomatonTransitionList = BTreeMap<AutomatonTransition, BTreeSet<AutomatonState>>;

/// Label of an NFA edge. Epsilon is kept apart from every alphabet symbol so
/// that no declared symbol can ever be mistaken for a spontaneous move.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AutomatonTransition {
    Epsilon,
    Symbol(AutomatonSymbol),
}

// Use BTree here instead of Hash to get determenistic results every time
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Nfa {
    states: BTreeSet<AutomatonState>,
    alphabet: Vec<AutomatonSymbol>,
    start_state: AutomatonState,
    accept_states: BTreeSet<AutomatonState>,
    transitions: BTreeMap<AutomatonState, AutomatonTransitionList>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dfa {
    alphabet: Vec<AutomatonSymbol>,
    // Discovery order, start state first
    states: IndexSet<DfaState>,
    start_state: DfaState,
    accept_states: BTreeSet<DfaState>,
    transitions: BTreeMap<DfaState, BTreeMap<AutomatonSymbol, DfaState>>,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Rejections raised while turning text into an [`Nfa`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("the empty symbol is reserved for epsilon and cannot be part of the alphabet")]
    EpsilonInAlphabet,

    #[error("expected exactly one start state, got `{0}`")]
    InvalidStartState(String),

    #[error("expected `state, symbol, next_state[, next_state...]`, got `{0}`")]
    MalformedTransition(String),

    #[error("symbol `{0}` is not part of the alphabet")]
    UnknownSymbol(String),

    #[error("missing {0}")]
    MissingField(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("line {line}: {source}")]
    Input {
        line: usize,
        #[source]
        source: InputError,
    },

    #[error("subset construction exceeded the limit of {limit} DFA states")]
    StateLimit { limit: usize },

    #[error("failed to render graph: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
