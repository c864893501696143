use std::collections::BTreeSet;

use colored::Colorize;
use log::warn;

use super::{AutomatonState, AutomatonSymbol, AutomatonTransition, Error, InputError, Nfa, Result};

pub type ParsedTransition = (AutomatonState, AutomatonTransition, Vec<AutomatonState>);

const END_OF_TRANSITIONS: &str = "done";

fn split_fields(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim)
}

/// Comma separated state labels. Empty fields are skipped, so a blank line is
/// an empty list.
pub fn parse_state_list(text: &str) -> Vec<AutomatonState> {
    split_fields(text)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma separated alphabet symbols. A blank line declares no symbols, an
/// empty field anywhere else would smuggle epsilon into the alphabet.
pub fn parse_symbol_list(text: &str) -> std::result::Result<Vec<AutomatonSymbol>, InputError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    split_fields(text)
        .map(|symbol| match symbol {
            "" => Err(InputError::EpsilonInAlphabet),
            symbol => Ok(symbol.to_string()),
        })
        .collect()
}

pub fn parse_state(text: &str) -> std::result::Result<AutomatonState, InputError> {
    let label = text.trim();

    if label.is_empty() || label.contains(',') {
        return Err(InputError::InvalidStartState(label.to_string()));
    }

    Ok(label.to_string())
}

/// `state, symbol, next_state[, next_state...]` where an empty `symbol`
/// stands for an epsilon move.
pub fn parse_transition(
    text: &str,
    alphabet: &[AutomatonSymbol],
) -> std::result::Result<ParsedTransition, InputError> {
    let malformed = || InputError::MalformedTransition(text.trim().to_string());
    let mut fields = split_fields(text);

    let state = match fields.next() {
        Some(state) if !state.is_empty() => state.to_string(),
        _ => return Err(malformed()),
    };

    let on = match fields.next() {
        Some("") => AutomatonTransition::Epsilon,
        Some(symbol) if alphabet.iter().any(|known| known == symbol) => {
            AutomatonTransition::symbol(symbol)
        }
        Some(symbol) => return Err(InputError::UnknownSymbol(symbol.to_string())),
        None => return Err(malformed()),
    };

    let next_states: Vec<AutomatonState> = fields
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect();

    if next_states.is_empty() {
        return Err(malformed());
    }

    Ok((state, on, next_states))
}

pub fn is_end_of_transitions(text: &str) -> bool {
    text.trim() == END_OF_TRANSITIONS
}

/// Reads a whole NFA description: states, alphabet, start state and accept
/// states on the first four lines, then one transition per line up to an
/// optional `done`. Lines starting with `#` are ignored everywhere, blank lines
/// only among the transitions.
pub fn parse_nfa(source: &str) -> Result<Nfa> {
    let mut lines = source
        .lines()
        .enumerate()
        .map(|(index, text)| (index + 1, text))
        .filter(|(_, text)| !text.trim_start().starts_with('#'));

    let mut last_line = 0;
    let mut next_field = |name: &'static str| {
        let next = lines.next();
        if let Some((line, _)) = next {
            last_line = line;
        }
        next.ok_or(Error::Input {
            line: last_line + 1,
            source: InputError::MissingField(name),
        })
    };

    let (_, states_text) = next_field("states")?;
    let states = parse_state_list(states_text);

    let (line, alphabet_text) = next_field("alphabet")?;
    let alphabet = parse_symbol_list(alphabet_text).map_err(|source| Error::Input { line, source })?;

    let (line, start_text) = next_field("start state")?;
    let start_state = parse_state(start_text).map_err(|source| Error::Input { line, source })?;

    let (_, accept_text) = next_field("accept states")?;
    let accept_states = parse_state_list(accept_text);

    let mut nfa = Nfa::new(states, alphabet, start_state, accept_states);

    for (line, text) in lines {
        if text.trim().is_empty() {
            continue;
        }
        if is_end_of_transitions(text) {
            break;
        }

        let (state, on, next_states) =
            parse_transition(text, nfa.alphabet()).map_err(|source| Error::Input { line, source })?;
        nfa.add_transition(state, on, next_states);
    }

    warn_undeclared(&nfa);

    Ok(nfa)
}

/// Logs every start, accept or transition state missing from the declared
/// states and returns them. They are legal for the construction itself, only
/// suspicious.
pub fn warn_undeclared(nfa: &Nfa) -> BTreeSet<&AutomatonState> {
    let declared = nfa.states();
    let mut undeclared = BTreeSet::new();

    if !declared.contains(nfa.start_state()) {
        warn!("start state `{}` is not among the declared states", nfa.start_state());
        undeclared.insert(nfa.start_state());
    }

    for state in nfa.accept_states().difference(declared) {
        warn!("accept state `{}` is not among the declared states", state);
        undeclared.insert(state);
    }

    for state in nfa.referenced_states().filter(|state| !declared.contains(*state)) {
        if undeclared.insert(state) {
            warn!("transition mentions undeclared state `{}`", state);
        }
    }

    undeclared
}

// Byte range of the `index`-th comma separated field, surrounding blanks excluded
fn field_span(text: &str, index: usize) -> Option<(usize, usize)> {
    let mut begin = 0;

    for (position, field) in text.split(',').enumerate() {
        if position == index {
            let start = begin + (field.len() - field.trim_start().len());
            return Some((start, start + field.trim().len()));
        }
        begin += field.len() + 1;
    }

    None
}

impl InputError {
    /// The piece of input to blame, if the error can point at one.
    pub fn token(&self) -> Option<&str> {
        match self {
            InputError::InvalidStartState(token)
            | InputError::MalformedTransition(token)
            | InputError::UnknownSymbol(token) => Some(token),
            InputError::EpsilonInAlphabet | InputError::MissingField(_) => None,
        }
    }

    /// Where the offending token sits in `text`, the line it was parsed from.
    fn span(&self, text: &str) -> Option<(usize, usize)> {
        match self {
            // The symbol is always the second field of a transition
            InputError::UnknownSymbol(_) => field_span(text, 1),
            _ => self
                .token()
                .filter(|token| !token.is_empty())
                .and_then(|token| text.find(token).map(|pos| (pos, pos + token.len()))),
        }
    }

    /// Echoes `text` with the offending token painted red.
    pub fn highlight(&self, text: &str) -> String {
        match self.span(text).filter(|(begin, end)| begin < end) {
            Some((begin, end)) => format!("{}{}{}", &text[..begin], text[begin..end].red(), &text[end..]),
            None => text.red().to_string(),
        }
    }
}
