use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use log::{debug, trace};

use super::{
    AutomatonState, AutomatonSymbol, AutomatonTransition, Dfa, DfaState, Error, Nfa, Result,
};

impl AutomatonTransition {
    pub fn symbol(symbol: impl Into<AutomatonSymbol>) -> Self {
        Self::Symbol(symbol.into())
    }
}

impl Nfa {
    /// Creates an NFA without transitions. Repeated alphabet symbols are
    /// dropped, the first occurrence decides the column order.
    pub fn new<S, A, F>(
        states: S,
        alphabet: A,
        start_state: impl Into<AutomatonState>,
        accept_states: F,
    ) -> Self
    where
        S: IntoIterator,
        S::Item: Into<AutomatonState>,
        A: IntoIterator,
        A::Item: Into<AutomatonSymbol>,
        F: IntoIterator,
        F::Item: Into<AutomatonState>,
    {
        Self {
            states: states.into_iter().map(Into::into).collect(),
            alphabet: alphabet.into_iter().map(Into::into).unique().collect(),
            start_state: start_state.into(),
            accept_states: accept_states.into_iter().map(Into::into).collect(),
            transitions: BTreeMap::default(),
        }
    }

    /// Adds `next_states` to the destinations of `(state, on)`. Adding the same
    /// pair twice unions the destinations.
    pub fn add_transition<I>(
        &mut self,
        state: impl Into<AutomatonState>,
        on: AutomatonTransition,
        next_states: I,
    ) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<AutomatonState>,
    {
        self.transitions
            .entry(state.into())
            .or_default()
            .entry(on)
            .or_default()
            .extend(next_states.into_iter().map(Into::into));
        self
    }

    pub fn states(&self) -> &BTreeSet<AutomatonState> {
        &self.states
    }

    pub fn alphabet(&self) -> &[AutomatonSymbol] {
        &self.alphabet
    }

    pub fn start_state(&self) -> &AutomatonState {
        &self.start_state
    }

    pub fn accept_states(&self) -> &BTreeSet<AutomatonState> {
        &self.accept_states
    }

    /// Every state appearing on either end of a transition.
    pub fn referenced_states(&self) -> impl Iterator<Item = &AutomatonState> + '_ {
        self.transitions.iter().flat_map(|(state, trans)| {
            std::iter::once(state).chain(trans.values().flatten())
        })
    }

    pub fn targets(
        &self,
        state: &AutomatonState,
        on: &AutomatonTransition,
    ) -> Option<&BTreeSet<AutomatonState>> {
        self.transitions.get(state).and_then(|trans| trans.get(on))
    }

    /// All states reachable from `seed` through zero or more epsilon moves.
    pub fn epsilon_closure<'a>(
        &self,
        seed: impl IntoIterator<Item = &'a AutomatonState>,
    ) -> DfaState {
        let mut closure: DfaState = seed.into_iter().cloned().collect();
        let mut stack: Vec<AutomatonState> = closure.iter().cloned().collect();

        while let Some(state) = stack.pop() {
            let Some(epsilon_to) = self.targets(&state, &AutomatonTransition::Epsilon) else {
                continue;
            };

            for next_state in epsilon_to {
                if closure.insert(next_state.clone()) {
                    stack.push(next_state.clone());
                }
            }
        }

        closure
    }

    /// Direct destinations on `symbol`, without following epsilon moves.
    pub fn move_on<'a>(
        &self,
        states: impl IntoIterator<Item = &'a AutomatonState>,
        symbol: &str,
    ) -> BTreeSet<AutomatonState> {
        let on = AutomatonTransition::symbol(symbol);

        states
            .into_iter()
            .filter_map(|state| self.targets(state, &on))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn to_dfa(&self) -> Dfa {
        Dfa::from_nfa(self)
    }
}

impl Dfa {
    pub fn from_nfa(nfa: &Nfa) -> Self {
        // DFA states live in memory, so there can never be more than usize::MAX of them
        Self::construct(nfa, usize::MAX).expect("unbounded subset construction gave up")
    }

    /// Same as [`Dfa::from_nfa`] but gives up once more than `limit` DFA
    /// states have been discovered.
    pub fn from_nfa_bounded(nfa: &Nfa, limit: usize) -> Result<Self> {
        Self::construct(nfa, limit).ok_or(Error::StateLimit { limit })
    }

    fn construct(nfa: &Nfa, limit: usize) -> Option<Self> {
        let start_state = nfa.epsilon_closure([&nfa.start_state]);

        let mut dfa = Self {
            alphabet: nfa.alphabet.clone(),
            start_state: start_state.clone(),
            ..Self::default()
        };
        dfa.states.insert(start_state.clone());
        if dfa.states.len() > limit {
            return None;
        }

        let mut stack = vec![start_state];

        while let Some(curr_state) = stack.pop() {
            trace!("exploring {{{}}}", Self::state_label(&curr_state));

            for symbol in nfa.alphabet.iter() {
                let next_state = nfa.epsilon_closure(&nfa.move_on(&curr_state, symbol));

                // Dead end: leave the entry out instead of creating an empty state
                if next_state.is_empty() {
                    continue;
                }

                if dfa.states.insert(next_state.clone()) {
                    if dfa.states.len() > limit {
                        debug!("giving up after {} DFA states", limit);
                        return None;
                    }
                    stack.push(next_state.clone());
                }

                dfa.transitions
                    .entry(curr_state.clone())
                    .or_default()
                    .insert(symbol.clone(), next_state);
            }
        }

        dfa.accept_states = dfa
            .states
            .iter()
            .filter(|state| !state.is_disjoint(&nfa.accept_states))
            .cloned()
            .collect();

        debug!(
            "subset construction finished: {} states, {} accepting",
            dfa.states.len(),
            dfa.accept_states.len()
        );

        Some(dfa)
    }

    pub fn alphabet(&self) -> &[AutomatonSymbol] {
        &self.alphabet
    }

    /// Discovered states, the start state first.
    pub fn states(&self) -> impl Iterator<Item = &DfaState> + '_ {
        self.states.iter()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn start_state(&self) -> &DfaState {
        &self.start_state
    }

    pub fn accept_states(&self) -> &BTreeSet<DfaState> {
        &self.accept_states
    }

    pub fn is_accepting(&self, state: &DfaState) -> bool {
        self.accept_states.contains(state)
    }

    /// `None` is a dead transition.
    pub fn transition(&self, state: &DfaState, symbol: &str) -> Option<&DfaState> {
        self.transitions
            .get(state)
            .and_then(|trans| trans.get(symbol))
    }

    pub fn transitions(
        &self,
    ) -> impl Iterator<Item = (&DfaState, &AutomatonSymbol, &DfaState)> + '_ {
        self.transitions.iter().flat_map(|(from, trans)| {
            trans.iter().map(move |(symbol, to)| (from, symbol, to))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod proptest;

    fn set(states: &[&str]) -> DfaState {
        states.iter().map(|state| state.to_string()).collect()
    }

    fn scenario_nfa() -> Nfa {
        let mut nfa = Nfa::new(["A", "B", "C"], ["0", "1"], "A", ["C"]);
        nfa.add_transition("A", AutomatonTransition::symbol("0"), ["A", "B"])
            .add_transition("A", AutomatonTransition::symbol("1"), ["A"])
            .add_transition("B", AutomatonTransition::symbol("1"), ["C"]);
        nfa
    }

    #[test]
    fn epsilon_closure_unit_1() {
        let mut nfa = Nfa::new(["A", "B", "C", "D"], ["a"], "A", ["D"]);
        nfa.add_transition("A", AutomatonTransition::Epsilon, ["B"])
            .add_transition("B", AutomatonTransition::Epsilon, ["C"])
            .add_transition("C", AutomatonTransition::Epsilon, ["A"])
            .add_transition("C", AutomatonTransition::symbol("a"), ["D"]);

        assert_eq!(nfa.epsilon_closure(&set(&["A"])), set(&["A", "B", "C"]));
        assert_eq!(nfa.epsilon_closure(&set(&["D"])), set(&["D"]));
        assert_eq!(nfa.epsilon_closure(&set(&[])), set(&[]));
    }

    #[test]
    fn epsilon_closure_unit_2() {
        // Seed states without an entry in the transition table stay in the closure
        let nfa = Nfa::new(["A"], ["a"], "A", ["A"]);
        assert_eq!(nfa.epsilon_closure(&set(&["A", "Z"])), set(&["A", "Z"]));
    }

    #[test]
    fn move_on_unit_1() {
        let mut nfa = scenario_nfa();
        nfa.add_transition("B", AutomatonTransition::Epsilon, ["A"]);

        assert_eq!(nfa.move_on(&set(&["A", "B"]), "0"), set(&["A", "B"]));
        // No closure is applied to the result
        assert_eq!(nfa.move_on(&set(&["B"]), "1"), set(&["C"]));
        assert_eq!(nfa.move_on(&set(&["C"]), "0"), set(&[]));
        assert_eq!(nfa.move_on(&set(&["A"]), "x"), set(&[]));
    }

    #[test]
    fn nfa_to_dfa_unit_1() {
        let dfa = Dfa::from_nfa(&scenario_nfa());

        assert_eq!(dfa.start_state(), &set(&["A"]));
        assert_eq!(dfa.state_count(), 3);
        assert_eq!(
            dfa.transitions,
            BTreeMap::from([
                (
                    set(&["A"]),
                    BTreeMap::from([
                        ("0".to_string(), set(&["A", "B"])),
                        ("1".to_string(), set(&["A"])),
                    ]),
                ),
                (
                    set(&["A", "B"]),
                    BTreeMap::from([
                        ("0".to_string(), set(&["A", "B"])),
                        ("1".to_string(), set(&["A", "C"])),
                    ]),
                ),
                (
                    set(&["A", "C"]),
                    BTreeMap::from([
                        ("0".to_string(), set(&["A", "B"])),
                        ("1".to_string(), set(&["A"])),
                    ]),
                ),
            ])
        );
        assert_eq!(dfa.accept_states(), &BTreeSet::from([set(&["A", "C"])]));
    }

    #[test]
    fn nfa_to_dfa_unit_2() {
        let mut nfa = Nfa::new(["A", "B"], ["a"], "A", ["B"]);
        nfa.add_transition("A", AutomatonTransition::Epsilon, ["B"]);

        let dfa = nfa.to_dfa();

        assert_eq!(dfa.start_state(), &set(&["A", "B"]));
        assert!(dfa.is_accepting(&set(&["A", "B"])));
        assert_eq!(dfa.transition(&set(&["A", "B"]), "a"), None);
        assert_eq!(dfa.state_count(), 1);
    }

    #[test]
    fn nfa_to_dfa_unit_3() {
        // (a|b)*ab with epsilon moves between the pieces
        let mut nfa = Nfa::new(["0", "1", "2", "3", "4"], ["a", "b"], "0", ["4"]);
        nfa.add_transition("0", AutomatonTransition::Epsilon, ["1", "2"])
            .add_transition("1", AutomatonTransition::symbol("a"), ["0"])
            .add_transition("1", AutomatonTransition::symbol("b"), ["0"])
            .add_transition("2", AutomatonTransition::symbol("a"), ["3"])
            .add_transition("3", AutomatonTransition::symbol("b"), ["4"]);

        let dfa = nfa.to_dfa();

        let start = set(&["0", "1", "2"]);
        let after_a = set(&["0", "1", "2", "3"]);
        let after_ab = set(&["0", "1", "2", "4"]);

        assert_eq!(dfa.start_state(), &start);
        assert_eq!(dfa.transition(&start, "a"), Some(&after_a));
        assert_eq!(dfa.transition(&start, "b"), Some(&start));
        assert_eq!(dfa.transition(&after_a, "a"), Some(&after_a));
        assert_eq!(dfa.transition(&after_a, "b"), Some(&after_ab));
        assert_eq!(dfa.transition(&after_ab, "a"), Some(&after_a));
        assert_eq!(dfa.transition(&after_ab, "b"), Some(&start));
        assert_eq!(dfa.accept_states(), &BTreeSet::from([after_ab]));
    }

    #[test]
    fn nfa_to_dfa_unit_4() {
        // Unreachable accept state and a symbol nobody reads
        let mut nfa = Nfa::new(["A", "B", "C"], ["0", "1"], "A", ["C"]);
        nfa.add_transition("A", AutomatonTransition::symbol("0"), ["B"])
            .add_transition("B", AutomatonTransition::symbol("0"), ["A"]);

        let dfa = nfa.to_dfa();

        assert_eq!(dfa.state_count(), 2);
        assert!(dfa.accept_states().is_empty());
        assert!(dfa.transitions().all(|(_, symbol, _)| symbol == "0"));
    }

    #[test]
    fn nfa_to_dfa_unit_5() {
        let nfa = Nfa::new(["A"], Vec::<&str>::new(), "A", ["A"]);
        let dfa = nfa.to_dfa();

        assert_eq!(dfa.states().collect::<Vec<_>>(), vec![&set(&["A"])]);
        assert_eq!(dfa.transitions().count(), 0);
        assert!(dfa.is_accepting(&set(&["A"])));
    }

    #[test]
    fn nfa_to_dfa_unit_6() {
        // Duplicate pairs union their destinations
        let mut nfa = Nfa::new(["A", "B", "C"], ["a"], "A", ["C"]);
        nfa.add_transition("A", AutomatonTransition::symbol("a"), ["B"])
            .add_transition("A", AutomatonTransition::symbol("a"), ["C"]);

        let dfa = nfa.to_dfa();

        assert_eq!(dfa.transition(&set(&["A"]), "a"), Some(&set(&["B", "C"])));
    }

    #[test]
    fn nfa_to_dfa_bounded_unit_1() {
        let nfa = scenario_nfa();

        assert!(matches!(
            Dfa::from_nfa_bounded(&nfa, 2),
            Err(Error::StateLimit { limit: 2 })
        ));
        assert!(matches!(
            Dfa::from_nfa_bounded(&nfa, 0),
            Err(Error::StateLimit { limit: 0 })
        ));
        assert_eq!(Dfa::from_nfa_bounded(&nfa, 3).ok(), Some(Dfa::from_nfa(&nfa)));
    }

    #[test]
    fn nfa_new_unit_1() {
        let nfa = Nfa::new(["A"], ["b", "a", "b"], "A", ["A"]);
        assert_eq!(nfa.alphabet(), &["b".to_string(), "a".to_string()]);
    }
}
