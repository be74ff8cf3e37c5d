//! Nondeterministic Büchi automata.
//!
//! States are 0-based indices in `0..state_count`. Symbols are 1-based,
//! in `1..=alphabet_size`. Transitions are grouped once, up front, into a
//! [`TransitionSystem`] so that the determinization step can look up the
//! successors of a state under a symbol in constant time.

use log::debug;

use crate::bitset::BitSet;

/// The empty successor set, returned for every missing lookup.
static NO_STATES: BitSet = BitSet::empty();

/// The empty successor relation, returned for symbols outside the alphabet.
static NO_SUCCESSORS: Successors = Successors { targets: Vec::new() };

/// A single edge `from --symbol--> to` of a Büchi automaton.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub symbol: usize,
}

impl Transition {
    pub const fn new(from: usize, to: usize, symbol: usize) -> Self {
        Self { from, to, symbol }
    }
}

/// Successor relation of one symbol: source state to destination set.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Successors {
    /// Indexed by source state. Shorter than the state count when the
    /// highest sources have no edges under this symbol.
    targets: Vec<BitSet>,
}

impl Successors {
    /// Destinations of `state`. Empty when the state has no edge.
    pub fn get(&self, state: usize) -> &BitSet {
        self.targets.get(state).unwrap_or(&NO_STATES)
    }

    /// Union of the destinations of every state in `states`.
    pub fn post(&self, states: &BitSet) -> BitSet {
        let mut res = BitSet::empty();
        for s in states {
            res.union_with(self.get(s));
        }
        res
    }

    /// Number of source states with at least one edge.
    pub fn sources(&self) -> usize {
        self.targets.iter().filter(|t| !t.is_empty()).count()
    }
}

/// Edges of a Büchi automaton, grouped by symbol then by source state.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TransitionSystem {
    /// `by_symbol[symbol - 1]` is the relation of `symbol`.
    by_symbol: Vec<Successors>,
    size: usize,
}

impl TransitionSystem {
    /// Group a flat list of transitions.
    ///
    /// Duplicate edges collapse; destinations of the same source and symbol
    /// are unioned.
    pub fn new(transitions: impl IntoIterator<Item = Transition>) -> Self {
        let mut transitions: Vec<Transition> = transitions.into_iter().collect();
        transitions.sort_by_key(|t| (t.symbol, t.from));

        let mut by_symbol: Vec<Successors> = Vec::new();
        for t in transitions.iter() {
            assert_ne!(t.symbol, 0, "Symbols are 1-based");
            if by_symbol.len() < t.symbol {
                by_symbol.resize_with(t.symbol, Successors::default);
            }
            let targets = &mut by_symbol[t.symbol - 1].targets;
            if targets.len() <= t.from {
                targets.resize_with(t.from + 1, BitSet::empty);
            }
            targets[t.from].insert(t.to);
        }

        let size = by_symbol
            .iter()
            .flat_map(|s| s.targets.iter())
            .map(|t| t.len())
            .sum();

        Self { by_symbol, size }
    }

    /// The successor relation under `symbol`.
    ///
    /// Symbols without edges (including 0 and anything past the alphabet)
    /// give the empty relation.
    pub fn under(&self, symbol: usize) -> &Successors {
        symbol
            .checked_sub(1)
            .and_then(|i| self.by_symbol.get(i))
            .unwrap_or(&NO_SUCCESSORS)
    }

    /// Number of distinct edges.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Largest symbol carrying at least one edge.
    pub fn max_symbol(&self) -> usize {
        self.by_symbol.len()
    }
}

/// A nondeterministic Büchi automaton.
#[derive(Debug, Clone)]
pub struct Automaton {
    state_count: usize,
    initial: BitSet,
    finals: BitSet,
    alphabet_size: usize,
    transitions: TransitionSystem,
}

impl Automaton {
    /// Build an automaton.
    ///
    /// # Panics
    ///
    /// Panics if a transition endpoint is not below `state_count`, a
    /// transition symbol is outside `1..=alphabet_size`, or an initial or
    /// final state is out of range.
    pub fn new(
        state_count: usize,
        initial: BitSet,
        finals: BitSet,
        alphabet_size: usize,
        transitions: impl IntoIterator<Item = Transition>,
    ) -> Self {
        let transitions: Vec<Transition> = transitions.into_iter().collect();
        for t in transitions.iter() {
            assert!(
                t.from < state_count && t.to < state_count,
                "Transition {:?} leaves the state range 0..{}",
                t,
                state_count
            );
            assert!(
                (1..=alphabet_size).contains(&t.symbol),
                "Transition {:?} uses a symbol outside 1..={}",
                t,
                alphabet_size
            );
        }
        assert!(
            initial.iter().all(|s| s < state_count),
            "Initial states {} exceed the state range 0..{}",
            initial,
            state_count
        );
        assert!(
            finals.iter().all(|s| s < state_count),
            "Final states {} exceed the state range 0..{}",
            finals,
            state_count
        );

        let transitions = TransitionSystem::new(transitions);
        debug!(
            "automaton: {} states, {} symbols, {} edges, initial = {}, finals = {}",
            state_count,
            alphabet_size,
            transitions.len(),
            initial,
            finals
        );

        Self {
            state_count,
            initial,
            finals,
            alphabet_size,
            transitions,
        }
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }
    pub fn initial(&self) -> &BitSet {
        &self.initial
    }
    pub fn finals(&self) -> &BitSet {
        &self.finals
    }
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }
    pub fn transitions(&self) -> &TransitionSystem {
        &self.transitions
    }

    /// Shorthand for `self.transitions().under(symbol)`.
    pub fn under(&self, symbol: usize) -> &Successors {
        self.transitions.under(symbol)
    }

    /// Number of distinct Safra node names: twice the state count.
    pub fn name_universe(&self) -> usize {
        2 * self.state_count
    }

    /// Iterate over the alphabet, `1..=alphabet_size`.
    pub fn symbols(&self) -> impl Iterator<Item = usize> {
        1..=self.alphabet_size
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn set(xs: &[usize]) -> BitSet {
        xs.iter().copied().collect()
    }

    #[test]
    fn test_grouping() {
        let ts = TransitionSystem::new([
            Transition::new(1, 0, 2),
            Transition::new(0, 1, 1),
            Transition::new(0, 2, 1),
            Transition::new(0, 1, 1),
            Transition::new(2, 2, 1),
        ]);
        assert_eq!(ts.len(), 4);
        assert_eq!(ts.max_symbol(), 2);
        assert_eq!(ts.under(1).get(0), &set(&[1, 2]));
        assert_eq!(ts.under(1).get(2), &set(&[2]));
        assert!(ts.under(1).get(1).is_empty());
        assert_eq!(ts.under(2).get(1), &set(&[0]));
        assert_eq!(ts.under(1).sources(), 2);
    }

    #[test]
    fn test_missing_lookups_are_empty() {
        let ts = TransitionSystem::new([Transition::new(0, 1, 1)]);
        assert!(ts.under(0).get(0).is_empty());
        assert!(ts.under(7).get(0).is_empty());
        assert!(ts.under(1).get(100).is_empty());
        assert!(TransitionSystem::default().under(1).post(&set(&[0, 1])).is_empty());
    }

    #[test]
    fn test_post() {
        let ts = TransitionSystem::new([
            Transition::new(0, 1, 1),
            Transition::new(1, 2, 1),
            Transition::new(2, 0, 1),
        ]);
        assert_eq!(ts.under(1).post(&set(&[0, 2])), set(&[0, 1]));
        assert!(ts.under(1).post(&BitSet::empty()).is_empty());
    }

    #[test]
    fn test_automaton() {
        let a = Automaton::new(3, set(&[0]), set(&[2]), 2, [Transition::new(0, 2, 2)]);
        assert_eq!(a.state_count(), 3);
        assert_eq!(a.name_universe(), 6);
        assert_eq!(a.symbols().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(a.under(2).get(0), &set(&[2]));
        assert!(a.under(1).get(0).is_empty());
    }

    #[test]
    #[should_panic(expected = "leaves the state range")]
    fn test_transition_out_of_range() {
        Automaton::new(2, set(&[0]), set(&[1]), 1, [Transition::new(0, 2, 1)]);
    }

    #[test]
    #[should_panic(expected = "symbol outside")]
    fn test_symbol_out_of_range() {
        Automaton::new(2, set(&[0]), set(&[1]), 1, [Transition::new(0, 1, 2)]);
    }

    #[test]
    #[should_panic(expected = "Final states")]
    fn test_finals_out_of_range() {
        Automaton::new(2, set(&[0]), set(&[5]), 1, Vec::new());
    }
}
