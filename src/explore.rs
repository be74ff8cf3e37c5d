//! Breadth-first construction of the deterministic Rabin automaton.
//!
//! Starting from the initial tree, every discovered tree is expanded under
//! every symbol. Trees are hash-consed in a [`Table`], so structurally equal
//! trees reached along different paths share one state id, and the table's
//! "is new" answer doubles as the frontier membership test.

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::time::Instant;

use log::{debug, info};

use crate::acceptance::{in_left, in_right, RabinPair};
use crate::automaton::Automaton;
use crate::config::Config;
use crate::table::Table;
use crate::transform::SafraTransition;
use crate::tree::SafraTree;

/// State of the determinized automaton. Ids start at 1, in discovery order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StateId(u32);

impl StateId {
    pub const fn new(id: u32) -> Self {
        assert!(id != 0, "State ids are 1-based");
        Self(id)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The full transition table of a determinized automaton.
pub struct Determinization {
    states: Table<SafraTree>,
    /// `successors[id - 1][symbol - 1]`.
    successors: Vec<Vec<StateId>>,
    initial: StateId,
    alphabet_size: usize,
    /// State count of the source Büchi automaton.
    buchi_states: usize,
}

/// Determinize `automaton` by exploring every tree reachable from the initial one.
///
/// # Panics
///
/// Panics if more trees are reachable than the state table holds, or, with
/// [`Config::cross_check`], if the two transformers ever disagree.
pub fn determinize(automaton: &Automaton, config: &Config) -> Determinization {
    info!(
        "Determinizing {} states over {} symbols with the {} engine",
        automaton.state_count(),
        automaton.alphabet_size(),
        config.engine
    );
    let start = Instant::now();

    let mut states = Table::new(config.storage_bits);
    let (initial, _) = states.put(SafraTree::initial(automaton));
    let mut pending = VecDeque::from([initial]);
    let mut successors: Vec<Vec<StateId>> = Vec::new();

    while let Some(index) = pending.pop_front() {
        assert_eq!(index, successors.len() + 1, "States are expanded in id order");

        let tree = &states[index];
        debug!("expand {}: {}", index, tree);
        let next: Vec<SafraTree> = automaton
            .symbols()
            .map(|symbol| step(automaton, config, tree, symbol))
            .collect();

        let mut row = Vec::with_capacity(next.len());
        for tree in next {
            let (i, is_new) = states.put(tree);
            if is_new {
                debug!("discovered {}: {}", i, states[i]);
                pending.push_back(i);
            }
            row.push(StateId(i as u32));
        }
        successors.push(row);
    }

    info!(
        "Found {} states in {:.3}s",
        states.len(),
        start.elapsed().as_secs_f64()
    );

    Determinization {
        states,
        successors,
        initial: StateId(initial as u32),
        alphabet_size: automaton.alphabet_size(),
        buchi_states: automaton.state_count(),
    }
}

fn step(automaton: &Automaton, config: &Config, tree: &SafraTree, symbol: usize) -> SafraTree {
    let next = config.engine.transition(automaton, tree, symbol);
    if config.cross_check {
        let other = config.engine.other().transition(automaton, tree, symbol);
        assert_eq!(
            next, other,
            "Engines {} and {} disagree on {} under symbol {}",
            config.engine,
            config.engine.other(),
            tree,
            symbol
        );
        assert_eq!(
            next.used_names(),
            other.used_names(),
            "Engines {} and {} disagree on the used names of {} under symbol {}",
            config.engine,
            config.engine.other(),
            tree,
            symbol
        );
    }
    next
}

impl Determinization {
    /// Number of states.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// All state ids in discovery order.
    pub fn states(&self) -> impl Iterator<Item = StateId> {
        (1..=self.state_count() as u32).map(StateId)
    }

    /// The canonical tree of a state.
    pub fn tree(&self, id: StateId) -> &SafraTree {
        &self.states[id.index()]
    }

    /// The state reached from `id` under `symbol`.
    pub fn successor(&self, id: StateId, symbol: usize) -> StateId {
        assert!(
            (1..=self.alphabet_size).contains(&symbol),
            "Symbol {} is outside 1..={}",
            symbol,
            self.alphabet_size
        );
        self.successors[id.index() - 1][symbol - 1]
    }

    /// Every transition as `(from, symbol, to)`, grouped by source.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, usize, StateId)> + '_ {
        self.states().flat_map(move |from| {
            self.successors[from.index() - 1]
                .iter()
                .enumerate()
                .map(move |(i, &to)| (from, i + 1, to))
        })
    }

    /// The state holding a tree structurally equal to `tree`, if reachable.
    pub fn find(&self, tree: &SafraTree) -> Option<StateId> {
        self.states.find(tree).map(|i| StateId(i as u32))
    }

    /// Whether `id` is the dead state (the tree without a root).
    pub fn is_dead(&self, id: StateId) -> bool {
        self.tree(id).is_empty()
    }

    pub fn in_left(&self, id: StateId, q: usize) -> bool {
        in_left(self.tree(id), q)
    }

    pub fn in_right(&self, id: StateId, q: usize) -> bool {
        in_right(self.tree(id), q)
    }

    /// One Rabin pair per Büchi state, in state order.
    pub fn rabin_pairs(&self) -> Vec<RabinPair> {
        (0..self.buchi_states)
            .map(|q| RabinPair::collect(q, self.states.iter()))
            .collect()
    }
}
