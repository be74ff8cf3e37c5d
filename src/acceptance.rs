//! Rabin acceptance predicates over Safra trees.
//!
//! For a Büchi state `q`, a tree is in `R_q` when some marked node holds `q`,
//! and in `L_q` when no node holds `q` at all. The pairs are indexed by Büchi
//! state.

use std::fmt::{Display, Formatter};

use crate::bitset::BitSet;
use crate::tree::SafraTree;

/// Whether some marked node of `tree` has `q` in its label.
pub fn in_right(tree: &SafraTree, q: usize) -> bool {
    tree.nodes().any(|n| n.is_marked() && n.label().contains(q))
}

/// Whether no node of `tree` has `q` in its label.
///
/// Vacuously true for the dead tree.
pub fn in_left(tree: &SafraTree, q: usize) -> bool {
    tree.nodes().all(|n| !n.label().contains(q))
}

/// One Rabin pair over the states of a determinized automaton.
///
/// `left` and `right` hold state ids, as indices into the state table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RabinPair {
    /// The Büchi state this pair is derived from.
    pub index: usize,
    pub left: BitSet,
    pub right: BitSet,
}

impl RabinPair {
    /// Build the pair for Büchi state `q` over `(id, tree)` entries.
    pub fn collect<'a>(q: usize, trees: impl IntoIterator<Item = (usize, &'a SafraTree)>) -> Self {
        let mut left = BitSet::empty();
        let mut right = BitSet::empty();
        for (id, tree) in trees {
            if in_left(tree, q) {
                left.insert(id);
            }
            if in_right(tree, q) {
                right.insert(id);
            }
        }
        Self { index: q, left, right }
    }
}

impl Display for RabinPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}: L = {}, R = {}", self.index, self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::tree::SafraNode;

    fn set(xs: &[usize]) -> BitSet {
        xs.iter().copied().collect()
    }

    fn tree() -> SafraTree {
        // Root unmarked over {0, 1, 2}; marked child over {1}.
        SafraTree::from_root(SafraNode::new(
            1,
            set(&[0, 1, 2]),
            false,
            vec![SafraNode::leaf(2, set(&[1]), true)],
        ))
    }

    #[test]
    fn test_in_right() {
        let t = tree();
        assert!(in_right(&t, 1));
        assert!(!in_right(&t, 0));
        assert!(!in_right(&t, 3));
    }

    #[test]
    fn test_in_left() {
        let t = tree();
        assert!(!in_left(&t, 0));
        assert!(!in_left(&t, 1));
        assert!(in_left(&t, 3));
    }

    #[test]
    fn test_dead_tree() {
        let dead = SafraTree::empty();
        assert!(in_left(&dead, 0));
        assert!(!in_right(&dead, 0));
    }

    #[test]
    fn test_collect() {
        let t = tree();
        let dead = SafraTree::empty();
        let marked = SafraTree::from_root(SafraNode::leaf(1, set(&[3]), true));
        let pair = RabinPair::collect(3, [(1, &t), (2, &dead), (3, &marked)]);
        assert_eq!(pair.left, set(&[1, 2]));
        assert_eq!(pair.right, set(&[3]));
        assert_eq!(pair.to_string(), "q3: L = {1, 2}, R = {3}");
    }
}
