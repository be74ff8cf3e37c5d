//! Six-pass reference Safra transition.
//!
//! Each rule is its own whole-tree rewrite over owned [`SafraNode`]s. Slower
//! than [`SinglePass`][crate::single_pass::SinglePass], but each pass can be
//! read against the rule it implements, which makes it the oracle the fused
//! transformer is checked against.

use log::{debug, trace};

use crate::automaton::{Automaton, Successors};
use crate::bitset::BitSet;
use crate::transform::SafraTransition;
use crate::tree::{allocate_name, name_bit, SafraNode, SafraTree};

/// Multi-pass reference transformer.
#[derive(Debug, Copy, Clone, Default)]
pub struct MultiPass;

impl SafraTransition for MultiPass {
    fn transition(&self, automaton: &Automaton, tree: &SafraTree, symbol: usize) -> SafraTree {
        debug!("multi_pass(tree = {}, symbol = {})", tree, symbol);

        let Some(root) = tree.to_node() else {
            return SafraTree::empty();
        };

        let mut used = tree.used_names().clone();
        let root = unmark(root);
        let root = update(root, automaton.under(symbol));
        let root = create(root, automaton.finals(), &mut used, automaton.name_universe());
        let root = horizontal_merge(root, &mut BitSet::empty());
        let root = prune(root, &mut used);
        let root = root.map(|r| vertical_merge(r, &mut used));

        let result = SafraTree::new(root, used);
        debug!("multi_pass => {}", result);
        result
    }
}

fn unmark(mut node: SafraNode) -> SafraNode {
    node.mark = false;
    node.children = node.children.into_iter().map(unmark).collect();
    node
}

fn update(mut node: SafraNode, successors: &Successors) -> SafraNode {
    node.label = successors.post(&node.label);
    node.children = node
        .children
        .into_iter()
        .map(|c| update(c, successors))
        .collect();
    node
}

/// Pre-order: a node takes its name before any of its descendants do.
fn create(mut node: SafraNode, finals: &BitSet, used: &mut BitSet, universe: usize) -> SafraNode {
    let fresh = node.label.intersection(finals);
    let created = if fresh.is_empty() {
        None
    } else {
        let name = allocate_name(used, universe);
        trace!("create {} under {}: {}", name, node.name, fresh);
        Some(SafraNode::leaf(name, fresh, true))
    };

    let mut children = Vec::with_capacity(node.children.len() + 1);
    for child in node.children {
        children.push(create(child, finals, used, universe));
    }
    children.extend(created);
    node.children = children;
    node
}

/// `seen` holds the states claimed so far; a node's own label joins it after its subtree.
fn horizontal_merge(mut node: SafraNode, seen: &mut BitSet) -> SafraNode {
    let mut label = node.label.clone();
    label.difference_with(seen);

    let mut children = Vec::with_capacity(node.children.len());
    for child in node.children {
        children.push(horizontal_merge(child, seen));
    }

    seen.union_with(&node.label);
    node.label = label;
    node.children = children;
    node
}

fn release(node: &SafraNode, used: &mut BitSet) {
    used.remove(name_bit(node.name));
    for child in node.children.iter() {
        release(child, used);
    }
}

fn prune(mut node: SafraNode, used: &mut BitSet) -> Option<SafraNode> {
    if node.label.is_empty() {
        trace!("prune {}", node.name);
        release(&node, used);
        return None;
    }

    let mut children = Vec::with_capacity(node.children.len());
    for child in node.children {
        children.extend(prune(child, used));
    }
    node.children = children;
    Some(node)
}

fn vertical_merge(mut node: SafraNode, used: &mut BitSet) -> SafraNode {
    if node.descendant_states() == node.label {
        trace!("stabilize {}: {}", node.name, node.label);
        for child in node.children.drain(..) {
            release(&child, used);
        }
        node.mark = true;
        return node;
    }

    let mut children = Vec::with_capacity(node.children.len());
    for child in node.children {
        children.push(vertical_merge(child, used));
    }
    node.children = children;
    node
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::automaton::Transition;

    fn set(xs: &[usize]) -> BitSet {
        xs.iter().copied().collect()
    }

    #[test]
    fn test_unmark() {
        let node = SafraNode::new(1, set(&[0]), true, vec![SafraNode::leaf(2, set(&[0]), true)]);
        let node = unmark(node);
        assert!(!node.mark);
        assert!(!node.children[0].mark);
    }

    #[test]
    fn test_create_is_preorder() {
        // Root and both children meet the finals: root takes 4 first, then 5 and 6.
        let node = SafraNode::new(
            1,
            set(&[0, 1, 2]),
            false,
            vec![SafraNode::leaf(2, set(&[0]), false), SafraNode::leaf(3, set(&[1]), false)],
        );
        let mut used = set(&[0, 1, 2]);
        let node = create(node, &set(&[0, 1]), &mut used, 6);
        let names: Vec<_> = node.children.iter().map(|c| c.name).collect();
        assert_eq!(names, vec![2, 3, 4]);
        assert_eq!(node.children[2].label, set(&[0, 1]));
        assert_eq!(node.children[0].children[0].name, 5);
        assert_eq!(node.children[1].children[0].name, 6);
        assert_eq!(used, set(&[0, 1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_horizontal_merge() {
        let node = SafraNode::new(
            1,
            set(&[0, 1, 2]),
            false,
            vec![
                SafraNode::leaf(2, set(&[0, 1]), false),
                SafraNode::leaf(3, set(&[1, 2]), false),
                SafraNode::leaf(4, set(&[0]), true),
            ],
        );
        let node = horizontal_merge(node, &mut BitSet::empty());
        assert_eq!(node.label, set(&[0, 1, 2]));
        assert_eq!(node.children[0].label, set(&[0, 1]));
        assert_eq!(node.children[1].label, set(&[2]));
        assert!(node.children[2].label.is_empty());
    }

    #[test]
    fn test_prune_frees_subtree_names() {
        let node = SafraNode::new(
            1,
            set(&[0]),
            false,
            vec![SafraNode::new(2, BitSet::empty(), false, vec![SafraNode::leaf(3, BitSet::empty(), true)])],
        );
        let mut used = set(&[0, 1, 2]);
        let node = prune(node, &mut used).unwrap();
        assert!(node.children.is_empty());
        assert_eq!(used, set(&[0]));
    }

    #[test]
    fn test_vertical_merge() {
        let node = SafraNode::new(
            1,
            set(&[0, 1]),
            false,
            vec![
                SafraNode::leaf(2, set(&[0]), false),
                SafraNode::new(3, set(&[1]), false, vec![SafraNode::leaf(4, set(&[1]), true)]),
            ],
        );
        let mut used = set(&[0, 1, 2, 3]);
        let node = vertical_merge(node, &mut used);
        assert!(node.mark);
        assert!(node.children.is_empty());
        assert_eq!(used, set(&[0]));
    }

    #[test]
    fn test_two_state_cycle() {
        // 0 <-> 1, both final, 0 initial.
        let automaton = Automaton::new(
            2,
            set(&[0]),
            set(&[0, 1]),
            1,
            [Transition::new(0, 1, 1), Transition::new(1, 0, 1)],
        );
        let t0 = SafraTree::initial(&automaton);
        let t1 = MultiPass.transition(&automaton, &t0, 1);
        assert_eq!(t1, SafraTree::from_root(SafraNode::leaf(1, set(&[1]), true)));
        assert_eq!(t1.used_names(), &set(&[0]));
        let t2 = MultiPass.transition(&automaton, &t1, 1);
        assert_eq!(t2, t0);
    }

    #[test]
    fn test_dead_tree_is_absorbing() {
        let automaton = Automaton::new(1, set(&[0]), set(&[0]), 1, [Transition::new(0, 0, 1)]);
        let dead = SafraTree::empty();
        assert_eq!(MultiPass.transition(&automaton, &dead, 1), dead);
    }
}
