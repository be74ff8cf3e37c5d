//! Fused single-traversal Safra transition.
//!
//! Unmark, update, create, horizontal merge and prune are decided per node on
//! the way down; vertical merge is decided on the way back up. The "not yet
//! seen" state set drives both merges: a node keeps only unseen states, and
//! after its children are built the drop in the set's size equals the size of
//! the union of the children's labels (they are disjoint subsets of the
//! node's label). If that drop equals the node's own label size, the children
//! cover the node and are collapsed into it.
//!
//! The output is written into a pre-order [`Arena`], so collapsing a subtree
//! is a truncation of the arena.

use log::{debug, trace};

use crate::automaton::{Automaton, Successors};
use crate::bitset::BitSet;
use crate::transform::SafraTransition;
use crate::tree::{allocate_name, name_bit, Arena, Name, NodeId, NodeRef, SafraTree};

/// Single-pass transformer. The default engine.
#[derive(Debug, Copy, Clone, Default)]
pub struct SinglePass;

struct Step<'a> {
    successors: &'a Successors,
    finals: &'a BitSet,
    universe: usize,
    /// Names as if no deletion had happened yet; only grows during a step.
    reserved: BitSet,
    /// Names of the nodes that survive.
    used: BitSet,
    /// States not yet claimed by a node to the left.
    unseen: BitSet,
    arena: Arena,
}

impl Step<'_> {
    /// Create rule: allocate a name for a new child if `label` meets the finals.
    fn create(&mut self, parent: Name, label: &BitSet) -> Option<(Name, BitSet)> {
        let fresh = label.intersection(self.finals);
        if fresh.is_empty() {
            return None;
        }
        let name = allocate_name(&mut self.reserved, self.universe);
        self.used.insert(name_bit(name));
        trace!("create {} under {}: {}", name, parent, fresh);
        Some((name, fresh))
    }

    fn visit(&mut self, node: NodeRef<'_>) -> Option<NodeId> {
        let mut label = self.successors.post(node.label());
        let fresh = self.create(node.name(), &label);

        label.intersect_with(&self.unseen);
        if label.is_empty() {
            trace!("prune {}", node.name());
            self.used.remove(name_bit(node.name()));
            if let Some((name, _)) = fresh {
                self.used.remove(name_bit(name));
            }
            for child in node.children() {
                self.discard(child);
            }
            return None;
        }

        let id = self.arena.reserve();
        let before = self.unseen.len();
        let mut children = Vec::new();
        for child in node.children() {
            children.extend(self.visit(child));
        }
        if let Some((name, fresh_label)) = fresh {
            children.extend(self.visit_fresh(name, fresh_label));
        }
        let after = self.unseen.len();
        self.unseen.difference_with(&label);

        if before - after == label.len() {
            trace!("stabilize {}: {}", node.name(), label);
            self.arena.truncate_below(id, &mut self.used);
            self.arena.fill(id, node.name(), label, true, Vec::new());
        } else {
            self.arena.fill(id, node.name(), label, false, children);
        }
        Some(id)
    }

    /// A child created in this step: already updated and marked, never has children.
    fn visit_fresh(&mut self, name: Name, mut label: BitSet) -> Option<NodeId> {
        label.intersect_with(&self.unseen);
        if label.is_empty() {
            trace!("prune fresh {}", name);
            self.used.remove(name_bit(name));
            return None;
        }
        self.unseen.difference_with(&label);
        let id = self.arena.reserve();
        self.arena.fill(id, name, label, true, Vec::new());
        Some(id)
    }

    /// Walk a subtree below a pruned node.
    ///
    /// Everything here is pruned too, but creations still consume names so
    /// that later names match the pass-by-pass order.
    fn discard(&mut self, node: NodeRef<'_>) {
        let label = self.successors.post(node.label());
        if label.intersects(self.finals) {
            let name = allocate_name(&mut self.reserved, self.universe);
            trace!("create {} under pruned {}", name, node.name());
        }
        self.used.remove(name_bit(node.name()));
        for child in node.children() {
            self.discard(child);
        }
    }
}

impl SafraTransition for SinglePass {
    fn transition(&self, automaton: &Automaton, tree: &SafraTree, symbol: usize) -> SafraTree {
        debug!("single_pass(tree = {}, symbol = {})", tree, symbol);

        let Some(root) = tree.root() else {
            return SafraTree::empty();
        };

        let mut step = Step {
            successors: automaton.under(symbol),
            finals: automaton.finals(),
            universe: automaton.name_universe(),
            reserved: tree.used_names().clone(),
            used: tree.used_names().clone(),
            unseen: BitSet::full(automaton.state_count()),
            arena: Arena::new(),
        };
        step.visit(root);

        let result = step.arena.finish(step.used);
        debug!("single_pass => {}", result);
        result
    }
}
