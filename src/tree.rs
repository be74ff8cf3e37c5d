//! Safra trees: the states of the determinized automaton.
//!
//! A tree is stored as a flat arena of slots in DFS pre-order: the root is
//! slot 0, and every node is followed by its whole subtree. Children are
//! referenced by [`NodeId`] (their slot index), never by pointer. Because
//! the layout is a pure function of the tree's shape, two trees are
//! structurally equal exactly when their slot vectors are equal, and the
//! hash is a bottom-up fold over the slots in reverse order: no recursion
//! and no per-node guard state.
//!
//! [`SafraNode`] is the owned recursive form, convenient for building trees
//! by hand and for whole-tree rewriting passes.

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use crate::automaton::Automaton;
use crate::bitset::BitSet;
use crate::utils::{mix_all, MyHash};

/// Node name. Names are 1-based; bit `name - 1` of a name set stands for `name`.
pub type Name = u32;

/// Bit index of `name` in a name set.
#[inline]
pub(crate) fn name_bit(name: Name) -> usize {
    assert_ne!(name, 0, "Names are 1-based");
    name as usize - 1
}

/// Take the smallest name not yet in `names`.
///
/// # Panics
///
/// Panics if all `universe` names are taken.
pub(crate) fn allocate_name(names: &mut BitSet, universe: usize) -> Name {
    let bit = names.first_clear();
    assert!(
        bit < universe,
        "Name universe of size {} is exhausted: {}",
        universe,
        names
    );
    names.insert(bit);
    (bit + 1) as Name
}

fn node_hash(name: Name, label: &BitSet, mark: bool, children: impl IntoIterator<Item = u64>) -> u64 {
    let head = MyHash::hash(&(name as u64, mark as u64, MyHash::hash(label)));
    mix_all(head, children)
}

/// Owned Safra node.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SafraNode {
    pub name: Name,
    pub label: BitSet,
    pub mark: bool,
    /// Order matters: left siblings win in the horizontal merge.
    pub children: Vec<SafraNode>,
}

impl SafraNode {
    pub fn new(name: Name, label: BitSet, mark: bool, children: Vec<SafraNode>) -> Self {
        Self {
            name,
            label,
            mark,
            children,
        }
    }

    pub fn leaf(name: Name, label: BitSet, mark: bool) -> Self {
        Self::new(name, label, mark, Vec::new())
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(|c| c.size()).sum::<usize>()
    }

    /// Add the names of this subtree to `names`.
    pub fn collect_names(&self, names: &mut BitSet) {
        names.insert(name_bit(self.name));
        for child in self.children.iter() {
            child.collect_names(names);
        }
    }

    /// Union of the labels of all proper descendants.
    pub fn descendant_states(&self) -> BitSet {
        let mut states = BitSet::empty();
        for child in self.children.iter() {
            states.union_with(&child.label);
            states.union_with(&child.descendant_states());
        }
        states
    }
}

impl MyHash for SafraNode {
    fn hash(&self) -> u64 {
        node_hash(
            self.name,
            &self.label,
            self.mark,
            self.children.iter().map(MyHash::hash),
        )
    }
}

impl Display for SafraNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{},{},{},{{", self.name, self.label, self.mark)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, "}}}}")
    }
}

/// Index of a node within its tree.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct Slot {
    name: Name,
    label: BitSet,
    mark: bool,
    children: Vec<NodeId>,
}

impl Slot {
    /// Placeholder for a node whose subtree is still being built.
    const fn vacant() -> Self {
        Self {
            name: 0,
            label: BitSet::empty(),
            mark: false,
            children: Vec::new(),
        }
    }
}

/// Append-only arena that builds a tree in pre-order.
///
/// A node's slot is reserved before its children are built, so every slot
/// index is larger than its parent's. Dropping a node's descendants is a
/// truncation back to the node's own slot, which frees the slots for reuse.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve the next slot for a node whose children come next.
    pub(crate) fn reserve(&mut self) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot::vacant());
        id
    }

    /// Fill a reserved slot.
    pub(crate) fn fill(&mut self, id: NodeId, name: Name, label: BitSet, mark: bool, children: Vec<NodeId>) {
        debug_assert!(children.iter().all(|&c| c > id));
        self.slots[id.index()] = Slot {
            name,
            label,
            mark,
            children,
        };
    }

    /// Drop every slot after `id` (the subtree below it), removing their names from `names`.
    pub(crate) fn truncate_below(&mut self, id: NodeId, names: &mut BitSet) {
        for slot in self.slots.drain(id.index() + 1..) {
            names.remove(name_bit(slot.name));
        }
    }

    /// Copy an owned subtree into the arena.
    pub(crate) fn push_node(&mut self, node: SafraNode) -> NodeId {
        let id = self.reserve();
        let children = node.children.into_iter().map(|c| self.push_node(c)).collect();
        self.fill(id, node.name, node.label, node.mark, children);
        id
    }

    pub(crate) fn finish(self, used_names: BitSet) -> SafraTree {
        let tree = SafraTree {
            slots: self.slots,
            used_names,
        };
        debug_assert!(tree.is_preorder(), "Tree is not laid out in pre-order: {:?}", tree);
        tree
    }
}

/// A Safra tree: an optional root plus the set of names in use.
///
/// Equality and hashing only look at the nodes, never at `used_names`.
/// The tree without a root is the dead state of the determinized automaton.
#[derive(Debug, Clone, Default)]
pub struct SafraTree {
    /// Pre-order arena; empty iff there is no root.
    slots: Vec<Slot>,
    used_names: BitSet,
}

impl SafraTree {
    /// The tree without a root.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(root: Option<SafraNode>, used_names: BitSet) -> Self {
        let mut arena = Arena::new();
        if let Some(root) = root {
            arena.push_node(root);
        }
        arena.finish(used_names)
    }

    /// Build a tree whose used names are exactly the names it contains.
    pub fn from_root(root: SafraNode) -> Self {
        let mut used_names = BitSet::empty();
        root.collect_names(&mut used_names);
        Self::new(Some(root), used_names)
    }

    /// The initial state for `automaton`.
    ///
    /// - no initial state is final: one unmarked node labelled with the initial states;
    /// - every initial state is final: the same node, marked;
    /// - otherwise: that node marked, with one unmarked child holding the final initial states.
    ///
    /// An automaton without initial states starts in the dead state.
    pub fn initial(automaton: &Automaton) -> Self {
        let initial = automaton.initial();
        if initial.is_empty() {
            return Self::empty();
        }

        let overlap = initial.intersection(automaton.finals());
        let root = if overlap.is_empty() {
            SafraNode::leaf(1, initial.clone(), false)
        } else if &overlap == initial {
            SafraNode::leaf(1, initial.clone(), true)
        } else {
            SafraNode::new(1, initial.clone(), true, vec![SafraNode::leaf(2, overlap, false)])
        };
        Self::from_root(root)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn used_names(&self) -> &BitSet {
        &self.used_names
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        if self.is_empty() {
            None
        } else {
            Some(self.node(NodeId::ROOT))
        }
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.index() < self.len(), "Node {:?} is not in the tree", id);
        NodeRef { tree: self, id }
    }

    /// All nodes in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        (0..self.len()).map(move |i| self.node(NodeId(i as u32)))
    }

    /// Names of the nodes actually present, as a name set.
    pub fn names(&self) -> BitSet {
        self.slots.iter().map(|s| name_bit(s.name)).collect()
    }

    /// The owned recursive form of the root.
    pub fn to_node(&self) -> Option<SafraNode> {
        self.root().map(|r| r.to_node())
    }

    fn is_preorder(&self) -> bool {
        let mut expected = 0;
        let mut stack = Vec::new();
        if !self.is_empty() {
            stack.push(NodeId::ROOT);
        }
        while let Some(id) = stack.pop() {
            if id.index() != expected || self.slots[id.index()].name == 0 {
                return false;
            }
            expected += 1;
            stack.extend(self.slots[id.index()].children.iter().rev().copied());
        }
        expected == self.len()
    }

    /// Check the structural invariants that hold after every transition.
    ///
    /// - every label is non-empty;
    /// - a child's label is a subset of its parent's;
    /// - sibling labels are pairwise disjoint;
    /// - a node's label strictly contains the union of its children's labels;
    /// - names are distinct and coincide with the used names.
    pub fn validate(&self) -> Result<(), String> {
        let mut names = BitSet::empty();
        for node in self.nodes() {
            if node.label().is_empty() {
                return Err(format!("node {} has an empty label", node.name()));
            }
            if !names.insert(name_bit(node.name())) {
                return Err(format!("name {} is used twice", node.name()));
            }
            let mut below = BitSet::empty();
            for child in node.children() {
                if !child.label().is_subset(node.label()) {
                    return Err(format!("child {} escapes parent {}", child.name(), node.name()));
                }
                if child.label().intersects(&below) {
                    return Err(format!("child {} overlaps a left sibling", child.name()));
                }
                below.union_with(child.label());
            }
            if node.has_children() && &below == node.label() {
                return Err(format!("node {} is covered by its children", node.name()));
            }
        }
        if names != self.used_names {
            return Err(format!("names {} differ from used names {}", names, self.used_names));
        }
        Ok(())
    }
}

impl PartialEq for SafraTree {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots
    }
}

impl Eq for SafraTree {}

impl MyHash for SafraTree {
    fn hash(&self) -> u64 {
        // Children always sit at larger indices, so a reverse sweep sees them first.
        let mut hashes = vec![0u64; self.len()];
        for (i, slot) in self.slots.iter().enumerate().rev() {
            let children = slot.children.iter().map(|c| hashes[c.index()]);
            let h = node_hash(slot.name, &slot.label, slot.mark, children);
            hashes[i] = h;
        }
        hashes.first().copied().unwrap_or(0)
    }
}

impl Hash for SafraTree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(MyHash::hash(self));
    }
}

impl Display for SafraTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.root() {
            Some(root) => write!(f, "{}", root),
            None => write!(f, "{{}}"),
        }
    }
}

/// Borrowed view of one node of a [`SafraTree`].
#[derive(Debug, Copy, Clone)]
pub struct NodeRef<'a> {
    tree: &'a SafraTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn slot(&self) -> &'a Slot {
        &self.tree.slots[self.id.index()]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
    pub fn name(&self) -> Name {
        self.slot().name
    }
    pub fn label(&self) -> &'a BitSet {
        &self.slot().label
    }
    pub fn is_marked(&self) -> bool {
        self.slot().mark
    }
    pub fn has_children(&self) -> bool {
        !self.slot().children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.slot().children.iter().map(move |&id| NodeRef { tree, id })
    }

    /// Pre-order iterator over the subtree rooted here, this node included.
    pub fn subtree(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let mut stack = vec![*self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
            Some(node)
        })
    }

    pub fn to_node(&self) -> SafraNode {
        SafraNode::new(
            self.name(),
            self.label().clone(),
            self.is_marked(),
            self.children().map(|c| c.to_node()).collect(),
        )
    }
}

impl Display for NodeRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{},{},{},{{", self.name(), self.label(), self.is_marked())?;
        for (i, child) in self.children().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, "}}}}")
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::automaton::Transition;

    fn set(xs: &[usize]) -> BitSet {
        xs.iter().copied().collect()
    }

    fn sample() -> SafraNode {
        SafraNode::new(
            1,
            set(&[0, 1, 2, 3]),
            false,
            vec![
                SafraNode::new(3, set(&[1, 2]), true, vec![SafraNode::leaf(2, set(&[2]), false)]),
                SafraNode::leaf(4, set(&[3]), true),
            ],
        )
    }

    #[test]
    fn test_flatten_preorder() {
        let tree = SafraTree::from_root(sample());
        let names: Vec<_> = tree.nodes().map(|n| n.name()).collect();
        assert_eq!(names, vec![1, 3, 2, 4]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.used_names(), &set(&[0, 1, 2, 3]));
        assert_eq!(tree.to_node(), Some(sample()));
        let root = tree.root().unwrap();
        let subtree: Vec<_> = root.subtree().map(|n| n.name()).collect();
        assert_eq!(subtree, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_equality_ignores_used_names() {
        let a = SafraTree::new(Some(sample()), set(&[0, 1, 2, 3]));
        let b = SafraTree::new(Some(sample()), set(&[0, 1, 2, 3, 7]));
        assert_eq!(a, b);
        assert_eq!(MyHash::hash(&a), MyHash::hash(&b));
    }

    #[test]
    fn test_sibling_order_matters() {
        let mut swapped = sample();
        swapped.children.reverse();
        let a = SafraTree::from_root(sample());
        let b = SafraTree::from_root(swapped);
        assert_ne!(a, b);
        assert_ne!(MyHash::hash(&a), MyHash::hash(&b));
    }

    #[test]
    fn test_mark_matters() {
        let mut flipped = sample();
        flipped.children[1].mark = false;
        assert_ne!(SafraTree::from_root(sample()), SafraTree::from_root(flipped));
    }

    #[test]
    fn test_tree_hash_matches_node_hash() {
        let tree = SafraTree::from_root(sample());
        assert_eq!(MyHash::hash(&tree), MyHash::hash(&sample()));
    }

    #[test]
    fn test_empty_tree() {
        let tree = SafraTree::empty();
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
        assert_eq!(tree.to_string(), "{}");
        assert_eq!(tree, SafraTree::new(None, set(&[4])));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_display() {
        let tree = SafraTree::from_root(SafraNode::new(
            1,
            set(&[0, 1]),
            true,
            vec![SafraNode::leaf(2, set(&[1]), false)],
        ));
        assert_eq!(tree.to_string(), "{1,{0, 1},true,{{2,{1},false,{}}}}");
        assert_eq!(tree.to_node().unwrap().to_string(), tree.to_string());
    }

    #[test]
    fn test_validate() {
        assert!(SafraTree::from_root(sample()).validate().is_ok());

        let covered = SafraNode::new(1, set(&[0]), false, vec![SafraNode::leaf(2, set(&[0]), false)]);
        assert!(SafraTree::from_root(covered).validate().is_err());

        let overlapping = SafraNode::new(
            1,
            set(&[0, 1, 2]),
            false,
            vec![SafraNode::leaf(2, set(&[0]), false), SafraNode::leaf(3, set(&[0, 1]), false)],
        );
        assert!(SafraTree::from_root(overlapping).validate().is_err());

        let stale_names = SafraTree::new(Some(sample()), set(&[0, 1, 2, 3, 4]));
        assert!(stale_names.validate().is_err());
    }

    #[test]
    fn test_allocate_name() {
        let mut names = set(&[0, 2]);
        assert_eq!(allocate_name(&mut names, 4), 2);
        assert_eq!(allocate_name(&mut names, 4), 4);
        assert_eq!(names, set(&[0, 1, 2, 3]));
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn test_allocate_name_exhausted() {
        let mut names = set(&[0, 1]);
        allocate_name(&mut names, 2);
    }

    #[test]
    fn test_arena_truncate_below() {
        let mut arena = Arena::new();
        let mut names = set(&[0, 1, 2]);
        let root = arena.reserve();
        let child = arena.push_node(SafraNode::new(2, set(&[1]), false, vec![SafraNode::leaf(3, set(&[1]), true)]));
        assert_eq!(child, NodeId(1));
        arena.truncate_below(root, &mut names);
        arena.fill(root, 1, set(&[1]), true, Vec::new());
        let tree = arena.finish(names);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.used_names(), &set(&[0]));
    }

    fn automaton(initial: &[usize], finals: &[usize]) -> Automaton {
        Automaton::new(3, set(initial), set(finals), 1, [Transition::new(0, 1, 1)])
    }

    #[test]
    fn test_initial_disjoint() {
        let tree = SafraTree::initial(&automaton(&[0, 1], &[2]));
        let root = tree.root().unwrap();
        assert_eq!(root.name(), 1);
        assert_eq!(root.label(), &set(&[0, 1]));
        assert!(!root.is_marked());
        assert!(!root.has_children());
        assert_eq!(tree.used_names(), &set(&[0]));
    }

    #[test]
    fn test_initial_subset_of_finals() {
        let tree = SafraTree::initial(&automaton(&[0], &[0, 2]));
        let root = tree.root().unwrap();
        assert!(root.is_marked());
        assert!(!root.has_children());
        assert_eq!(root.label(), &set(&[0]));
    }

    #[test]
    fn test_initial_partial_overlap() {
        let tree = SafraTree::initial(&automaton(&[0, 1], &[1, 2]));
        let root = tree.root().unwrap();
        assert!(root.is_marked());
        assert_eq!(root.label(), &set(&[0, 1]));
        let children: Vec<_> = root.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), 2);
        assert_eq!(children[0].label(), &set(&[1]));
        assert!(!children[0].is_marked());
        assert_eq!(tree.used_names(), &set(&[0, 1]));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_initial_without_initial_states() {
        assert!(SafraTree::initial(&automaton(&[], &[0])).is_empty());
    }
}
