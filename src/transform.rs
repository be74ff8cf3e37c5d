//! The Safra transition function.
//!
//! One step of the determinized automaton rewrites a tree under a symbol by
//! six rules, applied in DFS pre-order with a node's new child visited after
//! its existing children:
//!
//! 1. **unmark** every node;
//! 2. **update** each label to its successor set under the symbol;
//! 3. **create** a marked rightmost child labelled `label ∩ finals` under every
//!    node whose label meets the final states, named with the smallest name
//!    not used by the input tree or by an earlier creation in this step;
//! 4. **merge horizontally**: a node loses every state already claimed by a
//!    node to its left (or by one of its left ancestors' earlier descendants);
//! 5. **prune** nodes left empty, together with their subtrees;
//! 6. **merge vertically**: a node whose children jointly cover its label
//!    drops all of them and becomes marked.
//!
//! Names of deleted nodes go back to the pool for the next step.
//! [`MultiPass`] applies the rules as six separate passes; [`SinglePass`]
//! fuses them into one traversal. Both produce identical trees.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::automaton::Automaton;
pub use crate::multi_pass::MultiPass;
pub use crate::single_pass::SinglePass;
use crate::tree::SafraTree;

/// A Safra transition function.
pub trait SafraTransition {
    /// The successor of `tree` under `symbol`.
    ///
    /// Pure: the input tree is left untouched and the result shares nothing
    /// with it. The dead (rootless) tree maps to itself.
    fn transition(&self, automaton: &Automaton, tree: &SafraTree, symbol: usize) -> SafraTree;
}

/// Choice of transformer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Engine {
    #[default]
    SinglePass,
    MultiPass,
}

impl Engine {
    /// The other engine, used as an oracle when cross-checking.
    pub fn other(self) -> Engine {
        match self {
            Engine::SinglePass => Engine::MultiPass,
            Engine::MultiPass => Engine::SinglePass,
        }
    }
}

impl SafraTransition for Engine {
    fn transition(&self, automaton: &Automaton, tree: &SafraTree, symbol: usize) -> SafraTree {
        match self {
            Engine::SinglePass => SinglePass.transition(automaton, tree, symbol),
            Engine::MultiPass => MultiPass.transition(automaton, tree, symbol),
        }
    }
}

impl Display for Engine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::SinglePass => write!(f, "single"),
            Engine::MultiPass => write!(f, "multi"),
        }
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" | "single-pass" => Ok(Engine::SinglePass),
            "multi" | "multi-pass" => Ok(Engine::MultiPass),
            _ => Err(format!("unknown engine '{}', expected 'single' or 'multi'", s)),
        }
    }
}
