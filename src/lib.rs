//! # safra-rs: Safra's determinization of Büchi automata in Rust
//!
//! **`safra-rs`** turns a nondeterministic Büchi automaton into an equivalent deterministic
//! Rabin automaton using Safra's tree construction.
//!
//! ## What is a Safra tree?
//!
//! A deterministic automaton cannot simply track the *set* of reachable Büchi states: that loses
//! the information of whether some run visits a final state infinitely often. Safra's trees refine
//! the subset construction with an ordered tree of named, possibly marked, subsets. Every tree is
//! one state of the deterministic automaton; the [`transform`] module rewrites a tree under a
//! symbol, and the [`explore`] module discovers every reachable tree breadth-first.
//!
//! ## Key Features
//!
//! - **Two Transformers**: a fused [`SinglePass`][crate::single_pass::SinglePass] and a
//!   rule-by-rule [`MultiPass`][crate::multi_pass::MultiPass] that always agree, and can be
//!   cross-checked on every step.
//! - **Flat Trees**: [`SafraTree`][crate::tree::SafraTree] is a pre-order arena with structural
//!   equality and hashing, so equal trees are stored once (hash consing).
//! - **1-Based Names**: node names, symbols and state ids are 1-based, as in the input format.
//!
//! ## Basic Usage
//!
//! ```rust
//! use safra_rs::automaton::{Automaton, Transition};
//! use safra_rs::config::Config;
//! use safra_rs::explore::determinize;
//!
//! // Two states swapping under the only symbol; both are final.
//! let automaton = Automaton::new(
//!     2,
//!     [0].into_iter().collect(),
//!     [0, 1].into_iter().collect(),
//!     1,
//!     [Transition::new(0, 1, 1), Transition::new(1, 0, 1)],
//! );
//!
//! let det = determinize(&automaton, &Config::default());
//! assert_eq!(det.state_count(), 2);
//!
//! let next = det.successor(det.initial(), 1);
//! assert_eq!(det.successor(next, 1), det.initial());
//! ```
//!
//! ## Core Components
//!
//! - **[`automaton`]**: Büchi automata and their grouped transition relation.
//! - **[`tree`]**: Safra trees and nodes.
//! - **[`transform`]**: the transition function on trees.
//! - **[`explore`]**: the breadth-first driver and the resulting [`Determinization`][crate::explore::Determinization].
//! - **[`acceptance`]**: Rabin pair membership.
//! - **[`io`]** and **[`dot`]**: reading automata and rendering the result with Graphviz.

pub mod acceptance;
pub mod automaton;
pub mod bitset;
pub mod config;
pub mod dot;
pub mod explore;
pub mod io;
pub mod multi_pass;
pub mod single_pass;
pub mod table;
pub mod transform;
pub mod tree;
pub mod utils;
