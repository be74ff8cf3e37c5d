//! Determinized automaton to DOT (Graphviz) conversion.
//!
//! # DOT Format
//!
//! The generated DOT output follows these conventions:
//! - **States** are rendered as circles labelled with their id, or with their
//!   Safra tree when [`DotConfig::show_trees`] is set
//! - **The initial state** gets its own shape and an entry arrow from an
//!   invisible point
//! - **The dead state** (the tree without a root) is rendered as a square
//! - **Edges** are labelled with their symbols; parallel edges between the
//!   same two states are merged into one edge listing every symbol
//!
//! # Examples
//!
//! ```
//! use safra_rs::automaton::{Automaton, Transition};
//! use safra_rs::config::Config;
//! use safra_rs::explore::determinize;
//!
//! let automaton = Automaton::new(
//!     1,
//!     [0].into_iter().collect(),
//!     [0].into_iter().collect(),
//!     1,
//!     [Transition::new(0, 0, 1)],
//! );
//! let det = determinize(&automaton, &Config::default());
//! let dot = det.to_dot().unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! ```

use std::collections::BTreeMap;

use crate::explore::{Determinization, StateId};

/// Configuration options for DOT output generation.
///
/// ```
/// use safra_rs::dot::DotConfig;
///
/// let config = DotConfig {
///     show_trees: true,
///     ..DotConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for states (default: "circle")
    pub state_shape: &'static str,
    /// Shape for the initial state (default: "doublecircle")
    pub initial_shape: &'static str,
    /// Shape for the dead state (default: "square")
    pub dead_shape: &'static str,
    /// Whether to label states with their Safra trees (default: false)
    pub show_trees: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            state_shape: "circle",
            initial_shape: "doublecircle",
            dead_shape: "square",
            show_trees: false,
        }
    }
}

impl Determinization {
    /// Converts the automaton to DOT (Graphviz) format.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - A DOT-formatted digraph
    /// * `Err(std::fmt::Error)` - If string formatting fails (rare)
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the automaton to DOT format with custom configuration.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "rankdir=LR;")?;
        writeln!(dot, "node [shape={}];", config.state_shape)?;

        // Entry arrow
        writeln!(dot, "init [shape=point, style=invis];")?;
        writeln!(dot, "init -> {};", self.initial())?;

        for id in self.states() {
            let shape = if self.is_dead(id) {
                config.dead_shape
            } else if id == self.initial() {
                config.initial_shape
            } else {
                config.state_shape
            };
            let label = if config.show_trees {
                self.tree(id).to_string()
            } else {
                id.to_string()
            };
            writeln!(dot, "{} [shape={}, label=\"{}\"];", id, shape, label)?;
        }

        let mut edges = BTreeMap::<(StateId, StateId), Vec<usize>>::new();
        for (from, symbol, to) in self.transitions() {
            edges.entry((from, to)).or_default().push(symbol);
        }
        for ((from, to), symbols) in edges.iter() {
            let label = symbols.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
            writeln!(dot, "{} -> {} [label=\"{}\"];", from, to, label)?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
