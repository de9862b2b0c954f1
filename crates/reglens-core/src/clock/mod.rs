//! # Clock Tree Evaluation
//!
//! Derived clock state computed from live register reads.
//!
//! A device's clock topology is wired up by the caller: one [`Clock`] node
//! per hardware clock (fixed oscillator, gate, divider, mux, PLL), each
//! configured with the [`Field`] accessors that hold its gate, divider, or
//! selector bits, then registered into a [`ClockTree`]. Queries walk the
//! dependency graph down to a fixed root, touching register accessors (and
//! thus the port) along the way — the register cache policy directly
//! controls how much port traffic a tree walk costs.
//!
//! Construction and registration are separate steps on purpose: a node is
//! only visible to lookups once the caller explicitly registers it, so a
//! partially configured node can never be observed through the tree.
//!
//! [`Field`]: crate::access::Field

pub mod node;
pub mod tree;

pub use node::{
    Clock, DividerConfig, DividerFn, DividerMode, FixedConfig, FrequencyFn, GateConfig, MuxConfig,
    PllConfig, SelectorFn,
};
pub use tree::{ClockTree, TreeNode};
