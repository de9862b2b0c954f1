//! # Clock Tree Registry
//!
//! Name → node registry, graph queries, and the nested tree view.
//!
//! The tree is the exclusive owner of every node's lifetime. Edges are not
//! materialized anywhere: parent/child relationships are recomputed by
//! linear scans on demand, which is O(n) per query and perfectly fine for
//! the tens of nodes a real clock tree has. The rendered view follows the
//! *live* mux selections, so two successive [`ClockTree::build_tree`] calls
//! may legitimately differ when hardware selector state changed in between.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use crate::clock::node::Clock;
use crate::error::{RegLensError, Result};

/// One node of the rendered clock tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode
{
    /// Clock name.
    pub name: String,
    /// Children, each nested under the parent they currently resolve to.
    pub children: Vec<TreeNode>,
}

impl TreeNode
{
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result
    {
        writeln!(f, "{:indent$}{}", "", self.name, indent = depth * 2)?;
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeNode
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        self.fmt_indented(f, 0)
    }
}

/// Registry of all clocks of a device.
///
/// Nodes are constructed by the caller and inserted explicitly with
/// [`ClockTree::register`]; queries then resolve parent references by name
/// through this registry.
#[derive(Default)]
pub struct ClockTree
{
    clocks: HashMap<String, Clock>,
}

impl fmt::Debug for ClockTree
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ClockTree").field("clocks", &self.clocks.len()).finish()
    }
}

impl ClockTree
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Register a clock under its own name.
    ///
    /// A duplicate name silently replaces the previous node — avoiding
    /// collisions is the caller's responsibility.
    pub fn register(&mut self, clock: Clock)
    {
        let name = clock.name().to_string();
        if self.clocks.insert(name.clone(), clock).is_some() {
            debug!("clock {name} re-registered, previous node replaced");
        }
    }

    /// Number of registered clocks.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.clocks.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.clocks.is_empty()
    }

    /// Whether a clock with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool
    {
        self.clocks.contains_key(name)
    }

    /// Look up a clock.
    ///
    /// An empty name means "no clock" and resolves to `Ok(None)`; that is
    /// how optional parent references degrade gracefully.
    ///
    /// ## Errors
    ///
    /// [`RegLensError::UnknownClock`] when a non-empty name has no entry.
    pub fn get(&self, name: &str) -> Result<Option<&Clock>>
    {
        if name.is_empty() {
            return Ok(None);
        }
        match self.clocks.get(name) {
            Some(clock) => Ok(Some(clock)),
            None => Err(RegLensError::UnknownClock(name.to_string())),
        }
    }

    /// Frequency of the named clock, in Hz; 0 for an empty name.
    ///
    /// ## Errors
    ///
    /// Unknown-clock reference errors and whatever the node query raises.
    pub fn get_frequency(&self, name: &str) -> Result<u64>
    {
        match self.get(name)? {
            Some(clock) => clock.get_frequency(self),
            None => Ok(0),
        }
    }

    /// Enabled state of the named clock; false for an empty name.
    ///
    /// ## Errors
    ///
    /// Unknown-clock reference errors and whatever the node query raises.
    pub fn enabled(&self, name: &str) -> Result<bool>
    {
        match self.get(name)? {
            Some(clock) => clock.enabled(self),
            None => Ok(false),
        }
    }

    /// Whether the named clock is gated.
    ///
    /// A clock is gated when it is disabled or any of its ancestors is.
    /// An empty name is treated as "no clock present" and reports gated.
    ///
    /// ## Errors
    ///
    /// Unknown-clock reference errors and whatever the node query raises.
    pub fn is_gated(&self, name: &str) -> Result<bool>
    {
        Ok(!self.enabled(name)?)
    }

    /// Find all root clocks.
    ///
    /// A root has no configured parent; for a mux, no configured parent
    /// slots at all. A mux whose live selector currently resolves to "no
    /// parent" still has slots and is therefore never a root — and being
    /// selectable by some mux does not disqualify a node from being one.
    /// Sorted by name for stable output.
    #[must_use]
    pub fn find_roots(&self) -> Vec<&str>
    {
        let mut roots: Vec<&str> = self
            .clocks
            .values()
            .filter(|clock| {
                clock.parent_name().is_none() && clock.mux_slots().is_none_or(HashMap::is_empty)
            })
            .map(Clock::name)
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Find all clocks that declare `parent` as a parent.
    ///
    /// A node is a child when its single parent matches, or — for a mux —
    /// when `parent` appears among any of its declared slots, not only the
    /// currently resolved one. Sorted by name for stable output.
    #[must_use]
    pub fn find_children(&self, parent: &str) -> Vec<&str>
    {
        let mut children: Vec<&str> = self
            .clocks
            .values()
            .filter(|clock| {
                clock.parent_name() == Some(parent)
                    || clock
                        .mux_slots()
                        .is_some_and(|slots| slots.values().flatten().any(|name| name == parent))
            })
            .map(Clock::name)
            .collect();
        children.sort_unstable();
        children
    }

    /// Validate every registered clock, without short-circuiting.
    ///
    /// Uses the non-raising per-node surface: each failure is logged and
    /// the scan continues, so one pass reports every broken node. Returns
    /// true only if all nodes passed.
    #[must_use]
    pub fn validate_all(&self) -> bool
    {
        let mut result = true;
        for clock in self.clocks.values() {
            if !clock.is_valid(self) {
                result = false;
            }
        }
        result
    }

    /// Build the nested clock tree view.
    ///
    /// Recursively attaches children under the roots. A mux child is
    /// attached only under the parent its selector *currently* resolves
    /// to — hardware state between two calls can legitimately change the
    /// shape.
    ///
    /// ## Errors
    ///
    /// Whatever mux resolution raises (validation, unmapped selector,
    /// port I/O).
    pub fn build_tree(&self) -> Result<Vec<TreeNode>>
    {
        trace!("building clock tree view ({} clocks)", self.clocks.len());
        self.find_roots().into_iter().map(|root| self.subtree(root)).collect()
    }

    fn subtree(&self, name: &str) -> Result<TreeNode>
    {
        let mut children = Vec::new();
        for child_name in self.find_children(name) {
            if let Some(child) = self.clocks.get(child_name) {
                if child.is_mux() {
                    match child.get_parent(self)? {
                        Some(resolved) if resolved == name => {}
                        _ => continue,
                    }
                }
            }
            children.push(self.subtree(child_name)?);
        }
        Ok(TreeNode { name: name.to_string(), children })
    }
}
