// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed directed relation graphs between plan objects (events or tasks):
//! signal, forward, precedence, dependency, error-handling, and causal-link
//! relations are all instances of this same generic graph.

use crate::error::StructuralError;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::hash::Hash;
use std::sync::Arc;

/// Per-edge metadata (the "info" payload carried by an `updated_edge_info`
/// log entry).
pub type EdgeInfo = Value;

type Hook<Id> = Arc<dyn Fn(Id, Id, &EdgeInfo) -> Result<(), StructuralError> + Send + Sync>;
type InfallibleHook<Id> = Arc<dyn Fn(Id, Id, &EdgeInfo) + Send + Sync>;

/// A typed directed graph between plan-object ids of type `Id`.
///
/// Flags: `dag` forbids cycles (checked before any hook fires), `strong`
/// excludes the relation from replacement-time rewiring, `copy_on_replace`
/// duplicates rather than moves edges on `replace_by`/`replace_subplan_by`.
#[derive(Clone)]
pub struct Graph<Id: Copy + Eq + Hash> {
    pub name: &'static str,
    pub dag: bool,
    pub copy_on_replace: bool,
    pub strong: bool,
    edges: IndexMap<(Id, Id), EdgeInfo>,
    children: IndexMap<Id, IndexSet<Id>>,
    parents: IndexMap<Id, IndexSet<Id>>,
    adding_child: Vec<Hook<Id>>,
    added_child: Vec<InfallibleHook<Id>>,
    adding_parent: Vec<Hook<Id>>,
    added_parent: Vec<InfallibleHook<Id>>,
    updated_info: Vec<InfallibleHook<Id>>,
}

impl<Id: Copy + Eq + Hash + std::fmt::Display> Graph<Id> {
    pub fn new(name: &'static str, dag: bool, copy_on_replace: bool, strong: bool) -> Self {
        Self {
            name,
            dag,
            copy_on_replace,
            strong,
            edges: IndexMap::new(),
            children: IndexMap::new(),
            parents: IndexMap::new(),
            adding_child: Vec::new(),
            added_child: Vec::new(),
            adding_parent: Vec::new(),
            added_parent: Vec::new(),
            updated_info: Vec::new(),
        }
    }

    pub fn on_adding_child(&mut self, hook: Hook<Id>) {
        self.adding_child.push(hook);
    }

    pub fn on_added_child(&mut self, hook: InfallibleHook<Id>) {
        self.added_child.push(hook);
    }

    pub fn on_adding_parent(&mut self, hook: Hook<Id>) {
        self.adding_parent.push(hook);
    }

    pub fn on_added_parent(&mut self, hook: InfallibleHook<Id>) {
        self.added_parent.push(hook);
    }

    pub fn on_updated_info(&mut self, hook: InfallibleHook<Id>) {
        self.updated_info.push(hook);
    }

    pub fn has_edge(&self, parent: Id, child: Id) -> bool {
        self.edges.contains_key(&(parent, child))
    }

    pub fn edge_info(&self, parent: Id, child: Id) -> Option<&EdgeInfo> {
        self.edges.get(&(parent, child))
    }

    /// Children of `parent`, in insertion order.
    pub fn children_of(&self, parent: Id) -> impl Iterator<Item = Id> + '_ {
        self.children.get(&parent).into_iter().flat_map(|set| set.iter().copied())
    }

    pub fn parents_of(&self, child: Id) -> impl Iterator<Item = Id> + '_ {
        self.parents.get(&child).into_iter().flat_map(|set| set.iter().copied())
    }

    pub fn edges(&self) -> impl Iterator<Item = (Id, Id, &EdgeInfo)> {
        self.edges.iter().map(|(&(p, c), info)| (p, c, info))
    }

    /// DFS from `child`: would adding `parent -> child` close a cycle? Only
    /// meaningful for `dag`-flagged graphs.
    fn creates_cycle(&self, parent: Id, child: Id) -> bool {
        if parent == child {
            return true;
        }
        let mut stack = vec![child];
        let mut seen = IndexSet::new();
        while let Some(node) = stack.pop() {
            if node == parent {
                return true;
            }
            if !seen.insert(node) {
                continue;
            }
            stack.extend(self.children_of(node));
        }
        false
    }

    /// Adds `parent -> child` with `info`. Runs the cycle pre-check first,
    /// before any hook fires, then `adding_*` hooks (if any raises, the
    /// edge is **not** added), then inserts the edge, then `added_*` hooks
    /// (their errors do not undo the insertion).
    pub fn add_edge(&mut self, parent: Id, child: Id, info: EdgeInfo) -> Result<(), StructuralError> {
        if self.dag && self.creates_cycle(parent, child) {
            return Err(StructuralError::CycleFound {
                relation: self.name,
                from: crate::id::IdBuf::new(&parent.to_string()),
                to: crate::id::IdBuf::new(&child.to_string()),
            });
        }
        for hook in &self.adding_child {
            hook(parent, child, &info)?;
        }
        for hook in &self.adding_parent {
            hook(parent, child, &info)?;
        }
        self.edges.insert((parent, child), info.clone());
        self.children.entry(parent).or_default().insert(child);
        self.parents.entry(child).or_default().insert(parent);
        for hook in &self.added_child {
            hook(parent, child, &info);
        }
        for hook in &self.added_parent {
            hook(parent, child, &info);
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, parent: Id, child: Id) -> bool {
        let removed = self.edges.shift_remove(&(parent, child)).is_some();
        if removed {
            if let Some(set) = self.children.get_mut(&parent) {
                set.shift_remove(&child);
            }
            if let Some(set) = self.parents.get_mut(&child) {
                set.shift_remove(&parent);
            }
        }
        removed
    }

    pub fn update_edge_info(&mut self, parent: Id, child: Id, info: EdgeInfo) -> bool {
        if let Some(slot) = self.edges.get_mut(&(parent, child)) {
            *slot = info.clone();
            for hook in &self.updated_info {
                hook(parent, child, &info);
            }
            true
        } else {
            false
        }
    }

    /// Removes every edge incident to `id`, in either direction. Used when
    /// finalizing a plan object.
    pub fn remove_all_incident(&mut self, id: Id) {
        let incident: Vec<(Id, Id)> = self
            .edges
            .keys()
            .copied()
            .filter(|&(p, c)| p == id || c == id)
            .collect();
        for (p, c) in incident {
            self.remove_edge(p, c);
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
#[path = "relation_tests.rs"]
mod tests;
