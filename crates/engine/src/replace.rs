// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replacement operators: `replace_by` rewires every external relation from
//! an old task onto a new one; `replace_subplan_by` rewires only the
//! parent-side (incoming) relations, leaving child-side relations on the
//! old task. Strong relations never move; `copy_on_replace` relations are
//! duplicated rather than moved.

use pek_core::{Graph, GeneratorId, Plan, StructuralError, TaskId};
use serde_json::Value;
use std::hash::Hash;

/// Rewires every relation (event- and task-level) from `old` onto `new`,
/// then copies `OnReplace::Copy` handlers from `old` onto `new`. Child-side
/// (outgoing) edges move too — this is the "full" replacement.
pub fn replace_by(plan: &mut Plan, old: TaskId, new: TaskId) -> Result<(), StructuralError> {
    rewire(plan, old, new, true)
}

/// Rewires only parent-side (incoming) relations from `old` onto `new`;
/// child-side relations stay on `old`. Used when `old` still has work left
/// to run out as a detached subplan.
pub fn replace_subplan_by(plan: &mut Plan, old: TaskId, new: TaskId) -> Result<(), StructuralError> {
    rewire(plan, old, new, false)
}

fn rewire(plan: &mut Plan, old: TaskId, new: TaskId, full: bool) -> Result<(), StructuralError> {
    let Some(old_task) = plan.task(old) else {
        return Err(StructuralError::ModelViolation(format!("replace_by: no such task {old}")));
    };
    let Some(new_task) = plan.task(new) else {
        return Err(StructuralError::ModelViolation(format!("replace_by: no such task {new}")));
    };
    let generator_pairs: Vec<(GeneratorId, GeneratorId)> =
        old_task.events().filter_map(|g| new_task.event(&g.symbol).map(|ng| (g.id(), ng.id()))).collect();

    for graph in [&mut plan.signals, &mut plan.forwards, &mut plan.precedence, &mut plan.causal_links] {
        for &(old_id, new_id) in &generator_pairs {
            rewire_pair(graph, old_id, new_id, full);
        }
    }
    rewire_pair(&mut plan.dependency, old, new, full);
    rewire_pair(&mut plan.error_handling, old, new, full);

    plan.copy_replaceable_handlers(old, new);
    Ok(())
}

/// Moves (or, for `copy_on_replace` graphs, duplicates) `old`'s parent-side
/// edges onto `new` unconditionally, and its child-side edges too when
/// `full`. Strong relations are left untouched (pinned across replacement).
fn rewire_pair<Id: Copy + Eq + Hash + std::fmt::Display>(graph: &mut Graph<Id>, old: Id, new: Id, full: bool) {
    if graph.strong {
        return;
    }

    let parent_edges: Vec<(Id, Value)> =
        graph.parents_of(old).map(|p| (p, graph.edge_info(p, old).cloned().unwrap_or(Value::Null))).collect();
    for (parent, info) in parent_edges {
        if !graph.copy_on_replace {
            graph.remove_edge(parent, old);
        }
        let _ = graph.add_edge(parent, new, info);
    }

    if full {
        let child_edges: Vec<(Id, Value)> =
            graph.children_of(old).map(|c| (c, graph.edge_info(old, c).cloned().unwrap_or(Value::Null))).collect();
        for (child, info) in child_edges {
            if !graph.copy_on_replace {
                graph.remove_edge(old, child);
            }
            let _ = graph.add_edge(new, child, info);
        }
    }
}

#[cfg(test)]
#[path = "replace_tests.rs"]
mod tests;
