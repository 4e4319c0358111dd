// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Garbage collection: a task survives a cycle iff it is reachable from the
//! mission/permanent roots via the dependency relation. Everything else is
//! removed and recorded in the plan's `garbaged` bucket.

use indexmap::IndexSet;
use pek_core::{Plan, TaskId};

/// The set of tasks reachable from the mission/permanent roots via the
/// dependency relation — the set a cycle keeps alive, and what the query
/// engine's `:local` scope restricts matches to.
pub fn reachable_from_roots(plan: &Plan) -> IndexSet<TaskId> {
    let roots: IndexSet<TaskId> = plan.mission_tasks().chain(plan.permanent_tasks()).collect();
    let mut reachable: IndexSet<TaskId> = roots.clone();
    let mut stack: Vec<TaskId> = roots.into_iter().collect();
    while let Some(id) = stack.pop() {
        for child in plan.dependency.children_of(id) {
            if reachable.insert(child) {
                stack.push(child);
            }
        }
    }
    reachable
}

/// Runs one reachability pass and removes every unreachable task. Returns
/// the ids removed, in the order they were collected.
pub fn collect(plan: &mut Plan) -> Vec<TaskId> {
    let reachable = reachable_from_roots(plan);
    let garbage: Vec<TaskId> =
        plan.tasks().map(|(id, _)| *id).filter(|id| !reachable.contains(id)).collect();
    for id in &garbage {
        plan.garbage.garbaged.push(*id);
        plan.mark_task_events_garbage_collected(*id);
        plan.remove_task(*id);
    }
    garbage
}

#[cfg(test)]
#[path = "gc_tests.rs"]
mod tests;
