// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactions: a staged, atomic set of plan mutations, modeled as a
//! tagged pair `{underlying_id, overlay}` — every lookup resolves the
//! overlay first, falling back to the underlying plan.

use indexmap::IndexSet;
use pek_core::{GeneratorId, Plan, StructuralError, Task, TaskId};
use serde_json::Value;

/// Which relation graph a staged edge operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Signal,
    Forward,
    Precedence,
    CausalLink,
    Dependency,
    ErrorHandling,
}

#[derive(Debug, Clone, Copy)]
enum EdgeId {
    Generator(GeneratorId, GeneratorId),
    Task(TaskId, TaskId),
}

#[derive(Debug, Clone)]
enum EdgeOp {
    Add { kind: RelationKind, ids: EdgeId, info: Value },
    Remove { kind: RelationKind, ids: EdgeId },
}

/// Wraps a `&mut Plan`, staging additions/removals/updates that are only
/// visible through the transaction until `commit`. Accessing a plan object
/// through `wrap_task`/`wrap_event` is "proxy creation" — tracked here as
/// membership in `wrapped_tasks`/`wrapped_events` rather than as a distinct
/// proxy value, since every query already resolves overlay-first-then-
/// underlying.
pub struct Transaction<'p> {
    plan: &'p mut Plan,
    staged_tasks: Vec<Task>,
    staged_task_removals: IndexSet<TaskId>,
    staged_free_event_removals: IndexSet<GeneratorId>,
    edge_ops: Vec<EdgeOp>,
    mission_marks: Vec<(TaskId, bool)>,
    permanent_marks: Vec<(TaskId, bool)>,
    wrapped_tasks: IndexSet<TaskId>,
    wrapped_events: IndexSet<GeneratorId>,
    /// `(old, new, full)` replace operations, applied at commit by
    /// delegating to [`crate::replace`].
    pending_replaces: Vec<(TaskId, TaskId, bool)>,
}

impl<'p> Transaction<'p> {
    pub fn new(plan: &'p mut Plan) -> Self {
        Self {
            plan,
            staged_tasks: Vec::new(),
            staged_task_removals: IndexSet::new(),
            staged_free_event_removals: IndexSet::new(),
            edge_ops: Vec::new(),
            mission_marks: Vec::new(),
            permanent_marks: Vec::new(),
            wrapped_tasks: IndexSet::new(),
            wrapped_events: IndexSet::new(),
            pending_replaces: Vec::new(),
        }
    }

    pub fn plan(&self) -> &Plan {
        self.plan
    }

    /// Lazily wraps a task: first access through the transaction marks it.
    /// Returns `None` if the task exists in neither the staged additions
    /// nor the underlying plan.
    pub fn wrap_task(&mut self, id: TaskId) -> Option<&Task> {
        if self.plan.task(id).is_none() && !self.staged_tasks.iter().any(|t| t.id == id) {
            return None;
        }
        self.wrapped_tasks.insert(id);
        self.staged_tasks.iter().find(|t| t.id == id).or_else(|| self.plan.task(id))
    }

    pub fn wrap_event(&mut self, id: GeneratorId) {
        self.wrapped_events.insert(id);
    }

    pub fn is_wrapped_task(&self, id: TaskId) -> bool {
        self.wrapped_tasks.contains(&id)
    }

    pub fn is_wrapped_event(&self, id: GeneratorId) -> bool {
        self.wrapped_events.contains(&id)
    }

    pub fn stage_add_task(&mut self, task: Task) -> TaskId {
        let id = task.id;
        self.staged_tasks.push(task);
        self.wrapped_tasks.insert(id);
        id
    }

    pub fn stage_remove_task(&mut self, id: TaskId) {
        self.staged_task_removals.insert(id);
    }

    pub fn stage_remove_free_event(&mut self, id: GeneratorId) {
        self.staged_free_event_removals.insert(id);
    }

    pub fn stage_add_event_edge(
        &mut self,
        kind: RelationKind,
        from: GeneratorId,
        to: GeneratorId,
        info: Value,
    ) {
        self.edge_ops.push(EdgeOp::Add { kind, ids: EdgeId::Generator(from, to), info });
    }

    pub fn stage_remove_event_edge(&mut self, kind: RelationKind, from: GeneratorId, to: GeneratorId) {
        self.edge_ops.push(EdgeOp::Remove { kind, ids: EdgeId::Generator(from, to) });
    }

    pub fn stage_add_task_edge(&mut self, kind: RelationKind, from: TaskId, to: TaskId, info: Value) {
        self.edge_ops.push(EdgeOp::Add { kind, ids: EdgeId::Task(from, to), info });
    }

    pub fn stage_remove_task_edge(&mut self, kind: RelationKind, from: TaskId, to: TaskId) {
        self.edge_ops.push(EdgeOp::Remove { kind, ids: EdgeId::Task(from, to) });
    }

    pub fn stage_mission(&mut self, id: TaskId, mission: bool) {
        self.mission_marks.push((id, mission));
    }

    pub fn stage_permanent_task(&mut self, id: TaskId, permanent: bool) {
        self.permanent_marks.push((id, permanent));
    }

    /// Stages a full `replace_by`: every external relation — event-level
    /// and task-level, parent- and child-side — moves from `old` onto `new`
    /// at commit. Wraps only the events needed to express the rewiring.
    pub fn replace_by(&mut self, old: TaskId, new: TaskId) {
        self.stage_replace(old, new, true);
    }

    /// Stages a `replace_subplan_by`: only parent-side
    /// (incoming) relations move; `old`'s child-side relations are left in
    /// place since `old` is expected to run out as a detached subplan.
    pub fn replace_subplan_by(&mut self, old: TaskId, new: TaskId) {
        self.stage_replace(old, new, false);
    }

    fn stage_replace(&mut self, old: TaskId, new: TaskId, full: bool) {
        self.wrap_task(old);
        self.wrap_task(new);
        for id in self.events_needing_wrap(old, new, full) {
            self.wrap_event(id);
        }
        self.pending_replaces.push((old, new, full));
    }

    /// The minimal event-generator set a replace of this shape touches:
    /// both tasks' `start` generator (the pair every task-level replace
    /// centers on) plus any other generator pair that actually carries an
    /// external relation edge in the direction this variant rewires. A
    /// generator with only child-side (outgoing) edges is never wrapped by
    /// a `replace_subplan_by`, since that variant never inspects outgoing
    /// edges — this keeps a subplan-replace wrap set down to an
    /// `a.start`/`b.start` pair rather than requiring a special case.
    fn events_needing_wrap(&self, old: TaskId, new: TaskId, full: bool) -> Vec<GeneratorId> {
        let Some(old_task) = self.plan.task(old) else { return Vec::new() };
        let Some(new_task) = self.plan.task(new) else { return Vec::new() };
        let mut out = Vec::new();
        if let (Some(os), Some(ns)) = (old_task.event(&pek_core::EventSymbol::start()), new_task.event(&pek_core::EventSymbol::start())) {
            out.push(os.id());
            out.push(ns.id());
        }
        for old_gen in old_task.events() {
            if old_gen.symbol == pek_core::EventSymbol::start() {
                continue;
            }
            let touched = [&self.plan.signals, &self.plan.forwards, &self.plan.precedence, &self.plan.causal_links]
                .into_iter()
                .any(|g| {
                    g.parents_of(old_gen.id()).next().is_some()
                        || (full && g.children_of(old_gen.id()).next().is_some())
                });
            if touched {
                if let Some(new_gen) = new_task.event(&old_gen.symbol) {
                    out.push(old_gen.id());
                    out.push(new_gen.id());
                }
            }
        }
        out
    }

    /// Resolves an event-relation edge overlay-first-then-underlying: a
    /// later staged op for the same pair wins; absent any staged op, falls
    /// through to the live plan.
    pub fn has_event_edge(&self, kind: RelationKind, from: GeneratorId, to: GeneratorId) -> bool {
        for op in self.edge_ops.iter().rev() {
            match op {
                EdgeOp::Add { kind: k, ids: EdgeId::Generator(f, t), .. } if *k == kind && *f == from && *t == to => {
                    return true;
                }
                EdgeOp::Remove { kind: k, ids: EdgeId::Generator(f, t) } if *k == kind && *f == from && *t == to => {
                    return false;
                }
                _ => {}
            }
        }
        self.graph_for(kind).map(|g| g.has_edge(from, to)).unwrap_or(false)
    }

    fn graph_for(&self, kind: RelationKind) -> Option<&pek_core::Graph<GeneratorId>> {
        match kind {
            RelationKind::Signal => Some(&self.plan.signals),
            RelationKind::Forward => Some(&self.plan.forwards),
            RelationKind::Precedence => Some(&self.plan.precedence),
            RelationKind::CausalLink => Some(&self.plan.causal_links),
            RelationKind::Dependency | RelationKind::ErrorHandling => None,
        }
    }

    /// Flushes every staged mutation against the underlying plan, invoking
    /// the same relation hooks a direct mutation would. If any staged DAG
    /// edge would close a cycle, every previously-applied op from this
    /// commit is undone and the whole commit fails.
    pub fn commit(mut self) -> Result<(), StructuralError> {
        let mut applied: Vec<EdgeOp> = Vec::new();
        let result = self.apply_edge_ops(&mut applied);
        if let Err(err) = result {
            self.rollback_edge_ops(applied);
            return Err(err);
        }

        for task in self.staged_tasks.drain(..) {
            self.plan.add(task);
        }
        for id in self.staged_task_removals.drain(..) {
            self.plan.remove_task(id);
        }
        for id in self.staged_free_event_removals.drain(..) {
            self.plan.remove_free_event(id);
        }
        for (id, mission) in self.mission_marks.drain(..) {
            if mission {
                self.plan.add_mission_task(id);
            } else {
                self.plan.remove_mission_task(id);
            }
        }
        for (id, permanent) in self.permanent_marks.drain(..) {
            if permanent {
                self.plan.add_permanent_task(id);
            }
        }
        for (old, new, full) in self.pending_replaces.drain(..) {
            if full {
                crate::replace::replace_by(self.plan, old, new)?;
            } else {
                crate::replace::replace_subplan_by(self.plan, old, new)?;
            }
        }
        Ok(())
    }

    fn apply_edge_ops(&mut self, applied: &mut Vec<EdgeOp>) -> Result<(), StructuralError> {
        let ops = std::mem::take(&mut self.edge_ops);
        for op in ops {
            match &op {
                EdgeOp::Add { kind, ids, info } => {
                    self.apply_add(*kind, *ids, info.clone())?;
                }
                EdgeOp::Remove { kind, ids } => {
                    self.apply_remove(*kind, *ids);
                }
            }
            applied.push(op);
        }
        Ok(())
    }

    fn apply_add(&mut self, kind: RelationKind, ids: EdgeId, info: Value) -> Result<(), StructuralError> {
        match (kind, ids) {
            (RelationKind::Signal, EdgeId::Generator(f, t)) => self.plan.signals.add_edge(f, t, info),
            (RelationKind::Forward, EdgeId::Generator(f, t)) => self.plan.forwards.add_edge(f, t, info),
            (RelationKind::Precedence, EdgeId::Generator(f, t)) => self.plan.precedence.add_edge(f, t, info),
            (RelationKind::CausalLink, EdgeId::Generator(f, t)) => self.plan.causal_links.add_edge(f, t, info),
            (RelationKind::Dependency, EdgeId::Task(f, t)) => self.plan.dependency.add_edge(f, t, info),
            (RelationKind::ErrorHandling, EdgeId::Task(f, t)) => self.plan.error_handling.add_edge(f, t, info),
            _ => Ok(()),
        }
    }

    fn apply_remove(&mut self, kind: RelationKind, ids: EdgeId) {
        match (kind, ids) {
            (RelationKind::Signal, EdgeId::Generator(f, t)) => { self.plan.signals.remove_edge(f, t); }
            (RelationKind::Forward, EdgeId::Generator(f, t)) => { self.plan.forwards.remove_edge(f, t); }
            (RelationKind::Precedence, EdgeId::Generator(f, t)) => { self.plan.precedence.remove_edge(f, t); }
            (RelationKind::CausalLink, EdgeId::Generator(f, t)) => { self.plan.causal_links.remove_edge(f, t); }
            (RelationKind::Dependency, EdgeId::Task(f, t)) => { self.plan.dependency.remove_edge(f, t); }
            (RelationKind::ErrorHandling, EdgeId::Task(f, t)) => { self.plan.error_handling.remove_edge(f, t); }
            _ => {}
        }
    }

    fn rollback_edge_ops(&mut self, applied: Vec<EdgeOp>) {
        for op in applied.into_iter().rev() {
            match op {
                EdgeOp::Add { kind, ids, .. } => self.apply_remove(kind, ids),
                EdgeOp::Remove { kind, ids, .. } => {
                    let _ = self.apply_add(kind, ids, Value::Null);
                }
            }
        }
    }

    /// Discards all staged mutations. Consuming `self` is the mechanism:
    /// nothing was ever applied to the underlying plan.
    pub fn cancel(self) {}
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
