// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The plan: sets of tasks and free events, per-relation graphs, and the
//! mission/permanent/garbage bookkeeping sets.

use crate::error::StructuralError;
use crate::event::{EventGenerator, EventSymbol, GeneratorId};
use crate::relation::Graph;
use crate::task::{Task, STANDARD_EVENTS};
use crate::task_event::TaskId;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::collections::HashMap;

/// Who owns a [`GeneratorId`]: a free-standing event, or one of a task's
/// standard/declared events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorOwner {
    Free,
    Task(TaskId),
}

/// The four garbage buckets tracked across a plan's lifetime.
#[derive(Debug, Default, Clone)]
pub struct GarbageBuckets {
    pub garbaged: Vec<TaskId>,
    pub finalized: Vec<TaskId>,
    pub failed_to_start: Vec<TaskId>,
    pub propagated_exceptions: Vec<GeneratorId>,
}

/// The live set of tasks, events, and relation graphs. An inert plan's
/// tasks cannot have their commands invoked; `executable` flips that.
pub struct Plan {
    pub executable: bool,
    tasks: IndexMap<TaskId, Task>,
    free_events: IndexMap<GeneratorId, EventGenerator>,
    generator_owner: IndexMap<GeneratorId, GeneratorOwner>,

    pub signals: Graph<GeneratorId>,
    pub forwards: Graph<GeneratorId>,
    pub precedence: Graph<GeneratorId>,
    pub causal_links: Graph<GeneratorId>,
    pub dependency: Graph<TaskId>,
    pub error_handling: Graph<TaskId>,

    mission_tasks: IndexSet<TaskId>,
    permanent_tasks: IndexSet<TaskId>,
    permanent_events: IndexSet<GeneratorId>,

    pub garbage: GarbageBuckets,

    /// `(source_success, target)` pairs registered by [`Plan::achieve_with`].
    achieve_links: Vec<(GeneratorId, GeneratorId)>,
}

impl Default for Plan {
    fn default() -> Self {
        Self::new()
    }
}

impl Plan {
    pub fn new() -> Self {
        Self {
            executable: false,
            tasks: IndexMap::new(),
            free_events: IndexMap::new(),
            generator_owner: IndexMap::new(),
            signals: Graph::new("signal", false, false, false),
            forwards: Graph::new("forward", true, false, false),
            precedence: Graph::new("precedence", true, false, false),
            causal_links: Graph::new("causal_link", true, false, false),
            dependency: Graph::new("dependency", true, false, true),
            error_handling: Graph::new("error_handling", false, true, false),
            mission_tasks: IndexSet::new(),
            permanent_tasks: IndexSet::new(),
            permanent_events: IndexSet::new(),
            garbage: GarbageBuckets::default(),
            achieve_links: Vec::new(),
        }
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&TaskId, &Task)> {
        self.tasks.iter()
    }

    pub fn free_event(&self, id: GeneratorId) -> Option<&EventGenerator> {
        self.free_events.get(&id)
    }

    pub fn free_event_mut(&mut self, id: GeneratorId) -> Option<&mut EventGenerator> {
        self.free_events.get_mut(&id)
    }

    pub fn generator_owner(&self, id: GeneratorId) -> Option<GeneratorOwner> {
        self.generator_owner.get(&id).copied()
    }

    /// Resolves a generator id back to the `EventGenerator` api regardless
    /// of whether it is free-standing or task-owned.
    pub fn generator(&self, id: GeneratorId) -> Option<&EventGenerator> {
        match self.generator_owner(id)? {
            GeneratorOwner::Free => self.free_events.get(&id),
            GeneratorOwner::Task(task_id) => {
                self.tasks.get(&task_id)?.events().find(|g| g.id == id).map(|g| &*g)
            }
        }
    }

    /// `add`: inserts a task into the plan, materializing built-in forwards
    /// and precedence edges. Returns the assigned id.
    pub fn add(&mut self, task: Task) -> TaskId {
        let id = task.id;
        for gen in task.events() {
            self.generator_owner.insert(gen.id, GeneratorOwner::Task(id));
        }
        self.tasks.insert(id, task);
        self.wire_task_relations(id);
        id
    }

    pub fn add_free_event(&mut self, generator: EventGenerator) -> GeneratorId {
        let id = generator.id;
        self.generator_owner.insert(id, GeneratorOwner::Free);
        self.free_events.insert(id, generator);
        id
    }

    pub fn add_mission_task(&mut self, id: TaskId) {
        self.mission_tasks.insert(id);
    }

    pub fn remove_mission_task(&mut self, id: TaskId) {
        self.mission_tasks.shift_remove(&id);
    }

    pub fn is_mission(&self, id: TaskId) -> bool {
        self.mission_tasks.contains(&id)
    }

    pub fn mission_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.mission_tasks.iter().copied()
    }

    pub fn add_permanent_task(&mut self, id: TaskId) {
        self.permanent_tasks.insert(id);
    }

    pub fn is_permanent_task(&self, id: TaskId) -> bool {
        self.permanent_tasks.contains(&id)
    }

    pub fn permanent_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.permanent_tasks.iter().copied()
    }

    pub fn add_permanent_event(&mut self, id: GeneratorId) {
        self.permanent_events.insert(id);
    }

    pub fn is_permanent_event(&self, id: GeneratorId) -> bool {
        self.permanent_events.contains(&id)
    }

    pub fn permanent_events(&self) -> impl Iterator<Item = GeneratorId> + '_ {
        self.permanent_events.iter().copied()
    }

    /// Marks every not-yet-emitted generator of `id` unreachable with
    /// [`crate::event::UnreachableCause::GarbageCollected`] before removal.
    /// Called by the engine's GC pass ahead of [`Plan::remove_task`] so the
    /// generator's `if_unreachable` handlers see the right cause rather
    /// than `remove_task`'s generic `Finalized` one (`mark_unreachable` is
    /// idempotent, so this wins the race).
    pub fn mark_task_events_garbage_collected(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.get_mut(&id) {
            for gen in task.events_mut() {
                if !gen.emitted() {
                    gen.mark_unreachable(crate::event::UnreachableCause::GarbageCollected);
                }
            }
        }
    }

    /// Removes a task from every relation graph and arena, running its
    /// finalization handlers. Does not perform reachability analysis — that
    /// is the engine's garbage-collection pass.
    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let mut task = self.tasks.shift_remove(&id)?;
        task.finalize();
        let generator_ids: Vec<GeneratorId> = task.events().map(|g| g.id).collect();
        for gid in &generator_ids {
            self.signals.remove_all_incident(*gid);
            self.forwards.remove_all_incident(*gid);
            self.precedence.remove_all_incident(*gid);
            self.causal_links.remove_all_incident(*gid);
            self.generator_owner.shift_remove(gid);
        }
        self.dependency.remove_all_incident(id);
        self.error_handling.remove_all_incident(id);
        self.mission_tasks.shift_remove(&id);
        self.permanent_tasks.shift_remove(&id);
        self.garbage.finalized.push(id);
        Some(task)
    }

    /// Copies handlers whose `on_replace` policy is `Copy` from `from` onto
    /// `to`. Implemented via a temporary removal because
    /// `IndexMap` cannot yield two simultaneous mutable/immutable borrows
    /// for different keys; re-inserting moves `from` to the end of
    /// iteration order, a cosmetic side effect only.
    pub fn copy_replaceable_handlers(&mut self, from: TaskId, to: TaskId) {
        if let Some(from_task) = self.tasks.shift_remove(&from) {
            if let Some(to_task) = self.tasks.get_mut(&to) {
                from_task.copy_replaceable_handlers_to(to_task);
            }
            self.tasks.insert(from, from_task);
        }
    }

    pub fn remove_free_event(&mut self, id: GeneratorId) -> Option<EventGenerator> {
        let mut gen = self.free_events.shift_remove(&id)?;
        if !gen.emitted() {
            gen.mark_unreachable(crate::event::UnreachableCause::Finalized);
        }
        gen.finalize();
        self.signals.remove_all_incident(id);
        self.forwards.remove_all_incident(id);
        self.precedence.remove_all_incident(id);
        self.causal_links.remove_all_incident(id);
        self.generator_owner.shift_remove(&id);
        self.permanent_events.shift_remove(&id);
        Some(gen)
    }

    /// Wires `target` to emit when `source_success` emits — a forward edge
    /// does exactly that — and
    /// registers the pair so a future [`Plan::check_achieve_failures`] call
    /// can detect `source_success` becoming unreachable first.
    pub fn achieve_with(&mut self, target: GeneratorId, source_success: GeneratorId) {
        self.achieve_links.push((source_success, target));
        let _ = self.forwards.add_edge(source_success, target, Value::Null);
    }

    /// For every `achieve_with` link whose source has gone unreachable
    /// before the target emitted: marks the target generator unreachable
    /// and fails its owning task. Returns the tasks newly
    /// failed this way. Idempotent — a link whose target already emitted
    /// or is already unreachable is skipped.
    pub fn check_achieve_failures(&mut self) -> Vec<TaskId> {
        let mut newly_failed = Vec::new();
        for (source, target) in self.achieve_links.clone() {
            let source_unreachable = self.generator(source).is_some_and(|g| g.is_unreachable());
            let target_settled = self.generator(target).is_some_and(|g| g.emitted() || g.is_unreachable());
            if !source_unreachable || target_settled {
                continue;
            }
            let Some(owner) = self.generator_owner(target) else { continue };
            match owner {
                GeneratorOwner::Task(task_id) => {
                    if let Some(task) = self.tasks.get_mut(&task_id) {
                        if let Some(gen) = task.event_by_id_mut(target) {
                            gen.mark_unreachable(crate::event::UnreachableCause::AchieveSourceUnreachable(source));
                        }
                        task.mark_failed(format!("achieve_with source {source} became unreachable"));
                        newly_failed.push(task_id);
                    }
                }
                GeneratorOwner::Free => {
                    if let Some(gen) = self.free_events.get_mut(&target) {
                        gen.mark_unreachable(crate::event::UnreachableCause::AchieveSourceUnreachable(source));
                    }
                }
            }
        }
        newly_failed
    }

    /// Materializes the built-in forwards (`success -> stop`,
    /// `aborted -> failed`, `failed -> stop`, `internal_error -> stop`),
    /// model-declared signal/forward/causal_link edges, and the
    /// start/intermediate/terminal precedence scaffold.
    fn wire_task_relations(&mut self, task_id: TaskId) {
        let model = self.tasks[&task_id].model.clone();

        for decl in model.all_signals() {
            self.wire_symbol_edge_on(task_id, &decl.from, &decl.to, RelationKind::Signal);
        }
        for decl in model.all_forwards() {
            self.wire_symbol_edge_on(task_id, &decl.from, &decl.to, RelationKind::Forward);
        }
        for decl in model.all_causal_links() {
            self.wire_symbol_edge_on(task_id, &decl.from, &decl.to, RelationKind::CausalLink);
        }

        for (from, to) in [
            (EventSymbol::success(), EventSymbol::stop()),
            (EventSymbol::aborted(), EventSymbol::failed()),
            (EventSymbol::failed(), EventSymbol::stop()),
            (EventSymbol::internal_error(), EventSymbol::stop()),
        ] {
            self.wire_symbol_edge_on(task_id, &from, &to, RelationKind::Forward);
        }

        self.derive_instance_terminal_flags(task_id, &model);

        let standard: IndexSet<EventSymbol> =
            STANDARD_EVENTS.iter().map(|(n, ..)| EventSymbol::new(*n)).collect();
        let declared = model.all_events();
        let intermediate: Vec<EventSymbol> = declared
            .iter()
            .filter(|e| !e.terminal && !standard.contains(&e.symbol))
            .map(|e| e.symbol.clone())
            .collect();
        let mut terminal_roots =
            vec![EventSymbol::success(), EventSymbol::aborted(), EventSymbol::internal_error()];
        terminal_roots.extend(
            declared.iter().filter(|e| e.terminal && !standard.contains(&e.symbol)).map(|e| e.symbol.clone()),
        );

        let forward_decls = model.all_forwards();
        let has_forward_parent =
            |sym: &EventSymbol| forward_decls.iter().any(|d| &d.to == sym && intermediate.contains(&d.from));
        let has_forward_child =
            |sym: &EventSymbol| forward_decls.iter().any(|d| &d.from == sym && intermediate.contains(&d.to));

        let roots: Vec<EventSymbol> = intermediate.iter().filter(|s| !has_forward_parent(s)).cloned().collect();
        let leaves: Vec<EventSymbol> = intermediate.iter().filter(|s| !has_forward_child(s)).cloned().collect();
        // "root terminal" is the fixed set {success, aborted, internal_error,
        // custom terminal} — not recomputed from forward in-degree.
        let root_terminals: Vec<EventSymbol> = terminal_roots;

        for root in &roots {
            self.wire_symbol_edge_on(task_id, &EventSymbol::start(), root, RelationKind::Precedence);
        }
        for leaf in &leaves {
            for terminal in &root_terminals {
                self.wire_symbol_edge_on(task_id, leaf, terminal, RelationKind::Precedence);
            }
        }
    }

    /// Derives the instance-level `terminal` flag for every event whose
    /// forward-closure lands only on terminal events, e.g. a model with
    /// `forward indirect => intermediate => success` makes both `indirect`
    /// and `intermediate` report `terminal? = true` on the task instance
    /// even though only `success` is declared terminal. Only ever turns
    /// `terminal` on, never off — `Task::new` already seeded the flag from
    /// `EventDecl::terminal`/`STANDARD_EVENTS`.
    fn derive_instance_terminal_flags(&mut self, task_id: TaskId, model: &crate::model::TaskModel) {
        let mut children: HashMap<EventSymbol, Vec<EventSymbol>> = HashMap::new();
        for decl in model.all_forwards() {
            children.entry(decl.from.clone()).or_default().push(decl.to.clone());
        }
        for (from, to) in [
            (EventSymbol::success(), EventSymbol::stop()),
            (EventSymbol::aborted(), EventSymbol::failed()),
            (EventSymbol::failed(), EventSymbol::stop()),
            (EventSymbol::internal_error(), EventSymbol::stop()),
        ] {
            children.entry(from).or_default().push(to);
        }

        let Some(task) = self.tasks.get(&task_id) else { return };
        let declared_terminal: HashMap<EventSymbol, bool> =
            task.events().map(|g| (g.symbol.clone(), g.terminal)).collect();
        let symbols: Vec<EventSymbol> = task.events().map(|g| g.symbol.clone()).collect();

        let mut cache: HashMap<EventSymbol, bool> = HashMap::new();
        let mut newly_terminal = Vec::new();
        for symbol in &symbols {
            let mut visiting = IndexSet::new();
            if derive_terminal(symbol, &children, &declared_terminal, &mut cache, &mut visiting) {
                newly_terminal.push(symbol.clone());
            }
        }

        if let Some(task) = self.tasks.get_mut(&task_id) {
            for symbol in newly_terminal {
                if let Some(gen) = task.event_mut(&symbol) {
                    gen.terminal = true;
                }
            }
        }
    }

    fn wire_symbol_edge_on(
        &mut self,
        task_id: TaskId,
        from: &EventSymbol,
        to: &EventSymbol,
        kind: RelationKind,
    ) {
        let task = match self.tasks.get(&task_id) {
            Some(t) => t,
            None => return,
        };
        let (Some(from_id), Some(to_id)) =
            (task.event(from).map(|g| g.id), task.event(to).map(|g| g.id))
        else {
            return;
        };
        let graph = match kind {
            RelationKind::Signal => &mut self.signals,
            RelationKind::Forward => &mut self.forwards,
            RelationKind::Precedence => &mut self.precedence,
            RelationKind::CausalLink => &mut self.causal_links,
        };
        let _ = graph.add_edge(from_id, to_id, Value::Null);
    }
}

/// Whether `symbol`'s forward-closure lands only on terminal events:
/// terminal if declared so directly, otherwise terminal iff it forwards
/// to at least one child and every child is (recursively) terminal.
/// `visiting` guards against a cycle in the forward graph (should not
/// occur — `forwards` is a DAG relation — but this stays total either way).
fn derive_terminal(
    symbol: &EventSymbol,
    children: &HashMap<EventSymbol, Vec<EventSymbol>>,
    declared_terminal: &HashMap<EventSymbol, bool>,
    cache: &mut HashMap<EventSymbol, bool>,
    visiting: &mut IndexSet<EventSymbol>,
) -> bool {
    if let Some(result) = cache.get(symbol) {
        return *result;
    }
    if declared_terminal.get(symbol).copied().unwrap_or(false) {
        cache.insert(symbol.clone(), true);
        return true;
    }
    if !visiting.insert(symbol.clone()) {
        return false;
    }
    let result = match children.get(symbol) {
        Some(kids) if !kids.is_empty() => {
            kids.iter().all(|kid| derive_terminal(kid, children, declared_terminal, cache, visiting))
        }
        _ => false,
    };
    visiting.shift_remove(symbol);
    cache.insert(symbol.clone(), result);
    result
}

#[derive(Clone, Copy)]
enum RelationKind {
    Signal,
    Forward,
    Precedence,
    CausalLink,
}

impl Plan {
    /// The structural checks `executable?` depends on beyond the task's own
    /// flags.
    pub fn is_executable(&self) -> bool {
        self.executable
    }

    /// `executable?` as seen by the plan for a given task.
    pub fn task_executable(&self, id: TaskId) -> bool {
        self.tasks.get(&id).map(|t| t.executable(self.executable)).unwrap_or(false)
    }

    /// Validates the per-task terminal-history invariant: at most one
    /// event with `terminal` flag in history.
    pub fn check_single_terminal(&self, id: TaskId) -> Result<(), StructuralError> {
        let Some(task) = self.tasks.get(&id) else { return Ok(()) };
        let terminal_emitted = task.events().filter(|g| g.terminal && g.emitted()).count();
        if terminal_emitted > 1 {
            return Err(StructuralError::ModelViolation(format!(
                "task {id} emitted {terminal_emitted} terminal events"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
