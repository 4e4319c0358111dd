// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory snapshot and restore of a `Plan`: dumping then restoring
//! reproduces an equivalent plan, kept in-memory only so there is no
//! on-disk persistence of live plan state.
//!
//! `Task`/`EventGenerator` are not directly serializable (they hold command
//! closures and `Instant` timestamps), so a snapshot captures the
//! serializable projection: model name, meaningful arguments, which symbols
//! were emitted, and every relation edge by id. `restore` re-derives an
//! equivalent plan by constructing fresh tasks (ids are always freshly
//! minted by `Task::new`, never injected) and translating every snapshot id
//! through an old-id -> new-id map built while restoring. The caller
//! supplies a `models` lookup since `TaskModel`s are code, not data, and are
//! not themselves part of the snapshot.

use indexmap::IndexMap;
use pek_core::{Event, EventId, EventSymbol, GeneratorId, Plan, StructuralError, TaskId, TaskModel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("restore: no model registered for `{0}`")]
    UnknownModel(String),
    #[error(transparent)]
    Structural(#[from] StructuralError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub model_name: String,
    pub arguments: IndexMap<String, Value>,
    /// Every event generator this task owns, by symbol — used to translate
    /// relation-edge generator ids at restore time.
    pub event_ids: Vec<(String, GeneratorId)>,
    /// Symbols to re-emit, in an order safe for `Task::emit`'s transition
    /// table: `start` first (if emitted), then any other emitted non-
    /// terminal symbols, then the one emitted terminal symbol (if any),
    /// then `stop` last (if emitted).
    pub replay: Vec<String>,
    pub mission: bool,
    pub permanent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanSnapshot {
    pub executable: bool,
    pub tasks: Vec<TaskSnapshot>,
    pub signals: Vec<(GeneratorId, GeneratorId, Value)>,
    pub forwards: Vec<(GeneratorId, GeneratorId, Value)>,
    pub precedence: Vec<(GeneratorId, GeneratorId, Value)>,
    pub causal_links: Vec<(GeneratorId, GeneratorId, Value)>,
    pub dependency: Vec<(TaskId, TaskId, Value)>,
    pub error_handling: Vec<(TaskId, TaskId, Value)>,
}

/// Captures a serializable snapshot of `plan`.
pub fn dump(plan: &Plan) -> PlanSnapshot {
    let mut tasks = Vec::new();
    for (&id, task) in plan.tasks() {
        let event_ids: Vec<(String, GeneratorId)> =
            task.events().map(|g| (g.symbol.to_string(), g.id())).collect();

        let mut replay = Vec::new();
        if task.event(&EventSymbol::start()).is_some_and(|g| g.emitted()) {
            replay.push(EventSymbol::start().to_string());
        }
        for g in task.events() {
            if g.emitted() && !g.terminal && g.symbol != EventSymbol::start() {
                replay.push(g.symbol.to_string());
            }
        }
        for g in task.events() {
            if g.emitted() && g.terminal {
                replay.push(g.symbol.to_string());
            }
        }
        if task.event(&EventSymbol::stop()).is_some_and(|g| g.emitted()) {
            replay.push(EventSymbol::stop().to_string());
        }

        tasks.push(TaskSnapshot {
            id,
            model_name: task.model.name.clone(),
            arguments: task.arguments().meaningful_arguments(),
            event_ids,
            replay,
            mission: plan.is_mission(id),
            permanent: plan.is_permanent_task(id),
        });
    }

    PlanSnapshot {
        executable: plan.is_executable(),
        tasks,
        signals: plan.signals.edges().map(|(p, c, i)| (p, c, i.clone())).collect(),
        forwards: plan.forwards.edges().map(|(p, c, i)| (p, c, i.clone())).collect(),
        precedence: plan.precedence.edges().map(|(p, c, i)| (p, c, i.clone())).collect(),
        causal_links: plan.causal_links.edges().map(|(p, c, i)| (p, c, i.clone())).collect(),
        dependency: plan.dependency.edges().map(|(p, c, i)| (p, c, i.clone())).collect(),
        error_handling: plan.error_handling.edges().map(|(p, c, i)| (p, c, i.clone())).collect(),
    }
}

/// Reconstructs an equivalent plan from `snapshot`. `models` resolves a
/// task model by name — models are not themselves serialized.
pub fn restore(
    snapshot: &PlanSnapshot,
    models: &dyn Fn(&str) -> Option<Arc<TaskModel>>,
) -> Result<Plan, DumpError> {
    let mut plan = Plan::new();
    plan.executable = snapshot.executable;

    let mut task_map: IndexMap<TaskId, TaskId> = IndexMap::new();
    let mut gen_map: IndexMap<GeneratorId, GeneratorId> = IndexMap::new();

    for ts in &snapshot.tasks {
        let model = models(&ts.model_name).ok_or_else(|| DumpError::UnknownModel(ts.model_name.clone()))?;
        let mut task = pek_core::Task::new(model, pek_core::Arguments::new());
        for (name, value) in &ts.arguments {
            task.arguments_mut().set_raw(name.clone(), pek_core::ArgValue::Concrete(value.clone()));
        }

        let new_id = plan.add(task);
        task_map.insert(ts.id, new_id);

        if let Some(new_task) = plan.task(new_id) {
            for (symbol, old_gid) in &ts.event_ids {
                if let Some(g) = new_task.event(&EventSymbol::new(symbol.as_str())) {
                    gen_map.insert(*old_gid, g.id());
                }
            }
        }

        for symbol in &ts.replay {
            let sym = EventSymbol::new(symbol.as_str());
            let Some(new_task) = plan.task_mut(new_id) else { continue };
            let Some(generator) = new_task.event(&sym).map(|g| g.id()) else { continue };
            let event = Event {
                id: EventId::new(),
                generator,
                propagation_id: 0,
                time: Instant::now(),
                context: Value::Null,
                direct_sources: Vec::new(),
            };
            new_task.emit(&sym, &event)?;
        }
    }

    restore_generator_edges(&mut plan.signals, &snapshot.signals, &gen_map);
    restore_generator_edges(&mut plan.forwards, &snapshot.forwards, &gen_map);
    restore_generator_edges(&mut plan.precedence, &snapshot.precedence, &gen_map);
    restore_generator_edges(&mut plan.causal_links, &snapshot.causal_links, &gen_map);
    restore_task_edges(&mut plan.dependency, &snapshot.dependency, &task_map);
    restore_task_edges(&mut plan.error_handling, &snapshot.error_handling, &task_map);

    for ts in &snapshot.tasks {
        let Some(&new_id) = task_map.get(&ts.id) else { continue };
        if ts.mission {
            plan.add_mission_task(new_id);
        }
        if ts.permanent {
            plan.add_permanent_task(new_id);
        }
    }

    Ok(plan)
}

fn restore_generator_edges(
    graph: &mut pek_core::Graph<GeneratorId>,
    edges: &[(GeneratorId, GeneratorId, Value)],
    map: &IndexMap<GeneratorId, GeneratorId>,
) {
    for (from, to, info) in edges {
        if let (Some(&f), Some(&t)) = (map.get(from), map.get(to)) {
            let _ = graph.add_edge(f, t, info.clone());
        }
    }
}

fn restore_task_edges(
    graph: &mut pek_core::Graph<TaskId>,
    edges: &[(TaskId, TaskId, Value)],
    map: &IndexMap<TaskId, TaskId>,
) {
    for (from, to, info) in edges {
        if let (Some(&f), Some(&t)) = (map.get(from), map.get(to)) {
            let _ = graph.add_edge(f, t, info.clone());
        }
    }
}

#[cfg(test)]
#[path = "dump_tests.rs"]
mod tests;
