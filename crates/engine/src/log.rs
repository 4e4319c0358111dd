// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The plan's event log and a pure rebuilder over it. Every mutation of
//! interest (mission/permanent marks, emissions, finalization, garbage
//! collection) is recorded as a `LogEntry` quadruple — method name, a
//! `(seconds, micros)` timestamp pair, and a JSON argument payload.
//! `PlanRebuilder::rebuild` reconstructs derived state from any prefix of
//! the stream without ever touching a live `Plan`.

use indexmap::{IndexMap, IndexSet};
use pek_core::TaskId;
use serde_json::Value;

/// One recorded mutation: `method(seconds, micros, args)`.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub method: String,
    pub seconds: u64,
    pub micros: u32,
    pub args: Value,
}

impl LogEntry {
    pub fn new(method: impl Into<String>, seconds: u64, micros: u32, args: Value) -> Self {
        Self { method: method.into(), seconds, micros, args }
    }

    fn task_arg(&self) -> Option<TaskId> {
        self.args.get("task").and_then(|v| v.as_str()).map(TaskId::from_string)
    }
}

/// Derived state reconstructed by replaying a `LogEntry` stream.
#[derive(Debug, Default)]
pub struct RebuiltState {
    pub mission_tasks: IndexSet<TaskId>,
    pub permanent_tasks: IndexSet<TaskId>,
    /// Each task's emitted event symbols, in emission order.
    pub emitted: IndexMap<TaskId, Vec<String>>,
    pub finalized: IndexSet<TaskId>,
    pub garbaged: IndexSet<TaskId>,
}

/// A pure, stateless function over a `LogEntry` stream. Never touches a
/// live `Plan` — it only interprets the log.
pub struct PlanRebuilder;

impl PlanRebuilder {
    /// Replays the entire stream.
    pub fn rebuild(entries: &[LogEntry]) -> RebuiltState {
        Self::rebuild_prefix(entries, entries.len())
    }

    /// Replays the first `len` entries. Out-of-range `len` is clamped to
    /// the stream's length, so any prefix (including the whole stream) is
    /// valid input.
    pub fn rebuild_prefix(entries: &[LogEntry], len: usize) -> RebuiltState {
        let mut state = RebuiltState::default();
        let len = len.min(entries.len());
        for entry in &entries[..len] {
            Self::apply(&mut state, entry);
        }
        state
    }

    fn apply(state: &mut RebuiltState, entry: &LogEntry) {
        let Some(task) = entry.task_arg() else { return };
        match entry.method.as_str() {
            "mission" => {
                state.mission_tasks.insert(task);
            }
            "unmission" => {
                state.mission_tasks.shift_remove(&task);
            }
            "permanent_task" => {
                state.permanent_tasks.insert(task);
            }
            "event_emitted" => {
                if let Some(symbol) = entry.args.get("symbol").and_then(|v| v.as_str()) {
                    state.emitted.entry(task).or_default().push(symbol.to_string());
                }
            }
            // A finalized or garbage-collected task deregisters its id:
            // reusing it afterward (e.g. a restored plan replaying a fresh
            // task under the same id) starts from a clean slate rather than
            // inheriting stale mission/emission state.
            "task_finalized" => {
                Self::deregister(state, task);
                state.finalized.insert(task);
            }
            "task_garbaged" => {
                Self::deregister(state, task);
                state.finalized.insert(task);
                state.garbaged.insert(task);
            }
            _ => {}
        }
    }

    fn deregister(state: &mut RebuiltState, task: TaskId) {
        state.mission_tasks.shift_remove(&task);
        state.permanent_tasks.shift_remove(&task);
        state.emitted.shift_remove(&task);
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
