// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the scenario modules under `tests/specs/`.

pub use pek_core::{
    ArgValue, ArgWrite, Arguments, Event, EventId, EventSymbol, GeneratorId, OnReplace, Plan, Task,
    TaskId, TaskOutcome, TaskStatus,
};
pub use pek_engine::{AggregateError, Engine, RelationKind, Transaction};
pub use pek_model::TaskModelBuilder;
pub use serde_json::{json, Value};
pub use std::sync::Arc;

/// A task built from a bare, throwaway model with no declared events or
/// relations beyond the standard eight.
pub fn build_task(model_name: &str) -> Task {
    let model = TaskModelBuilder::new(model_name).build_arc();
    Task::new(model, Arguments::new())
}

/// Binds a command that always succeeds without itself emitting anything,
/// onto `symbol`'s generator.
pub fn bind_noop_command(task: &mut Task, symbol: &EventSymbol) {
    task.event_mut(symbol).expect("declared event").set_command(Arc::new(|_, _| Ok(())));
}

pub fn generator_id(task: &Task, symbol: &EventSymbol) -> GeneratorId {
    task.event(symbol).expect("declared event").id()
}

/// Builds a plan with no tasks yet, flipped executable — the state every
/// scenario that runs an `Engine` cycle needs.
pub fn executable_plan() -> Plan {
    let mut plan = Plan::new();
    plan.executable = true;
    plan
}
