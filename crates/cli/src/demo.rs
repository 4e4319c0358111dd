// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The demo plan: two tasks, `fetch` and `deliver`, wired so `fetch`
//! depends on `deliver` and signals it to start once `fetch` succeeds.
//! Both `start` commands always succeed — this binary exists to exercise
//! the engine's cycle loop end to end, not to model real robot behavior.

use crate::output::{print_cycle, OutputFormat, TaskReport};
use pek_core::{Arguments, EventSymbol, Plan, Task, TaskId};
use pek_engine::Engine;
use pek_model::TaskModelBuilder;
use serde_json::json;
use std::sync::Arc;

/// A freshly wired demo plan plus the ids callers need to drive it: the
/// `fetch` task's `start` generator to inject, and both task ids to report
/// on afterward.
struct DemoPlan {
    plan: Plan,
    fetch_start: pek_core::GeneratorId,
    fetch_id: TaskId,
    deliver_id: TaskId,
}

// `start`/`success` are standard events materialized on every task, and
// `add_edge` can only fail on a self-loop or a duplicate, neither of which
// a fresh two-node chain produces.
#[allow(clippy::expect_used)]
fn build_demo_plan() -> DemoPlan {
    let mut plan = Plan::new();
    plan.executable = true;

    let fetch_model = TaskModelBuilder::new("demo::fetch").build_arc();
    let deliver_model = TaskModelBuilder::new("demo::deliver").build_arc();

    let mut fetch = Task::new(fetch_model, Arguments::new());
    fetch.event_mut(&EventSymbol::start()).expect("standard event").set_command(Arc::new(|_, _| Ok(())));
    let fetch_start = fetch.event(&EventSymbol::start()).expect("standard event").id();
    let fetch_success = fetch.event(&EventSymbol::success()).expect("standard event").id();
    let fetch_id = fetch.id;

    let mut deliver = Task::new(deliver_model, Arguments::new());
    deliver.event_mut(&EventSymbol::start()).expect("standard event").set_command(Arc::new(|_, _| Ok(())));
    let deliver_start = deliver.event(&EventSymbol::start()).expect("standard event").id();
    let deliver_id = deliver.id;

    plan.add(fetch);
    plan.add(deliver);
    plan.add_mission_task(fetch_id);
    plan.add_mission_task(deliver_id);

    plan.dependency.add_edge(fetch_id, deliver_id, json!(null)).expect("fresh two-node chain");
    plan.signals.add_edge(fetch_success, deliver_start, json!(null)).expect("fresh two-node chain");

    DemoPlan { plan, fetch_start, fetch_id, deliver_id }
}

pub fn run(cycles: u64, format: OutputFormat) -> std::process::ExitCode {
    let DemoPlan { mut plan, fetch_start, fetch_id, deliver_id } = build_demo_plan();

    let mut engine = Engine::default();
    let mut injected = vec![(fetch_start, json!(null))];

    for _ in 0..cycles.max(1) {
        let aggregate = engine.run_cycle(&mut plan, std::mem::take(&mut injected));
        let tasks = report(&plan, &[fetch_id, deliver_id]);
        let errors: Vec<String> = aggregate.errors.iter().map(|e| e.to_string()).collect();
        print_cycle(engine.cycle(), &tasks, &errors, format);
    }

    std::process::ExitCode::SUCCESS
}

fn report(plan: &Plan, ids: &[TaskId]) -> Vec<TaskReport> {
    ids.iter()
        .filter_map(|id| plan.task(*id))
        .map(|task| TaskReport {
            id: task.id.to_string(),
            model: task.model.name.clone(),
            status: format!("{:?}", task.status()),
            outcome: task.outcome().map(|o| format!("{o:?}")),
            mission: plan.is_mission(task.id),
        })
        .collect()
}

#[cfg(test)]
#[path = "demo_tests.rs"]
mod tests;
