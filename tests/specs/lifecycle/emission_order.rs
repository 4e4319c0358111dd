// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[test]
fn start_then_success_drives_status_through_running_to_finished() {
    let mut plan = executable_plan();
    let task = build_task("lifecycle::mover");
    let start = generator_id(&task, &EventSymbol::start());
    let success = generator_id(&task, &EventSymbol::success());
    let id = plan.add(task);
    plan.add_mission_task(id);

    let mut engine = Engine::default();

    let aggregate = engine.run_cycle(&mut plan, vec![(start, Value::Null)]);
    assert!(aggregate.is_empty());
    assert!(plan.task(id).unwrap().running());
    assert_eq!(plan.task(id).unwrap().outcome(), None);

    // `success` forwards to `stop` (materialized by `Plan::add`), so one
    // cycle carries the task all the way to `Finished`.
    let aggregate = engine.run_cycle(&mut plan, vec![(success, Value::Null)]);
    assert!(aggregate.is_empty());
    let task = plan.task(id).unwrap();
    assert!(task.finished());
    assert_eq!(task.outcome(), Some(TaskOutcome::Success));
}

#[yare::parameterized(
    failed = { "failed" },
    aborted = { "aborted" },
    internal_error = { "internal_error" },
)]
fn every_standard_failure_terminal_forwards_to_stop(symbol_name: &str) {
    let mut plan = executable_plan();
    let task = build_task("lifecycle::faller");
    let start = generator_id(&task, &EventSymbol::start());
    let terminal = generator_id(&task, &EventSymbol::new(symbol_name));
    let id = plan.add(task);
    plan.add_mission_task(id);

    let mut engine = Engine::default();
    engine.run_cycle(&mut plan, vec![(start, Value::Null)]);
    engine.run_cycle(&mut plan, vec![(terminal, Value::Null)]);

    let task = plan.task(id).unwrap();
    assert!(task.finished());
    assert!(task.failed());
}

#[test]
fn forward_closure_derives_instance_terminal_flags_and_chains_to_stop() {
    // Model has `direct`, `indirect`, `intermediate` (none declared
    // terminal) plus `forward direct => success` and
    // `forward indirect => intermediate => success`. Both `direct` and
    // `indirect` should report `terminal? = true` at the instance level,
    // since their forward-closure lands only on the terminal `success`.
    let model = TaskModelBuilder::new("lifecycle::forwarder")
        .event("direct", false, false)
        .event("indirect", false, false)
        .event("intermediate", false, false)
        .forward("direct", "success")
        .forward("indirect", "intermediate")
        .forward("intermediate", "success")
        .build_arc();
    let mut plan = executable_plan();
    let task = Task::new(model, Arguments::new());
    let start = generator_id(&task, &EventSymbol::start());
    let direct = generator_id(&task, &EventSymbol::new("direct"));
    let id = plan.add(task);
    plan.add_mission_task(id);

    let task_ref = plan.task(id).unwrap();
    assert!(task_ref.event(&EventSymbol::new("direct")).unwrap().terminal);
    assert!(task_ref.event(&EventSymbol::new("indirect")).unwrap().terminal);

    let mut engine = Engine::default();
    let aggregate = engine.run_cycle(&mut plan, vec![(start, Value::Null)]);
    assert!(aggregate.is_empty());
    let aggregate = engine.run_cycle(&mut plan, vec![(direct, Value::Null)]);
    assert!(aggregate.is_empty());

    let task = plan.task(id).unwrap();
    assert!(task.finished());
    assert!(task.success());
}

#[test]
fn a_task_emits_at_most_one_terminal_event() {
    let task = build_task("lifecycle::double_terminal");
    let mut plan = executable_plan();
    let success = generator_id(&task, &EventSymbol::success());
    let failed = generator_id(&task, &EventSymbol::failed());
    let id = plan.add(task);

    let success_event =
        Event { id: EventId::new(), generator: success, propagation_id: 0, time: std::time::Instant::now(), context: Value::Null, direct_sources: Vec::new() };
    plan.task_mut(id).unwrap().emit(&EventSymbol::success(), &success_event).unwrap();
    assert!(plan.check_single_terminal(id).is_ok());

    let failed_event =
        Event { id: EventId::new(), generator: failed, propagation_id: 0, time: std::time::Instant::now(), context: Value::Null, direct_sources: Vec::new() };
    plan.task_mut(id).unwrap().emit(&EventSymbol::failed(), &failed_event).unwrap();
    assert!(plan.check_single_terminal(id).is_err());
}
