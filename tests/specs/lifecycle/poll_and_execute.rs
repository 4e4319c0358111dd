// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn poll_runs_every_cycle_while_execute_runs_exactly_once() {
    static POLL_COUNT: AtomicUsize = AtomicUsize::new(0);
    static EXECUTE_COUNT: AtomicUsize = AtomicUsize::new(0);
    POLL_COUNT.store(0, Ordering::SeqCst);
    EXECUTE_COUNT.store(0, Ordering::SeqCst);

    let mut plan = executable_plan();
    let mut task = build_task("lifecycle::runner");
    task.poll(Arc::new(|_| { POLL_COUNT.fetch_add(1, Ordering::SeqCst); Ok(()) }), OnReplace::Drop);
    task.execute(Arc::new(|_| { EXECUTE_COUNT.fetch_add(1, Ordering::SeqCst); Ok(()) }), OnReplace::Drop);
    let start = generator_id(&task, &EventSymbol::start());
    let id = plan.add(task);
    plan.add_mission_task(id);

    let mut engine = Engine::default();
    engine.run_cycle(&mut plan, vec![(start, Value::Null)]);
    assert_eq!(POLL_COUNT.load(Ordering::SeqCst), 1);
    assert_eq!(EXECUTE_COUNT.load(Ordering::SeqCst), 1);

    engine.run_cycle(&mut plan, vec![]);
    engine.run_cycle(&mut plan, vec![]);
    assert_eq!(POLL_COUNT.load(Ordering::SeqCst), 3);
    assert_eq!(EXECUTE_COUNT.load(Ordering::SeqCst), 1);
}

#[test]
fn poll_runs_once_even_when_the_start_handler_emits_stop_in_the_same_cycle() {
    static POLL_COUNT: AtomicUsize = AtomicUsize::new(0);
    POLL_COUNT.store(0, Ordering::SeqCst);

    let mut plan = executable_plan();
    let mut task = build_task("lifecycle::early_stopper");
    task.on(&EventSymbol::start(), Arc::new(|t, _| t.request_emit(EventSymbol::stop())), OnReplace::Drop);
    task.poll(Arc::new(|_| { POLL_COUNT.fetch_add(1, Ordering::SeqCst); Ok(()) }), OnReplace::Drop);
    let start = generator_id(&task, &EventSymbol::start());
    let id = plan.add(task);
    plan.add_mission_task(id);

    let mut engine = Engine::default();
    let aggregate = engine.run_cycle(&mut plan, vec![(start, Value::Null)]);
    assert!(aggregate.is_empty());

    let task = plan.task(id).unwrap();
    assert!(task.finished());
    assert_eq!(POLL_COUNT.load(Ordering::SeqCst), 1);
}

#[test]
fn a_pending_task_runs_neither_poll_nor_execute() {
    static POLL_COUNT: AtomicUsize = AtomicUsize::new(0);
    POLL_COUNT.store(0, Ordering::SeqCst);

    let mut plan = executable_plan();
    let mut task = build_task("lifecycle::dormant");
    task.poll(Arc::new(|_| { POLL_COUNT.fetch_add(1, Ordering::SeqCst); Ok(()) }), OnReplace::Drop);
    let id = plan.add(task);
    plan.add_mission_task(id);

    let mut engine = Engine::default();
    engine.run_cycle(&mut plan, vec![]);
    assert_eq!(POLL_COUNT.load(Ordering::SeqCst), 0);
    assert!(plan.task(id).unwrap().pending());
}

#[test]
fn a_failing_poll_handler_marks_internal_error_and_stops_further_polling() {
    static POLL_CALLS: AtomicUsize = AtomicUsize::new(0);
    POLL_CALLS.store(0, Ordering::SeqCst);

    let mut plan = executable_plan();
    let mut task = build_task("lifecycle::flaky");
    task.poll(Arc::new(|_| { POLL_CALLS.fetch_add(1, Ordering::SeqCst); Err("poll blew up".into()) }), OnReplace::Drop);
    let start = generator_id(&task, &EventSymbol::start());
    let id = plan.add(task);
    plan.add_mission_task(id);

    let mut engine = Engine::default();
    let aggregate = engine.run_cycle(&mut plan, vec![(start, Value::Null)]);
    assert!(!aggregate.is_empty());
    let task = plan.task(id).unwrap();
    assert!(task.internal_error());
    assert!(task.failed());

    engine.run_cycle(&mut plan, vec![]);
    assert_eq!(POLL_CALLS.load(Ordering::SeqCst), 1);
}
