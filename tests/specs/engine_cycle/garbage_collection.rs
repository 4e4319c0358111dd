// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[test]
fn only_tasks_reachable_from_mission_or_permanent_roots_survive_a_cycle() {
    let mut plan = executable_plan();

    let root = build_task("gc::root");
    let root_id = plan.add(root);
    plan.add_mission_task(root_id);

    let dependency = build_task("gc::dependency");
    let dependency_id = plan.add(dependency);
    plan.dependency.add_edge(root_id, dependency_id, Value::Null).expect("fresh pair");

    let orphan = build_task("gc::orphan");
    let orphan_id = plan.add(orphan);

    let mut engine = Engine::default();
    engine.run_cycle(&mut plan, vec![]);

    assert!(plan.task(root_id).is_some());
    assert!(plan.task(dependency_id).is_some());
    assert!(plan.task(orphan_id).is_none());
    assert!(plan.garbage.garbaged.contains(&orphan_id));
}

#[test]
fn a_permanent_but_non_mission_task_also_survives() {
    let mut plan = executable_plan();
    let task = build_task("gc::permanent");
    let id = plan.add(task);
    plan.add_permanent_task(id);

    let mut engine = Engine::default();
    engine.run_cycle(&mut plan, vec![]);

    assert!(plan.task(id).is_some());
}

#[test]
fn garbage_collecting_a_task_marks_its_unemitted_generators_unreachable() {
    use std::sync::Mutex;

    let mut plan = executable_plan();
    let mut orphan = build_task("gc::unreachable_events");
    let captured: Arc<Mutex<Option<pek_core::UnreachableCause>>> = Arc::new(Mutex::new(None));
    let sink = captured.clone();
    orphan
        .event_mut(&EventSymbol::success())
        .unwrap()
        .if_unreachable(Arc::new(move |cause| *sink.lock().unwrap() = Some(cause.clone())), false, OnReplace::Drop);
    let id = plan.add(orphan);

    let mut engine = Engine::default();
    engine.run_cycle(&mut plan, vec![]);

    assert!(plan.task(id).is_none());
    assert!(matches!(*captured.lock().unwrap(), Some(pek_core::UnreachableCause::GarbageCollected)));
}
