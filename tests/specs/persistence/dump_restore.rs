// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use pek_core::TaskModel;
use pek_engine::dump::{dump, restore};
use std::collections::HashMap;

fn model_registry() -> HashMap<&'static str, Arc<TaskModel>> {
    let mut models = HashMap::new();
    models.insert("dump::upstream", TaskModelBuilder::new("dump::upstream").build_arc());
    models.insert("dump::downstream", TaskModelBuilder::new("dump::downstream").build_arc());
    models
}

#[test]
fn dump_then_restore_reproduces_tasks_relations_and_replay_history() {
    let mut plan = executable_plan();

    let upstream = build_task("dump::upstream");
    let upstream_start = generator_id(&upstream, &EventSymbol::start());
    let upstream_success = generator_id(&upstream, &EventSymbol::success());
    let upstream_id = plan.add(upstream);
    plan.add_mission_task(upstream_id);

    let downstream = build_task("dump::downstream");
    let downstream_start = generator_id(&downstream, &EventSymbol::start());
    let downstream_id = plan.add(downstream);
    plan.dependency.add_edge(upstream_id, downstream_id, Value::Null).expect("fresh pair");
    plan.signals.add_edge(upstream_success, downstream_start, Value::Null).expect("fresh pair");

    let mut engine = Engine::default();
    engine.run_cycle(&mut plan, vec![(upstream_start, Value::Null)]);
    engine.run_cycle(&mut plan, vec![(upstream_success, Value::Null)]);

    let snapshot = dump(&plan);
    assert_eq!(snapshot.tasks.len(), 2);

    let models = model_registry();
    let restored = restore(&snapshot, &|name| models.get(name).cloned()).expect("every model is registered");

    assert_eq!(restored.tasks().count(), 2);
    let (new_upstream_id, new_upstream) =
        restored.tasks().find(|(_, t)| t.model.name == "dump::upstream").expect("upstream survived restore");
    assert!(new_upstream.success());
    assert!(new_upstream.started());

    let (new_downstream_id, _) =
        restored.tasks().find(|(_, t)| t.model.name == "dump::downstream").expect("downstream survived restore");
    assert!(restored.dependency.has_edge(*new_upstream_id, *new_downstream_id));
    assert!(restored.is_mission(*new_upstream_id));
}

#[test]
fn restore_rejects_an_unregistered_model_name() {
    let mut plan = Plan::new();
    let task = build_task("dump::orphan_model");
    plan.add(task);

    let snapshot = dump(&plan);
    let err = restore(&snapshot, &|_| None).unwrap_err();
    assert!(matches!(err, pek_engine::dump::DumpError::UnknownModel(_)));
}
