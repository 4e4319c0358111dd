// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[test]
fn a_target_whose_achieve_source_never_fires_fails_its_owning_task() {
    let mut plan = Plan::new();

    let source_task = build_task("achieve::source");
    let source_success = generator_id(&source_task, &EventSymbol::success());
    let source_id = plan.add(source_task);

    let dependent_task = build_task("achieve::dependent");
    // `updated_data` is a standard, non-terminal event — a convenient stand
    // in for a model-declared milestone event.
    let target = generator_id(&dependent_task, &EventSymbol::updated_data());
    let dependent_id = plan.add(dependent_task);

    plan.achieve_with(target, source_success);
    assert!(plan.forwards.has_edge(source_success, target));

    // `source_task` is finalized without ever emitting `success`, so its
    // generator becomes unreachable.
    plan.remove_task(source_id);

    let newly_failed = plan.check_achieve_failures();
    assert_eq!(newly_failed, vec![dependent_id]);

    let dependent = plan.task(dependent_id).unwrap();
    assert!(dependent.failed());
    assert!(plan.generator(target).unwrap().is_unreachable());
}

#[test]
fn check_achieve_failures_is_a_no_op_once_the_target_already_emitted() {
    let mut plan = Plan::new();

    let source_task = build_task("achieve::source");
    let source_success = generator_id(&source_task, &EventSymbol::success());
    let source_id = plan.add(source_task);

    let mut dependent_task = build_task("achieve::dependent");
    let target = generator_id(&dependent_task, &EventSymbol::updated_data());
    let event = Event {
        id: EventId::new(),
        generator: target,
        propagation_id: 0,
        time: std::time::Instant::now(),
        context: Value::Null,
        direct_sources: Vec::new(),
    };
    dependent_task.emit(&EventSymbol::updated_data(), &event).unwrap();
    let dependent_id = plan.add(dependent_task);

    plan.achieve_with(target, source_success);
    plan.remove_task(source_id);

    assert!(plan.check_achieve_failures().is_empty());
    assert!(!plan.task(dependent_id).unwrap().failed());
}
