// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[test]
fn a_full_replace_wraps_child_side_generator_pairs_too() {
    let mut plan = Plan::new();

    let old = build_task("replace::txn_old");
    let old_id = plan.add(old);
    let old_success = plan.task(old_id).unwrap().event(&EventSymbol::success()).unwrap().id();

    let downstream = build_task("replace::txn_downstream");
    let downstream_start = generator_id(&downstream, &EventSymbol::start());
    plan.add(downstream);
    plan.signals.add_edge(old_success, downstream_start, Value::Null).expect("fresh pair");

    let new = build_task("replace::txn_new");
    let new_id = plan.add(new);
    let new_success = plan.task(new_id).unwrap().event(&EventSymbol::success()).unwrap().id();

    let mut txn = Transaction::new(&mut plan);
    txn.replace_by(old_id, new_id);
    // A full replace inspects outgoing (child-side) edges too, so the
    // `success` pair carrying the signal to `downstream` is wrapped.
    assert!(txn.is_wrapped_event(old_success));
    assert!(txn.is_wrapped_event(new_success));
    txn.commit().expect("both tasks exist");

    assert!(plan.signals.has_edge(new_success, downstream_start));
    assert!(!plan.signals.has_edge(old_success, downstream_start));
}

#[test]
fn staging_a_replace_against_a_missing_task_reports_a_model_violation() {
    let mut plan = Plan::new();
    let new = build_task("replace::txn_solo");
    let new_id = plan.add(new);

    let stale_id = pek_core::TaskId::new();
    let mut txn = Transaction::new(&mut plan);
    txn.replace_by(stale_id, new_id);
    let err = txn.commit().unwrap_err();
    assert!(matches!(err, pek_core::StructuralError::ModelViolation(_)));
}
