// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;

#[test]
fn staging_a_dependency_cycle_through_a_transaction_rejects_the_whole_commit() {
    let mut plan = Plan::new();
    let a = build_task("relations::a");
    let b = build_task("relations::b");
    let a_id = plan.add(a);
    let b_id = plan.add(b);

    plan.dependency.add_edge(a_id, b_id, Value::Null).expect("fresh pair");
    let before = plan.dependency.edges().count();

    let mut txn = Transaction::new(&mut plan);
    txn.stage_add_task_edge(RelationKind::Dependency, b_id, a_id, Value::Null);
    let err = txn.commit().unwrap_err();
    assert!(matches!(err, pek_core::StructuralError::CycleFound { .. }));

    assert_eq!(plan.dependency.edges().count(), before);
    assert!(plan.dependency.has_edge(a_id, b_id));
    assert!(!plan.dependency.has_edge(b_id, a_id));
}

#[test]
fn a_self_loop_is_rejected_directly_on_the_graph() {
    let mut plan = Plan::new();
    let task = build_task("relations::loner");
    let id = plan.add(task);

    let err = plan.dependency.add_edge(id, id, Value::Null).unwrap_err();
    assert!(matches!(err, pek_core::StructuralError::CycleFound { .. }));
}
