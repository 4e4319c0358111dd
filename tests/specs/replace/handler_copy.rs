// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use pek_engine::replace;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn replace_by_moves_parent_and_child_relations_and_copies_on_replace_handlers() {
    static FINALIZED: AtomicUsize = AtomicUsize::new(0);
    FINALIZED.store(0, Ordering::SeqCst);

    let mut plan = Plan::new();

    let mut old = build_task("replace::abstract_mover");
    old.set_abstract(true);
    old.when_finalized(Arc::new(|_| { FINALIZED.fetch_add(1, Ordering::SeqCst); }), OnReplace::Copy);
    let old_start = generator_id(&old, &EventSymbol::start());
    let old_id = plan.add(old);

    let upstream = build_task("replace::upstream");
    let upstream_success = generator_id(&upstream, &EventSymbol::success());
    let upstream_id = plan.add(upstream);
    plan.dependency.add_edge(upstream_id, old_id, Value::Null).expect("fresh pair");
    plan.signals.add_edge(upstream_success, old_start, Value::Null).expect("fresh pair");

    let downstream = build_task("replace::downstream");
    let downstream_id = plan.add(downstream);
    plan.dependency.add_edge(old_id, downstream_id, Value::Null).expect("fresh pair");

    let new = build_task("replace::concrete_mover");
    let new_start = generator_id(&new, &EventSymbol::start());
    let new_id = plan.add(new);

    replace::replace_by(&mut plan, old_id, new_id).expect("replacement targets exist");

    // Parent-side (signal) and child-side (dependency) relations moved onto `new`.
    assert!(plan.signals.has_edge(upstream_success, new_start));
    assert!(!plan.signals.has_edge(upstream_success, old_start));
    assert!(plan.dependency.has_edge(upstream_id, new_id));
    assert!(plan.dependency.has_edge(new_id, downstream_id));
    assert!(!plan.dependency.has_edge(upstream_id, old_id));
    assert!(!plan.dependency.has_edge(old_id, downstream_id));

    // The `Copy` finalization handler followed the task onto `new`.
    plan.remove_task(new_id);
    assert_eq!(FINALIZED.load(Ordering::SeqCst), 1);
}

#[test]
fn replace_subplan_by_leaves_child_side_relations_on_the_old_task() {
    let mut plan = Plan::new();

    let old = build_task("replace::subplan_old");
    let old_id = plan.add(old);

    let parent = build_task("replace::subplan_parent");
    let parent_id = plan.add(parent);
    plan.dependency.add_edge(parent_id, old_id, Value::Null).expect("fresh pair");

    let child = build_task("replace::subplan_child");
    let child_id = plan.add(child);
    plan.dependency.add_edge(old_id, child_id, Value::Null).expect("fresh pair");

    let new = build_task("replace::subplan_new");
    let new_id = plan.add(new);

    replace::replace_subplan_by(&mut plan, old_id, new_id).expect("replacement targets exist");

    assert!(plan.dependency.has_edge(parent_id, new_id));
    assert!(!plan.dependency.has_edge(parent_id, old_id));
    // `old` keeps running its detached subplan out.
    assert!(plan.dependency.has_edge(old_id, child_id));
    assert!(!plan.dependency.has_edge(new_id, child_id));
}

#[test]
fn drop_policy_handlers_do_not_follow_a_replacement() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    CALLS.store(0, Ordering::SeqCst);

    let mut plan = Plan::new();
    let mut old = build_task("replace::concrete_old");
    old.when_finalized(Arc::new(|_| { CALLS.fetch_add(1, Ordering::SeqCst); }), OnReplace::Drop);
    let old_id = plan.add(old);
    let new = build_task("replace::concrete_new");
    let new_id = plan.add(new);

    replace::replace_by(&mut plan, old_id, new_id).expect("replacement targets exist");
    plan.remove_task(new_id);
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}
