// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use pek_engine::Query;

#[test]
fn model_name_and_mission_combine_with_and() {
    let mut plan = Plan::new();
    let mover = build_task("query::mover");
    let mover_id = plan.add(mover);
    plan.add_mission_task(mover_id);

    let other_mover = build_task("query::mover");
    let other_id = plan.add(other_mover);

    let lifter = build_task("query::lifter");
    let lifter_id = plan.add(lifter);
    plan.add_mission_task(lifter_id);

    let query = Query::with_model_name("query::mover") & Query::mission();
    let matches: Vec<_> = query.each(&plan).collect();
    assert_eq!(matches, vec![mover_id]);
    assert!(!matches.contains(&other_id));
    assert!(!matches.contains(&lifter_id));
}

#[test]
fn not_inverts_a_predicate() {
    let mut plan = Plan::new();
    let mover = build_task("query::mover");
    let mover_id = plan.add(mover);
    plan.add_mission_task(mover_id);
    let lifter = build_task("query::lifter");
    let lifter_id = plan.add(lifter);

    let non_mission: Vec<_> = (!Query::mission()).each(&plan).collect();
    assert_eq!(non_mission, vec![lifter_id]);
}

#[test]
fn or_of_two_scopes_is_local_if_either_side_is() {
    let global = Query::all();
    let local = Query::all().local();
    assert_eq!((global.clone() | local.clone()).scope(), pek_engine::query::Scope::Local);
    assert_eq!((global.clone() & local).scope(), pek_engine::query::Scope::Local);
    assert_eq!((global.clone() | global).scope(), pek_engine::query::Scope::Global);
}

#[test]
fn local_scope_restricts_to_the_reachable_subplan() {
    let mut plan = Plan::new();
    let root = build_task("query::root");
    let root_id = plan.add(root);
    plan.add_mission_task(root_id);

    let orphan = build_task("query::orphan");
    let orphan_id = plan.add(orphan);

    let matches: Vec<_> = Query::all().local().each(&plan).collect();
    assert!(matches.contains(&root_id));
    assert!(!matches.contains(&orphan_id));
}
