// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pek_core::FakeClock;

#[test]
fn fetch_starting_cascades_to_deliver_running() {
    let DemoPlan { mut plan, fetch_start, fetch_id, deliver_id } = build_demo_plan();
    let mut engine = Engine::new(FakeClock::new());

    let aggregate = engine.run_cycle(&mut plan, vec![(fetch_start, json!(null))]);
    assert!(aggregate.is_empty());

    let fetch = plan.task(fetch_id).unwrap();
    assert!(fetch.success());
    let deliver = plan.task(deliver_id).unwrap();
    assert!(deliver.running());
}

#[test]
fn report_reflects_mission_flag() {
    let DemoPlan { plan, fetch_id, deliver_id, .. } = build_demo_plan();
    let tasks = report(&plan, &[fetch_id, deliver_id]);
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.mission));
}
