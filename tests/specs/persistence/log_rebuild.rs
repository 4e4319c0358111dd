// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use pek_engine::{LogEntry, PlanRebuilder};

fn entries() -> Vec<LogEntry> {
    let a = TaskId::new();
    let b = TaskId::new();
    vec![
        LogEntry::new("mission", 0, 0, json!({"task": a.to_string()})),
        LogEntry::new("permanent_task", 0, 1, json!({"task": b.to_string()})),
        LogEntry::new("event_emitted", 1, 0, json!({"task": a.to_string(), "symbol": "start"})),
        LogEntry::new("event_emitted", 1, 5, json!({"task": a.to_string(), "symbol": "success"})),
        LogEntry::new("task_finalized", 2, 0, json!({"task": a.to_string()})),
        LogEntry::new("task_garbaged", 3, 0, json!({"task": b.to_string()})),
    ]
}

#[test]
fn rebuild_replays_the_full_stream_into_derived_state() {
    let log = entries();
    let a = log[0].args["task"].as_str().unwrap().to_string();
    let b = log[1].args["task"].as_str().unwrap().to_string();
    let a = TaskId::from_string(a);
    let b = TaskId::from_string(b);

    let state = PlanRebuilder::rebuild(&log);
    // `a` was finalized: deregistered from mission/emitted as part of
    // finalization, even though it emitted two events beforehand.
    assert!(!state.mission_tasks.contains(&a));
    assert!(state.finalized.contains(&a));
    assert!(!state.emitted.contains_key(&a));

    // `b` was never finalized directly, only garbage-collected, which
    // also deregisters it and marks it both finalized and garbaged.
    assert!(!state.permanent_tasks.contains(&b));
    assert!(state.finalized.contains(&b));
    assert!(state.garbaged.contains(&b));
}

#[test]
fn rebuild_prefix_reconstructs_an_earlier_point_in_the_stream() {
    let log = entries();
    let a = TaskId::from_string(log[0].args["task"].as_str().unwrap());

    // Stop right after the two `event_emitted` entries, before finalization.
    let state = PlanRebuilder::rebuild_prefix(&log, 4);
    assert!(state.mission_tasks.contains(&a));
    assert_eq!(state.emitted.get(&a), Some(&vec!["start".to_string(), "success".to_string()]));
    assert!(!state.finalized.contains(&a));
}

#[test]
fn rebuild_prefix_clamps_an_out_of_range_length() {
    let log = entries();
    let full = PlanRebuilder::rebuild(&log);
    let clamped = PlanRebuilder::rebuild_prefix(&log, log.len() * 10);
    assert_eq!(full.finalized, clamped.finalized);
    assert_eq!(full.garbaged, clamped.garbaged);
}
