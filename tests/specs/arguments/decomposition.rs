// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use indexmap::IndexMap;

#[test]
fn setter_decomposes_one_requested_key_into_several_writes() {
    let mut args = Arguments::new();
    args.set_setter(
        "zone",
        Arc::new(|_, zone| {
            let zone = zone.as_str().unwrap_or_default().to_string();
            let region = zone.split('-').next().unwrap_or("").to_string();
            vec![("region".to_string(), ArgWrite::Set(json!(region))), ("zone".to_string(), ArgWrite::Set(json!(zone)))]
        }),
    );

    let mut requested = IndexMap::new();
    requested.insert("zone".to_string(), ArgValue::Concrete(json!("us-east-1a")));
    args.assign_arguments(&requested).expect("setter writes agree with the direct request");

    assert_eq!(args.concrete("zone"), Some(&json!("us-east-1a")));
    assert_eq!(args.concrete("region"), Some(&json!("us")));
}

#[test]
fn setter_writing_a_different_value_for_its_own_key_rolls_back() {
    let mut args = Arguments::new();
    args.set_raw("zone", ArgValue::Concrete(json!("eu-west-1a")));
    args.set_setter("zone", Arc::new(|_, _| vec![("zone".to_string(), ArgWrite::Set(json!("overridden")))]));

    let mut requested = IndexMap::new();
    requested.insert("zone".to_string(), ArgValue::Concrete(json!("us-east-1a")));
    let err = args.assign_arguments(&requested).unwrap_err();
    assert!(matches!(err, pek_core::StructuralError::ArgumentConflict { .. }));

    // Nothing was committed: the pre-call value survives untouched.
    assert_eq!(args.concrete("zone"), Some(&json!("eu-west-1a")));
}

#[test]
fn clear_write_removes_the_key_from_the_final_state() {
    let mut args = Arguments::new();
    args.set_setter("retry", Arc::new(|_, _| vec![("backoff".to_string(), ArgWrite::Clear)]));
    args.set_raw("backoff", ArgValue::Concrete(json!(30)));

    let mut requested = IndexMap::new();
    requested.insert("retry".to_string(), ArgValue::Concrete(json!(true)));
    args.assign_arguments(&requested).expect("no conflicting request on backoff");

    assert_eq!(args.concrete("backoff"), None);
}

#[test]
fn meaningful_arguments_excludes_values_equal_to_their_declared_default() {
    let mut args = Arguments::new();
    args.set_default("retries", json!(3));
    args.set_raw("retries", ArgValue::Concrete(json!(3)));
    args.set_raw("target", ArgValue::Concrete(json!("warehouse-1")));

    let meaningful = args.meaningful_arguments();
    assert_eq!(meaningful.get("target"), Some(&json!("warehouse-1")));
    assert_eq!(meaningful.get("retries"), None);
}

struct FixedDelayed(Value);

impl pek_core::DelayedArgument for FixedDelayed {
    fn evaluate_delayed_argument(&self, _task: &Task) -> Option<Value> {
        Some(self.0.clone())
    }
}

#[test]
fn freeze_delayed_arguments_resolves_into_concrete_values() {
    let task = build_task("arguments::probe");
    let mut args = Arguments::new();
    args.set_raw("target", ArgValue::Delayed(Arc::new(FixedDelayed(json!("dock-7")))));
    assert!(!args.is_static());

    args.freeze_delayed_arguments(&task).expect("delayed argument resolves with no conflict");
    assert_eq!(args.concrete("target"), Some(&json!("dock-7")));
    assert!(args.is_static());
}
