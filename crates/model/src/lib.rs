// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task-model declaration surface: a fluent builder over
//! [`pek_core::TaskModel`] plus a declarative `task_model!` macro — a
//! declarative layer sitting above `pek-core`'s plain schema structs.
//!
//! This crate owns no execution semantics — it only builds the schema
//! objects `pek_core::Task`s are instantiated from.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod builder;

pub use builder::TaskModelBuilder;
pub use pek_core::model::{ArgumentDecl, EventDecl, RelationDecl, ServiceTag, TaskModel};

/// Declares a task model using its declaration vocabulary:
/// `argument`, `event`, `signal`, `forward`, `causal_link`, `abstract_model`,
/// `provides`. Expands to a call chain against [`TaskModelBuilder`].
///
/// ```ignore
/// let mover = task_model! {
///     name: "Mover",
///     argument("target", default: None),
///     event("arrived", controllable: false, terminal: true),
///     forward("arrived" => "success"),
///     provides("movable"),
/// };
/// ```
#[macro_export]
macro_rules! task_model {
    (name: $name:expr $(, $($rest:tt)*)?) => {
        $crate::task_model!(@build $crate::TaskModelBuilder::new($name) $(, $($rest)*)?)
    };
    (@build $builder:expr $(,)?) => { $builder.build() };
    (@build $builder:expr, argument($arg:expr, default: $default:expr) $(, $($rest:tt)*)?) => {
        $crate::task_model!(@build $builder.argument($arg, $default) $(, $($rest)*)?)
    };
    (@build $builder:expr, event($sym:expr, controllable: $ctl:expr, terminal: $term:expr) $(, $($rest:tt)*)?) => {
        $crate::task_model!(@build $builder.event($sym, $ctl, $term) $(, $($rest)*)?)
    };
    (@build $builder:expr, signal($from:expr => $to:expr) $(, $($rest:tt)*)?) => {
        $crate::task_model!(@build $builder.signal($from, $to) $(, $($rest)*)?)
    };
    (@build $builder:expr, forward($from:expr => $to:expr) $(, $($rest:tt)*)?) => {
        $crate::task_model!(@build $builder.forward($from, $to) $(, $($rest)*)?)
    };
    (@build $builder:expr, causal_link($from:expr => $to:expr) $(, $($rest:tt)*)?) => {
        $crate::task_model!(@build $builder.causal_link($from, $to) $(, $($rest)*)?)
    };
    (@build $builder:expr, abstract_model() $(, $($rest:tt)*)?) => {
        $crate::task_model!(@build $builder.abstract_model() $(, $($rest)*)?)
    };
    (@build $builder:expr, provides($service:expr) $(, $($rest:tt)*)?) => {
        $crate::task_model!(@build $builder.provides($service) $(, $($rest)*)?)
    };
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
