// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders for tests and downstream crates' test suites (`--features
//! test-support`).

use crate::argument::Arguments;
use crate::model::TaskModel;
use crate::task::Task;
use std::sync::Arc;

/// A bare task with a throwaway model, for tests that only care about the
/// generic state machine. The production task-model declaration surface
/// (the fluent builder real task models are built with) lives in
/// `pek-model`, which depends on this crate rather than the reverse.
pub fn blank_task() -> Task {
    Task::new(Arc::new(TaskModel::new("test_support::blank")), Arguments::new())
}

pub fn task_with_model(model: Arc<TaskModel>) -> Task {
    Task::new(model, Arguments::new())
}
