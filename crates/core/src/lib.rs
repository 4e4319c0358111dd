// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data model for the plan execution kernel: stable ids, the argument
//! system, event generators, tasks, relation graphs, and the plan itself.
//!
//! This crate holds no scheduling logic — the execution engine, query
//! engine, transactions, and replacement operators live in `pek-engine`.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod argument;
pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod macros;
pub mod model;
pub mod plan;
pub mod relation;
pub mod task;
pub mod task_event;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use argument::{ArgValue, ArgWrite, Arguments, DelayedArgument};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::StructuralError;
pub use event::{Event, EventGenerator, EventId, EventSymbol, GeneratorId, OnReplace, UnreachableCause};
pub use id::IdBuf;
pub use model::TaskModel;
pub use plan::{GeneratorOwner, Plan};
pub use relation::Graph;
pub use task::{CallError, Task, TaskOutcome, TaskStatus};
pub use task_event::{TaskEventGenerator, TaskId};
