// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A task's per-symbol event generator.

use crate::event::{EventGenerator, EventSymbol, GeneratorId};
use std::ops::{Deref, DerefMut};

crate::define_id! {
    /// Identifies a [`crate::task::Task`]; also used as the `TaskId`
    /// endpoint of task-level relations (dependency, error-handling).
    pub struct TaskId("tsk-");
}

/// A specialization of [`EventGenerator`] bound to a task and identified by
/// a symbol within the task's event namespace. Inherits all generator
/// fields (via `Deref`); additionally carries the flags the task model
/// derives for this symbol.
pub struct TaskEventGenerator {
    pub task: TaskId,
    pub symbol: EventSymbol,
    pub terminal: bool,
    pub failure: bool,
    pub success: bool,
    generator: EventGenerator,
}

impl TaskEventGenerator {
    pub fn new(
        task: TaskId,
        symbol: EventSymbol,
        controllable: bool,
        terminal: bool,
        failure: bool,
        success: bool,
    ) -> Self {
        let id = GeneratorId::new();
        Self {
            task,
            symbol: symbol.clone(),
            terminal,
            failure,
            success,
            generator: EventGenerator::new(id, Some(symbol), controllable),
        }
    }

    pub fn id(&self) -> GeneratorId {
        self.generator.id
    }
}

impl Deref for TaskEventGenerator {
    type Target = EventGenerator;

    fn deref(&self) -> &Self::Target {
        &self.generator
    }
}

impl DerefMut for TaskEventGenerator {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.generator
    }
}

#[cfg(test)]
#[path = "task_event_tests.rs"]
mod tests;
