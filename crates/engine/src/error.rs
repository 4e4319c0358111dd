// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Localized execution errors and their aggregate, plus the engine-facing
//! `PlanError` that wraps both error families.

use pek_core::{EventId, GeneratorId, StructuralError, TaskId};
use thiserror::Error;

/// Where a [`LocalizedError`] is rooted: a failed event, generator, or
/// task, derived when possible rather than always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Localization {
    pub event: Option<EventId>,
    pub generator: Option<GeneratorId>,
    pub task: Option<TaskId>,
}

impl Localization {
    pub fn task(task: TaskId) -> Self {
        Self { task: Some(task), ..Default::default() }
    }

    pub fn generator(generator: GeneratorId) -> Self {
        Self { generator: Some(generator), ..Default::default() }
    }
}

/// Execution errors raised into the engine via `add_error` and propagated
/// through the error-handling relation; unhandled errors cause the failing
/// task and its parents to be garbage-collected.
///
/// Not `Clone`: `CommandFailed` wraps an opaque boxed command error.
#[derive(Debug, Error)]
pub enum LocalizedError {
    #[error("command failed at {localization:?}: {source}")]
    CommandFailed { localization: Localization, #[source] source: Box<dyn std::error::Error + Send + Sync> },

    #[error("emission failed at {localization:?}: {reason}")]
    EmissionFailed { localization: Localization, reason: String },

    #[error("generator became unreachable: {localization:?}")]
    UnreachableEvent { localization: Localization },

    #[error("child task failed, parent {parent} has no repair: {reason}")]
    ChildFailedError { parent: TaskId, reason: String },

    #[error("task {task} entered emergency termination: {reason}")]
    TaskEmergencyTermination { task: TaskId, reason: String },
}

impl LocalizedError {
    pub fn localization(&self) -> Option<Localization> {
        match self {
            LocalizedError::CommandFailed { localization, .. }
            | LocalizedError::EmissionFailed { localization, .. }
            | LocalizedError::UnreachableEvent { localization } => Some(*localization),
            LocalizedError::ChildFailedError { parent, .. } => Some(Localization::task(*parent)),
            LocalizedError::TaskEmergencyTermination { task, .. } => Some(Localization::task(*task)),
        }
    }
}

/// The set of localized errors produced by one propagation pass,
/// order-preserving.
#[derive(Debug, Default)]
pub struct AggregateError {
    pub errors: Vec<LocalizedError>,
    /// Indices into `errors` that are already transitively referenced by
    /// another error in the set (and so may be filtered by the consumer).
    pub original_exceptions: Vec<usize>,
}

impl AggregateError {
    pub fn push(&mut self, error: LocalizedError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors with the transitively-referenced ones filtered out.
    pub fn unreferenced(&self) -> impl Iterator<Item = &LocalizedError> {
        self.errors.iter().enumerate().filter(|(i, _)| !self.original_exceptions.contains(i)).map(|(_, e)| e)
    }
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} localized error(s) during propagation", self.errors.len())
    }
}

impl std::error::Error for AggregateError {}

/// The error surface a caller of plan-mutation or engine-driving APIs sees.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Localized(#[from] LocalizedError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
