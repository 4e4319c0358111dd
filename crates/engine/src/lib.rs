// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execution engine: transactions, the cycle loop, garbage collection,
//! replacement operators, the query combinator tree, and log/replay. The
//! data model itself (`Task`, `Plan`, relation graphs) lives in `pek-core`.

pub mod dump;
pub mod engine;
pub mod error;
pub mod gc;
pub mod log;
pub mod propagation;
pub mod query;
pub mod replace;
pub mod transaction;

pub use engine::Engine;
pub use error::{AggregateError, Localization, LocalizedError, PlanError};
pub use log::{LogEntry, PlanRebuilder};
pub use propagation::{PropagationEntry, PropagationKind};
pub use query::Query;
pub use transaction::{RelationKind, Transaction};
