// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A small in-process query combinator tree over `&Plan` — a combinator
//! tree rather than a wire query, since there is no distributed layer here.
//!
//! `:local` restricts matches to tasks reachable from the mission/permanent
//! roots (the set [`crate::gc::reachable_from_roots`] keeps alive); there
//! being no distributed plan owner in this kernel, `:global` is simply "no
//! restriction" — the whole plan's task arena.

use crate::gc;
use pek_core::{Plan, TaskId};
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

/// Whether a query considers the whole plan or only the currently-reachable
/// subplan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
}

type Predicate = Arc<dyn Fn(&Plan, TaskId) -> bool + Send + Sync>;

/// A composable task matcher. Combine with `&`, `|`, `!`.
#[derive(Clone)]
pub struct Query {
    predicate: Predicate,
    scope: Scope,
}

impl Query {
    pub fn new(predicate: impl Fn(&Plan, TaskId) -> bool + Send + Sync + 'static) -> Self {
        Self { predicate: Arc::new(predicate), scope: Scope::Global }
    }

    /// Matches every task (the identity of `&`, the empty plan-wide scan).
    pub fn all() -> Self {
        Self::new(|_, _| true)
    }

    pub fn with_model_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |plan, id| plan.task(id).is_some_and(|t| t.model.name == name))
    }

    pub fn with_argument(name: impl Into<String>, value: serde_json::Value) -> Self {
        let name = name.into();
        Self::new(move |plan, id| plan.task(id).and_then(|t| t.arguments().concrete(&name)).is_some_and(|v| v == &value))
    }

    pub fn mission() -> Self {
        Self::new(|plan, id| plan.is_mission(id))
    }

    pub fn running() -> Self {
        Self::new(|plan, id| plan.task(id).is_some_and(|t| t.running()))
    }

    pub fn failed() -> Self {
        Self::new(|plan, id| plan.task(id).is_some_and(|t| t.failed()))
    }

    pub fn local(mut self) -> Self {
        self.scope = Scope::Local;
        self
    }

    pub fn global(mut self) -> Self {
        self.scope = Scope::Global;
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn matches(&self, plan: &Plan, id: TaskId) -> bool {
        (self.predicate)(plan, id)
    }

    /// Every task id in `plan` that matches, in arena iteration order,
    /// restricted to the reachable subplan when `scope` is `Local`.
    pub fn each<'p>(&self, plan: &'p Plan) -> impl Iterator<Item = TaskId> + 'p {
        let local_set = if self.scope == Scope::Local { Some(gc::reachable_from_roots(plan)) } else { None };
        let predicate = self.predicate.clone();
        plan.tasks()
            .map(|(id, _)| *id)
            .filter(move |id| local_set.as_ref().map_or(true, |set| set.contains(id)))
            .filter(move |id| predicate(plan, *id))
    }
}

impl BitAnd for Query {
    type Output = Query;

    fn bitand(self, rhs: Query) -> Query {
        let scope = if self.scope == Scope::Local || rhs.scope == Scope::Local { Scope::Local } else { Scope::Global };
        let (a, b) = (self.predicate, rhs.predicate);
        Query { predicate: Arc::new(move |plan, id| a(plan, id) && b(plan, id)), scope }
    }
}

impl BitOr for Query {
    type Output = Query;

    fn bitor(self, rhs: Query) -> Query {
        let scope = if self.scope == Scope::Local || rhs.scope == Scope::Local { Scope::Local } else { Scope::Global };
        let (a, b) = (self.predicate, rhs.predicate);
        Query { predicate: Arc::new(move |plan, id| a(plan, id) || b(plan, id)), scope }
    }
}

impl Not for Query {
    type Output = Query;

    fn not(self) -> Query {
        let a = self.predicate;
        Query { predicate: Arc::new(move |plan, id| !a(plan, id)), scope: self.scope }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
