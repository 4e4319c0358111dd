// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fluent builder for [`pek_core::TaskModel`].

use pek_core::model::{ArgumentDecl, EventDecl, RelationDecl, TaskModel};
use pek_core::EventSymbol;
use std::sync::Arc;

/// Builds a [`TaskModel`] one declaration at a time. Each method mirrors a
/// bullet of the task-model declaration surface.
#[derive(Default)]
pub struct TaskModelBuilder {
    model: TaskModel,
}

impl TaskModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { model: TaskModel::new(name) }
    }

    pub fn argument(mut self, name: impl Into<String>, default: Option<serde_json::Value>) -> Self {
        self.model.arguments.push(ArgumentDecl { name: name.into(), default });
        self
    }

    pub fn event(mut self, name: impl Into<EventSymbol>, controllable: bool, terminal: bool) -> Self {
        self.model.events.push(EventDecl { symbol: name.into(), controllable, terminal });
        self
    }

    pub fn signal(mut self, from: impl Into<EventSymbol>, to: impl Into<EventSymbol>) -> Self {
        self.model.signals.insert(RelationDecl { from: from.into(), to: to.into() });
        self
    }

    pub fn forward(mut self, from: impl Into<EventSymbol>, to: impl Into<EventSymbol>) -> Self {
        self.model.forwards.insert(RelationDecl { from: from.into(), to: to.into() });
        self
    }

    pub fn causal_link(mut self, from: impl Into<EventSymbol>, to: impl Into<EventSymbol>) -> Self {
        self.model.causal_links.insert(RelationDecl { from: from.into(), to: to.into() });
        self
    }

    pub fn abstract_model(mut self) -> Self {
        self.model.abstract_model = true;
        self
    }

    pub fn provides(mut self, service: impl Into<String>) -> Self {
        self.model.provides.push(service.into());
        self
    }

    pub fn fullfilled_model(mut self, services: impl IntoIterator<Item = String>) -> Self {
        self.model.fullfilled_model.extend(services);
        self
    }

    pub fn parent(mut self, parent: Arc<TaskModel>) -> Self {
        self.model.parent = Some(parent);
        self
    }

    pub fn build(self) -> TaskModel {
        self.model
    }

    pub fn build_arc(self) -> Arc<TaskModel> {
        Arc::new(self.model)
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
