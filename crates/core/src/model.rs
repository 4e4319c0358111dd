// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task model schema: argument declarations (with optional defaults),
//! declared events (with controllable/terminal flags), and model-level
//! relation declarations (`signal`, `forward`, `causal_link`). Submodels
//! inherit.
//!
//! This module owns the schema *data*; `pek-model` provides the fluent
//! declaration surface that builds it, resolving into these types the way
//! a declarative job-definition layer resolves into runtime job structs.

use crate::event::EventSymbol;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A declared argument: its name and optional default value.
#[derive(Debug, Clone)]
pub struct ArgumentDecl {
    pub name: String,
    pub default: Option<Value>,
}

/// A declared event: symbol plus controllable/terminal flags.
#[derive(Debug, Clone)]
pub struct EventDecl {
    pub symbol: EventSymbol,
    pub controllable: bool,
    pub terminal: bool,
}

/// One model-level relation declaration between two event symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelationDecl {
    pub from: EventSymbol,
    pub to: EventSymbol,
}

/// A service tag a model declares it `provides`.
pub type ServiceTag = String;

/// The schema a [`crate::task::Task`] is instantiated from.
#[derive(Debug, Clone, Default)]
pub struct TaskModel {
    pub name: String,
    pub arguments: Vec<ArgumentDecl>,
    pub events: Vec<EventDecl>,
    pub signals: BTreeSet<RelationDecl>,
    pub forwards: BTreeSet<RelationDecl>,
    pub causal_links: BTreeSet<RelationDecl>,
    pub abstract_model: bool,
    pub provides: Vec<ServiceTag>,
    pub fullfilled_model: Vec<ServiceTag>,
    /// Submodel inheritance: flattened lazily by the accessor methods
    /// below rather than copied at declaration time.
    pub parent: Option<Arc<TaskModel>>,
}

impl TaskModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// All argument declarations, parent-first (a child's declaration of
    /// the same name overrides the parent's).
    pub fn all_arguments(&self) -> Vec<ArgumentDecl> {
        let mut out = match &self.parent {
            Some(p) => p.all_arguments(),
            None => Vec::new(),
        };
        for decl in &self.arguments {
            out.retain(|d: &ArgumentDecl| d.name != decl.name);
            out.push(decl.clone());
        }
        out
    }

    pub fn all_events(&self) -> Vec<EventDecl> {
        let mut out = match &self.parent {
            Some(p) => p.all_events(),
            None => Vec::new(),
        };
        for decl in &self.events {
            out.retain(|d: &EventDecl| d.symbol != decl.symbol);
            out.push(decl.clone());
        }
        out
    }

    pub fn all_signals(&self) -> BTreeSet<RelationDecl> {
        let mut out = match &self.parent {
            Some(p) => p.all_signals(),
            None => BTreeSet::new(),
        };
        out.extend(self.signals.iter().copied());
        out
    }

    pub fn all_forwards(&self) -> BTreeSet<RelationDecl> {
        let mut out = match &self.parent {
            Some(p) => p.all_forwards(),
            None => BTreeSet::new(),
        };
        out.extend(self.forwards.iter().copied());
        out
    }

    pub fn all_causal_links(&self) -> BTreeSet<RelationDecl> {
        let mut out = match &self.parent {
            Some(p) => p.all_causal_links(),
            None => BTreeSet::new(),
        };
        out.extend(self.causal_links.iter().copied());
        out
    }

    pub fn event_decl(&self, symbol: &EventSymbol) -> Option<EventDecl> {
        self.all_events().into_iter().find(|e| &e.symbol == symbol)
    }

    pub fn provides_service(&self, tag: &str) -> bool {
        self.provides.iter().any(|t| t == tag)
            || self.parent.as_ref().is_some_and(|p| p.provides_service(tag))
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
