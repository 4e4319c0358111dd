// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event generators and the events they emit.

use crate::task::Task;
use serde_json::Value;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

crate::define_id! {
    /// Identifies one emitted [`Event`] record.
    pub struct EventId("evt-");
}

crate::define_id! {
    /// Identifies one [`EventGenerator`] (free or task-owned).
    pub struct GeneratorId("gen-");
}

/// The name of an event within a task's (or a free generator's) namespace.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventSymbol(SmolStr);

impl EventSymbol {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn start() -> Self {
        Self::new("start")
    }

    pub fn stop() -> Self {
        Self::new("stop")
    }

    pub fn success() -> Self {
        Self::new("success")
    }

    pub fn failed() -> Self {
        Self::new("failed")
    }

    pub fn aborted() -> Self {
        Self::new("aborted")
    }

    pub fn internal_error() -> Self {
        Self::new("internal_error")
    }

    pub fn updated_data() -> Self {
        Self::new("updated_data")
    }

    pub fn poll_transition() -> Self {
        Self::new("poll_transition")
    }
}

impl fmt::Display for EventSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl fmt::Debug for EventSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventSymbol({})", self.0)
    }
}

impl From<&str> for EventSymbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Why a generator became unreachable — explicit failure, a linked
/// `achieve_with` source giving up, or the owning object going away.
#[derive(Debug, Clone)]
pub enum UnreachableCause {
    /// `emit_failed(reason)` was called directly.
    EmitFailed(String),
    /// The generator this one was `achieve_with`-linked to became
    /// unreachable before emitting.
    AchieveSourceUnreachable(GeneratorId),
    /// The owning plan object was finalized without this generator ever
    /// emitting.
    Finalized,
    /// The plan garbage-collected the owning object.
    GarbageCollected,
}

impl fmt::Display for UnreachableCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreachableCause::EmitFailed(reason) => write!(f, "emit_failed: {reason}"),
            UnreachableCause::AchieveSourceUnreachable(id) => {
                write!(f, "achieve_with source {id} became unreachable")
            }
            UnreachableCause::Finalized => write!(f, "generator finalized without emitting"),
            UnreachableCause::GarbageCollected => write!(f, "owning object garbage-collected"),
        }
    }
}

/// Whether a handler registered on an event survives a `replace_by`/
/// `replace_subplan_by` onto the corresponding event of the replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnReplace {
    Copy,
    Drop,
}

/// The error a command closure fails with — opaque, wrapped by the engine's
/// `CommandFailed` localized error at the call site.
pub type CommandError = Box<dyn std::error::Error + Send + Sync>;

/// A controllable generator's command: invoked by `call`, must itself emit
/// or fail. Modeled as a closure rather than a trait object to keep ad hoc
/// test commands lightweight.
pub type Command = Arc<dyn Fn(&mut Task, &Value) -> Result<(), CommandError> + Send + Sync>;

pub type EmitHandler = Arc<dyn Fn(&Event) + Send + Sync>;
pub type UnreachableHandler = Arc<dyn Fn(&UnreachableCause) + Send + Sync>;
pub type FinalizedHandler = Arc<dyn Fn() + Send + Sync>;

struct Registered<H> {
    handler: H,
    on_replace: OnReplace,
    /// Only meaningful for `if_unreachable` handlers.
    cancel_at_emission: bool,
}

/// An immutable record produced by one emission. Provenance beyond
/// `direct_sources` (transitive closure, task-only sources) is derived by
/// walking the owning plan's event arena, not stored here.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub generator: GeneratorId,
    pub propagation_id: u64,
    pub time: Instant,
    pub context: Value,
    pub direct_sources: Vec<EventId>,
}

/// A named point from which concrete [`Event`]s may be emitted.
pub struct EventGenerator {
    pub id: GeneratorId,
    pub symbol: Option<EventSymbol>,
    pub controllable: bool,
    command: Option<Command>,
    history: Vec<EventId>,
    unreachable: Option<UnreachableCause>,
    on_emit: Vec<Registered<EmitHandler>>,
    if_unreachable: Vec<Registered<UnreachableHandler>>,
    when_finalized: Vec<Registered<FinalizedHandler>>,
    finalized_fired: bool,
}

impl fmt::Debug for EventGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventGenerator")
            .field("id", &self.id)
            .field("symbol", &self.symbol)
            .field("controllable", &self.controllable)
            .field("history", &self.history)
            .field("unreachable", &self.unreachable.is_some())
            .finish()
    }
}

impl EventGenerator {
    pub fn new(id: GeneratorId, symbol: Option<EventSymbol>, controllable: bool) -> Self {
        Self {
            id,
            symbol,
            controllable,
            command: None,
            history: Vec::new(),
            unreachable: None,
            on_emit: Vec::new(),
            if_unreachable: Vec::new(),
            when_finalized: Vec::new(),
            finalized_fired: false,
        }
    }

    pub fn set_command(&mut self, command: Command) {
        self.command = Some(command);
    }

    pub fn has_command(&self) -> bool {
        self.command.is_some()
    }

    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }

    /// `emitted?` — monotonic: once history is non-empty it never becomes
    /// empty again.
    pub fn emitted(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history(&self) -> &[EventId] {
        &self.history
    }

    pub fn last_event(&self) -> Option<EventId> {
        self.history.last().copied()
    }

    pub fn is_unreachable(&self) -> bool {
        self.unreachable.is_some()
    }

    pub fn unreachable_cause(&self) -> Option<&UnreachableCause> {
        self.unreachable.as_ref()
    }

    pub fn on_emit(&mut self, handler: EmitHandler, on_replace: OnReplace) {
        self.on_emit.push(Registered { handler, on_replace, cancel_at_emission: false });
    }

    pub fn if_unreachable(
        &mut self,
        handler: UnreachableHandler,
        cancel_at_emission: bool,
        on_replace: OnReplace,
    ) {
        self.if_unreachable.push(Registered { handler, on_replace, cancel_at_emission });
    }

    pub fn when_finalized(&mut self, handler: FinalizedHandler, on_replace: OnReplace) {
        self.when_finalized.push(Registered { handler, on_replace, cancel_at_emission: false });
    }

    /// Appends `event` to history and runs `on_emit` handlers in
    /// registration order. Does not perform executability checks — the
    /// caller (the engine / `Task`) is responsible for those.
    pub fn record_emission(&mut self, event: &Event) {
        self.history.push(event.id);
        for reg in &self.on_emit {
            (reg.handler)(event);
        }
    }

    /// Marks the generator unreachable, running `if_unreachable` handlers
    /// that were not cancelled by an emission. Idempotent: a generator can
    /// only become unreachable once.
    pub fn mark_unreachable(&mut self, cause: UnreachableCause) {
        if self.unreachable.is_some() {
            return;
        }
        for reg in &self.if_unreachable {
            if reg.cancel_at_emission && self.emitted() {
                continue;
            }
            (reg.handler)(&cause);
        }
        self.unreachable = Some(cause);
    }

    /// Runs `when_finalized` handlers exactly once.
    pub fn finalize(&mut self) {
        if self.finalized_fired {
            return;
        }
        self.finalized_fired = true;
        for reg in &self.when_finalized {
            (reg.handler)();
        }
    }

    /// Copies handlers whose `on_replace` policy is `Copy` onto `target`.
    pub fn copy_replaceable_handlers_to(&self, target: &mut EventGenerator) {
        for reg in &self.on_emit {
            if reg.on_replace == OnReplace::Copy {
                target.on_emit(reg.handler.clone(), OnReplace::Copy);
            }
        }
        for reg in &self.if_unreachable {
            if reg.on_replace == OnReplace::Copy {
                target.if_unreachable(reg.handler.clone(), reg.cancel_at_emission, OnReplace::Copy);
            }
        }
        for reg in &self.when_finalized {
            if reg.on_replace == OnReplace::Copy {
                target.when_finalized(reg.handler.clone(), OnReplace::Copy);
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
