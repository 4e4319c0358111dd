// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tasks: long-lived activities with a lifecycle, owning a map of
//! per-symbol event generators and a validated arguments map.

use crate::argument::Arguments;
use crate::error::StructuralError;
use crate::event::{CommandError, Event, EventSymbol, OnReplace};
use crate::model::TaskModel;
use crate::task_event::{TaskEventGenerator, TaskId};
use indexmap::IndexMap;
use std::sync::Arc;

/// The task's lifecycle state. The terminal outcome (success/failure kind)
/// is tracked orthogonally in [`TaskOutcome`] so `executable?` composes
/// independently of *why* a task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Starting,
    Running,
    Finishing,
    Finished,
}

/// Why a finished task stopped. At most one applies: a task's history
/// carries at most one terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
    FailedToStart,
    InternalError,
}

pub type PollError = Box<dyn std::error::Error + Send + Sync>;
pub type PollHandler = Arc<dyn Fn(&mut Task) -> Result<(), PollError> + Send + Sync>;
pub type ExecuteHandler = Arc<dyn Fn(&mut Task) -> Result<(), PollError> + Send + Sync>;
pub type FinalizationHandler = Arc<dyn Fn(&mut Task) + Send + Sync>;

/// A handler registered with [`Task::on`]: unlike a generator's generic
/// `on_emit` (observer-only, used for free-standing events with no owning
/// task), a task-level on-emit handler gets `&mut Task` and may itself
/// request further emissions via [`Task::request_emit`].
pub type TaskEmitHandler = Arc<dyn Fn(&mut Task, &Event) + Send + Sync>;

struct Registered<H> {
    handler: H,
    on_replace: OnReplace,
}

struct ExecuteSlot {
    handler: ExecuteHandler,
    on_replace: OnReplace,
    ran: bool,
}

/// A long-lived activity with a lifecycle. Owns a map from [`EventSymbol`]
/// to [`TaskEventGenerator`] and a validated [`Arguments`] map.
pub struct Task {
    pub id: TaskId,
    pub model: Arc<TaskModel>,
    arguments: Arguments,
    events: IndexMap<EventSymbol, TaskEventGenerator>,
    status: TaskStatus,
    outcome: Option<TaskOutcome>,
    abstract_override: Option<bool>,
    reusable: bool,
    executable_forced: Option<bool>,
    failure_reason: Option<String>,
    poll_handlers: Vec<Registered<PollHandler>>,
    execute_handlers: Vec<ExecuteSlot>,
    finalization_handlers: Vec<Registered<FinalizationHandler>>,
    on_emit_handlers: IndexMap<EventSymbol, Vec<Registered<TaskEmitHandler>>>,
    /// Emissions requested by an `on_emit` handler (e.g. `stop!` called from
    /// the `start` handler) — drained by the engine into the same cycle's
    /// propagation queue right after the emission that triggered them.
    pending_emissions: Vec<EventSymbol>,
    finalized: bool,
}

/// The eight standard events materialized on every task.
pub const STANDARD_EVENTS: &[(&str, bool, bool, bool, bool)] = &[
    // (symbol, controllable, terminal, failure, success)
    ("start", true, false, false, false),
    ("stop", false, true, false, false),
    ("success", false, true, false, true),
    ("failed", false, true, true, false),
    ("aborted", false, true, true, false),
    ("internal_error", false, true, true, false),
    ("updated_data", false, false, false, false),
    ("poll_transition", false, false, false, false),
];

impl Task {
    /// Materializes the standard events plus every event the model declares
    /// (submodels included via [`TaskModel::all_events`]). Does not wire any
    /// relation edges — that is the owning [`crate::plan::Plan`]'s job, since
    /// edges live in plan-owned relation graphs, not on the task itself.
    pub fn new(model: Arc<TaskModel>, arguments: Arguments) -> Self {
        let id = TaskId::new();
        let mut events = IndexMap::new();
        for (name, controllable, terminal, failure, success) in STANDARD_EVENTS {
            let symbol = EventSymbol::new(*name);
            events.insert(
                symbol.clone(),
                TaskEventGenerator::new(id, symbol, *controllable, *terminal, *failure, *success),
            );
        }
        for decl in model.all_events() {
            events.entry(decl.symbol.clone()).or_insert_with(|| {
                TaskEventGenerator::new(id, decl.symbol.clone(), decl.controllable, decl.terminal, false, false)
            });
        }
        Self {
            id,
            model,
            arguments,
            events,
            status: TaskStatus::Pending,
            outcome: None,
            abstract_override: None,
            reusable: true,
            executable_forced: None,
            failure_reason: None,
            poll_handlers: Vec::new(),
            execute_handlers: Vec::new(),
            finalization_handlers: Vec::new(),
            on_emit_handlers: IndexMap::new(),
            pending_emissions: Vec::new(),
            finalized: false,
        }
    }

    pub fn event(&self, symbol: &EventSymbol) -> Option<&TaskEventGenerator> {
        self.events.get(symbol)
    }

    pub fn event_mut(&mut self, symbol: &EventSymbol) -> Option<&mut TaskEventGenerator> {
        self.events.get_mut(symbol)
    }

    pub fn events(&self) -> impl Iterator<Item = &TaskEventGenerator> {
        self.events.values()
    }

    pub fn events_mut(&mut self) -> impl Iterator<Item = &mut TaskEventGenerator> {
        self.events.values_mut()
    }

    /// Looks up one of this task's generators by id rather than symbol —
    /// used by cross-object wiring (achieve-with checks) that only holds a
    /// [`crate::event::GeneratorId`].
    pub fn event_by_id_mut(&mut self, id: crate::event::GeneratorId) -> Option<&mut TaskEventGenerator> {
        self.events.values_mut().find(|g| g.id() == id)
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut Arguments {
        &mut self.arguments
    }

    // --- status accessors, named as boolean predicates ---

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }

    pub fn pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn starting(&self) -> bool {
        self.status == TaskStatus::Starting
    }

    pub fn started(&self) -> bool {
        !matches!(self.status, TaskStatus::Pending | TaskStatus::Starting)
    }

    pub fn running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    pub fn finishing(&self) -> bool {
        self.status == TaskStatus::Finishing
    }

    pub fn finished(&self) -> bool {
        self.status == TaskStatus::Finished
    }

    pub fn success(&self) -> bool {
        self.outcome == Some(TaskOutcome::Success)
    }

    pub fn failed(&self) -> bool {
        matches!(
            self.outcome,
            Some(TaskOutcome::Failed) | Some(TaskOutcome::FailedToStart) | Some(TaskOutcome::InternalError)
        )
    }

    pub fn failed_to_start(&self) -> bool {
        self.outcome == Some(TaskOutcome::FailedToStart)
    }

    pub fn internal_error(&self) -> bool {
        self.outcome == Some(TaskOutcome::InternalError)
    }

    pub fn abstract_(&self) -> bool {
        self.abstract_override.unwrap_or(self.model.abstract_model)
    }

    pub fn set_abstract(&mut self, value: bool) {
        self.abstract_override = Some(value);
    }

    pub fn reusable(&self) -> bool {
        self.reusable
    }

    pub fn set_reusable(&mut self, value: bool) {
        self.reusable = value;
    }

    pub fn force_executable(&mut self, value: Option<bool>) {
        self.executable_forced = value;
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// `executable?` ⇔ plan executable ∧ not abstract ∧ fully instanciated ∧
    /// the forced flag (if set) is not `false`.
    pub fn executable(&self, plan_executable: bool) -> bool {
        if self.executable_forced == Some(false) {
            return false;
        }
        if self.executable_forced == Some(true) {
            return plan_executable;
        }
        plan_executable && !self.abstract_() && self.fully_instanciated()
    }

    pub fn fully_instanciated(&self) -> bool {
        let declared: Vec<String> = self.model.all_arguments().into_iter().map(|a| a.name).collect();
        self.arguments.fully_instanciated(&declared)
    }

    /// Evaluates remaining delayed arguments against `self`, then commits
    /// the resolved ones via `assign_arguments`. Split into
    /// collect-then-assign because a method call cannot borrow `self`
    /// immutably (for evaluation) and `self.arguments` mutably at once.
    pub fn freeze_delayed_arguments(&mut self) -> Result<(), StructuralError> {
        use crate::argument::ArgValue;
        let delayed: Vec<(String, _)> = self
            .arguments
            .iter()
            .filter_map(|(k, v)| match v {
                ArgValue::Delayed(d) => Some((k.clone(), d.clone())),
                ArgValue::Concrete(_) => None,
            })
            .collect();
        let mut resolved = IndexMap::new();
        for (name, delayed) in delayed {
            if let Some(v) = delayed.evaluate_delayed_argument(self) {
                resolved.insert(name, ArgValue::Concrete(v));
            }
        }
        if resolved.is_empty() {
            return Ok(());
        }
        self.arguments.assign_arguments(&resolved)
    }

    /// Registers a task-level on-emit handler for `symbol`: unlike the
    /// underlying generator's own `on_emit` (observer-only), this handler
    /// gets `&mut Task` and may call [`Task::request_emit`] to drive a
    /// further emission in the same cycle (e.g. emitting `stop!` from the
    /// `start` handler).
    pub fn on(&mut self, symbol: &EventSymbol, handler: TaskEmitHandler, on_replace: OnReplace) {
        self.on_emit_handlers.entry(symbol.clone()).or_default().push(Registered { handler, on_replace });
    }

    /// Requests that `symbol` be emitted on this task once the current
    /// on-emit dispatch returns. Drained by the engine (`take_pending_emissions`)
    /// and delivered within the same cycle.
    pub fn request_emit(&mut self, symbol: EventSymbol) {
        self.pending_emissions.push(symbol);
    }

    /// Drains every emission requested via `request_emit` since the last
    /// drain.
    pub fn take_pending_emissions(&mut self) -> Vec<EventSymbol> {
        std::mem::take(&mut self.pending_emissions)
    }

    pub fn poll(&mut self, handler: PollHandler, on_replace: OnReplace) {
        self.poll_handlers.push(Registered { handler, on_replace });
    }

    pub fn execute(&mut self, handler: ExecuteHandler, on_replace: OnReplace) {
        self.execute_handlers.push(ExecuteSlot { handler, on_replace, ran: false });
    }

    pub fn when_finalized(&mut self, handler: FinalizationHandler, on_replace: OnReplace) {
        self.finalization_handlers.push(Registered { handler, on_replace });
    }

    /// Runs every poll handler once, in registration order. Called by the
    /// engine each cycle the task is running.
    pub fn run_poll(&mut self) -> Result<(), PollError> {
        let handlers: Vec<PollHandler> = self.poll_handlers.iter().map(|r| r.handler.clone()).collect();
        for handler in handlers {
            handler(self)?;
        }
        Ok(())
    }

    /// Runs every execute handler that has not yet run, on the first cycle
    /// the task is running. Unlike `poll`, `execute` handlers run exactly
    /// once, not every cycle.
    pub fn run_execute_once(&mut self) -> Result<(), PollError> {
        let pending: Vec<usize> =
            self.execute_handlers.iter().enumerate().filter(|(_, s)| !s.ran).map(|(i, _)| i).collect();
        for i in pending {
            let handler = self.execute_handlers[i].handler.clone();
            handler(self)?;
            self.execute_handlers[i].ran = true;
        }
        Ok(())
    }

    /// Invokes the command bound to `symbol`'s generator. Requires
    /// controllable and `executable?`. Classifies a command failure as
    /// `failed_to_start` (no emission occurred yet on this task) or leaves
    /// classification to the caller otherwise (`internal_error` territory,
    /// which requires access to the `internal_error` generator — the
    /// engine drives that emission after observing this `Err`).
    pub fn call(
        &mut self,
        symbol: &EventSymbol,
        context: serde_json::Value,
        plan_executable: bool,
    ) -> Result<(), CallError> {
        let Some(gen) = self.events.get(symbol) else {
            return Err(CallError::Structural(StructuralError::TaskEventNotExecutable {
                task: self.id.0,
                symbol: symbol.to_string(),
                reason: "no such event".into(),
            }));
        };
        if !gen.controllable {
            return Err(CallError::Structural(StructuralError::TaskEventNotExecutable {
                task: self.id.0,
                symbol: symbol.to_string(),
                reason: "not controllable".into(),
            }));
        }
        if !self.executable(plan_executable) {
            return Err(CallError::Structural(StructuralError::TaskEventNotExecutable {
                task: self.id.0,
                symbol: symbol.to_string(),
                reason: "task is not executable".into(),
            }));
        }
        let Some(command) = gen.command().cloned() else {
            return Err(CallError::Structural(StructuralError::TaskEventNotExecutable {
                task: self.id.0,
                symbol: symbol.to_string(),
                reason: "no command bound".into(),
            }));
        };
        if *symbol == EventSymbol::start() {
            self.status = TaskStatus::Starting;
        }
        match command(self, &context) {
            Ok(()) => Ok(()),
            Err(err) => {
                let before_any_emission = !self.started();
                if before_any_emission {
                    self.status = TaskStatus::Finished;
                    self.outcome = Some(TaskOutcome::FailedToStart);
                    self.failure_reason = Some(err.to_string());
                }
                Err(CallError::Command(err))
            }
        }
    }

    /// Appends an event to `symbol`'s history, runs its `on_emit` handlers,
    /// and advances `status`/`outcome` per the task lifecycle's transition
    /// table. Does not enqueue signal/forward propagation — the engine
    /// reads the relation graphs from the owning `Plan` and does that.
    pub fn emit(&mut self, symbol: &EventSymbol, event: &Event) -> Result<(), StructuralError> {
        let Some(gen) = self.events.get_mut(symbol) else {
            return Err(StructuralError::TaskEventNotExecutable {
                task: self.id.0,
                symbol: symbol.to_string(),
                reason: "no such event".into(),
            });
        };
        let (terminal, success, failure) = (gen.terminal, gen.success, gen.failure);
        gen.record_emission(event);

        if *symbol == EventSymbol::start() {
            self.status = TaskStatus::Running;
        } else if terminal {
            self.status = TaskStatus::Finishing;
            if success {
                self.outcome = Some(TaskOutcome::Success);
            } else if failure && self.outcome.is_none() {
                self.outcome = Some(TaskOutcome::Failed);
            }
        }
        if *symbol == EventSymbol::stop() {
            self.status = TaskStatus::Finished;
        }

        let handlers: Vec<TaskEmitHandler> = self
            .on_emit_handlers
            .get(symbol)
            .map(|regs| regs.iter().map(|r| r.handler.clone()).collect())
            .unwrap_or_default();
        for handler in handlers {
            handler(self, event);
        }
        Ok(())
    }

    /// Marks the task's `internal_error` outcome without requiring `stop`
    /// to have been declared controllable.
    pub fn mark_internal_error(&mut self, reason: impl Into<String>) {
        if self.status != TaskStatus::Finished {
            self.status = TaskStatus::Finishing;
        }
        self.outcome = Some(TaskOutcome::InternalError);
        self.failure_reason = Some(reason.into());
    }

    /// `emit_failed(reason)` on `symbol`'s generator: marks the
    /// generator unreachable with `reason`. On the `start` event, before
    /// any emission has occurred on this task, also marks the task
    /// `failed_to_start` — mirroring the pre-emission command-exception
    /// path of [`Task::call`].
    pub fn emit_failed(&mut self, symbol: &EventSymbol, reason: impl Into<String>) {
        let reason = reason.into();
        if let Some(gen) = self.event_mut(symbol) {
            gen.mark_unreachable(crate::event::UnreachableCause::EmitFailed(reason.clone()));
        }
        if *symbol == EventSymbol::start() && !self.started() {
            self.status = TaskStatus::Finished;
            self.outcome = Some(TaskOutcome::FailedToStart);
            self.failure_reason = Some(reason);
        }
    }

    /// Fails the task directly without going through an event emission —
    /// used when an `achieve_with` source becomes unreachable: that
    /// generator's emission fails and its task is marked failed.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        if self.status != TaskStatus::Finished {
            self.status = TaskStatus::Finishing;
        }
        if self.outcome.is_none() {
            self.outcome = Some(TaskOutcome::Failed);
        }
        self.failure_reason = Some(reason.into());
    }

    /// Runs finalization handlers and every event generator's
    /// `when_finalized` handlers, exactly once. Any generator that never
    /// emitted becomes unreachable first (`UnreachableCause::Finalized`),
    /// so `if_unreachable` handlers still fire on removal.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        for gen in self.events.values_mut() {
            if !gen.emitted() {
                gen.mark_unreachable(crate::event::UnreachableCause::Finalized);
            }
        }
        let handlers: Vec<FinalizationHandler> =
            self.finalization_handlers.iter().map(|r| r.handler.clone()).collect();
        for handler in handlers {
            handler(self);
        }
        for gen in self.events.values_mut() {
            gen.finalize();
        }
    }

    /// Copies handlers (poll/execute/finalization) whose `on_replace`
    /// policy is `Copy` onto `target`, and delegates per-event handler
    /// copying to each generator.
    pub fn copy_replaceable_handlers_to(&self, target: &mut Task) {
        for reg in &self.poll_handlers {
            if reg.on_replace == OnReplace::Copy {
                target.poll(reg.handler.clone(), OnReplace::Copy);
            }
        }
        for slot in &self.execute_handlers {
            if slot.on_replace == OnReplace::Copy {
                target.execute(slot.handler.clone(), OnReplace::Copy);
            }
        }
        for reg in &self.finalization_handlers {
            if reg.on_replace == OnReplace::Copy {
                target.when_finalized(reg.handler.clone(), OnReplace::Copy);
            }
        }
        for (symbol, gen) in &self.events {
            if let Some(target_gen) = target.events.get_mut(symbol) {
                gen.copy_replaceable_handlers_to(target_gen);
            }
        }
        for (symbol, regs) in &self.on_emit_handlers {
            for reg in regs {
                if reg.on_replace == OnReplace::Copy {
                    target.on(symbol, reg.handler.clone(), OnReplace::Copy);
                }
            }
        }
    }

    /// The default handler-copy policy for handlers that did not specify
    /// one explicitly: `Copy` for an abstract task, `Drop` for a concrete
    /// one.
    pub fn default_on_replace(&self) -> OnReplace {
        if self.abstract_() {
            OnReplace::Copy
        } else {
            OnReplace::Drop
        }
    }
}

/// The error surface of [`Task::call`]: either a structural rejection (not
/// executable, no such event) or the command's own failure.
#[derive(Debug)]
pub enum CallError {
    Structural(StructuralError),
    Command(CommandError),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Structural(e) => write!(f, "{e}"),
            CallError::Command(e) => write!(f, "command failed: {e}"),
        }
    }
}

impl std::error::Error for CallError {}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
