// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execution engine: drives a single-threaded cycle loop over a `Plan`.
//! One cycle is external-event injection, propagation drain, error
//! detection, garbage collection, then cycle bookkeeping.

use crate::error::{AggregateError, Localization, LocalizedError};
use crate::gc;
use crate::propagation::{PropagationEntry, PropagationKind};
use pek_core::{Clock, Event, GeneratorId, GeneratorOwner, Plan, SystemClock};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, error, instrument};

/// Drives cycles over a `Plan`. Owns only the clock and the cycle counter —
/// all durable state lives in the `Plan` the caller passes to `run_cycle`.
pub struct Engine<C: Clock = SystemClock> {
    clock: C,
    cycle: u64,
}

impl Default for Engine<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> Engine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, cycle: 0 }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Runs one full cycle: injects `injected` events, drains the
    /// propagation queue they (and any running task's poll/execute
    /// handlers) produce, runs poll/execute for every task that is running
    /// (or became running earlier in this same cycle, even if it has since
    /// reached a terminal event), then garbage-collects. Returns every
    /// localized error raised along the way, in order.
    #[instrument(skip(self, plan, injected), fields(cycle = self.cycle))]
    pub fn run_cycle(&mut self, plan: &mut Plan, injected: Vec<(GeneratorId, Value)>) -> AggregateError {
        let mut queue: VecDeque<PropagationEntry> = VecDeque::new();
        let mut aggregate = AggregateError::default();

        let not_yet_started: std::collections::HashSet<pek_core::TaskId> =
            plan.tasks().filter(|(_, t)| !t.started()).map(|(id, _)| *id).collect();

        for (id, context) in injected {
            self.emit_and_enqueue(plan, id, context, &mut queue, &mut aggregate);
        }

        while let Some(entry) = queue.pop_front() {
            match entry.kind {
                PropagationKind::Forward => {
                    self.emit_and_enqueue(plan, entry.target, Value::Null, &mut queue, &mut aggregate);
                }
                PropagationKind::Signal => {
                    self.call_and_enqueue(plan, entry.target, Value::Null, &mut queue, &mut aggregate);
                }
            }
        }

        // A task that started and reached a terminal event in this same
        // cycle is no longer `running()` by the time poll/execute run, but
        // still owes them exactly one call — `became_running` covers it.
        let became_running: std::collections::HashSet<pek_core::TaskId> = plan
            .tasks()
            .filter(|(id, t)| not_yet_started.contains(id) && t.started())
            .map(|(id, _)| *id)
            .collect();
        self.run_poll_and_execute(plan, &became_running, &mut aggregate);

        for task_id in plan.check_achieve_failures() {
            aggregate.push(LocalizedError::UnreachableEvent { localization: Localization::task(task_id) });
        }

        if !aggregate.is_empty() {
            error!(count = aggregate.errors.len(), "localized errors raised during cycle {}", self.cycle);
        }

        let collected = gc::collect(plan);
        if !collected.is_empty() {
            debug!(count = collected.len(), "garbage-collected tasks");
        }

        self.cycle += 1;
        aggregate
    }

    fn emit_and_enqueue(
        &mut self,
        plan: &mut Plan,
        gen_id: GeneratorId,
        context: Value,
        queue: &mut VecDeque<PropagationEntry>,
        aggregate: &mut AggregateError,
    ) {
        let event = Event {
            id: pek_core::EventId::new(),
            generator: gen_id,
            propagation_id: self.cycle,
            time: self.clock.now(),
            context,
            direct_sources: Vec::new(),
        };
        let mut requested: Vec<GeneratorId> = Vec::new();
        match plan.generator_owner(gen_id) {
            Some(GeneratorOwner::Task(task_id)) => {
                let Some(symbol) = plan.generator(gen_id).and_then(|g| g.symbol.clone()) else { return };
                if let Some(task) = plan.task_mut(task_id) {
                    if let Err(e) = task.emit(&symbol, &event) {
                        aggregate.push(LocalizedError::EmissionFailed {
                            localization: Localization::task(task_id),
                            reason: e.to_string(),
                        });
                        return;
                    }
                    // A handler just run by `task.emit` may have requested
                    // further emissions (e.g. `stop!` from an `on(:start)`
                    // handler) — queue them so they land in this same cycle.
                    for requested_symbol in task.take_pending_emissions() {
                        if let Some(requested_id) = task.event(&requested_symbol).map(|g| g.id()) {
                            requested.push(requested_id);
                        }
                    }
                }
            }
            Some(GeneratorOwner::Free) => {
                if let Some(gen) = plan.free_event_mut(gen_id) {
                    gen.record_emission(&event);
                }
            }
            None => return,
        }
        for requested_id in requested {
            queue.push_back(PropagationEntry { kind: PropagationKind::Forward, source: gen_id, target: requested_id });
        }
        self.enqueue_children(plan, gen_id, queue);
    }

    fn call_and_enqueue(
        &mut self,
        plan: &mut Plan,
        gen_id: GeneratorId,
        context: Value,
        queue: &mut VecDeque<PropagationEntry>,
        aggregate: &mut AggregateError,
    ) {
        let Some(GeneratorOwner::Task(task_id)) = plan.generator_owner(gen_id) else { return };
        let Some(symbol) = plan.generator(gen_id).and_then(|g| g.symbol.clone()) else { return };
        let plan_executable = plan.is_executable();

        let Some(task) = plan.task_mut(task_id) else { return };
        match task.call(&symbol, context.clone(), plan_executable) {
            Ok(()) => {
                self.emit_and_enqueue(plan, gen_id, context, queue, aggregate);
            }
            Err(pek_core::CallError::Command(source)) => {
                aggregate.push(LocalizedError::CommandFailed { localization: Localization::task(task_id), source });
            }
            Err(pek_core::CallError::Structural(e)) => {
                aggregate.push(LocalizedError::EmissionFailed {
                    localization: Localization::task(task_id),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn enqueue_children(&self, plan: &Plan, gen_id: GeneratorId, queue: &mut VecDeque<PropagationEntry>) {
        for target in plan.signals.children_of(gen_id) {
            queue.push_back(PropagationEntry { kind: PropagationKind::Signal, source: gen_id, target });
        }
        for target in plan.forwards.children_of(gen_id) {
            queue.push_back(PropagationEntry { kind: PropagationKind::Forward, source: gen_id, target });
        }
    }

    fn run_poll_and_execute(
        &mut self,
        plan: &mut Plan,
        became_running: &std::collections::HashSet<pek_core::TaskId>,
        aggregate: &mut AggregateError,
    ) {
        let due: Vec<pek_core::TaskId> = plan
            .tasks()
            .filter(|(id, t)| t.running() || became_running.contains(id))
            .map(|(id, _)| *id)
            .collect();
        for id in due {
            let Some(task) = plan.task_mut(id) else { continue };
            if let Err(e) = task.run_execute_once() {
                aggregate.push(LocalizedError::CommandFailed { localization: Localization::task(id), source: e });
                task.mark_internal_error("execute handler failed");
                continue;
            }
            if let Err(e) = task.run_poll() {
                aggregate.push(LocalizedError::CommandFailed { localization: Localization::task(id), source: e });
                task.mark_internal_error("poll handler failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
