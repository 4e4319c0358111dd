// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The argument system: static, defaulted, and delayed arguments, with the
//! parallel-assignment protocol used both at construction time and at
//! freeze time.

use crate::error::StructuralError;
use crate::task::Task;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A value an argument may hold: either concrete data, or a value whose
/// evaluation is deferred until [`Arguments::freeze_delayed_arguments`].
#[derive(Clone)]
pub enum ArgValue {
    Concrete(Value),
    Delayed(Arc<dyn DelayedArgument>),
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Concrete(v) => write!(f, "Concrete({v})"),
            ArgValue::Delayed(_) => write!(f, "Delayed(..)"),
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgValue::Concrete(a), ArgValue::Concrete(b)) => a == b,
            // Delayed arguments are never equal to anything by value — they
            // have not produced a value yet.
            _ => false,
        }
    }
}

impl From<Value> for ArgValue {
    fn from(v: Value) -> Self {
        ArgValue::Concrete(v)
    }
}

/// A value whose evaluation is deferred until `freeze_delayed_arguments`.
///
/// The "no value yet" case is modeled as `None`, not an exception — a
/// delayed argument that cannot yet resolve simply stays delayed.
pub trait DelayedArgument: Send + Sync {
    fn evaluate_delayed_argument(&self, task: &Task) -> Option<Value>;
}

/// What a registered setter writes back into the arguments map when it
/// fires. `Clear` models the "absent is acceptable" outcome.
#[derive(Debug, Clone)]
pub enum ArgWrite {
    Set(Value),
    Clear,
}

/// A setter closure for one argument name: computed against the pre-call
/// snapshot, producing zero or more writes (to its own name and/or others).
pub type ArgSetter = Arc<dyn Fn(&Arguments, &Value) -> Vec<(String, ArgWrite)> + Send + Sync>;

/// The full set of an argument's possible states, plus any registered
/// decomposition setters.
#[derive(Clone, Default)]
pub struct Arguments {
    values: IndexMap<String, ArgValue>,
    setters: IndexMap<String, ArgSetter>,
    /// Declared defaults, used by `meaningful_arguments`.
    defaults: IndexMap<String, Value>,
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments").field("values", &self.values).finish()
    }
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a setter for `name`. Only fires for calls to
    /// `assign_arguments` that explicitly include `name`.
    pub fn set_setter(&mut self, name: impl Into<String>, setter: ArgSetter) {
        self.setters.insert(name.into(), setter);
    }

    pub fn set_default(&mut self, name: impl Into<String>, value: Value) {
        self.defaults.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// `has_argument?` — true iff the name is set and the value is not delayed.
    pub fn has_argument(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(ArgValue::Concrete(_)))
    }

    pub fn concrete(&self, name: &str) -> Option<&Value> {
        match self.values.get(name) {
            Some(ArgValue::Concrete(v)) => Some(v),
            _ => None,
        }
    }

    /// Insert a value directly, bypassing setters and conflict-checking.
    /// Used for construction-time initial arguments whose value is delayed:
    /// setters never fire for keys whose initial value is a delayed argument.
    pub fn set_raw(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    /// `static?` — no stored value is delayed.
    pub fn is_static(&self) -> bool {
        !self.values.values().any(|v| matches!(v, ArgValue::Delayed(_)))
    }

    /// `fully_instanciated?` — every requested declared argument is set and
    /// not delayed. `declared` is the task model's declared argument names.
    pub fn fully_instanciated(&self, declared: &[String]) -> bool {
        declared.iter().all(|name| self.has_argument(name))
    }

    /// Excludes keys equal to their declared default.
    pub fn meaningful_arguments(&self) -> IndexMap<String, Value> {
        self.values
            .iter()
            .filter_map(|(k, v)| match v {
                ArgValue::Concrete(val) => {
                    if self.defaults.get(k) == Some(val) {
                        None
                    } else {
                        Some((k.clone(), val.clone()))
                    }
                }
                ArgValue::Delayed(_) => None,
            })
            .collect()
    }

    /// Parallel assignment: phase (i) snapshot the pre-call state, phase
    /// (ii) apply direct literal writes for every requested key, then run
    /// each requested key's setter (if any) against the *snapshot*,
    /// overriding direct writes, phase (iii) reconcile every requested key
    /// against the resulting state. Rolls back entirely on conflict.
    pub fn assign_arguments(
        &mut self,
        requested: &IndexMap<String, ArgValue>,
    ) -> Result<(), StructuralError> {
        let snapshot = self.clone();
        let mut working = self.values.clone();

        // Phase (ii.a): baseline direct writes.
        for (name, value) in requested {
            working.insert(name.clone(), value.clone());
        }

        // Phase (ii.b): setters fire against the pre-call snapshot and may
        // override the baseline, including for names other than their own.
        for (name, value) in requested {
            let Some(setter) = self.setters.get(name).cloned() else { continue };
            let ArgValue::Concrete(concrete) = value else { continue };
            for (written_name, write) in (setter)(&snapshot, concrete) {
                match write {
                    ArgWrite::Set(v) => {
                        working.insert(written_name, ArgValue::Concrete(v));
                    }
                    ArgWrite::Clear => {
                        working.shift_remove(&written_name);
                    }
                }
            }
        }

        // Phase (iii): reconcile.
        for (name, requested_value) in requested {
            match working.get(name) {
                None => {}
                Some(actual) if actual == requested_value => {}
                Some(actual) => {
                    return Err(StructuralError::ArgumentConflict {
                        name: name.clone(),
                        requested: format!("{requested_value:?}"),
                        actual: format!("{actual:?}"),
                    });
                }
            }
        }

        self.values = working;
        Ok(())
    }

    /// Evaluates every delayed value still present; successfully evaluated
    /// ones are forwarded to `assign_arguments` in one call.
    pub fn freeze_delayed_arguments(&mut self, task: &Task) -> Result<(), StructuralError> {
        let mut resolved = IndexMap::new();
        for (name, value) in &self.values {
            if let ArgValue::Delayed(delayed) = value {
                if let Some(v) = delayed.evaluate_delayed_argument(task) {
                    resolved.insert(name.clone(), ArgValue::Concrete(v));
                }
            }
        }
        if resolved.is_empty() {
            return Ok(());
        }
        self.assign_arguments(&resolved)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.values.iter()
    }
}

#[cfg(test)]
#[path = "argument_tests.rs"]
mod tests;
