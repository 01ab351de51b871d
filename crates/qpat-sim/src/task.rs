//! Simulator-agnostic task descriptions.

use qpat_experiment::{ParamValue, Params};

use crate::kernel::Picoseconds;

/// A node method to invoke at a given simulation time.
///
/// Tasks carry names and loosely typed arguments; they are resolved against
/// the built nodes by [`SimTopology::schedule_tasks`](crate::SimTopology::schedule_tasks).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationTask {
    /// Target node name.
    pub target: String,
    /// Method name.
    pub method: String,
    /// Positional arguments.
    pub args: Vec<ParamValue>,
    /// Keyword arguments.
    pub kwargs: Params,
    /// Execution time.
    pub time: Picoseconds,
}

impl SimulationTask {
    /// Create a task with no arguments.
    pub fn new(target: impl Into<String>, method: impl Into<String>, time: Picoseconds) -> Self {
        Self {
            target: target.into(),
            method: method.into(),
            args: Vec::new(),
            kwargs: Params::new(),
            time,
        }
    }

    /// Append a positional argument.
    pub fn with_arg(mut self, value: impl Into<ParamValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Add a keyword argument.
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// `emit(num_pulses)` on a source node.
    pub fn emit(target: impl Into<String>, num_pulses: u64, time: Picoseconds) -> Self {
        Self::new(target, "emit", time).with_arg(num_pulses)
    }
}
