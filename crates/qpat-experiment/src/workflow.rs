//! Experiment scripts: ordered phases of ordered capability steps.

use serde::{Deserialize, Serialize};

use crate::params::Params;

/// One capability invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Name of the capability to run.
    pub capability: String,
    /// Capability parameters, coerced by the orchestrator before use.
    #[serde(default)]
    pub params: Params,
}

impl Step {
    /// Create a step with no parameters.
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            params: Params::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<crate::ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A named group of steps executed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Phase name.
    pub name: String,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

impl Phase {
    /// Create a phase.
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// Full experiment script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Phases in execution order.
    pub phases: Vec<Phase>,
}

impl Workflow {
    /// Create a workflow.
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// Total number of steps across all phases.
    pub fn num_steps(&self) -> usize {
        self.phases.iter().map(|p| p.steps.len()).sum()
    }
}
