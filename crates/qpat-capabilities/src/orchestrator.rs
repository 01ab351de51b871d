//! Workflow execution: every step on a fresh copy of the topology.

use chrono::{DateTime, Utc};
use qpat_experiment::{Experiment, Params, Topology, Workflow, coerce_numeric_strings};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::capability::CapabilityOutcome;
use crate::error::CapabilityResult;
use crate::factory::CapabilityFactory;

/// Record of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Phase the step belongs to.
    pub phase: String,
    /// Position of the step within the whole workflow, from 0.
    pub index: usize,
    /// Capability that ran.
    pub capability: String,
    /// Parameters after numeric coercion.
    pub params: Params,
    /// What the capability returned.
    pub outcome: CapabilityOutcome,
}

/// Everything produced by one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    pub finished_at: DateTime<Utc>,
    /// Base RNG seed, if the run was seeded.
    pub seed: Option<u64>,
    /// Steps in execution order.
    pub steps: Vec<StepRecord>,
}

impl ExperimentReport {
    /// Step outcomes in execution order.
    pub fn outcomes(&self) -> Vec<CapabilityOutcome> {
        self.steps.iter().map(|s| s.outcome.clone()).collect()
    }
}

/// Runs a workflow's phases and steps in declaration order.
///
/// The topology held here is never mutated: each step gets its own clone,
/// so parameters written by one step are invisible to the next.
#[derive(Debug, Clone)]
pub struct ExperimentOrchestrator {
    topology: Topology,
    workflow: Workflow,
    factory: CapabilityFactory,
}

impl ExperimentOrchestrator {
    /// Create an orchestrator.
    pub fn new(topology: Topology, workflow: Workflow, factory: CapabilityFactory) -> Self {
        Self {
            topology,
            workflow,
            factory,
        }
    }

    /// Create an orchestrator for a loaded experiment.
    pub fn from_experiment(experiment: Experiment, factory: CapabilityFactory) -> Self {
        Self::new(experiment.topology, experiment.workflow, factory)
    }

    /// The pristine topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The workflow being run.
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Run every step and return the outcomes in order.
    ///
    /// The first failing step aborts the run; no partial results are
    /// returned.
    pub fn run(&self) -> CapabilityResult<Vec<CapabilityOutcome>> {
        Ok(self.run_report()?.outcomes())
    }

    /// Run every step and return a full report.
    #[instrument(skip(self), fields(phases = self.workflow.phases.len(), steps = self.workflow.num_steps()))]
    pub fn run_report(&self) -> CapabilityResult<ExperimentReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let base_seed = self.factory.config().seed;
        info!(%run_id, "Starting experiment");

        let mut steps = Vec::with_capacity(self.workflow.num_steps());
        for phase in &self.workflow.phases {
            info!(phase = %phase.name, steps = phase.steps.len(), "Starting phase");

            for step in &phase.steps {
                let index = steps.len();
                let params = coerce_numeric_strings(&step.params);
                let seed = base_seed.map(|s| s.wrapping_add(index as u64));

                let outcome = self
                    .factory
                    .create_seeded(&step.capability, self.topology.clone(), seed)
                    .and_then(|mut capability| capability.run(&params))
                    .inspect_err(|e| {
                        error!(phase = %phase.name, index, capability = %step.capability, "Step failed: {}", e);
                    })?;

                info!(
                    phase = %phase.name,
                    index,
                    capability = %step.capability,
                    value = outcome.value,
                    "Step complete"
                );
                steps.push(StepRecord {
                    phase: phase.name.clone(),
                    index,
                    capability: step.capability.clone(),
                    params,
                    outcome,
                });
            }

            info!(phase = %phase.name, "Phase complete");
        }

        let finished_at = Utc::now();
        info!(%run_id, steps = steps.len(), "Experiment complete");
        Ok(ExperimentReport {
            run_id,
            started_at,
            finished_at,
            seed: base_seed,
            steps,
        })
    }
}
