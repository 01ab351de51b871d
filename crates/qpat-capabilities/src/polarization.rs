//! Two-party polarization correlation measurement.
//!
//! Alice and Bob each rotate the half-wave plate of their analyzer, the
//! source emits for a fixed time, and the coincidence rate between the two
//! "0" detectors is reported. Sweeping the angles traces out the
//! entanglement visibility curve.

use qpat_analysis::{CoincidenceModel, Coincidences};
use qpat_experiment::{ParamValue, Params, ParamsExt, Topology};
use qpat_sim::{PhotonicTopologyBuilder, SimulationEngine, SimulationTask, seconds_to_ps};
use tracing::{debug, info, instrument};

use crate::capability::{Capability, CapabilityOutcome};
use crate::error::{CapabilityError, CapabilityResult};

/// Run parameters of one polarization-analysis step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarizationRun {
    /// Alice's HWP angle in radians.
    pub alice_angle: f64,
    /// Bob's HWP angle in radians.
    pub bob_angle: f64,
    /// Emission time in seconds.
    pub emission_time: f64,
    /// Source pulse rate in Hz.
    pub frequency: f64,
}

impl PolarizationRun {
    /// Read and check the four required parameters.
    pub fn from_params(params: &Params) -> CapabilityResult<Self> {
        let run = Self {
            alice_angle: params.require_f64("alice_angle")?,
            bob_angle: params.require_f64("bob_angle")?,
            emission_time: params.require_f64("emission_time")?,
            frequency: params.require_f64("frequency")?,
        };
        for (name, value) in [("emission_time", run.emission_time), ("frequency", run.frequency)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CapabilityError::InvalidParameter {
                    name: name.into(),
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        Ok(run)
    }

    /// Pulses emitted over the run, rounded to the nearest whole pulse.
    pub fn num_pulses(&self) -> u64 {
        (self.emission_time * self.frequency).round() as u64
    }
}

/// Measures the coincidence rate between two polarization analyzers.
pub struct PolarizationAnalysisCapability {
    topology: Topology,
    builder: PhotonicTopologyBuilder,
    source: String,
    alice: String,
    bob: String,
    model: Box<dyn CoincidenceModel>,
}

impl PolarizationAnalysisCapability {
    /// Registry name.
    pub const NAME: &'static str = "polarization_analysis";

    /// Bind a capability to its own topology copy.
    pub fn new(
        topology: Topology,
        builder: PhotonicTopologyBuilder,
        source: impl Into<String>,
        alice: impl Into<String>,
        bob: impl Into<String>,
        model: Box<dyn CoincidenceModel>,
    ) -> Self {
        Self {
            topology,
            builder,
            source: source.into(),
            alice: alice.into(),
            bob: bob.into(),
            model,
        }
    }

    /// The topology as configured by the most recent run.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The coincidence model in use.
    pub fn model(&self) -> &dyn CoincidenceModel {
        self.model.as_ref()
    }

    fn configure(&mut self, run: &PolarizationRun) -> CapabilityResult<()> {
        self.topology
            .node_mut(&self.alice)?
            .params
            .insert("hwp_angle".into(), ParamValue::from(run.alice_angle));
        self.topology
            .node_mut(&self.bob)?
            .params
            .insert("hwp_angle".into(), ParamValue::from(run.bob_angle));
        self.topology
            .node_mut(&self.source)?
            .params
            .insert("frequency".into(), ParamValue::from(run.frequency));
        Ok(())
    }
}

fn pair_key(a: usize, b: usize) -> String {
    format!("{a}{b}")
}

impl Capability for PolarizationAnalysisCapability {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// Run one step and report the coincidence rate in Hz.
    ///
    /// The value counts only Alice detector 0 against Bob detector 0 (key
    /// `"00"`). All four pair counts are kept in the `coincidences` metadata.
    #[instrument(skip(self, params), fields(source = %self.source, alice = %self.alice, bob = %self.bob))]
    fn run(&mut self, params: &Params) -> CapabilityResult<CapabilityOutcome> {
        let run = PolarizationRun::from_params(params)?;
        self.configure(&run)?;

        let pulses = run.num_pulses();
        let tasks = [SimulationTask::emit(self.source.as_str(), pulses, 0)];

        let mut engine = SimulationEngine::new(&self.topology, &self.builder);
        let sim = engine.run(seconds_to_ps(run.emission_time), &tasks)?;
        let alice = sim.analyzer(&self.alice)?.get_detection_counts()?;
        let bob = sim.analyzer(&self.bob)?.get_detection_counts()?;

        debug!(
            alice = alice[0].len() + alice[1].len(),
            bob = bob[0].len() + bob[1].len(),
            "detections"
        );

        let mut pairs: [[Coincidences; 2]; 2] = Default::default();
        for (i, a) in alice.iter().enumerate() {
            for (j, b) in bob.iter().enumerate() {
                pairs[i][j] = self.model.compute(a, b);
            }
        }
        let rate = self.model.rate(&pairs[0][0], run.emission_time)?;

        info!(
            pulses,
            coincidences = pairs[0][0].count,
            rate,
            "polarization analysis complete"
        );

        let singles = serde_json::json!({
            "alice": [alice[0].len(), alice[1].len()],
            "bob": [bob[0].len(), bob[1].len()],
        });
        let coincidences: serde_json::Map<String, serde_json::Value> = (0..2)
            .flat_map(|i| (0..2).map(move |j| (i, j)))
            .map(|(i, j)| (pair_key(i, j), pairs[i][j].count.into()))
            .collect();

        Ok(CapabilityOutcome::new(rate)
            .with_metadata("pulses", pulses)
            .with_metadata("singles", singles)
            .with_metadata("coincidences", coincidences)
            .with_metadata("window_ps", self.model.window())
            .with_metadata("method", self.model.name()))
    }
}
