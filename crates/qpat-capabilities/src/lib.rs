//! `qpat-capabilities`: runnable experiments on top of the simulator.
//!
//! A [`Capability`] is one self-contained measurement: it takes a private
//! copy of the topology, writes its parameters into it, runs a
//! [`SimulationEngine`](qpat_sim::SimulationEngine) and reduces the
//! detector timestamps to a single [`CapabilityOutcome`].
//!
//! The [`ExperimentOrchestrator`] walks a workflow's phases and steps in
//! order, asks the [`CapabilityFactory`] for a fresh capability per step and
//! collects the outcomes.
//!
//! ```rust
//! use qpat_capabilities::{CapabilityFactory, ExperimentOrchestrator, FactoryConfig};
//! use qpat_experiment::{NodeRole, NodeSpec, Phase, QuantumLinkSpec, Step, Topology, Workflow};
//!
//! let mut topo = Topology::new();
//! topo.add_node(NodeSpec::new("Source", NodeRole::Source)).unwrap();
//! topo.add_node(NodeSpec::new("Alice", NodeRole::PolarizationMeasurement)).unwrap();
//! topo.add_node(NodeSpec::new("Bob", NodeRole::PolarizationMeasurement)).unwrap();
//! topo.add_link(QuantumLinkSpec::new("Source", "Alice")).unwrap();
//! topo.add_link(QuantumLinkSpec::new("Source", "Bob")).unwrap();
//!
//! let step = Step::new("polarization_analysis")
//!     .with_param("alice_angle", 0.0)
//!     .with_param("bob_angle", 0.0)
//!     .with_param("emission_time", "1e-6")
//!     .with_param("frequency", "8e7");
//! let workflow = Workflow::new(vec![Phase::new("sweep", vec![step])]);
//!
//! let factory = CapabilityFactory::new(FactoryConfig { seed: Some(1), ..Default::default() });
//! let results = ExperimentOrchestrator::new(topo, workflow, factory).run().unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].metadata["pulses"], 80);
//! ```

pub mod capability;
pub mod error;
pub mod factory;
pub mod orchestrator;
pub mod polarization;
pub mod registry;

pub use capability::{Capability, CapabilityOutcome};
pub use error::{CapabilityError, CapabilityResult};
pub use factory::{CapabilityFactory, FactoryConfig};
pub use orchestrator::{ExperimentOrchestrator, ExperimentReport, StepRecord};
pub use polarization::{PolarizationAnalysisCapability, PolarizationRun};
pub use registry::CapabilityRegistry;
