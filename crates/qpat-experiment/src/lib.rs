//! QPAT Experiment Model
//!
//! Declarative description of a quantum-photonic experiment: which nodes
//! exist ([`NodeSpec`]), how they are connected ([`QuantumLinkSpec`]), and
//! what to do with them ([`Workflow`]). These types carry no behavior; the
//! `qpat-sim` crate turns a [`Topology`] into a runnable simulation and
//! `qpat-capabilities` executes a [`Workflow`] against it.
//!
//! # Example
//!
//! ```rust
//! use qpat_experiment::{NodeRole, NodeSpec, QuantumLinkSpec, Topology};
//!
//! let mut topo = Topology::new();
//! topo.add_node(NodeSpec::new("Source", NodeRole::Source)).unwrap();
//! topo.add_node(NodeSpec::new("Alice", NodeRole::PolarizationMeasurement)).unwrap();
//! topo.add_link(QuantumLinkSpec::new("Source", "Alice")).unwrap();
//!
//! // Each run works on its own copy.
//! let copy = topo.clone();
//! assert_eq!(copy, topo);
//! ```

pub mod error;
pub mod loader;
pub mod params;
pub mod spec;
pub mod topology;
pub mod workflow;

pub use error::{ExperimentError, ExperimentResult};
pub use loader::{load_topology, load_workflow};
pub use params::{ParamValue, Params, ParamsExt, coerce_numeric_strings};
pub use spec::{LinkModel, NodeRole, NodeSpec, QuantumLinkSpec};
pub use topology::Topology;
pub use workflow::{Phase, Step, Workflow};

/// A topology together with the workflow to run on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Experiment {
    /// Network description.
    pub topology: Topology,
    /// Experiment script.
    pub workflow: Workflow,
}

impl Experiment {
    /// Bundle a topology and workflow.
    pub fn new(topology: Topology, workflow: Workflow) -> Self {
        Self { topology, workflow }
    }

    /// Load both documents from disk.
    pub fn load(
        topology_path: impl AsRef<std::path::Path>,
        workflow_path: impl AsRef<std::path::Path>,
    ) -> ExperimentResult<Self> {
        Ok(Self {
            topology: load_topology(topology_path)?,
            workflow: load_workflow(workflow_path)?,
        })
    }
}
