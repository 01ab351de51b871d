//! `qpat-sim`: discrete-event simulation of polarization-entangled photon
//! experiments.
//!
//! A [`PhotonicTopologyBuilder`] turns a declarative
//! [`Topology`](qpat_experiment::Topology) into a [`SimTopology`]: an SPDC
//! source node emitting Bell pairs through lossy fibre into polarization
//! analyzers (QWP → HWP → polarizing beam splitter → two detectors). A
//! [`SimulationEngine`] schedules [`SimulationTask`]s on it and runs the
//! timeline for a fixed duration; the analyzers then hand back their
//! detector timestamps.
//!
//! - **Kernel**: picosecond [`Timeline`] with FIFO ordering of equal times
//! - **States**: shared two-photon kets in a [`QuantumManager`]
//! - **Components**: wave plates, beam splitter, detectors, SPDC source,
//!   fibre, all held in one arena and addressed by [`ComponentId`]
//!
//! # Quick start
//!
//! ```rust
//! use qpat_experiment::{NodeRole, NodeSpec, QuantumLinkSpec, Topology};
//! use qpat_sim::{PhotonicTopologyBuilder, SimulationEngine, SimulationTask};
//!
//! let mut topo = Topology::new();
//! topo.add_node(NodeSpec::new("Source", NodeRole::Source).with_param("mean_photon_num", 0.5))
//!     .unwrap();
//! topo.add_node(NodeSpec::new("Alice", NodeRole::PolarizationMeasurement)).unwrap();
//! topo.add_node(NodeSpec::new("Bob", NodeRole::PolarizationMeasurement)).unwrap();
//! topo.add_link(QuantumLinkSpec::new("Source", "Alice")).unwrap();
//! topo.add_link(QuantumLinkSpec::new("Source", "Bob")).unwrap();
//!
//! let builder = PhotonicTopologyBuilder::with_seed(7);
//! let mut engine = SimulationEngine::new(&topo, &builder);
//! let sim = engine
//!     .run(1_000_000, &[SimulationTask::emit("Source", 50, 0)])
//!     .unwrap();
//!
//! let [h, v] = sim.analyzer("Alice").unwrap().get_detection_counts().unwrap();
//! assert!(h.len() + v.len() > 0);
//! ```

pub mod builder;
pub mod components;
pub mod engine;
pub mod error;
pub mod kernel;
pub mod nodes;
pub mod photon;
pub mod state;
pub mod task;
pub mod topology;

pub use builder::{PhotonicTopologyBuilder, TopologyBuilder};
pub use components::{Action, Component, ComponentId, Components, Routing, SimContext};
pub use engine::SimulationEngine;
pub use error::{SimError, SimResult};
pub use kernel::{PS_PER_SECOND, Picoseconds, Timeline, seconds_to_ps};
pub use nodes::{AnalyzerBasis, AnalyzerConfig, NodeCall, SimNode, SourceConfig};
pub use photon::{Encoding, Photon};
pub use state::{QuantumManager, StateKey};
pub use task::SimulationTask;
pub use topology::{AnalyzerView, SimTopology, SourceView};
