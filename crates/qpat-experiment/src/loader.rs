//! YAML loaders for topology and workflow documents.
//!
//! Topology documents look like:
//!
//! ```yaml
//! topology:
//!   nodes:
//!     - name: Source
//!       role: source
//!       params: { frequency: 8e7, mean_photon_num: 0.1 }
//!     - name: Alice
//!       role: polarization_measurement
//!   links:
//!     - { src: Source, dst: Alice, distance: 1000, attenuation: 0.0002 }
//! ```
//!
//! Workflow documents look like:
//!
//! ```yaml
//! workflow:
//!   phases:
//!     - name: sweep
//!       steps:
//!         - capability: polarization_analysis
//!           params: { alice_angle: 0.0, bob_angle: 0.0, emission_time: "1e-6", frequency: "8e7" }
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ExperimentError, ExperimentResult};
use crate::params::Params;
use crate::spec::{LinkModel, NodeRole, NodeSpec, QuantumLinkSpec};
use crate::topology::Topology;
use crate::workflow::{Phase, Step, Workflow};

#[derive(Deserialize)]
struct TopologyDocument {
    topology: Option<TopologySection>,
}

#[derive(Deserialize, Default)]
struct TopologySection {
    #[serde(default)]
    nodes: Option<Vec<RawNode>>,
    #[serde(default)]
    links: Option<Vec<RawLink>>,
}

#[derive(Deserialize)]
struct RawNode {
    name: String,
    role: NodeRole,
    #[serde(default)]
    params: Option<Params>,
}

#[derive(Deserialize)]
struct RawLink {
    src: String,
    dst: String,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    attenuation: Option<f64>,
    #[serde(default)]
    model: Option<LinkModel>,
    #[serde(default)]
    model_params: Option<Params>,
}

#[derive(Deserialize)]
struct WorkflowDocument {
    workflow: Option<WorkflowSection>,
}

#[derive(Deserialize, Default)]
struct WorkflowSection {
    #[serde(default)]
    phases: Option<Vec<RawPhase>>,
}

#[derive(Deserialize)]
struct RawPhase {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    steps: Option<Vec<RawStep>>,
}

#[derive(Deserialize)]
struct RawStep {
    #[serde(default)]
    capability: Option<String>,
    #[serde(default)]
    params: Option<Params>,
}

impl Topology {
    /// Parse a topology document.
    ///
    /// A document without a `topology` section yields an empty topology.
    pub fn from_yaml_str(yaml: &str) -> ExperimentResult<Self> {
        let doc: Option<TopologyDocument> = serde_yaml_ng::from_str(yaml)?;
        let section = doc.and_then(|d| d.topology).unwrap_or_default();

        let mut topo = Topology::new();
        for raw in section.nodes.unwrap_or_default() {
            topo.add_node(NodeSpec {
                name: raw.name,
                role: raw.role,
                params: raw.params.unwrap_or_default(),
            })?;
        }
        for raw in section.links.unwrap_or_default() {
            topo.add_link(QuantumLinkSpec {
                src: raw.src,
                dst: raw.dst,
                distance: raw.distance.unwrap_or(0.0),
                attenuation: raw.attenuation.unwrap_or(0.0),
                model: raw.model.unwrap_or_default(),
                model_params: raw.model_params.unwrap_or_default(),
            })?;
        }

        debug!(
            "Parsed topology: {} nodes, {} links",
            topo.nodes.len(),
            topo.links.len()
        );
        Ok(topo)
    }
}

impl Workflow {
    /// Parse a workflow document.
    pub fn from_yaml_str(yaml: &str) -> ExperimentResult<Self> {
        let doc: Option<WorkflowDocument> = serde_yaml_ng::from_str(yaml)?;
        let section = doc
            .and_then(|d| d.workflow)
            .ok_or(ExperimentError::MissingSection("workflow"))?;

        let mut phases = Vec::new();
        for raw_phase in section.phases.unwrap_or_default() {
            let mut steps = Vec::new();
            for raw_step in raw_phase.steps.unwrap_or_default() {
                let capability = raw_step.capability.ok_or(ExperimentError::MissingField {
                    context: "Workflow step",
                    field: "capability",
                })?;
                steps.push(Step {
                    capability,
                    params: raw_step.params.unwrap_or_default(),
                });
            }
            phases.push(Phase {
                name: raw_phase.name.unwrap_or_else(|| "unnamed_phase".to_string()),
                steps,
            });
        }

        debug!("Parsed workflow: {} phases", phases.len());
        Ok(Workflow { phases })
    }
}

/// Load a topology YAML file.
pub fn load_topology(path: impl AsRef<Path>) -> ExperimentResult<Topology> {
    let path = path.as_ref();
    info!("Loading topology from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Topology::from_yaml_str(&text)
}

/// Load a workflow YAML file.
pub fn load_workflow(path: impl AsRef<Path>) -> ExperimentResult<Workflow> {
    let path = path.as_ref();
    info!("Loading workflow from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Workflow::from_yaml_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn test_null_params_become_empty() {
        let topo = Topology::from_yaml_str(
            "topology:\n  nodes:\n    - name: Alice\n      role: polarization_measurement\n      params:\n",
        )
        .unwrap();
        assert!(topo.node("Alice").unwrap().params.is_empty());
    }

    #[test]
    fn test_missing_topology_section_is_empty() {
        let topo = Topology::from_yaml_str("other: 1\n").unwrap();
        assert_eq!(topo.num_nodes(), 0);
        assert!(topo.links.is_empty());
    }

    #[test]
    fn test_unknown_role_fails() {
        let err = Topology::from_yaml_str(
            "topology:\n  nodes:\n    - name: X\n      role: mirror\n",
        )
        .unwrap_err();
        assert!(matches!(err, ExperimentError::Yaml(_)));
    }

    #[test]
    fn test_workflow_missing_section() {
        let err = Workflow::from_yaml_str("phases: []\n").unwrap_err();
        assert!(matches!(err, ExperimentError::MissingSection("workflow")));
    }

    #[test]
    fn test_step_without_capability() {
        let err = Workflow::from_yaml_str(
            "workflow:\n  phases:\n    - name: p\n      steps:\n        - params: {a: 1}\n",
        )
        .unwrap_err();
        assert!(matches!(err, ExperimentError::MissingField { field: "capability", .. }));
    }

    #[test]
    fn test_unnamed_phase_default() {
        let wf = Workflow::from_yaml_str(
            "workflow:\n  phases:\n    - steps:\n        - capability: polarization_analysis\n          params: {frequency: \"8e7\"}\n",
        )
        .unwrap();
        assert_eq!(wf.phases[0].name, "unnamed_phase");
        assert_eq!(
            wf.phases[0].steps[0].params["frequency"],
            ParamValue::Text("8e7".into())
        );
    }
}
