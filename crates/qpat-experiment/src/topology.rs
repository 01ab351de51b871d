//! Experiment topology: named nodes and the links between them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ExperimentError, ExperimentResult};
use crate::spec::{NodeSpec, QuantumLinkSpec};

/// Declarative network topology.
///
/// `Clone` is a deep copy: every spec and parameter map is owned, so a
/// cloned topology can be mutated without affecting the original.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Nodes keyed by name.
    pub nodes: BTreeMap<String, NodeSpec>,
    /// Links in declaration order.
    pub links: Vec<QuantumLinkSpec>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; fails if the name is taken.
    pub fn add_node(&mut self, node: NodeSpec) -> ExperimentResult<()> {
        if self.nodes.contains_key(&node.name) {
            return Err(ExperimentError::DuplicateNode(node.name));
        }
        debug!("Adding node '{}' ({})", node.name, node.role);
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Append a link after validating its numeric fields.
    pub fn add_link(&mut self, link: QuantumLinkSpec) -> ExperimentResult<()> {
        link.validate()?;
        self.links.push(link);
        Ok(())
    }

    /// Look up a node.
    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.get(name)
    }

    /// Look up a node for in-place parameter mutation.
    pub fn node_mut(&mut self, name: &str) -> ExperimentResult<&mut NodeSpec> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| ExperimentError::UnknownNode(name.to_string()))
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Check that every link references declared nodes.
    pub fn validate_links(&self) -> ExperimentResult<()> {
        for link in &self.links {
            for end in [&link.src, &link.dst] {
                if !self.nodes.contains_key(end) {
                    return Err(ExperimentError::UnknownNode(end.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use crate::spec::NodeRole;

    fn sample() -> Topology {
        let mut topo = Topology::new();
        topo.add_node(NodeSpec::new("Source", NodeRole::Source).with_param("frequency", 8e7))
            .unwrap();
        topo.add_node(NodeSpec::new("Alice", NodeRole::PolarizationMeasurement))
            .unwrap();
        topo.add_link(QuantumLinkSpec::new("Source", "Alice")).unwrap();
        topo
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut topo = sample();
        let err = topo
            .add_node(NodeSpec::new("Alice", NodeRole::Source))
            .unwrap_err();
        assert!(matches!(err, ExperimentError::DuplicateNode(name) if name == "Alice"));
        assert_eq!(topo.num_nodes(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        copy.node_mut("Source")
            .unwrap()
            .params
            .insert("frequency".into(), ParamValue::Number(1.0));
        copy.links[0].distance = 10.0;

        assert_eq!(
            original.node("Source").unwrap().params["frequency"],
            ParamValue::Number(8e7)
        );
        assert_eq!(original.links[0].distance, 0.0);
    }

    #[test]
    fn test_validate_links_unknown_node() {
        let mut topo = sample();
        topo.add_link(QuantumLinkSpec::new("Source", "Bob")).unwrap();
        assert!(matches!(
            topo.validate_links(),
            Err(ExperimentError::UnknownNode(name)) if name == "Bob"
        ));
    }
}
