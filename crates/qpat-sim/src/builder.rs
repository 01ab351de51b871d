//! Translation of a declarative [`Topology`] into a runnable [`SimTopology`].

use qpat_experiment::{NodeRole, NodeSpec, QuantumLinkSpec, Topology};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use crate::components::{
    Component, FixedBasisBeamSplitter, FixedBasisPolarizationDetector, PhotonDetector, PlateKind,
    QuantumChannel, SourcePort, WavePlate,
};
use crate::error::{SimError, SimResult};
use crate::nodes::{AnalyzerConfig, PolarizationAnalyzer, SimNode, SourceConfig, SourceNode};
use crate::topology::SimTopology;

/// Builds simulation graphs from topologies.
///
/// An engine calls its builder at most once.
pub trait TopologyBuilder {
    /// Instantiate nodes, wire links and initialize every component.
    fn build(&self, topology: &Topology) -> SimResult<SimTopology>;
}

/// Builder for polarization-entanglement setups: SPDC sources feeding
/// polarization analyzers over fibre.
#[derive(Debug, Clone, Default)]
pub struct PhotonicTopologyBuilder {
    seed: Option<u64>,
}

impl PhotonicTopologyBuilder {
    /// Builder whose simulations draw from OS entropy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose simulations are reproducible from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Configured seed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn build_node(sim: &mut SimTopology, spec: &NodeSpec) -> SimResult<SimNode> {
        let name = spec.name.as_str();
        match spec.role {
            NodeRole::Source => {
                let config = SourceConfig::from_params(&spec.params)?;
                let spdc = sim
                    .components
                    .push(Component::Source(config.build(format!("{name}_SPDC"))?));
                let ports = [
                    sim.components.push(Component::Port(SourcePort::new(0))),
                    sim.components.push(Component::Port(SourcePort::new(1))),
                ];
                for port in ports {
                    sim.components.connect(spdc, port)?;
                }
                debug!(node = name, ?config, "source node built");
                Ok(SimNode::Source(SourceNode::new(name, config, spdc, ports)))
            }
            NodeRole::PolarizationMeasurement => {
                let config = AnalyzerConfig::from_params(&spec.params)?;
                let components = &mut sim.components;

                let qwp = components.push(Component::WavePlate(WavePlate::new(
                    format!("{name}_QWP"),
                    PlateKind::Qwp,
                    config.qwp_angle,
                )));
                let hwp = components.push(Component::WavePlate(WavePlate::new(
                    format!("{name}_HWP"),
                    PlateKind::Hwp,
                    config.hwp_angle,
                )));
                let splitter = components.push(Component::BeamSplitter(
                    FixedBasisBeamSplitter::new(
                        format!("{name}_BS"),
                        config.basis_index,
                        config.fidelity,
                        config.mismeasure_prob,
                    )?,
                ));
                let detectors = [
                    components.push(Component::Detector(PhotonDetector::new(
                        format!("{name}_D0"),
                        config.detector.clone(),
                    )?)),
                    components.push(Component::Detector(PhotonDetector::new(
                        format!("{name}_D1"),
                        config.detector.clone(),
                    )?)),
                ];
                let detector = components.push(Component::PolarizationDetector(
                    FixedBasisPolarizationDetector::new(
                        format!("{name}_detector"),
                        splitter,
                        detectors,
                    ),
                ));

                components.connect(qwp, hwp)?;
                components.connect(hwp, detector)?;
                for (channel, id) in detectors.into_iter().enumerate() {
                    components.connect(splitter, id)?;
                    components.detector_mut(id)?.attach(detector, channel);
                }

                debug!(node = name, ?config, "polarization analyzer built");
                Ok(SimNode::Analyzer(PolarizationAnalyzer::new(
                    name, config, qwp, hwp, detector,
                )))
            }
        }
    }

    fn build_link(sim: &mut SimTopology, link: &QuantumLinkSpec) -> SimResult<()> {
        let entry = match sim.node(&link.dst)? {
            SimNode::Analyzer(analyzer) => analyzer.entry(),
            SimNode::Source(_) => {
                return Err(SimError::Wiring(format!(
                    "link {} -> {}: node '{}' cannot receive photons",
                    link.src, link.dst, link.dst
                )));
            }
        };
        let port = match sim.nodes.get_mut(&link.src) {
            Some(SimNode::Source(source)) => source.claim_port().ok_or_else(|| {
                SimError::Wiring(format!(
                    "link {} -> {}: source '{}' has no free output",
                    link.src, link.dst, link.src
                ))
            })?,
            Some(SimNode::Analyzer(_)) => {
                return Err(SimError::Wiring(format!(
                    "link {} -> {}: node '{}' has no optical output",
                    link.src, link.dst, link.src
                )));
            }
            None => return Err(SimError::UnknownNode(link.src.clone())),
        };

        let channel = QuantumChannel::from_link(link)?;
        debug!(
            channel = %channel.name,
            delay_ps = channel.delay(),
            loss = channel.loss(),
            "quantum channel built"
        );
        let channel = sim.components.push(Component::Channel(channel));
        sim.components.connect(port, channel)?;
        sim.components.connect(channel, entry)
    }
}

impl TopologyBuilder for PhotonicTopologyBuilder {
    #[instrument(skip(self, topology), fields(nodes = topology.num_nodes(), links = topology.links.len()))]
    fn build(&self, topology: &Topology) -> SimResult<SimTopology> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut sim = SimTopology::new(rng);

        for (name, spec) in &topology.nodes {
            let node = Self::build_node(&mut sim, spec)?;
            sim.nodes.insert(name.clone(), node);
        }
        for link in &topology.links {
            Self::build_link(&mut sim, link)?;
        }
        sim.init_components()?;

        debug!(
            components = sim.components.len(),
            pending = sim.pending(),
            "simulation topology built"
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpat_experiment::ParamValue;

    fn bell_topology() -> Topology {
        let mut topo = Topology::new();
        topo.add_node(NodeSpec::new("Source", NodeRole::Source)).unwrap();
        topo.add_node(NodeSpec::new("Alice", NodeRole::PolarizationMeasurement))
            .unwrap();
        topo.add_node(NodeSpec::new("Bob", NodeRole::PolarizationMeasurement))
            .unwrap();
        topo.add_link(QuantumLinkSpec::new("Source", "Alice").with_fiber(10.0, 0.0))
            .unwrap();
        topo.add_link(QuantumLinkSpec::new("Source", "Bob").with_fiber(20.0, 0.0))
            .unwrap();
        topo
    }

    #[test]
    fn test_build_bell_topology() {
        let sim = PhotonicTopologyBuilder::with_seed(1)
            .build(&bell_topology())
            .unwrap();
        // 3 source components, 7 per analyzer, 2 channels
        assert_eq!(sim.components().len(), 3 + 7 + 7 + 2);
        assert_eq!(sim.node_names().collect::<Vec<_>>(), vec!["Alice", "Bob", "Source"]);
        // One dark-count process per detector.
        assert_eq!(sim.pending(), 4);
    }

    #[test]
    fn test_ports_follow_link_order() {
        let sim = PhotonicTopologyBuilder::with_seed(1)
            .build(&bell_topology())
            .unwrap();
        let SimNode::Source(source) = sim.node("Source").unwrap() else {
            panic!("not a source");
        };
        let [port0, _] = source.ports();
        let Component::Port(port) = sim.components().get(port0).unwrap() else {
            panic!("not a port");
        };
        let channel = port.receivers[0];
        assert_eq!(sim.components().get(channel).unwrap().name(), "Source->Alice");
    }

    #[test]
    fn test_analyzer_plates_start_at_configured_angles() {
        let mut topo = bell_topology();
        topo.node_mut("Alice")
            .unwrap()
            .params
            .insert("hwp_angle".into(), ParamValue::from(0.25));
        let mut sim = PhotonicTopologyBuilder::with_seed(1).build(&topo).unwrap();
        assert_eq!(sim.analyzer("Alice").unwrap().hwp_angle().unwrap(), 0.25);
        assert_eq!(sim.analyzer("Bob").unwrap().hwp_angle().unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_link_end() {
        let mut topo = bell_topology();
        topo.links
            .push(QuantumLinkSpec::new("Source", "Charlie"));
        let err = PhotonicTopologyBuilder::new().build(&topo).err().unwrap();
        assert!(matches!(err, SimError::UnknownNode(ref n) if n == "Charlie"));
    }

    #[test]
    fn test_third_link_from_source_fails() {
        let mut topo = bell_topology();
        topo.add_node(NodeSpec::new("Charlie", NodeRole::PolarizationMeasurement))
            .unwrap();
        topo.add_link(QuantumLinkSpec::new("Source", "Charlie")).unwrap();
        let err = PhotonicTopologyBuilder::new().build(&topo).err().unwrap();
        assert!(err.to_string().contains("no free output"));
    }

    #[test]
    fn test_source_without_links_builds() {
        let mut topo = Topology::new();
        topo.add_node(NodeSpec::new("Source", NodeRole::Source)).unwrap();
        // Unconnected ports drop photons.
        assert!(PhotonicTopologyBuilder::new().build(&topo).is_ok());
    }

    #[test]
    fn test_bad_source_params_fail_build() {
        let mut topo = bell_topology();
        topo.node_mut("Source")
            .unwrap()
            .params
            .insert("bell_state".into(), ParamValue::from("phi0"));
        let err = PhotonicTopologyBuilder::new().build(&topo).err().unwrap();
        assert!(matches!(err, SimError::UnknownBellState(_)));
    }
}
