//! A built, runnable simulation graph.

use rand::rngs::StdRng;
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::components::{Action, ComponentId, Components, Routing, SimContext};
use crate::error::{SimError, SimResult};
use crate::kernel::{Picoseconds, Timeline};
use crate::nodes::{AnalyzerBasis, NodeCall, PolarizationAnalyzer, SimNode, SourceNode};
use crate::photon::Photon;
use crate::state::QuantumManager;
use crate::task::SimulationTask;

/// Timeline, component arena, named nodes, live quantum states and the
/// random source of one simulation.
pub struct SimTopology {
    pub(crate) timeline: Timeline<Action>,
    pub(crate) components: Components,
    pub(crate) nodes: BTreeMap<String, SimNode>,
    pub(crate) states: QuantumManager,
    pub(crate) rng: StdRng,
}

impl SimTopology {
    pub(crate) fn new(rng: StdRng) -> Self {
        Self {
            timeline: Timeline::new(),
            components: Components::new(),
            nodes: BTreeMap::new(),
            states: QuantumManager::new(),
            rng,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> Picoseconds {
        self.timeline.now()
    }

    /// Actions still queued.
    pub fn pending(&self) -> usize {
        self.timeline.pending()
    }

    /// Actions executed so far.
    pub fn executed(&self) -> u64 {
        self.timeline.executed()
    }

    /// Kets still referenced by photons in flight.
    pub fn live_states(&self) -> usize {
        self.states.len()
    }

    /// Component arena.
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Node names in sorted order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Look up a node.
    pub fn node(&self, name: &str) -> SimResult<&SimNode> {
        self.nodes
            .get(name)
            .ok_or_else(|| SimError::UnknownNode(name.to_string()))
    }

    /// Run `init` on every component.
    pub(crate) fn init_components(&mut self) -> SimResult<()> {
        for (id, component) in self.components.iter_mut() {
            let mut ctx = SimContext::new(&mut self.timeline, &mut self.rng, &mut self.states);
            component.init(id, &mut ctx)?;
        }
        Ok(())
    }

    /// Resolve tasks against the nodes and put them on the timeline.
    ///
    /// Every task is validated first; if any fails, nothing is scheduled.
    pub fn schedule_tasks(&mut self, tasks: &[SimulationTask]) -> SimResult<()> {
        let now = self.timeline.now();
        let resolved = tasks
            .iter()
            .map(|task| {
                let node = self.node(&task.target)?;
                let call = node.resolve_call(&task.method, &task.args, &task.kwargs)?;
                if task.time < now {
                    return Err(SimError::ScheduleInPast {
                        time: task.time,
                        now,
                    });
                }
                Ok((task.time, task.target.clone(), call))
            })
            .collect::<SimResult<Vec<_>>>()?;

        for (time, node, call) in resolved {
            debug!(node = %node, ?call, time, "task scheduled");
            self.timeline.schedule(time, Action::Invoke { node, call })?;
        }
        Ok(())
    }

    /// Execute queued actions up to and including `stop`.
    pub fn run_until(&mut self, stop: Picoseconds) -> SimResult<()> {
        self.timeline.set_stop_time(stop);
        while let Some((time, action)) = self.timeline.pop_due() {
            trace!(time, ?action, "execute");
            self.execute(action)?;
        }
        Ok(())
    }

    fn execute(&mut self, action: Action) -> SimResult<()> {
        match action {
            Action::Deliver { to, photon } => self.deliver(to, photon),
            Action::Invoke { node, call } => self.invoke(&node, call),
            Action::DarkCount { detector } => {
                let mut ctx = SimContext::new(&mut self.timeline, &mut self.rng, &mut self.states);
                let routing = self
                    .components
                    .detector_mut(detector)?
                    .on_dark_count(detector, &mut ctx)?;
                self.settle(routing).map(|_| ())
            }
        }
    }

    /// Pass a photon along until it is absorbed, lost or put back on the
    /// timeline.
    fn deliver(&mut self, to: ComponentId, photon: Photon) -> SimResult<()> {
        let mut next = Some((to, photon));
        while let Some((id, photon)) = next.take() {
            let mut ctx = SimContext::new(&mut self.timeline, &mut self.rng, &mut self.states);
            let routing = self.components.get_mut(id)?.receive(photon, &mut ctx)?;
            next = self.settle(routing)?;
        }
        Ok(())
    }

    fn settle(&mut self, routing: Routing) -> SimResult<Option<(ComponentId, Photon)>> {
        match routing {
            Routing::Forward(id, photon) => Ok(Some((id, photon))),
            Routing::Detected {
                observer,
                channel,
                time,
            } => {
                self.components
                    .polarization_detector_mut(observer)?
                    .record(channel, time)?;
                Ok(None)
            }
            Routing::Done => Ok(None),
        }
    }

    fn invoke(&mut self, node: &str, call: NodeCall) -> SimResult<()> {
        let source = match self.node(node)? {
            SimNode::Source(source) => Some(source.source()),
            SimNode::Analyzer(_) => None,
        };
        match (source, call) {
            (Some(id), NodeCall::Emit { num_pulses }) => {
                let mut ctx = SimContext::new(&mut self.timeline, &mut self.rng, &mut self.states);
                self.components.source_mut(id)?.emit(num_pulses, &mut ctx)
            }
            (None, NodeCall::SetQwpAngle(theta)) => self.analyzer(node)?.set_qwp_angle(theta),
            (None, NodeCall::SetHwpAngle(theta)) => self.analyzer(node)?.set_hwp_angle(theta),
            (None, NodeCall::SetBasis(basis)) => self.analyzer(node)?.apply_basis(basis),
            (_, call) => Err(SimError::MissingMethod {
                node: node.to_string(),
                method: call.method().to_string(),
            }),
        }
    }

    /// Control and read out a polarization analyzer.
    pub fn analyzer(&mut self, name: &str) -> SimResult<AnalyzerView<'_>> {
        match self.nodes.get(name) {
            Some(SimNode::Analyzer(node)) => Ok(AnalyzerView {
                node,
                components: &mut self.components,
            }),
            Some(_) => Err(SimError::Configuration(format!(
                "node '{name}' is not a polarization analyzer"
            ))),
            None => Err(SimError::UnknownNode(name.to_string())),
        }
    }

    /// Read a source node's counters.
    pub fn source(&self, name: &str) -> SimResult<SourceView<'_>> {
        match self.node(name)? {
            SimNode::Source(node) => Ok(SourceView {
                node,
                components: &self.components,
            }),
            SimNode::Analyzer(_) => Err(SimError::Configuration(format!(
                "node '{name}' is not a source"
            ))),
        }
    }
}

/// Borrowed handle on one analyzer node.
pub struct AnalyzerView<'a> {
    node: &'a PolarizationAnalyzer,
    components: &'a mut Components,
}

impl AnalyzerView<'_> {
    /// Node name.
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Rotate the quarter-wave plate (rad).
    pub fn set_qwp_angle(&mut self, theta: f64) -> SimResult<()> {
        self.components
            .wave_plate_mut(self.node.qwp())?
            .set_angle(theta);
        Ok(())
    }

    /// Rotate the half-wave plate (rad).
    pub fn set_hwp_angle(&mut self, theta: f64) -> SimResult<()> {
        self.components
            .wave_plate_mut(self.node.hwp())?
            .set_angle(theta);
        Ok(())
    }

    /// Apply a basis preset by label: `Z`, `X` or `Y`, any case.
    pub fn set_basis(&mut self, label: &str) -> SimResult<()> {
        self.apply_basis(label.parse()?)
    }

    /// Apply a basis preset.
    pub fn apply_basis(&mut self, basis: AnalyzerBasis) -> SimResult<()> {
        let (qwp, hwp) = basis.angles();
        self.set_qwp_angle(qwp)?;
        self.set_hwp_angle(hwp)
    }

    /// Quarter-wave plate angle (rad).
    pub fn qwp_angle(&self) -> SimResult<f64> {
        Ok(self.components.wave_plate(self.node.qwp())?.angle())
    }

    /// Half-wave plate angle (rad).
    pub fn hwp_angle(&self) -> SimResult<f64> {
        Ok(self.components.wave_plate(self.node.hwp())?.angle())
    }

    /// Take the click timestamps of both detectors, resetting them.
    pub fn get_detection_counts(&mut self) -> SimResult<[Vec<Picoseconds>; 2]> {
        Ok(self
            .components
            .polarization_detector_mut(self.node.detector())?
            .drain_photon_times())
    }
}

/// Borrowed read-only handle on one source node.
pub struct SourceView<'a> {
    node: &'a SourceNode,
    components: &'a Components,
}

impl SourceView<'_> {
    /// Node name.
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Pulses fired so far.
    pub fn pulses_emitted(&self) -> SimResult<u64> {
        Ok(self.components.source(self.node.source())?.pulses_emitted())
    }

    /// Pairs created so far.
    pub fn pairs_emitted(&self) -> SimResult<u64> {
        Ok(self.components.source(self.node.source())?.pairs_emitted())
    }

    /// Photons that left through output "0".
    pub fn emission_count(&self) -> SimResult<usize> {
        Ok(self.emission_times()?.len())
    }

    /// Departure times of photons through output "0".
    pub fn emission_times(&self) -> SimResult<&[Picoseconds]> {
        Ok(self.components.port(self.node.ports()[0])?.sent_times())
    }
}
