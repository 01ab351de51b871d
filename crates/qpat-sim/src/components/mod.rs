//! Optical components and the arena that wires them together.
//!
//! Components never hold references to each other. Each one keeps an
//! index-based receiver list into the [`Components`] arena, and returns a
//! [`Routing`] decision instead of calling its successor directly; the
//! simulation dispatch loop follows the decision.

pub mod beam_splitter;
pub mod channel;
pub mod detector;
pub mod light_source;
pub mod wave_plate;

use rand::rngs::StdRng;

use crate::error::{SimError, SimResult};
use crate::kernel::{Picoseconds, Timeline};
use crate::nodes::NodeCall;
use crate::photon::Photon;
use crate::state::QuantumManager;

pub use beam_splitter::FixedBasisBeamSplitter;
pub use channel::QuantumChannel;
pub use detector::{DetectorConfig, FixedBasisPolarizationDetector, PhotonDetector};
pub use light_source::{BellState, PhotonStatistics, SourcePort, SpdcBellSource};
pub use wave_plate::{PlateKind, WavePlate, jones_matrix};

/// Index of a component in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

/// An entry on the simulation timeline.
#[derive(Debug)]
pub enum Action {
    /// Hand a photon to a component.
    Deliver {
        /// Receiving component.
        to: ComponentId,
        /// Photon in flight.
        photon: Photon,
    },
    /// Invoke a node method scheduled by a task.
    Invoke {
        /// Target node.
        node: String,
        /// Resolved call.
        call: NodeCall,
    },
    /// A detector's dark-count process fires.
    DarkCount {
        /// Detector that fires.
        detector: ComponentId,
    },
}

/// Mutable simulation state a component may touch while handling a photon.
pub struct SimContext<'a> {
    /// Event queue.
    pub timeline: &'a mut Timeline<Action>,
    /// Shared random source.
    pub rng: &'a mut StdRng,
    /// Live kets.
    pub states: &'a mut QuantumManager,
}

impl<'a> SimContext<'a> {
    /// Borrow the pieces of a simulation as a context.
    pub fn new(
        timeline: &'a mut Timeline<Action>,
        rng: &'a mut StdRng,
        states: &'a mut QuantumManager,
    ) -> Self {
        Self {
            timeline,
            rng,
            states,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> Picoseconds {
        self.timeline.now()
    }

    /// Photon leaves the simulation (absorbed or lost).
    pub fn release(&mut self, photon: Photon) {
        self.states.release(photon.state);
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        use rand::Rng;
        self.rng.r#gen::<f64>()
    }
}

/// What happens to a photon after a component handled it.
#[derive(Debug)]
pub enum Routing {
    /// Pass it on immediately.
    Forward(ComponentId, Photon),
    /// A detector clicked; the observer records the timestamp.
    Detected {
        /// Composite detector collecting timestamps.
        observer: ComponentId,
        /// Which of the observer's detectors clicked.
        channel: usize,
        /// Recorded (resolution-rounded) timestamp.
        time: Picoseconds,
    },
    /// Nothing further now: absorbed, lost, or rescheduled on the timeline.
    Done,
}

/// Every component kind the builder can instantiate.
pub enum Component {
    /// Entangled pair source.
    Source(SpdcBellSource),
    /// Source output port.
    Port(SourcePort),
    /// Fibre between nodes.
    Channel(QuantumChannel),
    /// Half- or quarter-wave plate.
    WavePlate(WavePlate),
    /// Fixed-basis polarizing beam splitter.
    BeamSplitter(FixedBasisBeamSplitter),
    /// Single-photon detector.
    Detector(PhotonDetector),
    /// Beam splitter + two detectors, collecting timestamps.
    PolarizationDetector(FixedBasisPolarizationDetector),
}

impl Component {
    /// Component name.
    pub fn name(&self) -> &str {
        match self {
            Component::Source(c) => &c.name,
            Component::Port(c) => &c.name,
            Component::Channel(c) => &c.name,
            Component::WavePlate(c) => &c.name,
            Component::BeamSplitter(c) => &c.name,
            Component::Detector(c) => &c.name,
            Component::PolarizationDetector(c) => &c.name,
        }
    }

    /// Connect a downstream receiver.
    pub fn add_receiver(&mut self, receiver: ComponentId) -> SimResult<()> {
        match self {
            Component::Source(c) => c.receivers.push(receiver),
            Component::Port(c) => c.receivers.push(receiver),
            Component::Channel(c) => c.receiver = Some(receiver),
            Component::WavePlate(c) => c.receivers.push(receiver),
            Component::BeamSplitter(c) => c.receivers.push(receiver),
            Component::Detector(_) | Component::PolarizationDetector(_) => {
                return Err(SimError::Wiring(format!(
                    "'{}' is a sink and cannot forward photons",
                    self.name()
                )));
            }
        }
        Ok(())
    }

    /// Validate wiring and start any self-scheduled processes.
    pub fn init(&mut self, id: ComponentId, ctx: &mut SimContext<'_>) -> SimResult<()> {
        match self {
            Component::Source(c) => c.init(),
            Component::WavePlate(c) => c.init(),
            Component::BeamSplitter(c) => c.init(),
            Component::Detector(c) => c.init(id, ctx),
            Component::Port(_) | Component::Channel(_) | Component::PolarizationDetector(_) => {
                Ok(())
            }
        }
    }

    /// Handle an arriving photon.
    pub fn receive(&mut self, photon: Photon, ctx: &mut SimContext<'_>) -> SimResult<Routing> {
        match self {
            Component::Port(c) => Ok(c.receive(photon, ctx)),
            Component::Channel(c) => c.receive(photon, ctx),
            Component::WavePlate(c) => c.receive(photon, ctx),
            Component::BeamSplitter(c) => c.receive(photon, ctx),
            Component::Detector(c) => Ok(c.receive(photon, ctx)),
            Component::PolarizationDetector(c) => Ok(c.receive(photon)),
            Component::Source(c) => {
                ctx.release(photon);
                Err(SimError::Wiring(format!(
                    "source '{}' cannot receive photons",
                    c.name
                )))
            }
        }
    }
}

macro_rules! typed_access {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty, $label:literal) => {
        /// Typed read access.
        pub fn $get(&self, id: ComponentId) -> SimResult<&$ty> {
            match self.get(id)? {
                Component::$variant(c) => Ok(c),
                other => Err(SimError::Wiring(format!(
                    "component '{}' is not a {}",
                    other.name(),
                    $label
                ))),
            }
        }

        /// Typed write access.
        pub fn $get_mut(&mut self, id: ComponentId) -> SimResult<&mut $ty> {
            match self.get_mut(id)? {
                Component::$variant(c) => Ok(c),
                other => Err(SimError::Wiring(format!(
                    "component '{}' is not a {}",
                    other.name(),
                    $label
                ))),
            }
        }
    };
}

/// Arena of components addressed by [`ComponentId`].
#[derive(Default)]
pub struct Components {
    items: Vec<Component>,
}

impl Components {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component and return its id.
    pub fn push(&mut self, component: Component) -> ComponentId {
        self.items.push(component);
        ComponentId(self.items.len() - 1)
    }

    /// Add a directed edge `from → to`.
    pub fn connect(&mut self, from: ComponentId, to: ComponentId) -> SimResult<()> {
        self.get(to)?;
        self.get_mut(from)?.add_receiver(to)
    }

    /// Look up a component.
    pub fn get(&self, id: ComponentId) -> SimResult<&Component> {
        self.items
            .get(id.0)
            .ok_or_else(|| SimError::Wiring(format!("no component with id {}", id.0)))
    }

    /// Look up a component mutably.
    pub fn get_mut(&mut self, id: ComponentId) -> SimResult<&mut Component> {
        self.items
            .get_mut(id.0)
            .ok_or_else(|| SimError::Wiring(format!("no component with id {}", id.0)))
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate mutably with ids.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ComponentId, &mut Component)> {
        self.items
            .iter_mut()
            .enumerate()
            .map(|(i, c)| (ComponentId(i), c))
    }

    typed_access!(source, source_mut, Source, SpdcBellSource, "light source");
    typed_access!(port, port_mut, Port, SourcePort, "source port");
    typed_access!(wave_plate, wave_plate_mut, WavePlate, WavePlate, "wave plate");
    typed_access!(detector, detector_mut, Detector, PhotonDetector, "detector");
    typed_access!(
        polarization_detector,
        polarization_detector_mut,
        PolarizationDetector,
        FixedBasisPolarizationDetector,
        "polarization detector"
    );
}
