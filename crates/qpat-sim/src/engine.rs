//! Simulation engine: build once, then run tasks for a duration.

use qpat_experiment::Topology;
use tracing::{info, instrument, warn};

use crate::builder::TopologyBuilder;
use crate::error::SimResult;
use crate::kernel::Picoseconds;
use crate::task::SimulationTask;
use crate::topology::SimTopology;

/// Drives one simulation of one topology.
///
/// The engine is either unbuilt or built; the builder runs the first time
/// a simulation is needed and never again.
pub struct SimulationEngine<'a> {
    topology: &'a Topology,
    builder: &'a dyn TopologyBuilder,
    sim: Option<SimTopology>,
}

impl<'a> SimulationEngine<'a> {
    /// Create an unbuilt engine.
    pub fn new(topology: &'a Topology, builder: &'a dyn TopologyBuilder) -> Self {
        Self {
            topology,
            builder,
            sim: None,
        }
    }

    /// Whether the simulation graph exists yet.
    pub fn is_built(&self) -> bool {
        self.sim.is_some()
    }

    /// Build the simulation graph if it does not exist yet.
    pub fn build(&mut self) -> SimResult<&mut SimTopology> {
        match &mut self.sim {
            Some(sim) => Ok(sim),
            slot @ None => Ok(slot.insert(self.builder.build(self.topology)?)),
        }
    }

    /// Schedule `tasks` and execute everything due up to `duration`.
    ///
    /// Tasks timed after `duration` stay queued and never run in this call.
    #[instrument(skip(self, tasks), fields(tasks = tasks.len()))]
    pub fn run(
        &mut self,
        duration: Picoseconds,
        tasks: &[SimulationTask],
    ) -> SimResult<&mut SimTopology> {
        let sim = self.build()?;
        sim.schedule_tasks(tasks)?;

        let late = tasks.iter().filter(|t| t.time > duration).count();
        if late > 0 {
            warn!(late, duration, "tasks scheduled after the stop time will not run");
        }

        sim.run_until(duration)?;
        info!(
            executed = sim.executed(),
            pending = sim.pending(),
            now = sim.now(),
            "simulation finished"
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PhotonicTopologyBuilder;
    use crate::error::SimError;
    use std::cell::Cell;

    struct CountingBuilder {
        inner: PhotonicTopologyBuilder,
        calls: Cell<usize>,
    }

    impl TopologyBuilder for CountingBuilder {
        fn build(&self, topology: &Topology) -> SimResult<SimTopology> {
            self.calls.set(self.calls.get() + 1);
            self.inner.build(topology)
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let topo = Topology::new();
        let builder = CountingBuilder {
            inner: PhotonicTopologyBuilder::with_seed(0),
            calls: Cell::new(0),
        };
        let mut engine = SimulationEngine::new(&topo, &builder);
        assert!(!engine.is_built());
        engine.build().unwrap();
        engine.build().unwrap();
        engine.run(1_000, &[]).unwrap();
        assert!(engine.is_built());
        assert_eq!(builder.calls.get(), 1);
    }

    #[test]
    fn test_unknown_target_fails() {
        let topo = Topology::new();
        let builder = PhotonicTopologyBuilder::with_seed(0);
        let mut engine = SimulationEngine::new(&topo, &builder);
        let err = engine
            .run(1_000, &[SimulationTask::emit("Nowhere", 1, 0)])
            .err()
            .unwrap();
        assert!(matches!(err, SimError::UnknownNode(ref n) if n == "Nowhere"));
    }
}
