//! End-to-end tests: topology → builder → engine → analyzer readout.

use std::collections::HashSet;

use qpat_experiment::{NodeRole, NodeSpec, QuantumLinkSpec, Topology};
use qpat_sim::{
    AnalyzerBasis, PhotonicTopologyBuilder, SimError, SimulationEngine, SimulationTask,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn analyzer(name: &str) -> NodeSpec {
    NodeSpec::new(name, NodeRole::PolarizationMeasurement)
        .with_param("dark_count", 0.0)
        .with_param("efficiency", 1.0)
}

fn bell_topology(mean_photon_num: f64, statistics: &str) -> Topology {
    let mut topo = Topology::new();
    topo.add_node(
        NodeSpec::new("Source", NodeRole::Source)
            .with_param("mean_photon_num", mean_photon_num)
            .with_param("photon_statistics", statistics),
    )
    .unwrap();
    topo.add_node(analyzer("Alice")).unwrap();
    topo.add_node(analyzer("Bob")).unwrap();
    topo.add_link(QuantumLinkSpec::new("Source", "Alice")).unwrap();
    topo.add_link(QuantumLinkSpec::new("Source", "Bob")).unwrap();
    topo
}

fn overlap(a: &[u64], b: &[u64]) -> usize {
    let set: HashSet<_> = a.iter().collect();
    b.iter().filter(|t| set.contains(t)).count()
}

/// Same-channel and cross-channel equal-time coincidences between Alice and Bob.
fn correlations(basis: AnalyzerBasis, seed: u64) -> (usize, usize) {
    let topo = bell_topology(0.05, "poisson");
    let builder = PhotonicTopologyBuilder::with_seed(seed);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let (qwp, hwp) = basis.angles();
    let tasks = [
        SimulationTask::new("Alice", "set_qwp_angle", 0).with_arg(qwp),
        SimulationTask::new("Alice", "set_hwp_angle", 0).with_arg(hwp),
        SimulationTask::new("Bob", "set_qwp_angle", 0).with_arg(qwp),
        SimulationTask::new("Bob", "set_hwp_angle", 0).with_arg(hwp),
        SimulationTask::emit("Source", 4_000, 0),
    ];
    let sim = engine.run(100_000_000, &tasks).unwrap();

    let [a0, a1] = sim.analyzer("Alice").unwrap().get_detection_counts().unwrap();
    let [b0, b1] = sim.analyzer("Bob").unwrap().get_detection_counts().unwrap();
    let same = overlap(&a0, &b0) + overlap(&a1, &b1);
    let cross = overlap(&a0, &b1) + overlap(&a1, &b0);
    (same, cross)
}

// ---------------------------------------------------------------------------
// Physics
// ---------------------------------------------------------------------------

#[test]
fn test_psi_plus_is_anticorrelated_in_z() {
    let (same, cross) = correlations(AnalyzerBasis::Z, 11);
    assert!(cross > 50, "cross = {cross}");
    assert!(cross > 10 * same, "same = {same}, cross = {cross}");
}

#[test]
fn test_psi_plus_is_correlated_in_x() {
    let (same, cross) = correlations(AnalyzerBasis::X, 12);
    assert!(same > 50, "same = {same}");
    assert!(same > 10 * cross, "same = {same}, cross = {cross}");
}

#[test]
fn test_poisson_zero_mean_never_emits() {
    let topo = bell_topology(0.0, "poisson");
    let builder = PhotonicTopologyBuilder::with_seed(5);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let sim = engine
        .run(10_000_000, &[SimulationTask::emit("Source", 500, 0)])
        .unwrap();

    let source = sim.source("Source").unwrap();
    assert_eq!(source.pulses_emitted().unwrap(), 500);
    assert_eq!(source.pairs_emitted().unwrap(), 0);
    assert_eq!(source.emission_count().unwrap(), 0);

    let [h, v] = sim.analyzer("Alice").unwrap().get_detection_counts().unwrap();
    assert!(h.is_empty() && v.is_empty());
}

#[test]
fn test_every_pair_leaves_through_port_zero() {
    let topo = bell_topology(0.2, "thermal");
    let builder = PhotonicTopologyBuilder::with_seed(8);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let sim = engine
        .run(100_000_000, &[SimulationTask::emit("Source", 1_000, 0)])
        .unwrap();

    let source = sim.source("Source").unwrap();
    let pairs = source.pairs_emitted().unwrap();
    assert!(pairs > 0);
    assert_eq!(source.emission_count().unwrap() as u64, pairs);
    assert_eq!(sim.live_states(), 0);
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_target_leaves_kernel_untouched() {
    let topo = bell_topology(0.1, "thermal");
    let builder = PhotonicTopologyBuilder::with_seed(1);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let pending = engine.build().unwrap().pending();

    let tasks = [
        SimulationTask::emit("Source", 10, 0),
        SimulationTask::new("Carol", "set_basis", 0).with_arg("Z"),
    ];
    let err = engine.run(1_000_000, &tasks).err().unwrap();
    assert!(matches!(err, SimError::UnknownNode(ref n) if n == "Carol"));
    assert_eq!(engine.build().unwrap().pending(), pending);
}

#[test]
fn test_missing_method_leaves_kernel_untouched() {
    let topo = bell_topology(0.1, "thermal");
    let builder = PhotonicTopologyBuilder::with_seed(1);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let sim = engine.build().unwrap();
    let pending = sim.pending();

    let tasks = [
        SimulationTask::emit("Source", 10, 0),
        SimulationTask::new("Alice", "emit", 0).with_arg(1u64),
    ];
    assert!(matches!(
        sim.schedule_tasks(&tasks),
        Err(SimError::MissingMethod { .. })
    ));
    assert_eq!(sim.pending(), pending);
}

#[test]
fn test_tasks_after_stop_time_do_not_run() {
    let topo = bell_topology(0.1, "thermal");
    let builder = PhotonicTopologyBuilder::with_seed(2);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let tasks = [SimulationTask::new("Alice", "set_hwp_angle", 2_000).with_arg(0.7)];
    let sim = engine.run(1_000, &tasks).unwrap();

    assert_eq!(sim.analyzer("Alice").unwrap().hwp_angle().unwrap(), 0.0);
    assert_eq!(sim.pending(), 1);
}

#[test]
fn test_scheduled_basis_change() {
    let topo = bell_topology(0.1, "thermal");
    let builder = PhotonicTopologyBuilder::with_seed(3);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let tasks = [SimulationTask::new("Bob", "set_basis", 500).with_kwarg("basis", "y")];
    let sim = engine.run(1_000, &tasks).unwrap();

    let bob = sim.analyzer("Bob").unwrap();
    assert_eq!(bob.qwp_angle().unwrap(), 45f64.to_radians());
    assert_eq!(bob.hwp_angle().unwrap(), 0.0);
}

// ---------------------------------------------------------------------------
// Analyzer API
// ---------------------------------------------------------------------------

#[test]
fn test_basis_round_trip() {
    let topo = bell_topology(0.1, "thermal");
    let builder = PhotonicTopologyBuilder::with_seed(4);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let sim = engine.build().unwrap();
    let mut alice = sim.analyzer("Alice").unwrap();

    for (label, qwp_deg, hwp_deg) in [("Z", 0.0, 0.0), ("X", 0.0, 22.5), ("Y", 45.0, 0.0)] {
        alice.set_basis(label).unwrap();
        assert!((alice.qwp_angle().unwrap() - f64::to_radians(qwp_deg)).abs() < 1e-12);
        assert!((alice.hwp_angle().unwrap() - f64::to_radians(hwp_deg)).abs() < 1e-12);
    }

    let err = alice.set_basis("W").unwrap_err();
    assert!(matches!(err, SimError::UnknownBasis(_)));
}

#[test]
fn test_drain_resets_timestamps() {
    let topo = bell_topology(0.3, "thermal");
    let builder = PhotonicTopologyBuilder::with_seed(9);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let sim = engine
        .run(100_000_000, &[SimulationTask::emit("Source", 2_000, 0)])
        .unwrap();

    let mut alice = sim.analyzer("Alice").unwrap();
    let [h, v] = alice.get_detection_counts().unwrap();
    assert!(!h.is_empty() || !v.is_empty());
    assert!(h.windows(2).all(|w| w[0] <= w[1]));

    let [h, v] = alice.get_detection_counts().unwrap();
    assert!(h.is_empty() && v.is_empty());
}

#[test]
fn test_source_is_not_an_analyzer() {
    let topo = bell_topology(0.1, "thermal");
    let builder = PhotonicTopologyBuilder::with_seed(4);
    let mut engine = SimulationEngine::new(&topo, &builder);
    let sim = engine.build().unwrap();
    assert!(matches!(
        sim.analyzer("Source"),
        Err(SimError::Configuration(_))
    ));
    assert!(matches!(sim.analyzer("Eve"), Err(SimError::UnknownNode(_))));
}
