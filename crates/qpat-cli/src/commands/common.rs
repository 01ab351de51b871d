//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use qpat_capabilities::{CapabilityOutcome, ExperimentReport};
use qpat_experiment::{Topology, Workflow, load_topology, load_workflow};

/// Load a topology document.
pub fn read_topology(path: &str) -> Result<Topology> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let topo =
        load_topology(path).with_context(|| format!("Failed to load topology: {path}"))?;
    debug!(path, nodes = topo.num_nodes(), links = topo.links.len(), "topology loaded");
    Ok(topo)
}

/// Load a workflow document.
pub fn read_workflow(path: &str) -> Result<Workflow> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let wf = load_workflow(path).with_context(|| format!("Failed to load workflow: {path}"))?;
    debug!(path, phases = wf.phases.len(), steps = wf.num_steps(), "workflow loaded");
    Ok(wf)
}

fn coincidence(outcome: &CapabilityOutcome, key: &str) -> u64 {
    outcome
        .metadata
        .get("coincidences")
        .and_then(|c| c[key].as_u64())
        .unwrap_or(0)
}

/// Print one line per step with the rate and the four coincidence counts.
pub fn print_report(report: &ExperimentReport) {
    println!(
        "\n{} {} steps (run {})",
        style("✓").green().bold(),
        report.steps.len(),
        style(report.run_id).dim()
    );
    println!(
        "  {:<16} {:<24} {:>14}  {:>6} {:>6} {:>6} {:>6}",
        "phase", "capability", "rate (Hz)", "00", "01", "10", "11"
    );

    for step in &report.steps {
        println!(
            "  {:<16} {:<24} {:>14.4e}  {:>6} {:>6} {:>6} {:>6}",
            style(&step.phase).cyan(),
            step.capability,
            step.outcome.value,
            coincidence(&step.outcome, "00"),
            coincidence(&step.outcome, "01"),
            coincidence(&step.outcome, "10"),
            coincidence(&step.outcome, "11"),
        );
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "\n  Wall time: {} ms",
        style(elapsed.num_milliseconds()).yellow()
    );
}
