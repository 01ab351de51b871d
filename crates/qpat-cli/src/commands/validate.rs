//! Validate command implementation.
//!
//! Builds the simulation graph once without running it, so wiring mistakes
//! show up before a long workflow starts.

use anyhow::Result;
use console::style;
use tracing::debug;

use qpat_capabilities::CapabilityFactory;
use qpat_sim::{PhotonicTopologyBuilder, TopologyBuilder};

use super::common::{read_topology, read_workflow};

/// Execute the validate command.
pub fn execute(topology: &str, workflow: Option<&str>) -> Result<()> {
    let topo = read_topology(topology)?;
    topo.validate_links()?;

    let sim = PhotonicTopologyBuilder::with_seed(0)
        .build(&topo)
        .map_err(|e| anyhow::anyhow!("Topology does not build: {e}"))?;
    debug!(components = sim.components().len(), "simulation graph built");
    println!(
        "{} {}: {} nodes, {} components",
        style("✓").green().bold(),
        style(topology).green(),
        topo.num_nodes(),
        sim.components().len()
    );

    let Some(workflow) = workflow else {
        return Ok(());
    };
    let wf = read_workflow(workflow)?;
    for phase in &wf.phases {
        for step in &phase.steps {
            if !CapabilityFactory::AVAILABLE.contains(&step.capability.as_str()) {
                anyhow::bail!(
                    "Phase '{}' uses unknown capability '{}'. Available: {}",
                    phase.name,
                    step.capability,
                    CapabilityFactory::AVAILABLE.join(", ")
                );
            }
        }
    }
    println!(
        "{} {}: {} phases, {} steps",
        style("✓").green().bold(),
        style(workflow).green(),
        wf.phases.len(),
        wf.num_steps()
    );

    Ok(())
}
