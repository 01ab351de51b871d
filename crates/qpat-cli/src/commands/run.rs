//! Run command implementation.

use std::fs;

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use qpat_analysis::CoincidenceMethod;
use qpat_capabilities::{CapabilityFactory, ExperimentOrchestrator, FactoryConfig};

use super::common::{print_report, read_topology, read_workflow};

/// Options for a workflow run beyond the two input files.
pub struct RunOptions<'a> {
    pub seed: Option<u64>,
    pub format: &'a str,
    pub output: Option<&'a str>,
    pub window_ns: f64,
    pub method: &'a str,
    /// Source, first analyzer and second analyzer node names.
    pub nodes: [String; 3],
}

/// Build the factory configuration from command-line options.
pub fn factory_config(options: &RunOptions<'_>) -> Result<FactoryConfig> {
    let method: CoincidenceMethod = options
        .method
        .parse()
        .map_err(|e| anyhow::anyhow!("{e}. Available: window, binned"))?;
    let [source, alice, bob] = options.nodes.clone();
    Ok(FactoryConfig {
        source,
        alice,
        bob,
        window: options.window_ns * 1e-9,
        method,
        seed: options.seed,
    })
}

/// Execute the run command.
pub fn execute(topology: &str, workflow: &str, options: RunOptions<'_>) -> Result<()> {
    println!(
        "{} Running {} on {}",
        style("→").cyan().bold(),
        style(workflow).green(),
        style(topology).yellow()
    );

    let config = factory_config(&options)?;
    let topo = read_topology(topology)?;
    let wf = read_workflow(workflow)?;
    println!(
        "  Loaded: {} nodes, {} links, {} phases, {} steps",
        topo.num_nodes(),
        topo.links.len(),
        wf.phases.len(),
        wf.num_steps()
    );
    if let Some(seed) = config.seed {
        println!("  Seed: {}", style(seed).yellow());
    }

    let orchestrator = ExperimentOrchestrator::new(topo, wf, CapabilityFactory::new(config));
    let report = orchestrator.run_report()?;
    info!(run_id = %report.run_id, steps = report.steps.len(), "workflow finished");

    match options.format {
        "json" => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        "table" => print_report(&report),
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }

    if let Some(path) = options.output {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("Failed to write report: {path}"))?;
        info!(path, "report saved");
        println!("  Report written to {}", style(path).green());
    }

    Ok(())
}
