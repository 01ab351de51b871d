//! QPAT Command-Line Interface
//!
//! Loads a topology and a workflow from YAML, runs every workflow step on
//! the photonic simulator and prints the resulting coincidence rates.
//!
//! ```text
//! qpat run -t topology.yaml -w workflow.yaml --seed 7
//! qpat validate -t topology.yaml -w workflow.yaml
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{capabilities, run, validate, version};

/// QPAT - quantum photonic experiment simulation
#[derive(Parser)]
#[command(name = "qpat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow against a topology
    Run {
        /// Topology YAML file
        #[arg(short, long)]
        topology: String,

        /// Workflow YAML file
        #[arg(short, long)]
        workflow: String,

        /// RNG seed for reproducible runs
        #[arg(long, env = "QPAT_SEED")]
        seed: Option<u64>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write the JSON report to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Coincidence window in nanoseconds
        #[arg(long, default_value = "1.0")]
        window_ns: f64,

        /// Coincidence method (window, binned)
        #[arg(long, default_value = "window")]
        method: String,

        /// Source node name
        #[arg(long, default_value = "Source")]
        source: String,

        /// First analyzer node name
        #[arg(long, default_value = "Alice")]
        alice: String,

        /// Second analyzer node name
        #[arg(long, default_value = "Bob")]
        bob: String,
    },

    /// Check that a topology builds and a workflow names known capabilities
    Validate {
        /// Topology YAML file
        #[arg(short, long)]
        topology: String,

        /// Workflow YAML file
        #[arg(short, long)]
        workflow: Option<String>,
    },

    /// List available capabilities
    Capabilities,

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run {
            topology,
            workflow,
            seed,
            format,
            output,
            window_ns,
            method,
            source,
            alice,
            bob,
        } => run::execute(
            &topology,
            &workflow,
            run::RunOptions {
                seed,
                format: &format,
                output: output.as_deref(),
                window_ns,
                method: &method,
                nodes: [source, alice, bob],
            },
        ),

        Commands::Validate { topology, workflow } => {
            validate::execute(&topology, workflow.as_deref())
        }

        Commands::Capabilities => {
            capabilities::execute();
            Ok(())
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
