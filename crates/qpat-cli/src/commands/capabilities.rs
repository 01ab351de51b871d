//! Capabilities command implementation.

use console::style;

use qpat_capabilities::{CapabilityFactory, PolarizationAnalysisCapability};

fn describe(name: &str) -> &'static str {
    match name {
        PolarizationAnalysisCapability::NAME => {
            "coincidence rate between two analyzers (alice_angle, bob_angle, emission_time, frequency)"
        }
        _ => "",
    }
}

/// Execute the capabilities command.
pub fn execute() {
    println!("{}", style("Available capabilities:").bold());
    for name in CapabilityFactory::AVAILABLE {
        println!("  {:<24} {}", style(name).cyan(), describe(name));
    }
}
