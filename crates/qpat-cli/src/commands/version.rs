//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - quantum photonic experiment simulation",
        style("QPAT").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qpat-experiment    Topology and workflow model");
    println!("  qpat-sim           Discrete-event photonic simulator");
    println!("  qpat-analysis      Coincidence counting");
    println!("  qpat-capabilities  Capabilities and orchestration");
    println!("  qpat-cli           Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style(env!("CARGO_PKG_REPOSITORY")).underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
