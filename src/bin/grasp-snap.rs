//! Grasp snapshot CLI tool
//!
//! Command-line interface for capturing before/after camera frames of a
//! simulated grasp task with the grasp-snap library.

#[cfg(feature = "cli")]
use grasp_snap::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
