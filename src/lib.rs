#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Grasp Snapshot Library
//!
//! Captures "before" and "after" camera snapshots of simulated robot grasp
//! tasks. A run launches a simulator headlessly with RGB-only cameras at
//! three viewpoints (front, wrist, left shoulder), resets one grasp task,
//! saves the initial frames, applies a few random joint-velocity actions and
//! saves the frames of the final step.
//!
//! ## Features
//!
//! - **Task Registry**: grasp/lift tasks discovered from the simulator, addressable
//!   by class name (`PickAndLift`) or snake_case alias (`pick_and_lift`)
//! - **Simulator Seam**: the [`Simulator`] trait, with a built-in kinematic
//!   [`TabletopSimulator`] that renders its own frames
//! - **Best-effort Output**: a frame that cannot be written is logged and skipped
//! - **Reproducible Runs**: seeded action sampling and per-variation scene layouts
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grasp_snap::{capture_snapshots, SnapConfig, TabletopSimulator};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = SnapConfig::builder()
//!     .output_dir("/tmp/snaps")
//!     .resolution(320, 240)
//!     .steps(3)
//!     .variation(Some(0))
//!     .seed(Some(7))
//!     .build()?;
//!
//! let summary = capture_snapshots(&TabletopSimulator::new(), "pick_and_lift", &config)?;
//! for path in summary.written_files() {
//!     println!("{}", path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface and tracing subscriber setup
//! - `tracing-json`: JSON structured log output for the CLI

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod services;
pub mod sim;
pub mod tasks;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Public API exports
pub use config::{CameraCapabilities, CameraConfig, ObservationConfig, SnapConfig, SnapConfigBuilder};
pub use error::{Result, SnapError};
pub use runner::{ActionSampler, CaptureReport, Clock, RunSummary, SnapshotRunner, SystemClock};
pub use services::{FrameOutcome, FrameWriter};
pub use sim::{
    ActionMode, ArmActionMode, GripperActionMode, LaunchSettings, SessionGuard, Simulator,
    SimulatorSession, TabletopSimulator, TaskClass,
};
pub use tasks::{snake_case, TaskRegistry, CANDIDATE_TASKS};
pub use types::{CapturePhase, Observation, RgbFrame, SnapshotTag, StepOutcome, Viewpoint};
pub use utils::PathExpander;

#[cfg(feature = "cli")]
pub use tracing_config::{cli_format, init_cli_tracing, TracingConfig, TracingFormat};

/// Capture one before/after snapshot set of a grasp task
///
/// `task` is a class name or its snake_case alias, resolved against the
/// candidate tasks `simulator` exports. Actions are drawn from a generator
/// seeded with `config.seed`, or from OS entropy when it is unset.
///
/// # Errors
/// - `SnapError::NoCandidateTasks` when the simulator exports no grasp task
/// - `SnapError::UnknownTask` when `task` is not registered
/// - Any simulator or configuration error raised during the run
pub fn capture_snapshots(
    simulator: &dyn Simulator,
    task: &str,
    config: &SnapConfig,
) -> Result<RunSummary> {
    let registry = TaskRegistry::discover(simulator)?;
    let class = registry.resolve(task)?;
    let mut rng = config.seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
    SnapshotRunner::new(simulator).run(task, &class, config, &mut rng)
}
