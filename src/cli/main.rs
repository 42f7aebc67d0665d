//! Grasp snapshot CLI tool
//!
//! Launches the simulator headlessly, captures the initial and post-action
//! camera frames of one grasp task and prints where they went.

use super::config::CliConfigBuilder;
use crate::{
    config::{DEFAULT_HEIGHT, DEFAULT_STEPS, DEFAULT_WIDTH},
    runner::SnapshotRunner,
    sim::{Simulator, TabletopSimulator},
    tasks::TaskRegistry,
};
use anyhow::{Context, Result};
use clap::{builder::PossibleValuesParser, CommandFactory, FromArgMatches, Parser};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::ffi::OsString;
use std::io::{self, Write};
use tracing::{debug, info};

/// Capture before/after camera snapshots of a simulated grasp task
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "grasp-snap")]
pub struct Cli {
    /// Task to run, by class name or snake_case alias
    #[arg(long, required_unless_present = "list_tasks")]
    pub task: Option<String>,

    /// Output directory (environment variables are expanded, parents created)
    #[arg(long, value_name = "DIR", required_unless_present = "list_tasks")]
    pub out: Option<String>,

    /// Frame width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Frame height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Number of random actions applied before the final capture
    #[arg(long, default_value_t = DEFAULT_STEPS, value_parser = clap::value_parser!(u32).range(1..))]
    pub steps: u32,

    /// Task variation index [default: random]
    #[arg(long)]
    pub variation: Option<u32>,

    /// Seed for reproducible actions and variation choice
    #[arg(long)]
    pub seed: Option<u64>,

    /// List the grasp tasks available in this install and exit
    #[arg(long)]
    pub list_tasks: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Command whose `--task` choices are the registered identifiers
    #[must_use]
    pub fn command_for(registry: &TaskRegistry) -> clap::Command {
        let choices: Vec<String> = registry.names().into_iter().map(str::to_string).collect();
        Self::command().mut_arg("task", |arg| {
            arg.value_parser(PossibleValuesParser::new(choices))
        })
    }

    /// Parse arguments against the tasks of `registry`
    pub fn try_parse_with_tasks<I, T>(
        args: I,
        registry: &TaskRegistry,
    ) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command_for(registry).try_get_matches_from(args)?;
        Self::from_arg_matches(&matches)
    }
}

/// Main entry point for the CLI application
pub fn main() -> Result<()> {
    let registry = TaskRegistry::discover(&TabletopSimulator::new())?;
    let cli = Cli::try_parse_with_tasks(std::env::args_os(), &registry)
        .unwrap_or_else(|error| error.exit());

    init_tracing(cli.verbose)?;

    let simulator = cli
        .seed
        .map_or_else(TabletopSimulator::new, TabletopSimulator::with_seed);
    let stdout = io::stdout();
    execute(&cli, &simulator, &registry, &mut stdout.lock())
}

/// Run the parsed command against a simulator, writing the report to `out`
pub fn execute<W: Write>(
    cli: &Cli,
    simulator: &dyn Simulator,
    registry: &TaskRegistry,
    out: &mut W,
) -> Result<()> {
    if cli.list_tasks {
        for name in registry.names() {
            writeln!(out, "{name}")?;
        }
        return Ok(());
    }

    let task_name = cli.task.as_deref().context("--task is required")?;
    let task = registry.resolve(task_name)?;
    let config = CliConfigBuilder::from_cli(cli).context("Failed to build configuration")?;

    info!(
        task = %task_name,
        output_dir = %config.output_dir.display(),
        width = config.width,
        height = config.height,
        steps = config.steps,
        "Starting snapshot capture"
    );

    let mut rng = config.seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
    let summary = SnapshotRunner::new(simulator)
        .run(task_name, &task, &config, &mut rng)
        .with_context(|| format!("Snapshot run of {task_name} failed"))?;
    debug!(
        written = summary.written_files().len(),
        reward = summary.last_reward,
        done = summary.done,
        "Snapshot run finished"
    );

    if cli.json {
        serde_json::to_writer_pretty(&mut *out, &summary)?;
        writeln!(out)?;
    } else {
        writeln!(out, "Saved snapshots to: {}", config.output_dir.display())?;
        writeln!(
            out,
            "Available grasp tasks in this install: {}",
            registry.names().join(", ")
        )?;
    }
    Ok(())
}

/// Initialize tracing based on verbosity level
fn init_tracing(verbose_count: u8) -> Result<()> {
    crate::tracing_config::init_cli_tracing(verbose_count)
        .context("Failed to initialize tracing subscriber")?;
    debug!(verbosity = verbose_count, "Tracing initialized");
    Ok(())
}
