//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::{config::SnapConfig, utils::PathExpander};
use anyhow::{Context, Result};

/// Convert CLI arguments to a `SnapConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build SnapConfig from CLI arguments
    ///
    /// Environment variables in `--out` are expanded here; the directory
    /// itself is created by the runner.
    pub(crate) fn from_cli(cli: &Cli) -> Result<SnapConfig> {
        let out = cli.out.as_deref().context("--out is required")?;
        let output_dir = PathExpander::expand_path(out);

        SnapConfig::builder()
            .output_dir(output_dir)
            .resolution(cli.width, cli.height)
            .steps(cli.steps)
            .variation(cli.variation)
            .seed(cli.seed)
            .headless(true)
            .build()
            .context("Invalid configuration")
    }
}
