//! Tracing configuration module for structured logging
//!
//! The library only emits tracing events; the CLI configures the subscriber
//! here. Output goes to stderr so that stdout carries only the run summary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Configuration for tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable console output with colors (default for CLI)
    Console,
    /// JSON structured logging
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Tracing configuration builder
#[derive(Debug)]
pub struct TracingConfig {
    /// Verbosity level (maps to log levels)
    pub verbosity: u8,
    /// Output format
    pub format: TracingFormat,
    /// Session ID for correlation
    pub session_id: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Console,
            session_id: None,
        }
    }
}

impl TracingConfig {
    /// Create a new tracing configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity level (0-2+)
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set output format
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Set session ID for run correlation
    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Convert verbosity level to tracing filter string
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",  // Default: phase summaries and frame warnings
            1 => "debug", // -v: per-step rewards and written paths
            _ => "trace", // -vv+: everything
        }
    }

    /// Initialize the global tracing subscriber
    ///
    /// Fails if a subscriber is already installed.
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt;

        let filter = EnvFilter::try_new(self.verbosity_to_filter())?;

        let registry = Registry::default().with(filter);

        match self.format {
            TracingFormat::Console => {
                let fmt_layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_level(true)
                    .compact();

                registry.with(fmt_layer).try_init()?;
            },

            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true);

                registry.with(fmt_layer).try_init()?;
            },
        }

        if let Some(session_id) = &self.session_id {
            tracing::debug!(session_id = %session_id, "Snapshot session started");
        }

        Ok(())
    }
}

/// Output format of the CLI
#[cfg(not(feature = "tracing-json"))]
#[must_use]
pub fn cli_format() -> TracingFormat {
    TracingFormat::Console
}

/// Output format of the CLI: JSON lines when built with `tracing-json`
#[cfg(feature = "tracing-json")]
#[must_use]
pub fn cli_format() -> TracingFormat {
    TracingFormat::Json
}

/// Initialize tracing with CLI-friendly defaults
pub fn init_cli_tracing(verbosity: u8) -> anyhow::Result<()> {
    let session_id = uuid::Uuid::new_v4().to_string();

    TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(cli_format())
        .with_session_id(session_id)
        .init()
}
