// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `batchflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "batchflow",
    version,
    about = "Plan dependent tasks into ordered, size-bounded batches.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Batchflow.toml")]
    pub config: String,

    /// Override `[config].max_batch_size` from the task file.
    #[arg(long, value_name = "N")]
    pub max_batch_size: Option<usize>,

    /// Walk the dynamic manager to completion instead of printing the
    /// static plan.
    #[arg(long)]
    pub simulate: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BATCHFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
