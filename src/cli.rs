// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `devrig`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devrig",
    version,
    about = "Build orchestration for web client/server projects.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run (e.g. `build`, `dev`, `test`). Base names are given
    /// unprefixed; the configured prefix is applied internally.
    #[arg(value_name = "TASK", default_value = "build")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Devrig.toml` in the current working directory. A missing
    /// file means "all defaults".
    #[arg(long, value_name = "PATH", default_value = "Devrig.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVRIG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective task graph, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
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
