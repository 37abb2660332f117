// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RunMode;

/// Command-line arguments for `expcfg`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "expcfg",
    version,
    about = "Resolve and validate experiment configuration files.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (YAML).
    ///
    /// Default: `EXPCFG_CONFIG`, else `config.yaml` in the current working
    /// directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Validate against the built-in schema of this run mode.
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<RunMode>,

    /// JSON object merged into the resolved config before validation,
    /// e.g. `{"train": {"batch_size": 2}}`.
    #[arg(long, value_name = "JSON")]
    pub json: Option<String>,

    /// Print only the subtree at this dotted key path.
    #[arg(long, value_name = "KEY.PATH")]
    pub get: Option<String>,

    /// Print a short human-readable summary instead of JSON.
    #[arg(long, conflicts_with = "get")]
    pub summary: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXPCFG_LOG` or a default level will be used.
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
