// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::Signal;

/// Command-line arguments for `procvisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procvisor",
    version,
    about = "Launch, watch and stop named processes described in a TOML file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the descriptor file (TOML).
    ///
    /// Default: `Procvisor.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Procvisor.toml")]
    pub config: String,

    /// Descriptor to run. May be omitted when the file declares exactly one.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Action from the descriptor's `cmds` to execute.
    #[arg(long, value_name = "ACTION", default_value = "start")]
    pub action: String,

    /// Signal sent to the process on Ctrl-C.
    #[arg(long, value_name = "SIGNAL", default_value = "SIGTERM", value_parser = parse_signal)]
    pub signal: Signal,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print descriptors and resolved invocations, but
    /// don't launch anything.
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

fn parse_signal(s: &str) -> Result<Signal, String> {
    s.parse()
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
