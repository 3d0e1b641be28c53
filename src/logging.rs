// src/logging.rs

//! Subscriber setup for the `procvisor` binary.
//!
//! The filter is picked once at startup:
//! - `--log-level` sets one global level,
//! - otherwise `PROCVISOR_LOG` is read as a full `EnvFilter` directive
//!   string (`debug`, `procvisor::supervisor=trace,warn`, ...),
//! - otherwise everything at `info` and above is shown.
//!
//! Supervised processes own stdout, so all diagnostics go to stderr.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "PROCVISOR_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV).ok();
    let directive = directive_for(cli_level, env_value.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing the tracing subscriber")?;

    Ok(())
}

/// Filter directive for the given flag and environment value.
fn directive_for(cli_level: Option<LogLevel>, env_value: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return level.as_directive().to_string();
    }
    env_value
        .map(str::trim)
        .filter(|v| !v.is_empty() && EnvFilter::try_new(v).is_ok())
        .unwrap_or(DEFAULT_DIRECTIVE)
        .to_string()
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
