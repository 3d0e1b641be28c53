// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    /// Malformed descriptor or action selection. Never retryable: the
    /// launch did not happen and no state was created.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Process not registered: {0}")]
    NotRegistered(String),

    /// The OS refused to create the process.
    #[error("Failed to launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    /// The process started but reported a failure.
    #[error("Process '{program}' failed with exit code {code:?}: {stderr}")]
    Runtime {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Kill failed: {0}")]
    Kill(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProcessError {
    pub(crate) fn launch(program: impl Into<String>, err: &std::io::Error) -> Self {
        ProcessError::Launch {
            program: program.into(),
            reason: err.to_string(),
        }
    }

    /// Whether a caller-side restart policy could reasonably try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProcessError::Launch { .. } | ProcessError::Runtime { .. } | ProcessError::Kill(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProcessError>;
