//! CLI-specific error types and exit code mapping.

use mtgac_core::{SettingsError, SupervisorError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The daemon executable could not be found.
    #[error("{0}")]
    BinaryNotFound(String),

    /// Process lifecycle error.
    #[error("Process error: {0}")]
    Process(String),

    /// The daemon is unreachable or reports itself unhealthy.
    #[error("Health check failed: {0}")]
    Health(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Health(_) => 69,         // EX_UNAVAILABLE
            Self::Process(_) => 71,        // EX_OSERR
            Self::BinaryNotFound(_) => 72, // EX_OSFILE
            Self::Io(_) => 74,             // EX_IOERR
            Self::Config(_) => 78,         // EX_CONFIG
        }
    }

    /// Exit code for any error reaching `main`.
    pub fn exit_code_for(err: &anyhow::Error) -> i32 {
        err.downcast_ref::<Self>().map_or(1, Self::exit_code)
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::BinaryNotFound(e) => Self::BinaryNotFound(e.to_string()),
            SupervisorError::HealthCheck(e) => Self::Health(e.to_string()),
            other => Self::Process(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
