//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the supervisor expects from infrastructure.
//! They contain no implementation details and use only domain types.

pub mod binary_locator;
pub mod daemon_log_sink;
pub mod health_probe;

use thiserror::Error;

use crate::domain::DaemonStatus;

pub use binary_locator::{BinaryLocator, LocateError};
pub use daemon_log_sink::{DaemonLogSink, NoopLogSink};
pub use health_probe::{HealthProbe, ProbeError};

#[cfg(feature = "test-utils")]
pub use health_probe::MockHealthProbe;

/// Errors produced by the daemon supervisor.
///
/// Every variant is cloneable so the most recent failure can be kept in the
/// supervisor state and handed out to status queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// A start was requested while a process is attached.
    #[error("daemon is already {0}")]
    AlreadyRunning(DaemonStatus),

    /// The daemon executable could not be resolved.
    #[error(transparent)]
    BinaryNotFound(#[from] LocateError),

    /// The OS refused to create the daemon process.
    #[error("failed to start daemon: {0}")]
    SpawnFailed(String),

    /// The daemon terminated on its own with a non-success status.
    #[error("daemon exited unexpectedly: {0}")]
    ExitedUnexpectedly(String),

    /// A health probe failed.
    #[error("health check failed: {0}")]
    HealthCheck(#[from] ProbeError),

    /// Auto-recovery gave up after the configured number of attempts.
    #[error("maximum restart attempts ({0}) exceeded")]
    RestartLimitExceeded(u32),

    /// There is no run to wait for.
    #[error("daemon is {0}, no run is starting")]
    NotRunning(DaemonStatus),

    /// The daemon did not reach `running` within the startup timeout.
    #[error("daemon did not become ready within {0}s")]
    StartupTimeout(u64),
}
