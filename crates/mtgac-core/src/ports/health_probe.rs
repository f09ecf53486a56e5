//! Health probe port.
//!
//! A probe performs exactly one health check against a daemon listening on
//! a local port. Scheduling, retries and recovery belong to the supervisor.

use async_trait::async_trait;
use thiserror::Error;

/// Why a single health check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Transport-level failure (connection refused, timeout, client setup).
    #[error("request failed: {0}")]
    Request(String),

    /// The daemon answered with something other than 200 OK.
    #[error("unhealthy status code: {0}")]
    UnhealthyStatusCode(u16),

    /// The daemon answered 200 but reported a non-healthy status.
    #[error("daemon reported unhealthy status: {0:?}")]
    UnhealthyReport(String),
}

/// Port for probing the daemon's health endpoint.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Check the daemon listening on `port`.
    ///
    /// Returns `Ok(())` when the daemon is considered healthy.
    async fn check(&self, port: u16) -> Result<(), ProbeError>;
}
