//! Core domain types and ports for supervising the tracker daemon.
//!
//! This crate has no process, filesystem-probing or network code. It defines
//! what the supervisor talks about (status, health snapshots, configuration)
//! and the traits infrastructure must implement (`HealthProbe`,
//! `BinaryLocator`, `DaemonLogSink`).
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use config::{DaemonOutput, HealthChangeCallback, SupervisorConfig, SupervisorTimings};
pub use domain::{DaemonInfo, DaemonStatus, HealthSnapshot};
pub use ports::{
    BinaryLocator, DaemonLogSink, HealthProbe, LocateError, NoopLogSink, ProbeError,
    SupervisorError,
};
pub use settings::{
    DEFAULT_DAEMON_PORT, DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_MAX_RESTART_ATTEMPTS,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_STARTUP_TIMEOUT_SECS, DaemonSettings, SettingsError,
    validate_settings,
};

#[cfg(feature = "test-utils")]
pub use ports::MockHealthProbe;
