//! Daemon settings and validation.
//!
//! `DaemonSettings` is the serializable, partially-specified form of the
//! supervisor configuration. Layers (defaults, JSON file, CLI flags) are
//! combined with [`DaemonSettings::merge`] and turned into a
//! [`SupervisorConfig`] once validated.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SupervisorConfig;

/// Default port the daemon listens on.
pub const DEFAULT_DAEMON_PORT: u16 = 9999;

/// Default bound for waiting until the daemon is running.
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 30;

/// Default grace period before the daemon is force-killed.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Default period of the health loop.
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 10;

/// Default number of recovery attempts before giving up.
pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 5;

/// Daemon supervision settings.
///
/// All fields are optional so partial layers can be merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonSettings {
    /// Port passed to the daemon as `--port`.
    pub port: Option<u16>,

    /// Explicit daemon executable; auto-detected when unset.
    pub daemon_path: Option<String>,

    pub startup_timeout_secs: Option<u64>,

    pub shutdown_timeout_secs: Option<u64>,

    /// Health loop period in seconds. Zero disables health checks.
    pub health_check_interval_secs: Option<u64>,

    pub auto_restart: Option<bool>,

    /// Zero means unlimited.
    pub max_restart_attempts: Option<u32>,
}

impl DaemonSettings {
    /// Create settings with every field at its default.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            port: Some(DEFAULT_DAEMON_PORT),
            daemon_path: None,
            startup_timeout_secs: Some(DEFAULT_STARTUP_TIMEOUT_SECS),
            shutdown_timeout_secs: Some(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            health_check_interval_secs: Some(DEFAULT_HEALTH_CHECK_INTERVAL_SECS),
            auto_restart: Some(true),
            max_restart_attempts: Some(DEFAULT_MAX_RESTART_ATTEMPTS),
        }
    }

    /// Get the effective daemon port (with default fallback).
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None => DEFAULT_DAEMON_PORT,
        }
    }

    /// Overlay every field that is set in `other`.
    pub fn merge(&mut self, other: &Self) {
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.daemon_path.is_some() {
            self.daemon_path.clone_from(&other.daemon_path);
        }
        if other.startup_timeout_secs.is_some() {
            self.startup_timeout_secs = other.startup_timeout_secs;
        }
        if other.shutdown_timeout_secs.is_some() {
            self.shutdown_timeout_secs = other.shutdown_timeout_secs;
        }
        if other.health_check_interval_secs.is_some() {
            self.health_check_interval_secs = other.health_check_interval_secs;
        }
        if other.auto_restart.is_some() {
            self.auto_restart = other.auto_restart;
        }
        if other.max_restart_attempts.is_some() {
            self.max_restart_attempts = other.max_restart_attempts;
        }
    }

    /// Build the supervisor configuration, falling back to defaults for
    /// unset fields.
    pub fn to_config(&self) -> SupervisorConfig {
        let mut config = SupervisorConfig::default().with_port(self.effective_port());
        config.binary_path = self.daemon_path.as_deref().map(PathBuf::from);
        if let Some(secs) = self.startup_timeout_secs {
            config.startup_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.shutdown_timeout_secs {
            config.shutdown_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.health_check_interval_secs {
            config.health_check_interval = Duration::from_secs(secs);
        }
        if let Some(enabled) = self.auto_restart {
            config.auto_restart = enabled;
        }
        if let Some(max) = self.max_restart_attempts {
            config.max_restart_attempts = max;
        }
        config
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Port should be >= 1024 (privileged ports require root), got {0}")]
    InvalidPort(u16),

    #[error("Startup timeout must be at least 1 second")]
    InvalidStartupTimeout,

    #[error("Shutdown timeout must be at least 1 second")]
    InvalidShutdownTimeout,

    #[error("Daemon path cannot be empty")]
    EmptyDaemonPath,
}

/// Validate settings values.
pub fn validate_settings(settings: &DaemonSettings) -> Result<(), SettingsError> {
    if let Some(port) = settings.port {
        if port < 1024 {
            return Err(SettingsError::InvalidPort(port));
        }
    }

    if settings.startup_timeout_secs == Some(0) {
        return Err(SettingsError::InvalidStartupTimeout);
    }

    if settings.shutdown_timeout_secs == Some(0) {
        return Err(SettingsError::InvalidShutdownTimeout);
    }

    if settings
        .daemon_path
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyDaemonPath);
    }

    Ok(())
}
