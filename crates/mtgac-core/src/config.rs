//! Runtime configuration for the daemon supervisor.
//!
//! `SupervisorConfig` is what the supervisor actually runs with. It is built
//! from [`crate::settings::DaemonSettings`] by the composition root or
//! directly with the `with_*` builders.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{DaemonLogSink, SupervisorError};
use crate::settings::{
    DEFAULT_DAEMON_PORT, DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_MAX_RESTART_ATTEMPTS,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_STARTUP_TIMEOUT_SECS,
};

/// Callback invoked when a health probe completes.
///
/// Receives `true` with no error on recovery to healthy and `false` with the
/// probe error on every failed probe. Never called with the state lock held.
pub type HealthChangeCallback = Arc<dyn Fn(bool, Option<&SupervisorError>) + Send + Sync>;

/// Where the daemon's stdout/stderr go.
#[derive(Clone, Default)]
pub enum DaemonOutput {
    /// Discard both streams.
    Discard,
    /// Share the supervisor's own stdout/stderr.
    Inherit,
    /// Log each line at debug level under the `daemon` target.
    #[default]
    Tracing,
    /// Forward each line to a sink (and log it at debug level).
    Sink(Arc<dyn DaemonLogSink>),
}

impl fmt::Debug for DaemonOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discard => f.write_str("Discard"),
            Self::Inherit => f.write_str("Inherit"),
            Self::Tracing => f.write_str("Tracing"),
            Self::Sink(_) => f.write_str("Sink(..)"),
        }
    }
}

/// Fixed delays of the lifecycle. Only tests have reason to change these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTimings {
    /// How long a fresh process must survive before it counts as running.
    pub readiness_delay: Duration,
    /// Pause before the first health probe of a run.
    pub health_settle_delay: Duration,
    /// Pause between the stop and start halves of a restart.
    pub restart_pause: Duration,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            readiness_delay: Duration::from_millis(500),
            health_settle_delay: Duration::from_secs(2),
            restart_pause: Duration::from_millis(500),
        }
    }
}

/// Supervisor configuration.
///
/// Immutable once handed to the supervisor, except for the port which can be
/// changed through `Supervisor::set_port` and takes effect on the next start.
#[derive(Clone)]
pub struct SupervisorConfig {
    /// Port the daemon is told to listen on (`--port`).
    pub port: u16,
    /// Explicit daemon executable. `None` means auto-detect.
    pub binary_path: Option<PathBuf>,
    /// Upper bound for `Supervisor::wait_until_running`.
    pub startup_timeout: Duration,
    /// Grace period between SIGTERM and the forced kill.
    pub shutdown_timeout: Duration,
    /// Period of the health loop. Zero disables health checking.
    pub health_check_interval: Duration,
    /// Whether failed probes trigger recovery.
    pub auto_restart: bool,
    /// Recovery attempts before giving up. Zero means unlimited.
    pub max_restart_attempts: u32,
    pub output: DaemonOutput,
    pub on_health_change: Option<HealthChangeCallback>,
    pub timings: SupervisorTimings,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DAEMON_PORT,
            binary_path: None,
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            health_check_interval: Duration::from_secs(DEFAULT_HEALTH_CHECK_INTERVAL_SECS),
            auto_restart: true,
            max_restart_attempts: DEFAULT_MAX_RESTART_ATTEMPTS,
            output: DaemonOutput::default(),
            on_health_change: None,
            timings: SupervisorTimings::default(),
        }
    }
}

impl SupervisorConfig {
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_auto_restart(mut self, enabled: bool) -> Self {
        self.auto_restart = enabled;
        self
    }

    #[must_use]
    pub const fn with_max_restart_attempts(mut self, max: u32) -> Self {
        self.max_restart_attempts = max;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: DaemonOutput) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn with_health_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(bool, Option<&SupervisorError>) + Send + Sync + 'static,
    {
        self.on_health_change = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub const fn with_timings(mut self, timings: SupervisorTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Whether the periodic health loop runs at all.
    pub const fn health_checks_enabled(&self) -> bool {
        !self.health_check_interval.is_zero()
    }
}

impl fmt::Debug for SupervisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorConfig")
            .field("port", &self.port)
            .field("binary_path", &self.binary_path)
            .field("startup_timeout", &self.startup_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("health_check_interval", &self.health_check_interval)
            .field("auto_restart", &self.auto_restart)
            .field("max_restart_attempts", &self.max_restart_attempts)
            .field("output", &self.output)
            .field("on_health_change", &self.on_health_change.is_some())
            .field("timings", &self.timings)
            .finish()
    }
}
