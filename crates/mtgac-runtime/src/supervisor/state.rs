//! Mutable supervisor state, guarded by the supervisor's lock.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use mtgac_core::domain::{DaemonInfo, DaemonStatus, HealthSnapshot};
use mtgac_core::ports::SupervisorError;
use tokio_util::sync::CancellationToken;

use crate::process::ProcessHandle;

#[derive(Debug)]
pub(crate) struct SupervisorState {
    pub status: DaemonStatus,
    pub process: Option<ProcessHandle>,
    pub pid: u32,
    pub started_at: Option<Instant>,
    pub last_error: Option<SupervisorError>,
    pub healthy: bool,
    pub last_health_check: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub restart_attempts: u32,
    /// Id of the current process run; bumped on every successful spawn.
    pub generation: u64,
    pub health_cancel: Option<CancellationToken>,
    /// Bumped by every caller-initiated stop.
    pub stop_epoch: u64,
    pub port: u16,
}

impl SupervisorState {
    pub const fn new(port: u16) -> Self {
        Self {
            status: DaemonStatus::Stopped,
            process: None,
            pid: 0,
            started_at: None,
            last_error: None,
            healthy: false,
            last_health_check: None,
            consecutive_failures: 0,
            restart_attempts: 0,
            generation: 0,
            health_cancel: None,
            stop_epoch: 0,
            port,
        }
    }

    /// Whether `generation` is still the live run and in one of `statuses`.
    pub fn is_current(&self, generation: u64, statuses: &[DaemonStatus]) -> bool {
        self.generation == generation && statuses.contains(&self.status)
    }

    /// Record a freshly spawned process and return its generation.
    pub fn attach(&mut self, handle: ProcessHandle, health_cancel: CancellationToken) -> u64 {
        self.generation += 1;
        self.status = DaemonStatus::Starting;
        self.pid = handle.pid();
        self.process = Some(handle);
        self.started_at = Some(Instant::now());
        self.healthy = false;
        self.last_error = None;
        self.health_cancel = Some(health_cancel);
        self.generation
    }

    /// Drop the process and settle into `status` (Stopped or Error).
    ///
    /// Cancels the health loop of the run being detached.
    pub fn detach(&mut self, status: DaemonStatus) {
        debug_assert!(status.is_idle());
        if let Some(token) = self.health_cancel.take() {
            token.cancel();
        }
        self.status = status;
        self.process = None;
        self.pid = 0;
        self.started_at = None;
        self.healthy = false;
    }

    /// Settle into Error with `error` as the reason.
    pub fn fail(&mut self, error: SupervisorError) {
        self.detach(DaemonStatus::Error);
        self.last_error = Some(error);
    }

    pub fn uptime(&self) -> Duration {
        match (self.status, self.started_at) {
            (DaemonStatus::Running, Some(started)) => started.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn health_snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            healthy: self.healthy,
            last_check: self.last_health_check,
            consecutive_failures: self.consecutive_failures,
            restart_attempts: self.restart_attempts,
            error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    pub fn info(&self) -> DaemonInfo {
        let running = self.status == DaemonStatus::Running;
        DaemonInfo {
            status: self.status,
            pid: (self.pid != 0).then_some(self.pid),
            port: self.port,
            uptime_secs: running.then(|| self.uptime().as_secs()),
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }
}
