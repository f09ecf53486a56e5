//! Background tasks spawned for every daemon run.
//!
//! Each task is bound to the generation it was spawned for and never touches
//! the state of a newer run.

use chrono::Utc;
use mtgac_core::domain::DaemonStatus;
use mtgac_core::ports::SupervisorError;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Supervisor;
use super::recovery::{RecoveryDecision, RecoveryGuard};
use crate::process::{ExitWatcher, ProcessHandle};

const LIVE: [DaemonStatus; 2] = [DaemonStatus::Starting, DaemonStatus::Running];

/// Wait for the process to exit and settle the state if nobody asked for it.
pub(super) async fn monitor_exit(supervisor: Supervisor, generation: u64, watcher: ExitWatcher) {
    let outcome = watcher.wait().await;

    let mut state = supervisor.inner.state.write();
    if !state.is_current(generation, &LIVE) {
        debug!(generation, status = %state.status, "Daemon exit expected, leaving state alone");
        return;
    }

    match outcome {
        Ok(status) if status.success() => {
            info!(generation, pid = %state.pid, "Daemon exited");
            state.detach(DaemonStatus::Stopped);
        }
        Ok(status) => {
            warn!(generation, pid = %state.pid, %status, "Daemon exited unexpectedly");
            state.fail(SupervisorError::ExitedUnexpectedly(status.to_string()));
        }
        Err(e) => {
            warn!(generation, pid = %state.pid, error = %e, "Failed to wait for daemon");
            state.fail(SupervisorError::ExitedUnexpectedly(e.to_string()));
        }
    }
}

/// Promote a run to Running once it survived the readiness delay.
pub(super) async fn await_readiness(supervisor: Supervisor, generation: u64, handle: ProcessHandle) {
    sleep(supervisor.inner.config.timings.readiness_delay).await;
    if handle.has_exited() {
        return;
    }

    let mut state = supervisor.inner.state.write();
    if state.is_current(generation, &[DaemonStatus::Starting]) {
        state.status = DaemonStatus::Running;
        info!(generation, pid = %state.pid, port = %state.port, "Daemon is running");
    }
}

/// Probe the daemon periodically until `cancel` fires.
pub(super) async fn health_loop(
    supervisor: Supervisor,
    generation: u64,
    port: u16,
    cancel: CancellationToken,
) {
    let timings = supervisor.inner.config.timings;
    let period = supervisor.inner.config.health_check_interval;

    tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        () = sleep(timings.health_settle_delay) => {}
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(generation, port = %port, ?period, "Starting health loop");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(generation, "Health loop cancelled");
                break;
            }
            _ = ticker.tick() => {
                let running = supervisor
                    .inner
                    .state
                    .read()
                    .is_current(generation, &[DaemonStatus::Running]);
                if running {
                    check_health(&supervisor, generation, port, &cancel).await;
                }
            }
        }
    }
}

/// Run one probe, record the outcome and recover if needed.
pub(super) async fn check_health(
    supervisor: &Supervisor,
    generation: u64,
    port: u16,
    cancel: &CancellationToken,
) {
    let result = supervisor.inner.probe.check(port).await;

    let (notify, failure) = {
        let mut state = supervisor.inner.state.write();
        if state.generation != generation {
            return;
        }
        state.last_health_check = Some(Utc::now());
        let was_healthy = state.healthy;

        match result {
            Ok(()) => {
                state.healthy = true;
                state.consecutive_failures = 0;
                if !was_healthy {
                    info!(generation, port = %port, "Daemon health check passed, daemon is healthy");
                }
                (!was_healthy, None)
            }
            Err(e) => {
                let error = SupervisorError::from(e);
                state.healthy = false;
                state.consecutive_failures += 1;
                state.last_error = Some(error.clone());
                warn!(
                    generation,
                    port = %port,
                    consecutive_failures = state.consecutive_failures,
                    error = %error,
                    "Daemon health check failed"
                );
                (true, Some(error))
            }
        }
    };

    if notify {
        if let Some(callback) = &supervisor.inner.config.on_health_change {
            callback(failure.is_none(), failure.as_ref());
        }
    }

    if failure.is_some() && supervisor.inner.config.auto_restart {
        recover(supervisor, generation, cancel).await;
    }
}

/// Restart an unhealthy daemon, honoring the backoff and attempt budget.
pub(super) async fn recover(supervisor: &Supervisor, generation: u64, cancel: &CancellationToken) {
    let Some(_guard) = RecoveryGuard::try_claim(&supervisor.inner.recovering) else {
        debug!(generation, "Recovery already in flight, skipping");
        return;
    };

    let (attempt, stop_epoch) = {
        let mut state = supervisor.inner.state.write();
        state.restart_attempts += 1;
        (state.restart_attempts, state.stop_epoch)
    };

    let delay = match supervisor.inner.policy.decide(attempt) {
        RecoveryDecision::GiveUp => {
            let max = supervisor.inner.policy.max_attempts;
            warn!(max, "Maximum restart attempts exceeded, giving up");
            supervisor.stop_process().await;
            let mut state = supervisor.inner.state.write();
            // A caller may have stopped or started the daemon in the meantime
            if state.status == DaemonStatus::Stopped && state.stop_epoch == stop_epoch {
                state.fail(SupervisorError::RestartLimitExceeded(max));
            }
            return;
        }
        RecoveryDecision::Retry(delay) => delay,
    };

    info!(generation, attempt, ?delay, "Attempting daemon recovery");

    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            info!(generation, "Recovery cancelled: run was stopped or exited");
            return;
        }
        () = sleep(delay) => {}
    }

    {
        let state = supervisor.inner.state.read();
        if state.generation != generation
            || state.stop_epoch != stop_epoch
            || matches!(state.status, DaemonStatus::Stopping | DaemonStatus::Stopped)
        {
            info!(generation, status = %state.status, "Recovery cancelled: daemon is stopping/stopped");
            return;
        }
    }

    supervisor.stop_process().await;
    sleep(supervisor.inner.config.timings.restart_pause).await;

    match supervisor.launch(Some(stop_epoch)) {
        Ok(true) => {
            info!("Daemon recovery successful");
            supervisor.inner.state.write().restart_attempts = 0;
        }
        Ok(false) => info!(generation, "Recovery cancelled: daemon was stopped during restart"),
        Err(e) => warn!(attempt, error = %e, "Recovery restart failed"),
    }
}
