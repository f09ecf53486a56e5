//! Daemon supervisor.
//!
//! # Lifecycle
//!
//! ```text
//! Stopped/Error --start--> Starting --readiness delay--> Running
//!        ^                    |                             |
//!        |            exit (clean: Stopped, else Error) ----+
//!        |                                                  |
//!        +------- Stopping <------------stop----------------+
//! ```
//!
//! `start` spawns the daemon plus three tasks bound to the new run's
//! generation: an exit monitor, a readiness waiter and (when enabled) the
//! health loop, which drives recovery on probe failures.
//!
//! # Locking
//!
//! All state lives behind one `parking_lot::RwLock` that is never held
//! across an `.await`. Callbacks run with the lock released.

pub mod recovery;
mod state;
mod tasks;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mtgac_core::config::SupervisorConfig;
use mtgac_core::domain::{DaemonInfo, DaemonStatus, HealthSnapshot};
use mtgac_core::ports::{BinaryLocator, HealthProbe, SupervisorError};
use parking_lot::RwLock;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::process::spawn_daemon;
use recovery::RecoveryPolicy;
use state::SupervisorState;

/// Upper bound for reaping the daemon after a forced kill.
const KILL_REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll period of [`Supervisor::wait_until_running`].
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Inner {
    config: SupervisorConfig,
    locator: Arc<dyn BinaryLocator>,
    probe: Arc<dyn HealthProbe>,
    policy: RecoveryPolicy,
    recovering: AtomicBool,
    state: RwLock<SupervisorState>,
}

/// Owns the tracker daemon process and its health bookkeeping.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Supervisor")
            .field("status", &state.status)
            .field("pid", &state.pid)
            .field("port", &state.port)
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        locator: Arc<dyn BinaryLocator>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        let state = SupervisorState::new(config.port);
        let policy = RecoveryPolicy::new(config.max_restart_attempts);
        Self {
            inner: Arc::new(Inner {
                config,
                locator,
                probe,
                policy,
                recovering: AtomicBool::new(false),
                state: RwLock::new(state),
            }),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }

    /// Launch the daemon.
    ///
    /// Returns as soon as the process is spawned; the status is `Starting`
    /// until the readiness delay elapses. Must be called from within a tokio
    /// runtime.
    pub fn start(&self) -> Result<(), SupervisorError> {
        self.launch(None).map(|_| ())
    }

    /// Spawn a new run.
    ///
    /// With `stop_epoch` set, nothing is launched (`Ok(false)`) if a caller
    /// stopped the daemon since that epoch was read. The check and the spawn
    /// happen under one write lock.
    pub(crate) fn launch(&self, stop_epoch: Option<u64>) -> Result<bool, SupervisorError> {
        let config = &self.inner.config;
        let mut state = self.inner.state.write();

        if stop_epoch.is_some_and(|epoch| epoch != state.stop_epoch) {
            return Ok(false);
        }

        if state.status.is_active() {
            return Err(SupervisorError::AlreadyRunning(state.status));
        }

        let binary = match self.inner.locator.locate(config.binary_path.as_deref()) {
            Ok(path) => path,
            Err(e) => {
                let error = SupervisorError::from(e);
                warn!(error = %error, "Failed to resolve daemon binary");
                state.fail(error.clone());
                return Err(error);
            }
        };

        let port = state.port;
        let (handle, watcher) = match spawn_daemon(&binary, port, &config.output) {
            Ok(spawned) => spawned,
            Err(e) => {
                let error = SupervisorError::SpawnFailed(e.to_string());
                warn!(binary = %binary.display(), error = %e, "Failed to spawn daemon");
                state.fail(error.clone());
                return Err(error);
            }
        };

        let health_cancel = CancellationToken::new();
        let generation = state.attach(handle.clone(), health_cancel.clone());
        drop(state);

        info!(
            generation,
            pid = %handle.pid(),
            port = %port,
            binary = %binary.display(),
            "Daemon started"
        );

        tokio::spawn(tasks::monitor_exit(self.clone(), generation, watcher));
        tokio::spawn(tasks::await_readiness(self.clone(), generation, handle));
        if config.health_checks_enabled() {
            tokio::spawn(tasks::health_loop(
                self.clone(),
                generation,
                port,
                health_cancel,
            ));
        }

        Ok(true)
    }

    /// Stop the daemon gracefully, force-killing it after the shutdown timeout.
    ///
    /// Idempotent and infallible; the `Result` is kept for API symmetry.
    /// A recovery in flight will not bring the daemon back afterwards.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        self.inner.state.write().stop_epoch += 1;
        self.stop_process().await;
        Ok(())
    }

    /// Alias of [`Supervisor::stop`] for host shutdown paths.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        self.stop().await
    }

    pub(crate) async fn stop_process(&self) {
        let handle = {
            let mut state = self.inner.state.write();
            if matches!(state.status, DaemonStatus::Stopped | DaemonStatus::Stopping) {
                return;
            }
            let Some(handle) = state.process.clone() else {
                state.detach(DaemonStatus::Stopped);
                return;
            };
            state.status = DaemonStatus::Stopping;
            if let Some(token) = state.health_cancel.take() {
                token.cancel();
            }
            handle
        };

        let pid = handle.pid();
        info!(pid = %pid, "Stopping daemon");
        handle.terminate();

        if timeout(self.inner.config.shutdown_timeout, handle.exited())
            .await
            .is_err()
        {
            warn!(pid = %pid, timeout = ?self.inner.config.shutdown_timeout, "Daemon did not exit gracefully, killing");
            handle.kill();
            if timeout(KILL_REAP_TIMEOUT, handle.exited()).await.is_err() {
                warn!(pid = %pid, "Daemon exit not observed after kill");
            }
        }

        self.inner.state.write().detach(DaemonStatus::Stopped);
        info!(pid = %pid, "Daemon stopped");
    }

    /// Stop, pause briefly, then start again.
    pub async fn restart(&self) -> Result<(), SupervisorError> {
        self.stop().await?;
        sleep(self.inner.config.timings.restart_pause).await;
        self.start()
    }

    /// Wait until the current run is `Running`, bounded by the startup timeout.
    ///
    /// Fails with `NotRunning` when there is no run to wait for: nothing was
    /// started, the run was stopped, or it exited cleanly before readiness.
    pub async fn wait_until_running(&self) -> Result<(), SupervisorError> {
        let limit = self.inner.config.startup_timeout;
        let wait = async {
            loop {
                {
                    let state = self.inner.state.read();
                    match state.status {
                        DaemonStatus::Running => return Ok(()),
                        DaemonStatus::Starting => {}
                        DaemonStatus::Error => {
                            return Err(state.last_error.clone().unwrap_or_else(|| {
                                SupervisorError::ExitedUnexpectedly(
                                    "no error recorded".to_string(),
                                )
                            }));
                        }
                        status @ (DaemonStatus::Stopped | DaemonStatus::Stopping) => {
                            return Err(SupervisorError::NotRunning(status));
                        }
                    }
                }
                sleep(READY_POLL_INTERVAL).await;
            }
        };

        timeout(limit, wait)
            .await
            .unwrap_or(Err(SupervisorError::StartupTimeout(limit.as_secs())))
    }

    pub fn status(&self) -> DaemonStatus {
        self.inner.state.read().status
    }

    pub fn is_running(&self) -> bool {
        self.status() == DaemonStatus::Running
    }

    /// Running and the last probe succeeded.
    pub fn is_healthy(&self) -> bool {
        let state = self.inner.state.read();
        state.status == DaemonStatus::Running && state.healthy
    }

    /// OS pid of the daemon, 0 when none.
    pub fn pid(&self) -> u32 {
        self.inner.state.read().pid
    }

    /// Time since the current run started; zero unless Running.
    pub fn uptime(&self) -> Duration {
        self.inner.state.read().uptime()
    }

    /// True while a health-triggered restart is in flight.
    pub fn is_recovering(&self) -> bool {
        self.inner.recovering.load(Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<SupervisorError> {
        self.inner.state.read().last_error.clone()
    }

    pub fn health_status(&self) -> HealthSnapshot {
        self.inner.state.read().health_snapshot()
    }

    pub fn info(&self) -> DaemonInfo {
        self.inner.state.read().info()
    }

    /// Zero the recovery counters, e.g. after the host reconnected to the daemon.
    pub fn reset_restart_attempts(&self) {
        let mut state = self.inner.state.write();
        state.restart_attempts = 0;
        state.consecutive_failures = 0;
        debug!("Restart attempts reset");
    }

    /// Change the listen port. Takes effect on the next start.
    pub fn set_port(&self, port: u16) {
        self.inner.state.write().port = port;
    }

    pub fn port(&self) -> u16 {
        self.inner.state.read().port
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use mtgac_core::ports::{LocateError, ProbeError};

    use super::*;

    struct MissingLocator;

    impl BinaryLocator for MissingLocator {
        fn locate(&self, _configured: Option<&Path>) -> Result<PathBuf, LocateError> {
            Err(LocateError::NotFound {
                searched: vec![PathBuf::from("/nowhere/mtga-tracker-daemon")],
            })
        }
    }

    struct FixedLocator(PathBuf);

    impl BinaryLocator for FixedLocator {
        fn locate(&self, _configured: Option<&Path>) -> Result<PathBuf, LocateError> {
            Ok(self.0.clone())
        }
    }

    struct ScriptedProbe(Mutex<Vec<Result<(), ProbeError>>>);

    #[async_trait::async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn check(&self, _port: u16) -> Result<(), ProbeError> {
            self.0.lock().unwrap().pop().unwrap_or(Ok(()))
        }
    }

    fn supervisor(locator: Arc<dyn BinaryLocator>) -> Supervisor {
        Supervisor::new(
            SupervisorConfig::default().with_health_check_interval(Duration::ZERO),
            locator,
            Arc::new(ScriptedProbe(Mutex::new(Vec::new()))),
        )
    }

    #[tokio::test]
    async fn test_start_without_binary_sets_error() {
        let sup = supervisor(Arc::new(MissingLocator));

        let err = sup.start().unwrap_err();
        assert!(matches!(
            err,
            SupervisorError::BinaryNotFound(LocateError::NotFound { .. })
        ));
        assert_eq!(sup.status(), DaemonStatus::Error);
        assert_eq!(sup.pid(), 0);
        assert_eq!(sup.last_error(), Some(err));
    }

    #[tokio::test]
    async fn test_spawn_failure_sets_error() {
        let sup = supervisor(Arc::new(FixedLocator(PathBuf::from(
            "/nonexistent/mtga-tracker-daemon",
        ))));

        let err = sup.start().unwrap_err();
        assert!(matches!(err, SupervisorError::SpawnFailed(_)));
        assert_eq!(sup.status(), DaemonStatus::Error);
        assert!(err.to_string().starts_with("failed to start daemon"));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let sup = supervisor(Arc::new(MissingLocator));
        assert!(sup.stop().await.is_ok());
        assert!(sup.stop().await.is_ok());
        assert_eq!(sup.status(), DaemonStatus::Stopped);
    }

    #[tokio::test]
    async fn test_stop_from_error_settles_stopped() {
        let sup = supervisor(Arc::new(MissingLocator));
        let _ = sup.start();
        assert_eq!(sup.status(), DaemonStatus::Error);

        sup.stop().await.unwrap();
        assert_eq!(sup.status(), DaemonStatus::Stopped);
        assert_eq!(sup.pid(), 0);
        assert!(!sup.is_healthy());
    }

    #[tokio::test]
    async fn test_start_rejected_while_stopping() {
        let sup = supervisor(Arc::new(MissingLocator));
        sup.inner.state.write().status = DaemonStatus::Stopping;

        assert_eq!(
            sup.start(),
            Err(SupervisorError::AlreadyRunning(DaemonStatus::Stopping))
        );
    }

    #[test]
    fn test_port_and_reset() {
        let sup = supervisor(Arc::new(MissingLocator));
        assert_eq!(sup.port(), 9999);
        sup.set_port(12000);
        assert_eq!(sup.port(), 12000);
        assert_eq!(sup.info().port, 12000);

        {
            let mut state = sup.inner.state.write();
            state.restart_attempts = 3;
            state.consecutive_failures = 2;
        }
        sup.reset_restart_attempts();
        let health = sup.health_status();
        assert_eq!(health.restart_attempts, 0);
        assert_eq!(health.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_wait_until_running_reports_start_failure() {
        let sup = supervisor(Arc::new(MissingLocator));
        let _ = sup.start();

        let err = sup.wait_until_running().await.unwrap_err();
        assert!(matches!(err, SupervisorError::BinaryNotFound(_)));
    }

    #[tokio::test]
    async fn test_launch_skipped_after_caller_stop() {
        let sup = supervisor(Arc::new(MissingLocator));
        let epoch = sup.inner.state.read().stop_epoch;

        sup.stop().await.unwrap();

        // Nothing is resolved or spawned, so no locate error is recorded
        assert_eq!(sup.launch(Some(epoch)), Ok(false));
        assert_eq!(sup.status(), DaemonStatus::Stopped);
        assert_eq!(sup.last_error(), None);
    }

    #[tokio::test]
    async fn test_wait_until_running_without_a_run() {
        let sup = supervisor(Arc::new(MissingLocator));

        assert_eq!(
            sup.wait_until_running().await,
            Err(SupervisorError::NotRunning(DaemonStatus::Stopped))
        );
        assert_eq!(sup.last_error(), None);
    }

    #[tokio::test]
    async fn test_stale_health_result_is_ignored() {
        let sup = Supervisor::new(
            SupervisorConfig::default(),
            Arc::new(MissingLocator),
            Arc::new(ScriptedProbe(Mutex::new(vec![Err(
                ProbeError::UnhealthyStatusCode(500),
            )]))),
        );
        {
            let mut state = sup.inner.state.write();
            state.generation = 2;
            state.status = DaemonStatus::Running;
        }

        // A probe from generation 1 finishing after generation 2 took over
        tasks::check_health(&sup, 1, 9999, &CancellationToken::new()).await;

        let health = sup.health_status();
        assert_eq!(health.consecutive_failures, 0);
        assert_eq!(health.restart_attempts, 0);
        assert!(health.last_check.is_none());
        assert_eq!(sup.status(), DaemonStatus::Running);
    }

    #[cfg(unix)]
    mod process {
        use std::os::unix::fs::PermissionsExt;

        use std::sync::atomic::AtomicUsize;

        use mtgac_core::config::SupervisorTimings;
        use tempfile::TempDir;

        use super::*;

        fn sleeper(dir: &TempDir) -> PathBuf {
            let path = dir.path().join("mtga-tracker-daemon");
            std::fs::write(&path, "#!/bin/sh\nexec sleep 30\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_exhausted_recovery_tears_down_process() {
            let dir = TempDir::new().unwrap();
            let sup = Supervisor::new(
                SupervisorConfig::default()
                    .with_health_check_interval(Duration::ZERO)
                    .with_max_restart_attempts(2)
                    .with_shutdown_timeout(Duration::from_secs(2)),
                Arc::new(FixedLocator(sleeper(&dir))),
                Arc::new(ScriptedProbe(Mutex::new(Vec::new()))),
            );
            sup.start().unwrap();
            assert_ne!(sup.pid(), 0);

            let generation = {
                let mut state = sup.inner.state.write();
                state.restart_attempts = 2;
                state.generation
            };
            tasks::recover(&sup, generation, &CancellationToken::new()).await;

            assert_eq!(sup.status(), DaemonStatus::Error);
            assert_eq!(sup.pid(), 0);
            assert_eq!(
                sup.last_error(),
                Some(SupervisorError::RestartLimitExceeded(2))
            );
            assert_eq!(sup.health_status().restart_attempts, 3);
        }

        /// Always fails and counts calls.
        #[derive(Default)]
        struct FailingProbe(AtomicUsize);

        #[async_trait::async_trait]
        impl HealthProbe for FailingProbe {
            async fn check(&self, _port: u16) -> Result<(), ProbeError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(ProbeError::UnhealthyStatusCode(503))
            }
        }

        #[tokio::test]
        async fn test_health_loop_idle_during_recovery_backoff() {
            let dir = TempDir::new().unwrap();
            let probe = Arc::new(FailingProbe::default());
            let sup = Supervisor::new(
                SupervisorConfig::default()
                    .with_health_check_interval(Duration::from_millis(50))
                    .with_shutdown_timeout(Duration::from_secs(2))
                    .with_timings(SupervisorTimings {
                        readiness_delay: Duration::from_millis(20),
                        health_settle_delay: Duration::from_millis(20),
                        restart_pause: Duration::from_millis(20),
                    }),
                Arc::new(FixedLocator(sleeper(&dir))),
                probe.clone(),
            );
            sup.start().unwrap();
            // The first failure becomes attempt 2, which backs off for 5s
            sup.inner.state.write().restart_attempts = 1;

            let deadline = std::time::Instant::now() + Duration::from_secs(5);
            while !sup.is_recovering() {
                assert!(std::time::Instant::now() < deadline, "recovery never began");
                sleep(Duration::from_millis(10)).await;
            }
            let calls = probe.0.load(Ordering::SeqCst);
            let pid = sup.pid();

            // Ten ticks' worth of time inside the backoff
            for _ in 0..10 {
                sleep(Duration::from_millis(50)).await;
                assert!(sup.is_recovering());
                assert_eq!(probe.0.load(Ordering::SeqCst), calls);
            }
            assert_eq!(sup.pid(), pid);
            assert_eq!(sup.health_status().restart_attempts, 2);

            sup.stop().await.unwrap();
            assert_eq!(sup.status(), DaemonStatus::Stopped);
        }

        #[tokio::test]
        async fn test_recovery_abandoned_when_run_cancelled() {
            let dir = TempDir::new().unwrap();
            let sup = Supervisor::new(
                SupervisorConfig::default().with_health_check_interval(Duration::ZERO),
                Arc::new(FixedLocator(sleeper(&dir))),
                Arc::new(ScriptedProbe(Mutex::new(Vec::new()))),
            );
            sup.start().unwrap();
            let (generation, pid) = {
                let mut state = sup.inner.state.write();
                // Attempt 2 waits 5s; cancellation must cut that short
                state.restart_attempts = 1;
                (state.generation, state.pid)
            };

            let cancel = CancellationToken::new();
            cancel.cancel();
            tokio::time::timeout(
                Duration::from_secs(1),
                tasks::recover(&sup, generation, &cancel),
            )
            .await
            .unwrap();

            assert_eq!(sup.pid(), pid);
            assert_eq!(sup.health_status().restart_attempts, 2);
            sup.stop().await.unwrap();
        }
    }
}
