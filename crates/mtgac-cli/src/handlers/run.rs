//! Run command handler.
//!
//! Starts the daemon, reports when it is ready and keeps supervising it in
//! the foreground until Ctrl-C or until supervision ends on its own.

use std::time::Duration;

use anyhow::Result;
use mtgac_core::{DaemonStatus, SupervisorError};
use mtgac_runtime::Supervisor;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// How often the foreground loop looks at the supervisor's status.
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Execute the run command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let config = ctx
        .supervisor_config()
        .with_health_callback(|healthy, error| match error {
            Some(e) if !healthy => warn!(error = %e, "Daemon is unhealthy"),
            _ => info!("Daemon is healthy"),
        });
    let supervisor = ctx.supervisor(config);

    supervisor.start().map_err(CliError::from)?;
    if let Err(e) = supervisor.wait_until_running().await {
        supervisor.shutdown().await.map_err(CliError::from)?;
        return Err(CliError::from(e).into());
    }

    let info = supervisor.info();
    println!(
        "Daemon running (pid {}) on http://localhost:{}",
        info.pid.unwrap_or_default(),
        info.port
    );
    println!("Press Ctrl-C to stop.");

    let outcome: Result<()> = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            println!();
            println!("Stopping daemon...");
            signal.map_err(|e| CliError::from(e).into())
        }
        ended = supervision_ended(&supervisor) => match ended {
            None => {
                println!("Daemon exited.");
                Ok(())
            }
            Some(e) => Err(CliError::from(e).into()),
        },
    };

    supervisor.shutdown().await.map_err(CliError::from)?;
    outcome
}

/// Resolve once the daemon is gone for good.
///
/// Yields the error that ended supervision, or `None` after a clean exit.
/// The transient `Stopped` of a recovery restart does not count.
async fn supervision_ended(supervisor: &Supervisor) -> Option<SupervisorError> {
    loop {
        tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        match supervisor.status() {
            DaemonStatus::Error => {
                return Some(supervisor.last_error().unwrap_or_else(|| {
                    SupervisorError::ExitedUnexpectedly("no error recorded".into())
                }));
            }
            DaemonStatus::Stopped if !supervisor.is_recovering() => return None,
            _ => {}
        }
    }
}
