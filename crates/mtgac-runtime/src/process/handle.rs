//! Spawned daemon process and its remote control.
//!
//! The `Child` is owned by a single [`ExitWatcher`] task. Everyone else talks
//! to the process through a [`ProcessHandle`], which only raises requests
//! (terminate, kill) and observes the exit signal. Terminate is SIGTERM on
//! Unix and an immediate kill elsewhere.

use std::io;
use std::path::Path;
use std::process::ExitStatus;

use mtgac_core::config::DaemonOutput;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

use super::output::{attach_readers, configure_stdio};

/// Cloneable control surface for one daemon process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: u32,
    terminate: CancellationToken,
    kill: CancellationToken,
    exited: CancellationToken,
}

impl ProcessHandle {
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Ask the process to shut down gracefully.
    pub fn terminate(&self) {
        self.terminate.cancel();
    }

    /// Force-kill the process.
    pub fn kill(&self) {
        self.kill.cancel();
    }

    /// Resolves once the process has exited and been reaped.
    pub async fn exited(&self) {
        self.exited.cancelled().await;
    }

    pub fn has_exited(&self) -> bool {
        self.exited.is_cancelled()
    }
}

/// Owner of the `Child`. Must be driven with [`ExitWatcher::wait`].
#[derive(Debug)]
pub struct ExitWatcher {
    child: Child,
    handle: ProcessHandle,
}

impl ExitWatcher {
    /// Wait for the process to exit while servicing terminate/kill requests.
    ///
    /// Fires the handle's exit signal before returning, whatever the outcome.
    pub async fn wait(mut self) -> io::Result<ExitStatus> {
        let pid = self.handle.pid;
        let mut terminate_sent = false;
        let mut kill_sent = false;

        let result = loop {
            tokio::select! {
                biased;
                status = self.child.wait() => break status,
                () = self.handle.kill.cancelled(), if !kill_sent => {
                    kill_sent = true;
                    if let Err(e) = self.child.start_kill() {
                        warn!(pid = %pid, error = %e, "Failed to force-kill daemon");
                    }
                }
                () = self.handle.terminate.cancelled(), if !terminate_sent => {
                    terminate_sent = true;
                    self.send_terminate();
                }
            }
        };

        self.handle.exited.cancel();
        result
    }

    #[cfg(unix)]
    fn send_terminate(&mut self) {
        let pid = self.handle.pid;
        let Ok(raw) = i32::try_from(pid) else {
            warn!(pid = %pid, "PID out of range for SIGTERM, killing instead");
            let _ = self.child.start_kill();
            return;
        };
        match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) => debug!(pid = %pid, "Sent SIGTERM to daemon"),
            // Already exited, wait() will pick it up
            Err(nix::errno::Errno::ESRCH) => {}
            Err(e) => warn!(pid = %pid, error = %e, "Failed to send SIGTERM to daemon"),
        }
    }

    #[cfg(not(unix))]
    fn send_terminate(&mut self) {
        // No SIGTERM equivalent, terminate immediately
        if let Err(e) = self.child.start_kill() {
            warn!(pid = %self.handle.pid, error = %e, "Failed to kill daemon");
        }
    }
}

/// Launch `<binary> --port <port>`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_daemon(
    binary: &Path,
    port: u16,
    output: &DaemonOutput,
) -> io::Result<(ProcessHandle, ExitWatcher)> {
    let mut cmd = Command::new(binary);
    cmd.arg("--port").arg(port.to_string()).kill_on_drop(true);
    configure_stdio(&mut cmd, output);

    let mut child = cmd.spawn()?;
    let pid = child
        .id()
        .ok_or_else(|| io::Error::other("spawned daemon has no PID"))?;
    attach_readers(&mut child, pid, output);

    let handle = ProcessHandle {
        pid,
        terminate: CancellationToken::new(),
        kill: CancellationToken::new(),
        exited: CancellationToken::new(),
    };
    let watcher = ExitWatcher {
        child,
        handle: handle.clone(),
    };
    Ok((handle, watcher))
}
