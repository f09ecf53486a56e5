//! Main CLI parser and top-level argument handling.
//!
//! Every global option can also be supplied through an `MTGAC_*` environment
//! variable (a `.env` file in the working directory is honored).

use std::path::PathBuf;

use clap::Parser;
use mtgac_core::DaemonSettings;

use crate::commands::Commands;

/// Supervise the MTGA tracker daemon.
#[derive(Parser, Debug)]
#[command(name = "mtgac")]
#[command(about = "Start, probe and supervise the MTGA tracker daemon")]
#[command(version)]
pub struct Cli {
    /// Port the daemon listens on
    #[arg(long, global = true, env = "MTGAC_PORT")]
    pub port: Option<u16>,

    /// Explicit daemon executable (skips auto-detection)
    #[arg(long = "daemon-path", global = true, env = "MTGAC_DAEMON_PATH")]
    pub daemon_path: Option<PathBuf>,

    /// JSON settings file, applied before command-line overrides
    #[arg(long, global = true, env = "MTGAC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not restart the daemon when health checks fail
    #[arg(long = "no-auto-restart", global = true, env = "MTGAC_NO_AUTO_RESTART")]
    pub no_auto_restart: bool,

    /// Recovery attempts before giving up (0 = unlimited)
    #[arg(long = "max-restart-attempts", global = true, env = "MTGAC_MAX_RESTART_ATTEMPTS")]
    pub max_restart_attempts: Option<u32>,

    /// Seconds between health checks (0 disables them)
    #[arg(long = "health-interval-secs", global = true, env = "MTGAC_HEALTH_INTERVAL_SECS")]
    pub health_interval_secs: Option<u64>,

    /// Seconds to wait for a graceful exit before killing the daemon
    #[arg(long = "shutdown-timeout-secs", global = true, env = "MTGAC_SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true, env = "MTGAC_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings layer made of the options given on the command line.
    pub fn overrides(&self) -> DaemonSettings {
        DaemonSettings {
            port: self.port,
            daemon_path: self
                .daemon_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            startup_timeout_secs: None,
            shutdown_timeout_secs: self.shutdown_timeout_secs,
            health_check_interval_secs: self.health_interval_secs,
            auto_restart: self.no_auto_restart.then_some(false),
            max_restart_attempts: self.max_restart_attempts,
        }
    }
}
