//! Daemon process control.
//!
//! # Structure
//!
//! - `spawn_daemon` - launches `<binary> --port <N>` with the configured output routing
//! - `ProcessHandle` - cloneable remote control (terminate, kill, wait for exit)
//! - `ExitWatcher` - owns the `Child` and services the handle's requests until exit

mod handle;
mod output;

pub use handle::{ExitWatcher, ProcessHandle, spawn_daemon};
