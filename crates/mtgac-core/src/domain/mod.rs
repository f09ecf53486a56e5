//! Domain types for the daemon lifecycle.

mod daemon;

pub use daemon::{DaemonInfo, DaemonStatus, HealthSnapshot};
