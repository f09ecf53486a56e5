//! Runtime infrastructure for supervising the MTGA tracker daemon.
//!
//! Implements the `mtgac-core` ports (`HttpHealthProbe`, `FsBinaryLocator`)
//! and provides the [`Supervisor`] that owns the daemon process.
#![deny(unsafe_code)]

mod health;
mod locator;
pub mod process;
pub mod supervisor;

pub use health::{HEALTH_PROBE_TIMEOUT, HttpHealthProbe};
pub use locator::FsBinaryLocator;
pub use supervisor::Supervisor;
pub use supervisor::recovery::{RecoveryDecision, RecoveryPolicy, calculate_backoff};
