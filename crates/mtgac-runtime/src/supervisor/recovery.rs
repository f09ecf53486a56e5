//! Recovery policy for unhealthy daemons.
//!
//! Pure backoff math plus a single-slot guard that keeps at most one
//! recovery in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Delay before recovery attempt `attempt` (1-based).
///
/// 0s, 5s, 30s, then capped at 2 minutes. Attempt 0 is treated as 1.
pub const fn calculate_backoff(attempt: u32) -> Duration {
    match attempt {
        0 | 1 => Duration::ZERO,
        2 => Duration::from_secs(5),
        3 => Duration::from_secs(30),
        _ => Duration::from_secs(120),
    }
}

/// What to do about a failed health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    /// Restart after waiting this long.
    Retry(Duration),
    /// The attempt budget is spent.
    GiveUp,
}

/// Maps attempt numbers to decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Zero means unlimited.
    pub max_attempts: u32,
}

impl RecoveryPolicy {
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub const fn decide(&self, attempt: u32) -> RecoveryDecision {
        if self.max_attempts > 0 && attempt > self.max_attempts {
            RecoveryDecision::GiveUp
        } else {
            RecoveryDecision::Retry(calculate_backoff(attempt))
        }
    }
}

/// RAII claim on the recovery slot.
///
/// Releases the slot on drop, so an early return or panic in the recovery
/// path never leaves it stuck.
pub(crate) struct RecoveryGuard<'a> {
    slot: &'a AtomicBool,
}

impl<'a> RecoveryGuard<'a> {
    /// Claim the slot, or `None` if a recovery is already running.
    pub fn try_claim(slot: &'a AtomicBool) -> Option<Self> {
        slot.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { slot })
    }
}

impl Drop for RecoveryGuard<'_> {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}
