//! Daemon lifecycle status and the read-only views the supervisor hands out.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of the supervised daemon.
///
/// The status values directly map to the strings reported to the frontend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonStatus {
    /// No daemon process is tracked.
    #[default]
    Stopped,
    /// The process was spawned and has not yet survived the readiness delay.
    Starting,
    /// The process is alive and considered ready.
    Running,
    /// A stop has been requested and the process is being torn down.
    Stopping,
    /// The last start, run or recovery failed. No process is tracked.
    Error,
}

impl DaemonStatus {
    /// String form used in logs and serialized payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }

    /// Whether a process is (or may still be) attached in this status.
    ///
    /// A new start is rejected while this returns true.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Stopping)
    }

    /// Whether the supervisor is at rest with no process attached.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Stopped | Self::Error)
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the health-check bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    /// Result of the most recent health probe.
    pub healthy: bool,
    /// When the daemon was last probed, if ever.
    pub last_check: Option<DateTime<Utc>>,
    /// Failed probes since the last successful one.
    pub consecutive_failures: u32,
    /// Recovery attempts since the last successful recovery or manual reset.
    pub restart_attempts: u32,
    /// Most recent error message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of the supervisor state for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonInfo {
    pub status: DaemonStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(DaemonStatus::Starting.is_active());
        assert!(DaemonStatus::Running.is_active());
        assert!(DaemonStatus::Stopping.is_active());
        assert!(!DaemonStatus::Stopped.is_active());
        assert!(!DaemonStatus::Error.is_active());

        assert!(DaemonStatus::Stopped.is_idle());
        assert!(DaemonStatus::Error.is_idle());
        assert!(!DaemonStatus::Running.is_idle());
    }

    #[test]
    fn test_status_display_matches_serialization() {
        for status in [
            DaemonStatus::Stopped,
            DaemonStatus::Starting,
            DaemonStatus::Running,
            DaemonStatus::Stopping,
            DaemonStatus::Error,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn test_info_serialization_skips_empty_fields() {
        let info = DaemonInfo {
            status: DaemonStatus::Stopped,
            pid: None,
            port: 9999,
            uptime_secs: None,
            last_error: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"status":"stopped","port":9999}"#);
    }

    #[test]
    fn test_health_snapshot_uses_camel_case() {
        let snapshot = HealthSnapshot {
            consecutive_failures: 2,
            restart_attempts: 1,
            error: Some("connection refused".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"consecutiveFailures\":2"));
        assert!(json.contains("\"restartAttempts\":1"));
        assert!(json.contains("\"lastCheck\":null"));
    }
}
