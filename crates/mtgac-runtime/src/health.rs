//! HTTP health probe for the tracker daemon.
//!
//! Performs one `GET /status` per call. It is intentionally minimal and has
//! no scheduling or recovery logic.

use std::time::Duration;

use async_trait::async_trait;
use mtgac_core::ports::{HealthProbe, ProbeError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Per-request timeout of a health probe.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Status strings the daemon uses to report itself healthy.
const HEALTHY_REPORTS: [&str; 3] = ["healthy", "ok", "running"];

/// Body of the daemon's `/status` endpoint. Only `status` is inspected.
#[derive(Debug, Deserialize)]
struct StatusReport {
    #[serde(default)]
    status: String,
}

/// [`HealthProbe`] over plain HTTP to the local daemon.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: Client,
    host: String,
}

impl HttpHealthProbe {
    /// Probe targeting `localhost` with the default timeout.
    pub fn new() -> Result<Self, ProbeError> {
        Self::with_timeout(HEALTH_PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        Ok(Self {
            client,
            host: "localhost".to_string(),
        })
    }

    /// Target a different host (e.g. `127.0.0.1` to skip name resolution).
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// URL of the status endpoint for `port`.
    pub fn status_url(&self, port: u16) -> String {
        format!("http://{}:{}/status", self.host, port)
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self, port: u16) -> Result<(), ProbeError> {
        let url = self.status_url(port);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProbeError::UnhealthyStatusCode(status.as_u16()));
        }

        // A 200 with a body we cannot decode still counts as healthy
        match response.json::<StatusReport>().await {
            Ok(report) if HEALTHY_REPORTS.contains(&report.status.as_str()) => Ok(()),
            Ok(report) => Err(ProbeError::UnhealthyReport(report.status)),
            Err(e) => {
                debug!(port = %port, error = %e, "undecodable status body, treating as healthy");
                Ok(())
            }
        }
    }
}
