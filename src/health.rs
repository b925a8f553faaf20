use std::time::{Duration, Instant};
use tracing::debug;

use crate::api_client::ApiClient;

/// Backend liveness as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// No probe has completed yet.
    Checking,
    Healthy,
    Down,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Checking => "API ...",
            HealthStatus::Healthy => "API OK",
            HealthStatus::Down => "API OFF",
        }
    }
}

/// Polls `/api/healthz` at a fixed interval. Poll-style like the rest of the
/// event loop: `tick` does nothing until the interval has elapsed.
pub struct HealthMonitor {
    interval: Duration,
    last_probe: Option<Instant>,
    status: HealthStatus,
}

impl HealthMonitor {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            last_probe: None,
            status: HealthStatus::Checking,
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    /// Probe if due. Returns true when the status changed.
    pub fn tick(&mut self, client: &ApiClient) -> bool {
        let due = match self.last_probe {
            None => true,
            Some(at) => at.elapsed() >= self.interval,
        };
        if !due {
            return false;
        }
        self.probe_now(client)
    }

    /// Probe unconditionally. Any 2xx answer counts as healthy, matching the
    /// badge behavior in the web client; body contents are informational.
    pub fn probe_now(&mut self, client: &ApiClient) -> bool {
        self.last_probe = Some(Instant::now());
        let next = match client.check_health() {
            Ok(health) => {
                debug!(target: "health", "probe ok: {}", health.status);
                HealthStatus::Healthy
            }
            Err(e) => {
                debug!(target: "health", "probe failed: {}", e);
                HealthStatus::Down
            }
        };
        let changed = next != self.status;
        self.status = next;
        changed
    }
}
