//! Health service - backend liveness probe

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::time::MissedTickBehavior;

use crate::adapters::api_client::ApiClient;

/// Default polling interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Outcome of one probe
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub checked_at: DateTime<Utc>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }
}

pub struct HealthService {
    api: Arc<ApiClient>,
    interval: Duration,
}

impl HealthService {
    pub fn new(api: Arc<ApiClient>, interval: Duration) -> Self {
        Self { api, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Probe the backend once; failures are reported as `Unhealthy`
    pub async fn check(&self) -> HealthStatus {
        let started = Instant::now();
        let result = self.api.health().await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(details) => HealthStatus {
                state: HealthState::Healthy,
                checked_at: Utc::now(),
                response_time_ms,
                details: (!details.is_null()).then_some(details),
                error: None,
            },
            Err(e) => HealthStatus {
                state: HealthState::Unhealthy,
                checked_at: Utc::now(),
                response_time_ms,
                details: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Check now, then every interval, until `limit` checks have run
    ///
    /// A limit of zero runs no check at all.
    ///
    /// Without a limit this only returns when the future is dropped.
    pub async fn poll<F>(&self, mut on_status: F, limit: Option<usize>)
    where
        F: FnMut(&HealthStatus),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut checks = 0usize;
        while limit.map_or(true, |limit| checks < limit) {
            ticker.tick().await;
            let status = self.check().await;
            on_status(&status);
            checks += 1;
        }
    }
}
