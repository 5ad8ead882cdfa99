//! Target service health probe.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::ConcurrencyProbe;
use crate::config::{AgentConfig, PROBE_TIMEOUT};
use crate::error::Result;
use crate::http::{build_client, send_json};

/// Assumed concurrency limit when the service cannot tell us.
pub const DEFAULT_CONCURRENCY: u32 = 8;

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default = "default_concurrency")]
    max_concurrency: u32,
}

fn default_concurrency() -> u32 {
    DEFAULT_CONCURRENCY
}

/// Reads `max_concurrency` from the target service's health endpoint.
pub struct HealthProbe {
    url: String,
    client: reqwest::Client,
}

impl HealthProbe {
    pub fn new(cfg: &AgentConfig) -> Self {
        Self::with_timeout(&cfg.health_url, PROBE_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self { url: url.into(), client: build_client(timeout) }
    }

    async fn fetch(&self) -> Result<u32> {
        let resp: HealthResponse = send_json(self.client.get(&self.url), &self.url, "max_concurrency").await?;
        Ok(resp.max_concurrency)
    }
}

impl ConcurrencyProbe for HealthProbe {
    async fn current_concurrency(&self) -> u32 {
        match self.fetch().await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    error = %e,
                    url = %self.url,
                    fallback = DEFAULT_CONCURRENCY,
                    "health probe failed, assuming default concurrency"
                );
                DEFAULT_CONCURRENCY
            }
        }
    }
}
