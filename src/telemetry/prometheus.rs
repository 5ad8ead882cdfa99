//! Prometheus instant-query client.

use serde::Deserialize;

use super::MetricsSource;
use crate::config::{AgentConfig, METRICS_TIMEOUT};
use crate::error::{AgentError, Result};
use crate::http::{build_client, send_json};

#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: QueryData,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<InstantSample>,
}

/// One vector element: `{"metric": {...}, "value": [<ts>, "<value>"]}`.
#[derive(Debug, Deserialize)]
struct InstantSample {
    value: (f64, String),
}

/// Metrics backend client for one target service.
pub struct PrometheusClient {
    base_url: String,
    p95_query: String,
    error_query: String,
    client: reqwest::Client,
}

impl PrometheusClient {
    /// Build a client for `cfg.target_service` against `cfg.prom_url`.
    pub fn new(cfg: &AgentConfig) -> Self {
        Self {
            base_url: cfg.prom_url.trim_end_matches('/').to_string(),
            p95_query: p95_query(&cfg.target_service),
            error_query: error_query(&cfg.target_service),
            client: build_client(METRICS_TIMEOUT),
        }
    }

    /// Run an instant query and return the first sample's value.
    ///
    /// `Ok(None)` when the result vector is empty; that is distinct from a
    /// sample whose value is zero.
    pub async fn query(&self, promql: &str) -> Result<Option<f64>> {
        let url = format!("{}/api/v1/query", self.base_url);
        let req = self.client.get(&url).query(&[("query", promql)]);
        let resp: QueryResponse = send_json(req, &url, "data.result").await?;

        let Some(sample) = resp.data.result.into_iter().next() else {
            return Ok(None);
        };
        let raw = sample.value.1;
        raw.trim().parse::<f64>().map(Some).map_err(|e| AgentError::Json {
            field: "value".into(),
            detail: format!("{raw:?}: {e}"),
        })
    }
}

impl MetricsSource for PrometheusClient {
    async fn p95_latency_ms(&self) -> Result<Option<f64>> {
        self.query(&self.p95_query).await
    }

    async fn error_rate(&self) -> Result<f64> {
        Ok(self.query(&self.error_query).await?.unwrap_or(0.0))
    }
}

/// p95 request latency over 5 minutes, in milliseconds.
pub fn p95_query(service: &str) -> String {
    format!("histogram_quantile(0.95, sum(rate({service}_latency_seconds_bucket[5m])) by (le)) * 1000")
}

/// Per-second error rate over 5 minutes.
pub fn error_query(service: &str) -> String {
    format!("rate({service}_errors_total[5m])")
}
