//! # Module: telemetry
//!
//! Read-side of the control loop: what the target service is doing right now.
//!
//! ## Sub-modules
//! - [`prometheus`]: p95 latency and error rate from a Prometheus instant query
//! - [`probe`]: currently configured concurrency from the service health endpoint
//!
//! The traits here are the seams the [`ControlLoop`](crate::agent::ControlLoop)
//! is generic over, so a cycle can be driven without a live backend.

pub mod probe;
pub mod prometheus;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use probe::{HealthProbe, DEFAULT_CONCURRENCY};
pub use prometheus::PrometheusClient;

/// Latency and error signals for one cycle.
///
/// Serialized field names match the `metrics` object of a justification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// `None` means the backend has no samples yet.
    #[serde(rename = "p95_ms")]
    pub p95_latency_ms: Option<f64>,
    pub error_rate: f64,
    #[serde(rename = "p95_slo_ms")]
    pub slo_ms: u32,
}

impl MetricsSnapshot {
    /// Record field name of the first NaN or infinite signal, if any.
    ///
    /// JSON has no encoding for these values.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        if self.p95_latency_ms.is_some_and(|v| !v.is_finite()) {
            Some("p95_ms")
        } else if !self.error_rate.is_finite() {
            Some("error_rate")
        } else {
            None
        }
    }
}

/// Source of the latency and error signals.
///
/// Transport failures are returned, not absorbed: the caller owns isolation.
#[allow(async_fn_in_trait)]
pub trait MetricsSource {
    /// Current p95 latency in milliseconds, `None` when no series exists.
    async fn p95_latency_ms(&self) -> Result<Option<f64>>;

    /// Current error rate; `0.0` when no series exists.
    async fn error_rate(&self) -> Result<f64>;
}

/// Source of the target service's currently configured concurrency limit.
///
/// Infallible by contract: implementations fall back to a default.
#[allow(async_fn_in_trait)]
pub trait ConcurrencyProbe {
    async fn current_concurrency(&self) -> u32;
}
