//! # Stage: Agent Configuration
//!
//! ## Responsibility
//! Build a single [`AgentConfig`] from environment-style variables once at
//! startup.  The config is passed by reference into every component
//! constructor; nothing else in the crate reads the process environment.
//!
//! ## Guarantees
//! - Every variable is independently overridable and has a documented default
//! - An empty variable is treated as absent
//! - A present but unparseable numeric variable is reported as
//!   [`AgentError::Config`] instead of silently falling back
//! - `P95_SLO_MS` must be a positive integer; `0` is rejected as
//!   [`AgentError::Config`] since every latency would breach it

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AgentError, Result};

pub const DEFAULT_PROM_URL: &str = "http://prometheus:9090";
pub const DEFAULT_OPA_URL: &str = "http://opa:8181/v1/data/tval/allow";
pub const DEFAULT_PROPOSALS_DIR: &str = "/app/manifests";
pub const DEFAULT_LOGS_DIR: &str = "/app/logs";
pub const DEFAULT_TARGET_SERVICE: &str = "payments";
pub const DEFAULT_P95_SLO_MS: u32 = 200;
pub const DEFAULT_SCHEMA_PATH: &str = "/app/schemas/justification_schema.json";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Per-call timeout for metrics backend queries.
pub const METRICS_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-call timeout for the target service health probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// Per-call timeout for policy engine decisions.
pub const POLICY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime configuration for the tuning agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Base URL of the Prometheus-compatible metrics backend.
    pub prom_url: String,
    /// Full URL of the policy engine's decision endpoint.
    pub opa_url: String,
    /// Directory proposal manifests are written to.
    pub proposals_dir: PathBuf,
    /// Directory justification records and the trust index are written to.
    pub logs_dir: PathBuf,
    /// Name of the service whose concurrency limit is tuned.
    pub target_service: String,
    /// p95 latency objective in milliseconds.
    pub p95_slo_ms: u32,
    /// Status endpoint of the target service.
    pub health_url: String,
    /// Optional JSON schema for justification records.
    pub schema_path: PathBuf,
    /// Sleep between cycles in continuous mode, measured after a cycle ends.
    pub poll_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            prom_url: DEFAULT_PROM_URL.to_string(),
            opa_url: DEFAULT_OPA_URL.to_string(),
            proposals_dir: PathBuf::from(DEFAULT_PROPOSALS_DIR),
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
            target_service: DEFAULT_TARGET_SERVICE.to_string(),
            p95_slo_ms: DEFAULT_P95_SLO_MS,
            health_url: default_health_url(DEFAULT_TARGET_SERVICE),
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl AgentConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// `lookup` returns `None` for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let target_service =
            get("TARGET_SERVICE").unwrap_or_else(|| DEFAULT_TARGET_SERVICE.to_string());
        let health_url = get("SERVICE_HEALTH_URL").unwrap_or_else(|| default_health_url(&target_service));

        let p95_slo_ms = match get("P95_SLO_MS") {
            Some(raw) => parse_var::<u32>("P95_SLO_MS", &raw)?,
            None => DEFAULT_P95_SLO_MS,
        };
        if p95_slo_ms == 0 {
            return Err(AgentError::Config {
                var: "P95_SLO_MS".into(),
                detail: "must be greater than zero".into(),
            });
        }

        let poll_interval = match get("POLL_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(parse_var::<u64>("POLL_INTERVAL_SECS", &raw)?),
            None => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            prom_url: get("PROM_URL").unwrap_or_else(|| DEFAULT_PROM_URL.to_string()),
            opa_url: get("OPA_URL").unwrap_or_else(|| DEFAULT_OPA_URL.to_string()),
            proposals_dir: get("PROPOSALS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROPOSALS_DIR)),
            logs_dir: get("LOGS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_DIR)),
            target_service,
            p95_slo_ms,
            health_url,
            schema_path: get("JUSTIFICATION_SCHEMA")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_PATH)),
            poll_interval,
        })
    }
}

fn default_health_url(service: &str) -> String {
    format!("http://{service}:8000/health")
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| AgentError::Config {
        var: var.to_string(),
        detail: format!("{raw:?}: {e}"),
    })
}
