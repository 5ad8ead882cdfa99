//! # Stage: Policy Verifier
//!
//! ## Responsibility
//! Ask an Open Policy Agent style decision endpoint whether a proposed
//! parameter change is allowed.
//!
//! ## Guarantees
//! - Deny by default: a response without a boolean `result` is a deny
//! - Strict: transport and non-2xx failures are returned, never mapped to allow
//!
//! ## NOT Responsible For
//! - Enforcing the verdict.  The control loop records it alongside the
//!   proposal; persisting is not gated on it.

use serde::Serialize;
use tracing::debug;

use crate::config::{AgentConfig, POLICY_TIMEOUT};
use crate::error::Result;
use crate::http::{build_client, send_json};

/// Authorization verdict source for proposed changes.
#[allow(async_fn_in_trait)]
pub trait PolicyEngine {
    /// `true` when the engine allows setting `param` to `proposed`.
    async fn verify(&self, param: &str, proposed: u32) -> Result<bool>;
}

impl<T: PolicyEngine> PolicyEngine for &T {
    async fn verify(&self, param: &str, proposed: u32) -> Result<bool> {
        (**self).verify(param, proposed).await
    }
}

#[derive(Debug, Serialize)]
struct DecisionRequest<'a> {
    input: DecisionInput<'a>,
}

#[derive(Debug, Serialize)]
struct DecisionInput<'a> {
    target: &'a str,
    param: &'a str,
    proposed: u32,
}

/// HTTP client for the policy engine's decision endpoint.
pub struct OpaClient {
    url: String,
    target: String,
    client: reqwest::Client,
}

impl OpaClient {
    pub fn new(cfg: &AgentConfig) -> Self {
        Self {
            url: cfg.opa_url.clone(),
            target: cfg.target_service.clone(),
            client: build_client(POLICY_TIMEOUT),
        }
    }
}

impl PolicyEngine for OpaClient {
    async fn verify(&self, param: &str, proposed: u32) -> Result<bool> {
        let body = DecisionRequest {
            input: DecisionInput { target: &self.target, param, proposed },
        };
        let resp: serde_json::Value =
            send_json(self.client.post(&self.url).json(&body), &self.url, "result").await?;
        let allowed = resp
            .get("result")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        debug!(target_service = %self.target, param, proposed, allowed, "policy verdict");
        Ok(allowed)
    }
}
