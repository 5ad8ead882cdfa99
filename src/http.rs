//! Shared reqwest plumbing for the metrics, probe and policy clients.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{AgentError, Result};

/// Build a client whose every request is bounded by `timeout`.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    // Client::builder() can fail in extreme environments; fall back to a
    // default client instead of panicking.
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Send `req` and decode a 2xx JSON body into `T`.
///
/// `field` names the payload in [`AgentError::Json`] when decoding fails.
pub(crate) async fn send_json<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
    url: &str,
    field: &str,
) -> Result<T> {
    let resp = req.send().await.map_err(|e| AgentError::Connect {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    if !resp.status().is_success() {
        return Err(AgentError::Http {
            status: resp.status().as_u16(),
            url: url.to_string(),
        });
    }

    let bytes = resp.bytes().await.map_err(|e| AgentError::Connect {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    serde_json::from_slice::<T>(&bytes).map_err(|e| AgentError::Json {
        field: field.to_string(),
        detail: e.to_string(),
    })
}
