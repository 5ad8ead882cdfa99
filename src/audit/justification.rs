//! # Stage: Justification Log
//!
//! ## Responsibility
//! The append-only audit trail.  For every proposal the agent writes one JSON
//! record to `<logs_dir>/<action_id>.json` correlating the decision, the
//! metrics that drove it, and the policy verdict.
//!
//! ## Guarantees
//! - Exactly one record per proposal, sharing the proposal's action id
//! - Schema validation is advisory: an invalid record is logged and still written
//! - A record carrying a NaN or infinite metric is rejected with
//!   [`AgentError::Encode`]; it is never written with the value dropped
//! - Fields are written in declaration order
//! - Records are written once and never touched again

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::schema::{SchemaValidator, Validation};
use super::{write_artifact, Proposal};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::telemetry::MetricsSnapshot;

/// Every automatic proposal currently requires human sign-off.
pub const HUMAN_REVIEW_REQUIRED: bool = true;

/// Free-text explanation attached to each record.
pub const EXPLAIN: &str = "Latency vs SLO; increase concurrency if p95>SLO and error_rate low";

/// One entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JustificationRecord {
    pub action_id: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub param: String,
    pub current: u32,
    pub proposed: u32,
    pub metrics: MetricsSnapshot,
    pub policy_result: bool,
    pub human_required: bool,
    pub explain: String,
}

impl JustificationRecord {
    pub fn new(
        proposal: &Proposal,
        policy_result: bool,
        metrics: &MetricsSnapshot,
        human_required: bool,
    ) -> Self {
        Self {
            action_id: proposal.action_id.to_string(),
            timestamp: Utc::now(),
            service: proposal.target.clone(),
            param: proposal.param.clone(),
            current: proposal.current,
            proposed: proposal.proposed,
            metrics: metrics.clone(),
            policy_result,
            human_required,
            explain: EXPLAIN.to_string(),
        }
    }
}

/// Writer for the justification trail.
pub struct JustificationLog {
    dir: PathBuf,
    validator: Box<dyn SchemaValidator>,
}

impl JustificationLog {
    pub fn new(cfg: &AgentConfig, validator: Box<dyn SchemaValidator>) -> Self {
        Self { dir: cfg.logs_dir.clone(), validator }
    }

    /// Check everything that can fail before a record exists to write:
    /// the metrics must be encodable and the logs directory must exist.
    pub fn prepare(&self, metrics: &MetricsSnapshot) -> Result<()> {
        ensure_finite(metrics)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| AgentError::io(&self.dir, e))
    }

    /// Build, validate and persist the record for `proposal`.
    pub fn record(
        &self,
        proposal: &Proposal,
        policy_result: bool,
        metrics: &MetricsSnapshot,
        human_required: bool,
    ) -> Result<PathBuf> {
        let record = JustificationRecord::new(proposal, policy_result, metrics, human_required);
        self.write(&record)
    }

    /// Validate and persist an already-built record.
    pub fn write(&self, record: &JustificationRecord) -> Result<PathBuf> {
        ensure_finite(&record.metrics)?;

        let value = serde_json::to_value(record).map_err(encode_error)?;
        match self.validator.validate(&value) {
            Validation::Valid | Validation::Skipped => {}
            Validation::Invalid(errors) => {
                warn!(
                    action_id = %record.action_id,
                    errors = %errors.join("; "),
                    "justification validation failed; writing anyway"
                );
            }
        }

        let body = serde_json::to_vec_pretty(record).map_err(encode_error)?;
        let path = write_artifact(&self.dir, &format!("{}.json", record.action_id), &body)?;
        debug!(action_id = %record.action_id, path = %path.display(), "justification written");
        Ok(path)
    }
}

fn ensure_finite(metrics: &MetricsSnapshot) -> Result<()> {
    match metrics.non_finite_field() {
        None => Ok(()),
        Some(field) => Err(AgentError::Encode {
            what: "justification record".into(),
            detail: format!("metrics.{field} is not a finite number"),
        }),
    }
}

fn encode_error(e: serde_json::Error) -> AgentError {
    AgentError::Encode { what: "justification record".into(), detail: e.to_string() }
}
