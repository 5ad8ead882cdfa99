//! # Stage: Trust Index
//!
//! ## Responsibility
//! Scan the justification trail and summarize how often proposals were
//! policy-approved.
//!
//! - `policy_pass_rate`: fraction of records with `policy_result == true`
//! - `approval_consistency`: currently the same value as `policy_pass_rate`
//! - `rollback_rate`: fixed at [`ROLLBACK_RATE`]; rollbacks are not measured
//! - `trust_index`: mean of the two rates above and `1 - rollback_rate`
//!
//! ## Guarantees
//! - Corrupt or unreadable records are skipped, never fatal
//! - Recomputed from scratch on every call; the CSV artifact is overwritten
//! - With no records, reports [`TrustReport::NoData`] and writes no CSV

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};

/// Placeholder rollback rate until rollbacks are tracked.
pub const ROLLBACK_RATE: f64 = 0.05;
/// File name of the persisted summary inside the logs directory.
pub const SUMMARY_FILE: &str = "trust_index_summary.csv";
pub const CSV_HEADER: &str = "policy_pass_rate,approval_consistency,rollback_rate,trust_index";
/// Printed instead of a summary when there is nothing to aggregate.
pub const NO_LOGS_SENTINEL: &str = "no_logs,trust_index=0.00";

/// Aggregate trust metrics, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrustIndexSummary {
    pub policy_pass_rate: f64,
    pub approval_consistency: f64,
    pub rollback_rate: f64,
    pub trust_index: f64,
}

impl TrustIndexSummary {
    pub fn new(policy_pass_rate: f64, approval_consistency: f64, rollback_rate: f64) -> Self {
        let trust_index = (policy_pass_rate + approval_consistency + (1.0 - rollback_rate)) / 3.0;
        Self { policy_pass_rate, approval_consistency, rollback_rate, trust_index }
    }

    /// Summarize a set of policy verdicts.  `None` when `verdicts` is empty.
    pub fn from_verdicts(verdicts: &[bool]) -> Option<Self> {
        if verdicts.is_empty() {
            return None;
        }
        let passed = verdicts.iter().filter(|&&v| v).count();
        let pass_rate = passed as f64 / verdicts.len() as f64;
        Some(Self::new(pass_rate, pass_rate, ROLLBACK_RATE))
    }

    /// The data row, three decimals per field.
    pub fn csv_row(&self) -> String {
        format!(
            "{:.3},{:.3},{:.3},{:.3}",
            self.policy_pass_rate, self.approval_consistency, self.rollback_rate, self.trust_index
        )
    }

    /// Header plus data row, newline terminated.
    pub fn to_csv(&self) -> String {
        format!("{CSV_HEADER}\n{}\n", self.csv_row())
    }
}

/// Outcome of one summarization.
#[derive(Debug, Clone, PartialEq)]
pub enum TrustReport {
    NoData,
    Summary(TrustIndexSummary),
}

impl TrustReport {
    /// The summary, all zeros for [`TrustReport::NoData`].
    pub fn summary(&self) -> TrustIndexSummary {
        match self {
            TrustReport::NoData => TrustIndexSummary::default(),
            TrustReport::Summary(s) => *s,
        }
    }
}

impl std::fmt::Display for TrustReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustReport::NoData => write!(f, "{NO_LOGS_SENTINEL}"),
            TrustReport::Summary(s) => write!(f, "{CSV_HEADER}\n{}", s.csv_row()),
        }
    }
}

/// Only the field the aggregation needs; anything without it is malformed.
#[derive(Debug, Deserialize)]
struct VerdictOnly {
    policy_result: bool,
}

/// Reads the justification trail in one logs directory.
pub struct TrustIndexCalculator {
    logs_dir: PathBuf,
}

impl TrustIndexCalculator {
    pub fn new(cfg: &AgentConfig) -> Self {
        Self { logs_dir: cfg.logs_dir.clone() }
    }

    pub fn summary_path(&self) -> PathBuf {
        self.logs_dir.join(SUMMARY_FILE)
    }

    /// Policy verdicts of every readable `*.json` record.
    ///
    /// A missing logs directory counts as an empty trail.
    pub fn load_verdicts(&self) -> Result<Vec<bool>> {
        let entries = match std::fs::read_dir(&self.logs_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AgentError::io(&self.logs_dir, e)),
        };

        let mut verdicts = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_verdict(&path) {
                Some(v) => verdicts.push(v),
                None => debug!(path = %path.display(), "skipping unreadable justification record"),
            }
        }
        Ok(verdicts)
    }

    /// Compute the trust index and persist it as CSV.
    ///
    /// A failed CSV write is logged; the computed report is still returned.
    pub fn summarize(&self) -> Result<TrustReport> {
        let verdicts = self.load_verdicts()?;
        let Some(summary) = TrustIndexSummary::from_verdicts(&verdicts) else {
            info!(logs_dir = %self.logs_dir.display(), "no justification records to summarize");
            return Ok(TrustReport::NoData);
        };

        let path = self.summary_path();
        match std::fs::write(&path, summary.to_csv()) {
            Ok(()) => info!(
                path = %path.display(),
                records = verdicts.len(),
                trust_index = summary.trust_index,
                "saved trust index summary"
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "could not save trust index summary"),
        }
        Ok(TrustReport::Summary(summary))
    }
}

fn read_verdict(path: &Path) -> Option<bool> {
    let bytes = std::fs::read(path).ok()?;
    serde_json::from_slice::<VerdictOnly>(&bytes).ok().map(|r| r.policy_result)
}
