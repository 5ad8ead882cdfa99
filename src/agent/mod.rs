//! # Module: agent
//!
//! The control loop that closes the tuning cycle:
//!
//! ```text
//! MetricsSource ─┐
//!                ├─► decide() ──► PolicyEngine ──► ManifestStore ──► JustificationLog
//! ConcurrencyProbe┘   (no change → stop)            (same action id for both artifacts)
//! ```
//!
//! ## Modes
//! - [`ControlLoop::run_once`]: one observe → decide → verify → persist pass;
//!   any failure is returned to the caller.  A failed cycle never leaves a
//!   manifest without its justification record.
//! - [`ControlLoop::run`]: repeat forever, sleeping `poll_interval` after each
//!   cycle completes.  A failed cycle is logged and the loop carries on.
//!
//! Cycles never overlap and no state survives between them.
//!
//! ## Policy verdict
//! The verdict is recorded, not enforced: a denied proposal is still written
//! to the manifest store and the justification log.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::audit::{
    load_validator, JustificationLog, ManifestStore, Proposal, SchemaValidator, HUMAN_REVIEW_REQUIRED,
};
use crate::config::AgentConfig;
use crate::decider::{decide, Decision, PARAM_MAX_CONCURRENCY};
use crate::error::{AgentError, Result};
use crate::policy::{OpaClient, PolicyEngine};
use crate::telemetry::{ConcurrencyProbe, HealthProbe, MetricsSnapshot, MetricsSource, PrometheusClient};

/// Consecutive failures after which continuous mode logs at `error` level.
const ESCALATE_AFTER: u32 = 5;

/// A proposal that went through verification and was persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedChange {
    pub proposal: Proposal,
    pub decision: Decision,
    pub allowed: bool,
    pub manifest_path: PathBuf,
    pub justification_path: PathBuf,
}

/// What one successful cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The metrics backend has no p95 sample yet; nothing was persisted.
    NoData,
    /// The decider kept the current value; nothing was persisted.
    NoChange { current: u32, p95_ms: f64 },
    Proposed(ProposedChange),
}

/// Per-cycle result as seen by continuous mode.
#[derive(Debug)]
pub enum CycleReport {
    Completed(CycleOutcome),
    /// The cycle failed; continuous mode logs it and retries after the interval.
    Recovered(AgentError),
}

impl From<Result<CycleOutcome>> for CycleReport {
    fn from(r: Result<CycleOutcome>) -> Self {
        match r {
            Ok(outcome) => CycleReport::Completed(outcome),
            Err(e) => CycleReport::Recovered(e),
        }
    }
}

/// Counters returned by a bounded [`ControlLoop::run_cycles`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub completed: usize,
    pub recovered: usize,
}

/// Observe → decide → verify → persist, for one target service.
pub struct ControlLoop<M, P, V> {
    metrics: M,
    probe: P,
    policy: V,
    manifests: ManifestStore,
    justifications: JustificationLog,
    slo_ms: u32,
    poll_interval: Duration,
}

impl ControlLoop<PrometheusClient, HealthProbe, OpaClient> {
    /// Wire the HTTP-backed components described by `cfg`.
    pub fn from_config(cfg: &AgentConfig) -> Self {
        Self::new(
            cfg,
            PrometheusClient::new(cfg),
            HealthProbe::new(cfg),
            OpaClient::new(cfg),
            load_validator(&cfg.schema_path),
        )
    }
}

impl<M, P, V> ControlLoop<M, P, V>
where
    M: MetricsSource,
    P: ConcurrencyProbe,
    V: PolicyEngine,
{
    pub fn new(
        cfg: &AgentConfig,
        metrics: M,
        probe: P,
        policy: V,
        validator: Box<dyn SchemaValidator>,
    ) -> Self {
        Self {
            metrics,
            probe,
            policy,
            manifests: ManifestStore::new(cfg),
            justifications: JustificationLog::new(cfg, validator),
            slo_ms: cfg.p95_slo_ms,
            poll_interval: cfg.poll_interval,
        }
    }

    /// Run a single cycle.
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        let p95 = self.metrics.p95_latency_ms().await?;
        let error_rate = self.metrics.error_rate().await?;
        let current = self.probe.current_concurrency().await;

        let Some(p95_ms) = p95 else {
            info!("no latency data yet");
            return Ok(CycleOutcome::NoData);
        };

        let metrics = MetricsSnapshot { p95_latency_ms: Some(p95_ms), error_rate, slo_ms: self.slo_ms };
        let decision = Decision::classify(current, p95_ms, error_rate, self.slo_ms);
        let proposed = decide(current, p95_ms, error_rate, self.slo_ms);

        if proposed == current {
            info!(current, p95_ms, error_rate, "no change");
            return Ok(CycleOutcome::NoChange { current, p95_ms });
        }

        let allowed = self.policy.verify(PARAM_MAX_CONCURRENCY, proposed).await?;

        // Manifest and justification are persisted as a pair or not at all.
        self.justifications.prepare(&metrics)?;
        let saved = self.manifests.save(PARAM_MAX_CONCURRENCY, proposed)?;
        let proposal = Proposal {
            action_id: saved.action_id,
            target: self.manifests.target().to_string(),
            param: PARAM_MAX_CONCURRENCY.to_string(),
            current,
            proposed,
        };
        let justification_path =
            match self.justifications.record(&proposal, allowed, &metrics, HUMAN_REVIEW_REQUIRED) {
                Ok(path) => path,
                Err(e) => {
                    self.manifests.discard(&saved);
                    return Err(e);
                }
            };

        info!(
            action_id = %proposal.action_id,
            %decision,
            current,
            proposed,
            allowed,
            manifest = %saved.path.display(),
            justification = %justification_path.display(),
            "proposed change"
        );

        Ok(CycleOutcome::Proposed(ProposedChange {
            proposal,
            decision,
            allowed,
            manifest_path: saved.path,
            justification_path,
        }))
    }

    /// Run one cycle and classify the result for continuous mode.
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_once().await.into()
    }

    /// Run cycles forever.  Only process termination stops the loop.
    pub async fn run(&self) {
        self.run_cycles(None).await;
    }

    /// Run up to `limit` cycles (`None` = unbounded), sleeping the poll
    /// interval after each one.  Failed cycles never end the loop.
    pub async fn run_cycles(&self, limit: Option<usize>) -> LoopStats {
        let mut stats = LoopStats::default();
        let mut consecutive_failures: u32 = 0;

        loop {
            match self.run_cycle().await {
                CycleReport::Completed(_) => {
                    consecutive_failures = 0;
                    stats.completed += 1;
                }
                CycleReport::Recovered(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    stats.recovered += 1;
                    if consecutive_failures >= ESCALATE_AFTER {
                        error!(
                            error = %e,
                            consecutive_failures,
                            "cycle failed repeatedly, will retry next interval"
                        );
                    } else {
                        warn!(error = %e, "cycle failed, will retry next interval");
                    }
                }
            }

            if limit.is_some_and(|n| stats.completed + stats.recovered >= n) {
                return stats;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
