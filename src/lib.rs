//! Autonomous, policy-gated concurrency tuning for a single service.
//!
//! Each cycle observes p95 latency and error rate, proposes a new
//! `MAX_CONCURRENCY` against a latency objective, asks a policy engine for a
//! verdict, and records a manifest plus a justification for every proposal.
//! [`audit::TrustIndexCalculator`] summarizes the recorded verdicts.

pub mod agent;
pub mod audit;
pub mod cli;
pub mod config;
pub mod decider;
pub mod error;
pub mod policy;
pub mod telemetry;

mod http;

#[cfg(test)]
mod test_support;

pub use agent::{ControlLoop, CycleOutcome, CycleReport, LoopStats, ProposedChange};
pub use config::AgentConfig;
pub use error::{AgentError, Result};
