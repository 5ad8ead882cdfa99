//! # Stage: Concurrency Decider
//!
//! ## Responsibility
//! Pure step rule mapping the observed p95 latency and error rate against the
//! latency objective onto a proposed `MAX_CONCURRENCY` value.
//!
//! Rules, first match wins:
//! 1. `p95 > slo` and `error_rate < 0.05` → `min(current + 2, 64)`
//! 2. `p95 < 0.7 * slo` and `current > 4` → `max(current - 2, 4)`
//! 3. otherwise → `current`
//!
//! ## Guarantees
//! - Deterministic and side-effect free
//! - Bounded: for `current` in `[4, 64]` the output never leaves `[4, 64]`
//! - At most one step per call

/// Name of the single parameter this agent tunes.
pub const PARAM_MAX_CONCURRENCY: &str = "MAX_CONCURRENCY";

/// Step applied per scale-up or scale-down.
pub const STEP: u32 = 2;
/// Upper saturation bound.
pub const MAX_CONCURRENCY: u32 = 64;
/// Lower saturation bound.
pub const MIN_CONCURRENCY: u32 = 4;
/// Error rate at or above which the agent refuses to scale up.
pub const ERROR_RATE_CEILING: f64 = 0.05;
/// Fraction of the SLO below which latency counts as comfortably healthy.
pub const HEADROOM: f64 = 0.7;

/// Which rule fired for a given observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    ScaleUp,
    ScaleDown,
    Hold,
}

impl Decision {
    /// Evaluate the rule set and report which branch matched.
    pub fn classify(current: u32, p95_ms: f64, error_rate: f64, slo_ms: u32) -> Self {
        let slo = f64::from(slo_ms);
        if p95_ms > slo && error_rate < ERROR_RATE_CEILING {
            Decision::ScaleUp
        } else if p95_ms < HEADROOM * slo && current > MIN_CONCURRENCY {
            Decision::ScaleDown
        } else {
            Decision::Hold
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::ScaleUp => write!(f, "scale_up"),
            Decision::ScaleDown => write!(f, "scale_down"),
            Decision::Hold => write!(f, "hold"),
        }
    }
}

/// Propose a new concurrency limit.  Equal to `current` means "no change".
pub fn decide(current: u32, p95_ms: f64, error_rate: f64, slo_ms: u32) -> u32 {
    match Decision::classify(current, p95_ms, error_rate, slo_ms) {
        Decision::ScaleUp => current.saturating_add(STEP).min(MAX_CONCURRENCY),
        Decision::ScaleDown => current.saturating_sub(STEP).max(MIN_CONCURRENCY),
        Decision::Hold => current,
    }
}
