use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "tval-agent")]
#[command(version)]
#[command(about = "Policy-gated concurrency tuning agent with an auditable justification trail")]
#[command(
    after_help = "Configuration is read from PROM_URL, OPA_URL, PROPOSALS_DIR, LOGS_DIR, \
TARGET_SERVICE, P95_SLO_MS, SERVICE_HEALTH_URL, JUSTIFICATION_SCHEMA and POLL_INTERVAL_SECS."
)]
pub struct Args {
    /// Run a single observe/decide/verify/persist cycle and exit
    #[arg(long, conflicts_with = "summarize")]
    pub once: bool,

    /// Compute the trust index over all justification records and exit
    #[arg(long)]
    pub summarize: bool,
}

/// What the binary should do for this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Once,
    Summarize,
    Continuous,
}

impl Args {
    pub fn mode(&self) -> RunMode {
        if self.summarize {
            RunMode::Summarize
        } else if self.once {
            RunMode::Once
        } else {
            RunMode::Continuous
        }
    }
}
