use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tval_agent::audit::TrustIndexCalculator;
use tval_agent::cli::{Args, RunMode};
use tval_agent::{AgentConfig, ControlLoop, CycleOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the trust index output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cfg = AgentConfig::from_env()?;

    match args.mode() {
        RunMode::Summarize => {
            let report = TrustIndexCalculator::new(&cfg).summarize()?;
            println!("{report}");
        }
        RunMode::Once => {
            let agent = ControlLoop::from_config(&cfg);
            if let CycleOutcome::Proposed(change) = agent.run_once().await? {
                info!(
                    action_id = %change.proposal.action_id,
                    allowed = change.allowed,
                    "single cycle produced a proposal"
                );
            }
        }
        RunMode::Continuous => {
            info!(
                target_service = %cfg.target_service,
                slo_ms = cfg.p95_slo_ms,
                interval_secs = cfg.poll_interval.as_secs(),
                "starting continuous tuning loop"
            );
            ControlLoop::from_config(&cfg).run().await;
        }
    }

    Ok(())
}
