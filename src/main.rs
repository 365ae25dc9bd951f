use anyhow::{Context, Result};
use busy_indicator::cli::{self, Cli};
use busy_indicator::config::Config;
use busy_indicator::logging::{self, LogTarget};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let target = if args.uses_tui() {
        LogTarget::File
    } else {
        LogTarget::Stderr
    };
    logging::init(args.verbose, target).context("Failed to setup logging")?;

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let config = cli::apply_overrides(&args, config);
    tracing::info!(
        "busy-indicator config: min_duration={:?}, show_delay={:?}, target={}",
        config.indicator.min_duration,
        config.indicator.show_delay,
        if args.simulate { "simulated" } else { config.client.base_url.as_str() }
    );

    cli::run(args, config).await
}
