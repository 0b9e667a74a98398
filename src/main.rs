use anyhow::Result;
use clap::Parser;
use portal_client::cli::{self, Cli};
use portal_client::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; diagnostics go to stderr so command output
    // stays clean on stdout
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from environment
    let config = Config::load()?;
    tracing::debug!(api_url = %config.api_url, "Configuration loaded");

    cli::run(cli.command, &config).await
}
