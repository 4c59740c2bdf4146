use anyhow::Result;
use tracing_subscriber::EnvFilter;

use article_board::bootstrap;
use article_board::config::Config;

/// Create and seed the Articles table for the configured backend.
///
/// An optional first argument overrides the configured connection string.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let connection_string = std::env::args().nth(1);

    let report = bootstrap::run(&config, connection_string.as_deref()).await?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(status) => tracing::info!(
                "{}: created={}, seeded_rows={}",
                outcome.target,
                status.created,
                status.seeded_rows
            ),
            Err(e) => tracing::error!("{}: {}", outcome.target, e),
        }
    }
    tracing::info!(
        "Bootstrap complete: {} succeeded, {} failed",
        report.succeeded().count(),
        report.failed().count()
    );

    Ok(())
}
