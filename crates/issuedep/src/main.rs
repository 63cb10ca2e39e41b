//! Issuedep CLI binary.

use anyhow::Result;
use issuedep::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the issuedep CLI.
///
/// Uses tokio's current_thread runtime; traversal concurrency comes from
/// joined futures, not threads.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable (JSON, DOT, CSV)
    // Example: RUST_LOG=issuedep=debug issuedep graph PROJ-1
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("issuedep=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting issuedep CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Issuedep CLI completed successfully");
    Ok(())
}
