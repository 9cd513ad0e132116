//! Pathwise CLI binary.

use anyhow::Result;
use pathwise::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the pathwise CLI.
///
/// A single analysis is a short sequence of I/O-bound steps, so the
/// current-thread runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output stays machine-readable.
    // Example: RUST_LOG=pathwise=debug,pathwise_core=trace pathwise analyze p.json
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pathwise=info,pathwise_core=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting pathwise CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Pathwise CLI completed successfully");
    Ok(())
}
