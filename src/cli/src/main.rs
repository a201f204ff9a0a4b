//! wft-runner CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wft_runner_cli::commands::{dispatch, Cli};
use wft_runner_core::exit;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug
    let default_level = if cli.global.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let outcome = dispatch(cli).await;
    if let Err(e) = &outcome {
        eprintln!("Error: {e}");
        if let Some(hint) = e.hint() {
            eprintln!("Hint: {hint}");
        }
    }
    std::process::exit(exit::report_outcome(&outcome));
}
