use anyhow::Result;
use clap::Parser;
use khata::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.verbose);
    cli.run().await
}

/// Logs go to stderr so command output on stdout stays pipeable.
/// A non-empty `RUST_LOG` replaces the default directive entirely.
fn init_tracing(level: &str, verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { level };
    let default_directive = format!("khata={}", level);
    let filter_directive = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
