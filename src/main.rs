use clap::Parser;
use tracing_subscriber::EnvFilter;

use audio_fetch_lib::config::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "audio_fetch_lib=debug" } else { "audio_fetch_lib=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    audio_fetch_lib::run(cli, &mut input).await
}
