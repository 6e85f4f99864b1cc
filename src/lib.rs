pub mod app;
pub mod config;
pub mod downloader;

use std::io::BufRead;

use config::{AppConfig, Cli, ConfigError};
use downloader::ToolManager;

/// Run one download from parsed arguments, prompting on `input` when needed.
///
/// Returns `Ok(())` for every handled outcome; messages are printed.
pub async fn run<R: BufRead>(cli: Cli, input: &mut R) -> anyhow::Result<()> {
    let config = AppConfig::from_cli(&cli);

    let mut stdout = std::io::stdout();
    let request = match config::resolve_request(cli.url, cli.output, &config.work_dir, input, &mut stdout) {
        Ok(request) => request,
        Err(ConfigError::EmptyLocator) => {
            println!("{}", ConfigError::EmptyLocator);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let tools = ToolManager::new(&config.ffmpeg, &config.ytdlp, &config.python);
    let downloader = app::build_downloader(&config)?;

    let outcome = app::execute(&request, &tools, &downloader).await;
    println!("{}", outcome.message());
    Ok(())
}
