// Command-line configuration and interactive input

use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::downloader::models::{CookieSource, NetworkConfig, DEFAULT_OUTPUT, TARGET_EXTENSION};
use crate::downloader::utils::find_binary;

pub const URL_PROMPT: &str = "YouTube link: ";
pub const OUTPUT_PROMPT: &str = "Output filename (press Enter for 'output.mp3'): ";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No URL provided!")]
    EmptyLocator,

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Download the audio track of a video and convert it to MP3
#[derive(Debug, Parser)]
#[command(name = "audio-fetch", version, about)]
pub struct Cli {
    /// Video URL; prompted for when omitted
    pub url: Option<String>,

    /// Output file name; `.mp3` is appended when missing
    #[arg(short, long)]
    pub output: Option<String>,

    /// ffmpeg binary used for conversion
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// yt-dlp binary; common install locations are searched when unset
    #[arg(long = "yt-dlp", env = "YTDLP_PATH")]
    pub ytdlp: Option<String>,

    /// Python interpreter with the yt_dlp module, used by the stream backend
    #[arg(long, env = "YTDLP_PYTHON", default_value = "python3")]
    pub python: String,

    /// Proxy URL for extractors and stream downloads
    #[arg(long, env = "AUDIO_FETCH_PROXY")]
    pub proxy: Option<String>,

    /// cookies.txt passed to extractors
    #[arg(long, conflicts_with = "cookies_from_browser")]
    pub cookies: Option<PathBuf>,

    /// Browser to read cookies from (chrome, firefox, ...)
    #[arg(long)]
    pub cookies_from_browser: Option<String>,

    /// Directory for temporary files and relative output names
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    /// Socket timeout handed to extractors, in seconds
    #[arg(long, default_value_t = 30)]
    pub socket_timeout: u32,

    /// Limit for metadata lookups, in seconds
    #[arg(long, default_value_t = 60)]
    pub metadata_timeout: u64,

    /// Limit for a single download, in seconds
    #[arg(long, default_value_t = 1800)]
    pub download_timeout: u64,

    /// Limit for one ffmpeg run, in seconds
    #[arg(long, default_value_t = 600)]
    pub transcode_timeout: u64,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved settings shared by the backends
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ffmpeg: String,
    pub ytdlp: String,
    pub python: String,
    pub network: NetworkConfig,
    pub cookies: CookieSource,
    pub work_dir: PathBuf,
    pub metadata_timeout: u64,
    pub download_timeout: u64,
    pub transcode_timeout: u64,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let cookies = match (&cli.cookies, &cli.cookies_from_browser) {
            (Some(path), _) => CookieSource::File(path.clone()),
            (None, Some(browser)) => CookieSource::Browser(browser.clone()),
            (None, None) => CookieSource::None,
        };

        Self {
            ffmpeg: cli.ffmpeg.clone(),
            ytdlp: cli.ytdlp.clone().unwrap_or_else(|| find_binary("yt-dlp")),
            python: cli.python.clone(),
            network: NetworkConfig {
                proxy: cli.proxy.clone(),
                timeout: Some(cli.socket_timeout),
            },
            cookies,
            work_dir: cli.work_dir.clone(),
            metadata_timeout: cli.metadata_timeout,
            download_timeout: cli.download_timeout,
            transcode_timeout: cli.transcode_timeout,
        }
    }
}

/// A validated download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub output: PathBuf,
}

/// Default to `output.mp3`, append `.mp3` when the name lacks it
pub fn normalize_output_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return DEFAULT_OUTPUT.to_string();
    }

    let has_ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(TARGET_EXTENSION));

    if has_ext {
        name.to_string()
    } else {
        format!("{}.{}", name, TARGET_EXTENSION)
    }
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, message: &str) -> Result<String, ConfigError> {
    write!(out, "{}", message)?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Build a request from flags, prompting for whatever is missing.
///
/// The output name is only prompted for when the URL was prompted too,
/// so a URL given on the command line never blocks on stdin.
pub fn resolve_request<R: BufRead, W: Write>(
    url: Option<String>,
    output: Option<String>,
    work_dir: &Path,
    input: &mut R,
    out: &mut W,
) -> Result<Request, ConfigError> {
    let interactive = url.is_none();

    let url = match url {
        Some(u) => u.trim().to_string(),
        None => prompt(input, out, URL_PROMPT)?,
    };
    if url.is_empty() {
        return Err(ConfigError::EmptyLocator);
    }

    let name = match output {
        Some(o) => o,
        None if interactive => prompt(input, out, OUTPUT_PROMPT)?,
        None => String::new(),
    };

    Ok(Request {
        url,
        output: work_dir.join(normalize_output_name(&name)),
    })
}
