// Common data models for retrieval backends

use serde::Deserialize;
use std::path::PathBuf;

use super::errors::DownloadError;

/// Extension every output file ends up with
pub const TARGET_EXTENSION: &str = "mp3";

/// Output name used when the user gives none
pub const DEFAULT_OUTPUT: &str = "output.mp3";

/// Basic metadata reported by an extractor
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub title: String,
    pub uploader: String,
    pub duration_seconds: Option<u64>,
}

#[derive(Deserialize)]
struct RawVideoInfo {
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
}

impl VideoInfo {
    /// Parse the subset of `--dump-json` output shown to the user
    pub fn from_json(stdout: &[u8]) -> Result<Self, DownloadError> {
        let json_str = String::from_utf8_lossy(stdout);
        let raw: RawVideoInfo = serde_json::from_str(json_str.trim())
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        Ok(Self {
            title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
            uploader: raw.uploader.unwrap_or_else(|| "Unknown".to_string()),
            duration_seconds: raw.duration.map(|d| d as u64),
        })
    }

    pub fn duration_label(&self) -> String {
        self.duration_seconds
            .map_or_else(|| "Unknown".to_string(), |d| d.to_string())
    }
}

/// Which backend produced the output, and where it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalOutcome {
    pub backend: &'static str,
    pub output: PathBuf,
}

/// Network configuration for backends
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Socket timeout in seconds
    pub timeout: Option<u32>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Some(30),
        }
    }
}

impl NetworkConfig {
    /// yt-dlp arguments for proxy and socket timeout
    pub fn ytdlp_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        if let Some(timeout) = self.timeout {
            args.push("--socket-timeout".to_string());
            args.push(timeout.to_string());
        }

        args
    }
}

/// Cookie source handed to extractors that support authentication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CookieSource {
    #[default]
    None,
    File(PathBuf),
    Browser(String),
}

impl CookieSource {
    pub fn ytdlp_args(&self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::File(path) => vec!["--cookies".to_string(), path.to_string_lossy().to_string()],
            Self::Browser(browser) => vec!["--cookies-from-browser".to_string(), browser.clone()],
        }
    }
}
