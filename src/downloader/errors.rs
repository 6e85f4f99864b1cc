// Error types for retrieval backends and the transcoder

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// ffmpeg, yt-dlp or python not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Locator rejected by the extractor
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command could not be started, waited on, or timed out
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// External process ran and exited non-zero
    #[error("{program} failed ({status}): {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Network timeout while talking to the remote service
    #[error("Network timeout: the remote service is not responding")]
    NetworkTimeout,

    /// Remote service refused the request (429, bot detection, 403)
    #[error("Request blocked by the remote service: {0}")]
    Blocked(String),

    /// Stream fetch failed at the HTTP layer
    #[error("HTTP error: {0}")]
    Http(String),

    /// Metadata resolved but no downloadable audio-only stream exists
    #[error("No audio-only stream available")]
    NoAudioStream,

    /// Download reported success but left no temporary file behind
    #[error("No audio file found after download")]
    TempFileMissing,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every attempt of a backend (or every backend) failed
    #[error("All attempts failed: {0}")]
    Exhausted(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::NetworkTimeout;
        }
        Self::Http(e.to_string())
    }
}

// Classify raw tool stderr
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout;
        }

        if lower.contains("429")
            || lower.contains("not a bot")
            || lower.contains("bot detection")
            || lower.contains("blocked")
        {
            return Self::Blocked(s);
        }

        if lower.contains("command not found")
            || lower.contains("no such file or directory")
            || lower.contains("no module named")
        {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid json") || lower.contains("parse") {
            return Self::ParseError(s);
        }

        if lower.contains("invalid url") || lower.contains("unsupported url") || lower.contains("is not a valid url") {
            return Self::InvalidUrl(s);
        }

        Self::Unknown(s)
    }
}
