use async_trait::async_trait;
use regex::Regex;

use super::errors::DownloadError;
use super::utils::run_output_with_timeout;

/// Seconds a single version check may take
pub const PROBE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    Ffmpeg,
    YtDlp,
    /// The `yt_dlp` module behind the configured Python interpreter
    PythonYtDlp,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Ffmpeg => "ffmpeg",
            ToolType::YtDlp => "yt-dlp",
            ToolType::PythonYtDlp => "python yt_dlp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: String,
}

/// Availability check for external tools
#[async_trait]
pub trait ToolProbe: Send + Sync {
    async fn probe(&self, tool: ToolType) -> Result<ToolInfo, DownloadError>;
}

pub struct ToolManager {
    ffmpeg: String,
    ytdlp: String,
    python: String,
    timeout_secs: u64,
}

impl ToolManager {
    pub fn new(ffmpeg: impl Into<String>, ytdlp: impl Into<String>, python: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ytdlp: ytdlp.into(),
            python: python.into(),
            timeout_secs: PROBE_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn command_for(&self, tool_type: ToolType) -> (&str, Vec<String>) {
        match tool_type {
            ToolType::Ffmpeg => (self.ffmpeg.as_str(), vec!["-version".to_string()]),
            ToolType::YtDlp => (self.ytdlp.as_str(), vec!["--version".to_string()]),
            ToolType::PythonYtDlp => (
                self.python.as_str(),
                vec![
                    "-c".to_string(),
                    "import yt_dlp; print(yt_dlp.version.__version__)".to_string(),
                ],
            ),
        }
    }

    async fn run_probe(
        &self,
        tool_type: ToolType,
        path: &str,
        args: Vec<String>,
    ) -> Result<ToolInfo, DownloadError> {
        let output = run_output_with_timeout(path, args, self.timeout_secs)
            .await
            .map_err(|e| DownloadError::ToolNotFound(format!("{} ({}): {}", tool_type.as_str(), path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(DownloadError::ToolNotFound(format!(
                "{} ({}) exited with {}: {}",
                tool_type.as_str(),
                path,
                output.status,
                stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version: parse_version(tool_type, &stdout),
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl ToolProbe for ToolManager {
    async fn probe(&self, tool_type: ToolType) -> Result<ToolInfo, DownloadError> {
        let (path, args) = self.command_for(tool_type);
        self.run_probe(tool_type, path, args).await
    }
}

/// Pull a version string out of a tool's version output
pub fn parse_version(tool_type: ToolType, stdout: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref FFMPEG_VERSION_RE: Regex = Regex::new(r"(?m)^ffmpeg version (\S+)").unwrap();
    }

    match tool_type {
        ToolType::Ffmpeg => FFMPEG_VERSION_RE
            .captures(stdout)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
        ToolType::YtDlp | ToolType::PythonYtDlp => stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string),
    }
}
