// StreamResolver trait and common types

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use crate::downloader::errors::DownloadError;

/// One configuration attempt of the stream backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveVariant {
    /// Configured cookies and authentication passed through
    Default,
    /// Cookies and cached credentials disabled
    NoAuth,
}

impl ResolveVariant {
    /// Variants in the order they are tried
    pub const ORDER: [ResolveVariant; 2] = [ResolveVariant::Default, ResolveVariant::NoAuth];

    pub fn uses_auth(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Display for ResolveVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::NoAuth => write!(f, "no-auth"),
        }
    }
}

/// Extended format information from yt-dlp
#[derive(Debug, Clone, Default)]
pub struct ExtendedFormat {
    /// Format ID (e.g., "140", "251")
    pub format_id: String,
    /// File extension (m4a, webm)
    pub ext: String,
    /// Video codec (avc1, vp9, none)
    pub vcodec: Option<String>,
    /// Audio codec (mp4a, opus, none)
    pub acodec: Option<String>,
    /// Audio bitrate in kbps
    pub abr: Option<f32>,
    /// Direct media URL
    pub url: Option<String>,
    /// Download protocol (https, m3u8_native, ...)
    pub protocol: Option<String>,
    /// Headers the extractor expects on the media request
    pub http_headers: HashMap<String, String>,
    /// Whether this is audio-only (no video)
    pub audio_only: bool,
}

impl ExtendedFormat {
    /// Plain HTTP(S) GET is enough to fetch this format
    pub fn is_direct_http(&self) -> bool {
        if self.url.is_none() {
            return false;
        }
        match self.protocol.as_deref() {
            None => true,
            Some(p) => p == "https" || p == "http",
        }
    }

    pub fn abr_or_zero(&self) -> f32 {
        self.abr.unwrap_or(0.0)
    }
}

/// Title and formats of one video
#[derive(Debug, Clone, Default)]
pub struct ExtendedVideoInfo {
    pub title: String,
    pub formats: Vec<ExtendedFormat>,
}

impl ExtendedVideoInfo {
    /// Highest-bitrate audio-only format that can be fetched directly
    pub fn best_audio_stream(&self) -> Option<&ExtendedFormat> {
        self.formats
            .iter()
            .filter(|f| f.audio_only && f.is_direct_http())
            .max_by(|a, b| a.abr_or_zero().total_cmp(&b.abr_or_zero()))
    }

    /// Parse `--dump-json` output
    pub fn from_json(stdout: &[u8]) -> Result<Self, DownloadError> {
        let json_str = String::from_utf8_lossy(stdout);
        let raw: RawVideoInfo = serde_json::from_str(json_str.trim())
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let formats = raw
            .formats
            .ok_or_else(|| DownloadError::ParseError("No formats array in JSON".to_string()))?;

        Ok(Self {
            title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
            formats: formats.into_iter().map(ExtendedFormat::from).collect(),
        })
    }
}

// `--dump-json` shape; every field may be missing or null
#[derive(Deserialize)]
struct RawVideoInfo {
    title: Option<String>,
    formats: Option<Vec<RawFormat>>,
}

#[derive(Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    abr: Option<f64>,
    url: Option<String>,
    protocol: Option<String>,
    http_headers: Option<HashMap<String, serde_json::Value>>,
}

impl From<RawFormat> for ExtendedFormat {
    fn from(f: RawFormat) -> Self {
        let audio_only = f.acodec.as_ref().map_or(false, |a| a != "none")
            && f.vcodec.as_ref().map_or(true, |v| v == "none");

        let http_headers = f
            .http_headers
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k, v.to_string())))
            .collect();

        Self {
            format_id: f.format_id.unwrap_or_default(),
            ext: f.ext.unwrap_or_default(),
            vcodec: f.vcodec,
            acodec: f.acodec,
            abr: f.abr.map(|a| a as f32),
            url: f.url,
            protocol: f.protocol,
            http_headers,
            audio_only,
        }
    }
}

/// Resolves a locator into stream metadata
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Name of the resolver (for logging)
    fn name(&self) -> &'static str;

    async fn resolve(
        &self,
        url: &str,
        variant: ResolveVariant,
    ) -> Result<ExtendedVideoInfo, DownloadError>;
}
