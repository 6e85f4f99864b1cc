// Python StreamResolver - uses `python3 -m yt_dlp`, not the yt-dlp binary

use async_trait::async_trait;

use super::diagnostics::diagnose_error;
use super::traits::{ExtendedVideoInfo, ResolveVariant, StreamResolver};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{CookieSource, NetworkConfig};
use crate::downloader::utils::run_output_with_timeout;

/// Python-based resolver using the yt_dlp module
pub struct PythonInfoExtractor {
    python_cmd: String,
    cookies: CookieSource,
    network: NetworkConfig,
    timeout_secs: u64,
}

impl PythonInfoExtractor {
    pub fn new(
        python_cmd: impl Into<String>,
        cookies: CookieSource,
        network: NetworkConfig,
        timeout_secs: u64,
    ) -> Self {
        Self {
            python_cmd: python_cmd.into(),
            cookies,
            network,
            timeout_secs,
        }
    }

    /// Build command arguments
    fn build_args(&self, url: &str, variant: ResolveVariant) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            "yt_dlp".to_string(),
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];

        args.extend(self.network.ytdlp_args());

        if variant.uses_auth() {
            args.extend(self.cookies.ytdlp_args());
        } else {
            args.push("--no-cache-dir".to_string());
        }

        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl StreamResolver for PythonInfoExtractor {
    fn name(&self) -> &'static str {
        "python-yt_dlp"
    }

    async fn resolve(
        &self,
        url: &str,
        variant: ResolveVariant,
    ) -> Result<ExtendedVideoInfo, DownloadError> {
        let args = self.build_args(url, variant);
        tracing::debug!(command = %self.python_cmd, args = ?args, "resolving stream metadata");

        let out = run_output_with_timeout(&self.python_cmd, args, self.timeout_secs).await?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            if let Some(reason) = diagnose_error(&stderr) {
                tracing::warn!(reason = reason.description(), hint = reason.hint(), "metadata resolution blocked");
            }
            return Err(DownloadError::from(stderr));
        }

        ExtendedVideoInfo::from_json(&out.stdout)
    }
}
