// Stream backend: resolve formats, fetch the best audio-only stream
// directly, convert it with the transcoder.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::downloader::errors::DownloadError;
use crate::downloader::extractors::{ResolveVariant, StreamResolver};
use crate::downloader::fetch::StreamFetcher;
use crate::downloader::traits::AudioStrategy;
use crate::downloader::transcoder::Transcoder;
use crate::downloader::utils::TempFile;

/// Fixed name of the fetched, not yet converted stream
pub const TEMP_NAME: &str = "audio_temp";

pub struct StreamBackend {
    resolver: Box<dyn StreamResolver>,
    fetcher: Box<dyn StreamFetcher>,
    transcoder: Arc<dyn Transcoder>,
    work_dir: PathBuf,
    variants: Vec<ResolveVariant>,
}

impl StreamBackend {
    pub fn new(
        resolver: Box<dyn StreamResolver>,
        fetcher: Box<dyn StreamFetcher>,
        transcoder: Arc<dyn Transcoder>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            transcoder,
            work_dir: work_dir.into(),
            variants: ResolveVariant::ORDER.to_vec(),
        }
    }

    async fn try_variant(
        &self,
        url: &str,
        output: &Path,
        variant: ResolveVariant,
    ) -> Result<(), DownloadError> {
        let info = self.resolver.resolve(url, variant).await?;
        println!("Title: {}", info.title);
        tracing::debug!(resolver = self.resolver.name(), formats = info.formats.len(), "stream metadata resolved");

        let stream = info.best_audio_stream().ok_or(DownloadError::NoAudioStream)?;
        println!("Selected stream: audio/{}, {}kbps", stream.ext, stream.abr_or_zero());
        tracing::debug!(
            format_id = %stream.format_id,
            codec = stream.acodec.as_deref().unwrap_or("unknown"),
            "selected stream"
        );
        let stream_url = stream.url.as_deref().ok_or(DownloadError::NoAudioStream)?;

        // a fresh guard per variant; dropping it removes the file
        let temp = TempFile::new(self.work_dir.join(TEMP_NAME));
        self.fetcher
            .fetch(stream_url, &stream.http_headers, temp.path())
            .await?;

        self.transcoder.transcode(temp.path(), output).await
    }
}

#[async_trait]
impl AudioStrategy for StreamBackend {
    fn name(&self) -> &'static str {
        "stream"
    }

    async fn attempt(&self, url: &str, output: &Path) -> Result<PathBuf, DownloadError> {
        let mut failures = Vec::new();

        for variant in &self.variants {
            tracing::info!(%variant, "trying stream configuration");

            match self.try_variant(url, output, *variant).await {
                Ok(()) => {
                    tracing::info!(%variant, output = %output.display(), "stream configuration succeeded");
                    return Ok(output.to_path_buf());
                }
                Err(e) => {
                    tracing::warn!(%variant, error = %e, "stream configuration failed");
                    failures.push(format!("{}: {}", variant, e));
                }
            }
        }

        Err(DownloadError::Exhausted(failures.join("; ")))
    }
}
