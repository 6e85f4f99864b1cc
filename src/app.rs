// Entry point flow: tool checks, backend wiring, outcome reporting

use std::sync::Arc;

use crate::config::{AppConfig, Request};
use crate::downloader::backends::{StreamBackend, YtDlpBackend, YtDlpCli};
use crate::downloader::extractors::PythonInfoExtractor;
use crate::downloader::fetch::HttpStreamFetcher;
use crate::downloader::{
    DownloadError, Downloader, FfmpegTranscoder, RetrievalOutcome, ToolProbe, ToolType, Transcoder,
};

/// Final result of one invocation
#[derive(Debug)]
pub enum Outcome {
    /// ffmpeg could not be run; nothing was downloaded
    MissingTranscoder(DownloadError),
    Completed(RetrievalOutcome),
    Failed(DownloadError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Line shown to the user
    pub fn message(&self) -> String {
        match self {
            Self::MissingTranscoder(_) => "Error: FFmpeg not found. Please install FFmpeg first.".to_string(),
            Self::Completed(outcome) => format!(
                "Successfully downloaded with {}: {}\nDone!",
                outcome.backend,
                outcome.output.display()
            ),
            Self::Failed(_) => "Both methods failed!\nDownload failed!".to_string(),
        }
    }
}

/// Wire the standard backends: yt-dlp first, then the stream backend
pub fn build_downloader(config: &AppConfig) -> Result<Downloader, DownloadError> {
    let transcoder: Arc<dyn Transcoder> =
        Arc::new(FfmpegTranscoder::new(&config.ffmpeg, config.transcode_timeout));

    let ytdlp = YtDlpBackend::new(
        Box::new(YtDlpCli::new(
            &config.ytdlp,
            config.network.clone(),
            config.cookies.clone(),
            config.metadata_timeout,
            config.download_timeout,
        )),
        transcoder.clone(),
        &config.work_dir,
    );

    let stream = StreamBackend::new(
        Box::new(PythonInfoExtractor::new(
            &config.python,
            config.cookies.clone(),
            config.network.clone(),
            config.metadata_timeout,
        )),
        Box::new(HttpStreamFetcher::new(&config.network, config.download_timeout)?),
        transcoder,
        &config.work_dir,
    );

    let mut downloader = Downloader::new();
    downloader.add_backend(Box::new(ytdlp));
    downloader.add_backend(Box::new(stream));
    Ok(downloader)
}

/// Check tools, then run the fallback chain for `request`
pub async fn execute(request: &Request, tools: &dyn ToolProbe, downloader: &Downloader) -> Outcome {
    match tools.probe(ToolType::Ffmpeg).await {
        Ok(info) => {
            tracing::debug!(path = %info.path, version = ?info.version, "ffmpeg available");
        }
        Err(e) => {
            tracing::error!(error = %e, "ffmpeg check failed");
            return Outcome::MissingTranscoder(e);
        }
    }

    if let Err(e) = tools.probe(ToolType::YtDlp).await {
        tracing::warn!(error = %e, "yt-dlp not found, install it with: pip install yt-dlp");
        tracing::warn!("continuing with the stream backend only");
    }

    if let Err(e) = tools.probe(ToolType::PythonYtDlp).await {
        tracing::warn!(error = %e, "python yt_dlp module not available, the stream backend will fail");
    }

    tracing::info!(url = %request.url, output = %request.output.display(), "attempting to download audio");

    match downloader.download(&request.url, &request.output).await {
        Ok(outcome) => Outcome::Completed(outcome),
        Err(e) => {
            tracing::error!(error = %e, "both methods failed");
            Outcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::{AudioStrategy, ToolInfo};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubTools {
        missing: Vec<ToolType>,
    }

    #[async_trait]
    impl ToolProbe for StubTools {
        async fn probe(&self, tool: ToolType) -> Result<ToolInfo, DownloadError> {
            if self.missing.contains(&tool) {
                return Err(DownloadError::ToolNotFound(tool.as_str().to_string()));
            }
            Ok(ToolInfo {
                name: tool.as_str().to_string(),
                tool_type: tool,
                version: Some("1.0".to_string()),
                path: tool.as_str().to_string(),
            })
        }
    }

    struct CountingStrategy {
        calls: Arc<AtomicUsize>,
        succeed: bool,
    }

    #[async_trait]
    impl AudioStrategy for CountingStrategy {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn attempt(&self, _url: &str, output: &Path) -> Result<PathBuf, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(output.to_path_buf())
            } else {
                Err(DownloadError::NoAudioStream)
            }
        }
    }

    fn request() -> Request {
        Request {
            url: "https://youtu.be/x".to_string(),
            output: PathBuf::from("output.mp3"),
        }
    }

    fn counting_downloader(succeed: bool) -> (Downloader, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut downloader = Downloader::new();
        downloader.add_backend(Box::new(CountingStrategy { calls: calls.clone(), succeed }));
        (downloader, calls)
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_skips_all_extraction() {
        let (downloader, calls) = counting_downloader(true);
        let tools = StubTools { missing: vec![ToolType::Ffmpeg] };

        let outcome = execute(&request(), &tools, &downloader).await;

        assert!(matches!(outcome, Outcome::MissingTranscoder(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(outcome.message().contains("FFmpeg not found"));
    }

    #[tokio::test]
    async fn test_missing_ytdlp_only_warns() {
        let (downloader, calls) = counting_downloader(true);
        let tools = StubTools { missing: vec![ToolType::YtDlp, ToolType::PythonYtDlp] };

        let outcome = execute(&request(), &tools, &downloader).await;

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcome.message().ends_with("Done!"));
    }

    #[tokio::test]
    async fn test_failure_message() {
        let (downloader, _) = counting_downloader(false);
        let tools = StubTools { missing: Vec::new() };

        let outcome = execute(&request(), &tools, &downloader).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "Both methods failed!\nDownload failed!");
    }

    // The yt-dlp backend goes first even though the stream backend is the
    // nominal primary. Keep this order.
    #[test]
    fn test_standard_order_is_ytdlp_then_stream() {
        let config = AppConfig {
            ffmpeg: "ffmpeg".to_string(),
            ytdlp: "yt-dlp".to_string(),
            python: "python3".to_string(),
            network: Default::default(),
            cookies: Default::default(),
            work_dir: PathBuf::from("."),
            metadata_timeout: 60,
            download_timeout: 1800,
            transcode_timeout: 600,
        };

        let downloader = build_downloader(&config).unwrap();
        assert_eq!(downloader.backend_names(), vec!["yt-dlp", "stream"]);
    }
}
