use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::downloader::errors::DownloadError;
use crate::downloader::extractors::diagnose_error;
use crate::downloader::models::{CookieSource, NetworkConfig, VideoInfo, TARGET_EXTENSION};
use crate::downloader::traits::AudioStrategy;
use crate::downloader::transcoder::Transcoder;
use crate::downloader::utils::{
    check_status, find_prefixed_files, remove_prefixed_files, run_output_with_timeout, same_path,
    TempFile,
};

/// Prefix of the file yt-dlp writes; the extension is chosen by yt-dlp
pub const TEMP_PREFIX: &str = "temp_audio.";
const OUTPUT_TEMPLATE: &str = "temp_audio.%(ext)s";

/// The two yt-dlp operations the backend needs
#[async_trait]
pub trait YtDlpClient: Send + Sync {
    async fn video_info(&self, url: &str) -> Result<VideoInfo, DownloadError>;

    /// Download the best audio format to `template` (a yt-dlp output template)
    async fn download_audio(&self, url: &str, template: &Path) -> Result<(), DownloadError>;
}

/// yt-dlp native binary
pub struct YtDlpCli {
    ytdlp_bin: String,
    network: NetworkConfig,
    cookies: CookieSource,
    info_timeout_secs: u64,
    download_timeout_secs: u64,
}

impl YtDlpCli {
    pub fn new(
        ytdlp_bin: impl Into<String>,
        network: NetworkConfig,
        cookies: CookieSource,
        info_timeout_secs: u64,
        download_timeout_secs: u64,
    ) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
            network,
            cookies,
            info_timeout_secs,
            download_timeout_secs,
        }
    }

    fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.network.ytdlp_args());
        args.extend(self.cookies.ytdlp_args());
        args.push(url.to_string());
        args
    }

    fn download_args(&self, url: &str, template: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
        ];
        args.extend(self.network.ytdlp_args());
        args.extend(self.cookies.ytdlp_args());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl YtDlpClient for YtDlpCli {
    async fn video_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let out = run_output_with_timeout(&self.ytdlp_bin, self.info_args(url), self.info_timeout_secs).await?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(stderr.trim().to_string().into());
        }

        VideoInfo::from_json(&out.stdout)
    }

    async fn download_audio(&self, url: &str, template: &Path) -> Result<(), DownloadError> {
        let args = self.download_args(url, template);
        tracing::debug!(command = %self.ytdlp_bin, args = ?args, "starting yt-dlp download");

        let out = run_output_with_timeout(&self.ytdlp_bin, args, self.download_timeout_secs).await?;
        let out = check_status(&self.ytdlp_bin, out)?;

        if let Some(dest) = parse_destination(&String::from_utf8_lossy(&out.stdout)) {
            tracing::info!(destination = %dest, "yt-dlp finished");
        }
        Ok(())
    }
}

/// Last `[download] Destination:` line of yt-dlp output
fn parse_destination(stdout: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref DEST_RE: Regex = Regex::new(r"(?m)^\[download\]\s+Destination:\s+(.+)$").unwrap();
    }

    DEST_RE
        .captures_iter(stdout)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

pub struct YtDlpBackend {
    client: Box<dyn YtDlpClient>,
    transcoder: Arc<dyn Transcoder>,
    work_dir: PathBuf,
}

impl YtDlpBackend {
    pub fn new(client: Box<dyn YtDlpClient>, transcoder: Arc<dyn Transcoder>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            transcoder,
            work_dir: work_dir.into(),
        }
    }

    async fn run(&self, url: &str, output: &Path) -> Result<PathBuf, DownloadError> {
        // metadata is informational only
        match self.client.video_info(url).await {
            Ok(info) => {
                println!("Title: {}", info.title);
                println!("Duration: {} seconds", info.duration_label());
                tracing::debug!(uploader = %info.uploader, "video metadata");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read metadata, downloading anyway");
            }
        }

        let template = self.work_dir.join(OUTPUT_TEMPLATE);
        if let Err(e) = self.client.download_audio(url, &template).await {
            if let Some(reason) = diagnose_error(&e.to_string()) {
                tracing::warn!(reason = reason.description(), hint = reason.hint(), "yt-dlp download refused");
            }
            return Err(e);
        }

        // an output named like the temp file is only a candidate when
        // yt-dlp wrote straight into it
        let found: Vec<PathBuf> = find_prefixed_files(&self.work_dir, TEMP_PREFIX)?
            .into_iter()
            .filter(|p| !is_partial(p))
            .collect();
        let picked = found
            .iter()
            .find(|p| !same_path(p, output))
            .or_else(|| found.first());
        let temp = match picked {
            Some(path) => TempFile::new(path),
            None => return Err(DownloadError::TempFileMissing),
        };
        tracing::info!(file = %temp.path().display(), "downloaded");

        if has_target_extension(temp.path()) {
            temp.persist(output)?;
        } else {
            tracing::info!("converting to {}", TARGET_EXTENSION);
            self.transcoder.transcode(temp.path(), output).await?;
        }

        Ok(output.to_path_buf())
    }
}

#[async_trait]
impl AudioStrategy for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn attempt(&self, url: &str, output: &Path) -> Result<PathBuf, DownloadError> {
        let stale = remove_prefixed_files(&self.work_dir, TEMP_PREFIX, Some(output))?;
        if stale > 0 {
            tracing::debug!(count = stale, "removed stale temporary files");
        }

        let result = self.run(url, output).await;

        // .part files and extra formats left by a failed or partial download
        if let Err(e) = remove_prefixed_files(&self.work_dir, TEMP_PREFIX, Some(output)) {
            tracing::warn!(error = %e, "failed to clean temporary files");
        }

        result
    }
}

fn is_partial(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("part") | Some("ytdl")
    )
}

fn has_target_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(TARGET_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Writes `temp_audio.<ext>` next to the template like yt-dlp would
    struct FakeClient {
        ext: Option<&'static str>,
        info_ok: bool,
        download_ok: bool,
    }

    #[async_trait]
    impl YtDlpClient for FakeClient {
        async fn video_info(&self, _url: &str) -> Result<VideoInfo, DownloadError> {
            if self.info_ok {
                Ok(VideoInfo {
                    title: "Song".to_string(),
                    uploader: "Band".to_string(),
                    duration_seconds: Some(200),
                })
            } else {
                Err(DownloadError::Unknown("metadata down".to_string()))
            }
        }

        async fn download_audio(&self, _url: &str, template: &Path) -> Result<(), DownloadError> {
            if !self.download_ok {
                return Err(DownloadError::from("ERROR: HTTP Error 403: Forbidden".to_string()));
            }
            if let Some(ext) = self.ext {
                let dir = template.parent().unwrap();
                std::fs::write(dir.join(format!("temp_audio.{}", ext)), b"audio").unwrap();
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingTranscoder {
        calls: AtomicUsize,
        inputs: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    #[async_trait]
    impl Transcoder for CountingTranscoder {
        async fn transcode(&self, input: &Path, output: &Path) -> Result<(), DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(input.to_path_buf());
            if self.fail {
                return Err(DownloadError::ProcessFailed {
                    program: "ffmpeg".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "bad input".to_string(),
                });
            }
            std::fs::write(output, b"mp3").unwrap();
            Ok(())
        }
    }

    fn backend(client: FakeClient, transcoder: Arc<CountingTranscoder>, dir: &Path) -> YtDlpBackend {
        YtDlpBackend::new(Box::new(client), transcoder, dir)
    }

    #[tokio::test]
    async fn test_mp3_download_is_renamed_without_transcoding() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: Some("mp3"), info_ok: true, download_ok: true };
        let output = dir.path().join("song.mp3");

        let result = backend(client, transcoder.clone(), dir.path())
            .attempt("https://youtu.be/x", &output)
            .await
            .unwrap();

        assert_eq!(result, output);
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&output).unwrap(), b"audio");
        assert!(!dir.path().join("temp_audio.mp3").exists());
    }

    #[tokio::test]
    async fn test_other_format_is_transcoded_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: Some("webm"), info_ok: true, download_ok: true };
        let output = dir.path().join("song.mp3");

        backend(client, transcoder.clone(), dir.path())
            .attempt("https://youtu.be/x", &output)
            .await
            .unwrap();

        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            transcoder.inputs.lock().unwrap()[0],
            dir.path().join("temp_audio.webm")
        );
        assert!(output.exists());
        assert!(!dir.path().join("temp_audio.webm").exists());
    }

    #[tokio::test]
    async fn test_failed_transcode_still_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(CountingTranscoder { fail: true, ..Default::default() });
        let client = FakeClient { ext: Some("m4a"), info_ok: true, download_ok: true };

        let err = backend(client, transcoder, dir.path())
            .attempt("https://youtu.be/x", &dir.path().join("song.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::ProcessFailed { .. }));
        assert!(!dir.path().join("temp_audio.m4a").exists());
    }

    #[tokio::test]
    async fn test_missing_temp_file_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: None, info_ok: true, download_ok: true };

        let err = backend(client, transcoder.clone(), dir.path())
            .attempt("https://youtu.be/x", &dir.path().join("song.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::TempFileMissing));
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_does_not_block_download() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: Some("mp3"), info_ok: false, download_ok: true };
        let output = dir.path().join("song.mp3");

        backend(client, transcoder, dir.path())
            .attempt("https://youtu.be/x", &output)
            .await
            .unwrap();
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_stale_temp_file_is_not_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("temp_audio.aac"), b"stale").unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: Some("webm"), info_ok: true, download_ok: true };

        backend(client, transcoder.clone(), dir.path())
            .attempt("https://youtu.be/x", &dir.path().join("song.mp3"))
            .await
            .unwrap();

        assert_eq!(
            transcoder.inputs.lock().unwrap()[0],
            dir.path().join("temp_audio.webm")
        );
        assert!(!dir.path().join("temp_audio.aac").exists());
    }

    #[tokio::test]
    async fn test_download_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: None, info_ok: true, download_ok: false };

        let err = backend(client, transcoder, dir.path())
            .attempt("https://youtu.be/x", &dir.path().join("song.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Unknown(_)));
    }

    #[tokio::test]
    async fn test_output_named_like_temp_file_survives_transcode() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: Some("webm"), info_ok: true, download_ok: true };
        let output = dir.path().join("temp_audio.mp3");

        let result = backend(client, transcoder.clone(), dir.path())
            .attempt("https://youtu.be/x", &output)
            .await
            .unwrap();

        assert_eq!(result, output);
        assert_eq!(std::fs::read(&output).unwrap(), b"mp3");
        assert!(!dir.path().join("temp_audio.webm").exists());
    }

    #[tokio::test]
    async fn test_output_named_like_temp_file_survives_rename() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: Some("mp3"), info_ok: true, download_ok: true };
        let output = dir.path().join("temp_audio.mp3");

        backend(client, transcoder.clone(), dir.path())
            .attempt("https://youtu.be/x", &output)
            .await
            .unwrap();

        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&output).unwrap(), b"audio");
    }

    #[tokio::test]
    async fn test_existing_output_named_like_temp_file_is_not_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("temp_audio.mp3");
        std::fs::write(&output, b"previous run").unwrap();
        let transcoder = Arc::new(CountingTranscoder::default());
        let client = FakeClient { ext: Some("m4a"), info_ok: true, download_ok: true };

        backend(client, transcoder.clone(), dir.path())
            .attempt("https://youtu.be/x", &output)
            .await
            .unwrap();

        assert_eq!(
            transcoder.inputs.lock().unwrap()[0],
            dir.path().join("temp_audio.m4a")
        );
        assert_eq!(std::fs::read(&output).unwrap(), b"mp3");
    }

    #[test]
    fn test_download_args() {
        let cli = YtDlpCli::new("yt-dlp", NetworkConfig::default(), CookieSource::None, 60, 600);
        let args = cli.download_args("https://youtu.be/x", Path::new("/tmp/w/temp_audio.%(ext)s"));
        assert_eq!(&args[..2], &["-f", "bestaudio/best"]);
        assert!(args.iter().any(|a| a == "--no-playlist"));
        assert!(args.windows(2).any(|w| w == ["-o", "/tmp/w/temp_audio.%(ext)s"]));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/x"));
    }

    #[test]
    fn test_parse_destination() {
        let out = "[youtube] x: Downloading webpage\n[download] Destination: /w/temp_audio.webm\n[download] 100% of 3.2MiB\n";
        assert_eq!(parse_destination(out), Some("/w/temp_audio.webm".to_string()));
        assert_eq!(parse_destination("nothing here"), None);
    }

    #[test]
    fn test_target_extension_check() {
        assert!(has_target_extension(Path::new("temp_audio.mp3")));
        assert!(has_target_extension(Path::new("temp_audio.MP3")));
        assert!(!has_target_extension(Path::new("temp_audio.webm")));
        assert!(is_partial(Path::new("temp_audio.webm.part")));
    }
}
