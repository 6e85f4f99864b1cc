// External transcoder (ffmpeg) invocation

use async_trait::async_trait;
use std::path::Path;

use super::errors::DownloadError;
use super::utils::{check_status, run_output_with_timeout};

/// Re-encodes a local file into the output format
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert `input` into `output`, overwriting it if it exists.
    /// The input file is left in place.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), DownloadError>;
}

pub struct FfmpegTranscoder {
    binary: String,
    timeout_secs: u64,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs,
        }
    }

    fn build_args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), DownloadError> {
        tracing::info!(input = %input.display(), output = %output.display(), "converting with ffmpeg");

        let args = Self::build_args(input, output);
        let out = run_output_with_timeout(&self.binary, args, self.timeout_secs).await?;
        check_status(&self.binary, out)?;
        Ok(())
    }
}
