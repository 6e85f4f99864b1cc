// Retrieval strategy trait definition

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::errors::DownloadError;

/// One self-contained way of turning a locator into an MP3 file
#[async_trait]
pub trait AudioStrategy: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Fetch audio for `url` and leave the converted result at `output`.
    ///
    /// Every failure inside the strategy ends up in the returned error;
    /// temporary files are gone by the time this returns.
    async fn attempt(&self, url: &str, output: &Path) -> Result<PathBuf, DownloadError>;
}
