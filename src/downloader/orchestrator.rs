// Orchestrator with fallback logic

use std::path::Path;

use super::errors::DownloadError;
use super::models::RetrievalOutcome;
use super::traits::AudioStrategy;

pub struct Downloader {
    backends: Vec<Box<dyn AudioStrategy>>,
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Backends are tried in the order they are added
    pub fn add_backend(&mut self, backend: Box<dyn AudioStrategy>) {
        self.backends.push(backend);
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub async fn download(&self, url: &str, output: &Path) -> Result<RetrievalOutcome, DownloadError> {
        let mut failures = Vec::new();

        for backend in &self.backends {
            tracing::info!(backend = backend.name(), "trying backend");

            match backend.attempt(url, output).await {
                Ok(path) => {
                    tracing::info!(backend = backend.name(), output = %path.display(), "download succeeded");
                    return Ok(RetrievalOutcome {
                        backend: backend.name(),
                        output: path,
                    });
                }
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = %e, "backend failed");
                    failures.push(format!("{}: {}", backend.name(), e));
                }
            }
        }

        if failures.is_empty() {
            return Err(DownloadError::Exhausted("no backends configured".to_string()));
        }
        Err(DownloadError::Exhausted(failures.join(" | ")))
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}
