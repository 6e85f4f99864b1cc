// Direct HTTP fetch of a resolved media stream

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::errors::DownloadError;
use super::models::NetworkConfig;

/// Writes the bytes behind a stream URL to a local file
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    /// Returns the number of bytes written
    async fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        dest: &Path,
    ) -> Result<u64, DownloadError>;
}

pub struct HttpStreamFetcher {
    client: reqwest::Client,
}

impl HttpStreamFetcher {
    pub fn new(network: &NetworkConfig, timeout_secs: u64) -> Result<Self, DownloadError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs));

        if let Some(connect) = network.timeout {
            builder = builder.connect_timeout(Duration::from_secs(u64::from(connect)));
        }

        if let Some(proxy_url) = network.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| DownloadError::InvalidUrl(format!("proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StreamFetcher for HttpStreamFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        dest: &Path,
    ) -> Result<u64, DownloadError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut response = request.send().await?.error_for_status()?;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(DownloadError::Http(format!("empty response body from {}", url)));
        }

        tracing::debug!(bytes = written, dest = %dest.display(), "stream fetched");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_proxy_rejected() {
        let network = NetworkConfig {
            proxy: Some("not a proxy url".to_string()),
            timeout: Some(5),
        };
        assert!(matches!(
            HttpStreamFetcher::new(&network, 30),
            Err(DownloadError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let fetcher = HttpStreamFetcher::new(&NetworkConfig::default(), 5).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("audio_temp");

        // port 9 on localhost: nothing listens there in test environments
        let result = fetcher
            .fetch("http://127.0.0.1:9/stream", &HashMap::new(), &dest)
            .await;
        assert!(result.is_err());
        assert!(!dest.exists());
    }
}
