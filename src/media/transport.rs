use crate::config::MediaConfig;
use crate::error::{Result, SyncError};
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;
use tracing::info;

/// Response body delivered in chunks
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// The camera's HTTP API, reachable once the host is on its access point
#[async_trait::async_trait]
pub trait MediaTransport: Send + Sync {
    /// GET `path` (with query) and return the whole body
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// GET `path` and stream the body
    async fn get_stream(&self, path: &str) -> Result<ByteStream>;
}

/// [`MediaTransport`] over `reqwest`
pub struct HttpMediaTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMediaTransport {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Transfer(format!("Failed to build HTTP client: {}", e)))?;

        info!("Media API at {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Transfer(format!("GET {}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| SyncError::Transfer(format!("GET {}: {}", url, e)))
    }
}

#[async_trait::async_trait]
impl MediaTransport for HttpMediaTransport {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let body = self.send(path).await?.bytes().await?;
        Ok(body.to_vec())
    }

    async fn get_stream(&self, path: &str) -> Result<ByteStream> {
        let response = self.send(path).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| SyncError::Transfer(format!("Error reading download stream: {}", e)))
            })
            .boxed())
    }
}
