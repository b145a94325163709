use super::messages::MediaListing;
use super::transport::MediaTransport;
use crate::config::WifiCredentials;
use crate::error::{Result, SyncError};
use crate::storage::SavePath;
use crate::wifi::WifiManager;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const MEDIA_LIST_PATH: &str = "/gopro/media/list";
const STORAGE_DELETE_PATH: &str = "/gp/gpControl/command/storage/delete";

/// Lists, downloads and deletes media over the camera's access point
///
/// Every operation first makes sure the host is associated with the access
/// point, reconnecting if the association dropped.
pub struct MediaClient {
    transport: Arc<dyn MediaTransport>,
    wifi: Arc<WifiManager>,
    access_point: WifiCredentials,
    media_dir: String,
    save_path: SavePath,
}

impl MediaClient {
    pub fn new(
        transport: Arc<dyn MediaTransport>,
        wifi: Arc<WifiManager>,
        access_point: WifiCredentials,
        media_dir: impl Into<String>,
        save_path: SavePath,
    ) -> Self {
        Self {
            transport,
            wifi,
            access_point,
            media_dir: media_dir.into(),
            save_path,
        }
    }

    pub fn save_path(&self) -> &SavePath {
        &self.save_path
    }

    async fn ensure_access_point(&self) -> Result<()> {
        self.wifi.ensure_associated(&self.access_point).await
    }

    /// Fetch a fresh listing of everything on the camera.
    pub async fn list_all_media(&self) -> Result<MediaListing> {
        self.ensure_access_point().await?;

        let body = self.transport.get(MEDIA_LIST_PATH).await?;
        let listing: MediaListing = serde_json::from_slice(&body)
            .map_err(|e| SyncError::Transfer(format!("Malformed media listing: {}", e)))?;
        debug!("{:?}", listing);

        Ok(listing)
    }

    /// Download from the configured media directory.
    pub async fn download(&self, file_name: &str) -> Result<u64> {
        self.download_from(&self.media_dir, file_name).await
    }

    /// Stream `DCIM/<directory>/<file_name>` into the save path, replacing
    /// any existing file. A failure midway leaves the partial file behind.
    pub async fn download_from(&self, directory: &str, file_name: &str) -> Result<u64> {
        self.ensure_access_point().await?;

        info!("downloading file: {}", file_name);
        let mut stream = self
            .transport
            .get_stream(&format!("/videos/DCIM/{}/{}", directory, file_name))
            .await?;

        let destination = self.save_path.file(file_name)?;
        info!("saving into: {}", destination.display());
        let mut file = tokio::fs::File::create(&destination).await?;

        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // The partial file stays; just make sure it is on disk.
                    file.flush().await?;
                    return Err(e);
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!("√ {} ({} bytes)", file_name, written);
        Ok(written)
    }

    /// Delete from the configured media directory.
    pub async fn delete(&self, file_name: &str) -> Result<()> {
        self.delete_from(&self.media_dir, file_name).await
    }

    pub async fn delete_from(&self, directory: &str, file_name: &str) -> Result<()> {
        self.ensure_access_point().await?;

        warn!("deleting media: {}/{}", directory, file_name);
        // No trailing slash after "delete" for single files.
        self.storage_delete(&format!("{}?p={}/{}", STORAGE_DELETE_PATH, directory, file_name))
            .await
    }

    /// Wipe every file on the camera.
    pub async fn delete_all(&self) -> Result<()> {
        self.ensure_access_point().await?;

        warn!("deleting all the media");
        self.storage_delete(&format!("{}/all", STORAGE_DELETE_PATH)).await
    }

    /// The camera answers with empty or falsy JSON on success. Anything else
    /// is logged but not interpreted; partial failures go unnoticed.
    async fn storage_delete(&self, path: &str) -> Result<()> {
        let body = self.transport.get(path).await?;

        match serde_json::from_slice::<serde_json::Value>(&body) {
            _ if body.iter().all(u8::is_ascii_whitespace) => info!("√"),
            Ok(value) if is_falsy(&value) => info!("√"),
            Ok(value) => info!("{}", value),
            Err(_) => info!("{}", String::from_utf8_lossy(&body)),
        }
        Ok(())
    }
}

fn is_falsy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
