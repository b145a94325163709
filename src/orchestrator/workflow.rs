use super::report::RunReport;
use crate::config::{Config, WifiCredentials};
use crate::control::{BtleplugTransport, ControlClient, ControlTransport};
use crate::error::Result;
use crate::media::{HttpMediaTransport, MediaClient, MediaTransport};
use crate::storage::SavePath;
use crate::wifi::{NetworkAssociator, NetworkSetup, WifiManager};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// The three external capabilities a run drives
pub struct Collaborators {
    pub control: Arc<dyn ControlTransport>,
    pub associator: Arc<dyn NetworkAssociator>,
    pub media: Arc<dyn MediaTransport>,
}

impl Collaborators {
    /// Host Bluetooth, `networksetup` and HTTP
    pub async fn system(config: &Config) -> Result<Self> {
        Ok(Self {
            control: Arc::new(BtleplugTransport::new().await?),
            associator: Arc::new(NetworkSetup::new(config.wifi.networksetup_path.clone())),
            media: Arc::new(HttpMediaTransport::new(&config.media)?),
        })
    }
}

/// Drives one end-to-end sync: stop recording, pull every file off the
/// camera over its access point, then resume timelapse recording.
///
/// Steps run strictly in order and the first failure aborts the run. There
/// is no rollback: a failure mid-run can leave the host on the camera's
/// network and the camera not recording.
pub struct Orchestrator {
    control: ControlClient,
    wifi: Arc<WifiManager>,
    media: MediaClient,
    access_point: WifiCredentials,
    home: WifiCredentials,
}

impl Orchestrator {
    pub fn new(config: Config, collaborators: Collaborators, save_path: SavePath) -> Self {
        let wifi = Arc::new(WifiManager::new(collaborators.associator, &config.wifi));
        let control = ControlClient::new(collaborators.control, config.device);
        let media = MediaClient::new(
            collaborators.media,
            Arc::clone(&wifi),
            config.wifi.gopro.clone(),
            config.media.media_dir,
            save_path,
        );

        Self {
            control,
            wifi,
            media,
            access_point: config.wifi.gopro,
            home: config.wifi.home,
        }
    }

    pub async fn run(&mut self) -> Result<RunReport> {
        let mut report = RunReport::new(self.media.save_path().dir().to_path_buf());
        info!("==== sync started at {}", report.started_at);

        // connect
        self.control.open().await?;

        // wifi: recording has to stop before the access point can come up
        self.control.set_shutter(false).await?;
        self.control.set_companion_wifi(true).await?;
        self.wifi.associate(&self.access_point).await?;

        info!("---- downloading all the media");
        self.drain_media(&mut report).await?;

        // the host must always end up back home
        self.wifi.associate(&self.home).await?;
        self.control.set_companion_wifi(false).await?;

        // continue recording
        self.control.load_timelapse_preset().await?;
        self.control.set_shutter(true).await?;

        self.control.close().await?;

        report.finished_at = Some(Utc::now());
        info!(
            "==== sync finished: {} file(s), {} bytes",
            report.downloaded.len(),
            report.bytes_downloaded
        );
        Ok(report)
    }

    /// Download then delete every listed file. A file is only deleted once
    /// its download succeeded.
    async fn drain_media(&self, report: &mut RunReport) -> Result<()> {
        let listing = self.media.list_all_media().await?;
        info!("{} file(s) on the camera", listing.file_count());

        for entry in listing.entries() {
            let bytes = self
                .media
                .download_from(&entry.directory, &entry.file_name)
                .await?;
            report.downloaded.push(entry.file_name.clone());
            report.bytes_downloaded += bytes;

            self.media
                .delete_from(&entry.directory, &entry.file_name)
                .await?;
            report.deleted.push(entry.file_name);
        }
        Ok(())
    }
}
