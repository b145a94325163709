use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix for overrides, e.g. `GOPRO_SYNC__WIFI__HOME__SSID`
pub const ENV_PREFIX: &str = "GOPRO_SYNC";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    pub wifi: WifiConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// BLE control channel settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Advertised name prefix of the camera
    pub name_prefix: String,
    /// Duration of a single discovery scan
    pub scan_timeout_secs: u64,
    /// Scan attempts before giving up (0 = keep scanning forever)
    pub max_scan_attempts: u32,
    /// Connect timeout; short values spuriously fail
    pub connect_timeout_secs: u64,
    /// Pause after each acknowledged command (wifi toggling needs it)
    pub command_settle_ms: u64,
    /// Bound on the acknowledgement wait (0 = wait forever)
    pub ack_timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name_prefix: "GoPro".to_string(),
            scan_timeout_secs: 5,
            max_scan_attempts: 10,
            connect_timeout_secs: 30,
            command_settle_ms: 2000,
            ack_timeout_secs: 30,
        }
    }
}

impl DeviceConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_settle(&self) -> Duration {
        Duration::from_millis(self.command_settle_ms)
    }

    pub fn max_scan_attempts(&self) -> Option<u32> {
        (self.max_scan_attempts > 0).then_some(self.max_scan_attempts)
    }

    pub fn ack_timeout(&self) -> Option<Duration> {
        (self.ack_timeout_secs > 0).then(|| Duration::from_secs(self.ack_timeout_secs))
    }
}

/// A wireless network name and passphrase
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub passphrase: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
        }
    }
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WifiConfig {
    /// Hardware port handed to the association utility
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Absolute path, cron only has /usr/bin:/bin on its PATH
    #[serde(default = "default_networksetup_path")]
    pub networksetup_path: String,
    /// Pause before issuing an association
    #[serde(default = "default_wifi_settle_ms")]
    pub pre_settle_ms: u64,
    /// Pause after an association, which is not directly observable
    #[serde(default = "default_wifi_settle_ms")]
    pub settle_ms: u64,
    /// The camera's own access point
    pub gopro: WifiCredentials,
    /// The operator's home network
    pub home: WifiCredentials,
}

fn default_interface() -> String {
    "en0".to_string()
}

fn default_networksetup_path() -> String {
    "/usr/sbin/networksetup".to_string()
}

fn default_wifi_settle_ms() -> u64 {
    3000
}

impl WifiConfig {
    pub fn pre_settle(&self) -> Duration {
        Duration::from_millis(self.pre_settle_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub base_url: String,
    /// DCIM sub-directory used by download/delete when none is given
    pub media_dir: String,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout; videos are large
    pub request_timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://10.5.5.9:8080".to_string(),
            media_dir: "100GOPRO".to_string(),
            connect_timeout_secs: 30,
            request_timeout_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root holding one dated folder per run
    pub data_root: String,
    /// Used when `data_root` does not exist (e.g. external disk unmounted)
    pub fallback_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: "~/Movies/gopro".to_string(),
            fallback_root: "data".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn data_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_root).into_owned())
    }

    pub fn fallback_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.fallback_root).into_owned())
    }
}

impl Config {
    /// Load from an optional file at `path` (extension inferred) layered
    /// under `GOPRO_SYNC__*` environment variables, then validate.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let cfg: Config = settings
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check both credential pairs are present and the numbers make sense.
    ///
    /// Writability of the output directory is checked when the save path
    /// is resolved, see [`crate::storage::SavePath::resolve`].
    pub fn validate(&self) -> Result<()> {
        for (label, creds) in [("gopro", &self.wifi.gopro), ("home", &self.wifi.home)] {
            if creds.ssid.trim().is_empty() {
                return Err(SyncError::Config(format!("wifi.{label}.ssid is empty")));
            }
            if creds.passphrase.is_empty() {
                return Err(SyncError::Config(format!(
                    "wifi.{label}.passphrase is empty"
                )));
            }
        }

        if self.wifi.gopro.ssid == self.wifi.home.ssid {
            return Err(SyncError::Config(
                "wifi.gopro and wifi.home name the same network".to_string(),
            ));
        }

        if self.device.name_prefix.is_empty() {
            return Err(SyncError::Config("device.name_prefix is empty".to_string()));
        }

        if self.media.media_dir.is_empty() || self.media.media_dir.contains('/') {
            return Err(SyncError::Config(format!(
                "media.media_dir '{}' must be a single directory name",
                self.media.media_dir
            )));
        }

        if self.storage.data_root.is_empty() {
            return Err(SyncError::Config("storage.data_root is empty".to_string()));
        }

        Ok(())
    }
}
