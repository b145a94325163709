use super::associator::NetworkAssociator;
use crate::config::{WifiConfig, WifiCredentials};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Switches and repairs the host's wireless association
pub struct WifiManager {
    associator: Arc<dyn NetworkAssociator>,
    interface: String,
    pre_settle: Duration,
    settle: Duration,
}

impl WifiManager {
    pub fn new(associator: Arc<dyn NetworkAssociator>, config: &WifiConfig) -> Self {
        Self {
            associator,
            interface: config.interface.clone(),
            pre_settle: config.pre_settle(),
            settle: config.settle(),
        }
    }

    /// Join a network, then wait for it to settle.
    ///
    /// Association is asynchronous at the OS level; the settle delay is the
    /// only signal that it took effect. Failure is a hard stop.
    pub async fn associate(&self, credentials: &WifiCredentials) -> Result<()> {
        tokio::time::sleep(self.pre_settle).await;

        info!(
            "connecting to wifi: {} (via {})",
            credentials.ssid,
            self.associator.name()
        );
        self.associator
            .associate(&self.interface, &credentials.ssid, &credentials.passphrase)
            .await?;
        info!("connected to wifi: {}", credentials.ssid);

        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    /// Whether the host is currently on `ssid`; query failures count as no
    pub async fn is_associated(&self, ssid: &str) -> bool {
        match self.associator.current_network(&self.interface).await {
            Ok(current) => current.as_deref() == Some(ssid),
            Err(e) => {
                warn!("Failed to query current wifi network: {}", e);
                false
            }
        }
    }

    /// Associate only if not already on the network.
    pub async fn ensure_associated(&self, credentials: &WifiCredentials) -> Result<()> {
        if self.is_associated(&credentials.ssid).await {
            return Ok(());
        }

        warn!("wifi is not on {}, reconnecting", credentials.ssid);
        self.associate(credentials).await
    }
}
