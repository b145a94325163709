//! Control transport over the host's Bluetooth adapter

use super::transport::{
    CharacteristicInfo, ControlLink, ControlTransport, DeviceHandle, Notification,
    NotificationStream,
};
use crate::error::{Result, SyncError};
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// [`ControlTransport`] backed by `btleplug`
pub struct BtleplugTransport {
    adapter: Adapter,
    /// Peripherals from the latest scan, keyed by `DeviceHandle::id`
    seen: Mutex<HashMap<String, Peripheral>>,
}

impl BtleplugTransport {
    /// Use the first Bluetooth adapter of the host
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|e| SyncError::Connection(format!("Bluetooth unavailable: {}", e)))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::Connection("No Bluetooth adapter found".to_string()))?;

        info!("Using Bluetooth adapter");
        Ok(Self {
            adapter,
            seen: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait::async_trait]
impl ControlTransport for BtleplugTransport {
    async fn scan(&self, timeout: Duration) -> Result<Vec<DeviceHandle>> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        tokio::time::sleep(timeout).await;
        let peripherals = self.adapter.peripherals().await;
        self.adapter.stop_scan().await?;

        let mut seen = self.seen.lock().await;
        seen.clear();

        let mut devices = Vec::new();
        for peripheral in peripherals? {
            let Some(props) = peripheral.properties().await? else {
                continue;
            };
            let Some(name) = props.local_name else {
                continue;
            };
            let id = format!("{:?}", peripheral.id());
            seen.insert(id.clone(), peripheral);
            devices.push(DeviceHandle { id, name });
        }

        Ok(devices)
    }

    async fn connect(&self, device: &DeviceHandle) -> Result<Box<dyn ControlLink>> {
        let peripheral = self
            .seen
            .lock()
            .await
            .get(&device.id)
            .cloned()
            .ok_or_else(|| SyncError::Connection(format!("{} is no longer visible", device.name)))?;

        peripheral
            .connect()
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?;
        peripheral
            .discover_services()
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?;

        let characteristics: Vec<Characteristic> = peripheral.characteristics().into_iter().collect();
        debug!("{} characteristics discovered on {}", characteristics.len(), device.name);

        Ok(Box::new(BtleplugLink {
            peripheral,
            characteristics,
        }))
    }
}

struct BtleplugLink {
    peripheral: Peripheral,
    characteristics: Vec<Characteristic>,
}

impl BtleplugLink {
    fn characteristic(&self, uuid: Uuid) -> Result<&Characteristic> {
        self.characteristics
            .iter()
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| SyncError::Transport(format!("characteristic {} not found", uuid)))
    }
}

#[async_trait::async_trait]
impl ControlLink for BtleplugLink {
    fn characteristics(&self) -> Vec<CharacteristicInfo> {
        self.characteristics
            .iter()
            .map(|c| CharacteristicInfo {
                uuid: c.uuid,
                notifiable: c.properties.contains(CharPropFlags::NOTIFY),
            })
            .collect()
    }

    async fn subscribe(&self, uuid: Uuid) -> Result<()> {
        let characteristic = self.characteristic(uuid)?;
        self.peripheral.subscribe(characteristic).await?;
        Ok(())
    }

    async fn notifications(&self) -> Result<NotificationStream> {
        let stream = self.peripheral.notifications().await?;
        Ok(stream
            .map(|n| Notification {
                uuid: n.uuid,
                value: n.value,
            })
            .boxed())
    }

    async fn write_with_response(&self, uuid: Uuid, payload: &[u8]) -> Result<()> {
        let characteristic = self.characteristic(uuid)?;
        self.peripheral
            .write(characteristic, payload, WriteType::WithResponse)
            .await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}
