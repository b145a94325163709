use crate::error::Result;
use futures::stream::BoxStream;
use std::time::Duration;
use uuid::Uuid;

/// A discovered control-channel endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    /// Transport-specific identifier (BLE address on most platforms)
    pub id: String,
    /// Advertised local name, e.g. "GoPro 1234"
    pub name: String,
}

/// A characteristic advertised by a connected device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicInfo {
    pub uuid: Uuid,
    pub notifiable: bool,
}

/// A value pushed by the device on a subscribed characteristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub uuid: Uuid,
    pub value: Vec<u8>,
}

/// Stream of notifications; ends when the link drops
pub type NotificationStream = BoxStream<'static, Notification>;

/// Low-energy transport used to find and connect to the camera
///
/// Implementations:
/// - [`super::ble::BtleplugTransport`]: the host's Bluetooth adapter
/// - in-memory fakes in tests
#[async_trait::async_trait]
pub trait ControlTransport: Send + Sync {
    /// Scan for `timeout` and return everything seen with a name
    async fn scan(&self, timeout: Duration) -> Result<Vec<DeviceHandle>>;

    /// Connect to a device found by [`ControlTransport::scan`]
    ///
    /// Implementations do not impose their own timeout; the caller bounds it.
    async fn connect(&self, device: &DeviceHandle) -> Result<Box<dyn ControlLink>>;
}

/// An established link to one device
#[async_trait::async_trait]
pub trait ControlLink: Send + Sync {
    /// Characteristics discovered on connect
    fn characteristics(&self) -> Vec<CharacteristicInfo>;

    /// Enable notifications on a characteristic
    async fn subscribe(&self, uuid: Uuid) -> Result<()>;

    /// Notifications from every subscribed characteristic
    async fn notifications(&self) -> Result<NotificationStream>;

    /// Write with a delivery acknowledgement from the transport
    async fn write_with_response(&self, uuid: Uuid, payload: &[u8]) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}
