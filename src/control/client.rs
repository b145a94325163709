use super::ack::AckSlot;
use super::commands::{
    hex, request_id, Command, CommandResponse, COMMAND_REQ_UUID, COMMAND_RSP_UUID,
};
use super::transport::{ControlLink, ControlTransport, DeviceHandle, NotificationStream};
use crate::config::DeviceConfig;
use crate::error::{Result, SyncError};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Scanning,
    /// Linked, notifications not yet enabled
    ConnectedNoNotify,
    ConnectedReady,
    /// A command was written and its response is outstanding
    AwaitingAck,
}

/// A live link plus its notification listener
struct ControlSession {
    device: DeviceHandle,
    link: Box<dyn ControlLink>,
    ack: Arc<AckSlot>,
    listener: JoinHandle<()>,
}

impl Drop for ControlSession {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// BLE control channel to the camera
///
/// Holds at most one session. Commands are strictly one at a time: each
/// write waits for the response notification before returning.
pub struct ControlClient {
    transport: Arc<dyn ControlTransport>,
    config: DeviceConfig,
    session: Option<ControlSession>,
    state: SessionState,
}

impl ControlClient {
    pub fn new(transport: Arc<dyn ControlTransport>, config: DeviceConfig) -> Self {
        Self {
            transport,
            config,
            session: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The connected device, if any
    pub fn device(&self) -> Option<&DeviceHandle> {
        self.session.as_ref().map(|s| &s.device)
    }

    /// Acknowledgement slot of the current session
    pub fn ack_slot(&self) -> Option<Arc<AckSlot>> {
        self.session.as_ref().map(|s| Arc::clone(&s.ack))
    }

    /// Discover, connect and enable notifications. No-op when already open.
    pub async fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        warn!("Make sure no other app (e.g. the phone app preview) holds the camera, or connecting will fail");

        match self.establish().await {
            Ok(session) => {
                self.session = Some(session);
                self.state = SessionState::ConnectedReady;
                Ok(())
            }
            Err(e) => {
                error!("Connection establishment failed: {}", e);
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    async fn establish(&mut self) -> Result<ControlSession> {
        let device = self.discover().await?;

        info!("---- Establishing BLE connection to {}...", device.name);
        let connect_timeout = self.config.connect_timeout();
        let link = tokio::time::timeout(connect_timeout, self.transport.connect(&device))
            .await
            .map_err(|_| {
                SyncError::Connection(format!(
                    "timed out after {}s connecting to {}",
                    connect_timeout.as_secs(),
                    device.name
                ))
            })?
            .map_err(as_connection_error)?;
        self.state = SessionState::ConnectedNoNotify;
        info!("BLE Connected!");

        match Self::enable_notifications(link.as_ref()).await {
            Ok(notifications) => {
                let ack = Arc::new(AckSlot::new());
                let listener = tokio::spawn(listen(notifications, Arc::clone(&ack)));
                Ok(ControlSession {
                    device,
                    link,
                    ack,
                    listener,
                })
            }
            Err(e) => {
                if let Err(disconnect_err) = link.disconnect().await {
                    debug!("Disconnect after failed setup also failed: {}", disconnect_err);
                }
                Err(e)
            }
        }
    }

    /// Scan until a device with the configured prefix shows up.
    async fn discover(&mut self) -> Result<DeviceHandle> {
        self.state = SessionState::Scanning;
        let prefix = self.config.name_prefix.clone();
        let mut attempt: u32 = 0;

        loop {
            if let Some(max) = self.config.max_scan_attempts() {
                if attempt >= max {
                    return Err(SyncError::DiscoveryFailure {
                        prefix,
                        attempts: attempt,
                    });
                }
            }

            info!("---- Scanning for bluetooth devices... [#{}]", attempt);
            let devices = self
                .transport
                .scan(self.config.scan_timeout())
                .await
                .map_err(as_connection_error)?;
            attempt += 1;

            let mut found = None;
            for device in devices {
                info!("detected ble device: {}", device.name);
                if found.is_none() && device.name.starts_with(&prefix) {
                    found = Some(device);
                }
            }

            if let Some(device) = found {
                info!("found camera: {}", device.name);
                return Ok(device);
            }
        }
    }

    /// Subscribe to every notifiable characteristic.
    async fn enable_notifications(link: &dyn ControlLink) -> Result<NotificationStream> {
        let characteristics = link.characteristics();

        if !characteristics.iter().any(|c| c.uuid == COMMAND_REQ_UUID) {
            return Err(SyncError::Connection(format!(
                "command request characteristic {} not found",
                COMMAND_REQ_UUID
            )));
        }
        if !characteristics
            .iter()
            .any(|c| c.uuid == COMMAND_RSP_UUID && c.notifiable)
        {
            return Err(SyncError::Connection(format!(
                "command response characteristic {} is missing or not notifiable",
                COMMAND_RSP_UUID
            )));
        }

        let notifications = link.notifications().await.map_err(as_connection_error)?;

        info!("---- Enabling notifications...");
        for characteristic in characteristics.iter().filter(|c| c.notifiable) {
            info!("Enabling notification on char {}", characteristic.uuid);
            link.subscribe(characteristic.uuid)
                .await
                .map_err(as_connection_error)?;
        }
        info!("Done enabling notifications");

        Ok(notifications)
    }

    /// Write `payload` to the command characteristic and wait for the
    /// response notification, then let the camera settle.
    ///
    /// Only a response carrying the command id of `payload` acknowledges
    /// it. Opens the session first if needed. Returns the raw response.
    pub async fn send_command(&mut self, payload: &[u8], description: &str) -> Result<Vec<u8>> {
        let command_id = request_id(payload).ok_or_else(|| {
            SyncError::Transport(format!(
                "'{}' payload {} has no command id",
                description,
                hex(payload)
            ))
        })?;

        if self.session.is_none() {
            self.open().await?;
        }
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| SyncError::Transport("control session not open".to_string()))?;

        if session.ack.is_closed() {
            self.state = SessionState::Disconnected;
            return Err(SyncError::Transport(format!(
                "control session to {} dropped",
                session.device.name
            )));
        }

        info!("---> Requesting: {}", description);
        let ack = session.ack.arm(command_id);
        self.state = SessionState::AwaitingAck;

        if let Err(e) = session.link.write_with_response(COMMAND_REQ_UUID, payload).await {
            session.ack.disarm();
            self.state = SessionState::ConnectedReady;
            return Err(as_transport_error(e));
        }

        let response = match self.config.ack_timeout() {
            Some(limit) => match tokio::time::timeout(limit, ack).await {
                Ok(response) => response,
                Err(_) => {
                    session.ack.disarm();
                    self.state = SessionState::ConnectedReady;
                    return Err(SyncError::CommandTimeout {
                        command: description.to_string(),
                        timeout_secs: limit.as_secs(),
                    });
                }
            },
            None => ack.await,
        };

        let response = match response {
            Ok(response) => response,
            Err(_) => {
                self.state = SessionState::Disconnected;
                return Err(SyncError::Transport(format!(
                    "control session closed while awaiting acknowledgement of '{}'",
                    description
                )));
            }
        };

        match CommandResponse::parse(&response) {
            Some(rsp) if !rsp.is_success() => warn!(
                "Command 0x{:02x} answered with status {}",
                rsp.command_id, rsp.status
            ),
            Some(_) => {}
            None => warn!("Short command response: {}", hex(&response)),
        }

        tokio::time::sleep(self.config.command_settle()).await;
        self.state = SessionState::ConnectedReady;
        Ok(response)
    }

    async fn send(&mut self, command: Command) -> Result<()> {
        self.send_command(&command.payload, &command.description)
            .await
            .map(|_| ())
    }

    pub async fn load_timelapse_preset(&mut self) -> Result<()> {
        self.send(Command::load_timelapse_preset()).await
    }

    pub async fn set_shutter(&mut self, on: bool) -> Result<()> {
        self.send(Command::set_shutter(on)).await
    }

    pub async fn set_companion_wifi(&mut self, on: bool) -> Result<()> {
        self.send(Command::set_companion_wifi(on)).await
    }

    /// Stop the listener and disconnect.
    pub async fn close(&mut self) -> Result<()> {
        self.state = SessionState::Disconnected;
        if let Some(session) = self.session.take() {
            info!("Disconnecting from {}", session.device.name);
            session.ack.close();
            session.listener.abort();
            session.link.disconnect().await.map_err(as_transport_error)?;
        }
        Ok(())
    }
}

/// Route command responses into the ack slot until the link drops.
async fn listen(mut notifications: NotificationStream, ack: Arc<AckSlot>) {
    while let Some(notification) = notifications.next().await {
        info!(
            "<--- Response: {}: {}",
            notification.uuid,
            hex(&notification.value)
        );

        if notification.uuid != COMMAND_RSP_UUID {
            continue;
        }
        if !ack.resolve(notification.value) {
            debug!("Command response with no matching command outstanding");
        }
    }

    warn!("Notification stream ended; control session is gone");
    ack.close();
}

fn as_connection_error(e: SyncError) -> SyncError {
    match e {
        SyncError::Connection(_) | SyncError::DiscoveryFailure { .. } => e,
        other => SyncError::Connection(other.to_string()),
    }
}

fn as_transport_error(e: SyncError) -> SyncError {
    match e {
        SyncError::Transport(_) => e,
        other => SyncError::Transport(other.to_string()),
    }
}
