// In-memory stand-ins for the camera's BLE link, the host's wifi utility and
// the camera's HTTP API. All three append to one shared event log so tests
// can assert on cross-component ordering.

#![allow(dead_code)]

use futures::channel::mpsc;
use futures::stream::{self, StreamExt};
use gopro_sync::config::{DeviceConfig, MediaConfig, StorageConfig, WifiConfig};
use gopro_sync::control::{
    AckSlot, CharacteristicInfo, ControlLink, ControlTransport, DeviceHandle, Notification,
    NotificationStream, COMMAND_REQ_UUID, COMMAND_RSP_UUID,
};
use gopro_sync::media::{ByteStream, MediaTransport};
use gopro_sync::wifi::{expect_empty_output, NetworkAssociator};
use gopro_sync::{Config, Result, SyncError, WifiCredentials};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// A notifiable characteristic the camera exposes besides command response
pub const SETTINGS_RSP_UUID: Uuid = Uuid::from_u128(0xb5f90075_aa8d_11e3_9046_0002a5d5c51b);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Scan,
    Connect(String),
    Subscribe(Uuid),
    Command(Vec<u8>),
    Disconnect,
    Associate(String),
    QueryNetwork,
    Get(String),
    Stream(String),
}

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Command(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }
}

pub fn test_config() -> Config {
    Config {
        device: DeviceConfig {
            name_prefix: "GoPro".to_string(),
            scan_timeout_secs: 0,
            max_scan_attempts: 3,
            connect_timeout_secs: 5,
            command_settle_ms: 0,
            ack_timeout_secs: 1,
        },
        wifi: WifiConfig {
            interface: "en0".to_string(),
            networksetup_path: "/usr/sbin/networksetup".to_string(),
            pre_settle_ms: 0,
            settle_ms: 0,
            gopro: gopro_ap(),
            home: home_network(),
        },
        media: MediaConfig::default(),
        storage: StorageConfig::default(),
    }
}

pub fn gopro_ap() -> WifiCredentials {
    WifiCredentials::new("my-gopro", "xFQ-7rS-fvh")
}

pub fn home_network() -> WifiCredentials {
    WifiCredentials::new("home-5G", "home-pass")
}

pub fn camera() -> DeviceHandle {
    DeviceHandle {
        id: "AA:BB:CC:DD:EE:FF".to_string(),
        name: "GoPro-1234".to_string(),
    }
}

pub fn other_device(name: &str) -> DeviceHandle {
    DeviceHandle {
        id: format!("id-{}", name),
        name: name.to_string(),
    }
}

// ============================================================================
// Control channel
// ============================================================================

/// How the fake camera answers a command write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Response notification on the command response characteristic
    Respond,
    /// Nothing at all
    Silent,
    /// Only a notification on a different characteristic
    UnrelatedOnly,
    /// An unrelated notification, then the real response
    UnrelatedThenRespond,
    /// The link drops without answering
    DropLink,
}

struct ControlInner {
    log: EventLog,
    scans: Mutex<VecDeque<Vec<DeviceHandle>>>,
    scan_count: AtomicUsize,
    characteristics: Mutex<Vec<CharacteristicInfo>>,
    reply: Mutex<Reply>,
    fail_writes: AtomicBool,
    notify_tx: Mutex<Option<mpsc::UnboundedSender<Notification>>>,
    observed: Mutex<Option<Arc<AckSlot>>>,
    armed_at_write: Mutex<Vec<bool>>,
}

#[derive(Clone)]
pub struct FakeControl {
    inner: Arc<ControlInner>,
}

impl FakeControl {
    /// Each scan returns the next batch; once exhausted scans find nothing.
    pub fn new(log: EventLog, scans: Vec<Vec<DeviceHandle>>) -> Self {
        Self {
            inner: Arc::new(ControlInner {
                log,
                scans: Mutex::new(scans.into()),
                scan_count: AtomicUsize::new(0),
                characteristics: Mutex::new(vec![
                    CharacteristicInfo {
                        uuid: COMMAND_REQ_UUID,
                        notifiable: false,
                    },
                    CharacteristicInfo {
                        uuid: COMMAND_RSP_UUID,
                        notifiable: true,
                    },
                    CharacteristicInfo {
                        uuid: SETTINGS_RSP_UUID,
                        notifiable: true,
                    },
                ]),
                reply: Mutex::new(Reply::Respond),
                fail_writes: AtomicBool::new(false),
                notify_tx: Mutex::new(None),
                observed: Mutex::new(None),
                armed_at_write: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A camera that is found on the first scan and answers every command
    pub fn found(log: EventLog) -> Self {
        Self::new(log, vec![vec![camera()]])
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.inner.reply.lock().unwrap() = reply;
    }

    pub fn set_characteristics(&self, characteristics: Vec<CharacteristicInfo>) {
        *self.inner.characteristics.lock().unwrap() = characteristics;
    }

    pub fn fail_writes(&self) {
        self.inner.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Record whether `slot` is armed at the moment of each write
    pub fn observe(&self, slot: Arc<AckSlot>) {
        *self.inner.observed.lock().unwrap() = Some(slot);
    }

    pub fn armed_at_write(&self) -> Vec<bool> {
        self.inner.armed_at_write.lock().unwrap().clone()
    }

    pub fn scan_count(&self) -> usize {
        self.inner.scan_count.load(Ordering::SeqCst)
    }

    /// Push a notification as if the camera sent it unprompted
    pub fn notify(&self, uuid: Uuid, value: Vec<u8>) {
        if let Some(tx) = self.inner.notify_tx.lock().unwrap().as_ref() {
            let _ = tx.unbounded_send(Notification { uuid, value });
        }
    }
}

#[async_trait::async_trait]
impl ControlTransport for FakeControl {
    async fn scan(&self, _timeout: Duration) -> Result<Vec<DeviceHandle>> {
        self.inner.log.push(Event::Scan);
        self.inner.scan_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.scans.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn connect(&self, device: &DeviceHandle) -> Result<Box<dyn ControlLink>> {
        self.inner.log.push(Event::Connect(device.name.clone()));
        let (tx, rx) = mpsc::unbounded();
        *self.inner.notify_tx.lock().unwrap() = Some(tx);
        Ok(Box::new(FakeLink {
            inner: Arc::clone(&self.inner),
            rx: Mutex::new(Some(rx)),
        }))
    }
}

struct FakeLink {
    inner: Arc<ControlInner>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Notification>>>,
}

impl FakeLink {
    fn send(&self, uuid: Uuid, value: Vec<u8>) {
        if let Some(tx) = self.inner.notify_tx.lock().unwrap().as_ref() {
            let _ = tx.unbounded_send(Notification { uuid, value });
        }
    }
}

#[async_trait::async_trait]
impl ControlLink for FakeLink {
    fn characteristics(&self) -> Vec<CharacteristicInfo> {
        self.inner.characteristics.lock().unwrap().clone()
    }

    async fn subscribe(&self, uuid: Uuid) -> Result<()> {
        self.inner.log.push(Event::Subscribe(uuid));
        Ok(())
    }

    async fn notifications(&self) -> Result<NotificationStream> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| SyncError::Transport("notifications already taken".to_string()))?;
        Ok(rx.boxed())
    }

    async fn write_with_response(&self, uuid: Uuid, payload: &[u8]) -> Result<()> {
        assert_eq!(uuid, COMMAND_REQ_UUID);

        if let Some(slot) = self.inner.observed.lock().unwrap().as_ref() {
            self.inner.armed_at_write.lock().unwrap().push(slot.is_armed());
        }

        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("write rejected".to_string()));
        }
        self.inner.log.push(Event::Command(payload.to_vec()));

        let response = vec![0x02, payload[1], 0x00];
        let reply = *self.inner.reply.lock().unwrap();
        match reply {
            Reply::Respond => self.send(COMMAND_RSP_UUID, response),
            Reply::Silent => {}
            Reply::UnrelatedOnly => self.send(SETTINGS_RSP_UUID, response),
            Reply::UnrelatedThenRespond => {
                self.send(SETTINGS_RSP_UUID, vec![0x02, 0xFF, 0x00]);
                self.send(COMMAND_RSP_UUID, response);
            }
            Reply::DropLink => {
                self.inner.notify_tx.lock().unwrap().take();
            }
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.inner.log.push(Event::Disconnect);
        self.inner.notify_tx.lock().unwrap().take();
        Ok(())
    }
}

// ============================================================================
// Network association
// ============================================================================

struct AssociatorInner {
    log: EventLog,
    current: Mutex<Option<String>>,
    failures: Mutex<HashMap<String, String>>,
    query_fails: AtomicBool,
    associations: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeAssociator {
    inner: Arc<AssociatorInner>,
}

impl FakeAssociator {
    pub fn new(log: EventLog) -> Self {
        Self {
            inner: Arc::new(AssociatorInner {
                log,
                current: Mutex::new(Some(home_network().ssid)),
                failures: Mutex::new(HashMap::new()),
                query_fails: AtomicBool::new(false),
                associations: AtomicUsize::new(0),
            }),
        }
    }

    /// Make the OS utility print `output` when joining `ssid`
    pub fn fail_for(&self, ssid: &str, output: &str) {
        self.inner
            .failures
            .lock()
            .unwrap()
            .insert(ssid.to_string(), output.to_string());
    }

    /// Simulate the OS dropping or changing the association
    pub fn set_current(&self, ssid: Option<&str>) {
        *self.inner.current.lock().unwrap() = ssid.map(str::to_string);
    }

    pub fn current(&self) -> Option<String> {
        self.inner.current.lock().unwrap().clone()
    }

    pub fn fail_queries(&self) {
        self.inner.query_fails.store(true, Ordering::SeqCst);
    }

    pub fn associations(&self) -> usize {
        self.inner.associations.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NetworkAssociator for FakeAssociator {
    async fn associate(&self, _interface: &str, ssid: &str, _passphrase: &str) -> Result<()> {
        self.inner.log.push(Event::Associate(ssid.to_string()));
        self.inner.associations.fetch_add(1, Ordering::SeqCst);

        let output = self
            .inner
            .failures
            .lock()
            .unwrap()
            .get(ssid)
            .cloned()
            .unwrap_or_default();
        expect_empty_output("fake-networksetup", &output)?;

        *self.inner.current.lock().unwrap() = Some(ssid.to_string());
        Ok(())
    }

    async fn current_network(&self, _interface: &str) -> Result<Option<String>> {
        self.inner.log.push(Event::QueryNetwork);
        if self.inner.query_fails.load(Ordering::SeqCst) {
            return Err(SyncError::Association {
                command: "fake-networksetup -getairportnetwork".to_string(),
                output: "en0 is not a Wi-Fi interface.".to_string(),
            });
        }
        Ok(self.current())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Media HTTP API
// ============================================================================

pub const LIST_PATH: &str = "/gopro/media/list";

struct MediaInner {
    log: EventLog,
    listing: Mutex<Vec<u8>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    broken: Mutex<HashSet<String>>,
    delete_body: Mutex<Vec<u8>>,
}

#[derive(Clone)]
pub struct FakeMedia {
    inner: Arc<MediaInner>,
}

impl FakeMedia {
    pub fn new(log: EventLog) -> Self {
        Self {
            inner: Arc::new(MediaInner {
                log,
                listing: Mutex::new(br#"{"media":[]}"#.to_vec()),
                files: Mutex::new(HashMap::new()),
                broken: Mutex::new(HashSet::new()),
                delete_body: Mutex::new(b"{}".to_vec()),
            }),
        }
    }

    pub fn set_listing(&self, json: &str) {
        *self.inner.listing.lock().unwrap() = json.as_bytes().to_vec();
    }

    /// Serve `content` at /videos/DCIM/<dir>/<name>
    pub fn add_file(&self, dir: &str, name: &str, content: &[u8]) {
        self.inner
            .files
            .lock()
            .unwrap()
            .insert(format!("/videos/DCIM/{}/{}", dir, name), content.to_vec());
    }

    /// Make the download of a file fail after its first chunk
    pub fn break_file(&self, dir: &str, name: &str) {
        self.inner
            .broken
            .lock()
            .unwrap()
            .insert(format!("/videos/DCIM/{}/{}", dir, name));
    }

    pub fn set_delete_body(&self, body: &str) {
        *self.inner.delete_body.lock().unwrap() = body.as_bytes().to_vec();
    }
}

#[async_trait::async_trait]
impl MediaTransport for FakeMedia {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.inner.log.push(Event::Get(path.to_string()));

        if path == LIST_PATH {
            return Ok(self.inner.listing.lock().unwrap().clone());
        }
        if path.starts_with("/gp/gpControl/command/storage/delete") {
            return Ok(self.inner.delete_body.lock().unwrap().clone());
        }
        self.inner
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| SyncError::Transfer(format!("GET {}: 404 Not Found", path)))
    }

    async fn get_stream(&self, path: &str) -> Result<ByteStream> {
        self.inner.log.push(Event::Stream(path.to_string()));

        let content = self
            .inner
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| SyncError::Transfer(format!("GET {}: 404 Not Found", path)))?;

        let (head, tail) = content.split_at(content.len() / 2);
        let mut chunks: Vec<Result<Vec<u8>>> = vec![Ok(head.to_vec())];
        if self.inner.broken.lock().unwrap().contains(path) {
            chunks.push(Err(SyncError::Transfer("connection reset".to_string())));
        } else {
            chunks.push(Ok(tail.to_vec()));
        }
        Ok(stream::iter(chunks).boxed())
    }
}
