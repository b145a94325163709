pub mod config;
pub mod control;
pub mod error;
pub mod media;
pub mod orchestrator;
pub mod storage;
pub mod wifi;

pub use config::{Config, WifiCredentials};
pub use control::{
    AckSlot, BtleplugTransport, Command, ControlClient, ControlLink, ControlTransport,
    DeviceHandle, SessionState,
};
pub use error::{Result, SyncError};
pub use media::{HttpMediaTransport, MediaClient, MediaEntry, MediaListing, MediaTransport};
pub use orchestrator::{Collaborators, Orchestrator, RunReport};
pub use storage::SavePath;
pub use wifi::{NetworkAssociator, NetworkSetup, WifiManager};
