//! BLE control channel
//!
//! This module provides:
//! - Discovery and connection to the camera by advertised name prefix
//! - Notification subscription and the request/acknowledge command protocol
//! - The fixed command opcodes (shutter, companion wifi, timelapse preset)

mod ack;
mod ble;
mod client;
pub mod commands;
mod transport;

pub use ack::AckSlot;
pub use ble::BtleplugTransport;
pub use client::{ControlClient, SessionState};
pub use commands::{Command, CommandResponse, COMMAND_REQ_UUID, COMMAND_RSP_UUID};
pub use transport::{
    CharacteristicInfo, ControlLink, ControlTransport, DeviceHandle, Notification,
    NotificationStream,
};
