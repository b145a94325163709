//! Command opcodes and characteristics of the camera's BLE control service
//!
//! Reference: https://gopro.github.io/OpenGoPro/ble_2_0#commands-quick-reference

use uuid::Uuid;

/// Command request characteristic (write)
pub const COMMAND_REQ_UUID: Uuid = Uuid::from_u128(0xb5f90072_aa8d_11e3_9046_0002a5d5c51b);

/// Command response characteristic (notify)
pub const COMMAND_RSP_UUID: Uuid = Uuid::from_u128(0xb5f90073_aa8d_11e3_9046_0002a5d5c51b);

/// A command payload plus the description used in logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub payload: Vec<u8>,
    pub description: String,
}

impl Command {
    pub fn new(payload: Vec<u8>, description: impl Into<String>) -> Self {
        Self {
            payload,
            description: description.into(),
        }
    }

    /// Load the timelapse preset (preset group 0x03EA)
    pub fn load_timelapse_preset() -> Self {
        Self::new(vec![0x04, 0x3E, 0x02, 0x03, 0xEA], "Loading timelapse preset")
    }

    /// Start or stop recording
    pub fn set_shutter(on: bool) -> Self {
        Self::new(
            vec![0x03, 0x01, 0x01, u8::from(on)],
            format!("Control shutter: {}", on_off(on)),
        )
    }

    /// Enable or disable the camera's own access point
    pub fn set_companion_wifi(on: bool) -> Self {
        Self::new(
            vec![0x03, 0x17, 0x01, u8::from(on)],
            format!("Control wifi: {}", on_off(on)),
        )
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

/// Decoded command response: `[len, command id, status, ...]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResponse {
    pub command_id: u8,
    pub status: u8,
}

impl CommandResponse {
    pub fn parse(data: &[u8]) -> Option<Self> {
        match data {
            [_len, command_id, status, ..] => Some(Self {
                command_id: *command_id,
                status: *status,
            }),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Command id of a request payload: `[len, command id, ...]`
pub fn request_id(payload: &[u8]) -> Option<u8> {
    payload.get(1).copied()
}

/// `01:02:ff` style rendering for logs
pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}
