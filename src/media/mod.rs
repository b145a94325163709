//! Media transfer over the camera's access point
//!
//! - GET /gopro/media/list - list every file by directory
//! - GET /videos/DCIM/<dir>/<file> - raw file bytes
//! - GET /gp/gpControl/command/storage/delete?p=<dir>/<file> - delete one file
//! - GET /gp/gpControl/command/storage/delete/all - delete everything

mod client;
pub mod messages;
mod transport;

pub use client::MediaClient;
pub use messages::{MediaDirectory, MediaEntry, MediaFile, MediaListing};
pub use transport::{ByteStream, HttpMediaTransport, MediaTransport};
