//! Host wireless association
//!
//! Moves the host between the camera's access point and the home network,
//! and repairs a dropped association before media transfers.

mod associator;
mod manager;
mod networksetup;

pub use associator::{expect_empty_output, NetworkAssociator};
pub use manager::WifiManager;
pub use networksetup::NetworkSetup;
