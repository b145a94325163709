//! End-to-end sync workflow
//!
//! 1. Open the control session
//! 2. Shutter off
//! 3. Companion wifi on
//! 4. Join the camera's access point
//! 5. Download then delete every file
//! 6. Rejoin the home network
//! 7. Companion wifi off
//! 8. Load the timelapse preset
//! 9. Shutter on
//!
//! Step 5 uses each listing entry's own DCIM directory
//! (`MediaClient::download_from` / `delete_from`), not the configured
//! `media.media_dir` that `MediaClient::download` / `delete` default to.
//! Files outside that directory are drained too.

mod report;
mod workflow;

pub use report::RunReport;
pub use workflow::{Collaborators, Orchestrator};
