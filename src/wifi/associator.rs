use crate::error::{Result, SyncError};

/// OS capability that joins the host to a wireless network
///
/// The implementation owns the success criterion of its OS utility, so it
/// can be swapped without touching orchestration logic.
#[async_trait::async_trait]
pub trait NetworkAssociator: Send + Sync {
    /// Join `ssid` on `interface`; `Err(SyncError::Association)` on failure
    async fn associate(&self, interface: &str, ssid: &str, passphrase: &str) -> Result<()>;

    /// Network the interface is currently on, if any
    async fn current_network(&self, interface: &str) -> Result<Option<String>>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Success criterion of utilities that are silent on success
pub fn expect_empty_output(command: &str, output: &str) -> Result<()> {
    let output = output.trim();
    if output.is_empty() {
        Ok(())
    } else {
        Err(SyncError::Association {
            command: command.to_string(),
            output: output.to_string(),
        })
    }
}
