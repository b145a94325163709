// macOS association via `networksetup`
//
// ref: https://michaelsoolee.com/switch-wifi-macos-terminal/

use super::associator::{expect_empty_output, NetworkAssociator};
use crate::error::{Result, SyncError};
use tokio::process::Command;
use tracing::debug;

const CURRENT_NETWORK_PREFIX: &str = "Current Wi-Fi Network:";

/// [`NetworkAssociator`] backed by `networksetup -setairportnetwork`
pub struct NetworkSetup {
    program: String,
}

impl NetworkSetup {
    /// `program` should be absolute: cron only has /usr/bin:/bin on PATH
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run and return stdout and stderr together, like a shell would print them
    async fn output(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program).args(args).output().await?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!("{} {} -> {:?} ({})", self.program, args[0], text.trim(), output.status);
        Ok(text)
    }
}

#[async_trait::async_trait]
impl NetworkAssociator for NetworkSetup {
    async fn associate(&self, interface: &str, ssid: &str, passphrase: &str) -> Result<()> {
        let output = self
            .output(&["-setairportnetwork", interface, ssid, passphrase])
            .await?;

        // Never echo the passphrase into errors or logs.
        let command = format!("{} -setairportnetwork {} \"{}\" ***", self.program, interface, ssid);
        expect_empty_output(&command, &output)
    }

    async fn current_network(&self, interface: &str) -> Result<Option<String>> {
        let output = self.output(&["-getairportnetwork", interface]).await?;
        parse_current_network(&output).map_err(|unexpected| SyncError::Association {
            command: format!("{} -getairportnetwork {}", self.program, interface),
            output: unexpected,
        })
    }

    fn name(&self) -> &str {
        "networksetup"
    }
}

/// `Ok(Some(ssid))` when associated, `Ok(None)` when not, `Err(output)` otherwise
fn parse_current_network(output: &str) -> std::result::Result<Option<String>, String> {
    let output = output.trim();
    if let Some(ssid) = output.strip_prefix(CURRENT_NETWORK_PREFIX) {
        let ssid = ssid.trim();
        return Ok((!ssid.is_empty()).then(|| ssid.to_string()));
    }
    if output.starts_with("You are not associated") {
        return Ok(None);
    }
    Err(output.to_string())
}
