use std::process::Command;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use fleetwatch_inventory::Inventory;

use crate::{ExecOutcome, Executor};

const REMOTE_SCRIPT_PATH: &str = "/tmp/fleetwatch-post-install.sh";

/// Runs the post-install script over ssh. Credentials come from the
/// inventory adapter; the script itself is fetched on the device with a
/// bounded number of tries and a per-try timeout, then executed. Password
/// auth goes through `sshpass` (doctor verifies both binaries up front).
pub struct SshExecutor {
    inventory: Arc<dyn Inventory>,
    script_url: String,
    fetch_tries: u32,
    fetch_timeout_secs: u64,
    connect_timeout_secs: u64,
}

impl SshExecutor {
    pub fn new(
        inventory: Arc<dyn Inventory>,
        script_url: impl Into<String>,
        fetch_tries: u32,
        fetch_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Self {
        Self {
            inventory,
            script_url: script_url.into(),
            fetch_tries,
            fetch_timeout_secs,
            connect_timeout_secs,
        }
    }

    fn remote_command(&self) -> String {
        format!(
            "wget --tries={tries} --timeout={timeout} -q -O {path} '{url}' \
             && chmod +x {path} && {path}",
            tries = self.fetch_tries,
            timeout = self.fetch_timeout_secs,
            path = REMOTE_SCRIPT_PATH,
            url = self.script_url,
        )
    }
}

impl Executor for SshExecutor {
    fn run_post_install(&self, local_id: i64) -> Result<ExecOutcome> {
        // a flaky upstream API is an ordinary remote failure, same as a
        // refused connection on the device itself
        let credentials = match self.inventory.fetch_credentials(local_id) {
            Ok(credentials) => credentials,
            Err(err) => {
                return Ok(ExecOutcome::Failure(format!(
                    "credential lookup for device {local_id} failed: {err:#}"
                )));
            }
        };
        let Some(credentials) = credentials else {
            return Ok(ExecOutcome::Failure(format!(
                "device {local_id} exposes no root credentials"
            )));
        };

        info!(
            address = %credentials.ip_address,
            user = %credentials.username,
            "opening ssh session"
        );

        let output = Command::new("sshpass")
            .arg("-p")
            .arg(&credentials.password)
            .arg("ssh")
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg("-o")
            .arg("UserKnownHostsFile=/dev/null")
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout_secs))
            .arg(format!("{}@{}", credentials.username, credentials.ip_address))
            .arg(self.remote_command())
            .output()
            .with_context(|| format!("spawn ssh for device {local_id}"))?;

        if output.status.success() {
            Ok(ExecOutcome::Success)
        } else {
            Ok(ExecOutcome::Failure(format!(
                "ssh exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}
