use std::process::Command;

use anyhow::{Context, Result};

/// Verify required local tooling before the poll loop starts. The executor
/// shells out to `ssh` through `sshpass`, so both must be on PATH.
pub fn doctor() -> Result<()> {
    require_tool("ssh")?;
    require_tool("sshpass")?;
    Ok(())
}

fn require_tool(name: &str) -> Result<()> {
    Command::new(name)
        .arg("-V")
        .output()
        .with_context(|| format!("{name} not found on PATH"))?;
    Ok(())
}
