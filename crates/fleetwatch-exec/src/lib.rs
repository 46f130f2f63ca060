pub mod scripted;
pub mod ssh;

pub use scripted::ScriptedExecutor;
pub use ssh::SshExecutor;

use std::sync::Arc;

use anyhow::Result;

/// Outcome of one post-install attempt. Ordinary remote failures (network,
/// auth, non-zero script exit) fold into `Failure`; only conditions the
/// adapter cannot account for surface as `Err` and abort the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecOutcome {
    Success,
    Failure(String),
}

/// Opens a remote session to a device and runs the post-install sequence.
pub trait Executor {
    fn run_post_install(&self, local_id: i64) -> Result<ExecOutcome>;
}

impl<T: Executor + ?Sized> Executor for Arc<T> {
    fn run_post_install(&self, local_id: i64) -> Result<ExecOutcome> {
        (**self).run_post_install(local_id)
    }
}
