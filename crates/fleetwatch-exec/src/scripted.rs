use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

use crate::{ExecOutcome, Executor};

/// Test executor: records every invocation, succeeds unless told otherwise.
#[derive(Default)]
pub struct ScriptedExecutor {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    failures: HashMap<i64, String>,
    calls: Vec<i64>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_device(&self, local_id: i64, reason: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.insert(local_id, reason.into());
    }

    pub fn calls(&self) -> Vec<i64> {
        self.inner.lock().unwrap().calls.clone()
    }
}

impl Executor for ScriptedExecutor {
    fn run_post_install(&self, local_id: i64) -> Result<ExecOutcome> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(local_id);
        Ok(match inner.failures.get(&local_id) {
            Some(reason) => ExecOutcome::Failure(reason.clone()),
            None => ExecOutcome::Success,
        })
    }
}
