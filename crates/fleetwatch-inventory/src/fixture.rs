use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use fleetwatch_core::{DeviceClass, DeviceRecord};

use crate::{Credentials, Inventory};

/// Scripted inventory for tests: queues one batch (or fetch error) per call,
/// per class. An exhausted queue yields empty batches.
#[derive(Default)]
pub struct StaticInventory {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    batches: HashMap<DeviceClass, VecDeque<Result<Vec<DeviceRecord>, String>>>,
    credentials: HashMap<i64, Credentials>,
    credential_errors: HashMap<i64, String>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&self, class: DeviceClass, devices: Vec<DeviceRecord>) {
        let mut inner = self.inner.lock().unwrap();
        inner.batches.entry(class).or_default().push_back(Ok(devices));
    }

    pub fn push_error(&self, class: DeviceClass, message: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .batches
            .entry(class)
            .or_default()
            .push_back(Err(message.into()));
    }

    pub fn set_credentials(&self, local_id: i64, credentials: Credentials) {
        let mut inner = self.inner.lock().unwrap();
        inner.credentials.insert(local_id, credentials);
    }

    pub fn fail_credentials(&self, local_id: i64, message: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.credential_errors.insert(local_id, message.into());
    }
}

impl Inventory for StaticInventory {
    fn fetch_devices(&self, class: DeviceClass) -> Result<Vec<DeviceRecord>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.batches.get_mut(&class).and_then(VecDeque::pop_front) {
            Some(Ok(devices)) => Ok(devices),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }

    fn fetch_credentials(&self, local_id: i64) -> Result<Option<Credentials>> {
        let inner = self.inner.lock().unwrap();
        if let Some(message) = inner.credential_errors.get(&local_id) {
            return Err(anyhow!(message.clone()));
        }
        Ok(inner.credentials.get(&local_id).cloned())
    }
}
