use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{DeviceRecord, GlobalId};

/// Persisted per-class state: the snapshot table of all known devices plus
/// the actionable set of devices awaiting post-install dispatch.
///
/// Snapshot order is insertion order; it only matters for index-based lookup
/// within a single detection pass. The actionable set is keyed by global
/// identifier; BTreeMap keeps iteration deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassState {
    pub devices: Vec<DeviceRecord>,
    pub actionable: BTreeMap<String, DeviceRecord>,
}

impl ClassState {
    pub fn position_of(&self, id: &GlobalId) -> Option<usize> {
        self.devices.iter().position(|d| &d.global_identifier == id)
    }

    pub fn is_actionable(&self, id: &GlobalId) -> bool {
        self.actionable.contains_key(id.as_str())
    }

    pub fn mark_actionable(&mut self, device: DeviceRecord) {
        self.actionable
            .insert(device.global_identifier.as_str().to_string(), device);
    }
}
