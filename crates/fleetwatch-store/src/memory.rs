use std::collections::HashMap;

use fleetwatch_core::{ClassState, DeviceClass};

use crate::traits::{StateStore, StoreError};

/// In-memory store for tests. Not durable, but it keeps the same
/// stage/commit visibility rules as the sqlite store.
#[derive(Default)]
pub struct InMemoryStore {
    committed: HashMap<DeviceClass, ClassState>,
    pending: HashMap<DeviceClass, ClassState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a crash between stage and commit.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }
}

impl StateStore for InMemoryStore {
    fn load(&self, class: DeviceClass) -> Result<Option<ClassState>, StoreError> {
        Ok(self.committed.get(&class).cloned())
    }

    fn stage(&mut self, class: DeviceClass, state: ClassState) {
        self.pending.insert(class, state);
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        for (class, state) in self.pending.drain() {
            self.committed.insert(class, state);
        }
        Ok(())
    }
}
