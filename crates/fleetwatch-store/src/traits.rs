use thiserror::Error;

use fleetwatch_core::{ClassState, DeviceClass};

/// Store failures are fatal to the monitor: without a readable view of
/// already-seen devices it cannot avoid reprocessing or silently skipping.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store backend error: {0}")]
    Backend(String),
    #[error("state store corrupt: {0}")]
    Corrupt(String),
}

/// Durable per-class state with an explicit commit point.
///
/// Discipline per class per cycle: `load`, mutate in memory, `stage` the full
/// state back, `commit`. Staged writes are invisible until `commit` returns;
/// a crash in between leaves the store exactly as it was before the cycle.
/// `load` distinguishes "class never committed" (`None`) from a committed but
/// empty state, so the first-run adoption rule fires exactly once.
pub trait StateStore {
    fn load(&self, class: DeviceClass) -> Result<Option<ClassState>, StoreError>;

    fn stage(&mut self, class: DeviceClass, state: ClassState);

    fn commit(&mut self) -> Result<(), StoreError>;
}
