use crate::classify::is_install_worthy;
use crate::model::{DeviceRecord, Transaction, TransactionStatus};
use crate::state::ClassState;

/// What a detection pass observed about one device. The shell turns these
/// into log lines; detection itself does no I/O.
#[derive(Clone, Debug)]
pub enum ChangeEvent {
    /// First run only: the device had an in-flight transaction and was
    /// adopted into the actionable set.
    Adopted { device: DeviceRecord },
    /// A global identifier never seen before.
    NewDevice { device: DeviceRecord, watched: bool },
    /// A tracked device started a different transaction.
    NewTransaction {
        device: DeviceRecord,
        prior: Transaction,
        watched: bool,
    },
    /// Same transaction, different status name.
    StatusChanged {
        device: DeviceRecord,
        prior_status: TransactionStatus,
        watched: bool,
    },
}

/// Fold a freshly fetched device batch into the prior per-class state.
///
/// Pure and total: the caller fetches, the caller persists. The batch must be
/// fully materialized (paginated upstream chunks are one logical batch).
///
/// Rules:
/// - no prior state: record everything; adopt devices whose transaction is
///   not yet COMPLETE into the actionable set. Adoption deliberately ignores
///   install-worthiness: on first run any in-flight work is watched, while
///   history that finished before we started is never reprocessed.
/// - unseen identifier: append to the snapshot; actionable iff the
///   transaction group is install-worthy, even if it already completed (the
///   result still needs processing exactly once).
/// - changed transaction id: replace the stored record; actionable iff
///   install-worthy.
/// - same id, changed status: update in place; actionable iff install-worthy.
/// - devices absent from the batch are left untouched; only dispatch ever
///   removes an actionable entry.
pub fn apply_batch(
    prior: Option<ClassState>,
    fetched: Vec<DeviceRecord>,
) -> (ClassState, Vec<ChangeEvent>) {
    let Some(mut state) = prior else {
        return first_run(fetched);
    };

    let mut events = Vec::new();
    for device in fetched {
        match state.position_of(&device.global_identifier) {
            None => {
                let watched = is_install_worthy(&device.last_transaction.group_name);
                if watched {
                    state.mark_actionable(device.clone());
                }
                events.push(ChangeEvent::NewDevice {
                    device: device.clone(),
                    watched,
                });
                state.devices.push(device);
            }
            Some(idx) => {
                let stored = &state.devices[idx];
                if stored.last_transaction.id != device.last_transaction.id {
                    let prior_txn = stored.last_transaction.clone();
                    let watched = is_install_worthy(&device.last_transaction.group_name);
                    state.devices[idx] = device.clone();
                    if watched {
                        state.mark_actionable(device.clone());
                    }
                    events.push(ChangeEvent::NewTransaction {
                        device,
                        prior: prior_txn,
                        watched,
                    });
                } else if stored.last_transaction.status != device.last_transaction.status {
                    let prior_status = stored.last_transaction.status.clone();
                    let watched = is_install_worthy(&device.last_transaction.group_name);
                    state.devices[idx] = device.clone();
                    if watched {
                        state.mark_actionable(device.clone());
                    }
                    events.push(ChangeEvent::StatusChanged {
                        device,
                        prior_status,
                        watched,
                    });
                }
            }
        }
    }
    (state, events)
}

fn first_run(fetched: Vec<DeviceRecord>) -> (ClassState, Vec<ChangeEvent>) {
    let mut state = ClassState::default();
    let mut events = Vec::new();
    for device in fetched {
        // first occurrence wins; identifiers stay unique in the snapshot
        if state.position_of(&device.global_identifier).is_some() {
            continue;
        }
        if !device.last_transaction.status.is_complete() {
            state.mark_actionable(device.clone());
            events.push(ChangeEvent::Adopted {
                device: device.clone(),
            });
        }
        state.devices.push(device);
    }
    (state, events)
}
