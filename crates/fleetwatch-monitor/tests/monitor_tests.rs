use std::sync::Arc;
use std::time::Duration;

use fleetwatch_core::{DeviceClass, DeviceRecord, GlobalId, Transaction, TransactionStatus};
use fleetwatch_exec::{ScriptedExecutor, SshExecutor};
use fleetwatch_inventory::{Inventory, StaticInventory};
use fleetwatch_monitor::Monitor;
use fleetwatch_store::InMemoryStore;

fn device(global: &str, local_id: i64, txn_id: i64, status: &str, group: &str) -> DeviceRecord {
    DeviceRecord {
        global_identifier: GlobalId::from_str(global),
        local_id,
        hostname: format!("host-{global}"),
        last_transaction: Transaction {
            id: txn_id,
            status: TransactionStatus::new(status),
            group_name: group.to_string(),
            create_date: None,
            status_change_date: None,
            elapsed_seconds: None,
        },
    }
}

fn harness() -> (Monitor, Arc<StaticInventory>, Arc<ScriptedExecutor>) {
    let inventory = Arc::new(StaticInventory::new());
    let executor = Arc::new(ScriptedExecutor::new());
    let monitor = Monitor::new(
        Box::new(InMemoryStore::new()),
        Arc::clone(&inventory) as Arc<dyn Inventory>,
        Box::new(Arc::clone(&executor)),
        vec![DeviceClass::Hardware, DeviceClass::Virtual],
        Duration::from_secs(1),
    );
    (monitor, inventory, executor)
}

#[test]
fn first_run_watches_in_flight_device_but_does_not_dispatch() {
    let (mut monitor, inventory, executor) = harness();
    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "ACTIVE_PROVISION", "OS Reload")],
    );

    monitor.run_cycle().unwrap();

    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert_eq!(state.devices.len(), 1);
    assert_eq!(state.actionable.len(), 1);
    // still provisioning: dispatch must not have touched it
    assert!(executor.calls().is_empty());
}

#[test]
fn completion_triggers_exactly_one_dispatch() {
    let (mut monitor, inventory, executor) = harness();
    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "ACTIVE_PROVISION", "OS Reload")],
    );
    monitor.run_cycle().unwrap();

    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "COMPLETE", "OS Reload")],
    );
    monitor.run_cycle().unwrap();

    assert_eq!(executor.calls(), vec![7]);
    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert!(state.actionable.is_empty());
    assert_eq!(state.devices.len(), 1);

    // unchanged upstream afterwards: nothing new to do
    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "COMPLETE", "OS Reload")],
    );
    monitor.run_cycle().unwrap();
    assert_eq!(executor.calls(), vec![7]);
}

#[test]
fn already_complete_install_worthy_new_device_is_dispatched_once() {
    let (mut monitor, inventory, executor) = harness();
    // establish prior state so g2 arrives as a *new* device, not first run
    inventory.push_batch(DeviceClass::Hardware, vec![]);
    monitor.run_cycle().unwrap();

    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g2", 8, 200, "COMPLETE", "New Provision")],
    );
    monitor.run_cycle().unwrap();

    assert_eq!(executor.calls(), vec![8]);
    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert!(state.actionable.is_empty());
}

#[test]
fn non_install_worthy_device_is_recorded_but_never_dispatched() {
    let (mut monitor, inventory, executor) = harness();
    inventory.push_batch(DeviceClass::Hardware, vec![]);
    monitor.run_cycle().unwrap();

    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g3", 9, 300, "COMPLETE", "Maintenance")],
    );
    monitor.run_cycle().unwrap();

    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert_eq!(state.devices.len(), 1);
    assert!(state.actionable.is_empty());
    assert!(executor.calls().is_empty());
}

#[test]
fn execution_failure_still_removes_device() {
    let (mut monitor, inventory, executor) = harness();
    executor.fail_device(7, "script exited 1");
    inventory.push_batch(DeviceClass::Hardware, vec![]);
    monitor.run_cycle().unwrap();

    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "COMPLETE", "OS Reload")],
    );
    monitor.run_cycle().unwrap();

    // attempted once, then dropped without retry
    assert_eq!(executor.calls(), vec![7]);
    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert!(state.actionable.is_empty());

    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "COMPLETE", "OS Reload")],
    );
    monitor.run_cycle().unwrap();
    assert_eq!(executor.calls(), vec![7]);
}

#[test]
fn fetch_failure_for_one_class_does_not_block_the_other() {
    let (mut monitor, inventory, executor) = harness();
    inventory.push_error(DeviceClass::Hardware, "upstream unreachable");
    inventory.push_batch(
        DeviceClass::Virtual,
        vec![device("v1", 11, 500, "COMPLETE", "New Provision")],
    );

    monitor.run_cycle().unwrap();

    // hardware never initialized; virtual went through its first run
    assert!(monitor.store.load(DeviceClass::Hardware).unwrap().is_none());
    let virt = monitor.store.load(DeviceClass::Virtual).unwrap().unwrap();
    assert_eq!(virt.devices.len(), 1);
    assert!(executor.calls().is_empty()); // first run adopted nothing (already complete)
}

#[test]
fn device_absent_from_fetch_stays_in_snapshot() {
    let (mut monitor, inventory, _) = harness();
    inventory.push_batch(
        DeviceClass::Hardware,
        vec![
            device("g1", 7, 100, "COMPLETE", "Maintenance"),
            device("g2", 8, 101, "COMPLETE", "Maintenance"),
        ],
    );
    monitor.run_cycle().unwrap();

    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "COMPLETE", "Maintenance")],
    );
    monitor.run_cycle().unwrap();

    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert_eq!(state.devices.len(), 2);
}

#[test]
fn new_transaction_on_tracked_device_rewatches_and_dispatches_when_complete() {
    let (mut monitor, inventory, executor) = harness();
    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "COMPLETE", "Maintenance")],
    );
    monitor.run_cycle().unwrap();
    assert!(executor.calls().is_empty());

    // new reload transaction appears, still running
    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 200, "ACTIVE_RELOAD", "OS Reload")],
    );
    monitor.run_cycle().unwrap();
    assert!(executor.calls().is_empty());
    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert_eq!(state.actionable.len(), 1);

    // reload finishes
    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 200, "COMPLETE", "OS Reload")],
    );
    monitor.run_cycle().unwrap();
    assert_eq!(executor.calls(), vec![7]);
}

#[test]
fn per_device_failure_is_isolated_from_the_rest_of_the_pass() {
    let (mut monitor, inventory, executor) = harness();
    executor.fail_device(7, "connection refused");
    inventory.push_batch(DeviceClass::Hardware, vec![]);
    monitor.run_cycle().unwrap();

    inventory.push_batch(
        DeviceClass::Hardware,
        vec![
            device("g1", 7, 100, "COMPLETE", "OS Reload"),
            device("g2", 8, 101, "COMPLETE", "OS Reload"),
        ],
    );
    monitor.run_cycle().unwrap();

    let mut calls = executor.calls();
    calls.sort_unstable();
    assert_eq!(calls, vec![7, 8]);
    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert!(state.actionable.is_empty());
}

#[test]
fn credential_lookup_failure_is_contained_within_the_pass() {
    let inventory = Arc::new(StaticInventory::new());
    // device 7: upstream API errors out; device 8: no root login exposed.
    // both are ordinary failures, neither may abort the pass
    inventory.fail_credentials(7, "connection refused");
    let executor = SshExecutor::new(
        Arc::clone(&inventory) as Arc<dyn Inventory>,
        "https://example.com/post_install.sh",
        3,
        60,
        30,
    );
    let mut monitor = Monitor::new(
        Box::new(InMemoryStore::new()),
        Arc::clone(&inventory) as Arc<dyn Inventory>,
        Box::new(executor),
        vec![DeviceClass::Hardware],
        Duration::from_secs(1),
    );

    inventory.push_batch(DeviceClass::Hardware, vec![]);
    monitor.run_cycle().unwrap();

    inventory.push_batch(
        DeviceClass::Hardware,
        vec![
            device("g1", 7, 100, "COMPLETE", "OS Reload"),
            device("g2", 8, 101, "COMPLETE", "OS Reload"),
        ],
    );
    monitor.run_cycle().unwrap();

    // both devices were attempted once and removed, committed state intact
    let state = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    assert!(state.actionable.is_empty());
    assert_eq!(state.devices.len(), 2);
}

#[test]
fn monitor_builds_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("fleetwatch.toml");
    fleetwatch_monitor::Config::write_default_to(&cfg_path).unwrap();
    let contents = std::fs::read_to_string(&cfg_path).unwrap().replace(
        "~/.fleetwatch/state.db",
        dir.path().join("state.db").to_str().unwrap(),
    );
    std::fs::write(&cfg_path, contents).unwrap();

    let cfg = fleetwatch_monitor::Config::load_from(&cfg_path).unwrap();
    let monitor = Monitor::from_config(&cfg).unwrap();
    assert_eq!(monitor.classes.len(), 2);
    assert_eq!(monitor.poll_rate, Duration::from_secs(300));
}

#[test]
fn classes_never_interact() {
    let (mut monitor, inventory, executor) = harness();
    inventory.push_batch(
        DeviceClass::Hardware,
        vec![device("g1", 7, 100, "ACTIVE", "OS Reload")],
    );
    inventory.push_batch(
        DeviceClass::Virtual,
        vec![device("g1", 70, 900, "ACTIVE", "OS Reload")],
    );
    monitor.run_cycle().unwrap();

    let hw = monitor.store.load(DeviceClass::Hardware).unwrap().unwrap();
    let virt = monitor.store.load(DeviceClass::Virtual).unwrap().unwrap();
    assert_eq!(hw.devices[0].local_id, 7);
    assert_eq!(virt.devices[0].local_id, 70);
    assert!(executor.calls().is_empty());
}
