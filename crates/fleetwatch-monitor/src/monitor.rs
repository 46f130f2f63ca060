use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use fleetwatch_core::{apply_batch, ChangeEvent, DeviceClass};
use fleetwatch_exec::{ExecOutcome, Executor, SshExecutor};
use fleetwatch_inventory::{HttpInventory, Inventory};
use fleetwatch_store::StateStore;
use fleetwatch_store_sqlite::SqliteStore;

use crate::Config;

/// Wires the adapters to the change detector and dispatcher and drives them
/// on a fixed interval. One instance owns the store; a single logical thread
/// runs the whole cycle, so no locking beyond the store's commit point.
pub struct Monitor {
    pub store: Box<dyn StateStore>,
    pub inventory: Arc<dyn Inventory>,
    pub executor: Box<dyn Executor>,
    pub classes: Vec<DeviceClass>,
    pub poll_rate: Duration,
}

impl Monitor {
    pub fn new(
        store: Box<dyn StateStore>,
        inventory: Arc<dyn Inventory>,
        executor: Box<dyn Executor>,
        classes: Vec<DeviceClass>,
        poll_rate: Duration,
    ) -> Self {
        Self {
            store,
            inventory,
            executor,
            classes,
            poll_rate,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let store = SqliteStore::open(&cfg.db_path())?;
        let inventory: Arc<dyn Inventory> = Arc::new(HttpInventory::new(
            cfg.api.endpoint.clone(),
            cfg.api.username.clone(),
            cfg.api.api_key.clone(),
            cfg.api.use_private_network,
            cfg.api.page_size,
        ));
        let executor = SshExecutor::new(
            Arc::clone(&inventory),
            cfg.post_install.script_url.clone(),
            cfg.post_install.fetch_tries,
            cfg.post_install.fetch_timeout_secs,
            cfg.post_install.connect_timeout_secs,
        );
        Ok(Self::new(
            Box::new(store),
            inventory,
            Box::new(executor),
            cfg.enabled_classes(),
            Duration::from_secs(cfg.monitor.poll_rate),
        ))
    }

    /// One detection pass for a class: fetch the full batch, fold it into
    /// stored state, commit snapshot and actionable set together. A fetch
    /// error skips the class for this cycle and keeps prior state untouched.
    pub fn detect(&mut self, class: DeviceClass) -> Result<()> {
        debug!(%class, "checking for changes");
        let fetched = match self.inventory.fetch_devices(class) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(%class, error = %format!("{err:#}"), "inventory fetch failed, keeping prior state this cycle");
                return Ok(());
            }
        };

        let prior = self.store.load(class)?;
        if prior.is_none() {
            info!(%class, devices = fetched.len(), "first run, recording all devices");
        }
        let (state, events) = apply_batch(prior, fetched);
        for event in &events {
            log_event(class, event);
        }
        self.store.stage(class, state);
        self.store.commit()?;
        Ok(())
    }

    /// One dispatch pass for a class. Devices still provisioning are left in
    /// the actionable set; everything else is attempted exactly once and
    /// removed, success or not. The set is committed once after the pass.
    pub fn dispatch(&mut self, class: DeviceClass) -> Result<()> {
        let Some(mut state) = self.store.load(class)? else {
            return Ok(());
        };
        if state.actionable.is_empty() {
            return Ok(());
        }

        let pending: Vec<_> = state.actionable.values().cloned().collect();
        for device in pending {
            let global = device.global_identifier.as_str();
            if !device.last_transaction.status.is_complete() {
                info!(
                    %class,
                    hostname = %device.hostname,
                    global,
                    status = device.last_transaction.status.as_str(),
                    "skipping device, transaction still active"
                );
                continue;
            }

            info!(%class, hostname = %device.hostname, global, "running post-install script");
            match self.executor.run_post_install(device.local_id)? {
                ExecOutcome::Success => {
                    info!(%class, hostname = %device.hostname, global, "post-install succeeded");
                }
                ExecOutcome::Failure(reason) => {
                    // at-most-once: a failed run is not retried automatically,
                    // a new transaction has to re-trigger watching
                    error!(
                        %class,
                        hostname = %device.hostname,
                        global,
                        %reason,
                        "post-install failed, device will not be retried"
                    );
                }
            }
            state.actionable.remove(global);
        }

        self.store.stage(class, state);
        self.store.commit()?;
        Ok(())
    }

    pub fn run_cycle(&mut self) -> Result<()> {
        for class in self.classes.clone() {
            self.detect(class)?;
        }
        for class in self.classes.clone() {
            self.dispatch(class)?;
        }
        Ok(())
    }

    /// Detect, dispatch, sleep, forever. Termination is by process signal.
    pub fn run_forever(&mut self) -> Result<()> {
        info!("starting poll loop");
        loop {
            self.run_cycle()?;
            debug!(seconds = self.poll_rate.as_secs(), "sleeping");
            thread::sleep(self.poll_rate);
        }
    }
}

fn log_event(class: DeviceClass, event: &ChangeEvent) {
    match event {
        ChangeEvent::Adopted { device } => info!(
            %class,
            hostname = %device.hostname,
            global = device.global_identifier.as_str(),
            "adopting device with in-flight transaction"
        ),
        ChangeEvent::NewDevice { device, watched } => info!(
            %class,
            hostname = %device.hostname,
            global = device.global_identifier.as_str(),
            watched,
            "new device"
        ),
        ChangeEvent::NewTransaction {
            device,
            prior,
            watched,
        } => info!(
            %class,
            hostname = %device.hostname,
            global = device.global_identifier.as_str(),
            from_group = %prior.group_name,
            from_id = prior.id,
            to_group = %device.last_transaction.group_name,
            to_id = device.last_transaction.id,
            watched,
            "device has a new transaction"
        ),
        ChangeEvent::StatusChanged {
            device,
            prior_status,
            watched,
        } => info!(
            %class,
            hostname = %device.hostname,
            global = device.global_identifier.as_str(),
            from = prior_status.as_str(),
            to = device.last_transaction.status.as_str(),
            watched,
            "device transaction status changed"
        ),
    }
}
