pub mod decode;
pub mod fixture;
pub mod http;

pub use fixture::StaticInventory;
pub use http::HttpInventory;

use anyhow::Result;
use fleetwatch_core::{DeviceClass, DeviceRecord};

/// Remote login details for a device, resolved through the upstream API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub ip_address: String,
}

/// Upstream device-inventory API, one logical batch per call.
///
/// `fetch_devices` must yield only records carrying a global identifier;
/// anything else is dropped inside the adapter and never reaches the core.
/// Errors are transient from the monitor's point of view: the cycle for that
/// class is skipped and retried next poll.
pub trait Inventory {
    fn fetch_devices(&self, class: DeviceClass) -> Result<Vec<DeviceRecord>>;

    /// Root login for a device, or `None` when the upstream exposes none.
    fn fetch_credentials(&self, local_id: i64) -> Result<Option<Credentials>>;
}
