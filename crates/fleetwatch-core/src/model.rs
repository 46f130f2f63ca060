use serde::{Deserialize, Serialize};

/// Stable device key, unique within a class and never reused by the upstream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalId(pub String);

impl GlobalId {
    pub fn from_str(s: impl Into<String>) -> Self {
        Self(s.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw upstream status name. `COMPLETE` is the only distinguished value;
/// everything else means the transaction is still in progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus(pub String);

impl TransactionStatus {
    pub const COMPLETE: &'static str = "COMPLETE";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
    pub fn is_complete(&self) -> bool {
        self.0 == Self::COMPLETE
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The most recent provisioning transaction observed for a device.
/// A changed `id` means a new transaction entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub status: TransactionStatus,
    pub group_name: String,
    #[serde(default)]
    pub create_date: Option<String>,
    #[serde(default)]
    pub status_change_date: Option<String>,
    #[serde(default)]
    pub elapsed_seconds: Option<i64>,
}

/// One monitored device as last observed from the upstream inventory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub global_identifier: GlobalId,
    /// Upstream-API-specific id, used only for credential/execution lookup.
    pub local_id: i64,
    pub hostname: String,
    pub last_transaction: Transaction,
}
