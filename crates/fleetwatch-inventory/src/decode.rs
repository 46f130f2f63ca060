//! Decoding boundary between the upstream API's loosely-typed JSON and the
//! typed core model. Records missing a global identifier or a last
//! transaction are dropped here; the core never sees them.

use serde_json::Value;
use tracing::debug;

use fleetwatch_core::{DeviceRecord, GlobalId, Transaction, TransactionStatus};

use crate::Credentials;

pub fn decode_device(value: &Value) -> Option<DeviceRecord> {
    let global = value.get("globalIdentifier")?.as_str()?;
    let local_id = value.get("id")?.as_i64()?;
    let hostname = value
        .get("hostname")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let txn = value.get("lastTransaction")?;
    let last_transaction = Transaction {
        id: txn.get("id")?.as_i64()?,
        status: TransactionStatus::new(txn.pointer("/transactionStatus/name")?.as_str()?),
        group_name: txn
            .pointer("/transactionGroup/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        create_date: txn
            .get("createDate")
            .and_then(Value::as_str)
            .map(str::to_string),
        status_change_date: txn
            .get("statusChangeDate")
            .and_then(Value::as_str)
            .map(str::to_string),
        elapsed_seconds: txn.get("elapsedSeconds").and_then(Value::as_i64),
    };

    Some(DeviceRecord {
        global_identifier: GlobalId::from_str(global),
        local_id,
        hostname,
        last_transaction,
    })
}

pub fn decode_batch(values: &[Value]) -> Vec<DeviceRecord> {
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match decode_device(value) {
            Some(record) => records.push(record),
            None => debug!("dropping inventory entry without identifier or transaction"),
        }
    }
    records
}

pub fn decode_credentials(value: &Value, use_private_network: bool) -> Option<Credentials> {
    let passwords = value.pointer("/operatingSystem/passwords")?.as_array()?;
    let root = passwords
        .iter()
        .find(|p| p.get("username").and_then(Value::as_str) == Some("root"))?;

    let address_key = if use_private_network {
        "primaryBackendIpAddress"
    } else {
        "primaryIpAddress"
    };

    Some(Credentials {
        username: "root".to_string(),
        password: root.get("password")?.as_str()?.to_string(),
        ip_address: value.get(address_key)?.as_str()?.to_string(),
    })
}
