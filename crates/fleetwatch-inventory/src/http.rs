use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;

use fleetwatch_core::{DeviceClass, DeviceRecord};

use crate::decode::{decode_batch, decode_credentials};
use crate::{Credentials, Inventory};

/// Inventory adapter over the upstream HTTP API. Device listings are
/// paginated server-side; `fetch_devices` drains every page so detection
/// always compares against one complete logical batch.
pub struct HttpInventory {
    client: Client,
    endpoint: String,
    username: String,
    api_key: String,
    use_private_network: bool,
    page_size: usize,
}

impl HttpInventory {
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        api_key: impl Into<String>,
        use_private_network: bool,
        page_size: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            username: username.into(),
            api_key: api_key.into(),
            use_private_network,
            page_size,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn class_path(class: DeviceClass) -> &'static str {
        match class {
            DeviceClass::Hardware => "hardware",
            DeviceClass::Virtual => "virtual-guests",
        }
    }

    fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        self.client
            .get(url)
            .basic_auth(&self.username, Some(&self.api_key))
            .query(query)
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?
            .json()
            .with_context(|| format!("decode response body from {url}"))
    }
}

impl Inventory for HttpInventory {
    fn fetch_devices(&self, class: DeviceClass) -> Result<Vec<DeviceRecord>> {
        let url = self.url(Self::class_path(class));
        let mut records = Vec::new();
        let mut offset = 0usize;
        loop {
            let page = self.get_json(
                &url,
                &[
                    ("limit", self.page_size.to_string()),
                    ("offset", offset.to_string()),
                ],
            )?;
            let entries = page
                .as_array()
                .with_context(|| format!("expected a JSON array from {url}"))?;
            records.extend(decode_batch(entries));
            if entries.len() < self.page_size {
                return Ok(records);
            }
            offset += entries.len();
        }
    }

    fn fetch_credentials(&self, local_id: i64) -> Result<Option<Credentials>> {
        let url = self.url(&format!("device/{local_id}/access"));
        let value = self.get_json(&url, &[])?;
        Ok(decode_credentials(&value, self.use_private_network))
    }
}
