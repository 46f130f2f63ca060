use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use fleetwatch_core::DeviceClass;

pub const DEFAULT_CONFIG: &str = r#"[monitor]
# seconds between poll cycles
poll_rate = 300
monitor_hardware = true
monitor_virtual = true
db = "~/.fleetwatch/state.db"
# uncomment to log to a file instead of stderr
#log_location = "fleetwatch.log"

[api]
endpoint = "https://api.example.com/inventory"
username = "apiuser"
api_key = "changeme"
use_private_network = false

[post_install]
script_url = "https://example.com/post_install.sh"
fetch_tries = 3
fetch_timeout_secs = 60
connect_timeout_secs = 30
"#;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub api: ApiConfig,
    pub post_install: PostInstallConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MonitorConfig {
    pub poll_rate: u64,
    pub monitor_hardware: bool,
    pub monitor_virtual: bool,
    pub db: String,
    #[serde(default)]
    pub log_location: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub endpoint: String,
    pub username: String,
    pub api_key: String,
    #[serde(default)]
    pub use_private_network: bool,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PostInstallConfig {
    pub script_url: String,
    #[serde(default = "default_fetch_tries")]
    pub fetch_tries: u32,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_page_size() -> usize {
    500
}
fn default_fetch_tries() -> u32 {
    3
}
fn default_fetch_timeout() -> u64 {
    60
}
fn default_connect_timeout() -> u64 {
    30
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let cfg: Config =
            toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn write_default_to(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.monitor.poll_rate == 0 {
            bail!("monitor.poll_rate must be at least 1 second");
        }
        if !self.monitor.monitor_hardware && !self.monitor.monitor_virtual {
            bail!("at least one of monitor_hardware / monitor_virtual must be enabled");
        }
        Ok(())
    }

    pub fn enabled_classes(&self) -> Vec<DeviceClass> {
        let mut classes = Vec::new();
        if self.monitor.monitor_hardware {
            classes.push(DeviceClass::Hardware);
        }
        if self.monitor.monitor_virtual {
            classes.push(DeviceClass::Virtual);
        }
        classes
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.monitor.db).to_string())
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.monitor
            .log_location
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
    }
}
