use std::fmt;

use serde::{Deserialize, Serialize};

/// Monitored device classes. Each class keeps fully independent state:
/// its own snapshot table and its own actionable set.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Hardware,
    Virtual,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 2] = [DeviceClass::Hardware, DeviceClass::Virtual];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Hardware => "hardware",
            DeviceClass::Virtual => "virtual",
        }
    }

    pub fn from_str(s: &str) -> Option<DeviceClass> {
        match s {
            "hardware" => Some(DeviceClass::Hardware),
            "virtual" => Some(DeviceClass::Virtual),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
