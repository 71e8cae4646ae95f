//! Device registry.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Fallback shown when a device has neither a user-given nor a default name.
pub const UNNAMED_DEVICE: &str = "Unnamed Device";

/// A physical device known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_by_user: Option<String>,
    /// Integration-specific identifiers, e.g. `("zha", "00:11:22")`.
    #[serde(default)]
    pub identifiers: BTreeSet<(String, String)>,
}

impl DeviceEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            name_by_user: None,
            identifiers: BTreeSet::new(),
        }
    }

    pub fn with_name_by_user(mut self, name: impl Into<String>) -> Self {
        self.name_by_user = Some(name.into());
        self
    }

    pub fn with_identifier(mut self, domain: impl Into<String>, id: impl Into<String>) -> Self {
        self.identifiers.insert((domain.into(), id.into()));
        self
    }

    /// Name to show for the device: the user's name, else the default one.
    pub fn display_name(&self) -> &str {
        self.name_by_user
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or(UNNAMED_DEVICE)
    }
}

#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, DeviceEntry>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a device.
    pub fn register(&self, device: DeviceEntry) {
        self.devices.write().insert(device.id.clone(), device);
    }

    pub fn get(&self, device_id: &str) -> Option<DeviceEntry> {
        self.devices.read().get(device_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}
