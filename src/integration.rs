//! Integration lifecycle: config entries in, window sensors out.
//!
//! Keeps one [`ExtendedWindowSensor`] per config entry, and handles setting
//! entries up, unloading them, and applying changed options.

use crate::config::WindowConfig;
use crate::error::{Result, WindowError};
use crate::host::Host;
use crate::window::{ExtendedWindowSensor, StatusListener};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A validated, accepted window configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub entry_id: String,
    /// Device display name at the time the entry was created.
    pub title: String,
    pub data: WindowConfig,
}

impl ConfigEntry {
    /// Validate `data` against the host and accept it as an entry.
    ///
    /// The device name is captured now, so later renames of the device don't
    /// move the entity id.
    pub fn create(entry_id: impl Into<String>, mut data: WindowConfig, host: &Host) -> Result<Self> {
        let (_, device) = data.validate(&host.devices)?;
        let title = data
            .device_name
            .get_or_insert_with(|| device.display_name().to_string())
            .clone();
        Ok(Self {
            entry_id: entry_id.into(),
            title,
            data,
        })
    }
}

/// Owns the window sensors of all loaded config entries.
pub struct Integration {
    host: Host,
    sensors: RwLock<HashMap<String, (ConfigEntry, Arc<ExtendedWindowSensor>)>>,
    listeners: RwLock<Vec<Arc<dyn StatusListener>>>,
    next_entry_id: AtomicU64,
}

impl Integration {
    pub fn new(host: Host) -> Self {
        debug!("Setting up Extended window status");
        Self {
            host,
            sensors: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            next_entry_id: AtomicU64::new(1),
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Observer attached to every sensor set up from now on.
    pub fn add_listener(&self, listener: Arc<dyn StatusListener>) {
        self.listeners.write().push(listener);
    }

    /// Validate `data` and set up a new window sensor for it.
    pub fn setup_entry(&self, data: WindowConfig) -> Result<Arc<ExtendedWindowSensor>> {
        let entry_id = format!("entry_{}", self.next_entry_id.fetch_add(1, Ordering::SeqCst));
        let entry = ConfigEntry::create(entry_id, data, &self.host)?;
        self.load_entry(entry)
    }

    /// Set up a sensor for an already accepted entry.
    pub fn load_entry(&self, entry: ConfigEntry) -> Result<Arc<ExtendedWindowSensor>> {
        debug!("Setting up config entry: {}", entry.entry_id);
        let sensor = ExtendedWindowSensor::from_entry(&self.host, &entry)?;
        let title = entry.title.clone();

        // Claim the entry id under one write lock so two loads can't both win
        match self.sensors.write().entry(entry.entry_id.clone()) {
            Entry::Occupied(_) => return Err(WindowError::EntryAlreadyLoaded(entry.entry_id)),
            Entry::Vacant(slot) => {
                slot.insert((entry, sensor.clone()));
            }
        }

        for listener in self.listeners.read().iter() {
            sensor.add_listener(listener.clone());
        }
        let status = sensor.added_to_host();
        info!(
            "Added extended window sensor {} for {}, initial state: {}",
            sensor.entity_id(),
            title,
            status
        );
        Ok(sensor)
    }

    /// Remove the sensor of an entry.
    pub fn unload_entry(&self, entry_id: &str) -> Result<ConfigEntry> {
        let (entry, sensor) = self
            .sensors
            .write()
            .remove(entry_id)
            .ok_or_else(|| WindowError::EntryNotFound(entry_id.to_string()))?;
        sensor.will_remove_from_host();
        info!("Unloaded config entry {} ({})", entry_id, sensor.entity_id());
        Ok(entry)
    }

    /// Apply new options to an entry: validate, then reload its sensor.
    ///
    /// The old sensor stays in place when the new data is invalid. The old
    /// sensor's registration is dropped, so the reloaded sensor can take over
    /// its entity id even when the unique id changed.
    pub fn update_entry(&self, entry_id: &str, data: WindowConfig) -> Result<Arc<ExtendedWindowSensor>> {
        let old_unique_id = self
            .sensor(entry_id)
            .map(|sensor| sensor.unique_id().to_string())
            .ok_or_else(|| WindowError::EntryNotFound(entry_id.to_string()))?;
        let entry = ConfigEntry::create(entry_id, data, &self.host)?;
        debug!("Updating options for {}", entry.title);
        self.unload_entry(entry_id)?;
        self.host.entities.remove(&old_unique_id);
        self.load_entry(entry)
    }

    pub fn entry(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.sensors.read().get(entry_id).map(|(e, _)| e.clone())
    }

    pub fn sensor(&self, entry_id: &str) -> Option<Arc<ExtendedWindowSensor>> {
        self.sensors.read().get(entry_id).map(|(_, s)| s.clone())
    }

    /// All loaded sensors, ordered by entity id.
    pub fn sensors(&self) -> Vec<Arc<ExtendedWindowSensor>> {
        let mut sensors: Vec<_> = self.sensors.read().values().map(|(_, s)| s.clone()).collect();
        sensors.sort_by(|a, b| a.entity_id().cmp(b.entity_id()));
        sensors
    }

    /// Unload every entry.
    pub fn shutdown(&self) {
        let entry_ids: Vec<String> = self.sensors.read().keys().cloned().collect();
        for entry_id in entry_ids {
            let _ = self.unload_entry(&entry_id);
        }
    }
}
