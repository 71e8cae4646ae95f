//! Entity registry: maps stable unique ids to user-visible entity ids.

use crate::error::{Result, WindowError};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A registered entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub entity_id: String,
    pub unique_id: String,
    pub platform: String,
    pub device_id: Option<String>,
}

#[derive(Default)]
pub struct EntityRegistry {
    /// Keyed by unique_id.
    entries: RwLock<HashMap<String, RegistryEntry>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for `unique_id`, registering it if needed.
    ///
    /// New entries get `<domain>.<suggested_object_id>`, suffixed with `_2`,
    /// `_3`, ... when that id is already taken by another entity.
    pub fn get_or_create(
        &self,
        domain: &str,
        platform: &str,
        unique_id: &str,
        suggested_object_id: &str,
        device_id: Option<&str>,
    ) -> RegistryEntry {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(unique_id) {
            return existing.clone();
        }

        let base = format!("{}.{}", domain, suggested_object_id);
        let mut entity_id = base.clone();
        let mut suffix = 2;
        while entries.values().any(|e| e.entity_id == entity_id) {
            entity_id = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        let entry = RegistryEntry {
            entity_id,
            unique_id: unique_id.to_string(),
            platform: platform.to_string(),
            device_id: device_id.map(str::to_string),
        };
        debug!("Registered {} as {}", unique_id, entry.entity_id);
        entries.insert(unique_id.to_string(), entry.clone());
        entry
    }

    /// Rename a registered entity.
    pub fn update_entity_id(&self, entity_id: &str, new_entity_id: &str) -> Result<RegistryEntry> {
        let mut entries = self.entries.write();
        if entity_id != new_entity_id && entries.values().any(|e| e.entity_id == new_entity_id) {
            return Err(WindowError::EntityIdTaken(new_entity_id.to_string()));
        }
        let entry = entries
            .values_mut()
            .find(|e| e.entity_id == entity_id)
            .ok_or_else(|| WindowError::EntityNotRegistered(entity_id.to_string()))?;
        entry.entity_id = new_entity_id.to_string();
        Ok(entry.clone())
    }

    /// Drop the registration for `unique_id`, freeing its entity id.
    pub fn remove(&self, unique_id: &str) -> Option<RegistryEntry> {
        let removed = self.entries.write().remove(unique_id);
        if let Some(entry) = &removed {
            debug!("Removed registration {} ({})", unique_id, entry.entity_id);
        }
        removed
    }

    pub fn get_by_entity_id(&self, entity_id: &str) -> Option<RegistryEntry> {
        self.entries
            .read()
            .values()
            .find(|e| e.entity_id == entity_id)
            .cloned()
    }

    pub fn get_by_unique_id(&self, unique_id: &str) -> Option<RegistryEntry> {
        self.entries.read().get(unique_id).cloned()
    }
}
