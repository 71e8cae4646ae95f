//! Derived window status entity.
//!
//! Tracks the window's primary and secondary input entities in the host's
//! state registry and re-evaluates the status whenever either changes. Each
//! evaluation is independent: the status is computed from the readings at
//! that moment, never advanced from the previous status.

use super::{DOMAIN, ICON, StatusListener, StatusUpdate};
use crate::error::Result;
use crate::host::{Host, StateRegistry, Subscription};
use crate::integration::ConfigEntry;
use crate::status::{Mode, WindowStatus};
use chrono::Utc;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Weak};

/// Object id derived from a device name: lower-cased, anything other than
/// ASCII letters, digits and whitespace dropped, spaces turned into `_`.
pub fn object_id_for(device_name: &str) -> String {
    let cleaned: String = device_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    format!("{}_extended_window", cleaned.replace(' ', "_"))
}

/// Stable unique id for a window built from the given inputs.
pub fn unique_id_for(base_entity: &str, second_entity: &str, mode: &Mode) -> String {
    format!("{}_{}_{}_{}", DOMAIN, base_entity, second_entity, mode.kind())
}

/// Extended window status sensor for one configured window.
pub struct ExtendedWindowSensor {
    entity_id: String,
    unique_id: String,
    name: String,
    device_id: String,
    device_identifiers: BTreeSet<(String, String)>,
    base_entity: String,
    second_entity: String,
    mode: Mode,
    states: Arc<StateRegistry>,
    status: RwLock<WindowStatus>,
    listeners: RwLock<Vec<Arc<dyn StatusListener>>>,
    subscriptions: Mutex<Vec<Subscription>>,
    /// Serializes evaluations so the published state matches `status`.
    update_lock: Mutex<()>,
}

impl fmt::Debug for ExtendedWindowSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedWindowSensor")
            .field("entity_id", &self.entity_id)
            .field("unique_id", &self.unique_id)
            .field("base_entity", &self.base_entity)
            .field("second_entity", &self.second_entity)
            .field("mode", &self.mode)
            .field("status", &self.status())
            .finish()
    }
}

impl ExtendedWindowSensor {
    /// Build the sensor for a config entry and claim its entity id.
    ///
    /// The entity is linked to the window's device. If the entity registry
    /// already knows it under another id, it is renamed to the derived one.
    pub fn from_entry(host: &Host, entry: &ConfigEntry) -> Result<Arc<Self>> {
        let (mode, device) = entry.data.validate(&host.devices)?;
        let name = entry
            .data
            .device_name
            .clone()
            .unwrap_or_else(|| device.display_name().to_string());
        let base_entity = entry.data.base_entity.clone();
        let second_entity = entry.data.second_entity().to_string();

        let object_id = object_id_for(&name);
        let wanted_entity_id = format!("sensor.{}", object_id);
        let unique_id = unique_id_for(&base_entity, &second_entity, &mode);

        let registered = host.entities.get_or_create(
            "sensor",
            DOMAIN,
            &unique_id,
            &object_id,
            Some(device.id.as_str()),
        );
        let entity_id = if registered.entity_id == wanted_entity_id {
            registered.entity_id
        } else {
            debug!(
                "Updating entity_id from {} to {}",
                registered.entity_id, wanted_entity_id
            );
            match host
                .entities
                .update_entity_id(&registered.entity_id, &wanted_entity_id)
            {
                Ok(entry) => entry.entity_id,
                Err(e) => {
                    warn!("Keeping {}: {}", registered.entity_id, e);
                    registered.entity_id
                }
            }
        };

        info!(
            "Initialized sensor {} ({}) for device {}, mode: {}",
            entity_id,
            unique_id,
            device.id,
            mode.kind()
        );

        Ok(Arc::new(Self {
            entity_id,
            unique_id,
            name,
            device_id: device.id,
            device_identifiers: device.identifiers,
            base_entity,
            second_entity,
            mode,
            states: host.states.clone(),
            status: RwLock::new(WindowStatus::Unknown),
            listeners: RwLock::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            update_lock: Mutex::new(()),
        }))
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &'static str {
        ICON
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn device_identifiers(&self) -> &BTreeSet<(String, String)> {
        &self.device_identifiers
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn base_entity(&self) -> &str {
        &self.base_entity
    }

    pub fn second_entity(&self) -> &str {
        &self.second_entity
    }

    /// Last evaluated status.
    pub fn status(&self) -> WindowStatus {
        *self.status.read()
    }

    /// Register an observer for status evaluations.
    pub fn add_listener(&self, listener: Arc<dyn StatusListener>) {
        self.listeners.write().push(listener);
    }

    /// Whether the sensor is currently tracking its inputs.
    pub fn is_tracking(&self) -> bool {
        !self.subscriptions.lock().is_empty()
    }

    /// Start tracking both input entities and evaluate once.
    pub fn added_to_host(self: &Arc<Self>) -> WindowStatus {
        let weak: Weak<Self> = Arc::downgrade(self);
        let subscription = self.states.track_state_change(
            &[self.base_entity.as_str(), self.second_entity.as_str()],
            move |event| {
                if let Some(sensor) = weak.upgrade() {
                    let status = sensor.update_state();
                    debug!(
                        "State changed for {} (trigger: {}), new state: {}",
                        sensor.entity_id, event.entity_id, status
                    );
                }
            },
        );
        self.subscriptions.lock().push(subscription);
        debug!("Set up state change listeners for {}", self.entity_id);

        self.update_state()
    }

    /// Stop tracking inputs and withdraw the published state.
    pub fn will_remove_from_host(&self) {
        self.subscriptions.lock().clear();
        self.states.remove(&self.entity_id);
        debug!("Removed state change listeners for {}", self.entity_id);
    }

    /// Evaluate the status from the inputs' current states and publish it.
    pub fn update_state(&self) -> WindowStatus {
        let guard = self.update_lock.lock();
        let primary = self.states.state_of(&self.base_entity);
        let secondary = self.states.state_of(&self.second_entity);

        if primary.is_none() || secondary.is_none() {
            error!(
                "Missing state for {} or {}",
                self.base_entity, self.second_entity
            );
        }

        let status = self.mode.evaluate(primary.as_deref(), secondary.as_deref());
        let previous = std::mem::replace(&mut *self.status.write(), status);

        self.states.set(&self.entity_id, status.to_string());
        drop(guard);
        debug!("Updated state for {}: {}", self.entity_id, status);

        let update = StatusUpdate {
            entity_id: self.entity_id.clone(),
            status,
            previous,
            evaluated_at: Utc::now(),
        };
        let listeners: Vec<Arc<dyn StatusListener>> = self.listeners.read().clone();
        for listener in listeners {
            listener.status_changed(&update);
        }

        status
    }
}
