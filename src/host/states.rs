//! Entity state registry with change subscriptions.
//!
//! Holds the current state string of every entity the host knows about and
//! notifies subscribers when a tracked entity changes. Listeners are invoked
//! after the registry's locks are released, so a listener may read (or write)
//! the registry again.

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Current state of a single entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    /// Last time the state string changed.
    pub last_changed: DateTime<Utc>,
    /// Last time the state was written, changed or not.
    pub last_updated: DateTime<Utc>,
}

/// Delivered to subscribers whenever a tracked entity changes.
#[derive(Debug, Clone)]
pub struct StateChangedEvent {
    pub entity_id: String,
    pub old_state: Option<EntityState>,
    /// `None` when the entity was removed.
    pub new_state: Option<EntityState>,
}

type StateListener = Arc<dyn Fn(&StateChangedEvent) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    entity_ids: Vec<String>,
    callback: StateListener,
}

/// Thread-safe entity state store.
///
/// The version is incremented each time any state string changes, so callers
/// can cheaply detect "something changed since I last looked".
pub struct StateRegistry {
    states: RwLock<HashMap<String, EntityState>>,
    listeners: RwLock<Vec<ListenerEntry>>,
    next_listener_id: AtomicU64,
    version: AtomicU32,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            version: AtomicU32::new(0),
        }
    }

    /// Get the current state of an entity.
    pub fn get(&self, entity_id: &str) -> Option<EntityState> {
        self.states.read().get(entity_id).cloned()
    }

    /// Get only the state string of an entity.
    pub fn state_of(&self, entity_id: &str) -> Option<String> {
        self.states.read().get(entity_id).map(|s| s.state.clone())
    }

    /// Set the state of an entity. Returns true if the state string changed.
    ///
    /// Subscribers are only notified on an actual change.
    pub fn set(&self, entity_id: &str, state: impl Into<String>) -> bool {
        let state = state.into();
        let now = Utc::now();

        let (old, new) = {
            let mut states = self.states.write();
            let old = states.get(entity_id).cloned();
            if let Some(existing) = states.get_mut(entity_id) {
                existing.last_updated = now;
                if existing.state == state {
                    return false;
                }
                existing.state = state;
                existing.last_changed = now;
            } else {
                states.insert(
                    entity_id.to_string(),
                    EntityState {
                        entity_id: entity_id.to_string(),
                        state,
                        last_changed: now,
                        last_updated: now,
                    },
                );
            }
            (old, states.get(entity_id).cloned())
        };

        self.version.fetch_add(1, Ordering::SeqCst);
        debug!(
            "State of {} changed: {:?} -> {:?}",
            entity_id,
            old.as_ref().map(|s| s.state.as_str()),
            new.as_ref().map(|s| s.state.as_str())
        );
        self.dispatch(StateChangedEvent {
            entity_id: entity_id.to_string(),
            old_state: old,
            new_state: new,
        });
        true
    }

    /// Remove an entity's state. Returns the removed state, if any.
    pub fn remove(&self, entity_id: &str) -> Option<EntityState> {
        let old = self.states.write().remove(entity_id)?;
        self.version.fetch_add(1, Ordering::SeqCst);
        self.dispatch(StateChangedEvent {
            entity_id: entity_id.to_string(),
            old_state: Some(old.clone()),
            new_state: None,
        });
        Some(old)
    }

    /// Number of state changes since the registry was created.
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }

    /// Call `callback` whenever any of `entity_ids` changes.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// cancelled or dropped.
    pub fn track_state_change<F>(self: &Arc<Self>, entity_ids: &[&str], callback: F) -> Subscription
    where
        F: Fn(&StateChangedEvent) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.write().push(ListenerEntry {
            id,
            entity_ids: entity_ids.iter().map(|e| e.to_string()).collect(),
            callback: Arc::new(callback),
        });
        debug!("Listener {} tracking {:?}", id, entity_ids);
        Subscription {
            registry: Arc::downgrade(self),
            id,
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners.write().retain(|l| l.id != id);
    }

    fn dispatch(&self, event: StateChangedEvent) {
        let callbacks: Vec<StateListener> = self
            .listeners
            .read()
            .iter()
            .filter(|l| l.entity_ids.iter().any(|e| *e == event.entity_id))
            .map(|l| l.callback.clone())
            .collect();

        for callback in callbacks {
            callback(&event);
        }
    }
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for a state change listener. Dropping it removes the listener.
pub struct Subscription {
    registry: Weak<StateRegistry>,
    id: u64,
}

impl Subscription {
    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
            debug!("Listener {} removed", self.id);
        }
    }
}
