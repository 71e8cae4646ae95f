//! In-process model of the automation host.
//!
//! The window logic only needs three things from its host: the current state
//! of input entities (with change notifications), the device registry to look
//! up the window's device, and the entity registry to claim an entity id.

pub mod devices;
pub mod entities;
pub mod states;

pub use devices::{DeviceEntry, DeviceRegistry};
pub use entities::{EntityRegistry, RegistryEntry};
pub use states::{EntityState, StateChangedEvent, StateRegistry, Subscription};

use std::sync::Arc;

/// Shared handles to the host registries.
#[derive(Clone, Default)]
pub struct Host {
    pub states: Arc<StateRegistry>,
    pub devices: Arc<DeviceRegistry>,
    pub entities: Arc<EntityRegistry>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }
}
