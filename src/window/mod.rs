//! Extended window status entities.
//!
//! An [`ExtendedWindowSensor`] is the derived entity the host exposes for
//! each configured window. Observers implementing [`StatusListener`] receive
//! every evaluation as a [`StatusUpdate`].

pub mod labels;
pub mod sensor;

pub use labels::StatusLabels;
pub use sensor::{ExtendedWindowSensor, object_id_for, unique_id_for};

use crate::status::WindowStatus;
use chrono::{DateTime, Utc};

/// Integration domain, used for unique ids and translation keys.
pub const DOMAIN: &str = "extended_window_status";

pub const ICON: &str = "mdi:window-closed";

/// Result of one evaluation of a window.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub entity_id: String,
    pub status: WindowStatus,
    /// Status from the evaluation before this one.
    pub previous: WindowStatus,
    pub evaluated_at: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn changed(&self) -> bool {
        self.status != self.previous
    }
}

/// Observer for window status evaluations.
pub trait StatusListener: Send + Sync {
    fn status_changed(&self, update: &StatusUpdate);
}

impl<F> StatusListener for F
where
    F: Fn(&StatusUpdate) + Send + Sync,
{
    fn status_changed(&self, update: &StatusUpdate) {
        self(update)
    }
}
