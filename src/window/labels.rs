//! Human-readable labels for window states.

use super::DOMAIN;
use crate::status::WindowStatus;
use std::collections::HashMap;

/// Looks up translated labels, falling back to English.
///
/// Translation keys follow the host's layout:
/// `component.<domain>.entity.sensor.<domain>.state.<status>`.
#[derive(Debug, Clone, Default)]
pub struct StatusLabels {
    translations: HashMap<String, String>,
}

impl StatusLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_translations(translations: HashMap<String, String>) -> Self {
        Self { translations }
    }

    pub fn translation_key(status: WindowStatus) -> String {
        format!(
            "component.{domain}.entity.sensor.{domain}.state.{status}",
            domain = DOMAIN
        )
    }

    /// Label for `status`. Unknown has no label.
    pub fn label(&self, status: WindowStatus) -> Option<&str> {
        let fallback = match status {
            WindowStatus::Open => "Open",
            WindowStatus::Closed => "Closed",
            WindowStatus::Tilted => "Tilted",
            WindowStatus::Unknown => return None,
        };
        Some(
            self.translations
                .get(&Self::translation_key(status))
                .map(String::as_str)
                .unwrap_or(fallback),
        )
    }
}
