//! Tri-state window status derived from one or two input sensors.
//!
//! A window is Closed, Tilted or Open. The primary contact sensor decides
//! Closed on its own; a secondary signal (a rotation angle or a second contact
//! sensor) separates Tilted from Open. The result is recomputed from the
//! current readings on every evaluation and carries no history.

pub mod reading;
pub mod resolver;

pub use reading::{AngleReading, BinaryReading, Reading};
pub use resolver::{DualSensor, RotaryValue, TiltSource, resolve};

use crate::error::{Result, WindowError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Tilt threshold used when a rotary window doesn't configure one.
pub const DEFAULT_TILT_THRESHOLD: f64 = 80.0;

/// Derived window status.
///
/// `Display`/`FromStr` use the canonical state keys `closed`, `open`,
/// `tilted` and `unknown`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    Closed,
    Open,
    Tilted,
    Unknown,
}

/// Angle, in degrees, at or above which a rotary window counts as fully open.
///
/// Only constructible through [`Threshold::new`], so every instance is finite
/// and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(WindowError::InvalidThreshold(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_TILT_THRESHOLD)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = WindowError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

/// Configured mode name, as stored in window configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    /// Secondary entity is a rotation value.
    #[default]
    RotaryTilt,
    /// Secondary entity is a second window contact sensor.
    BinaryTilt,
}

impl ModeKind {
    /// Entity domains accepted as the secondary entity for this mode.
    pub fn secondary_domains(self) -> &'static [&'static str] {
        match self {
            ModeKind::RotaryTilt => &["number", "input_number"],
            ModeKind::BinaryTilt => &["binary_sensor", "input_boolean"],
        }
    }
}

/// Entity domains accepted as the primary entity, whatever the mode.
pub const PRIMARY_DOMAINS: &[&str] = &["binary_sensor", "input_boolean"];

/// Validated mode of a configured window, with the payload each mode needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    RotaryValue { threshold: Threshold },
    DualSensor,
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::RotaryValue { .. } => ModeKind::RotaryTilt,
            Mode::DualSensor => ModeKind::BinaryTilt,
        }
    }

    /// Evaluate the window status from the host's current state strings.
    ///
    /// A missing state (`None`) is the same as an unknown reading. The
    /// secondary state is parsed as the reading shape this mode expects.
    pub fn evaluate(&self, primary: Option<&str>, secondary: Option<&str>) -> WindowStatus {
        let primary = primary.map_or(BinaryReading::Unknown, BinaryReading::from_state);
        match *self {
            Mode::RotaryValue { threshold } => resolve(
                &RotaryValue::new(threshold),
                primary,
                secondary.map_or(AngleReading::Unknown, AngleReading::from_state),
            ),
            Mode::DualSensor => resolve(
                &DualSensor,
                primary,
                secondary.map_or(BinaryReading::Unknown, BinaryReading::from_state),
            ),
        }
    }
}
