//! Readings of the underlying input entities.
//!
//! The host reports every entity state as a string. These types turn those
//! strings into the two reading shapes the resolver understands. Anything the
//! host reports that isn't a usable value (`unavailable`, `unknown`, garbage)
//! becomes `Unknown` rather than an error.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Common behaviour of both reading shapes.
pub trait Reading: Copy {
    /// True when the reading carries no usable value.
    fn is_unknown(&self) -> bool;
}

/// Reading of a binary open/closed contact sensor or boolean helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BinaryReading {
    Open,
    Closed,
    Unknown,
}

impl BinaryReading {
    /// Parse a host state string.
    ///
    /// `on`/`open` is Open, `off`/`closed` is Closed (case-insensitive).
    /// Everything else, including `unavailable` and `unknown`, is Unknown.
    pub fn from_state(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "on" | "open" => BinaryReading::Open,
            "off" | "closed" => BinaryReading::Closed,
            _ => BinaryReading::Unknown,
        }
    }

    /// Host state string for this reading, as written by simulations.
    pub fn to_state(self) -> &'static str {
        match self {
            BinaryReading::Open => "on",
            BinaryReading::Closed => "off",
            BinaryReading::Unknown => "unavailable",
        }
    }
}

impl From<bool> for BinaryReading {
    fn from(open: bool) -> Self {
        if open {
            BinaryReading::Open
        } else {
            BinaryReading::Closed
        }
    }
}

impl Reading for BinaryReading {
    fn is_unknown(&self) -> bool {
        matches!(self, BinaryReading::Unknown)
    }
}

/// Reading of a rotation sensor, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleReading {
    Degrees(f64),
    Unknown,
}

impl AngleReading {
    /// Build a reading from a raw value. Non-finite values are Unknown.
    pub fn degrees(value: f64) -> Self {
        if value.is_finite() {
            AngleReading::Degrees(value)
        } else {
            AngleReading::Unknown
        }
    }

    /// Parse a host state string as a number of degrees.
    pub fn from_state(state: &str) -> Self {
        match state.trim().parse::<f64>() {
            Ok(value) => Self::degrees(value),
            Err(_) => AngleReading::Unknown,
        }
    }
}

impl Reading for AngleReading {
    fn is_unknown(&self) -> bool {
        matches!(self, AngleReading::Unknown)
    }
}
