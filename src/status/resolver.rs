//! Window status resolution.
//!
//! The primary sensor decides Closed on its own. Only when it reads Open is
//! the secondary signal consulted, to tell a tilted window from a fully open
//! one. How the secondary signal is interpreted depends on the tilt source.

use super::reading::{AngleReading, BinaryReading, Reading};
use super::{Threshold, WindowStatus};

/// A way of telling "tilted" from "fully open" once the primary sensor reads Open.
///
/// The associated `Secondary` type ties each source to the reading shape it
/// consumes, so a rotary source can't be fed a binary reading and vice versa.
pub trait TiltSource {
    type Secondary: Reading;

    /// Status of a window whose primary sensor reads Open.
    fn open_status(&self, secondary: Self::Secondary) -> WindowStatus;
}

/// Rotation sensor on the handle. At or above the threshold the window is fully open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotaryValue {
    pub threshold: Threshold,
}

impl RotaryValue {
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold }
    }
}

impl TiltSource for RotaryValue {
    type Secondary = AngleReading;

    fn open_status(&self, secondary: AngleReading) -> WindowStatus {
        match secondary {
            AngleReading::Degrees(angle) if angle >= self.threshold.value() => WindowStatus::Open,
            AngleReading::Degrees(_) => WindowStatus::Tilted,
            AngleReading::Unknown => WindowStatus::Unknown,
        }
    }
}

/// Second contact sensor at the top of the sash. It only opens on a full opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DualSensor;

impl TiltSource for DualSensor {
    type Secondary = BinaryReading;

    fn open_status(&self, upper: BinaryReading) -> WindowStatus {
        match upper {
            BinaryReading::Open => WindowStatus::Open,
            BinaryReading::Closed => WindowStatus::Tilted,
            BinaryReading::Unknown => WindowStatus::Unknown,
        }
    }
}

/// Derive the window status from the current readings.
///
/// Unknown primary always wins. A Closed primary is authoritative and the
/// secondary reading is never looked at. An Open primary defers to the tilt
/// source, and an unknown secondary then yields Unknown.
///
/// Precedence: a Closed primary with an unreadable secondary (e.g. an
/// unparsable rotation) is Closed, not Unknown. A closed window can't be
/// tilted, so the secondary has nothing to add.
pub fn resolve<S: TiltSource>(
    source: &S,
    primary: BinaryReading,
    secondary: S::Secondary,
) -> WindowStatus {
    match primary {
        BinaryReading::Unknown => WindowStatus::Unknown,
        BinaryReading::Closed => WindowStatus::Closed,
        BinaryReading::Open if secondary.is_unknown() => WindowStatus::Unknown,
        BinaryReading::Open => source.open_status(secondary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotary(threshold: f64) -> RotaryValue {
        RotaryValue::new(Threshold::new(threshold).unwrap())
    }

    #[test]
    fn test_closed_primary_is_authoritative() {
        for angle in [
            AngleReading::Degrees(0.0),
            AngleReading::Degrees(90.0),
            AngleReading::Degrees(-10.0),
            AngleReading::Unknown,
        ] {
            for threshold in [0.0, 80.0, 180.0] {
                assert_eq!(
                    resolve(&rotary(threshold), BinaryReading::Closed, angle),
                    WindowStatus::Closed
                );
            }
        }
        for upper in [BinaryReading::Open, BinaryReading::Closed, BinaryReading::Unknown] {
            assert_eq!(
                resolve(&DualSensor, BinaryReading::Closed, upper),
                WindowStatus::Closed
            );
        }
    }

    #[test]
    fn test_unknown_primary_wins() {
        assert_eq!(
            resolve(&rotary(80.0), BinaryReading::Unknown, AngleReading::Degrees(90.0)),
            WindowStatus::Unknown
        );
        assert_eq!(
            resolve(&rotary(80.0), BinaryReading::Unknown, AngleReading::Unknown),
            WindowStatus::Unknown
        );
        for upper in [BinaryReading::Open, BinaryReading::Closed, BinaryReading::Unknown] {
            assert_eq!(
                resolve(&DualSensor, BinaryReading::Unknown, upper),
                WindowStatus::Unknown
            );
        }
    }

    #[test]
    fn test_open_primary_with_unknown_secondary() {
        assert_eq!(
            resolve(&rotary(80.0), BinaryReading::Open, AngleReading::Unknown),
            WindowStatus::Unknown
        );
        assert_eq!(
            resolve(&DualSensor, BinaryReading::Open, BinaryReading::Unknown),
            WindowStatus::Unknown
        );
    }

    #[test]
    fn test_rotary_threshold_is_inclusive() {
        for threshold in [0.0, 1.5, 80.0, 180.0] {
            assert_eq!(
                resolve(
                    &rotary(threshold),
                    BinaryReading::Open,
                    AngleReading::Degrees(threshold)
                ),
                WindowStatus::Open
            );
        }
    }

    #[test]
    fn test_rotary_below_threshold_is_tilted() {
        for epsilon in [1e-9, 0.5, 1.0, 79.0] {
            assert_eq!(
                resolve(
                    &rotary(80.0),
                    BinaryReading::Open,
                    AngleReading::Degrees(80.0 - epsilon)
                ),
                WindowStatus::Tilted
            );
        }
    }

    #[test]
    fn test_dual_sensor_upper_decides() {
        assert_eq!(
            resolve(&DualSensor, BinaryReading::Open, BinaryReading::Open),
            WindowStatus::Open
        );
        assert_eq!(
            resolve(&DualSensor, BinaryReading::Open, BinaryReading::Closed),
            WindowStatus::Tilted
        );
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(
            resolve(&rotary(80.0), BinaryReading::Open, AngleReading::Degrees(45.0)),
            WindowStatus::Tilted
        );
        assert_eq!(
            resolve(&rotary(80.0), BinaryReading::Open, AngleReading::Degrees(90.0)),
            WindowStatus::Open
        );
        assert_eq!(
            resolve(&DualSensor, BinaryReading::Open, BinaryReading::Closed),
            WindowStatus::Tilted
        );
        assert_eq!(
            resolve(&DualSensor, BinaryReading::Closed, BinaryReading::Open),
            WindowStatus::Closed
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let source = rotary(80.0);
        let first = resolve(&source, BinaryReading::Open, AngleReading::Degrees(45.0));
        let second = resolve(&source, BinaryReading::Open, AngleReading::Degrees(45.0));
        assert_eq!(first, second);

        let first = resolve(&DualSensor, BinaryReading::Open, BinaryReading::Open);
        let second = resolve(&DualSensor, BinaryReading::Open, BinaryReading::Open);
        assert_eq!(first, second);
    }
}
