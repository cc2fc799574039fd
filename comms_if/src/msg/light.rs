//! # Traffic light messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Detector class ID for a green light
pub const CLASS_ID_GREEN: u32 = 1;

/// Detector class ID for a red light
pub const CLASS_ID_RED: u32 = 2;

/// Detector class ID for a yellow light
pub const CLASS_ID_YELLOW: u32 = 3;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single object detection produced by the traffic light detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The class ID of the detected object, see the `CLASS_ID_*` constants
    pub class_id: u32,

    /// The detector's confidence in this detection, between 0 and 1
    pub score: f32,

    /// Bounding box of the detection in normalised image coordinates, as
    /// `[y_min, x_min, y_max, x_max]`
    pub bbox: [f32; 4],
}

/// The waypoint index at which the vehicle must stop for a red light.
///
/// On the wire this is a signed integer where `-1` means there is no red light
/// to stop for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficWaypoint(pub i32);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The color of a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightColor {
    Unknown,
    Red,
    Yellow,
    Green,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LightColor {
    /// Get the color corresponding to a detector class ID. Unrecognised IDs
    /// give `Unknown`.
    pub fn from_class_id(class_id: u32) -> Self {
        match class_id {
            CLASS_ID_GREEN => LightColor::Green,
            CLASS_ID_RED => LightColor::Red,
            CLASS_ID_YELLOW => LightColor::Yellow,
            _ => LightColor::Unknown,
        }
    }
}

impl Default for LightColor {
    fn default() -> Self {
        LightColor::Unknown
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LightColor::Unknown => "UNKNOWN",
            LightColor::Red => "RED",
            LightColor::Yellow => "YELLOW",
            LightColor::Green => "GREEN",
        };
        write!(f, "{}", s)
    }
}

impl TrafficWaypoint {
    /// The wire value meaning no stop is required.
    pub const NO_STOP: i32 = -1;

    /// Get the stop waypoint index, or `None` if there is no red light to stop
    /// for.
    pub fn stop_index(&self) -> Option<usize> {
        if self.0 < 0 {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

impl From<Option<usize>> for TrafficWaypoint {
    fn from(stop_index: Option<usize>) -> Self {
        match stop_index {
            Some(i) => match i32::try_from(i) {
                Ok(wp) => TrafficWaypoint(wp),
                Err(_) => {
                    warn!(
                        "Stop index {} does not fit the wire format, publishing no stop",
                        i
                    );
                    TrafficWaypoint(Self::NO_STOP)
                }
            },
            None => TrafficWaypoint(Self::NO_STOP),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_traffic_waypoint_sentinel() {
        assert_eq!(TrafficWaypoint::from(None), TrafficWaypoint(-1));
        assert_eq!(TrafficWaypoint::from(Some(292)).stop_index(), Some(292));
        assert_eq!(TrafficWaypoint(-1).stop_index(), None);
    }

    #[test]
    fn test_traffic_waypoint_out_of_range() {
        let max = i32::MAX as usize;
        assert_eq!(TrafficWaypoint::from(Some(max)).stop_index(), Some(max));

        // Too large for the wire is published as no stop rather than wrapping
        assert_eq!(
            TrafficWaypoint::from(Some(max + 1)),
            TrafficWaypoint(TrafficWaypoint::NO_STOP)
        );
        assert_eq!(
            TrafficWaypoint::from(Some(usize::MAX)).stop_index(),
            None
        );
    }

    #[test]
    fn test_from_class_id() {
        assert_eq!(LightColor::from_class_id(1), LightColor::Green);
        assert_eq!(LightColor::from_class_id(2), LightColor::Red);
        assert_eq!(LightColor::from_class_id(3), LightColor::Yellow);
        assert_eq!(LightColor::from_class_id(4), LightColor::Unknown);
    }
}
