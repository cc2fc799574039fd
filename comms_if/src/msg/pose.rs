//! # Pose messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc, serde::ts_milliseconds};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The vehicle's current pose as reported by localisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseMsg {
    /// Time at which the pose was estimated
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Position of the vehicle in the map frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Orientation of the vehicle in the map frame as a quaternion in
    /// `[x, y, z, w]` order.
    pub orientation_q: [f64; 4],
}
