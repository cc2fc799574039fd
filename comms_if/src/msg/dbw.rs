//! # Drive-by-wire messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A velocity command, as produced by the path follower.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TwistCmd {
    /// Commanded linear velocity, positive forwards.
    ///
    /// Units: meters/second
    pub linear_ms: f64,

    /// Commanded angular velocity about the vehicle's up axis, positive to the
    /// left.
    ///
    /// Units: radians/second
    pub angular_rads: f64,
}

/// A steering wheel angle demand sent to the drive-by-wire system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringCmd {
    /// Steering wheel angle, positive to the left.
    ///
    /// Units: radians
    pub angle_rad: f64,
}
