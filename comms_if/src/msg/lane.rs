//! # Lane messages
//!
//! A lane is an ordered list of waypoints. The route is delivered as a lane,
//! and the trajectory window is published as one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc, serde::ts_milliseconds};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single waypoint of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointMsg {
    /// Position of the waypoint in the map frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Heading of the lane at this waypoint.
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Target linear speed at this waypoint, positive forwards.
    ///
    /// Units: meters/second
    pub speed_ms: f64,
}

/// An ordered list of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneMsg {
    /// Time at which the lane was produced
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// The waypoints in the lane
    pub waypoints: Vec<WaypointMsg>,
}
