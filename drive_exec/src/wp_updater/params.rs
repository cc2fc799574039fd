//! Waypoint updater parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the waypoint updater
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Number of waypoints in the trajectory window
    pub lookahead_wps: usize,

    /// Deceleration used to build the braking profile.
    ///
    /// Units: meters/second^2
    pub max_decel_mss: f64,

    /// Number of waypoints short of the stop line the vehicle should come to
    /// rest at.
    pub stop_buffer_wps: usize,

    /// Braking profile speeds below this are set to zero.
    ///
    /// Units: meters/second
    pub min_speed_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            lookahead_wps: 40,
            max_decel_mss: 0.5,
            stop_buffer_wps: 4,
            min_speed_ms: 1.0,
        }
    }
}
