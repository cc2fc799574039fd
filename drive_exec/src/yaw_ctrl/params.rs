//! Yaw control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for yaw control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Ratio of steering wheel angle to road wheel angle.
    pub steer_ratio: f64,

    // ---- LIMITS ----

    /// Speed used for the turn radius when the vehicle is slower than this.
    ///
    /// Units: meters/second
    pub min_speed_ms: f64,

    /// Maximum lateral acceleration.
    ///
    /// Units: meters/second^2
    pub max_lat_accel_mss: f64,

    /// Maximum steering wheel angle either side of centre.
    ///
    /// Units: radians
    pub max_steer_angle_rad: f64,

    // ---- DAMPING ----

    /// Changes in steering at or below this are accepted unchanged.
    ///
    /// Units: radians
    pub damp_thresh_rad: f64,

    /// Changes in steering above this are rejected, commanding zero.
    ///
    /// Units: radians
    pub damp_max_rad: f64,

    /// Fraction of the change applied between the two thresholds.
    pub damp_gain: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            wheel_base_m: 2.8498,
            steer_ratio: 14.8,
            min_speed_ms: 0.1,
            max_lat_accel_mss: 3.0,
            max_steer_angle_rad: 8.0,
            damp_thresh_rad: 0.001,
            damp_max_rad: 0.01,
            damp_gain: 0.125,
        }
    }
}
