//! # Drive Executable Parameters
//!
//! This module provides parameters for the drive executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use util::logger::LoggerConfig;

use crate::sim::SimParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DriveExecParams {
    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerConfig,

    /// Frequency of the main loop, yaw control runs every cycle.
    ///
    /// Units: hertz
    pub cycle_frequency_hz: f64,

    /// Frequency of the camera and traffic light detection.
    ///
    /// Units: hertz
    pub tl_frequency_hz: f64,

    /// Frequency of the waypoint updater.
    ///
    /// Units: hertz
    pub wp_frequency_hz: f64,

    /// Speed limit given to waypoints loaded from a route file.
    ///
    /// Units: meters/second
    pub route_speed_ms: f64,

    /// Radius of the route generated when no route file is given.
    ///
    /// Units: meters
    pub generated_route_radius_m: f64,

    /// Number of waypoints in the generated route
    pub generated_route_num_wps: usize,

    /// Parameters of the simulation stand-in
    pub sim: SimParams,
}
