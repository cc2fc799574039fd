//! # Drive library.
//!
//! The planning and control core of the drive stack. This library allows the
//! executable, benchmarks and other crates in the workspace to access the
//! modules defined in the drive crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - the latest snapshot of the executable's inputs and outputs
pub mod data_store;

/// Localisation - the vehicle pose
pub mod loc;

/// Executable parameters
pub mod params;

/// Route - the waypoints and their spatial index
pub mod route;

/// Simulation stand-in - kinematic vehicle and scripted traffic lights
pub mod sim;

/// Traffic light detector - finds the light ahead and debounces its color
pub mod tl_detector;

/// Waypoint updater - produces the trajectory window with braking
pub mod wp_updater;

/// Yaw control - converts twist commands into a steering angle
pub mod yaw_ctrl;
