//! # Waypoint updater module
//!
//! The waypoint updater produces the trajectory window followed by the
//! vehicle's drive controller. On each cycle:
//!
//! 1. The vehicle's waypoint is found, the nearest waypoint to the vehicle
//!    which is not behind it.
//! 2. The window is the next `lookahead_wps` waypoints from there, wrapping
//!    around the end of the route.
//! 3. If a stop for a red light falls inside the window the waypoint speeds
//!    are replaced with a constant deceleration profile ending a few
//!    waypoints short of the stop line.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod window;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
pub use window::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during WpUpdater operation.
#[derive(Debug, thiserror::Error)]
pub enum WpUpdaterError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Could not initialise the archives: {0}")]
    ArchiveInitError(String),

    #[error("The lookahead must be at least one waypoint")]
    ZeroLookahead,
}
