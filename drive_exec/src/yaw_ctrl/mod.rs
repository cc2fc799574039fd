//! # Yaw control module
//!
//! Yaw control converts the path follower's twist command into a steering
//! wheel angle for the drive-by-wire system.
//!
//! The commanded angular velocity is first rescaled from the commanded linear
//! speed to the vehicle's current speed, then limited so that the lateral
//! acceleration stays within the configured limit. The steering angle for the
//! resulting turn radius follows from the bicycle model, and is finally passed
//! through a damping filter which suppresses jerky changes in steering.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during YawCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum YawCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Could not initialise the archives: {0}")]
    ArchiveInitError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(&'static str),
}
