//! # Traffic light detector module
//!
//! Traffic light fusion turns a per-frame light color into a stable stop
//! decision. Each camera cycle:
//!
//! 1. The nearest stop line ahead of the vehicle is found. Stop line and
//!    vehicle positions are both matched to route waypoints, and the stop
//!    line with the smallest non-negative waypoint difference wins.
//! 2. The color of the winning light is obtained from the injected
//!    [`LightClassifier`] (or from the simulator's ground truth light states
//!    if so configured).
//! 3. The color is debounced, a new color must be seen for more than the
//!    threshold number of consecutive cycles before it is acted on.
//! 4. If the debounced color is red the waypoint index of the stop line is
//!    output, otherwise no stop is output.
//!
//! The search never looks past the end of the route, a stop line just after
//! the route wraps back to its start is only found once the vehicle has
//! wrapped as well.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod classifier;
mod debounce;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use classifier::*;
pub use debounce::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TlDetector operation.
#[derive(Debug, thiserror::Error)]
pub enum TlDetectorError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Could not initialise the archives: {0}")]
    ArchiveInitError(String),

    #[error(
        "Ground truth mode expects one light state per stop line ({expected}), found {found}"
    )]
    LightStatesMismatch { expected: usize, found: usize },
}
