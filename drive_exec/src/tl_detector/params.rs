//! Parameters structure for TlDetector

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for traffic light detection.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Number of consecutive cycles a light color must be observed for before
    /// it is acted upon.
    pub state_count_threshold: u32,

    /// Positions of the stop line for each traffic light on the route.
    ///
    /// Units: meters,
    /// Frame: Map
    pub stop_line_positions_m: Vec<[f64; 2]>,

    /// If true the light states reported by the simulator are used instead
    /// of the classifier.
    #[serde(default)]
    pub ground_truth: bool,
}

/// Parameters for the detection classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierParams {
    /// Detections must score more than this to be used.
    pub min_score: f32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            state_count_threshold: 3,
            stop_line_positions_m: Vec::new(),
            ground_truth: false,
        }
    }
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self { min_score: 0.5 }
    }
}
