//! # Localisation module
//!
//! The vehicle's pose is provided by an external localisation source, this
//! module only holds the pose representation used by the planning modules.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::msg::PoseMsg;
use nalgebra::{Quaternion, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and attitude in the map frame) of the vehicle.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    /// The position in the map frame
    pub position_m: Vector3<f64>,

    /// The attitude of the vehicle in the map frame
    pub attitude_q: UnitQuaternion<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(position_m: Vector3<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            attitude_q: UnitQuaternion::from_euler_angles(0.0, 0.0, heading_rad),
        }
    }

    /// Position of the vehicle on the ground plane.
    pub fn position_2d(&self) -> Vector2<f64> {
        self.position_m.xy()
    }

    /// Return the heading (angle to the positive X axis) of the vehicle in
    /// radians.
    pub fn heading(&self) -> f64 {
        self.attitude_q.euler_angles().2
    }

    pub fn from_msg(msg: &PoseMsg) -> Self {
        let q = msg.orientation_q;

        Self {
            position_m: Vector3::from(msg.position_m),
            attitude_q: UnitQuaternion::from_quaternion(Quaternion::new(q[3], q[0], q[1], q[2])),
        }
    }

    pub fn to_msg(&self, timestamp: chrono::DateTime<chrono::Utc>) -> PoseMsg {
        let q = self.attitude_q.quaternion();

        PoseMsg {
            timestamp,
            position_m: self.position_m.into(),
            orientation_q: [q.i, q.j, q.k, q.w],
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: Vector3::zeros(),
            attitude_q: UnitQuaternion::identity(),
        }
    }
}
