//! # Simulation stand-in
//!
//! A lightweight stand-in for the vehicle and its surroundings, used by the
//! executable when running without a simulator. It provides:
//!
//! - A kinematic vehicle which follows the trajectory window with a pure
//!   pursuit path follower, and turns according to the steering angle from
//!   yaw control.
//! - A traffic light schedule shared by every light on the route.
//! - A stand-in camera which renders the light as a colored patch, and a
//!   detector which finds that patch, with occasional misdetections.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use comms_if::{
    eqpt::cam::{CamId, CamImage},
    msg::{
        Detection, LaneMsg, LightColor, PoseMsg, TwistCmd, CLASS_ID_GREEN, CLASS_ID_RED,
        CLASS_ID_YELLOW,
    },
};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use nalgebra::{Vector2, Vector3};
use serde::Deserialize;

use crate::{loc::Pose, tl_detector::Detector};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Width of the stand-in camera's images in pixels
const CAM_WIDTH: u32 = 64;

/// Height of the stand-in camera's images in pixels
const CAM_HEIGHT: u32 = 48;

/// Score given to the scheduled light detection
const DETECTION_SCORE: f32 = 0.9;

/// Score given to a misdetection, higher than the real detection
const MISDETECTION_SCORE: f32 = 0.95;

/// Score of the background detection present in every frame
const NOISE_SCORE: f32 = 0.3;

/// Half width of the light patch in pixels
const PATCH_HALF_WIDTH: u32 = 4;

const RED_RGB: [u8; 3] = [255, 0, 0];
const YELLOW_RGB: [u8; 3] = [255, 255, 0];
const GREEN_RGB: [u8; 3] = [0, 255, 0];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulation stand-in.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    // ---- VEHICLE ----

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Ratio of steering wheel angle to road wheel angle.
    pub steer_ratio: f64,

    /// Maximum acceleration.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Maximum braking deceleration.
    ///
    /// Units: meters/second^2
    pub max_decel_mss: f64,

    // ---- PATH FOLLOWER ----

    /// Minimum pure pursuit lookahead distance.
    ///
    /// Units: meters
    pub min_lookahead_m: f64,

    /// Increase in lookahead distance with speed.
    ///
    /// Units: seconds
    pub lookahead_gain_s: f64,

    // ---- LIGHTS ----

    /// Duration of the green phase.
    ///
    /// Units: seconds
    pub green_s: f64,

    /// Duration of the yellow phase.
    ///
    /// Units: seconds
    pub yellow_s: f64,

    /// Duration of the red phase.
    ///
    /// Units: seconds
    pub red_s: f64,

    /// The scripted detector misreports one in this many frames, zero never
    /// misreports.
    pub misdetect_period: u32,
}

/// The light schedule, green then yellow then red, repeating.
#[derive(Debug, Clone, Copy)]
pub struct LightSchedule {
    green_s: f64,
    yellow_s: f64,
    red_s: f64,
}

/// A point-mass vehicle moving on the ground plane.
#[derive(Debug, Clone)]
pub struct KinematicVehicle {
    params: SimParams,
    position_m: Vector3<f64>,
    heading_rad: f64,
    speed_ms: f64,
}

/// A detector which finds the light patch drawn by [`capture`].
pub struct PatchDetector {
    misdetect_period: u32,
    num_frames: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LightSchedule {
    pub fn new(green_s: f64, yellow_s: f64, red_s: f64) -> Self {
        Self {
            green_s,
            yellow_s,
            red_s,
        }
    }

    pub fn from_params(params: &SimParams) -> Self {
        Self::new(params.green_s, params.yellow_s, params.red_s)
    }

    /// Color shown `time_s` seconds after the schedule started.
    pub fn color_at(&self, time_s: f64) -> LightColor {
        let period = self.green_s + self.yellow_s + self.red_s;
        if !(period > 0.0) || !time_s.is_finite() {
            return LightColor::Unknown;
        }

        let phase = time_s.rem_euclid(period);

        if phase < self.green_s {
            LightColor::Green
        } else if phase < self.green_s + self.yellow_s {
            LightColor::Yellow
        } else {
            LightColor::Red
        }
    }
}

impl KinematicVehicle {
    pub fn new(params: SimParams, position_m: Vector3<f64>, heading_rad: f64) -> Self {
        Self {
            params,
            position_m,
            heading_rad,
            speed_ms: 0.0,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position_m, self.heading_rad)
    }

    /// The pose as published by localisation.
    pub fn pose_msg(&self, timestamp: DateTime<Utc>) -> PoseMsg {
        self.pose().to_msg(timestamp)
    }

    pub fn speed_ms(&self) -> f64 {
        self.speed_ms
    }

    /// Compute the twist command which follows the published trajectory.
    ///
    /// The target speed is the speed of the first waypoint in the lane, the
    /// turn rate steers towards the first waypoint beyond the lookahead
    /// distance.
    pub fn pursue(&self, lane: &LaneMsg) -> TwistCmd {
        let first = match lane.waypoints.first() {
            Some(w) => w,
            None => return TwistCmd::default(),
        };

        let lookahead_m =
            self.params.min_lookahead_m + self.params.lookahead_gain_s * self.speed_ms.abs();
        let offset = |p: &[f64; 3]| Vector2::new(p[0], p[1]) - self.position_m.xy();

        let target = lane
            .waypoints
            .iter()
            .find(|w| offset(&w.position_m).norm() >= lookahead_m)
            .or_else(|| lane.waypoints.last())
            .unwrap_or(first);

        let delta = offset(&target.position_m);
        let dist_m = delta.norm();
        let linear_ms = first.speed_ms;

        let angular_rads = if dist_m > 0.0 {
            let alpha = delta[1].atan2(delta[0]) - self.heading_rad;
            linear_ms * 2.0 * alpha.sin() / dist_m
        } else {
            0.0
        };

        TwistCmd {
            linear_ms,
            angular_rads,
        }
    }

    /// Advance the vehicle by `dt_s`, accelerating towards `target_speed_ms`
    /// and turning with the given steering wheel angle.
    pub fn step(&mut self, target_speed_ms: f64, steering_angle_rad: f64, dt_s: f64) {
        let dv = target_speed_ms - self.speed_ms;
        let max_dv = if dv > 0.0 {
            self.params.max_accel_mss * dt_s
        } else {
            self.params.max_decel_mss * dt_s
        };
        self.speed_ms += dv.max(-max_dv).min(max_dv);

        let wheel_angle = steering_angle_rad / self.params.steer_ratio;
        let yaw_rate = self.speed_ms * wheel_angle.tan() / self.params.wheel_base_m;

        self.heading_rad += yaw_rate * dt_s;
        self.position_m += Vector3::new(self.heading_rad.cos(), self.heading_rad.sin(), 0.0)
            * self.speed_ms
            * dt_s;
    }
}

impl PatchDetector {
    pub fn new(misdetect_period: u32) -> Self {
        Self {
            misdetect_period,
            num_frames: 0,
        }
    }
}

impl Detector for PatchDetector {
    fn detect(&mut self, image: &CamImage) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        self.num_frames = self.num_frames.wrapping_add(1);

        let (width, height) = image.image.dimensions();
        if width == 0 || height == 0 {
            return Err("empty image".into());
        }

        let pixel = image.image.get_pixel(width / 2, height / 2);
        let class_id = match [pixel[0], pixel[1], pixel[2]] {
            RED_RGB => CLASS_ID_RED,
            YELLOW_RGB => CLASS_ID_YELLOW,
            GREEN_RGB => CLASS_ID_GREEN,
            _ => return Ok(Vec::new()),
        };

        let bbox = [
            0.5 - PATCH_HALF_WIDTH as f32 / width as f32,
            0.5 - PATCH_HALF_WIDTH as f32 / height as f32,
            0.5 + PATCH_HALF_WIDTH as f32 / width as f32,
            0.5 + PATCH_HALF_WIDTH as f32 / height as f32,
        ];

        let mut detections = vec![
            Detection {
                class_id: CLASS_ID_RED,
                score: NOISE_SCORE,
                bbox: [0.0, 0.0, 0.1, 0.1],
            },
            Detection {
                class_id,
                score: DETECTION_SCORE,
                bbox,
            },
        ];

        if self.misdetect_period > 0 && self.num_frames % self.misdetect_period == 0 {
            let wrong = if class_id == CLASS_ID_RED {
                CLASS_ID_GREEN
            } else {
                CLASS_ID_RED
            };
            detections.push(Detection {
                class_id: wrong,
                score: MISDETECTION_SCORE,
                bbox,
            });
        }

        Ok(detections)
    }
}

/// Capture an image from the stand-in camera, showing a light of the given
/// color in the centre of the frame.
pub fn capture(timestamp: DateTime<Utc>, color: LightColor) -> CamImage {
    let rgb = match color {
        LightColor::Red => RED_RGB,
        LightColor::Yellow => YELLOW_RGB,
        LightColor::Green => GREEN_RGB,
        LightColor::Unknown => return CamImage::blank(CamId::Front, CAM_WIDTH, CAM_HEIGHT, timestamp),
    };

    let (cx, cy) = (CAM_WIDTH / 2, CAM_HEIGHT / 2);
    let mut img = RgbImage::new(CAM_WIDTH, CAM_HEIGHT);
    for y in (cy - PATCH_HALF_WIDTH)..(cy + PATCH_HALF_WIDTH) {
        for x in (cx - PATCH_HALF_WIDTH)..(cx + PATCH_HALF_WIDTH) {
            img.put_pixel(x, y, Rgb(rgb));
        }
    }

    CamImage {
        cam_id: CamId::Front,
        timestamp,
        image: DynamicImage::ImageRgb8(img),
    }
}
