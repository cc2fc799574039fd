//! Implementations for the YawCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::msg::SteeringCmd;
use log::{info, trace};
use serde::Serialize;

// Internal
use super::{Params, YawCtrlError};
use util::{
    archive::{Archived, Archiver},
    maths::clamp,
    module::State,
    params,
    session::{get_elapsed_seconds, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Yaw control module state
#[derive(Default)]
pub struct YawCtrl {
    pub(crate) params: Params,

    /// Output of the last cycle
    steering: Option<f64>,

    /// Output of the cycle before the last, used by the damping filter
    prev_steering: Option<f64>,

    report: StatusReport,
    arch_report: Archiver,
}

/// Input data to yaw control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// Commanded linear velocity.
    ///
    /// Units: meters/second
    pub linear_ms: f64,

    /// Commanded angular velocity.
    ///
    /// Units: radians/second
    pub angular_rads: f64,

    /// Current linear velocity of the vehicle.
    ///
    /// Units: meters/second
    pub current_ms: f64,
}

/// Status report for yaw control processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Elapsed session time
    pub time_s: f64,

    /// Angular velocity after rescaling and limiting.
    ///
    /// Units: radians/second
    pub angular_rads: f64,

    /// True if the angular velocity was limited by the lateral acceleration
    pub lat_accel_limited: bool,

    /// True if the angle was limited to the maximum steering angle
    pub angle_limited: bool,

    /// Steering angle before damping.
    ///
    /// Units: radians
    pub raw_angle_rad: f64,

    /// What the damping filter did
    pub filter: FilterAction,

    /// Output steering angle.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Action taken by the damping filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum FilterAction {
    /// No remembered steering to compare against
    Skipped,

    /// The change was small enough to accept
    Accepted,

    /// The change was partially applied
    Damped,

    /// The change was too large, zero was commanded
    Rejected,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FilterAction {
    fn default() -> Self {
        FilterAction::Skipped
    }
}

impl State for YawCtrl {
    const NAME: &'static str = "YawCtrl";

    type InitData = &'static str;
    type InitError = YawCtrlError;

    type InputData = InputData;
    type OutputData = SteeringCmd;
    type StatusReport = StatusReport;
    type ProcError = YawCtrlError;

    /// Initialise the YawCtrl module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data).map_err(YawCtrlError::ParamLoadError)?;
        *self = Self::with_params(params)?;

        self.arch_report = Archiver::from_path(session, "yaw_ctrl/status_report.csv")
            .map_err(|e| YawCtrlError::ArchiveInitError(e.to_string()))?;

        info!(
            "YawCtrl initialised, max steering angle {} rad",
            self.params.max_steer_angle_rad
        );

        Ok(())
    }

    /// Compute the steering angle for this cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport {
            time_s: get_elapsed_seconds(),
            ..Default::default()
        };

        let raw = self.raw_steering(input_data);
        let (angle_rad, action) = self.filter(raw);

        self.report.raw_angle_rad = raw;
        self.report.filter = action;
        self.report.angle_rad = angle_rad;

        trace!(
            "YawCtrl: raw {:.05} rad, {:?}, output {:.05} rad",
            raw,
            action,
            angle_rad
        );

        Ok((SteeringCmd { angle_rad }, self.report))
    }
}

impl Archived for YawCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

impl YawCtrl {
    /// Create yaw control with the given parameters, without a session.
    pub fn with_params(params: Params) -> Result<Self, YawCtrlError> {
        if params.max_steer_angle_rad < 0.0 {
            return Err(YawCtrlError::InvalidParams(
                "max_steer_angle_rad must not be negative",
            ));
        }
        if params.damp_max_rad < params.damp_thresh_rad {
            return Err(YawCtrlError::InvalidParams(
                "damp_max_rad must be at least damp_thresh_rad",
            ));
        }

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    /// Steering angle for the input before damping, within the steering
    /// limits.
    fn raw_steering(&mut self, input: &InputData) -> f64 {
        let p = &self.params;

        // Rescale the turn rate to the current speed
        let mut angular = if input.linear_ms != 0.0 {
            input.current_ms * input.angular_rads / input.linear_ms
        } else {
            0.0
        };

        if input.current_ms.abs() > 0.1 {
            let max_yaw_rate = (p.max_lat_accel_mss / input.current_ms).abs();
            let limited = clamp(&angular, &-max_yaw_rate, &max_yaw_rate);
            self.report.lat_accel_limited = limited != angular;
            angular = limited;
        }

        self.report.angular_rads = angular;

        if angular == 0.0 {
            return 0.0;
        }

        let radius = input.current_ms.max(p.min_speed_ms) / angular;
        let angle = (p.wheel_base_m / radius).atan() * p.steer_ratio;

        // Non-finite inputs give a neutral command
        if !angle.is_finite() {
            return 0.0;
        }

        let limited = clamp(&angle, &-p.max_steer_angle_rad, &p.max_steer_angle_rad);
        self.report.angle_limited = limited != angle;

        limited
    }

    /// Apply the damping filter and update the steering memory.
    ///
    /// The filter compares against the output from two cycles ago, and is
    /// skipped while that output is unknown or exactly zero.
    fn filter(&mut self, steering: f64) -> (f64, FilterAction) {
        let p = &self.params;

        let (steering, action) = match self.prev_steering {
            Some(prev) if prev != 0.0 => {
                let diff = steering - prev;

                if diff.abs() <= p.damp_thresh_rad {
                    (steering, FilterAction::Accepted)
                } else if diff.abs() > p.damp_max_rad {
                    (0.0, FilterAction::Rejected)
                } else {
                    (prev + diff * p.damp_gain, FilterAction::Damped)
                }
            }
            _ => (steering, FilterAction::Skipped),
        };

        self.prev_steering = self.steering;
        self.steering = Some(steering);

        (steering, action)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn yaw_ctrl() -> YawCtrl {
        YawCtrl::with_params(Params::default()).unwrap()
    }

    fn input(linear_ms: f64, angular_rads: f64, current_ms: f64) -> InputData {
        InputData {
            linear_ms,
            angular_rads,
            current_ms,
        }
    }

    #[test]
    fn test_zero_linear_velocity() {
        let mut yc = yaw_ctrl();

        for &(ang, cur) in [(0.5, 10.0), (-3.0, 0.0), (100.0, 25.0)].iter() {
            let (cmd, r) = yc.proc(&input(0.0, ang, cur)).unwrap();
            assert_eq!(cmd.angle_rad, 0.0);
            assert_eq!(r.angular_rads, 0.0);
        }
    }

    #[test]
    fn test_bicycle_model() {
        let mut yc = yaw_ctrl();

        let (cmd, r) = yc.proc(&input(10.0, 0.1, 10.0)).unwrap();
        let expected = (2.8498f64 / 100.0).atan() * 14.8;
        assert!((cmd.angle_rad - expected).abs() < 1e-12);
        assert!(!r.lat_accel_limited);
        assert!(!r.angle_limited);

        // Rescaled to the current speed: half speed halves the turn rate, but
        // the radius is unchanged
        let mut yc = yaw_ctrl();
        let (cmd, _) = yc.proc(&input(10.0, 0.1, 5.0)).unwrap();
        assert!((cmd.angle_rad - expected).abs() < 1e-12);
    }

    #[test]
    fn test_lat_accel_limit() {
        let mut yc = yaw_ctrl();

        let (cmd, r) = yc.proc(&input(10.0, -1.0, 10.0)).unwrap();
        assert!(r.lat_accel_limited);
        assert!((r.angular_rads + 0.3).abs() < 1e-12);

        let expected = -(2.8498f64 * 0.3 / 10.0).atan() * 14.8;
        assert!((cmd.angle_rad - expected).abs() < 1e-12);
    }

    #[test]
    fn test_angle_limit() {
        let mut yc = yaw_ctrl();

        // Slow enough that lateral acceleration isn't limited
        let (cmd, r) = yc.proc(&input(1.0, 1.0, 0.05)).unwrap();
        assert!(!r.lat_accel_limited);
        assert!(r.angle_limited);
        assert_eq!(cmd.angle_rad, 8.0);
    }

    #[test]
    fn test_output_bounded() {
        let mut yc = yaw_ctrl();
        let values = [-50.0, -3.0, -0.1, -0.01, 0.0, 0.02, 0.5, 7.0, 40.0];

        for &lin in values.iter() {
            for &ang in values.iter() {
                for &cur in values.iter() {
                    let (cmd, _) = yc.proc(&input(lin, ang, cur)).unwrap();
                    assert!(cmd.angle_rad.abs() <= 8.0);
                }
            }
        }

        let (cmd, _) = yc.proc(&input(std::f64::NAN, 1.0, 1.0)).unwrap();
        assert!(cmd.angle_rad.abs() <= 8.0);
    }

    #[test]
    fn test_filter_memory() {
        let mut yc = yaw_ctrl();

        // Nothing to compare against for the first two cycles
        assert_eq!(yc.filter(0.5), (0.5, FilterAction::Skipped));
        assert_eq!(yc.filter(0.6), (0.6, FilterAction::Skipped));

        // Compared against 0.5, two cycles back
        let (s, a) = yc.filter(0.505);
        assert_eq!(a, FilterAction::Damped);
        assert!((s - (0.5 + 0.005 * 0.125)).abs() < 1e-12);

        // Compared against 0.6
        assert_eq!(yc.filter(0.7), (0.0, FilterAction::Rejected));

        // Compared against the damped output
        let (s, a) = yc.filter(0.5012);
        assert_eq!(a, FilterAction::Accepted);
        assert_eq!(s, 0.5012);

        // Memory two cycles back is zero, so the filter is skipped
        assert_eq!(yc.filter(0.9), (0.9, FilterAction::Skipped));
    }

    #[test]
    fn test_invalid_params() {
        let params = Params {
            damp_max_rad: 0.0001,
            ..Default::default()
        };
        assert!(matches!(
            YawCtrl::with_params(params),
            Err(YawCtrlError::InvalidParams(_))
        ));
    }
}
