//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use comms_if::{
    eqpt::cam::CamImage,
    msg::{LaneMsg, LightColor, PoseMsg, SteeringCmd, TrafficWaypoint, TwistCmd},
};

use crate::{
    loc::Pose,
    route::Route,
    tl_detector,
    wp_updater,
    yaw_ctrl,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
///
/// Holds the latest snapshot of every input, and the outputs of each module.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if traffic light detection runs on this cycle
    pub is_tl_cycle: bool,

    /// True if the waypoint updater runs on this cycle
    pub is_wp_cycle: bool,

    // Inputs
    pub route: Option<Arc<Route>>,
    pub pose: Option<Pose>,
    pub current_speed_ms: f64,
    pub front_image: Option<Arc<CamImage>>,
    pub light_states: Vec<LightColor>,

    // TlDetector
    pub tl_detector_output: tl_detector::OutputData,
    pub tl_detector_status_rpt: tl_detector::StatusReport,

    /// The stop decision as published on the bus
    pub traffic_wp: TrafficWaypoint,

    // WpUpdater
    /// The trajectory as published to path following
    pub final_waypoints: Option<LaneMsg>,
    pub wp_updater_status_rpt: wp_updater::StatusReport,

    // Path following
    pub twist_cmd: TwistCmd,

    // YawCtrl
    pub yaw_ctrl_output: SteeringCmd,
    pub yaw_ctrl_status_rpt: yaw_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Total number of cycle overruns
    pub num_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DataStore {
    fn default() -> Self {
        Self {
            num_cycles: 0,
            is_tl_cycle: false,
            is_wp_cycle: false,
            route: None,
            pose: None,
            current_speed_ms: 0.0,
            front_image: None,
            light_states: Vec::new(),
            tl_detector_output: tl_detector::OutputData::default(),
            tl_detector_status_rpt: tl_detector::StatusReport::default(),
            traffic_wp: TrafficWaypoint(TrafficWaypoint::NO_STOP),
            final_waypoints: None,
            wp_updater_status_rpt: wp_updater::StatusReport::default(),
            twist_cmd: TwistCmd::default(),
            yaw_ctrl_output: SteeringCmd::default(),
            yaw_ctrl_status_rpt: yaw_ctrl::StatusReport::default(),
            num_consec_cycle_overruns: 0,
            num_cycle_overruns: 0,
        }
    }
}

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Sets the flags for the modules running at a lower rate than the main
    /// loop.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, tl_frequency_hz: f64, wp_frequency_hz: f64) {
        self.is_tl_cycle = is_rate_cycle(self.num_cycles, cycle_frequency_hz, tl_frequency_hz);
        self.is_wp_cycle = is_rate_cycle(self.num_cycles, cycle_frequency_hz, wp_frequency_hz);
    }

    /// Take the vehicle pose from a localisation message.
    pub fn set_pose_msg(&mut self, msg: &PoseMsg) {
        self.pose = Some(Pose::from_msg(msg));
    }

    /// Input data for traffic light detection from the latest snapshot.
    pub fn tl_detector_input(&self) -> tl_detector::InputData {
        tl_detector::InputData {
            route: self.route.clone(),
            pose: self.pose,
            image: self.front_image.clone(),
            light_states: self.light_states.clone(),
        }
    }

    /// Input data for the waypoint updater from the latest snapshot.
    pub fn wp_updater_input(&self) -> wp_updater::InputData {
        wp_updater::InputData {
            route: self.route.clone(),
            pose: self.pose,
            stop_index: self.traffic_wp.stop_index(),
        }
    }

    /// Input data for yaw control from the latest snapshot.
    pub fn yaw_ctrl_input(&self) -> yaw_ctrl::InputData {
        yaw_ctrl::InputData {
            linear_ms: self.twist_cmd.linear_ms,
            angular_rads: self.twist_cmd.angular_rads,
            current_ms: self.current_speed_ms,
        }
    }
}

/// True if a task at `rate_hz` runs on cycle `num_cycles` of a loop at
/// `cycle_frequency_hz`. Tasks at or above the loop rate run every cycle.
pub fn is_rate_cycle(num_cycles: u128, cycle_frequency_hz: f64, rate_hz: f64) -> bool {
    if !(rate_hz > 0.0) {
        return false;
    }

    let period = (cycle_frequency_hz / rate_hz).round().max(1.0) as u128;

    num_cycles % period == 0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_rate_cycle() {
        let tl: Vec<u128> = (0..50).filter(|&n| is_rate_cycle(n, 50.0, 10.0)).collect();
        assert_eq!(tl, vec![0, 5, 10, 15, 20, 25, 30, 35, 40, 45]);

        let wp: Vec<u128> = (0..50).filter(|&n| is_rate_cycle(n, 50.0, 3.0)).collect();
        assert_eq!(wp, vec![0, 17, 34]);

        assert!((0..10).all(|n| is_rate_cycle(n, 50.0, 100.0)));
        assert!((0..10).all(|n| !is_rate_cycle(n, 50.0, 0.0)));
    }

    #[test]
    fn test_inputs_from_snapshot() {
        let mut ds = DataStore::default();
        assert_eq!(ds.wp_updater_input().stop_index, None);

        ds.traffic_wp = TrafficWaypoint(292);
        ds.twist_cmd = TwistCmd {
            linear_ms: 10.0,
            angular_rads: 0.1,
        };
        ds.current_speed_ms = 9.0;

        assert_eq!(ds.wp_updater_input().stop_index, Some(292));
        assert_eq!(ds.yaw_ctrl_input().current_ms, 9.0);
        assert_eq!(ds.yaw_ctrl_input().angular_rads, 0.1);
    }

    #[test]
    fn test_set_pose_msg() {
        let mut ds = DataStore::default();
        assert!(ds.wp_updater_input().pose.is_none());

        let msg = Pose::new(nalgebra::Vector3::new(3.0, -4.0, 0.0), 1.2).to_msg(chrono::Utc::now());
        ds.set_pose_msg(&msg);

        let pose = ds.wp_updater_input().pose.unwrap();
        assert!((pose.position_m[0] - 3.0).abs() < 1e-9);
        assert!((pose.position_m[1] + 4.0).abs() < 1e-9);
        assert!((pose.heading() - 1.2).abs() < 1e-9);
        assert!(ds.tl_detector_input().pose.is_some());
    }
}
