//! Waypoint updater module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::{brake_index, Params, TrajectoryWindow, WpUpdaterError};
use crate::{loc::Pose, route::Route};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::{get_elapsed_seconds, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Waypoint updater module state
#[derive(Default)]
pub struct WpUpdater {
    pub(crate) params: Params,

    /// Stop index used on the last cycle, `None` before the first cycle
    last_stop_index: Option<Option<usize>>,

    /// Set once the short route warning has been given
    short_route_warned: bool,

    report: StatusReport,
    arch_report: Archiver,
}

/// Input data to the waypoint updater.
#[derive(Default, Clone)]
pub struct InputData {
    /// The current route, or `None` if no route has been received.
    pub route: Option<Arc<Route>>,

    /// The current pose of the vehicle, or `None` if it is not known.
    pub pose: Option<Pose>,

    /// The stop index from traffic light detection, `None` if there is no red
    /// light to stop for.
    pub stop_index: Option<usize>,
}

/// Status report for waypoint updater processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Elapsed session time
    pub time_s: f64,

    /// The vehicle's waypoint, `None` if there was no route or pose
    pub vehicle_wp: Option<usize>,

    /// The stop index used this cycle
    pub stop_index: Option<usize>,

    /// Window index the vehicle should be at rest at, if braking
    pub brake_index: Option<usize>,

    /// Target speed at the head of the window
    pub head_speed_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for WpUpdater {
    const NAME: &'static str = "WpUpdater";

    type InitData = &'static str;
    type InitError = WpUpdaterError;

    type InputData = InputData;
    type OutputData = Option<TrajectoryWindow>;
    type StatusReport = StatusReport;
    type ProcError = WpUpdaterError;

    /// Initialise the WpUpdater module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data).map_err(WpUpdaterError::ParamLoadError)?;
        *self = Self::with_params(params)?;

        self.arch_report = Archiver::from_path(session, "wp_updater/status_report.csv")
            .map_err(|e| WpUpdaterError::ArchiveInitError(e.to_string()))?;

        info!(
            "WpUpdater initialised, lookahead {} waypoints",
            self.params.lookahead_wps
        );

        Ok(())
    }

    /// Produce the trajectory window for this cycle.
    ///
    /// Without a route or pose no window is produced.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport {
            time_s: get_elapsed_seconds(),
            stop_index: input_data.stop_index,
            ..Default::default()
        };

        if self.last_stop_index != Some(input_data.stop_index) {
            warn!("Stop index now {:?}", input_data.stop_index);
            self.last_stop_index = Some(input_data.stop_index);
        }

        let (route, pose) = match (&input_data.route, &input_data.pose) {
            (Some(r), Some(p)) => (r, p),
            _ => {
                debug!("WpUpdater: no route or pose, no window produced");
                return Ok((None, self.report));
            }
        };

        if route.len() < self.params.lookahead_wps && !self.short_route_warned {
            warn!(
                "Route of {} waypoints is shorter than the lookahead, windows will repeat \
                 waypoints",
                route.len()
            );
            self.short_route_warned = true;
        }

        let vehicle_wp = route.nearest_ahead(&pose.position_2d());
        let window = self.window(route, vehicle_wp, input_data.stop_index);

        self.report.vehicle_wp = Some(vehicle_wp);
        self.report.brake_index = window.brake_index;
        self.report.head_speed_ms = window.waypoints.first().map(|w| w.speed_ms);

        debug!(
            "WpUpdater: vehicle at wp {}, brake index {:?}, head speed {:?} m/s",
            vehicle_wp, window.brake_index, self.report.head_speed_ms
        );

        Ok((Some(window), self.report))
    }
}

impl Archived for WpUpdater {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

impl WpUpdater {
    /// Create a waypoint updater with the given parameters, without a
    /// session.
    pub fn with_params(params: Params) -> Result<Self, WpUpdaterError> {
        if params.lookahead_wps == 0 {
            return Err(WpUpdaterError::ZeroLookahead);
        }

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    /// Build the window starting at `vehicle_wp`, braking if `stop_index`
    /// falls before the end of the window.
    pub fn window(
        &self,
        route: &Route,
        vehicle_wp: usize,
        stop_index: Option<usize>,
    ) -> TrajectoryWindow {
        let lookahead = self.params.lookahead_wps;
        let mut window = TrajectoryWindow::assemble(route, vehicle_wp, lookahead);

        if let Some(stop) = stop_index {
            if stop < vehicle_wp + lookahead {
                window.apply_braking(
                    brake_index(stop, vehicle_wp, self.params.stop_buffer_wps),
                    self.params.max_decel_mss,
                    self.params.min_speed_ms,
                );
            }
        }

        window
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route::Waypoint;
    use nalgebra::Vector3;

    fn line_route(num: usize) -> Arc<Route> {
        Arc::new(
            Route::new(
                (0..num)
                    .map(|i| Waypoint::new(Vector3::new(i as f64, 0.0, 0.0), 0.0, 10.0))
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn input(x: f64, stop_index: Option<usize>) -> InputData {
        InputData {
            route: Some(line_route(100)),
            pose: Some(Pose::new(Vector3::new(x, 0.2, 0.0), 0.0)),
            stop_index,
        }
    }

    #[test]
    fn test_no_stop() {
        let mut wu = WpUpdater::with_params(Params::default()).unwrap();

        let (w, r) = wu.proc(&input(50.0, None)).unwrap();
        let w = w.unwrap();

        assert_eq!(w.start_index, 50);
        assert_eq!(w.len(), 40);
        assert_eq!(w.waypoints[39].position_m[0], 89.0);
        assert!(w.waypoints.iter().all(|w| w.speed_ms == 10.0));
        assert_eq!(r.vehicle_wp, Some(50));
        assert_eq!(r.brake_index, None);
    }

    #[test]
    fn test_vehicle_past_waypoint() {
        let mut wu = WpUpdater::with_params(Params::default()).unwrap();

        let (w, _) = wu.proc(&input(50.3, None)).unwrap();
        assert_eq!(w.unwrap().start_index, 51);
    }

    #[test]
    fn test_stop_in_window() {
        let mut wu = WpUpdater::with_params(Params::default()).unwrap();

        let (w, r) = wu.proc(&input(50.0, Some(60))).unwrap();
        let w = w.unwrap();

        assert_eq!(r.brake_index, Some(6));
        assert_eq!(w.waypoints[6].position_m[0], 56.0);
        assert_eq!(w.waypoints[6].speed_ms, 0.0);
        assert!(w.waypoints[10..].iter().all(|w| w.speed_ms == 0.0));
        assert!((w.waypoints[0].speed_ms - 6f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_stop_outside_window() {
        let mut wu = WpUpdater::with_params(Params::default()).unwrap();

        // Exactly at the end of the window is outside it
        let (w, r) = wu.proc(&input(50.0, Some(90))).unwrap();
        assert_eq!(r.brake_index, None);
        assert!(w.unwrap().waypoints.iter().all(|w| w.speed_ms == 10.0));

        let (_, r) = wu.proc(&input(50.0, Some(89))).unwrap();
        assert_eq!(r.brake_index, Some(35));
    }

    #[test]
    fn test_stop_behind_vehicle() {
        let mut wu = WpUpdater::with_params(Params::default()).unwrap();

        let (w, r) = wu.proc(&input(50.0, Some(49))).unwrap();
        assert_eq!(r.brake_index, Some(0));
        assert!(w.unwrap().waypoints.iter().all(|w| w.speed_ms == 0.0));
    }

    #[test]
    fn test_missing_inputs() {
        let mut wu = WpUpdater::with_params(Params::default()).unwrap();

        let mut no_pose = input(50.0, None);
        no_pose.pose = None;
        let (w, r) = wu.proc(&no_pose).unwrap();
        assert!(w.is_none());
        assert_eq!(r.vehicle_wp, None);

        let mut no_route = input(50.0, None);
        no_route.route = None;
        assert!(wu.proc(&no_route).unwrap().0.is_none());
    }

    #[test]
    fn test_zero_lookahead() {
        let params = Params {
            lookahead_wps: 0,
            ..Default::default()
        };
        assert!(matches!(
            WpUpdater::with_params(params),
            Err(WpUpdaterError::ZeroLookahead)
        ));
    }
}
