//! Trajectory window assembly and braking

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use comms_if::msg::LaneMsg;
use serde::Serialize;

use crate::route::{Route, Waypoint};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A window of waypoints ahead of the vehicle, with target speeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryWindow {
    /// Route index of the first waypoint in the window
    pub start_index: usize,

    /// Window index at which the vehicle should be at rest, if braking
    pub brake_index: Option<usize>,

    /// Copies of the route waypoints, speeds replaced by the braking profile
    /// if braking
    pub waypoints: Vec<Waypoint>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectoryWindow {
    /// Copy `lookahead` waypoints from the route starting at `start_index`,
    /// wrapping around the end of the route.
    ///
    /// A route shorter than the lookahead is repeated to fill the window.
    pub fn assemble(route: &Route, start_index: usize, lookahead: usize) -> Self {
        let start_index = start_index % route.len();

        let waypoints = (start_index..start_index + lookahead)
            .map(|i| *route.waypoint(i))
            .collect();

        Self {
            start_index,
            brake_index: None,
            waypoints,
        }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn is_braking(&self) -> bool {
        self.brake_index.is_some()
    }

    /// Replace the window's speeds with a profile which decelerates at
    /// `decel_mss` to rest at window index `brake_index`.
    ///
    /// Speeds are never raised above the route's speed at each waypoint, and
    /// speeds below `min_speed_ms` are set to zero. Waypoints at and after
    /// `brake_index` are zero.
    pub fn apply_braking(&mut self, brake_index: usize, decel_mss: f64, min_speed_ms: f64) {
        if self.waypoints.is_empty() {
            return;
        }

        let brake_index = brake_index.min(self.waypoints.len() - 1);
        let cumulative = self.cumulative_distances();

        for (i, wp) in self.waypoints.iter_mut().enumerate() {
            let dist = if i < brake_index {
                cumulative[brake_index] - cumulative[i]
            } else {
                0.0
            };

            let mut speed = (2.0 * decel_mss * dist).sqrt();
            if speed < min_speed_ms {
                speed = 0.0;
            }

            wp.speed_ms = speed.min(wp.speed_ms);
        }

        self.brake_index = Some(brake_index);
    }

    /// Distance along the window from the first waypoint to each waypoint.
    pub fn cumulative_distances(&self) -> Vec<f64> {
        let mut dists = Vec::with_capacity(self.waypoints.len());
        let mut total = 0.0;

        for (i, wp) in self.waypoints.iter().enumerate() {
            if i > 0 {
                total += (wp.position_m - self.waypoints[i - 1].position_m).norm();
            }
            dists.push(total);
        }

        dists
    }

    pub fn to_msg(&self, timestamp: DateTime<Utc>) -> LaneMsg {
        LaneMsg {
            timestamp,
            waypoints: self.waypoints.iter().map(|w| w.to_msg()).collect(),
        }
    }
}

/// Window index at which the vehicle must be at rest to stop `buffer_wps`
/// waypoints short of `stop_index`.
///
/// A stop index behind the vehicle gives zero, stopping as soon as possible.
pub fn brake_index(stop_index: usize, vehicle_index: usize, buffer_wps: usize) -> usize {
    let diff = stop_index as i64 - (vehicle_index + buffer_wps) as i64;

    diff.max(0) as usize
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    fn line_route(num: usize, spacing_m: f64, speed_ms: f64) -> Route {
        Route::new(
            (0..num)
                .map(|i| Waypoint::new(Vector3::new(i as f64 * spacing_m, 0.0, 0.0), 0.0, speed_ms))
                .collect(),
        )
        .unwrap()
    }

    fn xs(window: &TrajectoryWindow) -> Vec<usize> {
        window
            .waypoints
            .iter()
            .map(|w| w.position_m[0].round() as usize)
            .collect()
    }

    #[test]
    fn test_assemble() {
        let route = line_route(100, 1.0, 10.0);

        let w = TrajectoryWindow::assemble(&route, 50, 40);
        assert_eq!(xs(&w), (50..90).collect::<Vec<_>>());
        assert!(w.waypoints.iter().all(|w| w.speed_ms == 10.0));
        assert!(!w.is_braking());
    }

    #[test]
    fn test_assemble_wraps() {
        let route = line_route(100, 1.0, 10.0);

        let w = TrajectoryWindow::assemble(&route, 98, 40);
        let expected: Vec<usize> = vec![98, 99].into_iter().chain(0..38).collect();
        assert_eq!(xs(&w), expected);

        for start in 0..100 {
            assert_eq!(TrajectoryWindow::assemble(&route, start, 40).len(), 40);
        }
    }

    #[test]
    fn test_assemble_short_route_repeats() {
        let route = line_route(10, 1.0, 10.0);

        let w = TrajectoryWindow::assemble(&route, 7, 25);
        assert_eq!(w.len(), 25);
        assert_eq!(&xs(&w)[..5], &[7, 8, 9, 0, 1]);
        assert_eq!(xs(&w)[13], 0);
    }

    #[test]
    fn test_brake_index() {
        assert_eq!(brake_index(60, 50, 4), 6);
        assert_eq!(brake_index(54, 50, 4), 0);
        assert_eq!(brake_index(40, 50, 4), 0);
    }

    #[test]
    fn test_braking_profile() {
        let route = line_route(100, 1.0, 3.0);
        let mut w = TrajectoryWindow::assemble(&route, 50, 40);

        w.apply_braking(brake_index(60, 50, 4), 0.5, 1.0);
        assert_eq!(w.brake_index, Some(6));

        let speeds: Vec<f64> = w.waypoints.iter().map(|w| w.speed_ms).collect();

        // Waypoint 56 and everything after is at rest
        assert!(speeds[6..].iter().all(|&s| s == 0.0));

        // Before that v = sqrt(2 * 0.5 * d), capped at the route speed
        for i in 0..6 {
            let d = (6 - i) as f64;
            let v = d.sqrt();
            let expected = if v < 1.0 { 0.0 } else { v.min(3.0) };
            assert!((speeds[i] - expected).abs() < 1e-12);
        }
        assert!((speeds[0] - 6f64.sqrt()).abs() < 1e-12);

        // Non-increasing towards the brake index
        for pair in speeds.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_braking_respects_route_speed() {
        let route = line_route(100, 2.0, 2.5);
        let mut w = TrajectoryWindow::assemble(&route, 0, 40);

        w.apply_braking(30, 0.5, 1.0);

        assert_eq!(w.waypoints[0].speed_ms, 2.5);
        // sqrt(2 * 0.5 * 4) = 2, below the route speed
        assert!((w.waypoints[28].speed_ms - 2.0).abs() < 1e-12);
        // sqrt(2 * 0.5 * 2) is above the snap threshold
        assert!((w.waypoints[29].speed_ms - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(w.waypoints[30].speed_ms, 0.0);
    }

    #[test]
    fn test_braking_over_wrap() {
        let route = line_route(100, 1.0, 10.0);
        let mut w = TrajectoryWindow::assemble(&route, 95, 40);

        // Waypoint 99 to 0 is a 99 m jump on this route
        w.apply_braking(10, 0.5, 1.0);
        let d = w.cumulative_distances();
        assert!((d[5] - 103.0).abs() < 1e-9);
        assert_eq!(w.waypoints[10].speed_ms, 0.0);
        assert_eq!(w.waypoints[0].speed_ms, 10.0);
    }
}
