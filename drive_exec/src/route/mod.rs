//! # Route module
//!
//! The route is the fixed, logically circular sequence of waypoints the vehicle
//! drives around. It is delivered once from an external source (a CSV file or
//! a lane message) and is read-only afterwards, except for the reference
//! speeds which may be refreshed by a later delivery of the same geometry.
//!
//! Every route owns a [`WaypointIndex`], a spatial index over the waypoint
//! positions used by both traffic light fusion and the waypoint updater to
//! find the waypoint nearest to a point.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod index;
mod loader;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use comms_if::msg::{LaneMsg, WaypointMsg};
use log::{info, warn};
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

pub use index::WaypointIndex;
pub use loader::{circular_route, load_csv};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single waypoint on the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position of the waypoint in the map frame.
    ///
    /// Units: meters
    pub position_m: Vector3<f64>,

    /// Heading of the route at this waypoint.
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Reference (speed limit) speed at this waypoint, positive forwards.
    ///
    /// Units: meters/second
    pub speed_ms: f64,
}

/// An immutable route with its spatial index.
///
/// Cloning a route is cheap for the index, which is shared.
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<Waypoint>,
    index: Arc<WaypointIndex>,
}

/// Holds the current route and applies route deliveries to it.
///
/// The spatial index is built on the first delivery only. Later deliveries
/// may refresh the reference speeds, but a delivery which moves any waypoint
/// is rejected and the current route is kept.
#[derive(Debug, Default)]
pub struct RouteMgr {
    route: Option<Arc<Route>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of delivering a route to the [`RouteMgr`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RouteUpdate {
    /// This was the first route, the index has been built.
    Built,

    /// The route geometry matched the current route, reference speeds were
    /// replaced.
    SpeedsUpdated,

    /// The route was identical to the current one.
    Unchanged,
}

/// Errors associated with building or loading a route.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("The route contains no waypoints")]
    EmptyRoute,

    #[error("Waypoint {0} has a non-finite position")]
    NonFiniteWaypoint(usize),

    #[error(
        "A route with different geometry was delivered ({new} waypoints, current route has \
         {current}), replacing the route is not supported"
    )]
    ReplacementNotSupported { current: usize, new: usize },

    #[error("Could not build the waypoint index: {0}")]
    IndexError(util::quadtree::QuadTreeError),

    #[error("Could not read the route file: {0}")]
    CsvError(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    pub fn new(position_m: Vector3<f64>, yaw_rad: f64, speed_ms: f64) -> Self {
        Self {
            position_m,
            yaw_rad,
            speed_ms,
        }
    }

    /// Position of the waypoint on the ground plane.
    pub fn position_2d(&self) -> Vector2<f64> {
        self.position_m.xy()
    }

    pub fn from_msg(msg: &WaypointMsg) -> Self {
        Self {
            position_m: Vector3::from(msg.position_m),
            yaw_rad: msg.yaw_rad,
            speed_ms: msg.speed_ms,
        }
    }

    pub fn to_msg(&self) -> WaypointMsg {
        WaypointMsg {
            position_m: self.position_m.into(),
            yaw_rad: self.yaw_rad,
            speed_ms: self.speed_ms,
        }
    }
}

impl Route {
    /// Build a new route, including its spatial index.
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, RouteError> {
        let points: Vec<Vector2<f64>> = waypoints.iter().map(|w| w.position_2d()).collect();
        let index = WaypointIndex::build(&points)?;

        Ok(Self {
            waypoints,
            index: Arc::new(index),
        })
    }

    /// Number of waypoints in the route, never zero.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Get the waypoint at `index`, wrapping around the end of the route.
    pub fn waypoint(&self, index: usize) -> &Waypoint {
        &self.waypoints[index % self.waypoints.len()]
    }

    pub fn index(&self) -> &WaypointIndex {
        &self.index
    }

    /// Index of the waypoint nearest to `point`, regardless of direction.
    pub fn nearest(&self, point: &Vector2<f64>) -> usize {
        self.index.nearest(point)
    }

    /// Index of the nearest waypoint which is not behind `point`.
    pub fn nearest_ahead(&self, point: &Vector2<f64>) -> usize {
        self.index.nearest_ahead(point)
    }

    /// True if `other` has the same waypoint positions as this route.
    fn same_geometry(&self, other: &[Waypoint]) -> bool {
        self.waypoints.len() == other.len()
            && self
                .waypoints
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.position_m == b.position_m)
    }
}

impl RouteMgr {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current route, if one has been delivered.
    pub fn route(&self) -> Option<Arc<Route>> {
        self.route.clone()
    }

    /// Apply a route delivered as a lane message.
    pub fn deliver_msg(&mut self, msg: &LaneMsg) -> Result<RouteUpdate, RouteError> {
        self.deliver(msg.waypoints.iter().map(Waypoint::from_msg).collect())
    }

    /// Apply a route delivery.
    pub fn deliver(&mut self, waypoints: Vec<Waypoint>) -> Result<RouteUpdate, RouteError> {
        let current = match self.route {
            Some(ref r) => r,
            None => {
                let route = Route::new(waypoints)?;
                info!("Route received, {} waypoints indexed", route.len());
                self.route = Some(Arc::new(route));
                return Ok(RouteUpdate::Built);
            }
        };

        if !current.same_geometry(&waypoints) {
            warn!(
                "Rejecting route delivery of {} waypoints, the current route is kept",
                waypoints.len()
            );
            return Err(RouteError::ReplacementNotSupported {
                current: current.len(),
                new: waypoints.len(),
            });
        }

        if current.waypoints[..] == waypoints[..] {
            return Ok(RouteUpdate::Unchanged);
        }

        // Geometry is unchanged so the existing index still applies
        let route = Route {
            waypoints,
            index: current.index.clone(),
        };
        self.route = Some(Arc::new(route));

        Ok(RouteUpdate::SpeedsUpdated)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn line_route(num: usize, speed_ms: f64) -> Vec<Waypoint> {
        (0..num)
            .map(|i| Waypoint::new(Vector3::new(i as f64, 0.0, 0.0), 0.0, speed_ms))
            .collect()
    }

    #[test]
    fn test_route_new() {
        let route = Route::new(line_route(10, 5.0)).unwrap();
        assert_eq!(route.len(), 10);
        assert_eq!(route.waypoint(12).position_m[0], 2.0);
        assert_eq!(route.nearest(&Vector2::new(3.2, 1.0)), 3);

        assert!(matches!(Route::new(vec![]), Err(RouteError::EmptyRoute)));
    }

    #[test]
    fn test_route_mgr_delivery() {
        let mut mgr = RouteMgr::new();
        assert!(mgr.route().is_none());

        assert_eq!(mgr.deliver(line_route(10, 5.0)).unwrap(), RouteUpdate::Built);
        let built = mgr.route().unwrap();

        assert_eq!(mgr.deliver(line_route(10, 5.0)).unwrap(), RouteUpdate::Unchanged);
        assert!(Arc::ptr_eq(&built.index, &mgr.route().unwrap().index));

        assert_eq!(
            mgr.deliver(line_route(10, 7.0)).unwrap(),
            RouteUpdate::SpeedsUpdated
        );

        // New speeds, but the index built on first delivery is kept
        let route = mgr.route().unwrap();
        assert_eq!(route.waypoint(0).speed_ms, 7.0);
        assert!(!Arc::ptr_eq(&built, &route));
        assert!(Arc::ptr_eq(&built.index, &route.index));

        // Different geometry keeps the old route
        assert!(matches!(
            mgr.deliver(line_route(12, 7.0)),
            Err(RouteError::ReplacementNotSupported {
                current: 10,
                new: 12
            })
        ));
        assert_eq!(mgr.route().unwrap().len(), 10);
        assert!(Arc::ptr_eq(&built.index, &mgr.route().unwrap().index));
    }

    #[test]
    fn test_route_mgr_deliver_msg() {
        let msg = LaneMsg {
            timestamp: chrono::Utc::now(),
            waypoints: line_route(5, 3.0).iter().map(|w| w.to_msg()).collect(),
        };

        let mut mgr = RouteMgr::new();
        assert_eq!(mgr.deliver_msg(&msg).unwrap(), RouteUpdate::Built);
        assert_eq!(mgr.deliver_msg(&msg).unwrap(), RouteUpdate::Unchanged);

        let route = mgr.route().unwrap();
        assert_eq!(route.len(), 5);
        assert_eq!(route.waypoint(4).position_m, Vector3::new(4.0, 0.0, 0.0));
        assert_eq!(route.waypoint(4).speed_ms, 3.0);
    }
}
