//! # Waypoint index
//!
//! Nearest waypoint queries over the route, backed by the point quadtree in
//! `util`. Queries are undirected, [`WaypointIndex::nearest_ahead`] adds the
//! half-plane correction which skips a waypoint the vehicle has already
//! passed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use util::{
    maths::wrap_index,
    quadtree::{QuadTree, QuadTreeError},
};

use super::RouteError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Spatial index over the 2D positions of the route's waypoints.
///
/// The index is never modified after it is built.
#[derive(Debug, Clone)]
pub struct WaypointIndex {
    points: Vec<Vector2<f64>>,
    tree: QuadTree,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointIndex {
    /// Build the index from the route's waypoint positions, in route order.
    pub fn build(points: &[Vector2<f64>]) -> Result<Self, RouteError> {
        let tree = QuadTree::from_points(points).map_err(|e| match e {
            QuadTreeError::NoPoints => RouteError::EmptyRoute,
            QuadTreeError::NonFinitePoint(i) => RouteError::NonFiniteWaypoint(i),
            e => RouteError::IndexError(e),
        })?;

        Ok(Self {
            points: points.to_vec(),
            tree,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position of the waypoint at `index`, wrapping around the route.
    pub fn position(&self, index: usize) -> &Vector2<f64> {
        &self.points[index % self.points.len()]
    }

    /// Index of the waypoint nearest to `point` by euclidean distance.
    ///
    /// If several waypoints are equally near the lowest index is returned.
    pub fn nearest(&self, point: &Vector2<f64>) -> usize {
        // The tree always holds at least one point
        self.tree.nearest(point).map(|(i, _)| i).unwrap_or(0)
    }

    /// Returns `true` if the waypoint at `index` is not behind `point` with
    /// respect to the direction of travel along the route.
    ///
    /// The direction of travel at `index` is taken from the previous waypoint,
    /// so the waypoint is behind when `point` lies on the far side of the
    /// plane through it, normal to that direction.
    pub fn is_ahead(&self, point: &Vector2<f64>, index: usize) -> bool {
        let closest = self.position(index);
        let prev = &self.points[wrap_index(index as i64 - 1, self.points.len())];

        (closest - prev).dot(&(point - closest)) <= 0.0
    }

    /// Index of the nearest waypoint to `point` which is not behind it.
    pub fn nearest_ahead(&self, point: &Vector2<f64>) -> usize {
        let index = self.nearest(point);

        if self.is_ahead(point, index) {
            index
        } else {
            (index + 1) % self.points.len()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Equally spaced points along the x axis.
    fn line(num: usize) -> Vec<Vector2<f64>> {
        (0..num).map(|i| Vector2::new(i as f64, 0.0)).collect()
    }

    /// Points around a circle, anticlockwise.
    fn circle(num: usize, radius: f64) -> Vec<Vector2<f64>> {
        (0..num)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * (i as f64) / (num as f64);
                Vector2::new(radius * theta.cos(), radius * theta.sin())
            })
            .collect()
    }

    #[test]
    fn test_nearest_is_minimum_distance() {
        let points = circle(360, 50.0);
        let index = WaypointIndex::build(&points).unwrap();

        for &(x, y) in [(0.0, 0.0), (49.0, 1.0), (-60.0, 10.0), (3.0, -51.0), (200.0, 0.0)].iter()
        {
            let p = Vector2::new(x, y);
            let i = index.nearest(&p);
            let d = (points[i] - p).norm();

            for q in points.iter() {
                assert!(d <= (q - p).norm() + 1e-12);
            }
        }
    }

    #[test]
    fn test_nearest_ahead() {
        let index = WaypointIndex::build(&line(100)).unwrap();

        // Just past waypoint 50, so 50 is behind
        assert_eq!(index.nearest(&Vector2::new(50.2, 0.3)), 50);
        assert!(!index.is_ahead(&Vector2::new(50.2, 0.3), 50));
        assert_eq!(index.nearest_ahead(&Vector2::new(50.2, 0.3)), 51);

        // Just before waypoint 50
        assert_eq!(index.nearest_ahead(&Vector2::new(49.8, -0.3)), 50);

        // Exactly on a waypoint counts as ahead
        assert_eq!(index.nearest_ahead(&Vector2::new(50.0, 0.0)), 50);
    }

    #[test]
    fn test_nearest_ahead_wraps() {
        let points = circle(100, 20.0);
        let index = WaypointIndex::build(&points).unwrap();

        // Slightly past the last waypoint in the direction of travel
        let p = points[99] + (points[0] - points[99]) * 0.2;
        assert_eq!(index.nearest(&p), 99);
        assert_eq!(index.nearest_ahead(&p), 0);

        // Waypoint 0 uses waypoint 99 as its previous
        let p = points[0] + (points[1] - points[0]) * 0.2;
        assert_eq!(index.nearest(&p), 0);
        assert_eq!(index.nearest_ahead(&p), 1);
    }

    #[test]
    fn test_nearest_ahead_is_neighbour() {
        let points = circle(50, 10.0);
        let index = WaypointIndex::build(&points).unwrap();

        for k in 0..200 {
            let theta = (k as f64) * 0.031;
            let p = Vector2::new(10.3 * theta.cos(), 10.3 * theta.sin());

            let nearest = index.nearest(&p);
            let ahead = index.nearest_ahead(&p);
            assert!(ahead == nearest || ahead == (nearest + 1) % points.len());
        }
    }

    #[test]
    fn test_single_point() {
        let index = WaypointIndex::build(&[Vector2::new(1.0, 1.0)]).unwrap();
        assert_eq!(index.nearest_ahead(&Vector2::new(5.0, 5.0)), 0);
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            WaypointIndex::build(&[]),
            Err(RouteError::EmptyRoute)
        ));
        assert!(matches!(
            WaypointIndex::build(&[Vector2::new(0.0, 0.0), Vector2::new(std::f64::INFINITY, 0.0)]),
            Err(RouteError::NonFiniteWaypoint(1))
        ));
    }
}
