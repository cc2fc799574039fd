//! # Quadtree Implementation
//!
//! This is an implementation of a point quadtree, as described in [the
//! wikipedia article](https://en.wikipedia.org/wiki/Quadtree). Each point is
//! stored alongside the index it was inserted with so that nearest neighbour
//! queries can report which input point was found.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use nalgebra::Vector2;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of points per QuadTree node before it is subdivided
pub const CAPACITY: usize = 4;

/// Maximum depth of the tree. Nodes at this depth never subdivide, which stops
/// repeated (coincident) points from recursing forever.
pub const MAX_DEPTH: usize = 24;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Represents a quad with a centre and half-width.
///
/// A quad covers the half open square `[centre - half_width, centre +
/// half_width)` in each axis, so that the four children of a node partition
/// it exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quad {
    centre: Vector2<f64>,
    half_width: f64
}

/// A point stored in the tree along with its index.
#[derive(Debug, Clone, Copy)]
struct Entry {
    point: Vector2<f64>,
    index: usize
}

/// An implementation of a QuadTree
#[derive(Clone, Debug)]
pub struct QuadTree {
    /// The bounds of this node
    boundary: Quad,

    /// Depth of this node, 0 for the root
    depth: usize,

    /// Points stored in this node
    entries: Vec<Entry>,

    /// North West child of the node
    north_west: Option<Box<QuadTree>>,

    /// North East child of the node
    north_east: Option<Box<QuadTree>>,

    /// South West child of the node
    south_west: Option<Box<QuadTree>>,

    /// South East child of the node
    south_east: Option<Box<QuadTree>>
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum QuadTreeError {
    #[error("The given point {0} was not in the bounds of the quadtree {1:?}")]
    PointNotInBounds(Vector2<f64>, Quad),

    #[error("Point {0} is not finite")]
    NonFinitePoint(usize),

    #[error("Cannot build a quadtree from an empty set of points")]
    NoPoints,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Quad {
    /// Creates a new quad with the given `centre` and `half_width`.
    pub fn new(centre: Vector2<f64>, half_width: f64) -> Self {
        Self {
            centre,
            half_width
        }
    }

    /// Create the smallest square quad (plus a small margin) bounding all of
    /// the given points.
    ///
    /// Returns `None` if there are no points.
    pub fn bounding(points: &[Vector2<f64>]) -> Option<Self> {
        let first = points.first()?;

        let mut min = *first;
        let mut max = *first;
        for p in points.iter() {
            min = min.inf(p);
            max = max.sup(p);
        }

        let centre = (min + max) * 0.5;
        let extent = (max - min).max() * 0.5;

        // Pad the extent so points on the max edges are inside the half open
        // bounds, and so a single point still has a non-zero sized quad.
        Some(Self::new(centre, extent * 1.01 + 1.0))
    }

    /// Returns `true` if `point` is inside this [`Quad`]
    pub fn contains(&self, point: &Vector2<f64>) -> bool {
        (self.centre[0] - self.half_width) <= point[0]
        && (self.centre[0] + self.half_width) > point[0]
        && (self.centre[1] - self.half_width) <= point[1]
        && (self.centre[1] + self.half_width) > point[1]
    }

    /// Squared distance from `point` to the closest point of this quad, zero
    /// if the point is inside the quad.
    pub fn dist_sq(&self, point: &Vector2<f64>) -> f64 {
        let dx = ((point[0] - self.centre[0]).abs() - self.half_width).max(0.0);
        let dy = ((point[1] - self.centre[1]).abs() - self.half_width).max(0.0);

        dx * dx + dy * dy
    }
}

impl QuadTree {
    pub fn new(boundary: Quad) -> Self {
        Self::new_at_depth(boundary, 0)
    }

    fn new_at_depth(boundary: Quad, depth: usize) -> Self {
        Self {
            boundary,
            depth,
            entries: Vec::new(),
            north_west: None,
            north_east: None,
            south_west: None,
            south_east: None,
        }
    }

    /// Build a tree containing all the given points, each stored with its
    /// index in the slice.
    pub fn from_points(points: &[Vector2<f64>]) -> Result<Self, QuadTreeError> {
        if let Some(i) = points
            .iter()
            .position(|p| !(p[0].is_finite() && p[1].is_finite()))
        {
            return Err(QuadTreeError::NonFinitePoint(i));
        }

        let boundary = Quad::bounding(points).ok_or(QuadTreeError::NoPoints)?;
        let mut tree = Self::new(boundary);

        for (index, point) in points.iter().enumerate() {
            tree.insert(*point, index)?;
        }

        Ok(tree)
    }

    /// Insert a point into the QuadTree with the given index.
    pub fn insert(&mut self, point: Vector2<f64>, index: usize) -> Result<(), QuadTreeError> {

        // Check if it's in the tree
        if !self.boundary.contains(&point) {
            return Err(QuadTreeError::PointNotInBounds(point, self.boundary));
        }

        // If there's a space in the tree and it's not been divided add it to
        // the points list. Nodes at the maximum depth take every point.
        if self.north_west.is_none()
            && (self.entries.len() < CAPACITY || self.depth >= MAX_DEPTH)
        {
            self.entries.push(Entry { point, index });
            return Ok(())
        }

        // Otherwise subdivide if needed
        if self.north_west.is_none() {
            self.subdivide();
        }

        // The children partition this node so exactly one will accept the
        // point.
        for child in self.children_mut() {
            if child.boundary.contains(&point) {
                return child.insert(point, index);
            }
        }

        Err(QuadTreeError::PointNotInBounds(point, self.boundary))
    }

    /// Find the stored point nearest to `point`.
    ///
    /// Returns the index of the nearest point and the (non-squared) distance
    /// to it, or `None` if the tree is empty. If several points are equally
    /// near the lowest index is returned.
    pub fn nearest(&self, point: &Vector2<f64>) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;

        self.nearest_in(point, &mut best);

        best.map(|(i, d_sq)| (i, d_sq.sqrt()))
    }

    /// Return the number of points stored in the tree.
    pub fn len(&self) -> usize {
        self.entries.len()
            + match self.children() {
                Some(children) => children.iter().map(|c| c.len()).sum(),
                None => 0
            }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Branch and bound search, `best` holds the squared distance.
    fn nearest_in(&self, point: &Vector2<f64>, best: &mut Option<(usize, f64)>) {
        // If this whole node is further than the current best there's no need
        // to search it. Equal distances are searched so ties resolve to the
        // lowest index.
        if let Some((_, best_d_sq)) = *best {
            if self.boundary.dist_sq(point) > best_d_sq {
                return
            }
        }

        for entry in self.entries.iter() {
            let d_sq = (entry.point - point).norm_squared();

            let is_better = match *best {
                Some((best_i, best_d_sq)) =>
                    d_sq < best_d_sq || (d_sq == best_d_sq && entry.index < best_i),
                None => true
            };

            if is_better {
                *best = Some((entry.index, d_sq));
            }
        }

        // Search the children closest first so that the bound tightens
        // quickly.
        if let Some(mut children) = self.children() {
            children.sort_by(|a, b| {
                a.boundary.dist_sq(point).total_cmp(&b.boundary.dist_sq(point))
            });

            for child in children.iter() {
                child.nearest_in(point, best);
            }
        }
    }

    fn children(&self) -> Option<[&QuadTree; 4]> {
        match (&self.north_west, &self.north_east, &self.south_west, &self.south_east) {
            (Some(nw), Some(ne), Some(sw), Some(se)) => Some([&**nw, &**ne, &**sw, &**se]),
            _ => None
        }
    }

    fn children_mut(&mut self) -> Vec<&mut QuadTree> {
        let mut children = Vec::with_capacity(4);

        for child in [
            &mut self.north_west,
            &mut self.north_east,
            &mut self.south_west,
            &mut self.south_east,
        ] {
            if let Some(qt) = child {
                children.push(qt.as_mut());
            }
        }

        children
    }

    fn subdivide(&mut self) {
        let hw = self.boundary.half_width / 2.0;
        let depth = self.depth + 1;
        let centre = self.boundary.centre;

        let child = |dx: f64, dy: f64| {
            Some(Box::new(QuadTree::new_at_depth(
                Quad::new(centre + Vector2::new(dx, dy), hw),
                depth
            )))
        };

        self.north_west = child(-hw, hw);
        self.north_east = child(hw, hw);
        self.south_west = child(-hw, -hw);
        self.south_east = child(hw, -hw);
    }
}
