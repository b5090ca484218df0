//! Static 2-D point indexes for radius queries
//!
//! The grid buckets points by cell so a radius query only visits the cells the
//! query circle can reach. Brute force stays available for small inputs and as
//! a reference implementation.

use crate::geo::Point;
use std::collections::HashMap;

/// Below this many points a linear scan beats building a grid
pub const BRUTE_FORCE_LIMIT: usize = 256;

/// Radius queries over a fixed set of points
pub trait SpatialIndex {
    /// Indices of every point within `radius` of `(x, y)`, boundary included.
    /// No ordering guarantee.
    fn within(&self, x: f64, y: f64, radius: f64) -> Vec<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pick an index implementation suited to the input size.
/// `cell_size` should be close to the typical query radius.
pub fn build_index(points: &[Point], cell_size: f64) -> Box<dyn SpatialIndex> {
    if points.len() < BRUTE_FORCE_LIMIT {
        Box::new(BruteForceIndex::build(points))
    } else {
        Box::new(GridIndex::build(points, cell_size))
    }
}

#[inline]
fn in_radius(p: &Point, x: f64, y: f64, radius: f64) -> bool {
    let dx = p.x - x;
    let dy = p.y - y;
    dx * dx + dy * dy <= radius * radius
}

/// Linear scan over all points
#[derive(Debug, Clone)]
pub struct BruteForceIndex {
    points: Vec<Point>,
}

impl BruteForceIndex {
    pub fn build(points: &[Point]) -> Self {
        Self { points: points.to_vec() }
    }
}

impl SpatialIndex for BruteForceIndex {
    fn within(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        if radius < 0.0 {
            return Vec::new();
        }
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| in_radius(p, x, y, radius))
            .map(|(i, _)| i)
            .collect()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Uniform spatial hash grid
#[derive(Debug, Clone)]
pub struct GridIndex {
    /// Size of each cell in the grid
    cell_size: f64,
    /// Map from cell coordinates to the points inside that cell
    cells: HashMap<(i64, i64), Vec<usize>>,
    points: Vec<Point>,
}

impl GridIndex {
    /// Build a grid over the points. Non-finite points are never returned.
    pub fn build(points: &[Point], cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { 1.0 };
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();

        for (i, p) in points.iter().enumerate() {
            if !(p.x.is_finite() && p.y.is_finite()) {
                continue;
            }
            cells
                .entry((Self::cell_of(p.x, cell_size), Self::cell_of(p.y, cell_size)))
                .or_default()
                .push(i);
        }

        Self { cell_size, cells, points: points.to_vec() }
    }

    fn cell_of(v: f64, cell_size: f64) -> i64 {
        (v / cell_size).floor() as i64
    }
}

impl SpatialIndex for GridIndex {
    fn within(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        if radius < 0.0 || !(x.is_finite() && y.is_finite() && radius.is_finite()) {
            return Vec::new();
        }

        let min_x = Self::cell_of(x - radius, self.cell_size);
        let max_x = Self::cell_of(x + radius, self.cell_size);
        let min_y = Self::cell_of(y - radius, self.cell_size);
        let max_y = Self::cell_of(y + radius, self.cell_size);

        let span = max_x
            .saturating_sub(min_x)
            .saturating_add(1)
            .saturating_mul(max_y.saturating_sub(min_y).saturating_add(1));
        let mut result = Vec::new();

        // A query wider than the occupied grid is cheaper as a scan of the cells
        if span as usize > self.cells.len() {
            for ((cx, cy), members) in &self.cells {
                if (min_x..=max_x).contains(cx) && (min_y..=max_y).contains(cy) {
                    result.extend(members.iter().copied().filter(|&i| {
                        in_radius(&self.points[i], x, y, radius)
                    }));
                }
            }
            return result;
        }

        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                if let Some(members) = self.cells.get(&(cx, cy)) {
                    result.extend(members.iter().copied().filter(|&i| {
                        in_radius(&self.points[i], x, y, radius)
                    }));
                }
            }
        }
        result
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}
