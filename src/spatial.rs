//! Spatial indexing for fast position-to-cell lookups
//!
//! This module is only available with the `spatial-index` feature.

use glam::Vec2;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

use crate::cell::CellId;

/// KD-tree over the centers of a finished level's wall cells
///
/// Unlike the generation-time [`CellGrid`](crate::grid::CellGrid), this index
/// has no search radius: every query returns the nearest wall cell, however
/// far away it is.
///
/// # Performance
///
/// - Construction: O(n log n), built once at the end of generation
/// - Query: O(log n)
#[derive(Clone)]
pub struct SpatialIndex {
    tree: Option<ImmutableKdTree<f32, usize, 2, 32>>,
    cells: Vec<CellId>,
}

impl SpatialIndex {
    /// Build the index from `(cell, center)` pairs
    ///
    /// # Example
    ///
    /// ```
    /// use rust_voronoi_cave::*;
    /// use glam::Vec2;
    ///
    /// let index = SpatialIndex::new(&[
    ///     (CellId(4), Vec2::new(0.0, 0.0)),
    ///     (CellId(9), Vec2::new(1000.0, 0.0)),
    /// ]);
    /// assert_eq!(index.find_nearest(Vec2::new(900.0, 50.0)), Some(CellId(9)));
    /// ```
    pub fn new(centers: &[(CellId, Vec2)]) -> Self {
        let points: Vec<[f32; 2]> = centers.iter().map(|(_, c)| [c.x, c.y]).collect();

        Self {
            tree: (!points.is_empty()).then(|| ImmutableKdTree::new_from_slice(&points)),
            cells: centers.iter().map(|(id, _)| *id).collect(),
        }
    }

    /// Number of indexed cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Find the wall cell whose center is nearest to a position
    ///
    /// Returns `None` only for an empty index.
    pub fn find_nearest(&self, position: Vec2) -> Option<CellId> {
        let tree = self.tree.as_ref()?;
        let result = tree.nearest_one::<SquaredEuclidean>(&[position.x, position.y]);
        self.cells.get(result.item).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_index_basic() {
        let index = SpatialIndex::new(&[
            (CellId(10), Vec2::new(0.0, 0.0)),
            (CellId(11), Vec2::new(5000.0, 0.0)),
            (CellId(12), Vec2::new(0.0, 5000.0)),
            (CellId(13), Vec2::new(5000.0, 5000.0)),
        ]);

        assert_eq!(index.len(), 4);
        assert_eq!(index.find_nearest(Vec2::new(100.0, -20.0)), Some(CellId(10)));
        assert_eq!(index.find_nearest(Vec2::new(4800.0, 300.0)), Some(CellId(11)));
        assert_eq!(index.find_nearest(Vec2::new(-900.0, 4100.0)), Some(CellId(12)));
        assert_eq!(index.find_nearest(Vec2::new(9000.0, 9000.0)), Some(CellId(13)));
    }

    #[test]
    fn test_spatial_index_exact_match() {
        let centers = [
            (CellId(0), Vec2::new(10.0, 0.0)),
            (CellId(1), Vec2::new(0.0, 10.0)),
        ];
        let index = SpatialIndex::new(&centers);

        assert_eq!(index.find_nearest(centers[0].1), Some(CellId(0)));
        assert_eq!(index.find_nearest(centers[1].1), Some(CellId(1)));
    }

    #[test]
    fn test_spatial_index_empty() {
        let index = SpatialIndex::new(&[]);
        assert!(index.is_empty());
        assert_eq!(index.find_nearest(Vec2::ZERO), None);
    }
}
