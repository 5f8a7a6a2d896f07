//! Bucket grid for proximity queries during generation
//!
//! The level is divided into square buckets of [`GRID_CELL_SIZE`] units. A
//! live cell is registered in the bucket containing its center; long cells
//! (the sea floor strip) are registered in every bucket they span. Removing a
//! cell from the grid is how later phases drop it from the level.

use glam::Vec2;

use crate::cell::{CellId, Diagram};
use crate::geometry::Rect;

/// Side length of a grid bucket in level units
pub const GRID_CELL_SIZE: f32 = 2000.0;

/// Search depths tried, in order, when resolving a point to a cell
const FIND_CELL_DEPTHS: std::ops::RangeInclusive<i32> = 2..=5;

/// 2D array of cell buckets covering the level borders
#[derive(Debug, Clone)]
pub struct CellGrid {
    origin: Vec2,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<CellId>>,
}

impl CellGrid {
    /// Create an empty grid covering `borders`
    pub fn new(borders: Rect) -> Self {
        let cols = ((borders.width / GRID_CELL_SIZE).ceil() as usize).max(1);
        let rows = ((borders.height / GRID_CELL_SIZE).ceil() as usize).max(1);
        Self {
            origin: Vec2::new(borders.x, borders.y),
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
        }
    }

    /// Number of bucket columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of bucket rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Unclamped bucket coordinate of a point
    #[inline]
    fn bucket_coord(&self, point: Vec2) -> (i32, i32) {
        (
            ((point.x - self.origin.x) / GRID_CELL_SIZE).floor() as i32,
            ((point.y - self.origin.y) / GRID_CELL_SIZE).floor() as i32,
        )
    }

    /// Bucket coordinate clamped into the grid
    pub fn bucket_of(&self, point: Vec2) -> (usize, usize) {
        let (x, y) = self.bucket_coord(point);
        (
            x.clamp(0, self.cols as i32 - 1) as usize,
            y.clamp(0, self.rows as i32 - 1) as usize,
        )
    }

    /// Cells registered in one bucket
    pub fn bucket(&self, x: usize, y: usize) -> &[CellId] {
        &self.buckets[y * self.cols + x]
    }

    fn bucket_mut(&mut self, x: usize, y: usize) -> &mut Vec<CellId> {
        &mut self.buckets[y * self.cols + x]
    }

    /// Register a cell in the bucket containing `center`
    pub fn insert(&mut self, cell: CellId, center: Vec2) {
        let (x, y) = self.bucket_of(center);
        self.bucket_mut(x, y).push(cell);
    }

    /// Register a cell in every bucket of the row at `y` that `[min_x, max_x]`
    /// overlaps
    pub fn insert_spanning(&mut self, cell: CellId, min_x: f32, max_x: f32, y: f32) {
        let (x0, row) = self.bucket_of(Vec2::new(min_x, y));
        let (x1, _) = self.bucket_of(Vec2::new(max_x, y));
        for x in x0..=x1 {
            let bucket = self.bucket_mut(x, row);
            if !bucket.contains(&cell) {
                bucket.push(cell);
            }
        }
    }

    /// Unregister a cell from every bucket it is in
    pub fn remove(&mut self, cell: CellId) {
        for bucket in &mut self.buckets {
            bucket.retain(|&c| c != cell);
        }
    }

    /// Empty every bucket
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Whether a cell is registered anywhere
    pub fn contains(&self, cell: CellId) -> bool {
        self.buckets.iter().any(|b| b.contains(&cell))
    }

    /// Cells within `depth` buckets of the point's bucket
    ///
    /// The search window is clamped to the grid. Cells registered in several
    /// buckets are reported once.
    pub fn cells_near(&self, point: Vec2, depth: i32) -> Vec<CellId> {
        let (gx, gy) = self.bucket_coord(point);
        let mut result = Vec::new();
        for y in (gy - depth).max(0)..=(gy + depth).min(self.rows as i32 - 1) {
            for x in (gx - depth).max(0)..=(gx + depth).min(self.cols as i32 - 1) {
                for &cell in self.bucket(x as usize, y as usize) {
                    if !result.contains(&cell) {
                        result.push(cell);
                    }
                }
            }
        }
        result
    }

    /// Nearest registered cell center within `depth` buckets of the point
    ///
    /// Ties keep the later bucket entry.
    pub fn find_cell(&self, diagram: &Diagram, point: Vec2, depth: i32) -> Option<CellId> {
        let mut closest = None;
        let mut closest_dist = f32::INFINITY;
        for cell in self.cells_near(point, depth) {
            let dist = diagram.cell(cell).center.distance_squared(point);
            if dist <= closest_dist {
                closest_dist = dist;
                closest = Some(cell);
            }
        }
        closest
    }

    /// Resolve a point to a cell, widening the search from depth 2 up to 5
    pub fn find_cell_expanding(&self, diagram: &Diagram, point: Vec2) -> Option<CellId> {
        FIND_CELL_DEPTHS
            .into_iter()
            .find_map(|depth| self.find_cell(diagram, point, depth))
    }
}
