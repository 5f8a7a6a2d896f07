//! Sea floor generation
//!
//! The sea floor is a polyline across the bottom of the level: a flat base
//! with a few mountains, roughened by midpoint displacement. It bounds
//! tunnels and ruins from below and becomes a [`LevelWall`] strip during
//! finalization.

mod wall;

pub use wall::LevelWall;

use glam::Vec2;
use tracing::debug;

use crate::config::GenerationParams;
use crate::rng::LevelRng;

/// Subdivision stops once the spacing between profile points reaches this
pub const MIN_VERTEX_INTERVAL: f32 = 5000.0;

/// How far the sea floor wall extends below its profile
pub const SEA_FLOOR_THICKNESS: f32 = 2000.0;

/// Height profile of the sea floor, ordered by ascending x
#[derive(Debug, Clone, PartialEq)]
pub struct SeaFloorProfile {
    points: Vec<Vec2>,
    base_depth: f32,
    top: f32,
}

impl SeaFloorProfile {
    /// Generate the sea floor profile for a level of the given width
    ///
    /// # Algorithm
    ///
    /// 1. Endpoints at `(0, depth)` and `(width, depth)`
    /// 2. `mountain_count_min..mountain_count_max` mountains evenly spaced
    ///    between them, each `depth + [mountain_height_min, mountain_height_max)`
    /// 3. While the interval (starting at `width / 2`) exceeds
    ///    [`MIN_VERTEX_INTERVAL`]: insert the midpoint of every pair, raised by
    ///    `[0, sea_floor_variance)`, and halve the interval
    ///
    /// Coordinates are kept on the integer lattice so the profile is exact.
    pub fn generate(width: i32, params: &GenerationParams, rng: &mut LevelRng) -> Self {
        let depth = params.sea_floor_depth;
        let mut points: Vec<(i32, i32)> = vec![(0, depth)];

        let mountain_count = rng.range_i32(params.mountain_count_min, params.mountain_count_max);
        for i in 0..mountain_count {
            let height = rng.range_i32(params.mountain_height_min, params.mountain_height_max);
            points.push((width / (mountain_count + 1) * (i + 1), depth + height));
        }
        points.push((width, depth));

        let mut interval = (width / 2) as f32;
        while interval > MIN_VERTEX_INTERVAL {
            let mut i = 0;
            while i + 1 < points.len() {
                let (a, b) = (points[i], points[i + 1]);
                let raise = rng.range_i32(0, params.sea_floor_variance);
                points.insert(i + 1, ((a.0 + b.0) / 2, (a.1 + b.1) / 2 + raise));
                i += 2;
            }
            interval /= 2.0;
        }

        let points: Vec<Vec2> = points.into_iter().map(|(x, y)| Vec2::new(x as f32, y as f32)).collect();
        let top = points.iter().map(|p| p.y).fold(depth as f32, f32::max);

        debug!(points = points.len(), top, "generated sea floor");
        Self {
            points,
            base_depth: depth as f32,
            top,
        }
    }

    /// Build a profile from explicit points (sorted by x)
    pub fn from_points(points: Vec<Vec2>, base_depth: f32) -> Self {
        let top = points.iter().map(|p| p.y).fold(base_depth, f32::max);
        Self {
            points,
            base_depth,
            top,
        }
    }

    /// Profile points, ascending in x
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Base depth of the profile; the bottom barrier sits here
    pub fn base_depth(&self) -> f32 {
        self.base_depth
    }

    /// Highest point of the profile
    pub fn top(&self) -> f32 {
        self.top
    }

    /// Point on the sea floor directly below `x`
    ///
    /// Outside the profile's horizontal extent the base depth is returned.
    pub fn bottom_position(&self, x: f32) -> Vec2 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Vec2::new(x, self.base_depth);
        };
        if x < first.x || x > last.x {
            return Vec2::new(x, self.base_depth);
        }

        let i = self.points.partition_point(|p| p.x <= x).clamp(1, self.points.len() - 1);
        let (a, b) = (self.points[i - 1], self.points[i]);
        let span = b.x - a.x;
        if span.abs() < f32::EPSILON {
            return Vec2::new(x, a.y.max(b.y));
        }
        Vec2::new(x, a.y + (b.y - a.y) * ((x - a.x) / span))
    }

    /// Reflect the profile horizontally, keeping it sorted by x
    pub fn mirror(&mut self, width: f32) {
        for p in &mut self.points {
            p.x = width - p.x;
        }
        self.points.reverse();
    }
}
