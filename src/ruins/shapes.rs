//! Interior layout of a ruin
//!
//! The ruin area is split recursively along its longer axis (a small binary
//! space partition); the leaves are the rooms.

use glam::Vec2;

use crate::geometry::Rect;
use crate::rng::LevelRng;

/// Areas with both sides below this are not split further
pub const MIN_SPLIT_SIZE: f32 = 3000.0;

/// Maximum number of split levels (at most `2^depth` rooms)
pub const MAX_SPLIT_DEPTH: u32 = 3;

/// A room inside a ruin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuinShape {
    /// Room bounds
    pub rect: Rect,
    /// Distance from the ruin entrance to the room center
    pub distance_from_entrance: f32,
}

impl RuinShape {
    pub fn mirrored(&self, width: f32) -> Self {
        Self {
            rect: self.rect.mirrored(width),
            ..*self
        }
    }
}

/// Split `area` into rooms and measure their distance from `entrance`
///
/// # Example
///
/// ```rust
/// use glam::Vec2;
/// use rust_voronoi_cave::ruins::split_rooms;
/// use rust_voronoi_cave::{LevelRng, Rect};
///
/// let mut rng = LevelRng::from_seed_str("rooms");
/// let area = Rect::new(0.0, 0.0, 4000.0, 4000.0);
/// let rooms = split_rooms(area, Vec2::new(0.0, 2000.0), &mut rng);
/// assert_eq!(rooms.len(), 4);
/// ```
pub fn split_rooms(area: Rect, entrance: Vec2, rng: &mut LevelRng) -> Vec<RuinShape> {
    let mut leaves = Vec::new();
    split(area, 0, rng, &mut leaves);

    leaves
        .into_iter()
        .map(|rect| RuinShape {
            rect,
            distance_from_entrance: rect.center().distance(entrance),
        })
        .collect()
}

fn split(area: Rect, depth: u32, rng: &mut LevelRng, leaves: &mut Vec<Rect>) {
    let longer = area.width.max(area.height);
    if depth >= MAX_SPLIT_DEPTH || longer < MIN_SPLIT_SIZE {
        leaves.push(area);
        return;
    }

    let t = rng.range_f32(0.35, 0.65);
    let (a, b) = if area.width >= area.height {
        let w = area.width * t;
        (
            Rect::new(area.x, area.y, w, area.height),
            Rect::new(area.x + w, area.y, area.width - w, area.height),
        )
    } else {
        let h = area.height * t;
        (
            Rect::new(area.x, area.y, area.width, h),
            Rect::new(area.x, area.y + h, area.width, area.height - h),
        )
    };
    split(a, depth + 1, rng, leaves);
    split(b, depth + 1, rng, leaves);
}
