//! Small 2D geometry helpers shared by the generation phases

use glam::Vec2;
use parry2d::math::Point;
use parry2d::query::PointQuery;
use parry2d::shape::Segment;

/// Axis-aligned rectangle in level coordinates (Y up)
///
/// `x`/`y` is the minimum corner. Containment is inclusive of the minimum
/// edges and exclusive of the maximum edges; intersection is strict, so two
/// rectangles sharing an edge do not intersect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Minimum X
    pub x: f32,
    /// Minimum Y
    pub y: f32,
    /// Width (non-negative)
    pub width: f32,
    /// Height (non-negative)
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from its minimum corner and size
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle centered on a point
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(
            center.x - size.x / 2.0,
            center.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    /// Maximum X
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Maximum Y
    #[inline]
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Center point
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Size as a vector
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Check whether a point lies inside
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.top()
    }

    /// Check whether two rectangles overlap with positive area
    pub fn intersects(&self, other: &Rect) -> bool {
        other.x < self.right()
            && self.x < other.right()
            && other.y < self.top()
            && self.y < other.top()
    }

    /// Grow (or shrink, with negative amounts) on every side
    pub fn inflate(&self, horizontal: f32, vertical: f32) -> Rect {
        Rect::new(
            self.x - horizontal,
            self.y - vertical,
            self.width + horizontal * 2.0,
            self.height + vertical * 2.0,
        )
    }

    /// Move by an offset
    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Reflect about the vertical line `x = width / 2`
    pub fn mirrored(&self, width: f32) -> Rect {
        Rect::new(width - self.right(), self.y, self.width, self.height)
    }

    /// Check whether a segment touches the rectangle
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        let corners = [
            Vec2::new(self.x, self.y),
            Vec2::new(self.right(), self.y),
            Vec2::new(self.right(), self.top()),
            Vec2::new(self.x, self.top()),
        ];
        (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
    }
}

/// Check whether two segments cross (touching endpoints count)
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = cross(b2 - b1, a1 - b1);
    let d2 = cross(b2 - b1, a2 - b1);
    let d3 = cross(a2 - a1, b1 - a1);
    let d4 = cross(a2 - a1, b2 - a1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// 2D cross product (z component)
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Distance from a point to a segment
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    if a.distance_squared(b) < f32::EPSILON {
        return point.distance(a);
    }
    let segment = Segment::new(to_point(a), to_point(b));
    segment.distance_to_local_point(&to_point(point), true)
}

/// Convert a glam vector into a parry point
#[inline]
pub fn to_point(v: Vec2) -> Point<f32> {
    Point::new(v.x, v.y)
}

/// Shortest distance between two segments
pub fn segment_distance(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> f32 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    distance_to_segment(a1, b1, b2)
        .min(distance_to_segment(a2, b1, b2))
        .min(distance_to_segment(b1, a1, a2))
        .min(distance_to_segment(b2, a1, a2))
}

/// Signum that maps zero to zero
#[inline]
pub fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
