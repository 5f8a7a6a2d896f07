//! Positions of interest recorded during generation

use bitflags::bitflags;
use glam::Vec2;

bitflags! {
    /// Kind of a position of interest; queries may combine several kinds
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PositionType: u8 {
        /// Along the main path
        const MAIN_PATH = 1 << 0;
        /// Inside a side tunnel
        const CAVE = 1 << 1;
        /// Inside a ruin
        const RUIN = 1 << 2;
    }
}

/// A notable spot in the level (spawn candidates, ruin rooms, cave ends)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestingPosition {
    /// Position in level coordinates
    pub position: Vec2,
    /// Single kind flag
    pub position_type: PositionType,
}

impl InterestingPosition {
    pub fn new(position: Vec2, position_type: PositionType) -> Self {
        Self {
            position,
            position_type,
        }
    }

    /// Whether this position matches any of the kinds in `filter`
    #[inline]
    pub fn matches(&self, filter: PositionType) -> bool {
        filter.intersects(self.position_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matching() {
        let cave = InterestingPosition::new(Vec2::ZERO, PositionType::CAVE);
        assert!(cave.matches(PositionType::CAVE));
        assert!(cave.matches(PositionType::CAVE | PositionType::RUIN));
        assert!(!cave.matches(PositionType::MAIN_PATH));
        assert!(!cave.matches(PositionType::empty()));
    }
}
