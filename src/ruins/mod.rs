//! Ruin placement and carving
//!
//! A ruin is a rectangular area with rooms inside. Its position is found by
//! relaxation: starting at a random wall cell (or a cave), it is pushed away
//! from nearby main path cells and from overlapping ruins until it is clear
//! of both. The walls overlapping the rooms are then carved away, plus one
//! wall cell between the ruin and the main path so it stays reachable.

mod shapes;

pub use shapes::{split_rooms, RuinShape, MAX_SPLIT_DEPTH, MIN_SPLIT_SIZE};

use glam::{IVec2, Vec2};
use tracing::{debug, warn};

use crate::cell::{CellId, CellType, Diagram};
use crate::geometry::{segments_intersect, Rect};
use crate::grid::{CellGrid, GRID_CELL_SIZE};
use crate::rng::LevelRng;

/// Main path cells within this distance push a ruin away
pub const PATH_REPULSION_RADIUS: f32 = 10_000.0;

/// Distance a single main path cell pushes a ruin per iteration
pub const PATH_REPULSION_STEP: f32 = 100.0;

/// Relaxation restarts from a random wall cell every this many iterations
pub const RESTART_INTERVAL: u32 = 500;

/// Number of RUIN positions of interest each ruin provides
pub const RUIN_POSITION_COUNT: usize = 4;

/// A placed ruin
#[derive(Debug, Clone, PartialEq)]
pub struct Ruin {
    /// Outer bounds
    pub area: Rect,
    /// Rooms, farthest from the entrance first
    pub shapes: Vec<RuinShape>,
    /// Point of the area closest to the main path
    pub entrance: Vec2,
    /// Main path cell closest to the ruin
    pub closest_path_cell: CellId,
    /// Wall cells carved away for the ruin
    pub removed_cells: Vec<CellId>,
}

impl Ruin {
    /// Reflect the ruin horizontally across a level of the given width
    pub fn mirror(&mut self, width: f32) {
        self.area = self.area.mirrored(width);
        self.entrance.x = width - self.entrance.x;
        for shape in &mut self.shapes {
            *shape = shape.mirrored(width);
        }
    }

    /// RUIN positions of interest for this ruin
    ///
    /// Enemy spawn points inside a room count first; the remaining slots up
    /// to [`RUIN_POSITION_COUNT`] are filled with room centers, farthest from
    /// the entrance first.
    pub fn interest_positions(&self, enemy_spawns: &[Vec2]) -> Vec<Vec2> {
        let mut positions: Vec<Vec2> = enemy_spawns
            .iter()
            .copied()
            .filter(|&p| self.shapes.iter().any(|s| s.rect.contains(p)))
            .collect();
        let missing = RUIN_POSITION_COUNT.saturating_sub(positions.len());
        positions.extend(self.shapes.iter().take(missing).map(|s| s.rect.center()));
        positions
    }
}

/// Vertical range a ruin must stay within
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuinBounds {
    /// Level height; the ruin's top stays below it
    pub height: f32,
    /// Top of the sea floor; the ruin's bottom stays above it
    pub sea_floor_top: f32,
}

impl RuinBounds {
    fn clamp(&self, pos: Vec2, size: Vec2) -> Vec2 {
        let y = pos.y.min(self.height - size.y / 2.0).max(self.sea_floor_top + size.y / 2.0);
        Vec2::new(pos.x, y)
    }
}

/// Everything ruin placement reads from the level
#[derive(Debug, Clone, Copy)]
pub struct RuinPlacement<'a> {
    /// Cells of the main path, in path order
    pub main_path: &'a [CellId],
    /// CAVE positions of interest
    pub caves: &'a [Vec2],
    /// Vertical limits
    pub bounds: RuinBounds,
    /// Smallest ruin size
    pub size_min: IVec2,
    /// Largest ruin size (exclusive)
    pub size_max: IVec2,
    /// Relaxation iteration cap
    pub max_iterations: u32,
}

impl RuinPlacement<'_> {
    /// Place one ruin and carve it out of the walls
    ///
    /// Returns `None` when no position clear of the main path and the
    /// `existing` ruins was found within the iteration cap and there already
    /// is a ruin. The very first ruin is accepted wherever relaxation ended.
    ///
    /// Carved cells become [`CellType::Removed`] and leave `grid` and `walls`.
    pub fn place(
        &self,
        diagram: &mut Diagram,
        grid: &mut CellGrid,
        walls: &mut Vec<CellId>,
        existing: &[Ruin],
        rng: &mut LevelRng,
    ) -> Option<Ruin> {
        if self.main_path.is_empty() || walls.is_empty() {
            warn!("no main path or walls to place a ruin against");
            return None;
        }

        let size = Vec2::new(
            rng.range_i32(self.size_min.x, self.size_max.x) as f32,
            rng.range_i32(self.size_min.y, self.size_max.y) as f32,
        );

        let mut start = diagram.cell(walls[rng.index(walls.len())]).center;
        if rng.unit() < 0.5 && !self.caves.is_empty() {
            start = self.caves[rng.index(self.caves.len())];
        }
        let start = self.bounds.clamp(start, size);

        let path_centers: Vec<Vec2> = self.main_path.iter().map(|&c| diagram.cell(c).center).collect();
        let restart_points: Vec<Vec2> = walls.iter().map(|&c| diagram.cell(c).center).collect();
        // Step 1: relax away from the main path and other ruins
        let pos = self.relax(start, size, &path_centers, &restart_points, existing, rng)?;

        // Step 2: closest main path cell (first wins ties)
        let mut closest = self.main_path[0];
        let mut closest_dist = f32::INFINITY;
        for (&cell, center) in self.main_path.iter().zip(&path_centers) {
            let dist = center.distance_squared(pos);
            if dist < closest_dist {
                closest_dist = dist;
                closest = cell;
            }
        }
        let path_center = diagram.cell(closest).center;

        // Step 3: rooms, farthest from the entrance first
        let area = Rect::from_center(pos, size);
        let entrance = path_center.clamp(Vec2::new(area.x, area.y), Vec2::new(area.right(), area.top()));
        let mut shapes = split_rooms(area, entrance, rng);
        shapes.sort_by(|a, b| b.distance_from_entrance.total_cmp(&a.distance_from_entrance));

        let mut ruin = Ruin {
            area,
            shapes,
            entrance,
            closest_path_cell: closest,
            removed_cells: Vec::new(),
        };

        // Step 4: carve
        carve_rooms(&mut ruin, diagram, grid, walls);
        carve_entrance(&mut ruin, path_center, diagram, grid, walls);

        debug!(
            x = pos.x,
            y = pos.y,
            rooms = ruin.shapes.len(),
            removed = ruin.removed_cells.len(),
            "placed ruin"
        );
        Some(ruin)
    }

    /// Push a ruin of `size` from `start` until it clears the main path and
    /// the existing ruins
    pub fn relax(
        &self,
        start: Vec2,
        size: Vec2,
        path_centers: &[Vec2],
        restart_points: &[Vec2],
        existing: &[Ruin],
        rng: &mut LevelRng,
    ) -> Option<Vec2> {
        let extent = size.max_element();
        let min_dist_sqr = extent * extent;
        let repulsion_sqr = PATH_REPULSION_RADIUS * PATH_REPULSION_RADIUS;

        let blocked = |pos: Vec2| {
            let area = Rect::from_center(pos, size);
            path_centers.iter().any(|c| c.distance_squared(pos) < min_dist_sqr)
                || existing.iter().any(|r| r.area.intersects(&area))
        };

        let mut pos = start;
        let mut iterations = 0;
        while blocked(pos) {
            iterations += 1;
            let mut next = pos;

            for &center in path_centers {
                let mut diff = pos - center;
                let mut dist_sqr = diff.length_squared();
                if dist_sqr < 1.0 {
                    diff = Vec2::Y;
                    dist_sqr = 1.0;
                }
                if dist_sqr > repulsion_sqr {
                    continue;
                }
                next += diff / dist_sqr.sqrt() * PATH_REPULSION_STEP;
                next.y = next.y.min(self.bounds.height - size.y / 2.0);
            }

            let area = Rect::from_center(pos, size);
            for other in existing {
                if !other.area.intersects(&area) {
                    continue;
                }
                let diff = area.center() - other.area.center();
                let dir = if diff.length_squared() < 0.01 {
                    Vec2::NEG_Y
                } else {
                    diff.normalize()
                };
                next += dir * (extent + other.area.size().max_element()) / 2.0;
            }
            pos = next;

            if iterations > self.max_iterations {
                if !existing.is_empty() {
                    debug!(iterations, "dropped ruin that found no free spot");
                    return None;
                }
                warn!(iterations, "ruin relaxation hit the iteration cap, accepting position");
                return Some(self.bounds.clamp(pos, size));
            } else if iterations > RESTART_INTERVAL && iterations % RESTART_INTERVAL == 0 && !restart_points.is_empty() {
                pos = restart_points[rng.index(restart_points.len())];
            }
            pos = self.bounds.clamp(pos, size);
        }

        Some(pos)
    }
}

fn remove_wall(cell: CellId, ruin: &mut Ruin, diagram: &mut Diagram, grid: &mut CellGrid, walls: &mut Vec<CellId>) {
    diagram.cell_mut(cell).cell_type = CellType::Removed;
    grid.remove(cell);
    walls.retain(|&w| w != cell);
    ruin.removed_cells.push(cell);
}

/// Remove walls reaching into a room or into the band one room height above it
fn carve_rooms(ruin: &mut Ruin, diagram: &mut Diagram, grid: &mut CellGrid, walls: &mut Vec<CellId>) {
    let rooms: Vec<Rect> = ruin.shapes.iter().map(|s| s.rect).collect();
    for room in rooms {
        let raised = room.translated(Vec2::new(0.0, room.height));
        let depth = (room.size().max_element() / GRID_CELL_SIZE).ceil() as i32 + 1;

        for cell in grid.cells_near(room.center(), depth) {
            if !diagram.cell(cell).is_wall() {
                continue;
            }
            let hit = diagram.cell_edges(cell).any(|e| {
                room.contains(e.point1) || room.contains(e.point2) || raised.intersects_segment(e.point1, e.point2)
            });
            if hit {
                remove_wall(cell, ruin, diagram, grid, walls);
            }
        }
    }
}

/// Remove the first wall crossed on the way from the main path to the ruin
fn carve_entrance(ruin: &mut Ruin, path_center: Vec2, diagram: &mut Diagram, grid: &mut CellGrid, walls: &mut Vec<CellId>) {
    let target = ruin.area.center();
    let hit = walls.iter().copied().find(|&cell| {
        diagram
            .cell_edges(cell)
            .any(|e| segments_intersect(path_center, target, e.point1, e.point2))
    });
    if let Some(cell) = hit {
        remove_wall(cell, ruin, diagram, grid, walls);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carving::tests::test_diagram;
    use crate::carving::generate_path;

    fn placement<'a>(main_path: &'a [CellId], caves: &'a [Vec2]) -> RuinPlacement<'a> {
        RuinPlacement {
            main_path,
            caves,
            bounds: RuinBounds {
                height: 12_000.0,
                sea_floor_top: 0.0,
            },
            size_min: IVec2::new(3000, 2000),
            size_max: IVec2::new(4000, 3000),
            max_iterations: 10_000,
        }
    }

    fn ruin_at(area: Rect) -> Ruin {
        Ruin {
            area,
            shapes: Vec::new(),
            entrance: area.center(),
            closest_path_cell: CellId(0),
            removed_cells: Vec::new(),
        }
    }

    #[test]
    fn test_relax_moves_away_from_path() {
        let mut rng = LevelRng::from_seed_str("relax");
        let place = placement(&[], &[]);
        let path = [Vec2::new(5000.0, 6000.0)];
        let size = Vec2::new(2000.0, 2000.0);

        let pos = place
            .relax(Vec2::new(5500.0, 6000.0), size, &path, &[], &[], &mut rng)
            .unwrap();
        assert!(pos.distance(path[0]) >= size.max_element());
    }

    #[test]
    fn test_relax_separates_ruins() {
        let mut rng = LevelRng::from_seed_str("separate");
        let place = placement(&[], &[]);
        let existing = [ruin_at(Rect::from_center(Vec2::new(10_000.0, 6000.0), Vec2::new(3000.0, 2000.0)))];
        let size = Vec2::new(3000.0, 2000.0);

        let pos = place
            .relax(Vec2::new(10_500.0, 6000.0), size, &[], &[], &existing, &mut rng)
            .unwrap();
        assert!(!Rect::from_center(pos, size).intersects(&existing[0].area));
    }

    #[test]
    fn test_clamp_keeps_ruin_above_sea_floor() {
        let bounds = RuinBounds {
            height: 12_000.0,
            sea_floor_top: 3000.0,
        };
        let size = Vec2::new(2000.0, 2000.0);
        assert_eq!(bounds.clamp(Vec2::new(0.0, 0.0), size).y, 4000.0);
        assert_eq!(bounds.clamp(Vec2::new(0.0, 20_000.0), size).y, 11_000.0);
    }

    #[test]
    fn test_interest_positions_fill_from_rooms() {
        let mut rng = LevelRng::from_seed_str("rooms");
        let area = Rect::new(0.0, 0.0, 8000.0, 6000.0);
        let mut ruin = ruin_at(area);
        ruin.shapes = split_rooms(area, Vec2::ZERO, &mut rng);

        let positions = ruin.interest_positions(&[]);
        assert_eq!(positions.len(), RUIN_POSITION_COUNT.min(ruin.shapes.len()));

        let inside = ruin.shapes[0].rect.center();
        let positions = ruin.interest_positions(&[inside, Vec2::new(-100.0, -100.0)]);
        assert_eq!(positions[0], inside);
        assert_eq!(positions.len(), RUIN_POSITION_COUNT);
    }

    #[test]
    fn test_place_carves_walls() {
        let (mut diagram, mut grid, borders) = test_diagram("ruin");
        let mut rng = LevelRng::from_seed_str("ruin");
        let path = generate_path(
            &[Vec2::new(2000.0, 10_000.0), Vec2::new(28_000.0, 10_000.0)],
            &mut diagram,
            &grid,
            borders,
            0.0,
            false,
            &mut rng,
        );
        let mut walls: Vec<CellId> = diagram.cells.iter().filter(|c| c.is_wall()).map(|c| c.id).collect();
        grid.clear();
        for &wall in &walls {
            grid.insert(wall, diagram.cell(wall).center);
        }
        let before = walls.len();

        let place = placement(&path, &[]);
        let ruin = place
            .place(&mut diagram, &mut grid, &mut walls, &[], &mut rng)
            .unwrap();

        assert!(!ruin.removed_cells.is_empty());
        assert_eq!(walls.len(), before - ruin.removed_cells.len());
        for &cell in &ruin.removed_cells {
            assert_eq!(diagram.cell(cell).cell_type, CellType::Removed);
            assert!(!grid.contains(cell));
        }
        assert!(path.contains(&ruin.closest_path_cell));
    }
}
