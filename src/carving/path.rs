//! Path generation through the cell graph

use glam::Vec2;
use tracing::debug;

use crate::cell::{CellId, CellType, Diagram};
use crate::geometry::Rect;
use crate::grid::CellGrid;
use crate::rng::LevelRng;

/// Resolve waypoints to cells, skipping points that resolve nowhere and
/// collapsing consecutive duplicates
pub fn resolve_targets(targets: &[Vec2], diagram: &Diagram, grid: &CellGrid) -> Vec<CellId> {
    let mut cells: Vec<CellId> = Vec::with_capacity(targets.len());
    for &target in targets {
        let Some(cell) = grid.find_cell_expanding(diagram, target) else {
            continue;
        };
        if cells.last() != Some(&cell) {
            cells.push(cell);
        }
    }
    cells
}

/// Carve a path of cells through a list of waypoints
///
/// Starting at the first waypoint's cell, each step moves to an adjacent
/// cell: with probability `1 - wander_amount` (or when no neighbor is inside
/// `limits`) the one whose center is closest to the current target, otherwise
/// a random neighbor inside `limits`. With `mirror` set the random choice is
/// indexed from the opposite end of the neighbor list. Every visited cell
/// becomes [`CellType::Path`].
///
/// The walk ends at the last waypoint's cell or after as many steps as there
/// are cells.
///
/// # Returns
///
/// The visited cells in order (a cell may appear more than once).
pub fn generate_path(
    targets: &[Vec2],
    diagram: &mut Diagram,
    grid: &CellGrid,
    limits: Rect,
    wander_amount: f32,
    mirror: bool,
    rng: &mut LevelRng,
) -> Vec<CellId> {
    let target_cells = resolve_targets(targets, diagram, grid);
    generate_path_between(&target_cells, diagram, limits, wander_amount, mirror, rng)
}

/// Like [`generate_path`], with the waypoints already resolved to cells
pub fn generate_path_between(
    target_cells: &[CellId],
    diagram: &mut Diagram,
    limits: Rect,
    wander_amount: f32,
    mirror: bool,
    rng: &mut LevelRng,
) -> Vec<CellId> {
    let Some((&first, rest)) = target_cells.split_first() else {
        return Vec::new();
    };
    let wander_amount = wander_amount.clamp(0.0, 1.0);

    let mut current = first;
    diagram.cell_mut(current).cell_type = CellType::Path;
    let mut path = vec![current];

    let Some(&last) = rest.last() else {
        return path;
    };

    let mut target_index = 0;
    let mut budget = diagram.cells.len();

    while current != last && budget > 0 {
        let target = diagram.cell(rest[target_index]).center;

        let allowed: Vec<CellId> = diagram
            .adjacent(current)
            .map(|(_, cell)| cell)
            .filter(|&cell| limits.contains(diagram.cell(cell).center))
            .collect();

        let roll = rng.unit();
        let next = if roll > wander_amount || allowed.is_empty() {
            closest_neighbor(diagram, current, target)
        } else {
            let mut index = rng.index(allowed.len());
            if mirror && index > 0 {
                index = allowed.len() - index;
            }
            Some(allowed[index])
        };

        let Some(next) = next else {
            break;
        };

        current = next;
        diagram.cell_mut(current).cell_type = CellType::Path;
        path.push(current);
        budget -= 1;

        if current == rest[target_index] {
            target_index += 1;
            if target_index >= rest.len() {
                break;
            }
        }
    }

    debug!(cells = path.len(), reached = current == last, "generated path");
    path
}

/// Neighbor whose center is strictly closest to `target` (first wins ties)
fn closest_neighbor(diagram: &Diagram, cell: CellId, target: Vec2) -> Option<CellId> {
    let mut closest = None;
    let mut closest_dist = f32::INFINITY;
    for (_, neighbor) in diagram.adjacent(cell) {
        let dist = diagram.cell(neighbor).center.distance_squared(target);
        if dist < closest_dist {
            closest_dist = dist;
            closest = Some(neighbor);
        }
    }
    closest
}
