//! Cell cleanup after carving
//!
//! Drops the rock that is never visible from the carved passages, opens a few
//! holes toward the sea floor and flags the edges that face out of the level.

use glam::Vec2;
use tracing::debug;

use crate::cell::{CellId, CellType, Diagram};
use crate::geometry::Rect;
use crate::rng::LevelRng;

/// Wall cells sharing an edge with a path cell
///
/// Every other cell is discarded from the level. The result is deduplicated
/// and ordered by first discovery along `path_cells`.
pub fn clean_cells(diagram: &Diagram, path_cells: &[CellId]) -> Vec<CellId> {
    let mut walls: Vec<CellId> = Vec::new();
    for &cell in path_cells {
        for (_, adjacent) in diagram.adjacent(cell) {
            if diagram.cell(adjacent).cell_type == CellType::Path {
                continue;
            }
            if !walls.contains(&adjacent) {
                walls.push(adjacent);
            }
        }
    }
    debug!(kept = walls.len(), of = diagram.cells.len(), "cleaned cells");
    walls
}

/// Pick wall cells to open as holes toward the bottom of the level
///
/// A wall cell right of `end_x` with an edge point above `top_band_y` is
/// always opened, so the exit is not capped by rock. Any other cell is
/// opened with probability `probability` if its center is inside `limits`
/// and the horizontally closest path waypoint lies above it.
///
/// Opened cells become [`CellType::Path`] and are removed from `walls`.
///
/// # Returns
///
/// The opened cells.
#[allow(clippy::too_many_arguments)]
pub fn create_holes(
    walls: &mut Vec<CellId>,
    diagram: &mut Diagram,
    path_waypoints: &[Vec2],
    limits: Rect,
    probability: f32,
    end_x: f32,
    top_band_y: f32,
    rng: &mut LevelRng,
) -> Vec<CellId> {
    let mut holes = Vec::new();

    for &cell_id in walls.iter() {
        let center = diagram.cell(cell_id).center;

        if center.x > end_x
            && diagram
                .cell_edges(cell_id)
                .any(|e| e.point1.y > top_band_y || e.point2.y > top_band_y)
        {
            holes.push(cell_id);
            continue;
        }

        if rng.unit() > probability || !limits.contains(center) {
            continue;
        }

        let closest = path_waypoints
            .iter()
            .min_by(|a, b| (center.x - a.x).abs().total_cmp(&(center.x - b.x).abs()));
        if closest.is_some_and(|waypoint| waypoint.y >= center.y) {
            holes.push(cell_id);
        }
    }

    for &hole in &holes {
        diagram.cell_mut(hole).cell_type = CellType::Path;
    }
    walls.retain(|c| !holes.contains(c));

    debug!(holes = holes.len(), "created holes");
    holes
}

/// Flag the edges that face away from the playable area
///
/// Every edge of a wall cell in the upper half of the level is flagged
/// `outside_level`; edges of path cells are cleared afterwards so shared
/// edges along the passages stay inside.
pub fn flag_outside_level(diagram: &mut Diagram, walls: &[CellId], path_cells: &[CellId], height: f32) {
    for &cell in walls {
        if diagram.cell(cell).center.y < height * 0.5 {
            continue;
        }
        for i in 0..diagram.cell(cell).edges.len() {
            let edge = diagram.cell(cell).edges[i];
            diagram.edge_mut(edge).outside_level = true;
        }
    }

    for &cell in path_cells {
        for i in 0..diagram.cell(cell).edges.len() {
            let edge = diagram.cell(cell).edges[i];
            diagram.edge_mut(edge).outside_level = false;
        }
    }
}
