//! Widening the main path to a guaranteed minimum width

use glam::Vec2;
use tracing::debug;

use crate::cell::{CellId, CellType, Diagram};
use crate::geometry::distance_to_segment;
use crate::grid::{CellGrid, GRID_CELL_SIZE};

/// Distance between centerline samples
pub const WIDEN_SAMPLE_STEP: f32 = 100.0;

/// Points along a polyline, at most `step` apart, including every vertex
pub fn sample_polyline(points: &[Vec2], step: f32) -> Vec<Vec2> {
    let mut samples = Vec::new();
    let Some(&first) = points.first() else {
        return samples;
    };
    samples.push(first);

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = a.distance(b);
        if length < f32::EPSILON {
            continue;
        }
        let steps = (length / step).ceil() as usize;
        for i in 1..=steps {
            samples.push(a.lerp(b, i as f32 / steps as f32));
        }
    }
    samples
}

/// Cells near `position` with an edge closer than `radius`
///
/// `search_depth` is the grid search radius in buckets.
pub fn too_close_cells(
    diagram: &Diagram,
    grid: &CellGrid,
    position: Vec2,
    radius: f32,
    search_depth: i32,
) -> Vec<CellId> {
    grid.cells_near(position, search_depth)
        .into_iter()
        .filter(|&cell| {
            diagram
                .cell_edges(cell)
                .any(|e| distance_to_segment(position, e.point1, e.point2) < radius)
        })
        .collect()
}

/// Open every wall cell that narrows the path below `min_width`
///
/// The centerline through the path cell centers is sampled every
/// [`WIDEN_SAMPLE_STEP`] units. At each sample the cell containing it and
/// every cell with an edge closer than `min_width / 2` become
/// [`CellType::Path`]. `max_cell_size` bounds the distance from a cell's
/// center to its edges and sets how far the grid is searched.
///
/// # Returns
///
/// The newly opened cells, in the order they were found.
pub fn widen_path(
    path: &[CellId],
    diagram: &mut Diagram,
    grid: &CellGrid,
    min_width: f32,
    max_cell_size: f32,
) -> Vec<CellId> {
    let mut opened = Vec::new();
    if path.is_empty() || min_width <= 0.0 {
        return opened;
    }

    let radius = min_width * 0.5;
    let search_depth = ((radius + max_cell_size) / GRID_CELL_SIZE).ceil() as i32 + 1;

    let centers: Vec<Vec2> = path.iter().map(|&c| diagram.cell(c).center).collect();
    let samples = sample_polyline(&centers, WIDEN_SAMPLE_STEP);

    for sample in samples {
        let mut hits = too_close_cells(diagram, grid, sample, radius, search_depth);
        if let Some(containing) = grid.find_cell(diagram, sample, 2) {
            hits.push(containing);
        }

        for cell in hits {
            if diagram.cell(cell).cell_type == CellType::Path {
                continue;
            }
            diagram.cell_mut(cell).cell_type = CellType::Path;
            opened.push(cell);
        }
    }

    debug!(opened = opened.len(), min_width, "widened path");
    opened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carving::generate_path;
    use crate::carving::tests::test_diagram;
    use crate::rng::LevelRng;

    #[test]
    fn test_sample_polyline_spacing() {
        let samples = sample_polyline(&[Vec2::ZERO, Vec2::new(250.0, 0.0)], 100.0);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], Vec2::ZERO);
        assert_eq!(samples[3], Vec2::new(250.0, 0.0));
        for pair in samples.windows(2) {
            assert!(pair[0].distance(pair[1]) <= 100.0 + 1e-3);
        }
    }

    #[test]
    fn test_sample_polyline_empty() {
        assert!(sample_polyline(&[], 100.0).is_empty());
        assert_eq!(sample_polyline(&[Vec2::ONE], 100.0), vec![Vec2::ONE]);
    }

    #[test]
    fn test_widened_path_has_clearance() {
        let (mut diagram, grid, borders) = test_diagram("widen");
        let mut rng = LevelRng::from_seed_str("widen");
        let path = generate_path(
            &[Vec2::new(2000.0, 6000.0), Vec2::new(28_000.0, 6000.0)],
            &mut diagram,
            &grid,
            borders,
            0.0,
            false,
            &mut rng,
        );

        let min_width = 4000.0;
        widen_path(&path, &mut diagram, &grid, min_width, 6000.0);

        let centers: Vec<Vec2> = path.iter().map(|&c| diagram.cell(c).center).collect();
        for sample in sample_polyline(&centers, WIDEN_SAMPLE_STEP) {
            for cell in &diagram.cells {
                if cell.cell_type == CellType::Path {
                    continue;
                }
                for edge in diagram.cell_edges(cell.id) {
                    let d = distance_to_segment(sample, edge.point1, edge.point2);
                    assert!(d >= min_width * 0.5 - 1.0, "wall edge {} from centerline", d);
                }
            }
        }
    }
}
