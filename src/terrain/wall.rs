//! Wall strips built from a polyline

use glam::Vec2;

use crate::cell::{CellId, Diagram, GraphEdge};
use crate::grid::CellGrid;

/// A strip of quad cells hanging below (or above) a polyline
///
/// Each polyline segment becomes one cell: the segment, its copy moved by
/// `extrude`, and the two connecting sides. Neighboring quads share their
/// side edge, which is not solid. The cells live in the level's [`Diagram`]
/// alongside the Voronoi cells.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelWall {
    cells: Vec<CellId>,
    extrude: Vec2,
}

impl LevelWall {
    /// Build the wall cells for `points` and register them in `grid`
    ///
    /// Every cell is registered in each bucket its horizontal extent covers,
    /// in the row of its center.
    pub fn new(points: &[Vec2], extrude: Vec2, diagram: &mut Diagram, grid: &mut CellGrid) -> Self {
        let mut cells = Vec::with_capacity(points.len().saturating_sub(1));
        let mut shared_side = None;

        for (i, pair) in points.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            if a.distance_squared(b) < 0.01 {
                continue;
            }
            let (a2, b2) = (a + extrude, b + extrude);

            let site = diagram.push_site((a + b + a2 + b2) * 0.25);
            let cell = diagram.push_cell(site);

            let left = match shared_side {
                Some(edge) => edge,
                None => {
                    let mut edge = GraphEdge::new(a, a2);
                    edge.is_solid = true;
                    edge.outside_level = true;
                    diagram.push_edge(edge)
                }
            };

            let mut surface = GraphEdge::new(a, b);
            surface.is_solid = true;
            let surface = diagram.push_edge(surface);

            let mut underside = GraphEdge::new(a2, b2);
            underside.is_solid = true;
            underside.outside_level = true;
            let underside = diagram.push_edge(underside);

            let last = i + 2 == points.len();
            let mut right_edge = GraphEdge::new(b, b2);
            right_edge.is_solid = last;
            right_edge.outside_level = last;
            let right = diagram.push_edge(right_edge);

            for edge in [surface, right, underside, left] {
                let graph_edge = diagram.edge_mut(edge);
                graph_edge.link_cell(cell);
                match graph_edge.site1 {
                    None => graph_edge.site1 = Some(site),
                    Some(other) if other != site => graph_edge.site2 = Some(site),
                    Some(_) => {}
                }
                diagram.cell_mut(cell).edges.push(edge);
            }

            let min_x = a.x.min(b.x);
            let max_x = a.x.max(b.x);
            grid.insert_spanning(cell, min_x, max_x, diagram.cell(cell).center.y);

            shared_side = Some(right);
            cells.push(cell);
        }

        // A degenerate trailing segment leaves the last side unflagged
        if let Some(edge) = shared_side {
            let edge = diagram.edge_mut(edge);
            if edge.cell2.is_none() {
                edge.is_solid = true;
                edge.outside_level = true;
            }
        }

        Self { cells, extrude }
    }

    /// Cells of the strip, left to right
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    /// Offset from the polyline to the far side of the strip
    pub fn extrude(&self) -> Vec2 {
        self.extrude
    }

    /// Whether a point lies inside any cell of the strip
    pub fn contains(&self, diagram: &Diagram, point: Vec2) -> bool {
        self.cells.iter().any(|&c| diagram.is_point_inside(c, point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn strip() -> (Diagram, CellGrid, LevelWall) {
        let mut diagram = Diagram::new();
        let mut grid = CellGrid::new(Rect::new(0.0, -2000.0, 10_000.0, 12_000.0));
        let points = [Vec2::new(0.0, 1000.0), Vec2::new(5000.0, 3000.0), Vec2::new(10_000.0, 1000.0)];
        let wall = LevelWall::new(&points, Vec2::new(0.0, -2000.0), &mut diagram, &mut grid);
        (diagram, grid, wall)
    }

    #[test]
    fn test_one_quad_per_segment() {
        let (diagram, _, wall) = strip();
        assert_eq!(wall.cells().len(), 2);
        for &cell in wall.cells() {
            assert_eq!(diagram.cell(cell).edges.len(), 4);
        }
        assert!(diagram.are_adjacent(wall.cells()[0], wall.cells()[1]));
    }

    #[test]
    fn test_shared_side_is_open() {
        let (diagram, _, wall) = strip();
        let (a, b) = (wall.cells()[0], wall.cells()[1]);
        let shared: Vec<_> = diagram
            .adjacent(a)
            .filter(|&(_, c)| c == b)
            .map(|(e, _)| diagram.edge(e))
            .collect();
        assert_eq!(shared.len(), 1);
        assert!(!shared[0].is_solid);

        let solid = diagram
            .cell_edges(a)
            .filter(|e| e.is_solid)
            .count();
        assert_eq!(solid, 3);
    }

    #[test]
    fn test_contains_and_grid_span() {
        let (diagram, grid, wall) = strip();
        assert!(wall.contains(&diagram, Vec2::new(2500.0, 1000.0)));
        assert!(!wall.contains(&diagram, Vec2::new(2500.0, 4000.0)));

        // The first quad spans x 0..5000, i.e. buckets 0 through 2
        let first = wall.cells()[0];
        let near = grid.cells_near(Vec2::new(4500.0, diagram.cell(first).center.y), 0);
        assert!(near.contains(&first));
        let near = grid.cells_near(Vec2::new(500.0, diagram.cell(first).center.y), 0);
        assert!(near.contains(&first));
    }
}
