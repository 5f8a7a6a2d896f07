//! Rounding wall cells before triangulation
//!
//! Straight Voronoi edges facing open water are split into shorter pieces
//! whose inner points bulge away from the cell center, which makes the cave
//! walls look organic.

use glam::Vec2;

use crate::cell::{CellId, Diagram, GraphEdge};
use crate::config::GenerationParams;
use crate::geometry::{distance_to_segment, segment_distance};
use crate::grid::CellGrid;
use crate::rng::LevelRng;

/// Settings for [`round_cell`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundingParams {
    /// Target length of the subdivided pieces
    pub min_edge_length: f32,
    /// Bulge at the middle of an edge, as a fraction of its length
    pub rounding_amount: f32,
    /// Random extra bulge in `[0, irregularity)`
    pub irregularity: f32,
}

impl RoundingParams {
    pub fn from_params(params: &GenerationParams) -> Self {
        Self {
            min_edge_length: params.cell_subdivision_length,
            rounding_amount: params.cell_rounding_amount,
            irregularity: params.cell_irregularity,
        }
    }

    /// Rounding only runs when it would visibly change the cells
    pub fn is_enabled(&self) -> bool {
        self.rounding_amount > 0.01 || self.irregularity > 0.01
    }
}

/// Corridor around the main path centerline that rounding keeps open
#[derive(Debug, Clone, Copy)]
pub struct Clearance<'a> {
    /// Path cell centers in walking order
    pub centerline: &'a [Vec2],
    /// Minimum distance from the centerline to any wall
    pub radius: f32,
}

impl Clearance<'_> {
    /// Whether a segment moved by up to `bulge` stays outside the corridor
    fn allows(&self, a: Vec2, b: Vec2, bulge: f32) -> bool {
        let min = self.radius + bulge;
        match self.centerline {
            [] => true,
            [point] => distance_to_segment(*point, a, b) >= min,
            points => points.windows(2).all(|s| segment_distance(a, b, s[0], s[1]) >= min),
        }
    }
}

/// Unit normal of an edge pointing toward `center`
fn inward_normal(edge: &GraphEdge, center: Vec2) -> Vec2 {
    let dir = edge.point2 - edge.point1;
    let normal = Vec2::new(-dir.y, dir.x).normalize_or_zero();
    if normal.dot(center - edge.center()) < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Whether rounding `edge` could close a narrow passage
///
/// True when the open cell on the other side of the edge has, facing away
/// from this edge, another edge bordering a wall.
fn guards_passage(diagram: &Diagram, cell: CellId, edge: &GraphEdge) -> bool {
    let Some(open) = edge.adjacent_cell(cell).filter(|&c| !diagram.cell(c).is_wall()) else {
        return false;
    };
    let open_center = diagram.cell(open).center;
    diagram.cell(open).edges.iter().any(|&other| {
        let other = diagram.edge(other);
        (open_center - edge.center()).dot(open_center - other.center()) < 0.0
            && other
                .adjacent_cell(open)
                .is_some_and(|c| diagram.cell(c).is_wall())
    })
}

/// Subdivide and bulge the solid edges of a wall cell
///
/// Point `i` of `n` along an edge is moved by
/// `-normal * length * (rounding_amount + random) * (0.5 - |0.5 - i/n|)`
/// where the normal points into the cell. Points that would land inside
/// another wall cell are dropped. Non-solid edges, edges guarding a narrow
/// passage and edges whose largest possible bulge would reach into the
/// `clearance` corridor are kept unchanged.
///
/// The cell's edge list is replaced; new pieces are appended to the diagram
/// and keep the original edge's links and flags.
pub fn round_cell(
    cell: CellId,
    diagram: &mut Diagram,
    grid: &CellGrid,
    rounding: &RoundingParams,
    clearance: &Clearance,
    rng: &mut LevelRng,
) {
    let center = diagram.cell(cell).center;
    let original = diagram.cell(cell).edges.clone();
    let mut edges = Vec::with_capacity(original.len());

    for edge_id in original {
        let edge = diagram.edge(edge_id).clone();
        if !edge.is_solid || guards_passage(diagram, cell, &edge) {
            edges.push(edge_id);
            continue;
        }

        let length = edge.length();
        // Every rounded point stays within this distance of the straight edge
        let max_bulge = length * (rounding.rounding_amount + rounding.irregularity) * 0.5;
        if !clearance.allows(edge.point1, edge.point2, max_bulge) {
            edges.push(edge_id);
            continue;
        }

        let normal = inward_normal(&edge, center);
        let pieces = if rounding.min_edge_length > 0.0 {
            ((length / rounding.min_edge_length).ceil() as usize).max(1)
        } else {
            1
        };
        let dir = edge.point2 - edge.point1;

        let mut points = vec![edge.point1];
        for i in 1..pieces {
            let t = i as f32 / pieces as f32;
            let center_f = 0.5 - (0.5 - t).abs();
            let variance = rng.range_f32(0.0, rounding.irregularity);
            let point = edge.point1 + dir * t - normal * length * (rounding.rounding_amount + variance) * center_f;

            let inside_other = grid.cells_near(point, 1).into_iter().any(|other| {
                other != cell && diagram.cell(other).is_wall() && diagram.is_point_inside(other, point)
            });
            if !inside_other {
                points.push(point);
            }
        }
        points.push(edge.point2);

        for pair in points.windows(2) {
            let piece = GraphEdge {
                point1: pair[0],
                point2: pair[1],
                ..edge.clone()
            };
            edges.push(diagram.push_edge(piece));
        }
    }

    diagram.cell_mut(cell).edges = edges;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellType;
    use crate::geometry::Rect;

    /// A square wall cell with an open cell to its right
    fn square_with_water() -> (Diagram, CellGrid, CellId, CellId) {
        let mut diagram = Diagram::new();
        let mut grid = CellGrid::new(Rect::new(0.0, 0.0, 20_000.0, 10_000.0));
        let wall_site = diagram.push_site(Vec2::new(5000.0, 5000.0));
        let water_site = diagram.push_site(Vec2::new(15_000.0, 5000.0));
        let wall = diagram.push_cell(wall_site);
        let water = diagram.push_cell(water_site);
        diagram.cell_mut(water).cell_type = CellType::Path;

        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10_000.0, 0.0),
            Vec2::new(10_000.0, 10_000.0),
            Vec2::new(0.0, 10_000.0),
        ];
        for i in 0..4 {
            let mut edge = GraphEdge::new(corners[i], corners[(i + 1) % 4]);
            edge.link_cell(wall);
            if i == 1 {
                edge.link_cell(water);
                edge.is_solid = true;
            }
            let id = diagram.push_edge(edge);
            diagram.cell_mut(wall).edges.push(id);
            if i == 1 {
                diagram.cell_mut(water).edges.push(id);
            }
        }
        grid.insert(wall, diagram.cell(wall).center);
        (diagram, grid, wall, water)
    }

    fn no_corridor() -> Clearance<'static> {
        Clearance {
            centerline: &[],
            radius: 0.0,
        }
    }

    #[test]
    fn test_solid_edge_bulges_outward() {
        let (mut diagram, grid, wall, _) = square_with_water();
        let mut rng = LevelRng::from_seed_str("round");
        let rounding = RoundingParams {
            min_edge_length: 2500.0,
            rounding_amount: 0.5,
            irregularity: 0.0,
        };
        round_cell(wall, &mut diagram, &grid, &rounding, &no_corridor(), &mut rng);

        // Three untouched edges plus four pieces of the solid one
        assert_eq!(diagram.cell(wall).edges.len(), 3 + 4);
        let bulged = diagram
            .cell_edges(wall)
            .map(|e| e.point1.x.max(e.point2.x))
            .fold(0.0, f32::max);
        // Middle point: 10000 + 10000 * 0.5 * 0.5
        assert!((bulged - 12_500.0).abs() < 1e-2);
    }

    #[test]
    fn test_non_solid_edges_untouched() {
        let (mut diagram, grid, wall, _) = square_with_water();
        let before = diagram.cell(wall).edges.clone();
        for &e in &before {
            diagram.edge_mut(e).is_solid = false;
        }
        let mut rng = LevelRng::from_seed_str("none");
        let rounding = RoundingParams::from_params(&GenerationParams::default());
        round_cell(wall, &mut diagram, &grid, &rounding, &no_corridor(), &mut rng);
        assert_eq!(diagram.cell(wall).edges, before);
    }

    #[test]
    fn test_edge_near_path_stays_straight() {
        let (mut diagram, grid, wall, _) = square_with_water();
        let before = diagram.cell(wall).edges.clone();
        let rounding = RoundingParams {
            min_edge_length: 2500.0,
            rounding_amount: 0.5,
            irregularity: 0.0,
        };
        // The bulge reaches x = 12500, which is inside a 3000 unit corridor
        // around x = 15000
        let centerline = [Vec2::new(15_000.0, 0.0), Vec2::new(15_000.0, 10_000.0)];
        let corridor = Clearance {
            centerline: &centerline,
            radius: 3000.0,
        };
        let mut rng = LevelRng::from_seed_str("round");
        round_cell(wall, &mut diagram, &grid, &rounding, &corridor, &mut rng);
        assert_eq!(diagram.cell(wall).edges, before);

        // A narrower corridor leaves room for the bulge
        let corridor = Clearance {
            centerline: &centerline,
            radius: 2000.0,
        };
        round_cell(wall, &mut diagram, &grid, &rounding, &corridor, &mut rng);
        assert_eq!(diagram.cell(wall).edges.len(), 3 + 4);
    }

    #[test]
    fn test_disabled_when_amounts_are_tiny() {
        let rounding = RoundingParams {
            min_edge_length: 5000.0,
            rounding_amount: 0.0,
            irregularity: 0.005,
        };
        assert!(!rounding.is_enabled());
        assert!(RoundingParams::from_params(&GenerationParams::default()).is_enabled());
    }

    #[test]
    fn test_inward_normal_faces_center() {
        let edge = GraphEdge::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert_eq!(inward_normal(&edge, Vec2::new(5.0, 5.0)), Vec2::new(-1.0, 0.0));
        assert_eq!(inward_normal(&edge, Vec2::new(15.0, 5.0)), Vec2::new(1.0, 0.0));
    }
}
