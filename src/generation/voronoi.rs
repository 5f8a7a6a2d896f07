//! Voronoi graph construction and grouping of graph edges into cells
//!
//! The graph is built from the Delaunay dual (see [`super::delaunay`]) and
//! clipped to the level borders. Cells are then discovered edge by edge and
//! registered in the [`CellGrid`], and cells touching the borders get
//! closing edges so every cell is a closed loop.

use glam::{DVec2, Vec2};
use tracing::debug;

use super::delaunay::{compute_delaunay, DualEdge};
use crate::cell::{CellId, Diagram, EdgeId, GraphEdge, SiteId};
use crate::error::Result;
use crate::geometry::Rect;
use crate::grid::CellGrid;

/// Edges shorter than this (squared) are ignored when building cells
const MIN_EDGE_LENGTH_SQUARED: f32 = 0.001;

/// Tolerance for deciding that a point lies on the level border
const BORDER_EPSILON: f32 = 0.1;

/// Build the Voronoi graph of the sites, clipped to `borders`
///
/// Returns a diagram holding the (deduplicated) sites and the graph edges;
/// no cells are created yet.
pub fn make_voronoi_graph(sites: &[Vec2], borders: Rect) -> Result<Diagram> {
    let points: Vec<DVec2> = sites.iter().map(|s| s.as_dvec2()).collect();
    let delaunay = compute_delaunay(&points)?;

    let mut diagram = Diagram::new();
    for site in &delaunay.sites {
        diagram.push_site(site.as_vec2());
    }

    let min = DVec2::new(borders.x as f64, borders.y as f64);
    let max = DVec2::new(borders.right() as f64, borders.top() as f64);

    for edge in &delaunay.edges {
        let clipped = match edge.dual {
            DualEdge::Segment(a, b) => clip(a, b - a, 0.0, 1.0, min, max).map(|(t0, t1)| {
                // Keep shared circumcenters bit-identical across edges
                let start = if t0 == 0.0 { a } else { a + (b - a) * t0 };
                let end = if t1 == 1.0 { b } else { a + (b - a) * t1 };
                (start, end)
            }),
            DualEdge::Ray { origin, dir } => clip(origin, dir, 0.0, f64::INFINITY, min, max)
                .map(|(t0, t1)| {
                    let start = if t0 == 0.0 { origin } else { origin + dir * t0 };
                    (start, origin + dir * t1)
                }),
            DualEdge::Line { point, dir } => {
                clip(point, dir, f64::NEG_INFINITY, f64::INFINITY, min, max)
                    .map(|(t0, t1)| (point + dir * t0, point + dir * t1))
            }
        };
        let Some((a, b)) = clipped else {
            continue;
        };
        let (a, b) = (snap_to_border(a, min, max), snap_to_border(b, min, max));

        let mut graph_edge = GraphEdge::new(a.as_vec2(), b.as_vec2());
        graph_edge.site1 = Some(SiteId(edge.site1));
        graph_edge.site2 = Some(SiteId(edge.site2));
        diagram.push_edge(graph_edge);
    }

    debug!(
        sites = diagram.sites.len(),
        edges = diagram.edges.len(),
        "built voronoi graph"
    );
    Ok(diagram)
}

/// Liang-Barsky clipping of the parametric line `origin + t * dir`,
/// `t ∈ [t0, t1]`, to an axis-aligned box
///
/// Returns the clipped parameter range.
fn clip(
    origin: DVec2,
    dir: DVec2,
    mut t0: f64,
    mut t1: f64,
    min: DVec2,
    max: DVec2,
) -> Option<(f64, f64)> {
    let checks = [
        (-dir.x, origin.x - min.x),
        (dir.x, max.x - origin.x),
        (-dir.y, origin.y - min.y),
        (dir.y, max.y - origin.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    if !t0.is_finite() || !t1.is_finite() {
        return None;
    }

    Some((t0, t1))
}

/// Clamp a clipped endpoint into the box and snap near-border coordinates
/// onto the border
fn snap_to_border(p: DVec2, min: DVec2, max: DVec2) -> DVec2 {
    let mut p = p.clamp(min, max);
    for (v, lo, hi) in [(&mut p.x, min.x, max.x), (&mut p.y, min.y, max.y)] {
        if (*v - lo).abs() < 1e-4 {
            *v = lo;
        } else if (*v - hi).abs() < 1e-4 {
            *v = hi;
        }
    }
    p
}

/// Group graph edges into cells and register the cells in the grid
///
/// For each edge and each of its two sites, the site's grid bucket is scanned
/// for an existing cell; a new cell is created when none is found. An edge
/// keeps the first two cells that claim it. Cells reaching the border are
/// then closed along it.
pub fn graph_edges_to_cells(diagram: &mut Diagram, grid: &mut CellGrid, borders: Rect) {
    let edge_count = diagram.edges.len();
    for e in 0..edge_count {
        let edge_id = EdgeId(e);
        let edge = diagram.edge(edge_id);
        if edge.point1.distance_squared(edge.point2) < MIN_EDGE_LENGTH_SQUARED {
            continue;
        }

        for site in [edge.site1, edge.site2].into_iter().flatten() {
            let cell = find_or_create_cell(diagram, grid, site);
            if diagram.edge_mut(edge_id).link_cell(cell) {
                diagram.cell_mut(cell).edges.push(edge_id);
            }
        }
    }

    for c in 0..diagram.cells.len() {
        close_border_cell(diagram, CellId(c), borders);
    }

    debug!(cells = diagram.cells.len(), "grouped graph edges into cells");
}

fn find_or_create_cell(diagram: &mut Diagram, grid: &mut CellGrid, site: SiteId) -> CellId {
    let coord = diagram.sites[site.0].coord;
    let (x, y) = grid.bucket_of(coord);
    if let Some(&cell) = grid
        .bucket(x, y)
        .iter()
        .find(|&&c| diagram.cell(c).site == site)
    {
        return cell;
    }

    let cell = diagram.push_cell(site);
    grid.insert(cell, coord);
    cell
}

fn on_vertical_border(p: Vec2, borders: Rect) -> bool {
    (p.x - borders.x).abs() < BORDER_EPSILON || (p.x - borders.right()).abs() < BORDER_EPSILON
}

fn on_border(p: Vec2, borders: Rect) -> bool {
    on_vertical_border(p, borders)
        || (p.y - borders.y).abs() < BORDER_EPSILON
        || (p.y - borders.top()).abs() < BORDER_EPSILON
}

/// Add the missing edges of a cell that was cut open by the border
fn close_border_cell(diagram: &mut Diagram, cell: CellId, borders: Rect) {
    let mut border_points: Vec<Vec2> = Vec::with_capacity(2);
    for edge in diagram.cell_edges(cell) {
        for p in [edge.point1, edge.point2] {
            if border_points.len() < 2
                && on_border(p, borders)
                && !border_points
                    .iter()
                    .any(|b| b.distance_squared(p) < BORDER_EPSILON * BORDER_EPSILON)
            {
                border_points.push(p);
            }
        }
        if border_points.len() == 2 {
            break;
        }
    }

    let [p1, p2] = match border_points.as_slice() {
        [a, b] => [*a, *b],
        _ => return,
    };

    let site = diagram.cell(cell).site;
    let add_edge = |diagram: &mut Diagram, a: Vec2, b: Vec2| {
        let mut edge = GraphEdge::new(a, b);
        edge.site1 = Some(site);
        edge.cell1 = Some(cell);
        edge.is_solid = true;
        edge.outside_level = true;
        let id = diagram.push_edge(edge);
        diagram.cell_mut(cell).edges.push(id);
    };

    // One point on a side wall and the other on the top/bottom: the cell
    // wraps around a corner
    if on_vertical_border(p1, borders) != on_vertical_border(p2, borders) {
        let (side, cap) = if on_vertical_border(p1, borders) {
            (p1, p2)
        } else {
            (p2, p1)
        };
        let center = borders.center();
        let corner = Vec2::new(
            if side.x < center.x { borders.x } else { borders.right() },
            if cap.y < center.y { borders.y } else { borders.top() },
        );
        add_edge(diagram, p1, corner);
        add_edge(diagram, p2, corner);
    } else {
        add_edge(diagram, p1, p2);
    }
}
