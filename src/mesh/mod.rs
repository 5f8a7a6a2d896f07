//! Render and collision geometry for finished levels
//!
//! Every surviving cell is triangulated as a fan around its center. The
//! triangles go into an engine-agnostic [`MeshData`] for rendering and, unless
//! they are degenerate, into a [`CollisionBody`] as `parry2d` fixtures.

mod rounding;

pub use rounding::{round_cell, Clearance, RoundingParams};

use std::cmp::Ordering;

use glam::Vec2;
use parry2d::bounding_volume::Aabb;
use parry2d::math::Point;
use parry2d::query::PointQuery;
use parry2d::shape::{Segment, Triangle};
use tracing::{debug, warn};

use crate::cell::{BodyId, CellId, Diagram};
use crate::geometry::to_point;

/// Vertices closer than this are merged
const VERTEX_MERGE_DISTANCE_SQ: f32 = 1.0;

/// Edges shorter than this (squared) contribute no vertices
const MIN_EDGE_LENGTH_SQ: f32 = 0.01;

/// Triangles below this area get no collision fixture
pub const MIN_TRIANGLE_AREA: f32 = 1.0;

/// Engine-agnostic mesh data output
///
/// Contains raw vertex data suitable for any rendering engine:
/// - Bevy: Convert to `Mesh` with attributes
/// - Godot: Convert to `ArrayMesh`
/// - wgpu: Use directly as vertex buffers
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Vertex positions in level coordinates
    pub positions: Vec<[f32; 2]>,
    /// Triangle indices
    pub indices: Vec<u32>,
    /// Cell each triangle was built from
    pub triangle_cells: Vec<CellId>,
}

impl MeshData {
    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// What a collision body represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Voronoi wall cells
    LevelCells,
    /// The sea floor strip
    SeaFloor,
    /// Segment along the top of the level
    TopBarrier,
    /// Segment along the sea floor base depth
    BottomBarrier,
}

/// Shape of a single fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixtureShape {
    Triangle(Triangle),
    Segment(Segment),
}

impl FixtureShape {
    fn points(&self) -> Vec<Point<f32>> {
        match self {
            FixtureShape::Triangle(t) => vec![t.a, t.b, t.c],
            FixtureShape::Segment(s) => vec![s.a, s.b],
        }
    }
}

/// A collision shape, tagged with the cell it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixture {
    pub shape: FixtureShape,
    /// Source cell; `None` for barriers
    pub cell: Option<CellId>,
}

/// A static collision body made of fixtures
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionBody {
    pub id: BodyId,
    pub kind: BodyKind,
    pub fixtures: Vec<Fixture>,
    /// Bounds of all fixtures
    pub aabb: Aabb,
}

impl CollisionBody {
    /// Create a body with no fixtures
    pub fn new(id: BodyId, kind: BodyKind) -> Self {
        Self {
            id,
            kind,
            fixtures: Vec::new(),
            aabb: Aabb::new_invalid(),
        }
    }

    /// Add a fixture and grow the bounds
    pub fn add_fixture(&mut self, fixture: Fixture) {
        for p in fixture.shape.points() {
            self.aabb.mins.x = self.aabb.mins.x.min(p.x);
            self.aabb.mins.y = self.aabb.mins.y.min(p.y);
            self.aabb.maxs.x = self.aabb.maxs.x.max(p.x);
            self.aabb.maxs.y = self.aabb.maxs.y.max(p.y);
        }
        self.fixtures.push(fixture);
    }

    /// Triangle fixture containing `point`, if any
    pub fn fixture_at(&self, point: Vec2) -> Option<&Fixture> {
        let p = to_point(point);
        if !self.aabb.contains_local_point(&p) {
            return None;
        }
        self.fixtures.iter().find(|f| match &f.shape {
            FixtureShape::Triangle(t) => t.contains_local_point(&p),
            FixtureShape::Segment(_) => false,
        })
    }

    /// Whether `point` lies inside one of the body's triangles
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.fixture_at(point).is_some()
    }
}

/// Deduplicated boundary loop of a cell, sorted by angle around its center
pub fn cell_outline(diagram: &Diagram, cell: CellId) -> Vec<Vec2> {
    let center = diagram.cell(cell).center;
    let mut vertices: Vec<Vec2> = Vec::new();
    for edge in diagram.cell_edges(cell) {
        if edge.point1.distance_squared(edge.point2) < MIN_EDGE_LENGTH_SQ {
            continue;
        }
        for p in [edge.point1, edge.point2] {
            if vertices.iter().all(|v| v.distance_squared(p) >= VERTEX_MERGE_DISTANCE_SQ) {
                vertices.push(p);
            }
        }
    }

    let angle = |v: &Vec2| (v.y - center.y).atan2(v.x - center.x);
    vertices.sort_by(|a, b| angle(a).partial_cmp(&angle(b)).unwrap_or(Ordering::Equal));
    vertices
}

/// Triangulate a single cell as a triangle fan
fn triangulate_cell(cell: CellId, center: Vec2, vertices: &[Vec2], mesh: &mut MeshData) {
    let base_idx = mesh.positions.len() as u32;

    // Add center vertex
    mesh.positions.push([center.x, center.y]);

    // Add boundary vertices
    for vertex in vertices {
        mesh.positions.push([vertex.x, vertex.y]);
    }

    // Create triangle fan indices
    let num_vertices = vertices.len();
    for i in 0..num_vertices {
        let next_i = (i + 1) % num_vertices;
        mesh.indices.push(base_idx); // Center
        mesh.indices.push(base_idx + 1 + i as u32); // Current vertex
        mesh.indices.push(base_idx + 1 + next_i as u32); // Next vertex
        mesh.triangle_cells.push(cell);
    }
}

/// Turn cells into render triangles and one collision body
///
/// Cells whose outline has fewer than three distinct vertices are removed
/// from `cells`. Each kept cell records its outline in `body_vertices` and
/// the body id. Every fan triangle is rendered; triangles with an area below
/// [`MIN_TRIANGLE_AREA`] get no fixture.
///
/// # Arguments
/// * `diagram` - Arena holding the cells
/// * `cells` - Cells to finalize; degenerate ones are dropped in place
/// * `id` - Id of the new body
/// * `kind` - What the body represents
/// * `mesh` - Render mesh to append to
///
/// # Returns
/// The collision body holding every accepted fixture
pub fn generate_polygons(
    diagram: &mut Diagram,
    cells: &mut Vec<CellId>,
    id: BodyId,
    kind: BodyKind,
    mesh: &mut MeshData,
) -> CollisionBody {
    let mut body = CollisionBody::new(id, kind);
    let mut dropped = 0usize;

    cells.retain(|&cell| {
        let outline = cell_outline(diagram, cell);
        if outline.len() < 3 {
            return false;
        }
        let center = diagram.cell(cell).center;

        triangulate_cell(cell, center, &outline, mesh);
        for (i, &a) in outline.iter().enumerate() {
            let b = outline[(i + 1) % outline.len()];
            let triangle = Triangle::new(to_point(center), to_point(a), to_point(b));
            if triangle.area() < MIN_TRIANGLE_AREA {
                dropped += 1;
                continue;
            }
            body.add_fixture(Fixture {
                shape: FixtureShape::Triangle(triangle),
                cell: Some(cell),
            });
        }

        let cell = diagram.cell_mut(cell);
        cell.body_vertices = outline;
        cell.body = Some(id);
        true
    });

    if dropped > 0 {
        warn!(dropped, ?kind, "dropped degenerate collision triangles");
    }
    debug!(cells = cells.len(), fixtures = body.fixtures.len(), ?kind, "generated polygons");
    body
}

/// A horizontal barrier segment spanning the level width
pub fn barrier_body(id: BodyId, kind: BodyKind, y: f32, width: f32) -> CollisionBody {
    let mut body = CollisionBody::new(id, kind);
    body.add_fixture(Fixture {
        shape: FixtureShape::Segment(Segment::new(
            to_point(Vec2::new(0.0, y)),
            to_point(Vec2::new(width, y)),
        )),
        cell: None,
    });
    body
}
