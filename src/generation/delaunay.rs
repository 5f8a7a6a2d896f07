//! Delaunay triangulation of the Voronoi sites
//!
//! The Voronoi diagram is the dual of the Delaunay triangulation: every
//! Delaunay edge between two sites corresponds to the Voronoi edge separating
//! their cells, running between the circumcenters of the two triangles that
//! share it. On the convex hull one (or both) of those triangles is missing
//! and the Voronoi edge extends to infinity.

use glam::DVec2;
use spade::handles::{DirectedEdgeHandle, FaceHandle, InnerTag};
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::error::{LevelGenError, Result};

type Dt = DelaunayTriangulation<Point2<f64>>;

/// Shape of the Voronoi edge dual to one Delaunay edge, before clipping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DualEdge {
    /// Both adjacent triangles exist
    Segment(DVec2, DVec2),
    /// One triangle exists; the edge leaves its circumcenter along `dir`
    Ray { origin: DVec2, dir: DVec2 },
    /// No triangle exists (all sites collinear); the whole bisector
    Line { point: DVec2, dir: DVec2 },
}

/// A Delaunay edge between two sites and its dual Voronoi edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaunayEdge {
    /// Index of the first site (into the deduplicated site list)
    pub site1: usize,
    /// Index of the second site
    pub site2: usize,
    /// The dual Voronoi edge
    pub dual: DualEdge,
}

/// Result of triangulating the sites
#[derive(Debug, Clone, Default)]
pub struct DelaunayResult {
    /// Sites with exact duplicates removed, in input order
    pub sites: Vec<DVec2>,
    /// One entry per undirected Delaunay edge
    pub edges: Vec<DelaunayEdge>,
}

/// Triangulate the sites and derive the dual Voronoi edges
///
/// # Errors
///
/// Returns `GenerationFailed` if a site cannot be inserted (NaN or out of the
/// triangulation's numeric range).
pub fn compute_delaunay(points: &[DVec2]) -> Result<DelaunayResult> {
    let mut triangulation = Dt::new();
    let mut sites = Vec::with_capacity(points.len());

    for point in points {
        let handle = triangulation
            .insert(Point2::new(point.x, point.y))
            .map_err(|err| {
                LevelGenError::GenerationFailed(format!(
                    "could not triangulate site ({}, {}): {:?}",
                    point.x, point.y, err
                ))
            })?;
        // A duplicate position reuses the existing vertex
        if handle.index() == sites.len() {
            sites.push(*point);
        }
    }

    let edges = triangulation
        .directed_edges()
        .filter(|edge| edge.from().fix().index() < edge.to().fix().index())
        .map(|edge| DelaunayEdge {
            site1: edge.from().fix().index(),
            site2: edge.to().fix().index(),
            dual: dual_of(edge),
        })
        .collect();

    Ok(DelaunayResult { sites, edges })
}

fn dual_of(edge: DirectedEdgeHandle<'_, Point2<f64>, (), (), ()>) -> DualEdge {
    let from = to_dvec(edge.from().position());
    let to = to_dvec(edge.to().position());
    let d = to - from;
    // The face of a directed edge lies on its left
    let left_normal = DVec2::new(-d.y, d.x);

    let left = edge.face().as_inner().map(circumcenter);
    let right = edge.rev().face().as_inner().map(circumcenter);

    match (left, right) {
        (Some(a), Some(b)) => DualEdge::Segment(a, b),
        (Some(origin), None) => DualEdge::Ray {
            origin,
            dir: -left_normal,
        },
        (None, Some(origin)) => DualEdge::Ray {
            origin,
            dir: left_normal,
        },
        (None, None) => DualEdge::Line {
            point: (from + to) * 0.5,
            dir: left_normal,
        },
    }
}

fn circumcenter(face: FaceHandle<'_, InnerTag, Point2<f64>, (), (), ()>) -> DVec2 {
    let [a, b, c] = face.vertices().map(|v| to_dvec(v.position()));
    circumcenter_of(a, b, c)
}

/// Circumcenter of a triangle
///
/// Falls back to the centroid for (numerically) degenerate triangles.
pub fn circumcenter_of(a: DVec2, b: DVec2, c: DVec2) -> DVec2 {
    let ab = b - a;
    let ac = c - a;
    let d = 2.0 * (ab.x * ac.y - ab.y * ac.x);
    if d.abs() < f64::EPSILON {
        return (a + b + c) / 3.0;
    }
    let ab2 = ab.length_squared();
    let ac2 = ac.length_squared();
    a + DVec2::new(ac.y * ab2 - ab.y * ac2, ab.x * ac2 - ac.x * ab2) / d
}

#[inline]
fn to_dvec(p: Point2<f64>) -> DVec2 {
    DVec2::new(p.x, p.y)
}
