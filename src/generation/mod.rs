//! Voronoi diagram construction
//!
//! Places sites on a jittered lattice, triangulates them and turns the dual
//! graph into closed cells registered in a [`CellGrid`].

mod delaunay;
mod sites;
mod voronoi;

pub use delaunay::{circumcenter_of, compute_delaunay, DelaunayEdge, DelaunayResult, DualEdge};
pub use sites::generate_sites;
pub use voronoi::{graph_edges_to_cells, make_voronoi_graph};

use glam::Vec2;

use crate::cell::Diagram;
use crate::error::Result;
use crate::geometry::Rect;
use crate::grid::CellGrid;

/// Build the cell diagram for a set of sites
///
/// Returns the diagram and a grid holding every cell.
pub fn build_cells(sites: &[Vec2], borders: Rect) -> Result<(Diagram, CellGrid)> {
    // Step 1: Voronoi graph clipped to the borders
    let mut diagram = make_voronoi_graph(sites, borders)?;

    // Step 2: Group edges into closed cells
    let mut grid = CellGrid::new(borders);
    graph_edges_to_cells(&mut diagram, &mut grid, borders);

    Ok((diagram, grid))
}
