//! Horizontal mirroring of the carved diagram

use std::collections::HashSet;

use glam::Vec2;
use tracing::debug;

use crate::cell::{CellId, Diagram, EdgeId, SiteId};
use crate::grid::GRID_CELL_SIZE;

/// Point used to register a mirrored cell in the grid
///
/// A cell whose unmirrored center lay within one unit past a bucket boundary
/// is bucketed one unit further left, so it lands in the bucket the
/// unmirrored level would have used at that coordinate. The cell's stored
/// center is not moved.
pub fn mirror_bucket_point(center: Vec2, width: f32) -> Vec2 {
    let offset = (width - center.x) % GRID_CELL_SIZE;
    if (0.0..1.0).contains(&offset) {
        Vec2::new(center.x - 1.0, center.y)
    } else {
        center
    }
}

/// Reflect a point about the vertical line `x = width / 2`
#[inline]
pub fn mirror_point(p: Vec2, width: f32) -> Vec2 {
    Vec2::new(width - p.x, p.y)
}

/// Reflect the given cells in place
///
/// Every edge of the cells and every site referenced by those edges is
/// reflected exactly once, however many cells share it. Cell centers are
/// re-read from their sites afterwards and mirror their unmirrored
/// positions exactly.
pub fn mirror_cells(diagram: &mut Diagram, cells: &[CellId], width: f32) {
    let mut mirrored_edges: HashSet<EdgeId> = HashSet::new();
    let mut mirrored_sites: HashSet<SiteId> = HashSet::new();

    for &cell in cells {
        let site = diagram.cell(cell).site;
        if mirrored_sites.insert(site) {
            let coord = &mut diagram.sites[site.0].coord;
            coord.x = width - coord.x;
        }

        for i in 0..diagram.cell(cell).edges.len() {
            let edge_id = diagram.cell(cell).edges[i];
            if !mirrored_edges.insert(edge_id) {
                continue;
            }
            let edge = diagram.edge_mut(edge_id);
            edge.point1 = mirror_point(edge.point1, width);
            edge.point2 = mirror_point(edge.point2, width);

            let sites = [edge.site1, edge.site2];
            for site in sites.into_iter().flatten() {
                if mirrored_sites.insert(site) {
                    let coord = &mut diagram.sites[site.0].coord;
                    coord.x = width - coord.x;
                }
            }
        }
    }

    diagram.refresh_centers();
    debug!(edges = mirrored_edges.len(), sites = mirrored_sites.len(), "mirrored cells");
}
