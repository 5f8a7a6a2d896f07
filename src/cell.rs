//! Voronoi Cell Structures
//!
//! Sites, graph edges and cells of the level's Voronoi diagram, stored in a
//! single arena ([`Diagram`]) and cross-referenced by index.

use glam::Vec2;

/// Index of a site in [`Diagram::sites`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub usize);

/// Index of an edge in [`Diagram::edges`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

/// Index of a cell in [`Diagram::cells`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub usize);

/// Index of a collision body in [`Level::bodies`](crate::level::Level::bodies)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

/// A point seeding one Voronoi cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    /// Position in level coordinates
    pub coord: Vec2,
}

/// One edge of the Voronoi diagram
///
/// An edge separates (at most) two cells. `cell1`/`cell2` are filled in the
/// order cells claim the edge; a third claimant is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    /// First endpoint
    pub point1: Vec2,
    /// Second endpoint
    pub point2: Vec2,
    /// Site on one side
    pub site1: Option<SiteId>,
    /// Site on the other side
    pub site2: Option<SiteId>,
    /// First cell that claimed the edge
    pub cell1: Option<CellId>,
    /// Second cell that claimed the edge
    pub cell2: Option<CellId>,
    /// Whether the edge separates a wall from open water
    pub is_solid: bool,
    /// Whether the edge faces away from the playable area
    pub outside_level: bool,
}

impl GraphEdge {
    /// Create an unlinked edge between two points
    pub fn new(point1: Vec2, point2: Vec2) -> Self {
        Self {
            point1,
            point2,
            site1: None,
            site2: None,
            cell1: None,
            cell2: None,
            is_solid: false,
            outside_level: false,
        }
    }

    /// Midpoint of the edge
    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.point1 + self.point2) * 0.5
    }

    /// Length of the edge
    #[inline]
    pub fn length(&self) -> f32 {
        self.point1.distance(self.point2)
    }

    /// The cell on the other side of the edge from `cell`
    ///
    /// Returns `None` for border edges, or when `cell` is not linked to this
    /// edge.
    pub fn adjacent_cell(&self, cell: CellId) -> Option<CellId> {
        if self.cell1 == Some(cell) {
            self.cell2
        } else if self.cell2 == Some(cell) {
            self.cell1
        } else {
            None
        }
    }

    /// Link a cell to this edge; returns false if both slots are taken
    pub fn link_cell(&mut self, cell: CellId) -> bool {
        if self.cell1.is_none() {
            self.cell1 = Some(cell);
            true
        } else if self.cell2.is_none() {
            self.cell2 = Some(cell);
            true
        } else {
            false
        }
    }
}

/// Role of a cell in the finished level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellType {
    /// Solid rock (untouched by carving)
    #[default]
    Empty,
    /// Open water carved by a path or tunnel
    Path,
    /// Carved away by ruin placement
    Removed,
}

/// A single Voronoi cell
///
/// `center` equals the site coordinate. Before finalization the cell's shape
/// is given by its edges; afterwards `body_vertices` holds the deduplicated
/// boundary loop the collision fixtures were built from.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiCell {
    /// Index of this cell in the diagram
    pub id: CellId,

    /// Site that seeded the cell
    pub site: SiteId,

    /// Cell center (equal to the site coordinate)
    pub center: Vec2,

    /// Boundary edges, in the order they were linked
    pub edges: Vec<EdgeId>,

    /// Wall, path or removed
    pub cell_type: CellType,

    /// Boundary vertices after finalization
    pub body_vertices: Vec<Vec2>,

    /// Collision body the cell's fixtures belong to
    pub body: Option<BodyId>,
}

impl VoronoiCell {
    /// Create an empty wall cell for a site
    pub fn new(id: CellId, site: SiteId, center: Vec2) -> Self {
        Self {
            id,
            site,
            center,
            edges: Vec::new(),
            cell_type: CellType::Empty,
            body_vertices: Vec::new(),
            body: None,
        }
    }

    /// Whether the cell is part of the level's solid geometry
    #[inline]
    pub fn is_wall(&self) -> bool {
        self.cell_type == CellType::Empty
    }
}

/// Arena owning every site, edge and cell of a level
///
/// All cross references are indices into these vectors. Cells are never
/// removed from the arena; phases that discard cells track membership
/// separately (see [`CellGrid`](crate::grid::CellGrid)).
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    /// Voronoi sites
    pub sites: Vec<Site>,
    /// Graph edges
    pub edges: Vec<GraphEdge>,
    /// Cells
    pub cells: Vec<VoronoiCell>,
}

impl Diagram {
    /// Create an empty diagram
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a cell
    #[inline]
    pub fn cell(&self, id: CellId) -> &VoronoiCell {
        &self.cells[id.0]
    }

    /// Borrow a cell mutably
    #[inline]
    pub fn cell_mut(&mut self, id: CellId) -> &mut VoronoiCell {
        &mut self.cells[id.0]
    }

    /// Borrow an edge
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &GraphEdge {
        &self.edges[id.0]
    }

    /// Borrow an edge mutably
    #[inline]
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut GraphEdge {
        &mut self.edges[id.0]
    }

    /// Add a site and return its id
    pub fn push_site(&mut self, coord: Vec2) -> SiteId {
        self.sites.push(Site { coord });
        SiteId(self.sites.len() - 1)
    }

    /// Add an edge and return its id
    pub fn push_edge(&mut self, edge: GraphEdge) -> EdgeId {
        self.edges.push(edge);
        EdgeId(self.edges.len() - 1)
    }

    /// Add a wall cell for a site and return its id
    pub fn push_cell(&mut self, site: SiteId) -> CellId {
        let id = CellId(self.cells.len());
        let center = self.sites[site.0].coord;
        self.cells.push(VoronoiCell::new(id, site, center));
        id
    }

    /// Iterate the edges of a cell
    pub fn cell_edges(&self, id: CellId) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.cells[id.0].edges.iter().map(move |e| &self.edges[e.0])
    }

    /// Cells sharing an edge with `id`, in edge order
    pub fn adjacent(&self, id: CellId) -> impl Iterator<Item = (EdgeId, CellId)> + '_ {
        self.cells[id.0]
            .edges
            .iter()
            .filter_map(move |&e| self.edges[e.0].adjacent_cell(id).map(|c| (e, c)))
    }

    /// Whether two cells share an edge
    pub fn are_adjacent(&self, a: CellId, b: CellId) -> bool {
        self.adjacent(a).any(|(_, c)| c == b)
    }

    /// Point-in-cell test by counting crossings of a horizontal ray
    ///
    /// Works on the edge soup directly, so it does not need the cell's
    /// vertices to be ordered.
    pub fn is_point_inside(&self, id: CellId, point: Vec2) -> bool {
        let mut inside = false;
        for edge in self.cell_edges(id) {
            let (a, b) = (edge.point1, edge.point2);
            if (a.y > point.y) != (b.y > point.y) {
                let t = (point.y - a.y) / (b.y - a.y);
                if point.x < a.x + t * (b.x - a.x) {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Re-read every cell center from its site
    pub fn refresh_centers(&mut self) {
        for cell in &mut self.cells {
            cell.center = self.sites[cell.site.0].coord;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit squares side by side sharing the edge x = 1
    fn two_squares() -> (Diagram, CellId, CellId) {
        let mut diagram = Diagram::new();
        let s0 = diagram.push_site(Vec2::new(0.5, 0.5));
        let s1 = diagram.push_site(Vec2::new(1.5, 0.5));
        let c0 = diagram.push_cell(s0);
        let c1 = diagram.push_cell(s1);

        let square = |x: f32| {
            [
                (Vec2::new(x, 0.0), Vec2::new(x + 1.0, 0.0)),
                (Vec2::new(x, 1.0), Vec2::new(x + 1.0, 1.0)),
                (Vec2::new(x, 0.0), Vec2::new(x, 1.0)),
            ]
        };

        for (p1, p2) in square(0.0) {
            let mut edge = GraphEdge::new(p1, p2);
            edge.link_cell(c0);
            let id = diagram.push_edge(edge);
            diagram.cell_mut(c0).edges.push(id);
        }
        for (p1, p2) in square(1.0).into_iter().take(2) {
            let mut edge = GraphEdge::new(p1, p2);
            edge.link_cell(c1);
            let id = diagram.push_edge(edge);
            diagram.cell_mut(c1).edges.push(id);
        }
        let mut right = GraphEdge::new(Vec2::new(2.0, 0.0), Vec2::new(2.0, 1.0));
        right.link_cell(c1);
        let id = diagram.push_edge(right);
        diagram.cell_mut(c1).edges.push(id);

        let mut shared = GraphEdge::new(Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0));
        shared.site1 = Some(s0);
        shared.site2 = Some(s1);
        shared.link_cell(c0);
        shared.link_cell(c1);
        let id = diagram.push_edge(shared);
        diagram.cell_mut(c0).edges.push(id);
        diagram.cell_mut(c1).edges.push(id);

        (diagram, c0, c1)
    }

    #[test]
    fn test_adjacency() {
        let (diagram, c0, c1) = two_squares();
        assert!(diagram.are_adjacent(c0, c1));
        assert!(diagram.are_adjacent(c1, c0));
        assert_eq!(diagram.adjacent(c0).count(), 1);
    }

    #[test]
    fn test_link_cell_first_two_win() {
        let mut edge = GraphEdge::new(Vec2::ZERO, Vec2::X);
        assert!(edge.link_cell(CellId(0)));
        assert!(edge.link_cell(CellId(1)));
        assert!(!edge.link_cell(CellId(2)));
        assert_eq!(edge.adjacent_cell(CellId(0)), Some(CellId(1)));
        assert_eq!(edge.adjacent_cell(CellId(2)), None);
    }

    #[test]
    fn test_point_inside() {
        let (diagram, c0, c1) = two_squares();
        assert!(diagram.is_point_inside(c0, Vec2::new(0.3, 0.6)));
        assert!(!diagram.is_point_inside(c0, Vec2::new(1.3, 0.6)));
        assert!(diagram.is_point_inside(c1, Vec2::new(1.3, 0.6)));
    }

    #[test]
    fn test_new_cell_is_wall() {
        let (diagram, c0, _) = two_squares();
        assert!(diagram.cell(c0).is_wall());
        assert_eq!(diagram.cell(c0).center, Vec2::new(0.5, 0.5));
    }
}
