//! Navigation waypoints along the carved passages
//!
//! The graph is built while the main path is widened: one node per path cell,
//! each linked to the node before it, plus entry and exit nodes on the top
//! border. Enemy spawn nodes mark the main path's positions of interest and
//! are not linked.

use std::collections::VecDeque;

use glam::Vec2;

use crate::cell::{CellId, Diagram};

/// What a waypoint is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnType {
    /// Navigation node along a passage
    Path,
    /// Spawn point for hostile creatures
    Enemy,
}

/// A single waypoint
#[derive(Debug, Clone, PartialEq)]
pub struct WayPoint {
    /// Position in level coordinates
    pub position: Vec2,
    /// Purpose of the node
    pub spawn: SpawnType,
    /// Indices of linked nodes (links are symmetric)
    pub links: Vec<usize>,
}

/// Undirected waypoint graph stored as an adjacency list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayPointGraph {
    nodes: Vec<WayPoint>,
}

impl WayPointGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the navigation nodes along a path of cells
    ///
    /// The first node sits at the top border above the first cell and the
    /// last at the top border above the last cell. A cell visited again gets
    /// another node linked back to every earlier node at its position.
    pub fn along_path(diagram: &Diagram, path: &[CellId], top: f32) -> Self {
        let mut graph = Self::new();
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            return graph;
        };

        let mut prev = graph.add(Vec2::new(diagram.cell(first).center.x, top), SpawnType::Path);
        for &cell in path {
            let position = diagram.cell(cell).center;
            let node = graph.add(position, SpawnType::Path);
            graph.link(prev, node);

            let same: Vec<usize> = (0..node).filter(|&i| graph.nodes[i].position == position).collect();
            for earlier in same {
                graph.link(earlier, node);
            }
            prev = node;
        }
        let exit = graph.add(Vec2::new(diagram.cell(last).center.x, top), SpawnType::Path);
        graph.link(prev, exit);

        graph
    }

    /// Add an unlinked node and return its index
    pub fn add(&mut self, position: Vec2, spawn: SpawnType) -> usize {
        self.nodes.push(WayPoint {
            position,
            spawn,
            links: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Link two nodes both ways; self links and duplicates are ignored
    pub fn link(&mut self, a: usize, b: usize) {
        if a == b || self.nodes[a].links.contains(&b) {
            return;
        }
        self.nodes[a].links.push(b);
        self.nodes[b].links.push(a);
    }

    /// All nodes
    pub fn nodes(&self) -> &[WayPoint] {
        &self.nodes
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Positions of every node with the given spawn type
    pub fn positions(&self, spawn: SpawnType) -> Vec<Vec2> {
        self.nodes
            .iter()
            .filter(|n| n.spawn == spawn)
            .map(|n| n.position)
            .collect()
    }

    /// Nodes reachable from `start` by following links (breadth first)
    pub fn reachable_from(&self, start: usize) -> Vec<bool> {
        let mut visited = vec![false; self.nodes.len()];
        if start >= self.nodes.len() {
            return visited;
        }

        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(node) = queue.pop_front() {
            for &next in &self.nodes[node].links {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Whether every path node can be reached from the first one
    pub fn is_path_connected(&self) -> bool {
        let visited = self.reachable_from(0);
        self.nodes
            .iter()
            .zip(visited)
            .all(|(node, seen)| node.spawn != SpawnType::Path || seen)
    }

    /// Reflect every node horizontally across a level of the given width
    pub fn mirror(&mut self, width: f32) {
        for node in &mut self.nodes {
            node.position.x = width - node.position.x;
        }
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carving::generate_path;
    use crate::carving::tests::test_diagram;
    use crate::rng::LevelRng;

    #[test]
    fn test_link_is_symmetric_and_unique() {
        let mut graph = WayPointGraph::new();
        let a = graph.add(Vec2::ZERO, SpawnType::Path);
        let b = graph.add(Vec2::X, SpawnType::Path);
        graph.link(a, b);
        graph.link(b, a);
        graph.link(a, a);

        assert_eq!(graph.nodes()[a].links, vec![b]);
        assert_eq!(graph.nodes()[b].links, vec![a]);
    }

    #[test]
    fn test_along_path_is_connected() {
        let (mut diagram, grid, borders) = test_diagram("waypoints");
        let mut rng = LevelRng::from_seed_str("waypoints");
        let path = generate_path(
            &[Vec2::new(2000.0, 11_000.0), Vec2::new(15_000.0, 3000.0), Vec2::new(28_000.0, 11_000.0)],
            &mut diagram,
            &grid,
            borders,
            0.5,
            false,
            &mut rng,
        );

        let graph = WayPointGraph::along_path(&diagram, &path, borders.top());
        assert_eq!(graph.len(), path.len() + 2);
        assert!(graph.is_path_connected());

        let first = graph.nodes()[0].position;
        let last = graph.nodes()[graph.len() - 1].position;
        assert_eq!(first.y, borders.top());
        assert_eq!(last.y, borders.top());
        assert_eq!(first.x, diagram.cell(path[0]).center.x);
    }

    #[test]
    fn test_revisited_cell_links_back() {
        let (mut diagram, _, _) = test_diagram("revisit");
        let a = CellId(0);
        let b = CellId(1);
        diagram.cell_mut(a).center = Vec2::new(0.0, 0.0);
        diagram.cell_mut(b).center = Vec2::new(10.0, 0.0);

        let graph = WayPointGraph::along_path(&diagram, &[a, b, a], 100.0);
        // entry, a, b, a again, exit
        assert_eq!(graph.len(), 5);
        assert!(graph.nodes()[3].links.contains(&1));
    }

    #[test]
    fn test_third_visit_links_every_earlier_visit() {
        let (mut diagram, _, _) = test_diagram("revisit");
        let a = CellId(0);
        let b = CellId(1);
        let c = CellId(2);
        diagram.cell_mut(a).center = Vec2::new(0.0, 0.0);
        diagram.cell_mut(b).center = Vec2::new(10.0, 0.0);
        diagram.cell_mut(c).center = Vec2::new(0.0, 10.0);

        let graph = WayPointGraph::along_path(&diagram, &[a, b, a, c, a], 100.0);
        // entry, a, b, a, c, a, exit
        assert_eq!(graph.len(), 7);
        let third = &graph.nodes()[5].links;
        assert!(third.contains(&1));
        assert!(third.contains(&3));
        assert!(third.contains(&4));
    }

    #[test]
    fn test_unlinked_enemy_nodes_do_not_break_connectivity() {
        let mut graph = WayPointGraph::new();
        let a = graph.add(Vec2::ZERO, SpawnType::Path);
        let b = graph.add(Vec2::X, SpawnType::Path);
        graph.link(a, b);
        graph.add(Vec2::Y, SpawnType::Enemy);
        assert!(graph.is_path_connected());

        graph.add(Vec2::ONE, SpawnType::Path);
        assert!(!graph.is_path_connected());
    }

    #[test]
    fn test_mirror() {
        let mut graph = WayPointGraph::new();
        graph.add(Vec2::new(100.0, 5.0), SpawnType::Path);
        graph.mirror(1000.0);
        assert_eq!(graph.nodes()[0].position, Vec2::new(900.0, 5.0));
    }
}
