//! Side tunnels branching off the main path

use glam::Vec2;
use tracing::debug;

use super::path::{generate_path_between, resolve_targets};
use crate::cell::{CellId, CellType, Diagram};
use crate::config::GenerationParams;
use crate::geometry::{sign, Rect};
use crate::grid::CellGrid;
use crate::rng::LevelRng;

/// Length of one tunnel section
const SECTION_LENGTH: f32 = 1000.0;

/// Horizontal margin kept between tunnel nodes and the level sides
const SIDE_MARGIN: f32 = 500.0;

/// Chance of a random step while carving a tunnel
const TUNNEL_WANDER_AMOUNT: f32 = 0.3;

/// A side tunnel: its node polyline and the cells carved along it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tunnel {
    /// Tunnel nodes, starting on the main path
    pub nodes: Vec<Vec2>,
    /// Cells opened for the tunnel (empty until carved)
    pub cells: Vec<CellId>,
}

/// Area tunnel nodes are confined to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunnelBounds {
    /// Level width
    pub width: f32,
    /// Level height
    pub height: f32,
    /// Top of the sea floor profile; tunnels stay above it
    pub sea_floor_top: f32,
    /// Radius within which avoided nodes push the tunnel away
    pub avoid_radius: f32,
}

impl TunnelBounds {
    fn min_y(&self) -> f32 {
        self.sea_floor_top.min(self.max_y())
    }

    fn max_y(&self) -> f32 {
        self.height - SIDE_MARGIN
    }

    fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(SIDE_MARGIN, self.width - SIDE_MARGIN),
            p.y.clamp(self.min_y(), self.max_y()),
        )
    }
}

/// Extend a tunnel from its seed nodes until it reaches `target_length`
///
/// Each section heads in a random direction biased vertically toward the
/// half of the level the tunnel is not in, averaged with the previous
/// direction, and pushed away from `avoid` nodes within the avoid radius
/// (with linear falloff). The direction is reflected vertically when a step
/// would cross the top border or dip below the sea floor.
pub fn generate_tunnel(
    mut nodes: Vec<Vec2>,
    target_length: f32,
    avoid: &[Vec2],
    bounds: &TunnelBounds,
    rng: &mut LevelRng,
) -> Vec<Vec2> {
    let Some(&seed) = nodes.last() else {
        return nodes;
    };
    let mut last = seed;
    let mut length = 0.0;
    let mut prev_dir: Option<Vec2> = None;

    while length < target_length {
        let mut dir = rng.vector(1.0);
        dir.y += sign(last.y - bounds.height / 2.0) * 0.5;
        if let Some(prev) = prev_dir {
            dir = (dir + prev) * 0.5;
        }

        for &node in avoid {
            let diff = last - node;
            if diff.x.abs() < 1.0 || diff.y.abs() < 1.0 {
                continue;
            }
            let dist = diff.length();
            if dist < bounds.avoid_radius {
                dir += diff / dist * (1.0 - dist / bounds.avoid_radius);
            }
        }

        dir = dir.try_normalize().unwrap_or(Vec2::Y);

        let step_y = last.y + dir.y * SECTION_LENGTH;
        if step_y > bounds.height || step_y < bounds.min_y() {
            dir.y = -dir.y;
        }

        let next = bounds.clamp(last + dir * SECTION_LENGTH);
        nodes.push(next);
        last = next;
        prev_dir = Some(dir);
        length += SECTION_LENGTH;
    }

    nodes
}

/// Generate the node polylines of all side tunnels and their branches
///
/// Each tunnel starts at a random interior main path node, first stepping
/// two path widths vertically away from the level's middle. Up to two
/// branches start at random nodes of the tunnel with half the length.
pub fn generate_tunnels(
    path_nodes: &[Vec2],
    params: &GenerationParams,
    path_width: f32,
    bounds: &TunnelBounds,
    rng: &mut LevelRng,
) -> Vec<Vec<Vec2>> {
    let mut tunnels = Vec::new();
    if path_nodes.len() < 3 {
        return tunnels;
    }

    let length_range = params.small_tunnel_length_range;
    for _ in 0..params.small_tunnel_count {
        let start_index = rng.range_i32(1, path_nodes.len() as i32 - 2) as usize;
        let start = path_nodes[start_index];
        let length = rng.range_i32(length_range.x, length_range.y) as f32;

        let seed_nodes = vec![
            start,
            bounds.clamp(start + Vec2::new(0.0, sign(start.y - bounds.height / 2.0) * path_width * 2.0)),
        ];
        let tunnel = generate_tunnel(seed_nodes, length, path_nodes, bounds, rng);
        tunnels.push(tunnel);
        let tunnel_index = tunnels.len() - 1;

        let branches = rng.range_i32(0, 3);
        for _ in 0..branches {
            let tunnel = &tunnels[tunnel_index];
            let branch_start = tunnel[rng.index(tunnel.len())];
            let branch_length = rng.range_i32(length_range.x, length_range.y) as f32 * 0.5;
            let branch = generate_tunnel(vec![branch_start], branch_length, path_nodes, bounds, rng);
            if branch.len() > 1 {
                tunnels.push(branch);
            }
        }
    }

    debug!(tunnels = tunnels.len(), "generated tunnel nodes");
    tunnels
}

/// Carve the tunnels that actually connect to the main path
///
/// A tunnel is carved only when its first node resolves to a path cell and
/// no more than half of its nodes already lie in path cells.
///
/// # Returns
///
/// The carved tunnels with their cells.
pub fn carve_tunnels(
    tunnels: Vec<Vec<Vec2>>,
    diagram: &mut Diagram,
    grid: &CellGrid,
    limits: Rect,
    rng: &mut LevelRng,
) -> Vec<Tunnel> {
    let mut carved = Vec::new();

    for nodes in tunnels {
        if nodes.len() < 2 {
            continue;
        }

        let is_path = |diagram: &Diagram, p: Vec2| {
            grid.find_cell(diagram, p, 1)
                .is_some_and(|c| diagram.cell(c).cell_type == CellType::Path)
        };

        if !is_path(diagram, nodes[0]) {
            continue;
        }
        let on_path = nodes.iter().filter(|&&n| is_path(diagram, n)).count();
        if on_path > nodes.len() / 2 {
            continue;
        }

        let targets = resolve_targets(&nodes, diagram, grid);
        let cells = generate_path_between(&targets, diagram, limits, TUNNEL_WANDER_AMOUNT, false, rng);
        carved.push(Tunnel { nodes, cells });
    }

    debug!(carved = carved.len(), "carved tunnels");
    carved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carving::tests::test_diagram;

    fn bounds() -> TunnelBounds {
        TunnelBounds {
            width: 30_000.0,
            height: 12_000.0,
            sea_floor_top: 1500.0,
            avoid_radius: 20_000.0,
        }
    }

    #[test]
    fn test_tunnel_reaches_length_within_bounds() {
        let mut rng = LevelRng::from_seed_str("tunnel");
        let b = bounds();
        let nodes = generate_tunnel(
            vec![Vec2::new(15_000.0, 6000.0)],
            7500.0,
            &[Vec2::new(10_000.0, 5000.0)],
            &b,
            &mut rng,
        );

        assert_eq!(nodes.len(), 1 + 8);
        for node in &nodes[1..] {
            assert!(node.x >= 500.0 && node.x <= 29_500.0);
            assert!(node.y >= 1500.0 && node.y <= 11_500.0);
        }
    }

    #[test]
    fn test_zero_length_tunnel_keeps_seed() {
        let mut rng = LevelRng::from_seed_str("short");
        let nodes = generate_tunnel(vec![Vec2::new(1.0, 2.0)], 0.0, &[], &bounds(), &mut rng);
        assert_eq!(nodes, vec![Vec2::new(1.0, 2.0)]);
    }

    #[test]
    fn test_generate_tunnels_start_on_path_nodes() {
        let mut rng = LevelRng::from_seed_str("tunnels");
        let params = GenerationParams::default();
        let path_nodes = vec![
            Vec2::new(2000.0, 12_000.0),
            Vec2::new(8000.0, 5000.0),
            Vec2::new(15_000.0, 7000.0),
            Vec2::new(22_000.0, 4000.0),
            Vec2::new(28_000.0, 12_000.0),
        ];
        let tunnels = generate_tunnels(&path_nodes, &params, 2000.0, &bounds(), &mut rng);

        assert!(tunnels.len() >= params.small_tunnel_count as usize);
        let interior = &path_nodes[1..path_nodes.len() - 2];
        for (i, tunnel) in tunnels.iter().enumerate() {
            let from_path = interior.contains(&tunnel[0]);
            let from_earlier = tunnels[..i].iter().any(|t| t.contains(&tunnel[0]));
            assert!(from_path || from_earlier, "tunnel {} starts nowhere", i);
        }
    }

    #[test]
    fn test_carved_tunnels_start_on_path() {
        let (mut diagram, grid, borders) = test_diagram("carve");
        let mut rng = LevelRng::from_seed_str("carve");

        let on_path = vec![
            Vec2::new(15_000.0, 6000.0),
            Vec2::new(15_000.0, 9500.0),
            Vec2::new(16_000.0, 10_500.0),
        ];
        let off_path = vec![Vec2::new(15_000.0, 1000.0), Vec2::new(16_000.0, 1500.0)];

        let start = grid.find_cell(&diagram, on_path[0], 1).unwrap();
        diagram.cell_mut(start).cell_type = CellType::Path;
        let carved = carve_tunnels(vec![on_path, off_path], &mut diagram, &grid, borders, &mut rng);

        assert_eq!(carved.len(), 1);
        assert!(!carved[0].cells.is_empty());
        for cell in &carved[0].cells {
            assert_eq!(diagram.cell(*cell).cell_type, CellType::Path);
        }
    }
}
