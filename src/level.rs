//! Level main structure

use std::collections::HashSet;
use std::time::Instant;

use glam::Vec2;
use tracing::{debug, error};

use crate::carving::{
    carve_tunnels, clean_cells, create_holes, flag_outside_level, generate_path, generate_tunnels,
    too_close_cells, widen_path, Tunnel, TunnelBounds,
};
use crate::cell::{BodyId, CellId, Diagram, VoronoiCell};
use crate::config::LevelConfig;
use crate::error::{LevelGenError, Result};
use crate::generation::{build_cells, generate_sites};
use crate::geometry::Rect;
use crate::grid::{CellGrid, GRID_CELL_SIZE};
use crate::mesh::{
    barrier_body, generate_polygons, round_cell, BodyKind, Clearance, CollisionBody, Fixture, MeshData,
    RoundingParams,
};
use crate::mirror::{mirror_bucket_point, mirror_cells, mirror_point};
use crate::position::{InterestingPosition, PositionType};
use crate::rng::LevelRng;
use crate::ruins::{Ruin, RuinBounds, RuinPlacement};
use crate::terrain::{LevelWall, SeaFloorProfile, SEA_FLOOR_THICKNESS};
use crate::waypoint::{SpawnType, WayPointGraph};

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// A generated, collidable cave level
///
/// Generation runs once, synchronously, and draws every random decision from
/// one stream seeded by the configuration's seed string. Afterwards the level
/// is read-only until [`Level::unload`].
///
/// # Examples
///
/// ```no_run
/// use rust_voronoi_cave::*;
///
/// let config = LevelConfigBuilder::new()
///     .seed("AB")
///     .build()
///     .unwrap();
///
/// let level = Level::generate(config).unwrap();
/// println!("Generated {} wall cells", level.walls().len());
///
/// // Query positions of interest
/// for pos in level.positions_of_interest() {
///     println!("{:?} at {}", pos.position_type, pos.position);
/// }
/// ```
#[derive(Clone)]
pub struct Level {
    /// Configuration used to generate this level
    config: LevelConfig,

    /// Level bounds, aligned to the grid bucket size
    borders: Rect,

    /// Arena holding every site, edge and cell
    diagram: Diagram,

    /// Wall cells bucketed by position
    grid: CellGrid,

    /// Wall cells that received collision geometry
    walls: Vec<CellId>,

    /// Open cells: main path, widening, tunnels and holes
    path_cells: Vec<CellId>,

    /// Main path cells in walking order
    main_path: Vec<CellId>,

    waypoints: WayPointGraph,
    positions_of_interest: Vec<InterestingPosition>,
    tunnels: Vec<Tunnel>,
    ruins: Vec<Ruin>,
    sea_floor: SeaFloorProfile,
    sea_floor_wall: LevelWall,
    bodies: Vec<CollisionBody>,
    mesh: MeshData,

    start_position: Vec2,
    end_position: Vec2,
    equality_check_val: i32,
    mirrored: bool,

    /// Spatial index over wall cell centers (requires spatial-index feature)
    #[cfg(feature = "spatial-index")]
    spatial_index: SpatialIndex,
}

impl Level {
    /// Generate a level
    ///
    /// # Arguments
    ///
    /// * `config` - Seed, difficulty, size factor, mirror flag and parameters
    ///
    /// # Returns
    ///
    /// `Result<Level>` - The finished level, or an error when the geometry
    /// could not be built (e.g. non-finite sites)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_voronoi_cave::*;
    ///
    /// let config = LevelConfigBuilder::new().seed("AB").mirror(true).build().unwrap();
    /// let level = Level::generate(config).unwrap();
    /// assert!(level.mirrored());
    /// ```
    pub fn generate(config: LevelConfig) -> Result<Self> {
        let started = Instant::now();
        let params = &config.params;
        let mut rng = LevelRng::from_seed_str(&config.seed);

        let grid_size = GRID_CELL_SIZE as i32;
        let width_i = config.width() / grid_size * grid_size;
        let height_i = params.height / grid_size * grid_size;
        let (width, height) = (width_i as f32, height_i as f32);
        let borders = Rect::new(0.0, 0.0, width, height);

        let min_width = params.path_min_width;
        let path_borders = borders.inflate(-(min_width * 2) as f32, -min_width as f32);
        if path_borders.width <= 0.0 || path_borders.height <= 0.0 {
            return Err(LevelGenError::InvalidConfig(format!(
                "level of {}x{} leaves no room for a path of width {}",
                width, height, min_width
            )));
        }

        // Step 1: start and end
        let mut start_position = Vec2::new(
            rng.range_i32(min_width, min_width * 2) as f32,
            rng.range_i32(height_i / 2, height_i - min_width * 2) as f32,
        );
        let mut end_position = Vec2::new(
            (width_i - rng.range_i32(min_width, min_width * 2)) as f32,
            rng.range_i32(height_i / 2, height_i - min_width * 2) as f32,
        );

        // Step 2: sea floor profile
        let mut sea_floor = SeaFloorProfile::generate(width_i, params, &mut rng);

        // Step 3: main path nodes and tunnel polylines
        let path_nodes = Self::path_nodes(&config, borders, path_borders, start_position, end_position, &mut rng);
        let tunnel_bounds = TunnelBounds {
            width,
            height,
            sea_floor_top: sea_floor.top(),
            avoid_radius: params.tunnel_avoid_radius,
        };
        let tunnel_nodes = generate_tunnels(&path_nodes, params, min_width as f32, &tunnel_bounds, &mut rng);

        // Step 4: Voronoi cells
        let sites = generate_sites(
            borders,
            params.voronoi_site_interval,
            params.voronoi_site_variance,
            &tunnel_nodes,
            &mut rng,
        );
        let (mut diagram, mut grid) = build_cells(&sites, borders)?;
        debug!(
            sites = sites.len(),
            cells = diagram.cells.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built cells"
        );

        // Step 5: main path
        let path_limits = Rect::new(path_borders.x, path_borders.y, path_borders.width, height);
        let main_path = generate_path(
            &path_nodes,
            &mut diagram,
            &grid,
            path_limits,
            params.main_path_wander_amount,
            false,
            &mut rng,
        );
        let Some(&first_path_cell) = main_path.first() else {
            return Err(LevelGenError::GenerationFailed("main path resolved to no cells".to_string()));
        };

        let mut positions_of_interest: Vec<InterestingPosition> = main_path
            .iter()
            .skip(2)
            .step_by(3)
            .map(|&c| InterestingPosition::new(diagram.cell(c).center, PositionType::MAIN_PATH))
            .collect();

        let mut waypoints = WayPointGraph::along_path(&diagram, &main_path, height);
        for poi in &positions_of_interest {
            Self::add_enemy_waypoint(&mut waypoints, poi.position);
        }

        let interval = params.voronoi_site_interval.as_vec2();
        let variance = params.voronoi_site_variance.as_vec2();
        let max_cell_size = (interval + variance * 2.0).length();
        let mut path_cells = main_path.clone();
        path_cells.extend(widen_path(&main_path, &mut diagram, &grid, min_width as f32, max_cell_size));

        start_position.x = diagram.cell(first_path_cell).center.x;

        // Step 6: tunnels
        let mut tunnels = carve_tunnels(tunnel_nodes, &mut diagram, &grid, path_borders, &mut rng);
        for tunnel in &tunnels {
            if let Some(&last) = tunnel.nodes.last() {
                positions_of_interest.push(InterestingPosition::new(last, PositionType::CAVE));
            }
            if tunnel.nodes.len() > 4 {
                let middle = tunnel.nodes[tunnel.nodes.len() / 2];
                positions_of_interest.push(InterestingPosition::new(middle, PositionType::CAVE));
            }
            path_cells.extend(tunnel.cells.iter().copied());
        }

        // Step 7: cleanup and holes
        let mut walls = clean_cells(&diagram, &path_cells);
        let x_padding = (width_i / 5) as f32;
        let y_padding = (height_i / 5) as f32;
        let hole_limits = Rect::new(x_padding, 0.0, width - x_padding * 2.0, height - y_padding);
        let holes = create_holes(
            &mut walls,
            &mut diagram,
            &waypoints.positions(SpawnType::Path),
            hole_limits,
            params.bottom_hole_probability,
            end_position.x,
            height - min_width as f32,
            &mut rng,
        );
        path_cells.extend(holes);
        flag_outside_level(&mut diagram, &walls, &path_cells, height);

        grid.clear();
        for &cell in &walls {
            grid.insert(cell, diagram.cell(cell).center);
        }

        // Step 8: ruins
        let caves: Vec<Vec2> = positions_of_interest
            .iter()
            .filter(|p| p.matches(PositionType::CAVE))
            .map(|p| p.position)
            .collect();
        let placement = RuinPlacement {
            main_path: &main_path,
            caves: &caves,
            bounds: RuinBounds {
                height,
                sea_floor_top: sea_floor.top(),
            },
            size_min: params.ruin_size_min,
            size_max: params.ruin_size_max,
            max_iterations: params.ruin_relaxation_iterations,
        };
        let mut ruins: Vec<Ruin> = Vec::new();
        for _ in 0..params.ruin_count {
            let Some(ruin) = placement.place(&mut diagram, &mut grid, &mut walls, &ruins, &mut rng) else {
                continue;
            };
            let enemy_spawns = waypoints.positions(SpawnType::Enemy);
            for position in ruin.interest_positions(&enemy_spawns) {
                positions_of_interest.push(InterestingPosition::new(position, PositionType::RUIN));
            }
            ruins.push(ruin);
        }

        // Step 9: mirror
        if config.mirror {
            let mut live = walls.clone();
            live.extend(path_cells.iter().copied());
            live.extend(ruins.iter().flat_map(|r| r.removed_cells.iter().copied()));
            mirror_cells(&mut diagram, &live, width);

            for tunnel in &mut tunnels {
                for node in &mut tunnel.nodes {
                    *node = mirror_point(*node, width);
                }
            }
            for poi in &mut positions_of_interest {
                poi.position = mirror_point(poi.position, width);
            }
            waypoints.mirror(width);
            for ruin in &mut ruins {
                ruin.mirror(width);
            }
            sea_floor.mirror(width);
            start_position.x = width - start_position.x;
            end_position.x = width - end_position.x;

            grid.clear();
            for &cell in &walls {
                grid.insert(cell, mirror_bucket_point(diagram.cell(cell).center, width));
            }
        }

        // Step 10: solid edges and rounding
        let wall_set: HashSet<CellId> = walls.iter().copied().collect();
        for &cell in &walls {
            for i in 0..diagram.cell(cell).edges.len() {
                let edge_id = diagram.cell(cell).edges[i];
                let edge = diagram.edge_mut(edge_id);
                edge.is_solid = edge.adjacent_cell(cell).map_or(true, |c| !wall_set.contains(&c));
            }
        }

        let rounding = RoundingParams::from_params(params);
        if rounding.is_enabled() {
            let centerline: Vec<Vec2> = main_path.iter().map(|&c| diagram.cell(c).center).collect();
            let clearance = Clearance {
                centerline: &centerline,
                radius: min_width as f32 / 2.0,
            };
            for &cell in &walls {
                round_cell(cell, &mut diagram, &grid, &rounding, &clearance, &mut rng);
            }
        }

        // Step 11: collision bodies and render mesh
        let mut mesh = MeshData::default();
        let mut bodies = Vec::with_capacity(4);
        bodies.push(generate_polygons(
            &mut diagram,
            &mut walls,
            BodyId(0),
            BodyKind::LevelCells,
            &mut mesh,
        ));

        let sea_floor_wall = LevelWall::new(
            sea_floor.points(),
            Vec2::new(0.0, -SEA_FLOOR_THICKNESS),
            &mut diagram,
            &mut grid,
        );
        let mut sea_floor_cells = sea_floor_wall.cells().to_vec();
        bodies.push(generate_polygons(
            &mut diagram,
            &mut sea_floor_cells,
            BodyId(1),
            BodyKind::SeaFloor,
            &mut mesh,
        ));
        bodies.push(barrier_body(BodyId(2), BodyKind::TopBarrier, height, width));
        bodies.push(barrier_body(BodyId(3), BodyKind::BottomBarrier, sea_floor.base_depth(), width));

        start_position.y = height;
        end_position.y = height;
        if config.mirror {
            std::mem::swap(&mut start_position, &mut end_position);
        }

        let equality_check_val = rng.next_i32();

        #[cfg(feature = "spatial-index")]
        let spatial_index = {
            let centers: Vec<(CellId, Vec2)> = walls.iter().map(|&c| (c, diagram.cell(c).center)).collect();
            SpatialIndex::new(&centers)
        };

        debug!(
            seed = %config.seed,
            params = %config.params.name,
            walls = walls.len(),
            tunnels = tunnels.len(),
            ruins = ruins.len(),
            equality_check_val,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated level"
        );

        Ok(Self {
            mirrored: config.mirror,
            config,
            borders,
            diagram,
            grid,
            walls,
            path_cells,
            main_path,
            waypoints,
            positions_of_interest,
            tunnels,
            ruins,
            sea_floor,
            sea_floor_wall,
            bodies,
            mesh,
            start_position,
            end_position,
            equality_check_val,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        })
    }

    /// Main path nodes: above the start, through the path area, above the end
    ///
    /// Falls back to a single node at the level center when the start and
    /// end are too close for any intermediate node.
    fn path_nodes(
        config: &LevelConfig,
        borders: Rect,
        path_borders: Rect,
        start: Vec2,
        end: Vec2,
        rng: &mut LevelRng,
    ) -> Vec<Vec2> {
        let interval = config.params.main_path_node_interval_range;
        let mut nodes = vec![Vec2::new(start.x, borders.height)];

        let mut x = start.x as i32 + interval.x;
        while x < end.x as i32 - interval.x {
            let y = rng.range_i32(path_borders.y as i32, path_borders.top() as i32);
            nodes.push(Vec2::new(x as f32, y as f32));
            x += rng.range_i32(interval.x, interval.y).max(1);
        }
        nodes.push(Vec2::new(end.x, borders.height));

        if nodes.len() <= 2 {
            nodes.insert(1, borders.center());
        }
        nodes
    }

    /// Add an enemy spawn node linked to the nearest path node
    fn add_enemy_waypoint(waypoints: &mut WayPointGraph, position: Vec2) {
        let nearest = waypoints
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, n)| n.spawn == SpawnType::Path)
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_squared(position)
                    .total_cmp(&b.position.distance_squared(position))
            })
            .map(|(i, _)| i);
        let node = waypoints.add(position, SpawnType::Enemy);
        if let Some(nearest) = nearest {
            waypoints.link(nearest, node);
        }
    }

    /// Get the configuration used to generate this level
    #[inline]
    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    #[inline]
    pub fn seed(&self) -> &str {
        &self.config.seed
    }

    #[inline]
    pub fn difficulty(&self) -> f32 {
        self.config.difficulty
    }

    /// Level bounds
    #[inline]
    pub fn borders(&self) -> Rect {
        self.borders
    }

    /// Level size
    #[inline]
    pub fn size(&self) -> Vec2 {
        self.borders.size()
    }

    /// Whether the level was generated mirrored
    #[inline]
    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    /// Where the player enters, at the top border
    #[inline]
    pub fn start_position(&self) -> Vec2 {
        self.start_position
    }

    /// Where the player leaves, at the top border
    #[inline]
    pub fn end_position(&self) -> Vec2 {
        self.end_position
    }

    /// Checksum peers compare to verify they generated the same level
    ///
    /// This is the final draw of the level's random stream, so any
    /// difference in the number or order of draws shows up here.
    #[inline]
    pub fn equality_check_val(&self) -> i32 {
        self.equality_check_val
    }

    /// Arena holding every cell, edge and site
    #[inline]
    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// Get a cell by ID
    ///
    /// # Errors
    ///
    /// Returns `CellNotFound` if the id is out of bounds.
    pub fn cell(&self, id: CellId) -> Result<&VoronoiCell> {
        self.diagram.cells.get(id.0).ok_or(LevelGenError::CellNotFound(id.0))
    }

    /// Wall cells with collision geometry
    #[inline]
    pub fn walls(&self) -> &[CellId] {
        &self.walls
    }

    /// Open cells (main path, widening, tunnels and holes)
    #[inline]
    pub fn path_cells(&self) -> &[CellId] {
        &self.path_cells
    }

    /// Main path cells in walking order
    #[inline]
    pub fn main_path(&self) -> &[CellId] {
        &self.main_path
    }

    #[inline]
    pub fn waypoints(&self) -> &WayPointGraph {
        &self.waypoints
    }

    #[inline]
    pub fn positions_of_interest(&self) -> &[InterestingPosition] {
        &self.positions_of_interest
    }

    #[inline]
    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    #[inline]
    pub fn ruins(&self) -> &[Ruin] {
        &self.ruins
    }

    #[inline]
    pub fn sea_floor(&self) -> &SeaFloorProfile {
        &self.sea_floor
    }

    #[inline]
    pub fn sea_floor_wall(&self) -> &LevelWall {
        &self.sea_floor_wall
    }

    /// Collision bodies: level cells, sea floor, top and bottom barrier
    #[inline]
    pub fn bodies(&self) -> &[CollisionBody] {
        &self.bodies
    }

    /// Render triangles of every finalized cell
    #[inline]
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    /// Point on the sea floor directly below `x`
    pub fn bottom_position(&self, x: f32) -> Vec2 {
        self.sea_floor.bottom_position(x)
    }

    /// Wall cells registered within `search_depth` grid buckets of `position`
    pub fn get_cells(&self, position: Vec2, search_depth: i32) -> Vec<CellId> {
        self.grid.cells_near(position, search_depth)
    }

    /// Wall cells with an edge closer than `radius` to `position`
    pub fn too_close_cells(&self, position: Vec2, radius: f32) -> Vec<CellId> {
        let depth = (radius / GRID_CELL_SIZE).ceil() as i32 + 2;
        too_close_cells(&self.diagram, &self.grid, position, radius, depth)
    }

    /// Collision fixture containing `point`, if any
    pub fn wall_at(&self, point: Vec2) -> Option<&Fixture> {
        self.bodies.iter().find_map(|b| b.fixture_at(point))
    }

    /// Pick a random position of interest
    ///
    /// Only positions matching `filter` and at least `min_distance` away from
    /// every point in `avoid` qualify.
    ///
    /// # Returns
    ///
    /// The position and `true`, or a random point in the level and `false`
    /// when nothing qualifies.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use rust_voronoi_cave::*;
    /// # let level = Level::generate(LevelConfigBuilder::new().seed("AB").build().unwrap()).unwrap();
    /// let mut rng = LevelRng::from_seed_str("spawns");
    /// let (position, found) = level.interesting_position(
    ///     PositionType::CAVE | PositionType::RUIN,
    ///     &[level.start_position()],
    ///     5000.0,
    ///     &mut rng,
    /// );
    /// println!("spawn at {} ({})", position, found);
    /// ```
    pub fn interesting_position(
        &self,
        filter: PositionType,
        avoid: &[Vec2],
        min_distance: f32,
        rng: &mut LevelRng,
    ) -> (Vec2, bool) {
        let min_dist_sqr = min_distance * min_distance;
        let candidates: Vec<Vec2> = self
            .positions_of_interest
            .iter()
            .filter(|p| p.matches(filter))
            .map(|p| p.position)
            .filter(|p| avoid.iter().all(|a| a.distance_squared(*p) >= min_dist_sqr))
            .collect();

        if candidates.is_empty() {
            error!(?filter, min_distance, seed = %self.config.seed, "could not find a suitable position of interest");
            let fallback = Vec2::new(
                rng.range_f32(0.0, self.borders.width),
                rng.range_f32(0.0, self.borders.height),
            );
            return (fallback, false);
        }
        (candidates[rng.index(candidates.len())], true)
    }

    /// Find the wall cell nearest to a position (requires spatial-index feature)
    ///
    /// Returns `None` for a level without wall cells.
    #[cfg(feature = "spatial-index")]
    pub fn find_cell_at(&self, position: Vec2) -> Option<CellId> {
        self.spatial_index.find_nearest(position)
    }

    /// Release bodies, cells and grid state
    pub fn unload(&mut self) {
        self.bodies.clear();
        self.mesh = MeshData::default();
        self.walls.clear();
        self.path_cells.clear();
        self.main_path.clear();
        self.grid.clear();
        self.diagram = Diagram::new();
        self.waypoints.clear();
        self.positions_of_interest.clear();
        self.tunnels.clear();
        self.ruins.clear();
        #[cfg(feature = "spatial-index")]
        {
            self.spatial_index = SpatialIndex::new(&[]);
        }
        debug!(seed = %self.config.seed, "unloaded level");
    }
}
