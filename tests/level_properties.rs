//! Whole-level properties: determinism, connectivity, width, mirroring,
//! ruin placement and geometry validity

use std::io::Write;

use rust_voronoi_cave::carving::sample_polyline;
use rust_voronoi_cave::geometry::distance_to_segment;
use rust_voronoi_cave::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn config(seed: &str, params: GenerationParams, mirror: bool) -> LevelConfig {
    LevelConfigBuilder::new()
        .seed(seed)
        .mirror(mirror)
        .params(params)
        .build()
        .unwrap()
}

fn no_ruins() -> GenerationParams {
    GenerationParams {
        ruin_count: 0,
        ..Default::default()
    }
}

/// Short subdivision pieces so rounding reshapes most wall edges
fn fine_rounding() -> GenerationParams {
    GenerationParams {
        cell_subdivision_length: 1000.0,
        ..Default::default()
    }
}

fn no_rounding() -> GenerationParams {
    GenerationParams {
        cell_rounding_amount: 0.0,
        cell_irregularity: 0.0,
        ..Default::default()
    }
}

#[test]
fn test_same_seed_same_level() {
    init_logging();
    let a = Level::generate(config("AB", GenerationParams::default(), false)).unwrap();
    let b = Level::generate(config("AB", GenerationParams::default(), false)).unwrap();

    assert_eq!(a.equality_check_val(), b.equality_check_val());
    assert_eq!(a.start_position(), b.start_position());
    assert_eq!(a.end_position(), b.end_position());
    assert_eq!(a.walls(), b.walls());
    assert_eq!(a.diagram().cells.len(), b.diagram().cells.len());
    assert_eq!(a.mesh().positions, b.mesh().positions);
    assert_eq!(a.positions_of_interest(), b.positions_of_interest());
}

#[test]
fn test_different_seeds_differ() {
    let a = Level::generate(config("AB", no_ruins(), false)).unwrap();
    let b = Level::generate(config("BA", no_ruins(), false)).unwrap();
    assert_ne!(a.mesh().positions, b.mesh().positions);
}

#[test]
fn test_ab_scenario() {
    init_logging();
    let level = Level::generate(config("AB", no_ruins(), false)).unwrap();

    assert_eq!(level.size(), Vec2::new(100_000.0, 50_000.0));
    assert!(!level.walls().is_empty());
    assert!(level.ruins().is_empty());
    assert!(!level.mirrored());

    let first = level.cell(level.main_path()[0]).unwrap();
    assert_eq!(level.start_position().x, first.center.x);
    assert_eq!(level.start_position().y, 50_000.0);
    assert!(level.start_position().x < level.end_position().x);
}

#[test]
fn test_main_path_is_connected() {
    let level = Level::generate(config("AB", GenerationParams::default(), false)).unwrap();
    let diagram = level.diagram();

    for pair in level.main_path().windows(2) {
        assert!(
            pair[0] == pair[1] || diagram.are_adjacent(pair[0], pair[1]),
            "main path jumps from {:?} to {:?}",
            pair[0],
            pair[1]
        );
        assert_eq!(diagram.cell(pair[1]).cell_type, CellType::Path);
    }
    assert!(level.waypoints().is_path_connected());

    let nodes = level.waypoints().nodes();
    let exit = nodes
        .iter()
        .rposition(|n| n.spawn == SpawnType::Path)
        .unwrap();
    assert!(level.waypoints().reachable_from(0)[exit]);
}

fn assert_minimum_width(level: &Level, radius: f32) {
    let diagram = level.diagram();
    let centers: Vec<Vec2> = level.main_path().iter().map(|&c| diagram.cell(c).center).collect();
    for sample in sample_polyline(&centers, 100.0) {
        for &wall in level.walls() {
            for edge in diagram.cell_edges(wall) {
                let dist = distance_to_segment(sample, edge.point1, edge.point2);
                assert!(dist >= radius - 1.0, "wall {:?} is {} from the path at {}", wall, dist, sample);
            }
        }
    }
}

#[test]
fn test_main_path_keeps_minimum_width() {
    let params = no_rounding();
    let radius = params.path_min_width as f32 / 2.0;
    let level = Level::generate(config("AB", params, false)).unwrap();
    assert_minimum_width(&level, radius);
}

#[test]
fn test_rounded_walls_keep_minimum_width() {
    let params = fine_rounding();
    let radius = params.path_min_width as f32 / 2.0;
    for seed in ["AB", "e2", "e3"] {
        let level = Level::generate(config(seed, params.clone(), false)).unwrap();
        assert_minimum_width(&level, radius);
    }
}

#[test]
fn test_fine_rounding_reshapes_walls() {
    let straight = Level::generate(config("AB", no_rounding(), false)).unwrap();
    let rounded = Level::generate(config("AB", fine_rounding(), false)).unwrap();
    assert_eq!(straight.walls(), rounded.walls());
    assert!(rounded.mesh().vertex_count() > straight.mesh().vertex_count());
}

fn assert_mirrored(plain: &Level, mirrored: &Level) {
    let width = plain.size().x;

    assert!(mirrored.mirrored());
    assert_eq!(plain.equality_check_val(), mirrored.equality_check_val());
    assert!((mirrored.start_position().x - (width - plain.end_position().x)).abs() < 0.5);
    assert!((mirrored.end_position().x - (width - plain.start_position().x)).abs() < 0.5);

    assert_eq!(plain.walls(), mirrored.walls());
    for &wall in plain.walls() {
        let a: Vec<&GraphEdge> = plain.diagram().cell_edges(wall).collect();
        let b: Vec<&GraphEdge> = mirrored.diagram().cell_edges(wall).collect();
        assert_eq!(a.len(), b.len());
        for (ea, eb) in a.iter().zip(&b) {
            assert!((eb.point1.x - (width - ea.point1.x)).abs() < 0.5);
            assert!((eb.point2.x - (width - ea.point2.x)).abs() < 0.5);
            assert!((eb.point1.y - ea.point1.y).abs() < 0.5);
            assert!((eb.point2.y - ea.point2.y).abs() < 0.5);
        }
    }

    for (pa, pb) in plain.positions_of_interest().iter().zip(mirrored.positions_of_interest()) {
        assert_eq!(pa.position_type, pb.position_type);
        assert!((pb.position.x - (width - pa.position.x)).abs() < 0.5);
    }
    assert_eq!(plain.mesh().vertex_count(), mirrored.mesh().vertex_count());
}

#[test]
fn test_mirrored_level_reflects_geometry() {
    let plain = Level::generate(config("AB", no_rounding(), false)).unwrap();
    let mirrored = Level::generate(config("AB", no_rounding(), true)).unwrap();
    assert_mirrored(&plain, &mirrored);
}

#[test]
fn test_mirrored_level_reflects_rounded_geometry() {
    for seed in ["AB", "e0", "e1", "e2", "e3", "e4"] {
        let plain = Level::generate(config(seed, fine_rounding(), false)).unwrap();
        let mirrored = Level::generate(config(seed, fine_rounding(), true)).unwrap();
        assert_mirrored(&plain, &mirrored);
    }
}

#[test]
fn test_mirroring_keeps_check_value_with_rounding() {
    let plain = Level::generate(config("AB", GenerationParams::default(), false)).unwrap();
    let mirrored = Level::generate(config("AB", GenerationParams::default(), true)).unwrap();
    assert_eq!(plain.equality_check_val(), mirrored.equality_check_val());
}

#[test]
fn test_ruins_never_overlap() {
    let params = GenerationParams {
        ruin_count: 3,
        ..Default::default()
    };
    for seed in ["AB", "ruins", "Sunken"] {
        let level = Level::generate(config(seed, params.clone(), false)).unwrap();
        assert!(!level.ruins().is_empty());
        let ruins = level.ruins();
        for (i, a) in ruins.iter().enumerate() {
            for b in &ruins[i + 1..] {
                assert!(!a.area.intersects(&b.area), "ruins overlap in level {}", seed);
            }
            for &removed in &a.removed_cells {
                assert_eq!(level.diagram().cell(removed).cell_type, CellType::Removed);
            }
        }
        let ruin_positions = level
            .positions_of_interest()
            .iter()
            .filter(|p| p.matches(PositionType::RUIN))
            .count();
        assert!(ruin_positions >= ruins.len());
    }
}

#[test]
fn test_geometry_is_valid() {
    let level = Level::generate(config("AB", GenerationParams::default(), false)).unwrap();
    let mesh = level.mesh();

    assert_eq!(mesh.indices.len() % 3, 0);
    assert_eq!(mesh.triangle_count(), mesh.triangle_cells.len());
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));

    for &wall in level.walls() {
        let cell = level.cell(wall).unwrap();
        assert!(cell.body_vertices.len() >= 3);
        assert_eq!(cell.body, Some(BodyId(0)));
    }

    let kinds: Vec<BodyKind> = level.bodies().iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![BodyKind::LevelCells, BodyKind::SeaFloor, BodyKind::TopBarrier, BodyKind::BottomBarrier]
    );
    for body in level.bodies() {
        for fixture in &body.fixtures {
            if let FixtureShape::Triangle(triangle) = fixture.shape {
                assert!(triangle.area() >= 1.0);
                assert!(fixture.cell.is_some());
            }
        }
    }
    assert!(!level.sea_floor_wall().cells().is_empty());
}

#[test]
fn test_params_file_fallback() {
    init_logging();
    let mut broken = tempfile::NamedTempFile::new().unwrap();
    write!(broken, "{{ not json").unwrap();
    assert_eq!(GenerationParams::load_or_default(broken.path()), GenerationParams::default());
    assert_eq!(
        GenerationParams::load_or_default("definitely/not/here.json"),
        GenerationParams::default()
    );

    let mut preset = tempfile::NamedTempFile::new().unwrap();
    write!(preset, r#"{{ "name": "shallow", "ruin_count": 0 }}"#).unwrap();
    let params = GenerationParams::load_or_default(preset.path());
    assert_eq!(params.name, "shallow");
    assert_eq!(params.ruin_count, 0);
}
