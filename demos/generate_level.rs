//! Complete workflow demonstration for rust_voronoi_cave

use rust_voronoi_cave::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== rust_voronoi_cave Complete Demo ===\n");

    // Step 1: Configure level
    println!("Step 1: Configuring level...");
    let seed = std::env::args().nth(1).unwrap_or_else(|| "AB".to_string());
    let config = LevelConfigBuilder::new()
        .seed(seed)
        .difficulty(40.0)?
        .size_factor(0.5)?
        .params(GenerationParams::load_or_default("demos/params.json"))
        .build()?;

    println!("  Seed: {}", config.seed);
    println!("  Preset: {}", config.params.name);
    println!("  Size: {} x {}", config.width(), config.params.height);

    // Step 2: Generate level
    println!("\nStep 2: Generating level...");
    let level = Level::generate(config)?;
    println!("  Wall cells: {}", level.walls().len());
    println!("  Path cells: {}", level.path_cells().len());
    println!("  Tunnels: {}", level.tunnels().len());
    println!("  Ruins: {}", level.ruins().len());
    println!("  Start: {}  End: {}", level.start_position(), level.end_position());
    println!("  Equality check: {}", level.equality_check_val());

    // Step 3: Positions of interest
    println!("\nStep 3: Positions of interest:");
    for kind in [PositionType::MAIN_PATH, PositionType::CAVE, PositionType::RUIN] {
        let count = level.positions_of_interest().iter().filter(|p| p.matches(kind)).count();
        println!("  {:?}: {}", kind, count);
    }
    println!(
        "  Waypoints: {} (connected: {})",
        level.waypoints().len(),
        level.waypoints().is_path_connected()
    );

    // Step 4: Query spatial index
    #[cfg(feature = "spatial-index")]
    {
        println!("\nStep 4: Spatial queries:");
        let test_pos = level.borders().center();
        if let Some(cell_id) = level.find_cell_at(test_pos) {
            let cell = level.cell(cell_id)?;
            println!("  Position {} -> nearest wall {:?} at {}", test_pos, cell_id, cell.center);
        }
        println!("  Sea floor below center: {}", level.bottom_position(test_pos.x));
    }

    // Step 5: Geometry
    println!("\nStep 5: Geometry:");
    let mesh = level.mesh();
    println!("  Vertices: {}", mesh.vertex_count());
    println!("  Triangles: {}", mesh.triangle_count());
    for body in level.bodies() {
        println!("  {:?}: {} fixtures", body.kind, body.fixtures.len());
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
