//! Voronoi-based cave level generation
//!
//! A standalone library for generating deterministic, collidable 2D cave
//! levels from a seed string, suitable for use with any game engine.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rust_voronoi_cave::*;
//!
//! // Generate a level
//! let config = LevelConfigBuilder::new()
//!     .seed("AB")
//!     .difficulty(40.0).unwrap()
//!     .size_factor(0.5).unwrap()
//!     .build().unwrap();
//!
//! let level = Level::generate(config).unwrap();
//!
//! // Render triangles and collision bodies
//! println!("Generated {} triangles", level.mesh().triangle_count());
//! println!("Check value: {}", level.equality_check_val());
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): Enables O(log n) position-to-cell lookups using KD-tree

// Modules
pub mod error;
pub mod rng;
pub mod config;
pub mod geometry;
pub mod cell;
pub mod grid;
pub mod generation;
pub mod carving;
pub mod waypoint;
pub mod position;
pub mod terrain;
pub mod ruins;
pub mod mirror;
pub mod mesh;
pub mod level;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{LevelGenError, Result};
pub use rng::LevelRng;
pub use config::{GenerationParams, LevelConfig, LevelConfigBuilder, ParamsLibrary};
pub use geometry::Rect;
pub use cell::{BodyId, CellId, CellType, Diagram, EdgeId, GraphEdge, SiteId, VoronoiCell};
pub use grid::{CellGrid, GRID_CELL_SIZE};
pub use waypoint::{SpawnType, WayPoint, WayPointGraph};
pub use position::{InterestingPosition, PositionType};
pub use terrain::{LevelWall, SeaFloorProfile};
pub use ruins::{Ruin, RuinShape};
pub use mesh::{BodyKind, CollisionBody, Fixture, FixtureShape, MeshData};
pub use level::Level;

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::Vec2 for convenience
pub use glam::Vec2;
