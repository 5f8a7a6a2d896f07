//! Level Generation Parameters and Configuration Builder
//!
//! This module provides the tunable generation parameters (loaded from JSON
//! presets) and the per-level configuration used by [`Level::generate`].
//!
//! [`Level::generate`]: crate::level::Level::generate

use std::path::Path;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{LevelGenError, Result};
use crate::rng::hash_seed;

/// Tunable parameters for one style of level
///
/// Every field has a default, so a JSON preset only needs to name the values
/// it overrides. Integer ranges are stored as `IVec2 { x: min, y: max }` with
/// an exclusive maximum.
///
/// # Example
///
/// ```rust
/// use rust_voronoi_cave::GenerationParams;
///
/// let params = GenerationParams::from_json_str(r#"{ "name": "narrow", "height": 40000 }"#).unwrap();
/// assert_eq!(params.name, "narrow");
/// assert_eq!(params.height, 40000);
/// assert_eq!(params.min_width, GenerationParams::default().min_width);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Preset name, used in log output
    pub name: String,

    /// Biomes this preset may be picked for (empty = any biome)
    pub allowed_biomes: Vec<String>,

    /// Level width at size factor 0
    pub min_width: i32,

    /// Level width at size factor 1
    pub max_width: i32,

    /// Level height
    pub height: i32,

    /// Spacing of the Voronoi site lattice
    pub voronoi_site_interval: IVec2,

    /// Maximum random offset of each lattice site
    pub voronoi_site_variance: IVec2,

    /// Horizontal spacing range between main path nodes
    pub main_path_node_interval_range: IVec2,

    /// Probability of taking a random step instead of steering toward the
    /// next main path node
    pub main_path_wander_amount: f32,

    /// Minimum clear width of the main path
    pub path_min_width: i32,

    /// Number of side tunnels (branches come on top of this)
    pub small_tunnel_count: i32,

    /// Length range of side tunnels
    pub small_tunnel_length_range: IVec2,

    /// Radius within which tunnels are pushed away from main path nodes
    pub tunnel_avoid_radius: f32,

    /// Chance to open a wall cell below the main path
    pub bottom_hole_probability: f32,

    /// Base height of the sea floor
    pub sea_floor_depth: i32,

    /// Maximum midpoint displacement of the sea floor
    pub sea_floor_variance: i32,

    /// Number of sea floor mountains, `[min, max)`
    pub mountain_count_min: i32,
    /// See `mountain_count_min`
    pub mountain_count_max: i32,

    /// Height of sea floor mountains, `[min, max)`
    pub mountain_height_min: i32,
    /// See `mountain_height_min`
    pub mountain_height_max: i32,

    /// Target length of the pieces wall edges are split into when rounding
    pub cell_subdivision_length: f32,

    /// How far subdivided edges bulge outward (fraction of edge length)
    pub cell_rounding_amount: f32,

    /// Random extra bulge on top of `cell_rounding_amount`
    pub cell_irregularity: f32,

    /// Number of ruins to place
    pub ruin_count: i32,

    /// Smallest ruin size
    pub ruin_size_min: IVec2,

    /// Largest ruin size (exclusive)
    pub ruin_size_max: IVec2,

    /// Iteration cap for ruin placement relaxation
    pub ruin_relaxation_iterations: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            allowed_biomes: Vec::new(),
            min_width: 100_000,
            max_width: 100_000,
            height: 50_000,
            voronoi_site_interval: IVec2::new(3000, 3000),
            voronoi_site_variance: IVec2::new(700, 700),
            main_path_node_interval_range: IVec2::new(5000, 10_000),
            main_path_wander_amount: 0.5,
            path_min_width: 6500,
            small_tunnel_count: 5,
            small_tunnel_length_range: IVec2::new(5000, 10_000),
            tunnel_avoid_radius: 20_000.0,
            bottom_hole_probability: 0.4,
            sea_floor_depth: 0,
            sea_floor_variance: 1000,
            mountain_count_min: 1,
            mountain_count_max: 4,
            mountain_height_min: 1000,
            mountain_height_max: 5000,
            cell_subdivision_length: 5000.0,
            cell_rounding_amount: 0.5,
            cell_irregularity: 0.1,
            ruin_count: 1,
            ruin_size_min: IVec2::new(4000, 4000),
            ruin_size_max: IVec2::new(8000, 6000),
            ruin_relaxation_iterations: 10_000,
        }
    }
}

impl GenerationParams {
    /// Parse a parameter preset from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a parameter preset from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Read a preset, falling back to defaults if the file is missing or broken
    ///
    /// The failure is logged at error level; generation never aborts because
    /// of a bad preset file.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_json_file(path) {
            Ok(params) => params,
            Err(err) => {
                error!(path = %path.display(), %err, "using default generation parameters");
                Self::default()
            }
        }
    }

    /// Whether this preset may be used in the given biome
    pub fn allows_biome(&self, biome: &str) -> bool {
        self.allowed_biomes.is_empty() || self.allowed_biomes.iter().any(|b| b == biome)
    }

    /// Check that the values describe a level the pipeline can build
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(LevelGenError::InvalidConfig(msg));

        if self.min_width <= 0 || self.max_width < self.min_width {
            return invalid(format!(
                "level width range must be positive and ordered (got {}..{})",
                self.min_width, self.max_width
            ));
        }
        if self.height <= 0 {
            return invalid(format!("level height must be positive (got {})", self.height));
        }
        if self.voronoi_site_interval.x <= 0 || self.voronoi_site_interval.y <= 0 {
            return invalid(format!(
                "voronoi site interval must be positive (got {})",
                self.voronoi_site_interval
            ));
        }
        if self.voronoi_site_variance.x < 0 || self.voronoi_site_variance.y < 0 {
            return invalid(format!(
                "voronoi site variance must be >= 0 (got {})",
                self.voronoi_site_variance
            ));
        }
        if self.main_path_node_interval_range.x <= 0 {
            return invalid(format!(
                "main path node interval must be positive (got {})",
                self.main_path_node_interval_range
            ));
        }
        if self.path_min_width <= 0 {
            return invalid(format!(
                "path minimum width must be positive (got {})",
                self.path_min_width
            ));
        }
        if !(0.0..=1.0).contains(&self.bottom_hole_probability) {
            return invalid(format!(
                "bottom hole probability must be within [0, 1] (got {})",
                self.bottom_hole_probability
            ));
        }
        if self.cell_subdivision_length <= 0.0 {
            return invalid(format!(
                "cell subdivision length must be positive (got {})",
                self.cell_subdivision_length
            ));
        }
        if self.ruin_count < 0 || self.small_tunnel_count < 0 {
            return invalid("ruin and tunnel counts must be >= 0".to_string());
        }
        Ok(())
    }
}

/// A set of parameter presets to pick from
///
/// Picking is a pure function of the seed string and biome, so peers agree on
/// the preset without exchanging it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamsLibrary {
    /// Available presets
    pub presets: Vec<GenerationParams>,
}

impl ParamsLibrary {
    /// Create a library from a list of presets
    pub fn new(presets: Vec<GenerationParams>) -> Self {
        Self { presets }
    }

    /// Parse a JSON array of presets
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Pick a preset for a seed, optionally restricted to a biome
    ///
    /// Falls back to [`GenerationParams::default`] (with an error log) when no
    /// preset qualifies.
    pub fn pick(&self, seed: &str, biome: Option<&str>) -> GenerationParams {
        let matching: Vec<&GenerationParams> = self
            .presets
            .iter()
            .filter(|p| biome.map_or(true, |b| p.allows_biome(b)))
            .collect();

        if matching.is_empty() {
            error!(
                seed,
                biome = biome.unwrap_or("any"),
                "no generation parameters match, using defaults"
            );
            return GenerationParams::default();
        }

        let index = (hash_seed(seed) % matching.len() as u64) as usize;
        matching[index].clone()
    }
}

/// Configuration for one generated level
///
/// The same configuration always produces the identical level, on every
/// machine. Only the configuration needs to be shared between peers.
///
/// # Example
///
/// ```rust
/// use rust_voronoi_cave::*;
///
/// let config = LevelConfigBuilder::new()
///     .seed("AB")
///     .difficulty(40.0)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: LevelConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Seed string every random decision derives from
    pub seed: String,

    /// Difficulty in `[0, 100]`
    pub difficulty: f32,

    /// Interpolates the level width between `min_width` and `max_width`
    pub size_factor: f32,

    /// Reflect the level horizontally
    pub mirror: bool,

    /// Generation parameters
    pub params: GenerationParams,
}

impl LevelConfig {
    /// Level width after applying the size factor, before grid alignment
    pub fn width(&self) -> i32 {
        let min = self.params.min_width as f32;
        let max = self.params.max_width as f32;
        (min + (max - min) * self.size_factor) as i32
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            seed: String::new(),
            difficulty: 50.0,
            size_factor: 0.0,
            mirror: false,
            params: GenerationParams::default(),
        }
    }
}

/// Builder for creating LevelConfig with validation
///
/// # Example
///
/// ```rust
/// use rust_voronoi_cave::*;
///
/// let config = LevelConfigBuilder::new()
///     .seed("AB")
///     .size_factor(0.5)
///     .unwrap()
///     .mirror(true)
///     .build()
///     .unwrap();
/// assert!(config.mirror);
/// ```
#[derive(Debug, Clone)]
pub struct LevelConfigBuilder {
    seed: String,
    difficulty: f32,
    size_factor: f32,
    mirror: bool,
    params: GenerationParams,
}

impl LevelConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: empty string
    /// - difficulty: 50
    /// - size_factor: 0 (minimum width)
    /// - mirror: false
    /// - params: [`GenerationParams::default`]
    pub fn new() -> Self {
        let defaults = LevelConfig::default();
        Self {
            seed: defaults.seed,
            difficulty: defaults.difficulty,
            size_factor: defaults.size_factor,
            mirror: defaults.mirror,
            params: defaults.params,
        }
    }

    /// Set the seed string
    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Set the difficulty
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if difficulty is outside `[0, 100]`
    pub fn difficulty(mut self, difficulty: f32) -> Result<Self> {
        if !(0.0..=100.0).contains(&difficulty) {
            return Err(LevelGenError::InvalidConfig(format!(
                "difficulty must be within [0, 100] (got {})",
                difficulty
            )));
        }
        self.difficulty = difficulty;
        Ok(self)
    }

    /// Set the size factor
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the factor is outside `[0, 1]`
    pub fn size_factor(mut self, size_factor: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&size_factor) {
            return Err(LevelGenError::InvalidConfig(format!(
                "size factor must be within [0, 1] (got {})",
                size_factor
            )));
        }
        self.size_factor = size_factor;
        Ok(self)
    }

    /// Mirror the generated level horizontally
    pub fn mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Use a specific parameter preset
    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the parameters are invalid or the level is
    /// too small to hold a path of the requested width.
    pub fn build(self) -> Result<LevelConfig> {
        self.params.validate()?;

        let config = LevelConfig {
            seed: self.seed,
            difficulty: self.difficulty,
            size_factor: self.size_factor,
            mirror: self.mirror,
            params: self.params,
        };

        let min_width = config.params.path_min_width;
        if config.width() - min_width * 4 <= 0 || config.params.height - min_width * 2 <= 0 {
            return Err(LevelGenError::InvalidConfig(format!(
                "level of {}x{} leaves no room for a path of width {}",
                config.width(),
                config.params.height,
                min_width
            )));
        }

        Ok(config)
    }
}

impl Default for LevelConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
