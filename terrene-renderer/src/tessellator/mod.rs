use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::{Deserialize, Serialize};
use terrene_scene::{ConfigError, LevelSetConfig};

mod indices_cache;
mod rect_tile;
mod rectangular_tessellator;
mod render_info;

pub use indices_cache::*;
pub use rect_tile::*;
pub use rectangular_tessellator::*;
pub use render_info::*;

pub const DEFAULT_DENSITY: u32 = 20;
/// Keeps `(density + 1)²` vertex indices well inside `u32`.
pub const MAX_DENSITY: u32 = 1024;
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 4000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellatorConfig {
    /// Grid cells along each edge of a tile.
    pub density: u32,
    /// Added to the base split scale; positive values subdivide sooner.
    pub detail_hint: f64,
    pub tile_cache_capacity: usize,
    pub level_set: LevelSetConfig,
}
impl Default for TessellatorConfig {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            detail_hint: 0.0,
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
            level_set: LevelSetConfig {
                cache_name: "Earth/tessellator".to_string(),
                number_of_levels: 20,
                level_zero_tile_delta: [36.0, 36.0],
                ..Default::default()
            },
        }
    }
}
impl TessellatorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TessellatorConfig = serde_json::from_str(json)?;
        config.level_set.validate()?;
        Ok(config)
    }
}

/// Flag checked at every recursion step of a tessellation pass.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);
impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}
