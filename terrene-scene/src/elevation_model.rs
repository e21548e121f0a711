use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{
    math::EPSILON12, AbsentResourceList, AbsentResourceListConfig, Angle, ConfigError, ElevationError, Level,
    LevelSet, LevelSetConfig, LevelSetError, Sector, TileKey,
};

/// Elevations sampled for one sector at some resolution.
pub trait Elevations: Send + Sync {
    fn has_elevations(&self) -> bool;
    /// Elevation in meters; latitude and longitude in radians.
    fn get_elevation(&self, latitude: f64, longitude: f64) -> f64;
    /// Radians per sample actually achieved. Larger means coarser.
    fn get_resolution(&self) -> f64;
    fn get_sector(&self) -> &Sector;
}

/// Source of terrain heights. Never blocks: data that is not yet available
/// comes back as fallback elevations with a coarser resolution.
pub trait ElevationModel: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn get_elevations(&self, sector: &Sector, target_resolution: f64) -> Box<dyn Elevations>;
    fn get_elevation(&self, latitude: Angle, longitude: Angle) -> f64;
    fn get_maximum_elevation(&self) -> f64;
    fn get_minimum_elevation(&self) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ZeroElevationModel;

pub struct ZeroElevations {
    sector: Sector,
}
impl Elevations for ZeroElevations {
    fn has_elevations(&self) -> bool {
        false
    }
    fn get_elevation(&self, _latitude: f64, _longitude: f64) -> f64 {
        0.0
    }
    fn get_resolution(&self) -> f64 {
        0.0
    }
    fn get_sector(&self) -> &Sector {
        &self.sector
    }
}
impl ElevationModel for ZeroElevationModel {
    fn is_enabled(&self) -> bool {
        false
    }
    fn get_elevations(&self, sector: &Sector, _target_resolution: f64) -> Box<dyn Elevations> {
        Box::new(ZeroElevations { sector: *sector })
    }
    fn get_elevation(&self, _latitude: Angle, _longitude: Angle) -> f64 {
        0.0
    }
    fn get_maximum_elevation(&self) -> f64 {
        0.0
    }
    fn get_minimum_elevation(&self) -> f64 {
        0.0
    }
}

/// A raster of heights covering one tile; row 0 is the north edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationTile {
    key: TileKey,
    sector: Sector,
    width: usize,
    height: usize,
    texel_size: f64,
    samples: Vec<f32>,
}
impl ElevationTile {
    pub fn new(
        key: TileKey,
        sector: Sector,
        level: &Level,
        samples: Vec<f32>,
    ) -> Result<Self, ElevationError> {
        let width = level.tile_width() as usize;
        let height = level.tile_height() as usize;
        if samples.len() != width * height || width < 2 || height < 2 {
            return Err(ElevationError::MalformedTile {
                key: key.to_string(),
                expected: width * height,
                actual: samples.len(),
            });
        }
        Ok(Self {
            key,
            sector,
            width,
            height,
            texel_size: level.texel_size(),
            samples,
        })
    }
    pub fn key(&self) -> &TileKey {
        &self.key
    }
    pub fn sector(&self) -> &Sector {
        &self.sector
    }
    pub fn texel_size(&self) -> f64 {
        self.texel_size
    }
    fn sample(&self, column: usize, row: usize) -> f64 {
        self.samples[row * self.width + column] as f64
    }
    /// Bilinear interpolation; `None` outside the tile.
    pub fn elevation_at(&self, latitude: Angle, longitude: Angle) -> Option<f64> {
        if !self.sector.contains(latitude, longitude) {
            return None;
        }
        let delta_lat = self.sector.delta_lat().radians();
        let delta_lon = self.sector.delta_lon().radians();
        let s = (self.sector.longitude_offset(longitude).radians() / delta_lon).clamp(0.0, 1.0);
        let t = ((self.sector.max_latitude() - latitude).radians() / delta_lat).clamp(0.0, 1.0);
        let x = s * (self.width - 1) as f64;
        let y = t * (self.height - 1) as f64;
        let x0 = (x.floor() as usize).min(self.width - 2);
        let y0 = (y.floor() as usize).min(self.height - 2);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;
        let top = self.sample(x0, y0) * (1.0 - fx) + self.sample(x0 + 1, y0) * fx;
        let bottom = self.sample(x0, y0 + 1) * (1.0 - fx) + self.sample(x0 + 1, y0 + 1) * fx;
        Some(top * (1.0 - fy) + bottom * fy)
    }
}

/// Supplies raw elevation rasters for a tiled model.
///
/// `Ok(None)` means the data is on its way and will arrive through
/// [`TiledElevationModel::add_tile`].
pub trait ElevationTileSource: Send + Sync {
    fn fetch(
        &self,
        level: &Level,
        key: &TileKey,
        url: Option<&str>,
    ) -> Result<Option<Vec<f32>>, ElevationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiledElevationModelConfig {
    pub level_set: LevelSetConfig,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub absent_resources: AbsentResourceListConfig,
    /// Upper bound on tiles consulted by one `get_elevations` call.
    pub max_tiles_per_request: usize,
    /// Loaded tiles kept before the least recently used are evicted.
    pub max_cached_tiles: usize,
}
impl Default for TiledElevationModelConfig {
    fn default() -> Self {
        Self {
            level_set: LevelSetConfig::default(),
            min_elevation: -11000.0,
            max_elevation: 8850.0,
            absent_resources: AbsentResourceListConfig::default(),
            max_tiles_per_request: 64,
            max_cached_tiles: 512,
        }
    }
}
impl TiledElevationModelConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TiledElevationModelConfig = serde_json::from_str(json)?;
        config.level_set.validate()?;
        if config.min_elevation > config.max_elevation {
            return Err(ConfigError::Invalid(format!(
                "min elevation {} is above max elevation {}",
                config.min_elevation, config.max_elevation
            )));
        }
        Ok(config)
    }
}

struct CachedTile {
    tile: Arc<ElevationTile>,
    last_used: u64,
}

/// Loaded elevation tiles, bounded by least recent use.
struct TileCache {
    map: HashMap<TileKey, CachedTile>,
    clock: u64,
    capacity: usize,
}
impl TileCache {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            clock: 0,
            capacity: capacity.max(1),
        }
    }
    fn len(&self) -> usize {
        self.map.len()
    }
    /// Returns the tile and marks it as most recently used.
    fn get(&mut self, key: &TileKey) -> Option<Arc<ElevationTile>> {
        self.clock += 1;
        let clock = self.clock;
        self.map.get_mut(key).map(|cached| {
            cached.last_used = clock;
            cached.tile.clone()
        })
    }
    fn insert(&mut self, tile: Arc<ElevationTile>) {
        self.clock += 1;
        self.map.insert(
            tile.key().clone(),
            CachedTile {
                tile,
                last_used: self.clock,
            },
        );
        self.trim();
    }
    fn trim(&mut self) {
        while self.map.len() > self.capacity {
            let Some(oldest) = self
                .map
                .iter()
                .min_by_key(|(_, cached)| cached.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            bevy::log::debug!("evicting elevation tile {}", oldest);
            self.map.remove(&oldest);
        }
    }
}

/// Elevations served from a quadtree of raster tiles.
pub struct TiledElevationModel {
    level_set: LevelSet,
    source: Option<Arc<dyn ElevationTileSource>>,
    tiles: Mutex<TileCache>,
    absent_resources: AbsentResourceList,
    min_elevation: f64,
    max_elevation: f64,
    max_tiles_per_request: usize,
    enabled: bool,
}
impl fmt::Debug for TiledElevationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiledElevationModel")
            .field("level_set", &self.level_set)
            .field("tiles", &self.tile_count())
            .field("enabled", &self.enabled)
            .finish()
    }
}
impl TiledElevationModel {
    pub fn new(config: &TiledElevationModelConfig) -> Result<Self, LevelSetError> {
        Ok(Self {
            level_set: LevelSet::new(&config.level_set)?,
            source: None,
            tiles: Mutex::new(TileCache::new(config.max_cached_tiles)),
            absent_resources: AbsentResourceList::from_config(config.absent_resources),
            min_elevation: config.min_elevation,
            max_elevation: config.max_elevation,
            max_tiles_per_request: config.max_tiles_per_request.max(1),
            enabled: true,
        })
    }
    pub fn with_level_set(mut self, level_set: LevelSet) -> Self {
        self.level_set = level_set;
        self
    }
    pub fn with_source(mut self, source: Arc<dyn ElevationTileSource>) -> Self {
        self.source = Some(source);
        self
    }
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
    pub fn level_set(&self) -> &LevelSet {
        &self.level_set
    }
    pub fn absent_resources(&self) -> &AbsentResourceList {
        &self.absent_resources
    }
    fn tiles(&self) -> MutexGuard<'_, TileCache> {
        self.tiles.lock().unwrap_or_else(PoisonError::into_inner)
    }
    pub fn tile_count(&self) -> usize {
        self.tiles().len()
    }
    /// Completion callback for asynchronous sources.
    pub fn add_tile(&self, key: &TileKey, samples: Vec<f32>) -> Result<(), ElevationError> {
        let tile = self.build_tile(key, samples)?;
        self.absent_resources.unmark_resource_absent(&key.to_string());
        self.tiles().insert(Arc::new(tile));
        Ok(())
    }
    /// Failure callback for asynchronous sources.
    pub fn mark_tile_failed(&self, key: &TileKey) {
        bevy::log::warn!("elevation tile {} failed to load", key);
        self.absent_resources.mark_resource_absent(&key.to_string());
    }
    fn build_tile(&self, key: &TileKey, samples: Vec<f32>) -> Result<ElevationTile, ElevationError> {
        let level = self
            .level_set
            .level(key.level())
            .map_err(|e| ElevationError::Fetch {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        let sector = self
            .level_set
            .compute_sector_for_key(key)
            .map_err(|e| ElevationError::Fetch {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        return ElevationTile::new(key.clone(), sector, level, samples);
    }
    /// Returns the tile if loaded, requesting it from the source otherwise.
    fn request_tile(&self, key: &TileKey) -> Option<Arc<ElevationTile>> {
        if let Some(tile) = self.tiles().get(key) {
            return Some(tile.clone());
        }
        let resource_id = key.to_string();
        if self.absent_resources.is_resource_absent(&resource_id) {
            return None;
        }
        let source = self.source.as_ref()?;
        let level = self.level_set.level(key.level()).ok()?;
        if level.is_empty() {
            return None;
        }
        let url = self.level_set.tile_url(key).ok();
        match source.fetch(level, key, url.as_deref()) {
            Ok(Some(samples)) => match self.build_tile(key, samples) {
                Ok(tile) => {
                    let tile = Arc::new(tile);
                    self.tiles().insert(tile.clone());
                    Some(tile)
                }
                Err(error) => {
                    bevy::log::warn!("{}", error);
                    self.absent_resources.mark_resource_absent(&resource_id);
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                bevy::log::warn!("{}", error);
                self.absent_resources.mark_resource_absent(&resource_id);
                None
            }
        }
    }
    fn loaded_ancestor(&self, key: &TileKey) -> Option<Arc<ElevationTile>> {
        let mut tiles = self.tiles();
        let mut current = key.parent();
        while let Some(parent) = current {
            if let Some(tile) = tiles.get(&parent) {
                return Some(tile.clone());
            }
            current = parent.parent();
        }
        None
    }
    /// Keys covering `sector` at `level`, or `None` when there are more than
    /// `max_tiles_per_request`.
    fn keys_for_sector(&self, sector: &Sector, level: u32) -> Option<Vec<TileKey>> {
        let south = self
            .level_set
            .compute_tile_key(level, sector.min_latitude(), sector.min_longitude())
            .ok()?;
        let north = self
            .level_set
            .compute_tile_key(level, sector.max_latitude(), sector.max_longitude())
            .ok()?;
        let (_, delta_lon) = self.level_set.level(level).ok()?.tile_delta();
        let columns = ((sector.delta_lon().radians() / delta_lon.radians()).ceil() as u32 + 1)
            .min((std::f64::consts::TAU / delta_lon.radians()).round() as u32);
        let rows = north.row().saturating_sub(south.row()) + 1;
        if (rows as usize) * (columns as usize) > self.max_tiles_per_request {
            return None;
        }
        let column_count = (std::f64::consts::TAU / delta_lon.radians()).round() as u32;
        let has_area = sector.delta_lat().radians() > 0.0 && sector.delta_lon().radians() > 0.0;
        let mut keys = Vec::with_capacity((rows * columns) as usize);
        for row in south.row()..=north.row() {
            for i in 0..columns {
                let column = (south.column() + i) % column_count.max(1);
                let key = TileKey::new(level as i64, row as i64, column as i64, self.level_set.cache_name()).ok()?;
                let Ok(tile_sector) = self.level_set.compute_sector_for_key(&key) else {
                    continue;
                };
                // neighbours sharing only an edge contribute no samples
                let overlaps = if has_area {
                    tile_sector.intersection(sector).map_or(false, |overlap| {
                        overlap.delta_lat().radians() > EPSILON12
                            && overlap.delta_lon().radians() > EPSILON12
                    })
                } else {
                    tile_sector.intersects(sector)
                };
                if overlaps {
                    keys.push(key);
                }
            }
        }
        Some(keys)
    }
}

/// Tiles gathered for one `get_elevations` call, finest first.
pub struct TiledElevations {
    sector: Sector,
    resolution: f64,
    tiles: Vec<Arc<ElevationTile>>,
}
impl Elevations for TiledElevations {
    fn has_elevations(&self) -> bool {
        !self.tiles.is_empty()
    }
    fn get_elevation(&self, latitude: f64, longitude: f64) -> f64 {
        let latitude = Angle::from_radians(latitude);
        let longitude = Angle::from_radians(longitude);
        self.tiles
            .iter()
            .find_map(|tile| tile.elevation_at(latitude, longitude))
            .unwrap_or(0.0)
    }
    fn get_resolution(&self) -> f64 {
        self.resolution
    }
    fn get_sector(&self) -> &Sector {
        &self.sector
    }
}

impl ElevationModel for TiledElevationModel {
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn get_elevations(&self, sector: &Sector, target_resolution: f64) -> Box<dyn Elevations> {
        let first_with_data = self.level_set.number_of_empty_levels();
        let mut level = self
            .level_set
            .target_level(target_resolution)
            .level_number()
            .max(first_with_data);
        let keys = loop {
            match self.keys_for_sector(sector, level) {
                Some(keys) => break keys,
                None if level > first_with_data => level -= 1,
                None => break vec![],
            }
        };

        let mut tiles: Vec<Arc<ElevationTile>> = vec![];
        let mut resolution: f64 = 0.0;
        let mut uncovered = keys.is_empty();
        for key in keys.iter() {
            let tile = self
                .request_tile(key)
                .or_else(|| self.loaded_ancestor(key));
            match tile {
                Some(tile) => {
                    resolution = resolution.max(tile.texel_size());
                    if !tiles.iter().any(|t| t.key() == tile.key()) {
                        tiles.push(tile);
                    }
                }
                None => uncovered = true,
            }
        }
        if uncovered {
            resolution = f64::MAX;
        }
        tiles.sort_by(|a, b| b.key().level().cmp(&a.key().level()));
        Box::new(TiledElevations {
            sector: *sector,
            resolution,
            tiles,
        })
    }
    fn get_elevation(&self, latitude: Angle, longitude: Angle) -> f64 {
        let mut tiles = self.tiles();
        for level in (0..self.level_set.number_of_levels()).rev() {
            let Ok(key) = self.level_set.compute_tile_key(level, latitude, longitude) else {
                continue;
            };
            if let Some(elevation) = tiles
                .get(&key)
                .and_then(|tile| tile.elevation_at(latitude, longitude))
            {
                return elevation;
            }
        }
        0.0
    }
    fn get_maximum_elevation(&self) -> f64 {
        self.max_elevation
    }
    fn get_minimum_elevation(&self) -> f64 {
        self.min_elevation
    }
}
