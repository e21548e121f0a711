use std::{f64::consts::TAU, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    math::EPSILON9, Angle, ConfigError, LevelSetError, Sector, TileKey,
};

pub const MAX_LEVELS: u32 = 48;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSetConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    pub cache_name: String,
    pub service: String,
    pub dataset: String,
    pub format_suffix: String,
    pub number_of_levels: u32,
    pub number_of_empty_levels: u32,
    /// `[latitude, longitude]` in degrees.
    pub level_zero_tile_delta: [f64; 2],
    /// `[min_latitude, max_latitude, min_longitude, max_longitude]` in degrees.
    pub sector: [f64; 4],
    /// `[latitude, longitude]` in degrees; the sector's southwest corner when absent.
    pub tile_origin: Option<[f64; 2]>,
}
impl Default for LevelSetConfig {
    fn default() -> Self {
        Self {
            tile_width: 150,
            tile_height: 150,
            cache_name: "Earth/terrain".to_string(),
            service: String::new(),
            dataset: String::new(),
            format_suffix: ".bil".to_string(),
            number_of_levels: 20,
            number_of_empty_levels: 0,
            level_zero_tile_delta: [36.0, 36.0],
            sector: [-90.0, 90.0, -180.0, 180.0],
            tile_origin: None,
        }
    }
}
impl LevelSetConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LevelSetConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "tile dimensions must be positive, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }
        if self.number_of_levels == 0 || self.number_of_levels > MAX_LEVELS {
            return Err(ConfigError::Invalid(format!(
                "number of levels must be within 1..={}, got {}",
                MAX_LEVELS, self.number_of_levels
            )));
        }
        if self.number_of_empty_levels >= self.number_of_levels {
            return Err(ConfigError::Invalid(format!(
                "{} empty levels leave none of {} levels with data",
                self.number_of_empty_levels, self.number_of_levels
            )));
        }
        let [delta_lat, delta_lon] = self.level_zero_tile_delta;
        if !(delta_lat > 0.0 && delta_lon > 0.0 && delta_lat <= 180.0 && delta_lon <= 360.0) {
            return Err(ConfigError::Invalid(format!(
                "level zero tile delta out of range: {} x {}",
                delta_lat, delta_lon
            )));
        }
        let [min_lat, max_lat, min_lon, max_lon] = self.sector;
        let extent_lon = if min_lon > max_lon {
            360.0 + max_lon - min_lon
        } else {
            max_lon - min_lon
        };
        if !divides(max_lat - min_lat, delta_lat) || !divides(extent_lon, delta_lon) {
            return Err(ConfigError::Invalid(format!(
                "level zero tile delta {} x {} does not evenly divide sector {:?}",
                delta_lat, delta_lon, self.sector
            )));
        }
        if let Some([origin_lat, origin_lon]) = self.tile_origin {
            let aligned = |offset: f64, delta: f64| offset.abs() < EPSILON9 || divides(offset.abs(), delta);
            if !aligned(min_lat - origin_lat, delta_lat) || !aligned(min_lon - origin_lon, delta_lon) {
                return Err(ConfigError::Invalid(format!(
                    "tile origin {:?} is not aligned with sector {:?}",
                    [origin_lat, origin_lon],
                    self.sector
                )));
            }
        }
        if self.cache_name.is_empty() {
            return Err(ConfigError::Invalid("cache name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Whether `extent` is a whole, non-zero number of `delta` steps.
fn divides(extent: f64, delta: f64) -> bool {
    let steps = extent / delta;
    steps.round() >= 1.0 && (steps - steps.round()).abs() < EPSILON9
}

/// One depth of a level set.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    level_number: u32,
    tile_delta: (Angle, Angle),
    tile_width: u32,
    tile_height: u32,
    texel_size: f64,
    cache_name: String,
    service: String,
    dataset: String,
    format_suffix: String,
    empty: bool,
}
impl Level {
    pub fn level_number(&self) -> u32 {
        self.level_number
    }
    /// `(latitude, longitude)` span of one tile.
    pub fn tile_delta(&self) -> (Angle, Angle) {
        self.tile_delta
    }
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }
    /// Radians per texel; the resolution this level satisfies.
    pub fn texel_size(&self) -> f64 {
        self.texel_size
    }
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }
    pub fn service(&self) -> &str {
        &self.service
    }
    pub fn dataset(&self) -> &str {
        &self.dataset
    }
    pub fn format_suffix(&self) -> &str {
        &self.format_suffix
    }
    pub fn is_empty(&self) -> bool {
        self.empty
    }
}

/// Builds the request address of one tile.
pub trait TileUrlBuilder: Send + Sync {
    fn url_for(&self, level: &Level, key: &TileKey) -> Result<String, LevelSetError>;
}

/// `{service}?T={dataset}&L={level}&X={column}&Y={row}`
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicUrlBuilder;
impl TileUrlBuilder for BasicUrlBuilder {
    fn url_for(&self, level: &Level, key: &TileKey) -> Result<String, LevelSetError> {
        if level.service().is_empty() {
            return Err(LevelSetError::Url(format!(
                "level {} has no service",
                level.level_number()
            )));
        }
        Ok(format!(
            "{}?T={}&L={}&X={}&Y={}",
            level.service(),
            level.dataset(),
            key.level(),
            key.column(),
            key.row()
        ))
    }
}

#[derive(Clone)]
pub struct LevelSet {
    levels: Vec<Level>,
    number_of_empty_levels: u32,
    level_zero_tile_delta: (Angle, Angle),
    sector: Sector,
    tile_origin: (Angle, Angle),
    cache_name: String,
    url_builder: Option<Arc<dyn TileUrlBuilder>>,
}
impl fmt::Debug for LevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelSet")
            .field("cache_name", &self.cache_name)
            .field("levels", &self.levels.len())
            .field("number_of_empty_levels", &self.number_of_empty_levels)
            .field("sector", &self.sector)
            .finish()
    }
}
impl LevelSet {
    pub fn new(config: &LevelSetConfig) -> Result<Self, LevelSetError> {
        config.validate()?;
        let [min_lat, max_lat, min_lon, max_lon] = config.sector;
        let sector = Sector::from_degrees(min_lat, max_lat, min_lon, max_lon)?;
        let tile_origin = match config.tile_origin {
            Some([lat, lon]) => (Angle::from_degrees(lat), Angle::from_degrees(lon)),
            None => (sector.min_latitude(), sector.min_longitude()),
        };
        let level_zero_tile_delta = (
            Angle::from_degrees(config.level_zero_tile_delta[0]),
            Angle::from_degrees(config.level_zero_tile_delta[1]),
        );
        let levels = (0..config.number_of_levels)
            .map(|n| {
                let scale = 2f64.powi(n as i32);
                let tile_delta = (level_zero_tile_delta.0 / scale, level_zero_tile_delta.1 / scale);
                Level {
                    level_number: n,
                    tile_delta,
                    tile_width: config.tile_width,
                    tile_height: config.tile_height,
                    texel_size: tile_delta.0.radians() / config.tile_height as f64,
                    cache_name: format!("{}/{}", config.cache_name, n),
                    service: config.service.clone(),
                    dataset: config.dataset.clone(),
                    format_suffix: config.format_suffix.clone(),
                    empty: n < config.number_of_empty_levels,
                }
            })
            .collect();
        Ok(Self {
            levels,
            number_of_empty_levels: config.number_of_empty_levels,
            level_zero_tile_delta,
            sector,
            tile_origin,
            cache_name: config.cache_name.clone(),
            url_builder: None,
        })
    }
    pub fn from_json(json: &str) -> Result<Self, LevelSetError> {
        let config = LevelSetConfig::from_json(json)?;
        return LevelSet::new(&config);
    }
    pub fn with_url_builder(mut self, url_builder: Arc<dyn TileUrlBuilder>) -> Self {
        self.url_builder = Some(url_builder);
        self
    }
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }
    pub fn level(&self, level_number: u32) -> Result<&Level, LevelSetError> {
        self.levels
            .get(level_number as usize)
            .ok_or(LevelSetError::NoSuchLevel(level_number))
    }
    pub fn first_level(&self) -> &Level {
        &self.levels[0]
    }
    pub fn last_level(&self) -> &Level {
        &self.levels[self.levels.len() - 1]
    }
    pub fn is_final_level(&self, level_number: u32) -> bool {
        level_number as usize + 1 >= self.levels.len()
    }
    pub fn number_of_levels(&self) -> u32 {
        self.levels.len() as u32
    }
    pub fn number_of_empty_levels(&self) -> u32 {
        self.number_of_empty_levels
    }
    pub fn level_zero_tile_delta(&self) -> (Angle, Angle) {
        self.level_zero_tile_delta
    }
    pub fn sector(&self) -> &Sector {
        &self.sector
    }
    pub fn tile_origin(&self) -> (Angle, Angle) {
        self.tile_origin
    }
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }
    /// The coarsest level whose texel size is at least as fine as
    /// `resolution` radians, or the last level when none is.
    pub fn target_level(&self, resolution: f64) -> &Level {
        self.levels
            .iter()
            .find(|level| level.texel_size <= resolution)
            .unwrap_or_else(|| self.last_level())
    }
    pub fn compute_tile_key(
        &self,
        level_number: u32,
        latitude: Angle,
        longitude: Angle,
    ) -> Result<TileKey, LevelSetError> {
        let level = self.level(level_number)?;
        let (delta_lat, delta_lon) = level.tile_delta;
        let row = TileKey::compute_row(delta_lat, latitude, self.tile_origin.0);
        let column = self.column_offset(longitude) / delta_lon.radians();
        let mut column = column.floor() as i64;
        let last = self.column_count(level_number) - 1;
        if column > last {
            column = last;
        }
        Ok(TileKey::new(
            level_number as i64,
            row,
            column,
            &self.cache_name,
        )?)
    }
    pub fn compute_sector_for_key(&self, key: &TileKey) -> Result<Sector, LevelSetError> {
        let level = self.level(key.level())?;
        let (delta_lat, delta_lon) = level.tile_delta;
        let min_latitude = self.tile_origin.0 + delta_lat * key.row() as f64;
        let min_longitude = self.tile_origin.1 + delta_lon * key.column() as f64;
        Ok(Sector::new(
            min_latitude,
            min_latitude + delta_lat,
            min_longitude,
            min_longitude + delta_lon,
        )?)
    }
    /// Keys of the level-zero tiles covering the level set's sector.
    pub fn level_zero_keys(&self) -> Result<Vec<TileKey>, LevelSetError> {
        let (delta_lat, delta_lon) = self.level_zero_tile_delta;
        let lat_offset = |lat: Angle| (lat.radians() - self.tile_origin.0.radians()) / delta_lat.radians();
        let first_row = lat_offset(self.sector.min_latitude()).floor().max(0.0) as i64;
        let last_row = (lat_offset(self.sector.max_latitude()) - EPSILON9).ceil() as i64 - 1;
        let west = self.column_offset(self.sector.min_longitude()) / delta_lon.radians();
        let east = west + self.sector.delta_lon().radians() / delta_lon.radians();
        let first_column = west.floor().max(0.0) as i64;
        let last_column = (east - EPSILON9).ceil() as i64 - 1;

        let mut keys = vec![];
        for row in first_row..=last_row.max(first_row) {
            for column in first_column..=last_column.max(first_column) {
                keys.push(TileKey::new(0, row, column, &self.cache_name)?);
            }
        }
        Ok(keys)
    }
    pub fn tile_url(&self, key: &TileKey) -> Result<String, LevelSetError> {
        let level = self.level(key.level())?;
        if level.empty {
            return Err(LevelSetError::EmptyLevel(key.level()));
        }
        match &self.url_builder {
            Some(builder) => builder.url_for(level, key),
            None => Err(LevelSetError::Url(format!(
                "level set {} has no url builder",
                self.cache_name
            ))),
        }
    }
    /// Eastward offset in radians of `longitude` from the tile origin.
    fn column_offset(&self, longitude: Angle) -> f64 {
        let offset = longitude.radians() - self.tile_origin.1.radians();
        if offset < 0.0 {
            return offset.rem_euclid(TAU);
        }
        offset
    }
    fn column_count(&self, level_number: u32) -> i64 {
        let delta = self.level_zero_tile_delta.1.radians() / 2f64.powi(level_number as i32);
        ((TAU / delta) - EPSILON9).ceil() as i64
    }
}
