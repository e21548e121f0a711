use std::{cmp::Ordering, fmt, sync::Arc};

use crate::{Angle, TileKeyError};

/// Address of a tile in a level set's quadtree.
///
/// Rows count northward from the level set's tile origin and columns count
/// eastward. Ordering is by level, then row, then column.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct TileKey {
    level: u32,
    row: u32,
    column: u32,
    cache_name: Arc<str>,
}
impl TileKey {
    pub fn new(level: i64, row: i64, column: i64, cache_name: &str) -> Result<Self, TileKeyError> {
        if level < 0 {
            return Err(TileKeyError::NegativeLevel(level));
        }
        if row < 0 {
            return Err(TileKeyError::NegativeRow(row));
        }
        if column < 0 {
            return Err(TileKeyError::NegativeColumn(column));
        }
        if cache_name.is_empty() {
            return Err(TileKeyError::EmptyCacheName);
        }
        Ok(Self {
            level: level as u32,
            row: row as u32,
            column: column as u32,
            cache_name: Arc::from(cache_name),
        })
    }
    /// Key of the tile containing a location at `level`.
    pub fn from_location(
        latitude: Angle,
        longitude: Angle,
        level: u32,
        level_zero_delta: (Angle, Angle),
        tile_origin: (Angle, Angle),
        cache_name: &str,
    ) -> Result<Self, TileKeyError> {
        let scale = 2f64.powi(level as i32);
        let delta_lat = level_zero_delta.0 / scale;
        let delta_lon = level_zero_delta.1 / scale;
        let row = Self::compute_row(delta_lat, latitude, tile_origin.0);
        let column = Self::compute_column(delta_lon, longitude, tile_origin.1);
        return TileKey::new(level as i64, row, column, cache_name);
    }
    pub fn compute_row(delta: Angle, latitude: Angle, origin: Angle) -> i64 {
        let mut row = ((latitude.radians() - origin.radians()) / delta.radians()).floor() as i64;
        // the north edge belongs to the last row
        if latitude.radians() >= std::f64::consts::FRAC_PI_2 && row > 0 {
            row -= 1;
        }
        row
    }
    pub fn compute_column(delta: Angle, longitude: Angle, origin: Angle) -> i64 {
        let mut column =
            ((longitude.radians() - origin.radians()) / delta.radians()).floor() as i64;
        if longitude.radians() >= std::f64::consts::PI && column > 0 {
            column -= 1;
        }
        column
    }
    pub fn level(&self) -> u32 {
        self.level
    }
    pub fn row(&self) -> u32 {
        self.row
    }
    pub fn column(&self) -> u32 {
        self.column
    }
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }
    pub fn parent(&self) -> Option<TileKey> {
        if self.level == 0 {
            return None;
        }
        Some(TileKey {
            level: self.level - 1,
            row: self.row / 2,
            column: self.column / 2,
            cache_name: self.cache_name.clone(),
        })
    }
    /// Children in the order southwest, southeast, northwest, northeast.
    pub fn children(&self) -> [TileKey; 4] {
        let child = |row: u32, column: u32| TileKey {
            level: self.level + 1,
            row,
            column,
            cache_name: self.cache_name.clone(),
        };
        let row = self.row * 2;
        let column = self.column * 2;
        [
            child(row, column),
            child(row, column + 1),
            child(row + 1, column),
            child(row + 1, column + 1),
        ]
    }
    /// Relative path `level/row/row_column` used for caches and urls.
    pub fn path(&self, suffix: &str) -> String {
        format!(
            "{}/{}/{}_{}{}",
            self.level, self.row, self.row, self.column, suffix
        )
    }
}
impl PartialOrd for TileKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TileKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level
            .cmp(&other.level)
            .then(self.row.cmp(&other.row))
            .then(self.column.cmp(&other.column))
            .then_with(|| self.cache_name.cmp(&other.cache_name))
    }
}
impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.cache_name, self.level, self.row, self.column
        )
    }
}
