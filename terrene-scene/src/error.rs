#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("plane normal must not be zero")]
    ZeroNormal,
    #[error("line direction must not be zero")]
    ZeroDirection,
    #[error("invalid sector: min latitude {min_latitude} is greater than max latitude {max_latitude}")]
    InvalidSector {
        min_latitude: f64,
        max_latitude: f64,
    },
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TileKeyError {
    #[error("tile level must not be negative, got {0}")]
    NegativeLevel(i64),
    #[error("tile row must not be negative, got {0}")]
    NegativeRow(i64),
    #[error("tile column must not be negative, got {0}")]
    NegativeColumn(i64),
    #[error("tile cache name must not be empty")]
    EmptyCacheName,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("could not parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum LevelSetError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("level {0} is not in the level set")]
    NoSuchLevel(u32),
    #[error("level {0} is empty and has no tiles to request")]
    EmptyLevel(u32),
    #[error("could not build tile url: {0}")]
    Url(String),
    #[error(transparent)]
    TileKey(#[from] TileKeyError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ElevationError {
    #[error("could not fetch elevation tile {key}: {reason}")]
    Fetch { key: String, reason: String },
    #[error("elevation tile {key} has {actual} samples, expected {expected}")]
    MalformedTile {
        key: String,
        expected: usize,
        actual: usize,
    },
}
