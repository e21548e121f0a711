use terrene_scene::{ConfigError, LevelSetError};

#[derive(thiserror::Error, Debug)]
pub enum TessellatorError {
    #[error("draw context has no globe")]
    MissingGlobe,
    #[error("draw context has no view")]
    MissingView,
    #[error("tessellation density must be within 1..={max}, got {density}")]
    InvalidDensity { density: u32, max: u32 },
    #[error("tessellation was cancelled")]
    Cancelled,
    #[error(transparent)]
    LevelSet(#[from] LevelSetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
