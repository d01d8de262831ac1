use isle_noise::NoiseError;
use thiserror::Error;

use crate::Prop;

#[derive(Debug, Error)]
pub enum WorldgenError {
    #[error("invalid worldgen settings: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Noise(#[from] NoiseError),
    #[error("elevation at ({x}, {z}) is not finite ({value})")]
    NonFiniteElevation { x: f32, z: f32, value: f32 },
    #[error("surface color at ({x}, {z}) is not finite")]
    NonFiniteColor { x: f32, z: f32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("the world must have at least one chunk per side")]
    NoChunks,
    #[error("chunks need at least one subdivision")]
    NoSubdivisions,
    #[error("{0} subdivisions per chunk exceed the mesh index range")]
    TooManySubdivisions(u32),
    #[error("chunk size must be positive and finite, got {0}")]
    InvalidChunkSize(f32),
    #[error("water level {level} lies outside the terrain range [{min}, {max}]")]
    WaterLevelOutOfRange { level: f32, min: f32, max: f32 },
    #[error("{name} must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },
    #[error("{name} range [{min}, {max}) is empty")]
    EmptyRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
    #[error("snow line {snow_line} must sit above the shore band ending at {shore_end}")]
    SnowLineBelowShore { snow_line: f32, shore_end: f32 },
    #[error("placement probability for {prop:?} must lie in [0, 1], got {value}")]
    InvalidProbability { prop: Prop, value: f32 },
    #[error("density gate for {prop:?} needs a positive scale, got {scale}")]
    InvalidDensityScale { prop: Prop, scale: f32 },
    #[error("placement stride must be at least one")]
    ZeroStride,
}
