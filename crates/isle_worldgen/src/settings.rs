use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{BiomeThresholds, CloudSettings, ConfigError, HeightSettings, WaterSettings};

/// Everything that shapes a generated world besides its seed.
#[derive(Debug, Clone, Default, PartialEq, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldgenSettings {
    pub grid: WorldGridSpec,
    pub height: HeightSettings,
    pub biomes: BiomeThresholds,
    pub water: WaterSettings,
    pub clouds: CloudSettings,
}

impl WorldgenSettings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<WorldgenSettings> {
        let _scope = info_span!("load").entered();

        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let reader = BufReader::new(file);
        let settings = ron::de::from_reader(reader)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.height.validate()?;

        let (min, max) = self.height.elevation_range();
        let level = self.grid.water_level;
        if !level.is_finite() || level < min || level > max {
            return Err(ConfigError::WaterLevelOutOfRange { level, min, max });
        }

        self.biomes.validate(level)?;
        self.water.validate()?;
        self.clouds.validate()?;
        Ok(())
    }

    pub fn world_size(&self) -> f32 {
        self.grid.world_size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGridSpec {
    pub chunks_per_side: u32,
    pub chunk_size: f32,
    pub subdivisions: u32,
    pub water_level: f32,
}

/// Keeps `(subdivisions + 1)^2` vertex indices inside `u32`.
const MAX_SUBDIVISIONS: u32 = 4096;

impl WorldGridSpec {
    pub fn world_size(&self) -> f32 {
        self.chunks_per_side as f32 * self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        (self.chunks_per_side as usize).pow(2)
    }

    pub fn vertices_per_side(&self) -> u32 {
        self.subdivisions + 1
    }

    /// World-space center of the chunk at `coord`; the grid is centered on
    /// the origin.
    pub fn chunk_offset(&self, coord: UVec2) -> Vec2 {
        let half = (self.chunks_per_side as f32 - 1.0) / 2.0;
        (coord.as_vec2() - Vec2::splat(half)) * self.chunk_size
    }

    pub fn chunk_coords(&self) -> impl Iterator<Item = UVec2> {
        let n = self.chunks_per_side;
        (0..n).flat_map(move |z| (0..n).map(move |x| UVec2::new(x, z)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunks_per_side == 0 {
            return Err(ConfigError::NoChunks);
        }

        if self.subdivisions == 0 {
            return Err(ConfigError::NoSubdivisions);
        }

        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(ConfigError::TooManySubdivisions(self.subdivisions));
        }

        if !self.chunk_size.is_finite() || self.chunk_size <= 0.0 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }

        Ok(())
    }
}

impl Default for WorldGridSpec {
    fn default() -> Self {
        WorldGridSpec {
            chunks_per_side: 8,
            chunk_size: 500.0,
            subdivisions: 128,
            water_level: 10.0,
        }
    }
}

pub(crate) fn ensure_finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { name, value })
    }
}

pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

pub(crate) fn ensure_range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(ConfigError::EmptyRange { name, min, max })
    }
}
