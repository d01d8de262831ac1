mod biome;
mod chunk;
mod environment;
mod error;
mod height;
mod mesh;
mod placement;
mod progress;
mod settings;
mod utils;
mod world;

use bevy::prelude::*;

pub use self::biome::{BiomeThresholds, ColorBands, SurfaceBand, SurfacePainter, TerrainPalette};
pub use self::chunk::{chunk_rng, ChunkSynthesizer, SynthesizedChunk};
pub use self::environment::{
    scatter_clouds, synthesize_water, water_offset, CloudBank, CloudPuff, CloudSettings, Span,
    WaterMesh, WaterSettings, WaterVertex,
};
pub use self::error::{ConfigError, WorldgenError};
pub use self::height::{shape_beach, HeightField, HeightSettings};
pub use self::mesh::{
    compute_normals, lattice_indices, lattice_points, slope, ChunkMesh, TerrainVertex,
};
pub use self::placement::{
    default_rules, synthesize_prop, DensityGate, ElevationGate, Level, PlacementEngine,
    PlacementInstance, PlacementRule, Placements, Prop, PropPart, SamplePoint, SlopeGate,
};
pub use self::progress::{WorldgenProgress, WorldgenStage};
pub use self::settings::{WorldGridSpec, WorldgenSettings};
pub use self::utils::{hex_color, lerp, smoothstep};
pub use self::world::{generate_world, generate_world_with_progress, World};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Resource)]
pub struct WorldSeed(pub u64);
