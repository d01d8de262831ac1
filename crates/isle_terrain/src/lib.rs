mod environment;
mod generator;
mod mesh_builder;
mod progress;
mod props;
mod surface;

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use isle_worldgen::{HeightField, PropPart, World};

pub use self::environment::{cloud_mesh, water_mesh, Cloud, SwayPhase, WaterSurface};
pub use self::mesh_builder::MeshBuilder;
pub use self::progress::WorldgenProgressUiPlugin;
pub use self::props::{
    bake_batch, bake_props, PartStyle, PropBatch, PropBatchMesh, PropTemplates,
};
pub use self::surface::{chunk_mesh, TerrainChunk, TerrainMaterial};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, States)]
pub enum WorldgenState {
    #[default]
    InProgress,
    Done,
    Failed,
}

/// Elevation queries for the spawned world.
#[derive(Debug, Clone, Resource, Deref)]
pub struct SharedHeightField(pub Arc<HeightField>);

#[derive(Debug, Clone, Resource)]
pub struct WorldStats {
    pub seed: u64,
    pub chunks: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub props: Vec<(PropPart, usize)>,
    pub clouds: usize,
    pub elapsed: Duration,
}

impl WorldStats {
    pub fn new(world: &World, props: &[PropBatch], elapsed: Duration) -> WorldStats {
        WorldStats {
            seed: world.seed,
            chunks: world.chunks.len(),
            vertices: world.chunks.iter().map(|c| c.vertex_count()).sum(),
            triangles: world.chunks.iter().map(|c| c.triangle_count()).sum(),
            props: props.iter().map(|b| (b.part, b.instances)).collect(),
            clouds: world.clouds.instances.len(),
            elapsed,
        }
    }

    pub fn instances(&self) -> usize {
        self.props.iter().map(|(_, n)| n).sum()
    }
}

/// Generates the world in the background and spawns it once ready.
///
/// Expects [`WorldgenSettings`](isle_worldgen::WorldgenSettings) and
/// [`WorldSeed`](isle_worldgen::WorldSeed) to be inserted up front.
pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.add_state::<WorldgenState>()
            .init_resource::<SwayPhase>()
            .add_plugins(WorldgenProgressUiPlugin)
            .add_systems(
                OnEnter(WorldgenState::InProgress),
                generator::schedule_generation,
            )
            .add_systems(
                Update,
                generator::poll_generation
                    .run_if(resource_exists::<generator::GenerationTask>()),
            )
            .add_systems(
                Update,
                (environment::animate_water, environment::advance_sway)
                    .run_if(in_state(WorldgenState::Done)),
            );
    }

    fn finish(&self, app: &mut App) {
        app.init_resource::<TerrainMaterial>();
    }
}
