use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy::utils::Instant;
use futures_lite::future;
use isle_worldgen::{
    generate_world_with_progress, World, WorldSeed, WorldgenError, WorldgenProgress,
    WorldgenSettings,
};

use crate::environment::{cloud_mesh, spawn_clouds, spawn_water, water_mesh};
use crate::props::{bake_props, spawn_batches, PropBatch, PropTemplates};
use crate::surface::{chunk_mesh, spawn_chunks, TerrainChunk, TerrainMaterial};
use crate::{SharedHeightField, WorldStats, WorldgenState};

/// Generated world with every mesh baked, ready to be spawned.
pub(crate) struct GeneratedScene {
    world: World,
    chunks: Vec<(TerrainChunk, Mesh)>,
    props: Vec<PropBatch>,
    water: Mesh,
    clouds: Mesh,
    elapsed: Duration,
}

#[derive(Resource)]
pub(crate) struct GenerationTask(Task<Result<GeneratedScene, WorldgenError>>);

pub(crate) fn build_scene(
    settings: &WorldgenSettings,
    seed: u64,
    progress: &WorldgenProgress,
) -> Result<GeneratedScene, WorldgenError> {
    let _scope = info_span!("build_scene").entered();
    let start = Instant::now();

    let world = generate_world_with_progress(settings, seed, progress)?;

    let chunks = world
        .chunks
        .iter()
        .map(|chunk| {
            let tag = TerrainChunk {
                coord: chunk.coord,
                vertices: chunk.vertex_count(),
                triangles: chunk.triangle_count(),
            };
            (tag, chunk_mesh(chunk))
        })
        .collect();

    let templates = PropTemplates::new(seed)?;
    let props = bake_props(&world.placements, &templates);
    let water = water_mesh(&world.water);
    let clouds = cloud_mesh(&world.clouds);

    Ok(GeneratedScene {
        world,
        chunks,
        props,
        water,
        clouds,
        elapsed: start.elapsed(),
    })
}

pub(crate) fn schedule_generation(
    settings: Res<WorldgenSettings>,
    seed: Res<WorldSeed>,
    mut commands: Commands,
) {
    let settings = settings.clone();
    let seed = seed.0;
    let progress = WorldgenProgress::default();
    commands.insert_resource(progress.clone());

    info!("generating world with seed {seed}");

    let task_pool = AsyncComputeTaskPool::get();
    let task = task_pool.spawn(async move { build_scene(&settings, seed, &progress) });
    commands.insert_resource(GenerationTask(task));
}

pub(crate) fn poll_generation(
    mut task: ResMut<GenerationTask>,
    settings: Res<WorldgenSettings>,
    terrain_material: Res<TerrainMaterial>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut next_state: ResMut<NextState<WorldgenState>>,
    mut commands: Commands,
) {
    let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
        return;
    };

    commands.remove_resource::<GenerationTask>();

    let scene = match result {
        Ok(scene) => scene,
        Err(err) => {
            error!("world generation failed: {err}");
            next_state.set(WorldgenState::Failed);
            return;
        }
    };

    let _scope = info_span!("spawn_world").entered();

    let stats = WorldStats::new(&scene.world, &scene.props, scene.elapsed);
    info!(
        "world ready in {:.2?}: {} vertices, {} triangles, {} prop instances",
        stats.elapsed,
        stats.vertices,
        stats.triangles,
        stats.instances(),
    );

    let GeneratedScene {
        world,
        chunks,
        props,
        water,
        clouds,
        ..
    } = scene;

    spawn_chunks(&mut commands, &mut meshes, &terrain_material, chunks);
    spawn_batches(&mut commands, &mut meshes, &mut materials, props);
    spawn_water(
        &mut commands,
        &mut meshes,
        &mut materials,
        water,
        world.grid.water_level,
        &settings.water,
    );
    spawn_clouds(
        &mut commands,
        &mut meshes,
        &mut materials,
        clouds,
        &world.clouds.instances,
        settings.clouds.opacity,
    );

    commands.insert_resource(SharedHeightField(Arc::clone(&world.height_field)));
    commands.insert_resource(stats);
    next_state.set(WorldgenState::Done);
}
