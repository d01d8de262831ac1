use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bevy::prelude::*;
use isle_noise::NoiseField;
use rand_pcg::Pcg32;
use rayon::prelude::*;

use crate::biome::TerrainPalette;
use crate::chunk::{ChunkSynthesizer, SynthesizedChunk};
use crate::environment::{scatter_clouds, synthesize_water, CloudBank, WaterMesh};
use crate::{
    ChunkMesh, HeightField, Placements, WorldGridSpec, WorldgenError, WorldgenProgress,
    WorldgenSettings, WorldgenStage,
};

/// Random stream reserved for the cloud layout.
const CLOUD_STREAM: u64 = u64::MAX;

/// A fully generated world. Immutable once built.
#[derive(Debug, Clone)]
pub struct World {
    pub seed: u64,
    pub grid: WorldGridSpec,
    pub height_field: Arc<HeightField>,
    pub chunks: Vec<ChunkMesh>,
    pub placements: Placements,
    pub water: WaterMesh,
    pub clouds: CloudBank,
}

pub fn generate_world(settings: &WorldgenSettings, seed: u64) -> Result<World, WorldgenError> {
    generate_world_with_progress(settings, seed, &WorldgenProgress::default())
}

pub fn generate_world_with_progress(
    settings: &WorldgenSettings,
    seed: u64,
    progress: &WorldgenProgress,
) -> Result<World, WorldgenError> {
    let _scope = info_span!("generate_world").entered();

    settings.validate()?;
    let grid = settings.grid;

    progress.set(WorldgenStage::Noise, 0);
    let noise = Arc::new(NoiseField::new(seed)?);
    let height_field = Arc::new(HeightField::new(noise, settings.height, &grid));

    progress.set(WorldgenStage::Terrain, 0);
    let palette = TerrainPalette::default();
    let synthesizer = ChunkSynthesizer {
        seed,
        grid: &grid,
        height_field: &height_field,
        biomes: &settings.biomes,
        palette: &palette,
    };

    let total = grid.chunk_count();
    let done = AtomicUsize::new(0);
    let synthesized = grid
        .chunk_coords()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|coord| -> Result<SynthesizedChunk, WorldgenError> {
            let chunk = synthesizer.synthesize_chunk(coord)?;
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.set(WorldgenStage::Terrain, (finished * 100 / total) as u8);
            Ok(chunk)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut chunks = Vec::with_capacity(synthesized.len());
    let mut placements = Placements::default();
    for chunk in synthesized {
        chunks.push(chunk.mesh);
        placements.append(chunk.placements);
    }

    progress.set(WorldgenStage::Water, 0);
    let water = synthesize_water(&height_field, &settings.water);

    progress.set(WorldgenStage::Clouds, 0);
    let mut rng = Pcg32::new(seed, CLOUD_STREAM);
    let clouds = scatter_clouds(&mut rng, grid.world_size(), &settings.clouds);

    info!(
        "generated {} chunks with {} prop instances and {} clouds",
        chunks.len(),
        placements.len(),
        clouds.instances.len(),
    );

    progress.set(WorldgenStage::Done, 100);

    Ok(World {
        seed,
        grid,
        height_field,
        chunks,
        placements,
        water,
        clouds,
    })
}
