use bevy::prelude::*;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::biome::{SurfacePainter, TerrainPalette};
use crate::mesh::{compute_normals, lattice_indices, lattice_points, slope};
use crate::placement::{PlacementEngine, SamplePoint};
use crate::{
    BiomeThresholds, ChunkMesh, HeightField, Placements, TerrainVertex, WorldGridSpec,
    WorldgenError,
};

#[derive(Debug)]
pub struct SynthesizedChunk {
    pub mesh: ChunkMesh,
    pub placements: Placements,
}

/// Turns one tile of the world grid into a colored mesh and the props
/// scattered over it.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSynthesizer<'a> {
    pub seed: u64,
    pub grid: &'a WorldGridSpec,
    pub height_field: &'a HeightField,
    pub biomes: &'a BiomeThresholds,
    pub palette: &'a TerrainPalette,
}

impl ChunkSynthesizer<'_> {
    /// Synthesizes the chunk at grid coordinate `coord` with its own random
    /// stream, so chunks may be generated in any order.
    pub fn synthesize_chunk(&self, coord: UVec2) -> Result<SynthesizedChunk, WorldgenError> {
        let _scope = info_span!("synthesize_chunk", x = coord.x, z = coord.y).entered();

        let mut rng = chunk_rng(self.seed, coord);
        let offset = self.grid.chunk_offset(coord);
        let mut chunk = self.synthesize(offset, &mut rng)?;
        chunk.mesh.coord = coord;
        Ok(chunk)
    }

    /// Synthesizes a chunk centered at world-space `offset`.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        offset: Vec2,
        rng: &mut R,
    ) -> Result<SynthesizedChunk, WorldgenError> {
        let subdivisions = self.grid.subdivisions;

        let positions = lattice_points(self.grid.chunk_size, subdivisions)
            .map(|local| {
                let world = local + offset;
                let y = self.height_field.elevation_at(world);
                if !y.is_finite() {
                    return Err(WorldgenError::NonFiniteElevation {
                        x: world.x,
                        z: world.y,
                        value: y,
                    });
                }
                Ok(Vec3::new(world.x, y, world.y))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let indices = lattice_indices(subdivisions);
        let normals = compute_normals(&positions, &indices);

        let painter = SurfacePainter {
            bands: &self.biomes.colors,
            palette: self.palette,
            noise: self.height_field.noise(),
            water_level: self.grid.water_level,
        };

        let vertices = positions
            .iter()
            .zip(&normals)
            .map(|(&position, &normal)| {
                let color = painter.color(position, slope(normal));
                if !color.is_finite() {
                    return Err(WorldgenError::NonFiniteColor {
                        x: position.x,
                        z: position.z,
                    });
                }
                Ok(TerrainVertex {
                    position,
                    normal,
                    color,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let placements = self.scatter(&vertices, rng);

        Ok(SynthesizedChunk {
            mesh: ChunkMesh {
                coord: UVec2::ZERO,
                offset,
                subdivisions,
                vertices,
                indices,
            },
            placements,
        })
    }

    fn scatter<R: Rng + ?Sized>(&self, vertices: &[TerrainVertex], rng: &mut R) -> Placements {
        let _scope = info_span!("scatter").entered();

        let engine = PlacementEngine::new(&self.biomes.rules, self.grid.water_level);
        let noise = self.height_field.noise();
        let mut placements = Placements::default();

        let stride = self.biomes.placement_stride.max(1) as usize;
        for vertex in vertices.iter().step_by(stride) {
            let point = SamplePoint {
                position: vertex.position,
                slope: slope(vertex.normal),
            };
            engine.evaluate(&point, noise, rng, &mut placements);
        }

        placements
    }
}

/// Random stream for the chunk at `coord`, independent of every other chunk.
pub fn chunk_rng(seed: u64, coord: UVec2) -> Pcg32 {
    let stream = (coord.x as u64) << 32 | coord.y as u64;
    Pcg32::new(seed, stream)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::math::Vec3Swizzles;
    use isle_noise::NoiseField;
    use rand::SeedableRng;

    use super::*;
    use crate::{HeightSettings, PropPart};

    fn setup(seed: u64, grid: WorldGridSpec) -> (HeightField, BiomeThresholds, TerrainPalette) {
        let noise = Arc::new(NoiseField::new(seed).unwrap());
        let height_field = HeightField::new(noise, HeightSettings::default(), &grid);
        (height_field, BiomeThresholds::default(), TerrainPalette::default())
    }

    fn small_grid() -> WorldGridSpec {
        WorldGridSpec {
            chunks_per_side: 2,
            chunk_size: 200.0,
            subdivisions: 16,
            water_level: 10.0,
        }
    }

    #[test]
    fn mesh_matches_lattice() {
        let grid = small_grid();
        let (height_field, biomes, palette) = setup(4, grid);
        let synthesizer = ChunkSynthesizer {
            seed: 4,
            grid: &grid,
            height_field: &height_field,
            biomes: &biomes,
            palette: &palette,
        };

        let chunk = synthesizer.synthesize_chunk(UVec2::new(1, 0)).unwrap();
        let mesh = &chunk.mesh;

        assert_eq!(mesh.coord, UVec2::new(1, 0));
        assert_eq!(mesh.offset, Vec2::new(100.0, -100.0));
        assert_eq!(mesh.vertex_count(), 17 * 17);
        assert_eq!(mesh.triangle_count(), 2 * 16 * 16);

        let first = mesh.vertices[0].position;
        assert_eq!((first.x, first.z), (0.0, -200.0));
        let last = mesh.vertices[17 * 17 - 1].position;
        assert_eq!((last.x, last.z), (200.0, 0.0));

        for vertex in &mesh.vertices {
            let p = vertex.position;
            assert_eq!(p.y, height_field.elevation(p.x, p.z));
            assert!((vertex.normal.length() - 1.0).abs() < 1e-4);
            assert!(vertex.normal.y > 0.0);
        }
    }

    #[test]
    fn chunks_are_reproducible() {
        let grid = small_grid();
        let (height_field, biomes, palette) = setup(12, grid);
        let synthesizer = ChunkSynthesizer {
            seed: 12,
            grid: &grid,
            height_field: &height_field,
            biomes: &biomes,
            palette: &palette,
        };

        let a = synthesizer.synthesize_chunk(UVec2::new(0, 1)).unwrap();
        let b = synthesizer.synthesize_chunk(UVec2::new(0, 1)).unwrap();
        assert_eq!(a.mesh, b.mesh);
        assert_eq!(a.placements.len(), b.placements.len());
        for (part, instances) in a.placements.iter() {
            assert_eq!(instances, b.placements.get(part));
        }
    }

    #[test]
    fn props_sit_on_sampled_vertices() {
        let grid = small_grid();
        let (height_field, mut biomes, palette) = setup(6, grid);
        for rule in &mut biomes.rules {
            rule.probability = 1.0;
            rule.density = None;
        }

        let synthesizer = ChunkSynthesizer {
            seed: 6,
            grid: &grid,
            height_field: &height_field,
            biomes: &biomes,
            palette: &palette,
        };

        let mut rng = Pcg32::seed_from_u64(0);
        let chunk = synthesizer.synthesize(Vec2::ZERO, &mut rng).unwrap();
        let sampled = chunk
            .mesh
            .vertices
            .iter()
            .step_by(4)
            .map(|v| v.position.xz())
            .collect::<Vec<_>>();

        for part in [PropPart::Grass, PropPart::Seaweed, PropPart::Boulder] {
            for instance in chunk.placements.get(part) {
                let xz = instance.transform.translation.xz();
                assert!(sampled.contains(&xz), "{part:?} at {xz} is off the stride");
            }
        }
    }

    /// Upper bound on the horizontal slope of the height field, for noise
    /// whose slope is at most `NOISE_SLOPE` per unit of input.
    fn max_slope(s: &HeightSettings, world_size: f32) -> f32 {
        const NOISE_SLOPE: f32 = 3.0;
        let per_unit = |frequency: f32| NOISE_SLOPE * frequency / world_size;

        let base = s.base_amplitude.abs() * per_unit(s.base_frequency);
        let mountain =
            s.mountain_amplitude.abs() * s.mountain_power * 0.5 * per_unit(s.mountain_frequency);
        let detail = s.detail_amplitude.abs() * per_unit(s.detail_frequency);
        let seabed = s.seabed_amplitude.abs() * per_unit(s.seabed_frequency);

        // islands noise times the radial falloff, through the mask smoothstep
        let radius = s.gradient_radius * world_size;
        let mask_input = 0.5 * per_unit(s.islands_frequency) + 2.0 / radius;
        let mask = 1.5 / (s.mask_high - s.mask_low) * mask_input;
        let (min, max) = s.elevation_range();

        let beach = 1.0 + (s.beach_band - s.beach_rest).abs() * s.beach_strength / s.beach_band;
        (base + mountain + detail + seabed + (max - min) * mask) * beach
    }

    #[test]
    fn lattice_neighbours_stay_within_slope_bound() {
        let grid = WorldGridSpec {
            chunks_per_side: 1,
            chunk_size: 500.0,
            subdivisions: 128,
            water_level: 10.0,
        };
        let s = HeightSettings::default();
        let step = grid.chunk_size / grid.subdivisions as f32;
        // the seabed layer and the beach snap each add one bounded jump
        let bound = max_slope(&s, grid.world_size()) * step
            + s.seabed_amplitude.abs()
            + s.beach_rest.abs() * s.beach_strength;
        let side = grid.subdivisions as usize + 1;

        let mut steepest = 0.0f32;
        for seed in 1..=4 {
            let (height_field, biomes, palette) = setup(seed, grid);
            let synthesizer = ChunkSynthesizer {
                seed,
                grid: &grid,
                height_field: &height_field,
                biomes: &biomes,
                palette: &palette,
            };

            let chunk = synthesizer.synthesize_chunk(UVec2::ZERO).unwrap();
            let heights = chunk
                .mesh
                .vertices
                .iter()
                .map(|v| v.position.y)
                .collect::<Vec<_>>();
            assert_eq!(heights.len(), side * side);

            for row in 0..side {
                for col in 0..side {
                    let h = heights[row * side + col];
                    if col + 1 < side {
                        steepest = steepest.max((h - heights[row * side + col + 1]).abs());
                    }
                    if row + 1 < side {
                        steepest = steepest.max((h - heights[(row + 1) * side + col]).abs());
                    }
                }
            }
        }

        assert!(steepest > 0.0);
        assert!(steepest <= bound, "step of {steepest} exceeds {bound}");
    }

    #[test]
    fn non_finite_colors_fail_the_chunk() {
        let grid = small_grid();
        let mut failed = 0;

        for seed in 0..4 {
            let (height_field, mut biomes, palette) = setup(seed, grid);
            biomes.colors.grass_variation = f32::NAN;
            let synthesizer = ChunkSynthesizer {
                seed,
                grid: &grid,
                height_field: &height_field,
                biomes: &biomes,
                palette: &palette,
            };

            for coord in grid.chunk_coords() {
                match synthesizer.synthesize_chunk(coord) {
                    Ok(chunk) => {
                        assert!(chunk.mesh.vertices.iter().all(|v| v.color.is_finite()));
                    }
                    Err(err) => {
                        assert!(matches!(err, WorldgenError::NonFiniteColor { .. }));
                        failed += 1;
                    }
                }
            }
        }

        assert!(failed > 0);
    }

    #[test]
    fn chunk_streams_differ() {
        let mut a = chunk_rng(1, UVec2::new(0, 1));
        let mut b = chunk_rng(1, UVec2::new(1, 0));
        let mut c = chunk_rng(1, UVec2::new(0, 1));

        let xs = (0..8).map(|_| a.gen::<u32>()).collect::<Vec<_>>();
        let ys = (0..8).map(|_| b.gen::<u32>()).collect::<Vec<_>>();
        let zs = (0..8).map(|_| c.gen::<u32>()).collect::<Vec<_>>();
        assert_ne!(xs, ys);
        assert_eq!(xs, zs);
    }
}
