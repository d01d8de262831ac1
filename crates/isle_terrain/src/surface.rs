use bevy::prelude::*;
use bevy::render::mesh::Indices;
use bevy::render::render_resource::PrimitiveTopology;
use isle_worldgen::ChunkMesh;

#[derive(Debug, Clone, Copy, Component)]
pub struct TerrainChunk {
    pub coord: UVec2,
    pub vertices: usize,
    pub triangles: usize,
}

#[derive(Resource)]
pub struct TerrainMaterial(pub Handle<StandardMaterial>);

impl FromWorld for TerrainMaterial {
    fn from_world(world: &mut World) -> Self {
        let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
        TerrainMaterial(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            perceptual_roughness: 0.9,
            metallic: 0.1,
            ..default()
        }))
    }
}

/// Converts a synthesized chunk into a render mesh. Positions are already in
/// world space.
pub fn chunk_mesh(chunk: &ChunkMesh) -> Mesh {
    let _span = info_span!("chunk_mesh", x = chunk.coord.x, z = chunk.coord.y).entered();

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, chunk.positions());
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, chunk.normals());
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, chunk.colors());
    mesh.set_indices(Some(Indices::U32(chunk.indices.clone())));
    mesh
}

pub(crate) fn spawn_chunks(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    material: &TerrainMaterial,
    chunks: Vec<(TerrainChunk, Mesh)>,
) {
    for (chunk, mesh) in chunks {
        commands.spawn((
            PbrBundle {
                mesh: meshes.add(mesh),
                material: material.0.clone(),
                ..default()
            },
            chunk,
            Name::new(format!("Chunk ({}, {})", chunk.coord.x, chunk.coord.y)),
        ));
    }
}
