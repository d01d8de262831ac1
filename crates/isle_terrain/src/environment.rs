use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::mesh::Indices;
use bevy::render::render_resource::PrimitiveTopology;
use isle_worldgen::{water_offset, CloudBank, WaterMesh, WaterSettings, WorldgenSettings};

use crate::props::cloud_template;

/// Sea surface resting at `level`.
#[derive(Debug, Clone, Copy, Component)]
pub struct WaterSurface {
    pub level: f32,
}

#[derive(Debug, Clone, Copy, Component)]
pub struct Cloud;

/// Seconds of sway animation for grass and seaweed.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct SwayPhase(pub f32);

pub fn water_mesh(water: &WaterMesh) -> Mesh {
    let _span = info_span!("water_mesh").entered();

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, water.positions());
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_NORMAL,
        vec![[0.0, 1.0, 0.0]; water.vertices.len()],
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, water.colors());
    mesh.set_indices(Some(Indices::U32(water.indices.clone())));
    mesh
}

pub fn cloud_mesh(clouds: &CloudBank) -> Mesh {
    let _span = info_span!("cloud_mesh").entered();
    cloud_template(clouds).build()
}

fn water_material(settings: &WaterSettings) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::rgba(1.0, 1.0, 1.0, settings.opacity),
        metallic: settings.metallic,
        perceptual_roughness: settings.roughness,
        alpha_mode: AlphaMode::Blend,
        ..default()
    }
}

fn cloud_material(opacity: f32) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::rgba(1.0, 1.0, 1.0, opacity),
        perceptual_roughness: 0.9,
        alpha_mode: AlphaMode::Blend,
        ..default()
    }
}

pub(crate) fn spawn_water(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    mesh: Mesh,
    level: f32,
    settings: &WaterSettings,
) {
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(mesh),
            material: materials.add(water_material(settings)),
            transform: Transform::from_xyz(0.0, level, 0.0),
            ..default()
        },
        WaterSurface { level },
        NotShadowCaster,
        Name::new("Water"),
    ));
}

pub(crate) fn spawn_clouds(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    mesh: Mesh,
    instances: &[Transform],
    opacity: f32,
) {
    let mesh = meshes.add(mesh);
    let material = materials.add(cloud_material(opacity));

    let parent = commands
        .spawn((SpatialBundle::default(), Name::new("Clouds")))
        .id();

    for &transform in instances {
        let cloud = commands
            .spawn((
                PbrBundle {
                    mesh: mesh.clone(),
                    material: material.clone(),
                    transform,
                    ..default()
                },
                Cloud,
                NotShadowCaster,
            ))
            .id();
        commands.entity(parent).add_child(cloud);
    }
}

pub(crate) fn animate_water(
    time: Res<Time>,
    settings: Res<WorldgenSettings>,
    mut q_water: Query<(&WaterSurface, &mut Transform)>,
) {
    let offset = water_offset(time.elapsed_seconds(), &settings.water);
    for (water, mut transform) in &mut q_water {
        transform.translation.y = water.level + offset;
    }
}

pub(crate) fn advance_sway(time: Res<Time>, mut phase: ResMut<SwayPhase>) {
    phase.0 = time.elapsed_seconds();
}
