mod batch;
mod templates;

use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use isle_worldgen::PropPart;

pub use self::batch::{bake_batch, bake_props, PropBatch};
pub use self::templates::{cloud_template, PartStyle, PropTemplates};

/// Merged mesh holding every instance of one prop part.
#[derive(Debug, Clone, Copy, Component)]
pub struct PropBatchMesh {
    pub part: PropPart,
    pub instances: usize,
}

pub(crate) fn part_material(part: PropPart) -> StandardMaterial {
    let style = PartStyle::of(part);
    StandardMaterial {
        // colors live in the vertices
        base_color: Color::WHITE,
        perceptual_roughness: style.roughness,
        metallic: 0.0,
        double_sided: style.double_sided,
        cull_mode: if style.double_sided {
            None
        } else {
            Some(bevy::render::render_resource::Face::Back)
        },
        ..default()
    }
}

pub(crate) fn spawn_batches(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    batches: Vec<PropBatch>,
) {
    for batch in batches {
        let tag = PropBatchMesh {
            part: batch.part,
            instances: batch.instances,
        };

        let mut entity = commands.spawn((
            PbrBundle {
                mesh: meshes.add(batch.mesh),
                material: materials.add(part_material(batch.part)),
                ..default()
            },
            tag,
            Name::new(format!("{:?} batch", batch.part)),
        ));

        if !PartStyle::of(batch.part).casts_shadows {
            entity.insert(NotShadowCaster);
        }
    }
}
