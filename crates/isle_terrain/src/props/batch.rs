use bevy::prelude::*;
use isle_worldgen::{PlacementInstance, Placements, PropPart};

use super::templates::PropTemplates;
use crate::mesh_builder::MeshBuilder;

/// Every instance of one part, merged into a single mesh.
#[derive(Debug)]
pub struct PropBatch {
    pub part: PropPart,
    pub mesh: Mesh,
    pub instances: usize,
}

/// Copies `template` once per instance transform.
pub fn bake_batch(template: &MeshBuilder, instances: &[PlacementInstance]) -> MeshBuilder {
    let _scope = info_span!("bake_batch", instances = instances.len()).entered();

    let mut batch = MeshBuilder::default();
    for instance in instances {
        batch.append_transformed(template, &instance.transform);
    }
    batch
}

/// One batch per non-empty part bucket.
pub fn bake_props(placements: &Placements, templates: &PropTemplates) -> Vec<PropBatch> {
    placements
        .iter()
        .map(|(part, instances)| PropBatch {
            part,
            mesh: bake_batch(templates.get(part), instances).build(),
            instances: instances.len(),
        })
        .collect()
}
