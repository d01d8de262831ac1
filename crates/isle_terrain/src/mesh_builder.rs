use bevy::prelude::*;
use bevy::render::mesh::Indices;
use bevy::render::render_resource::PrimitiveTopology;
use isle_worldgen::compute_normals;

/// CPU-side triangle list with per-vertex color.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    colors: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    pub fn vertex(&mut self, pos: Vec3, color: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(pos);
        self.normals.push(Vec3::Y);
        self.colors.push(color);
        index
    }

    pub fn triangle_indices(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend([a, b, c]);
    }

    /// Two triangles `(a, b, c)` and `(a, c, d)` over existing vertices.
    pub fn quad_indices(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.triangle_indices(a, b, c);
        self.triangle_indices(a, c, d);
    }

    pub fn triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, color: Vec3) {
        let ai = self.vertex(a, color);
        let bi = self.vertex(b, color);
        let ci = self.vertex(c, color);
        self.triangle_indices(ai, bi, ci);
    }

    pub fn quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3, color: Vec3) {
        let ai = self.vertex(a, color);
        let bi = self.vertex(b, color);
        let ci = self.vertex(c, color);
        let di = self.vertex(d, color);
        self.quad_indices(ai, bi, ci, di);
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn map_positions(&mut self, mut f: impl FnMut(Vec3) -> Vec3) {
        for pos in &mut self.positions {
            *pos = f(*pos);
        }
    }

    pub fn map_colors(&mut self, mut f: impl FnMut(Vec3, Vec3) -> Vec3) {
        for (color, pos) in self.colors.iter_mut().zip(&self.positions) {
            *color = f(*pos, *color);
        }
    }

    pub fn apply_translation(&mut self, translation: Vec3) {
        for pos in &mut self.positions {
            *pos += translation;
        }
    }

    pub fn apply_scale(&mut self, scale: Vec3) {
        for pos in &mut self.positions {
            *pos *= scale;
        }
        for normal in &mut self.normals {
            *normal = (*normal / scale).normalize_or_zero();
        }
    }

    pub fn apply_transform(&mut self, transform: &Transform) {
        let normal_scale = transform.scale.recip();
        for pos in &mut self.positions {
            *pos = transform.transform_point(*pos);
        }
        for normal in &mut self.normals {
            *normal = (transform.rotation * (*normal * normal_scale)).normalize_or_zero();
        }
    }

    /// Smooth normals from the current triangles.
    pub fn compute_normals(&mut self) {
        self.normals = compute_normals(&self.positions, &self.indices);
    }

    /// Normals pointing away from the origin, for sphere-like shapes.
    pub fn radial_normals(&mut self) {
        for (normal, pos) in self.normals.iter_mut().zip(&self.positions) {
            *normal = pos.normalize_or_zero();
        }
    }

    pub fn append(&mut self, other: &MeshBuilder) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.colors.extend_from_slice(&other.colors);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    pub fn append_transformed(&mut self, other: &MeshBuilder, transform: &Transform) {
        let mut copy = other.clone();
        copy.apply_transform(transform);
        self.append(&copy);
    }

    pub fn build(self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);

        let colors = self
            .colors
            .into_iter()
            .map(|c| c.extend(1.0).to_array())
            .collect::<Vec<_>>();

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
        mesh.set_indices(Some(Indices::U32(self.indices)));

        mesh
    }
}
