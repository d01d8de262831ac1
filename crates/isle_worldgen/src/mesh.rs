use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainVertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Linear RGB.
    pub color: Vec3,
}

/// A square vertex lattice in row-major order (z outer, x inner) with its
/// fixed triangulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    pub coord: UVec2,
    pub offset: Vec2,
    pub subdivisions: u32,
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.position.to_array()).collect()
    }

    pub fn normals(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.normal.to_array()).collect()
    }

    pub fn colors(&self) -> Vec<[f32; 4]> {
        self.vertices
            .iter()
            .map(|v| v.color.extend(1.0).to_array())
            .collect()
    }
}

/// Local lattice coordinates spanning `[-size / 2, size / 2]` on both axes.
pub fn lattice_points(size: f32, subdivisions: u32) -> impl Iterator<Item = Vec2> {
    let step = size / subdivisions as f32;
    let half = size / 2.0;
    (0..=subdivisions).flat_map(move |iz| {
        (0..=subdivisions)
            .map(move |ix| Vec2::new(ix as f32 * step - half, iz as f32 * step - half))
    })
}

/// Two triangles per lattice cell, counter-clockwise seen from `+Y`.
pub fn lattice_indices(subdivisions: u32) -> Vec<u32> {
    let row = subdivisions + 1;
    let mut indices = Vec::with_capacity(subdivisions.pow(2) as usize * 6);

    for iz in 0..subdivisions {
        for ix in 0..subdivisions {
            let a = ix + row * iz;
            let b = ix + row * (iz + 1);
            let c = ix + 1 + row * (iz + 1);
            let d = ix + 1 + row * iz;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    indices
}

/// Area-weighted vertex normals. Vertices touching only degenerate faces
/// point up.
pub fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let _scope = info_span!("compute_normals").entered();

    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    for normal in &mut normals {
        *normal = normal.try_normalize().unwrap_or(Vec3::Y);
    }

    normals
}

#[inline]
pub fn slope(normal: Vec3) -> f32 {
    1.0 - normal.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_sizes() {
        for subdivisions in [1, 2, 7, 128] {
            let points = lattice_points(500.0, subdivisions).count();
            assert_eq!(points, ((subdivisions + 1) as usize).pow(2));

            let triangles = lattice_indices(subdivisions).len() / 3;
            assert_eq!(triangles, 2 * (subdivisions as usize).pow(2));
        }
    }

    #[test]
    fn lattice_is_row_major() {
        let points = lattice_points(10.0, 2).collect::<Vec<_>>();
        assert_eq!(points[0], Vec2::new(-5.0, -5.0));
        assert_eq!(points[1], Vec2::new(0.0, -5.0));
        assert_eq!(points[2], Vec2::new(5.0, -5.0));
        assert_eq!(points[3], Vec2::new(-5.0, 0.0));
        assert_eq!(points[8], Vec2::new(5.0, 5.0));
    }

    #[test]
    fn flat_lattice_faces_up() {
        let positions = lattice_points(4.0, 4)
            .map(|p| Vec3::new(p.x, 3.0, p.y))
            .collect::<Vec<_>>();
        let indices = lattice_indices(4);
        let normals = compute_normals(&positions, &indices);

        for normal in normals {
            assert!((normal - Vec3::Y).length() < 1e-6);
            assert_eq!(slope(normal), 0.0);
        }

        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| positions[i as usize]);
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn tilted_lattice_has_slope() {
        let positions = lattice_points(4.0, 4)
            .map(|p| Vec3::new(p.x, p.x, p.y))
            .collect::<Vec<_>>();
        let normals = compute_normals(&positions, &lattice_indices(4));

        for normal in normals {
            let expected = 1.0 - std::f32::consts::FRAC_1_SQRT_2;
            assert!((slope(normal) - expected).abs() < 1e-5);
        }
    }
}
