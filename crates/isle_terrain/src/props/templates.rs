use std::f32::consts::{PI, TAU};

use bevy::math::Vec3Swizzles;
use bevy::prelude::*;
use isle_noise::{Noise, NoiseError, SimplexNoise};
use isle_worldgen::{hex_color, CloudBank, PropPart};
use rand::Rng;
use rand_pcg::Pcg32;

use crate::mesh_builder::MeshBuilder;

/// Random stream reserved for template shapes.
const TEMPLATE_STREAM: u64 = u64::MAX - 1;

const GOLDEN_RATIO: f32 = 1.618_034;

const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = [
    [-1.0, GOLDEN_RATIO, 0.0],
    [1.0, GOLDEN_RATIO, 0.0],
    [-1.0, -GOLDEN_RATIO, 0.0],
    [1.0, -GOLDEN_RATIO, 0.0],
    [0.0, -1.0, GOLDEN_RATIO],
    [0.0, 1.0, GOLDEN_RATIO],
    [0.0, -1.0, -GOLDEN_RATIO],
    [0.0, 1.0, -GOLDEN_RATIO],
    [GOLDEN_RATIO, 0.0, -1.0],
    [GOLDEN_RATIO, 0.0, 1.0],
    [-GOLDEN_RATIO, 0.0, -1.0],
    [-GOLDEN_RATIO, 0.0, 1.0],
];

#[rustfmt::skip]
const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
    [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
    [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
    [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
];

/// Flat-colored look of one prop part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartStyle {
    pub color: u32,
    pub roughness: f32,
    pub double_sided: bool,
    pub casts_shadows: bool,
}

impl PartStyle {
    const fn solid(color: u32, roughness: f32) -> PartStyle {
        PartStyle {
            color,
            roughness,
            double_sided: false,
            casts_shadows: true,
        }
    }

    pub fn of(part: PropPart) -> PartStyle {
        match part {
            PropPart::PineTrunk => PartStyle::solid(0x6e584b, 1.0),
            PropPart::PineFoliage => PartStyle::solid(0x3d5e4a, 1.0),
            PropPart::RegularTrunk => PartStyle::solid(0x8b4513, 1.0),
            PropPart::RegularFoliage => PartStyle::solid(0x2e8b57, 1.0),
            PropPart::PalmTrunk => PartStyle::solid(0xa0826d, 1.0),
            PropPart::PalmFrond => PartStyle {
                double_sided: true,
                ..PartStyle::solid(0x5a933e, 1.0)
            },
            PropPart::Rock => PartStyle::solid(0xffffff, 0.8),
            PropPart::Boulder => PartStyle::solid(0xffffff, 0.9),
            PropPart::Coral => PartStyle::solid(0xff7f50, 0.8),
            PropPart::Seaweed => PartStyle {
                double_sided: true,
                casts_shadows: false,
                ..PartStyle::solid(0x20b2aa, 1.0)
            },
            PropPart::Grass => PartStyle {
                double_sided: true,
                casts_shadows: false,
                ..PartStyle::solid(0x4a8542, 1.0)
            },
        }
    }
}

/// One template mesh per prop part, in local space with the base at the
/// origin.
#[derive(Debug, Clone)]
pub struct PropTemplates {
    templates: Vec<(PropPart, MeshBuilder)>,
}

impl PropTemplates {
    pub fn new(seed: u64) -> Result<PropTemplates, NoiseError> {
        let _scope = info_span!("prop_templates").entered();

        let mut rng = Pcg32::new(seed, TEMPLATE_STREAM);
        let noise = SimplexNoise::new(&mut rng)?;

        let templates = PropPart::ALL
            .iter()
            .map(|&part| (part, template(part, &noise, &mut rng)))
            .collect();

        Ok(PropTemplates { templates })
    }

    pub fn get(&self, part: PropPart) -> &MeshBuilder {
        let index = PropPart::ALL.iter().position(|&p| p == part);
        // every part gets a template in `new`
        &self.templates[index.unwrap_or_default()].1
    }
}

fn template(part: PropPart, noise: &SimplexNoise, rng: &mut Pcg32) -> MeshBuilder {
    let color = hex_color(PartStyle::of(part).color);

    match part {
        PropPart::PineTrunk => frustum(0.8, 1.2, 20.0, 8, 1, color),
        PropPart::PineFoliage => cone(7.0, 25.0, 8, color),
        PropPart::RegularTrunk => frustum(1.0, 1.6, 16.0, 8, 1, color),
        PropPart::RegularFoliage => {
            let mut foliage = icosphere(8.0, 1, color);
            foliage.radial_normals();
            foliage
        }
        PropPart::PalmTrunk => palm_trunk(color),
        PropPart::PalmFrond => palm_crown(rng, color),
        PropPart::Rock => stone(noise, 3.0, 0.3, 0.8),
        PropPart::Boulder => stone(noise, 2.0, 0.4, 0.6),
        PropPart::Coral => coral(rng, color),
        PropPart::Seaweed => seaweed(color),
        PropPart::Grass => grass_clump(color),
    }
}

/// Capped truncated cone standing on the origin, split into `stacks`
/// rings along its height.
pub fn frustum(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    segments: u32,
    stacks: u32,
    color: Vec3,
) -> MeshBuilder {
    let ring = |radius: f32, y: f32, i: u32| {
        let angle = i as f32 / segments as f32 * TAU;
        Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
    };

    let mut builder = MeshBuilder::default();
    for s in 0..=stacks {
        let t = s as f32 / stacks as f32;
        let radius = radius_bottom + (radius_top - radius_bottom) * t;
        for i in 0..=segments {
            builder.vertex(ring(radius, height * t, i), color);
        }
    }

    let row = segments + 1;
    for s in 0..stacks {
        for i in 0..segments {
            let a = s * row + i;
            builder.quad_indices(a, a + row, a + row + 1, a + 1);
        }
    }
    builder.compute_normals();

    let mut caps = MeshBuilder::default();
    let top_center = Vec3::Y * height;
    for i in 0..segments {
        caps.triangle(
            Vec3::ZERO,
            ring(radius_bottom, 0.0, i),
            ring(radius_bottom, 0.0, i + 1),
            color,
        );
        if radius_top > 0.0 {
            caps.triangle(
                top_center,
                ring(radius_top, height, i + 1),
                ring(radius_top, height, i),
                color,
            );
        }
    }
    caps.compute_normals();

    builder.append(&caps);
    builder
}

pub fn cone(radius: f32, height: f32, segments: u32, color: Vec3) -> MeshBuilder {
    frustum(0.0, radius, height, segments, 1, color)
}

/// Subdivided icosahedron with `(detail + 1)²` triangles per face.
pub fn icosphere(radius: f32, detail: u32, color: Vec3) -> MeshBuilder {
    let mut builder = MeshBuilder::default();
    let cols = detail + 1;

    for face in ICOSAHEDRON_FACES {
        let [a, b, c] = face.map(|i| Vec3::from_array(ICOSAHEDRON_VERTICES[i]));

        let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols as usize + 1);
        for i in 0..=cols {
            let t = i as f32 / cols as f32;
            let aj = a.lerp(c, t);
            let bj = b.lerp(c, t);
            let rows = cols - i;
            let row = (0..=rows)
                .map(|j| {
                    if rows == 0 {
                        aj
                    } else {
                        aj.lerp(bj, j as f32 / rows as f32)
                    }
                })
                .collect();
            grid.push(row);
        }

        for i in 0..cols as usize {
            for j in 0..(2 * (cols as usize - i) - 1) {
                let k = j / 2;
                let (p, q, r) = if j % 2 == 0 {
                    (grid[i][k + 1], grid[i + 1][k], grid[i][k])
                } else {
                    (grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k])
                };
                builder.triangle(
                    p.normalize() * radius,
                    q.normalize() * radius,
                    r.normalize() * radius,
                    color,
                );
            }
        }
    }

    builder.compute_normals();
    builder
}

fn palm_trunk(color: Vec3) -> MeshBuilder {
    const HEIGHT: f32 = 28.0;
    const BEND: f32 = 3.0;

    let mut trunk = frustum(0.6, 0.9, HEIGHT, 8, 8, color);
    trunk.map_positions(|p| {
        let t = (p.y / HEIGHT).clamp(0.0, 1.0);
        p + Vec3::X * (t * PI).sin() * BEND
    });
    trunk.compute_normals();
    trunk
}

/// Drooping leaf along +X, mirrored across the XY plane.
pub fn frond(color: Vec3) -> MeshBuilder {
    const LENGTH: f32 = 16.0;
    const WIDTH: f32 = 4.0;
    const SEGMENTS: u32 = 8;

    let mut builder = MeshBuilder::default();
    let edge = |j: u32| {
        let t = j as f32 / SEGMENTS as f32;
        let half_width = (t * PI).sin() * (WIDTH / 2.0) * (1.0 - t);
        (Vec3::new(t * LENGTH, -t * t * 5.0, 0.0), half_width)
    };

    for j in 0..=SEGMENTS {
        let (center, half_width) = edge(j);
        builder.vertex(center + Vec3::Z * half_width, color);
    }
    for j in (0..=SEGMENTS).rev() {
        let (center, half_width) = edge(j);
        builder.vertex(center - Vec3::Z * half_width, color);
    }

    let n = SEGMENTS + 1;
    for j in 0..SEGMENTS {
        let mirrored = |j: u32| 2 * n - 1 - j;
        builder.quad_indices(j, j + 1, mirrored(j + 1), mirrored(j));
    }

    builder.compute_normals();
    builder
}

fn palm_crown(rng: &mut Pcg32, color: Vec3) -> MeshBuilder {
    const FRONDS: u32 = 5;

    let leaf = frond(color);
    let mut crown = MeshBuilder::default();
    for i in 0..FRONDS {
        let angle = i as f32 / FRONDS as f32 * TAU + rng.gen::<f32>() * 0.5;
        let droop = rng.gen::<f32>() * 0.2 + 0.6;
        let rotation = Quat::from_euler(EulerRot::XYZ, 0.0, angle, droop);
        crown.append_transformed(&leaf, &Transform::from_rotation(rotation));
    }
    crown
}

/// Lumpy icosphere darkened where the noise pushes it outward.
fn stone(noise: &SimplexNoise, frequency: f32, lumpiness: f32, darkening: f32) -> MeshBuilder {
    let light = hex_color(0x808080);
    let dark = hex_color(0x5a5a5a);

    let mut stone = icosphere(1.0, 1, light);
    stone.map_colors(|p, _| {
        let n = noise.get(p.xy() * frequency);
        light.lerp(dark, (n + 1.0) / 2.0 * darkening)
    });
    stone.map_positions(|p| p * (1.0 + noise.get(p.xy() * frequency) * lumpiness));
    stone.compute_normals();
    stone
}

fn coral(rng: &mut Pcg32, color: Vec3) -> MeshBuilder {
    const BRANCHES: u32 = 10;

    let mut coral = frustum(0.2, 0.3, 3.0, 6, 1, color);
    coral.apply_translation(Vec3::Y * -1.5);

    let branch = frustum(0.1, 0.2, 1.5, 6, 1, color);
    for _ in 0..BRANCHES {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            rng.gen::<f32>() * PI / 2.0,
            rng.gen::<f32>() * TAU,
            rng.gen::<f32>() * PI / 2.0,
        );
        let lift = (rng.gen::<f32>() - 0.5) * 1.5;
        let transform = Transform::from_xyz(0.0, lift, 0.0).with_rotation(rotation);
        coral.append_transformed(&branch, &transform);
    }
    coral
}

/// Vertical strip, 1 wide and 8 tall, in ten rows.
fn seaweed(color: Vec3) -> MeshBuilder {
    const HEIGHT: f32 = 8.0;
    const ROWS: u32 = 10;

    let mut builder = MeshBuilder::default();
    for row in 0..=ROWS {
        let y = row as f32 / ROWS as f32 * HEIGHT;
        builder.vertex(Vec3::new(-0.5, y, 0.0), color);
        builder.vertex(Vec3::new(0.5, y, 0.0), color);
    }
    for row in 0..ROWS {
        let a = row * 2;
        builder.quad_indices(a, a + 1, a + 3, a + 2);
    }
    builder.compute_normals();
    builder
}

/// Three crossed blades sharing a base.
fn grass_clump(color: Vec3) -> MeshBuilder {
    const WIDTH: f32 = 0.3;
    const HEIGHT: f32 = 2.5;

    let mut blade = MeshBuilder::default();
    blade.quad(
        Vec3::new(-WIDTH / 2.0, 0.0, 0.0),
        Vec3::new(WIDTH / 2.0, 0.0, 0.0),
        Vec3::new(WIDTH / 2.0, HEIGHT, 0.0),
        Vec3::new(-WIDTH / 2.0, HEIGHT, 0.0),
        color,
    );
    blade.compute_normals();

    let mut clump = MeshBuilder::default();
    for angle in [0.0, PI / 3.0, -PI / 3.0] {
        clump.append_transformed(&blade, &Transform::from_rotation(Quat::from_rotation_y(angle)));
    }
    clump
}

/// The shared cloud shape in cloud-local space, undersides shaded.
pub fn cloud_template(bank: &CloudBank) -> MeshBuilder {
    let white = Vec3::ONE;
    let shadow = hex_color(0x777777);

    let mut cloud = MeshBuilder::default();
    for puff in &bank.puffs {
        let mut sphere = icosphere(1.0, 2, white);
        sphere.radial_normals();
        sphere.apply_scale(Vec3::splat(puff.radius));
        sphere.apply_translation(puff.offset);
        sphere.map_colors(|p, c| c.lerp(shadow, bank.shade(p.y, puff.radius)));
        cloud.append(&sphere);
    }
    cloud
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centroid(builder: &MeshBuilder, tri: &[u32]) -> Vec3 {
        tri.iter()
            .map(|&i| builder.positions()[i as usize])
            .sum::<Vec3>()
            / 3.0
    }

    fn face_normal(builder: &MeshBuilder, tri: &[u32]) -> Vec3 {
        let [a, b, c] = [0, 1, 2].map(|k| builder.positions()[tri[k] as usize]);
        (b - a).cross(c - a)
    }

    #[test]
    fn icosphere_faces_point_outward() {
        for detail in 0..3 {
            let sphere = icosphere(2.0, detail, Vec3::ONE);
            assert_eq!(sphere.triangle_count(), 20 * ((detail + 1) * (detail + 1)) as usize);

            for tri in sphere.indices().chunks(3) {
                assert!(face_normal(&sphere, tri).dot(centroid(&sphere, tri)) > 0.0);
            }
            for pos in sphere.positions() {
                assert!((pos.length() - 2.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn frustum_walls_point_outward() {
        let trunk = frustum(0.8, 1.2, 20.0, 8, 1, Vec3::ONE);

        let ys = trunk.positions().iter().map(|p| p.y);
        assert_eq!(ys.clone().fold(f32::MAX, f32::min), 0.0);
        assert_eq!(ys.fold(f32::MIN, f32::max), 20.0);

        let center = Vec3::Y * 10.0;
        for tri in trunk.indices().chunks(3) {
            let normal = face_normal(&trunk, tri);
            if normal.length() > 1e-6 {
                assert!(normal.dot(centroid(&trunk, tri) - center) > 0.0);
            }
        }
    }

    #[test]
    fn palm_trunk_bends_but_ends_centered() {
        let trunk = palm_trunk(Vec3::ONE);
        let max_x = trunk
            .positions()
            .iter()
            .map(|p| p.x)
            .fold(f32::MIN, f32::max);
        assert!(max_x > 3.0);

        for pos in trunk.positions() {
            if pos.y == 0.0 || (pos.y - 28.0).abs() < 1e-4 {
                assert!(pos.xz().length() <= 0.9 + 1e-4);
            }
        }
    }

    #[test]
    fn frond_tapers_to_a_tip() {
        let leaf = frond(Vec3::ONE);
        assert_eq!(leaf.vertex_count(), 18);
        assert_eq!(leaf.triangle_count(), 16);

        let tip = leaf.positions()[8];
        assert!((tip - Vec3::new(16.0, -5.0, 0.0)).length() < 1e-4);
        assert!(leaf.positions()[0].length() < 1e-6);
    }

    #[test]
    fn grass_clump_has_three_blades() {
        let grass = grass_clump(Vec3::ONE);
        assert_eq!(grass.vertex_count(), 12);
        assert_eq!(grass.triangle_count(), 6);
        for pos in grass.positions() {
            assert!(pos.y.abs() < 1e-5 || (pos.y - 2.5).abs() < 1e-5);
        }
    }

    #[test]
    fn stones_are_lumpy_and_shaded() {
        let templates = PropTemplates::new(11).unwrap();
        let rock = templates.get(PropPart::Rock);

        let lengths = rock.positions().iter().map(|p| p.length());
        assert!(lengths.clone().all(|l| (0.7 - 1e-4..=1.3 + 1e-4).contains(&l)));
        assert!(lengths.clone().fold(f32::MIN, f32::max) - lengths.fold(f32::MAX, f32::min) > 0.01);

        let first = rock.colors()[0];
        assert!(rock.colors().iter().any(|c| *c != first));
    }

    #[test]
    fn templates_are_seeded() {
        let a = PropTemplates::new(3).unwrap();
        let b = PropTemplates::new(3).unwrap();
        let c = PropTemplates::new(4).unwrap();

        for part in PropPart::ALL {
            assert!(!a.get(part).is_empty(), "{part:?}");
            assert_eq!(a.get(part).positions(), b.get(part).positions());
        }
        assert_ne!(
            a.get(PropPart::Coral).positions(),
            c.get(PropPart::Coral).positions()
        );
    }

    #[test]
    fn cloud_undersides_are_darker() {
        let bank = CloudBank {
            puffs: vec![isle_worldgen::CloudPuff {
                offset: Vec3::ZERO,
                radius: 4.0,
            }],
            instances: vec![],
            underside_shade: 0.15,
        };
        let cloud = cloud_template(&bank);

        for (pos, color) in cloud.positions().iter().zip(cloud.colors()) {
            if pos.y >= 0.0 {
                assert_eq!(*color, Vec3::ONE);
            } else if pos.y < -1.0 {
                assert!(color.x < 1.0);
            }
        }
    }
}
