use std::f32::consts::{PI, TAU};

use bevy::prelude::*;
use rand::Rng;

use super::{Placements, Prop, PropPart};

const PINE_TRUNK_HEIGHT: f32 = 20.0;
const REGULAR_TRUNK_HEIGHT: f32 = 16.0;
const REGULAR_FOLIAGE_SINK: f32 = 0.9;

/// Jitters an accepted prop rooted at `ground` and appends one transform per
/// part. Parts of one prop share their yaw and scale.
pub fn synthesize_prop<R: Rng + ?Sized>(
    prop: Prop,
    ground: Vec3,
    rng: &mut R,
    out: &mut Placements,
) {
    match prop {
        Prop::PineTree => tree(
            rng,
            out,
            ground,
            [PropPart::PineTrunk, PropPart::PineFoliage],
            PINE_TRUNK_HEIGHT,
        ),
        Prop::RegularTree => tree(
            rng,
            out,
            ground,
            [PropPart::RegularTrunk, PropPart::RegularFoliage],
            REGULAR_TRUNK_HEIGHT * REGULAR_FOLIAGE_SINK,
        ),
        Prop::Palm => {
            let trunk_height = rng.gen_range(24.0..32.0);
            let scale = rng.gen_range(0.8..1.2);
            let rotation = yaw(rng);

            let trunk = Transform {
                translation: ground,
                rotation,
                scale: Vec3::splat(scale),
            };
            out.push(PropPart::PalmTrunk, trunk);

            let crown = ground + Vec3::Y * (trunk_height - 1.0) * scale;
            out.push(PropPart::PalmFrond, trunk.with_translation(crown));
        }
        Prop::Grass => {
            let scale = rng.gen_range(1.0..1.8);
            out.push(
                PropPart::Grass,
                Transform {
                    translation: ground,
                    rotation: yaw(rng),
                    scale: Vec3::splat(scale),
                },
            );
        }
        Prop::Rock => {
            let scale = rng.gen_range(1.5..4.5);
            let rotation = tumble(rng);
            let squash = rng.gen_range(0.8..1.2);
            out.push(
                PropPart::Rock,
                Transform {
                    translation: ground - Vec3::Y * 0.5,
                    rotation,
                    scale: Vec3::new(scale, scale * squash, scale),
                },
            );
        }
        Prop::Boulder => {
            let scale = rng.gen_range(8.0..16.0);
            let rotation = tumble(rng);
            let sy = rng.gen_range(0.7..1.3);
            let sz = rng.gen_range(0.7..1.3);
            out.push(
                PropPart::Boulder,
                Transform {
                    translation: ground,
                    rotation,
                    scale: Vec3::new(scale, scale * sy, scale * sz),
                },
            );
        }
        Prop::Coral => {
            let scale = rng.gen_range(1.0..2.5);
            out.push(
                PropPart::Coral,
                Transform {
                    translation: ground - Vec3::Y,
                    rotation: yaw(rng),
                    scale: Vec3::splat(scale),
                },
            );
        }
        Prop::Seaweed => {
            let rotation = yaw(rng);
            let height = rng.gen_range(0.5..1.0);
            out.push(
                PropPart::Seaweed,
                Transform {
                    translation: ground,
                    rotation,
                    scale: Vec3::new(1.0, height, 1.0),
                },
            );
        }
    }
}

fn tree<R: Rng + ?Sized>(
    rng: &mut R,
    out: &mut Placements,
    ground: Vec3,
    [trunk_part, foliage_part]: [PropPart; 2],
    foliage_offset: f32,
) {
    let scale = rng.gen_range(0.9..1.4);
    let trunk = Transform {
        translation: ground,
        rotation: yaw(rng),
        scale: Vec3::splat(scale),
    };

    out.push(trunk_part, trunk);
    out.push(
        foliage_part,
        trunk.with_translation(ground + Vec3::Y * foliage_offset * scale),
    );
}

fn yaw<R: Rng + ?Sized>(rng: &mut R) -> Quat {
    Quat::from_rotation_y(rng.gen_range(0.0..TAU))
}

fn tumble<R: Rng + ?Sized>(rng: &mut R) -> Quat {
    let x = rng.gen_range(0.0..PI);
    let y = rng.gen_range(0.0..PI);
    let z = rng.gen_range(0.0..PI);
    Quat::from_euler(EulerRot::XYZ, x, y, z)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;

    const ALL_PROPS: [Prop; 8] = [
        Prop::Boulder,
        Prop::Rock,
        Prop::Coral,
        Prop::Seaweed,
        Prop::Palm,
        Prop::PineTree,
        Prop::RegularTree,
        Prop::Grass,
    ];

    #[test]
    fn every_part_is_emitted() {
        let mut rng = Pcg32::seed_from_u64(0);

        for prop in ALL_PROPS {
            let mut out = Placements::default();
            synthesize_prop(prop, Vec3::new(3.0, 40.0, -2.0), &mut rng, &mut out);

            assert_eq!(out.len(), prop.parts().len());
            for &part in prop.parts() {
                assert_eq!(out.get(part).len(), 1, "{prop:?} missing {part:?}");
            }
        }
    }

    #[test]
    fn trees_share_yaw_and_scale() {
        let mut rng = Pcg32::seed_from_u64(5);
        let ground = Vec3::new(10.0, 50.0, 10.0);

        for _ in 0..100 {
            let mut out = Placements::default();
            synthesize_prop(Prop::PineTree, ground, &mut rng, &mut out);
            synthesize_prop(Prop::RegularTree, ground, &mut rng, &mut out);

            for (trunk, foliage, offset) in [
                (PropPart::PineTrunk, PropPart::PineFoliage, 20.0),
                (PropPart::RegularTrunk, PropPart::RegularFoliage, 14.4),
            ] {
                let trunk = out.get(trunk)[0].transform;
                let foliage = out.get(foliage)[0].transform;

                assert_eq!(trunk.translation, ground);
                assert_eq!(trunk.rotation, foliage.rotation);
                assert_eq!(trunk.scale, foliage.scale);

                let s = trunk.scale.x;
                assert!((0.9..1.4).contains(&s));
                let rise = foliage.translation.y - ground.y;
                assert!((rise - offset * s).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn jitter_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(9);
        let ground = Vec3::new(0.0, 5.0, 0.0);
        let mut out = Placements::default();

        for _ in 0..200 {
            for prop in ALL_PROPS {
                synthesize_prop(prop, ground, &mut rng, &mut out);
            }
        }

        for rock in out.get(PropPart::Rock) {
            let t = rock.transform;
            assert_eq!(t.translation.y, 4.5);
            assert!((1.5..4.5).contains(&t.scale.x));
            assert_eq!(t.scale.x, t.scale.z);
            assert!(t.scale.y >= t.scale.x * 0.8 - 1e-4 && t.scale.y <= t.scale.x * 1.2 + 1e-4);
        }

        for boulder in out.get(PropPart::Boulder) {
            let s = boulder.transform.scale;
            assert!((8.0..16.0).contains(&s.x));
            assert!(s.y >= s.x * 0.7 - 1e-4 && s.y <= s.x * 1.3 + 1e-4);
            assert!(s.z >= s.x * 0.7 - 1e-4 && s.z <= s.x * 1.3 + 1e-4);
        }

        for coral in out.get(PropPart::Coral) {
            assert_eq!(coral.transform.translation.y, 4.0);
            assert!((1.0..2.5).contains(&coral.transform.scale.x));
        }

        for seaweed in out.get(PropPart::Seaweed) {
            let s = seaweed.transform.scale;
            assert_eq!((s.x, s.z), (1.0, 1.0));
            assert!((0.5..1.0).contains(&s.y));
        }

        for grass in out.get(PropPart::Grass) {
            assert!((1.0..1.8).contains(&grass.transform.scale.x));
        }

        let trunks = out.get(PropPart::PalmTrunk);
        let fronds = out.get(PropPart::PalmFrond);
        assert_eq!(trunks.len(), fronds.len());
        for (trunk, frond) in trunks.iter().zip(fronds) {
            let s = trunk.transform.scale.x;
            assert!((0.8..1.2).contains(&s));
            let height = (frond.transform.translation.y - ground.y) / s + 1.0;
            assert!(height > 23.99 && height < 32.01, "trunk height {height}");
        }
    }

    #[test]
    fn same_stream_same_props() {
        let run = || {
            let mut rng = Pcg32::seed_from_u64(21);
            let mut out = Placements::default();
            for prop in ALL_PROPS {
                synthesize_prop(prop, Vec3::ZERO, &mut rng, &mut out);
            }
            out
        };

        let (a, b) = (run(), run());
        for part in PropPart::ALL {
            assert_eq!(a.get(part), b.get(part));
        }
    }
}
