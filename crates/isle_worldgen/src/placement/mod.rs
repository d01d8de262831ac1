mod props;

use bevy::math::Vec3Swizzles;
use bevy::prelude::*;
use bevy::utils::HashMap;
use isle_noise::{NoiseChannel, NoiseField};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::ensure_finite;
use crate::ConfigError;

pub use self::props::synthesize_prop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prop {
    Boulder,
    Rock,
    Coral,
    Seaweed,
    Palm,
    PineTree,
    RegularTree,
    Grass,
}

impl Prop {
    pub fn parts(self) -> &'static [PropPart] {
        match self {
            Prop::Boulder => &[PropPart::Boulder],
            Prop::Rock => &[PropPart::Rock],
            Prop::Coral => &[PropPart::Coral],
            Prop::Seaweed => &[PropPart::Seaweed],
            Prop::Palm => &[PropPart::PalmTrunk, PropPart::PalmFrond],
            Prop::PineTree => &[PropPart::PineTrunk, PropPart::PineFoliage],
            Prop::RegularTree => &[PropPart::RegularTrunk, PropPart::RegularFoliage],
            Prop::Grass => &[PropPart::Grass],
        }
    }
}

/// One drawable piece of a prop; every part is batched separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropPart {
    PineTrunk,
    PineFoliage,
    RegularTrunk,
    RegularFoliage,
    PalmTrunk,
    PalmFrond,
    Rock,
    Boulder,
    Coral,
    Seaweed,
    Grass,
}

impl PropPart {
    pub const ALL: [PropPart; 11] = [
        PropPart::PineTrunk,
        PropPart::PineFoliage,
        PropPart::RegularTrunk,
        PropPart::RegularFoliage,
        PropPart::PalmTrunk,
        PropPart::PalmFrond,
        PropPart::Rock,
        PropPart::Boulder,
        PropPart::Coral,
        PropPart::Seaweed,
        PropPart::Grass,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementInstance {
    pub part: PropPart,
    pub transform: Transform,
}

/// Placement instances bucketed by part.
#[derive(Debug, Clone, Default)]
pub struct Placements {
    buckets: HashMap<PropPart, Vec<PlacementInstance>>,
}

impl Placements {
    pub fn push(&mut self, part: PropPart, transform: Transform) {
        self.buckets
            .entry(part)
            .or_default()
            .push(PlacementInstance { part, transform });
    }

    pub fn get(&self, part: PropPart) -> &[PlacementInstance] {
        self.buckets
            .get(&part)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Non-empty buckets in [`PropPart::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (PropPart, &[PlacementInstance])> + '_ {
        PropPart::ALL
            .into_iter()
            .map(move |part| (part, self.get(part)))
            .filter(|(_, instances)| !instances.is_empty())
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn append(&mut self, other: Placements) {
        for (part, mut instances) in other.buckets {
            self.buckets.entry(part).or_default().append(&mut instances);
        }
    }
}

/// A height, either absolute or relative to the water level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Level {
    Absolute(f32),
    Water(f32),
}

impl Level {
    #[inline]
    pub fn resolve(self, water_level: f32) -> f32 {
        match self {
            Level::Absolute(v) => v,
            Level::Water(offset) => water_level + offset,
        }
    }

    fn raw(self) -> f32 {
        match self {
            Level::Absolute(v) | Level::Water(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ElevationGate {
    /// `h > level`
    Above(Level),
    /// `h <= level`
    AtMost(Level),
    /// `lo < h < hi`
    Between(Level, Level),
    /// `lo <= h < hi`
    HalfOpen(Level, Level),
    /// `h < lo || h > hi`
    Outside(Level, Level),
}

impl ElevationGate {
    pub fn admits(&self, height: f32, water_level: f32) -> bool {
        let r = |level: Level| level.resolve(water_level);
        match *self {
            ElevationGate::Above(l) => height > r(l),
            ElevationGate::AtMost(l) => height <= r(l),
            ElevationGate::Between(lo, hi) => height > r(lo) && height < r(hi),
            ElevationGate::HalfOpen(lo, hi) => height >= r(lo) && height < r(hi),
            ElevationGate::Outside(lo, hi) => height < r(lo) || height > r(hi),
        }
    }

    fn levels(&self) -> (Level, Option<Level>) {
        match *self {
            ElevationGate::Above(l) | ElevationGate::AtMost(l) => (l, None),
            ElevationGate::Between(lo, hi)
            | ElevationGate::HalfOpen(lo, hi)
            | ElevationGate::Outside(lo, hi) => (lo, Some(hi)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SlopeGate {
    Any,
    Below(f32),
    Above(f32),
}

impl SlopeGate {
    pub fn admits(&self, slope: f32) -> bool {
        match *self {
            SlopeGate::Any => true,
            SlopeGate::Below(v) => slope < v,
            SlopeGate::Above(v) => slope > v,
        }
    }
}

/// Passes where the channel, sampled at `pos / scale` and remapped into
/// `[0, 1]`, exceeds `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityGate {
    pub channel: NoiseChannel,
    pub scale: f32,
    pub threshold: f32,
}

impl DensityGate {
    pub fn sample(&self, noise: &NoiseField, pos: Vec2) -> f32 {
        noise.sample01(self.channel, pos / self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRule {
    pub prop: Prop,
    /// All gates must pass.
    pub elevation: Vec<ElevationGate>,
    pub slope: SlopeGate,
    pub density: Option<DensityGate>,
    pub probability: f32,
}

impl PlacementRule {
    /// Checks every gate except the random draw.
    pub fn admits(
        &self,
        point: &SamplePoint,
        water_level: f32,
        density: impl FnOnce(&DensityGate, Vec2) -> f32,
    ) -> bool {
        let height = point.position.y;

        self.elevation
            .iter()
            .all(|gate| gate.admits(height, water_level))
            && self.slope.admits(point.slope)
            && self
                .density
                .as_ref()
                .map_or(true, |gate| density(gate, point.position.xz()) > gate.threshold)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ConfigError::InvalidProbability {
                prop: self.prop,
                value: self.probability,
            });
        }

        if let Some(gate) = &self.density {
            if !gate.scale.is_finite() || gate.scale <= 0.0 {
                return Err(ConfigError::InvalidDensityScale {
                    prop: self.prop,
                    scale: gate.scale,
                });
            }
            ensure_finite("density threshold", gate.threshold)?;
        }

        for gate in &self.elevation {
            let (lo, hi) = gate.levels();
            for level in std::iter::once(lo).chain(hi) {
                ensure_finite("elevation gate level", level.raw())?;
            }
        }

        if let SlopeGate::Below(v) | SlopeGate::Above(v) = self.slope {
            ensure_finite("slope gate", v)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub position: Vec3,
    pub slope: f32,
}

/// Runs an ordered rule list over sample points. A point may pass several
/// rules and so emit several props.
#[derive(Debug, Clone, Copy)]
pub struct PlacementEngine<'a> {
    pub rules: &'a [PlacementRule],
    pub water_level: f32,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(rules: &'a [PlacementRule], water_level: f32) -> Self {
        PlacementEngine { rules, water_level }
    }

    /// Evaluates the rules with noise-backed density gates and `rng`-backed
    /// acceptance, appending the transforms of every accepted prop to `out`.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        point: &SamplePoint,
        noise: &NoiseField,
        rng: &mut R,
        out: &mut Placements,
    ) {
        for rule in self.rules {
            let admitted =
                rule.admits(point, self.water_level, |gate, pos| gate.sample(noise, pos));
            if admitted && rng.gen::<f32>() < rule.probability {
                synthesize_prop(rule.prop, point.position, rng, out);
            }
        }
    }

    /// Evaluates the rules with caller-supplied density and acceptance,
    /// returning the accepted props in rule order.
    pub fn evaluate_with(
        &self,
        point: &SamplePoint,
        mut density: impl FnMut(&DensityGate, Vec2) -> f32,
        mut accept: impl FnMut(&PlacementRule) -> bool,
    ) -> Vec<Prop> {
        self.rules
            .iter()
            .filter(|rule| rule.admits(point, self.water_level, &mut density) && accept(*rule))
            .map(|rule| rule.prop)
            .collect()
    }
}

pub fn default_rules() -> Vec<PlacementRule> {
    use ElevationGate::*;
    use Level::*;

    let density = |channel, scale, threshold| {
        Some(DensityGate {
            channel,
            scale,
            threshold,
        })
    };

    vec![
        PlacementRule {
            prop: Prop::Boulder,
            elevation: vec![Outside(Water(-15.0), Absolute(120.0))],
            slope: SlopeGate::Any,
            density: density(NoiseChannel::Boulder, 150.0, 0.65),
            probability: 0.08,
        },
        PlacementRule {
            prop: Prop::Rock,
            elevation: vec![Above(Water(5.0))],
            slope: SlopeGate::Above(0.25),
            density: None,
            probability: 0.8,
        },
        PlacementRule {
            prop: Prop::Coral,
            elevation: vec![HalfOpen(Water(-15.0), Water(-8.0))],
            slope: SlopeGate::Below(0.2),
            density: density(NoiseChannel::Coral, 40.0, 0.7),
            probability: 0.1,
        },
        PlacementRule {
            prop: Prop::Seaweed,
            elevation: vec![HalfOpen(Water(-25.0), Water(-8.0))],
            slope: SlopeGate::Below(0.3),
            density: density(NoiseChannel::Seaweed, 20.0, 0.5),
            probability: 0.3,
        },
        PlacementRule {
            prop: Prop::Palm,
            elevation: vec![Between(Water(0.0), Water(10.0))],
            slope: SlopeGate::Below(0.2),
            density: density(NoiseChannel::Palm, 50.0, 0.8),
            probability: 0.02,
        },
        PlacementRule {
            prop: Prop::PineTree,
            elevation: vec![
                Between(Water(8.0), Absolute(100.0)),
                Above(Absolute(70.0)),
            ],
            slope: SlopeGate::Below(0.4),
            density: density(NoiseChannel::Tree, 150.0, 0.6),
            probability: 0.015,
        },
        PlacementRule {
            prop: Prop::RegularTree,
            elevation: vec![
                Between(Water(8.0), Absolute(100.0)),
                AtMost(Absolute(70.0)),
            ],
            slope: SlopeGate::Below(0.4),
            density: density(NoiseChannel::Tree, 150.0, 0.6),
            probability: 0.012,
        },
        PlacementRule {
            prop: Prop::Grass,
            elevation: vec![Between(Water(2.0), Absolute(120.0))],
            slope: SlopeGate::Below(0.5),
            density: density(NoiseChannel::Grass, 10.0, 0.4),
            probability: 0.25,
        },
    ]
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;

    const WL: f32 = 10.0;

    /// Direct restatement of the placement table.
    fn expected(h: f32, slope: f32) -> Vec<Prop> {
        let mut props = Vec::new();
        if h > 120.0 || h < WL - 15.0 {
            props.push(Prop::Boulder);
        }
        if h > WL + 5.0 && slope > 0.25 {
            props.push(Prop::Rock);
        }
        if h >= WL - 15.0 && h < WL - 8.0 && slope < 0.2 {
            props.push(Prop::Coral);
        }
        if h >= WL - 25.0 && h < WL - 8.0 && slope < 0.3 {
            props.push(Prop::Seaweed);
        }
        if h > WL && h < WL + 10.0 && slope < 0.2 {
            props.push(Prop::Palm);
        }
        if h > WL + 8.0 && h < 100.0 && slope < 0.4 {
            props.push(if h > 70.0 {
                Prop::PineTree
            } else {
                Prop::RegularTree
            });
        }
        if h > WL + 2.0 && h < 120.0 && slope < 0.5 {
            props.push(Prop::Grass);
        }
        props
    }

    #[test]
    fn gates_match_table() {
        let rules = default_rules();
        let engine = PlacementEngine::new(&rules, WL);
        let mut rng = Pcg32::seed_from_u64(17);

        for _ in 0..10_000 {
            let point = SamplePoint {
                position: Vec3::new(
                    rng.gen_range(-1000.0..1000.0),
                    rng.gen_range(-60.0..260.0),
                    rng.gen_range(-1000.0..1000.0),
                ),
                slope: rng.gen_range(0.0..1.0),
            };

            let props = engine.evaluate_with(&point, |_, _| 1.0, |_| true);
            assert_eq!(
                props,
                expected(point.position.y, point.slope),
                "at {point:?}"
            );
        }
    }

    #[test]
    fn boundaries_are_exact() {
        let rules = default_rules();
        let engine = PlacementEngine::new(&rules, WL);
        let props = |h: f32, slope: f32| {
            let point = SamplePoint {
                position: Vec3::new(0.0, h, 0.0),
                slope,
            };
            engine.evaluate_with(&point, |_, _| 1.0, |_| true)
        };

        // coral band is closed below, open above
        assert!(props(WL - 15.0, 0.0).contains(&Prop::Coral));
        assert!(!props(WL - 8.0, 0.0).contains(&Prop::Coral));
        // palms need strictly dry ground
        assert!(!props(WL, 0.0).contains(&Prop::Palm));
        // 70 is still a broadleaf tree
        assert!(props(70.0, 0.0).contains(&Prop::RegularTree));
        assert!(props(70.01, 0.0).contains(&Prop::PineTree));
        assert!(!props(100.0, 0.0).contains(&Prop::PineTree));
        assert!(!props(120.0, 0.0).contains(&Prop::Boulder));
        assert!(props(120.01, 0.0).contains(&Prop::Boulder));
    }

    #[test]
    fn flat_peaks_never_grow_rock() {
        let rules = default_rules();
        let engine = PlacementEngine::new(&rules, WL);
        let noise = NoiseField::new(3).unwrap();
        let mut rng = Pcg32::seed_from_u64(3);

        for i in 0..2_000 {
            let point = SamplePoint {
                position: Vec3::new(i as f32 * 3.0, 200.0, i as f32 * -2.0),
                slope: 0.1,
            };

            let mut out = Placements::default();
            engine.evaluate(&point, &noise, &mut rng, &mut out);
            assert!(out.get(PropPart::Rock).is_empty());

            let props = engine.evaluate_with(&point, |_, _| 1.0, |_| true);
            assert!(!props.contains(&Prop::Rock));
        }
    }

    #[test]
    fn density_gates_filter() {
        let rules = default_rules();
        let engine = PlacementEngine::new(&rules, WL);
        let point = SamplePoint {
            position: Vec3::new(0.0, 50.0, 0.0),
            slope: 0.0,
        };

        let open = engine.evaluate_with(&point, |_, _| 1.0, |_| true);
        assert_eq!(open, vec![Prop::RegularTree, Prop::Grass]);

        let closed = engine.evaluate_with(&point, |_, _| 0.0, |_| true);
        assert!(closed.is_empty());

        let grass_only = engine.evaluate_with(
            &point,
            |gate, _| if gate.channel == NoiseChannel::Grass { 1.0 } else { 0.0 },
            |_| true,
        );
        assert_eq!(grass_only, vec![Prop::Grass]);

        let rejected = engine.evaluate_with(&point, |_, _| 1.0, |rule| rule.prop != Prop::Grass);
        assert_eq!(rejected, vec![Prop::RegularTree]);
    }

    #[test]
    fn accepted_props_emit_every_part() {
        let rules = vec![PlacementRule {
            prop: Prop::PineTree,
            elevation: vec![],
            slope: SlopeGate::Any,
            density: None,
            probability: 1.0,
        }];
        let engine = PlacementEngine::new(&rules, WL);
        let noise = NoiseField::new(1).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut out = Placements::default();

        let point = SamplePoint {
            position: Vec3::new(5.0, 80.0, -5.0),
            slope: 0.0,
        };
        engine.evaluate(&point, &noise, &mut rng, &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(out.get(PropPart::PineTrunk).len(), 1);
        assert_eq!(out.get(PropPart::PineFoliage).len(), 1);
    }

    #[test]
    fn probabilities_are_validated() {
        let mut rules = default_rules();
        rules[0].probability = 1.5;
        assert!(matches!(
            rules[0].validate(),
            Err(ConfigError::InvalidProbability {
                prop: Prop::Boulder,
                ..
            })
        ));

        rules[0].probability = f32::NAN;
        assert!(rules[0].validate().is_err());

        let mut rules = default_rules();
        if let Some(gate) = &mut rules[2].density {
            gate.scale = 0.0;
        }
        assert!(matches!(
            rules[2].validate(),
            Err(ConfigError::InvalidDensityScale { .. })
        ));
    }

    #[test]
    fn gate_values_must_be_finite() {
        let mut rules = default_rules();
        if let Some(gate) = &mut rules[0].density {
            gate.threshold = f32::NAN;
        }
        assert!(matches!(
            rules[0].validate(),
            Err(ConfigError::NotFinite { name: "density threshold", .. })
        ));

        let mut rule = default_rules().remove(1);
        rule.slope = SlopeGate::Above(f32::NAN);
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::NotFinite { name: "slope gate", .. })
        ));

        rule.slope = SlopeGate::Any;
        rule.elevation = vec![ElevationGate::Between(
            Level::Water(0.0),
            Level::Absolute(f32::INFINITY),
        )];
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::NotFinite { name: "elevation gate level", .. })
        ));
    }

    #[test]
    fn placements_merge() {
        let mut a = Placements::default();
        a.push(PropPart::Grass, Transform::IDENTITY);

        let mut b = Placements::default();
        b.push(PropPart::Grass, Transform::from_xyz(1.0, 0.0, 0.0));
        b.push(PropPart::Coral, Transform::IDENTITY);

        a.append(b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(PropPart::Grass).len(), 2);
        assert_eq!(a.get(PropPart::Rock).len(), 0);

        let parts = a.iter().map(|(part, _)| part).collect::<Vec<_>>();
        assert_eq!(parts, vec![PropPart::Coral, PropPart::Grass]);
    }
}
