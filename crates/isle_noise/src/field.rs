use bevy::math::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{Noise, NoiseError, SimplexNoise};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseChannel {
    Base,
    Mountain,
    Detail,
    IslandsMask,
    Tree,
    Grass,
    Palm,
    Rock,
    Boulder,
    Coral,
    Seaweed,
    Color,
}

impl NoiseChannel {
    /// Every channel in generation order. Reordering this changes every
    /// world generated from a given seed.
    pub const ALL: [NoiseChannel; 12] = [
        NoiseChannel::Base,
        NoiseChannel::Mountain,
        NoiseChannel::Detail,
        NoiseChannel::IslandsMask,
        NoiseChannel::Tree,
        NoiseChannel::Grass,
        NoiseChannel::Palm,
        NoiseChannel::Rock,
        NoiseChannel::Boulder,
        NoiseChannel::Coral,
        NoiseChannel::Seaweed,
        NoiseChannel::Color,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One independently seeded noise generator per [`NoiseChannel`].
#[derive(Debug, Clone)]
pub struct NoiseField {
    seed: u64,
    channels: Vec<SimplexNoise>,
}

impl NoiseField {
    pub fn new(seed: u64) -> Result<NoiseField, NoiseError> {
        let mut rng = Pcg32::seed_from_u64(seed);

        let channels = NoiseChannel::ALL
            .iter()
            .map(|&channel| {
                SimplexNoise::new(&mut rng).map_err(|err| match err {
                    NoiseError::DegenerateGradients { attempts, .. } => {
                        NoiseError::DegenerateGradients {
                            channel: Some(channel),
                            attempts,
                        }
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NoiseField { seed, channels })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn channel(&self, channel: NoiseChannel) -> &SimplexNoise {
        &self.channels[channel.index()]
    }

    /// Samples `channel` at `pos`, in `[-1, 1]`.
    #[inline]
    pub fn sample(&self, channel: NoiseChannel, pos: Vec2) -> f32 {
        self.channel(channel).get(pos)
    }

    /// Samples `channel` at `pos`, remapped into `[0, 1]`.
    #[inline]
    pub fn sample01(&self, channel: NoiseChannel, pos: Vec2) -> f32 {
        self.channel(channel).get01(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_order_matches_discriminants() {
        for (i, channel) in NoiseChannel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn fields_are_deterministic() {
        let a = NoiseField::new(42).unwrap();
        let b = NoiseField::new(42).unwrap();

        for channel in NoiseChannel::ALL {
            for i in 0..50 {
                let pos = Vec2::new(i as f32 * 1.3, i as f32 * -0.7);
                assert_eq!(a.sample(channel, pos), b.sample(channel, pos));
            }
        }
    }

    #[test]
    fn channels_are_independent() {
        let field = NoiseField::new(5).unwrap();
        let points = (0..500)
            .map(|i| Vec2::new((i % 25) as f32 * 0.61, (i / 25) as f32 * 0.61))
            .collect::<Vec<_>>();

        let tree = points
            .iter()
            .map(|&p| field.sample(NoiseChannel::Tree, p))
            .collect::<Vec<_>>();
        let rock = points
            .iter()
            .map(|&p| field.sample(NoiseChannel::Rock, p))
            .collect::<Vec<_>>();

        assert_ne!(tree, rock);
        assert!(correlation(&tree, &rock).abs() < 0.3);
    }

    fn correlation(a: &[f32], b: &[f32]) -> f32 {
        let n = a.len() as f32;
        let mean_a = a.iter().sum::<f32>() / n;
        let mean_b = b.iter().sum::<f32>() / n;

        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (x, y) in a.iter().zip(b) {
            cov += (x - mean_a) * (y - mean_b);
            var_a += (x - mean_a).powi(2);
            var_b += (y - mean_b).powi(2);
        }

        cov / (var_a.sqrt() * var_b.sqrt())
    }
}
