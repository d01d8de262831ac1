mod field;
mod simplex;

use bevy::math::Vec2;
use thiserror::Error;

pub use crate::field::{NoiseChannel, NoiseField};
pub use crate::simplex::SimplexNoise;

/// Coherent 2D noise returning values in `[-1, 1]`.
pub trait Noise {
    fn get(&self, pos: Vec2) -> f32;

    /// The same value remapped into `[0, 1]`.
    fn get01(&self, pos: Vec2) -> f32 {
        (self.get(pos) + 1.0) * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoiseError {
    #[error("gradient table for {channel:?} degenerated after {attempts} redraws")]
    DegenerateGradients {
        channel: Option<NoiseChannel>,
        attempts: u32,
    },
}
