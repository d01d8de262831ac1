#![allow(clippy::excessive_precision)]

use std::num::Wrapping;

use bevy::math::Vec2;
use rand::Rng;

use crate::{Noise, NoiseError};

const PRIME_X: Wrapping<i64> = Wrapping(0x5205402B9270C86F);
const PRIME_Y: Wrapping<i64> = Wrapping(0x598CD327003817B5);
const HASH_PRIME: Wrapping<i64> = Wrapping(0x53A3F72DEEC546F5);

const RSQUARED_2D: f32 = 2.0 / 3.0;
const SKEW_2D: f32 = 0.366025403784439;
const UNSKEW_2D: f32 = -0.21132486540518713;
const NORMALIZER_2D: f32 = 0.05481866495625118;

const TABLE_SIZE: usize = 256;
const MAX_REDRAWS: u32 = 64;

/// Seeded 2D super-simplex noise.
#[derive(Debug, Clone)]
pub struct SimplexNoise {
    grads: Box<[[f32; 2]; TABLE_SIZE]>,
}

impl SimplexNoise {
    /// Draws a gradient table from `rng`.
    ///
    /// A zero-length gradient cannot be normalized, so such draws are
    /// repeated. Only a broken random source can exhaust the redraw budget.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Result<SimplexNoise, NoiseError> {
        let mut grads = Box::new([[0.0; 2]; TABLE_SIZE]);

        for grad in grads.iter_mut() {
            *grad = random_gradient(rng)?;
        }

        Ok(SimplexNoise { grads })
    }

    fn base(&self, xs: f32, ys: f32) -> f32 {
        let xsb = Wrapping(xs.floor() as i64);
        let ysb = Wrapping(ys.floor() as i64);
        let xi = xs - xsb.0 as f32;
        let yi = ys - ysb.0 as f32;

        let xsbp = xsb * PRIME_X;
        let ysbp = ysb * PRIME_Y;

        let t = (xi + yi) * UNSKEW_2D;
        let dx0 = xi + t;
        let dy0 = yi + t;

        let mut value = self.contribution(xsbp, ysbp, dx0, dy0);

        let dx1 = dx0 - (1.0 + 2.0 * UNSKEW_2D);
        let dy1 = dy0 - (1.0 + 2.0 * UNSKEW_2D);
        value += self.contribution(xsbp + PRIME_X, ysbp + PRIME_Y, dx1, dy1);

        // The remaining two lattice vertices depend on which half of the
        // skewed cell the point falls in.
        let xmyi = xi - yi;
        if t < UNSKEW_2D {
            value += if xi + xmyi > 1.0 {
                self.contribution(
                    xsbp + (PRIME_X << 1),
                    ysbp + PRIME_Y,
                    dx0 - (3.0 * UNSKEW_2D + 2.0),
                    dy0 - (3.0 * UNSKEW_2D + 1.0),
                )
            } else {
                self.contribution(
                    xsbp,
                    ysbp + PRIME_Y,
                    dx0 - UNSKEW_2D,
                    dy0 - (UNSKEW_2D + 1.0),
                )
            };

            value += if yi - xmyi > 1.0 {
                self.contribution(
                    xsbp + PRIME_X,
                    ysbp + (PRIME_Y << 1),
                    dx0 - (3.0 * UNSKEW_2D + 1.0),
                    dy0 - (3.0 * UNSKEW_2D + 2.0),
                )
            } else {
                self.contribution(
                    xsbp + PRIME_X,
                    ysbp,
                    dx0 - (UNSKEW_2D + 1.0),
                    dy0 - UNSKEW_2D,
                )
            };
        } else {
            value += if xi + xmyi < 0.0 {
                self.contribution(
                    xsbp - PRIME_X,
                    ysbp,
                    dx0 + (1.0 + UNSKEW_2D),
                    dy0 + UNSKEW_2D,
                )
            } else {
                self.contribution(
                    xsbp + PRIME_X,
                    ysbp,
                    dx0 - (UNSKEW_2D + 1.0),
                    dy0 - UNSKEW_2D,
                )
            };

            value += if yi < xmyi {
                self.contribution(
                    xsbp,
                    ysbp - PRIME_Y,
                    dx0 + UNSKEW_2D,
                    dy0 + (UNSKEW_2D + 1.0),
                )
            } else {
                self.contribution(
                    xsbp,
                    ysbp + PRIME_Y,
                    dx0 - UNSKEW_2D,
                    dy0 - (UNSKEW_2D + 1.0),
                )
            };
        }

        value
    }

    #[inline(always)]
    fn contribution(&self, xsvp: Wrapping<i64>, ysvp: Wrapping<i64>, dx: f32, dy: f32) -> f32 {
        let a = RSQUARED_2D - dx * dx - dy * dy;
        if a <= 0.0 {
            return 0.0;
        }

        let idx = ((xsvp ^ ysvp) * HASH_PRIME).0 & 0xff;
        let [gx, gy] = self.grads[idx as usize];
        (a * a) * (a * a) * (gx * dx + gy * dy)
    }
}

impl Noise for SimplexNoise {
    fn get(&self, pos: Vec2) -> f32 {
        let s = SKEW_2D * (pos.x + pos.y);
        self.base(pos.x + s, pos.y + s).clamp(-1.0, 1.0)
    }
}

fn random_gradient<R: Rng + ?Sized>(rng: &mut R) -> Result<[f32; 2], NoiseError> {
    for _ in 0..MAX_REDRAWS {
        let x = rng.gen_range(-1.0..=1.0);
        let y = rng.gen_range(-1.0..=1.0);

        if let Some(grad) = normalize_gradient(x, y) {
            return Ok(grad);
        }
    }

    Err(NoiseError::DegenerateGradients {
        channel: None,
        attempts: MAX_REDRAWS,
    })
}

fn normalize_gradient(x: f32, y: f32) -> Option<[f32; 2]> {
    let s = NORMALIZER_2D * f32::hypot(x, y);
    let grad = [x / s, y / s];
    (s > f32::EPSILON && grad.iter().all(|v| v.is_finite())).then_some(grad)
}
