use std::sync::Arc;

use bevy::prelude::*;
use isle_noise::{NoiseChannel, NoiseField};
use serde::{Deserialize, Serialize};

use crate::settings::{ensure_finite, ensure_positive, ensure_range};
use crate::utils::{lerp, smoothstep};
use crate::{ConfigError, WorldGridSpec};

/// Frequencies are in cycles per world width.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightSettings {
    pub islands_frequency: f32,
    pub gradient_radius: f32,
    pub mask_low: f32,
    pub mask_high: f32,
    pub base_frequency: f32,
    pub base_amplitude: f32,
    pub mountain_frequency: f32,
    pub mountain_power: f32,
    pub mountain_amplitude: f32,
    pub detail_frequency: f32,
    pub detail_amplitude: f32,
    pub ocean_floor: f32,
    pub open_ocean_mask: f32,
    pub seabed_frequency: f32,
    pub seabed_amplitude: f32,
    pub beach_band: f32,
    pub beach_rest: f32,
    pub beach_strength: f32,
}

impl Default for HeightSettings {
    fn default() -> Self {
        HeightSettings {
            islands_frequency: 1.8,
            gradient_radius: 0.45,
            mask_low: 0.15,
            mask_high: 0.55,
            base_frequency: 0.5,
            base_amplitude: 100.0,
            mountain_frequency: 2.5,
            mountain_power: 3.0,
            mountain_amplitude: 250.0,
            detail_frequency: 15.0,
            detail_amplitude: 15.0,
            ocean_floor: -500.0,
            open_ocean_mask: 0.1,
            seabed_frequency: 5.0,
            seabed_amplitude: 5.0,
            beach_band: 6.0,
            beach_rest: 0.5,
            beach_strength: 0.75,
        }
    }
}

impl HeightSettings {
    /// Bounds every elevation the field can produce.
    pub fn elevation_range(&self) -> (f32, f32) {
        let land_low = -self.base_amplitude.abs() - self.detail_amplitude.abs();
        let land_high =
            self.base_amplitude.abs() + self.mountain_amplitude.abs() + self.detail_amplitude.abs();
        let seabed = self.seabed_amplitude.abs();

        (
            self.ocean_floor.min(land_low) - seabed,
            self.ocean_floor.max(land_high) + seabed,
        )
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("islands_frequency", self.islands_frequency)?;
        ensure_positive("gradient_radius", self.gradient_radius)?;
        ensure_positive("base_frequency", self.base_frequency)?;
        ensure_positive("mountain_frequency", self.mountain_frequency)?;
        ensure_positive("mountain_power", self.mountain_power)?;
        ensure_positive("detail_frequency", self.detail_frequency)?;
        ensure_positive("seabed_frequency", self.seabed_frequency)?;
        ensure_positive("beach_band", self.beach_band)?;
        ensure_range("island mask", self.mask_low, self.mask_high)?;
        ensure_finite("base_amplitude", self.base_amplitude)?;
        ensure_finite("mountain_amplitude", self.mountain_amplitude)?;
        ensure_finite("detail_amplitude", self.detail_amplitude)?;
        ensure_finite("ocean_floor", self.ocean_floor)?;
        ensure_finite("open_ocean_mask", self.open_ocean_mask)?;
        ensure_finite("seabed_amplitude", self.seabed_amplitude)?;
        ensure_finite("beach_rest", self.beach_rest)?;
        ensure_finite("beach_strength", self.beach_strength)?;

        let (min, max) = self.elevation_range();
        if !min.is_finite() || !max.is_finite() {
            return Err(ConfigError::EmptyRange {
                name: "elevation",
                min,
                max,
            });
        }

        Ok(())
    }
}

/// The single source of elevation for the whole world.
///
/// Nothing is cached: every query recomputes the height from the noise
/// channels, so the same `(x, z)` always yields the same value.
#[derive(Debug, Clone)]
pub struct HeightField {
    noise: Arc<NoiseField>,
    settings: HeightSettings,
    water_level: f32,
    world_size: f32,
}

impl HeightField {
    pub fn new(noise: Arc<NoiseField>, settings: HeightSettings, grid: &WorldGridSpec) -> Self {
        HeightField {
            noise,
            settings,
            water_level: grid.water_level,
            world_size: grid.world_size(),
        }
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    pub fn settings(&self) -> &HeightSettings {
        &self.settings
    }

    pub fn water_level(&self) -> f32 {
        self.water_level
    }

    pub fn world_size(&self) -> f32 {
        self.world_size
    }

    /// Distance from the origin past which the island gradient reaches zero.
    pub fn gradient_radius(&self) -> f32 {
        self.settings.gradient_radius * self.world_size
    }

    pub fn elevation(&self, x: f32, z: f32) -> f32 {
        self.elevation_at(Vec2::new(x, z))
    }

    pub fn elevation_at(&self, pos: Vec2) -> f32 {
        let s = &self.settings;
        let mask = self.island_mask(pos);

        let mountain = self
            .sample01(NoiseChannel::Mountain, pos, s.mountain_frequency)
            .powf(s.mountain_power);

        let base = self.sample(NoiseChannel::Base, pos, s.base_frequency) * s.base_amplitude
            + mountain * s.mountain_amplitude
            + self.sample(NoiseChannel::Detail, pos, s.detail_frequency) * s.detail_amplitude;

        let mut height = lerp(s.ocean_floor, base, mask);

        if mask < s.open_ocean_mask {
            height +=
                self.sample(NoiseChannel::Detail, pos, s.seabed_frequency) * s.seabed_amplitude;
        }

        shape_beach(height, self.water_level, s)
    }

    /// Island membership in `[0, 1]`: the islands noise faded out by a
    /// radial falloff, then sharpened.
    pub fn island_mask(&self, pos: Vec2) -> f32 {
        let s = &self.settings;
        let islands = self.sample01(NoiseChannel::IslandsMask, pos, s.islands_frequency);
        let falloff = 1.0 - (pos.length() / self.gradient_radius()).powi(2);
        smoothstep((islands * falloff).clamp(0.0, 1.0), s.mask_low, s.mask_high).clamp(0.0, 1.0)
    }

    #[inline]
    fn sample(&self, channel: NoiseChannel, pos: Vec2, frequency: f32) -> f32 {
        self.noise.sample(channel, pos * (frequency / self.world_size))
    }

    #[inline]
    fn sample01(&self, channel: NoiseChannel, pos: Vec2, frequency: f32) -> f32 {
        self.noise.sample01(channel, pos * (frequency / self.world_size))
    }
}

/// Pulls heights just above the water toward a flat beach.
pub fn shape_beach(height: f32, water_level: f32, settings: &HeightSettings) -> f32 {
    let above = height - water_level;
    if above <= 0.0 || above >= settings.beach_band {
        return height;
    }

    let t = (1.0 - above / settings.beach_band) * settings.beach_strength;
    lerp(height, water_level + settings.beach_rest, t)
}
