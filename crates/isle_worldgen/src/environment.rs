use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::mesh::{lattice_indices, lattice_points};
use crate::settings::{ensure_finite, ensure_positive, ensure_range};
use crate::utils::{hex_color, sample_span};
use crate::{ConfigError, HeightField};

/// Half-open `[min, max)` interval.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Span {
        Span { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        sample_span(rng, self.min, self.max)
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v < self.max
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    /// Side length in world widths.
    pub extent: f32,
    pub segments: u32,
    /// Water depth at which the color is fully deep.
    pub gradient_depth: f32,
    pub bob_frequency: f32,
    pub bob_amplitude: f32,
    pub opacity: f32,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for WaterSettings {
    fn default() -> Self {
        WaterSettings {
            extent: 3.0,
            segments: 100,
            gradient_depth: 700.0,
            bob_frequency: 0.5,
            bob_amplitude: 0.2,
            opacity: 0.95,
            metallic: 0.6,
            roughness: 0.3,
        }
    }
}

impl WaterSettings {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("water.extent", self.extent)?;
        ensure_positive("water.segments", self.segments as f32)?;
        ensure_positive("water.gradient_depth", self.gradient_depth)?;
        ensure_finite("water.bob_frequency", self.bob_frequency)?;
        ensure_finite("water.bob_amplitude", self.bob_amplitude)?;
        ensure_finite("water.opacity", self.opacity)?;
        ensure_finite("water.metallic", self.metallic)?;
        ensure_finite("water.roughness", self.roughness)?;
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    pub count: u32,
    /// Side of the square clouds are scattered over, in world widths.
    pub spread: f32,
    pub altitude: Span,
    pub scale: Span,
    pub puffs: u32,
    pub puff_radius: Span,
    pub puff_spread: f32,
    pub puff_height: f32,
    pub underside_shade: f32,
    pub opacity: f32,
}

impl Default for CloudSettings {
    fn default() -> Self {
        CloudSettings {
            count: 150,
            spread: 1.5,
            altitude: Span::new(1400.0, 2200.0),
            scale: Span::new(10.0, 35.0),
            puffs: 15,
            puff_radius: Span::new(3.0, 8.0),
            puff_spread: 25.0,
            puff_height: 8.0,
            underside_shade: 0.15,
            opacity: 0.2,
        }
    }
}

impl CloudSettings {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("clouds.spread", self.spread)?;
        ensure_range("clouds.altitude", self.altitude.min, self.altitude.max)?;
        ensure_range("clouds.scale", self.scale.min, self.scale.max)?;
        ensure_range("clouds.puff_radius", self.puff_radius.min, self.puff_radius.max)?;
        ensure_positive("clouds.scale", self.scale.min)?;
        ensure_positive("clouds.puff_radius", self.puff_radius.min)?;
        ensure_finite("clouds.puff_spread", self.puff_spread)?;
        ensure_finite("clouds.puff_height", self.puff_height)?;
        ensure_finite("clouds.underside_shade", self.underside_shade)?;
        ensure_finite("clouds.opacity", self.opacity)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterVertex {
    /// Relative to the water level.
    pub position: Vec3,
    /// Linear RGB.
    pub color: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterMesh {
    pub size: f32,
    pub segments: u32,
    pub vertices: Vec<WaterVertex>,
    pub indices: Vec<u32>,
}

impl WaterMesh {
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.position.to_array()).collect()
    }

    pub fn colors(&self) -> Vec<[f32; 4]> {
        self.vertices
            .iter()
            .map(|v| v.color.extend(1.0).to_array())
            .collect()
    }
}

/// Builds the sea surface, colored by the depth of the terrain beneath it.
pub fn synthesize_water(height_field: &HeightField, settings: &WaterSettings) -> WaterMesh {
    let _scope = info_span!("synthesize_water").entered();

    let shallow = hex_color(0x1E90FF);
    let deep = hex_color(0x000080);
    let water_level = height_field.water_level();
    let size = height_field.world_size() * settings.extent;

    let vertices = lattice_points(size, settings.segments)
        .map(|pos| {
            let depth = water_level - height_field.elevation_at(pos);
            let t = (depth / settings.gradient_depth).clamp(0.0, 1.0);
            WaterVertex {
                position: Vec3::new(pos.x, 0.0, pos.y),
                color: shallow.lerp(deep, t),
            }
        })
        .collect();

    WaterMesh {
        size,
        segments: settings.segments,
        vertices,
        indices: lattice_indices(settings.segments),
    }
}

/// Vertical offset of the water surface at `elapsed` seconds.
pub fn water_offset(elapsed: f32, settings: &WaterSettings) -> f32 {
    (elapsed * settings.bob_frequency).sin() * settings.bob_amplitude
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudPuff {
    pub offset: Vec3,
    pub radius: f32,
}

/// One cloud shape shared by every cloud instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudBank {
    pub puffs: Vec<CloudPuff>,
    pub instances: Vec<Transform>,
    pub underside_shade: f32,
}

impl CloudBank {
    /// Darkening for a vertex at cloud-space height `y` on a puff of `radius`.
    ///
    /// Zero at and above the cloud center, `underside_shade` one radius below
    /// it. `y` includes the puff offset, so vertices on low puffs sink past
    /// one radius and are shaded beyond `underside_shade`.
    pub fn shade(&self, y: f32, radius: f32) -> f32 {
        (-y / radius).max(0.0) * self.underside_shade
    }
}

pub fn scatter_clouds<R: Rng + ?Sized>(
    rng: &mut R,
    world_size: f32,
    settings: &CloudSettings,
) -> CloudBank {
    let _scope = info_span!("scatter_clouds").entered();

    let puffs = (0..settings.puffs)
        .map(|_| {
            let radius = settings.puff_radius.sample(rng);
            let offset = Vec3::new(
                (rng.gen::<f32>() - 0.5) * settings.puff_spread,
                (rng.gen::<f32>() - 0.5) * settings.puff_height,
                (rng.gen::<f32>() - 0.5) * settings.puff_spread,
            );
            CloudPuff { offset, radius }
        })
        .collect();

    let extent = world_size * settings.spread;
    let instances = (0..settings.count)
        .map(|_| {
            let x = (rng.gen::<f32>() - 0.5) * extent;
            let z = (rng.gen::<f32>() - 0.5) * extent;
            let altitude = settings.altitude.sample(rng);
            let scale = settings.scale.sample(rng);
            Transform {
                translation: Vec3::new(x, altitude, z),
                rotation: Quat::from_rotation_y(rng.gen_range(0.0..TAU)),
                scale: Vec3::splat(scale),
            }
        })
        .collect();

    CloudBank {
        puffs,
        instances,
        underside_shade: settings.underside_shade,
    }
}
