use bevy::math::Vec3Swizzles;
use bevy::prelude::*;
use isle_noise::{NoiseChannel, NoiseField};
use serde::{Deserialize, Serialize};

use crate::placement::{default_rules, PlacementRule};
use crate::settings::{ensure_finite, ensure_positive, ensure_range};
use crate::utils::{hex_color, smoothstep};
use crate::ConfigError;

/// Height, slope and noise cutoffs for coloring and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeThresholds {
    pub colors: ColorBands,
    /// Every `placement_stride`-th lattice vertex, in row-major order, is
    /// offered to the placement rules.
    pub placement_stride: u32,
    pub rules: Vec<PlacementRule>,
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        BiomeThresholds {
            colors: ColorBands::default(),
            placement_stride: 4,
            rules: default_rules(),
        }
    }
}

impl BiomeThresholds {
    pub(crate) fn validate(&self, water_level: f32) -> Result<(), ConfigError> {
        if self.placement_stride == 0 {
            return Err(ConfigError::ZeroStride);
        }

        self.colors.validate(water_level)?;

        for rule in &self.rules {
            rule.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorBands {
    /// Height above water over which sand blends into grass.
    pub shore_band: f32,
    pub snow_line: f32,
    pub snow_blend: f32,
    pub grass_variation_scale: f32,
    pub grass_variation: f32,
    pub steep_start: f32,
    pub steep_end: f32,
}

impl Default for ColorBands {
    fn default() -> Self {
        ColorBands {
            shore_band: 8.0,
            snow_line: 150.0,
            snow_blend: 60.0,
            grass_variation_scale: 80.0,
            grass_variation: 0.5,
            steep_start: 0.25,
            steep_end: 0.6,
        }
    }
}

impl ColorBands {
    fn validate(&self, water_level: f32) -> Result<(), ConfigError> {
        ensure_positive("shore_band", self.shore_band)?;
        ensure_positive("snow_blend", self.snow_blend)?;
        ensure_positive("grass_variation_scale", self.grass_variation_scale)?;
        ensure_finite("grass_variation", self.grass_variation)?;
        ensure_range("steep slope", self.steep_start, self.steep_end)?;

        let shore_end = water_level + self.shore_band;
        if !self.snow_line.is_finite() || self.snow_line <= shore_end {
            return Err(ConfigError::SnowLineBelowShore {
                snow_line: self.snow_line,
                shore_end,
            });
        }

        Ok(())
    }
}

/// Linear RGB terrain colors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TerrainPalette {
    pub sand: Vec3,
    pub grass: Vec3,
    pub grass_light: Vec3,
    pub rock: Vec3,
    pub rock_dark: Vec3,
    pub snow: Vec3,
}

impl Default for TerrainPalette {
    fn default() -> Self {
        TerrainPalette {
            sand: hex_color(0xE0CDA7),
            grass: hex_color(0x55904C),
            grass_light: hex_color(0x71A269),
            rock: hex_color(0xA9A9A9),
            rock_dark: hex_color(0x525252),
            snow: hex_color(0xFFFFFF),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceBand {
    Sand,
    Shore,
    Alpine,
    Meadow,
}

impl SurfaceBand {
    pub fn classify(height: f32, water_level: f32, bands: &ColorBands) -> SurfaceBand {
        if height < water_level {
            SurfaceBand::Sand
        } else if height < water_level + bands.shore_band {
            SurfaceBand::Shore
        } else if height > bands.snow_line {
            SurfaceBand::Alpine
        } else {
            SurfaceBand::Meadow
        }
    }
}

/// Per-vertex surface coloring.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePainter<'a> {
    pub bands: &'a ColorBands,
    pub palette: &'a TerrainPalette,
    pub noise: &'a NoiseField,
    pub water_level: f32,
}

impl SurfacePainter<'_> {
    pub fn color(&self, pos: Vec3, slope: f32) -> Vec3 {
        let b = self.bands;
        let p = self.palette;
        let height = pos.y;

        match SurfaceBand::classify(height, self.water_level, b) {
            SurfaceBand::Sand => p.sand,
            SurfaceBand::Shore => {
                let t = (height - self.water_level) / b.shore_band;
                p.sand.lerp(p.grass, t)
            }
            SurfaceBand::Alpine => {
                let t = ((height - b.snow_line) / b.snow_blend).min(1.0);
                p.rock.lerp(p.snow, t)
            }
            SurfaceBand::Meadow => {
                let variation = self.noise.sample01(
                    NoiseChannel::Color,
                    pos.xz() / b.grass_variation_scale,
                ) * b.grass_variation;
                let steep = smoothstep(slope, b.steep_start, b.steep_end);
                p.grass.lerp(p.grass_light, variation).lerp(p.rock, steep)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(a: Vec3, b: Vec3, c: Vec3) -> bool {
        let lo = a.min(b) - Vec3::splat(1e-5);
        let hi = a.max(b) + Vec3::splat(1e-5);
        c.cmpge(lo).all() && c.cmple(hi).all()
    }

    #[test]
    fn bands_follow_height() {
        let bands = ColorBands::default();
        let wl = 10.0;

        assert_eq!(SurfaceBand::classify(-300.0, wl, &bands), SurfaceBand::Sand);
        assert_eq!(SurfaceBand::classify(9.99, wl, &bands), SurfaceBand::Sand);
        assert_eq!(SurfaceBand::classify(10.0, wl, &bands), SurfaceBand::Shore);
        assert_eq!(SurfaceBand::classify(17.9, wl, &bands), SurfaceBand::Shore);
        assert_eq!(SurfaceBand::classify(18.0, wl, &bands), SurfaceBand::Meadow);
        assert_eq!(SurfaceBand::classify(150.0, wl, &bands), SurfaceBand::Meadow);
        assert_eq!(SurfaceBand::classify(150.1, wl, &bands), SurfaceBand::Alpine);
    }

    #[test]
    fn colors_follow_bands() {
        let noise = NoiseField::new(8).unwrap();
        let bands = ColorBands::default();
        let palette = TerrainPalette::default();
        let painter = SurfacePainter {
            bands: &bands,
            palette: &palette,
            noise: &noise,
            water_level: 10.0,
        };

        for i in 0..200 {
            let x = i as f32 * 13.0 - 1300.0;
            let z = i as f32 * -7.0;
            let slope = (i % 10) as f32 / 10.0;

            let under = painter.color(Vec3::new(x, 9.0 - i as f32, z), slope);
            assert_eq!(under, palette.sand);

            let high = painter.color(Vec3::new(x, 150.5 + i as f32, z), slope);
            assert!(contains(palette.rock, palette.snow, high));

            let meadow = painter.color(Vec3::new(x, 60.0, z), slope);
            assert_ne!(meadow, palette.sand);
        }

        let peak = painter.color(Vec3::new(0.0, 400.0, 0.0), 0.0);
        assert!((peak - palette.snow).length() < 1e-5);
    }

    #[test]
    fn steep_meadow_turns_to_rock() {
        let noise = NoiseField::new(2).unwrap();
        let bands = ColorBands::default();
        let palette = TerrainPalette::default();
        let painter = SurfacePainter {
            bands: &bands,
            palette: &palette,
            noise: &noise,
            water_level: 10.0,
        };

        let cliff = painter.color(Vec3::new(12.0, 80.0, 40.0), 0.9);
        assert!((cliff - palette.rock).length() < 1e-5);

        let flat = painter.color(Vec3::new(12.0, 80.0, 40.0), 0.0);
        assert!(contains(palette.grass, palette.grass_light, flat));
    }

    #[test]
    fn snow_line_must_clear_shore() {
        let mut thresholds = BiomeThresholds::default();
        thresholds.colors.snow_line = 15.0;
        assert!(matches!(
            thresholds.validate(10.0),
            Err(ConfigError::SnowLineBelowShore { .. })
        ));

        thresholds.colors.snow_line = 150.0;
        thresholds.placement_stride = 0;
        assert_eq!(thresholds.validate(10.0), Err(ConfigError::ZeroStride));
    }
}
