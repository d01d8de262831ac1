use bevy::prelude::Vec3;
use rand::Rng;

/// Hermite step between `min` and `max`, `0` below and `1` above.
pub fn smoothstep(x: f32, min: f32, max: f32) -> f32 {
    if x <= min {
        return 0.0;
    }

    if x >= max {
        return 1.0;
    }

    let x = (x - min) / (max - min);
    x * x * (3.0 - 2.0 * x)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Converts an sRGB hex triplet into linear RGB.
pub fn hex_color(rgb: u32) -> Vec3 {
    let [r, g, b, _] = bevy::prelude::Color::rgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
        .as_linear_rgba_f32();
    Vec3::new(r, g, b)
}

/// Uniform sample from `[min, max)`; collapses to `min` for degenerate ranges.
pub fn sample_span<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.gen::<f32>() * (max - min)
}
