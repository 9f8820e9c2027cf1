//! Color conversion helpers.
//!
//! All colors are linear RGB triples in `[0, 1]` stored as [`DVec3`]. The
//! HSV conversions follow the classic hexcone formulas exactly so that hues
//! drawn from a seeded stream map to the same RGB values in every dataset.

use crate::error::MaterialError;
use glam::DVec3;

/// HSV to RGB conversion.
///
/// `h`, `s` and `v` are all in `[0, 1]`; hue wraps at 1.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> DVec3 {
    if s == 0.0 {
        return DVec3::splat(v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match (sector as i64).rem_euclid(6) {
        0 => DVec3::new(v, t, p),
        1 => DVec3::new(q, v, p),
        2 => DVec3::new(p, v, t),
        3 => DVec3::new(p, q, v),
        4 => DVec3::new(t, p, v),
        _ => DVec3::new(v, p, q),
    }
}

/// RGB to HSV conversion. Returns `(h, s, v)`.
pub fn rgb_to_hsv(rgb: DVec3) -> (f64, f64, f64) {
    let maxc = rgb.max_element();
    let minc = rgb.min_element();
    let v = maxc;
    if minc == maxc {
        return (0.0, 0.0, v);
    }
    let range = maxc - minc;
    let s = range / maxc;
    let rc = (maxc - rgb.x) / range;
    let gc = (maxc - rgb.y) / range;
    let bc = (maxc - rgb.z) / range;

    let h = if rgb.x == maxc {
        bc - gc
    } else if rgb.y == maxc {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    ((h / 6.0).rem_euclid(1.0), s, v)
}

/// Parse a `#RRGGBB` hex literal into an RGB triple.
pub fn from_hex(hex: &str) -> Result<DVec3, MaterialError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(MaterialError::InvalidHexColor(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map(|c| c as f64 / 255.0)
            .map_err(|_| MaterialError::InvalidHexColor(hex.to_string()))
    };
    Ok(DVec3::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Clamp a single channel to `[0, 1]`.
#[inline]
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
