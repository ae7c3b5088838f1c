//! Color space conversions: RGB <-> HSV, RGB <-> YUV, luminance.
//!
//! Conversions work on normalized 0.0-1.0 values; callers convert bytes with
//! [`to_unit`] and back with [`to_byte`].

use serde::{Deserialize, Serialize};

/// BT.709 luminosity coefficients
pub const LUMA_R: f64 = 0.2126;
pub const LUMA_G: f64 = 0.7152;
pub const LUMA_B: f64 = 0.0722;

/// Hue in degrees (0-360), saturation and value in 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// BT.601 analog YUV. `y` is 0.0-1.0, `u` and `v` are signed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Yuv {
    pub y: f64,
    pub u: f64,
    pub v: f64,
}

#[inline]
pub fn to_unit(v: u8) -> f64 {
    v as f64 / 255.0
}

/// Scale a 0.0-1.0 value to a byte, rounding and clamping.
#[inline]
pub fn to_byte(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// BT.709 luminance of a byte triple, rounded.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMA_R * r as f64 + LUMA_G * g as f64 + LUMA_B * b as f64;
    y.round().clamp(0.0, 255.0) as u8
}

/// Convert RGB to HSV.
/// Input: r, g, b in 0.0-1.0
/// Output: h in 0.0-360.0, s and v in 0.0-1.0
pub fn rgb_to_hsv(r: f64, g: f64, b: f64) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let s = if max > 0.0 { chroma / max } else { 0.0 };

    let h = if chroma <= 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / chroma)
    } else if max == g {
        60.0 * ((b - r) / chroma + 2.0)
    } else {
        60.0 * ((r - g) / chroma + 4.0)
    };

    Hsv {
        h: h.rem_euclid(360.0),
        s,
        v: max,
    }
}

/// Convert HSV back to RGB using six 60 degree sectors.
pub fn hsv_to_rgb(hsv: Hsv) -> (f64, f64, f64) {
    let Hsv { h, s, v } = hsv;
    if s <= 0.0 {
        return (v, v, v);
    }

    let h = h.rem_euclid(360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match (sector as u8) % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

pub fn rgb_to_yuv(r: f64, g: f64, b: f64) -> Yuv {
    Yuv {
        y: 0.299 * r + 0.587 * g + 0.114 * b,
        u: -0.14713 * r - 0.28886 * g + 0.436 * b,
        v: 0.615 * r - 0.51499 * g - 0.10001 * b,
    }
}

pub fn yuv_to_rgb(yuv: Yuv) -> (f64, f64, f64) {
    let Yuv { y, u, v } = yuv;
    (
        y + 1.13983 * v,
        y - 0.39465 * u - 0.58060 * v,
        y + 2.03211 * u,
    )
}
