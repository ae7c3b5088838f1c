//! Point operations: Negative, Brightness, Contrast, Contrast Enhancement,
//! Shift Bits, Square Root.
//!
//! Each output channel value depends only on the same channel of the same
//! input pixel, so every operation here compiles to a 256-entry lookup table
//! applied by a row pass. Results saturate to 0-255, except Shift Bits which
//! keeps the low 8 bits.

use crate::buffer::ImageBuffer;
use crate::error::{check_range, EngineError, Result};
use crate::pass::{build_lut, clamp_u8, map_lut, Progress};

// ============================================================================
// Negative
// ============================================================================

/// Invert every channel: `255 - v`.
pub fn negative(input: &ImageBuffer, progress: Option<&dyn Progress>) -> ImageBuffer {
    let lut = build_lut(|v| 255 - v);
    map_lut(input, &lut, progress)
}

// ============================================================================
// Brightness / Contrast
// ============================================================================

/// Add `amount` to every channel, saturating.
pub fn brightness(
    input: &ImageBuffer,
    amount: i32,
    progress: Option<&dyn Progress>,
) -> ImageBuffer {
    let lut = build_lut(|v| (v as i64 + amount as i64).clamp(0, 255) as u8);
    map_lut(input, &lut, progress)
}

/// Multiply every channel by `factor`, rounding and saturating.
///
/// # Errors
/// `factor` must be finite and non-negative.
pub fn contrast(
    input: &ImageBuffer,
    factor: f64,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    check_factor(factor)?;
    let lut = build_lut(|v| clamp_u8(v as f64 * factor));
    Ok(map_lut(input, &lut, progress))
}

/// Combined shift and scale: `(v + brightness) * factor`, then saturate.
pub fn contrast_enhancement(
    input: &ImageBuffer,
    brightness: i32,
    factor: f64,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    check_factor(factor)?;
    let lut = build_lut(|v| clamp_u8((v as f64 + brightness as f64) * factor));
    Ok(map_lut(input, &lut, progress))
}

pub(crate) fn check_factor(factor: f64) -> Result<()> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(EngineError::parameter(
            "factor",
            format!("{factor} must be a finite, non-negative number"),
        ));
    }
    Ok(())
}

// ============================================================================
// Shift Bits
// ============================================================================

/// Shift every channel left by `bits`, keeping the low byte.
///
/// Overflowing bits are discarded: `0b1100_0000 << 2` yields `0`.
pub fn shift_bits(
    input: &ImageBuffer,
    bits: u32,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    check_range("bits", bits as i64, 0, 7)?;
    let lut = build_lut(|v| ((v as u16) << bits) as u8);
    Ok(map_lut(input, &lut, progress))
}

// ============================================================================
// Square Root
// ============================================================================

/// `round(sqrt(v * 255))`, which lifts the dark end of the range.
pub fn square_root(input: &ImageBuffer, progress: Option<&dyn Progress>) -> ImageBuffer {
    let lut = build_lut(|v| clamp_u8((v as f64 * 255.0).sqrt()));
    map_lut(input, &lut, progress)
}
