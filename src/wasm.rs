//! WebAssembly exports for the BGR engine.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Buffer Layout
//!
//! Every function takes a flat BGR byte array plus its geometry:
//! - `width`, `height` in pixels
//! - `stride` in bytes per row (at least `width * 3`)
//!
//! The returned array has the same geometry, padding included. Errors are
//! thrown as JavaScript strings.

use wasm_bindgen::prelude::*;

use crate::buffer::{Geometry, ImageBuffer};
use crate::error::{EngineError, Result};
use crate::filters::histogram::EqualizationSpace;
use crate::filters::order_stat::WindowSize;
use crate::filters::{convolve, histogram, order_stat, point, threshold};
use crate::ops::Operation;

type JsResult<T> = std::result::Result<T, JsValue>;

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn load(data: &[u8], width: usize, height: usize, stride: usize) -> Result<ImageBuffer> {
    ImageBuffer::from_bytes(Geometry::new(width, height, stride)?, data.to_vec())
}

fn run<F>(data: &[u8], width: usize, height: usize, stride: usize, f: F) -> JsResult<Vec<u8>>
where
    F: FnOnce(&ImageBuffer) -> Result<ImageBuffer>,
{
    let input = load(data, width, height, stride).map_err(to_js)?;
    f(&input).map(ImageBuffer::into_bytes).map_err(to_js)
}

// ============================================================================
// Point Operations
// ============================================================================

/// Invert every channel.
///
/// # Arguments
/// * `data` - Flat array of BGR bytes (length = stride * height)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `stride` - Bytes per row
///
/// # Returns
/// Flat array of BGR bytes with the same layout
#[wasm_bindgen]
pub fn negative_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
) -> JsResult<Vec<u8>> {
    run(data, width, height, stride, |img| Ok(point::negative(img, None)))
}

#[wasm_bindgen]
pub fn brightness_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    amount: i32,
) -> JsResult<Vec<u8>> {
    run(data, width, height, stride, |img| Ok(point::brightness(img, amount, None)))
}

#[wasm_bindgen]
pub fn threshold_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    level: i32,
) -> JsResult<Vec<u8>> {
    run(data, width, height, stride, |img| threshold::threshold(img, level, None))
}

// ============================================================================
// Histogram
// ============================================================================

/// Histogram equalization. `space`: 0 = RGB, 1 = HSV, 2 = YUV.
#[wasm_bindgen]
pub fn equalize_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    space: u8,
) -> JsResult<Vec<u8>> {
    let space = match space {
        0 => EqualizationSpace::Rgb,
        1 => EqualizationSpace::Hsv,
        2 => EqualizationSpace::Yuv,
        other => return Err(JsValue::from_str(&format!("unknown color space {other}"))),
    };
    run(data, width, height, stride, |img| Ok(histogram::equalize(img, space, None)))
}

// ============================================================================
// Neighbourhood Filters
// ============================================================================

#[wasm_bindgen]
pub fn gaussian_blur_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    size: usize,
) -> JsResult<Vec<u8>> {
    run(data, width, height, stride, |img| convolve::gaussian_blur(img, size, None))
}

#[wasm_bindgen]
pub fn sobel_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
) -> JsResult<Vec<u8>> {
    run(data, width, height, stride, |img| convolve::sobel(img, None))
}

#[wasm_bindgen]
pub fn median_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    window: usize,
) -> JsResult<Vec<u8>> {
    run(data, width, height, stride, |img| {
        order_stat::median_filter(img, WindowSize::try_from(window)?, None)
    })
}

// ============================================================================
// Generic dispatch
// ============================================================================

/// Run an operation described as JSON, e.g. `{"op": "sharpen", "size": 5}`.
#[wasm_bindgen]
pub fn apply_json(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    op_json: &str,
) -> JsResult<Vec<u8>> {
    run(data, width, height, stride, |img| {
        let op = Operation::from_json(op_json)?;
        Ok(op.apply(img)?.image)
    })
}
