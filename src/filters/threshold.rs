//! Binary thresholding: fixed threshold and bimodal auto-threshold.
//!
//! Every channel is split independently: values below the channel's threshold
//! become 0, all others 255.

use crate::buffer::ImageBuffer;
use crate::error::{check_range, Result};
use crate::filters::histogram::{compute_histograms, Histogram};
use crate::pass::{build_lut, map_channels, map_lut, Progress};

#[inline]
fn split_lut(threshold: u8) -> [u8; 256] {
    build_lut(|v| if v < threshold { 0 } else { 255 })
}

/// Apply a fixed binary threshold to every channel.
///
/// # Arguments
/// * `threshold` - Split point (0-255); values `< threshold` become 0
pub fn threshold(
    input: &ImageBuffer,
    threshold: i32,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    check_range("threshold", threshold as i64, 0, 255)?;
    Ok(map_lut(input, &split_lut(threshold as u8), progress))
}

/// Find the valley between the two dominant modes of a histogram.
///
/// The first mode is the most populated level. The second is the most
/// populated non-empty level at least `distance` away from it. The valley is
/// the least populated level between them (inclusive); ties resolve to the
/// lowest level. Returns the first mode when no occupied level is far enough
/// away.
pub fn valley_threshold(histogram: &Histogram, distance: u8) -> u8 {
    let counts = histogram.counts();
    let first = histogram.mode();

    let second = (0..256usize)
        .filter(|&i| counts[i] > 0 && i.abs_diff(first as usize) >= distance as usize)
        .fold(None, |best: Option<usize>, i| match best {
            Some(b) if counts[b] >= counts[i] => Some(b),
            _ => Some(i),
        });

    let Some(second) = second else {
        return first;
    };

    let (lo, hi) = if (first as usize) <= second {
        (first as usize, second)
    } else {
        (second, first as usize)
    };

    let mut valley = lo;
    for i in lo..=hi {
        if counts[i] < counts[valley] {
            valley = i;
        }
    }
    valley as u8
}

/// Threshold each channel at the valley between its two histogram modes.
///
/// # Arguments
/// * `distance` - Minimum separation between the two modes (0-255)
///
/// # Returns
/// The thresholded image and the `[blue, green, red]` thresholds used
pub fn auto_threshold(
    input: &ImageBuffer,
    distance: i32,
    progress: Option<&dyn Progress>,
) -> Result<(ImageBuffer, [u8; 3])> {
    check_range("distance", distance as i64, 0, 255)?;
    let histograms = compute_histograms(input);
    let thresholds = histograms
        .each_ref()
        .map(|h| valley_threshold(h, distance as u8));
    log::trace!("auto threshold picked B/G/R = {thresholds:?}");

    let luts = thresholds.map(split_lut);
    Ok((map_channels(input, &luts, progress), thresholds))
}
