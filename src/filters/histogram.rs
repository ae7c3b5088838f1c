//! Histograms and histogram equalization in RGB, HSV and YUV.
//!
//! Equalization remaps intensities through the cumulative distribution of
//! their histogram: `new = round(cdf[old] * 255)`. The color-space variants
//! equalize only the intensity component (V or Y) and leave chroma alone.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::{Channel, ImageBuffer};
use crate::filters::color_space::{
    hsv_to_rgb, luminance, rgb_to_hsv, rgb_to_yuv, to_byte, to_unit, yuv_to_rgb, Hsv, Yuv,
};
use crate::pass::{map_channels, map_rows, Progress};

/// Counts of each intensity level 0-255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u32; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Histogram { counts: [0; 256] }
    }
}

impl Histogram {
    pub fn from_counts(counts: [u32; 256]) -> Self {
        Histogram { counts }
    }

    #[inline]
    pub fn counts(&self) -> &[u32; 256] {
        &self.counts
    }

    #[inline]
    fn add(&mut self, value: u8) {
        self.counts[value as usize] += 1;
    }

    /// Number of samples counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Most populated level; the lowest one on ties.
    pub fn mode(&self) -> u8 {
        let mut best = 0usize;
        for (i, &c) in self.counts.iter().enumerate() {
            if c > self.counts[best] {
                best = i;
            }
        }
        best as u8
    }

    /// Probability mass of each level. All zero for an empty histogram.
    pub fn probabilities(&self) -> [f64; 256] {
        let total = self.total();
        if total == 0 {
            return [0.0; 256];
        }
        self.counts.map(|c| c as f64 / total as f64)
    }

    /// Cumulative distribution: `cdf[i] = cdf[i - 1] + p[i]`.
    pub fn cdf(&self) -> [f64; 256] {
        let mut cdf = self.probabilities();
        for i in 1..256 {
            cdf[i] += cdf[i - 1];
        }
        cdf
    }

    /// Lookup table mapping each level to `round(cdf * 255)`.
    ///
    /// An empty histogram yields the identity mapping.
    pub fn equalization_lut(&self) -> [u8; 256] {
        if self.total() == 0 {
            return std::array::from_fn(|i| i as u8);
        }
        self.cdf().map(to_byte)
    }

    fn merge(mut self, other: &Histogram) -> Self {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        self
    }
}

/// What a histogram counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramSource {
    Channel(Channel),
    /// BT.709 luminance, rounded to a byte
    Luminance,
}

/// Histogram of one channel or of the luminance of every pixel.
pub fn compute_histogram(input: &ImageBuffer, source: HistogramSource) -> Histogram {
    histogram_by(input, |px| match source {
        HistogramSource::Channel(channel) => px[channel.offset()],
        HistogramSource::Luminance => luminance(px[2], px[1], px[0]),
    })
}

/// Histogram of `level(px)` over every BGR pixel, accumulated per thread.
fn histogram_by<F>(input: &ImageBuffer, level: F) -> Histogram
where
    F: Fn(&[u8]) -> u8 + Sync,
{
    (0..input.height())
        .into_par_iter()
        .fold(Histogram::default, |mut hist, y| {
            for px in input.row(y).chunks_exact(3) {
                hist.add(level(px));
            }
            hist
        })
        .reduce(Histogram::default, |a, b| a.merge(&b))
}

/// Blue, green and red histograms gathered in one pass.
pub fn compute_histograms(input: &ImageBuffer) -> [Histogram; 3] {
    let empty = || [Histogram::default(), Histogram::default(), Histogram::default()];
    (0..input.height())
        .into_par_iter()
        .fold(empty, |mut hists, y| {
            for px in input.row(y).chunks_exact(3) {
                hists[0].add(px[0]);
                hists[1].add(px[1]);
                hists[2].add(px[2]);
            }
            hists
        })
        .reduce(empty, |[a0, a1, a2], [b0, b1, b2]| {
            [a0.merge(&b0), a1.merge(&b1), a2.merge(&b2)]
        })
}

// ============================================================================
// Equalization
// ============================================================================

/// Color space whose intensity component is equalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EqualizationSpace {
    /// Each of R, G and B with its own histogram
    #[default]
    Rgb,
    /// Only V of HSV
    Hsv,
    /// Only Y of YUV
    Yuv,
}

pub fn equalize(
    input: &ImageBuffer,
    space: EqualizationSpace,
    progress: Option<&dyn Progress>,
) -> ImageBuffer {
    match space {
        EqualizationSpace::Rgb => equalize_rgb(input, progress),
        EqualizationSpace::Hsv => equalize_hsv(input, progress),
        EqualizationSpace::Yuv => equalize_yuv(input, progress),
    }
}

/// Equalize R, G and B independently.
pub fn equalize_rgb(input: &ImageBuffer, progress: Option<&dyn Progress>) -> ImageBuffer {
    let luts = compute_histograms(input).map(|h| h.equalization_lut());
    map_channels(input, &luts, progress)
}

#[inline]
fn unit_rgb(px: &[u8]) -> (f64, f64, f64) {
    (to_unit(px[2]), to_unit(px[1]), to_unit(px[0]))
}

#[inline]
fn store_rgb(px: &mut [u8], (r, g, b): (f64, f64, f64)) {
    px[0] = to_byte(b);
    px[1] = to_byte(g);
    px[2] = to_byte(r);
}

/// Equalize the HSV value channel, keeping hue and saturation.
pub fn equalize_hsv(input: &ImageBuffer, progress: Option<&dyn Progress>) -> ImageBuffer {
    // V is the largest channel
    let lut = histogram_by(input, |px| px[0].max(px[1]).max(px[2])).equalization_lut();

    map_rows(input, progress, |_, row| {
        for px in row.chunks_exact_mut(3) {
            let (r, g, b) = unit_rgb(px);
            let hsv = rgb_to_hsv(r, g, b);
            let v = to_unit(lut[to_byte(hsv.v) as usize]);
            store_rgb(px, hsv_to_rgb(Hsv { v, ..hsv }));
        }
    })
}

/// Equalize the YUV luma channel, keeping chroma.
pub fn equalize_yuv(input: &ImageBuffer, progress: Option<&dyn Progress>) -> ImageBuffer {
    let lut = histogram_by(input, |px| {
        let (r, g, b) = unit_rgb(px);
        to_byte(rgb_to_yuv(r, g, b).y)
    })
    .equalization_lut();

    map_rows(input, progress, |_, row| {
        for px in row.chunks_exact_mut(3) {
            let (r, g, b) = unit_rgb(px);
            let yuv = rgb_to_yuv(r, g, b);
            let y = to_unit(lut[to_byte(yuv.y) as usize]);
            store_rgb(px, yuv_to_rgb(Yuv { y, ..yuv }));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Geometry;

    fn gradient() -> ImageBuffer {
        // Values squeezed into 100-163 so equalization has room to stretch.
        let g = Geometry::aligned(8, 8, 4);
        let mut img = ImageBuffer::filled(g, [0, 0, 0]).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                let v = 100 + (y * 8 + x) as u8;
                img.set_pixel(x, y, [v, v / 2 + 60, 163 - (v - 100)]);
            }
        }
        img
    }

    #[test]
    fn test_histogram_sums_to_pixel_count() {
        let img = gradient();
        let n = img.geometry().pixel_count() as u64;

        for channel in Channel::ALL {
            assert_eq!(compute_histogram(&img, HistogramSource::Channel(channel)).total(), n);
        }
        assert_eq!(compute_histogram(&img, HistogramSource::Luminance).total(), n);
        for h in compute_histograms(&img) {
            assert_eq!(h.total(), n);
        }
    }

    #[test]
    fn test_histogram_counts_selected_channel() {
        let img = ImageBuffer::filled(Geometry::tight(3, 2), [10, 20, 30]).unwrap();

        let red = compute_histogram(&img, HistogramSource::Channel(Channel::Red));
        assert_eq!(red.counts()[30], 6);
        assert_eq!(red.mode(), 30);

        let hists = compute_histograms(&img);
        assert_eq!(hists[0].counts()[10], 6);
        assert_eq!(hists[1].counts()[20], 6);
    }

    #[test]
    fn test_value_histogram_matches_sequential_count() {
        let g = Geometry::aligned(7, 13, 8);
        let mut img = ImageBuffer::filled(g, [0, 0, 0]).unwrap();
        let mut expected = [0u32; 256];
        for y in 0..13 {
            for x in 0..7 {
                let px = [(x * 30) as u8, (y * 19) as u8, ((x + y) * 11) as u8];
                img.set_pixel(x, y, px);
                expected[px[0].max(px[1]).max(px[2]) as usize] += 1;
            }
        }

        let hist = histogram_by(&img, |px| px[0].max(px[1]).max(px[2]));

        assert_eq!(hist.counts(), &expected);
        assert_eq!(hist.total(), 7 * 13);
    }

    #[test]
    fn test_luminance_histogram() {
        let img = ImageBuffer::filled(Geometry::tight(2, 2), [0, 0, 255]).unwrap();
        let lum = compute_histogram(&img, HistogramSource::Luminance);
        assert_eq!(lum.counts()[54], 4);
    }

    #[test]
    fn test_cdf_ends_at_one() {
        let h = compute_histograms(&gradient())[0].clone();
        let cdf = h.cdf();
        assert!((cdf[255] - 1.0).abs() < 1e-9);
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_equalize_rgb_stretches_range() {
        let result = equalize_rgb(&gradient(), None);
        let hist = compute_histograms(&result);
        // Blue held 64 distinct values in 100-163; now it reaches 255.
        assert_eq!(hist[0].counts()[255], 1);
        assert!(hist[0].counts()[..10].iter().sum::<u32>() >= 1);
    }

    fn max_drift(a: &ImageBuffer, b: &ImageBuffer) -> i32 {
        a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .map(|(&x, &y)| (x as i32 - y as i32).abs())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_equalization_is_nearly_idempotent() {
        for (space, limit) in [(EqualizationSpace::Rgb, 1), (EqualizationSpace::Hsv, 2)] {
            let once = equalize(&gradient(), space, None);
            let twice = equalize(&once, space, None);
            let drift = max_drift(&once, &twice);
            assert!(drift <= limit, "{space:?} drifted by {drift}");
        }
    }

    #[test]
    fn test_equalize_yuv_gray_is_nearly_idempotent() {
        let g = Geometry::tight(16, 1);
        let mut img = ImageBuffer::filled(g, [0, 0, 0]).unwrap();
        for x in 0..16 {
            let v = 90 + x as u8 * 3;
            img.set_pixel(x, 0, [v, v, v]);
        }

        let once = equalize_yuv(&img, None);
        let twice = equalize_yuv(&once, None);

        assert!(max_drift(&once, &twice) <= 1);
    }

    #[test]
    fn test_equalize_hsv_keeps_gray_gray() {
        let g = Geometry::tight(4, 1);
        let mut img = ImageBuffer::filled(g, [0, 0, 0]).unwrap();
        for x in 0..4 {
            let v = 100 + x as u8 * 10;
            img.set_pixel(x, 0, [v, v, v]);
        }

        let result = equalize_hsv(&img, None);

        for x in 0..4 {
            let [b, g, r] = result.pixel(x, 0);
            assert!(b == g && g == r);
        }
        assert_eq!(result.pixel(3, 0), [255, 255, 255]);
    }

    #[test]
    fn test_equalize_yuv_output_in_range_and_brighter() {
        let img = ImageBuffer::filled(Geometry::tight(2, 2), [40, 60, 80]).unwrap();
        let result = equalize_yuv(&img, None);
        // A single luma level maps to cdf = 1.0, so the image brightens.
        let [b, g, r] = result.pixel(0, 0);
        assert!(b > 40 && g > 60 && r > 80);
    }

    #[test]
    fn test_equalize_empty_image() {
        let img = ImageBuffer::filled(Geometry::tight(0, 0), [0, 0, 0]).unwrap();
        assert_eq!(equalize(&img, EqualizationSpace::Hsv, None), img);
        assert_eq!(Histogram::default().equalization_lut()[17], 17);
    }
}
