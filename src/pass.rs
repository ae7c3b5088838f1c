//! Row-parallel passes over an image buffer.
//!
//! Every transform copies its source, then rewrites rows of the copy in
//! parallel. Reads always come from the untouched source, so neighbourhood
//! filters never observe partially updated pixels.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::buffer::ImageBuffer;

/// Receives row completion notifications during a pass.
///
/// Calls may arrive from several worker threads and out of row order;
/// `completed` is monotonically increasing.
pub trait Progress: Sync {
    fn rows_completed(&self, completed: usize, total: usize);
}

impl<F> Progress for F
where
    F: Fn(usize, usize) + Sync,
{
    fn rows_completed(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Copy `src` and rewrite each row with `f(y, row)`.
///
/// `row` holds only pixel bytes (`width * 3`), never padding.
pub(crate) fn map_rows<F>(src: &ImageBuffer, progress: Option<&dyn Progress>, f: F) -> ImageBuffer
where
    F: Fn(usize, &mut [u8]) + Sync + Send,
{
    let mut out = src.clone();
    let geometry = src.geometry();
    if geometry.pixel_count() == 0 {
        return out;
    }

    let total = geometry.height;
    let row_bytes = geometry.row_bytes();
    let done = AtomicUsize::new(0);

    out.data_mut()
        .par_chunks_mut(geometry.stride)
        .enumerate()
        .for_each(|(y, row)| {
            f(y, &mut row[..row_bytes]);
            if let Some(progress) = progress {
                let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                progress.rows_completed(completed, total);
            }
        });

    out
}

/// Apply one 256-entry lookup table per channel (B, G, R).
pub(crate) fn map_channels(
    src: &ImageBuffer,
    luts: &[[u8; 256]; 3],
    progress: Option<&dyn Progress>,
) -> ImageBuffer {
    map_rows(src, progress, |_, row| {
        for px in row.chunks_exact_mut(3) {
            px[0] = luts[0][px[0] as usize];
            px[1] = luts[1][px[1] as usize];
            px[2] = luts[2][px[2] as usize];
        }
    })
}

/// Apply the same lookup table to every channel.
pub(crate) fn map_lut(
    src: &ImageBuffer,
    lut: &[u8; 256],
    progress: Option<&dyn Progress>,
) -> ImageBuffer {
    map_rows(src, progress, |_, row| {
        for v in row.iter_mut() {
            *v = lut[*v as usize];
        }
    })
}

/// Build a lookup table from a per-value function.
pub(crate) fn build_lut(f: impl Fn(u8) -> u8) -> [u8; 256] {
    std::array::from_fn(|i| f(i as u8))
}

/// Round and saturate to a byte.
#[inline]
pub(crate) fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Geometry;
    use std::sync::Mutex;

    #[test]
    fn test_map_rows_preserves_padding() {
        let g = Geometry::new(1, 2, 5).unwrap();
        let data = vec![1, 2, 3, 77, 88, 4, 5, 6, 77, 88];
        let img = ImageBuffer::from_bytes(g, data).unwrap();

        let out = map_rows(&img, None, |_, row| {
            assert_eq!(row.len(), 3);
            row.fill(0);
        });

        assert_eq!(out.as_bytes(), &[0, 0, 0, 77, 88, 0, 0, 0, 77, 88]);
    }

    #[test]
    fn test_progress_reports_every_row() {
        let img = ImageBuffer::filled(Geometry::tight(4, 7), [1, 1, 1]).unwrap();
        let seen = Mutex::new(Vec::new());
        let progress = |done: usize, total: usize| {
            seen.lock().unwrap().push((done, total));
        };

        map_rows(&img, Some(&progress), |_, _| {});

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen.len(), 7);
        assert_eq!(seen.last(), Some(&(7, 7)));
    }

    #[test]
    fn test_clamp_u8_rounds_and_saturates() {
        assert_eq!(clamp_u8(-3.0), 0);
        assert_eq!(clamp_u8(2.5), 3);
        assert_eq!(clamp_u8(254.4), 254);
        assert_eq!(clamp_u8(1e9), 255);
    }
}
