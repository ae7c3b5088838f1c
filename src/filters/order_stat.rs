//! Order-statistic filters: Mean and Median.
//!
//! Both collect the `n x n` neighbourhood of every interior pixel, per channel,
//! and reduce it to one value. A border of `n / 2` pixels is left unchanged,
//! the same policy as convolution.

use serde::{Deserialize, Serialize};

use crate::buffer::ImageBuffer;
use crate::error::{EngineError, Result};
use crate::pass::{map_rows, Progress};

/// Side length of a square filter window: 3, 5, 7 or 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct WindowSize(usize);

impl WindowSize {
    pub const ALLOWED: [usize; 4] = [3, 5, 7, 9];

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    #[inline]
    pub fn area(self) -> usize {
        self.0 * self.0
    }
}

impl TryFrom<usize> for WindowSize {
    type Error = EngineError;

    fn try_from(size: usize) -> Result<Self> {
        if !Self::ALLOWED.contains(&size) {
            return Err(EngineError::parameter(
                "window",
                format!("{size} is not one of {:?}", Self::ALLOWED),
            ));
        }
        Ok(WindowSize(size))
    }
}

impl From<WindowSize> for usize {
    fn from(window: WindowSize) -> usize {
        window.0
    }
}

/// Run `reduce` over the neighbourhood of every interior pixel and channel.
fn neighbourhood_filter<F>(
    input: &ImageBuffer,
    window: WindowSize,
    progress: Option<&dyn Progress>,
    reduce: F,
) -> Result<ImageBuffer>
where
    F: Fn(&mut [u8]) -> u8 + Sync + Send,
{
    let n = window.get();
    let half = n / 2;
    let (height, width) = (input.height(), input.width());

    if width < n || height < n {
        return Ok(input.clone());
    }

    let src = input.view()?;
    Ok(map_rows(input, progress, |y, row| {
        if y < half || y + half >= height {
            return;
        }
        let mut values = Vec::with_capacity(window.area());
        for x in half..width - half {
            for c in 0..3 {
                values.clear();
                for sy in y - half..=y + half {
                    for sx in x - half..=x + half {
                        values.push(src[[sy, sx, c]]);
                    }
                }
                row[x * 3 + c] = reduce(values.as_mut_slice());
            }
        }
    }))
}

/// Replace each interior channel value with the truncated neighbourhood mean.
pub fn mean_filter(
    input: &ImageBuffer,
    window: WindowSize,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    neighbourhood_filter(input, window, progress, |values| {
        let sum: u32 = values.iter().map(|&v| v as u32).sum();
        (sum / values.len() as u32) as u8
    })
}

/// Replace each interior channel value with the neighbourhood median.
///
/// Removes salt-and-pepper noise while preserving edges.
pub fn median_filter(
    input: &ImageBuffer,
    window: WindowSize,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    neighbourhood_filter(input, window, progress, |values| {
        values.sort_unstable();
        values[values.len() / 2]
    })
}
