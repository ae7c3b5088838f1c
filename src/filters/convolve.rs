//! Generic square-kernel convolution: blur, sharpen, low-pass, Sobel.
//!
//! Kernels are 3x3, 5x5 or 7x7. Only interior pixels are computed; a border
//! of `size / 2` pixels on every side is copied from the input unchanged.
//! Sums are accumulated in `f64` and clamped to a byte only at the end.
//!
//! Two combination modes:
//! - **Linear**: `clamp(round(sum / divisor))`
//! - **Magnitude**: two directional kernels, `clamp(round(sqrt(gx² + gy²)))`

use ndarray::{s, Array2, ArrayView3, Zip};
use serde::{Deserialize, Serialize};

use crate::buffer::ImageBuffer;
use crate::error::{EngineError, Result};
use crate::pass::{clamp_u8, map_rows, Progress};

/// Kernel sizes the engine accepts.
pub const KERNEL_SIZES: [usize; 3] = [3, 5, 7];

fn check_kernel_size(size: usize) -> Result<()> {
    if !KERNEL_SIZES.contains(&size) {
        return Err(EngineError::InvalidKernel(format!(
            "size {size} is not one of {KERNEL_SIZES:?}"
        )));
    }
    Ok(())
}

/// Square weight matrix plus the divisor applied to its weighted sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKernel", into = "RawKernel")]
pub struct Kernel {
    weights: Array2<f64>,
    divisor: f64,
}

/// Serialized form: `{ "size": 3, "weights": [..row-major..], "divisor": 16 }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawKernel {
    size: usize,
    weights: Vec<f64>,
    #[serde(default = "unit_divisor")]
    divisor: f64,
}

fn unit_divisor() -> f64 {
    1.0
}

impl TryFrom<RawKernel> for Kernel {
    type Error = EngineError;

    fn try_from(raw: RawKernel) -> Result<Self> {
        Kernel::new(raw.size, raw.weights, raw.divisor)
    }
}

impl From<Kernel> for RawKernel {
    fn from(kernel: Kernel) -> Self {
        RawKernel {
            size: kernel.size(),
            divisor: kernel.divisor,
            weights: kernel.weights.iter().copied().collect(),
        }
    }
}

impl Kernel {
    /// Build a kernel from row-major weights.
    ///
    /// # Errors
    /// Size must be 3, 5 or 7, `weights` must hold `size²` finite values and
    /// `divisor` must be finite and non-zero.
    pub fn new(size: usize, weights: Vec<f64>, divisor: f64) -> Result<Self> {
        check_kernel_size(size)?;
        if weights.len() != size * size {
            return Err(EngineError::InvalidKernel(format!(
                "expected {} weights for a {size}x{size} kernel, got {}",
                size * size,
                weights.len()
            )));
        }
        let weights = Array2::from_shape_vec((size, size), weights)?;
        Kernel::from_array(weights, divisor)
    }

    pub fn from_array(weights: Array2<f64>, divisor: f64) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows != cols {
            return Err(EngineError::InvalidKernel(format!(
                "kernel must be square, got {rows}x{cols}"
            )));
        }
        check_kernel_size(rows)?;
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(EngineError::InvalidKernel("weights must be finite".into()));
        }
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(EngineError::InvalidKernel(format!(
                "divisor {divisor} must be finite and non-zero"
            )));
        }
        Ok(Kernel { weights, divisor })
    }

    /// Kernel whose divisor is the weight sum (1 when the weights cancel out).
    pub fn normalized(size: usize, weights: Vec<f64>) -> Result<Self> {
        let sum: f64 = weights.iter().sum();
        let divisor = if sum == 0.0 { 1.0 } else { sum };
        Kernel::new(size, weights, divisor)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.weights.nrows()
    }

    #[inline]
    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Weighted sum around `(y, x)` in channel `c`, divided by the divisor.
    ///
    /// The caller guarantees the window lies inside the image.
    #[inline]
    fn response(&self, src: &ArrayView3<u8>, y: usize, x: usize, c: usize) -> f64 {
        let half = self.size() / 2;
        let window = src.slice(s![y - half..=y + half, x - half..=x + half, c]);
        let sum = Zip::from(&window)
            .and(&self.weights)
            .fold(0.0, |acc, &p, &w| acc + p as f64 * w);
        sum / self.divisor
    }
}

/// Preset kernels.
pub mod kernels {
    use super::*;

    static BINOMIAL_3: [f64; 3] = [1.0, 2.0, 1.0];
    static BINOMIAL_5: [f64; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
    static BINOMIAL_7: [f64; 7] = [1.0, 6.0, 15.0, 20.0, 15.0, 6.0, 1.0];

    fn binomial_row(size: usize) -> Result<&'static [f64]> {
        match size {
            3 => Ok(&BINOMIAL_3[..]),
            5 => Ok(&BINOMIAL_5[..]),
            7 => Ok(&BINOMIAL_7[..]),
            _ => Err(EngineError::InvalidKernel(format!(
                "size {size} is not one of {KERNEL_SIZES:?}"
            ))),
        }
    }

    /// Binomial approximation of a Gaussian.
    ///
    /// Weights sum to 16, 256 and 4096 for sizes 3, 5 and 7.
    pub fn gaussian(size: usize) -> Result<Kernel> {
        let row = binomial_row(size)?;
        let weights = Array2::from_shape_fn((size, size), |(i, j)| row[i] * row[j]);
        let divisor = weights.sum();
        Kernel::from_array(weights, divisor)
    }

    /// Box average.
    pub fn low_pass(size: usize) -> Result<Kernel> {
        check_kernel_size(size)?;
        Kernel::from_array(Array2::ones((size, size)), (size * size) as f64)
    }

    /// All `-1` with a centre weight of `size²`; weights sum to 1.
    pub fn sharpen(size: usize) -> Result<Kernel> {
        check_kernel_size(size)?;
        let mut weights = Array2::from_elem((size, size), -1.0);
        weights[[size / 2, size / 2]] = (size * size) as f64;
        Kernel::from_array(weights, 1.0)
    }

    pub fn sobel_x() -> Kernel {
        Kernel {
            weights: ndarray::arr2(&[[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]]),
            divisor: 1.0,
        }
    }

    pub fn sobel_y() -> Kernel {
        Kernel {
            weights: ndarray::arr2(&[[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]]),
            divisor: 1.0,
        }
    }
}

/// How kernel responses combine into the output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConvolutionMode {
    Linear { kernel: Kernel },
    /// Gradient magnitude of two directional kernels of equal size
    Magnitude { x: Kernel, y: Kernel },
}

impl ConvolutionMode {
    pub fn linear(kernel: Kernel) -> Self {
        ConvolutionMode::Linear { kernel }
    }

    pub fn sobel() -> Self {
        ConvolutionMode::Magnitude {
            x: kernels::sobel_x(),
            y: kernels::sobel_y(),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            ConvolutionMode::Linear { kernel } => kernel.size(),
            ConvolutionMode::Magnitude { x, .. } => x.size(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let ConvolutionMode::Magnitude { x, y } = self {
            if x.size() != y.size() {
                return Err(EngineError::InvalidKernel(format!(
                    "gradient kernels differ in size: {} vs {}",
                    x.size(),
                    y.size()
                )));
            }
        }
        Ok(())
    }
}

/// Convolve every interior pixel of `input`.
///
/// Images smaller than the kernel are returned unchanged.
pub fn convolve(
    input: &ImageBuffer,
    mode: &ConvolutionMode,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    mode.validate()?;
    let size = mode.size();
    let half = size / 2;
    let (height, width) = (input.height(), input.width());

    if width < size || height < size {
        return Ok(input.clone());
    }

    let src = input.view()?;
    Ok(map_rows(input, progress, |y, row| {
        if y < half || y + half >= height {
            return;
        }
        for x in half..width - half {
            for c in 0..3 {
                row[x * 3 + c] = match mode {
                    ConvolutionMode::Linear { kernel } => clamp_u8(kernel.response(&src, y, x, c)),
                    ConvolutionMode::Magnitude { x: kx, y: ky } => {
                        let gx = kx.response(&src, y, x, c);
                        let gy = ky.response(&src, y, x, c);
                        clamp_u8((gx * gx + gy * gy).sqrt())
                    }
                };
            }
        }
    }))
}

pub fn gaussian_blur(
    input: &ImageBuffer,
    size: usize,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    convolve(input, &ConvolutionMode::linear(kernels::gaussian(size)?), progress)
}

pub fn sharpen(
    input: &ImageBuffer,
    size: usize,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    convolve(input, &ConvolutionMode::linear(kernels::sharpen(size)?), progress)
}

pub fn low_pass(
    input: &ImageBuffer,
    size: usize,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    convolve(input, &ConvolutionMode::linear(kernels::low_pass(size)?), progress)
}

/// Sobel gradient magnitude, per channel.
pub fn sobel(input: &ImageBuffer, progress: Option<&dyn Progress>) -> Result<ImageBuffer> {
    convolve(input, &ConvolutionMode::sobel(), progress)
}
