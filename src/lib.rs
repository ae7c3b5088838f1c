//! bgr_raster
//!
//! Pixel-processing engine for interleaved BGR byte buffers, with Python
//! bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! Every operation works on an [`ImageBuffer`]:
//! - **BGR8**: 3 bytes per pixel in blue, green, red order
//! - **Stride**: rows may be padded (`stride >= width * 3`); padding is preserved
//!
//! ## Architecture
//! Filters are stateless functions from an input buffer to a new buffer of the
//! same geometry. [`Operation`] records carry parameters for dispatch and JSON
//! configuration. [`EditSession`] layers undo/redo on top for hosts that need
//! it; the filters themselves never see it.

pub mod buffer;
pub mod error;
pub mod filters;
pub mod ops;
pub mod pass;
pub mod session;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use buffer::{Channel, Geometry, ImageBuffer};
pub use error::{EngineError, Result};
pub use ops::{apply_subtract, apply_sum, Operation, Processed};
pub use pass::Progress;
pub use session::{CompletionObserver, EditSession};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use ndarray::Array3;
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::buffer::{Geometry, ImageBuffer};
    use crate::error::EngineError;
    use crate::filters::convolve::{ConvolutionMode, Kernel};
    use crate::filters::histogram::EqualizationSpace;
    use crate::filters::noise::{NoiseMode, SaltAndPepper};
    use crate::filters::order_stat::WindowSize;
    use crate::filters::threshold as threshold_mod;
    use crate::filters::{arithmetic, convolve, histogram, noise, order_stat, point};
    use crate::ops::Operation;

    impl From<EngineError> for PyErr {
        fn from(err: EngineError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    /// Copy a numpy `(H, W, 3)` BGR array into a tightly packed buffer.
    fn to_buffer(image: &PyReadonlyArray3<'_, u8>) -> PyResult<ImageBuffer> {
        let input = image.as_array();
        let (height, width, channels) = input.dim();
        if channels != 3 {
            return Err(PyValueError::new_err(format!(
                "expected a (H, W, 3) BGR array, got {channels} channels"
            )));
        }
        let data: Vec<u8> = input.iter().copied().collect();
        Ok(ImageBuffer::from_bytes(Geometry::tight(width, height), data)?)
    }

    fn to_array<'py>(py: Python<'py>, image: ImageBuffer) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let (height, width) = (image.height(), image.width());
        let array = Array3::from_shape_vec((height, width, 3), image.into_bytes())
            .map_err(EngineError::from)?;
        Ok(array.into_pyarray(py))
    }

    fn parse_space(space: &str) -> PyResult<EqualizationSpace> {
        match space {
            "rgb" => Ok(EqualizationSpace::Rgb),
            "hsv" => Ok(EqualizationSpace::Hsv),
            "yuv" => Ok(EqualizationSpace::Yuv),
            other => Err(PyValueError::new_err(format!("unknown color space '{other}'"))),
        }
    }

    // ========================================================================
    // Point Operations
    // ========================================================================

    /// Invert every channel (255 - v).
    #[pyfunction]
    pub fn negative<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_buffer(&image)?;
        to_array(py, point::negative(&input, None))
    }

    /// Add `amount` to every channel, clamped to 0-255.
    #[pyfunction]
    pub fn brightness<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        amount: i32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_buffer(&image)?;
        to_array(py, point::brightness(&input, amount, None))
    }

    /// Scale every channel by `factor`.
    #[pyfunction]
    pub fn contrast<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        factor: f64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_buffer(&image)?;
        to_array(py, point::contrast(&input, factor, None)?)
    }

    /// Binarize each channel at `threshold`.
    #[pyfunction]
    pub fn threshold<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        threshold: i32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_buffer(&image)?;
        to_array(py, threshold_mod::threshold(&input, threshold, None)?)
    }

    /// Binarize each channel at the valley between its two histogram modes.
    ///
    /// # Returns
    /// Tuple of (image, (blue, green, red) thresholds)
    #[pyfunction]
    #[pyo3(signature = (image, distance=64))]
    pub fn auto_threshold<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        distance: i32,
    ) -> PyResult<(Bound<'py, PyArray3<u8>>, (u8, u8, u8))> {
        let input = to_buffer(&image)?;
        let (result, [b, g, r]) = threshold_mod::auto_threshold(&input, distance, None)?;
        Ok((to_array(py, result)?, (b, g, r)))
    }

    /// Saturating per-channel sum of two images of equal size.
    #[pyfunction]
    pub fn sum<'py>(
        py: Python<'py>,
        a: PyReadonlyArray3<'py, u8>,
        b: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let (a, b) = (to_buffer(&a)?, to_buffer(&b)?);
        to_array(py, arithmetic::sum(&a, &b, None)?)
    }

    /// Saturating per-channel difference `a - b`.
    #[pyfunction]
    pub fn subtract<'py>(
        py: Python<'py>,
        a: PyReadonlyArray3<'py, u8>,
        b: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let (a, b) = (to_buffer(&a)?, to_buffer(&b)?);
        to_array(py, arithmetic::subtract(&a, &b, None)?)
    }

    // ========================================================================
    // Histogram
    // ========================================================================

    /// Histogram equalization in `space` ("rgb", "hsv" or "yuv").
    #[pyfunction]
    #[pyo3(signature = (image, space="rgb"))]
    pub fn equalize<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        space: &str,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let space = parse_space(space)?;
        let input = to_buffer(&image)?;
        to_array(py, histogram::equalize(&input, space, None))
    }

    // ========================================================================
    // Convolution
    // ========================================================================

    /// Convolve with a square kernel given as a flat, row-major weight list.
    ///
    /// # Arguments
    /// * `size` - Kernel side length (3, 5 or 7)
    /// * `weights` - `size * size` weights
    /// * `divisor` - Response divisor (default: 1.0)
    #[pyfunction]
    #[pyo3(signature = (image, size, weights, divisor=1.0))]
    pub fn convolve_kernel<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        size: usize,
        weights: Vec<f64>,
        divisor: f64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let mode = ConvolutionMode::linear(Kernel::new(size, weights, divisor)?);
        let input = to_buffer(&image)?;
        to_array(py, convolve::convolve(&input, &mode, None)?)
    }

    #[pyfunction]
    #[pyo3(signature = (image, size=3))]
    pub fn gaussian_blur<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        size: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_buffer(&image)?;
        to_array(py, convolve::gaussian_blur(&input, size, None)?)
    }

    #[pyfunction]
    #[pyo3(signature = (image, size=3))]
    pub fn sharpen<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        size: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_buffer(&image)?;
        to_array(py, convolve::sharpen(&input, size, None)?)
    }

    /// Sobel gradient magnitude.
    #[pyfunction]
    pub fn sobel<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = to_buffer(&image)?;
        to_array(py, convolve::sobel(&input, None)?)
    }

    // ========================================================================
    // Order Statistic & Noise
    // ========================================================================

    #[pyfunction]
    #[pyo3(signature = (image, window=3))]
    pub fn mean<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        window: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let window = WindowSize::try_from(window)?;
        let input = to_buffer(&image)?;
        to_array(py, order_stat::mean_filter(&input, window, None)?)
    }

    #[pyfunction]
    #[pyo3(signature = (image, window=3))]
    pub fn median<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        window: usize,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let window = WindowSize::try_from(window)?;
        let input = to_buffer(&image)?;
        to_array(py, order_stat::median_filter(&input, window, None)?)
    }

    /// Salt-and-pepper noise.
    ///
    /// # Arguments
    /// * `density` - Fraction of samples replaced (0.0-1.0)
    /// * `color` - Hit channels independently instead of whole pixels
    /// * `seed` - Random seed
    #[pyfunction]
    #[pyo3(signature = (image, density=0.05, color=false, seed=0))]
    pub fn salt_and_pepper<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        density: f64,
        color: bool,
        seed: u64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let params = SaltAndPepper {
            density,
            mode: if color { NoiseMode::Color } else { NoiseMode::Monochrome },
            seed,
        };
        let input = to_buffer(&image)?;
        to_array(py, noise::salt_and_pepper(&input, &params, None)?)
    }

    // ========================================================================
    // Generic dispatch
    // ========================================================================

    /// Run an operation described as JSON, e.g. `{"op": "median", "window": 5}`.
    #[pyfunction]
    pub fn apply<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        op_json: &str,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let op = Operation::from_json(op_json)?;
        let input = to_buffer(&image)?;
        let processed = op.apply(&input)?;
        to_array(py, processed.image)
    }

    #[pymodule]
    pub fn bgr_raster(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Point operations
        m.add_function(wrap_pyfunction!(negative, m)?)?;
        m.add_function(wrap_pyfunction!(brightness, m)?)?;
        m.add_function(wrap_pyfunction!(contrast, m)?)?;
        m.add_function(wrap_pyfunction!(threshold, m)?)?;
        m.add_function(wrap_pyfunction!(auto_threshold, m)?)?;
        m.add_function(wrap_pyfunction!(sum, m)?)?;
        m.add_function(wrap_pyfunction!(subtract, m)?)?;

        // Histogram
        m.add_function(wrap_pyfunction!(equalize, m)?)?;

        // Convolution
        m.add_function(wrap_pyfunction!(convolve_kernel, m)?)?;
        m.add_function(wrap_pyfunction!(gaussian_blur, m)?)?;
        m.add_function(wrap_pyfunction!(sharpen, m)?)?;
        m.add_function(wrap_pyfunction!(sobel, m)?)?;

        // Order statistic & noise
        m.add_function(wrap_pyfunction!(mean, m)?)?;
        m.add_function(wrap_pyfunction!(median, m)?)?;
        m.add_function(wrap_pyfunction!(salt_and_pepper, m)?)?;

        m.add_function(wrap_pyfunction!(apply, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::bgr_raster;
