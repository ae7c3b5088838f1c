//! Pixel filters over BGR byte buffers.
//!
//! ## Supported Formats
//!
//! Every filter takes an [`ImageBuffer`](crate::buffer::ImageBuffer):
//!
//! | Format | Layout | Type | Description |
//! |--------|--------|------|-------------|
//! | BGR8 | stride * H bytes | u8 | Blue, green, red per pixel, 0-255 |
//!
//! Rows may carry padding past `width * 3`. Padding bytes are copied through
//! untouched and never read as pixel data.
//!
//! ## Architecture
//!
//! - **Non-destructive** - The input buffer is never modified; each filter returns a new one
//! - **Row-parallel** - Passes split the output by rows with rayon
//! - **Progress** - An optional [`Progress`](crate::pass::Progress) observer sees rows complete
//!
//! ## Filter Categories
//!
//! - **Point**: negative, brightness, contrast, contrast enhancement, shift bits, square root
//! - **Threshold**: fixed and histogram-valley automatic threshold
//! - **Arithmetic**: saturating sum and subtraction of two images
//! - **Histogram**: histograms, CDF, equalization in RGB, HSV or YUV
//! - **Convolution**: user kernels, Gaussian, low pass, sharpen, Sobel magnitude
//! - **Order statistic**: mean and median windows
//! - **Noise**: salt and pepper

pub mod arithmetic;
pub mod color_space;
pub mod convolve;
pub mod histogram;
pub mod noise;
pub mod order_stat;
pub mod point;
pub mod threshold;
