//! Operation records and timed dispatch.
//!
//! An [`Operation`] is a plain parameter record for one engine entry point.
//! Hosts build it directly or parse it from JSON:
//!
//! ```json
//! { "op": "brightness", "amount": 40 }
//! { "op": "median", "window": 5 }
//! { "op": "equalize", "space": "hsv" }
//! { "op": "convolve", "mode": { "mode": "linear",
//!     "kernel": { "size": 3, "weights": [0,-1,0,-1,5,-1,0,-1,0] } } }
//! ```
//!
//! Every call validates its parameters before touching a pixel and reports
//! how long the pass took.

use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::buffer::ImageBuffer;
use crate::error::{check_range, Result};
use crate::filters::{arithmetic, convolve, histogram, noise, order_stat, point, threshold};
use crate::filters::convolve::{kernels, ConvolutionMode};
use crate::filters::histogram::EqualizationSpace;
use crate::filters::noise::SaltAndPepper;
use crate::filters::order_stat::WindowSize;
use crate::pass::Progress;

/// Result of a pass plus its wall-clock duration.
#[derive(Debug, Clone)]
pub struct Processed {
    pub image: ImageBuffer,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Negative,
    Brightness { amount: i32 },
    Contrast { factor: f64 },
    ContrastEnhancement { brightness: i32, factor: f64 },
    ShiftBits { bits: u32 },
    Threshold { threshold: i32 },
    AutoThreshold { distance: i32 },
    SquareRoot,
    Equalize {
        #[serde(default)]
        space: EqualizationSpace,
    },
    Convolve { mode: ConvolutionMode },
    GaussianBlur { size: usize },
    Sharpen { size: usize },
    LowPass { size: usize },
    Sobel,
    Mean { window: WindowSize },
    Median { window: WindowSize },
    SaltAndPepper(SaltAndPepper),
}

impl Operation {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Negative => "negative",
            Operation::Brightness { .. } => "brightness",
            Operation::Contrast { .. } => "contrast",
            Operation::ContrastEnhancement { .. } => "contrast_enhancement",
            Operation::ShiftBits { .. } => "shift_bits",
            Operation::Threshold { .. } => "threshold",
            Operation::AutoThreshold { .. } => "auto_threshold",
            Operation::SquareRoot => "square_root",
            Operation::Equalize { .. } => "equalize",
            Operation::Convolve { .. } => "convolve",
            Operation::GaussianBlur { .. } => "gaussian_blur",
            Operation::Sharpen { .. } => "sharpen",
            Operation::LowPass { .. } => "low_pass",
            Operation::Sobel => "sobel",
            Operation::Mean { .. } => "mean",
            Operation::Median { .. } => "median",
            Operation::SaltAndPepper(_) => "salt_and_pepper",
        }
    }

    /// Check parameter ranges without running the operation.
    pub fn validate(&self) -> Result<()> {
        match self {
            Operation::ShiftBits { bits } => check_range("bits", *bits as i64, 0, 7),
            Operation::Threshold { threshold } => {
                check_range("threshold", *threshold as i64, 0, 255)
            }
            Operation::AutoThreshold { distance } => {
                check_range("distance", *distance as i64, 0, 255)
            }
            Operation::Contrast { factor } | Operation::ContrastEnhancement { factor, .. } => {
                point::check_factor(*factor)
            }
            Operation::Convolve { mode } => mode.validate(),
            Operation::GaussianBlur { size } => kernels::gaussian(*size).map(|_| ()),
            Operation::Sharpen { size } => kernels::sharpen(*size).map(|_| ()),
            Operation::LowPass { size } => kernels::low_pass(*size).map(|_| ()),
            Operation::SaltAndPepper(params) => params.validate(),
            Operation::Negative
            | Operation::Brightness { .. }
            | Operation::SquareRoot
            | Operation::Equalize { .. }
            | Operation::Sobel
            | Operation::Mean { .. }
            | Operation::Median { .. } => Ok(()),
        }
    }

    pub fn apply(&self, input: &ImageBuffer) -> Result<Processed> {
        self.apply_with_progress(input, None)
    }

    /// Validate, run and time the operation.
    pub fn apply_with_progress(
        &self,
        input: &ImageBuffer,
        progress: Option<&dyn Progress>,
    ) -> Result<Processed> {
        self.validate()?;
        timed(self.name(), input, || self.run(input, progress))
    }

    fn run(&self, input: &ImageBuffer, progress: Option<&dyn Progress>) -> Result<ImageBuffer> {
        Ok(match self {
            Operation::Negative => point::negative(input, progress),
            Operation::Brightness { amount } => point::brightness(input, *amount, progress),
            Operation::Contrast { factor } => point::contrast(input, *factor, progress)?,
            Operation::ContrastEnhancement { brightness, factor } => {
                point::contrast_enhancement(input, *brightness, *factor, progress)?
            }
            Operation::ShiftBits { bits } => point::shift_bits(input, *bits, progress)?,
            Operation::Threshold { threshold: t } => threshold::threshold(input, *t, progress)?,
            Operation::AutoThreshold { distance } => {
                threshold::auto_threshold(input, *distance, progress)?.0
            }
            Operation::SquareRoot => point::square_root(input, progress),
            Operation::Equalize { space } => histogram::equalize(input, *space, progress),
            Operation::Convolve { mode } => convolve::convolve(input, mode, progress)?,
            Operation::GaussianBlur { size } => convolve::gaussian_blur(input, *size, progress)?,
            Operation::Sharpen { size } => convolve::sharpen(input, *size, progress)?,
            Operation::LowPass { size } => convolve::low_pass(input, *size, progress)?,
            Operation::Sobel => convolve::convolve(input, &ConvolutionMode::sobel(), progress)?,
            Operation::Mean { window } => order_stat::mean_filter(input, *window, progress)?,
            Operation::Median { window } => order_stat::median_filter(input, *window, progress)?,
            Operation::SaltAndPepper(params) => noise::salt_and_pepper(input, params, progress)?,
        })
    }
}

/// Timed, logged image summation.
pub fn apply_sum(
    a: &ImageBuffer,
    b: &ImageBuffer,
    progress: Option<&dyn Progress>,
) -> Result<Processed> {
    timed("sum", a, || arithmetic::sum(a, b, progress))
}

/// Timed, logged image subtraction.
pub fn apply_subtract(
    a: &ImageBuffer,
    b: &ImageBuffer,
    progress: Option<&dyn Progress>,
) -> Result<Processed> {
    timed("subtract", a, || arithmetic::subtract(a, b, progress))
}

fn timed<F>(name: &str, input: &ImageBuffer, f: F) -> Result<Processed>
where
    F: FnOnce() -> Result<ImageBuffer>,
{
    let start = Instant::now();
    let image = f()?;
    let elapsed = start.elapsed();
    debug!(
        "{name} on {}x{} (stride {}) took {:?}",
        input.width(),
        input.height(),
        input.stride(),
        elapsed
    );
    Ok(Processed { image, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Geometry;
    use crate::error::EngineError;

    fn sample() -> ImageBuffer {
        let g = Geometry::aligned(9, 9, 4);
        let mut img = ImageBuffer::filled(g, [0, 0, 0]).unwrap();
        for y in 0..9 {
            for x in 0..9 {
                img.set_pixel(x, y, [(x * 28) as u8, (y * 28) as u8, ((x + y) * 14) as u8]);
            }
        }
        img
    }

    #[test]
    fn test_parse_operations_from_json() {
        let cases = [
            (r#"{"op":"negative"}"#, Operation::Negative),
            (r#"{"op":"brightness","amount":-20}"#, Operation::Brightness { amount: -20 }),
            (r#"{"op":"shift_bits","bits":3}"#, Operation::ShiftBits { bits: 3 }),
            (
                r#"{"op":"equalize"}"#,
                Operation::Equalize {
                    space: EqualizationSpace::Rgb,
                },
            ),
            (
                r#"{"op":"equalize","space":"yuv"}"#,
                Operation::Equalize {
                    space: EqualizationSpace::Yuv,
                },
            ),
            (
                r#"{"op":"median","window":7}"#,
                Operation::Median {
                    window: WindowSize::try_from(7).unwrap(),
                },
            ),
        ];
        for (json, expected) in cases {
            assert_eq!(Operation::from_json(json).unwrap(), expected, "{json}");
        }
    }

    #[test]
    fn test_parse_convolve_and_noise() {
        let json = r#"{"op":"convolve","mode":{"mode":"linear",
            "kernel":{"size":3,"weights":[0,-1,0,-1,5,-1,0,-1,0]}}}"#;
        let op = Operation::from_json(json).unwrap();
        assert_eq!(op.name(), "convolve");

        let json = r#"{"op":"salt_and_pepper","density":0.2,"mode":"color","seed":3}"#;
        let op = Operation::from_json(json).unwrap();
        assert!(matches!(
            op,
            Operation::SaltAndPepper(p) if p.seed == 3 && p.mode == noise::NoiseMode::Color
        ));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        for json in [r#"{"op":"median","window":4}"#, r#"{"op":"unknown"}"#] {
            assert!(matches!(Operation::from_json(json), Err(EngineError::Json(_))), "{json}");
        }
    }

    #[test]
    fn test_validate_rejects_before_running() {
        let img = sample();
        let bad = [
            Operation::ShiftBits { bits: 9 },
            Operation::Threshold { threshold: 300 },
            Operation::AutoThreshold { distance: -1 },
            Operation::Contrast { factor: -1.0 },
            Operation::GaussianBlur { size: 4 },
            Operation::SaltAndPepper(SaltAndPepper {
                density: 2.0,
                ..Default::default()
            }),
        ];
        for op in bad {
            assert!(op.validate().is_err(), "{op:?}");
            assert!(op.apply(&img).is_err(), "{op:?}");
        }
    }

    #[test]
    fn test_factor_validation_matches_filter() {
        let img = sample();
        let op = Operation::ContrastEnhancement {
            brightness: 0,
            factor: f64::NAN,
        };
        assert!(matches!(
            op.validate(),
            Err(EngineError::InvalidParameter { name: "factor", .. })
        ));
        assert!(matches!(
            point::contrast_enhancement(&img, 0, f64::NAN, None),
            Err(EngineError::InvalidParameter { name: "factor", .. })
        ));
    }

    #[test]
    fn test_dispatch_matches_direct_calls() {
        let img = sample();

        let via_op = Operation::Brightness { amount: 30 }.apply(&img).unwrap();
        assert_eq!(via_op.image, point::brightness(&img, 30, None));

        let via_op = Operation::Sobel.apply(&img).unwrap();
        assert_eq!(via_op.image, convolve::sobel(&img, None).unwrap());

        let window = WindowSize::try_from(3).unwrap();
        let via_op = Operation::Median { window }.apply(&img).unwrap();
        assert_eq!(via_op.image, order_stat::median_filter(&img, window, None).unwrap());
    }

    #[test]
    fn test_every_operation_keeps_geometry() {
        let img = sample();
        let window = WindowSize::try_from(5).unwrap();
        let ops = [
            Operation::Negative,
            Operation::Brightness { amount: 10 },
            Operation::Contrast { factor: 1.2 },
            Operation::ContrastEnhancement {
                brightness: -5,
                factor: 1.1,
            },
            Operation::ShiftBits { bits: 1 },
            Operation::Threshold { threshold: 128 },
            Operation::AutoThreshold { distance: 40 },
            Operation::SquareRoot,
            Operation::Equalize {
                space: EqualizationSpace::Hsv,
            },
            Operation::Convolve {
                mode: ConvolutionMode::linear(kernels::low_pass(3).unwrap()),
            },
            Operation::GaussianBlur { size: 5 },
            Operation::Sharpen { size: 3 },
            Operation::LowPass { size: 7 },
            Operation::Sobel,
            Operation::Mean { window },
            Operation::Median { window },
            Operation::SaltAndPepper(SaltAndPepper::default()),
        ];
        for op in ops {
            let out = op.apply(&img).unwrap();
            assert_eq!(out.image.geometry(), img.geometry(), "{}", op.name());
        }
    }

    #[test]
    fn test_pair_operations() {
        let img = sample();
        let doubled = apply_sum(&img, &img, None).unwrap();
        let back = apply_subtract(&doubled.image, &img, None).unwrap();
        // Values below 128 survive the round trip exactly.
        assert_eq!(back.image.pixel(1, 1), img.pixel(1, 1));

        let other = ImageBuffer::filled(Geometry::tight(3, 3), [0, 0, 0]).unwrap();
        assert!(matches!(
            apply_sum(&img, &other, None),
            Err(EngineError::GeometryMismatch { .. })
        ));
    }
}
