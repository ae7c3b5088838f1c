//! Noise injection: Salt and Pepper.
//!
//! Random draws come from a seeded `StdRng`, so a given seed always produces
//! the same image. Rows are processed in order on one thread to keep the draw
//! sequence independent of scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::buffer::ImageBuffer;
use crate::error::{EngineError, Result};
use crate::pass::Progress;

/// Whether noise hits whole pixels or individual channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseMode {
    /// Whole pixels turn black or white
    #[default]
    Monochrome,
    /// Each channel independently turns 0 or 255
    Color,
}

/// Salt-and-pepper parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaltAndPepper {
    /// Fraction of samples replaced (0.0-1.0), half salt and half pepper
    pub density: f64,
    pub mode: NoiseMode,
    pub seed: u64,
}

impl Default for SaltAndPepper {
    fn default() -> Self {
        Self {
            density: 0.05,
            mode: NoiseMode::Monochrome,
            seed: 0,
        }
    }
}

impl SaltAndPepper {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.density) {
            return Err(EngineError::parameter(
                "density",
                format!("{} is outside [0, 1]", self.density),
            ));
        }
        Ok(())
    }
}

/// Draw once: pepper below `density / 2`, salt below `density`.
#[inline]
fn draw(rng: &mut StdRng, density: f64) -> Option<u8> {
    let r: f64 = rng.random();
    if r < density / 2.0 {
        Some(0)
    } else if r < density {
        Some(255)
    } else {
        None
    }
}

/// Replace a random fraction of pixels (or channels) with black or white.
pub fn salt_and_pepper(
    input: &ImageBuffer,
    params: &SaltAndPepper,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    params.validate()?;
    let mut output = input.clone();
    let geometry = input.geometry();
    if geometry.pixel_count() == 0 {
        return Ok(output);
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let row_bytes = geometry.row_bytes();

    for (y, row) in output.data_mut().chunks_mut(geometry.stride).enumerate() {
        for px in row[..row_bytes].chunks_exact_mut(3) {
            match params.mode {
                NoiseMode::Monochrome => {
                    if let Some(v) = draw(&mut rng, params.density) {
                        px.fill(v);
                    }
                }
                NoiseMode::Color => {
                    for channel in px.iter_mut() {
                        if let Some(v) = draw(&mut rng, params.density) {
                            *channel = v;
                        }
                    }
                }
            }
        }
        if let Some(progress) = progress {
            progress.rows_completed(y + 1, geometry.height);
        }
    }

    Ok(output)
}
