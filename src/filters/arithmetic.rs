//! Image-pair arithmetic: Summation and Subtraction.
//!
//! Both images must have the same width and height; their strides may differ.
//! The output takes the first image's geometry.

use crate::buffer::ImageBuffer;
use crate::error::Result;
use crate::pass::{map_rows, Progress};

/// Per-channel saturating sum `a + b`.
///
/// Summing an image with itself doubles its brightness.
pub fn sum(
    a: &ImageBuffer,
    b: &ImageBuffer,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    combine(a, b, progress, u8::saturating_add)
}

/// Per-channel saturating difference `a - b`, never below 0.
pub fn subtract(
    a: &ImageBuffer,
    b: &ImageBuffer,
    progress: Option<&dyn Progress>,
) -> Result<ImageBuffer> {
    combine(a, b, progress, u8::saturating_sub)
}

fn combine<F>(
    a: &ImageBuffer,
    b: &ImageBuffer,
    progress: Option<&dyn Progress>,
    op: F,
) -> Result<ImageBuffer>
where
    F: Fn(u8, u8) -> u8 + Sync + Send,
{
    a.ensure_same_size(b)?;
    Ok(map_rows(a, progress, |y, row| {
        for (dst, &rhs) in row.iter_mut().zip(b.row(y)) {
            *dst = op(*dst, rhs);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Geometry;
    use crate::error::EngineError;

    #[test]
    fn test_sum_saturates() {
        let a = ImageBuffer::filled(Geometry::tight(2, 2), [100, 200, 0]).unwrap();
        let b = ImageBuffer::filled(Geometry::tight(2, 2), [100, 100, 7]).unwrap();

        let result = sum(&a, &b, None).unwrap();

        assert_eq!(result.pixel(1, 0), [200, 255, 7]);
    }

    #[test]
    fn test_self_sum_doubles() {
        let a = ImageBuffer::filled(Geometry::tight(3, 1), [20, 60, 127]).unwrap();
        let result = sum(&a, &a, None).unwrap();
        assert_eq!(result.pixel(2, 0), [40, 120, 254]);
    }

    #[test]
    fn test_subtract_floors_at_zero() {
        let a = ImageBuffer::filled(Geometry::tight(2, 2), [50, 200, 10]).unwrap();
        let b = ImageBuffer::filled(Geometry::tight(2, 2), [100, 50, 10]).unwrap();

        let result = subtract(&a, &b, None).unwrap();

        assert_eq!(result.pixel(0, 1), [0, 150, 0]);
    }

    #[test]
    fn test_different_strides_are_accepted() {
        let a = ImageBuffer::filled(Geometry::aligned(3, 2, 8), [1, 2, 3]).unwrap();
        let b = ImageBuffer::filled(Geometry::tight(3, 2), [4, 5, 6]).unwrap();

        let result = sum(&a, &b, None).unwrap();

        assert_eq!(result.geometry(), a.geometry());
        assert_eq!(result.pixel(2, 1), [5, 7, 9]);
    }

    #[test]
    fn test_size_mismatch_fails() {
        let a = ImageBuffer::filled(Geometry::tight(3, 2), [0, 0, 0]).unwrap();
        let b = ImageBuffer::filled(Geometry::tight(2, 3), [0, 0, 0]).unwrap();

        let err = subtract(&a, &b, None).unwrap_err();
        assert!(matches!(err, EngineError::GeometryMismatch { .. }));
    }
}
