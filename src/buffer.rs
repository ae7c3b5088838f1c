//! Packed BGR image buffer and its geometry.
//!
//! ## Memory Layout
//!
//! | Item | Value |
//! |------|-------|
//! | Pixel size | 3 bytes |
//! | Channel order | B, G, R |
//! | Row size | `stride` bytes (>= `width * 3`, may carry padding) |
//! | Buffer size | `stride * height` bytes |
//!
//! Pixel `(x, y)` starts at `y * stride + x * 3`. Padding bytes at the end of
//! each row are never interpreted and are carried through every transform.

use ndarray::{ArrayView3, ShapeBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Bytes per pixel.
pub const PIXEL_BYTES: usize = 3;

/// Image dimensions and row stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
}

impl Geometry {
    pub fn new(width: usize, height: usize, stride: usize) -> Result<Self> {
        let geometry = Geometry {
            width,
            height,
            stride,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Geometry without row padding.
    pub fn tight(width: usize, height: usize) -> Self {
        Geometry {
            width,
            height,
            stride: width * PIXEL_BYTES,
        }
    }

    /// Geometry whose rows are padded up to a multiple of `align` bytes.
    pub fn aligned(width: usize, height: usize, align: usize) -> Self {
        let row = width * PIXEL_BYTES;
        let stride = if align <= 1 { row } else { row.div_ceil(align) * align };
        Geometry {
            width,
            height,
            stride,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.stride < self.row_bytes() {
            return Err(EngineError::InvalidGeometry {
                width: self.width,
                height: self.height,
                stride: self.stride,
            });
        }
        Ok(())
    }

    /// Bytes of pixel data in one row, excluding padding.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width * PIXEL_BYTES
    }

    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.stride * self.height
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * PIXEL_BYTES
    }
}

/// One color channel of a BGR pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Blue,
    Green,
    Red,
}

impl Channel {
    /// Channels in memory order.
    pub const ALL: [Channel; 3] = [Channel::Blue, Channel::Green, Channel::Red];

    #[inline]
    pub fn offset(self) -> usize {
        match self {
            Channel::Blue => 0,
            Channel::Green => 1,
            Channel::Red => 2,
        }
    }
}

/// An owned BGR image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    geometry: Geometry,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap caller-supplied bytes, checking the geometry and buffer length.
    pub fn from_bytes(geometry: Geometry, data: Vec<u8>) -> Result<Self> {
        geometry.validate()?;
        if data.len() != geometry.buffer_len() {
            return Err(EngineError::BufferLength {
                expected: geometry.buffer_len(),
                actual: data.len(),
            });
        }
        Ok(ImageBuffer { geometry, data })
    }

    /// Image with every pixel set to `bgr`. Padding bytes are zero.
    pub fn filled(geometry: Geometry, bgr: [u8; 3]) -> Result<Self> {
        geometry.validate()?;
        let mut data = vec![0u8; geometry.buffer_len()];
        if geometry.stride > 0 {
            for row in data.chunks_exact_mut(geometry.stride) {
                for px in row[..geometry.row_bytes()].chunks_exact_mut(PIXEL_BYTES) {
                    px.copy_from_slice(&bgr);
                }
            }
        }
        Ok(ImageBuffer { geometry, data })
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.geometry.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.geometry.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.geometry.stride
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Pixel data of row `y`, without padding.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.geometry.stride;
        &self.data[start..start + self.geometry.row_bytes()]
    }

    /// Pixel at `(x, y)` as `[b, g, r]`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = self.geometry.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, bgr: [u8; 3]) {
        let i = self.geometry.index(x, y);
        self.data[i..i + PIXEL_BYTES].copy_from_slice(&bgr);
    }

    /// True when both images have the same width and height.
    pub fn same_size(&self, other: &ImageBuffer) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }

    pub(crate) fn ensure_same_size(&self, other: &ImageBuffer) -> Result<()> {
        if !self.same_size(other) {
            return Err(EngineError::GeometryMismatch {
                left: (self.width(), self.height()),
                right: (other.width(), other.height()),
            });
        }
        Ok(())
    }

    /// Strided `(height, width, 3)` view over the pixel data.
    pub fn view(&self) -> Result<ArrayView3<'_, u8>> {
        let g = self.geometry;
        if g.pixel_count() == 0 {
            return Ok(ArrayView3::from_shape((g.height, g.width, PIXEL_BYTES), &[])?);
        }
        let shape = (g.height, g.width, PIXEL_BYTES).strides((g.stride, PIXEL_BYTES, 1));
        Ok(ArrayView3::from_shape(shape, &self.data)?)
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_rejects_short_stride() {
        assert!(Geometry::new(4, 2, 11).is_err());
        assert!(Geometry::new(4, 2, 12).is_ok());
    }

    #[test]
    fn test_geometry_aligned_pads_rows() {
        let g = Geometry::aligned(5, 2, 4);
        assert_eq!(g.stride, 16);
        assert_eq!(g.buffer_len(), 32);
        assert_eq!(Geometry::aligned(4, 1, 4).stride, 12);
    }

    #[test]
    fn test_from_bytes_checks_length() {
        let g = Geometry::tight(2, 2);
        let err = ImageBuffer::from_bytes(g, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::BufferLength {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn test_pixel_access_uses_bgr_offsets() {
        let g = Geometry::aligned(3, 2, 4);
        let mut img = ImageBuffer::filled(g, [0, 0, 0]).unwrap();
        img.set_pixel(2, 1, [10, 20, 30]);

        let i = g.index(2, 1);
        assert_eq!(img.as_bytes()[i + Channel::Blue.offset()], 10);
        assert_eq!(img.as_bytes()[i + Channel::Green.offset()], 20);
        assert_eq!(img.as_bytes()[i + Channel::Red.offset()], 30);
        assert_eq!(img.pixel(2, 1), [10, 20, 30]);
    }

    #[test]
    fn test_view_skips_padding() {
        let g = Geometry::aligned(1, 2, 4);
        let data = vec![1, 2, 3, 99, 4, 5, 6, 99];
        let img = ImageBuffer::from_bytes(g, data).unwrap();
        let view = img.view().unwrap();

        assert_eq!(view.dim(), (2, 1, 3));
        assert_eq!(view[[1, 0, 0]], 4);
        assert_eq!(view[[1, 0, 2]], 6);
    }

    #[test]
    fn test_view_empty_image() {
        let img = ImageBuffer::filled(Geometry::tight(0, 0), [0, 0, 0]).unwrap();
        assert_eq!(img.view().unwrap().len(), 0);
    }
}
