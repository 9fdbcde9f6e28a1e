//! # Grayscale Raster
//!
//! The encoder input: an immutable row-major matrix of 8-bit grayscale samples
//! (0 = black, 255 = white). A [`Raster`] can only be built through
//! [`Raster::new`], which checks the dimensions against [`RasterLimits`], so the
//! encoder never has to re-validate.

use crate::error::CatprintError;

/// Largest width whose packed row length still fits the one-byte length field.
pub const MAX_WIDTH_DOTS: usize = 255 * 8;

/// Upper bounds a raster must satisfy before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLimits {
    /// Maximum number of rows
    pub max_height: usize,
}

impl RasterLimits {
    pub const fn new(max_height: usize) -> Self {
        Self { max_height }
    }
}

impl Default for RasterLimits {
    fn default() -> Self {
        Self::new(1536)
    }
}

/// Immutable grayscale image handed to the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Raster {
    /// Build a raster from row-major samples.
    ///
    /// ## Errors
    ///
    /// Returns [`CatprintError::Config`] if:
    /// - width or height is zero
    /// - height exceeds `limits.max_height`
    /// - width exceeds [`MAX_WIDTH_DOTS`]
    /// - `pixels.len() != width * height`
    ///
    /// ## Example
    ///
    /// ```
    /// use catprint::protocol::raster::{Raster, RasterLimits};
    ///
    /// let raster = Raster::new(8, 2, vec![0; 16], RasterLimits::default())?;
    /// assert_eq!(raster.line_bytes(), 1);
    /// assert!(Raster::new(0, 2, vec![], RasterLimits::default()).is_err());
    /// # Ok::<(), catprint::CatprintError>(())
    /// ```
    pub fn new(
        width: usize,
        height: usize,
        pixels: Vec<u8>,
        limits: RasterLimits,
    ) -> Result<Self, CatprintError> {
        if width == 0 || height == 0 {
            return Err(CatprintError::config(format!(
                "raster dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if width > MAX_WIDTH_DOTS {
            return Err(CatprintError::config(format!(
                "raster width {} exceeds {} dots",
                width, MAX_WIDTH_DOTS
            )));
        }
        if height > limits.max_height {
            return Err(CatprintError::config(format!(
                "raster height {} exceeds maximum {}",
                height, limits.max_height
            )));
        }
        if pixels.len() != width * height {
            return Err(CatprintError::config(format!(
                "expected {} samples for {}x{}, got {}",
                width * height,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a raster where every sample has the same value.
    pub fn filled(
        width: usize,
        height: usize,
        value: u8,
        limits: RasterLimits,
    ) -> Result<Self, CatprintError> {
        Self::new(width, height, vec![value; width * height], limits)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Packed bytes per row: `ceil(width / 8)`.
    #[inline]
    pub fn line_bytes(&self) -> usize {
        self.width.div_ceil(8)
    }

    /// Samples of row `y`, or `None` past the last row.
    #[inline]
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.pixels.get(start..start + self.width)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(self.width)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_raster() {
        let r = Raster::new(3, 2, vec![1, 2, 3, 4, 5, 6], RasterLimits::default()).unwrap();
        assert_eq!(r.width(), 3);
        assert_eq!(r.height(), 2);
        assert_eq!(r.row(1), Some(&[4u8, 5, 6][..]));
        assert_eq!(r.row(2), None);
        assert_eq!(r.rows().count(), 2);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let limits = RasterLimits::default();
        assert!(matches!(
            Raster::new(0, 1, vec![], limits),
            Err(CatprintError::Config(_))
        ));
        assert!(matches!(
            Raster::new(1, 0, vec![], limits),
            Err(CatprintError::Config(_))
        ));
    }

    #[test]
    fn test_height_limit() {
        let limits = RasterLimits::new(4);
        assert!(Raster::filled(8, 4, 0, limits).is_ok());
        assert!(matches!(
            Raster::filled(8, 5, 0, limits),
            Err(CatprintError::Config(_))
        ));
    }

    #[test]
    fn test_width_limit() {
        let limits = RasterLimits::new(1);
        assert!(Raster::filled(MAX_WIDTH_DOTS, 1, 0, limits).is_ok());
        assert!(Raster::filled(MAX_WIDTH_DOTS + 1, 1, 0, limits).is_err());
    }

    #[test]
    fn test_sample_count_mismatch() {
        let err = Raster::new(4, 2, vec![0; 7], RasterLimits::default()).unwrap_err();
        assert!(err.to_string().contains("expected 8 samples"));
    }

    #[test]
    fn test_line_bytes_rounds_up() {
        let limits = RasterLimits::default();
        assert_eq!(Raster::filled(1, 1, 0, limits).unwrap().line_bytes(), 1);
        assert_eq!(Raster::filled(8, 1, 0, limits).unwrap().line_bytes(), 1);
        assert_eq!(Raster::filled(9, 1, 0, limits).unwrap().line_bytes(), 2);
        assert_eq!(Raster::filled(384, 1, 0, limits).unwrap().line_bytes(), 48);
    }
}
