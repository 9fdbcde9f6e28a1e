//! # Image Preparation
//!
//! Loads a picture and turns it into a [`Raster`] the encoder accepts:
//!
//! 1. Convert to 8-bit grayscale
//! 2. Resize to the print head width, keeping the aspect ratio
//! 3. Clamp the height to the profile's maximum
//! 4. Halftone with the selected [`DitherMethod`]

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};

use super::dither::{self, DitherMethod};
use crate::error::CatprintError;
use crate::protocol::encoder::INK_THRESHOLD;
use crate::protocol::raster::{Raster, RasterLimits};

/// Open an image file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<DynamicImage, CatprintError> {
    let path = path.as_ref();
    image::open(path)
        .map_err(|e| CatprintError::Image(format!("Failed to open {}: {}", path.display(), e)))
}

/// Target height for an image scaled to `width`, clamped to `max_height`.
pub fn scaled_height(src_width: u32, src_height: u32, width: usize, max_height: usize) -> usize {
    let aspect = src_height as f64 / src_width as f64;
    let height = (width as f64 * aspect) as usize;
    height.clamp(1, max_height)
}

/// Resize, convert and halftone `img` into a printable raster.
pub fn prepare(
    img: &DynamicImage,
    width: usize,
    limits: RasterLimits,
    method: DitherMethod,
) -> Result<Raster, CatprintError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(CatprintError::Image("image has no pixels".to_string()));
    }
    if width == 0 {
        return Err(CatprintError::config("target width must be positive"));
    }

    let height = scaled_height(img.width(), img.height(), width, limits.max_height);
    let filter = match method {
        DitherMethod::None => FilterType::Lanczos3,
        _ => FilterType::Triangle,
    };

    let gray = img.to_luma8();
    let resized = imageops::resize(&gray, width as u32, height as u32, filter);
    let pixels = dither::apply(method, width, height, resized.as_raw());

    Raster::new(width, height, pixels, limits)
}

/// Render what the printer will put on paper: ink as black, the rest white.
pub fn preview(raster: &Raster) -> GrayImage {
    let mut img = GrayImage::new(raster.width() as u32, raster.height() as u32);
    for (y, row) in raster.rows().enumerate() {
        for (x, &sample) in row.iter().enumerate() {
            let color = if sample <= INK_THRESHOLD { 0u8 } else { 255u8 };
            img.put_pixel(x as u32, y as u32, Luma([color]));
        }
    }
    img
}

/// Save [`preview`] as a PNG.
pub fn save_preview<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<(), CatprintError> {
    preview(raster)
        .save(path.as_ref())
        .map_err(|e| CatprintError::Image(format!("Failed to save PNG: {}", e)))
}
