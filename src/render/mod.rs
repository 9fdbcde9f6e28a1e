//! # Rendering
//!
//! Turns pictures into rasters the encoder can consume.
//!
//! - [`dither`]: Halftoning algorithms
//! - [`image`]: Load, resize, halftone, preview

pub mod dither;
pub mod image;

pub use dither::DitherMethod;
