//! # Cat Printer Protocol Implementation
//!
//! This module turns a grayscale raster into the byte stream understood by
//! the `0x51 0x78` family of Bluetooth thermal printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Fixed command blocks (header, row prefix, footer, handshake)
//! - [`checksum`]: Table-driven CRC-8 over bitmap rows
//! - [`raster`]: Validated grayscale input image
//! - [`encoder`]: Raster to command stream
//! - [`packet`]: The encoded byte stream
//!
//! ## Usage Example
//!
//! ```
//! use catprint::protocol::{encoder, raster::{Raster, RasterLimits}};
//!
//! // 384 dots wide, 2 rows: one black, one white
//! let mut pixels = vec![0u8; 384];
//! pixels.extend(vec![255u8; 384]);
//! let raster = Raster::new(384, 2, pixels, RasterLimits::default())?;
//!
//! let packet = encoder::generate(&raster);
//! // Send `packet` through a PrinterSession...
//! # Ok::<(), catprint::CatprintError>(())
//! ```

pub mod checksum;
pub mod commands;
pub mod encoder;
pub mod packet;
pub mod raster;

pub use packet::Packet;
pub use raster::{Raster, RasterLimits};
