//! # Catprint - Bluetooth Cat Printer Library
//!
//! Catprint drives the small 384-dot Bluetooth thermal printers that speak
//! the `0x51 0x78` command protocol. It provides:
//!
//! - **Protocol implementation**: fixed command blocks, CRC-8 row checksums,
//!   raster to command stream encoding
//! - **Transport**: a characteristic-based link abstraction, a paced and
//!   retried segmented writer, and a BLE link (feature `ble`)
//! - **Sessions**: connect, handshake, send, disconnect
//! - **Rendering**: image loading, resizing and halftoning
//!
//! ## Quick Start
//!
//! ```no_run
//! use catprint::{
//!     printer::{PrinterProfile, PrinterSession},
//!     protocol::encoder,
//!     render::{self, DitherMethod},
//!     transport::MemoryLink,
//! };
//!
//! # async fn run() -> Result<(), catprint::CatprintError> {
//! let profile = PrinterProfile::standard();
//!
//! // Prepare the picture
//! let img = render::image::load("cat.png")?;
//! let raster = render::image::prepare(
//!     &img,
//!     profile.width_dots,
//!     profile.raster_limits(),
//!     DitherMethod::default(),
//! )?;
//!
//! // Encode it
//! let packet = encoder::generate(&raster);
//!
//! // Send it (swap MemoryLink for BluetoothLink on real hardware)
//! let address = "AA:BB:CC:DD:EE:FF".parse()?;
//! let mut session = PrinterSession::new(MemoryLink::new(), address, profile.writer_config()?);
//! session.connect().await?;
//! session.send(&packet).await?;
//! session.disconnect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Command blocks, checksum, encoder |
//! | [`transport`] | Links and the segmented writer |
//! | [`printer`] | Profiles and sessions |
//! | [`render`] | Image preparation and dithering |
//! | [`error`] | Error types |

pub mod error;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use error::{CatprintError, LinkError};
pub use printer::{PrinterProfile, PrinterSession};
pub use protocol::{Packet, Raster, RasterLimits};
