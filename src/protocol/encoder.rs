//! # Frame Encoder
//!
//! Turns a grayscale [`Raster`] into the complete command stream for one print.
//!
//! ## Stream Layout
//!
//! ```text
//! HEADER
//! for each row:
//!     LINE_PREFIX
//!     51 78 BF 00 <n> 00 <bitmap: n bytes> <crc8(bitmap)> FF
//! FOOTER
//! ```
//!
//! where `n = ceil(width / 8)`.
//!
//! ## Thresholding
//!
//! A sample `<= 0x80` is ink (bit set), anything brighter is paper (bit clear).
//!
//! ## Bit Packing
//!
//! Rows are packed the way the vendor app does it: for every pixel the
//! current byte is shifted right by one, and ink ORs in `0x80`. After eight
//! pixels the first one has travelled down to bit 0:
//!
//! ```text
//! pixels:  x0 x1 x2 x3 x4 x5 x6 x7
//! byte:    b7=x7 b6=x6 ... b1=x1 b0=x0
//! ```
//!
//! When the width is not a multiple of 8, the `k` pixels of the last byte end
//! up in its top `k` bits and the bottom bits stay zero.

use super::checksum::crc8;
use super::commands::{FOOTER, HEADER, LINE_PREFIX, TERMINATOR, row_header};
use super::packet::Packet;
use super::raster::Raster;

/// Brightest sample still printed as ink
pub const INK_THRESHOLD: u8 = 0x80;

/// Bytes added around each row's bitmap: prefix + row header + crc + terminator
const ROW_OVERHEAD: usize = LINE_PREFIX.len() + 6 + 2;

#[inline]
fn is_ink(sample: u8) -> bool {
    sample <= INK_THRESHOLD
}

/// Pack one row of samples into a bitmap line of `ceil(len / 8)` bytes.
///
/// ## Example
///
/// ```
/// use catprint::protocol::encoder::pack_line;
///
/// // First pixel ends in the least significant bit
/// assert_eq!(pack_line(&[0, 255, 255, 255, 255, 255, 255, 255]), vec![0x01]);
/// assert_eq!(pack_line(&[255, 255, 255, 255, 255, 255, 255, 0]), vec![0x80]);
///
/// // A partial byte fills from the top
/// assert_eq!(pack_line(&[0; 12]), vec![0xFF, 0xF0]);
/// ```
pub fn pack_line(row: &[u8]) -> Vec<u8> {
    let mut line = vec![0u8; row.len().div_ceil(8)];

    for (x, &sample) in row.iter().enumerate() {
        let byte = &mut line[x / 8];
        *byte >>= 1;
        if is_ink(sample) {
            *byte |= 0x80;
        }
    }

    line
}

/// Append the framed command for one bitmap line.
fn push_row(packet: &mut Packet, line: &[u8]) {
    // Raster::new caps the width so the length always fits one byte.
    let len = line.len() as u8;

    packet.extend_from_slice(&LINE_PREFIX);
    packet.extend_from_slice(&row_header(len));
    packet.extend_from_slice(line);
    packet.push(crc8(line) as u8);
    packet.push(TERMINATOR);
}

/// Encode a raster into the full print stream.
///
/// Pure and deterministic: the same raster always yields the same bytes.
///
/// ## Example
///
/// ```
/// use catprint::protocol::{commands, encoder, raster::{Raster, RasterLimits}};
///
/// let raster = Raster::filled(8, 1, 0, RasterLimits::default())?;
/// let packet = encoder::generate(&raster);
///
/// assert!(packet.as_bytes().starts_with(&commands::HEADER));
/// assert!(packet.as_bytes().ends_with(&commands::FOOTER));
/// # Ok::<(), catprint::CatprintError>(())
/// ```
pub fn generate(raster: &Raster) -> Packet {
    let line_bytes = raster.line_bytes();
    let capacity =
        HEADER.len() + raster.height() * (ROW_OVERHEAD + line_bytes) + FOOTER.len();
    let mut packet = Packet::with_capacity(capacity);

    packet.extend_from_slice(&HEADER);
    for row in raster.rows() {
        let line = pack_line(row);
        debug_assert_eq!(line.len(), line_bytes);
        push_row(&mut packet, &line);
    }
    packet.extend_from_slice(&FOOTER);

    packet
}

// ============================================================================
// TESTS
// ============================================================================
