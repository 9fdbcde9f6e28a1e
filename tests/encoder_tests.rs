//! # Encoder Tests
//!
//! Byte-exact checks of complete print streams for small rasters, plus
//! structural checks that hold for any raster size.

use catprint::protocol::checksum::{crc8, crc8_unsigned};
use catprint::protocol::commands::{FOOTER, HEADER, LINE_PREFIX};
use catprint::protocol::encoder::{self, pack_line};
use catprint::{CatprintError, Raster, RasterLimits};
use pretty_assertions::assert_eq;

fn stream(width: usize, height: usize, pixels: Vec<u8>) -> Vec<u8> {
    let raster = Raster::new(width, height, pixels, RasterLimits::default()).unwrap();
    encoder::generate(&raster).into_bytes()
}

/// Expected stream for a raster whose packed rows are `lines`.
fn expected(lines: &[&[u8]]) -> Vec<u8> {
    let mut out = HEADER.to_vec();
    for line in lines {
        out.extend_from_slice(&LINE_PREFIX);
        out.extend_from_slice(&[0x51, 0x78, 0xBF, 0x00, line.len() as u8, 0x00]);
        out.extend_from_slice(line);
        out.push(crc8_unsigned(line));
        out.push(0xFF);
    }
    out.extend_from_slice(&FOOTER);
    out
}

#[test]
fn test_8x1_all_black() {
    let bytes = stream(8, 1, vec![0; 8]);
    let row_start = HEADER.len() + LINE_PREFIX.len();
    assert_eq!(
        &bytes[row_start..row_start + 9],
        &[0x51, 0x78, 0xBF, 0x00, 0x01, 0x00, 0xFF, 0xF3, 0xFF]
    );
    assert_eq!(bytes, expected(&[&[0xFF]]));
}

#[test]
fn test_8x1_all_white() {
    let bytes = stream(8, 1, vec![255; 8]);
    let row_start = HEADER.len() + LINE_PREFIX.len();
    assert_eq!(
        &bytes[row_start..row_start + 9],
        &[0x51, 0x78, 0xBF, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF]
    );
    assert_eq!(bytes.len(), HEADER.len() + LINE_PREFIX.len() + 9 + FOOTER.len());
}

#[test]
fn test_stream_length_for_printer_width() {
    let bytes = stream(384, 3, vec![0x40; 384 * 3]);
    assert_eq!(bytes.len(), 28 + 3 * (9 + 6 + 48 + 2) + FOOTER.len());
    assert!(bytes.starts_with(&HEADER));
    assert!(bytes.ends_with(&FOOTER));
}

#[test]
fn test_rows_keep_raster_order() {
    // Row 0 black, row 1 white, row 2 only the first pixel black
    let mut pixels = vec![0u8; 8];
    pixels.extend([255u8; 8]);
    pixels.extend([0, 255, 255, 255, 255, 255, 255, 255]);
    let bytes = stream(8, 3, pixels);
    assert_eq!(bytes, expected(&[&[0xFF], &[0x00], &[0x01]]));
}

#[test]
fn test_partial_last_byte() {
    // 10 pixels: one full byte, then two pixels in the top bits of the next
    let row = [0u8, 255, 255, 255, 255, 255, 255, 255, 0, 255];
    assert_eq!(pack_line(&row), vec![0x01, 0x40]);
    assert_eq!(stream(10, 1, row.to_vec()), expected(&[&[0x01, 0x40]]));
}

#[test]
fn test_every_row_is_framed_and_checksummed() {
    let width = 100;
    let height = 7;
    let pixels: Vec<u8> = (0..width * height).map(|i| ((i * 37) % 256) as u8).collect();
    let bytes = stream(width, height, pixels.clone());
    let line_bytes = width.div_ceil(8);

    let mut offset = HEADER.len();
    for y in 0..height {
        assert_eq!(&bytes[offset..offset + 9], &LINE_PREFIX);
        offset += 9;
        assert_eq!(&bytes[offset..offset + 2], &[0x51, 0x78]);
        assert_eq!(bytes[offset + 4] as usize, line_bytes);
        offset += 6;

        let line = &bytes[offset..offset + line_bytes];
        assert_eq!(line, pack_line(&pixels[y * width..(y + 1) * width]).as_slice());
        offset += line_bytes;
        assert_eq!(bytes[offset] as i8, crc8(line));
        assert_eq!(bytes[offset + 1], 0xFF);
        offset += 2;
    }
    assert_eq!(&bytes[offset..], &FOOTER);
}

#[test]
fn test_checksum_of_nothing_is_zero() {
    assert_eq!(crc8(&[]), 0);
}

#[test]
fn test_encoding_is_deterministic() {
    let pixels: Vec<u8> = (0..64 * 4).map(|i| (i % 251) as u8).collect();
    assert_eq!(stream(64, 4, pixels.clone()), stream(64, 4, pixels));
}

#[test]
fn test_invalid_rasters_are_rejected() {
    let limits = RasterLimits::new(16);
    assert!(matches!(
        Raster::new(0, 1, vec![], limits),
        Err(CatprintError::Config(_))
    ));
    assert!(matches!(
        Raster::new(8, 17, vec![0; 8 * 17], limits),
        Err(CatprintError::Config(_))
    ));
    assert!(matches!(
        Raster::new(8, 2, vec![0; 15], limits),
        Err(CatprintError::Config(_))
    ));
}
