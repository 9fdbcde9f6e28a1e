//! # Cat Printer Command Blocks
//!
//! This module holds the fixed command sequences understood by the printer
//! firmware. They were captured from the vendor app and are reproduced byte
//! for byte; none of them is computed.
//!
//! ## Frame Structure
//!
//! Every command shares the same framing:
//!
//! ```text
//! ┌──────┬──────┬────────┬──────┬─────┬──────┬──────────┬─────┬──────┐
//! │ 0x51 │ 0x78 │ opcode │ 0x00 │ len │ 0x00 │ data[len]│ crc │ 0xFF │
//! └──────┴──────┴────────┴──────┴─────┴──────┴──────────┴─────┴──────┘
//! ```
//!
//! The handshake commands carry one extra leading byte (`0x12`).
//!
//! ## Opcodes Used
//!
//! | Opcode | Meaning |
//! |--------|---------|
//! | 0xA1 | Feed paper |
//! | 0xA3 | Get device state |
//! | 0xA4 | Set print quality |
//! | 0xA8 | Get device info |
//! | 0xAF | Set energy |
//! | 0xBB | Update device |
//! | 0xBD | Set feed speed |
//! | 0xBE | Set drawing mode |
//! | 0xBF | Print bitmap row |

// ============================================================================
// FRAMING
// ============================================================================

/// First two bytes of every printer command
pub const MAGIC: [u8; 2] = [0x51, 0x78];

/// Opcode of the per-row bitmap command
pub const OP_PRINT_ROW: u8 = 0xBF;

/// Every command frame ends with this byte
pub const TERMINATOR: u8 = 0xFF;

/// Build the six-byte header of a bitmap row command.
///
/// ## Example
///
/// ```
/// use catprint::protocol::commands::row_header;
///
/// assert_eq!(row_header(48), [0x51, 0x78, 0xBF, 0x00, 48, 0x00]);
/// ```
#[inline]
pub fn row_header(line_bytes: u8) -> [u8; 6] {
    [MAGIC[0], MAGIC[1], OP_PRINT_ROW, 0x00, line_bytes, 0x00]
}

// ============================================================================
// IMAGE BLOCKS
// ============================================================================

/// Sent once before the first row.
///
/// | Bytes | Command |
/// |-------|---------|
/// | `51 78 A4 00 01 00 35 8B FF` | Print quality 5 |
/// | `51 78 AF 00 02 00 88 13 67 FF` | Energy 0x1388 |
/// | `51 78 BE 00 01 00 00 00 FF` | Drawing mode: image |
pub const HEADER: [u8; 28] = [
    0x51, 0x78, 0xA4, 0x00, 0x01, 0x00, 0x35, 0x8B, 0xFF, //
    0x51, 0x78, 0xAF, 0x00, 0x02, 0x00, 0x88, 0x13, 0x67, 0xFF, //
    0x51, 0x78, 0xBE, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF,
];

/// Sent before every bitmap row: feed speed 10.
pub const LINE_PREFIX: [u8; 9] = [0x51, 0x78, 0xBD, 0x00, 0x01, 0x00, 0x0A, 0x36, 0xFF];

/// Sent once after the last row.
///
/// | Bytes | Command |
/// |-------|---------|
/// | `51 78 BD 00 01 00 19 4F FF` | Feed speed 25 |
/// | `51 78 A1 00 02 00 30 00 F9 FF` | Feed 48 lines (sent twice) |
/// | `51 78 BD 00 01 00 19 4F FF` | Feed speed 25 |
/// | `51 78 A3 00 01 00 00 00 FF` | Get device state |
///
/// followed by 38 zero bytes of padding.
pub const FOOTER: [u8; 85] = [
    0x51, 0x78, 0xBD, 0x00, 0x01, 0x00, 0x19, 0x4F, 0xFF, //
    0x51, 0x78, 0xA1, 0x00, 0x02, 0x00, 0x30, 0x00, 0xF9, 0xFF, //
    0x51, 0x78, 0xA1, 0x00, 0x02, 0x00, 0x30, 0x00, 0xF9, 0xFF, //
    0x51, 0x78, 0xBD, 0x00, 0x01, 0x00, 0x19, 0x4F, 0xFF, //
    0x51, 0x78, 0xA3, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

// ============================================================================
// SESSION HANDSHAKE
// ============================================================================

/// Get device state
pub const GET_DEVICE_STATE: [u8; 10] = [0x12, 0x51, 0x78, 0xA3, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF];

/// Get device info
pub const GET_DEVICE_INFO: [u8; 10] = [0x12, 0x51, 0x78, 0xA8, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF];

/// Update device
pub const UPDATE_DEVICE: [u8; 10] = [0x12, 0x51, 0x78, 0xBB, 0x00, 0x01, 0x00, 0x01, 0x07, 0xFF];

/// The four commands written, in this order, before every image.
pub const HANDSHAKE: [&[u8]; 4] = [
    &GET_DEVICE_STATE,
    &GET_DEVICE_INFO,
    &UPDATE_DEVICE,
    &GET_DEVICE_STATE,
];

// ============================================================================
// TESTS
// ============================================================================
