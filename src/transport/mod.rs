//! # Printer Transport Layer
//!
//! This module provides the link abstraction used to reach the printer and
//! the segmented writer that pushes large buffers through it.
//!
//! ## Pieces
//!
//! - [`TransportLink`]: characteristic-based link (connect, write one chunk,
//!   read status, notifications)
//! - [`writer::SegmentedWriter`]: splits a buffer into paced, retried chunks
//! - [`CongestionSignal`]: backpressure flag owned by the link, read by the writer
//! - [`address::DeviceAddress`]: validated Bluetooth MAC address
//!
//! ## Available Links
//!
//! - [`memory::MemoryLink`]: scriptable in-memory link (tests, dry runs)
//! - `bluetooth::BluetoothLink`: BLE GATT via btleplug (feature `ble`)

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LinkError;

pub mod address;
#[cfg(feature = "ble")]
pub mod bluetooth;
pub mod memory;
pub mod writer;

pub use address::DeviceAddress;
#[cfg(feature = "ble")]
pub use bluetooth::BluetoothLink;
pub use memory::MemoryLink;
pub use writer::{SegmentedWriter, WriterConfig};

/// Callback receiving raw notification payloads. Payloads are not parsed.
pub type NotificationHandler = Box<dyn Fn(Vec<u8>) + Send + Sync + 'static>;

/// Connection state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connected,
}

/// Shared backpressure flag.
///
/// The link owns the flag and sets it when it cannot keep up; the writer
/// holds a clone and reads it after every accepted chunk to pick its pacing
/// delay. It never affects retry counts or chunk sizes.
#[derive(Debug, Clone, Default)]
pub struct CongestionSignal(Arc<AtomicBool>);

impl CongestionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_congested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, congested: bool) {
        self.0.store(congested, Ordering::Release);
    }
}

/// GATT characteristics the printer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicIds {
    /// Write-without-response endpoint receiving command bytes
    pub write: Uuid,
    /// Notification endpoint for status payloads
    pub notify: Uuid,
    /// Readable endpoint used as a status probe
    pub read: Uuid,
}

impl CharacteristicIds {
    /// `0xAE01` / `0xAE02` / `0xAE10` on the Bluetooth base UUID, as exposed by
    /// the common GB/MX series firmware.
    pub const DEFAULT: Self = Self {
        write: Uuid::from_u128(0x0000ae01_0000_1000_8000_00805f9b34fb),
        notify: Uuid::from_u128(0x0000ae02_0000_1000_8000_00805f9b34fb),
        read: Uuid::from_u128(0x0000ae10_0000_1000_8000_00805f9b34fb),
    };
}

impl Default for CharacteristicIds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A characteristic-based link to one printer.
///
/// Writes take `&mut self`, so a link can only have one chunk in flight and
/// is owned by a single writer or session at a time.
#[async_trait]
pub trait TransportLink: Send {
    /// Open the connection to `address`.
    async fn connect(&mut self, address: &DeviceAddress) -> Result<(), LinkError>;

    /// Close the connection. Closing a closed link is not an error.
    async fn disconnect(&mut self) -> Result<(), LinkError>;

    /// Whether the link is up. A link that notices the peer went away during
    /// a write reports `false` from then on.
    fn is_connected(&self) -> bool;

    /// Write one chunk. Transient failures are reported, never retried here.
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), LinkError>;

    /// Read the raw status characteristic.
    async fn read_status(&mut self) -> Result<Vec<u8>, LinkError>;

    /// Start forwarding notifications to `handler`, replacing any previous one.
    async fn subscribe(&mut self, handler: NotificationHandler) -> Result<(), LinkError>;

    async fn unsubscribe(&mut self) -> Result<(), LinkError>;

    /// Read handle on this link's backpressure flag.
    fn congestion(&self) -> CongestionSignal;

    fn state(&self) -> LinkState {
        if self.is_connected() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_congestion_signal_is_shared() {
        let signal = CongestionSignal::new();
        let reader = signal.clone();
        assert!(!reader.is_congested());
        signal.set(true);
        assert!(reader.is_congested());
        signal.set(false);
        assert!(!reader.is_congested());
    }

    #[test]
    fn test_default_characteristics() {
        let ids = CharacteristicIds::default();
        assert_eq!(
            ids.write.to_string(),
            "0000ae01-0000-1000-8000-00805f9b34fb"
        );
        assert_ne!(ids.write, ids.notify);
    }

    #[test]
    fn test_characteristics_round_trip_json() {
        let json = serde_json::to_string(&CharacteristicIds::DEFAULT).unwrap();
        let back: CharacteristicIds = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CharacteristicIds::DEFAULT);
    }
}
