//! # Printer Profile
//!
//! This module defines the hardware and link parameters for a printer.
//!
//! ## Built-in Profile
//!
//! | Property | Value |
//! |----------|-------|
//! | Print width | 384 dots (48 bytes per row) |
//! | Max height | 1536 rows per job |
//! | Chunk size | 100 bytes |
//! | Interval | 10 ms (50 ms when congested) |
//!
//! ## Profile Files
//!
//! Profiles can be loaded from JSON. Missing fields fall back to the
//! built-in values:
//!
//! ```json
//! {
//!   "name": "MX06",
//!   "width_dots": 384,
//!   "characteristics": {
//!     "write": "0000ae01-0000-1000-8000-00805f9b34fb",
//!     "notify": "0000ae02-0000-1000-8000-00805f9b34fb",
//!     "read": "0000ae10-0000-1000-8000-00805f9b34fb"
//!   }
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CatprintError;
use crate::protocol::raster::{MAX_WIDTH_DOTS, RasterLimits};
use crate::transport::{CharacteristicIds, DeviceAddress, WriterConfig};

/// # Printer Profile
///
/// Everything needed to reach a printer and size its jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterProfile {
    /// Human-readable model name
    pub name: String,

    /// Print head width in dots
    pub width_dots: usize,

    /// Maximum rows per print job
    pub max_height: usize,

    /// Device address, if known
    pub address: Option<DeviceAddress>,

    /// GATT characteristics
    pub characteristics: CharacteristicIds,

    /// Bytes per link write
    pub chunk_size: usize,

    /// Delay after each accepted chunk (milliseconds)
    pub interval_ms: u64,

    /// Delay after each accepted chunk while congested (milliseconds)
    pub slow_interval_ms: u64,
}

impl PrinterProfile {
    /// The common 384-dot "cat printer" (GB01/GB02/MX series).
    pub fn standard() -> Self {
        Self {
            name: "Cat printer 384".to_string(),
            width_dots: 384,
            max_height: 1536,
            address: None,
            characteristics: CharacteristicIds::DEFAULT,
            chunk_size: 100,
            interval_ms: 10,
            slow_interval_ms: 50,
        }
    }

    /// Load a profile from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatprintError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let profile: Self = serde_json::from_str(&contents)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), CatprintError> {
        if self.width_dots == 0 || self.width_dots > MAX_WIDTH_DOTS {
            return Err(CatprintError::config(format!(
                "width_dots must be in 1..={}, got {}",
                MAX_WIDTH_DOTS, self.width_dots
            )));
        }
        if self.max_height == 0 {
            return Err(CatprintError::config("max_height must be positive"));
        }
        self.writer_config().map(|_| ())
    }

    pub fn raster_limits(&self) -> RasterLimits {
        RasterLimits::new(self.max_height)
    }

    pub fn writer_config(&self) -> Result<WriterConfig, CatprintError> {
        WriterConfig::new(
            self.chunk_size,
            Duration::from_millis(self.interval_ms),
            Duration::from_millis(self.slow_interval_ms),
        )
    }

    /// Packed bytes per row at full width
    #[inline]
    pub fn width_bytes(&self) -> usize {
        self.width_dots.div_ceil(8)
    }
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_dimensions() {
        let profile = PrinterProfile::standard();
        assert_eq!(profile.width_dots, 384);
        assert_eq!(profile.width_bytes(), 48);
        assert_eq!(profile.raster_limits().max_height, 1536);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_writer_config_from_profile() {
        let config = PrinterProfile::standard().writer_config().unwrap();
        assert_eq!(config, WriterConfig::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let profile: PrinterProfile =
            serde_json::from_str(r#"{"name": "MX06", "chunk_size": 180}"#).unwrap();
        assert_eq!(profile.name, "MX06");
        assert_eq!(profile.chunk_size, 180);
        assert_eq!(profile.width_dots, 384);
        assert_eq!(profile.characteristics, CharacteristicIds::DEFAULT);
    }

    #[test]
    fn test_address_in_json() {
        let profile: PrinterProfile =
            serde_json::from_str(r#"{"address": "aa:bb:cc:dd:ee:ff"}"#).unwrap();
        assert_eq!(profile.address.unwrap().as_str(), "AA:BB:CC:DD:EE:FF");
        assert!(serde_json::from_str::<PrinterProfile>(r#"{"address": "zz"}"#).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut profile = PrinterProfile::standard();
        profile.chunk_size = 0;
        assert!(matches!(profile.validate(), Err(CatprintError::Config(_))));

        let mut profile = PrinterProfile::standard();
        profile.width_dots = 0;
        assert!(profile.validate().is_err());

        let mut profile = PrinterProfile::standard();
        profile.max_height = 0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("catprint_profile_test.json");
        fs::write(&path, r#"{"width_dots": 576, "interval_ms": 20}"#).unwrap();
        let profile = PrinterProfile::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(profile.width_dots, 576);
        assert_eq!(
            profile.writer_config().unwrap().interval(),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = PrinterProfile::load("/nonexistent/catprint.json").unwrap_err();
        assert!(matches!(err, CatprintError::Io(_)));
    }
}
