//! Bluetooth device address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatprintError;

/// A validated MAC address, stored as `XX:XX:XX:XX:XX:XX` (upper case).
///
/// Both `:` and `-` are accepted as separators on input.
///
/// ```
/// use catprint::transport::DeviceAddress;
///
/// let addr: DeviceAddress = "aa-bb-cc-00-11-22".parse()?;
/// assert_eq!(addr.as_str(), "AA:BB:CC:00:11:22");
/// # Ok::<(), catprint::CatprintError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceAddress(String);

/// Validate a Bluetooth MAC address format (six hex pairs, `:` or `-`).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split([':', '-']).collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

impl DeviceAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceAddress {
    type Err = CatprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !is_valid_mac(s) {
            return Err(CatprintError::config(format!(
                "invalid MAC address '{}', expected XX:XX:XX:XX:XX:XX",
                s
            )));
        }
        Ok(Self(s.replace('-', ":").to_uppercase()))
    }
}

impl TryFrom<String> for DeviceAddress {
    type Error = CatprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceAddress> for String {
    fn from(addr: DeviceAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
