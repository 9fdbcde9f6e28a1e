//! # Encoded Packet
//!
//! The byte stream produced by the encoder. Vendor captures list these bytes
//! as signed values (`0xFF` appears as `-1`); [`Packet`] stores the unsigned
//! wire bytes and offers the signed view through [`Packet::signed`].

/// An encoded print job, ready to be written to the link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    bytes: Vec<u8>,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    #[inline]
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Wire bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The same bytes as two's-complement signed values.
    ///
    /// ```
    /// use catprint::protocol::packet::Packet;
    ///
    /// let packet = Packet::from(vec![0x51, 0xBF, 0xFF]);
    /// assert_eq!(packet.signed().collect::<Vec<_>>(), vec![81, -65, -1]);
    /// ```
    pub fn signed(&self) -> impl Iterator<Item = i8> + '_ {
        self.bytes.iter().map(|&b| b as i8)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for Packet {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Build a packet from signed values as they appear in vendor captures.
impl From<&[i8]> for Packet {
    fn from(values: &[i8]) -> Self {
        Self {
            bytes: values.iter().map(|&v| v as u8).collect(),
        }
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
