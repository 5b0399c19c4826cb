//! Core protocol types: hashes and the header fields difficulty consensus reads.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compact::CompactTarget;
use crate::uint::U256;

/// A 32-byte block hash in internal (little-endian) byte order.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The hash as the unsigned integer proof-of-work compares against a target.
    pub fn to_uint(&self) -> U256 {
        U256::from_le_bytes(&self.0)
    }

    /// Build the hash whose integer value is `value`.
    pub fn from_uint(value: &U256) -> Self {
        let mut bytes = [0u8; 32];
        value.to_little_endian(&mut bytes);
        Self(bytes)
    }

    /// Parse the conventional display form (big-endian hex, 64 digits).
    pub fn from_hex(s: &str) -> Option<Self> {
        U256::from_hex(s).map(|v| Self::from_uint(&v))
    }
}

impl fmt::Display for Hash256 {
    /// Hashes print most-significant byte first, the way block explorers show them.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// The header fields the retargeting engine reads.
///
/// The chain owns headers; the engine only ever sees copies.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockHeaderView {
    /// Height in the chain (genesis is 0).
    pub height: u64,
    /// Block timestamp in seconds.
    pub timestamp: i64,
    /// Declared difficulty target.
    pub bits: CompactTarget,
}

impl BlockHeaderView {
    pub fn new(height: u64, timestamp: i64, bits: CompactTarget) -> Self {
        Self {
            height,
            timestamp,
            bits,
        }
    }
}
