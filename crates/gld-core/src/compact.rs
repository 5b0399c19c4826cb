//! Compact ("nBits") difficulty target encoding.
//!
//! A compact target packs a 256-bit value into 32 bits: the high byte is a
//! base-256 exponent (the byte length of the value), the low 23 bits are the
//! mantissa and bit 23 is a sign flag. The format is lossy: encoding keeps only
//! the three most significant bytes, and that truncation is part of consensus.
//!
//! Decoding is split in two:
//!
//! - [`CompactTarget::decode`] reproduces the raw expansion including the
//!   negative and overflow flags. The retarget engine expands stored bits this
//!   way and ignores the flags, exactly like every other node.
//! - [`CompactTarget::to_target`] is the strict form used by proof-of-work
//!   checks; it rejects negative, overflowing and zero encodings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TargetError;
use crate::uint::U256;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// A difficulty target in its 32-bit wire/storage form.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct CompactTarget(pub u32);

/// Result of expanding a compact target without validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedTarget {
    /// Magnitude of the expanded value.
    pub value: U256,
    /// The sign bit was set on a non-zero mantissa.
    pub negative: bool,
    /// The exponent pushes a non-zero mantissa past 256 bits.
    pub overflow: bool,
}

impl CompactTarget {
    /// Little-endian header serialization.
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Parse the little-endian header field.
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// Expand to a 256-bit value, reporting sign and overflow flags.
    pub fn decode(self) -> DecodedTarget {
        let size = self.0 >> 24;
        let mut word = self.0 & MANTISSA_MASK;

        let value = if size <= 3 {
            word >>= 8 * (3 - size);
            U256::from(word)
        } else {
            U256::from(word).shl_bits(8 * (size - 3))
        };

        let negative = word != 0 && (self.0 & SIGN_BIT) != 0;
        let overflow = word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        DecodedTarget {
            value,
            negative,
            overflow,
        }
    }

    /// Expand to a 256-bit value, ignoring the sign and overflow flags.
    pub fn expand(self) -> U256 {
        self.decode().value
    }

    /// Strictly decode a target for proof-of-work comparison.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError`] when the encoding is negative, overflows or
    /// expands to zero.
    pub fn to_target(self) -> Result<U256, TargetError> {
        let decoded = self.decode();
        if decoded.negative {
            return Err(TargetError::Negative(self));
        }
        if decoded.overflow {
            return Err(TargetError::Overflow(self));
        }
        if decoded.value.is_zero() {
            return Err(TargetError::Zero(self));
        }
        Ok(decoded.value)
    }

    /// Encode a non-negative 256-bit value, truncating to three significant bytes.
    pub fn from_target(target: &U256) -> Self {
        encode(target, false)
    }

    /// Decode then re-encode, i.e. the value a target collapses to once stored.
    pub fn normalize(target: &U256) -> U256 {
        Self::from_target(target).expand()
    }
}

fn encode(value: &U256, negative: bool) -> CompactTarget {
    let mut size = value.bits().div_ceil(8) as u32;
    let mut compact = if size <= 3 {
        (value.low_u64() << (8 * (3 - size))) as u32
    } else {
        value.shr_bits(8 * (size - 3)).low_u64() as u32
    };

    // The mantissa is signed: if its top bit would be set, shift one byte
    // into the exponent instead.
    if compact & SIGN_BIT != 0 {
        compact >>= 8;
        size += 1;
    }

    compact |= size << 24;
    if negative && compact & MANTISSA_MASK != 0 {
        compact |= SIGN_BIT;
    }
    CompactTarget(compact)
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl fmt::LowerHex for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u32> for CompactTarget {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<CompactTarget> for u32 {
    fn from(target: CompactTarget) -> Self {
        target.0
    }
}
