//! 256-bit unsigned arithmetic for difficulty targets.
//!
//! [`U256`] is generated by `uint::construct_uint!` and extended with the few
//! operations consensus needs that the macro does not provide with the right
//! semantics: wrapping multiplication by a 32-bit factor (the retarget
//! formula multiplies a target by a timespan and must wrap modulo 2^256 the
//! same way every other node does) and big-endian hex conversion for
//! configuration files and logs.

use serde::{Deserialize, Deserializer, Serializer};
use uint::construct_uint;

construct_uint! {
    /// Unsigned 256-bit integer made of 4 little-endian 64-bit words.
    pub struct U256(4);
}

impl U256 {
    /// Multiply by a 32-bit factor, wrapping modulo 2^256.
    pub fn wrapping_mul_u32(self, factor: u32) -> U256 {
        self.overflowing_mul(U256::from(factor)).0
    }

    /// Multiply by a 32-bit factor and divide by a non-zero 64-bit divisor.
    ///
    /// The multiplication wraps; the division truncates. A zero divisor
    /// yields zero rather than panicking.
    pub fn mul_div(self, factor: u32, divisor: u64) -> U256 {
        if divisor == 0 {
            return U256::zero();
        }
        self.wrapping_mul_u32(factor) / U256::from(divisor)
    }

    /// Shift left by `bits`, discarding bits pushed past 2^256.
    pub fn shl_bits(self, bits: u32) -> U256 {
        if bits >= 256 {
            return U256::zero();
        }
        self << (bits as usize)
    }

    /// Shift right by `bits`.
    pub fn shr_bits(self, bits: u32) -> U256 {
        if bits >= 256 {
            return U256::zero();
        }
        self >> (bits as usize)
    }

    /// Interpret 32 bytes as a little-endian integer (block hash layout).
    pub fn from_le_bytes(bytes: &[u8; 32]) -> U256 {
        U256::from_little_endian(bytes)
    }

    /// Big-endian byte representation.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.to_big_endian(&mut out);
        out
    }

    /// Parse a big-endian hex string of at most 64 digits.
    ///
    /// An optional `0x` prefix is accepted. Shorter strings are left-padded.
    pub fn from_hex(s: &str) -> Option<U256> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return None;
        }
        let padded = format!("{digits:0>64}");
        let bytes = hex::decode(padded).ok()?;
        Some(U256::from_big_endian(&bytes))
    }

    /// Zero-padded 64-digit big-endian hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }
}

/// Serde adapter encoding a [`U256`] as big-endian hex.
///
/// Use with `#[serde(with = "gld_core::uint::hex_u256")]`.
pub mod hex_u256 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid 256-bit hex value: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_mul_discards_high_bits() {
        let top = U256::one().shl_bits(255);
        assert_eq!(top.wrapping_mul_u32(2), U256::zero());
        assert_eq!(top.wrapping_mul_u32(3), top);
    }

    #[test]
    fn mul_div_truncates() {
        assert_eq!(U256::from(10u64).mul_div(7, 3), U256::from(23u64));
        assert_eq!(U256::from(5u64).mul_div(1, 2), U256::from(2u64));
    }

    #[test]
    fn mul_div_zero_divisor_is_zero() {
        assert_eq!(U256::from(10u64).mul_div(7, 0), U256::zero());
    }

    #[test]
    fn shifts_past_width_are_zero() {
        assert_eq!(U256::MAX.shl_bits(256), U256::zero());
        assert_eq!(U256::MAX.shr_bits(300), U256::zero());
        assert_eq!(U256::one().shl_bits(8), U256::from(256u64));
    }

    #[test]
    fn hex_parse_pads_short_input() {
        assert_eq!(U256::from_hex("0xff"), Some(U256::from(255u64)));
        assert_eq!(U256::from_hex("ff"), Some(U256::from(255u64)));
        assert_eq!(U256::from_hex(""), None);
        assert_eq!(U256::from_hex("zz"), None);
        assert_eq!(U256::from_hex(&"1".repeat(65)), None);
    }

    #[test]
    fn hex_roundtrip_full_width() {
        let s = "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
        let v = U256::from_hex(s).unwrap();
        assert_eq!(v.to_hex(), s);
        assert_eq!(v.bits(), 236);
    }

    #[test]
    fn little_endian_hash_layout() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x01;
        bytes[31] = 0x80;
        let v = U256::from_le_bytes(&bytes);
        assert_eq!(v, U256::one().shl_bits(255) + U256::one());
    }
}
