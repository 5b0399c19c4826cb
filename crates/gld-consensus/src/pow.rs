//! Proof-of-work check.
//!
//! A block hash, read as a little-endian 256-bit integer, must not exceed the
//! target its header declares. The declared target is decoded strictly:
//! negative, overflowing and zero encodings are never satisfiable, and
//! neither is a target above the network's proof-of-work limit.

use gld_core::compact::CompactTarget;
use gld_core::error::TargetError;
use gld_core::rules::EpochRuleSet;
use gld_core::types::Hash256;
use gld_core::uint::U256;

/// Decode `bits` for comparison, rejecting anything outside `(0, pow_limit]`.
pub fn check_target(bits: CompactTarget, pow_limit: &U256) -> Result<U256, TargetError> {
    let target = bits.to_target()?;
    if target > *pow_limit {
        return Err(TargetError::AboveLimit(bits));
    }
    Ok(target)
}

/// Whether `hash` satisfies `bits` under an explicit proof-of-work limit.
pub fn hash_meets_target(hash: &Hash256, bits: CompactTarget, pow_limit: &U256) -> bool {
    match check_target(bits, pow_limit) {
        Ok(target) => hash.to_uint() <= target,
        Err(_) => false,
    }
}

/// Whether `hash` satisfies the declared `bits` under `rules`.
pub fn check_proof_of_work(hash: &Hash256, bits: CompactTarget, rules: &EpochRuleSet) -> bool {
    hash_meets_target(hash, bits, rules.pow_limit())
}
