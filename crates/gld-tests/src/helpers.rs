//! Shared test helpers for property and scenario tests.

use gld_core::chain_state::MemoryHeaderChain;
use gld_core::compact::CompactTarget;
use gld_core::constants::DIFFICULTY_SWITCH_HEIGHT;
use gld_core::error::GldError;
use gld_core::rules::{EpochRuleSet, ForkHeights, RuleSetParams};
use gld_core::types::BlockHeaderView;

use gld_consensus::retarget::RetargetEngine;

/// A mid-range target, well below every network's limit.
pub const BITS: CompactTarget = CompactTarget(0x1d0f_fff0);

/// Arbitrary but realistic starting timestamp.
pub const START_TIME: i64 = 1_400_000_000;

/// A chain whose header `i + 1` follows header `i` by `intervals[i]` seconds.
pub fn chain_from_intervals(
    start_height: u64,
    start_time: i64,
    intervals: &[i64],
    bits: CompactTarget,
) -> MemoryHeaderChain {
    let mut timestamps = Vec::with_capacity(intervals.len() + 1);
    timestamps.push(start_time);
    let mut t = start_time;
    for &d in intervals {
        t = t.saturating_add(d);
        timestamps.push(t);
    }
    MemoryHeaderChain::from_timestamps(start_height, &timestamps, bits)
}

/// Mine one header per interval on top of `chain`, each declaring the bits
/// the engine requires. Returns the declared bits in order.
pub fn extend_chain(
    engine: &RetargetEngine,
    chain: &mut MemoryHeaderChain,
    intervals: &[i64],
) -> Result<Vec<CompactTarget>, GldError> {
    let mut declared = Vec::with_capacity(intervals.len());
    for &d in intervals {
        let parent = *chain
            .tip()
            .ok_or(gld_core::error::ChainStateError::HeaderNotFound(0))?;
        let timestamp = parent.timestamp.saturating_add(d);
        let bits = engine.next_target(chain, &parent, timestamp)?;
        chain.push(BlockHeaderView::new(parent.height + 1, timestamp, bits))?;
        declared.push(bits);
    }
    Ok(declared)
}

/// A rule set on the mainnet limit with the given forks and timespan.
pub fn custom_rules(forks: ForkHeights, target_timespan: i64, allow_min: bool) -> EpochRuleSet {
    EpochRuleSet::new(RuleSetParams {
        forks,
        target_spacing: 120,
        target_timespan,
        difficulty_switch_height: DIFFICULTY_SWITCH_HEIGHT,
        allow_min_difficulty: allow_min,
        pow_limit: *EpochRuleSet::mainnet().pow_limit(),
        genesis_bits: None,
    })
    .expect("valid test rule set")
}
