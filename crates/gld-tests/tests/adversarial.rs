//! Adversarial property-based test suite for GLD difficulty consensus.
//!
//! These tests attempt to break retarget invariants under randomized
//! timestamp sequences. Each property test uses at least 256 cases with
//! proptest shrinking to produce minimal failing examples.
//!
//! Attack vectors tested:
//! - Timestamp manipulation (out-of-order, stalled and bursty blocks)
//! - Targets escaping the proof-of-work limit
//! - Per-block retarget bands (difficulty ratchets)
//! - Window clamps in the July epoch
//! - Minimum-difficulty abuse on test networks
//! - Compact encoding stability

use proptest::prelude::*;

use gld_consensus::retarget::RetargetEngine;
use gld_core::chain_state::MemoryHeaderChain;
use gld_core::compact::CompactTarget;
use gld_core::error::RetargetError;
use gld_core::rules::EpochRuleSet;
use gld_core::types::BlockHeaderView;
use gld_core::uint::U256;
use gld_tests::helpers::{BITS, START_TIME, chain_from_intervals};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// (rules, chain start heights worth probing, valid parent bits).
fn network(index: usize) -> (EpochRuleSet, Vec<u64>, Vec<CompactTarget>) {
    let mainnet_bits = vec![
        BITS,
        CompactTarget(0x1e0f_fff0),
        CompactTarget(0x1c12_3456),
        CompactTarget(0x1e0f_ffff),
    ];
    match index % 3 {
        0 => (
            EpochRuleSet::mainnet(),
            vec![30_000, 44_800, 103_100, 118_900, 248_100, 300_000],
            mainnet_bits,
        ),
        1 => (EpochRuleSet::testnet(), vec![1_000, 1_800, 2_100, 50_000], mainnet_bits),
        _ => (
            EpochRuleSet::regtest(),
            vec![1_000, 30_000],
            vec![CompactTarget(0x207f_ffff), BITS, CompactTarget(0x2000_ffff)],
        ),
    }
}

fn pick<T: Copy>(items: &[T], index: usize) -> T {
    items[index % items.len()]
}

// ---------------------------------------------------------------------------
// Difficulty ceiling and canonical encoding
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Whatever the timestamps, the required target never exceeds the
    /// network limit and is always in canonical compact form.
    #[test]
    fn required_target_within_limit(
        net in 0usize..3,
        base in 0usize..6,
        bits in 0usize..4,
        intervals in prop::collection::vec(-2_000i64..20_000, 300),
        gap in -1_000i64..5_000,
    ) {
        let (rules, bases, valid_bits) = network(net);
        let limit = *rules.pow_limit();
        let engine = RetargetEngine::new(rules);
        let chain = chain_from_intervals(
            pick(&bases, base),
            START_TIME,
            &intervals,
            pick(&valid_bits, bits),
        );
        let parent = *chain.tip().unwrap();

        match engine.next_target(&chain, &parent, parent.timestamp + gap) {
            Ok(result) => {
                prop_assert!(result.expand() <= limit, "{} above limit", result);
                prop_assert_eq!(CompactTarget::from_target(&result.expand()), result);
                prop_assert!(result.to_target().is_ok(), "{} not a usable target", result);
            }
            Err(RetargetError::InsufficientHistory { .. }) => {}
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }

    /// Retargeting is a pure function of its inputs.
    #[test]
    fn retarget_is_deterministic(
        net in 0usize..3,
        base in 0usize..6,
        intervals in prop::collection::vec(0i64..3_000, 300),
    ) {
        let (rules, bases, _) = network(net);
        let chain = chain_from_intervals(pick(&bases, base), START_TIME, &intervals, BITS);
        let copy = chain.clone();
        let parent = *chain.tip().unwrap();

        let a = RetargetEngine::new(rules.clone())
            .next_target(&chain, &parent, parent.timestamp + 120);
        let b = RetargetEngine::new(rules).next_target(&copy, &parent, parent.timestamp + 120);
        prop_assert_eq!(a, b);
    }
}

// ---------------------------------------------------------------------------
// Retarget bands
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// With a uniform history, one per-block retarget makes blocks at most
    /// about 2% harder and at most 42% easier.
    #[test]
    fn per_block_retarget_band(
        intervals in prop::collection::vec(-1_000i64..4_000, 300),
    ) {
        let engine = RetargetEngine::new(EpochRuleSet::mainnet());
        let chain = chain_from_intervals(300_000, START_TIME, &intervals, BITS);
        let parent = *chain.tip().unwrap();
        let result = engine.next_target(&chain, &parent, parent.timestamp + 120).unwrap().expand();

        let base = BITS.expand();
        let hardest = CompactTarget::normalize(&base.mul_div(100, 102));
        let easiest = base.mul_div(170 * 60, 7_200);
        prop_assert!(result >= hardest, "too hard: {:x}", result);
        prop_assert!(result <= easiest, "too easy: {:x}", result);
    }

    /// A July-epoch window retarget stays inside the +-30% clamp.
    #[test]
    fn july_window_clamp(
        intervals in prop::collection::vec(-5_000i64..50_000, 159),
    ) {
        let engine = RetargetEngine::new(EpochRuleSet::mainnet());
        // Headers 44_900..=45_059; the candidate 45_060 starts a window.
        let chain = chain_from_intervals(44_900, START_TIME, &intervals, BITS);
        let parent = *chain.tip().unwrap();
        let result = engine.next_target(&chain, &parent, parent.timestamp + 120).unwrap().expand();

        let base = BITS.expand();
        prop_assert!(result >= CompactTarget::normalize(&base.mul_div(5_090, 7_200)));
        prop_assert!(result <= base.mul_div(10_182, 7_200));
    }
}

// ---------------------------------------------------------------------------
// Minimum difficulty
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Between boundaries a test network either drops to the limit after a
    /// long gap or inherits the last target that was not a limit block.
    #[test]
    fn min_difficulty_walk_back(
        limit_blocks in prop::collection::vec(any::<bool>(), 1..400),
        gap in 0i64..1_000,
    ) {
        let rules = EpochRuleSet::testnet();
        let limit_bits = rules.pow_limit_bits();
        let engine = RetargetEngine::new(rules);

        let mut headers = vec![BlockHeaderView::new(0, START_TIME, BITS)];
        for (i, &at_limit) in limit_blocks.iter().enumerate() {
            let height = i as u64 + 1;
            let bits = if at_limit { limit_bits } else { BITS };
            headers.push(BlockHeaderView::new(height, START_TIME + height as i64 * 150, bits));
        }
        let chain = MemoryHeaderChain::from_headers(headers.clone()).unwrap();
        let parent = *chain.tip().unwrap();
        let result = engine.next_target(&chain, &parent, parent.timestamp + gap).unwrap();

        if gap > 300 {
            prop_assert_eq!(result, limit_bits);
        } else {
            let expected = headers
                .iter()
                .rev()
                .find(|h| h.height % 2016 == 0 || h.bits != limit_bits)
                .map(|h| h.bits)
                .unwrap();
            prop_assert_eq!(result, expected);
        }
    }
}

// ---------------------------------------------------------------------------
// Compact encoding
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Rounding through the compact form only ever truncates, and does so once.
    #[test]
    fn compact_rounding_is_stable(
        words in prop::array::uniform4(any::<u64>()),
        shift in 0u32..256,
    ) {
        let value = U256(words).shr_bits(shift);
        let once = CompactTarget::normalize(&value);
        prop_assert!(once <= value);
        prop_assert_eq!(CompactTarget::normalize(&once), once);
        prop_assert_eq!(CompactTarget::from_target(&once), CompactTarget::from_target(&value));
    }
}
