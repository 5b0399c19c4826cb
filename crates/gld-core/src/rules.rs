//! Per-network consensus constants for difficulty retargeting.
//!
//! An [`EpochRuleSet`] is built once per process for the selected network and
//! never mutated afterwards. It is plain data: fork activation heights, the
//! post-July spacing and timespan, the min-difficulty flag and the
//! proof-of-work ceiling. The retarget engine decides which epoch a height
//! belongs to by comparing the height against these fork heights.
//!
//! Whether the chain has "crossed" a fork is a pure function of height
//! ([`EpochRuleSet::past_july_fork`], [`EpochRuleSet::past_november_fork`]);
//! there is no latched state to reset on reorganization.

use serde::{Deserialize, Serialize};

use crate::compact::CompactTarget;
use crate::constants::{
    DIFFICULTY_SWITCH_HEIGHT, NEVER, NetworkType, TARGET_SPACING, TARGET_TIMESPAN,
};
use crate::error::RuleSetError;
use crate::uint::{U256, hex_u256};

/// Activation heights of the difficulty hard forks.
///
/// Heights are only ever compared against a candidate height; no ordering
/// between different forks is assumed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForkHeights {
    /// First difficulty fork: configured spacing/timespan replace the legacy ones.
    pub july: u64,
    /// 51% defense fork.
    pub october: u64,
    /// Median-of-60 retargeting.
    pub november: u64,
    /// Deadlock defense.
    pub november2: u64,
    /// Average-of-120 guard.
    pub may: u64,
    /// Per-block retargeting with ratchets.
    pub july2: u64,
    /// Coin generation adjustment (not used by retargeting).
    pub feb: u64,
}

impl ForkHeights {
    /// Every fork at the same height.
    pub const fn all_at(height: u64) -> Self {
        Self {
            july: height,
            october: height,
            november: height,
            november2: height,
            may: height,
            july2: height,
            feb: height,
        }
    }
}

fn default_switch_height() -> u64 {
    DIFFICULTY_SWITCH_HEIGHT
}

/// Unvalidated rule-set description, as found in a rule file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuleSetParams {
    pub forks: ForkHeights,
    /// Seconds per block after the July fork.
    pub target_spacing: i64,
    /// Seconds per retarget window after the July fork.
    pub target_timespan: i64,
    #[serde(default = "default_switch_height")]
    pub difficulty_switch_height: u64,
    pub allow_min_difficulty: bool,
    /// Difficulty ceiling, big-endian hex.
    #[serde(with = "hex_u256")]
    pub pow_limit: U256,
    /// Bits declared by the network's genesis block. Defaults to the
    /// compact form of `pow_limit`.
    #[serde(default)]
    pub genesis_bits: Option<CompactTarget>,
}

/// Immutable per-network consensus constants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochRuleSet {
    params: RuleSetParams,
    pow_limit_bits: CompactTarget,
}

impl EpochRuleSet {
    /// Validate and build a rule set.
    ///
    /// # Errors
    ///
    /// Rejects a non-positive spacing, a timespan shorter than one spacing,
    /// and a zero proof-of-work limit.
    pub fn new(params: RuleSetParams) -> Result<Self, RuleSetError> {
        if params.target_spacing <= 0 {
            return Err(RuleSetError::ZeroSpacing);
        }
        if params.target_timespan < params.target_spacing {
            return Err(RuleSetError::TimespanTooShort {
                timespan: params.target_timespan,
                spacing: params.target_spacing,
            });
        }
        if params.pow_limit.is_zero() {
            return Err(RuleSetError::ZeroPowLimit);
        }
        Ok(Self::from_checked(params))
    }

    fn from_checked(params: RuleSetParams) -> Self {
        Self {
            pow_limit_bits: CompactTarget::from_target(&params.pow_limit),
            params,
        }
    }

    /// Parse and validate a JSON rule file.
    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        let params: RuleSetParams =
            serde_json::from_str(json).map_err(|e| RuleSetError::Parse(e.to_string()))?;
        Self::new(params)
    }

    /// The preset for a network.
    pub fn for_network(network: NetworkType) -> Self {
        match network {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
            NetworkType::Regtest => Self::regtest(),
        }
    }

    /// Production network.
    pub fn mainnet() -> Self {
        Self::from_checked(RuleSetParams {
            forks: ForkHeights {
                july: 45_000,
                october: 100_000,
                november: 103_000,
                november2: 118_800,
                may: 248_000,
                july2: 251_230,
                feb: 372_000,
            },
            target_spacing: TARGET_SPACING,
            target_timespan: TARGET_TIMESPAN,
            difficulty_switch_height: DIFFICULTY_SWITCH_HEIGHT,
            allow_min_difficulty: false,
            pow_limit: U256::MAX >> 20usize,
            genesis_bits: Some(NetworkType::Mainnet.genesis_bits()),
        })
    }

    /// Public test network.
    pub fn testnet() -> Self {
        Self::from_checked(RuleSetParams {
            forks: ForkHeights::all_at(2016),
            target_spacing: TARGET_SPACING,
            target_timespan: TARGET_TIMESPAN,
            difficulty_switch_height: DIFFICULTY_SWITCH_HEIGHT,
            allow_min_difficulty: true,
            pow_limit: U256::MAX >> 20usize,
            genesis_bits: Some(NetworkType::Testnet.genesis_bits()),
        })
    }

    /// Regression-test network. None of the difficulty forks activate.
    pub fn regtest() -> Self {
        Self::from_checked(RuleSetParams {
            forks: ForkHeights {
                feb: NEVER + 1,
                ..ForkHeights::all_at(NEVER)
            },
            target_spacing: TARGET_SPACING,
            target_timespan: TARGET_TIMESPAN,
            difficulty_switch_height: DIFFICULTY_SWITCH_HEIGHT,
            allow_min_difficulty: true,
            pow_limit: U256::MAX >> 1usize,
            genesis_bits: Some(NetworkType::Regtest.genesis_bits()),
        })
    }

    pub fn params(&self) -> &RuleSetParams {
        &self.params
    }

    pub fn forks(&self) -> &ForkHeights {
        &self.params.forks
    }

    pub fn target_spacing(&self) -> i64 {
        self.params.target_spacing
    }

    pub fn target_timespan(&self) -> i64 {
        self.params.target_timespan
    }

    pub fn difficulty_switch_height(&self) -> u64 {
        self.params.difficulty_switch_height
    }

    pub fn allow_min_difficulty(&self) -> bool {
        self.params.allow_min_difficulty
    }

    /// The difficulty ceiling (largest permitted target).
    pub fn pow_limit(&self) -> &U256 {
        &self.params.pow_limit
    }

    /// The ceiling in compact form. Lossy: `pow_limit_bits().expand() <= pow_limit()`.
    pub fn pow_limit_bits(&self) -> CompactTarget {
        self.pow_limit_bits
    }

    /// Bits the genesis block declares.
    ///
    /// Not always `pow_limit_bits()`: mainnet genesis carries `0x1e0ffff0`
    /// while its limit encodes to `0x1e0fffff`.
    pub fn genesis_bits(&self) -> CompactTarget {
        self.params.genesis_bits.unwrap_or(self.pow_limit_bits)
    }

    /// Blocks per retarget window: `target_timespan / target_spacing`.
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.params.target_timespan / self.params.target_spacing
    }

    /// Whether a block at `height` is governed by July-or-later rules.
    pub fn past_july_fork(&self, height: u64) -> bool {
        height >= self.params.forks.july
    }

    /// Whether a block at `height` is governed by the median-of-60 rules.
    pub fn past_november_fork(&self, height: u64) -> bool {
        height > self.params.forks.november
    }
}
