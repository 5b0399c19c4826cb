//! Protocol constants and network selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compact::CompactTarget;
use crate::error::RuleSetError;

/// Height at which the 504-block legacy interval replaced the 2016-block one.
///
/// Hard-coded on every network, including the ones whose forks never activate.
pub const DIFFICULTY_SWITCH_HEIGHT: u64 = 21_000;

/// Pre-July timespan: one week divided by eight, in seconds.
pub const LEGACY_TARGET_TIMESPAN: i64 = 7 * 24 * 60 * 60 / 8;
/// Pre-July block spacing: two and a half minutes.
pub const LEGACY_TARGET_SPACING: i64 = 150;

/// Median-of-60 window: timestamps collected, ending at the parent.
pub const MEDIAN_WINDOW: usize = 60;
/// Position of the median in the descending-sorted 59 deltas.
pub const MEDIAN_INDEX: usize = 29;
/// May-fork average window: timestamps collected, ending at the parent.
pub const AVERAGE_WINDOW: usize = 120;
/// Distance (in blocks) of the short difficulty-rise ceiling.
pub const SHORT_CEILING_DEPTH: u64 = 60;
/// Distance (in blocks) of the long difficulty-rise ceiling.
pub const LONG_CEILING_DEPTH: u64 = 240;

/// Fork heights used by networks whose forks never activate.
pub const NEVER: u64 = 100_000_000;

pub const MAINNET_GENESIS_BITS: CompactTarget = CompactTarget(0x1e0f_fff0);
pub const REGTEST_GENESIS_BITS: CompactTarget = CompactTarget(0x207f_ffff);

/// Target block spacing after the July fork (two minutes).
pub const TARGET_SPACING: i64 = 2 * 60;
/// Target retarget timespan after the July fork (two hours, 60 blocks).
pub const TARGET_TIMESPAN: i64 = 2 * 60 * 60;

/// Network type: Mainnet, Testnet, or Regtest.
///
/// Selects the [`EpochRuleSet`](crate::rules::EpochRuleSet) preset.
///
/// # Examples
///
/// ```
/// use gld_core::constants::NetworkType;
/// let net: NetworkType = "test".parse().unwrap();
/// assert_eq!(net, NetworkType::Testnet);
/// assert_eq!(net.to_string(), "test");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network: every fork at 2016, min-difficulty blocks allowed.
    Testnet,
    /// Local regression-test network: forks never activate.
    Regtest,
}

impl NetworkType {
    /// Short network identifier used on the command line and in rule files.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Mainnet => "main",
            Self::Testnet => "test",
            Self::Regtest => "regtest",
        }
    }

    /// Compact target of the network's genesis block.
    pub fn genesis_bits(&self) -> CompactTarget {
        match self {
            Self::Regtest => REGTEST_GENESIS_BITS,
            _ => MAINNET_GENESIS_BITS,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for NetworkType {
    type Err = RuleSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(Self::Mainnet),
            "test" | "testnet" => Ok(Self::Testnet),
            "regtest" => Ok(Self::Regtest),
            other => Err(RuleSetError::UnknownNetwork(other.to_string())),
        }
    }
}
