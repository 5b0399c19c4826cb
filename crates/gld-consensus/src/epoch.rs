//! Retarget epoch selection.
//!
//! The rule epochs are chosen once per call from the candidate height and the
//! rule set's fork heights. Nothing is latched between calls.

use std::fmt;

use gld_core::rules::EpochRuleSet;

/// Refinements active inside the median-of-60 family.
///
/// Each flag is an independent height comparison, so a rule set whose forks
/// activate in an unusual order still gets exactly the checks its heights
/// imply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MedianRules {
    /// `height > mayFork`: average-of-120 guard.
    pub average_guard: bool,
    /// `height > novemberFork2`: deadlock defense.
    pub deadlock_defense: bool,
    /// `height > julyFork2`: retarget every block, final clamp and ratchets.
    pub per_block: bool,
}

/// Which difficulty rules govern a candidate height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetEpoch {
    /// `height < julyFork`: 504/2016-block windows with the legacy constants.
    Legacy,
    /// `julyFork <= height <= novemberFork`: windows over the configured timespan.
    July,
    /// `height > novemberFork`: median-of-60 retargeting.
    Median(MedianRules),
}

impl RetargetEpoch {
    /// Select the epoch for a candidate block at `height`.
    pub fn for_height(rules: &EpochRuleSet, height: u64) -> Self {
        let forks = rules.forks();
        if height < forks.july {
            Self::Legacy
        } else if height > forks.november {
            Self::Median(MedianRules {
                average_guard: height > forks.may,
                deadlock_defense: height > forks.november2,
                per_block: height > forks.july2,
            })
        } else {
            Self::July
        }
    }

    /// Short name of the most recent fork in effect.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::July => "july",
            Self::Median(m) if m.per_block => "july2",
            Self::Median(m) if m.average_guard => "may",
            Self::Median(m) if m.deadlock_defense => "november2",
            Self::Median(_) => "november",
        }
    }
}

impl fmt::Display for RetargetEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gld_core::rules::{ForkHeights, RuleSetParams};

    #[test]
    fn mainnet_epoch_boundaries() {
        let rules = EpochRuleSet::mainnet();
        let cases = [
            (0, "legacy"),
            (44_999, "legacy"),
            (45_000, "july"),
            (100_000, "july"),
            (103_000, "july"),
            (103_001, "november"),
            (118_800, "november"),
            (118_801, "november2"),
            (248_000, "november2"),
            (248_001, "may"),
            (251_230, "may"),
            (251_231, "july2"),
            (2_000_000, "july2"),
        ];
        for (height, name) in cases {
            assert_eq!(RetargetEpoch::for_height(&rules, height).name(), name, "height {height}");
        }
    }

    #[test]
    fn testnet_switches_straight_to_per_block() {
        let rules = EpochRuleSet::testnet();
        assert_eq!(RetargetEpoch::for_height(&rules, 2015), RetargetEpoch::Legacy);
        assert_eq!(RetargetEpoch::for_height(&rules, 2016), RetargetEpoch::July);
        assert_eq!(
            RetargetEpoch::for_height(&rules, 2017),
            RetargetEpoch::Median(MedianRules {
                average_guard: true,
                deadlock_defense: true,
                per_block: true,
            })
        );
    }

    #[test]
    fn regtest_stays_legacy() {
        let rules = EpochRuleSet::regtest();
        assert_eq!(RetargetEpoch::for_height(&rules, 5_000_000), RetargetEpoch::Legacy);
    }

    #[test]
    fn flags_follow_heights_not_fork_order() {
        // Per-block rules activate before the average guard here.
        let params = RuleSetParams {
            forks: ForkHeights {
                july: 10,
                october: 10,
                november: 20,
                november2: 1000,
                may: 500,
                july2: 30,
                feb: 0,
            },
            ..EpochRuleSet::mainnet().params().clone()
        };
        let rules = EpochRuleSet::new(params).unwrap();
        let epoch = RetargetEpoch::for_height(&rules, 100);
        assert_eq!(
            epoch,
            RetargetEpoch::Median(MedianRules {
                average_guard: false,
                deadlock_defense: false,
                per_block: true,
            })
        );
        assert_eq!(epoch.to_string(), "july2");
    }
}
