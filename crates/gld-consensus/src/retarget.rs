//! Difficulty retargeting.
//!
//! [`RetargetEngine::required_target`] computes the compact target a block
//! at a given height must declare. The rule family is picked per call by
//! [`RetargetEpoch::for_height`]:
//!
//! - **Legacy / July**: retarget once per window of `interval` blocks from the
//!   window's elapsed time, clamped to a band around the target timespan.
//!   Between boundaries the parent's target is inherited, except that
//!   networks with `allow_min_difficulty` fall back to the proof-of-work
//!   limit after a long gap.
//! - **Median**: the window time comes from the median block interval of the
//!   last 60 headers, refined by the average guard and the deadlock defense.
//!   Once per-block retargeting is active the result is additionally held
//!   between a 25% easing floor and two difficulty ceilings measured against
//!   the targets 60 and 240 blocks back.
//!
//! All arithmetic on targets goes through [`U256::mul_div`], which wraps on
//! multiplication exactly like every other node.

use gld_core::compact::CompactTarget;
use gld_core::constants::{
    AVERAGE_WINDOW, LEGACY_TARGET_SPACING, LEGACY_TARGET_TIMESPAN, LONG_CEILING_DEPTH,
    MEDIAN_WINDOW, SHORT_CEILING_DEPTH,
};
use gld_core::error::RetargetError;
use gld_core::rules::EpochRuleSet;
use gld_core::traits::HeaderChain;
use gld_core::types::BlockHeaderView;
use gld_core::uint::U256;
use tracing::{debug, trace, warn};

use crate::epoch::{MedianRules, RetargetEpoch};
use crate::window::{TimeWindow, average_interval, median_interval};

/// Average block time assumed before the average guard activates.
const DEFAULT_AVERAGE_TIME: i64 = 120;
/// The target block time the median rules steer toward.
const TARGET_MEDIAN_TIME: i64 = 120;

/// Average guard, before per-block retargeting.
const STALLED_AVERAGE: i64 = 180;
const STALLED_MEDIAN: i64 = 130;
const FAST_AVERAGE: i64 = 108;
const FAST_MEDIAN: i64 = 110;

/// Half-adjust trigger: both newest intervals at least this long.
const STALL_GAP: i64 = 1200;
const HALF_ADJUST_MEDIAN: i64 = 240;

/// Median forced when the deadlock pattern shows up.
const DEADLOCK_MEDIAN: i64 = 110;
const DEADLOCK_MEDIAN_PER_BLOCK: i64 = 119;

/// Final clamp under per-block retargeting.
const SLOW_AVERAGE: i64 = 216;
const SLOW_MEDIAN: i64 = 122;
const SLOW_CLAMPED_MEDIAN: i64 = 121;
/// 120 * 1.42, truncated.
const HALF_ADJUST_CLAMPED_MEDIAN: i64 = 170;
const QUICK_LIMIT: i64 = 117;

/// The median block time is scaled to a sixty-block timespan.
const MEDIAN_TIMESPAN_BLOCKS: i64 = 60;

/// Timespan bookkeeping for one candidate height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Window length in seconds the actual timespan is compared against.
    pub timespan: i64,
    /// Expected seconds per block.
    pub spacing: i64,
    /// Blocks per retarget window.
    pub interval: i64,
    /// Whether the height is at or past the difficulty switch height.
    pub new_protocol: bool,
}

impl Schedule {
    /// Allowed range of the measured timespan.
    ///
    /// The new protocol allows roughly +-30% per retarget; before it the
    /// band is a factor of four either way.
    pub fn timespan_bounds(&self) -> (i64, i64) {
        if self.new_protocol {
            (self.timespan * 70 / 99, self.timespan * 99 / 70)
        } else {
            (self.timespan / 4, self.timespan * 4)
        }
    }

    pub fn clamp(&self, actual: i64) -> i64 {
        let (min, max) = self.timespan_bounds();
        actual.clamp(min, max)
    }

    fn interval_blocks(&self) -> u64 {
        self.interval.max(1) as u64
    }

    fn divisor(&self) -> u64 {
        self.timespan.max(1) as u64
    }
}

/// Block-time statistics that drive a median-epoch retarget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedianAnalysis {
    /// Median block time after every adjustment; the actual timespan is
    /// sixty times this.
    pub median_time: i64,
    /// Average of the last 119 intervals, or 120 before the average guard.
    pub average_time: i64,
    /// The chain looks stalled; the easing floor is skipped.
    pub half_adjust: bool,
    /// The deadlock pattern forced the median down.
    pub deadlock: bool,
}

/// Compute the median-epoch statistics for the block after `parent`.
pub fn analyze_block_times<C: HeaderChain + ?Sized>(
    chain: &C,
    parent: &BlockHeaderView,
    rules: MedianRules,
) -> MedianAnalysis {
    let recent = TimeWindow::collect(chain, parent, MEDIAN_WINDOW);
    let mut median_time = median_interval(&recent.intervals());
    let mut average_time = DEFAULT_AVERAGE_TIME;
    let mut half_adjust = false;

    if recent.padding() > 0 {
        warn!(
            height = parent.height + 1,
            padding = recent.padding(),
            "retarget: short history, median window padded"
        );
    }

    if rules.average_guard {
        let long_window = TimeWindow::collect(chain, parent, AVERAGE_WINDOW);
        if long_window.padding() > 0 {
            trace!(padding = long_window.padding(), "retarget: average window padded");
        }
        let long = long_window.intervals();
        average_time = average_interval(&long);
        if !rules.per_block {
            if average_time >= STALLED_AVERAGE {
                median_time = STALLED_MEDIAN;
            } else if average_time >= FAST_AVERAGE && median_time < TARGET_MEDIAN_TIME {
                median_time = FAST_MEDIAN;
            }
        } else {
            median_time = median_time.min(average_time);
            let stalled = matches!(
                long.as_slice(),
                [newest, second, ..] if *newest >= STALL_GAP && *second >= STALL_GAP
            );
            if average_time >= STALLED_AVERAGE && stalled {
                half_adjust = true;
                median_time = HALF_ADJUST_MEDIAN;
            }
        }
    }

    let mut deadlock = false;
    if rules.deadlock_defense
        && median_time >= TARGET_MEDIAN_TIME
        && recent.has_deadlock_signature()
    {
        deadlock = true;
        median_time = if rules.per_block {
            DEADLOCK_MEDIAN_PER_BLOCK
        } else {
            DEADLOCK_MEDIAN
        };
        warn!(
            height = parent.height + 1,
            median_time,
            "retarget: deadlock pattern detected"
        );
    }

    if rules.per_block {
        if average_time > SLOW_AVERAGE || median_time > SLOW_MEDIAN {
            median_time = if half_adjust {
                HALF_ADJUST_CLAMPED_MEDIAN
            } else {
                SLOW_CLAMPED_MEDIAN
            };
        } else if average_time < QUICK_LIMIT || median_time < QUICK_LIMIT {
            median_time = QUICK_LIMIT;
        }
    }

    MedianAnalysis {
        median_time,
        average_time,
        half_adjust,
        deadlock,
    }
}

/// A timespan as the 32-bit multiplier used on targets.
fn timespan_factor(actual: i64) -> u32 {
    u32::try_from(actual.max(0)).unwrap_or(u32::MAX)
}

/// Stateless difficulty calculator for one rule set.
///
/// Safe to share between threads; every call reads only its arguments.
#[derive(Debug, Clone)]
pub struct RetargetEngine {
    rules: EpochRuleSet,
}

impl RetargetEngine {
    pub fn new(rules: EpochRuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &EpochRuleSet {
        &self.rules
    }

    /// The epoch governing a candidate at `height`.
    pub fn epoch_for(&self, height: u64) -> RetargetEpoch {
        RetargetEpoch::for_height(&self.rules, height)
    }

    /// The timespan, spacing and interval in force at `height`.
    pub fn schedule(&self, height: u64) -> Schedule {
        let (base, spacing) = match self.epoch_for(height) {
            RetargetEpoch::Legacy => (LEGACY_TARGET_TIMESPAN, LEGACY_TARGET_SPACING),
            RetargetEpoch::July | RetargetEpoch::Median(_) => {
                (self.rules.target_timespan(), self.rules.target_spacing())
            }
        };
        let new_protocol = height >= self.rules.difficulty_switch_height();
        let timespan = if new_protocol { base } else { base * 4 };
        Schedule {
            timespan,
            spacing,
            interval: (timespan / spacing).max(1),
            new_protocol,
        }
    }

    /// Convenience for the block directly on top of `parent`.
    pub fn next_target<C: HeaderChain + ?Sized>(
        &self,
        chain: &C,
        parent: &BlockHeaderView,
        candidate_timestamp: i64,
    ) -> Result<CompactTarget, RetargetError> {
        self.required_target(chain, Some(parent), parent.height + 1, candidate_timestamp)
    }

    /// The compact target a block at `candidate_height` must declare.
    ///
    /// `parent` is `None` only for genesis, whose target is the
    /// proof-of-work limit. `candidate_timestamp` matters only for the
    /// minimum-difficulty rule on networks that allow it.
    ///
    /// # Errors
    ///
    /// - [`RetargetError::MissingParent`] for a non-genesis candidate without parent.
    /// - [`RetargetError::HeightMismatch`] when `parent` is not at `candidate_height - 1`.
    /// - [`RetargetError::InsufficientHistory`] when the chain cannot reach
    ///   the first block of the retarget window.
    pub fn required_target<C: HeaderChain + ?Sized>(
        &self,
        chain: &C,
        parent: Option<&BlockHeaderView>,
        candidate_height: u64,
        candidate_timestamp: i64,
    ) -> Result<CompactTarget, RetargetError> {
        let Some(parent) = parent else {
            if candidate_height == 0 {
                return Ok(self.rules.pow_limit_bits());
            }
            return Err(RetargetError::MissingParent(candidate_height));
        };
        if parent.height.checked_add(1) != Some(candidate_height) {
            return Err(RetargetError::HeightMismatch {
                expected: candidate_height.saturating_sub(1),
                got: parent.height,
            });
        }

        let epoch = self.epoch_for(candidate_height);
        let schedule = self.schedule(candidate_height);
        let per_block = matches!(epoch, RetargetEpoch::Median(m) if m.per_block);

        if !per_block && !self.is_retarget_height(candidate_height, &schedule) {
            let bits = self.off_interval_target(chain, parent, candidate_timestamp, &schedule);
            trace!(height = candidate_height, %epoch, %bits, "retarget: between boundaries");
            return Ok(bits);
        }

        let first = self.window_start(chain, parent, candidate_height, &schedule)?;
        let target = match epoch {
            RetargetEpoch::Legacy | RetargetEpoch::July => {
                self.windowed_target(parent, &first, &schedule)
            }
            RetargetEpoch::Median(rules) => self.median_target(chain, parent, rules, &schedule),
        };

        let pow_limit = *self.rules.pow_limit();
        let target = if target > pow_limit { pow_limit } else { target };
        let bits = CompactTarget::from_target(&target);
        debug!(
            height = candidate_height,
            %epoch,
            before = %parent.bits,
            after = %bits,
            "retarget: new target"
        );
        Ok(bits)
    }

    fn is_retarget_height(&self, height: u64, schedule: &Schedule) -> bool {
        height % schedule.interval_blocks() == 0 || height == self.rules.difficulty_switch_height()
    }

    /// Target for a candidate that does not start a new window.
    fn off_interval_target<C: HeaderChain + ?Sized>(
        &self,
        chain: &C,
        parent: &BlockHeaderView,
        candidate_timestamp: i64,
        schedule: &Schedule,
    ) -> CompactTarget {
        if !self.rules.allow_min_difficulty() {
            return parent.bits;
        }
        let limit_bits = self.rules.pow_limit_bits();
        if candidate_timestamp > parent.timestamp.saturating_add(schedule.spacing * 2) {
            return limit_bits;
        }
        // Skip back over minimum-difficulty blocks to the last real target.
        let interval = schedule.interval_blocks();
        let mut current = *parent;
        while current.height % interval != 0 && current.bits == limit_bits {
            match chain.previous(&current) {
                Some(prev) => current = prev,
                None => break,
            }
        }
        current.bits
    }

    /// First header of the window ending at `parent`.
    ///
    /// The very first window is one block short because genesis has no
    /// predecessor.
    fn window_start<C: HeaderChain + ?Sized>(
        &self,
        chain: &C,
        parent: &BlockHeaderView,
        height: u64,
        schedule: &Schedule,
    ) -> Result<BlockHeaderView, RetargetError> {
        let interval = schedule.interval_blocks();
        let depth = if parent.height + 1 == interval {
            interval - 1
        } else {
            interval
        };
        chain.ancestor(parent, depth).ok_or_else(|| {
            let oldest = chain.ancestor_or_oldest(parent, depth);
            RetargetError::InsufficientHistory {
                height,
                needed: depth,
                available: parent.height.saturating_sub(oldest.height),
            }
        })
    }

    fn windowed_target(
        &self,
        parent: &BlockHeaderView,
        first: &BlockHeaderView,
        schedule: &Schedule,
    ) -> U256 {
        let measured = parent.timestamp.saturating_sub(first.timestamp);
        let actual = schedule.clamp(measured);
        debug!(measured, actual, target = schedule.timespan, "retarget: window timespan");
        parent
            .bits
            .expand()
            .mul_div(timespan_factor(actual), schedule.divisor())
    }

    fn median_target<C: HeaderChain + ?Sized>(
        &self,
        chain: &C,
        parent: &BlockHeaderView,
        rules: MedianRules,
        schedule: &Schedule,
    ) -> U256 {
        let analysis = analyze_block_times(chain, parent, rules);
        let mut actual = analysis.median_time.saturating_mul(MEDIAN_TIMESPAN_BLOCKS);
        if !rules.per_block {
            actual = schedule.clamp(actual);
        }
        debug!(
            median_time = analysis.median_time,
            average_time = analysis.average_time,
            half_adjust = analysis.half_adjust,
            actual,
            "retarget: median timespan"
        );
        let target = parent
            .bits
            .expand()
            .mul_div(timespan_factor(actual), schedule.divisor());
        if rules.per_block {
            self.apply_ratchets(chain, parent, target, analysis.half_adjust)
        } else {
            target
        }
    }

    /// Limit how far a per-block retarget may move.
    ///
    /// The target may grow at most 25% over the parent's (skipped when
    /// half-adjusting) and may not shrink below 100/102 of the target 60
    /// blocks back or 100/408 of the target 240 blocks back. Substituted
    /// bounds are rounded through the compact encoding.
    fn apply_ratchets<C: HeaderChain + ?Sized>(
        &self,
        chain: &C,
        parent: &BlockHeaderView,
        mut target: U256,
        half_adjust: bool,
    ) -> U256 {
        let easing_floor = parent.bits.expand().mul_div(10, 8);
        if !half_adjust && target > easing_floor {
            trace!("retarget: easing limited to 25%");
            target = CompactTarget::normalize(&easing_floor);
        }

        let short = chain.ancestor_or_oldest(parent, SHORT_CEILING_DEPTH);
        let short_ceiling = short.bits.expand().mul_div(100, 102);
        if target < short_ceiling {
            trace!(reference = short.height, "retarget: 60-block ceiling applied");
            target = CompactTarget::normalize(&short_ceiling);
        }

        let long = chain.ancestor_or_oldest(parent, LONG_CEILING_DEPTH);
        let long_ceiling = long.bits.expand().mul_div(100, 408);
        if target < long_ceiling {
            trace!(reference = long.height, "retarget: 240-block ceiling applied");
            target = CompactTarget::normalize(&long_ceiling);
        }
        target
    }
}
