//! Block-time statistics for the median retarget epochs.
//!
//! A [`TimeWindow`] holds the timestamps of the last N headers, newest first.
//! When history runs out before N headers, the oldest reachable header is
//! repeated, so every window has its full length and short histories show up
//! as zero-length intervals.

use gld_core::traits::HeaderChain;
use gld_core::types::BlockHeaderView;

/// Headers compared by the deadlock scan sit this many blocks apart.
pub const DEADLOCK_STRIDE: usize = 5;

/// Five consecutive blocks spanning exactly this many seconds mark the
/// deadlock pattern.
pub const DEADLOCK_SPAN: i64 = 600;

/// Timestamps of the most recent headers, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    times: Vec<i64>,
    padding: usize,
}

impl TimeWindow {
    /// Collect `len` timestamps ending at `tip`, padding with the oldest
    /// reachable header.
    pub fn collect<C: HeaderChain + ?Sized>(chain: &C, tip: &BlockHeaderView, len: usize) -> Self {
        let headers = chain.last_headers(tip, len);
        let mut times: Vec<i64> = headers.iter().map(|h| h.timestamp).collect();
        let padding = len - times.len();
        if let Some(oldest) = headers.last() {
            times.resize(len, oldest.timestamp);
        }
        Self { times, padding }
    }

    pub fn from_times(times: Vec<i64>) -> Self {
        Self { times, padding: 0 }
    }

    /// How many trailing entries repeat the oldest header.
    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn times(&self) -> &[i64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Absolute gaps between neighbouring timestamps, newest first.
    ///
    /// A window of `n` timestamps yields `n - 1` gaps. Out-of-order
    /// timestamps count by magnitude.
    pub fn intervals(&self) -> Vec<i64> {
        self.times
            .windows(2)
            .map(|pair| pair[0].saturating_sub(pair[1]).saturating_abs())
            .collect()
    }

    /// Whether any pair of headers `DEADLOCK_STRIDE` apart spans exactly
    /// `DEADLOCK_SPAN` seconds.
    ///
    /// The tip (index 0) is excluded: pairs start at index 1.
    pub fn has_deadlock_signature(&self) -> bool {
        let pairs = self.times.len().saturating_sub(DEADLOCK_STRIDE);
        (1..pairs).any(|i| {
            self.times[i]
                .saturating_sub(self.times[i + DEADLOCK_STRIDE])
                .saturating_abs()
                == DEADLOCK_SPAN
        })
    }
}

/// Median of `intervals` taken from a descending sort.
///
/// Picks `sorted[(n - 1) / 2]`, so an even count yields the larger of the
/// two middle values. Returns 0 for an empty slice.
pub fn median_interval(intervals: &[i64]) -> i64 {
    if intervals.is_empty() {
        return 0;
    }
    let mut sorted = intervals.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted[(sorted.len() - 1) / 2]
}

/// Truncating mean of `intervals`. Returns 0 for an empty slice.
pub fn average_interval(intervals: &[i64]) -> i64 {
    if intervals.is_empty() {
        return 0;
    }
    let sum = intervals.iter().fold(0i64, |acc, &d| acc.saturating_add(d));
    sum / intervals.len() as i64
}
