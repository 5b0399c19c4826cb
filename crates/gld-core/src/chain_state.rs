//! In-memory header chain.
//!
//! [`MemoryHeaderChain`] stores a contiguous run of headers, optionally
//! starting above genesis. Walking back from its first header stops there,
//! which lets tests and tools model a chain segment without materializing
//! hundreds of thousands of earlier blocks.

use crate::compact::CompactTarget;
use crate::error::ChainStateError;
use crate::traits::HeaderChain;
use crate::types::BlockHeaderView;

/// Contiguous in-memory header store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryHeaderChain {
    headers: Vec<BlockHeaderView>,
}

impl MemoryHeaderChain {
    /// An empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from headers in ascending, gap-free height order.
    ///
    /// # Errors
    ///
    /// Returns [`ChainStateError::NonContiguous`] at the first height gap.
    pub fn from_headers(
        headers: impl IntoIterator<Item = BlockHeaderView>,
    ) -> Result<Self, ChainStateError> {
        let mut chain = Self::new();
        for header in headers {
            chain.push(header)?;
        }
        Ok(chain)
    }

    /// A segment whose header `i` sits at `start_height + i` with `timestamps[i]`.
    /// Every header carries the same `bits`.
    pub fn from_timestamps(start_height: u64, timestamps: &[i64], bits: CompactTarget) -> Self {
        let headers = timestamps
            .iter()
            .enumerate()
            .map(|(i, &ts)| BlockHeaderView::new(start_height + i as u64, ts, bits))
            .collect();
        Self { headers }
    }

    /// `count` headers from `start_height`, `spacing` seconds apart.
    pub fn linear(
        start_height: u64,
        count: usize,
        start_time: i64,
        spacing: i64,
        bits: CompactTarget,
    ) -> Self {
        let timestamps: Vec<i64> = (0..count as i64).map(|i| start_time + i * spacing).collect();
        Self::from_timestamps(start_height, &timestamps, bits)
    }

    /// Append a header; it must extend the tip by exactly one height.
    pub fn push(&mut self, header: BlockHeaderView) -> Result<(), ChainStateError> {
        if let Some(tip) = self.tip() {
            let expected = tip.height + 1;
            if header.height != expected {
                return Err(ChainStateError::NonContiguous {
                    expected,
                    got: header.height,
                });
            }
        }
        self.headers.push(header);
        Ok(())
    }

    /// Height of the first stored header.
    pub fn base_height(&self) -> Option<u64> {
        self.headers.first().map(|h| h.height)
    }

    pub fn tip(&self) -> Option<&BlockHeaderView> {
        self.headers.last()
    }

    pub fn get(&self, height: u64) -> Option<&BlockHeaderView> {
        let base = self.base_height()?;
        let index = usize::try_from(height.checked_sub(base)?).ok()?;
        self.headers.get(index)
    }

    /// Like [`get`](Self::get) but reports a missing height as an error.
    pub fn header(&self, height: u64) -> Result<&BlockHeaderView, ChainStateError> {
        self.get(height).ok_or(ChainStateError::HeaderNotFound(height))
    }

    /// Mutable access for building adversarial fixtures.
    pub fn get_mut(&mut self, height: u64) -> Option<&mut BlockHeaderView> {
        let base = self.base_height()?;
        let index = usize::try_from(height.checked_sub(base)?).ok()?;
        self.headers.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockHeaderView> {
        self.headers.iter()
    }
}

impl HeaderChain for MemoryHeaderChain {
    fn previous(&self, header: &BlockHeaderView) -> Option<BlockHeaderView> {
        let prev_height = header.height.checked_sub(1)?;
        self.get(prev_height).copied()
    }
}
