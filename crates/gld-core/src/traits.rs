//! Trait interfaces for GLD difficulty consensus.
//!
//! - [`HeaderChain`] — read-only, ancestor-walkable header history
//!   (implemented by the host's block index;
//!   [`MemoryHeaderChain`](crate::chain_state::MemoryHeaderChain) is the
//!   in-memory version used by tests and tools)

use crate::types::BlockHeaderView;

/// Read-only view of accepted block headers.
///
/// The only required operation is stepping from a header to its parent.
/// Everything the retarget engine needs is built on that and bounded by the
/// caller, so an implementation never has to materialize more than the
/// engine asks for. Walking stops at genesis (or at the oldest header the
/// implementation holds): `previous` returns `None` there.
pub trait HeaderChain {
    /// The parent of `header`, or `None` at the start of the chain.
    fn previous(&self, header: &BlockHeaderView) -> Option<BlockHeaderView>;

    /// The ancestor `depth` steps behind `header` (`depth == 0` is `header`).
    ///
    /// Returns `None` when the chain ends first.
    fn ancestor(&self, header: &BlockHeaderView, depth: u64) -> Option<BlockHeaderView> {
        let mut current = *header;
        for _ in 0..depth {
            current = self.previous(&current)?;
        }
        Some(current)
    }

    /// Like [`ancestor`](Self::ancestor) but stops at the oldest reachable
    /// header instead of failing.
    fn ancestor_or_oldest(&self, header: &BlockHeaderView, depth: u64) -> BlockHeaderView {
        let mut current = *header;
        for _ in 0..depth {
            match self.previous(&current) {
                Some(prev) => current = prev,
                None => break,
            }
        }
        current
    }

    /// Up to `count` headers ending at `tip`, newest first.
    ///
    /// Shorter than `count` only when the chain runs out.
    fn last_headers(&self, tip: &BlockHeaderView, count: usize) -> Vec<BlockHeaderView> {
        let mut out = Vec::with_capacity(count);
        let mut current = Some(*tip);
        while out.len() < count {
            match current {
                Some(header) => {
                    out.push(header);
                    current = self.previous(&header);
                }
                None => break,
            }
        }
        out
    }
}
