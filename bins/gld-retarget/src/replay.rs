//! Header dump replay.
//!
//! A dump is JSON lines, one header per line:
//! `{"height":7,"timestamp":1368560876,"bits":504365040}`. Heights must be
//! contiguous. Every header whose required target can be computed from the
//! dump is checked against its declared bits.

use std::io::BufRead;

use anyhow::{Context, Result};
use gld_consensus::retarget::RetargetEngine;
use gld_core::chain_state::MemoryHeaderChain;
use gld_core::compact::CompactTarget;
use gld_core::error::RetargetError;
use gld_core::types::BlockHeaderView;
use tracing::{debug, warn};

/// Outcome for one replayed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRow {
    pub height: u64,
    pub epoch: &'static str,
    pub declared: CompactTarget,
    /// `None` when the dump does not reach back far enough.
    pub expected: Option<CompactTarget>,
}

impl ReplayRow {
    pub fn is_mismatch(&self) -> bool {
        self.expected.is_some_and(|e| e != self.declared)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub checked: usize,
    pub skipped: usize,
    pub mismatches: usize,
}

/// Parse a JSON-lines dump. Blank lines are ignored.
pub fn read_headers(reader: impl BufRead) -> Result<Vec<BlockHeaderView>> {
    let mut headers = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let header: BlockHeaderView = serde_json::from_str(line)
            .with_context(|| format!("invalid header on line {}", index + 1))?;
        headers.push(header);
    }
    Ok(headers)
}

/// Recompute the required target of every header in `chain` after the
/// first.
///
/// The first header, genesis included, only serves as a parent. Headers
/// whose retarget window reaches past the start of the dump are skipped.
pub fn replay(engine: &RetargetEngine, chain: &MemoryHeaderChain) -> Result<Vec<ReplayRow>> {
    let mut rows = Vec::with_capacity(chain.len().saturating_sub(1));
    let mut headers = chain.iter();
    let Some(mut parent) = headers.next().copied() else {
        return Ok(rows);
    };
    for header in headers {
        let expected = match engine.next_target(chain, &parent, header.timestamp) {
            Ok(bits) => Some(bits),
            Err(RetargetError::InsufficientHistory {
                needed, available, ..
            }) => {
                debug!(
                    height = header.height,
                    needed,
                    available,
                    "replay: window before dump start"
                );
                None
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("retarget failed at height {}", header.height));
            }
        };
        let row = ReplayRow {
            height: header.height,
            epoch: engine.epoch_for(header.height).name(),
            declared: header.bits,
            expected,
        };
        if row.is_mismatch() {
            warn!(
                height = row.height,
                declared = %row.declared,
                expected = ?row.expected,
                "replay: bits mismatch"
            );
        }
        rows.push(row);
        parent = *header;
    }
    Ok(rows)
}

pub fn summarize(rows: &[ReplayRow]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for row in rows {
        match row.expected {
            None => summary.skipped += 1,
            Some(_) => {
                summary.checked += 1;
                if row.is_mismatch() {
                    summary.mismatches += 1;
                }
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use gld_core::rules::EpochRuleSet;
    use std::io::Cursor;

    const BITS: CompactTarget = CompactTarget(0x1d0f_fff0);

    fn dump(chain: &MemoryHeaderChain) -> String {
        chain
            .iter()
            .map(|h| serde_json::to_string(h).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn read_headers_skips_blank_lines() {
        let text = concat!(
            "{\"height\":0,\"timestamp\":100,\"bits\":504365040}\n",
            "\n",
            "{\"height\":1,\"timestamp\":220,\"bits\":504365040}\n",
        );
        let headers = read_headers(Cursor::new(text)).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[1], BlockHeaderView::new(1, 220, CompactTarget(0x1e0f_fff0)));
    }

    #[test]
    fn read_headers_reports_line() {
        let text = "{\"height\":0,\"timestamp\":100,\"bits\":1}\nnot json\n";
        let err = read_headers(Cursor::new(text)).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn consistent_dump_has_no_mismatches() {
        let engine = RetargetEngine::new(EpochRuleSet::mainnet());
        let chain = MemoryHeaderChain::linear(44_900, 200, 1_000_000, 120, BITS);
        let text = dump(&chain);
        let headers = read_headers(Cursor::new(text)).unwrap();
        let parsed = MemoryHeaderChain::from_headers(headers).unwrap();

        let rows = replay(&engine, &parsed).unwrap();
        assert_eq!(rows.len(), 199);
        let summary = summarize(&rows);
        assert_eq!(summary.mismatches, 0);
        // Legacy heights before the first July window still inherit.
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.checked, 199);
    }

    #[test]
    fn tampered_bits_are_reported() {
        let engine = RetargetEngine::new(EpochRuleSet::mainnet());
        let mut chain = MemoryHeaderChain::linear(44_900, 200, 1_000_000, 120, BITS);
        chain.get_mut(45_010).unwrap().bits = CompactTarget(0x1d0f_0000);

        let rows = replay(&engine, &chain).unwrap();
        let bad: Vec<_> = rows.iter().filter(|r| r.is_mismatch()).collect();
        // The tampered header, and the one after it which should have
        // inherited from it.
        assert_eq!(bad.len(), 2);
        assert_eq!(bad[0].height, 45_010);
        assert_eq!(bad[0].expected, Some(BITS));
        assert_eq!(bad[1].height, 45_011);
    }

    #[test]
    fn short_dump_skips_unreachable_windows() {
        let engine = RetargetEngine::new(EpochRuleSet::mainnet());
        let chain = MemoryHeaderChain::linear(300_000, 30, 1_000_000, 120, BITS);
        let summary = summarize(&replay(&engine, &chain).unwrap());
        assert_eq!(summary.skipped, 29);
        assert_eq!(summary.checked, 0);
    }

    #[test]
    fn mainnet_genesis_dump_has_no_mismatches() {
        let engine = RetargetEngine::new(EpochRuleSet::mainnet());
        let genesis_bits = EpochRuleSet::mainnet().genesis_bits();
        assert_eq!(genesis_bits, CompactTarget(0x1e0f_fff0));
        let chain = MemoryHeaderChain::linear(0, 10, 1_000_000, 150, genesis_bits);

        let rows = replay(&engine, &chain).unwrap();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].height, 1);
        assert_eq!(rows[0].expected, Some(genesis_bits));
        assert_eq!(summarize(&rows).mismatches, 0);
    }

    #[test]
    fn empty_dump_replays_nothing() {
        let engine = RetargetEngine::new(EpochRuleSet::mainnet());
        assert!(replay(&engine, &MemoryHeaderChain::new()).unwrap().is_empty());
    }
}
