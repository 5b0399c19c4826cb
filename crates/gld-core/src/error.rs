//! Error types for GLD difficulty consensus.
use thiserror::Error;

use crate::compact::CompactTarget;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("negative compact target: {0}")] Negative(CompactTarget),
    #[error("overflowing compact target: {0}")] Overflow(CompactTarget),
    #[error("zero compact target: {0}")] Zero(CompactTarget),
    #[error("target {0} above proof-of-work limit")] AboveLimit(CompactTarget),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetargetError {
    #[error("insufficient history at height {height}: need {needed} ancestors, found {available}")]
    InsufficientHistory { height: u64, needed: u64, available: u64 },
    #[error("parent height mismatch: expected {expected}, got {got}")] HeightMismatch { expected: u64, got: u64 },
    #[error("candidate at height {0} has no parent")] MissingParent(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("target spacing must be positive")] ZeroSpacing,
    #[error("target timespan {timespan} shorter than spacing {spacing}")] TimespanTooShort { timespan: i64, spacing: i64 },
    #[error("proof-of-work limit must be non-zero")] ZeroPowLimit,
    #[error("unknown network: {0}")] UnknownNetwork(String),
    #[error("invalid rule set: {0}")] Parse(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("invalid PoW")] InvalidPoW,
    #[error("bad difficulty bits: got {got}, expected {expected}")] BadDifficulty { got: CompactTarget, expected: CompactTarget },
    #[error(transparent)] Retarget(#[from] RetargetError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainStateError {
    #[error("height gap: expected {expected}, got {got}")] NonContiguous { expected: u64, got: u64 },
    #[error("header at height {0} not found")] HeaderNotFound(u64),
}

#[derive(Error, Debug)]
pub enum GldError {
    #[error(transparent)] Target(#[from] TargetError),
    #[error(transparent)] Retarget(#[from] RetargetError),
    #[error(transparent)] RuleSet(#[from] RuleSetError),
    #[error(transparent)] Block(#[from] BlockError),
    #[error(transparent)] ChainState(#[from] ChainStateError),
}
