//! # gld-consensus — Difficulty retargeting and proof-of-work validation.
//!
//! This crate computes the target every block must declare and checks
//! block hashes against declared targets:
//!
//! - [`epoch`]: which rule family governs a height.
//! - [`window`]: block-time statistics over recent headers.
//! - [`retarget`]: the [`RetargetEngine`] itself.
//! - [`pow`]: strict target decoding and the hash comparison.
//! - [`validation`]: both checks combined for a candidate header.
//!
//! Everything here is stateless; history is read through
//! [`HeaderChain`](gld_core::traits::HeaderChain).

pub mod epoch;
pub mod pow;
pub mod retarget;
pub mod validation;
pub mod window;

pub use epoch::{MedianRules, RetargetEpoch};
pub use pow::{check_proof_of_work, check_target};
pub use retarget::{MedianAnalysis, RetargetEngine, Schedule};
pub use validation::HeaderValidator;
