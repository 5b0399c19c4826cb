//! Adversarial and scenario test suite for GLD difficulty consensus.
//!
//! This crate contains integration tests that drive the retarget engine with
//! hostile timestamp sequences and long simulated chains. The consensus
//! invariants (difficulty ceiling, ratchets, determinism) are verified
//! under randomized inputs.

pub mod helpers;
