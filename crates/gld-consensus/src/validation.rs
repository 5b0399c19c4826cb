//! Header difficulty validation.
//!
//! [`HeaderValidator`] combines the retarget engine with the proof-of-work
//! check: a header is acceptable when its declared bits equal the required
//! bits for its height and its hash satisfies them.

use gld_core::error::BlockError;
use gld_core::rules::EpochRuleSet;
use gld_core::traits::HeaderChain;
use gld_core::types::{BlockHeaderView, Hash256};
use tracing::debug;

use crate::pow::check_proof_of_work;
use crate::retarget::RetargetEngine;

#[derive(Debug, Clone)]
pub struct HeaderValidator {
    engine: RetargetEngine,
}

impl HeaderValidator {
    pub fn new(rules: EpochRuleSet) -> Self {
        Self {
            engine: RetargetEngine::new(rules),
        }
    }

    pub fn engine(&self) -> &RetargetEngine {
        &self.engine
    }

    /// Validate the difficulty fields of `header`.
    ///
    /// `parent` is the header it builds on (`None` for genesis) and `hash`
    /// its proof-of-work hash. Genesis must declare the network's genesis
    /// bits rather than a computed target.
    ///
    /// # Errors
    ///
    /// - [`BlockError::Retarget`] when the required target cannot be computed.
    /// - [`BlockError::BadDifficulty`] when the declared bits differ from it.
    /// - [`BlockError::InvalidPoW`] when the hash does not meet the bits.
    pub fn validate<C: HeaderChain + ?Sized>(
        &self,
        chain: &C,
        parent: Option<&BlockHeaderView>,
        header: &BlockHeaderView,
        hash: &Hash256,
    ) -> Result<(), BlockError> {
        // --- Difficulty ---

        let expected = match parent {
            None if header.height == 0 => self.engine.rules().genesis_bits(),
            _ => self
                .engine
                .required_target(chain, parent, header.height, header.timestamp)?,
        };
        if header.bits != expected {
            debug!(
                height = header.height,
                got = %header.bits,
                %expected,
                "validate: wrong bits"
            );
            return Err(BlockError::BadDifficulty {
                got: header.bits,
                expected,
            });
        }

        // --- Proof of work ---

        if !check_proof_of_work(hash, header.bits, self.engine.rules()) {
            debug!(height = header.height, %hash, "validate: hash above target");
            return Err(BlockError::InvalidPoW);
        }

        Ok(())
    }
}
