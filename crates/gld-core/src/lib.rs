//! # gld-core
//! Foundation types for GLD difficulty consensus: 256-bit targets, the
//! compact target codec, per-network rule sets and the header-chain interface.

pub mod chain_state;
pub mod compact;
pub mod constants;
pub mod error;
pub mod rules;
pub mod traits;
pub mod types;
pub mod uint;

pub use compact::CompactTarget;
pub use rules::EpochRuleSet;
pub use types::{BlockHeaderView, Hash256};
pub use uint::U256;
