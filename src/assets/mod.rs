//! External asset collaborators.
//!
//! - Asset ledger: balances, allowances, atomic transfers
//! - Whitelist gate: which assets/amounts may be required as deposits
//! - Mock-friendly trait abstractions for testing

pub mod mock;
pub mod traits;

pub use mock::{MockAssetLedger, StaticWhitelist};
pub use traits::{AccountId, Amount, AssetError, AssetId, AssetLedger, WhitelistGate};
