//! Deposit Follow - asset-deposit follow module for a social graph
//!
//! Following a profile is gated on depositing the profile's configured list
//! of whitelisted fungible assets. Deposits are escrowed by the module and
//! returned when the follow relationship is destroyed.
//!
//! Key principles:
//! - At most one escrow entry per (profile, follower)
//! - No follow without a manifest that matches the requirement exactly
//! - Refunds happen once, in collection order
//! - Balances live in the external asset ledger, never here

pub mod assets;
pub mod follow_module;
pub mod hub;
pub mod serialization;

pub use follow_module::{
    AssetDepositFollowModule, DepositRequirement, EscrowEntry, FollowModule, FollowModuleError,
    ProfileId,
};
