//! Asset-deposit follow module.
//!
//! Following a profile requires depositing the profile's configured list of
//! whitelisted assets. Deposits sit in the module's escrow account until the
//! follow relationship is destroyed, then go back to the follower.
//!
//! Per (profile, follower) pair:
//!
//! ```text
//! NoEntry --collect--> Escrowed --refund--> NoEntry
//! ```
//!
//! The registry drives the module through the [`FollowModule`] trait.

pub mod collect;
pub mod error;
pub mod events;
pub mod ledger;
mod locks;
pub mod refund;
pub mod types;

#[cfg(test)]
mod proptests;

pub use error::{FollowModuleError, FollowModuleResult};
pub use events::{EventKind, EventLog, EventQuery, ModuleEvent};
pub use ledger::DepositLedger;
pub use types::{AssetAmount, DepositRequirement, EscrowEntry, FollowerId, ProfileId};

use crate::assets::{AccountId, AssetLedger, WhitelistGate};
use crate::serialization::decode_deposits;
use async_trait::async_trait;
use locks::KeyLocks;
use std::sync::Arc;
use tracing::info;

/// What a follower supplies with a follow request. Same shape as a requirement.
pub type DepositManifest = DepositRequirement;

/// Lifecycle hooks a registry invokes on a plugged-in follow module.
#[async_trait]
pub trait FollowModule: Send + Sync {
    /// Set (or replace) the deposit requirement of `profile`.
    async fn configure(
        &self,
        profile: ProfileId,
        requirement: DepositRequirement,
    ) -> FollowModuleResult<()>;

    /// Detach from `profile`: drop its requirement. Existing escrow entries
    /// stay refundable.
    async fn clear(&self, profile: ProfileId) -> FollowModuleResult<DepositRequirement>;

    /// Validate the manifest and escrow the deposits for a new follow.
    async fn collect(
        &self,
        profile: ProfileId,
        follower: &FollowerId,
        manifest: &DepositManifest,
    ) -> FollowModuleResult<EscrowEntry>;

    /// Return the pair's deposits. Called when the follow is destroyed.
    async fn refund(
        &self,
        profile: ProfileId,
        follower: &FollowerId,
    ) -> FollowModuleResult<EscrowEntry>;

    fn requirement_of(&self, profile: ProfileId) -> Option<DepositRequirement>;

    fn entry_of(&self, profile: ProfileId, follower: &FollowerId) -> Option<EscrowEntry>;

    /// `configure` from CBOR-encoded init data.
    async fn configure_encoded(&self, profile: ProfileId, data: &[u8]) -> FollowModuleResult<()> {
        let requirement = decode_deposits(data)
            .map_err(|e| FollowModuleError::InvalidConfig(e.to_string()))?;
        self.configure(profile, requirement).await
    }

    /// `collect` from CBOR-encoded follow data.
    async fn collect_encoded(
        &self,
        profile: ProfileId,
        follower: &FollowerId,
        data: &[u8],
    ) -> FollowModuleResult<EscrowEntry> {
        let manifest = decode_deposits(data).map_err(|e| FollowModuleError::ManifestMismatch {
            profile,
            reason: e.to_string(),
        })?;
        self.collect(profile, follower, &manifest).await
    }
}

/// Follow module backed by an asset ledger and a whitelist gate.
pub struct AssetDepositFollowModule<L: ?Sized, W: ?Sized> {
    escrow_account: AccountId,
    assets: Arc<L>,
    whitelist: Arc<W>,
    ledger: DepositLedger,
    locks: KeyLocks,
    events: EventLog,
}

impl<L, W> AssetDepositFollowModule<L, W>
where
    L: AssetLedger + ?Sized,
    W: WhitelistGate + ?Sized,
{
    /// `escrow_account` is the ledger account this module controls.
    pub fn new(escrow_account: AccountId, assets: Arc<L>, whitelist: Arc<W>) -> Self {
        Self {
            escrow_account,
            assets,
            whitelist,
            ledger: DepositLedger::new(),
            locks: KeyLocks::new(),
            events: EventLog::new(),
        }
    }

    pub fn escrow_account(&self) -> &AccountId {
        &self.escrow_account
    }

    pub fn ledger(&self) -> &DepositLedger {
        &self.ledger
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }
}

#[async_trait]
impl<L, W> FollowModule for AssetDepositFollowModule<L, W>
where
    L: AssetLedger + ?Sized,
    W: WhitelistGate + ?Sized,
{
    async fn configure(
        &self,
        profile: ProfileId,
        requirement: DepositRequirement,
    ) -> FollowModuleResult<()> {
        ledger::validate_requirement(&requirement, self.whitelist.as_ref()).await?;

        let _profile_guard = self.locks.profile_write(profile).await;
        self.ledger.set_requirement(profile, requirement.clone());
        self.events.record(
            profile,
            EventKind::Configured {
                requirement: requirement.entries.clone(),
            },
        );

        info!(profile = %profile, deposits = requirement.len(), "deposit requirement configured");
        Ok(())
    }

    async fn clear(&self, profile: ProfileId) -> FollowModuleResult<DepositRequirement> {
        let _profile_guard = self.locks.profile_write(profile).await;
        let removed = self
            .ledger
            .remove_requirement(profile)
            .ok_or(FollowModuleError::NotConfigured(profile))?;
        self.events.record(profile, EventKind::Cleared);

        info!(profile = %profile, "deposit requirement cleared");
        Ok(removed)
    }

    async fn collect(
        &self,
        profile: ProfileId,
        follower: &FollowerId,
        manifest: &DepositManifest,
    ) -> FollowModuleResult<EscrowEntry> {
        let _profile_guard = self.locks.profile_read(profile).await;
        let _pair_guard = self.locks.pair(profile, follower).await;

        let entry = collect::collect_deposits(
            &self.ledger,
            self.assets.as_ref(),
            &self.escrow_account,
            profile,
            follower,
            manifest,
        )
        .await?;

        self.events.record(
            profile,
            EventKind::Collected {
                follower: follower.clone(),
                deposits: entry.deposits.clone(),
            },
        );
        Ok(entry)
    }

    async fn refund(
        &self,
        profile: ProfileId,
        follower: &FollowerId,
    ) -> FollowModuleResult<EscrowEntry> {
        let _pair_guard = self.locks.pair(profile, follower).await;

        let entry = refund::refund_deposits(
            &self.ledger,
            self.assets.as_ref(),
            &self.escrow_account,
            profile,
            follower,
        )
        .await?;

        self.events.record(
            profile,
            EventKind::Refunded {
                follower: follower.clone(),
                deposits: entry.deposits.clone(),
            },
        );
        Ok(entry)
    }

    fn requirement_of(&self, profile: ProfileId) -> Option<DepositRequirement> {
        self.ledger.requirement_of(profile)
    }

    fn entry_of(&self, profile: ProfileId, follower: &FollowerId) -> Option<EscrowEntry> {
        self.ledger.entry_of(profile, follower)
    }
}
