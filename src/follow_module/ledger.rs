//! Deposit Ledger: the module's only monetary state.
//!
//! Two keyed stores:
//! - profile -> DepositRequirement
//! - (profile, follower) -> EscrowEntry
//!
//! At most one escrow entry exists per pair. Inner locks are never held
//! across an `.await`; cross-call atomicity comes from `KeyLocks`.

use super::error::{FollowModuleError, FollowModuleResult};
use super::types::{DepositRequirement, EscrowEntry, FollowerId, ProfileId};
use crate::assets::{Amount, AssetId, WhitelistGate};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

type PairKey = (ProfileId, FollowerId);

/// Keyed store of requirements and escrow entries.
#[derive(Debug, Default)]
pub struct DepositLedger {
    requirements: RwLock<HashMap<ProfileId, DepositRequirement>>,
    escrows: RwLock<HashMap<PairKey, EscrowEntry>>,
    /// Entries already returned by a refund that failed partway.
    refund_progress: RwLock<HashMap<PairKey, usize>>,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current requirement of `profile`, if configured.
    pub fn requirement_of(&self, profile: ProfileId) -> Option<DepositRequirement> {
        self.requirements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&profile)
            .cloned()
    }

    /// Current escrow entry of the pair, if any.
    pub fn entry_of(&self, profile: ProfileId, follower: &FollowerId) -> Option<EscrowEntry> {
        self.escrows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(profile, follower.clone()))
            .cloned()
    }

    pub fn has_entry(&self, profile: ProfileId, follower: &FollowerId) -> bool {
        self.escrows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(profile, follower.clone()))
    }

    /// All escrow entries held for followers of `profile`.
    pub fn entries_for(&self, profile: ProfileId) -> Vec<EscrowEntry> {
        let escrows = self.escrows.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<_> = escrows
            .values()
            .filter(|e| e.profile == profile)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.follower.cmp(&b.follower));
        entries
    }

    /// Total of `asset` the escrow account should hold across all entries,
    /// net of anything already returned by a partially failed refund.
    pub fn escrowed_total(&self, asset: &AssetId) -> Amount {
        let escrows = self.escrows.read().unwrap_or_else(PoisonError::into_inner);
        let progress = self
            .refund_progress
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        escrows
            .iter()
            .flat_map(|(key, entry)| {
                let skip = progress.get(key).copied().unwrap_or(0);
                entry.deposits.iter().skip(skip)
            })
            .filter(|d| &d.asset == asset)
            .fold(0, |acc: Amount, d| acc.saturating_add(d.amount))
    }

    /// Replace the whole requirement of `profile`.
    pub(crate) fn set_requirement(&self, profile: ProfileId, requirement: DepositRequirement) {
        self.requirements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile, requirement);
    }

    pub(crate) fn remove_requirement(&self, profile: ProfileId) -> Option<DepositRequirement> {
        self.requirements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&profile)
    }

    /// Record a completed collection. Refuses to overwrite an existing entry.
    pub(crate) fn record_entry(&self, entry: EscrowEntry) -> FollowModuleResult<()> {
        let mut escrows = self.escrows.write().unwrap_or_else(PoisonError::into_inner);
        let key = (entry.profile, entry.follower.clone());
        if escrows.contains_key(&key) {
            return Err(FollowModuleError::AlreadyFollowing {
                profile: entry.profile,
                follower: entry.follower,
            });
        }
        escrows.insert(key, entry);
        Ok(())
    }

    /// Drop the entry once every deposit has been returned.
    pub(crate) fn remove_entry(
        &self,
        profile: ProfileId,
        follower: &FollowerId,
    ) -> Option<EscrowEntry> {
        let key = (profile, follower.clone());
        self.refund_progress
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        self.escrows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
    }

    /// Number of deposits of the pair's entry already returned.
    pub(crate) fn refunded_count(&self, profile: ProfileId, follower: &FollowerId) -> usize {
        self.refund_progress
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(profile, follower.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn set_refunded_count(&self, profile: ProfileId, follower: &FollowerId, count: usize) {
        self.refund_progress
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((profile, follower.clone()), count);
    }
}

/// Check a requirement before it replaces anything.
///
/// Rejects an empty list, zero amounts, per-asset totals that overflow the
/// amount range, and any entry the whitelist refuses.
pub async fn validate_requirement<W>(
    requirement: &DepositRequirement,
    whitelist: &W,
) -> FollowModuleResult<()>
where
    W: WhitelistGate + ?Sized,
{
    if requirement.is_empty() {
        return Err(FollowModuleError::InvalidConfig(
            "requirement must list at least one deposit".to_string(),
        ));
    }

    for (index, entry) in requirement.iter().enumerate() {
        if entry.amount == 0 {
            return Err(FollowModuleError::InvalidConfig(format!(
                "entry {} ({}) has zero amount",
                index, entry.asset
            )));
        }
        if !whitelist.is_acceptable(&entry.asset, entry.amount).await {
            return Err(FollowModuleError::InvalidConfig(format!(
                "entry {} ({}) is not whitelisted",
                index, entry
            )));
        }
    }

    if requirement.totals().is_none() {
        return Err(FollowModuleError::InvalidConfig(
            "per-asset deposit total overflows".to_string(),
        ));
    }

    Ok(())
}
