//! Follow-time validation and deposit collection.
//!
//! On a follow request:
//! 1. The profile must have a requirement configured
//! 2. The follower's manifest must equal it pairwise (length, order, assets, amounts)
//! 3. The pair must not already hold an escrow entry
//! 4. Each deposit is pulled from the follower into the escrow account, in order
//! 5. Only after every transfer succeeds is the escrow entry recorded
//!
//! Known gap: if transfer `k` fails, transfers `0..k` of the same call have
//! already moved funds into escrow and are NOT reversed here. No entry is
//! recorded, so `refund` cannot return them either. The caller must not
//! finalize the follow and must reconcile those funds out of band.

use super::error::{FollowModuleError, FollowModuleResult};
use super::ledger::DepositLedger;
use super::types::{DepositRequirement, EscrowEntry, FollowerId, ProfileId};
use crate::assets::{AccountId, AssetLedger};
use tracing::{debug, info, warn};

/// Explain why `manifest` differs from `requirement`, if it does.
pub fn manifest_mismatch(
    requirement: &DepositRequirement,
    manifest: &DepositRequirement,
) -> Option<String> {
    if requirement.matches(manifest) {
        return None;
    }

    if requirement.len() != manifest.len() {
        return Some(format!(
            "expected {} deposits, got {}",
            requirement.len(),
            manifest.len()
        ));
    }

    requirement
        .iter()
        .zip(manifest.iter())
        .position(|(required, supplied)| required != supplied)
        .map(|index| {
            format!(
                "entry {}: expected {}, got {}",
                index, requirement.entries[index], manifest.entries[index]
            )
        })
}

/// Validate the manifest and pull the deposits into escrow.
///
/// The caller holds the profile lock (shared) and the pair lock.
pub(crate) async fn collect_deposits<L>(
    ledger: &DepositLedger,
    assets: &L,
    escrow: &AccountId,
    profile: ProfileId,
    follower: &FollowerId,
    manifest: &DepositRequirement,
) -> FollowModuleResult<EscrowEntry>
where
    L: AssetLedger + ?Sized,
{
    let requirement = ledger
        .requirement_of(profile)
        .ok_or(FollowModuleError::NotConfigured(profile))?;

    if let Some(reason) = manifest_mismatch(&requirement, manifest) {
        return Err(FollowModuleError::ManifestMismatch { profile, reason });
    }

    if ledger.has_entry(profile, follower) {
        return Err(FollowModuleError::AlreadyFollowing {
            profile,
            follower: follower.clone(),
        });
    }

    for (index, deposit) in requirement.iter().enumerate() {
        debug!(
            profile = %profile,
            follower = %follower,
            asset = %deposit.asset,
            amount = deposit.amount,
            index,
            "pulling deposit into escrow"
        );

        if let Err(source) = assets
            .transfer_from(escrow, follower, escrow, &deposit.asset, deposit.amount)
            .await
        {
            // Earlier transfers of this call stay in escrow; see module docs.
            if index > 0 {
                warn!(
                    profile = %profile,
                    follower = %follower,
                    moved = index,
                    total = requirement.len(),
                    "collect failed partway, moved deposits are not reversed"
                );
            }
            return Err(FollowModuleError::TransferFailed {
                index,
                asset: deposit.asset.clone(),
                amount: deposit.amount,
                source,
            });
        }
    }

    let entry = EscrowEntry {
        profile,
        follower: follower.clone(),
        deposits: requirement.entries,
    };
    ledger.record_entry(entry.clone())?;

    info!(
        profile = %profile,
        follower = %follower,
        deposits = entry.deposits.len(),
        "deposits escrowed"
    );

    Ok(entry)
}
