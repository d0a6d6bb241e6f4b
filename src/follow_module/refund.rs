//! Refund hook: return escrowed deposits when a follow ends.
//!
//! Deposits go back to the follower in collection order. The escrow entry
//! is deleted only after every transfer succeeded. A refund that fails
//! partway keeps the entry and remembers how many deposits were already
//! returned, so a retry resumes instead of paying them twice.

use super::error::{FollowModuleError, FollowModuleResult};
use super::ledger::DepositLedger;
use super::types::{EscrowEntry, FollowerId, ProfileId};
use crate::assets::{AccountId, AssetLedger};
use tracing::{debug, info, warn};

/// Return the pair's escrowed deposits and clear the entry.
///
/// The caller holds the pair lock.
pub(crate) async fn refund_deposits<L>(
    ledger: &DepositLedger,
    assets: &L,
    escrow: &AccountId,
    profile: ProfileId,
    follower: &FollowerId,
) -> FollowModuleResult<EscrowEntry>
where
    L: AssetLedger + ?Sized,
{
    let entry = ledger
        .entry_of(profile, follower)
        .ok_or_else(|| FollowModuleError::NothingToRefund {
            profile,
            follower: follower.clone(),
        })?;

    let resume_at = ledger.refunded_count(profile, follower);
    if resume_at > 0 {
        debug!(profile = %profile, follower = %follower, resume_at, "resuming refund");
    }

    for (index, deposit) in entry.deposits.iter().enumerate().skip(resume_at) {
        debug!(
            profile = %profile,
            follower = %follower,
            asset = %deposit.asset,
            amount = deposit.amount,
            index,
            "returning deposit"
        );

        if let Err(source) = assets
            .transfer(escrow, follower, &deposit.asset, deposit.amount)
            .await
        {
            ledger.set_refunded_count(profile, follower, index);
            warn!(
                profile = %profile,
                follower = %follower,
                returned = index,
                total = entry.deposits.len(),
                error = %source,
                "refund failed, entry kept for retry"
            );
            return Err(FollowModuleError::TransferFailed {
                index,
                asset: deposit.asset.clone(),
                amount: deposit.amount,
                source,
            });
        }
    }

    ledger.remove_entry(profile, follower);

    info!(
        profile = %profile,
        follower = %follower,
        deposits = entry.deposits.len(),
        "deposits refunded"
    );

    Ok(entry)
}
