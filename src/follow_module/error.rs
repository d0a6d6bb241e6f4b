//! Follow module errors.

use super::types::{FollowerId, ProfileId};
use crate::assets::{Amount, AssetError, AssetId};
use thiserror::Error;

/// Follow module result type.
pub type FollowModuleResult<T> = Result<T, FollowModuleError>;

/// Errors surfaced by configure / collect / refund.
///
/// None of these are retried inside the module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FollowModuleError {
    /// Empty requirement, zero amount, overflowing totals or a
    /// non-whitelisted asset.
    #[error("invalid deposit configuration: {0}")]
    InvalidConfig(String),

    #[error("profile {0} has no deposit requirement configured")]
    NotConfigured(ProfileId),

    #[error("deposit manifest does not match requirement of profile {profile}: {reason}")]
    ManifestMismatch { profile: ProfileId, reason: String },

    #[error("{follower} already follows profile {profile}")]
    AlreadyFollowing {
        profile: ProfileId,
        follower: FollowerId,
    },

    /// Benign: the relationship never escrowed anything (or was refunded).
    #[error("nothing escrowed for {follower} on profile {profile}")]
    NothingToRefund {
        profile: ProfileId,
        follower: FollowerId,
    },

    /// The asset ledger rejected a transfer. `index` is the position of the
    /// failing entry in the requirement/escrow list.
    #[error("transfer of {amount} {asset} (entry {index}) failed: {source}")]
    TransferFailed {
        index: usize,
        asset: AssetId,
        amount: Amount,
        #[source]
        source: AssetError,
    },
}

impl FollowModuleError {
    /// True for outcomes callers should treat as a successful no-op.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NothingToRefund { .. })
    }
}
