//! Trait abstractions for the external asset ledger and whitelist service.
//!
//! The follow module never owns balances. It directs transfers into and out
//! of its escrow account through [`AssetLedger`], and consults
//! [`WhitelistGate`] before accepting a deposit configuration. Both are
//! traits so tests and the in-process hub can plug in mock implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Token amount. Covers the full range of the asset ledger.
pub type Amount = u128;

/// Fungible asset identifier (e.g. a token contract address).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier on the asset ledger (followers, the escrow account).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result type for asset ledger operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Asset ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// Source account does not hold enough of the asset.
    #[error("insufficient balance of {asset} in {account}: has {available}, needs {requested}")]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    /// Spender was not authorized to move this much on the owner's behalf.
    #[error("insufficient allowance of {asset} from {owner} to {spender}: has {available}, needs {requested}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    /// Ledger does not know this asset.
    #[error("unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// Crediting the recipient would overflow.
    #[error("balance overflow for {0}")]
    Overflow(AccountId),

    /// Ledger rejected the call for another reason.
    #[error("{0}")]
    Rejected(String),
}

/// Trait abstraction for the fungible-asset ledger.
///
/// Each call is atomic: it either moves the full amount or nothing. Callers
/// identify themselves explicitly (`spender` / `sender`), which is how the
/// ledger enforces prior authorization.
#[async_trait]
pub trait AssetLedger: Send + Sync {
    /// Move `amount` of `asset` from `owner` to `recipient`, consuming
    /// `spender`'s allowance from `owner`.
    async fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        recipient: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> AssetResult<()>;

    /// Move `amount` of `asset` from `sender`'s own balance to `recipient`.
    async fn transfer(
        &self,
        sender: &AccountId,
        recipient: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> AssetResult<()>;

    /// Current balance of `account` in `asset`.
    async fn balance_of(&self, account: &AccountId, asset: &AssetId) -> AssetResult<Amount>;
}

/// Global whitelist policy consulted when a profile configures deposits.
#[async_trait]
pub trait WhitelistGate: Send + Sync {
    /// Is `asset` acceptable as a deposit of `amount`?
    async fn is_acceptable(&self, asset: &AssetId, amount: Amount) -> bool;
}
