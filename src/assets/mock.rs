//! In-memory asset ledger and whitelist.
//!
//! Used by the hub, the CLI scenario runner and tests. The ledger follows
//! allowance semantics: `transfer_from` consumes the spender's approval.

use super::traits::*;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// One successful transfer, recorded in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: AccountId,
    pub to: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
}

/// Mock asset ledger for testing.
#[derive(Clone, Default)]
pub struct MockAssetLedger {
    state: Arc<Mutex<LedgerState>>,
}

#[derive(Default)]
struct LedgerState {
    assets: HashSet<AssetId>,
    balances: HashMap<(AccountId, AssetId), Amount>,
    allowances: HashMap<(AccountId, AccountId, AssetId), Amount>,
    rejected_senders: HashSet<AccountId>,
    history: Vec<TransferRecord>,
}

impl LedgerState {
    fn balance(&self, account: &AccountId, asset: &AssetId) -> Amount {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn ensure_known(&self, asset: &AssetId) -> AssetResult<()> {
        if self.assets.contains(asset) {
            Ok(())
        } else {
            Err(AssetError::UnknownAsset(asset.clone()))
        }
    }

    /// Debit then credit; leaves state untouched on any error.
    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> AssetResult<()> {
        if self.rejected_senders.contains(from) {
            return Err(AssetError::Rejected(format!(
                "transfers from {} are blocked",
                from
            )));
        }

        let available = self.balance(from, asset);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                account: from.clone(),
                asset: asset.clone(),
                available,
                requested: amount,
            });
        }

        if from != to {
            let credited = self
                .balance(to, asset)
                .checked_add(amount)
                .ok_or_else(|| AssetError::Overflow(to.clone()))?;
            self.balances
                .insert((from.clone(), asset.clone()), available - amount);
            self.balances.insert((to.clone(), asset.clone()), credited);
        }

        self.history.push(TransferRecord {
            from: from.clone(),
            to: to.clone(),
            asset: asset.clone(),
            amount,
        });
        Ok(())
    }
}

impl MockAssetLedger {
    /// Create new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` of `asset` to `account` (registers the asset if needed).
    pub fn mint(&self, account: &AccountId, asset: &AssetId, amount: Amount) -> AssetResult<()> {
        let mut s = self.state.lock().unwrap();
        s.assets.insert(asset.clone());
        let credited = s
            .balance(account, asset)
            .checked_add(amount)
            .ok_or_else(|| AssetError::Overflow(account.clone()))?;
        s.balances.insert((account.clone(), asset.clone()), credited);
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s `asset` (overwrites).
    pub fn approve(&self, owner: &AccountId, spender: &AccountId, asset: &AssetId, amount: Amount) {
        let mut s = self.state.lock().unwrap();
        s.allowances
            .insert((owner.clone(), spender.clone(), asset.clone()), amount);
    }

    /// Remaining allowance.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId, asset: &AssetId) -> Amount {
        let s = self.state.lock().unwrap();
        s.allowances
            .get(&(owner.clone(), spender.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Synchronous balance lookup (for test assertions and CLI output).
    pub fn balance(&self, account: &AccountId, asset: &AssetId) -> Amount {
        let s = self.state.lock().unwrap();
        s.balance(account, asset)
    }

    /// Make every transfer out of `account` fail (failure injection).
    pub fn reject_transfers_from(&self, account: &AccountId, reject: bool) {
        let mut s = self.state.lock().unwrap();
        if reject {
            s.rejected_senders.insert(account.clone());
        } else {
            s.rejected_senders.remove(account);
        }
    }

    /// All successful transfers so far, in order.
    pub fn history(&self) -> Vec<TransferRecord> {
        self.state.lock().unwrap().history.clone()
    }
}

#[async_trait]
impl AssetLedger for MockAssetLedger {
    async fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        recipient: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> AssetResult<()> {
        let mut s = self.state.lock().unwrap();
        s.ensure_known(asset)?;

        let key = (owner.clone(), spender.clone(), asset.clone());
        let allowed = s.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err(AssetError::InsufficientAllowance {
                owner: owner.clone(),
                spender: spender.clone(),
                asset: asset.clone(),
                available: allowed,
                requested: amount,
            });
        }

        s.move_balance(owner, recipient, asset, amount)?;
        s.allowances.insert(key, allowed - amount);
        Ok(())
    }

    async fn transfer(
        &self,
        sender: &AccountId,
        recipient: &AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> AssetResult<()> {
        let mut s = self.state.lock().unwrap();
        s.ensure_known(asset)?;
        s.move_balance(sender, recipient, asset, amount)
    }

    async fn balance_of(&self, account: &AccountId, asset: &AssetId) -> AssetResult<Amount> {
        let s = self.state.lock().unwrap();
        s.ensure_known(asset)?;
        Ok(s.balance(account, asset))
    }
}

/// Whitelist backed by a fixed asset set and an optional per-deposit cap.
#[derive(Debug, Clone, Default)]
pub struct StaticWhitelist {
    assets: HashSet<AssetId>,
    max_amount: Option<Amount>,
}

impl StaticWhitelist {
    pub fn new(assets: impl IntoIterator<Item = AssetId>) -> Self {
        Self {
            assets: assets.into_iter().collect(),
            max_amount: None,
        }
    }

    /// Reject deposits larger than `max`.
    pub fn with_max_amount(mut self, max: Amount) -> Self {
        self.max_amount = Some(max);
        self
    }
}

#[async_trait]
impl WhitelistGate for StaticWhitelist {
    async fn is_acceptable(&self, asset: &AssetId, amount: Amount) -> bool {
        self.assets.contains(asset) && self.max_amount.map_or(true, |max| amount <= max)
    }
}
