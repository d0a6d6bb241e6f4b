//! Deposit requirement and escrow entry types.

use crate::assets::{AccountId, Amount, AssetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Profile identifier in the social graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Followers are ledger accounts: they fund deposits and receive refunds.
pub type FollowerId = AccountId;

/// One (asset, amount) pair of a requirement or manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset: AssetId,
    pub amount: Amount,
}

impl AssetAmount {
    pub fn new(asset: AssetId, amount: Amount) -> Self {
        Self { asset, amount }
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset)
    }
}

/// Ordered list of deposits a profile demands from each follower.
///
/// Assets may repeat; each entry is escrowed independently.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepositRequirement {
    pub entries: Vec<AssetAmount>,
}

impl DepositRequirement {
    pub fn new(entries: Vec<AssetAmount>) -> Self {
        Self { entries }
    }

    /// Build from `(asset, amount)` pairs.
    pub fn from_pairs<I, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, Amount)>,
        A: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(asset, amount)| AssetAmount::new(AssetId::new(asset), amount))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetAmount> {
        self.entries.iter()
    }

    /// Pairwise equality: same length, order, assets and amounts.
    pub fn matches(&self, manifest: &DepositRequirement) -> bool {
        self.entries == manifest.entries
    }

    /// Sum per asset. `None` if a per-asset total overflows.
    pub fn totals(&self) -> Option<BTreeMap<AssetId, Amount>> {
        let mut totals: BTreeMap<AssetId, Amount> = BTreeMap::new();
        for entry in &self.entries {
            let total = totals.entry(entry.asset.clone()).or_insert(0);
            *total = total.checked_add(entry.amount)?;
        }
        Some(totals)
    }
}

/// Assets held in escrow for one (profile, follower) follow relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEntry {
    pub profile: ProfileId,
    pub follower: FollowerId,
    /// Exactly what was pulled from the follower, in collection order.
    pub deposits: Vec<AssetAmount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_preserves_order_and_duplicates() {
        let req = DepositRequirement::from_pairs([("CUR", 100), ("CUR", 200), ("DAI", 5)]);

        assert_eq!(req.len(), 3);
        assert_eq!(req.entries[0], AssetAmount::new(AssetId::new("CUR"), 100));
        assert_eq!(req.entries[1], AssetAmount::new(AssetId::new("CUR"), 200));
        assert_eq!(req.entries[2].asset, AssetId::new("DAI"));
    }

    #[test]
    fn test_matches_is_order_sensitive() {
        let req = DepositRequirement::from_pairs([("CUR", 100), ("CUR", 200)]);
        let same = DepositRequirement::from_pairs([("CUR", 100), ("CUR", 200)]);
        let swapped = DepositRequirement::from_pairs([("CUR", 200), ("CUR", 100)]);
        let merged = DepositRequirement::from_pairs([("CUR", 300)]);

        assert!(req.matches(&same));
        assert!(!req.matches(&swapped));
        assert!(!req.matches(&merged));
    }

    #[test]
    fn test_totals() {
        let req = DepositRequirement::from_pairs([("CUR", 100), ("DAI", 7), ("CUR", 200)]);
        let totals = req.totals().unwrap();

        assert_eq!(totals[&AssetId::new("CUR")], 300);
        assert_eq!(totals[&AssetId::new("DAI")], 7);
    }

    #[test]
    fn test_totals_overflow() {
        let req = DepositRequirement::from_pairs([("CUR", u128::MAX), ("CUR", 1)]);
        assert!(req.totals().is_none());
    }
}
