//! Property-based tests for the follow module
//!
//! Tests for:
//! - Manifest gate: any manifest other than the requirement escrows nothing
//! - Round trip: collect then refund restores every balance
//! - Escrow accounting: at most one entry per pair; escrow balance always
//!   equals the sum of live entries

use super::*;
use crate::assets::{AssetId, MockAssetLedger, StaticWhitelist};
use proptest::prelude::*;
use std::sync::Arc;

const ASSETS: [&str; 3] = ["CUR", "DAI", "WETH"];

type Module = AssetDepositFollowModule<MockAssetLedger, StaticWhitelist>;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn module() -> (Module, Arc<MockAssetLedger>) {
    let assets = Arc::new(MockAssetLedger::new());
    let whitelist = Arc::new(StaticWhitelist::new(ASSETS.iter().map(|a| AssetId::new(*a))));
    let module = AssetDepositFollowModule::new(AccountId::new("escrow"), assets.clone(), whitelist);
    (module, assets)
}

/// Fund and authorize `follower` for `requirement` exactly.
fn fund(assets: &MockAssetLedger, escrow: &AccountId, follower: &AccountId, requirement: &DepositRequirement) {
    for (asset, total) in requirement.totals().unwrap() {
        assets.mint(follower, &asset, total).unwrap();
        assets.approve(follower, escrow, &asset, total);
    }
}

fn requirement_strategy() -> impl Strategy<Value = DepositRequirement> {
    prop::collection::vec((0..ASSETS.len(), 1u128..1_000_000), 1..6).prop_map(|pairs| {
        DepositRequirement::from_pairs(pairs.into_iter().map(|(i, amount)| (ASSETS[i], amount)))
    })
}

#[derive(Debug, Clone)]
enum Op {
    Collect(usize),
    Refund(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![(0..3usize).prop_map(Op::Collect), (0..3usize).prop_map(Op::Refund)]
}

proptest! {
    /// Property: No follow without a matching deposit
    #[test]
    fn mismatched_manifest_never_escrows(
        requirement in requirement_strategy(),
        manifest in requirement_strategy(),
    ) {
        prop_assume!(requirement != manifest);

        runtime().block_on(async {
            let (module, assets) = module();
            let follower = AccountId::new("follower");
            module.configure(ProfileId(1), requirement.clone()).await.unwrap();
            fund(&assets, module.escrow_account(), &follower, &manifest);

            let result = module.collect(ProfileId(1), &follower, &manifest).await;

            prop_assert!(
                matches!(result, Err(FollowModuleError::ManifestMismatch { .. })),
                "expected ManifestMismatch"
            );
            prop_assert!(module.entry_of(ProfileId(1), &follower).is_none());
            prop_assert!(assets.history().is_empty());
            Ok(())
        })?;
    }

    /// Property: collect then refund restores follower and escrow balances
    #[test]
    fn collect_refund_round_trip(requirement in requirement_strategy()) {
        runtime().block_on(async {
            let (module, assets) = module();
            let escrow = module.escrow_account().clone();
            let follower = AccountId::new("follower");
            fund(&assets, &escrow, &follower, &requirement);

            let before: Vec<_> = ASSETS
                .iter()
                .map(|a| {
                    let asset = AssetId::new(*a);
                    (assets.balance(&follower, &asset), assets.balance(&escrow, &asset))
                })
                .collect();

            module.configure(ProfileId(1), requirement.clone()).await.unwrap();
            let entry = module.collect(ProfileId(1), &follower, &requirement).await.unwrap();
            prop_assert_eq!(&entry.deposits, &requirement.entries);

            for (asset, total) in requirement.totals().unwrap() {
                prop_assert_eq!(assets.balance(&escrow, &asset), total);
            }

            module.refund(ProfileId(1), &follower).await.unwrap();

            let after: Vec<_> = ASSETS
                .iter()
                .map(|a| {
                    let asset = AssetId::new(*a);
                    (assets.balance(&follower, &asset), assets.balance(&escrow, &asset))
                })
                .collect();

            prop_assert_eq!(before, after);
            prop_assert!(module.entry_of(ProfileId(1), &follower).is_none());
            Ok(())
        })?;
    }

    /// Property: any interleaving of collect/refund keeps one entry per pair
    /// and the escrow balance equal to the live entries
    #[test]
    fn escrow_matches_live_entries(
        requirement in requirement_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..30),
    ) {
        runtime().block_on(async {
            let (module, assets) = module();
            let escrow = module.escrow_account().clone();
            let followers: Vec<_> = (0..3).map(|i| AccountId::new(format!("f{}", i))).collect();
            module.configure(ProfileId(1), requirement.clone()).await.unwrap();
            for follower in &followers {
                fund(&assets, &escrow, follower, &requirement);
            }
            let mut following = [false; 3];

            for op in ops {
                match op {
                    Op::Collect(i) => {
                        let result = module.collect(ProfileId(1), &followers[i], &requirement).await;
                        if following[i] {
                            prop_assert!(
                                matches!(result, Err(FollowModuleError::AlreadyFollowing { .. })),
                                "duplicate collect must fail"
                            );
                        } else {
                            prop_assert!(result.is_ok());
                            following[i] = true;
                        }
                    }
                    Op::Refund(i) => {
                        let result = module.refund(ProfileId(1), &followers[i]).await;
                        if following[i] {
                            prop_assert!(result.is_ok());
                            following[i] = false;
                            // Re-authorize for the next follow.
                            for (asset, total) in requirement.totals().unwrap() {
                                assets.approve(&followers[i], &escrow, &asset, total);
                            }
                        } else {
                            prop_assert!(matches!(result, Err(ref e) if e.is_benign()));
                        }
                    }
                }

                for (i, follower) in followers.iter().enumerate() {
                    prop_assert_eq!(module.entry_of(ProfileId(1), follower).is_some(), following[i]);
                }
                let live = following.iter().filter(|f| **f).count() as u128;
                for (asset, total) in requirement.totals().unwrap() {
                    prop_assert_eq!(assets.balance(&escrow, &asset), total * live);
                    prop_assert_eq!(module.ledger().escrowed_total(&asset), total * live);
                }
            }
            Ok(())
        })?;
    }
}
