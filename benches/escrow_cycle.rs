//! Benchmarks for the escrow hot paths
//!
//! - Manifest comparison against the stored requirement
//! - A full collect + refund cycle against the in-memory ledger
//! - CBOR encoding of follow data

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deposit_follow::assets::{AccountId, AssetId, MockAssetLedger, StaticWhitelist};
use deposit_follow::follow_module::collect::manifest_mismatch;
use deposit_follow::serialization::{decode_deposits, encode_deposits};
use deposit_follow::{AssetDepositFollowModule, DepositRequirement, FollowModule, ProfileId};
use std::sync::Arc;

const ASSETS: [&str; 4] = ["CUR", "DAI", "USDC", "WETH"];

/// Requirement with `len` entries cycling through the whitelisted assets.
fn requirement(len: usize) -> DepositRequirement {
    DepositRequirement::from_pairs((0..len).map(|i| (ASSETS[i % ASSETS.len()], (i as u128 + 1) * 10)))
}

fn benchmark_manifest_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_match");

    for len in [1, 4, 16, 64].iter() {
        let required = requirement(*len);
        let manifest = required.clone();
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            b.iter(|| manifest_mismatch(black_box(&required), black_box(&manifest)));
        });
    }

    group.finish();
}

fn benchmark_collect_refund_cycle(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("collect_refund_cycle");

    for len in [1, 4, 16].iter() {
        let escrow = AccountId::new("escrow");
        let follower = AccountId::new("follower");
        let ledger = Arc::new(MockAssetLedger::new());
        for asset in ASSETS {
            let asset = AssetId::new(asset);
            ledger.mint(&follower, &asset, u64::MAX as u128).unwrap();
            ledger.approve(&follower, &escrow, &asset, u128::MAX);
        }
        let whitelist = Arc::new(StaticWhitelist::new(ASSETS.iter().map(|a| AssetId::new(*a))));
        let module = AssetDepositFollowModule::new(escrow, ledger, whitelist);
        let profile = ProfileId(1);
        let manifest = requirement(*len);
        runtime
            .block_on(module.configure(profile, manifest.clone()))
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            b.iter(|| {
                runtime.block_on(async {
                    module.collect(profile, &follower, &manifest).await.unwrap();
                    module.refund(profile, &follower).await.unwrap();
                })
            });
        });
    }

    group.finish();
}

fn benchmark_encode_deposits(c: &mut Criterion) {
    let manifest = requirement(16);
    let encoded = encode_deposits(&manifest).unwrap();

    c.bench_function("encode_deposits_16", |b| {
        b.iter(|| encode_deposits(black_box(&manifest)));
    });

    c.bench_function("decode_deposits_16", |b| {
        b.iter(|| decode_deposits(black_box(&encoded)));
    });
}

criterion_group!(
    benches,
    benchmark_manifest_match,
    benchmark_collect_refund_cycle,
    benchmark_encode_deposits
);
criterion_main!(benches);
