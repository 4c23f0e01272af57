//! Unwrap cycle behavior and per-cycle refund caching.

#[path = "setup.rs"]
mod setup;

use alloy_primitives::U256;
use balance::TokenClient;
use setup::*;
use std::sync::atomic::Ordering;

// A chain under its native floor gets an unwrap sized to the target, and
// the wrapped balance is reserved before submission.
#[tokio::test]
async fn unwraps_when_native_below_threshold() {
    let harness = build(vec![token_with_unwrap(
        &[(CHAIN_A, "0.5", "0.4")],
        &[(CHAIN_A, "2", "5")],
    )]);
    harness.set_balance(CHAIN_A, pct("10"));
    harness.monitor.set_native(CHAIN_A, pct("1"));

    let report = harness.manager.unwrap_native_if_needed().await;

    assert_eq!(report.executed.len(), 1);
    let (candidate, _) = &report.executed[0];
    assert_eq!(candidate.chain_id, CHAIN_A);
    assert_eq!(candidate.native_balance, pct("1"));
    assert_eq!(candidate.amount, pct("4"));

    assert_eq!(
        harness.adapter.unwraps.read().unwrap().as_slice(),
        &[(CHAIN_A, pct("4"))]
    );
    assert_eq!(harness.tracker.balance(CHAIN_A, TOKEN_A), pct("6"));
}

// Enough native on hand means no unwrap at all.
#[tokio::test]
async fn no_unwrap_when_native_above_threshold() {
    let harness = build(vec![token_with_unwrap(
        &[(CHAIN_A, "0.5", "0.4")],
        &[(CHAIN_A, "2", "5")],
    )]);
    harness.set_balance(CHAIN_A, pct("10"));
    harness.monitor.set_native(CHAIN_A, pct("3"));

    let report = harness.manager.unwrap_native_if_needed().await;

    assert!(report.executed.is_empty());
    assert!(report.unexecuted.is_empty());
    assert!(harness.adapter.unwraps.read().unwrap().is_empty());
}

// Too little wrapped-native leaves the plan unexecuted, untouched.
#[tokio::test]
async fn insufficient_wrapped_balance_is_unexecuted() {
    let harness = build(vec![token_with_unwrap(
        &[(CHAIN_A, "0.5", "0.4")],
        &[(CHAIN_A, "2", "5")],
    )]);
    harness.set_balance(CHAIN_A, pct("3"));
    harness.monitor.set_native(CHAIN_A, pct("1"));

    let report = harness.manager.unwrap_native_if_needed().await;

    assert!(report.executed.is_empty());
    assert_eq!(report.unexecuted.len(), 1);
    assert_eq!(report.unexecuted[0].amount, pct("4"));

    // The wrapped balance was not reserved.
    assert_eq!(harness.tracker.balance(CHAIN_A, TOKEN_A), pct("3"));
    assert!(harness.adapter.unwraps.read().unwrap().is_empty());
}

// Chains running a custom gas token never unwrap.
#[tokio::test]
async fn custom_gas_token_chains_are_excluded() {
    // Chain B is flagged gas_is_native = false in the test registry.
    let harness = build(vec![token_with_unwrap(
        &[(CHAIN_B, "0.5", "0.4")],
        &[(CHAIN_B, "2", "5")],
    )]);
    harness.set_balance(CHAIN_B, pct("10"));
    harness.monitor.set_native(CHAIN_B, U256::ZERO);

    let report = harness.manager.unwrap_native_if_needed().await;

    assert!(report.executed.is_empty());
    assert!(report.unexecuted.is_empty());
}

// Chains without unwrap settings are skipped even when gas runs low.
#[tokio::test]
async fn missing_unwrap_config_skips_chain() {
    let harness = build(vec![token(&[(CHAIN_A, "0.5", "0.4")])]);
    harness.set_balance(CHAIN_A, pct("10"));
    harness.monitor.set_native(CHAIN_A, U256::ZERO);

    let report = harness.manager.unwrap_native_if_needed().await;

    assert!(report.executed.is_empty());
    assert!(report.unexecuted.is_empty());
}

// The bundle refund fetch runs once per cycle no matter how many fills ask,
// and a new cycle fetches fresh data.
#[tokio::test]
async fn refund_fetch_is_cached_within_a_cycle() {
    let harness = build(vec![token(&[
        (CHAIN_A, "0.5", "0.4"),
        (CHAIN_B, "0.5", "0.4"),
    ])]);
    harness.set_balance(HUB, amount(100));
    harness.set_balance(CHAIN_A, amount(100));
    harness.set_balance(CHAIN_B, amount(100));

    for _ in 0..3 {
        harness
            .manager
            .determine_refund_chain(&fill(CHAIN_A, CHAIN_B, 10))
            .await
            .unwrap();
    }
    assert_eq!(harness.bundles.fetches.load(Ordering::Relaxed), 1);

    harness.manager.begin_cycle().await;
    harness
        .manager
        .determine_refund_chain(&fill(CHAIN_A, CHAIN_B, 10))
        .await
        .unwrap();
    assert_eq!(harness.bundles.fetches.load(Ordering::Relaxed), 2);
}
